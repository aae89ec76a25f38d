//! Money types with exact integer arithmetic
//!
//! Amounts are carried as signed minor units (cents, yen, fils) on top of an
//! arbitrary-precision integer. No floating-point or rounding path exists in
//! this module: the only conversions are integer parsing and integer
//! formatting.

use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub};
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Currency mismatch: cannot operate on {0} and {1}")]
    CurrencyMismatch(String, String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),
}

/// Three-letter currency code following ISO 4217
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency([u8; 3]);

impl Currency {
    pub const USD: Currency = Currency(*b"USD");
    pub const EUR: Currency = Currency(*b"EUR");
    pub const GBP: Currency = Currency(*b"GBP");
    pub const JPY: Currency = Currency(*b"JPY");

    /// Parses a currency code
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::InvalidCurrency` unless the code is exactly three
    /// uppercase ASCII letters
    pub fn new(code: &str) -> Result<Self, MoneyError> {
        let bytes = code.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_uppercase) {
            return Err(MoneyError::InvalidCurrency(code.to_string()));
        }
        Ok(Self([bytes[0], bytes[1], bytes[2]]))
    }

    /// Returns the ISO 4217 code
    pub fn code(&self) -> &str {
        // Constructed only from uppercase ASCII
        std::str::from_utf8(&self.0).unwrap_or("???")
    }

    /// Returns the number of minor-unit digits for this currency
    pub fn decimal_places(&self) -> u32 {
        match &self.0 {
            b"JPY" | b"KRW" | b"VND" | b"CLP" | b"ISK" => 0,
            b"BHD" | b"KWD" | b"OMR" | b"JOD" | b"TND" => 3,
            _ => 2,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> String {
        currency.code().to_string()
    }
}

/// A signed amount in minor currency units
///
/// Serialized as a decimal-digit string (`"-10000"`) so that values beyond
/// the range of any JSON number survive the trip intact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MinorUnits(BigInt);

impl MinorUnits {
    /// Creates an amount from any integer
    pub fn new(value: impl Into<BigInt>) -> Self {
        Self(value.into())
    }

    /// The zero amount
    pub fn zero() -> Self {
        Self(BigInt::zero())
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly positive
    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    /// Returns true if the amount is strictly negative
    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// Returns the absolute value
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Borrows the underlying integer
    pub fn as_bigint(&self) -> &BigInt {
        &self.0
    }

    /// Consumes the amount, returning the underlying integer
    pub fn into_bigint(self) -> BigInt {
        self.0
    }
}

impl fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for MinorUnits {
    type Err = MoneyError;

    /// Accepts an optional leading `-` followed by ASCII digits only
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('-').unwrap_or(s);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MoneyError::InvalidAmount(s.to_string()));
        }
        BigInt::from_str(s)
            .map(Self)
            .map_err(|_| MoneyError::InvalidAmount(s.to_string()))
    }
}

impl From<i64> for MinorUnits {
    fn from(value: i64) -> Self {
        Self(BigInt::from(value))
    }
}

impl From<BigInt> for MinorUnits {
    fn from(value: BigInt) -> Self {
        Self(value)
    }
}

impl Add for MinorUnits {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl<'a> Add<&'a MinorUnits> for &'a MinorUnits {
    type Output = MinorUnits;

    fn add(self, other: &'a MinorUnits) -> MinorUnits {
        MinorUnits(&self.0 + &other.0)
    }
}

impl AddAssign<&MinorUnits> for MinorUnits {
    fn add_assign(&mut self, other: &MinorUnits) {
        self.0 += &other.0;
    }
}

impl Sub for MinorUnits {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

impl Neg for MinorUnits {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Sum for MinorUnits {
    fn sum<I: Iterator<Item = MinorUnits>>(iter: I) -> Self {
        iter.fold(MinorUnits::zero(), |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a MinorUnits> for MinorUnits {
    fn sum<I: Iterator<Item = &'a MinorUnits>>(iter: I) -> Self {
        let mut total = MinorUnits::zero();
        for x in iter {
            total += x;
        }
        total
    }
}

impl Serialize for MinorUnits {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MinorUnits {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MinorUnitsVisitor)
    }
}

struct MinorUnitsVisitor;

impl<'de> Visitor<'de> for MinorUnitsVisitor {
    type Value = MinorUnits;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer amount in minor units, as a decimal-digit string or an integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(MinorUnits::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(MinorUnits::new(v))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<Self::Value, E> {
        Ok(MinorUnits::new(v))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Self::Value, E> {
        Ok(MinorUnits::new(v))
    }
}

/// A minor-unit amount tagged with its currency
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: MinorUnits,
    currency: Currency,
}

impl Money {
    /// Creates a new Money value
    pub fn new(amount: MinorUnits, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Creates Money from a machine-sized minor-unit count
    pub fn from_minor(minor_units: i64, currency: Currency) -> Self {
        Self::new(MinorUnits::from(minor_units), currency)
    }

    /// Creates a zero amount in the specified currency
    pub fn zero(currency: Currency) -> Self {
        Self::new(MinorUnits::zero(), currency)
    }

    /// Returns the amount
    pub fn amount(&self) -> &MinorUnits {
        &self.amount
    }

    /// Returns the currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is negative
    pub fn is_negative(&self) -> bool {
        self.amount.is_negative()
    }

    /// Checked addition that returns an error on currency mismatch
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                other.currency.to_string(),
            ));
        }
        Ok(Self::new(&self.amount + &other.amount, self.currency))
    }

    /// Renders the amount in major units, e.g. `-400.00` for -40000 USD cents
    pub fn major_units(&self) -> String {
        let dp = self.currency.decimal_places() as usize;
        let digits = self.amount.as_bigint().abs().to_string();
        let sign = if self.amount.is_negative() { "-" } else { "" };
        if dp == 0 {
            return format!("{}{}", sign, digits);
        }
        let padded = format!("{:0>width$}", digits, width = dp + 1);
        let (whole, fraction) = padded.split_at(padded.len() - dp);
        format!("{}{}.{}", sign, whole, fraction)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.major_units(), self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_display_in_major_units() {
        assert_eq!(Money::from_minor(40000, Currency::USD).to_string(), "400.00 USD");
        assert_eq!(Money::from_minor(-5, Currency::USD).to_string(), "-0.05 USD");
        assert_eq!(Money::from_minor(1500, Currency::JPY).to_string(), "1500 JPY");
    }

    #[test]
    fn test_currency_mismatch() {
        let usd = Money::from_minor(100, Currency::USD);
        let eur = Money::from_minor(100, Currency::EUR);

        let result = usd.checked_add(&eur);
        assert!(matches!(result, Err(MoneyError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn test_parse_rejects_non_integers() {
        assert!("12.50".parse::<MinorUnits>().is_err());
        assert!("+12".parse::<MinorUnits>().is_err());
        assert!("".parse::<MinorUnits>().is_err());
        assert!("-".parse::<MinorUnits>().is_err());
        assert_eq!("-0012".parse::<MinorUnits>().unwrap(), MinorUnits::from(-12));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn addition_is_associative(
            a in any::<i64>(),
            b in any::<i64>(),
            c in any::<i64>()
        ) {
            let (ma, mb, mc) = (MinorUnits::from(a), MinorUnits::from(b), MinorUnits::from(c));
            prop_assert_eq!(
                (ma.clone() + mb.clone()) + mc.clone(),
                ma + (mb + mc)
            );
        }

        #[test]
        fn string_form_parses_back(a in any::<i64>()) {
            let m = MinorUnits::from(a);
            prop_assert_eq!(m.to_string().parse::<MinorUnits>().unwrap(), m);
        }
    }
}
