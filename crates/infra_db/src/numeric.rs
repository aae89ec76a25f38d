//! NUMERIC <-> minor units
//!
//! Balances and amounts are stored as scale-0 `NUMERIC` and read through
//! `BigDecimal`. A value with a non-zero fractional part is rejected, never
//! rounded.

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::Zero;

use core_kernel::MinorUnits;

use crate::error::DatabaseError;

/// Converts minor units to an integral `BigDecimal`
pub fn to_numeric(amount: &MinorUnits) -> BigDecimal {
    BigDecimal::new(amount.as_bigint().clone(), 0)
}

/// Converts a stored `NUMERIC` back to minor units
pub fn from_numeric(value: BigDecimal) -> Result<MinorUnits, DatabaseError> {
    let (digits, scale) = value.into_bigint_and_exponent();
    if scale <= 0 {
        let factor = BigInt::from(10u32).pow(scale.unsigned_abs() as u32);
        return Ok(MinorUnits::new(digits * factor));
    }

    let factor = BigInt::from(10u32).pow(scale as u32);
    if !(&digits % &factor).is_zero() {
        return Err(DatabaseError::SerializationError(format!(
            "non-integral amount with scale {}: {}e-{}",
            scale, digits, scale
        )));
    }
    Ok(MinorUnits::new(digits / factor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_integral_values_convert_exactly() {
        let amount: MinorUnits = "-98765432109876543210987654321".parse().unwrap();
        assert_eq!(from_numeric(to_numeric(&amount)).unwrap(), amount);
    }

    #[test]
    fn test_trailing_zero_scale_is_accepted() {
        let value = BigDecimal::from_str("1500.00").unwrap();
        assert_eq!(from_numeric(value).unwrap(), MinorUnits::from(1500));
    }

    #[test]
    fn test_negative_exponent_is_expanded() {
        let value = BigDecimal::new(BigInt::from(42), -3);
        assert_eq!(from_numeric(value).unwrap(), MinorUnits::from(42_000));
    }

    #[test]
    fn test_fractional_value_is_rejected() {
        let value = BigDecimal::from_str("10.5").unwrap();
        assert!(matches!(
            from_numeric(value),
            Err(DatabaseError::SerializationError(_))
        ));
    }
}
