//! Unit tests for the Money module
//!
//! Tests cover minor-unit parsing, wire formats, currency handling
//! and major-unit rendering.

use core_kernel::{Currency, MinorUnits, Money, MoneyError};
use num_bigint::BigInt;

mod minor_units {
    use super::*;

    #[test]
    fn test_arithmetic_beyond_machine_integers() {
        let huge: MinorUnits = "170141183460469231731687303715884105727000".parse().unwrap();
        let sum = huge.clone() + huge.clone();
        assert_eq!(sum.to_string(), "340282366920938463463374607431768211454000");
        assert!((sum - huge.clone() - huge).is_zero());
    }

    #[test]
    fn test_sum_of_references() {
        let amounts = vec![MinorUnits::from(-10000), MinorUnits::from(4000), MinorUnits::from(6000)];
        let total: MinorUnits = amounts.iter().sum();
        assert!(total.is_zero());
    }

    #[test]
    fn test_sign_predicates() {
        assert!(MinorUnits::from(-1).is_negative());
        assert!(MinorUnits::from(1).is_positive());
        assert!(!MinorUnits::zero().is_positive());
        assert!(!MinorUnits::zero().is_negative());
        assert_eq!(MinorUnits::from(-42).abs(), MinorUnits::from(42));
    }

    #[test]
    fn test_into_bigint() {
        let m = MinorUnits::from(12345);
        assert_eq!(m.into_bigint(), BigInt::from(12345));
    }
}

mod wire_format {
    use super::*;

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&MinorUnits::from(-10000)).unwrap();
        assert_eq!(json, "\"-10000\"");
    }

    #[test]
    fn test_deserializes_from_string_or_integer() {
        let from_str: MinorUnits = serde_json::from_str("\"250\"").unwrap();
        let from_int: MinorUnits = serde_json::from_str("250").unwrap();
        assert_eq!(from_str, from_int);
    }

    #[test]
    fn test_rejects_floats() {
        assert!(serde_json::from_str::<MinorUnits>("2.5").is_err());
        assert!(serde_json::from_str::<MinorUnits>("\"2.5\"").is_err());
        assert!(serde_json::from_str::<MinorUnits>("\"1e3\"").is_err());
    }
}

mod currency {
    use super::*;

    #[test]
    fn test_valid_codes() {
        assert_eq!(Currency::new("USD").unwrap(), Currency::USD);
        assert_eq!("EUR".parse::<Currency>().unwrap().code(), "EUR");
    }

    #[test]
    fn test_invalid_codes() {
        assert!(matches!(Currency::new("usd"), Err(MoneyError::InvalidCurrency(_))));
        assert!(Currency::new("US").is_err());
        assert!(Currency::new("USDT").is_err());
    }

    #[test]
    fn test_decimal_places() {
        assert_eq!(Currency::USD.decimal_places(), 2);
        assert_eq!(Currency::JPY.decimal_places(), 0);
        assert_eq!(Currency::new("KWD").unwrap().decimal_places(), 3);
    }

    #[test]
    fn test_json_round_trip() {
        let json = serde_json::to_string(&Currency::GBP).unwrap();
        assert_eq!(json, "\"GBP\"");
        assert!(serde_json::from_str::<Currency>("\"gbp\"").is_err());
    }
}

mod money {
    use super::*;

    #[test]
    fn test_checked_add_same_currency() {
        let a = Money::from_minor(40000, Currency::USD);
        let b = Money::from_minor(10000, Currency::USD);
        assert_eq!(a.checked_add(&b).unwrap(), Money::from_minor(50000, Currency::USD));
    }

    #[test]
    fn test_major_units() {
        assert_eq!(Money::from_minor(1, Currency::USD).major_units(), "0.01");
        assert_eq!(Money::from_minor(-123456, Currency::USD).major_units(), "-1234.56");
        assert_eq!(Money::from_minor(1234, Currency::new("KWD").unwrap()).major_units(), "1.234");
        assert_eq!(Money::zero(Currency::USD).major_units(), "0.00");
    }
}
