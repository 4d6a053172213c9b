use std::str::FromStr;

use crate::prelude::*;

pub fn non_zero_u64(value: &str) -> Result<u64> {
    match FromStr::from_str(value)? {
        value if value >= 1 => Ok(value),
        _ => Err(anyhow!("expected a positive number")),
    }
}

/// Parses a number from the open interval `(0, 1)`.
pub fn fraction(value: &str) -> Result<f64> {
    match f64::from_str(value)? {
        value if value > 0.0 && value < 1.0 => Ok(value),
        value => Err(anyhow!("{} is not within (0, 1)", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_zero_u64_ok() -> Result {
        assert_eq!(non_zero_u64("200")?, 200);
        assert!(non_zero_u64("0").is_err());
        assert!(non_zero_u64("-1").is_err());
        Ok(())
    }

    #[test]
    fn fraction_ok() -> Result {
        assert!((fraction("0.2")? - 0.2).abs() < f64::EPSILON);
        assert!(fraction("0").is_err());
        assert!(fraction("1").is_err());
        assert!(fraction("abc").is_err());
        Ok(())
    }
}
