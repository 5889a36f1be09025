//! Input validation helpers shared by request bodies and calculators

use crate::error::TrackerError;
use crate::Result;
use chrono::NaiveDate;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn require_non_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TrackerError::invalid(format!("{} is required", field)));
    }
    Ok(())
}

pub fn require_max_chars(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(TrackerError::invalid(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

/// Rejects NaN and infinities.
pub fn require_finite(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(TrackerError::invalid(format!("{} must be a number", field)));
    }
    Ok(())
}

pub fn require_non_negative(field: &str, value: f64) -> Result<()> {
    require_finite(field, value)?;
    if value < 0.0 {
        return Err(TrackerError::invalid(format!(
            "{} must not be negative",
            field
        )));
    }
    Ok(())
}

pub fn require_positive(field: &str, value: f64) -> Result<()> {
    require_finite(field, value)?;
    if value <= 0.0 {
        return Err(TrackerError::invalid(format!("{} must be positive", field)));
    }
    Ok(())
}

pub fn require_date_order(start_field: &str, start: NaiveDate, end_field: &str, end: NaiveDate) -> Result<()> {
    if end < start {
        return Err(TrackerError::invalid(format!(
            "{} must not be before {}",
            end_field, start_field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank() {
        assert!(require_non_blank("name", "Car").is_ok());
        assert!(require_non_blank("name", "   ").is_err());
    }

    #[test]
    fn test_numbers() {
        assert!(require_finite("rate", f64::NAN).is_err());
        assert!(require_finite("rate", f64::INFINITY).is_err());
        assert!(require_non_negative("rate", 0.0).is_ok());
        assert!(require_non_negative("rate", -0.01).is_err());
        assert!(require_positive("amount", 0.0).is_err());
        assert!(require_positive("amount", 12.5).is_ok());
    }

    #[test]
    fn test_max_chars_counts_characters() {
        assert!(require_max_chars("content", "₹₹₹", 3).is_ok());
        assert!(require_max_chars("content", "abcd", 3).is_err());
    }

    #[test]
    fn test_date_order() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert!(require_date_order("start_date", start, "end_date", end).is_ok());
        assert!(require_date_order("start_date", end, "end_date", start).is_err());
        assert!(require_date_order("start_date", start, "end_date", start).is_ok());
    }
}
