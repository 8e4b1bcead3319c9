//! Validation helper functions for configuration types.

use crate::core::errors::{Result, ScrivenerError};

/// Validate that a usize value is greater than zero.
pub fn validate_positive_usize(value: usize, field: &str) -> Result<()> {
    if value == 0 {
        return Err(ScrivenerError::validation_field(
            format!("{} must be greater than 0", field),
            field,
        ));
    }
    Ok(())
}

/// Validate that a u64 value is greater than zero.
pub fn validate_positive_u64(value: u64, field: &str) -> Result<()> {
    if value == 0 {
        return Err(ScrivenerError::validation_field(
            format!("{} must be greater than 0", field),
            field,
        ));
    }
    Ok(())
}

/// Validate that a u64 value is within a bounded range (inclusive).
pub fn validate_bounded_u64(value: u64, min: u64, max: u64, field: &str) -> Result<()> {
    if value < min || value > max {
        return Err(ScrivenerError::validation_field(
            format!("{} must be between {} and {}", field, min, max),
            field,
        ));
    }
    Ok(())
}

/// Validate that an f64 value is greater than zero.
pub fn validate_positive_f64(value: f64, field: &str) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ScrivenerError::validation_field(
            format!("{} must be greater than 0.0", field),
            field,
        ));
    }
    Ok(())
}

/// Validate that an f64 value is in the unit range [0.0, 1.0].
pub fn validate_unit_range(value: f64, field: &str) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ScrivenerError::validation_field(
            format!("{} must be between 0.0 and 1.0", field),
            field,
        ));
    }
    Ok(())
}

/// Validate that a usize value is within a bounded range (inclusive).
pub fn validate_bounded_usize(value: usize, min: usize, max: usize, field: &str) -> Result<()> {
    if value < min || value > max {
        return Err(ScrivenerError::validation_field(
            format!("{} must be between {} and {}", field, min, max),
            field,
        ));
    }
    Ok(())
}

/// Validate that weights are non-negative and sum to 1.0 (within tolerance).
pub fn validate_weights_sum(weights: &[f64], tolerance: f64, field: &str) -> Result<()> {
    if weights.iter().any(|w| *w < 0.0 || !w.is_finite()) {
        return Err(ScrivenerError::validation_field(
            format!("{} must all be finite and non-negative", field),
            field,
        ));
    }
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > tolerance {
        return Err(ScrivenerError::validation_field(
            format!("{} must sum to 1.0 (got {:.6})", field, sum),
            field,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_accepts_exact_unit_sum() {
        assert!(validate_weights_sum(&[0.5, 0.25, 0.25], 1e-9, "w").is_ok());
    }

    #[test]
    fn weights_sum_rejects_negative_entries() {
        let err = validate_weights_sum(&[1.5, -0.5], 1e-9, "fusion.weights").unwrap_err();
        assert!(err.to_string().contains("fusion.weights"));
    }

    #[test]
    fn bounded_usize_reports_range() {
        let err = validate_bounded_usize(12, 1, 8, "mapper.max_auto_clusters").unwrap_err();
        assert!(err.to_string().contains("between 1 and 8"));
    }

    #[test]
    fn positive_f64_rejects_nan() {
        assert!(validate_positive_f64(f64::NAN, "x").is_err());
        assert!(validate_positive_f64(0.1, "x").is_ok());
    }
}
