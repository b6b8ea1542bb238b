//! # Error Types
//!
//! Domain-specific error types for laba-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  laba-core errors (this file)                                          │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  laba-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → presentation layer      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Note that the calculation engine itself has **no** error taxonomy: it is
//! total over numeric inputs. Validation belongs at the form boundary; these
//! types exist for that boundary and for domain rules outside the engine.
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (code, id, etc.)
//! 3. Errors are enum variants, never strings or panics

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The franchise exists but has been deactivated by the platform owner.
    ///
    /// Deactivation gates access only; the franchise's historical data stays
    /// intact and reportable for the owner.
    #[error("Franchise {0} is inactive")]
    FranchiseInactive(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when user input doesn't meet requirements. Used for early
/// validation before anything reaches the engine or the database.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::FranchiseInactive("f-123".to_string());
        assert_eq!(err.to_string(), "Franchise f-123 is inactive");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "code".to_string(),
        };
        assert_eq!(err.to_string(), "code is required");

        let err = ValidationError::OutOfRange {
            field: "month".to_string(),
            min: 1,
            max: 12,
        };
        assert_eq!(err.to_string(), "month must be between 1 and 12");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
