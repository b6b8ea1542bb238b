//! # Validation Module
//!
//! Input-boundary validation for Laba.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Dashboard forms                                              │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE constraints                                     │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  The calculation engine sits BELOW all of this and never validates:    │
//! │  it is total over numeric inputs, so a value that slips through is     │
//! │  propagated arithmetically, not turned into a crash.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::MAX_SALE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product code.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use laba_core::validation::validate_product_code;
///
/// assert!(validate_product_code("KPI-001").is_ok());
/// assert!(validate_product_code("").is_err());
/// ```
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_required_text("name", name, 200)
}

/// Validates a franchise name.
pub fn validate_franchise_name(name: &str) -> ValidationResult<()> {
    validate_required_text("name", name, 100)
}

/// Validates an expenditure description.
pub fn validate_description(description: &str) -> ValidationResult<()> {
    validate_required_text("description", description, 500)
}

fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_SALE_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_SALE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_SALE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price/cost amount in rupiah.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items, zero-cost samples)
pub fn validate_amount(field: &str, amount: i64) -> ValidationResult<()> {
    if amount < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates an expenditure amount.
///
/// ## Rules
/// - Must be strictly positive; a zero-rupiah cost is an entry mistake
pub fn validate_expenditure_amount(amount: i64) -> ValidationResult<()> {
    if amount <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    Ok(())
}

/// Validates a percentage rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
///
/// Covers the admin fee, percentage discounts, and the revenue-share rate.
pub fn validate_rate_bps(field: &str, bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_code() {
        assert!(validate_product_code("KPI-001").is_ok());
        assert!(validate_product_code("teh_botol").is_ok());

        assert!(validate_product_code("").is_err());
        assert!(validate_product_code("   ").is_err());
        assert!(validate_product_code("has space").is_err());
        assert!(validate_product_code(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_names() {
        assert!(validate_product_name("Kopi Susu Literan").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());

        assert!(validate_franchise_name("Cabang Bandung").is_ok());
        assert!(validate_franchise_name("").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(9_999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(10_000).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount("price", 0).is_ok());
        assert!(validate_amount("price", 30_000).is_ok());
        assert!(validate_amount("price", -100).is_err());
    }

    #[test]
    fn test_validate_expenditure_amount() {
        assert!(validate_expenditure_amount(50_000).is_ok());
        assert!(validate_expenditure_amount(0).is_err());
        assert!(validate_expenditure_amount(-1).is_err());
    }

    #[test]
    fn test_validate_rate_bps() {
        assert!(validate_rate_bps("admin_fee", 0).is_ok());
        assert!(validate_rate_bps("admin_fee", 500).is_ok());
        assert!(validate_rate_bps("admin_fee", 10_000).is_ok());
        assert!(validate_rate_bps("admin_fee", 10_001).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
