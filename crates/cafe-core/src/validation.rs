//! # Validation Module
//!
//! Input validation utilities for orders, promotions and report queries.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: React frontend                                               │
//! │  └── Basic format checks, immediate feedback                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: REST handler (Rust)                                          │
//! │  ├── Type validation (serde deserialization)                           │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::{DiscountKind, Percentage};
use crate::{MAX_AMOUNT_MINOR, MAX_ITEM_QUANTITY, MAX_ORDER_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (product, promotion, staff).
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
///
/// ## Example
/// ```rust
/// use cafe_core::validation::validate_name;
///
/// assert!(validate_name("name", "Cà phê sữa đá").is_ok());
/// assert!(validate_name("name", "  ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// Cashier taps "+" on Bạc xỉu
///       │
///       ▼
/// validate_quantity(3) ← THIS FUNCTION
///       │
///       ├── qty <= 0?  → "quantity must be positive"
///       ├── qty > 999? → "quantity must be between 1 and 999"
///       └── OK → Order::add_line
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price or cost in minor units.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (complimentary items)
/// - Must not exceed MAX_AMOUNT_MINOR
pub fn validate_amount(field: &str, minor: i64) -> ValidationResult<()> {
    if !(0..=MAX_AMOUNT_MINOR).contains(&minor) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_MINOR,
        });
    }

    Ok(())
}

/// Validates a percentage in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_percentage(field: &str, rate: Percentage) -> ValidationResult<()> {
    if rate.bps() > Percentage::FULL_BPS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: Percentage::FULL_BPS as i64,
        });
    }

    Ok(())
}

/// Validates a promotion's value against its kind.
///
/// ## Example
/// ```rust
/// use cafe_core::types::DiscountKind;
/// use cafe_core::validation::validate_promotion_value;
///
/// assert!(validate_promotion_value(DiscountKind::Percentage, 1000).is_ok());
/// assert!(validate_promotion_value(DiscountKind::Percentage, 12_000).is_err());
/// assert!(validate_promotion_value(DiscountKind::FlatAmount, 20_000).is_ok());
/// ```
pub fn validate_promotion_value(kind: DiscountKind, value: i64) -> ValidationResult<()> {
    match kind {
        DiscountKind::Percentage => {
            if !(0..=Percentage::FULL_BPS as i64).contains(&value) {
                return Err(ValidationError::OutOfRange {
                    field: "promotion value".to_string(),
                    min: 0,
                    max: Percentage::FULL_BPS as i64,
                });
            }
            Ok(())
        }
        DiscountKind::FlatAmount => validate_amount("promotion value", value),
    }
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates order size (number of line items).
///
/// ## Rules
/// - Must stay below MAX_ORDER_LINES (100)
pub fn validate_order_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_ORDER_LINES {
        return Err(ValidationError::OutOfRange {
            field: "order lines".to_string(),
            min: 0,
            max: MAX_ORDER_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use cafe_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
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
