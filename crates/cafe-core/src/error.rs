//! # Error Types
//!
//! Domain-specific error types for cafe-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  cafe-core errors (this file)                                          │
//! │  ├── CoreError        - Lookup, range and order-lifecycle failures     │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  cafe-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  cafe-api errors (in app)                                              │
//! │  └── ApiError         - What the React frontend sees (JSON)            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → Frontend               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What Is NOT an Error
//! - An empty report range (zero results)
//! - A promotion outside its window (ignored)
//! - A line item whose product, recipe or ingredient was deleted later
//!   (costed best-effort, counted in the report)

use chrono::NaiveDate;
use thiserror::Error;

use crate::order::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A requested order, product or promotion does not resolve.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Report range whose start is after its end.
    ///
    /// Rejected before any aggregation runs.
    #[error("Invalid date range: {from} is after {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },

    /// Status change that would move the order backwards or out of a
    /// terminal state.
    ///
    /// ## Allowed Transitions
    /// ```text
    /// Pending ──► InProgress ──► Paid
    ///    │            │
    ///    └────────────┴────────► Cancelled
    /// ```
    #[error("Order {order_id} cannot move from {from:?} to {to:?}")]
    InvalidStatusTransition {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Line items or payment details changed on a paid/cancelled order.
    #[error("Order {order_id} is {status:?} and can no longer be modified")]
    OrderLocked { order_id: String, status: OrderStatus },

    /// Tried to mark an order paid without a payment method.
    #[error("Order {order_id} needs a payment method before it can be paid")]
    PaymentMethodRequired { order_id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
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

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
