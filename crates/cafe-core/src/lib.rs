//! # cafe-core: Pure Business Logic for the Café Back Office
//!
//! Orders, pricing, bills and period reports as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Café POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    cafe-api (axum REST)                         │   │
//! │  │    /api/orders ──► /api/orders/{id}/bill ──► /api/reports       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ cafe-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌──────┐  ┌────────┐  │   │
//! │  │   │  order  │  │ pricing │  │  bill   │  │report│  │ money  │  │   │
//! │  │   │  Order  │  │ Totals  │  │BillView │  │Profit│  │ Money  │  │   │
//! │  │   │ Status  │  │Surcharge│  │ text    │  │ Perf │  │Currency│  │   │
//! │  │   └─────────┘  └─────────┘  └─────────┘  └──────┘  └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    cafe-db (Database Layer)                     │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`order`] - Order aggregate and its lifecycle
//! - [`pricing`] - Subtotal, surcharge, discount and grand total
//! - [`bill`] - Printable bill projection
//! - [`report`] - Profit, product and promotion reports
//! - [`types`] - Catalog, promotion, recipe and staffing types
//! - [`money`] - Integer money and currency formatting
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same order, promotion and policy give the same totals
//! 2. **No I/O**: storage and HTTP live in `cafe-db` and `cafe-api`
//! 3. **Integer Money**: amounts are i64 minor units, never floats
//! 4. **Explicit Errors**: typed errors, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use cafe_core::{Money, Percentage};
//!
//! let subtotal = Money::from_minor(90_000);
//! let discount = subtotal.percentage_of(Percentage::from_percent(10));
//!
//! assert_eq!((subtotal - discount).minor(), 81_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bill;
pub mod error;
pub mod money;
pub mod order;
pub mod pricing;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use bill::{BillFormatter, BillView, DEFAULT_RECEIPT_WIDTH};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{CurrencyFormat, Money};
pub use order::{NewOrder, Order, OrderChannel, OrderLine, OrderParts, OrderStatus, PaymentMethod};
pub use pricing::{OrderTotals, PricingCalculator, SurchargePolicy};
pub use report::{
    DateRange, ProductPerformance, ProductSort, ProductSortKey, ProfitSummary,
    PromotionEffectiveness, ReportSnapshot, ReportSource, ReportingAggregator, SortDirection,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items in a single order.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity on a single line.
///
/// ## Business Reason
/// Catches typing 1000 instead of 10 at the counter.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest accepted price, cost or flat amount, in minor units (10^12).
///
/// Keeps `amount × MAX_ITEM_QUANTITY × MAX_ORDER_LINES` well inside `i64`.
pub const MAX_AMOUNT_MINOR: i64 = 1_000_000_000_000;
