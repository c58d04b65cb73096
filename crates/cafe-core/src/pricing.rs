//! # Pricing & Totals
//!
//! Derives every monetary figure of an order from its line items, the
//! attached promotion and the store's surcharge policy.
//!
//! ## Calculation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  lines ──► Σ qty × unit_price ──► subtotal                              │
//! │                                      │                                  │
//! │              ┌───────────────────────┼───────────────────────┐          │
//! │              ▼                                               ▼          │
//! │   SurchargePolicy                                 Promotion (if valid   │
//! │   none | flat | % of subtotal                     at ordered_at)        │
//! │              │                                    % or flat, clamped    │
//! │              ▼                                    to [0, subtotal]      │
//! │          surcharge                                      discount        │
//! │              └──────────────┬────────────────────────────┘              │
//! │                             ▼                                           │
//! │        grand_total = max(0, subtotal + surcharge − discount)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is pure: the same order, promotion and policy always give
//! the same totals. An expired, inactive or mismatched promotion is treated as
//! absent, never as an error.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::order::Order;
use crate::types::{Percentage, Promotion};

// =============================================================================
// Surcharge Policy
// =============================================================================

/// Store-wide service fee, configured outside the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SurchargePolicy {
    /// No surcharge.
    #[default]
    None,
    /// Fixed fee added to every order, including empty ones.
    Flat(Money),
    /// Share of the subtotal.
    Percentage(Percentage),
}

impl SurchargePolicy {
    /// Surcharge owed on `subtotal`.
    pub fn surcharge_on(&self, subtotal: Money) -> Money {
        match *self {
            SurchargePolicy::None => Money::zero(),
            SurchargePolicy::Flat(fee) => fee.floor_at_zero(),
            SurchargePolicy::Percentage(rate) => subtotal.percentage_of(rate).floor_at_zero(),
        }
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Per-line figures, in the order the lines were recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineTotal {
    pub line_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

/// Computed totals for one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub order_id: String,
    pub lines: Vec<LineTotal>,
    pub subtotal: Money,
    pub surcharge: Money,
    pub discount: Money,
    pub grand_total: Money,
    /// Promotion that actually produced the discount, if any.
    pub applied_promotion_id: Option<String>,
}

// =============================================================================
// Calculator
// =============================================================================

/// Computes [`OrderTotals`] under a fixed surcharge policy.
///
/// ## Example
/// ```rust
/// use cafe_core::pricing::{PricingCalculator, SurchargePolicy};
/// # use cafe_core::order::{NewOrder, Order, OrderChannel, OrderLine};
/// # use cafe_core::money::Money;
/// # use chrono::Utc;
/// # let mut order = Order::new(NewOrder {
/// #     id: "o".into(), order_number: "1".into(), ordered_at: Utc::now(),
/// #     channel: OrderChannel::Takeaway, staff: None, customer: None, table: None,
/// # });
/// # order.add_line(OrderLine {
/// #     id: "l".into(), product_id: "p".into(), name: "Latte".into(),
/// #     quantity: 2, unit_price: Money::from_minor(25_000),
/// # }).unwrap();
///
/// let calculator = PricingCalculator::new(SurchargePolicy::None);
/// let totals = calculator.totals(&order, None);
/// assert_eq!(totals.grand_total.minor(), 50_000);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PricingCalculator {
    surcharge: SurchargePolicy,
}

impl PricingCalculator {
    pub fn new(surcharge: SurchargePolicy) -> Self {
        PricingCalculator { surcharge }
    }

    pub fn surcharge_policy(&self) -> SurchargePolicy {
        self.surcharge
    }

    /// Computes totals for `order`.
    ///
    /// `promotion` is the record the order's promotion reference resolved to,
    /// if it resolved at all. It only counts when its id matches the order's
    /// reference and it is valid at the order's timestamp.
    pub fn totals(&self, order: &Order, promotion: Option<&Promotion>) -> OrderTotals {
        let lines: Vec<LineTotal> = order
            .lines()
            .iter()
            .map(|l| LineTotal {
                line_id: l.id.clone(),
                product_id: l.product_id.clone(),
                quantity: l.quantity,
                unit_price: l.unit_price,
                line_total: l.line_total(),
            })
            .collect();

        let subtotal: Money = lines.iter().map(|l| l.line_total).sum();
        let surcharge = self.surcharge.surcharge_on(subtotal);

        let applied = promotion.filter(|p| {
            order.promotion_id() == Some(p.id.as_str()) && p.is_applicable_at(order.ordered_at())
        });
        let discount = applied
            .map(|p| p.discount_on(subtotal))
            .unwrap_or_else(Money::zero);

        let grand_total = (subtotal + surcharge - discount).floor_at_zero();

        OrderTotals {
            order_id: order.id().to_string(),
            lines,
            subtotal,
            surcharge,
            discount,
            grand_total,
            applied_promotion_id: applied.map(|p| p.id.clone()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
