//! # Order Aggregate
//!
//! One customer transaction: header fields plus the ordered line items.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── Order::new() → Order { status: Pending, lines: [] }            │
//! │                                                                         │
//! │  2. TAKE ITEMS                                                         │
//! │     └── add_line() / remove_line()        (unit price is a snapshot)   │
//! │     └── transition_to(InProgress)         (barista starts making it)   │
//! │                                                                         │
//! │  3. SETTLE                                                             │
//! │     └── assign_payment_method(Cash)                                    │
//! │     └── transition_to(Paid) → lines frozen, reporting input            │
//! │                                                                         │
//! │  4. (OPTIONAL) CANCEL before payment                                   │
//! │     └── transition_to(Cancelled) → lines frozen, excluded from reports │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Fields are private: the only way to change an order is through methods that
//! check the lifecycle rules. Storage rebuilds orders with [`Order::from_parts`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::EntityRef;
use crate::validation::{validate_amount, validate_name, validate_order_size, validate_quantity};

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order taken, nothing prepared yet.
    Pending,
    /// Being prepared / served.
    InProgress,
    /// Settled. Terminal.
    Paid,
    /// Abandoned before payment. Terminal.
    Cancelled,
}

impl OrderStatus {
    /// Whether no further transitions are possible.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Cancelled)
    }

    /// Whether moving from `self` to `next` keeps the lifecycle monotonic.
    ///
    /// Pending may jump straight to Paid (takeaway paid at the counter).
    pub const fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress)
                | (Pending, Paid)
                | (InProgress, Paid)
                | (Pending, Cancelled)
                | (InProgress, Cancelled)
        )
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

// =============================================================================
// Order Channel & Payment Method
// =============================================================================

/// Where the customer consumes the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderChannel {
    DineIn,
    Takeaway,
}

impl Default for OrderChannel {
    fn default() -> Self {
        OrderChannel::DineIn
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    EWallet,
}

impl PaymentMethod {
    /// Label printed on the bill.
    pub const fn label(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::BankTransfer => "Bank transfer",
            PaymentMethod::EWallet => "E-wallet",
        }
    }
}

// =============================================================================
// Order Line
// =============================================================================

/// A line item in an order.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name: String,
    pub quantity: i64,
    /// Unit price at time of sale (frozen, never repriced).
    pub unit_price: Money,
}

impl OrderLine {
    /// Returns `quantity × unit_price`.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Order
// =============================================================================

/// Header fields for a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: String,
    pub order_number: String,
    pub ordered_at: DateTime<Utc>,
    pub channel: OrderChannel,
    pub staff: Option<EntityRef>,
    pub customer: Option<EntityRef>,
    pub table: Option<EntityRef>,
}

/// Every field of an order, as stored.
///
/// Used by the persistence layer to rebuild an [`Order`] that was valid
/// when it was written.
#[derive(Debug, Clone)]
pub struct OrderParts {
    pub id: String,
    pub order_number: String,
    pub ordered_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub channel: OrderChannel,
    pub staff: Option<EntityRef>,
    pub customer: Option<EntityRef>,
    pub table: Option<EntityRef>,
    pub payment_method: Option<PaymentMethod>,
    pub promotion_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub lines: Vec<OrderLine>,
}

/// A customer order with its line items.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: String,
    order_number: String,
    #[ts(as = "String")]
    ordered_at: DateTime<Utc>,
    status: OrderStatus,
    channel: OrderChannel,
    staff: Option<EntityRef>,
    customer: Option<EntityRef>,
    table: Option<EntityRef>,
    payment_method: Option<PaymentMethod>,
    promotion_id: Option<String>,
    #[ts(as = "Option<String>")]
    paid_at: Option<DateTime<Utc>>,
    lines: Vec<OrderLine>,
}

impl Order {
    /// Opens a new pending order with no lines.
    pub fn new(header: NewOrder) -> Self {
        Order {
            id: header.id,
            order_number: header.order_number,
            ordered_at: header.ordered_at,
            status: OrderStatus::Pending,
            channel: header.channel,
            staff: header.staff,
            customer: header.customer,
            table: header.table,
            payment_method: None,
            promotion_id: None,
            paid_at: None,
            lines: Vec::new(),
        }
    }

    /// Rebuilds an order from storage.
    pub fn from_parts(parts: OrderParts) -> Self {
        Order {
            id: parts.id,
            order_number: parts.order_number,
            ordered_at: parts.ordered_at,
            status: parts.status,
            channel: parts.channel,
            staff: parts.staff,
            customer: parts.customer,
            table: parts.table,
            payment_method: parts.payment_method,
            promotion_id: parts.promotion_id,
            paid_at: parts.paid_at,
            lines: parts.lines,
        }
    }

    /// Splits the order into its stored fields.
    pub fn into_parts(self) -> OrderParts {
        OrderParts {
            id: self.id,
            order_number: self.order_number,
            ordered_at: self.ordered_at,
            status: self.status,
            channel: self.channel,
            staff: self.staff,
            customer: self.customer,
            table: self.table,
            payment_method: self.payment_method,
            promotion_id: self.promotion_id,
            paid_at: self.paid_at,
            lines: self.lines,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn ordered_at(&self) -> DateTime<Utc> {
        self.ordered_at
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn channel(&self) -> OrderChannel {
        self.channel
    }

    pub fn staff(&self) -> Option<&EntityRef> {
        self.staff.as_ref()
    }

    pub fn customer(&self) -> Option<&EntityRef> {
        self.customer.as_ref()
    }

    pub fn table(&self) -> Option<&EntityRef> {
        self.table.as_ref()
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    pub fn promotion_id(&self) -> Option<&str> {
        self.promotion_id.as_deref()
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    /// Line items in the order they were recorded.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Total number of units across all lines.
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn is_paid(&self) -> bool {
        self.status == OrderStatus::Paid
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Appends a line item.
    ///
    /// ## Errors
    /// - `OrderLocked` once the order is paid or cancelled
    /// - `Validation` for a non-positive quantity, negative price, empty name
    ///   or an order that already has the maximum number of lines
    pub fn add_line(&mut self, line: OrderLine) -> CoreResult<()> {
        self.ensure_editable()?;
        validate_quantity(line.quantity)?;
        validate_amount("unit price", line.unit_price.minor())?;
        validate_name("item name", &line.name)?;
        validate_order_size(self.lines.len())?;

        self.lines.push(line);
        Ok(())
    }

    /// Removes a line item by id, returning it.
    pub fn remove_line(&mut self, line_id: &str) -> CoreResult<OrderLine> {
        self.ensure_editable()?;

        let pos = self
            .lines
            .iter()
            .position(|l| l.id == line_id)
            .ok_or_else(|| CoreError::not_found("Order line", line_id))?;

        Ok(self.lines.remove(pos))
    }

    /// Sets or replaces the payment method.
    pub fn assign_payment_method(&mut self, method: PaymentMethod) -> CoreResult<()> {
        self.ensure_editable()?;
        self.payment_method = Some(method);
        Ok(())
    }

    /// Attaches a promotion reference, or clears it with `None`.
    ///
    /// Validity is not checked here: an out-of-window promotion is simply
    /// ignored when totals are computed.
    pub fn apply_promotion(&mut self, promotion_id: Option<String>) -> CoreResult<()> {
        self.ensure_editable()?;
        self.promotion_id = promotion_id;
        Ok(())
    }

    /// Moves the order forward in its lifecycle.
    ///
    /// ## Errors
    /// - `InvalidStatusTransition` for backwards moves, same-status moves and
    ///   anything out of a terminal state
    /// - `PaymentMethodRequired` when moving to `Paid` without one
    pub fn transition_to(&mut self, next: OrderStatus, at: DateTime<Utc>) -> CoreResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(CoreError::InvalidStatusTransition {
                order_id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }

        if next == OrderStatus::Paid {
            if self.payment_method.is_none() {
                return Err(CoreError::PaymentMethodRequired {
                    order_id: self.id.clone(),
                });
            }
            self.paid_at = Some(at);
        }

        self.status = next;
        Ok(())
    }

    /// Assigns the payment method and marks the order paid in one step.
    pub fn mark_paid(&mut self, method: PaymentMethod, at: DateTime<Utc>) -> CoreResult<()> {
        if !self.status.can_transition_to(OrderStatus::Paid) {
            return Err(CoreError::InvalidStatusTransition {
                order_id: self.id.clone(),
                from: self.status,
                to: OrderStatus::Paid,
            });
        }
        self.payment_method = Some(method);
        self.transition_to(OrderStatus::Paid, at)
    }

    fn ensure_editable(&self) -> CoreResult<()> {
        if self.status.is_terminal() {
            return Err(CoreError::OrderLocked {
                order_id: self.id.clone(),
                status: self.status,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
