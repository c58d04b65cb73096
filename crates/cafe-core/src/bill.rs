//! # Bill Formatter
//!
//! Projects an order and its already-computed totals into the invoice the
//! customer receives. No prices are recalculated here.
//!
//! ## Bill Layout
//! ```text
//! ┌──────────────────────────────────────────┐
//! │            Café POS Dev Store            │  ◄── StoreIdentity
//! │        12 Nguyen Hue, District 1         │
//! │            Tel: 028 0000 0000            │
//! │------------------------------------------│
//! │ Bill: 20260310-0001                      │  ◄── BillHeader
//! │ Date: 10/03/2026 09:00                   │
//! │ Table: Table 4                           │
//! │------------------------------------------│
//! │ Cà phê sữa                               │  ◄── BillLine (recorded order)
//! │   2 x 25.000 ₫                  50.000 ₫ │
//! │------------------------------------------│
//! │ Subtotal                        90.000 ₫ │  ◄── BillTotals
//! │ Discount                        -9.000 ₫ │
//! │ TOTAL                           81.000 ₫ │
//! │------------------------------------------│
//! │       Thank you and see you again!       │
//! └──────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use ts_rs::TS;

use crate::money::{CurrencyFormat, Money};
use crate::order::{Order, OrderChannel, OrderStatus, PaymentMethod};
use crate::pricing::OrderTotals;
use crate::types::StoreIdentity;

/// Default paper width in characters (80mm thermal printers).
pub const DEFAULT_RECEIPT_WIDTH: usize = 42;

// =============================================================================
// Bill View
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BillHeader {
    pub order_id: String,
    pub bill_number: String,
    #[ts(as = "String")]
    pub ordered_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub channel: OrderChannel,
    pub table: Option<String>,
    pub staff: Option<String>,
    pub customer: Option<String>,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BillLine {
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BillTotals {
    pub subtotal: Money,
    pub surcharge: Money,
    pub discount: Money,
    pub grand_total: Money,
}

/// Printable invoice for one order.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BillView {
    pub store: StoreIdentity,
    pub header: BillHeader,
    pub lines: Vec<BillLine>,
    pub totals: BillTotals,
}

// =============================================================================
// Formatter
// =============================================================================

/// Builds [`BillView`]s for one store.
#[derive(Debug, Clone)]
pub struct BillFormatter {
    store: StoreIdentity,
}

impl BillFormatter {
    pub fn new(store: StoreIdentity) -> Self {
        BillFormatter { store }
    }

    pub fn store(&self) -> &StoreIdentity {
        &self.store
    }

    /// Projects `order` and its `totals` into a bill.
    ///
    /// Line totals come from `totals`; a line the totals do not mention (the
    /// caller passed totals for a different revision of the order) falls back
    /// to its own `quantity × unit_price`.
    pub fn format(&self, order: &Order, totals: &OrderTotals) -> BillView {
        let computed: HashMap<&str, Money> = totals
            .lines
            .iter()
            .map(|l| (l.line_id.as_str(), l.line_total))
            .collect();

        let lines = order
            .lines()
            .iter()
            .map(|l| BillLine {
                name: l.name.clone(),
                quantity: l.quantity,
                unit_price: l.unit_price,
                line_total: computed
                    .get(l.id.as_str())
                    .copied()
                    .unwrap_or_else(|| l.line_total()),
            })
            .collect();

        BillView {
            store: self.store.clone(),
            header: BillHeader {
                order_id: order.id().to_string(),
                bill_number: order.order_number().to_string(),
                ordered_at: order.ordered_at(),
                status: order.status(),
                channel: order.channel(),
                table: order.table().map(|t| t.name.clone()),
                staff: order.staff().map(|s| s.name.clone()),
                customer: order.customer().map(|c| c.name.clone()),
                payment_method: order.payment_method(),
            },
            lines,
            totals: BillTotals {
                subtotal: totals.subtotal,
                surcharge: totals.surcharge,
                discount: totals.discount,
                grand_total: totals.grand_total,
            },
        }
    }
}

// =============================================================================
// Text Rendering
// =============================================================================

impl BillView {
    /// Renders a fixed-width plain-text receipt.
    ///
    /// `width` is in characters; values below 24 are raised to 24.
    pub fn render_text(&self, currency: &CurrencyFormat, width: usize) -> String {
        let width = width.max(24);
        let rule = "-".repeat(width);
        let mut out: Vec<String> = Vec::new();

        out.push(center(&self.store.name, width));
        if !self.store.address.is_empty() {
            out.push(center(&self.store.address, width));
        }
        if !self.store.phone.is_empty() {
            out.push(center(&format!("Tel: {}", self.store.phone), width));
        }
        out.push(rule.clone());

        out.push(format!("Bill: {}", self.header.bill_number));
        out.push(format!(
            "Date: {}",
            self.header.ordered_at.format("%d/%m/%Y %H:%M")
        ));
        match (&self.header.table, self.header.channel) {
            (Some(table), _) => out.push(format!("Table: {}", table)),
            (None, OrderChannel::Takeaway) => out.push("Takeaway".to_string()),
            (None, OrderChannel::DineIn) => {}
        }
        if let Some(staff) = &self.header.staff {
            out.push(format!("Staff: {}", staff));
        }
        if let Some(customer) = &self.header.customer {
            out.push(format!("Customer: {}", customer));
        }
        out.push(rule.clone());

        for line in &self.lines {
            out.push(line.name.clone());
            out.push(two_columns(
                &format!(
                    "  {} x {}",
                    line.quantity,
                    currency.format(line.unit_price)
                ),
                &currency.format(line.line_total),
                width,
            ));
        }
        out.push(rule.clone());

        out.push(two_columns("Subtotal", &currency.format(self.totals.subtotal), width));
        if !self.totals.surcharge.is_zero() {
            out.push(two_columns("Surcharge", &currency.format(self.totals.surcharge), width));
        }
        if !self.totals.discount.is_zero() {
            out.push(two_columns(
                "Discount",
                &currency.format(Money::zero() - self.totals.discount),
                width,
            ));
        }
        out.push(two_columns("TOTAL", &currency.format(self.totals.grand_total), width));
        if let Some(method) = self.header.payment_method {
            out.push(format!("Payment: {}", method.label()));
        }
        out.push(rule);

        if !self.store.thank_you_message.is_empty() {
            out.push(center(&self.store.thank_you_message, width));
        }

        let mut text = out.join("\n");
        text.push('\n');
        text
    }
}

fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let pad = (width - len) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

fn two_columns(left: &str, right: &str, width: usize) -> String {
    let used = left.chars().count() + right.chars().count();
    let gap = width.saturating_sub(used).max(1);
    format!("{}{}{}", left, " ".repeat(gap), right)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{NewOrder, OrderLine};
    use crate::pricing::PricingCalculator;
    use crate::types::{DiscountKind, EntityRef, Promotion};
    use chrono::TimeZone;

    fn paid_order() -> (Order, Promotion) {
        let at = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        let mut order = Order::new(NewOrder {
            id: "order-1".to_string(),
            order_number: "20260310-0001".to_string(),
            ordered_at: at,
            channel: OrderChannel::DineIn,
            staff: Some(EntityRef::new("staff-1", "Lan")),
            customer: None,
            table: Some(EntityRef::new("table-4", "Table 4")),
        });
        order
            .add_line(OrderLine {
                id: "l1".to_string(),
                product_id: "p-latte".to_string(),
                name: "Cà phê sữa".to_string(),
                quantity: 2,
                unit_price: Money::from_minor(25_000),
            })
            .unwrap();
        order
            .add_line(OrderLine {
                id: "l2".to_string(),
                product_id: "p-tea".to_string(),
                name: "Trà đào".to_string(),
                quantity: 1,
                unit_price: Money::from_minor(40_000),
            })
            .unwrap();
        order.apply_promotion(Some("promo-10".to_string())).unwrap();
        order.mark_paid(PaymentMethod::Cash, at).unwrap();

        let promo = Promotion {
            id: "promo-10".to_string(),
            name: "10% off".to_string(),
            kind: DiscountKind::Percentage,
            value: 1000,
            starts_at: Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2026, 3, 31, 0, 0, 0).unwrap(),
            is_active: true,
        };
        (order, promo)
    }

    #[test]
    fn test_format_projects_order_and_totals() {
        let (order, promo) = paid_order();
        let totals = PricingCalculator::default().totals(&order, Some(&promo));
        let bill = BillFormatter::new(StoreIdentity::default()).format(&order, &totals);

        assert_eq!(bill.header.bill_number, "20260310-0001");
        assert_eq!(bill.header.table.as_deref(), Some("Table 4"));
        assert_eq!(bill.header.staff.as_deref(), Some("Lan"));
        assert_eq!(bill.header.payment_method, Some(PaymentMethod::Cash));

        let names: Vec<&str> = bill.lines.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Cà phê sữa", "Trà đào"]);
        assert_eq!(bill.lines[0].line_total.minor(), 50_000);

        assert_eq!(bill.totals.subtotal.minor(), 90_000);
        assert_eq!(bill.totals.discount.minor(), 9_000);
        assert_eq!(bill.totals.grand_total.minor(), 81_000);
    }

    #[test]
    fn test_render_text() {
        let (order, promo) = paid_order();
        let totals = PricingCalculator::default().totals(&order, Some(&promo));
        let bill = BillFormatter::new(StoreIdentity::default()).format(&order, &totals);

        let text = bill.render_text(&CurrencyFormat::default(), DEFAULT_RECEIPT_WIDTH);

        assert!(text.contains("Bill: 20260310-0001"));
        assert!(text.contains("Table: Table 4"));
        assert!(text.contains("Discount"));
        assert!(text.contains("-9.000 ₫"));
        assert!(text.contains("81.000 ₫"));
        assert!(text.contains("Payment: Cash"));
        assert!(!text.contains("Surcharge"));

        for line in text.lines() {
            assert!(line.chars().count() <= DEFAULT_RECEIPT_WIDTH, "{:?}", line);
        }
        let total_line = text.lines().find(|l| l.starts_with("TOTAL")).unwrap();
        assert_eq!(total_line.chars().count(), DEFAULT_RECEIPT_WIDTH);
    }

    #[test]
    fn test_lines_missing_from_totals_fall_back() {
        let (order, _) = paid_order();
        let mut totals = PricingCalculator::default().totals(&order, None);
        totals.lines.clear();

        let bill = BillFormatter::new(StoreIdentity::default()).format(&order, &totals);
        assert_eq!(bill.lines[1].line_total.minor(), 40_000);
    }
}
