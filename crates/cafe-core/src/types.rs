//! # Domain Types
//!
//! Core domain types used throughout the café back office.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   Promotion     │   │   Ingredient    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  kind + value   │   │  unit           │       │
//! │  │  name           │   │  starts/ends_at │   │  unit_cost      │       │
//! │  │  price          │   │  is_active      │   │  (latest buy)   │       │
//! │  └─────────────────┘   └─────────────────┘   └────────┬────────┘       │
//! │                                                       │                 │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌────────┴────────┐       │
//! │  │  StaffMember    │   │     Shift       │   │     Recipe      │       │
//! │  │  hourly_rate    │◄──│ start/end time  │   │  product_id     │       │
//! │  └─────────────────┘   └─────────────────┘   │  [RecipeLine]   │       │
//! │            ▲                   ▲              └─────────────────┘       │
//! │            └── WorkScheduleEntry (staff, date, shift)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Orders live in [`crate::order`]; they reference these entities by id only
//! (weak references), so an order survives the deletion of anything it points at.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Percentage
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1000 bps = 10% (a typical happy-hour promotion)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percentage(u32);

impl Percentage {
    /// 100% in basis points.
    pub const FULL_BPS: u32 = 10_000;

    /// Creates a percentage from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percentage(bps)
    }

    /// Creates a percentage from a whole-number percent (10 → 10%).
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        Percentage(pct * 100)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Zero percent.
    #[inline]
    pub const fn zero() -> Self {
        Percentage(0)
    }

    /// Caps the rate at 100%.
    #[inline]
    pub fn capped(self) -> Self {
        Percentage(self.0.min(Self::FULL_BPS))
    }
}

impl Default for Percentage {
    fn default() -> Self {
        Percentage::zero()
    }
}

// =============================================================================
// Weak References
// =============================================================================

/// A reference to an entity the order does not own (staff, customer, table).
///
/// The display name is captured when the reference is set, so bills still
/// print something sensible after the referenced record is renamed or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EntityRef {
    pub id: String,
    pub name: String,
}

impl EntityRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        EntityRef {
            id: id.into(),
            name: name.into(),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A menu item available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to staff and on the bill.
    pub name: String,

    /// Menu category ("Coffee", "Tea", "Pastry").
    pub category: Option<String>,

    /// Current catalog price. Orders snapshot this at sale time.
    pub price: Money,

    /// Whether the product is on the menu (soft delete).
    pub is_active: bool,
}

// =============================================================================
// Promotion
// =============================================================================

/// How a promotion's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `value` is basis points of the subtotal (1000 = 10%).
    Percentage,
    /// `value` is an amount in minor units.
    FlatAmount,
}

/// A time-bounded discount rule applied to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: String,
    pub name: String,
    pub kind: DiscountKind,
    /// Basis points for `Percentage`, minor units for `FlatAmount`.
    pub value: i64,
    #[ts(as = "String")]
    pub starts_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Promotion {
    /// A promotion applies only while active and within its window (inclusive).
    ///
    /// ## Example
    /// ```text
    ///   starts_at                 ends_at
    ///      │◄──────── valid ────────►│
    /// ─────┼─────────────────────────┼──────► time
    ///   ✗  ✓            ✓            ✓  ✗
    /// ```
    pub fn is_applicable_at(&self, at: DateTime<Utc>) -> bool {
        self.is_active && self.starts_at <= at && at <= self.ends_at
    }

    /// Returns the discount this promotion grants on `subtotal`,
    /// clamped to `[0, subtotal]`.
    pub fn discount_on(&self, subtotal: Money) -> Money {
        if !subtotal.is_positive() || self.value <= 0 {
            return Money::zero();
        }

        let raw = match self.kind {
            DiscountKind::Percentage => {
                let bps = u32::try_from(self.value).unwrap_or(Percentage::FULL_BPS);
                subtotal.percentage_of(Percentage::from_bps(bps).capped())
            }
            DiscountKind::FlatAmount => Money::from_minor(self.value),
        };

        raw.clamp_between(Money::zero(), subtotal)
    }
}

// =============================================================================
// Ingredients & Recipes
// =============================================================================

/// A stock ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: String,
    pub name: String,
    /// Unit of measure for recipe quantities ("g", "ml", "pcs").
    pub unit: String,
    /// Cost of one `unit` at the most recent purchase.
    pub unit_cost: Money,
}

/// One ingredient requirement of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RecipeLine {
    pub ingredient_id: String,
    /// Amount of the ingredient's unit consumed per product sold.
    #[ts(type = "string")]
    pub quantity: Decimal,
}

/// Maps a product to the ingredients one serving consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub product_id: String,
    pub lines: Vec<RecipeLine>,
}

// =============================================================================
// Staff & Shifts
// =============================================================================

/// An employee on the payroll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub id: String,
    pub name: String,
    pub hourly_rate: Money,
    pub is_active: bool,
}

/// A named, fixed-duration work period ("Morning 06:00–14:00").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub start_time: NaiveTime,
    #[ts(as = "String")]
    pub end_time: NaiveTime,
}

impl Shift {
    /// Length of the shift in minutes.
    ///
    /// A shift whose end is not after its start runs past midnight
    /// (22:00–06:00 is 8 hours). Equal start and end means a 24h shift.
    pub fn duration_minutes(&self) -> i64 {
        let minutes = (self.end_time - self.start_time).num_minutes();
        if minutes > 0 {
            minutes
        } else {
            minutes + 24 * 60
        }
    }

    /// Pay for one staff member working this shift at `hourly_rate`.
    pub fn pay_at(&self, hourly_rate: Money) -> Money {
        let exact = hourly_rate.minor() as i128 * self.duration_minutes() as i128;
        // Round half up to the nearest minor unit
        Money::from_minor(((exact + 30) / 60) as i64)
    }
}

/// A staff member assigned to a shift on a given date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct WorkScheduleEntry {
    pub id: String,
    pub staff_id: String,
    #[ts(as = "String")]
    pub work_date: NaiveDate,
    pub shift_id: String,
}

// =============================================================================
// Store Identity
// =============================================================================

/// Static store fields printed on every bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StoreIdentity {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub thank_you_message: String,
}

impl Default for StoreIdentity {
    fn default() -> Self {
        StoreIdentity {
            name: "Café POS Dev Store".to_string(),
            address: "12 Nguyen Hue, District 1".to_string(),
            phone: "028 0000 0000".to_string(),
            thank_you_message: "Thank you and see you again!".to_string(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
