//! # Reporting Aggregator
//!
//! Period-level financial summaries for the back-office dashboard.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ReportSource (cafe-db loads a ReportSnapshot for the range)          │
//! │   ├── paid orders ──► PricingCalculator ──► grand totals ──► revenue   │
//! │   │        │                                                            │
//! │   │        └── lines × recipe × latest ingredient cost ──► COGS        │
//! │   │                                                                     │
//! │   └── schedule entries × shift minutes × hourly rate ──► payroll       │
//! │                                                                         │
//! │   gross profit = revenue − COGS − payroll                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Estimates, Not a Ledger
//! Ingredient cost is the most recent purchase cost, applied to every sale in
//! the period. References that no longer resolve (deleted ingredient, staff
//! member or shift) contribute zero and are counted in
//! [`ProfitSummary::unresolved_references`] instead of failing the report.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::order::{Order, OrderStatus};
use crate::pricing::{OrderTotals, PricingCalculator};
use crate::types::{Ingredient, Promotion, Recipe, Shift, StaffMember, WorkScheduleEntry};

// =============================================================================
// Date Range
// =============================================================================

/// Inclusive range of calendar days (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    from: NaiveDate,
    #[ts(as = "String")]
    to: NaiveDate,
}

impl DateRange {
    /// Builds a range, rejecting `from > to`.
    ///
    /// ## Example
    /// ```rust
    /// use cafe_core::report::DateRange;
    /// use chrono::NaiveDate;
    ///
    /// let day = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
    /// assert!(DateRange::new(day, day).is_ok());
    /// assert!(DateRange::new(day.succ_opt().unwrap(), day).is_err());
    /// ```
    pub fn new(from: NaiveDate, to: NaiveDate) -> CoreResult<Self> {
        if from > to {
            return Err(CoreError::InvalidRange { from, to });
        }
        Ok(DateRange { from, to })
    }

    /// A range covering one day.
    pub fn single_day(day: NaiveDate) -> Self {
        DateRange { from: day, to: day }
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from <= day && day <= self.to
    }

    pub fn contains_instant(&self, at: DateTime<Utc>) -> bool {
        self.contains(at.date_naive())
    }
}

// =============================================================================
// Report Source
// =============================================================================

/// Read-only access to everything a report needs.
///
/// Implementations must not hand out unpaid orders from `paid_orders`.
pub trait ReportSource {
    /// Paid orders whose order timestamp falls in `range`.
    fn paid_orders(&self, range: &DateRange) -> Vec<&Order>;

    fn promotion(&self, id: &str) -> Option<&Promotion>;

    /// Recipe for a product. `None` is normal for products without one.
    fn recipe(&self, product_id: &str) -> Option<&Recipe>;

    fn ingredient(&self, id: &str) -> Option<&Ingredient>;

    /// Schedule entries whose work date falls in `range`.
    fn schedule(&self, range: &DateRange) -> Vec<&WorkScheduleEntry>;

    fn staff_member(&self, id: &str) -> Option<&StaffMember>;

    fn shift(&self, id: &str) -> Option<&Shift>;
}

/// In-memory [`ReportSource`], filled by the persistence layer or by tests.
#[derive(Debug, Clone, Default)]
pub struct ReportSnapshot {
    orders: Vec<Order>,
    promotions: HashMap<String, Promotion>,
    recipes: HashMap<String, Recipe>,
    ingredients: HashMap<String, Ingredient>,
    staff: HashMap<String, StaffMember>,
    shifts: HashMap<String, Shift>,
    schedule: Vec<WorkScheduleEntry>,
}

impl ReportSnapshot {
    pub fn new() -> Self {
        ReportSnapshot::default()
    }

    pub fn add_order(&mut self, order: Order) {
        self.orders.push(order);
    }

    pub fn add_promotion(&mut self, promotion: Promotion) {
        self.promotions.insert(promotion.id.clone(), promotion);
    }

    pub fn add_recipe(&mut self, recipe: Recipe) {
        self.recipes.insert(recipe.product_id.clone(), recipe);
    }

    pub fn add_ingredient(&mut self, ingredient: Ingredient) {
        self.ingredients.insert(ingredient.id.clone(), ingredient);
    }

    pub fn add_staff_member(&mut self, member: StaffMember) {
        self.staff.insert(member.id.clone(), member);
    }

    pub fn add_shift(&mut self, shift: Shift) {
        self.shifts.insert(shift.id.clone(), shift);
    }

    pub fn add_schedule_entry(&mut self, entry: WorkScheduleEntry) {
        self.schedule.push(entry);
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}

impl ReportSource for ReportSnapshot {
    fn paid_orders(&self, range: &DateRange) -> Vec<&Order> {
        self.orders
            .iter()
            .filter(|o| o.status() == OrderStatus::Paid && range.contains_instant(o.ordered_at()))
            .collect()
    }

    fn promotion(&self, id: &str) -> Option<&Promotion> {
        self.promotions.get(id)
    }

    fn recipe(&self, product_id: &str) -> Option<&Recipe> {
        self.recipes.get(product_id)
    }

    fn ingredient(&self, id: &str) -> Option<&Ingredient> {
        self.ingredients.get(id)
    }

    fn schedule(&self, range: &DateRange) -> Vec<&WorkScheduleEntry> {
        self.schedule
            .iter()
            .filter(|e| range.contains(e.work_date))
            .collect()
    }

    fn staff_member(&self, id: &str) -> Option<&StaffMember> {
        self.staff.get(id)
    }

    fn shift(&self, id: &str) -> Option<&Shift> {
        self.shifts.get(id)
    }
}

// =============================================================================
// Report Results
// =============================================================================

/// Revenue for one day of the range (days without paid orders are omitted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenue {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub order_count: u64,
    pub revenue: Money,
}

/// Revenue / profit summary for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProfitSummary {
    pub range: DateRange,
    pub order_count: u64,
    /// Σ grand totals of paid orders.
    pub revenue: Money,
    /// Σ discounts granted by promotions.
    pub discounts: Money,
    /// Σ surcharges collected.
    pub surcharges: Money,
    /// Estimated cost of goods sold.
    pub cogs: Money,
    pub payroll: Money,
    /// revenue − cogs − payroll (may be negative).
    pub gross_profit: Money,
    /// revenue / order_count, zero when there are no orders.
    pub average_order_value: Money,
    pub daily: Vec<DailyRevenue>,
    /// References skipped while costing (deleted ingredient, staff, shift).
    pub unresolved_references: u64,
}

/// Sales figures for one product over a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductPerformance {
    pub product_id: String,
    /// Name as printed on the most recent sale.
    pub name: String,
    pub quantity_sold: i64,
    /// Σ quantity × unit price, before order-level discount and surcharge.
    pub revenue: Money,
    pub estimated_cost: Money,
    pub estimated_profit: Money,
}

/// How much business a promotion drove over a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PromotionEffectiveness {
    pub promotion_id: String,
    pub name: String,
    pub order_count: u64,
    /// Σ grand totals of the orders it applied to.
    pub revenue: Money,
    pub total_discount: Money,
}

// =============================================================================
// Sorting
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortKey {
    #[default]
    Revenue,
    Quantity,
    Cost,
    Profit,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Ordering for [`ReportingAggregator::product_performance`].
/// Defaults to revenue, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductSort {
    pub key: ProductSortKey,
    pub direction: SortDirection,
}

impl ProductSort {
    pub fn new(key: ProductSortKey, direction: SortDirection) -> Self {
        ProductSort { key, direction }
    }

    fn compare(&self, a: &ProductPerformance, b: &ProductPerformance) -> Ordering {
        let primary = match self.key {
            ProductSortKey::Revenue => a.revenue.cmp(&b.revenue),
            ProductSortKey::Quantity => a.quantity_sold.cmp(&b.quantity_sold),
            ProductSortKey::Cost => a.estimated_cost.cmp(&b.estimated_cost),
            ProductSortKey::Profit => a.estimated_profit.cmp(&b.estimated_profit),
            ProductSortKey::Name => a.name.cmp(&b.name),
        };
        let primary = match self.direction {
            SortDirection::Asc => primary,
            SortDirection::Desc => primary.reverse(),
        };
        // Stable output regardless of map iteration order
        primary.then_with(|| a.product_id.cmp(&b.product_id))
    }
}

// =============================================================================
// Aggregator
// =============================================================================

/// Builds reports from a [`ReportSource`].
///
/// ## Example
/// ```rust
/// use cafe_core::pricing::PricingCalculator;
/// use cafe_core::report::{DateRange, ReportSnapshot, ReportingAggregator};
/// use chrono::NaiveDate;
///
/// let snapshot = ReportSnapshot::new();
/// let aggregator = ReportingAggregator::new(&snapshot, PricingCalculator::default());
///
/// let day = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
/// let summary = aggregator.profit_summary(DateRange::single_day(day));
/// assert!(summary.revenue.is_zero());
/// ```
pub struct ReportingAggregator<'a> {
    source: &'a dyn ReportSource,
    pricing: PricingCalculator,
}

impl<'a> ReportingAggregator<'a> {
    pub fn new(source: &'a dyn ReportSource, pricing: PricingCalculator) -> Self {
        ReportingAggregator { source, pricing }
    }

    /// Revenue, COGS, payroll and gross profit for `range`.
    pub fn profit_summary(&self, range: DateRange) -> ProfitSummary {
        let priced = self.priced_orders(&range);
        let mut costs = CostBook::new(self.source);

        let mut revenue = Money::zero();
        let mut discounts = Money::zero();
        let mut surcharges = Money::zero();
        let mut cogs = Money::zero();
        let mut daily: BTreeMap<NaiveDate, DailyRevenue> = BTreeMap::new();

        for (order, totals) in &priced {
            revenue += totals.grand_total;
            discounts += totals.discount;
            surcharges += totals.surcharge;

            for line in order.lines() {
                cogs += costs.unit_cost(&line.product_id).multiply_quantity(line.quantity);
            }

            let date = order.ordered_at().date_naive();
            let day = daily.entry(date).or_insert_with(|| DailyRevenue {
                date,
                order_count: 0,
                revenue: Money::zero(),
            });
            day.order_count += 1;
            day.revenue += totals.grand_total;
        }

        let (payroll, unresolved_shifts) = self.payroll(&range);
        let order_count = priced.len() as u64;
        let average_order_value = if order_count == 0 {
            Money::zero()
        } else {
            Money::from_minor(revenue.minor() / order_count as i64)
        };

        ProfitSummary {
            range,
            order_count,
            revenue,
            discounts,
            surcharges,
            cogs,
            payroll,
            gross_profit: revenue - cogs - payroll,
            average_order_value,
            daily: daily.into_values().collect(),
            unresolved_references: costs.unresolved + unresolved_shifts,
        }
    }

    /// Per-product sales for `range`, ordered by `sort`.
    pub fn product_performance(&self, range: DateRange, sort: ProductSort) -> Vec<ProductPerformance> {
        let mut costs = CostBook::new(self.source);
        let mut by_product: HashMap<String, (ProductPerformance, DateTime<Utc>)> = HashMap::new();

        for order in self.source.paid_orders(&range) {
            for line in order.lines() {
                let line_cost = costs.unit_cost(&line.product_id).multiply_quantity(line.quantity);
                let (entry, last_seen) = by_product
                    .entry(line.product_id.clone())
                    .or_insert_with(|| {
                        (
                            ProductPerformance {
                                product_id: line.product_id.clone(),
                                name: line.name.clone(),
                                quantity_sold: 0,
                                revenue: Money::zero(),
                                estimated_cost: Money::zero(),
                                estimated_profit: Money::zero(),
                            },
                            order.ordered_at(),
                        )
                    });

                if order.ordered_at() > *last_seen {
                    entry.name = line.name.clone();
                    *last_seen = order.ordered_at();
                }
                entry.quantity_sold += line.quantity;
                entry.revenue += line.line_total();
                entry.estimated_cost += line_cost;
            }
        }

        let mut rows: Vec<ProductPerformance> = by_product
            .into_values()
            .map(|(mut p, _)| {
                p.estimated_profit = p.revenue - p.estimated_cost;
                p
            })
            .collect();
        rows.sort_by(|a, b| sort.compare(a, b));
        rows
    }

    /// Orders and revenue attributed to each promotion that actually
    /// discounted at least one paid order in `range`, highest revenue first.
    pub fn promotion_effectiveness(&self, range: DateRange) -> Vec<PromotionEffectiveness> {
        let mut by_promotion: HashMap<String, PromotionEffectiveness> = HashMap::new();

        for (_, totals) in self.priced_orders(&range) {
            let Some(promotion_id) = totals.applied_promotion_id else {
                continue;
            };
            let name = self
                .source
                .promotion(&promotion_id)
                .map(|p| p.name.clone())
                .unwrap_or_default();

            let entry = by_promotion
                .entry(promotion_id.clone())
                .or_insert_with(|| PromotionEffectiveness {
                    promotion_id,
                    name,
                    order_count: 0,
                    revenue: Money::zero(),
                    total_discount: Money::zero(),
                });
            entry.order_count += 1;
            entry.revenue += totals.grand_total;
            entry.total_discount += totals.discount;
        }

        let mut rows: Vec<PromotionEffectiveness> = by_promotion.into_values().collect();
        rows.sort_by(|a, b| {
            b.revenue
                .cmp(&a.revenue)
                .then_with(|| a.promotion_id.cmp(&b.promotion_id))
        });
        rows
    }

    fn priced_orders(&self, range: &DateRange) -> Vec<(&'a Order, OrderTotals)> {
        self.source
            .paid_orders(range)
            .into_iter()
            .map(|order| {
                let promotion = order.promotion_id().and_then(|id| self.source.promotion(id));
                let totals = self.pricing.totals(order, promotion);
                (order, totals)
            })
            .collect()
    }

    /// Σ shift pay for schedule entries in range, plus the count of entries
    /// whose staff member or shift no longer exists.
    fn payroll(&self, range: &DateRange) -> (Money, u64) {
        let mut total = Money::zero();
        let mut unresolved = 0;

        for entry in self.source.schedule(range) {
            match (
                self.source.staff_member(&entry.staff_id),
                self.source.shift(&entry.shift_id),
            ) {
                (Some(staff), Some(shift)) => total += shift.pay_at(staff.hourly_rate),
                _ => unresolved += 1,
            }
        }

        (total, unresolved)
    }
}

/// Memoized per-product unit cost for one report run.
struct CostBook<'a> {
    source: &'a dyn ReportSource,
    unit_costs: HashMap<String, Money>,
    unresolved: u64,
}

impl<'a> CostBook<'a> {
    fn new(source: &'a dyn ReportSource) -> Self {
        CostBook {
            source,
            unit_costs: HashMap::new(),
            unresolved: 0,
        }
    }

    /// Ingredient cost of one serving. Products without a recipe cost zero.
    fn unit_cost(&mut self, product_id: &str) -> Money {
        if let Some(cost) = self.unit_costs.get(product_id) {
            return *cost;
        }

        let mut cost = Money::zero();
        if let Some(recipe) = self.source.recipe(product_id) {
            for line in &recipe.lines {
                match self.source.ingredient(&line.ingredient_id) {
                    Some(ingredient) => cost += ingredient.unit_cost.multiply_decimal(line.quantity),
                    None => self.unresolved += 1,
                }
            }
        }

        self.unit_costs.insert(product_id.to_string(), cost);
        cost
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
