//! # Report Repository
//!
//! Loads everything a report over a date range needs into a
//! [`ReportSnapshot`], so the aggregation in cafe-core runs without I/O.
//!
//! ```text
//! paid orders in range ─┐
//! promotions ───────────┤
//! recipes + ingredients ┼──► ReportSnapshot ──► ReportingAggregator
//! staff + shifts ───────┤
//! schedule in range ────┘
//! ```
//!
//! Reference data (promotions, recipes, ingredients, staff, shifts) is loaded
//! in full: a café catalog is small, and it keeps deleted-row detection in one
//! place (the aggregator) instead of half here and half there.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;
use crate::repository::catalog::CatalogRepository;
use crate::repository::order::OrderRepository;
use crate::repository::promotion::PromotionRepository;
use crate::repository::staff::StaffRepository;
use cafe_core::{DateRange, ReportSnapshot};

/// Repository for loading report inputs.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Loads a snapshot for `range`.
    pub async fn load_snapshot(&self, range: &DateRange) -> DbResult<ReportSnapshot> {
        debug!(from = %range.from(), to = %range.to(), "Loading report snapshot");

        let orders = OrderRepository::new(self.pool.clone())
            .list_paid_between(range.from(), range.to())
            .await?;
        let promotions = PromotionRepository::new(self.pool.clone()).list().await?;

        let catalog = CatalogRepository::new(self.pool.clone());
        let recipes = catalog.list_recipes().await?;
        let ingredients = catalog.list_ingredients().await?;

        let staff = StaffRepository::new(self.pool.clone());
        let members = staff.list_members().await?;
        let shifts = staff.list_shifts().await?;
        let schedule = staff.list_schedule(range.from(), range.to()).await?;

        info!(
            orders = orders.len(),
            schedule_entries = schedule.len(),
            "Report snapshot loaded"
        );

        let mut snapshot = ReportSnapshot::new();
        orders.into_iter().for_each(|o| snapshot.add_order(o));
        promotions.into_iter().for_each(|p| snapshot.add_promotion(p));
        recipes.into_iter().for_each(|r| snapshot.add_recipe(r));
        ingredients.into_iter().for_each(|i| snapshot.add_ingredient(i));
        members.into_iter().for_each(|m| snapshot.add_staff_member(m));
        shifts.into_iter().for_each(|s| snapshot.add_shift(s));
        schedule.into_iter().for_each(|e| snapshot.add_schedule_entry(e));

        Ok(snapshot)
    }
}
