//! # Report Routes
//!
//! Dashboard figures over an inclusive date range (`?from=YYYY-MM-DD&to=YYYY-MM-DD`).
//! Each request loads one snapshot and runs the pure aggregator over it.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;

use cafe_core::{
    DateRange, ProductPerformance, ProductSort, ProductSortKey, ProfitSummary,
    PromotionEffectiveness, ReportSnapshot, ReportingAggregator, SortDirection,
};

use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summary", get(summary))
        .route("/products", get(products))
        .route("/promotions", get(promotions))
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(default)]
    pub sort: ProductSortKey,
    #[serde(default)]
    pub direction: SortDirection,
}

async fn summary(
    State(state): State<AppState>,
    Query(q): Query<RangeQuery>,
) -> ApiResult<Json<ProfitSummary>> {
    let (range, snapshot) = load(&state, q.from, q.to).await?;
    let aggregator = ReportingAggregator::new(&snapshot, state.pricing);
    Ok(Json(aggregator.profit_summary(range)))
}

async fn products(
    State(state): State<AppState>,
    Query(q): Query<ProductsQuery>,
) -> ApiResult<Json<Vec<ProductPerformance>>> {
    let (range, snapshot) = load(&state, q.from, q.to).await?;
    let aggregator = ReportingAggregator::new(&snapshot, state.pricing);
    Ok(Json(aggregator.product_performance(
        range,
        ProductSort::new(q.sort, q.direction),
    )))
}

async fn promotions(
    State(state): State<AppState>,
    Query(q): Query<RangeQuery>,
) -> ApiResult<Json<Vec<PromotionEffectiveness>>> {
    let (range, snapshot) = load(&state, q.from, q.to).await?;
    let aggregator = ReportingAggregator::new(&snapshot, state.pricing);
    Ok(Json(aggregator.promotion_effectiveness(range)))
}

async fn load(
    state: &AppState,
    from: NaiveDate,
    to: NaiveDate,
) -> ApiResult<(DateRange, ReportSnapshot)> {
    let range = DateRange::new(from, to)?;
    let snapshot = state.db.reports().load_snapshot(&range).await?;
    Ok((range, snapshot))
}
