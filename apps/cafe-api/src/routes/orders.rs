//! # Order Routes
//!
//! Order lifecycle plus the derived views (totals, bill, text receipt).
//!
//! Every mutation follows the same shape: load the order, apply the change
//! through the aggregate's invariant-checking method, then persist with a
//! guarded write so a concurrent payment or cancellation surfaces as 409.
//!
//! ```text
//! POST /api/orders/{id}/items
//!       │
//!       ├── orders.require(id)           404 if missing
//!       ├── catalog.get_product(pid)     404 if missing, 400 if inactive
//!       ├── order.add_line(line)         422 if paid/cancelled, 400 if invalid
//!       └── orders.add_item(id, line)    409 if it changed meanwhile
//! ```

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use cafe_core::{
    BillView, EntityRef, NewOrder, Order, OrderChannel, OrderLine, OrderStatus, OrderTotals,
    PaymentMethod, Promotion,
};
use cafe_db::generate_order_item_id;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/{id}", get(get_order))
        .route("/{id}/items", post(add_item))
        .route("/{id}/status", post(change_status))
        .route("/{id}/payment-method", put(set_payment_method))
        .route("/{id}/promotion", put(set_promotion))
        .route("/{id}/totals", get(get_totals))
        .route("/{id}/bill", get(get_bill))
        .route("/{id}/bill/text", get(get_bill_text))
}

// =============================================================================
// Request Bodies
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub channel: OrderChannel,
    #[serde(default)]
    pub staff: Option<EntityRef>,
    #[serde(default)]
    pub customer: Option<EntityRef>,
    #[serde(default)]
    pub table: Option<EntityRef>,
    #[serde(default)]
    pub items: Vec<AddItemRequest>,
}

/// Line item by catalog product; name and price are snapshotted from the
/// catalog at the time of the request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStatusRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodRequest {
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionRequest {
    /// `null` detaches the current promotion.
    pub promotion_id: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let mut order = Order::new(NewOrder {
        id: Uuid::new_v4().to_string(),
        // Assigned by the repository on insert
        order_number: String::new(),
        ordered_at: Utc::now(),
        channel: req.channel,
        staff: req.staff,
        customer: req.customer,
        table: req.table,
    });

    for item in &req.items {
        let line = priced_line(&state, item).await?;
        order.add_line(line)?;
    }

    let order = state.db.orders().create(order).await?;
    info!(
        id = %order.id(),
        order_number = %order.order_number(),
        lines = order.lines().len(),
        "Order created"
    );

    Ok((StatusCode::CREATED, Json(order)))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.db.orders().require(&id).await?))
}

async fn add_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AddItemRequest>,
) -> ApiResult<Json<Order>> {
    let orders = state.db.orders();
    let mut order = orders.require(&id).await?;

    let line = priced_line(&state, &req).await?;
    order.add_line(line.clone())?;
    orders.add_item(&id, &line).await?;

    Ok(Json(order))
}

async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ChangeStatusRequest>,
) -> ApiResult<Json<Order>> {
    let orders = state.db.orders();
    let mut order = orders.require(&id).await?;
    let expected = order.status();
    let now = Utc::now();

    match (req.status, req.payment_method) {
        (OrderStatus::Paid, Some(method)) => order.mark_paid(method, now)?,
        (next, _) => order.transition_to(next, now)?,
    }

    orders.update_status(&order, expected).await?;
    info!(id = %id, from = ?expected, to = ?order.status(), "Order status changed");

    Ok(Json(order))
}

async fn set_payment_method(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<PaymentMethodRequest>,
) -> ApiResult<Json<Order>> {
    let orders = state.db.orders();
    let mut order = orders.require(&id).await?;

    order.assign_payment_method(req.payment_method)?;
    orders.set_payment_method(&id, req.payment_method).await?;

    Ok(Json(order))
}

async fn set_promotion(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<PromotionRequest>,
) -> ApiResult<Json<Order>> {
    let orders = state.db.orders();
    let mut order = orders.require(&id).await?;

    if let Some(promotion_id) = &req.promotion_id {
        if state.db.promotions().get_by_id(promotion_id).await?.is_none() {
            return Err(ApiError::not_found("Promotion", promotion_id));
        }
    }

    order.apply_promotion(req.promotion_id.clone())?;
    orders.set_promotion(&id, req.promotion_id.as_deref()).await?;

    Ok(Json(order))
}

async fn get_totals(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderTotals>> {
    let (_, totals) = order_with_totals(&state, &id).await?;
    Ok(Json(totals))
}

async fn get_bill(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<BillView>> {
    let (order, totals) = order_with_totals(&state, &id).await?;
    Ok(Json(state.bill.format(&order, &totals)))
}

async fn get_bill_text(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let (order, totals) = order_with_totals(&state, &id).await?;
    let text = state
        .bill
        .format(&order, &totals)
        .render_text(&state.currency, state.receipt_width);

    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text))
}

// =============================================================================
// Helpers
// =============================================================================

/// Builds a line item from the catalog's current name and price.
async fn priced_line(state: &AppState, item: &AddItemRequest) -> ApiResult<OrderLine> {
    let product = state
        .db
        .catalog()
        .get_product(&item.product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &item.product_id))?;

    if !product.is_active {
        return Err(ApiError::validation(format!(
            "Product {} is not available",
            product.id
        )));
    }

    Ok(OrderLine {
        id: generate_order_item_id(),
        product_id: product.id,
        name: product.name,
        quantity: item.quantity,
        unit_price: product.price,
    })
}

/// Loads an order and prices it. A promotion deleted since it was attached
/// simply stops applying.
async fn order_with_totals(state: &AppState, id: &str) -> ApiResult<(Order, OrderTotals)> {
    let order = state.db.orders().require(id).await?;

    let promotion: Option<Promotion> = match order.promotion_id() {
        Some(promotion_id) => state.db.promotions().get_by_id(promotion_id).await?,
        None => None,
    };

    let totals = state.pricing.totals(&order, promotion.as_ref());
    Ok((order, totals))
}
