//! # Order Repository
//!
//! Database operations for orders and order items.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Handler loads Order ──► cafe-core method checks the rule ──► repo    │
//! │                                                                         │
//! │  Every write that depends on the order still being editable repeats    │
//! │  the check in its WHERE clause. If another request paid or cancelled   │
//! │  the order in between, zero rows match and the write reports           │
//! │  DbError::Conflict instead of silently editing a closed order.        │
//! │                                                                         │
//! │  insert()             orders + order_items in one transaction          │
//! │  create()             same, bill number assigned by the INSERT         │
//! │  add_item()           INSERT … SELECT … WHERE status is editable       │
//! │  update_status()      UPDATE … WHERE status = expected previous        │
//! │  set_payment_method() UPDATE … WHERE status is editable                │
//! │  set_promotion()      UPDATE … WHERE status is editable                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use cafe_core::{
    EntityRef, Money, Order, OrderChannel, OrderLine, OrderParts, OrderStatus, PaymentMethod,
};

const ORDER_COLUMNS: &str = r#"
    id, order_number, ordered_at, status, channel,
    staff_id, staff_name, customer_id, customer_name, table_id, table_name,
    payment_method, promotion_id, paid_at
"#;

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts an order together with its lines.
    pub async fn insert(&self, order: &Order) -> DbResult<()> {
        debug!(
            id = %order.id(),
            order_number = %order.order_number(),
            lines = order.lines().len(),
            "Inserting order"
        );

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, ordered_at, status, channel,
                staff_id, staff_name, customer_id, customer_name, table_id, table_name,
                payment_method, promotion_id, paid_at,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14,
                ?15, ?15
            )
            "#,
        )
        .bind(order.id())
        .bind(order.order_number())
        .bind(order.ordered_at())
        .bind(order.status())
        .bind(order.channel())
        .bind(order.staff().map(|e| e.id.as_str()))
        .bind(order.staff().map(|e| e.name.as_str()))
        .bind(order.customer().map(|e| e.id.as_str()))
        .bind(order.customer().map(|e| e.name.as_str()))
        .bind(order.table().map(|e| e.id.as_str()))
        .bind(order.table().map(|e| e.name.as_str()))
        .bind(order.payment_method())
        .bind(order.promotion_id())
        .bind(order.paid_at())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        insert_items(&mut tx, order.id(), order.lines()).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Inserts a new order and assigns its bill number (`YYYYMMDD-NNNN`).
    ///
    /// The number is computed by the INSERT itself from the highest number
    /// already used on the day of `ordered_at`, so concurrent creates can't
    /// pick the same one. Any number on the incoming order is ignored.
    pub async fn create(&self, order: Order) -> DbResult<Order> {
        let prefix = order.ordered_at().format("%Y%m%d").to_string();
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let order_number: String = sqlx::query_scalar(
            r#"
            INSERT INTO orders (
                id, order_number, ordered_at, status, channel,
                staff_id, staff_name, customer_id, customer_name, table_id, table_name,
                payment_method, promotion_id, paid_at,
                created_at, updated_at
            )
            SELECT
                ?1,
                ?2 || '-' || printf('%04d',
                    COALESCE(MAX(CAST(substr(order_number, 10) AS INTEGER)), 0) + 1),
                ?3, ?4, ?5,
                ?6, ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14,
                ?15, ?15
            FROM orders
            WHERE order_number LIKE ?2 || '-%'
            RETURNING order_number
            "#,
        )
        .bind(order.id())
        .bind(&prefix)
        .bind(order.ordered_at())
        .bind(order.status())
        .bind(order.channel())
        .bind(order.staff().map(|e| e.id.as_str()))
        .bind(order.staff().map(|e| e.name.as_str()))
        .bind(order.customer().map(|e| e.id.as_str()))
        .bind(order.customer().map(|e| e.name.as_str()))
        .bind(order.table().map(|e| e.id.as_str()))
        .bind(order.table().map(|e| e.name.as_str()))
        .bind(order.payment_method())
        .bind(order.promotion_id())
        .bind(order.paid_at())
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        insert_items(&mut tx, order.id(), order.lines()).await?;
        tx.commit().await?;

        debug!(
            id = %order.id(),
            order_number = %order_number,
            lines = order.lines().len(),
            "Created order"
        );

        Ok(Order::from_parts(OrderParts {
            order_number,
            ..order.into_parts()
        }))
    }

    /// Gets an order with its lines, in the order they were recorded.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let record = sqlx::query_as::<_, OrderRecord>(&format!(
            "SELECT {} FROM orders WHERE id = ?1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(record) = record else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItemRecord>(
            r#"
            SELECT id, order_id, product_id, name, quantity, unit_price
            FROM order_items
            WHERE order_id = ?1
            ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(record.into_order(items)))
    }

    /// Gets an order or fails with `NotFound`.
    pub async fn require(&self, id: &str) -> DbResult<Order> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }

    /// Appends a line to an order that is still pending or in progress.
    pub async fn add_item(&self, order_id: &str, line: &OrderLine) -> DbResult<()> {
        debug!(order_id = %order_id, product_id = %line.product_id, qty = line.quantity, "Adding order item");

        let result = sqlx::query(
            r#"
            INSERT INTO order_items (
                id, order_id, position, product_id, name, quantity, unit_price
            )
            SELECT
                ?1, ?2,
                COALESCE((SELECT MAX(position) FROM order_items WHERE order_id = ?2), -1) + 1,
                ?3, ?4, ?5, ?6
            WHERE EXISTS (
                SELECT 1 FROM orders
                WHERE id = ?2 AND status IN ('pending', 'in_progress')
            )
            "#,
        )
        .bind(&line.id)
        .bind(order_id)
        .bind(&line.product_id)
        .bind(&line.name)
        .bind(line.quantity)
        .bind(line.unit_price.minor())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.missing_or_conflict(order_id).await);
        }

        self.touch(order_id).await
    }

    /// Persists the status, payment method and paid timestamp of `order`,
    /// provided the stored status is still `expected`.
    pub async fn update_status(&self, order: &Order, expected: OrderStatus) -> DbResult<()> {
        debug!(
            id = %order.id(),
            from = ?expected,
            to = ?order.status(),
            "Updating order status"
        );

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = ?2,
                payment_method = ?3,
                paid_at = ?4,
                updated_at = ?5
            WHERE id = ?1 AND status = ?6
            "#,
        )
        .bind(order.id())
        .bind(order.status())
        .bind(order.payment_method())
        .bind(order.paid_at())
        .bind(Utc::now())
        .bind(expected)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.missing_or_conflict(order.id()).await);
        }

        Ok(())
    }

    /// Sets the payment method of an editable order.
    pub async fn set_payment_method(&self, order_id: &str, method: PaymentMethod) -> DbResult<()> {
        debug!(order_id = %order_id, method = ?method, "Assigning payment method");

        let result = sqlx::query(
            r#"
            UPDATE orders SET payment_method = ?2, updated_at = ?3
            WHERE id = ?1 AND status IN ('pending', 'in_progress')
            "#,
        )
        .bind(order_id)
        .bind(method)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.missing_or_conflict(order_id).await);
        }

        Ok(())
    }

    /// Attaches (`Some`) or detaches (`None`) a promotion on an editable order.
    pub async fn set_promotion(&self, order_id: &str, promotion_id: Option<&str>) -> DbResult<()> {
        debug!(order_id = %order_id, promotion_id = ?promotion_id, "Setting order promotion");

        let result = sqlx::query(
            r#"
            UPDATE orders SET promotion_id = ?2, updated_at = ?3
            WHERE id = ?1 AND status IN ('pending', 'in_progress')
            "#,
        )
        .bind(order_id)
        .bind(promotion_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.missing_or_conflict(order_id).await);
        }

        Ok(())
    }

    /// Paid orders whose UTC order date falls within `[from, to]`, oldest first.
    pub async fn list_paid_between(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<Order>> {
        let records = sqlx::query_as::<_, OrderRecord>(&format!(
            r#"
            SELECT {}
            FROM orders
            WHERE status = 'paid' AND date(ordered_at) BETWEEN ?1 AND ?2
            ORDER BY ordered_at, id
            "#,
            ORDER_COLUMNS
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, OrderItemRecord>(
            r#"
            SELECT oi.id, oi.order_id, oi.product_id, oi.name, oi.quantity, oi.unit_price
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE o.status = 'paid' AND date(o.ordered_at) BETWEEN ?1 AND ?2
            ORDER BY oi.order_id, oi.position
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: HashMap<String, Vec<OrderItemRecord>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id.clone()).or_default().push(item);
        }

        debug!(orders = records.len(), from = %from, to = %to, "Loaded paid orders");

        Ok(records
            .into_iter()
            .map(|r| {
                let items = by_order.remove(&r.id).unwrap_or_default();
                r.into_order(items)
            })
            .collect())
    }

    async fn touch(&self, order_id: &str) -> DbResult<()> {
        sqlx::query("UPDATE orders SET updated_at = ?2 WHERE id = ?1")
            .bind(order_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Classifies a guarded write that matched no row.
    async fn missing_or_conflict(&self, order_id: &str) -> DbError {
        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE id = ?1")
            .bind(order_id)
            .fetch_one(&self.pool)
            .await;

        match exists {
            Ok(0) => DbError::not_found("Order", order_id),
            Ok(_) => DbError::conflict("Order", order_id),
            Err(e) => e.into(),
        }
    }
}

/// Inserts order lines, keeping their position within the order.
async fn insert_items(
    tx: &mut Transaction<'_, Sqlite>,
    order_id: &str,
    lines: &[OrderLine],
) -> DbResult<()> {
    for (position, line) in lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO order_items (
                id, order_id, position, product_id, name, quantity, unit_price
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&line.id)
        .bind(order_id)
        .bind(position as i64)
        .bind(&line.product_id)
        .bind(&line.name)
        .bind(line.quantity)
        .bind(line.unit_price.minor())
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRecord {
    id: String,
    order_number: String,
    ordered_at: DateTime<Utc>,
    status: OrderStatus,
    channel: OrderChannel,
    staff_id: Option<String>,
    staff_name: Option<String>,
    customer_id: Option<String>,
    customer_name: Option<String>,
    table_id: Option<String>,
    table_name: Option<String>,
    payment_method: Option<PaymentMethod>,
    promotion_id: Option<String>,
    paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRecord {
    id: String,
    order_id: String,
    product_id: String,
    name: String,
    quantity: i64,
    unit_price: i64,
}

impl OrderRecord {
    fn into_order(self, items: Vec<OrderItemRecord>) -> Order {
        Order::from_parts(OrderParts {
            id: self.id,
            order_number: self.order_number,
            ordered_at: self.ordered_at,
            status: self.status,
            channel: self.channel,
            staff: entity_ref(self.staff_id, self.staff_name),
            customer: entity_ref(self.customer_id, self.customer_name),
            table: entity_ref(self.table_id, self.table_name),
            payment_method: self.payment_method,
            promotion_id: self.promotion_id,
            paid_at: self.paid_at,
            lines: items.into_iter().map(OrderLine::from).collect(),
        })
    }
}

impl From<OrderItemRecord> for OrderLine {
    fn from(r: OrderItemRecord) -> Self {
        OrderLine {
            id: r.id,
            product_id: r.product_id,
            name: r.name,
            quantity: r.quantity,
            unit_price: Money::from_minor(r.unit_price),
        }
    }
}

fn entity_ref(id: Option<String>, name: Option<String>) -> Option<EntityRef> {
    id.map(|id| EntityRef {
        id,
        name: name.unwrap_or_default(),
    })
}

/// Generates a new order item ID.
pub fn generate_order_item_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::{Database, DbConfig};
    use cafe_core::NewOrder;
    use chrono::TimeZone;

    async fn repo() -> OrderRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.orders()
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    fn line(id: &str, product: &str, qty: i64, price: i64) -> OrderLine {
        OrderLine {
            id: id.to_string(),
            product_id: product.to_string(),
            name: format!("{} name", product),
            quantity: qty,
            unit_price: Money::from_minor(price),
        }
    }

    fn new_order(id: &str, number: &str, when: DateTime<Utc>) -> Order {
        Order::new(NewOrder {
            id: id.to_string(),
            order_number: number.to_string(),
            ordered_at: when,
            channel: OrderChannel::DineIn,
            staff: Some(EntityRef::new("staff-1", "Lan")),
            customer: None,
            table: Some(EntityRef::new("table-4", "Table 4")),
        })
    }

    #[tokio::test]
    async fn test_insert_and_get_roundtrip() {
        let repo = repo().await;
        let mut order = new_order("o1", "20260310-0001", at(10, 9));
        order.add_line(line("l1", "latte", 2, 25_000)).unwrap();
        order.add_line(line("l2", "tea", 1, 40_000)).unwrap();

        repo.insert(&order).await.unwrap();

        let loaded = repo.get_by_id("o1").await.unwrap().unwrap();
        assert_eq!(loaded, order);
        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_item_appends_in_order() {
        let repo = repo().await;
        let mut order = new_order("o1", "20260310-0001", at(10, 9));
        order.add_line(line("l1", "latte", 1, 25_000)).unwrap();
        repo.insert(&order).await.unwrap();

        repo.add_item("o1", &line("l2", "tea", 1, 40_000)).await.unwrap();
        repo.add_item("o1", &line("l3", "cake", 1, 30_000)).await.unwrap();

        let loaded = repo.require("o1").await.unwrap();
        let ids: Vec<&str> = loaded.lines().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["l1", "l2", "l3"]);
    }

    #[tokio::test]
    async fn test_writes_to_paid_order_conflict() {
        let repo = repo().await;
        let mut order = new_order("o1", "20260310-0001", at(10, 9));
        order.add_line(line("l1", "latte", 1, 25_000)).unwrap();
        repo.insert(&order).await.unwrap();

        order.mark_paid(PaymentMethod::Cash, at(10, 9)).unwrap();
        repo.update_status(&order, OrderStatus::Pending).await.unwrap();

        let err = repo.add_item("o1", &line("l2", "tea", 1, 40_000)).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));

        let err = repo.set_promotion("o1", Some("promo")).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));

        // Replaying the same transition no longer matches the expected status
        let err = repo.update_status(&order, OrderStatus::Pending).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));

        let loaded = repo.require("o1").await.unwrap();
        assert_eq!(loaded.status(), OrderStatus::Paid);
        assert_eq!(loaded.payment_method(), Some(PaymentMethod::Cash));
        assert_eq!(loaded.lines().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_order_is_not_found() {
        let repo = repo().await;
        let err = repo
            .set_payment_method("missing", PaymentMethod::Card)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_paid_between_filters_status_and_date() {
        let repo = repo().await;

        let mut paid = new_order("paid", "20260310-0001", at(10, 9));
        paid.add_line(line("l1", "latte", 2, 25_000)).unwrap();
        paid.mark_paid(PaymentMethod::Cash, at(10, 9)).unwrap();
        repo.insert(&paid).await.unwrap();

        let mut pending = new_order("pending", "20260310-0002", at(10, 10));
        pending.add_line(line("l2", "latte", 1, 25_000)).unwrap();
        repo.insert(&pending).await.unwrap();

        let mut other_day = new_order("other", "20260311-0001", at(11, 9));
        other_day.add_line(line("l3", "tea", 1, 40_000)).unwrap();
        other_day.mark_paid(PaymentMethod::Card, at(11, 9)).unwrap();
        repo.insert(&other_day).await.unwrap();

        let day = at(10, 0).date_naive();
        let orders = repo.list_paid_between(day, day).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id(), "paid");
        assert_eq!(orders[0].lines().len(), 1);

        let both = repo
            .list_paid_between(day, at(11, 0).date_naive())
            .await
            .unwrap();
        assert_eq!(both.len(), 2);
    }

    #[tokio::test]
    async fn test_create_numbers_orders_per_day() {
        let repo = repo().await;

        let first = repo.create(new_order("o1", "", at(10, 9))).await.unwrap();
        let second = repo.create(new_order("o2", "", at(10, 12))).await.unwrap();
        let next_day = repo.create(new_order("o3", "", at(11, 8))).await.unwrap();

        assert_eq!(first.order_number(), "20260310-0001");
        assert_eq!(second.order_number(), "20260310-0002");
        assert_eq!(next_day.order_number(), "20260311-0001");

        let loaded = repo.require("o2").await.unwrap();
        assert_eq!(loaded.order_number(), "20260310-0002");
    }

    #[tokio::test]
    async fn test_create_continues_after_highest_number() {
        let repo = repo().await;
        repo.insert(&new_order("o1", "20260310-0007", at(10, 9)))
            .await
            .unwrap();

        let mut order = new_order("o2", "ignored", at(10, 10));
        order.add_line(line("l1", "latte", 2, 25_000)).unwrap();
        let created = repo.create(order).await.unwrap();

        assert_eq!(created.order_number(), "20260310-0008");
        let loaded = repo.require("o2").await.unwrap();
        assert_eq!(loaded, created);
    }

    #[tokio::test]
    async fn test_concurrent_creates_get_distinct_numbers() {
        let repo = repo().await;

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.create(new_order(&format!("o{}", i), "", at(10, 9)))
                        .await
                        .map(|o| o.order_number().to_string())
                })
            })
            .collect();

        let mut numbers = HashSet::new();
        for handle in handles {
            numbers.insert(handle.await.unwrap().unwrap());
        }

        assert_eq!(numbers.len(), 8);
        assert!(numbers.contains("20260310-0001"));
        assert!(numbers.contains("20260310-0008"));
    }
}
