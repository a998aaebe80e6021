//! Service orders, completion and follow-up scheduling

use super::models::ServiceOrder;
use crate::scheduling::next_service_date;
use crate::time::{now, now_string, to_storage};
use crate::{Error, Result};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

const ORDER_QUERY: &str = r#"
    SELECT
        o.id, o.order_number, o.customer_id,
        c.name AS customer_name, c.email AS customer_email, c.stripe_customer_id,
        o.boat_id, o.service_type, o.service_interval, o.estimated_amount, o.final_amount,
        o.status, o.notes, o.stripe_payment_intent_id, o.completed_at, o.created_at
    FROM service_orders o
    JOIN customers c ON c.id = o.customer_id
"#;

#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub stripe_customer_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewServiceOrder {
    pub order_number: String,
    pub customer_id: String,
    pub boat_id: Option<String>,
    pub service_type: String,
    pub service_interval: Option<String>,
    pub estimated_amount: Option<f64>,
}

/// Outcome of a captured payment, applied to the order
#[derive(Debug, Clone)]
pub struct OrderCompletion {
    pub amount: f64,
    pub notes: Option<String>,
    pub payment_intent_id: String,
}

pub async fn insert_customer(pool: &SqlitePool, customer: &NewCustomer) -> Result<String> {
    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO customers (id, name, email, phone, stripe_customer_id, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&customer.name)
    .bind(&customer.email)
    .bind(&customer.phone)
    .bind(&customer.stripe_customer_id)
    .bind(now_string())
    .execute(pool)
    .await?;
    Ok(id)
}

pub async fn insert_order(pool: &SqlitePool, order: &NewServiceOrder) -> Result<String> {
    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO service_orders (
            id, order_number, customer_id, boat_id, service_type, service_interval,
            estimated_amount, status, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, 'pending', ?)
        "#,
    )
    .bind(&id)
    .bind(&order.order_number)
    .bind(&order.customer_id)
    .bind(&order.boat_id)
    .bind(&order.service_type)
    .bind(&order.service_interval)
    .bind(order.estimated_amount)
    .bind(now_string())
    .execute(pool)
    .await?;
    Ok(id)
}

pub async fn insert_schedule(
    pool: &SqlitePool,
    customer_id: &str,
    boat_id: Option<&str>,
    interval: &str,
) -> Result<String> {
    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO service_schedules (id, customer_id, boat_id, service_interval, is_active, created_at)
        VALUES (?, ?, ?, ?, 1, ?)
        "#,
    )
    .bind(&id)
    .bind(customer_id)
    .bind(boat_id)
    .bind(interval)
    .bind(now_string())
    .execute(pool)
    .await?;
    Ok(id)
}

pub async fn get_order(pool: &SqlitePool, id: &str) -> Result<ServiceOrder> {
    sqlx::query_as::<_, ServiceOrder>(&format!("{} WHERE o.id = ?", ORDER_QUERY))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound("Order not found".into()))
}

/// Mark an order completed after payment
///
/// Updates the order, writes a service history entry and, for recurring
/// service, moves the customer's active schedules to the next due date. All
/// three happen in one transaction.
pub async fn complete_order(pool: &SqlitePool, order: &ServiceOrder, completion: &OrderCompletion) -> Result<()> {
    let completed_at = now();
    let stamp = to_storage(completed_at);

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE service_orders SET
            status = 'completed',
            final_amount = ?,
            completed_at = ?,
            notes = COALESCE(?, notes),
            stripe_payment_intent_id = ?
        WHERE id = ?
        "#,
    )
    .bind(completion.amount)
    .bind(&stamp)
    .bind(&completion.notes)
    .bind(&completion.payment_intent_id)
    .bind(&order.id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO service_history (id, order_id, boat_id, service_date, service_type, notes, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&order.id)
    .bind(&order.boat_id)
    .bind(completed_at.date_naive().to_string())
    .bind(&order.service_type)
    .bind(&completion.notes)
    .bind(&stamp)
    .execute(&mut *tx)
    .await?;

    let next = order
        .service_interval
        .as_deref()
        .and_then(|interval| next_service_date(completed_at, interval));
    if let Some(next) = next {
        sqlx::query(
            "UPDATE service_schedules SET next_service_date = ? WHERE customer_id = ? AND is_active = 1",
        )
        .bind(next.date_naive().to_string())
        .bind(&order.customer_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!(
        order_id = %order.id,
        order_number = %order.order_number,
        amount = completion.amount,
        "Service order completed"
    );
    Ok(())
}
