//! Saved customer quotes

use super::models::Quote;
use crate::time::now_string;
use crate::{Error, Result};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

/// Statuses a quote may be moved to
pub const QUOTE_STATUSES: [&str; 6] = ["draft", "sent", "viewed", "accepted", "rejected", "expired"];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteCustomer {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub boat_name: Option<String>,
    pub boat_make: Option<String>,
    pub marina: Option<String>,
    pub slip: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteService {
    #[serde(rename = "type")]
    pub service_type: Option<String>,
    pub name: Option<String>,
    pub boat_length: Option<f64>,
    pub paint_condition: Option<String>,
    pub growth_level: Option<String>,
    pub has_twin_engines: Option<bool>,
    pub additional_hulls: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotePricing {
    pub base_price: Option<f64>,
    pub rate_per_foot: Option<f64>,
    pub anode_cost: Option<f64>,
    pub anode_labor_cost: Option<f64>,
    pub total_cost: Option<f64>,
    pub currency: Option<String>,
}

/// Quote as submitted by the admin quote builder
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuote {
    pub quote_number: String,
    pub quote_date: Option<String>,
    pub expiry_date: Option<String>,
    pub valid_days: Option<i64>,
    pub customer: QuoteCustomer,
    #[serde(default)]
    pub service: QuoteService,
    #[serde(default)]
    pub pricing: QuotePricing,
    #[serde(default)]
    pub anodes: Option<serde_json::Value>,
}

/// Filters for the admin quote list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteFilter {
    pub customer_email: Option<String>,
    pub status: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

pub async fn insert_quote(pool: &SqlitePool, quote: &NewQuote) -> Result<Quote> {
    if quote.quote_number.trim().is_empty() {
        return Err(Error::InvalidInput("quoteNumber is required".into()));
    }
    if quote.customer.name.trim().is_empty() {
        return Err(Error::InvalidInput("customer.name is required".into()));
    }

    let anodes = quote
        .anodes
        .clone()
        .unwrap_or_else(|| serde_json::Value::Array(Vec::new()));

    let result = sqlx::query(
        r#"
        INSERT INTO quotes (
            id, quote_number, quote_date, expiry_date, valid_days,
            customer_name, customer_email, customer_phone, boat_name, boat_make, marina, slip,
            service_type, service_name, boat_length, paint_condition, growth_level,
            has_twin_engines, additional_hulls,
            base_price, rate_per_foot, anode_cost, anode_labor_cost, total_cost, currency,
            anodes, status, created_by, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'sent', 'admin', ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&quote.quote_number)
    .bind(&quote.quote_date)
    .bind(&quote.expiry_date)
    .bind(quote.valid_days)
    .bind(&quote.customer.name)
    .bind(&quote.customer.email)
    .bind(&quote.customer.phone)
    .bind(&quote.customer.boat_name)
    .bind(&quote.customer.boat_make)
    .bind(&quote.customer.marina)
    .bind(&quote.customer.slip)
    .bind(&quote.service.service_type)
    .bind(&quote.service.name)
    .bind(quote.service.boat_length)
    .bind(&quote.service.paint_condition)
    .bind(&quote.service.growth_level)
    .bind(quote.service.has_twin_engines)
    .bind(quote.service.additional_hulls)
    .bind(quote.pricing.base_price)
    .bind(quote.pricing.rate_per_foot)
    .bind(quote.pricing.anode_cost)
    .bind(quote.pricing.anode_labor_cost)
    .bind(quote.pricing.total_cost)
    .bind(quote.pricing.currency.as_deref().unwrap_or("USD"))
    .bind(anodes.to_string())
    .bind(now_string())
    .execute(pool)
    .await;

    match result {
        Ok(_) => {}
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            return Err(Error::Conflict(format!(
                "Quote {} already exists",
                quote.quote_number
            )));
        }
        Err(e) => return Err(e.into()),
    }

    info!(quote_number = %quote.quote_number, "Quote saved");
    find_quote(pool, &quote.quote_number).await
}

async fn find_quote(pool: &SqlitePool, quote_number: &str) -> Result<Quote> {
    sqlx::query_as::<_, Quote>("SELECT * FROM quotes WHERE quote_number = ?")
        .bind(quote_number)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Quote {} not found", quote_number)))
}

/// Fetch a quote, stamping `viewed_at` the first time it is opened
pub async fn get_quote(pool: &SqlitePool, quote_number: &str) -> Result<Quote> {
    let mut quote = find_quote(pool, quote_number).await?;

    if quote.viewed_at.is_none() {
        let viewed_at = now_string();
        sqlx::query("UPDATE quotes SET viewed_at = ? WHERE quote_number = ? AND viewed_at IS NULL")
            .bind(&viewed_at)
            .bind(quote_number)
            .execute(pool)
            .await?;
        quote.viewed_at = Some(viewed_at);
    }

    Ok(quote)
}

/// Change status; accepted and rejected also record when
pub async fn update_quote_status(pool: &SqlitePool, quote_number: &str, status: &str) -> Result<Quote> {
    if !QUOTE_STATUSES.contains(&status) {
        return Err(Error::InvalidInput(format!("Invalid quote status: {}", status)));
    }

    let now = now_string();
    let result = sqlx::query(
        r#"
        UPDATE quotes SET
            status = ?,
            accepted_at = CASE WHEN ? = 'accepted' THEN ? ELSE accepted_at END,
            rejected_at = CASE WHEN ? = 'rejected' THEN ? ELSE rejected_at END
        WHERE quote_number = ?
        "#,
    )
    .bind(status)
    .bind(status)
    .bind(&now)
    .bind(status)
    .bind(&now)
    .bind(quote_number)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Quote {} not found", quote_number)));
    }

    find_quote(pool, quote_number).await
}

/// Newest first
pub async fn list_quotes(pool: &SqlitePool, filter: &QuoteFilter) -> Result<Vec<Quote>> {
    let quotes = sqlx::query_as::<_, Quote>(
        r#"
        SELECT * FROM quotes
        WHERE (? IS NULL OR customer_email = ?)
          AND (? IS NULL OR status = ?)
          AND (? IS NULL OR created_at >= ?)
          AND (? IS NULL OR created_at <= ?)
        ORDER BY created_at DESC
        "#,
    )
    .bind(&filter.customer_email)
    .bind(&filter.customer_email)
    .bind(&filter.status)
    .bind(&filter.status)
    .bind(&filter.from_date)
    .bind(&filter.from_date)
    .bind(&filter.to_date)
    .bind(&filter.to_date)
    .fetch_all(pool)
    .await?;

    Ok(quotes)
}
