//! Database schema migrations
//!
//! Versioned, idempotent upgrades tracked in `schema_version`. Tables are
//! created with their current shape by `init`, so on a fresh database each
//! migration finds its work already done and only records the version.
//!
//! Never modify a released migration; add a new one and bump
//! `CURRENT_SCHEMA_VERSION`.

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

pub const CURRENT_SCHEMA_VERSION: i32 = 3;

/// Latest applied version, 0 when none
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        // Baseline: tables as created by init
        set_schema_version(pool, 1).await?;
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("Migration v2 completed");
    }

    if current_version < 3 {
        migrate_v3(pool).await?;
        set_schema_version(pool, 3).await?;
        info!("Migration v3 completed");
    }

    Ok(())
}

async fn has_column(pool: &SqlitePool, table: &str, column: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?",
    )
    .bind(table)
    .bind(column)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

/// Add a column unless present; tolerates a concurrent initializer
async fn add_column(pool: &SqlitePool, table: &str, column: &str, definition: &str) -> Result<()> {
    if has_column(pool, table, column).await? {
        return Ok(());
    }

    match sqlx::query(&format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, definition))
        .execute(pool)
        .await
    {
        Ok(_) => {
            info!("  Added {}.{}", table, column);
            Ok(())
        }
        Err(sqlx::Error::Database(db_err)) if db_err.message().contains("duplicate column") => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Migration v2: recurring service interval on orders
///
/// Early databases stored orders without an interval, so the next service
/// date could not be computed after a charge.
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v2: service_orders.service_interval");
    add_column(pool, "service_orders", "service_interval", "TEXT").await
}

/// Migration v3: lookup indexes for list endpoints
async fn migrate_v3(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v3: list indexes");

    let statements = [
        "CREATE INDEX IF NOT EXISTS idx_bookings_start ON bookings(booking_start)",
        "CREATE INDEX IF NOT EXISTS idx_bookings_status ON bookings(status)",
        "CREATE INDEX IF NOT EXISTS idx_quotes_created ON quotes(created_at)",
        "CREATE INDEX IF NOT EXISTS idx_replenishment_status ON replenishment_list(status)",
        "CREATE INDEX IF NOT EXISTS idx_transactions_created ON inventory_transactions(created_at)",
    ];
    for sql in statements {
        sqlx::query(sql).execute(pool).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_memory_database;

    #[tokio::test]
    async fn test_fresh_database_reaches_current_version() {
        let pool = init_memory_database().await.unwrap();
        assert_eq!(get_schema_version(&pool).await.unwrap(), CURRENT_SCHEMA_VERSION);

        // Second run is a no-op
        run_migrations(&pool).await.unwrap();
        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, CURRENT_SCHEMA_VERSION as i64);
    }

    #[tokio::test]
    async fn test_add_column_is_idempotent() {
        let pool = init_memory_database().await.unwrap();
        add_column(&pool, "quotes", "reminder_sent_at", "TEXT").await.unwrap();
        add_column(&pool, "quotes", "reminder_sent_at", "TEXT").await.unwrap();
        assert!(has_column(&pool, "quotes", "reminder_sent_at").await.unwrap());
    }
}
