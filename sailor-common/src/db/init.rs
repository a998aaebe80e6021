//! Database initialization
//!
//! Creates every table with `CREATE TABLE IF NOT EXISTS`, runs versioned
//! migrations and seeds reference data, so opening an existing database is
//! always safe.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

/// Open (creating if needed) the database file and bring the schema up to date
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    prepare_schema(&pool).await?;
    Ok(pool)
}

/// Private in-memory database, used by tests and dry runs
///
/// A single connection keeps every query on the same memory database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    prepare_schema(&pool).await?;
    Ok(pool)
}

async fn prepare_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    create_schema_version_table(pool).await?;
    create_settings_table(pool).await?;

    // Scheduling
    create_service_types_table(pool).await?;
    create_business_hours_table(pool).await?;
    create_blackout_dates_table(pool).await?;
    create_bookings_table(pool).await?;
    create_booking_history_table(pool).await?;

    create_quotes_table(pool).await?;

    // Inventory
    create_anodes_catalog_table(pool).await?;
    create_anode_inventory_table(pool).await?;
    create_item_categories_table(pool).await?;
    create_inventory_items_table(pool).await?;
    create_inventory_transactions_table(pool).await?;
    create_inventory_suppliers_table(pool).await?;
    create_purchase_orders_table(pool).await?;
    create_purchase_order_items_table(pool).await?;
    create_replenishment_list_table(pool).await?;

    // Customers and billing
    create_customers_table(pool).await?;
    create_service_orders_table(pool).await?;
    create_service_history_table(pool).await?;
    create_service_schedules_table(pool).await?;

    crate::db::migrations::run_migrations(pool).await?;

    init_default_settings(pool).await?;
    seed_service_types(pool).await?;
    seed_business_hours(pool).await?;
    seed_item_categories(pool).await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_service_types_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS service_types (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            description TEXT,
            duration_minutes INTEGER NOT NULL CHECK (duration_minutes > 0),
            category TEXT NOT NULL,
            price REAL,
            is_active INTEGER NOT NULL DEFAULT 1,
            display_order INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_business_hours_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS business_hours (
            id TEXT PRIMARY KEY,
            day_of_week INTEGER NOT NULL UNIQUE CHECK (day_of_week BETWEEN 0 AND 6),
            open_time TEXT NOT NULL,
            close_time TEXT NOT NULL,
            is_open INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_blackout_dates_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS blackout_dates (
            id TEXT PRIMARY KEY,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            reason TEXT,
            all_day INTEGER NOT NULL DEFAULT 1,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            CHECK (end_date >= start_date)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_bookings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bookings (
            id TEXT PRIMARY KEY,
            service_type_id TEXT REFERENCES service_types(id),
            service_type TEXT NOT NULL,
            booking_start TEXT NOT NULL,
            booking_end TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'confirmed'
                CHECK (status IN ('pending', 'confirmed', 'completed', 'cancelled', 'no_show')),
            customer_name TEXT NOT NULL,
            customer_email TEXT NOT NULL,
            customer_phone TEXT,
            customer_notes TEXT,
            internal_notes TEXT,
            cancellation_reason TEXT,
            cancelled_at TEXT,
            calendar_event_id TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            CHECK (booking_end > booking_start)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_booking_history_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS booking_history (
            id TEXT PRIMARY KEY,
            booking_id TEXT NOT NULL REFERENCES bookings(id) ON DELETE CASCADE,
            changed_by TEXT NOT NULL,
            change_type TEXT NOT NULL,
            new_values TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_quotes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS quotes (
            id TEXT PRIMARY KEY,
            quote_number TEXT NOT NULL UNIQUE,
            quote_date TEXT,
            expiry_date TEXT,
            valid_days INTEGER,
            customer_name TEXT NOT NULL,
            customer_email TEXT,
            customer_phone TEXT,
            boat_name TEXT,
            boat_make TEXT,
            marina TEXT,
            slip TEXT,
            service_type TEXT,
            service_name TEXT,
            boat_length REAL,
            paint_condition TEXT,
            growth_level TEXT,
            has_twin_engines INTEGER,
            additional_hulls INTEGER,
            base_price REAL,
            rate_per_foot REAL,
            anode_cost REAL,
            anode_labor_cost REAL,
            total_cost REAL,
            currency TEXT NOT NULL DEFAULT 'USD',
            anodes TEXT NOT NULL DEFAULT '[]',
            status TEXT NOT NULL DEFAULT 'sent',
            created_by TEXT NOT NULL DEFAULT 'admin',
            viewed_at TEXT,
            accepted_at TEXT,
            rejected_at TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_anodes_catalog_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS anodes_catalog (
            id TEXT PRIMARY KEY,
            sku TEXT,
            boatzincs_id TEXT,
            name TEXT NOT NULL,
            category TEXT,
            list_price REAL,
            is_active INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_anode_inventory_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS anode_inventory (
            anode_id TEXT PRIMARY KEY REFERENCES anodes_catalog(id) ON DELETE CASCADE,
            quantity_on_hand INTEGER NOT NULL DEFAULT 0 CHECK (quantity_on_hand >= 0),
            quantity_allocated INTEGER NOT NULL DEFAULT 0,
            reorder_point INTEGER NOT NULL DEFAULT 5,
            reorder_quantity INTEGER NOT NULL DEFAULT 10,
            primary_location TEXT,
            bin_number TEXT,
            average_cost REAL,
            last_counted TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_item_categories_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS item_categories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_inventory_items_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS inventory_items (
            id TEXT PRIMARY KEY,
            sku TEXT UNIQUE,
            name TEXT NOT NULL,
            category_id TEXT REFERENCES item_categories(id),
            description TEXT,
            quantity_on_hand INTEGER NOT NULL DEFAULT 0 CHECK (quantity_on_hand >= 0),
            quantity_allocated INTEGER NOT NULL DEFAULT 0,
            unit_cost REAL,
            minimum_stock_level INTEGER NOT NULL DEFAULT 0,
            reorder_point INTEGER NOT NULL DEFAULT 5,
            reorder_quantity INTEGER NOT NULL DEFAULT 10,
            primary_location TEXT,
            bin_number TEXT,
            notes TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            last_counted_date TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_inventory_transactions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS inventory_transactions (
            id TEXT PRIMARY KEY,
            transaction_type TEXT NOT NULL,
            anode_id TEXT REFERENCES anodes_catalog(id),
            item_id TEXT REFERENCES inventory_items(id),
            quantity INTEGER NOT NULL,
            reference_type TEXT,
            reference_id TEXT,
            notes TEXT,
            performed_by TEXT NOT NULL,
            created_at TEXT NOT NULL,
            CHECK ((anode_id IS NULL) <> (item_id IS NULL))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_inventory_suppliers_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS inventory_suppliers (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            contact_email TEXT,
            phone TEXT,
            website TEXT,
            is_active INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_purchase_orders_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS purchase_orders (
            id TEXT PRIMARY KEY,
            po_number TEXT NOT NULL UNIQUE,
            supplier_id TEXT REFERENCES inventory_suppliers(id),
            status TEXT NOT NULL DEFAULT 'draft',
            total_amount REAL NOT NULL DEFAULT 0,
            internal_notes TEXT,
            created_by TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_purchase_order_items_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS purchase_order_items (
            id TEXT PRIMARY KEY,
            po_id TEXT NOT NULL REFERENCES purchase_orders(id) ON DELETE CASCADE,
            anode_id TEXT REFERENCES anodes_catalog(id),
            item_id TEXT REFERENCES inventory_items(id),
            quantity_ordered INTEGER NOT NULL CHECK (quantity_ordered > 0),
            unit_cost REAL NOT NULL,
            line_total REAL NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_replenishment_list_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS replenishment_list (
            id TEXT PRIMARY KEY,
            anode_id TEXT REFERENCES anodes_catalog(id),
            item_id TEXT REFERENCES inventory_items(id),
            quantity_needed INTEGER NOT NULL,
            quantity_to_order INTEGER,
            priority TEXT NOT NULL DEFAULT 'medium'
                CHECK (priority IN ('critical', 'high', 'medium', 'low')),
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'ordered', 'received', 'cancelled')),
            source TEXT NOT NULL DEFAULT 'manual',
            requested_by TEXT,
            notes TEXT,
            po_id TEXT REFERENCES purchase_orders(id),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_customers_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS customers (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT,
            phone TEXT,
            stripe_customer_id TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_service_orders_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS service_orders (
            id TEXT PRIMARY KEY,
            order_number TEXT NOT NULL UNIQUE,
            customer_id TEXT NOT NULL REFERENCES customers(id),
            boat_id TEXT,
            service_type TEXT NOT NULL,
            service_interval TEXT,
            estimated_amount REAL,
            final_amount REAL,
            status TEXT NOT NULL DEFAULT 'pending',
            notes TEXT,
            stripe_payment_intent_id TEXT,
            completed_at TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_service_history_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS service_history (
            id TEXT PRIMARY KEY,
            order_id TEXT NOT NULL REFERENCES service_orders(id),
            boat_id TEXT,
            service_date TEXT NOT NULL,
            service_type TEXT NOT NULL,
            notes TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_service_schedules_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS service_schedules (
            id TEXT PRIMARY KEY,
            customer_id TEXT NOT NULL REFERENCES customers(id),
            boat_id TEXT,
            service_interval TEXT NOT NULL,
            next_service_date TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    ensure_setting(pool, "booking_buffer_minutes", "30").await?;
    ensure_setting(pool, "quote_valid_days", "30").await?;
    ensure_setting(pool, "currency", "USD").await?;
    Ok(())
}

/// Insert a setting if missing; reset it if its value is NULL
pub async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;

    match value {
        None => {
            // INSERT OR IGNORE tolerates a concurrent initializer
            sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(default_value)
                .execute(pool)
                .await?;
            info!("Initialized setting '{}' with default value: {}", key, default_value);
        }
        Some(None) => {
            sqlx::query("UPDATE settings SET value = ? WHERE key = ?")
                .bind(default_value)
                .bind(key)
                .execute(pool)
                .await?;
            warn!("Setting '{}' was NULL, reset to default: {}", key, default_value);
        }
        Some(Some(_)) => {}
    }

    Ok(())
}

/// Read a setting value
pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;
    Ok(value.flatten())
}

pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(value)
        .execute(pool)
        .await?;
    Ok(())
}

/// Bookable service types: (name, slug, description, minutes, category)
const SERVICE_TYPE_SEEDS: [(&str, &str, &str, i64, &str); 7] = [
    (
        "Free Consultation",
        "free-consultation",
        "Discuss your sailing goals and create a personalized training plan",
        30,
        "training",
    ),
    (
        "Training Half Day",
        "training-half-day",
        "Focused 4-hour sailing instruction session",
        240,
        "training",
    ),
    (
        "Training Full Day",
        "training-full-day",
        "Comprehensive 8-hour sailing instruction",
        480,
        "training",
    ),
    (
        "Extended Training Session",
        "training-extended",
        "Multi-day intensive training program",
        960,
        "training",
    ),
    (
        "Diving Service Quote",
        "diving-quote",
        "Get a custom quote for hull cleaning, anode replacement, or inspection",
        30,
        "diving",
    ),
    (
        "Detailing Quote",
        "detailing-quote",
        "Get a custom quote for boat detailing services",
        30,
        "detailing",
    ),
    (
        "Delivery Quote",
        "delivery-quote",
        "Discuss your boat delivery needs and get a custom quote",
        60,
        "deliveries",
    ),
];

async fn seed_service_types(pool: &SqlitePool) -> Result<()> {
    let now = crate::time::now_string();
    for (order, (name, slug, description, minutes, category)) in SERVICE_TYPE_SEEDS.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO service_types
                (id, name, slug, description, duration_minutes, category, display_order, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(slug)
        .bind(description)
        .bind(minutes)
        .bind(category)
        .bind(order as i64)
        .bind(&now)
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Monday to Saturday 08:00-18:00, closed Sunday
async fn seed_business_hours(pool: &SqlitePool) -> Result<()> {
    for day in 0..7i64 {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO business_hours (id, day_of_week, open_time, close_time, is_open)
            VALUES (?, ?, '08:00', '18:00', ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(day)
        .bind(day != 0)
        .execute(pool)
        .await?;
    }
    Ok(())
}

async fn seed_item_categories(pool: &SqlitePool) -> Result<()> {
    for name in ["General", "Cleaning Supplies", "Tools", "Hardware"] {
        sqlx::query("INSERT OR IGNORE INTO item_categories (id, name) VALUES (?, ?)")
            .bind(Uuid::new_v4().to_string())
            .bind(name)
            .execute(pool)
            .await?;
    }
    Ok(())
}
