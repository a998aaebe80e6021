//! Database initialization, models and queries

pub mod bookings;
pub mod init;
pub mod inventory;
pub mod migrations;
pub mod models;
pub mod orders;
pub mod quotes;
pub mod schedule;

pub use init::{ensure_setting, get_setting, init_database, init_memory_database, set_setting};
pub use migrations::{get_schema_version, CURRENT_SCHEMA_VERSION};
pub use models::*;
