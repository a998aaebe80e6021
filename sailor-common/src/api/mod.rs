//! HTTP-independent pieces of the admin API
//!
//! Pure functions and database operations only; the axum middleware that
//! wraps them lives in `sailor-api`.

pub mod auth;

pub use auth::{
    admin_email_allowed, hash_token, load_token_hash, verify_token, AdminAuthError, TokenHash,
    AUTH_DISABLED,
};
