//! Admin bearer-token authentication
//!
//! Only the SHA-256 of the admin token is stored, in the `settings` table
//! under `admin_token_hash`. On first start a random token is generated and
//! reported once; storing the literal value `0` disables the check.

use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

/// Settings key holding the token hash
pub const TOKEN_HASH_KEY: &str = "admin_token_hash";

/// Stored hash value that turns authentication off
pub const AUTH_DISABLED: &str = "0";

const GENERATED_TOKEN_LEN: usize = 40;

/// Authentication error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminAuthError {
    /// No `Authorization: Bearer` header
    MissingToken,

    /// Token does not hash to the stored value
    InvalidToken,

    /// Caller email not on the admin list
    Forbidden(String),

    /// Database error loading the hash
    DatabaseError(String),
}

impl std::fmt::Display for AdminAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdminAuthError::MissingToken => write!(f, "Missing bearer token"),
            AdminAuthError::InvalidToken => write!(f, "Invalid admin token"),
            AdminAuthError::Forbidden(email) => write!(f, "Not an admin: {}", email),
            AdminAuthError::DatabaseError(err) => write!(f, "Database error: {}", err),
        }
    }
}

impl std::error::Error for AdminAuthError {}

/// Result of loading the admin token hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenHash {
    /// Hash loaded from settings
    Existing(String),
    /// No hash was stored; a token was generated and its hash saved
    Generated { hash: String, token: String },
}

impl TokenHash {
    pub fn hash(&self) -> &str {
        match self {
            TokenHash::Existing(hash) => hash,
            TokenHash::Generated { hash, .. } => hash,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.hash() == AUTH_DISABLED
    }
}

/// SHA-256 of a token as 64 lowercase hex characters
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Load the stored hash, generating a fresh token on first use
pub async fn load_token_hash(db: &SqlitePool) -> Result<TokenHash, AdminAuthError> {
    let result: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(TOKEN_HASH_KEY)
        .fetch_optional(db)
        .await
        .map_err(|e| AdminAuthError::DatabaseError(e.to_string()))?;

    if let Some((value,)) = result {
        if !value.is_empty() {
            return Ok(TokenHash::Existing(value));
        }
    }

    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_TOKEN_LEN)
        .map(char::from)
        .collect();
    let hash = hash_token(&token);

    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(TOKEN_HASH_KEY)
        .bind(&hash)
        .execute(db)
        .await
        .map_err(|e| AdminAuthError::DatabaseError(e.to_string()))?;

    Ok(TokenHash::Generated { hash, token })
}

/// Check a presented token against the stored hash
pub fn verify_token(provided: Option<&str>, stored_hash: &str) -> Result<(), AdminAuthError> {
    if stored_hash == AUTH_DISABLED {
        return Ok(());
    }

    let token = provided
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AdminAuthError::MissingToken)?;

    let computed = hash_token(token);
    let matches = computed.len() == stored_hash.len()
        && computed
            .bytes()
            .zip(stored_hash.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0;

    if matches {
        Ok(())
    } else {
        Err(AdminAuthError::InvalidToken)
    }
}

/// Admin email gate; an empty list allows everyone
pub fn admin_email_allowed(admins: &[String], email: Option<&str>) -> Result<(), AdminAuthError> {
    if admins.is_empty() {
        return Ok(());
    }
    let email = email.map(str::trim).unwrap_or_default();
    if admins.iter().any(|a| a.eq_ignore_ascii_case(email)) {
        Ok(())
    } else {
        Err(AdminAuthError::Forbidden(email.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_sha256_hex() {
        let hash = hash_token("abc");
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_verify_token() {
        let stored = hash_token("s3cret");
        assert!(verify_token(Some("s3cret"), &stored).is_ok());
        assert_eq!(
            verify_token(Some("wrong"), &stored),
            Err(AdminAuthError::InvalidToken)
        );
        assert_eq!(verify_token(None, &stored), Err(AdminAuthError::MissingToken));
        assert_eq!(verify_token(Some("  "), &stored), Err(AdminAuthError::MissingToken));
    }

    #[test]
    fn test_disabled_accepts_anything() {
        assert!(verify_token(None, AUTH_DISABLED).is_ok());
    }

    #[test]
    fn test_admin_email_gate() {
        let admins = vec!["captain@sailorskills.com".to_string()];
        assert!(admin_email_allowed(&admins, Some("Captain@SailorSkills.com")).is_ok());
        assert!(admin_email_allowed(&admins, Some("deckhand@example.com")).is_err());
        assert!(admin_email_allowed(&admins, None).is_err());
        assert!(admin_email_allowed(&[], None).is_ok());
    }

    async fn settings_pool() -> SqlitePool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("CREATE TABLE settings (key TEXT PRIMARY KEY, value TEXT)")
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    #[tokio::test]
    async fn test_first_load_generates_token() {
        let pool = settings_pool().await;

        let first = load_token_hash(&pool).await.unwrap();
        let TokenHash::Generated { hash, token } = &first else {
            panic!("expected generated token");
        };
        assert_eq!(token.len(), GENERATED_TOKEN_LEN);
        assert_eq!(&hash_token(token), hash);

        let second = load_token_hash(&pool).await.unwrap();
        assert_eq!(second, TokenHash::Existing(hash.clone()));
    }
}
