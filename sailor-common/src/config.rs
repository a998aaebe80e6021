//! Configuration loading and root folder resolution
//!
//! Bootstrap settings come from a TOML file; a missing file is not an error,
//! the service starts on compiled defaults. Integration secrets may also be
//! supplied through environment variables, which win over the file.

use crate::scheduling::BusinessHours;
use crate::{Error, Result};
use chrono::NaiveTime;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "SAILOR_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "sailor.db";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Database path; defaults to `<root_folder>/sailor.db`
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub business: BusinessConfig,

    /// Emails allowed to run admin charges; empty allows any token holder
    #[serde(default)]
    pub admin_emails: Vec<String>,

    /// CORS origins; empty allows any origin
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    #[serde(default)]
    pub google_calendar: Option<GoogleCalendarConfig>,

    #[serde(default)]
    pub stripe: Option<StripeConfig>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Opening hours as written in the config file
#[derive(Debug, Clone, Deserialize)]
pub struct BusinessConfig {
    #[serde(default = "default_open")]
    pub open: String,
    #[serde(default = "default_close")]
    pub close: String,
    /// 0 = Sunday .. 6 = Saturday
    #[serde(default = "default_days")]
    pub days_of_week: Vec<u32>,
    /// Minutes east of UTC
    #[serde(default = "default_offset")]
    pub utc_offset_minutes: i32,
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            open: default_open(),
            close: default_close(),
            days_of_week: default_days(),
            utc_offset_minutes: default_offset(),
        }
    }
}

fn default_open() -> String {
    "08:00".to_string()
}

fn default_close() -> String {
    "18:00".to_string()
}

fn default_days() -> Vec<u32> {
    vec![1, 2, 3, 4, 5, 6]
}

fn default_offset() -> i32 {
    -8 * 60
}

impl BusinessConfig {
    pub fn to_hours(&self) -> Result<BusinessHours> {
        let parse = |s: &str| {
            NaiveTime::parse_from_str(s, "%H:%M")
                .map_err(|_| Error::Config(format!("Invalid business hour '{}', expected HH:MM", s)))
        };
        let start = parse(&self.open)?;
        let end = parse(&self.close)?;
        if start >= end {
            return Err(Error::Config(format!(
                "Business hours close ({}) must be after open ({})",
                self.close, self.open
            )));
        }
        if let Some(day) = self.days_of_week.iter().find(|d| **d > 6) {
            return Err(Error::Config(format!("Invalid day of week: {}", day)));
        }
        Ok(BusinessHours {
            start,
            end,
            days_of_week: self.days_of_week.clone(),
            utc_offset_minutes: self.utc_offset_minutes,
            per_day: Vec::new(),
        })
    }
}

/// Google Calendar OAuth credentials
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GoogleCalendarConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    /// IANA zone name sent with created events
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

fn default_calendar_id() -> String {
    "primary".to_string()
}

fn default_time_zone() -> String {
    "America/Los_Angeles".to_string()
}

impl GoogleCalendarConfig {
    /// Read `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`, `GOOGLE_REFRESH_TOKEN`
    /// and optionally `GOOGLE_CALENDAR_ID`; `None` unless all three required
    /// values are present
    pub fn from_env() -> Option<Self> {
        let client_id = std::env::var("GOOGLE_CLIENT_ID").ok()?;
        let client_secret = std::env::var("GOOGLE_CLIENT_SECRET").ok()?;
        let refresh_token = std::env::var("GOOGLE_REFRESH_TOKEN").ok()?;
        Some(Self {
            client_id,
            client_secret,
            refresh_token,
            calendar_id: std::env::var("GOOGLE_CALENDAR_ID").unwrap_or_else(|_| default_calendar_id()),
            time_zone: default_time_zone(),
        })
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StripeConfig {
    pub secret_key: String,
}

impl StripeConfig {
    pub fn from_env() -> Option<Self> {
        std::env::var("STRIPE_SECRET_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(|secret_key| Self { secret_key })
    }
}

impl TomlConfig {
    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Load from an explicit path or the platform location
    ///
    /// A missing file logs a warning and yields defaults; a file that exists
    /// but does not parse is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path().filter(|p| p.exists()),
        };

        match path {
            Some(p) if p.exists() => {
                info!("Loading configuration from {}", p.display());
                Self::from_file(&p)
            }
            Some(p) => {
                warn!("Config file {} not found, using defaults", p.display());
                Ok(Self::default())
            }
            None => {
                info!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Environment credentials override the file
    pub fn google_calendar(&self) -> Option<GoogleCalendarConfig> {
        GoogleCalendarConfig::from_env().or_else(|| self.google_calendar.clone())
    }

    pub fn stripe(&self) -> Option<StripeConfig> {
        StripeConfig::from_env().or_else(|| self.stripe.clone())
    }

    pub fn database_path(&self, root_folder: &Path) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| root_folder.join(DATABASE_FILE))
    }
}

/// Built-in fallbacks
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub port: u16,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            port: 5780,
            log_level: default_log_level(),
        }
    }
}

/// Root folder resolution, highest priority first:
/// 1. Command-line argument
/// 2. `SAILOR_ROOT_FOLDER`
/// 3. TOML config file
/// 4. OS-dependent compiled default
pub fn resolve_root_folder(cli_arg: Option<&str>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Platform config file location, e.g. `~/.config/sailor-skills/config.toml`
fn default_config_path() -> Option<PathBuf> {
    if cfg!(target_os = "linux") {
        let user_config = dirs::config_dir().map(|d| d.join("sailor-skills").join("config.toml"));
        if let Some(path) = user_config.filter(|p| p.exists()) {
            return Some(path);
        }
        let system_config = PathBuf::from("/etc/sailor-skills/config.toml");
        system_config.exists().then_some(system_config)
    } else {
        dirs::config_dir().map(|d| d.join("sailor-skills").join("config.toml"))
    }
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("sailor-skills"))
        .unwrap_or_else(|| PathBuf::from("./sailor_data"))
}
