//! Configuration management
//!
//! This module provides YAML-based configuration management with support for:
//! - Environment variable overrides
//! - Multiple configuration file locations
//! - Default values for all settings

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    #[serde(default)]
    pub suggestions: SuggestionConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
    #[serde(default)]
    pub mail: MailConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5080
}

fn default_workers() -> usize {
    num_cpus::get()
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_token_expiry")]
    pub token_expiry_hours: u64,
    #[serde(default = "default_refresh_expiry")]
    pub refresh_token_expiry_days: u64,
    /// Lifetime of `email_verification` tokens
    #[serde(default = "default_verification_expiry")]
    pub verification_token_expiry_hours: u64,
    /// Lifetime of `password_recovery` tokens
    #[serde(default = "default_recovery_expiry")]
    pub recovery_token_expiry_minutes: u64,
    #[serde(default = "default_password_min_length")]
    pub password_min_length: usize,
}

fn default_token_expiry() -> u64 {
    24
}

fn default_refresh_expiry() -> u64 {
    7
}

fn default_verification_expiry() -> u64 {
    48
}

fn default_recovery_expiry() -> u64 {
    30
}

fn default_password_min_length() -> usize {
    8
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    /// Log output target (console or file)
    #[serde(default = "default_log_target")]
    pub target: LogTarget,
    /// Directory for log files (used when target is "file" or "both")
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_log_prefix")]
    pub log_prefix: String,
    #[serde(default = "default_log_rotation")]
    pub daily_rotation: bool,
    /// Maximum number of log files to keep (0 = unlimited)
    #[serde(default = "default_max_log_files")]
    pub max_log_files: usize,
}

/// Log output target
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    #[default]
    Console,
    File,
    Both,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

fn default_log_target() -> LogTarget {
    LogTarget::Console
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("/var/log/property-inventory")
}

fn default_log_prefix() -> String {
    "property-inventory".to_string()
}

fn default_log_rotation() -> bool {
    true
}

fn default_max_log_files() -> usize {
    30
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            target: default_log_target(),
            log_dir: default_log_dir(),
            log_prefix: default_log_prefix(),
            daily_rotation: default_log_rotation(),
            max_log_files: default_max_log_files(),
        }
    }
}

/// Per-IP rate limiting of the public auth endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_auth_rps")]
    pub auth_requests_per_second: u32,
    #[serde(default = "default_auth_burst")]
    pub auth_burst_size: u32,
}

fn default_true() -> bool {
    true
}

fn default_auth_rps() -> u32 {
    1
}

fn default_auth_burst() -> u32 {
    5
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            auth_requests_per_second: default_auth_rps(),
            auth_burst_size: default_auth_burst(),
        }
    }
}

/// Suggestion workflow limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SuggestionConfig {
    /// Maximum length of the feedback attached to a declined suggestion
    #[serde(default = "default_feedback_max_length")]
    pub feedback_max_length: usize,
    /// Maximum entries in one suggestion or item batch
    #[serde(default = "default_max_items_per_request")]
    pub max_items_per_request: usize,
}

fn default_feedback_max_length() -> usize {
    500
}

fn default_max_items_per_request() -> usize {
    100
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            feedback_max_length: default_feedback_max_length(),
            max_items_per_request: default_max_items_per_request(),
        }
    }
}

/// Background cleanup of closed suggestions and stale invitations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CleanupConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between sweeps (default: 3600)
    #[serde(default = "default_cleanup_interval")]
    pub interval_secs: u64,
    /// Seconds to wait after startup before the first sweep
    #[serde(default = "default_initial_delay")]
    pub initial_delay_secs: u64,
    /// Closed suggestions older than this are deleted (default: 30)
    #[serde(default = "default_suggestion_retention_days")]
    pub suggestion_retention_days: i64,
    /// Invitations expire after this many days (default: 7)
    #[serde(default = "default_invitation_expiry_days")]
    pub invitation_expiry_days: i64,
}

/// Upper bound for retention windows, roughly a century
pub const MAX_RETENTION_DAYS: i64 = 36_500;

fn default_cleanup_interval() -> u64 {
    3600
}

fn default_initial_delay() -> u64 {
    60
}

fn default_suggestion_retention_days() -> i64 {
    30
}

fn default_invitation_expiry_days() -> i64 {
    7
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_cleanup_interval(),
            initial_delay_secs: default_initial_delay(),
            suggestion_retention_days: default_suggestion_retention_days(),
            invitation_expiry_days: default_invitation_expiry_days(),
        }
    }
}

/// Outbound SMTP delivery for verification, recovery and invitation mail
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MailConfig {
    /// SMTP relay; mail is only logged when unset
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    /// STARTTLS, or implicit TLS on port 465
    #[serde(default = "default_true")]
    pub use_tls: bool,
    #[serde(default = "default_from_address")]
    pub from_address: String,
    /// Client base URL used to build links in mail bodies
    #[serde(default)]
    pub app_url: Option<String>,
    #[serde(default = "default_smtp_timeout")]
    pub timeout_secs: u64,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_address() -> String {
    "Property Inventory <no-reply@localhost>".to_string()
}

fn default_smtp_timeout() -> u64 {
    10
}

impl MailConfig {
    /// Host to deliver through, if one is configured
    pub fn host(&self) -> Option<&str> {
        self.smtp_host
            .as_deref()
            .map(str::trim)
            .filter(|host| !host.is_empty())
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            use_tls: true,
            from_address: default_from_address(),
            app_url: None,
            timeout_secs: default_smtp_timeout(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                workers: default_workers(),
                request_timeout_secs: None,
            },
            auth: AuthConfig {
                jwt_secret: "change-me-in-production-minimum-32-characters-long".to_string(),
                token_expiry_hours: default_token_expiry(),
                refresh_token_expiry_days: default_refresh_expiry(),
                verification_token_expiry_hours: default_verification_expiry(),
                recovery_token_expiry_minutes: default_recovery_expiry(),
                password_min_length: default_password_min_length(),
            },
            database: DatabaseConfig {
                url: "sqlite://./data/property-inventory.db".to_string(),
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                connect_timeout_secs: default_connect_timeout(),
                idle_timeout_secs: default_idle_timeout(),
            },
            logging: LoggingConfig::default(),
            rate_limit: RateLimitSettings::default(),
            suggestions: SuggestionConfig::default(),
            cleanup: CleanupConfig::default(),
            mail: MailConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values
    /// 2. Configuration file (YAML)
    /// 3. Environment variables
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let config_path = std::env::var("PROPERTY_INVENTORY_CONFIG")
            .map(PathBuf::from)
            .ok()
            .or_else(Self::find_config_file);

        let mut config = match config_path {
            Some(ref path) if path.exists() => {
                eprintln!("[CONFIG] Loading configuration from: {:?}", path);
                Self::from_file(path)?
            }
            Some(ref path) => {
                eprintln!("[CONFIG] Config file not found: {:?}, using defaults", path);
                AppConfig::default()
            }
            None => {
                eprintln!("[CONFIG] No config file found, using defaults");
                AppConfig::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parse a YAML configuration file without env overrides
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_norway::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Find the configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let paths = [
            PathBuf::from("config.yaml"),
            PathBuf::from("config/config.yaml"),
            PathBuf::from("/etc/property-inventory/config.yaml"),
            dirs::config_dir()
                .map(|p| p.join("property-inventory/config.yaml"))
                .unwrap_or_default(),
        ];

        paths.into_iter().find(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Server overrides
        if let Ok(host) = std::env::var("PROPERTY_INVENTORY_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PROPERTY_INVENTORY_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }

        // Logging overrides
        if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("PROPERTY_INVENTORY_LOG_FORMAT") {
            self.logging.format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "compact" => LogFormat::Compact,
                _ => LogFormat::Pretty,
            };
        }

        // Cleanup overrides
        if let Ok(days) = std::env::var("SUGGESTION_RETENTION_DAYS") {
            if let Ok(d) = days.parse() {
                self.cleanup.suggestion_retention_days = d;
            }
        }
        if let Ok(days) = std::env::var("INVITATION_EXPIRY_DAYS") {
            if let Ok(d) = days.parse() {
                self.cleanup.invitation_expiry_days = d;
            }
        }
        if let Ok(secs) = std::env::var("CLEANUP_INTERVAL_SECS") {
            if let Ok(s) = secs.parse() {
                self.cleanup.interval_secs = s;
            }
        }

        // Mail overrides
        if let Ok(host) = std::env::var("SMTP_HOST") {
            self.mail.smtp_host = Some(host);
        }
        if let Ok(port) = std::env::var("SMTP_PORT") {
            if let Ok(p) = port.parse() {
                self.mail.smtp_port = p;
            }
        }
        if let Ok(username) = std::env::var("SMTP_USERNAME") {
            self.mail.smtp_username = Some(username);
        }
        if let Ok(password) = std::env::var("SMTP_PASSWORD") {
            self.mail.smtp_password = Some(password);
        }
        if let Ok(from) = std::env::var("MAIL_FROM") {
            self.mail.from_address = from;
        }
        if let Ok(url) = std::env::var("APP_URL") {
            self.mail.app_url = Some(url);
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.len() < 32 {
            anyhow::bail!("JWT secret must be at least 32 characters long");
        }

        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.suggestions.feedback_max_length == 0 {
            anyhow::bail!("suggestions.feedback_max_length must be greater than 0");
        }

        if self.suggestions.max_items_per_request == 0 {
            anyhow::bail!("suggestions.max_items_per_request must be greater than 0");
        }

        if self.cleanup.interval_secs == 0 {
            anyhow::bail!("cleanup.interval_secs must be greater than 0");
        }

        if self.cleanup.suggestion_retention_days < 0 || self.cleanup.invitation_expiry_days < 1 {
            anyhow::bail!(
                "cleanup retention must be non-negative and invitations must live at least one day"
            );
        }

        if self.cleanup.suggestion_retention_days > MAX_RETENTION_DAYS
            || self.cleanup.invitation_expiry_days > MAX_RETENTION_DAYS
        {
            anyhow::bail!(
                "cleanup retention and invitation expiry cannot exceed {} days",
                MAX_RETENTION_DAYS
            );
        }

        if self.mail.host().is_some() {
            if self.mail.smtp_port == 0 {
                anyhow::bail!("mail.smtp_port cannot be 0");
            }
            if self.mail.smtp_username.is_some() != self.mail.smtp_password.is_some() {
                anyhow::bail!("mail.smtp_username and mail.smtp_password must be set together");
            }
            if self.mail.from_address.trim().is_empty() {
                anyhow::bail!("mail.from_address cannot be empty");
            }
        }

        Ok(())
    }
}
