use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::env as std_env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_API_VERSION: &str = "2025-01";
const DEFAULT_TAB_NAME: &str = "Pedidos";
const DEFAULT_DAYS_BACK: u32 = 7;
const DEFAULT_PAGE_SIZE: u32 = 250;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 90;
const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";
const CONFIG_DIR: &str = "config";

/// Runtime configuration for one sync run.
///
/// Built once at startup from defaults, an optional `config/default.toml` and
/// the process environment, then handed to each pipeline stage.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Shop domain, with or without scheme (`https://acme.myshopify.com/`)
    #[validate(length(min = 1))]
    pub shop_domain: String,

    /// Shopify Admin API access token
    #[validate(length(min = 1))]
    pub shopify_token: String,

    /// Shopify Admin API version
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Target spreadsheet identifier
    #[validate(length(min = 1))]
    pub sheet_id: String,

    /// Target tab inside the spreadsheet
    #[serde(default = "default_tab_name")]
    #[validate(length(min = 1))]
    pub tab_name: String,

    /// Trailing window size in days
    #[serde(default = "default_days_back")]
    #[validate(range(min = 1, max = 3650))]
    pub days_back: u32,

    /// Google service-account credential payload (JSON)
    #[validate(length(min = 1))]
    pub google_creds_json: String,

    /// Orders requested per page
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 250))]
    pub page_size: u32,

    /// Per-request timeout for every upstream call
    #[serde(default = "default_request_timeout_secs")]
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Overrides `https://{shop_domain}/admin/api/{api_version}`
    #[serde(default)]
    pub shopify_base_url: Option<String>,

    /// Sheets REST base URL
    #[serde(default = "default_sheets_api_base")]
    pub sheets_api_base: String,
}

impl AppConfig {
    /// Shop domain without scheme or trailing slash.
    pub fn shop_domain(&self) -> String {
        canonicalize_domain(&self.shop_domain)
    }

    /// Base URL of the versioned Admin REST API.
    pub fn shopify_base_url(&self) -> String {
        match &self.shopify_base_url {
            Some(base) if !base.trim().is_empty() => base.trim_end_matches('/').to_string(),
            _ => format!(
                "https://{}/admin/api/{}",
                self.shop_domain(),
                self.api_version
            ),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_tab_name() -> String {
    DEFAULT_TAB_NAME.to_string()
}

fn default_days_back() -> u32 {
    DEFAULT_DAYS_BACK
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_sheets_api_base() -> String {
    DEFAULT_SHEETS_API_BASE.to_string()
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

/// Strips scheme and trailing slashes from a shop domain.
pub fn canonicalize_domain(input: &str) -> String {
    let trimmed = input.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme.trim_matches('/').to_string()
}

/// Initializes tracing using the provided log level as the default filter.
///
/// Output goes to stderr; stdout is reserved for the run summary.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("order_sheet_sync={}", level);
    let filter_directive = std_env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let builder = fmt()
        .with_env_filter(EnvFilter::new(filter_directive))
        .with_writer(std::io::stderr);

    if json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}

/// Loads configuration from the process environment.
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. `config/default.toml` if present
/// 3. `.env` in the working directory if present
/// 4. Environment variables (`SHOP_DOMAIN`, `SHEET_ID`, ...)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    if dotenvy::dotenv().is_ok() {
        info!("Loaded variables from .env");
    }

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    build(Environment::default(), true)
}

/// Loads configuration from an explicit variable map instead of the process
/// environment. Config files are not consulted.
pub fn load_config_from(vars: HashMap<String, String>) -> Result<AppConfig, AppConfigError> {
    let source = vars.into_iter().collect();
    build(Environment::default().source(Some(source)), false)
}

fn build(environment: Environment, with_files: bool) -> Result<AppConfig, AppConfigError> {
    let mut builder = Config::builder()
        .set_default("api_version", DEFAULT_API_VERSION)?
        .set_default("tab_name", DEFAULT_TAB_NAME)?
        .set_default("days_back", i64::from(DEFAULT_DAYS_BACK))?
        .set_default("page_size", i64::from(DEFAULT_PAGE_SIZE))?
        .set_default("request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS as i64)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .set_default("sheets_api_base", DEFAULT_SHEETS_API_BASE)?;

    if with_files {
        builder = builder
            .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false));
    }

    let config = builder.add_source(environment).build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("SHOP_DOMAIN", "https://acme.myshopify.com/"),
            ("SHOPIFY_TOKEN", "shpat_test"),
            ("SHEET_ID", "sheet-123"),
            ("GOOGLE_CREDS_JSON", "{}"),
        ]
    }

    #[test]
    fn defaults_apply_when_optional_values_missing() {
        let cfg = load_config_from(vars(&required())).unwrap();
        assert_eq!(cfg.api_version, "2025-01");
        assert_eq!(cfg.tab_name, "Pedidos");
        assert_eq!(cfg.days_back, 7);
        assert_eq!(cfg.page_size, 250);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(90));
        assert_eq!(cfg.log_level(), "info");
    }

    #[test]
    fn base_url_uses_canonical_domain() {
        let cfg = load_config_from(vars(&required())).unwrap();
        assert_eq!(cfg.shop_domain(), "acme.myshopify.com");
        assert_eq!(
            cfg.shopify_base_url(),
            "https://acme.myshopify.com/admin/api/2025-01"
        );
    }

    #[test]
    fn explicit_values_override_defaults() {
        let mut pairs = required();
        pairs.push(("TAB_NAME", "Orders"));
        pairs.push(("DAYS_BACK", "30"));
        pairs.push(("API_VERSION", "2024-10"));
        pairs.push(("SHOPIFY_BASE_URL", "http://127.0.0.1:9999/admin/"));
        let cfg = load_config_from(vars(&pairs)).unwrap();
        assert_eq!(cfg.tab_name, "Orders");
        assert_eq!(cfg.days_back, 30);
        assert_eq!(cfg.shopify_base_url(), "http://127.0.0.1:9999/admin");
    }

    #[test]
    fn missing_required_value_fails_to_load() {
        let pairs: Vec<_> = required()
            .into_iter()
            .filter(|(k, _)| *k != "SHEET_ID")
            .collect();
        assert!(matches!(
            load_config_from(vars(&pairs)),
            Err(AppConfigError::Load(_))
        ));
    }

    #[test]
    fn out_of_range_page_size_fails_validation() {
        let mut pairs = required();
        pairs.push(("PAGE_SIZE", "500"));
        match load_config_from(vars(&pairs)) {
            Err(AppConfigError::Validation(errors)) => {
                assert!(errors.field_errors().contains_key("page_size"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn oversized_window_fails_validation() {
        let mut pairs = required();
        pairs.push(("DAYS_BACK", "200000000"));
        match load_config_from(vars(&pairs)) {
            Err(AppConfigError::Validation(errors)) => {
                assert!(errors.field_errors().contains_key("days_back"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn canonicalize_domain_strips_scheme_and_slashes() {
        assert_eq!(canonicalize_domain("http://shop.test//"), "shop.test");
        assert_eq!(canonicalize_domain(" shop.test "), "shop.test");
    }
}
