use std::env;
use std::path::PathBuf;

use crate::pipeline::structuring::{
    DEFAULT_EXTRACTION_MODEL, DEFAULT_GEMINI_ENDPOINT, DEFAULT_TIMEOUT_SECS,
};

/// Application-level constants
pub const APP_NAME: &str = "OrderDesk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Database file inside the data directory.
pub const DATABASE_FILE: &str = "order_desk.db";

/// Get the application data directory
/// ~/OrderDesk/ on all platforms
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default log filter when RUST_LOG is not set.
pub fn default_log_filter() -> &'static str {
    "order_desk_lib=info,order_desk=info,warn"
}

/// Log filter for `-v`.
pub fn verbose_log_filter() -> &'static str {
    "order_desk_lib=debug,order_desk=debug,warn"
}

/// Runtime settings from the environment (and an optional `.env`).
#[derive(Clone)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout_secs: u64,
    pub data_dir: PathBuf,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Build from any variable source. Unset, blank and unusable values fall
    /// back to defaults, so a bad setting never keeps the desk from starting.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let api_key = get("GEMINI_API_KEY").or_else(|| get("API_KEY"));
        let model = get("ORDER_DESK_MODEL").unwrap_or_else(|| DEFAULT_EXTRACTION_MODEL.to_string());
        let endpoint =
            get("ORDER_DESK_ENDPOINT").unwrap_or_else(|| DEFAULT_GEMINI_ENDPOINT.to_string());
        let timeout_secs = match get("ORDER_DESK_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    tracing::warn!(
                        value = %raw,
                        default = DEFAULT_TIMEOUT_SECS,
                        "Invalid ORDER_DESK_TIMEOUT_SECS, using default"
                    );
                    DEFAULT_TIMEOUT_SECS
                }
            },
            None => DEFAULT_TIMEOUT_SECS,
        };
        let data_dir = get("ORDER_DESK_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(app_data_dir);

        if api_key.is_none() {
            tracing::warn!("No API key configured; extraction will fail until one is set");
        }

        Self {
            api_key,
            model,
            endpoint,
            timeout_secs,
            data_dir,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}
