//! Application configuration. API address, paths, typeahead tuning.

use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_DEBOUNCE_MS: u64 = 250;
pub const DEFAULT_SUGGEST_LIMIT: usize = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Schedule API root. Read from TIMETABLE_BASE_URL.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Directory for `state.json`. Read from TIMETABLE_DATA_DIR.
    #[serde(default)]
    pub data_dir: Option<String>,

    /// Quiet period before a suggest request. Read from TIMETABLE_DEBOUNCE_MS.
    #[serde(default)]
    pub debounce_ms: Option<u64>,

    /// Max suggestions per request. Read from TIMETABLE_SUGGEST_LIMIT.
    #[serde(default)]
    pub suggest_limit: Option<usize>,

    /// Optional suggest type filter (`group`, `teacher`, `subject`). Read from TIMETABLE_SUGGEST_TYPE.
    #[serde(default)]
    pub suggest_type: Option<String>,

    /// Per-request timeout. Read from TIMETABLE_REQUEST_TIMEOUT_SECS.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Use built-in demo data instead of the live API. Read from TIMETABLE_DEMO.
    #[serde(default)]
    pub demo: Option<bool>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        if let Ok(path) = std::env::var("TIMETABLE_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c = c.add_source(config::Environment::with_prefix("TIMETABLE").try_parsing(true));
        Self::from_builder(c)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, config::ConfigError> {
        builder.build()?.try_deserialize()
    }

    pub fn base_url_or_default(&self) -> String {
        self.base_url
            .as_deref()
            .map(|s| s.trim().trim_end_matches('/'))
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
            .to_string()
    }

    pub fn data_dir_or_default(&self) -> String {
        self.data_dir
            .clone()
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())
    }

    pub fn debounce_ms_or_default(&self) -> u64 {
        self.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS)
    }

    /// Zero is treated as unset.
    pub fn suggest_limit_or_default(&self) -> usize {
        self.suggest_limit
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_SUGGEST_LIMIT)
    }

    pub fn request_timeout_secs_or_default(&self) -> u64 {
        self.request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    pub fn is_demo(&self) -> bool {
        self.demo.unwrap_or(false)
    }
}
