#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    pub duckdb_memory_limit: String,
    /// Notifications returned when the embed does not pass `limit`.
    pub default_selection_limit: u32,
    /// Hard ceiling on `limit`, whatever the caller asks for.
    pub max_selection_limit: u32,
    /// Analytics events accepted per source IP per window.
    pub rate_limit_max_events: u32,
    pub rate_limit_window_secs: u64,
    /// `max-age` on selection responses. Advisory, for CDNs in front of
    /// the widget endpoint.
    pub selection_cache_max_age_secs: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            port: std::env::var("PROOFLET_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            data_dir: std::env::var("PROOFLET_DATA_DIR")
                .unwrap_or_else(|_| "./data".to_string()),
            duckdb_memory_limit: std::env::var("PROOFLET_DUCKDB_MEMORY")
                .unwrap_or_else(|_| "1GB".to_string()),
            default_selection_limit: std::env::var("PROOFLET_DEFAULT_LIMIT")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .unwrap_or(15),
            max_selection_limit: std::env::var("PROOFLET_MAX_LIMIT")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .unwrap_or(50),
            rate_limit_max_events: std::env::var("PROOFLET_RATE_LIMIT")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .unwrap_or(120),
            rate_limit_window_secs: std::env::var("PROOFLET_RATE_WINDOW_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            selection_cache_max_age_secs: std::env::var("PROOFLET_CACHE_MAX_AGE")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
        })
    }
}
