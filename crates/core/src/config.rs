use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `CAMPAIGN_LETTERS__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub wizard: WizardConfig,
    #[serde(default)]
    pub handwriting: HandwritingConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Budgets for the two suspension points of the wizard, plus session
/// registry limits.
#[derive(Debug, Clone, Deserialize)]
pub struct WizardConfig {
    #[serde(default = "default_preview_timeout_ms")]
    pub preview_timeout_ms: u64,
    #[serde(default = "default_submit_timeout_ms")]
    pub submit_timeout_ms: u64,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// Idle time after which an abandoned session is evicted.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    #[serde(default = "default_session_sweep_secs")]
    pub session_sweep_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HandwritingConfig {
    #[serde(default = "default_preview_delay_ms")]
    pub preview_delay_ms: u64,
    #[serde(default = "default_placeholder_base_url")]
    pub placeholder_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_seed_demo_data")]
    pub seed_demo_data: bool,
}

// Default functions
fn default_node_id() -> String {
    "node-01".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_preview_timeout_ms() -> u64 {
    5000
}
fn default_submit_timeout_ms() -> u64 {
    10_000
}
fn default_max_sessions() -> usize {
    10_000
}
fn default_session_ttl_secs() -> u64 {
    1800
}
fn default_session_sweep_secs() -> u64 {
    60
}
fn default_preview_delay_ms() -> u64 {
    500
}
fn default_placeholder_base_url() -> String {
    "https://placehold.co/600x400/e2e8f0/1e293b".to_string()
}
fn default_seed_demo_data() -> bool {
    true
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            preview_timeout_ms: default_preview_timeout_ms(),
            submit_timeout_ms: default_submit_timeout_ms(),
            max_sessions: default_max_sessions(),
            session_ttl_secs: default_session_ttl_secs(),
            session_sweep_secs: default_session_sweep_secs(),
        }
    }
}

impl Default for HandwritingConfig {
    fn default() -> Self {
        Self {
            preview_delay_ms: default_preview_delay_ms(),
            placeholder_base_url: default_placeholder_base_url(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            seed_demo_data: default_seed_demo_data(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            wizard: WizardConfig::default(),
            handwriting: HandwritingConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("CAMPAIGN_LETTERS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api.http_port, 8080);
        assert_eq!(config.wizard.preview_timeout_ms, 5000);
        assert_eq!(config.handwriting.preview_delay_ms, 500);
        assert_eq!(config.wizard.session_ttl_secs, 1800);
        assert!(config.store.seed_demo_data);
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"wizard": {"submit_timeout_ms": 250}}"#).unwrap();
        assert_eq!(config.wizard.submit_timeout_ms, 250);
        assert_eq!(config.wizard.preview_timeout_ms, 5000);
        assert_eq!(config.api.host, "0.0.0.0");
    }
}
