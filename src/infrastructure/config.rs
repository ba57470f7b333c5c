use crate::domain::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

pub const DEMO_API_KEY: &str = "DEMO_KEY";
pub const API_KEY_ENV: &str = "NASA_API_KEY";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    pub http_proxy: Option<String>,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub nasa: NasaConfig,
    #[serde(default)]
    pub swpc: SwpcConfig,
    #[serde(default)]
    pub service_worker: ServiceWorkerConfig,
    #[serde(default)]
    pub logging: Logging,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,
    /// Fraction of the ttl after which a hit also triggers a background refresh
    #[serde(default = "default_stale_fraction")]
    pub stale_fraction: f64,
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NasaConfig {
    pub api_key: Option<String>,
    #[serde(default)]
    pub use_dev_proxy: bool,
    #[serde(default = "default_dev_proxy_base")]
    pub dev_proxy_base: String,
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SwpcConfig {
    #[serde(default = "default_swpc_base")]
    pub base_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServiceWorkerConfig {
    #[serde(default = "default_sw_version")]
    pub version: String,
    #[serde(default = "default_sw_origin")]
    pub origin: String,
    #[serde(default = "default_app_max_age_secs")]
    pub app_max_age_secs: u64,
    #[serde(default = "default_static_max_age_secs")]
    pub static_max_age_secs: u64,
    #[serde(default = "default_shell_assets")]
    pub shell_assets: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Logging {
    #[serde(default = "default_enable")]
    pub enable: bool,
    pub path: Option<String>,
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    /// Stale fraction clamped into `0.0..=1.0`
    pub fn stale_fraction(&self) -> f64 {
        if self.stale_fraction.is_finite() {
            self.stale_fraction.clamp(0.0, 1.0)
        } else {
            default_stale_fraction()
        }
    }
}

impl NasaConfig {
    /// API key resolution: environment, then config file, then the public demo key
    pub fn resolved_api_key(&self) -> String {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.trim().is_empty()))
            .unwrap_or_else(|| DEMO_API_KEY.to_string())
    }

    /// Base for `api.nasa.gov` requests
    pub fn api_base(&self) -> String {
        if self.use_dev_proxy {
            self.dev_proxy_base.trim_end_matches('/').to_string()
        } else {
            "https://api.nasa.gov".to_string()
        }
    }
}

impl ServiceWorkerConfig {
    pub fn app_max_age(&self) -> Duration {
        Duration::from_secs(self.app_max_age_secs)
    }

    pub fn static_max_age(&self) -> Duration {
        Duration::from_secs(self.static_max_age_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: default_ttl_secs(),
            stale_fraction: default_stale_fraction(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl Default for NasaConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            use_dev_proxy: false,
            dev_proxy_base: default_dev_proxy_base(),
            lookback_days: default_lookback_days(),
        }
    }
}

impl Default for SwpcConfig {
    fn default() -> Self {
        Self {
            base_url: default_swpc_base(),
        }
    }
}

impl Default for ServiceWorkerConfig {
    fn default() -> Self {
        Self {
            version: default_sw_version(),
            origin: default_sw_origin(),
            app_max_age_secs: default_app_max_age_secs(),
            static_max_age_secs: default_static_max_age_secs(),
            shell_assets: default_shell_assets(),
        }
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            enable: true,
            path: None,
            level: "WARN".to_string(),
        }
    }
}

// Defaults
fn default_ttl_secs() -> u64 {
    300
}
fn default_stale_fraction() -> f64 {
    0.8
}
fn default_cleanup_interval_secs() -> u64 {
    600
}
fn default_dev_proxy_base() -> String {
    "http://localhost:5173/api/nasa".to_string()
}
fn default_lookback_days() -> u32 {
    7
}
fn default_swpc_base() -> String {
    "https://services.swpc.noaa.gov".to_string()
}
fn default_sw_version() -> String {
    "v5".to_string()
}
fn default_sw_origin() -> String {
    "http://localhost:5173".to_string()
}
fn default_app_max_age_secs() -> u64 {
    24 * 60 * 60
}
fn default_static_max_age_secs() -> u64 {
    7 * 24 * 60 * 60
}
fn default_shell_assets() -> Vec<String> {
    ["/", "/index.html", "/manifest.json", "/favicon.ico", "/logo192.png"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_enable() -> bool {
    true
}
fn default_log_level() -> String {
    "WARN".to_string()
}

pub fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("stellar-tales").join("config.toml"))
}

pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str::<Config>(content)?)
}

pub fn load_config() -> Result<Config, ConfigError> {
    if let Some(path) = get_config_path() {
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            match parse_config(&content) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    eprintln!(
                        "Warning: Failed to parse config file: {}. Using defaults.",
                        e
                    );
                }
            }
        }
    }

    Ok(Config::default())
}

pub fn generate_config_sample() -> Result<(), ConfigError> {
    let path = get_config_path()
        .ok_or_else(|| ConfigError::Invalid("Cannot determine config directory".to_string()))?;

    if path.exists() {
        eprintln!("Config file already exists at: {}", path.display());
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let toml_content = toml::to_string_pretty(&Config::default())
        .map_err(|e| ConfigError::Invalid(format!("Failed to serialize config: {}", e)))?;
    fs::write(&path, toml_content)?;
    println!("Generated config file at: {}", path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.cache.default_ttl_secs, 300);
        assert_eq!(config.cache.cleanup_interval_secs, 600);
        assert!((config.cache.stale_fraction - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.service_worker.version, "v5");
        assert_eq!(config.logging.level, "WARN");
        assert!(!config.nasa.use_dev_proxy);
    }

    #[test]
    fn sections_override_defaults() {
        let config = parse_config(
            r#"
[cache]
default_ttl_secs = 60
stale_fraction = 0.5

[nasa]
use_dev_proxy = true
dev_proxy_base = "http://127.0.0.1:3000/api/nasa/"

[logging]
level = "DEBUG"
"#,
        )
        .unwrap();

        assert_eq!(config.cache.default_ttl(), Duration::from_secs(60));
        assert!((config.cache.stale_fraction() - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.nasa.api_base(), "http://127.0.0.1:3000/api/nasa");
        assert_eq!(config.logging.level, "DEBUG");
    }

    #[test]
    fn production_host_without_proxy() {
        assert_eq!(NasaConfig::default().api_base(), "https://api.nasa.gov");
    }

    #[test]
    fn stale_fraction_is_clamped() {
        let cache = CacheConfig {
            stale_fraction: 3.0,
            ..CacheConfig::default()
        };
        assert!((cache.stale_fraction() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(matches!(
            parse_config("[cache\nttl = "),
            Err(ConfigError::Toml(_))
        ));
    }
}
