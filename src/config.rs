use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// Remote recipe API settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Bundled recipe list settings
    #[serde(default)]
    pub local: LocalConfig,
}

/// Configuration for the remote recipe API
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Base URL of the API, without a trailing path
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Static key sent as the `apiKey` query parameter
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Number of results requested from free-text search
    #[serde(default = "default_search_results")]
    pub search_results: u32,
    /// Number of results requested when generating from ingredients
    #[serde(default = "default_generated_results")]
    pub generated_results: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout: default_timeout(),
            search_results: default_search_results(),
            generated_results: default_generated_results(),
        }
    }
}

/// Configuration for the bundled recipe file
#[derive(Debug, Deserialize, Clone)]
pub struct LocalConfig {
    /// Path to the JSON recipe list
    #[serde(default = "default_recipes_path")]
    pub recipes_path: PathBuf,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            recipes_path: default_recipes_path(),
        }
    }
}

// Default value functions
fn default_base_url() -> String {
    "https://api.spoonacular.com".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_search_results() -> u32 {
    10
}

fn default_generated_results() -> u32 {
    5
}

fn default_recipes_path() -> PathBuf {
    PathBuf::from("data/recipes.json")
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPES__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPES__API__API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }
}

/// Load configuration from file and environment variables
///
/// See [`AppConfig::load`] for the source priority.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("config").required(false))
        // Use double underscore for nested: RECIPES__API__API_KEY
        .add_source(
            Environment::with_prefix("RECIPES")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
