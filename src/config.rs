use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::Path;

/// Engine tunables. Defaults reproduce the stock allocation behavior; the
/// loader exists so deployments can adjust cache TTLs and clamps without a
/// rebuild.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Market rate band TTL (default 30 minutes)
    #[serde(default = "default_band_ttl")]
    pub band_ttl_secs: u64,
    /// Supply/demand pressure factor TTL (default 1 hour)
    #[serde(default = "default_pressure_ttl")]
    pub pressure_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Market pressure delta clamp: weights move at most this share up or down
    #[serde(default = "default_pressure_clamp")]
    pub pressure_clamp: Decimal,
    /// Upper bound on the dynamically sized contingency weight
    #[serde(default = "default_contingency_cap")]
    pub contingency_cap: Decimal,
}

fn default_band_ttl() -> u64 {
    1800
}

fn default_pressure_ttl() -> u64 {
    3600
}

fn default_pressure_clamp() -> Decimal {
    dec!(0.20)
}

fn default_contingency_cap() -> Decimal {
    dec!(25)
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            band_ttl_secs: default_band_ttl(),
            pressure_ttl_secs: default_pressure_ttl(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            pressure_clamp: default_pressure_clamp(),
            contingency_cap: default_contingency_cap(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("cache.band_ttl_secs", 1800)?
            .set_default("cache.pressure_ttl_secs", 3600)?
            .set_default("limits.pressure_clamp", "0.20")?
            .set_default("limits.contingency_cap", "25")?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Override with environment variables (SOIREE_CACHE__BAND_TTL_SECS, etc.)
            .add_source(
                Environment::with_prefix("SOIREE")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}
