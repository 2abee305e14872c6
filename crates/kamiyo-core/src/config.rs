// crates/kamiyo-core/src/config.rs
//
// Runtime configuration for the reputation shield.
// Loaded from a TOML file or populated with sensible defaults.

use std::fs;
use std::str::FromStr;

use serde::Deserialize;
use tracing::Level;

use crate::error::KamiyoError;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct KamiyoConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub authority: AuthorityConfig,

    #[serde(default)]
    pub verifier: VerifierConfig,

    #[serde(default)]
    pub accumulator: AccumulatorConfig,
}

/// Credential authority settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorityConfig {
    /// Validity window for new credentials, and the refresh fallback when a
    /// credential's own window is non-positive. Seconds.
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u32,
}

/// Verifier/encoder settings.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifierConfig {
    /// Label of the settlement target, carried into logs.
    #[serde(default = "default_target")]
    pub target: String,

    /// Largest opaque sub-proof the encoders will frame.
    #[serde(default = "default_max_proof_bytes")]
    pub max_proof_bytes: usize,
}

/// Accumulator settings. Tree depth is fixed and not configurable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccumulatorConfig {
    /// Where snapshots are saved and loaded, if persistence is wanted.
    #[serde(default)]
    pub export_path: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ttl_secs() -> u32 {
    24 * 60 * 60
}

fn default_target() -> String {
    "local".to_string()
}

fn default_max_proof_bytes() -> usize {
    64 * 1024
}

impl Default for KamiyoConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            authority: AuthorityConfig::default(),
            verifier: VerifierConfig::default(),
            accumulator: AccumulatorConfig::default(),
        }
    }
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: default_ttl_secs(),
        }
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            max_proof_bytes: default_max_proof_bytes(),
        }
    }
}

impl KamiyoConfig {
    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &str) -> Result<Self, KamiyoError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| KamiyoError::Config(format!("cannot read {}: {}", path, e)))?;
        let config = Self::from_toml(&contents)?;
        tracing::debug!(
            "Loaded config from {} (verifier target {})",
            path,
            config.verifier.target
        );
        Ok(config)
    }

    /// Parse configuration from TOML text. An unknown `log_level` is
    /// rejected here rather than at subscriber setup.
    pub fn from_toml(contents: &str) -> Result<Self, KamiyoError> {
        let config: Self = toml::from_str(contents)?;
        config.tracing_level()?;
        Ok(config)
    }

    /// `log_level` as a `tracing` level, for whoever installs the subscriber.
    pub fn tracing_level(&self) -> Result<Level, KamiyoError> {
        Level::from_str(&self.log_level).map_err(|_| {
            KamiyoError::Config(format!("unknown log level {:?}", self.log_level))
        })
    }
}
