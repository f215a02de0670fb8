/// Run configuration for the charging site analysis.
///
/// Values come from three layers, later layers winning:
///   1. built-in defaults (`Config::default`)
///   2. an optional TOML file (see `config/charging_sites.toml`)
///   3. environment variables, optionally loaded from a `.env` file
///
/// Command line flags are applied on top by the binary.

use serde::Deserialize;
use std::path::Path;

use crate::model::SiteError;

/// Default Overpass endpoint.
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

pub const ENV_OVERPASS_URL: &str = "CHARGING_SITES_OVERPASS_URL";
pub const ENV_CACHE_FILE: &str = "CHARGING_SITES_CACHE_FILE";
pub const ENV_OUTPUT_FILE: &str = "CHARGING_SITES_OUTPUT_FILE";

// ---------------------------------------------------------------------------
// Single point analysis mode
// ---------------------------------------------------------------------------

/// Metric used for the statistics over single (ungrouped) charging stations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SingleAnalysis {
    /// Value of the `capacity` tag.
    #[default]
    Capacity,
    /// Total number of sockets across socket types.
    Socket,
    /// Highest socket output in kW.
    Output,
}

impl std::fmt::Display for SingleAnalysis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SingleAnalysis::Capacity => write!(f, "capacity"),
            SingleAnalysis::Socket => write!(f, "socket"),
            SingleAnalysis::Output => write!(f, "output"),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Partitions are split until they hold at most this many stations.
    pub max_sample: usize,
    /// Maximum distance in meters between charge points of one site.
    pub max_gap: f64,
    /// Minimum share of identical values for a name/brand/operator tag.
    pub min_common: f64,
    /// Charge points with a higher `capacity` are treated as whole sites.
    pub max_member_capacity: u32,
    pub single_analysis: SingleAnalysis,
    pub overpass_url: String,
    /// Overpass query timeout in seconds.
    pub overpass_timeout_secs: u64,
    pub cache_file: String,
    /// Responses with fewer elements are not cached (likely incomplete).
    pub cache_min_elements: usize,
    pub output_file: String,
    pub log_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_sample: 5000,
            max_gap: 20.0,
            min_common: 0.5,
            max_member_capacity: 2,
            single_analysis: SingleAnalysis::Capacity,
            overpass_url: DEFAULT_OVERPASS_URL.to_string(),
            overpass_timeout_secs: 600,
            cache_file: "global_stations.json".to_string(),
            cache_min_elements: 90_000,
            output_file: "global_charger_groups.osm".to_string(),
            log_file: None,
        }
    }
}

impl Config {
    /// Parses a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, SiteError> {
        let config: Config =
            toml::from_str(text).map_err(|e| SiteError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, SiteError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SiteError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Applies overrides from the process environment, after loading a
    /// `.env` file if one exists.
    pub fn apply_env(&mut self) {
        dotenv::dotenv().ok();
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Applies overrides from an arbitrary variable lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_OVERPASS_URL) {
            self.overpass_url = url;
        }
        if let Some(path) = lookup(ENV_CACHE_FILE) {
            self.cache_file = path;
        }
        if let Some(path) = lookup(ENV_OUTPUT_FILE) {
            self.output_file = path;
        }
    }

    /// Rejects values that would make the analysis meaningless.
    pub fn validate(&self) -> Result<(), SiteError> {
        if self.max_sample == 0 {
            return Err(SiteError::ConfigError(
                "max_sample must be at least 1".to_string(),
            ));
        }
        if !(self.max_gap > 0.0) || !self.max_gap.is_finite() {
            return Err(SiteError::ConfigError(format!(
                "max_gap must be a positive distance in meters, got {}",
                self.max_gap
            )));
        }
        if !(0.0..1.0).contains(&self.min_common) {
            return Err(SiteError::ConfigError(format!(
                "min_common must be in [0, 1), got {}",
                self.min_common
            )));
        }
        Ok(())
    }
}
