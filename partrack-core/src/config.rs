use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Creator processes whose daughters are not stored when shower daughters
/// are dropped and no custom list is given
pub const DEFAULT_NOT_STORED_PHYSICS: &[&str] = &[
    "conv",
    "LowEnConversion",
    "Pair",
    "compt",
    "Compt",
    "Brem",
    "phot",
    "Photo",
    "Ion",
    "annihil",
];

/// Tracker options, loadable from TOML
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackerConfig {
    /// Kinetic energy (GeV) below which secondaries are dropped
    #[serde(default)]
    pub energy_cut: f64,
    #[serde(default = "TrackerConfig::default_true")]
    pub store_trajectories: bool,
    /// Generators whose trajectories are stored; empty means all
    #[serde(default)]
    pub keep_gen_trajectories: Vec<String>,
    #[serde(default = "TrackerConfig::default_true")]
    pub keep_em_shower_daughters: bool,
    /// Custom not-stored process list, used when shower daughters are
    /// dropped
    #[serde(default)]
    pub not_stored_physics: Vec<String>,
    #[serde(default)]
    pub keep_only_primary_full_trajectories: bool,
    #[serde(default)]
    pub sparsify_trajectories: bool,
    /// Sparsification margin in cm
    #[serde(default = "TrackerConfig::default_sparsify_margin")]
    pub sparsify_margin: f64,
    #[serde(default)]
    pub keep_transportation: bool,
    #[serde(default)]
    pub keep_second_to_last: bool,
    #[serde(default)]
    pub store_dropped_particles: bool,
}

impl TrackerConfig {
    fn default_true() -> bool {
        true
    }
    fn default_sparsify_margin() -> f64 {
        0.015
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.energy_cut.is_finite() || self.energy_cut < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "energy_cut must be a non-negative number, got {}",
                self.energy_cut
            )));
        }
        if !self.sparsify_margin.is_finite() || self.sparsify_margin < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "sparsify_margin must be a non-negative number, got {}",
                self.sparsify_margin
            )));
        }
        Ok(())
    }

    /// Creator processes whose daughters are filtered out. Empty when
    /// shower daughters are kept.
    pub fn effective_not_stored_physics(&self) -> Vec<String> {
        if self.keep_em_shower_daughters {
            Vec::new()
        } else if self.not_stored_physics.is_empty() {
            DEFAULT_NOT_STORED_PHYSICS
                .iter()
                .map(|p| p.to_string())
                .collect()
        } else {
            self.not_stored_physics.clone()
        }
    }

    /// Log how the configuration will behave
    pub fn log_summary(&self) {
        if self.keep_em_shower_daughters {
            info!(
                target: "partrack::config",
                "storing full tracking information for all processes"
            );
            if !self.not_stored_physics.is_empty() {
                warn!(
                    target: "partrack::config",
                    "not_stored_physics provided, but will be ignored; set keep_em_shower_daughters = false to use it"
                );
            }
        } else {
            info!(
                target: "partrack::config",
                processes = ?self.effective_not_stored_physics(),
                "full tracking information will not be stored for particles from these processes"
            );
        }
        if self.sparsify_trajectories {
            info!(
                target: "partrack::config",
                margin = self.sparsify_margin,
                "trajectory sparsification enabled"
            );
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            energy_cut: 0.0,
            store_trajectories: true,
            keep_gen_trajectories: Vec::new(),
            keep_em_shower_daughters: true,
            not_stored_physics: Vec::new(),
            keep_only_primary_full_trajectories: false,
            sparsify_trajectories: false,
            sparsify_margin: Self::default_sparsify_margin(),
            keep_transportation: false,
            keep_second_to_last: false,
            store_dropped_particles: false,
        }
    }
}
