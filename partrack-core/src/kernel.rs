//! Inputs reported by the simulation kernel
//!
//! These are the plain values a kernel adapter hands to the tracker for
//! each callback. Units are already converted: positions in cm, times in ns,
//! momenta and energies in GeV.

use glam::{DVec3, DVec4};
use serde::{Deserialize, Serialize};

/// Provenance of a track seeded directly from a truth record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryProvenance {
    /// Index of the particle within its truth record
    pub generator_index: usize,
    /// Index of the truth record in provider order
    pub truth_index: usize,
    /// Generation process label recorded by the generator
    pub process: String,
}

/// Track-begin callback input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackStart {
    /// Kernel track id, before the batch offset is applied
    pub track_id: i32,
    /// Kernel parent id, before the batch offset is applied
    pub parent_id: i32,
    pub pdg_code: i32,
    /// Creator process name; ignored for primaries
    #[serde(default)]
    pub creator_process: String,
    pub kinetic_energy: f64,
    /// Rest mass in GeV
    #[serde(default)]
    pub mass: f64,
    #[serde(default)]
    pub proper_time: f64,
    #[serde(default)]
    pub polarization: DVec3,
    #[serde(default)]
    pub primary: Option<PrimaryProvenance>,
}

/// State of the track at one end of a step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepPoint {
    pub position: DVec3,
    /// Global time
    pub time: f64,
    pub momentum: DVec3,
    pub total_energy: f64,
}

impl StepPoint {
    pub fn four_position(&self) -> DVec4 {
        self.position.extend(self.time)
    }

    pub fn four_momentum(&self) -> DVec4 {
        self.momentum.extend(self.total_energy)
    }
}

/// Step callback input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepInput {
    pub pre: StepPoint,
    pub post: StepPoint,
    /// Process that limited the step; `None` if the kernel defined none
    pub process: Option<String>,
    pub step_length: f64,
    pub delta_time: f64,
    /// Instantaneous velocity reported by the kernel, cm/ns
    pub velocity: f64,
}

impl StepInput {
    /// Steps ended by the step limiter are artifacts, not physics
    pub fn is_step_limiter(&self) -> bool {
        self.process
            .as_deref()
            .map_or(false, |p| p.contains("StepLimiter"))
    }
}

/// Track-end callback input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackEnd {
    /// Post-step state of the last step; `None` if the kernel has no track
    /// information to report
    pub post: Option<StepPoint>,
    /// Process that ended the last step
    pub process: Option<String>,
    #[serde(default = "TrackEnd::default_weight")]
    pub weight: f64,
}

impl TrackEnd {
    fn default_weight() -> f64 {
        1.0
    }
}
