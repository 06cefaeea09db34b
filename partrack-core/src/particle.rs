use crate::trajectory::Trajectory;
use glam::{DVec3, DVec4};
use serde::Serialize;

/// Track identifier, offset-adjusted before it reaches any store
pub type TrackId = i32;

/// Recorded parent of every primary particle
pub const NO_PARENT: TrackId = 0;

/// "No particle" sentinel, used when energy cannot be attributed to any
/// surviving ancestor
pub const NO_PARTICLE_ID: TrackId = i32::MIN;

/// Status code of a particle tracked by the simulation kernel
pub const STATUS_TRACKED: i32 = 1;

/// A particle tracked during one event
#[derive(Debug, Clone, Serialize)]
pub struct Particle {
    pub track_id: TrackId,
    pub mother: TrackId,
    pub pdg_code: i32,
    /// Process that created the particle ("primary" for primaries)
    pub process: String,
    pub end_process: String,
    /// Rest mass in GeV
    pub mass: f64,
    pub status_code: i32,
    pub trajectory: Trajectory,
    pub weight: f64,
    pub polarization: DVec3,
    pub daughters: Vec<TrackId>,
    keep_full_trajectory: bool,
}

impl Particle {
    pub fn new(
        track_id: TrackId,
        pdg_code: i32,
        process: impl Into<String>,
        mother: TrackId,
        mass: f64,
        keep_full_trajectory: bool,
    ) -> Self {
        Self {
            track_id,
            mother,
            pdg_code,
            process: process.into(),
            end_process: String::new(),
            mass,
            status_code: STATUS_TRACKED,
            trajectory: Trajectory::new(),
            weight: 0.0,
            polarization: DVec3::ZERO,
            daughters: Vec::new(),
            keep_full_trajectory,
        }
    }

    /// Whether every trajectory point is kept, or only start and end
    pub fn keep_full_trajectory(&self) -> bool {
        self.keep_full_trajectory
    }

    pub fn is_primary(&self) -> bool {
        self.mother <= NO_PARENT
    }

    pub fn num_trajectory_points(&self) -> usize {
        self.trajectory.len()
    }

    pub fn start_position(&self) -> Option<DVec4> {
        self.trajectory.first().map(|p| p.position)
    }

    pub fn end_position(&self) -> Option<DVec4> {
        self.trajectory.last().map(|p| p.position)
    }

    pub fn start_momentum(&self) -> Option<DVec4> {
        self.trajectory.first().map(|p| p.momentum)
    }

    pub fn end_momentum(&self) -> Option<DVec4> {
        self.trajectory.last().map(|p| p.momentum)
    }

    pub fn add_daughter(&mut self, daughter: TrackId) {
        self.daughters.push(daughter);
    }

    /// Reduce the particle to the identity kept for an archived entry
    pub fn archive(self) -> ParticleStub {
        ParticleStub {
            track_id: self.track_id,
            mother: self.mother,
        }
    }
}

/// What remains of an archived particle: enough to answer genealogy
/// questions, no payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParticleStub {
    pub track_id: TrackId,
    pub mother: TrackId,
}

/// Reduced record of a dropped particle
#[derive(Debug, Clone, Serialize)]
pub struct MinimalParticle {
    pub track_id: TrackId,
    pub mother: TrackId,
    pub pdg_code: i32,
    pub status_code: i32,
    pub origin: crate::truth::Origin,
    pub start_position: DVec4,
    pub end_position: DVec4,
    pub start_momentum: DVec4,
    pub end_momentum: DVec4,
}

impl MinimalParticle {
    /// Builds the reduced record; `None` if the particle never got a
    /// trajectory point
    pub fn from_particle(particle: &Particle, origin: crate::truth::Origin) -> Option<Self> {
        let first = particle.trajectory.first()?;
        let last = particle.trajectory.last()?;
        Some(Self {
            track_id: particle.track_id,
            mother: particle.mother,
            pdg_code: particle.pdg_code,
            status_code: particle.status_code,
            origin,
            start_position: first.position,
            end_position: last.position,
            start_momentum: first.momentum,
            end_momentum: last.momentum,
        })
    }
}
