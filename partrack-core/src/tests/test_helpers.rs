//! Test helper utilities for partrack tests
//!
//! Builders for kernel callback inputs. Tracks run along +x at 30 cm/ns so
//! positions and times are easy to predict.

use crate::kernel::{PrimaryProvenance, StepInput, StepPoint, TrackEnd, TrackStart};
use crate::retention::TrackDisposition;
use crate::truth::{GeneratedParticle, Origin, TruthRecord};
use crate::{ParticleTracker, TrackerError};
use glam::DVec3;

pub const SPEED: f64 = 30.0;

/// Check if two floating point values are approximately equal within tolerance
pub fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

/// One truth record per generator label, each with a single "primary"
pub fn truth_records(generators: &[&str]) -> Vec<TruthRecord> {
    generators
        .iter()
        .map(|g| TruthRecord {
            generator: g.to_string(),
            origin: Origin::SingleParticle,
            particles: vec![GeneratedParticle {
                pdg_code: 13,
                process: "primary".to_string(),
            }],
        })
        .collect()
}

/// A primary muon from truth record `truth_index` with the given label
pub fn primary(track_id: i32, truth_index: usize, label: &str) -> TrackStart {
    TrackStart {
        track_id,
        parent_id: 0,
        pdg_code: 13,
        creator_process: String::new(),
        kinetic_energy: 1.0,
        mass: 0.1057,
        proper_time: 0.0,
        polarization: DVec3::ZERO,
        primary: Some(PrimaryProvenance {
            generator_index: 0,
            truth_index,
            process: label.to_string(),
        }),
    }
}

/// A secondary electron created by `process`
pub fn secondary(track_id: i32, parent_id: i32, process: &str, kinetic_energy: f64) -> TrackStart {
    TrackStart {
        track_id,
        parent_id,
        pdg_code: 11,
        creator_process: process.to_string(),
        kinetic_energy,
        mass: 0.000511,
        proper_time: 0.0,
        polarization: DVec3::ZERO,
        primary: None,
    }
}

pub fn point_at(x: f64) -> StepPoint {
    StepPoint {
        position: DVec3::new(x, 0.0, 0.0),
        time: x / SPEED,
        momentum: DVec3::new(0.5, 0.0, 0.0),
        total_energy: 1.0,
    }
}

/// A step from `x0` to `x1` along +x ended by `process`
pub fn step_between(x0: f64, x1: f64, process: &str) -> StepInput {
    StepInput {
        pre: point_at(x0),
        post: point_at(x1),
        process: Some(process.to_string()),
        step_length: x1 - x0,
        delta_time: (x1 - x0) / SPEED,
        velocity: SPEED,
    }
}

pub fn end_at(x: f64, process: &str) -> TrackEnd {
    TrackEnd {
        post: Some(point_at(x)),
        process: Some(process.to_string()),
        weight: 1.0,
    }
}

/// Track end with no defining process
pub fn malformed_end(x: f64) -> TrackEnd {
    TrackEnd {
        post: Some(point_at(x)),
        process: None,
        weight: 1.0,
    }
}

/// Begin a track, step it `steps` times one cm at a time, and end it
pub fn run_track(
    tracker: &mut ParticleTracker,
    start: &TrackStart,
    steps: usize,
) -> Result<TrackDisposition, TrackerError> {
    let disposition = tracker.begin_track(start)?;
    for i in 0..steps {
        tracker.step(&step_between(i as f64, (i + 1) as f64, "Transportation"))?;
    }
    tracker.end_track(&end_at(steps as f64, "CoupledTransportation"))?;
    Ok(disposition)
}
