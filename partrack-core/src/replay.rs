//! Replay of recorded kernel callbacks
//!
//! A trace is a JSON document holding, per event, the truth records and the
//! ordered callbacks the kernel issued. Replaying a trace drives a tracker
//! exactly as the kernel would, which makes traces handy both for the
//! command-line host and for tests.

use crate::error::{ReplayError, TrackerError};
use crate::finalize::EventOutput;
use crate::kernel::{StepInput, TrackEnd, TrackStart};
use crate::tracker::ParticleTracker;
use crate::truth::TruthRecord;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// One kernel callback
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KernelEvent {
    BeginTrack(TrackStart),
    Step(StepInput),
    EndTrack(TrackEnd),
}

/// Truth records and callbacks of one event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventTrace {
    #[serde(default)]
    pub truth: Vec<TruthRecord>,
    #[serde(default)]
    pub callbacks: Vec<KernelEvent>,
}

/// A batch of recorded events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trace {
    pub events: Vec<EventTrace>,
}

impl Trace {
    pub fn from_json(text: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

/// Drive the tracker through one event
pub fn replay_event(
    tracker: &mut ParticleTracker,
    event: &EventTrace,
) -> Result<EventOutput, TrackerError> {
    tracker.begin_event(&event.truth);
    for callback in &event.callbacks {
        match callback {
            KernelEvent::BeginTrack(start) => {
                tracker.begin_track(start)?;
            }
            KernelEvent::Step(step) => tracker.step(step)?,
            KernelEvent::EndTrack(end) => tracker.end_track(end)?,
        }
    }
    tracker.end_event()
}

/// Replay every event of a trace in order on the same tracker
pub fn replay(tracker: &mut ParticleTracker, trace: &Trace) -> Result<Vec<EventOutput>, ReplayError> {
    let mut outputs = Vec::with_capacity(trace.events.len());
    for (index, event) in trace.events.iter().enumerate() {
        let output = replay_event(tracker, event)
            .map_err(|source| ReplayError::Tracker { event: index, source })?;
        info!(
            target: "partrack::replay",
            event = index,
            particles = output.particles.len(),
            next_offset = output.next_offset,
            "event replayed"
        );
        outputs.push(output);
    }
    Ok(outputs)
}
