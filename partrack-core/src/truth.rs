//! Truth records and the per-event truth index
//!
//! Every tracked particle descends from exactly one truth record. The
//! indexer knows which generator produced each record, whether trajectories
//! from that generator may be stored in full, which record each track
//! descends from, and for primaries, which generated particle seeded them.

use crate::config::TrackerConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::particle::TrackId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Physics origin of a truth record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    #[default]
    Unknown,
    BeamNeutrino,
    CosmicRay,
    SupernovaNeutrino,
    SingleParticle,
}

/// A particle listed by a generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedParticle {
    pub pdg_code: i32,
    /// Generation process label, "primary" by convention
    #[serde(default = "GeneratedParticle::default_process")]
    pub process: String,
}

impl GeneratedParticle {
    fn default_process() -> String {
        "primary".to_string()
    }
}

/// One truth record, as supplied by the truth provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruthRecord {
    /// Label of the generator that produced the record
    pub generator: String,
    #[serde(default)]
    pub origin: Origin,
    /// Generated particles, indexed by their generator-local index
    #[serde(default)]
    pub particles: Vec<GeneratedParticle>,
}

/// Generator information for one truth record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorEntry {
    pub label: String,
    pub origin: Origin,
    /// Trajectory points from this generator may be stored in full
    pub retainable: bool,
}

/// Truth lineage recorded for a track at track begin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackTruth {
    pub truth_index: usize,
    /// Descends from a primary whose label is exactly "primary"
    pub from_canonical_primary: bool,
}

/// Per-event truth bookkeeping
#[derive(Debug, Clone, Default)]
pub struct TruthIndexer {
    generators: Vec<GeneratorEntry>,
    tracks: HashMap<TrackId, TrackTruth>,
    primaries: HashMap<TrackId, usize>,
}

impl TruthIndexer {
    /// Build the generator table for a new event from the provider's
    /// ordered truth records.
    pub fn build(
        records: &[TruthRecord],
        config: &TrackerConfig,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let allow_list = &config.keep_gen_trajectories;
        if !config.store_trajectories {
            debug!(target: "partrack::truth", "trajectory points will not be stored");
        } else if allow_list.is_empty() {
            debug!(
                target: "partrack::truth",
                "keep_gen_trajectories is empty, storing trajectory points for all generators"
            );
        }

        let generators: Vec<GeneratorEntry> = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let retainable = config.store_trajectories
                    && (allow_list.is_empty() || allow_list.contains(&record.generator));
                debug!(
                    target: "partrack::truth",
                    truth_index = index,
                    generator = %record.generator,
                    retainable,
                    "truth record summary"
                );
                GeneratorEntry {
                    label: record.generator.clone(),
                    origin: record.origin,
                    retainable,
                }
            })
            .collect();

        let kept = generators.iter().filter(|g| g.retainable).count();
        if kept == 0 && !allow_list.is_empty() && config.store_trajectories {
            let message = "store_trajectories is set and keep_gen_trajectories is non-empty, \
                           but none of the listed generators are present in the event; this may be \
                           expected for generators that can produce no particles";
            warn!(target: "partrack::truth", allow_list = ?allow_list, "{}", message);
            diagnostics.push(Diagnostic::warning(
                DiagnosticKind::NoRetainableGenerator,
                message,
                None,
            ));
        }

        Self {
            generators,
            tracks: HashMap::new(),
            primaries: HashMap::new(),
        }
    }

    pub fn num_records(&self) -> usize {
        self.generators.len()
    }

    pub fn generator(&self, truth_index: usize) -> Option<&GeneratorEntry> {
        self.generators.get(truth_index)
    }

    /// Unknown truth indices are never retainable
    pub fn is_retainable(&self, truth_index: usize) -> bool {
        self.generator(truth_index).map_or(false, |g| g.retainable)
    }

    pub fn record_track(&mut self, track: TrackId, truth: TrackTruth) {
        self.tracks.insert(track, truth);
    }

    pub fn track_truth(&self, track: TrackId) -> Option<TrackTruth> {
        self.tracks.get(&track).copied()
    }

    /// Record which generated particle seeded a primary track
    pub fn record_primary(&mut self, track: TrackId, generator_index: usize) {
        self.primaries.insert(track, generator_index);
    }

    pub fn primary_index(&self, track: TrackId) -> Option<usize> {
        self.primaries.get(&track).copied()
    }
}
