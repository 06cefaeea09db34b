//! Event-scoped tracking state
//!
//! All per-event maps live in one [`EventContext`] that is built fresh at
//! the start of every event and consumed by finalization. Nothing in it
//! outlives the event except what finalization hands back.

use crate::config::TrackerConfig;
use crate::diagnostics::Diagnostics;
use crate::genealogy::GenealogyMap;
use crate::particle::{Particle, TrackId};
use crate::store::{ParticleStores, StoreKind};
use crate::truth::{TruthIndexer, TruthRecord};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// The track currently being stepped
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentTrack {
    pub track_id: TrackId,
    pub store: StoreKind,
    /// Generator-local index, set for primaries only
    pub generator_index: Option<usize>,
    /// Post-step time of the latest step when the massless timing fix
    /// changed it; the track-end state is the same point
    pub corrected_post_time: Option<f64>,
}

/// Surviving ancestor -> tracks filtered out beneath it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DroppedAncestry {
    map: BTreeMap<TrackId, BTreeSet<TrackId>>,
}

impl DroppedAncestry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ancestor: TrackId, track: TrackId) {
        self.map.entry(ancestor).or_default().insert(track);
    }

    pub fn descendants_of(&self, ancestor: TrackId) -> Option<&BTreeSet<TrackId>> {
        self.map.get(&ancestor)
    }

    /// Whether `track` was dropped beneath any ancestor
    pub fn contains_track(&self, track: TrackId) -> bool {
        self.map.values().any(|tracks| tracks.contains(&track))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TrackId, &BTreeSet<TrackId>)> {
        self.map.iter().map(|(ancestor, tracks)| (*ancestor, tracks))
    }
}

/// Everything the tracker knows about the event in progress
#[derive(Debug, Clone)]
pub struct EventContext {
    pub genealogy: GenealogyMap,
    pub stores: ParticleStores,
    pub truth: TruthIndexer,
    /// Filtered particle count per not-stored process entry
    pub process_counters: BTreeMap<String, usize>,
    pub dropped_ancestry: DroppedAncestry,
    pub diagnostics: Diagnostics,
    /// Track -> identifier its energy deposits are attributed to
    pub targets: HashMap<TrackId, TrackId>,
    pub current: Option<CurrentTrack>,
}

impl EventContext {
    pub fn new(config: &TrackerConfig, truth_records: &[TruthRecord], not_stored: &[String]) -> Self {
        let mut diagnostics = Diagnostics::new();
        let truth = TruthIndexer::build(truth_records, config, &mut diagnostics);
        let process_counters = not_stored.iter().map(|p| (p.clone(), 0)).collect();

        Self {
            genealogy: GenealogyMap::new(),
            stores: ParticleStores::new(config.store_dropped_particles),
            truth,
            process_counters,
            dropped_ancestry: DroppedAncestry::new(),
            diagnostics,
            targets: HashMap::new(),
            current: None,
        }
    }

    /// The live record of the current track, wherever it is stored
    pub fn current_particle_mut(&mut self) -> Option<&mut Particle> {
        let current = self.current?;
        self.stores
            .list_mut(current.store)?
            .get_mut(current.track_id)
    }
}
