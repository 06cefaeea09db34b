//! Keyed particle stores
//!
//! Each entry is either a live particle or an archived stub. Stubs keep the
//! identity of a particle whose payload was released, so later genealogy
//! lookups still succeed; callers pattern-match on [`ParticleState`] instead
//! of guarding against a missing payload.

use crate::particle::{Particle, ParticleStub, TrackId};
use std::collections::BTreeMap;

/// Stored form of a particle
#[derive(Debug, Clone)]
pub enum ParticleSlot {
    Live(Particle),
    Archived(ParticleStub),
}

impl ParticleSlot {
    pub fn mother(&self) -> TrackId {
        match self {
            ParticleSlot::Live(p) => p.mother,
            ParticleSlot::Archived(stub) => stub.mother,
        }
    }
}

/// Result of looking up an identifier in a store
#[derive(Debug, Clone, Copy)]
pub enum ParticleState<'a> {
    Active(&'a Particle),
    Archived(&'a ParticleStub),
    Absent,
}

/// Particles of one event, ordered by track identifier
#[derive(Debug, Clone, Default)]
pub struct ParticleList {
    entries: BTreeMap<TrackId, ParticleSlot>,
}

impl ParticleList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the identifier has an entry, live or archived
    pub fn exists(&self, track: TrackId) -> bool {
        self.entries.contains_key(&track)
    }

    /// Insert a live particle under its own track identifier
    pub fn insert(&mut self, particle: Particle) {
        self.entries
            .insert(particle.track_id, ParticleSlot::Live(particle));
    }

    /// Insert an archived stub directly
    pub fn insert_archived(&mut self, stub: ParticleStub) {
        self.entries.insert(stub.track_id, ParticleSlot::Archived(stub));
    }

    /// Remove the entry entirely
    pub fn erase(&mut self, track: TrackId) -> Option<ParticleSlot> {
        self.entries.remove(&track)
    }

    /// Release the payload of a live particle, keeping its identity.
    /// Returns false if there was no live particle under `track`.
    pub fn archive(&mut self, track: TrackId) -> bool {
        match self.entries.remove(&track) {
            Some(ParticleSlot::Live(particle)) => {
                self.insert_archived(particle.archive());
                true
            }
            Some(slot) => {
                self.entries.insert(track, slot);
                false
            }
            None => false,
        }
    }

    pub fn state(&self, track: TrackId) -> ParticleState<'_> {
        match self.entries.get(&track) {
            Some(ParticleSlot::Live(p)) => ParticleState::Active(p),
            Some(ParticleSlot::Archived(stub)) => ParticleState::Archived(stub),
            None => ParticleState::Absent,
        }
    }

    pub fn get(&self, track: TrackId) -> Option<&Particle> {
        match self.entries.get(&track) {
            Some(ParticleSlot::Live(p)) => Some(p),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, track: TrackId) -> Option<&mut Particle> {
        match self.entries.get_mut(&track) {
            Some(ParticleSlot::Live(p)) => Some(p),
            _ => None,
        }
    }

    /// Mother of the entry, answered from the stub for archived particles
    pub fn mother_of(&self, track: TrackId) -> Option<TrackId> {
        self.entries.get(&track).map(ParticleSlot::mother)
    }

    pub fn highest_id(&self) -> Option<TrackId> {
        self.entries.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TrackId, &ParticleSlot)> {
        self.entries.iter().map(|(id, slot)| (*id, slot))
    }

    /// Live particles in identifier order
    pub fn live(&self) -> impl Iterator<Item = &Particle> {
        self.entries.values().filter_map(|slot| match slot {
            ParticleSlot::Live(p) => Some(p),
            ParticleSlot::Archived(_) => None,
        })
    }

    /// Move every entry out, leaving this list empty
    pub fn take(&mut self) -> ParticleList {
        std::mem::take(self)
    }

    pub fn into_slots(self) -> impl Iterator<Item = (TrackId, ParticleSlot)> {
        self.entries.into_iter()
    }
}

/// Which store a particle lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Active,
    Dropped,
}

/// The active store and, when enabled, the dropped store
#[derive(Debug, Clone)]
pub struct ParticleStores {
    pub active: ParticleList,
    pub dropped: Option<ParticleList>,
}

impl ParticleStores {
    pub fn new(store_dropped: bool) -> Self {
        Self {
            active: ParticleList::new(),
            dropped: store_dropped.then(ParticleList::new),
        }
    }

    /// Known to the active store, or to the dropped store when enabled
    pub fn exists(&self, track: TrackId) -> bool {
        self.active.exists(track)
            || self
                .dropped
                .as_ref()
                .map_or(false, |dropped| dropped.exists(track))
    }

    pub fn list_mut(&mut self, kind: StoreKind) -> Option<&mut ParticleList> {
        match kind {
            StoreKind::Active => Some(&mut self.active),
            StoreKind::Dropped => self.dropped.as_mut(),
        }
    }

    /// Highest identifier across both stores
    pub fn highest_id(&self) -> Option<TrackId> {
        let dropped = self.dropped.as_ref().and_then(ParticleList::highest_id);
        self.active.highest_id().max(dropped)
    }
}
