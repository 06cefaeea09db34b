//! Track-to-parent links for every track seen in an event

use crate::particle::TrackId;
use std::collections::{HashMap, HashSet};

/// Outcome of an ancestor walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AncestorWalk {
    /// Last parent identifier read, `None` if the track had no entry
    pub ancestor: Option<TrackId>,
    /// The walk came back to an identifier it had already visited
    pub cycle: bool,
}

/// Mapping from track identifier to parent identifier
#[derive(Debug, Clone, Default)]
pub struct GenealogyMap {
    parents: HashMap<TrackId, TrackId>,
}

impl GenealogyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or overwrite) the parent of `track`
    pub fn record(&mut self, track: TrackId, parent: TrackId) {
        self.parents.insert(track, parent);
    }

    pub fn parent_of(&self, track: TrackId) -> Option<TrackId> {
        self.parents.get(&track).copied()
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Follow `track -> parent -> grandparent -> ...` through the recorded
    /// links and return the last parent read. The result need not itself be
    /// a key of the map. `None` if `track` has no entry.
    pub fn resolve_ancestor(&self, track: TrackId) -> Option<TrackId> {
        self.walk(track).ancestor
    }

    /// Same walk as [`resolve_ancestor`](Self::resolve_ancestor), also
    /// reporting whether a cycle cut it short
    pub fn walk(&self, track: TrackId) -> AncestorWalk {
        let mut visited = HashSet::new();
        let mut ancestor = None;
        let mut current = track;
        visited.insert(current);

        while let Some(parent) = self.parent_of(current) {
            ancestor = Some(parent);
            if !visited.insert(parent) {
                return AncestorWalk {
                    ancestor,
                    cycle: true,
                };
            }
            current = parent;
        }

        AncestorWalk {
            ancestor,
            cycle: false,
        }
    }
}
