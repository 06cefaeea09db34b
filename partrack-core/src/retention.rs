//! Track-begin retention decisions
//!
//! Decides for each new track whether it is a primary or a secondary,
//! whether it is filtered out (by creator process or energy), who its
//! parent is once filtered ancestors are skipped, which truth record it
//! descends from, and whether its trajectory is kept in full.

use crate::config::TrackerConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::error::TrackerError;
use crate::event::{CurrentTrack, EventContext};
use crate::kernel::TrackStart;
use crate::particle::{Particle, TrackId, NO_PARENT, NO_PARTICLE_ID};
use crate::store::StoreKind;
use crate::truth::TrackTruth;
use tracing::{debug, warn};

/// Generation label reserved for particles taken directly from a generator
pub const PRIMARY_PROCESS: &str = "primary";

/// How a primary's generation label was interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryClass {
    /// Exactly "primary"
    Canonical,
    /// Starts with "primary" but is longer; accepted as is
    NonCanonical,
    /// Anything else; replaced by "primary"
    Overridden,
}

impl PrimaryClass {
    pub fn of(label: &str) -> Self {
        if label == PRIMARY_PROCESS {
            PrimaryClass::Canonical
        } else if label.starts_with(PRIMARY_PROCESS) {
            PrimaryClass::NonCanonical
        } else {
            PrimaryClass::Overridden
        }
    }

    /// Overridden labels count as canonical once replaced
    pub fn is_canonical(self) -> bool {
        !matches!(self, PrimaryClass::NonCanonical)
    }

    pub fn process_name(self, label: &str) -> String {
        match self {
            PrimaryClass::NonCanonical => label.to_string(),
            PrimaryClass::Canonical | PrimaryClass::Overridden => PRIMARY_PROCESS.to_string(),
        }
    }
}

/// Why a track was filtered out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterReason {
    /// Created by a not-stored process; carries the matching list entry
    NotStoredProcess(String),
    EnergyCut,
}

/// What happened to a track at track begin
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackDisposition {
    /// Stored in the active store
    Active,
    /// Filtered, but kept in the dropped store
    Dropped(FilterReason),
    /// Filtered and not stored anywhere
    Discarded(FilterReason),
    /// A suspended track resuming; no new record
    Resumed,
}

/// Retention rules derived from the configuration
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    not_stored: Vec<String>,
    energy_cut: f64,
    store_trajectories: bool,
    keep_only_primary_full_trajectories: bool,
}

impl RetentionPolicy {
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self {
            not_stored: config.effective_not_stored_physics(),
            energy_cut: config.energy_cut,
            store_trajectories: config.store_trajectories,
            keep_only_primary_full_trajectories: config.keep_only_primary_full_trajectories,
        }
    }

    pub fn not_stored(&self) -> &[String] {
        &self.not_stored
    }

    /// First not-stored entry contained in the creator process name
    pub fn not_stored_match(&self, creator_process: &str) -> Option<&str> {
        self.not_stored
            .iter()
            .find(|entry| creator_process.contains(entry.as_str()))
            .map(String::as_str)
    }

    /// Species code 0 is exempt from the cut
    pub fn below_energy_cut(&self, pdg_code: i32, kinetic_energy: f64) -> bool {
        kinetic_energy < self.energy_cut && pdg_code != 0
    }

    /// Whether all trajectory points of a track are kept, in priority order:
    /// global switch, generator allow-list, primary-only restriction.
    pub fn keep_full_trajectory(&self, generator_retainable: bool, from_canonical_primary: bool) -> bool {
        if !self.store_trajectories {
            false
        } else if !generator_retainable {
            false
        } else if !self.keep_only_primary_full_trajectories {
            true
        } else {
            from_canonical_primary
        }
    }

    /// Run the track-begin decision for one track and record the result in
    /// the event context. `offset` is added to the kernel identifiers.
    pub fn begin_track(
        &self,
        ctx: &mut EventContext,
        start: &TrackStart,
        offset: TrackId,
    ) -> Result<TrackDisposition, TrackerError> {
        let track_id = start.track_id + offset;
        let mut parent_id = start.parent_id + offset;
        ctx.current = None;
        ctx.targets.insert(track_id, track_id);

        let process_name;
        let truth_index;
        let from_canonical_primary;
        let mut generator_index = None;
        let mut not_stored_entry = None;

        if let Some(provenance) = &start.primary {
            let class = PrimaryClass::of(&provenance.process);
            process_name = class.process_name(&provenance.process);
            from_canonical_primary = class.is_canonical();
            truth_index = provenance.truth_index;
            generator_index = Some(provenance.generator_index);

            match class {
                PrimaryClass::Canonical => {}
                PrimaryClass::NonCanonical => {
                    debug!(
                        target: "partrack::retention",
                        track = track_id,
                        process = %provenance.process,
                        "primary process starts with \"primary\" but is not exactly \"primary\"; full trajectory restricted"
                    );
                    ctx.diagnostics.push(Diagnostic::info(
                        DiagnosticKind::NonCanonicalPrimary,
                        format!("non-canonical primary process '{}'", provenance.process),
                        Some(track_id),
                    ));
                }
                PrimaryClass::Overridden => {
                    warn!(
                        target: "partrack::retention",
                        track = track_id,
                        process = %provenance.process,
                        "primary process does not begin with \"primary\"; overriding it to \"primary\""
                    );
                    ctx.diagnostics.push(Diagnostic::warning(
                        DiagnosticKind::PrimaryLabelOverridden,
                        format!("primary process '{}' overridden to 'primary'", provenance.process),
                        Some(track_id),
                    ));
                }
            }

            // Primaries have no parent, even with several truth records
            parent_id = NO_PARENT;
        } else {
            process_name = start.creator_process.clone();

            if let Some(entry) = self.not_stored_match(&process_name) {
                debug!(target: "partrack::retention", process = %process_name, "found not-stored process");
                *ctx.process_counters.entry(entry.to_string()).or_insert(0) += 1;
                not_stored_entry = Some(entry.to_string());
                record_dropped(ctx, track_id, parent_id);
            }

            if self.below_energy_cut(start.pdg_code, start.kinetic_energy) {
                record_dropped(ctx, track_id, parent_id);
                return Ok(TrackDisposition::Discarded(FilterReason::EnergyCut));
            }

            // The parent may itself have been filtered; attach to the nearest
            // ancestor that is still stored.
            if !ctx.stores.exists(parent_id) {
                ctx.genealogy.record(track_id, parent_id);
                match ctx.genealogy.resolve_ancestor(parent_id) {
                    Some(ancestor) if ctx.stores.exists(ancestor) => parent_id = ancestor,
                    _ => {
                        warn!(
                            target: "partrack::retention",
                            track = track_id,
                            parent = parent_id,
                            "can't find parent in the particle list or genealogy; keeping it as mother to aid debugging"
                        );
                        ctx.diagnostics.push(Diagnostic::warning(
                            DiagnosticKind::UnresolvedParent,
                            format!("unresolved parent {}", parent_id),
                            Some(track_id),
                        ));
                    }
                }
            }

            let parent_truth = ctx
                .truth
                .track_truth(parent_id)
                .ok_or(TrackerError::MissingTruthIndex {
                    track: track_id,
                    parent: parent_id,
                })?;
            truth_index = parent_truth.truth_index;
            from_canonical_primary = parent_truth.from_canonical_primary;
        }

        ctx.truth.record_track(
            track_id,
            TrackTruth {
                truth_index,
                from_canonical_primary,
            },
        );

        let keep_full = self.keep_full_trajectory(
            ctx.truth.is_retainable(truth_index),
            from_canonical_primary,
        );
        let mut particle = Particle::new(
            track_id,
            start.pdg_code,
            process_name,
            parent_id,
            start.mass,
            keep_full,
        );
        particle.polarization = start.polarization;

        if start.proper_time != 0.0 {
            debug!(target: "partrack::retention", track = track_id, "resumed track, no new record");
            return Ok(TrackDisposition::Resumed);
        }

        let (store, disposition) = match not_stored_entry {
            None => {
                ctx.stores.active.insert(particle);
                (Some(StoreKind::Active), TrackDisposition::Active)
            }
            Some(entry) => {
                let reason = FilterReason::NotStoredProcess(entry);
                match ctx.stores.dropped.as_mut() {
                    Some(dropped) => {
                        dropped.insert(particle);
                        (Some(StoreKind::Dropped), TrackDisposition::Dropped(reason))
                    }
                    None => (None, TrackDisposition::Discarded(reason)),
                }
            }
        };

        ctx.current = store.map(|store| CurrentTrack {
            track_id,
            store,
            generator_index,
            corrected_post_time: None,
        });
        Ok(disposition)
    }
}

/// Record a filtered track beneath its ultimate ancestor and point its
/// energy attribution at that ancestor.
fn record_dropped(ctx: &mut EventContext, track_id: TrackId, parent_id: TrackId) {
    ctx.genealogy.record(track_id, parent_id);
    let walk = ctx.genealogy.walk(track_id);
    if walk.cycle {
        warn!(target: "partrack::genealogy", track = track_id, "cycle in parent links");
        ctx.diagnostics.push(Diagnostic::warning(
            DiagnosticKind::GenealogyCycle,
            "cycle in parent links",
            Some(track_id),
        ));
    }
    let ancestor = walk.ancestor.unwrap_or(parent_id);
    ctx.dropped_ancestry.insert(ancestor, track_id);

    let target = if ctx.stores.active.exists(ancestor) {
        ancestor.checked_neg().unwrap_or(NO_PARTICLE_ID)
    } else {
        NO_PARTICLE_ID
    };
    ctx.targets.insert(track_id, target);
}
