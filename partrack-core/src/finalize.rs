//! End-of-event processing
//!
//! Daughter links are attached only here, once every track of the event is
//! known, because re-parenting can point a track at an ancestor whose other
//! descendants are processed later.

use crate::diagnostics::Diagnostics;
use crate::error::TrackerError;
use crate::event::{DroppedAncestry, EventContext};
use crate::particle::{MinimalParticle, Particle, TrackId, NO_PARENT, STATUS_TRACKED};
use crate::store::{ParticleList, ParticleSlot, ParticleState};
use crate::truth::Origin;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Links an emitted particle to the truth record it descends from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TruthAssociation {
    pub truth_index: usize,
    /// Position of the particle in [`EventOutput::particles`]
    pub particle_index: usize,
    /// Generator-local index of the seeding particle, primaries only
    pub generator_index: Option<usize>,
}

/// Everything produced for one event
#[derive(Debug, Clone)]
pub struct EventOutput {
    /// Grouped by truth record, ascending track id within a record
    pub particles: Vec<Particle>,
    pub associations: Vec<TruthAssociation>,
    pub dropped_ancestry: DroppedAncestry,
    pub process_counters: BTreeMap<String, usize>,
    pub diagnostics: Diagnostics,
    /// Offset that will be applied to the next batch
    pub next_offset: TrackId,
    dropped_particles: Option<Vec<MinimalParticle>>,
}

impl EventOutput {
    /// Minimal records of dropped particles. Only available when dropped
    /// particle storage was enabled.
    pub fn dropped_particles(&self) -> Result<&[MinimalParticle], TrackerError> {
        self.dropped_particles
            .as_deref()
            .ok_or(TrackerError::DroppedStorageDisabled)
    }

    pub fn take_dropped_particles(&mut self) -> Result<Vec<MinimalParticle>, TrackerError> {
        self.dropped_particles
            .take()
            .ok_or(TrackerError::DroppedStorageDisabled)
    }

    pub fn particle(&self, track_id: TrackId) -> Option<&Particle> {
        self.particles.iter().find(|p| p.track_id == track_id)
    }

    pub fn association_of(&self, track_id: TrackId) -> Option<&TruthAssociation> {
        self.associations
            .iter()
            .find(|a| self.particles[a.particle_index].track_id == track_id)
    }
}

/// Append every live particle to its parent's daughter list.
///
/// Orphans (parent not stored) and children of archived parents are
/// skipped.
pub fn link_daughters(list: &mut ParticleList) {
    let links: Vec<(TrackId, TrackId)> = list
        .iter()
        .filter_map(|(id, _)| {
            let parent = list.mother_of(id)?;
            (parent > NO_PARENT).then_some((parent, id))
        })
        .collect();

    for (parent, daughter) in links {
        match list.state(parent) {
            ParticleState::Active(_) => {
                if let Some(p) = list.get_mut(parent) {
                    p.add_daughter(daughter);
                }
            }
            ParticleState::Archived(_) | ParticleState::Absent => {}
        }
    }
}

/// Offset for the next batch: one past the highest identifier stored, and
/// never lower than the current offset. Unchanged if no particle was kept.
pub fn next_offset(ctx: &EventContext, current: TrackId) -> TrackId {
    if ctx.stores.active.is_empty() {
        return current;
    }
    let highest = ctx.stores.highest_id().unwrap_or(0).max(0);
    current.max(highest + 1)
}

/// Consume the event context and produce the event output.
pub fn finalize(mut ctx: EventContext, offset: &mut TrackId) -> Result<EventOutput, TrackerError> {
    if !ctx.process_counters.is_empty() {
        info!(
            target: "partrack::finalize",
            counters = ?ctx.process_counters,
            "not stored process summary"
        );
    }

    link_daughters(&mut ctx.stores.active);

    let new_offset = next_offset(&ctx, *offset);
    if new_offset != *offset {
        debug!(
            target: "partrack::finalize",
            highest = new_offset - 1,
            offset = new_offset,
            "track id offset updated"
        );
    }
    *offset = new_offset;

    let num_records = ctx.truth.num_records();
    let mut by_record: Vec<Vec<Particle>> = vec![Vec::new(); num_records];
    for (id, slot) in ctx.stores.active.take().into_slots() {
        let ParticleSlot::Live(particle) = slot else {
            continue;
        };
        match ctx.truth.track_truth(id) {
            Some(truth) if truth.truth_index < num_records => {
                by_record[truth.truth_index].push(particle)
            }
            _ => warn!(
                target: "partrack::finalize",
                track = id,
                "particle does not descend from any truth record of this event; not emitted"
            ),
        }
    }

    let mut particles = Vec::new();
    let mut associations = Vec::new();
    for (truth_index, record_particles) in by_record.into_iter().enumerate() {
        debug!(
            target: "partrack::finalize",
            truth_index,
            particles = record_particles.len(),
            "emitting particles for truth record"
        );
        for particle in record_particles {
            let generator_index = ctx.truth.primary_index(particle.track_id);
            if generator_index.is_none() && particle.is_primary() {
                let generator = ctx
                    .truth
                    .generator(truth_index)
                    .map(|g| g.label.clone())
                    .unwrap_or_default();
                warn!(target: "partrack::finalize", track = particle.track_id, "no generated particle index");
                return Err(TrackerError::UnmatchedPrimary {
                    track: particle.track_id,
                    truth_index,
                    generator,
                });
            }
            particles.push(particle);
            associations.push(TruthAssociation {
                truth_index,
                particle_index: particles.len() - 1,
                generator_index,
            });
        }
    }

    let dropped_particles = ctx.stores.dropped.take().map(|dropped| {
        dropped
            .live()
            .filter(|p| p.status_code == STATUS_TRACKED)
            .filter_map(|p| {
                let origin = ctx
                    .truth
                    .track_truth(p.track_id)
                    .and_then(|t| ctx.truth.generator(t.truth_index))
                    .map_or(Origin::Unknown, |g| g.origin);
                MinimalParticle::from_particle(p, origin)
            })
            .collect()
    });

    Ok(EventOutput {
        particles,
        associations,
        dropped_ancestry: ctx.dropped_ancestry,
        process_counters: ctx.process_counters,
        diagnostics: ctx.diagnostics,
        next_offset: *offset,
        dropped_particles,
    })
}
