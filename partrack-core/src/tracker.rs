use crate::config::TrackerConfig;
use crate::error::{ConfigError, TrackerError};
use crate::event::EventContext;
use crate::finalize::{finalize, EventOutput};
use crate::kernel::{StepInput, TrackEnd, TrackStart};
use crate::particle::TrackId;
use crate::retention::{RetentionPolicy, TrackDisposition};
use crate::store::{ParticleSlot, StoreKind};
use crate::trajectory::{corrected_post_time, SparsifyOptions, TrajectoryAccumulator};
use crate::truth::TruthRecord;
use tracing::debug;

/// Builds the particle list of an event from kernel callbacks.
///
/// Callbacks arrive in kernel stack order:
/// `begin_event`, then for each track `begin_track`, any number of `step`,
/// `end_track`, and finally `end_event`. One tracker serves one sequence of
/// events; concurrent workers each own their own tracker.
#[derive(Debug)]
pub struct ParticleTracker {
    config: TrackerConfig,
    policy: RetentionPolicy,
    accumulator: TrajectoryAccumulator,
    offset: TrackId,
    event: Option<EventContext>,
}

impl ParticleTracker {
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        config.log_summary();

        let policy = RetentionPolicy::from_config(&config);
        let accumulator = TrajectoryAccumulator {
            keep_transportation: config.keep_transportation,
            sparsify: config.sparsify_trajectories.then_some(SparsifyOptions {
                margin: config.sparsify_margin,
                keep_second_to_last: config.keep_second_to_last,
            }),
        };

        Ok(Self {
            config,
            policy,
            accumulator,
            offset: 0,
            event: None,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Offset added to kernel identifiers of the current batch
    pub fn offset(&self) -> TrackId {
        self.offset
    }

    /// State of the event in progress, if any
    pub fn event(&self) -> Option<&EventContext> {
        self.event.as_ref()
    }

    /// Start a new event, discarding any unfinished one. The carried offset
    /// is kept.
    pub fn begin_event(&mut self, truth: &[TruthRecord]) {
        if self.event.is_some() {
            debug!(target: "partrack::tracker", "previous event was not finished; discarding it");
        }
        self.event = Some(EventContext::new(
            &self.config,
            truth,
            self.policy.not_stored(),
        ));
    }

    pub fn begin_track(&mut self, start: &TrackStart) -> Result<TrackDisposition, TrackerError> {
        let ctx = self.event.as_mut().ok_or(TrackerError::NoEventInProgress)?;
        self.policy.begin_track(ctx, start, self.offset)
    }

    /// Record one step of the current track. Steps of filtered tracks are
    /// ignored.
    pub fn step(&mut self, step: &StepInput) -> Result<(), TrackerError> {
        let ctx = self.event.as_mut().ok_or(TrackerError::NoEventInProgress)?;
        let corrected = match ctx.current_particle_mut() {
            Some(particle) => {
                self.accumulator.on_step(particle, step);
                corrected_post_time(particle.pdg_code, step)
            }
            None => return Ok(()),
        };
        if let Some(current) = ctx.current.as_mut() {
            current.corrected_post_time = (corrected != step.post.time).then_some(corrected);
        }
        Ok(())
    }

    pub fn end_track(&mut self, end: &TrackEnd) -> Result<(), TrackerError> {
        let ctx = self.event.as_mut().ok_or(TrackerError::NoEventInProgress)?;
        let Some(current) = ctx.current.take() else {
            return Ok(());
        };

        if let Some(mut post) = end.post {
            if let Some(time) = current.corrected_post_time {
                post.time = time;
            }
            let Some(list) = ctx.stores.list_mut(current.store) else {
                return Ok(());
            };
            let Some(particle) = list.get_mut(current.track_id) else {
                return Ok(());
            };
            particle.weight = end.weight;

            match end.process.as_deref() {
                Some(process) => self.accumulator.on_track_end(particle, &post, process),
                None => {
                    // No valid post-step state: remove the record entirely. A
                    // stub stays behind in the dropped store for start/end
                    // only particles so ancestry lookups still find it.
                    let keep_full = particle.keep_full_trajectory();
                    let erased = list.erase(current.track_id);
                    debug!(
                        target: "partrack::tracker",
                        track = current.track_id,
                        "track ended without a defining process; record erased"
                    );
                    if !keep_full {
                        if let (Some(ParticleSlot::Live(particle)), Some(dropped)) =
                            (erased, ctx.stores.list_mut(StoreKind::Dropped))
                        {
                            dropped.insert_archived(particle.archive());
                        }
                    }
                    return Ok(());
                }
            }
        }

        if let Some(generator_index) = current.generator_index {
            ctx.truth.record_primary(current.track_id, generator_index);
        }
        Ok(())
    }

    /// Finish the event and hand over its output. The tracker's stores are
    /// empty afterwards; only the identifier offset carries over.
    pub fn end_event(&mut self) -> Result<EventOutput, TrackerError> {
        let ctx = self.event.take().ok_or(TrackerError::NoEventInProgress)?;
        finalize(ctx, &mut self.offset)
    }

    /// Identifier that energy deposits of a kernel track should be
    /// attributed to: the track itself when stored, the negated surviving
    /// ancestor when filtered.
    pub fn target_track_id(&self, kernel_track_id: i32) -> Option<TrackId> {
        let ctx = self.event.as_ref()?;
        ctx.targets.get(&(kernel_track_id + self.offset)).copied()
    }
}
