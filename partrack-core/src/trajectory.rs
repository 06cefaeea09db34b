//! Trajectory accumulation and sparsification
//!
//! Points are appended while a track is stepped. At track end the sequence
//! is either capped with a single final point (start/end only particles) or
//! optionally thinned by [`Trajectory::sparsified`], which is a pure
//! transform producing a new sequence.

use crate::kernel::{StepInput, StepPoint};
use crate::particle::Particle;
use glam::DVec4;
use serde::Serialize;
use std::collections::BTreeSet;

/// Label given to the backfilled first point of every trajectory
pub const START_PROCESS: &str = "Start";

/// Kernel process name for plain transport steps
pub const TRANSPORTATION_PROCESS: &str = "Transportation";

/// Tolerance between reported and step-derived velocity, cm/ns
const VELOCITY_TOLERANCE: f64 = 1e-4;

/// One recorded point along a trajectory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    /// (x, y, z, t) in cm and ns
    pub position: DVec4,
    /// (px, py, pz, E) in GeV
    pub momentum: DVec4,
    /// Process label; absent for unlabelled transport points
    pub process: Option<String>,
}

/// Ordered sequence of trajectory points
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trajectory {
    points: Vec<TrajectoryPoint>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a point. Its process label is kept unless it is a plain
    /// transport step and transport labels are not wanted.
    pub fn push(
        &mut self,
        position: DVec4,
        momentum: DVec4,
        process: &str,
        keep_transportation: bool,
    ) {
        let process = if process != TRANSPORTATION_PROCESS || keep_transportation {
            Some(process.to_string())
        } else {
            None
        };
        self.points.push(TrajectoryPoint {
            position,
            momentum,
            process,
        });
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&TrajectoryPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&TrajectoryPoint> {
        self.points.last()
    }

    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Thin the trajectory, keeping only the points needed to stay within
    /// `margin` (cm) of the full path.
    ///
    /// Ranges of points are checked divide-and-conquer style: if every
    /// intermediate point lies within `margin` of the straight chord between
    /// the range endpoints, the endpoints represent the range; otherwise the
    /// range is split at its midpoint. Labelled points and the final point
    /// are always retained, as is the second-to-last point when
    /// `keep_second_to_last` is set. Trajectories of two points or fewer are
    /// returned unchanged.
    pub fn sparsified(&self, margin: f64, keep_second_to_last: bool) -> Trajectory {
        let n = self.points.len();
        if n <= 2 {
            return self.clone();
        }

        let margin_sq = margin * margin;
        let mut keep = BTreeSet::new();
        let mut to_check = vec![(0usize, n - 1)];

        while let Some((lo, hi)) = to_check.pop() {
            let lo_vec = self.points[lo].position.truncate();
            let hi_vec = self.points[hi].position.truncate();
            let dir = (hi_vec - lo_vec).normalize_or_zero();

            let within = (lo + 1..hi).all(|i| {
                let to_here = self.points[i].position.truncate() - lo_vec;
                let impact = to_here - dir * dir.dot(to_here);
                impact.length_squared() <= margin_sq
            });

            if within {
                keep.insert(lo);
                continue;
            }

            // Ranges of two or three points split into pieces that are
            // already minimal; record those directly.
            let mid = (lo + hi) / 2;
            if mid == lo + 1 {
                keep.insert(lo);
            } else {
                to_check.push((lo, mid));
            }
            if mid == hi - 1 {
                keep.insert(mid);
            } else {
                to_check.push((mid, hi));
            }
        }

        for (i, point) in self.points.iter().enumerate() {
            if point.process.is_some() {
                keep.insert(i);
            }
        }
        if keep_second_to_last {
            keep.insert(n - 2);
        }
        keep.insert(n - 1);

        Trajectory {
            points: keep.into_iter().map(|i| self.points[i].clone()).collect(),
        }
    }
}

/// Sparsification settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SparsifyOptions {
    pub margin: f64,
    pub keep_second_to_last: bool,
}

/// Builds particle trajectories from step and track-end callbacks
#[derive(Debug, Clone, Copy)]
pub struct TrajectoryAccumulator {
    pub keep_transportation: bool,
    pub sparsify: Option<SparsifyOptions>,
}

impl TrajectoryAccumulator {
    /// Record one step of the particle's track.
    ///
    /// Steps without a defining process are ignored.
    pub fn on_step(&self, particle: &mut Particle, step: &StepInput) {
        let Some(process) = step.process.as_deref() else {
            return;
        };

        let mut post = step.post;
        post.time = corrected_post_time(particle.pdg_code, step);

        // Timing is not reliable at track begin, so the vertex is taken from
        // the first step's pre-step point.
        if particle.trajectory.is_empty() {
            particle.trajectory.push(
                step.pre.four_position(),
                step.pre.four_momentum(),
                START_PROCESS,
                self.keep_transportation,
            );
        }

        if !step.is_step_limiter() && particle.keep_full_trajectory() {
            self.push_point(particle, &post, process);
        }
    }

    /// Close the particle's trajectory with a well-defined final step.
    pub fn on_track_end(&self, particle: &mut Particle, post: &StepPoint, process: &str) {
        particle.end_process = process.to_string();

        // Fully kept trajectories already hold the final point from stepping.
        if !particle.keep_full_trajectory() {
            self.push_point(particle, post, process);
        } else if let Some(opts) = self.sparsify {
            particle.trajectory = particle
                .trajectory
                .sparsified(opts.margin, opts.keep_second_to_last);
        }
    }

    fn push_point(&self, particle: &mut Particle, point: &StepPoint, process: &str) {
        particle.trajectory.push(
            point.four_position(),
            point.four_momentum(),
            process,
            self.keep_transportation,
        );
    }
}

/// Post-step global time, corrected for the kernel's faulty step time on
/// species code 0 (optical photons).
///
/// When the reported velocity disagrees with step length over step time,
/// the step time is recomputed from the reported velocity.
pub fn corrected_post_time(pdg_code: i32, step: &StepInput) -> f64 {
    let global_time = step.post.time;
    if pdg_code != 0 || step.velocity <= 0.0 {
        return global_time;
    }
    let velocity_step = step.step_length / step.delta_time;
    if (step.velocity - velocity_step).abs() > VELOCITY_TOLERANCE {
        global_time - step.delta_time + step.step_length / step.velocity
    } else {
        global_time
    }
}
