pub mod config;
pub mod diagnostics;
pub mod error;
pub mod event;
pub mod finalize;
pub mod genealogy;
pub mod kernel;
pub mod particle;
pub mod replay;
pub mod retention;
pub mod store;
pub mod tracker;
pub mod trajectory;
pub mod truth;

pub use config::TrackerConfig;
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSeverity, Diagnostics};
pub use error::{ConfigError, ReplayError, TrackerError};
pub use event::{DroppedAncestry, EventContext};
pub use finalize::{EventOutput, TruthAssociation};
pub use genealogy::GenealogyMap;
pub use kernel::{PrimaryProvenance, StepInput, StepPoint, TrackEnd, TrackStart};
pub use particle::{MinimalParticle, Particle, ParticleStub, TrackId, NO_PARENT, NO_PARTICLE_ID};
pub use replay::{replay, replay_event, EventTrace, KernelEvent, Trace};
pub use retention::{FilterReason, TrackDisposition};
pub use store::{ParticleList, ParticleState, ParticleStores};
pub use tracker::ParticleTracker;
pub use trajectory::{Trajectory, TrajectoryPoint};
pub use truth::{GeneratedParticle, Origin, TruthRecord};

// Test helpers module (public for integration tests)
// Always compiled - integration tests are separate crates and need access
pub mod tests;
