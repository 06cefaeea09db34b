use crate::particle::TrackId;
use thiserror::Error;

/// Fatal inconsistencies that abort the current event
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("could not locate truth record index for parent track {parent} of track {track}")]
    MissingTruthIndex { track: TrackId, parent: TrackId },

    #[error("failed to match primary particle {track} with particles from truth record {truth_index} ('{generator}')")]
    UnmatchedPrimary {
        track: TrackId,
        truth_index: usize,
        generator: String,
    },

    #[error("dropped particle list was not built: dropped particle storage is disabled")]
    DroppedStorageDisabled,

    #[error("no event in progress: begin_event must be called first")]
    NoEventInProgress,
}

/// Errors loading or validating a tracker configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors replaying a recorded kernel trace
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read trace: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse trace: {0}")]
    Json(#[from] serde_json::Error),

    #[error("event {event} aborted: {source}")]
    Tracker {
        event: usize,
        #[source]
        source: TrackerError,
    },
}
