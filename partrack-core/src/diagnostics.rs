//! Non-fatal diagnostics collected while tracking an event
//!
//! Recoverable anomalies (odd primary labels, unresolvable parents,
//! generator allow-lists that match nothing) never abort an event. They are
//! logged as they happen and also collected here so the host can inspect
//! them alongside the event output.

use crate::particle::TrackId;
use std::fmt;

/// How serious a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    Info,
    Warning,
}

/// What kind of anomaly was observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Primary label starts with "primary" but is not exactly "primary"
    NonCanonicalPrimary,
    /// Primary label does not start with "primary" and was overridden
    PrimaryLabelOverridden,
    /// A secondary's parent could not be found in any store
    UnresolvedParent,
    /// A generator allow-list is configured but matched no generator
    NoRetainableGenerator,
    /// The ancestor walk revisited an identifier
    GenealogyCycle,
}

/// A single diagnostic message
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub track: Option<TrackId>,
}

impl Diagnostic {
    pub fn info(kind: DiagnosticKind, message: impl Into<String>, track: Option<TrackId>) -> Self {
        Self {
            severity: DiagnosticSeverity::Info,
            kind,
            message: message.into(),
            track,
        }
    }

    pub fn warning(
        kind: DiagnosticKind,
        message: impl Into<String>,
        track: Option<TrackId>,
    ) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            kind,
            message: message.into(),
            track,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            DiagnosticSeverity::Info => "info",
            DiagnosticSeverity::Warning => "warning",
        };
        match self.track {
            Some(track) => write!(f, "{}: {} (track {})", level, self.message, track),
            None => write!(f, "{}: {}", level, self.message),
        }
    }
}

/// Ordered collection of diagnostics for one event
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Warning)
    }

    /// All diagnostics of the given kind
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }
}
