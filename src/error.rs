//! Failure taxonomy for session, navigation and input handling.

use thiserror::Error;

/// Typed failures surfaced by the core runtime.
///
/// Field-level extraction problems never reach this type; they degrade to
/// absent fields inside the extractor.
#[derive(Debug, Error)]
pub enum Error {
    /// The process cannot proceed at all (e.g. no browser executable).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The persistent profile is held by another live session. Retry later;
    /// this is never retried automatically.
    #[error("browser profile is busy: {0}")]
    SessionBusy(String),

    /// Launching or tearing down the browsing context failed.
    #[error("session launch failed: {0}")]
    SessionLaunch(String),

    /// The request referenced a tweet, user or query that cannot be resolved.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// A mandatory DOM container never appeared within its wait budget.
    #[error("timed out waiting for {0}")]
    NavigationTimeout(String),
}

impl Error {
    /// Stable machine-readable kind for the failure envelope.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "configuration",
            Error::SessionBusy(_) => "session_busy",
            Error::SessionLaunch(_) => "session_launch",
            Error::InvalidReference(_) => "invalid_reference",
            Error::NavigationTimeout(_) => "navigation_timeout",
        }
    }
}
