//! Error taxonomy shared by the client, the executor and the session.

/// Failure kinds. `Generation`, `Artifact` and `Execution` are per-attempt
/// failures; `Configuration` is raised before any attempt is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Missing or invalid settings, e.g. no API key in the environment.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The completion service failed or returned nothing usable.
    #[error("code generation failed: {0}")]
    Generation(String),

    /// The artifact could not be written or loaded, or lacks the entry point.
    #[error("generated artifact could not be loaded: {0}")]
    Artifact(String),

    /// The entry point raised, timed out or returned something unreadable.
    #[error("generated function failed: {0}")]
    Execution(String),
}

impl Error {
    pub fn generation(err: impl std::fmt::Display) -> Self {
        Self::Generation(err.to_string())
    }

    pub fn artifact(err: impl std::fmt::Display) -> Self {
        Self::Artifact(err.to_string())
    }

    pub fn execution(err: impl std::fmt::Display) -> Self {
        Self::Execution(err.to_string())
    }

    /// True for the kinds the retry loop counts as a failed attempt.
    pub fn is_attempt_failure(&self) -> bool {
        matches!(
            self,
            Self::Generation(_) | Self::Artifact(_) | Self::Execution(_)
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Generation(_) => "generation",
            Self::Artifact(_) => "artifact",
            Self::Execution(_) => "execution",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
