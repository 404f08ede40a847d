use std::io;

/// Failure reported by a [`Host`](crate::core::host::Host) adapter.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("prompt surface unavailable: {0}")]
    Unavailable(String),
    #[error("host returned an out-of-range choice {index} for {len} items")]
    ChoiceOutOfRange { index: usize, len: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    /// The user dismissed a prompt and chose not to resume.
    #[error("wizard cancelled by user")]
    Cancelled,
    #[error("host failure: {0}")]
    Host(#[from] HostError),
    #[error("invalid prompt: {0}")]
    InvalidPrompt(String),
    #[error("step failed: {0}")]
    Step(String),
}

impl WizardError {
    pub fn step(message: impl Into<String>) -> Self {
        Self::Step(message.into())
    }

    pub fn invalid_prompt(message: impl Into<String>) -> Self {
        Self::InvalidPrompt(message.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Raised by a strict config when a builder field was never answered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing answer for `{field}`")]
pub struct MissingAnswer {
    pub field: &'static str,
}

impl MissingAnswer {
    pub fn new(field: &'static str) -> Self {
        Self { field }
    }
}
