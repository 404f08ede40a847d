use crate::core::error::{HostError, WizardError};
use crate::core::runner::StepInput;
use async_trait::async_trait;
use std::sync::Arc;

pub type StepRef<S> = Arc<dyn Step<S>>;

/// One unit of a wizard: prompts (or computes), writes into the state and
/// names its continuation.
#[async_trait]
pub trait Step<S: Send>: Send + Sync {
    async fn run(&self, input: &mut StepInput<'_>, state: &mut S) -> StepResult<S>;

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

pub enum Transition<S> {
    Next(StepRef<S>),
    Done,
}

impl<S> Transition<S> {
    pub fn next(step: impl Step<S> + 'static) -> Self
    where
        S: Send,
    {
        Self::Next(Arc::new(step))
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

pub type StepResult<S> = Result<Transition<S>, Interrupt>;

/// Non-value outcome of a prompt, propagated out of a step with `?`.
#[derive(Debug)]
pub enum Interrupt {
    /// User asked for the previous step. Pops exactly one frame.
    Back,
    /// Prompt was dismissed and `should_resume` asked to retry the step.
    Resume,
    /// Prompt was dismissed and the wizard must end.
    Cancel,
    Failed(WizardError),
}

impl Interrupt {
    pub fn is_back(&self) -> bool {
        matches!(self, Self::Back)
    }
}

impl From<WizardError> for Interrupt {
    fn from(error: WizardError) -> Self {
        match error {
            WizardError::Cancelled => Self::Cancel,
            other => Self::Failed(other),
        }
    }
}

impl From<HostError> for Interrupt {
    fn from(error: HostError) -> Self {
        Self::Failed(WizardError::Host(error))
    }
}
