pub mod answers;
pub mod error;
pub mod host;
pub mod prompt;
pub mod runner;
pub mod step;
pub mod validation;

pub use answers::Answers;
pub use error::{HostError, MissingAnswer, WizardError};
pub use host::{ChoiceOutcome, ChoiceView, Host, TextEvent, TextStatus, TextView};
pub use prompt::{
    InputBox, QuickPick, QuickPickItem, ShouldResume, StepIndicator, Validate, resume_always,
    resume_never, should_resume, validator,
};
pub use runner::{StepInput, WizardRunner};
pub use step::{Interrupt, Step, StepRef, StepResult, Transition};
