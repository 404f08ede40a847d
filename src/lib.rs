pub mod collab;
pub mod config;
pub mod core;
pub mod input;
pub mod terminal;
pub mod testing;
pub mod wizards;

pub use crate::config::WizardConfig;
pub use crate::core::{
    Answers, Host, InputBox, Interrupt, QuickPick, QuickPickItem, Step, StepInput, StepResult,
    Transition, WizardError, WizardRunner,
};
