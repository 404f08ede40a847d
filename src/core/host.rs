use crate::core::error::HostError;
use crate::core::prompt::{QuickPickItem, StepIndicator};
use async_trait::async_trait;

pub struct ChoiceView<'a> {
    pub title: &'a str,
    pub indicator: StepIndicator,
    pub placeholder: Option<&'a str>,
    pub items: &'a [QuickPickItem],
    pub active: Option<usize>,
    pub can_go_back: bool,
}

pub struct TextView<'a> {
    pub title: &'a str,
    pub indicator: StepIndicator,
    pub prompt: Option<&'a str>,
    pub value: &'a str,
    pub can_go_back: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceOutcome {
    Picked(usize),
    Back,
    Dismissed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextEvent {
    Changed(String),
    Accept(String),
    Back,
    Dismissed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStatus<'a> {
    Clear,
    /// Validation for the accepted value has not settled yet.
    Pending,
    Error(&'a str),
}

/// Prompt surface the wizard engine renders through.
///
/// A text prompt is a session: `open_text_input`, then any number of
/// `next_text_event` / `show_validation` calls, then `close_text_input`.
/// `next_text_event` must be cancel-safe: the engine races it against
/// in-flight validations and drops it when a validation settles first.
#[async_trait]
pub trait Host: Send {
    async fn present_choice(&mut self, view: &ChoiceView<'_>) -> Result<ChoiceOutcome, HostError>;

    async fn open_text_input(&mut self, view: &TextView<'_>) -> Result<(), HostError>;

    async fn next_text_event(&mut self) -> Result<TextEvent, HostError>;

    async fn show_validation(&mut self, status: TextStatus<'_>) -> Result<(), HostError>;

    async fn close_text_input(&mut self) -> Result<(), HostError>;
}
