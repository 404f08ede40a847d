//! Script-driven [`Host`] for exercising wizards without a terminal.

use crate::core::error::HostError;
use crate::core::host::{ChoiceOutcome, ChoiceView, Host, TextEvent, TextStatus, TextView};
use crate::core::prompt::StepIndicator;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scripted {
    Choice(ChoiceOutcome),
    Text(TextEvent),
    /// Hold the next response back for this long.
    Wait(Duration),
    Fail(String),
}

impl Scripted {
    pub fn pick(index: usize) -> Self {
        Self::Choice(ChoiceOutcome::Picked(index))
    }

    pub fn back_choice() -> Self {
        Self::Choice(ChoiceOutcome::Back)
    }

    pub fn dismiss_choice() -> Self {
        Self::Choice(ChoiceOutcome::Dismissed)
    }

    pub fn type_text(text: &str) -> Self {
        Self::Text(TextEvent::Changed(text.to_string()))
    }

    pub fn accept(text: &str) -> Self {
        Self::Text(TextEvent::Accept(text.to_string()))
    }

    pub fn back_text() -> Self {
        Self::Text(TextEvent::Back)
    }

    pub fn dismiss_text() -> Self {
        Self::Text(TextEvent::Dismissed)
    }

    pub fn wait_ms(ms: u64) -> Self {
        Self::Wait(Duration::from_millis(ms))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shown {
    Choice {
        title: String,
        indicator: StepIndicator,
        labels: Vec<String>,
        active: Option<String>,
        can_go_back: bool,
    },
    Text {
        title: String,
        indicator: StepIndicator,
        value: String,
        can_go_back: bool,
    },
    Pending,
    Error(String),
    Cleared,
    Closed,
}

enum Entry {
    Ready(Scripted),
    WaitUntil(Instant),
}

#[derive(Default)]
pub struct ScriptedHost {
    script: VecDeque<Entry>,
    shown: Vec<Shown>,
}

impl ScriptedHost {
    pub fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            script: script.into_iter().map(Entry::Ready).collect(),
            shown: Vec::new(),
        }
    }

    pub fn shown(&self) -> &[Shown] {
        &self.shown
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    /// Titles of every prompt shown, in order.
    pub fn prompt_titles(&self) -> Vec<&str> {
        self.shown
            .iter()
            .filter_map(|shown| match shown {
                Shown::Choice { title, .. } | Shown::Text { title, .. } => Some(title.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<&str> {
        self.shown
            .iter()
            .filter_map(|shown| match shown {
                Shown::Error(message) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    async fn next_response(&mut self) -> Result<Scripted, HostError> {
        loop {
            let Some(entry) = self.script.front_mut() else {
                return Err(HostError::Unavailable("script exhausted".to_string()));
            };
            match entry {
                Entry::WaitUntil(deadline) => {
                    // Left in place until it fires so a dropped call resumes the same wait.
                    let deadline = *deadline;
                    tokio::time::sleep_until(deadline).await;
                    self.script.pop_front();
                }
                Entry::Ready(Scripted::Wait(delay)) => {
                    let deadline = Instant::now() + *delay;
                    *entry = Entry::WaitUntil(deadline);
                }
                Entry::Ready(_) => {
                    if let Some(Entry::Ready(response)) = self.script.pop_front() {
                        return Ok(response);
                    }
                }
            }
        }
    }
}

#[async_trait]
impl Host for ScriptedHost {
    async fn present_choice(&mut self, view: &ChoiceView<'_>) -> Result<ChoiceOutcome, HostError> {
        self.shown.push(Shown::Choice {
            title: view.title.to_string(),
            indicator: view.indicator,
            labels: view.items.iter().map(|item| item.label.clone()).collect(),
            active: view
                .active
                .and_then(|index| view.items.get(index))
                .map(|item| item.label.clone()),
            can_go_back: view.can_go_back,
        });
        match self.next_response().await? {
            Scripted::Choice(outcome) => Ok(outcome),
            Scripted::Fail(message) => Err(HostError::Unavailable(message)),
            other => Err(HostError::Unavailable(format!(
                "expected a choice response, script has {other:?}"
            ))),
        }
    }

    async fn open_text_input(&mut self, view: &TextView<'_>) -> Result<(), HostError> {
        self.shown.push(Shown::Text {
            title: view.title.to_string(),
            indicator: view.indicator,
            value: view.value.to_string(),
            can_go_back: view.can_go_back,
        });
        Ok(())
    }

    async fn next_text_event(&mut self) -> Result<TextEvent, HostError> {
        match self.next_response().await? {
            Scripted::Text(event) => Ok(event),
            Scripted::Fail(message) => Err(HostError::Unavailable(message)),
            other => Err(HostError::Unavailable(format!(
                "expected a text response, script has {other:?}"
            ))),
        }
    }

    async fn show_validation(&mut self, status: TextStatus<'_>) -> Result<(), HostError> {
        self.shown.push(match status {
            TextStatus::Clear => Shown::Cleared,
            TextStatus::Pending => Shown::Pending,
            TextStatus::Error(message) => Shown::Error(message.to_string()),
        });
        Ok(())
    }

    async fn close_text_input(&mut self) -> Result<(), HostError> {
        self.shown.push(Shown::Closed);
        Ok(())
    }
}
