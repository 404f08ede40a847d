use crate::core::error::WizardError;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Async input check: `None` accepts the text, `Some(message)` rejects it.
pub type Validate = Arc<dyn Fn(String) -> BoxFuture<'static, Option<String>> + Send + Sync>;

/// Consulted when a prompt is dismissed: `true` retries the step.
pub type ShouldResume = Arc<dyn Fn() -> BoxFuture<'static, bool> + Send + Sync>;

pub fn validator<F, Fut>(f: F) -> Validate
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<String>> + Send + 'static,
{
    Arc::new(move |value: String| -> BoxFuture<'static, Option<String>> { Box::pin(f(value)) })
}

pub fn should_resume<F, Fut>(f: F) -> ShouldResume
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    Arc::new(move || -> BoxFuture<'static, bool> { Box::pin(f()) })
}

pub fn resume_always() -> ShouldResume {
    should_resume(|| async { true })
}

pub fn resume_never() -> ShouldResume {
    should_resume(|| async { false })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickPickItem {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl QuickPickItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn from_labels<I, T>(labels: I) -> Vec<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        labels.into_iter().map(Self::new).collect()
    }
}

impl From<&str> for QuickPickItem {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepIndicator {
    pub step: usize,
    pub total: usize,
}

impl StepIndicator {
    pub fn new(step: usize, total: usize) -> Self {
        Self { step, total }
    }

    pub fn check(&self) -> Result<(), WizardError> {
        if self.step == 0 || self.step > self.total {
            return Err(WizardError::invalid_prompt(format!(
                "step {} is outside 1..={}",
                self.step, self.total
            )));
        }
        Ok(())
    }
}

impl fmt::Display for StepIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.step, self.total)
    }
}

pub struct QuickPick {
    pub title: String,
    pub indicator: StepIndicator,
    pub placeholder: Option<String>,
    pub items: Vec<QuickPickItem>,
    /// Label of the item to pre-select.
    pub active_item: Option<String>,
    pub should_resume: Option<ShouldResume>,
}

impl QuickPick {
    pub fn new(title: impl Into<String>, step: usize, total_steps: usize) -> Self {
        Self {
            title: title.into(),
            indicator: StepIndicator::new(step, total_steps),
            placeholder: None,
            items: Vec::new(),
            active_item: None,
            should_resume: None,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_items(mut self, items: Vec<QuickPickItem>) -> Self {
        self.items = items;
        self
    }

    pub fn with_active_item(mut self, label: Option<&str>) -> Self {
        self.active_item = label.map(ToOwned::to_owned);
        self
    }

    pub fn with_should_resume(mut self, should_resume: ShouldResume) -> Self {
        self.should_resume = Some(should_resume);
        self
    }

    pub fn check(&self) -> Result<(), WizardError> {
        self.indicator.check()?;
        if self.items.is_empty() {
            return Err(WizardError::invalid_prompt(format!(
                "quick pick `{}` has no items",
                self.title
            )));
        }
        Ok(())
    }

    /// Index of `active_item`, if it names one of the items.
    pub fn active_index(&self) -> Option<usize> {
        let label = self.active_item.as_deref()?;
        self.items.iter().position(|item| item.label == label)
    }
}

pub struct InputBox {
    pub title: String,
    pub indicator: StepIndicator,
    pub prompt: Option<String>,
    pub value: String,
    pub validate: Option<Validate>,
    pub should_resume: Option<ShouldResume>,
}

impl InputBox {
    pub fn new(title: impl Into<String>, step: usize, total_steps: usize) -> Self {
        Self {
            title: title.into(),
            indicator: StepIndicator::new(step, total_steps),
            prompt: None,
            value: String::new(),
            validate: None,
            should_resume: None,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_validate(mut self, validate: Validate) -> Self {
        self.validate = Some(validate);
        self
    }

    pub fn with_should_resume(mut self, should_resume: ShouldResume) -> Self {
        self.should_resume = Some(should_resume);
        self
    }

    pub fn check(&self) -> Result<(), WizardError> {
        self.indicator.check()
    }
}
