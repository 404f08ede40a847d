//! Wizards declared in YAML and answered into an [`Answers`] record.
//!
//! ```yaml
//! title: Scaffold service
//! steps:
//!   - kind: pick
//!     key: language
//!     placeholder: Pick a language
//!     items: [go, rust]
//!   - kind: input
//!     key: port
//!     prompt: Port Number
//!     default: "8080"
//!     validate: port
//! ```

use crate::config::WizardConfig;
use crate::core::answers::Answers;
use crate::core::error::WizardError;
use crate::core::host::Host;
use crate::core::prompt::{InputBox, QuickPick, QuickPickItem, ShouldResume};
use crate::core::runner::{StepInput, WizardRunner};
use crate::core::step::{Step, StepResult, Transition};
use crate::input::validators::{self, Check};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum FlowFileError {
    #[error("failed to read flow {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse flow: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("flow has no steps")]
    Empty,
    #[error("step `{key}` has no items")]
    NoItems { key: String },
    #[error("step key `{key}` is used twice")]
    DuplicateKey { key: String },
    #[error("step `{key}` has an invalid pattern: {source}")]
    Pattern { key: String, source: regex::Error },
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlowFile {
    pub title: String,
    pub steps: Vec<FlowStep>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FlowStep {
    Pick {
        key: String,
        #[serde(default)]
        placeholder: Option<String>,
        items: Vec<String>,
    },
    Input {
        key: String,
        #[serde(default)]
        prompt: Option<String>,
        #[serde(default)]
        default: Option<String>,
        #[serde(default)]
        validate: Option<NamedCheck>,
        #[serde(default)]
        pattern: Option<String>,
    },
}

impl FlowStep {
    pub fn key(&self) -> &str {
        match self {
            Self::Pick { key, .. } | Self::Input { key, .. } => key,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedCheck {
    Required,
    Port,
    ApplicationName,
    ImageName,
    Branch,
}

impl NamedCheck {
    fn check(self) -> Check {
        match self {
            Self::Required => validators::required(),
            Self::Port => validators::port(),
            Self::ApplicationName => validators::application_name(),
            Self::ImageName => validators::image_name(),
            Self::Branch => validators::branch(),
        }
    }
}

/// A checked flow, ready to run.
pub struct FlowPlan {
    title: String,
    steps: Vec<FlowStep>,
    checks: Vec<Option<Check>>,
    validation_delay: Duration,
    should_resume: Option<ShouldResume>,
}

impl FlowPlan {
    pub fn load(path: &Path, config: &WizardConfig) -> Result<Self, FlowFileError> {
        let raw = std::fs::read_to_string(path).map_err(|source| FlowFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw, config)
    }

    pub fn from_yaml(raw: &str, config: &WizardConfig) -> Result<Self, FlowFileError> {
        let file: FlowFile = serde_yaml::from_str(raw)?;
        Self::new(file, config)
    }

    pub fn new(file: FlowFile, config: &WizardConfig) -> Result<Self, FlowFileError> {
        if file.steps.is_empty() {
            return Err(FlowFileError::Empty);
        }

        let mut seen = HashSet::new();
        let mut checks = Vec::with_capacity(file.steps.len());
        for step in &file.steps {
            if !seen.insert(step.key().to_string()) {
                return Err(FlowFileError::DuplicateKey {
                    key: step.key().to_string(),
                });
            }
            checks.push(compile_checks(step)?);
        }

        Ok(Self {
            title: file.title,
            steps: file.steps,
            checks,
            validation_delay: config.validation_delay(),
            should_resume: super::resume_policy(config),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

fn compile_checks(step: &FlowStep) -> Result<Option<Check>, FlowFileError> {
    match step {
        FlowStep::Pick { key, items, .. } => {
            if items.is_empty() {
                return Err(FlowFileError::NoItems { key: key.clone() });
            }
            Ok(None)
        }
        FlowStep::Input {
            key,
            validate,
            pattern,
            ..
        } => {
            let mut checks: Vec<Check> = validate.iter().map(|named| named.check()).collect();
            if let Some(pattern) = pattern {
                let check = validators::regex(pattern).map_err(|source| FlowFileError::Pattern {
                    key: key.clone(),
                    source,
                })?;
                checks.push(check);
            }
            Ok(match checks.len() {
                0 => None,
                1 => checks.pop(),
                _ => Some(validators::all(checks)),
            })
        }
    }
}

struct DeclaredStep {
    plan: Arc<FlowPlan>,
    index: usize,
}

#[async_trait]
impl Step<Answers> for DeclaredStep {
    async fn run(&self, input: &mut StepInput<'_>, state: &mut Answers) -> StepResult<Answers> {
        let plan = &self.plan;
        let (step, total) = (self.index + 1, plan.steps.len());

        match &plan.steps[self.index] {
            FlowStep::Pick {
                key,
                placeholder,
                items,
            } => {
                let mut pick = QuickPick::new(&plan.title, step, total)
                    .with_items(QuickPickItem::from_labels(items.iter().cloned()))
                    .with_active_item(state.get(key));
                if let Some(placeholder) = placeholder {
                    pick = pick.with_placeholder(placeholder);
                }
                if let Some(resume) = &plan.should_resume {
                    pick = pick.with_should_resume(resume.clone());
                }
                let item = input.show_quick_pick(&pick).await?;
                state.set(key, item.label);
            }
            FlowStep::Input {
                key,
                prompt,
                default,
                ..
            } => {
                let value = state.get(key).or(default.as_deref()).unwrap_or_default();
                let mut text = InputBox::new(&plan.title, step, total).with_value(value);
                if let Some(prompt) = prompt {
                    text = text.with_prompt(prompt);
                }
                if let Some(check) = &plan.checks[self.index] {
                    let validate = validators::delayed(plan.validation_delay, check.clone());
                    text = text.with_validate(validate);
                }
                if let Some(resume) = &plan.should_resume {
                    text = text.with_should_resume(resume.clone());
                }
                let value = input.show_input_box(&text).await?;
                state.set(key, value);
            }
        }

        if self.index + 1 < plan.steps.len() {
            Ok(Transition::next(DeclaredStep {
                plan: plan.clone(),
                index: self.index + 1,
            }))
        } else {
            Ok(Transition::Done)
        }
    }

    fn name(&self) -> &str {
        self.plan.steps[self.index].key()
    }
}

pub async fn run<H: Host>(
    runner: &mut WizardRunner<H>,
    plan: FlowPlan,
) -> Result<Answers, WizardError> {
    let first = DeclaredStep {
        plan: Arc::new(plan),
        index: 0,
    };
    runner.run(Arc::new(first), Answers::new()).await
}
