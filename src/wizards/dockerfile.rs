//! "Draft Create" wizard: collects what is needed to scaffold a Dockerfile
//! and deployment files.
//!
//! Flow: output type → language → port → application name → deployment type.

use crate::collab::{ContextKey, ContextStore, Reporter};
use crate::config::WizardConfig;
use crate::core::error::{MissingAnswer, WizardError};
use crate::core::host::Host;
use crate::core::prompt::{InputBox, QuickPick, QuickPickItem, ShouldResume};
use crate::core::runner::{StepInput, WizardRunner};
use crate::core::step::{Step, StepRef, StepResult, Transition};
use crate::input::validators::{self, Check};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const NAME: &str = "create";
pub const DEFAULT_TITLE: &str = "Draft Create Command";
pub const RESULT_EVENT: &str = "createDraftResult";
pub const OUTPUT_TYPES: [&str; 3] = ["dockerfile-deployment", "dockerfile", "deployment"];

const TOTAL_STEPS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftCreateAnswers {
    pub output: Option<String>,
    pub language: Option<String>,
    pub port: Option<String>,
    pub app_name: Option<String>,
    pub deployment_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftCreateConfig {
    pub output: String,
    pub language: String,
    pub port: String,
    pub app_name: String,
    pub deployment_type: String,
}

impl DraftCreateAnswers {
    pub fn finalize(self) -> Result<DraftCreateConfig, MissingAnswer> {
        Ok(DraftCreateConfig {
            output: self.output.ok_or(MissingAnswer::new("output"))?,
            language: self.language.ok_or(MissingAnswer::new("language"))?,
            port: self.port.ok_or(MissingAnswer::new("port"))?,
            app_name: self.app_name.ok_or(MissingAnswer::new("app_name"))?,
            deployment_type: self
                .deployment_type
                .ok_or(MissingAnswer::new("deployment_type"))?,
        })
    }
}

pub struct CreateSettings {
    pub title: String,
    pub languages: Vec<QuickPickItem>,
    pub deployment_types: Vec<QuickPickItem>,
    pub validation_delay: Duration,
    pub should_resume: Option<ShouldResume>,
}

impl CreateSettings {
    pub fn from_config(config: &WizardConfig) -> Self {
        Self {
            title: config.title_for(NAME, DEFAULT_TITLE).to_string(),
            languages: super::items(&config.languages),
            deployment_types: super::items(&config.deployment_types),
            validation_delay: config.validation_delay(),
            should_resume: super::resume_policy(config),
        }
    }

    fn pick(
        &self,
        step: usize,
        placeholder: &str,
        items: Vec<QuickPickItem>,
        active: Option<&str>,
    ) -> QuickPick {
        let pick = QuickPick::new(&self.title, step, TOTAL_STEPS)
            .with_placeholder(placeholder)
            .with_items(items)
            .with_active_item(active);
        match &self.should_resume {
            Some(resume) => pick.with_should_resume(resume.clone()),
            None => pick,
        }
    }

    fn input(&self, step: usize, prompt: &str, value: Option<&str>, check: Check) -> InputBox {
        let input = InputBox::new(&self.title, step, TOTAL_STEPS)
            .with_prompt(prompt)
            .with_value(value.unwrap_or_default())
            .with_validate(validators::delayed(self.validation_delay, check));
        match &self.should_resume {
            Some(resume) => input.with_should_resume(resume.clone()),
            None => input,
        }
    }
}

pub fn first_step(settings: Arc<CreateSettings>) -> StepRef<DraftCreateAnswers> {
    Arc::new(PickOutput { settings })
}

struct PickOutput {
    settings: Arc<CreateSettings>,
}

#[async_trait]
impl Step<DraftCreateAnswers> for PickOutput {
    async fn run(
        &self,
        input: &mut StepInput<'_>,
        state: &mut DraftCreateAnswers,
    ) -> StepResult<DraftCreateAnswers> {
        let pick = self.settings.pick(
            1,
            "Pick a File Creation Type",
            QuickPickItem::from_labels(OUTPUT_TYPES),
            state.output.as_deref(),
        );
        state.output = Some(input.show_quick_pick(&pick).await?.label);
        Ok(Transition::next(PickLanguage {
            settings: self.settings.clone(),
        }))
    }

    fn name(&self) -> &str {
        "output"
    }
}

struct PickLanguage {
    settings: Arc<CreateSettings>,
}

#[async_trait]
impl Step<DraftCreateAnswers> for PickLanguage {
    async fn run(
        &self,
        input: &mut StepInput<'_>,
        state: &mut DraftCreateAnswers,
    ) -> StepResult<DraftCreateAnswers> {
        let pick = self.settings.pick(
            2,
            "Pick a language",
            self.settings.languages.clone(),
            state.language.as_deref(),
        );
        state.language = Some(input.show_quick_pick(&pick).await?.label);
        Ok(Transition::next(EnterPort {
            settings: self.settings.clone(),
        }))
    }

    fn name(&self) -> &str {
        "language"
    }
}

struct EnterPort {
    settings: Arc<CreateSettings>,
}

#[async_trait]
impl Step<DraftCreateAnswers> for EnterPort {
    async fn run(
        &self,
        input: &mut StepInput<'_>,
        state: &mut DraftCreateAnswers,
    ) -> StepResult<DraftCreateAnswers> {
        let prompt = self
            .settings
            .input(3, "Port Number", state.port.as_deref(), validators::port());
        state.port = Some(input.show_input_box(&prompt).await?.trim().to_string());
        Ok(Transition::next(EnterAppName {
            settings: self.settings.clone(),
        }))
    }

    fn name(&self) -> &str {
        "port"
    }
}

struct EnterAppName {
    settings: Arc<CreateSettings>,
}

#[async_trait]
impl Step<DraftCreateAnswers> for EnterAppName {
    async fn run(
        &self,
        input: &mut StepInput<'_>,
        state: &mut DraftCreateAnswers,
    ) -> StepResult<DraftCreateAnswers> {
        let prompt = self.settings.input(
            4,
            "Application Name",
            state.app_name.as_deref(),
            validators::application_name(),
        );
        state.app_name = Some(input.show_input_box(&prompt).await?);
        Ok(Transition::next(PickDeploymentType {
            settings: self.settings.clone(),
        }))
    }

    fn name(&self) -> &str {
        "app_name"
    }
}

struct PickDeploymentType {
    settings: Arc<CreateSettings>,
}

#[async_trait]
impl Step<DraftCreateAnswers> for PickDeploymentType {
    async fn run(
        &self,
        input: &mut StepInput<'_>,
        state: &mut DraftCreateAnswers,
    ) -> StepResult<DraftCreateAnswers> {
        let pick = self.settings.pick(
            5,
            "Pick a deployment type",
            self.settings.deployment_types.clone(),
            state.deployment_type.as_deref(),
        );
        state.deployment_type = Some(input.show_quick_pick(&pick).await?.label);
        Ok(Transition::Done)
    }

    fn name(&self) -> &str {
        "deployment_type"
    }
}

/// Runs the wizard, pre-filling the port remembered for this workspace and
/// storing the new answers once the run completes.
pub async fn run<H: Host>(
    runner: &mut WizardRunner<H>,
    config: &WizardConfig,
    context: &dyn ContextStore,
    reporter: &dyn Reporter,
) -> Result<DraftCreateConfig, WizardError> {
    let settings = Arc::new(CreateSettings::from_config(config));
    let seed = DraftCreateAnswers {
        port: context.get(ContextKey::Port),
        deployment_type: context.get(ContextKey::DeploymentType),
        ..DraftCreateAnswers::default()
    };

    let outcome = match runner.run(first_step(settings), seed).await {
        Ok(answers) => answers
            .finalize()
            .map_err(|missing| WizardError::step(missing.to_string())),
        Err(error) => Err(error),
    };

    if let Ok(created) = &outcome {
        info!(
            language = %created.language,
            output = %created.output,
            "draft create answers collected"
        );
        for (key, value) in [
            (ContextKey::Port, created.port.as_str()),
            (ContextKey::DeploymentType, created.deployment_type.as_str()),
        ] {
            if let Err(error) = context.set(key, value) {
                warn!(?key, %error, "failed to remember answer");
            }
        }
    }
    super::report_outcome(reporter, RESULT_EVENT, &outcome);
    outcome
}
