//! GitHub Actions workflow wizard for deploying to an AKS cluster.

use crate::collab::{Reporter, ResourceSource};
use crate::config::WizardConfig;
use crate::core::error::{MissingAnswer, WizardError};
use crate::core::host::Host;
use crate::core::prompt::{InputBox, QuickPick, QuickPickItem, ShouldResume, Validate};
use crate::core::runner::{StepInput, WizardRunner};
use crate::core::step::{Step, StepRef, StepResult, Transition};
use crate::input::validators;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub const NAME: &str = "workflow";
pub const DEFAULT_TITLE: &str = "Generate Github Actions workflow";
pub const RESULT_EVENT: &str = "generateworkflowResult";
pub const STRATEGIES: [&str; 3] = ["Basic", "Canary", "Blue/green"];
pub const WORKFLOW_TYPES: [&str; 2] = ["Kube", "Helm"];

const TOTAL_STEPS: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowAnswers {
    pub resource_group: Option<String>,
    pub cluster: Option<String>,
    pub registry: Option<String>,
    pub image: Option<String>,
    pub strategy: Option<String>,
    pub branch: Option<String>,
    pub manifests: Option<String>,
    pub workflow_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub resource_group: String,
    pub cluster: String,
    pub registry: String,
    pub image: String,
    pub strategy: String,
    pub branch: String,
    pub manifests: String,
    pub workflow_type: String,
}

impl WorkflowAnswers {
    pub fn finalize(self) -> Result<WorkflowConfig, MissingAnswer> {
        Ok(WorkflowConfig {
            resource_group: self
                .resource_group
                .ok_or(MissingAnswer::new("resource_group"))?,
            cluster: self.cluster.ok_or(MissingAnswer::new("cluster"))?,
            registry: self.registry.ok_or(MissingAnswer::new("registry"))?,
            image: self.image.ok_or(MissingAnswer::new("image"))?,
            strategy: self.strategy.ok_or(MissingAnswer::new("strategy"))?,
            branch: self.branch.ok_or(MissingAnswer::new("branch"))?,
            manifests: self.manifests.ok_or(MissingAnswer::new("manifests"))?,
            workflow_type: self
                .workflow_type
                .ok_or(MissingAnswer::new("workflow_type"))?,
        })
    }
}

pub struct WorkflowSettings {
    pub title: String,
    pub workspace: PathBuf,
    pub resources: Arc<dyn ResourceSource>,
    pub validation_delay: Duration,
    pub should_resume: Option<ShouldResume>,
}

impl WorkflowSettings {
    pub fn new(
        config: &WizardConfig,
        workspace: impl Into<PathBuf>,
        resources: Arc<dyn ResourceSource>,
    ) -> Self {
        Self {
            title: config.title_for(NAME, DEFAULT_TITLE).to_string(),
            workspace: workspace.into(),
            resources,
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

    fn input(
        &self,
        step: usize,
        prompt: &str,
        value: Option<&str>,
        validate: Validate,
    ) -> InputBox {
        let input = InputBox::new(&self.title, step, TOTAL_STEPS)
            .with_prompt(prompt)
            .with_value(value.unwrap_or_default())
            .with_validate(validate);
        match &self.should_resume {
            Some(resume) => input.with_should_resume(resume.clone()),
            None => input,
        }
    }
}

fn listing_failed(error: impl std::fmt::Display) -> WizardError {
    WizardError::step(error.to_string())
}

fn picked_group(state: &WorkflowAnswers) -> Result<&str, WizardError> {
    state
        .resource_group
        .as_deref()
        .ok_or_else(|| WizardError::step(MissingAnswer::new("resource_group").to_string()))
}

pub fn first_step(settings: Arc<WorkflowSettings>) -> StepRef<WorkflowAnswers> {
    Arc::new(SelectResourceGroup { settings })
}

macro_rules! workflow_step {
    ($name:ident, $label:literal) => {
        struct $name {
            settings: Arc<WorkflowSettings>,
        }

        impl $name {
            fn then<T: Step<WorkflowAnswers> + 'static>(
                &self,
                make: impl FnOnce(Arc<WorkflowSettings>) -> T,
            ) -> Transition<WorkflowAnswers> {
                Transition::next(make(self.settings.clone()))
            }

            fn label(&self) -> &'static str {
                $label
            }
        }
    };
}

workflow_step!(SelectResourceGroup, "resource_group");
workflow_step!(SelectCluster, "cluster");
workflow_step!(SelectRegistry, "registry");
workflow_step!(InputImageName, "image");
workflow_step!(SelectStrategy, "strategy");
workflow_step!(InputBranch, "branch");
workflow_step!(InputManifests, "manifests");
workflow_step!(SelectWorkflowType, "workflow_type");

#[async_trait]
impl Step<WorkflowAnswers> for SelectResourceGroup {
    async fn run(
        &self,
        input: &mut StepInput<'_>,
        state: &mut WorkflowAnswers,
    ) -> StepResult<WorkflowAnswers> {
        let groups = self
            .settings
            .resources
            .resource_groups()
            .await
            .map_err(listing_failed)?;
        let pick = self.settings.pick(
            1,
            "Select Azure Resource Group",
            QuickPickItem::from_labels(groups),
            state.resource_group.as_deref(),
        );
        state.resource_group = Some(input.show_quick_pick(&pick).await?.label);
        Ok(self.then(|settings| SelectCluster { settings }))
    }

    fn name(&self) -> &str {
        self.label()
    }
}

#[async_trait]
impl Step<WorkflowAnswers> for SelectCluster {
    async fn run(
        &self,
        input: &mut StepInput<'_>,
        state: &mut WorkflowAnswers,
    ) -> StepResult<WorkflowAnswers> {
        let clusters = self
            .settings
            .resources
            .clusters(picked_group(state)?)
            .await
            .map_err(listing_failed)?;
        let pick = self.settings.pick(
            2,
            "Select Azure Kubernetes Service (AKS) cluster",
            QuickPickItem::from_labels(clusters),
            state.cluster.as_deref(),
        );
        state.cluster = Some(input.show_quick_pick(&pick).await?.label);
        Ok(self.then(|settings| SelectRegistry { settings }))
    }

    fn name(&self) -> &str {
        self.label()
    }
}

#[async_trait]
impl Step<WorkflowAnswers> for SelectRegistry {
    async fn run(
        &self,
        input: &mut StepInput<'_>,
        state: &mut WorkflowAnswers,
    ) -> StepResult<WorkflowAnswers> {
        let registries = self
            .settings
            .resources
            .registries(picked_group(state)?)
            .await
            .map_err(listing_failed)?;
        let pick = self.settings.pick(
            3,
            "Select Azure Container Registry",
            QuickPickItem::from_labels(registries),
            state.registry.as_deref(),
        );
        state.registry = Some(input.show_quick_pick(&pick).await?.label);
        Ok(self.then(|settings| InputImageName { settings }))
    }

    fn name(&self) -> &str {
        self.label()
    }
}

#[async_trait]
impl Step<WorkflowAnswers> for InputImageName {
    async fn run(
        &self,
        input: &mut StepInput<'_>,
        state: &mut WorkflowAnswers,
    ) -> StepResult<WorkflowAnswers> {
        let validate =
            validators::delayed(self.settings.validation_delay, validators::image_name());
        let prompt = self
            .settings
            .input(4, "Container image name", state.image.as_deref(), validate);
        state.image = Some(input.show_input_box(&prompt).await?);
        Ok(self.then(|settings| SelectStrategy { settings }))
    }

    fn name(&self) -> &str {
        self.label()
    }
}

#[async_trait]
impl Step<WorkflowAnswers> for SelectStrategy {
    async fn run(
        &self,
        input: &mut StepInput<'_>,
        state: &mut WorkflowAnswers,
    ) -> StepResult<WorkflowAnswers> {
        let pick = self.settings.pick(
            5,
            "Strategy",
            QuickPickItem::from_labels(STRATEGIES),
            state.strategy.as_deref(),
        );
        state.strategy = Some(input.show_quick_pick(&pick).await?.label);
        Ok(self.then(|settings| InputBranch { settings }))
    }

    fn name(&self) -> &str {
        self.label()
    }
}

#[async_trait]
impl Step<WorkflowAnswers> for InputBranch {
    async fn run(
        &self,
        input: &mut StepInput<'_>,
        state: &mut WorkflowAnswers,
    ) -> StepResult<WorkflowAnswers> {
        let validate = validators::delayed(self.settings.validation_delay, validators::branch());
        let prompt = self.settings.input(
            6,
            "GitHub branch (e.g. main)",
            state.branch.as_deref(),
            validate,
        );
        state.branch = Some(input.show_input_box(&prompt).await?);
        Ok(self.then(|settings| InputManifests { settings }))
    }

    fn name(&self) -> &str {
        self.label()
    }
}

#[async_trait]
impl Step<WorkflowAnswers> for InputManifests {
    async fn run(
        &self,
        input: &mut StepInput<'_>,
        state: &mut WorkflowAnswers,
    ) -> StepResult<WorkflowAnswers> {
        let validate =
            validators::existing_dir(&self.settings.workspace, self.settings.validation_delay);
        let prompt = self.settings.input(
            7,
            "Folder with your deployment manifests (e.g. src/manifests)",
            state.manifests.as_deref(),
            validate,
        );
        state.manifests = Some(input.show_input_box(&prompt).await?);
        Ok(self.then(|settings| SelectWorkflowType { settings }))
    }

    fn name(&self) -> &str {
        self.label()
    }
}

#[async_trait]
impl Step<WorkflowAnswers> for SelectWorkflowType {
    async fn run(
        &self,
        input: &mut StepInput<'_>,
        state: &mut WorkflowAnswers,
    ) -> StepResult<WorkflowAnswers> {
        let pick = self.settings.pick(
            8,
            "Workflow type",
            QuickPickItem::from_labels(WORKFLOW_TYPES),
            state.workflow_type.as_deref(),
        );
        state.workflow_type = Some(input.show_quick_pick(&pick).await?.label);
        Ok(Transition::Done)
    }

    fn name(&self) -> &str {
        self.label()
    }
}

pub async fn run<H: Host>(
    runner: &mut WizardRunner<H>,
    settings: Arc<WorkflowSettings>,
    reporter: &dyn Reporter,
) -> Result<WorkflowConfig, WizardError> {
    let seed = WorkflowAnswers::default();
    let outcome = match runner.run(first_step(settings), seed).await {
        Ok(answers) => answers
            .finalize()
            .map_err(|missing| WizardError::step(missing.to_string())),
        Err(error) => Err(error),
    };
    if let Ok(workflow) = &outcome {
        info!(
            cluster = %workflow.cluster,
            strategy = %workflow.strategy,
            workflow_type = %workflow.workflow_type,
            "workflow answers collected"
        );
    }
    super::report_outcome(reporter, RESULT_EVENT, &outcome);
    outcome
}
