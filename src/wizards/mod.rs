pub mod dockerfile;
pub mod flow_file;
pub mod workflow;

use crate::collab::Reporter;
use crate::config::WizardConfig;
use crate::core::error::WizardError;
use crate::core::prompt::{QuickPickItem, ShouldResume, resume_always};

/// Dismissal policy shared by every prompt of a bundled wizard.
pub(crate) fn resume_policy(config: &WizardConfig) -> Option<ShouldResume> {
    config.resume_on_dismiss.then(resume_always)
}

pub(crate) fn items(labels: &[String]) -> Vec<QuickPickItem> {
    QuickPickItem::from_labels(labels.iter().cloned())
}

pub(crate) fn report_outcome<T>(
    reporter: &dyn Reporter,
    event: &str,
    outcome: &Result<T, WizardError>,
) {
    let result = match outcome {
        Ok(_) => "completed".to_string(),
        Err(WizardError::Cancelled) => "cancelled".to_string(),
        Err(error) => error.to_string(),
    };
    reporter.send_event(event, &[(event, result.as_str())]);
}
