use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    /// Pause before an input box validates, so errors do not flash while typing.
    pub validation_delay_ms: u64,
    /// Retry a dismissed prompt instead of ending the wizard.
    pub resume_on_dismiss: bool,
    /// Per-wizard title overrides keyed by wizard name (`create`, `workflow`).
    pub titles: HashMap<String, String>,
    pub languages: Vec<String>,
    pub deployment_types: Vec<String>,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            validation_delay_ms: 1000,
            resume_on_dismiss: false,
            titles: HashMap::new(),
            languages: [
                "clojure",
                "c#",
                "erlang",
                "go",
                "gomodule",
                "java",
                "gradle",
                "javascript",
                "php",
                "python",
                "rust",
                "swift",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            deployment_types: ["helm", "kustomize", "manifests"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl WizardConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `path` when given and present, defaults otherwise.
    pub fn load_optional(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    pub fn validation_delay(&self) -> Duration {
        Duration::from_millis(self.validation_delay_ms)
    }

    pub fn title_for<'a>(&'a self, wizard: &str, default: &'a str) -> &'a str {
        self.titles
            .get(wizard)
            .map(String::as_str)
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::WizardConfig;
    use std::path::Path;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = WizardConfig::from_yaml(
            "validation_delay_ms: 250\ntitles:\n  create: Scaffold\n",
        )
        .expect("parse");
        assert_eq!(config.validation_delay_ms, 250);
        assert_eq!(
            config.title_for("create", "Draft Create Command"),
            "Scaffold"
        );
        assert_eq!(config.title_for("workflow", "Workflow"), "Workflow");
        assert_eq!(
            config.deployment_types,
            vec!["helm", "kustomize", "manifests"]
        );
        assert!(config.languages.contains(&"rust".to_string()));
    }

    #[test]
    fn empty_document_is_default() {
        let config = WizardConfig::from_yaml("").expect("parse");
        assert_eq!(config, WizardConfig::default());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = WizardConfig::load_optional(Some(Path::new("/nonexistent/wizard.yaml")))
            .expect("defaults");
        assert_eq!(config, WizardConfig::default());
    }

    #[test]
    fn load_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("wizard.yaml");
        std::fs::write(&path, "validation_delay_ms: [oops").expect("write");
        let error = WizardConfig::load(&path).expect_err("invalid yaml");
        assert!(error.to_string().contains("wizard.yaml"));
    }
}
