//! Collaborators the bundled wizards talk to. Only the seams live here; the
//! implementations are static or local stand-ins.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum CollabError {
    #[error("resource listing failed: {0}")]
    Listing(String),
    #[error("{0} lock poisoned")]
    Poisoned(&'static str),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Ordered, labeled cloud resources a wizard can offer as choices.
#[async_trait]
pub trait ResourceSource: Send + Sync {
    async fn resource_groups(&self) -> Result<Vec<String>, CollabError>;

    async fn clusters(&self, resource_group: &str) -> Result<Vec<String>, CollabError>;

    async fn registries(&self, resource_group: &str) -> Result<Vec<String>, CollabError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticResources {
    pub resource_groups: Vec<String>,
    pub clusters: Vec<String>,
    pub registries: Vec<String>,
}

impl StaticResources {
    pub fn sample() -> Self {
        let labels = |prefix: &str| (1..=3).map(|n| format!("{prefix}{n}")).collect();
        Self {
            resource_groups: labels("resourceGroup"),
            clusters: labels("cluster"),
            registries: labels("registry"),
        }
    }
}

#[async_trait]
impl ResourceSource for StaticResources {
    async fn resource_groups(&self) -> Result<Vec<String>, CollabError> {
        Ok(self.resource_groups.clone())
    }

    async fn clusters(&self, _resource_group: &str) -> Result<Vec<String>, CollabError> {
        Ok(self.clusters.clone())
    }

    async fn registries(&self, _resource_group: &str) -> Result<Vec<String>, CollabError> {
        Ok(self.registries.clone())
    }
}

pub trait Reporter: Send + Sync {
    fn send_event(&self, name: &str, properties: &[(&str, &str)]);
}

/// Emits telemetry events as `tracing` records.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn send_event(&self, name: &str, properties: &[(&str, &str)]) {
        let properties: Vec<String> = properties.iter().map(|(k, v)| format!("{k}={v}")).collect();
        info!(event = name, properties = %properties.join(","), "telemetry");
    }
}

/// Records events in memory; handy for asserting what a wizard reported.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl Reporter for RecordingReporter {
    fn send_event(&self, name: &str, properties: &[(&str, &str)]) {
        if let Ok(mut events) = self.events.lock() {
            events.push((
                name.to_string(),
                properties
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContextKey {
    Port,
    Image,
    Subscription,
    AcrResourceGroup,
    AcrName,
    AcrRepo,
    AcrTag,
    Dockerfile,
    DeploymentType,
    ManifestPath,
    ChartPath,
}

/// Workspace memory shared between wizard runs.
pub trait ContextStore: Send + Sync {
    fn get(&self, key: ContextKey) -> Option<String>;

    fn set(&self, key: ContextKey, value: &str) -> Result<(), CollabError>;
}

/// [`ContextStore`] persisted as a JSON object on disk.
#[derive(Debug)]
pub struct JsonContextStore {
    path: PathBuf,
    values: Mutex<IndexMap<ContextKey, String>>,
}

impl JsonContextStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CollabError> {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => IndexMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ContextStore for JsonContextStore {
    fn get(&self, key: ContextKey) -> Option<String> {
        self.values
            .lock()
            .ok()
            .and_then(|values| values.get(&key).cloned())
    }

    fn set(&self, key: ContextKey, value: &str) -> Result<(), CollabError> {
        let raw = {
            let mut values = self
                .values
                .lock()
                .map_err(|_| CollabError::Poisoned("context store"))?;
            values.insert(key, value.to_string());
            serde_json::to_string_pretty(&*values)?
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

/// In-memory [`ContextStore`].
#[derive(Debug, Default)]
pub struct MemoryContextStore {
    values: Mutex<IndexMap<ContextKey, String>>,
}

impl ContextStore for MemoryContextStore {
    fn get(&self, key: ContextKey) -> Option<String> {
        self.values
            .lock()
            .ok()
            .and_then(|values| values.get(&key).cloned())
    }

    fn set(&self, key: ContextKey, value: &str) -> Result<(), CollabError> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| CollabError::Poisoned("context store"))?;
        values.insert(key, value.to_string());
        Ok(())
    }
}
