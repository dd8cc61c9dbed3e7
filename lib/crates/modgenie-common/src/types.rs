use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A project (stack) as listed by the control plane.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Stack {
    pub name: String,
    /// Only projects with this flag set accept previewed (test) modules.
    #[serde(default, alias = "allowPreviewModules")]
    pub preview_modules_allowed: bool,
}

/// Identity of one environment inside a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterRef {
    pub id: String,
    pub name: String,
}

/// One row of `clusters-overview`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOverview {
    pub cluster: ClusterRef,
    #[serde(default)]
    pub cluster_state: String,
}

impl ClusterOverview {
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.cluster_state == CLUSTER_RUNNING
    }
}

pub const CLUSTER_RUNNING: &str = "RUNNING";

/// Module binding details attached to a resource in an environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ResourceDetails {
    #[serde(default)]
    pub flavour: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub disabled: bool,
}

/// A resource declared in an environment, as returned by `resources-info`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfo {
    pub resource_name: String,
    pub resource_type: String,
    #[serde(default)]
    pub info: Option<ResourceDetails>,
}

impl ResourceInfo {
    /// True when this resource is an enabled instance of the given module.
    #[must_use]
    pub fn matches_module(&self, intent: &str, flavor: &str, version: &str) -> bool {
        self.resource_type == intent
            && self
                .info
                .as_ref()
                .is_some_and(|i| i.flavour == flavor && i.version == version && !i.disabled)
    }
}

/// Resource reference inside a hotfix recipe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FacetsResource {
    pub resource_name: String,
    pub resource_type: String,
}

/// Body of the hotfix deployment request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct HotfixRecipe {
    pub resource_list: Vec<FacetsResource>,
}

/// Deployment as reported by the control plane.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentDto {
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub triggered_by: Option<String>,
}

/// A single line of deployment output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEvent {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// Response of the deployment logs endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentLogs {
    #[serde(default)]
    pub log_event_list: Vec<LogEvent>,
}

impl DeploymentLogs {
    /// Message lines in arrival order; events without a message are dropped.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.log_event_list
            .iter()
            .filter_map(|e| e.message.clone())
            .collect()
    }
}

/// Namespace assumed when the control plane omits one.
pub const DEFAULT_OUTPUT_NAMESPACE: &str = "@outputs";

/// Provider configuration an output type can hand to consuming modules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputTypeProvider {
    pub name: String,
    pub source: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// An output type registered with the control plane (`@namespace/name`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OutputType {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub providers: Vec<OutputTypeProvider>,
}

impl OutputType {
    /// `@namespace/name`, as referenced from a module descriptor.
    #[must_use]
    pub fn full_name(&self) -> String {
        let namespace = self
            .namespace
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_OUTPUT_NAMESPACE);
        format!("{namespace}/{}", self.name)
    }

    /// True when one of the providers comes from `source` (`hashicorp/aws`).
    #[must_use]
    pub fn has_provider(&self, source: &str) -> bool {
        self.providers.iter().any(|p| p.source.eq_ignore_ascii_case(source))
    }
}
