//! Infrastructure implementation of the `ControlPlane` port over HTTPS.

use std::time::Duration;

use anyhow::{Context, Result};
use modgenie_common::{
    ClusterOverview, ControlPlaneSettings, DeploymentDto, DeploymentLogs, HotfixRecipe,
    OutputType, ResourceInfo, Stack,
};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::application::ports::ControlPlane;

/// Environment prefix for control-plane settings.
pub const ENV_PREFIX: &str = "FACETS_";

const API_PREFIX: &[&str] = &["cc-ui", "v1"];

/// `reqwest` client for the control-plane REST API, authenticated with
/// HTTP basic auth (username + token).
pub struct HttpControlPlane {
    client: reqwest::Client,
    settings: ControlPlaneSettings,
}

impl HttpControlPlane {
    /// Build a client from already-normalized settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(settings: ControlPlaneSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout))
            .timeout(Duration::from_secs(settings.read_timeout))
            .user_agent(concat!("modgenie/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client, settings })
    }

    /// Load `FACETS_*` settings from the environment and build a client.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or blank.
    pub fn from_env() -> Result<Self> {
        let settings: ControlPlaneSettings = envy::prefixed(ENV_PREFIX).from_env().context(
            "failed to load control plane settings from FACETS_* env vars \
             (FACETS_CONTROL_PLANE_URL, FACETS_USERNAME and FACETS_TOKEN are required)",
        )?;
        let settings = settings.normalized()?;
        tracing::debug!(url = %settings.control_plane_url, user = %settings.username, "control plane configured");
        Self::new(settings)
    }

    /// API URL for `segments`. Each segment is percent-encoded on its own, so
    /// a name containing `/`, `?` or `#` stays inside its path segment.
    /// `.` and `..` are refused since they would drop out of the path.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        if let Some(dots) = segments.iter().find(|s| matches!(**s, "." | "..")) {
            anyhow::bail!("'{dots}' is not a valid name in a control plane request");
        }
        let mut url = Url::parse(&self.settings.control_plane_url)
            .with_context(|| format!("invalid control plane URL '{}'", self.settings.control_plane_url))?;
        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("control plane URL '{}' cannot carry a path", self.settings.control_plane_url))?
            .pop_if_empty()
            .extend(API_PREFIX)
            .extend(segments);
        Ok(url)
    }

    /// GET `segments` as JSON; `Ok(None)` on 404.
    async fn get_optional<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<Option<T>> {
        let url = self.url(segments)?;
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(url.clone())
            .basic_auth(&self.settings.username, Some(&self.settings.token))
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response
            .error_for_status()
            .with_context(|| format!("GET {url}"))?;
        let body = response
            .json::<T>()
            .await
            .with_context(|| format!("decoding response from {url}"))?;
        Ok(Some(body))
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        match self.get_optional(segments).await? {
            Some(body) => Ok(body),
            None => anyhow::bail!("GET {}: not found", self.url(segments)?),
        }
    }
}

impl ControlPlane for HttpControlPlane {
    async fn list_stacks(&self) -> Result<Vec<Stack>> {
        self.get(&["stacks", ""]).await
    }

    async fn get_stack(&self, name: &str) -> Result<Option<Stack>> {
        self.get_optional(&["stacks", name]).await
    }

    async fn clusters_overview(&self, stack: &str) -> Result<Vec<ClusterOverview>> {
        self.get(&["stacks", stack, "clusters-overview"]).await
    }

    async fn cluster_resources(&self, cluster_id: &str) -> Result<Vec<ResourceInfo>> {
        self.get(&["dropdown", "cluster", cluster_id, "resources-info"])
            .await
    }

    async fn trigger_hotfix(&self, cluster_id: &str, recipe: &HotfixRecipe) -> Result<DeploymentDto> {
        let url = self.url(&["clusters", cluster_id, "deployments", "hotfix"])?;
        tracing::debug!(%url, resources = recipe.resource_list.len(), "POST hotfix");
        self.client
            .post(url.clone())
            .basic_auth(&self.settings.username, Some(&self.settings.token))
            .query(&[
                ("allowDestroy", "false"),
                ("forceRelease", "true"),
                ("isPlan", "false"),
            ])
            .json(recipe)
            .send()
            .await
            .with_context(|| format!("POST {url}"))?
            .error_for_status()
            .with_context(|| format!("POST {url}"))?
            .json::<DeploymentDto>()
            .await
            .with_context(|| format!("decoding response from {url}"))
    }

    async fn get_deployment(&self, cluster_id: &str, deployment_id: &str) -> Result<Option<DeploymentDto>> {
        self.get_optional(&["clusters", cluster_id, "deployments", deployment_id])
            .await
    }

    async fn deployment_logs(&self, cluster_id: &str, deployment_id: &str) -> Result<Option<DeploymentLogs>> {
        self.get_optional(&["clusters", cluster_id, "deployments", deployment_id, "logs"])
            .await
    }

    async fn list_output_types(&self) -> Result<Vec<OutputType>> {
        self.get(&["tf-outputs"]).await
    }

    async fn get_output_type(&self, namespace: &str, name: &str) -> Result<Option<OutputType>> {
        self.get_optional(&["tf-outputs", namespace, name]).await
    }
}
