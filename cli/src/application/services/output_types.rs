//! Application service: output types registered with the control plane.
//!
//! Module descriptors reference output types as `@namespace/name` in their
//! `inputs` and `outputs`. This service lists and looks them up, and reports
//! which references a descriptor makes to types the platform does not know.

use std::collections::BTreeSet;

use modgenie_common::OutputType;

use crate::application::ports::ControlPlane;
use crate::domain::descriptor::{ModuleDescriptor, split_output_type};
use crate::domain::error::OutputTypeError;

pub struct OutputTypeCatalog<C: ControlPlane> {
    control_plane: C,
}

impl<C: ControlPlane> OutputTypeCatalog<C> {
    pub fn new(control_plane: C) -> Self {
        Self { control_plane }
    }

    /// All registered output types, sorted by full name.
    ///
    /// # Errors
    ///
    /// `ControlPlane` when the list cannot be fetched.
    pub async fn list(&self) -> Result<Vec<OutputType>, OutputTypeError> {
        let mut types = self
            .control_plane
            .list_output_types()
            .await
            .map_err(|e| OutputTypeError::ControlPlane(format!("{e:#}")))?;
        types.sort_by_key(OutputType::full_name);
        tracing::debug!(count = types.len(), "listed output types");
        Ok(types)
    }

    /// Output types exposing a provider from `source` (`hashicorp/aws`).
    ///
    /// # Errors
    ///
    /// `ControlPlane` when the list cannot be fetched.
    pub async fn with_provider(&self, source: &str) -> Result<Vec<OutputType>, OutputTypeError> {
        let mut types = self.list().await?;
        types.retain(|t| t.has_provider(source));
        Ok(types)
    }

    /// Details of one output type.
    ///
    /// # Errors
    ///
    /// `InvalidName` unless `full_name` is `@namespace/name`, `NotFound` when
    /// the control plane does not know it.
    pub async fn details(&self, full_name: &str) -> Result<OutputType, OutputTypeError> {
        let (namespace, name) =
            split_output_type(full_name).ok_or_else(|| OutputTypeError::InvalidName(full_name.to_string()))?;
        self.control_plane
            .get_output_type(namespace, name)
            .await
            .map_err(|e| OutputTypeError::ControlPlane(format!("{e:#}")))?
            .ok_or_else(|| OutputTypeError::NotFound(full_name.to_string()))
    }

    /// Full names of every registered output type.
    ///
    /// # Errors
    ///
    /// `ControlPlane` when the list cannot be fetched.
    pub async fn registered_names(&self) -> Result<BTreeSet<String>, OutputTypeError> {
        Ok(self.list().await?.iter().map(OutputType::full_name).collect())
    }

    /// Types referenced by `descriptor` that are not registered.
    ///
    /// # Errors
    ///
    /// `ControlPlane` when the list cannot be fetched.
    pub async fn missing_for(&self, descriptor: &ModuleDescriptor) -> Result<Vec<String>, OutputTypeError> {
        let registered = self.registered_names().await?;
        Ok(unregistered(descriptor, &registered))
    }
}

/// References in `descriptor` absent from `registered`, in name order.
#[must_use]
pub fn unregistered(descriptor: &ModuleDescriptor, registered: &BTreeSet<String>) -> Vec<String> {
    descriptor
        .referenced_output_types()
        .into_iter()
        .filter(|t| !registered.contains(t))
        .collect()
}
