//! Module descriptor (`facets.yaml`) types and validators.
//!
//! Pure functions only, no I/O, no async, no filesystem access.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use thiserror::Error;

// ── Constants ────────────────────────────────────────────────────────────────

/// File name of a module descriptor.
pub const DESCRIPTOR_FILE: &str = "facets.yaml";

/// Top-level keys a descriptor must carry to be written.
pub const REQUIRED_KEYS: &[&str] = &["intent", "flavor", "version", "clouds", "spec"];

// ── Schema ───────────────────────────────────────────────────────────────────

/// Parsed module manifest.
///
/// Unknown top-level keys land in `extra` untouched so newer schema revisions
/// survive a parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleDescriptor {
    pub intent: String,
    pub flavor: String,
    #[serde(deserialize_with = "scalar_string")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub clouds: Vec<String>,
    /// Developer-facing input schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<Value>,
    #[serde(default)]
    pub inputs: BTreeMap<String, InputRef>,
    #[serde(default)]
    pub outputs: BTreeMap<String, OutputContract>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iac: Option<IacBlock>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Dependency on another module's published output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InputRef {
    #[serde(rename = "type")]
    pub output_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub optional: bool,
    /// Provider configurations requested from the upstream output.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Contract published by this module.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputContract {
    #[serde(rename = "type")]
    pub output_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Provider configuration derived from output attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub providers: BTreeMap<String, ProviderExport>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderExport {
    pub source: String,
    #[serde(deserialize_with = "scalar_string")]
    pub version: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

/// Which infrastructure files the external validator must check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct IacBlock {
    #[serde(default)]
    pub validated_files: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Identity of a module version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ModuleRef {
    pub intent: String,
    pub flavor: String,
    pub version: String,
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.intent, self.flavor, self.version)
    }
}

impl ModuleDescriptor {
    #[must_use]
    pub fn module_ref(&self) -> ModuleRef {
        ModuleRef {
            intent: self.intent.clone(),
            flavor: self.flavor.clone(),
            version: self.version.clone(),
        }
    }

    /// Every `@namespace/name` type named by `inputs` and `outputs`.
    #[must_use]
    pub fn referenced_output_types(&self) -> BTreeSet<String> {
        self.inputs
            .values()
            .map(|i| i.output_type.clone())
            .chain(self.outputs.values().map(|o| o.output_type.clone()))
            .collect()
    }
}

/// Split `@namespace/name` into `("@namespace", "name")`.
#[must_use]
pub fn split_output_type(t: &str) -> Option<(&str, &str)> {
    let (namespace, name) = t.split_once('/')?;
    (namespace.len() > 1 && namespace.starts_with('@') && !name.is_empty() && !name.contains('/'))
        .then_some((namespace, name))
}

/// Accept `version: 1.0` as well as `version: "1.0"`.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a scalar, found {}",
            kind(&other)
        ))),
    }
}

// ── Parsing ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("not valid YAML: {0}")]
    Syntax(String),

    #[error("{}", .0.join("\n"))]
    Shape(Vec<String>),
}

/// Parse a descriptor for discovery. Only the identity fields are mandatory.
///
/// # Errors
///
/// Returns `Syntax` when the text is not YAML or does not fit the schema.
pub fn parse(text: &str) -> Result<ModuleDescriptor, DescriptorError> {
    serde_yaml::from_str(text).map_err(|e| DescriptorError::Syntax(e.to_string()))
}

/// Parse a descriptor and check the full required top-level shape.
///
/// All shape problems are reported together.
///
/// # Errors
///
/// Returns `Syntax` for unparseable text and `Shape` listing every problem.
pub fn validate(text: &str) -> Result<ModuleDescriptor, DescriptorError> {
    let value: Value =
        serde_yaml::from_str(text).map_err(|e| DescriptorError::Syntax(e.to_string()))?;
    let problems = shape_problems(&value);
    if !problems.is_empty() {
        return Err(DescriptorError::Shape(problems));
    }
    serde_yaml::from_value(value).map_err(|e| DescriptorError::Syntax(e.to_string()))
}

fn shape_problems(value: &Value) -> Vec<String> {
    let Value::Mapping(root) = value else {
        return vec![format!("top level must be a mapping, found {}", kind(value))];
    };
    let mut problems = Vec::new();

    for key in REQUIRED_KEYS {
        if !root.contains_key(*key) {
            problems.push(format!("missing required key '{key}'"));
        }
    }
    for key in ["intent", "flavor"] {
        if let Some(v) = root.get(key) {
            match v {
                Value::String(s) if !s.trim().is_empty() => {}
                Value::String(_) => problems.push(format!("'{key}' must not be empty")),
                other => problems.push(format!("'{key}' must be a string, found {}", kind(other))),
            }
        }
    }
    if let Some(v) = root.get("version")
        && !matches!(v, Value::String(_) | Value::Number(_))
    {
        problems.push(format!("'version' must be a string or number, found {}", kind(v)));
    }
    if let Some(v) = root.get("clouds") {
        match v {
            Value::Sequence(items) if items.iter().all(|i| matches!(i, Value::String(_))) => {}
            Value::Sequence(_) => problems.push("'clouds' entries must be strings".to_string()),
            other => problems.push(format!("'clouds' must be a list, found {}", kind(other))),
        }
    }
    if let Some(v) = root.get("spec")
        && !matches!(v, Value::Mapping(_))
    {
        problems.push(format!("'spec' must be a mapping, found {}", kind(v)));
    }
    for section in ["inputs", "outputs"] {
        if let Some(v) = root.get(section) {
            problems.extend(typed_section_problems(section, v));
        }
    }
    if let Some(v) = root.get("iac") {
        match v {
            Value::Mapping(iac) => {
                if let Some(files) = iac.get("validated_files")
                    && !matches!(files, Value::Sequence(_))
                {
                    problems.push("'iac.validated_files' must be a list".to_string());
                }
            }
            other => problems.push(format!("'iac' must be a mapping, found {}", kind(other))),
        }
    }
    problems
}

/// `inputs` and `outputs` entries must name an `@namespace/name` type.
fn typed_section_problems(section: &str, value: &Value) -> Vec<String> {
    let Value::Mapping(entries) = value else {
        if value.is_null() {
            return Vec::new();
        }
        return vec![format!("'{section}' must be a mapping, found {}", kind(value))];
    };
    let mut problems = Vec::new();
    for (name, entry) in entries {
        let name = name.as_str().unwrap_or("?");
        match entry.get("type") {
            Some(Value::String(t)) if is_output_type(t) => {}
            Some(Value::String(t)) => problems.push(format!(
                "'{section}.{name}.type' must look like @namespace/name, got '{t}'"
            )),
            Some(_) => problems.push(format!("'{section}.{name}.type' must be a string")),
            None => problems.push(format!("'{section}.{name}' is missing 'type'")),
        }
    }
    problems
}

fn is_output_type(t: &str) -> bool {
    split_output_type(t).is_some()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
