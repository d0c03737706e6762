//! Loading input documents from disk.
//!
//! A project definition is accepted in the connector's configuration shape
//! (`{"parameters": {"tables": ..., "dimensions": ...}}`) or bare. Both
//! loaders validate against the embedded schema before deserializing.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::{ConfigError, ConfigResult};
use crate::ldm::ProjectModelDocument;
use crate::logs::log_info;
use crate::models::ProjectDefinition;
use crate::validation::{validate_project_definition, validate_project_model};

/// Read, validate and deserialize a project definition file.
pub fn load_project_definition(path: &Path) -> ConfigResult<ProjectDefinition> {
    log_info(format!("Loading project definition from {}", path.display()));
    let content = fs::read_to_string(path)?;
    parse_project_definition(&content)
}

/// Parse a project definition from JSON text.
pub fn parse_project_definition(content: &str) -> ConfigResult<ProjectDefinition> {
    definition_from_value(serde_json::from_str(content)?)
}

/// Read, validate and deserialize a project model document.
pub fn load_project_model(path: &Path) -> ConfigResult<ProjectModelDocument> {
    log_info(format!("Loading project model from {}", path.display()));
    let content = fs::read_to_string(path)?;
    parse_project_model(&content)
}

pub fn parse_project_model(content: &str) -> ConfigResult<ProjectModelDocument> {
    model_from_value(serde_json::from_str(content)?)
}

/// Either kind of input document, told apart by its `projectModel` key.
#[derive(Debug)]
pub enum InputDocument {
    Definition(ProjectDefinition),
    Model(ProjectModelDocument),
}

/// Parse a project definition or a project model, validating it once.
pub fn parse_input(content: &str) -> ConfigResult<InputDocument> {
    let value: Value = serde_json::from_str(content)?;
    if value.get("projectModel").is_some() {
        Ok(InputDocument::Model(model_from_value(value)?))
    } else {
        Ok(InputDocument::Definition(definition_from_value(value)?))
    }
}

fn definition_from_value(mut value: Value) -> ConfigResult<ProjectDefinition> {
    if let Some(parameters) = value.get_mut("parameters") {
        value = parameters.take();
    }
    validate_project_definition(&value).map_err(|errors| ConfigError::Schema { errors })?;
    Ok(serde_json::from_value(value)?)
}

fn model_from_value(value: Value) -> ConfigResult<ProjectModelDocument> {
    validate_project_model(&value).map_err(|errors| ConfigError::Schema { errors })?;
    Ok(serde_json::from_value(value)?)
}
