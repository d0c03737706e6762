//! Transformation module.
//!
//! This module handles both directions between project definitions and
//! platform project models:
//! - Builder: project definition to project model
//! - Reader: project model back to a project definition
//! - Grain: composite keys in both directions

pub mod builder;
pub mod grain;
pub mod reader;

pub use builder::{
    build_project_model, dimension_identifier, resolve_table, time_dimension_identifier,
    ResolvedTable,
};
pub use grain::{grain_from_wire, grain_to_wire, GrainIndex};
pub use reader::{read_project_model, read_project_model_with, ReadOptions, ReadOutcome};

use crate::logs::log_warning;

/// Log a non-fatal read-back problem and keep it for the caller.
pub(crate) fn warn(warnings: &mut Vec<String>, message: String) {
    log_warning(message.clone());
    warnings.push(message);
}
