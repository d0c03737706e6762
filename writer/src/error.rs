//! Error types for the GoodData writer model translation.
//!
//! This module defines one error type per concern:
//!
//! - [`ModelError`] - Configuration errors raised while building the LDM
//! - [`ReadError`] - Terminal errors while reading an LDM back into configuration
//! - [`LookupError`] - Date dimension template lookup failures
//! - [`ConfigError`] - Loading and validating input files
//! - [`WriterError`] - Top-level errors used by the CLI
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Model Build Errors
// =============================================================================

/// Configuration errors found while building the project model.
///
/// All of these abort the build; no partial model is ever returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// DATE column pointing at a dimension that is not defined.
    #[error("Date column '{column}' of dataset {table} does not have a valid date dimension assigned")]
    InvalidDateDimension { column: String, table: String },

    /// REFERENCE column pointing at a table that is not defined.
    #[error("Schema reference of column '{column}' of dataset {table} is invalid")]
    InvalidSchemaReference { column: String, table: String },

    /// Referenced table has no connection point to link to.
    #[error("Dataset '{table}' referenced from {referenced_from} is missing a connection point")]
    MissingConnectionPoint { table: String, referenced_from: String },

    /// LABEL or HYPERLINK column whose reference is not an attribute of the table.
    #[error("Label column '{column}' of dataset {table} references '{reference}' which is not an attribute or connection point")]
    InvalidLabelReference {
        column: String,
        table: String,
        reference: String,
    },

    /// Sort label that does not name a label of the attribute.
    #[error("Sort label for column {column} on dataset {table} is invalid")]
    InvalidSortLabel { column: String, table: String },

    /// More than one CONNECTION_POINT column.
    #[error("Dataset {table} has more than one connection point")]
    MultipleConnectionPoints { table: String },

    /// Grain declared on a table that has an explicit connection point.
    #[error("Grain cannot be created on data set {table} with a connection point")]
    GrainWithConnectionPoint { table: String },

    /// Grain declared on a table without facts.
    #[error("Grain cannot be created on data set {table} without facts")]
    GrainWithoutFacts { table: String },

    /// Grain entry that is not a column of the table.
    #[error("Grain '{grain}' not found between columns of dataset {table}")]
    GrainColumnNotFound { grain: String, table: String },

    /// Grain entry on a fact, label or connection point column.
    #[error("Grain '{grain}' of dataset {table} is on unsupported column type")]
    UnsupportedGrainColumn { grain: String, table: String },

    /// Two model objects ended up with the same identifier.
    #[error("Identifier '{identifier}' is used by both {first} and {second}")]
    DuplicateIdentifier {
        identifier: String,
        first: String,
        second: String,
    },
}

// =============================================================================
// Model Read Errors
// =============================================================================

/// Terminal errors while reading a project model back into configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// Dataset reference that matches no dataset, date dimension or time dataset.
    #[error("Reference '{reference}' from data set '{dataset}' not found in the model")]
    UnresolvedReference { reference: String, dataset: String },
}

// =============================================================================
// Template Lookup Errors
// =============================================================================

/// Errors from a date dimension template lookup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// No template known for the dimension.
    #[error("Template not found for date dimension '{0}'")]
    NotFound(String),

    /// Upload URN does not have the `urn:<template>:<file>` shape.
    #[error("Invalid date dimension upload URN: {0}")]
    InvalidUrn(String),

    /// The backing source could not be queried.
    #[error("Template lookup unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// Configuration Loading Errors
// =============================================================================

/// Errors while loading configuration or model files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid JSON or does not match the expected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Schema validation failed.
    #[error("Validation failed: {}", errors.join("; "))]
    Schema { errors: Vec<String> },
}

// =============================================================================
// Top-level Errors
// =============================================================================

/// Top-level errors returned by the command line interface.
#[derive(Debug, Error)]
pub enum WriterError {
    /// Configuration loading error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Model build error.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Model read error.
    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    /// IO error while writing output.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error while writing output.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for model build operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Result type for model read operations.
pub type ReadResult<T> = Result<T, ReadError>;

/// Result type for template lookups.
pub type LookupResult<T> = Result<T, LookupError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for CLI operations.
pub type WriterResult<T> = Result<T, WriterError>;
