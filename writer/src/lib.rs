//! # gdwriter - GoodData logical data model translator
//!
//! gdwriter turns a declarative project definition (tables, typed columns,
//! date dimensions) into the project model document understood by the
//! GoodData modeling API, and reads such a document back into a definition.
//!
//! ## Architecture
//!
//! ```text
//!                      build_project_model
//! ┌──────────────────┐ ─────────────────────▶ ┌──────────────────────┐
//! │ ProjectDefinition│                        │ ProjectModelDocument │
//! │ (config JSON)    │ ◀───────────────────── │ (wire JSON)          │
//! └──────────────────┘  read_project_model    └──────────────────────┘
//!          │                     ▲
//!          ▼                     │
//!   ldm::identifiers      lookup::DateDimensionLookup
//!   (derived ids)         (date dimension templates)
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use gdwriter::{build_project_model, read_project_model, NoTemplates, ProjectDefinition};
//! use serde_json::json;
//!
//! let definition: ProjectDefinition = serde_json::from_value(json!({
//!     "tables": {
//!         "products": { "columns": {
//!             "id": { "type": "CONNECTION_POINT" },
//!             "name": { "type": "ATTRIBUTE" }
//!         }}
//!     }
//! })).unwrap();
//!
//! let document = build_project_model(&definition).unwrap();
//! let dataset = document.project_model.dataset("dataset.products").unwrap();
//! assert_eq!(dataset.attributes[0].attribute.identifier, "attr.products.name");
//!
//! let outcome = read_project_model(&document, &NoTemplates).unwrap();
//! assert!(outcome.definition.tables.contains_key("products"));
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Project definition (tables, columns, date dimensions)
//! - [`ldm`] - Project model document and identifier derivation
//! - [`transform`] - Forward builder, reverse reader, grain translation
//! - [`lookup`] - Date dimension template sources
//! - [`config`] - Loading input files
//! - [`validation`] - JSON schema validation
//! - [`logs`] - Log entries and broadcaster

// Core modules
pub mod error;
pub mod models;

// Wire model
pub mod ldm;

// Transformation
pub mod transform;

// External collaborators
pub mod lookup;

// Input
pub mod config;
pub mod validation;

// Logging
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, ConfigResult, LookupError, LookupResult, ModelError, ModelResult, ReadError,
    ReadResult, WriterError, WriterResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    column_data_type, parse_data_type, ColumnDefinition, ColumnKind, DateDimensionDefinition,
    ProjectDefinition, SortOrder, TableDefinition,
};

pub use ldm::identifiers::{derive_identifier, slug, IdentifierRole};
pub use ldm::ProjectModelDocument;

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{
    build_project_model, read_project_model, read_project_model_with, ReadOptions, ReadOutcome,
};

// =============================================================================
// Re-exports - Lookup
// =============================================================================

pub use lookup::{template_from_urn, DateDimensionLookup, NoTemplates, StaticTemplates};

// =============================================================================
// Re-exports - Config & Validation
// =============================================================================

pub use config::{load_project_definition, load_project_model};
pub use validation::{validate_project_definition, validate_project_model};
