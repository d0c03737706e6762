//! JSON Schema validation for project definitions and project models.
//!
//! Input documents are checked before deserialization so a malformed
//! configuration reports every problem at once instead of the first serde
//! error.
//!
//! # Embedded Schemas
//!
//! Schemas are embedded at compile time from the `schemas/` directory:
//! - `project-definition.json`
//! - `project-model.json`
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use gdwriter::validation::{is_valid_project_definition, validate_project_definition};
//!
//! let definition = json!({
//!     "tables": {
//!         "products": { "columns": { "id": { "type": "CONNECTION_POINT" } } }
//!     }
//! });
//! assert!(validate_project_definition(&definition).is_ok());
//!
//! let broken = json!({ "tables": { "products": { "columns": { "id": { "type": "KEY" } } } } });
//! assert!(!is_valid_project_definition(&broken));
//! ```

use once_cell::sync::Lazy;
use serde_json::Value;

static PROJECT_DEFINITION_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/project-definition.json"))
        .expect("Invalid embedded schema")
});

static PROJECT_MODEL_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/project-model.json"))
        .expect("Invalid embedded schema")
});

/// Validate `data` against a draft 7 `schema`.
///
/// Returns every validation error, not only the first one.
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator =
        jsonschema::draft7::new(schema).map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick check, true when `data` is valid.
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// Validate a project definition (tables and date dimensions).
pub fn validate_project_definition(data: &Value) -> Result<(), Vec<String>> {
    validate(&PROJECT_DEFINITION_SCHEMA, data)
}

pub fn is_valid_project_definition(data: &Value) -> bool {
    is_valid(&PROJECT_DEFINITION_SCHEMA, data)
}

/// Validate a project model document as exchanged with the modeling API.
pub fn validate_project_model(data: &Value) -> Result<(), Vec<String>> {
    validate(&PROJECT_MODEL_SCHEMA, data)
}

pub fn is_valid_project_model(data: &Value) -> bool {
    is_valid(&PROJECT_MODEL_SCHEMA, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProjectDefinition;
    use crate::transform::build_project_model;
    use serde_json::json;

    #[test]
    fn test_valid_definition() {
        let definition = json!({
            "tables": {
                "orders": {
                    "title": "Orders",
                    "columns": {
                        "id": { "type": "CONNECTION_POINT", "identifier": null },
                        "created": { "type": "DATE", "dateDimension": "Created", "format": "yyyy-MM-dd" },
                        "note": { "type": "IGNORE" }
                    }
                }
            },
            "dimensions": { "Created": { "includeTime": true, "template": "" } }
        });
        assert!(validate_project_definition(&definition).is_ok());
    }

    #[test]
    fn test_missing_role_fields() {
        let definition = json!({
            "tables": {
                "t": {
                    "columns": {
                        "url": { "type": "HYPERLINK" },
                        "customer": { "type": "REFERENCE" },
                        "created": { "type": "DATE" }
                    }
                }
            }
        });
        let errors = validate_project_definition(&definition).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("reference")));
        assert!(errors.iter().any(|e| e.contains("schemaReference")));
        assert!(errors.iter().any(|e| e.contains("dateDimension")));
    }

    #[test]
    fn test_unknown_column_type() {
        let definition = json!({ "tables": { "t": { "columns": { "a": { "type": "KEY" } } } } });
        assert!(!is_valid_project_definition(&definition));
        let definition = json!({ "tables": { "t": { "columns": { "a": { "title": "No type" } } } } });
        assert!(!is_valid_project_definition(&definition));
    }

    #[test]
    fn test_built_model_is_valid() {
        let definition: ProjectDefinition = serde_json::from_value(json!({
            "tables": {
                "products": { "columns": {
                    "id": { "type": "CONNECTION_POINT" },
                    "url": { "type": "HYPERLINK", "reference": "id" },
                    "price": { "type": "FACT", "dataType": "DECIMAL", "dataTypeSize": "12,2" }
                }},
                "sales": {
                    "columns": {
                        "product": { "type": "REFERENCE", "schemaReference": "products" },
                        "day": { "type": "DATE", "dateDimension": "Day" },
                        "amount": { "type": "FACT" }
                    },
                    "grain": ["product", "day"]
                }
            },
            "dimensions": { "Day": { "includeTime": true } }
        }))
        .unwrap();
        let document = build_project_model(&definition).unwrap();
        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(validate_project_model(&value), Ok(()));
    }

    #[test]
    fn test_invalid_model() {
        let model = json!({
            "projectModel": {
                "datasets": [{ "dataset": {
                    "identifier": "dataset.t",
                    "title": "T",
                    "anchor": { "attribute": {
                        "identifier": "attr.t.id",
                        "title": "Id",
                        "labels": [{ "label": { "identifier": "label.t.id", "title": "Id", "type": "GDC.html" } }]
                    }}
                }}]
            }
        });
        assert!(validate_project_model(&model).is_err());
        assert!(!is_valid_project_model(&json!({ "datasets": [] })));
    }

    #[test]
    fn test_generic_validate() {
        let schema = json!({
            "type": "object",
            "required": ["name"],
            "properties": { "name": { "type": "string" } }
        });
        assert!(validate(&schema, &json!({ "name": "test" })).is_ok());
        assert!(validate(&schema, &json!({ "age": 42 })).is_err());
        assert!(is_valid(&schema, &json!({ "name": "x" })));
    }
}
