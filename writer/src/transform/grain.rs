//! Grain translation between column names and wire identifiers.
//!
//! A grain is the composite natural key of a table without a connection
//! point. In the configuration it is a list of column names; on the wire it
//! is a list of attribute / date dimension identifiers on the anchor.

use std::collections::HashMap;

use super::builder::{ResolvedColumn, ResolvedRole};
use super::warn;
use crate::error::{ModelError, ModelResult};
use crate::ldm::GrainEntry;

/// Translate the grain of `table_id` into wire entries, in declared order.
///
/// The table must not have a connection point and must have at least one
/// fact. Every grain column must be an attribute, a reference or a date.
pub fn grain_to_wire(
    table_id: &str,
    grain: &[String],
    columns: &[ResolvedColumn],
) -> ModelResult<Vec<GrainEntry>> {
    if grain.is_empty() {
        return Ok(Vec::new());
    }
    if columns
        .iter()
        .any(|c| matches!(c.role, ResolvedRole::ConnectionPoint(_)))
    {
        return Err(ModelError::GrainWithConnectionPoint {
            table: table_id.to_string(),
        });
    }
    if !columns
        .iter()
        .any(|c| matches!(c.role, ResolvedRole::Fact { .. }))
    {
        return Err(ModelError::GrainWithoutFacts {
            table: table_id.to_string(),
        });
    }

    grain
        .iter()
        .map(|name| {
            let column = columns.iter().find(|c| &c.name == name).ok_or_else(|| {
                ModelError::GrainColumnNotFound {
                    grain: name.clone(),
                    table: table_id.to_string(),
                }
            })?;
            match &column.role {
                ResolvedRole::Attribute(attribute) => {
                    Ok(GrainEntry::Attribute(attribute.identifier.clone()))
                }
                ResolvedRole::Reference(reference) => {
                    Ok(GrainEntry::Attribute(reference.connection.clone()))
                }
                ResolvedRole::Date(date) => Ok(GrainEntry::DateDimension(date.dimension.clone())),
                _ => Err(ModelError::UnsupportedGrainColumn {
                    grain: name.clone(),
                    table: table_id.to_string(),
                }),
            }
        })
        .collect()
}

/// Column names of one dataset, keyed by the identifiers a grain entry may carry.
#[derive(Debug, Default)]
pub struct GrainIndex {
    attributes: HashMap<String, String>,
    references: HashMap<String, String>,
    date_dimensions: HashMap<String, String>,
}

impl GrainIndex {
    /// ATTRIBUTE column `name` with wire identifier `identifier`.
    pub fn add_attribute(&mut self, identifier: &str, name: &str) {
        self.attributes
            .insert(identifier.to_string(), name.to_string());
    }

    /// REFERENCE column `name` pointing at connection attribute `connection`.
    pub fn add_reference(&mut self, connection: &str, name: &str) {
        self.references
            .insert(connection.to_string(), name.to_string());
    }

    /// DATE column `name` pointing at date dimension `dimension`.
    pub fn add_date_dimension(&mut self, dimension: &str, name: &str) {
        self.date_dimensions
            .insert(dimension.to_string(), name.to_string());
    }

    fn lookup(&self, entry: &GrainEntry) -> Option<&String> {
        match entry {
            GrainEntry::Attribute(id) => self
                .attributes
                .get(id)
                .or_else(|| self.references.get(id)),
            GrainEntry::DateDimension(id) => self.date_dimensions.get(id),
        }
    }
}

/// Translate wire grain entries back into column names.
///
/// Entries that cannot be translated are skipped with a warning, so the
/// result may be a partial grain.
pub fn grain_from_wire(
    dataset: &str,
    grain: &[GrainEntry],
    index: &GrainIndex,
    warnings: &mut Vec<String>,
) -> Vec<String> {
    let mut names = Vec::with_capacity(grain.len());
    for entry in grain {
        match index.lookup(entry) {
            Some(name) => names.push(name.clone()),
            None => {
                let id = match entry {
                    GrainEntry::Attribute(id) | GrainEntry::DateDimension(id) => id,
                };
                warn(
                    warnings,
                    format!("Grain {} of dataset {} could not be translated", id, dataset),
                );
            }
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::builder::{ResolvedAttribute, ResolvedDate, ResolvedReference};

    fn column(name: &str, role: ResolvedRole) -> ResolvedColumn {
        ResolvedColumn {
            name: name.to_string(),
            title: name.to_string(),
            data_type: None,
            role,
        }
    }

    fn attribute(name: &str) -> ResolvedColumn {
        column(
            name,
            ResolvedRole::Attribute(ResolvedAttribute {
                identifier: format!("attr.t.{}", name),
                label: format!("label.t.{}", name),
                sort: None,
            }),
        )
    }

    fn fact(name: &str) -> ResolvedColumn {
        column(
            name,
            ResolvedRole::Fact {
                identifier: format!("fact.t.{}", name),
            },
        )
    }

    fn grain(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_grain_in_declared_order() {
        let columns = vec![
            attribute("code"),
            fact("amount"),
            column(
                "customer",
                ResolvedRole::Reference(ResolvedReference {
                    dataset: "dataset.customers".into(),
                    connection: "attr.customers.id".into(),
                    connection_label: "label.customers.id".into(),
                    multivalue: false,
                }),
            ),
            column(
                "created",
                ResolvedRole::Date(ResolvedDate {
                    dimension: "created".into(),
                    time: None,
                }),
            ),
        ];

        let entries = grain_to_wire("t", &grain(&["created", "code", "customer"]), &columns).unwrap();
        assert_eq!(
            entries,
            vec![
                GrainEntry::DateDimension("created".into()),
                GrainEntry::Attribute("attr.t.code".into()),
                GrainEntry::Attribute("attr.customers.id".into()),
            ]
        );
    }

    #[test]
    fn test_grain_on_fact_is_rejected() {
        let columns = vec![attribute("code"), fact("amount")];
        let err = grain_to_wire("t", &grain(&["amount"]), &columns).unwrap_err();
        assert_eq!(
            err,
            ModelError::UnsupportedGrainColumn {
                grain: "amount".into(),
                table: "t".into()
            }
        );
    }

    #[test]
    fn test_grain_without_facts_is_rejected() {
        let columns = vec![attribute("code")];
        let err = grain_to_wire("t", &grain(&["code"]), &columns).unwrap_err();
        assert_eq!(err, ModelError::GrainWithoutFacts { table: "t".into() });
    }

    #[test]
    fn test_grain_with_connection_point_is_rejected() {
        let columns = vec![
            column(
                "id",
                ResolvedRole::ConnectionPoint(ResolvedAttribute {
                    identifier: "attr.t.id".into(),
                    label: "label.t.id".into(),
                    sort: None,
                }),
            ),
            attribute("code"),
            fact("amount"),
        ];
        let err = grain_to_wire("t", &grain(&["code"]), &columns).unwrap_err();
        assert_eq!(err, ModelError::GrainWithConnectionPoint { table: "t".into() });
    }

    #[test]
    fn test_unknown_grain_column() {
        let columns = vec![attribute("code"), fact("amount")];
        let err = grain_to_wire("t", &grain(&["missing"]), &columns).unwrap_err();
        assert!(matches!(err, ModelError::GrainColumnNotFound { .. }));
    }

    #[test]
    fn test_grain_from_wire_partial() {
        let mut index = GrainIndex::default();
        index.add_attribute("attr.t.code", "a_code");
        index.add_reference("attr.customers.id", "datasetcustomers");
        index.add_date_dimension("created", "created");

        let mut warnings = Vec::new();
        let names = grain_from_wire(
            "dataset.t",
            &[
                GrainEntry::Attribute("attr.t.code".into()),
                GrainEntry::Attribute("attr.unknown".into()),
                GrainEntry::Attribute("attr.customers.id".into()),
                GrainEntry::DateDimension("created".into()),
            ],
            &index,
            &mut warnings,
        );

        assert_eq!(names, ["a_code", "datasetcustomers", "created"]);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("attr.unknown"));
    }
}
