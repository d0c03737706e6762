//! Build the platform project model from a project definition.
//!
//! # Architecture
//!
//! ```text
//! ProjectDefinition                      ProjectModelDocument
//! ┌───────────────────────┐  resolve    ┌───────────────────────────┐
//! │ tables ──▶ columns    │ ─────────▶  │ datasets (anchor, facts,  │
//! │ dimensions            │  + emit     │   attributes, references) │
//! └───────────────────────┘             │ dateDimensions            │
//!                                       └───────────────────────────┘
//! ```
//!
//! Each table is first *resolved*: IGNORE columns are dropped, DATE and
//! REFERENCE columns are bound to their dimension / target table and every
//! column receives its final identifiers (explicit or derived). Emission then
//! only arranges resolved columns into dataset nodes.

use std::collections::HashMap;

use indexmap::IndexMap;

use super::grain::grain_to_wire;
use crate::error::{ModelError, ModelResult};
use crate::ldm::identifiers::{
    attribute_id, dataset_id, date_dimension_id, fact_id, implicit_anchor_id, label_id,
    ref_label_id, slug, time_dataset_id, time_fact_id,
};
use crate::ldm::time::time_dimension_dataset;
use crate::ldm::{
    Attribute, AttributeNode, AttributeSortOrder, Dataset, DatasetNode, DateDimension,
    DateDimensionNode, Fact, FactNode, Label, LabelNode, LabelType, ProjectModel,
    ProjectModelDocument, SortOrderNode,
};
use crate::logs::{log_info_indent, log_success};
use crate::models::{
    AttributeColumn, ColumnDefinition, ColumnKind, DateColumn, DateDimensionDefinition,
    ProjectDefinition, ReferenceColumn, TableDefinition,
};

/// Data type of the time-of-day fact.
const TIME_FACT_DATA_TYPE: &str = "INT";

/// Data type of hyperlink labels without an explicit one.
const HYPERLINK_DATA_TYPE: &str = "VARCHAR(255)";

// =============================================================================
// Resolved Table
// =============================================================================

/// A table with all references bound and all identifiers assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTable {
    pub table_id: String,
    pub identifier: String,
    pub title: String,
    pub anchor_identifier: Option<String>,
    pub grain: Vec<String>,
    /// Columns in declared order, IGNORE columns removed.
    pub columns: Vec<ResolvedColumn>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedColumn {
    pub name: String,
    pub title: String,
    /// Wire data type, `TYPE` or `TYPE(size)`.
    pub data_type: Option<String>,
    pub role: ResolvedRole,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedRole {
    ConnectionPoint(ResolvedAttribute),
    Attribute(ResolvedAttribute),
    Fact { identifier: String },
    Label(ResolvedLabel),
    Reference(ResolvedReference),
    Date(ResolvedDate),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAttribute {
    pub identifier: String,
    /// Default label identifier.
    pub label: String,
    pub sort: Option<AttributeSortOrder>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLabel {
    pub identifier: String,
    /// Name of the attribute column the label belongs to.
    pub reference: String,
    pub link: bool,
}

/// Wire-level foreign key target of a REFERENCE column.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedReference {
    pub dataset: String,
    /// Connection point attribute of the target.
    pub connection: String,
    /// Default label of the target's connection point.
    pub connection_label: String,
    pub multivalue: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDate {
    /// Date dimension identifier.
    pub dimension: String,
    pub time: Option<ResolvedTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTime {
    /// Synthetic time dataset identifier.
    pub dataset: String,
    /// Time-of-day fact identifier.
    pub fact: String,
}

// =============================================================================
// Build
// =============================================================================

/// Build the project model document for every table and date dimension.
///
/// Any configuration error aborts the whole build.
pub fn build_project_model(project: &ProjectDefinition) -> ModelResult<ProjectModelDocument> {
    let mut document = ProjectModelDocument::default();

    for (table_id, table) in &project.tables {
        let resolved = resolve_table(table_id, table, project)?;

        for column in &resolved.columns {
            if let ResolvedRole::Reference(reference) = &column.role {
                if reference.multivalue
                    && !document.multivalue_attributes.contains(&reference.connection)
                {
                    document
                        .multivalue_attributes
                        .push(reference.connection.clone());
                }
            }
        }

        log_info_indent(
            format!("{} → {} ({} columns)", table_id, resolved.identifier, resolved.columns.len()),
            1,
        );
        document
            .project_model
            .datasets
            .push(dataset_node(&resolved)?);
    }

    for (name, dimension) in &project.dimensions {
        let identifier = dimension_identifier(name, dimension);
        if dimension.include_time {
            document
                .project_model
                .datasets
                .push(time_dimension_dataset(&time_dimension_identifier(name, dimension), name));
        }
        document
            .project_model
            .date_dimensions
            .push(DateDimensionNode {
                date_dimension: DateDimension {
                    name: identifier,
                    title: name.clone(),
                },
            });
    }

    check_unique_identifiers(&document.project_model)?;

    log_success(format!(
        "Built project model: {} datasets, {} date dimensions",
        document.project_model.datasets.len(),
        document.project_model.date_dimensions.len()
    ));
    Ok(document)
}

/// Identifier of a date dimension: the override, or the derived one.
pub fn dimension_identifier(name: &str, dimension: &DateDimensionDefinition) -> String {
    match dimension.identifier.as_deref().filter(|i| !i.is_empty()) {
        Some(identifier) => identifier.to_string(),
        None => date_dimension_id(name, dimension.template.as_deref()),
    }
}

/// Identifier of the time dataset of a date dimension: the override, or the
/// slug of its name. The template never takes part.
pub fn time_dimension_identifier(name: &str, dimension: &DateDimensionDefinition) -> String {
    match dimension.identifier.as_deref().filter(|i| !i.is_empty()) {
        Some(identifier) => identifier.to_string(),
        None => slug(name),
    }
}

// =============================================================================
// Resolve
// =============================================================================

/// Resolve one table against the whole project.
pub fn resolve_table(
    table_id: &str,
    table: &TableDefinition,
    project: &ProjectDefinition,
) -> ModelResult<ResolvedTable> {
    let mut columns = Vec::with_capacity(table.columns.len());
    let mut sort_labels = Vec::new();

    for (name, column) in &table.columns {
        let role = match &column.kind {
            ColumnKind::Ignore => continue,
            ColumnKind::ConnectionPoint(options) => {
                sort_labels.push((columns.len(), options));
                ResolvedRole::ConnectionPoint(resolve_attribute(table_id, name, column, options))
            }
            ColumnKind::Attribute(options) => {
                sort_labels.push((columns.len(), options));
                ResolvedRole::Attribute(resolve_attribute(table_id, name, column, options))
            }
            ColumnKind::Fact => ResolvedRole::Fact {
                identifier: column
                    .identifier()
                    .map(String::from)
                    .unwrap_or_else(|| fact_id(table_id, name)),
            },
            ColumnKind::Label(label) | ColumnKind::Hyperlink(label) => {
                ResolvedRole::Label(ResolvedLabel {
                    identifier: column
                        .identifier()
                        .map(String::from)
                        .unwrap_or_else(|| ref_label_id(table_id, &label.reference, name)),
                    reference: label.reference.clone(),
                    link: matches!(column.kind, ColumnKind::Hyperlink(_)),
                })
            }
            ColumnKind::Reference(reference) => {
                ResolvedRole::Reference(resolve_reference(table_id, name, reference, project)?)
            }
            ColumnKind::Date(date) => {
                ResolvedRole::Date(resolve_date(table_id, name, column, date, project)?)
            }
        };
        columns.push(ResolvedColumn {
            name: name.clone(),
            title: column.title_or(name).to_string(),
            data_type: column.wire_data_type(),
            role,
        });
    }

    let connection_points = columns
        .iter()
        .filter(|c| matches!(c.role, ResolvedRole::ConnectionPoint(_)))
        .count();
    if connection_points > 1 {
        return Err(ModelError::MultipleConnectionPoints {
            table: table_id.to_string(),
        });
    }

    check_label_references(table_id, &columns)?;

    for (index, options) in sort_labels {
        let Some(sort_label) = options.sort_label.as_deref().filter(|s| !s.is_empty()) else {
            continue;
        };
        let label = sort_label_identifier(table_id, &columns, index, sort_label)?;
        let sort = AttributeSortOrder {
            label,
            direction: options.sort_order.unwrap_or_default(),
        };
        match &mut columns[index].role {
            ResolvedRole::ConnectionPoint(attribute) | ResolvedRole::Attribute(attribute) => {
                attribute.sort = Some(sort)
            }
            _ => {}
        }
    }

    Ok(ResolvedTable {
        table_id: table_id.to_string(),
        identifier: table
            .identifier
            .clone()
            .filter(|i| !i.is_empty())
            .unwrap_or_else(|| dataset_id(table_id)),
        title: table.title_or(table_id).to_string(),
        anchor_identifier: table.anchor_identifier.clone().filter(|i| !i.is_empty()),
        grain: table.grain.clone(),
        columns,
    })
}

fn resolve_attribute(
    table_id: &str,
    name: &str,
    column: &ColumnDefinition,
    options: &AttributeColumn,
) -> ResolvedAttribute {
    let (identifier, label) = attribute_identifiers(table_id, name, column, options);
    ResolvedAttribute {
        identifier,
        label,
        sort: None,
    }
}

/// Attribute and default label identifiers of an ATTRIBUTE or CONNECTION_POINT column.
fn attribute_identifiers(
    table_id: &str,
    name: &str,
    column: &ColumnDefinition,
    options: &AttributeColumn,
) -> (String, String) {
    let identifier = column
        .identifier()
        .map(String::from)
        .unwrap_or_else(|| attribute_id(table_id, name));
    let label = options
        .identifier_label
        .clone()
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| label_id(table_id, name));
    (identifier, label)
}

fn resolve_reference(
    table_id: &str,
    name: &str,
    reference: &ReferenceColumn,
    project: &ProjectDefinition,
) -> ModelResult<ResolvedReference> {
    let target_id = reference.schema_reference.as_str();
    let target = project
        .table(target_id)
        .filter(|_| !target_id.is_empty())
        .ok_or_else(|| ModelError::InvalidSchemaReference {
            column: name.to_string(),
            table: table_id.to_string(),
        })?;

    let (cp_name, cp_column, cp_options) =
        target
            .connection_point()
            .ok_or_else(|| ModelError::MissingConnectionPoint {
                table: target_id.to_string(),
                referenced_from: table_id.to_string(),
            })?;
    let (connection, connection_label) =
        attribute_identifiers(target_id, cp_name, cp_column, cp_options);

    Ok(ResolvedReference {
        dataset: target
            .identifier
            .clone()
            .filter(|i| !i.is_empty())
            .unwrap_or_else(|| dataset_id(target_id)),
        connection,
        connection_label,
        multivalue: reference.multivalue,
    })
}

fn resolve_date(
    table_id: &str,
    name: &str,
    column: &ColumnDefinition,
    date: &DateColumn,
    project: &ProjectDefinition,
) -> ModelResult<ResolvedDate> {
    let dimension_name = date.date_dimension.as_str();
    let dimension = project
        .dimension(dimension_name)
        .filter(|_| !dimension_name.is_empty())
        .ok_or_else(|| ModelError::InvalidDateDimension {
            column: name.to_string(),
            table: table_id.to_string(),
        })?;

    let own_identifier = dimension_identifier(dimension_name, dimension);
    let reference = match (dimension.identifier.as_deref(), column.identifier()) {
        (Some(i), _) if !i.is_empty() => own_identifier.clone(),
        (_, Some(i)) => i.to_string(),
        _ => own_identifier.clone(),
    };

    let time = dimension.include_time.then(|| ResolvedTime {
        dataset: time_dataset_id(&time_dimension_identifier(dimension_name, dimension)),
        fact: date
            .identifier_time_fact
            .clone()
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| time_fact_id(table_id, name)),
    });

    Ok(ResolvedDate {
        dimension: reference,
        time,
    })
}

/// Every LABEL/HYPERLINK must belong to an attribute or the connection point.
fn check_label_references(table_id: &str, columns: &[ResolvedColumn]) -> ModelResult<()> {
    for column in columns {
        if let ResolvedRole::Label(label) = &column.role {
            let target = columns.iter().find(|c| c.name == label.reference);
            let valid = matches!(
                target.map(|c| &c.role),
                Some(ResolvedRole::Attribute(_)) | Some(ResolvedRole::ConnectionPoint(_))
            );
            if !valid {
                return Err(ModelError::InvalidLabelReference {
                    column: column.name.clone(),
                    table: table_id.to_string(),
                    reference: label.reference.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Label identifier for the sort label `sort_label` of the attribute at `index`.
///
/// The sort label is either the attribute itself (its default label) or a
/// LABEL/HYPERLINK column bound to it.
fn sort_label_identifier(
    table_id: &str,
    columns: &[ResolvedColumn],
    index: usize,
    sort_label: &str,
) -> ModelResult<String> {
    let attribute = &columns[index];
    let invalid = || ModelError::InvalidSortLabel {
        column: attribute.name.clone(),
        table: table_id.to_string(),
    };

    if sort_label == attribute.name {
        return match &attribute.role {
            ResolvedRole::ConnectionPoint(a) | ResolvedRole::Attribute(a) => Ok(a.label.clone()),
            _ => Err(invalid()),
        };
    }

    match columns.iter().find(|c| c.name == sort_label).map(|c| &c.role) {
        Some(ResolvedRole::Label(label)) if label.reference == attribute.name => {
            Ok(label.identifier.clone())
        }
        _ => Err(invalid()),
    }
}

// =============================================================================
// Emit
// =============================================================================

fn dataset_node(table: &ResolvedTable) -> ModelResult<DatasetNode> {
    let mut anchor = Attribute::new(
        table
            .anchor_identifier
            .clone()
            .unwrap_or_else(|| implicit_anchor_id(&table.table_id)),
        format!("Records of {}", table.title),
    );
    anchor.grain = grain_to_wire(&table.table_id, &table.grain, &table.columns)?;

    let mut connection_point: Option<&str> = None;
    let mut facts = Vec::new();
    let mut attributes: IndexMap<&str, Attribute> = IndexMap::new();
    let mut labels: IndexMap<&str, Vec<LabelNode>> = IndexMap::new();
    let mut references = Vec::new();

    for column in &table.columns {
        match &column.role {
            ResolvedRole::ConnectionPoint(attribute) => {
                connection_point = Some(column.name.as_str());
                anchor = attribute_node(table, column, attribute);
                labels
                    .entry(&column.name)
                    .or_default()
                    .push(default_label(column, attribute));
            }
            ResolvedRole::Attribute(attribute) => {
                attributes.insert(&column.name, attribute_node(table, column, attribute));
                labels
                    .entry(&column.name)
                    .or_default()
                    .push(default_label(column, attribute));
            }
            ResolvedRole::Fact { identifier } => {
                facts.push(fact_node(identifier, &column.title, column.data_type.clone()));
            }
            ResolvedRole::Label(label) => {
                let data_type = match (&column.data_type, label.link) {
                    (Some(data_type), _) => Some(data_type.clone()),
                    (None, true) => Some(HYPERLINK_DATA_TYPE.to_string()),
                    (None, false) => None,
                };
                labels.entry(&label.reference).or_default().push(LabelNode {
                    label: Label {
                        identifier: label.identifier.clone(),
                        title: column.title.clone(),
                        label_type: if label.link {
                            LabelType::Link
                        } else {
                            LabelType::Text
                        },
                        data_type,
                    },
                });
            }
            ResolvedRole::Reference(reference) => {
                references.push(reference.dataset.clone());
            }
            ResolvedRole::Date(date) => {
                references.push(date.dimension.clone());
                if let Some(time) = &date.time {
                    references.push(time.dataset.clone());
                    facts.push(fact_node(
                        &time.fact,
                        &format!("{} Time", column.title),
                        Some(TIME_FACT_DATA_TYPE.to_string()),
                    ));
                }
            }
        }
    }

    // References were checked while resolving, so every label set has an owner.
    for (owner, nodes) in labels {
        if let Some(attribute) = attributes.get_mut(owner) {
            attribute.labels = nodes;
        } else if connection_point == Some(owner) {
            anchor.labels = nodes;
        }
    }

    Ok(DatasetNode {
        dataset: Dataset {
            identifier: table.identifier.clone(),
            title: table.title.clone(),
            anchor: AttributeNode { attribute: anchor },
            facts,
            attributes: attributes
                .into_values()
                .map(|attribute| AttributeNode { attribute })
                .collect(),
            references,
        },
    })
}

fn attribute_node(
    table: &ResolvedTable,
    column: &ResolvedColumn,
    attribute: &ResolvedAttribute,
) -> Attribute {
    let mut node = Attribute::new(attribute.identifier.clone(), column.title.clone());
    node.default_label = Some(attribute.label.clone());
    node.folder = Some(table.title.clone());
    node.deprecated = Some(false);
    node.sort_order = attribute.sort.clone().map(|attribute_sort_order| SortOrderNode {
        attribute_sort_order,
    });
    node
}

fn default_label(column: &ResolvedColumn, attribute: &ResolvedAttribute) -> LabelNode {
    LabelNode {
        label: Label {
            identifier: attribute.label.clone(),
            title: column.title.clone(),
            label_type: LabelType::Text,
            data_type: column.data_type.clone(),
        },
    }
}

fn fact_node(identifier: &str, title: &str, data_type: Option<String>) -> FactNode {
    FactNode {
        fact: Fact {
            identifier: identifier.to_string(),
            title: title.to_string(),
            deprecated: Some(false),
            data_type,
        },
    }
}

// =============================================================================
// Identifier Collisions
// =============================================================================

/// Reject models where two objects share an identifier.
///
/// Slugging maps names that differ only in punctuation to the same
/// identifier; the platform would silently merge such objects.
fn check_unique_identifiers(model: &ProjectModel) -> ModelResult<()> {
    let mut seen: HashMap<String, String> = HashMap::new();
    let mut claim = |identifier: &str, owner: String| -> ModelResult<()> {
        match seen.get(identifier) {
            Some(first) => Err(ModelError::DuplicateIdentifier {
                identifier: identifier.to_string(),
                first: first.clone(),
                second: owner,
            }),
            None => {
                seen.insert(identifier.to_string(), owner);
                Ok(())
            }
        }
    };

    for node in &model.datasets {
        let dataset = &node.dataset;
        claim(&dataset.identifier, format!("dataset '{}'", dataset.title))?;

        let attributes = std::iter::once(&dataset.anchor.attribute)
            .chain(dataset.attributes.iter().map(|a| &a.attribute));
        for attribute in attributes {
            claim(
                &attribute.identifier,
                format!("attribute '{}' of dataset '{}'", attribute.title, dataset.title),
            )?;
            for label in &attribute.labels {
                claim(
                    &label.label.identifier,
                    format!("label '{}' of dataset '{}'", label.label.title, dataset.title),
                )?;
            }
        }
        for fact in &dataset.facts {
            claim(
                &fact.fact.identifier,
                format!("fact '{}' of dataset '{}'", fact.fact.title, dataset.title),
            )?;
        }
    }
    for node in &model.date_dimensions {
        claim(
            &node.date_dimension.name,
            format!("date dimension '{}'", node.date_dimension.title),
        )?;
    }
    Ok(())
}
