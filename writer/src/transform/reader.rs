//! Read a platform project model back into a project definition.
//!
//! The read runs in stages over every dataset before moving on, because
//! resolving a reference needs the dictionaries of all other datasets:
//!
//! ```text
//! collect ──▶ dimensions ──▶ labels & sort labels ──▶ references ──▶ grain ──▶ assemble
//! (drafts)    (templates,     (per dataset)            (cross dataset)
//!              includeTime)
//! ```
//!
//! Problems the platform has tolerated in the past degrade to warnings; only
//! a reference to nothing at all aborts the read.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;

use super::grain::{grain_from_wire, GrainIndex};
use super::warn;
use crate::error::{ReadError, ReadResult};
use crate::ldm::identifiers::{date_dimension_id, slug, TIME_DATASET_PREFIX, TIME_FACT_PREFIX};
use crate::ldm::{Attribute, Dataset, GrainEntry, Label, LabelType, ProjectModelDocument};
use crate::logs::{log_info, log_info_indent, log_success};
use crate::lookup::DateDimensionLookup;
use crate::models::{
    parse_data_type, AttributeColumn, ColumnDefinition, ColumnKind, DateColumn,
    DateDimensionDefinition, LabelColumn, ProjectDefinition, ReferenceColumn, TableDefinition,
};

/// Format given to DATE columns recovered from references.
pub const DEFAULT_DATE_FORMAT: &str = "yyyy-MM-dd";

const TIME_FACT_TITLE_SUFFIX: &str = " Time";

/// Options for reading a project model
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Prefix of generated table ids (usually the storage bucket)
    pub table_prefix: Option<String>,
}

/// Result of a read: the definition plus every degradation met on the way
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOutcome {
    pub definition: ProjectDefinition,
    pub warnings: Vec<String>,
}

/// Read `document` with default options.
pub fn read_project_model(
    document: &ProjectModelDocument,
    lookup: &dyn DateDimensionLookup,
) -> ReadResult<ReadOutcome> {
    read_project_model_with(document, lookup, &ReadOptions::default())
}

/// Read `document` back into a project definition.
///
/// `lookup` is asked once per date dimension for its template; a failure
/// only drops that template.
pub fn read_project_model_with(
    document: &ProjectModelDocument,
    lookup: &dyn DateDimensionLookup,
    options: &ReadOptions,
) -> ReadResult<ReadOutcome> {
    let mut warnings = Vec::new();
    let model = &document.project_model;

    log_info(format!(
        "Reading project model: {} datasets, {} date dimensions",
        model.datasets.len(),
        model.date_dimensions.len()
    ));

    // Collect
    let mut time_datasets: Vec<&str> = Vec::new();
    let mut drafts: Vec<DraftDataset> = Vec::new();
    let mut table_ids: HashSet<String> = HashSet::new();
    for node in &model.datasets {
        let dataset = &node.dataset;
        if let Some(dimension) = dataset.identifier.strip_prefix(TIME_DATASET_PREFIX) {
            time_datasets.push(dimension);
            continue;
        }
        let table_id = unique_table_id(
            &mut table_ids,
            table_id_for(options.table_prefix.as_deref(), dataset),
            &mut warnings,
        );
        drafts.push(DraftDataset::collect(table_id, dataset, &mut warnings));
    }

    // Dimensions
    let mut dimensions: IndexMap<String, DateDimensionDefinition> = IndexMap::new();
    let mut dimension_titles: HashMap<&str, &str> = HashMap::new();
    for node in &model.date_dimensions {
        let dimension = &node.date_dimension;
        let template = match lookup.template(&dimension.title) {
            Ok(template) => Some(template),
            Err(e) => {
                warn(
                    &mut warnings,
                    format!(
                        "Template of date dimension '{}' could not be found: {}",
                        dimension.title, e
                    ),
                );
                None
            }
        };
        // Time datasets carry the slug of the title, or the name when it was overridden
        let title_slug = slug(&dimension.title);
        let include_time = match time_datasets
            .iter()
            .position(|d| *d == title_slug)
            .or_else(|| time_datasets.iter().position(|d| *d == dimension.name))
        {
            Some(position) => {
                time_datasets.remove(position);
                true
            }
            None => false,
        };
        // Only a name the builder would not derive on its own becomes an override
        let derived = date_dimension_id(&dimension.title, template.as_deref());
        let identifier = (dimension.name != derived).then(|| dimension.name.clone());
        dimension_titles.insert(&dimension.name, &dimension.title);
        dimensions.insert(
            dimension.title.clone(),
            DateDimensionDefinition {
                include_time,
                template,
                identifier,
            },
        );
    }
    for orphan in time_datasets {
        warn(
            &mut warnings,
            format!(
                "Dataset '{}{}' looks like a time dimension but no date dimension matches it, skipped",
                TIME_DATASET_PREFIX, orphan
            ),
        );
    }

    // Labels and sort labels, per dataset
    for draft in &mut drafts {
        draft.resolve_labels(&mut warnings);
    }

    // References, across datasets
    let connection_points: HashMap<&str, (&str, &str)> = drafts
        .iter()
        .filter_map(|d| {
            d.connection_point
                .as_deref()
                .map(|cp| (d.identifier.as_str(), (d.table_id.as_str(), cp)))
        })
        .collect();
    let multivalue: HashSet<&str> = document
        .multivalue_attributes
        .iter()
        .map(String::as_str)
        .collect();

    let mut resolved = Vec::with_capacity(drafts.len());
    for draft in &drafts {
        let references = draft.resolve_references(&dimension_titles, &connection_points, &multivalue)?;
        resolved.push(references);
    }
    for (draft, references) in drafts.iter_mut().zip(resolved) {
        draft.apply_references(references, &dimensions, &mut warnings);
    }

    // Grain and assemble
    let mut tables: IndexMap<String, TableDefinition> = IndexMap::new();
    for draft in drafts {
        log_info_indent(
            format!("{} → {} ({} columns)", draft.identifier, draft.table_id, draft.columns.len()),
            1,
        );
        let (table_id, table) = draft.finish(&mut warnings);
        tables.insert(table_id, table);
    }

    log_success(format!(
        "Read {} tables, {} date dimensions ({} warnings)",
        tables.len(),
        dimensions.len(),
        warnings.len()
    ));

    Ok(ReadOutcome {
        definition: ProjectDefinition { tables, dimensions },
        warnings,
    })
}

// =============================================================================
// Draft Dataset
// =============================================================================

/// A dataset being read. Column fields hold wire identifiers until the
/// resolving stages translate them into column names.
#[derive(Debug)]
struct DraftDataset {
    table_id: String,
    identifier: String,
    title: String,
    /// Anchor attribute identifier when the anchor is a connection point.
    connection_point: Option<String>,
    anchor_identifier: Option<String>,
    grain: Vec<GrainEntry>,
    columns: IndexMap<String, ColumnDefinition>,
    /// Time-of-day facts `(identifier, title)` in wire order.
    time_facts: VecDeque<(String, String)>,
    grain_index: GrainIndex,
}

/// What a REFERENCE column turned out to point at.
#[derive(Debug)]
enum ReferenceTarget {
    Date { identifier: String, dimension: String },
    Table { table_id: String, connection: String, multivalue: bool },
    TimeDataset,
}

impl DraftDataset {
    fn collect(table_id: String, dataset: &Dataset, warnings: &mut Vec<String>) -> Self {
        let mut draft = Self {
            table_id,
            identifier: dataset.identifier.clone(),
            title: dataset.title.clone(),
            connection_point: None,
            anchor_identifier: None,
            grain: dataset.anchor.attribute.grain.clone(),
            columns: IndexMap::new(),
            time_facts: VecDeque::new(),
            grain_index: GrainIndex::default(),
        };

        let anchor = &dataset.anchor.attribute;
        if anchor.labels.is_empty() {
            draft.anchor_identifier = Some(anchor.identifier.clone());
        } else {
            draft.connection_point = Some(anchor.identifier.clone());
            draft.add_attribute(anchor, true, warnings);
        }

        for node in &dataset.attributes {
            draft.add_attribute(&node.attribute, false, warnings);
        }

        for node in &dataset.facts {
            let fact = &node.fact;
            if fact.identifier.starts_with(TIME_FACT_PREFIX) {
                draft
                    .time_facts
                    .push_back((fact.identifier.clone(), fact.title.clone()));
                continue;
            }
            let mut column = ColumnDefinition::new(ColumnKind::Fact)
                .with_title(&fact.title)
                .with_identifier(&fact.identifier);
            set_data_type(&mut column, fact.data_type.as_deref());
            draft.insert(format!("f_{}", slug(&fact.title)), column, warnings);
        }

        for reference in &dataset.references {
            let column = ColumnDefinition::new(ColumnKind::Reference(ReferenceColumn {
                schema_reference: reference.clone(),
                multivalue: false,
            }));
            draft.insert(slug(reference), column, warnings);
        }

        draft
    }

    /// Add an attribute column followed by its non-default labels.
    fn add_attribute(&mut self, attribute: &Attribute, is_anchor: bool, warnings: &mut Vec<String>) {
        let default = default_label(attribute);
        let sort = attribute.sort_order.as_ref().map(|s| &s.attribute_sort_order);
        let options = AttributeColumn {
            identifier_label: default.map(String::from),
            sort_label: sort.map(|s| s.label.clone()),
            sort_order: sort.map(|s| s.direction),
        };

        let (prefix, kind) = if is_anchor {
            ("cp_", ColumnKind::ConnectionPoint(options))
        } else {
            ("a_", ColumnKind::Attribute(options))
        };
        let mut column = ColumnDefinition::new(kind)
            .with_title(&attribute.title)
            .with_identifier(&attribute.identifier);
        if let Some(label) = default.and_then(|id| attribute.label(id)) {
            set_data_type(&mut column, label.data_type.as_deref());
        }
        self.insert(format!("{}{}", prefix, slug(&attribute.title)), column, warnings);

        for node in &attribute.labels {
            let label = &node.label;
            if Some(label.identifier.as_str()) == default {
                continue;
            }
            let reference = LabelColumn {
                reference: attribute.identifier.clone(),
            };
            let kind = match label.label_type {
                LabelType::Link => ColumnKind::Hyperlink(reference),
                LabelType::Text => ColumnKind::Label(reference),
            };
            let mut column = ColumnDefinition::new(kind)
                .with_title(&label.title)
                .with_identifier(&label.identifier);
            set_data_type(&mut column, label.data_type.as_deref());
            self.insert(slug(&label.title), column, warnings);
        }
    }

    /// Insert `column` under `name`, suffixing the name if it is taken.
    fn insert(&mut self, name: String, column: ColumnDefinition, warnings: &mut Vec<String>) {
        let mut unique = name.clone();
        let mut n = 2;
        while self.columns.contains_key(&unique) {
            unique = format!("{}_{}", name, n);
            n += 1;
        }
        if unique != name {
            warn(
                warnings,
                format!(
                    "Column name '{}' of dataset '{}' is already taken, using '{}'",
                    name, self.identifier, unique
                ),
            );
        }
        self.columns.insert(unique, column);
    }

    /// Wire identifier → column name, for attributes, their default labels and labels.
    fn dictionary(&self) -> HashMap<String, String> {
        let mut dictionary = HashMap::new();
        for (name, column) in &self.columns {
            if let Some(identifier) = column.identifier() {
                dictionary.insert(identifier.to_string(), name.clone());
            }
            if let ColumnKind::ConnectionPoint(options) | ColumnKind::Attribute(options) = &column.kind {
                if let Some(label) = &options.identifier_label {
                    dictionary.insert(label.clone(), name.clone());
                }
            }
        }
        dictionary
    }

    fn resolve_labels(&mut self, warnings: &mut Vec<String>) {
        let dictionary = self.dictionary();
        for column in self.columns.values_mut() {
            match &mut column.kind {
                ColumnKind::Label(label) | ColumnKind::Hyperlink(label) => {
                    if let Some(name) = dictionary.get(&label.reference) {
                        label.reference = name.clone();
                    }
                }
                ColumnKind::ConnectionPoint(options) | ColumnKind::Attribute(options) => {
                    let Some(sort_label) = options.sort_label.take() else {
                        continue;
                    };
                    match dictionary.get(&sort_label) {
                        Some(name) => options.sort_label = Some(name.clone()),
                        None => {
                            options.sort_order = None;
                            warn(
                                warnings,
                                format!(
                                    "Sort label '{}' could not be set, its label was not found",
                                    sort_label
                                ),
                            );
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn resolve_references(
        &self,
        dimensions: &HashMap<&str, &str>,
        connection_points: &HashMap<&str, (&str, &str)>,
        multivalue: &HashSet<&str>,
    ) -> ReadResult<Vec<(String, ReferenceTarget)>> {
        let mut resolved = Vec::new();
        for (name, column) in &self.columns {
            let ColumnKind::Reference(reference) = &column.kind else {
                continue;
            };
            let target = reference.schema_reference.as_str();
            let outcome = if let Some(title) = dimensions.get(target) {
                ReferenceTarget::Date {
                    identifier: target.to_string(),
                    dimension: title.to_string(),
                }
            } else if let Some((table_id, connection)) = connection_points.get(target) {
                ReferenceTarget::Table {
                    table_id: table_id.to_string(),
                    connection: connection.to_string(),
                    multivalue: multivalue.contains(connection),
                }
            } else if target.starts_with(TIME_DATASET_PREFIX) {
                ReferenceTarget::TimeDataset
            } else {
                return Err(ReadError::UnresolvedReference {
                    reference: target.to_string(),
                    dataset: self.identifier.clone(),
                });
            };
            resolved.push((name.clone(), outcome));
        }
        Ok(resolved)
    }

    fn apply_references(
        &mut self,
        references: Vec<(String, ReferenceTarget)>,
        dimensions: &IndexMap<String, DateDimensionDefinition>,
        warnings: &mut Vec<String>,
    ) {
        for (name, outcome) in references {
            match outcome {
                ReferenceTarget::TimeDataset => {
                    self.columns.shift_remove(&name);
                }
                ReferenceTarget::Date {
                    identifier,
                    dimension,
                } => {
                    self.grain_index.add_date_dimension(&identifier, &name);
                    let time_fact = dimensions
                        .get(&dimension)
                        .filter(|d| d.include_time)
                        .and_then(|_| self.time_facts.pop_front());
                    let Some(column) = self.columns.get_mut(&name) else {
                        continue;
                    };
                    column.kind = ColumnKind::Date(DateColumn {
                        date_dimension: dimension,
                        format: Some(DEFAULT_DATE_FORMAT.to_string()),
                        identifier_time_fact: time_fact.as_ref().map(|(id, _)| id.clone()),
                    });
                    if let Some((_, title)) = time_fact {
                        column.title = Some(
                            title
                                .strip_suffix(TIME_FACT_TITLE_SUFFIX)
                                .unwrap_or(&title)
                                .to_string(),
                        );
                    }
                }
                ReferenceTarget::Table {
                    table_id,
                    connection,
                    multivalue,
                } => {
                    self.grain_index.add_reference(&connection, &name);
                    if let Some(column) = self.columns.get_mut(&name) {
                        column.kind = ColumnKind::Reference(ReferenceColumn {
                            schema_reference: table_id,
                            multivalue,
                        });
                    }
                }
            }
        }

        while let Some((identifier, _)) = self.time_facts.pop_front() {
            warn(
                warnings,
                format!(
                    "Time fact '{}' of dataset '{}' has no matching date column, skipped",
                    identifier, self.identifier
                ),
            );
        }
    }

    /// Translate the grain and produce the final table.
    fn finish(mut self, warnings: &mut Vec<String>) -> (String, TableDefinition) {
        for (name, column) in &self.columns {
            if let (ColumnKind::Attribute(_), Some(identifier)) = (&column.kind, column.identifier()) {
                self.grain_index.add_attribute(identifier, name);
            }
        }
        let grain = grain_from_wire(&self.identifier, &self.grain, &self.grain_index, warnings);

        (
            self.table_id,
            TableDefinition {
                title: Some(self.title),
                identifier: Some(self.identifier),
                anchor_identifier: self.anchor_identifier,
                columns: self.columns,
                grain,
                disabled: false,
            },
        )
    }
}

/// Default label of an attribute: the declared one, else the last text
/// label, else the first label.
fn default_label(attribute: &Attribute) -> Option<&str> {
    if let Some(label) = attribute.default_label.as_deref() {
        return Some(label);
    }
    let labels = || attribute.labels.iter().map(|n| &n.label);
    labels()
        .filter(|l| l.label_type == LabelType::Text)
        .last()
        .or_else(|| labels().next())
        .map(|l: &Label| l.identifier.as_str())
}

fn set_data_type(column: &mut ColumnDefinition, wire: Option<&str>) {
    if let Some(wire) = wire.filter(|w| !w.is_empty()) {
        let (data_type, size) = parse_data_type(wire);
        column.data_type = Some(data_type);
        column.data_type_size = size;
    }
}

fn table_id_for(prefix: Option<&str>, dataset: &Dataset) -> String {
    let mut base = slug(&dataset.title);
    if base.is_empty() {
        base = slug(&dataset.identifier);
    }
    match prefix.filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{}.{}", prefix, base),
        None => base,
    }
}

fn unique_table_id(taken: &mut HashSet<String>, base: String, warnings: &mut Vec<String>) -> String {
    let mut unique = base.clone();
    let mut n = 2;
    while taken.contains(&unique) {
        unique = format!("{}_{}", base, n);
        n += 1;
    }
    if unique != base {
        warn(
            warnings,
            format!("Table id '{}' is already taken, using '{}'", base, unique),
        );
    }
    taken.insert(unique.clone());
    unique
}
