//! Configuration-side model of the writer.
//!
//! These are the flat, type-tagged structures users write in the writer
//! configuration and that the model reader produces:
//!
//! - [`ProjectDefinition`] - All tables and date dimensions of a project
//! - [`TableDefinition`] - One table with its ordered columns and grain
//! - [`ColumnDefinition`] - One column, tagged by [`ColumnKind`]
//! - [`DateDimensionDefinition`] - A shared date dimension
//!
//! Column order is significant (it drives attribute, fact and reference
//! order in the generated model), so ordered maps are used throughout.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// =============================================================================
// Project
// =============================================================================

/// Everything the model builder needs: every table (disabled ones included,
/// so cross-table references resolve) and every date dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectDefinition {
    /// Tables keyed by table id.
    #[serde(default, alias = "dataSets")]
    pub tables: IndexMap<String, TableDefinition>,

    /// Date dimensions keyed by dimension name.
    #[serde(default, alias = "dateDimensions")]
    pub dimensions: IndexMap<String, DateDimensionDefinition>,
}

impl ProjectDefinition {
    pub fn table(&self, table_id: &str) -> Option<&TableDefinition> {
        self.tables.get(table_id)
    }

    pub fn dimension(&self, name: &str) -> Option<&DateDimensionDefinition> {
        self.dimensions.get(name)
    }
}

// =============================================================================
// Table
// =============================================================================

/// A single table of the writer configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Dataset identifier override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    /// Identifier of the synthetic anchor when the table has no connection point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_identifier: Option<String>,

    #[serde(default)]
    pub columns: IndexMap<String, ColumnDefinition>,

    /// Column names forming the composite natural key.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grain: Vec<String>,

    /// Excluded from the current load; still part of the model.
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
}

impl TableDefinition {
    /// Title or, when missing, the table id.
    pub fn title_or<'a>(&'a self, table_id: &'a str) -> &'a str {
        non_empty(self.title.as_deref()).unwrap_or(table_id)
    }

    /// Name, definition and attribute options of the CONNECTION_POINT column.
    pub fn connection_point(&self) -> Option<(&str, &ColumnDefinition, &AttributeColumn)> {
        self.columns.iter().find_map(|(name, c)| match &c.kind {
            ColumnKind::ConnectionPoint(a) => Some((name.as_str(), c, a)),
            _ => None,
        })
    }

    pub fn has_facts(&self) -> bool {
        self.columns
            .values()
            .any(|c| matches!(c.kind, ColumnKind::Fact))
    }
}

// =============================================================================
// Column
// =============================================================================

/// One column: the overrides shared by every role plus the role itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    /// Base data type, e.g. `VARCHAR` or `DECIMAL`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,

    /// Size part, e.g. `255` or `12,2`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type_size: Option<String>,

    #[serde(flatten)]
    pub kind: ColumnKind,
}

impl ColumnDefinition {
    pub fn new(kind: ColumnKind) -> Self {
        Self {
            title: None,
            identifier: None,
            data_type: None,
            data_type_size: None,
            kind,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_data_type(mut self, data_type: impl Into<String>, size: Option<&str>) -> Self {
        self.data_type = Some(data_type.into());
        self.data_type_size = size.map(String::from);
        self
    }

    /// Title or, when missing, the column name.
    pub fn title_or<'a>(&'a self, name: &'a str) -> &'a str {
        non_empty(self.title.as_deref()).unwrap_or(name)
    }

    /// Explicit identifier, ignoring empty strings.
    pub fn identifier(&self) -> Option<&str> {
        non_empty(self.identifier.as_deref())
    }

    /// Wire `dataType` string, see [`column_data_type`].
    pub fn wire_data_type(&self) -> Option<String> {
        column_data_type(self.data_type.as_deref(), self.data_type_size.as_deref())
    }
}

/// Role of a column, serialized as the `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnKind {
    /// Primary key attribute of the table.
    ConnectionPoint(AttributeColumn),
    Attribute(AttributeColumn),
    Fact,
    Label(LabelColumn),
    Hyperlink(LabelColumn),
    /// Foreign key to another table's connection point.
    Reference(ReferenceColumn),
    /// Foreign key to a date dimension.
    Date(DateColumn),
    /// Dropped before modeling.
    Ignore,
}

impl ColumnKind {
    /// Configuration name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::ConnectionPoint(_) => "CONNECTION_POINT",
            ColumnKind::Attribute(_) => "ATTRIBUTE",
            ColumnKind::Fact => "FACT",
            ColumnKind::Label(_) => "LABEL",
            ColumnKind::Hyperlink(_) => "HYPERLINK",
            ColumnKind::Reference(_) => "REFERENCE",
            ColumnKind::Date(_) => "DATE",
            ColumnKind::Ignore => "IGNORE",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeColumn {
    /// Default label identifier override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier_label: Option<String>,

    /// Column name of the label used for sorting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelColumn {
    /// Name of the ATTRIBUTE or CONNECTION_POINT column this label belongs to.
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceColumn {
    /// Id of the referenced table.
    pub schema_reference: String,

    /// Many-to-many reference.
    #[serde(default, skip_serializing_if = "is_false")]
    pub multivalue: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateColumn {
    /// Name of the date dimension.
    pub date_dimension: String,

    /// Source value format, e.g. `yyyy-MM-dd`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Time-of-day fact identifier override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier_time_fact: Option<String>,
}

/// Attribute sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

// =============================================================================
// Date Dimension
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateDimensionDefinition {
    /// Adds a time-of-day dataset next to the dimension.
    #[serde(default)]
    pub include_time: bool,

    /// Calendar variant; absent means the platform default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

// =============================================================================
// Data Types
// =============================================================================

static DATA_TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_ ]*?)\s*\(\s*([^)]*?)\s*\)\s*$")
        .expect("Invalid data type regex")
});

/// Combine a data type and its size into the wire form: `TYPE` or `TYPE(size)`.
///
/// Returns `None` when no type is set; a size without a type is ignored.
pub fn column_data_type(data_type: Option<&str>, size: Option<&str>) -> Option<String> {
    let data_type = non_empty(data_type)?;
    Some(match non_empty(size) {
        Some(size) => format!("{}({})", data_type, size),
        None => data_type.to_string(),
    })
}

/// Split a wire data type back into `(TYPE, size)`.
///
/// ```
/// use gdwriter::models::parse_data_type;
///
/// assert_eq!(parse_data_type("VARCHAR(255)"), ("VARCHAR".to_string(), Some("255".to_string())));
/// assert_eq!(parse_data_type("decimal(12,2)"), ("DECIMAL".to_string(), Some("12,2".to_string())));
/// assert_eq!(parse_data_type("INT"), ("INT".to_string(), None));
/// ```
pub fn parse_data_type(wire: &str) -> (String, Option<String>) {
    let upper = wire.trim().to_uppercase();
    match DATA_TYPE_RE.captures(&upper) {
        Some(caps) => {
            let size = caps[2].to_string();
            (caps[1].to_string(), if size.is_empty() { None } else { Some(size) })
        }
        None => (upper, None),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_data_type() {
        assert_eq!(
            column_data_type(Some("DECIMAL"), Some("12,2")),
            Some("DECIMAL(12,2)".to_string())
        );
        assert_eq!(column_data_type(Some("INT"), None), Some("INT".to_string()));
        assert_eq!(column_data_type(Some("INT"), Some("")), Some("INT".to_string()));
        assert_eq!(column_data_type(None, Some("255")), None);
    }

    #[test]
    fn test_parse_data_type() {
        assert_eq!(
            parse_data_type("VARCHAR(255)"),
            ("VARCHAR".to_string(), Some("255".to_string()))
        );
        assert_eq!(
            parse_data_type("DECIMAL( 12,2 )"),
            ("DECIMAL".to_string(), Some("12,2".to_string()))
        );
        assert_eq!(parse_data_type("date"), ("DATE".to_string(), None));
    }

    #[test]
    fn test_column_kinds_deserialize() {
        let table: TableDefinition = serde_json::from_value(json!({
            "title": "Products",
            "columns": {
                "id": { "type": "CONNECTION_POINT", "title": "Id", "identifierLabel": "label.custom" },
                "name": { "type": "ATTRIBUTE", "sortLabel": "url", "sortOrder": "DESC" },
                "url": { "type": "HYPERLINK", "reference": "name" },
                "price": { "type": "FACT", "dataType": "DECIMAL", "dataTypeSize": "12,2" },
                "category": { "type": "REFERENCE", "schemaReference": "categories", "multivalue": true },
                "created": { "type": "DATE", "dateDimension": "Created", "format": "yyyy-MM-dd" },
                "junk": { "type": "IGNORE" }
            }
        }))
        .unwrap();

        let kinds: Vec<&str> = table.columns.values().map(|c| c.kind.as_str()).collect();
        assert_eq!(
            kinds,
            ["CONNECTION_POINT", "ATTRIBUTE", "HYPERLINK", "FACT", "REFERENCE", "DATE", "IGNORE"]
        );

        match &table.columns["id"].kind {
            ColumnKind::ConnectionPoint(a) => {
                assert_eq!(a.identifier_label.as_deref(), Some("label.custom"))
            }
            other => panic!("unexpected kind {:?}", other),
        }
        match &table.columns["name"].kind {
            ColumnKind::Attribute(a) => {
                assert_eq!(a.sort_label.as_deref(), Some("url"));
                assert_eq!(a.sort_order, Some(SortOrder::Desc));
            }
            other => panic!("unexpected kind {:?}", other),
        }
        match &table.columns["category"].kind {
            ColumnKind::Reference(r) => assert!(r.multivalue),
            other => panic!("unexpected kind {:?}", other),
        }
        assert_eq!(
            table.columns["price"].wire_data_type().as_deref(),
            Some("DECIMAL(12,2)")
        );
        assert_eq!(table.connection_point().map(|(n, _, _)| n), Some("id"));
        assert!(table.has_facts());
    }

    #[test]
    fn test_column_serializes_flat() {
        let column = ColumnDefinition::new(ColumnKind::Reference(ReferenceColumn {
            schema_reference: "customers".into(),
            multivalue: false,
        }))
        .with_title("Customer");

        let value = serde_json::to_value(&column).unwrap();
        assert_eq!(
            value,
            json!({ "title": "Customer", "type": "REFERENCE", "schemaReference": "customers" })
        );
    }

    #[test]
    fn test_project_accepts_legacy_keys() {
        let project: ProjectDefinition = serde_json::from_value(json!({
            "dataSets": { "t": { "columns": {} } },
            "dateDimensions": { "Date": { "includeTime": true } }
        }))
        .unwrap();
        assert!(project.table("t").is_some());
        assert!(project.dimension("Date").unwrap().include_time);
    }

    #[test]
    fn test_titles_fall_back_to_names() {
        let table = TableDefinition::default();
        assert_eq!(table.title_or("orders"), "orders");
        let column = ColumnDefinition::new(ColumnKind::Fact).with_title("");
        assert_eq!(column.title_or("amount"), "amount");
    }
}
