//! Wire-side model: the project model document of the platform's modeling API.
//!
//! ```text
//! {"projectModel": {"datasets": [{"dataset": {...}}], "dateDimensions": [{"dateDimension": {...}}]},
//!  "multivalueAttributes": ["attr...."]}
//! ```
//!
//! Field names are fixed by the platform. Empty lists and unset optional
//! fields are omitted when serializing.

pub mod identifiers;
pub mod time;

use serde::{Deserialize, Serialize};

pub use crate::models::SortOrder;

/// Top-level document exchanged with the modeling API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectModelDocument {
    pub project_model: ProjectModel,

    /// Connection attributes referenced with many-to-many semantics.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub multivalue_attributes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectModel {
    #[serde(default)]
    pub datasets: Vec<DatasetNode>,

    #[serde(default)]
    pub date_dimensions: Vec<DateDimensionNode>,
}

impl ProjectModel {
    pub fn dataset(&self, identifier: &str) -> Option<&Dataset> {
        self.datasets
            .iter()
            .map(|d| &d.dataset)
            .find(|d| d.identifier == identifier)
    }
}

// =============================================================================
// Dataset
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetNode {
    pub dataset: Dataset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub identifier: String,
    pub title: String,

    /// Connection point attribute, explicit or synthetic.
    pub anchor: AttributeNode,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facts: Vec<FactNode>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeNode>,

    /// Identifiers of referenced datasets and date dimensions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

// =============================================================================
// Attribute / Label
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeNode {
    pub attribute: Attribute,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub identifier: String,
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<LabelNode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrderNode>,

    /// Composite key of an anchor without a connection point.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grain: Vec<GrainEntry>,
}

impl Attribute {
    /// Bare attribute with only identifier and title.
    pub fn new(identifier: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            default_label: None,
            folder: None,
            deprecated: None,
            labels: Vec::new(),
            sort_order: None,
            grain: Vec::new(),
        }
    }

    pub fn label(&self, identifier: &str) -> Option<&Label> {
        self.labels
            .iter()
            .map(|l| &l.label)
            .find(|l| l.identifier == identifier)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelNode {
    pub label: Label,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub identifier: String,
    pub title: String,

    #[serde(rename = "type")]
    pub label_type: LabelType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelType {
    #[serde(rename = "GDC.text")]
    Text,
    #[serde(rename = "GDC.link")]
    Link,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortOrderNode {
    pub attribute_sort_order: AttributeSortOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSortOrder {
    /// Identifier of the label to sort by.
    pub label: String,
    pub direction: SortOrder,
}

/// One part of a grain: an attribute (own or referenced connection point)
/// or a date dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GrainEntry {
    Attribute(String),
    DateDimension(String),
}

// =============================================================================
// Fact
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactNode {
    pub fact: Fact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fact {
    pub identifier: String,
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

// =============================================================================
// Date Dimension
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateDimensionNode {
    pub date_dimension: DateDimension,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateDimension {
    /// Dimension identifier.
    pub name: String,
    /// Human-readable dimension name.
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_shape() {
        let doc: ProjectModelDocument = serde_json::from_value(json!({
            "projectModel": {
                "datasets": [{
                    "dataset": {
                        "identifier": "dataset.orders",
                        "title": "Orders",
                        "anchor": { "attribute": {
                            "identifier": "attr.orders.factsof",
                            "title": "Records of Orders",
                            "grain": [{ "attribute": "attr.orders.code" }, { "dateDimension": "created" }]
                        }},
                        "facts": [{ "fact": { "identifier": "fact.orders.total", "title": "Total", "dataType": "DECIMAL(12,2)" } }],
                        "attributes": [{ "attribute": {
                            "identifier": "attr.orders.code",
                            "title": "Code",
                            "defaultLabel": "label.orders.code",
                            "labels": [{ "label": { "identifier": "label.orders.code", "title": "Code", "type": "GDC.text" } }],
                            "sortOrder": { "attributeSortOrder": { "label": "label.orders.code", "direction": "DESC" } }
                        }}],
                        "references": ["created"]
                    }
                }],
                "dateDimensions": [{ "dateDimension": { "name": "created", "title": "Created" } }]
            },
            "multivalueAttributes": ["attr.tags.id"]
        }))
        .unwrap();

        let orders = doc.project_model.dataset("dataset.orders").unwrap();
        assert_eq!(
            orders.anchor.attribute.grain,
            vec![
                GrainEntry::Attribute("attr.orders.code".into()),
                GrainEntry::DateDimension("created".into())
            ]
        );
        let code = &orders.attributes[0].attribute;
        assert_eq!(code.label("label.orders.code").unwrap().label_type, LabelType::Text);
        assert_eq!(
            code.sort_order.as_ref().unwrap().attribute_sort_order.direction,
            SortOrder::Desc
        );
        assert_eq!(doc.multivalue_attributes, vec!["attr.tags.id".to_string()]);
    }

    #[test]
    fn test_empty_parts_are_omitted() {
        let dataset = Dataset {
            identifier: "dataset.t".into(),
            title: "t".into(),
            anchor: AttributeNode {
                attribute: Attribute::new("attr.t.factsof", "Records of t"),
            },
            facts: Vec::new(),
            attributes: Vec::new(),
            references: Vec::new(),
        };
        let value = serde_json::to_value(&dataset).unwrap();
        assert_eq!(
            value,
            json!({
                "identifier": "dataset.t",
                "title": "t",
                "anchor": { "attribute": { "identifier": "attr.t.factsof", "title": "Records of t" } }
            })
        );

        let doc = ProjectModelDocument::default();
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({ "projectModel": { "datasets": [], "dateDimensions": [] } })
        );
    }
}
