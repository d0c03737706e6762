//! Synthetic time-of-day dataset emitted next to date dimensions with `includeTime`.

use super::identifiers::time_dataset_id;
use super::{Attribute, AttributeNode, Dataset, DatasetNode, Label, LabelNode, LabelType};

/// Build the time dataset for the date dimension `dimension_id` named `name`.
pub fn time_dimension_dataset(dimension_id: &str, name: &str) -> DatasetNode {
    let folder = format!("Time ({})", name);

    let anchor = time_attribute(dimension_id, "second.of.day", &folder, &folder);

    DatasetNode {
        dataset: Dataset {
            identifier: time_dataset_id(dimension_id),
            title: folder.clone(),
            anchor: AttributeNode { attribute: anchor },
            facts: Vec::new(),
            attributes: vec![
                AttributeNode {
                    attribute: time_attribute(
                        dimension_id,
                        "hour.of.day",
                        &format!("Hour ({})", name),
                        &folder,
                    ),
                },
                AttributeNode {
                    attribute: time_attribute(
                        dimension_id,
                        "minute.of.hour",
                        &format!("Minute ({})", name),
                        &folder,
                    ),
                },
            ],
            references: Vec::new(),
        },
    }
}

fn time_attribute(dimension_id: &str, part: &str, title: &str, folder: &str) -> Attribute {
    let label = format!("label.time.{}.{}", part, dimension_id);
    let mut attribute = Attribute::new(format!("attr.time.{}.{}", part, dimension_id), title);
    attribute.default_label = Some(label.clone());
    attribute.folder = Some(folder.to_string());
    attribute.deprecated = Some(false);
    attribute.labels = vec![LabelNode {
        label: Label {
            identifier: label,
            title: title.to_string(),
            label_type: LabelType::Text,
            data_type: None,
        },
    }];
    attribute
}
