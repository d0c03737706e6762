//! Identifier derivation for LDM objects.
//!
//! Every function here is a pure function of its arguments. The naming
//! convention is shared with projects that already exist on the platform,
//! so the output must not change:
//!
//! | Object            | Identifier                                   |
//! |-------------------|----------------------------------------------|
//! | Dataset           | `dataset.<table>`                            |
//! | Implicit anchor   | `attr.<table>.factsof`                       |
//! | Attribute / CP    | `attr.<table>.<column>`                      |
//! | Fact              | `fact.<table>.<column>`                      |
//! | Default label     | `label.<table>.<column>`                     |
//! | Secondary label   | `label.<table>.<reference>.<column>`         |
//! | Date dimension    | `<name>` or `<name>.<template>`              |
//! | Time dataset      | `dataset.time.<dimension>`                   |
//! | Time-of-day fact  | `tm.dt.<table>.<column>`                     |
//!
//! Every `<...>` part is passed through [`slug`].

use unicode_normalization::UnicodeNormalization;

/// Template used when a date dimension does not name one.
pub const DEFAULT_DATE_TEMPLATE: &str = "gooddata";

/// Prefix of the synthetic time-of-day datasets.
pub const TIME_DATASET_PREFIX: &str = "dataset.time.";

/// Prefix of the time-of-day facts attached to DATE columns.
pub const TIME_FACT_PREFIX: &str = "tm.dt.";

/// Turn a free-form name into an identifier part.
///
/// Diacritics are stripped, everything except ASCII letters, digits and `_`
/// is removed without a replacement, leading digits and underscores are
/// dropped and the result is lowercased.
///
/// Names that differ only in punctuation collide (`a.b` and `ab` both give
/// `ab`). Deployed projects rely on this exact output, so collisions are
/// detected by the builder rather than avoided here.
pub fn slug(name: &str) -> String {
    name.nfkd()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect::<String>()
        .trim_start_matches(|c: char| c.is_ascii_digit() || c == '_')
        .to_ascii_lowercase()
}

pub fn dataset_id(table_id: &str) -> String {
    format!("dataset.{}", slug(table_id))
}

pub fn implicit_anchor_id(table_id: &str) -> String {
    format!("attr.{}.factsof", slug(table_id))
}

pub fn attribute_id(table_id: &str, column: &str) -> String {
    format!("attr.{}.{}", slug(table_id), slug(column))
}

pub fn fact_id(table_id: &str, column: &str) -> String {
    format!("fact.{}.{}", slug(table_id), slug(column))
}

pub fn label_id(table_id: &str, column: &str) -> String {
    format!("label.{}.{}", slug(table_id), slug(column))
}

/// Identifier of a LABEL/HYPERLINK column bound to `reference`.
pub fn ref_label_id(table_id: &str, reference: &str, column: &str) -> String {
    format!(
        "label.{}.{}.{}",
        slug(table_id),
        slug(reference),
        slug(column)
    )
}

/// Whether `template` selects the platform's default calendar.
pub fn is_default_template(template: Option<&str>) -> bool {
    match template {
        None => true,
        Some(t) => t.is_empty() || t.eq_ignore_ascii_case(DEFAULT_DATE_TEMPLATE),
    }
}

pub fn date_dimension_id(name: &str, template: Option<&str>) -> String {
    let base = slug(name);
    match template {
        Some(t) if !is_default_template(Some(t)) => format!("{}.{}", base, slug(t)),
        _ => base,
    }
}

pub fn time_dataset_id(dimension_id: &str) -> String {
    format!("{}{}", TIME_DATASET_PREFIX, dimension_id)
}

pub fn time_fact_id(table_id: &str, column: &str) -> String {
    format!("{}{}.{}", TIME_FACT_PREFIX, slug(table_id), slug(column))
}

/// Role of a derived identifier, used by [`derive_identifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierRole<'a> {
    Dataset,
    ImplicitAnchor,
    Attribute,
    Fact,
    Label,
    /// Secondary label bound to the `reference` column.
    RefLabel { reference: &'a str },
    TimeFact,
}

/// Derive the identifier for `role` from a table id and column name.
///
/// Table-level roles ignore `column`.
pub fn derive_identifier(role: IdentifierRole<'_>, table_id: &str, column: &str) -> String {
    match role {
        IdentifierRole::Dataset => dataset_id(table_id),
        IdentifierRole::ImplicitAnchor => implicit_anchor_id(table_id),
        IdentifierRole::Attribute => attribute_id(table_id, column),
        IdentifierRole::Fact => fact_id(table_id, column),
        IdentifierRole::Label => label_id(table_id, column),
        IdentifierRole::RefLabel { reference } => ref_label_id(table_id, reference, column),
        IdentifierRole::TimeFact => time_fact_id(table_id, column),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_strips_diacritics_and_punctuation() {
        assert_eq!(slug("Products"), "products");
        assert_eq!(slug("id1.š"), "id1s");
        assert_eq!(slug("Date 1"), "date1");
        assert_eq!(slug("out.c-main.Orders"), "outcmainorders");
        assert_eq!(slug("Žluťoučký kůň"), "zlutouckykun");
    }

    #[test]
    fn test_slug_keeps_underscores_and_drops_leading_digits() {
        assert_eq!(slug("cp_name"), "cp_name");
        assert_eq!(slug("2019_sales"), "sales");
        assert_eq!(slug("__hidden"), "hidden");
    }

    #[test]
    fn test_slug_collisions_are_preserved() {
        assert_eq!(slug("a.b"), slug("ab"));
        assert_eq!(slug("a"), slug("a!"));
    }

    #[test]
    fn test_column_identifiers() {
        assert_eq!(attribute_id("products", "name"), "attr.products.name");
        assert_eq!(label_id("products", "name"), "label.products.name");
        assert_eq!(fact_id("products", "Price"), "fact.products.price");
        assert_eq!(
            ref_label_id("products", "name", "url"),
            "label.products.name.url"
        );
        assert_eq!(dataset_id("products"), "dataset.products");
        assert_eq!(implicit_anchor_id("products"), "attr.products.factsof");
        assert_eq!(time_fact_id("orders", "created"), "tm.dt.orders.created");
    }

    #[test]
    fn test_date_dimension_id_with_template() {
        assert_eq!(date_dimension_id("Date 1", None), "date1");
        assert_eq!(date_dimension_id("Date 1", Some("GoodData")), "date1");
        assert_eq!(date_dimension_id("Date 1", Some("keboola")), "date1.keboola");
        assert_eq!(date_dimension_id("Date 1", Some("")), "date1");
        assert_eq!(time_dataset_id("date1"), "dataset.time.date1");
    }

    #[test]
    fn test_derive_identifier_is_deterministic() {
        let roles = [
            IdentifierRole::Dataset,
            IdentifierRole::ImplicitAnchor,
            IdentifierRole::Attribute,
            IdentifierRole::Fact,
            IdentifierRole::Label,
            IdentifierRole::RefLabel { reference: "name" },
            IdentifierRole::TimeFact,
        ];
        for role in roles {
            let first = derive_identifier(role, "Products", "Näme");
            let second = derive_identifier(role, "Products", "Näme");
            assert_eq!(first, second);
            assert_eq!(first, first.to_ascii_lowercase());
        }
        assert_eq!(
            derive_identifier(IdentifierRole::Attribute, "products", "name"),
            "attr.products.name"
        );
    }
}
