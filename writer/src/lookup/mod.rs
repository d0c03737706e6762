//! Date dimension template lookup.
//!
//! The platform only reveals a date dimension's template through the file
//! its calendar was uploaded from (`urn:<template>:<file>`). Reading a model
//! back therefore goes through a [`DateDimensionLookup`], which may be a live
//! query, a static table or a closure in tests.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{ConfigResult, LookupError, LookupResult};
use crate::logs::{log_info, log_warning};

/// Source of date dimension templates, keyed by dimension title.
pub trait DateDimensionLookup {
    fn template(&self, dimension: &str) -> LookupResult<String>;
}

impl<F> DateDimensionLookup for F
where
    F: Fn(&str) -> LookupResult<String>,
{
    fn template(&self, dimension: &str) -> LookupResult<String> {
        self(dimension)
    }
}

/// Lookup that knows no templates; every dimension degrades to none.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTemplates;

impl DateDimensionLookup for NoTemplates {
    fn template(&self, dimension: &str) -> LookupResult<String> {
        Err(LookupError::Unavailable(format!(
            "no template source configured for '{}'",
            dimension
        )))
    }
}

/// Fixed title → template table, for offline reads.
#[derive(Debug, Clone, Default)]
pub struct StaticTemplates {
    templates: HashMap<String, LookupResult<String>>,
}

impl StaticTemplates {
    /// Values starting with `urn:` are taken as upload URNs and reduced to
    /// their template. An invalid URN is logged and answers `InvalidUrn`.
    pub fn new(templates: HashMap<String, String>) -> Self {
        let templates = templates
            .into_iter()
            .map(|(dimension, value)| {
                let template = if value.starts_with("urn:") {
                    template_from_urn(&value)
                } else {
                    Ok(value)
                };
                if let Err(e) = &template {
                    log_warning(format!("Date dimension '{}': {}", dimension, e));
                }
                (dimension, template)
            })
            .collect();
        Self { templates }
    }

    /// Load a JSON object `{"<dimension title>": "<template or urn>"}`.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        let templates: HashMap<String, String> = serde_json::from_str(&content)?;
        log_info(format!(
            "Loaded {} date dimension templates from {}",
            templates.len(),
            path.display()
        ));
        Ok(Self::new(templates))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl DateDimensionLookup for StaticTemplates {
    fn template(&self, dimension: &str) -> LookupResult<String> {
        self.templates
            .get(dimension)
            .cloned()
            .unwrap_or_else(|| Err(LookupError::NotFound(dimension.to_string())))
    }
}

/// Template part of a date dimension upload URN.
///
/// ```
/// use gdwriter::lookup::template_from_urn;
///
/// assert_eq!(template_from_urn("urn:keboola:date.zip").unwrap(), "keboola");
/// assert!(template_from_urn("keboola").is_err());
/// ```
pub fn template_from_urn(urn: &str) -> LookupResult<String> {
    let parts: Vec<&str> = urn.split(':').collect();
    match parts.as_slice() {
        [_, template, _] => Ok(template.to_string()),
        _ => Err(LookupError::InvalidUrn(urn.to_string())),
    }
}
