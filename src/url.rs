//! Defines [`UrlTemplate`], a URL with a single `{project_id}` substitution
//! point. Templates are used for the per-project history source and for every
//! downloadable artifact on the results host.

use crate::project::ProjectId;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;
use url::Url;

/// The placeholder replaced by the project identifier.
pub const PLACEHOLDER: &str = "{project_id}";

/// A URL containing exactly one [`PLACEHOLDER`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    /// Validates that `template` contains exactly one placeholder.
    pub fn new(template: impl Into<String>) -> Result<UrlTemplate, TemplateError> {
        let template = template.into();
        match template.matches(PLACEHOLDER).count() {
            1 => Ok(UrlTemplate(template)),
            count => Err(TemplateError { template, count }),
        }
    }

    /// Substitutes `id` into the template and parses the result.
    pub fn expand(&self, id: &ProjectId) -> Result<Url, url::ParseError> {
        Url::parse(&self.0.replacen(PLACEHOLDER, id.as_str(), 1))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for UrlTemplate {
    fn deserialize<D>(deserializer: D) -> Result<UrlTemplate, D::Error>
    where
        D: Deserializer<'de>,
    {
        UrlTemplate::new(String::deserialize(deserializer)?)
            .map_err(|e| D::Error::custom(format!("{}", e)))
    }
}

impl Serialize for UrlTemplate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

/// Returned when a template doesn't have exactly one placeholder.
#[derive(Debug, Error)]
#[error("URL template `{template}` must contain `{{project_id}}` exactly once (found {count})")]
pub struct TemplateError {
    pub template: String,
    pub count: usize,
}
