//! Defines the records read from the remote project datasets: the
//! [`ProjectSummary`] catalogue entries, [`GeometryRecord`]s and
//! [`HistoryRecord`]s, all keyed by [`ProjectId`]. The catalogue and
//! geometry datasets are GeoJSON feature collections, so this module also
//! defines the minimal [`FeatureCollection`] shape needed to read them.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The stable key naming one project across every dataset. Upstream
/// datasets occasionally encode it as a number, so both strings and
/// integers are accepted when deserializing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> ProjectId {
        ProjectId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ProjectId {
    fn from(id: &str) -> ProjectId {
        ProjectId::new(id)
    }
}

impl<'de> Deserialize<'de> for ProjectId {
    fn deserialize<D>(deserializer: D) -> Result<ProjectId, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Integer(i64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(s) if s.is_empty() => {
                Err(de::Error::custom("project identifier is empty"))
            }
            Raw::Text(s) => Ok(ProjectId(s)),
            Raw::Integer(i) => Ok(ProjectId(i.to_string())),
        }
    }
}

/// The lifecycle state of a project. Statuses this crate doesn't know about
/// deserialize as [`ProjectStatus::Unknown`] rather than failing the
/// catalogue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Draft,
    Active,
    Finished,
    Archived,
    Inactive,
    #[serde(other)]
    Unknown,
}

impl ProjectStatus {
    /// The status as it appears in the datasets.
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Draft => "draft",
            ProjectStatus::Active => "active",
            ProjectStatus::Finished => "finished",
            ProjectStatus::Archived => "archived",
            ProjectStatus::Inactive => "inactive",
            ProjectStatus::Unknown => "unknown",
        }
    }
}

impl Default for ProjectStatus {
    fn default() -> Self {
        ProjectStatus::Unknown
    }
}

/// One entry of the project catalogue, read from the properties of a
/// centroid feature.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ProjectSummary {
    #[serde(rename = "project_id")]
    pub id: ProjectId,

    pub name: String,

    #[serde(default)]
    pub status: ProjectStatus,

    /// Completion as a fraction between 0 and 1.
    #[serde(default)]
    pub progress: Option<f64>,

    /// Project area in square kilometers.
    #[serde(default, rename = "area_sqkm")]
    pub area: Option<f64>,

    #[serde(
        default,
        rename = "number_of_users",
        deserialize_with = "deserialize_count"
    )]
    pub contributors: Option<u64>,

    /// The raw description: markdown, optionally preceded by frontmatter.
    #[serde(default, rename = "project_details")]
    pub description: Option<String>,
}

/// A project's boundary. There is at most one per project and projects
/// without a drawn boundary simply have none.
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryRecord {
    pub id: ProjectId,

    /// A GeoJSON `Polygon` or `MultiPolygon` geometry object.
    pub geometry: serde_json::Value,
}

/// The contribution history of a project. The payload is passed through to
/// the page untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryRecord {
    pub id: ProjectId,
    pub payload: String,
}

/// A GeoJSON feature collection with typed feature properties.
#[derive(Deserialize)]
pub struct FeatureCollection<P> {
    pub features: Vec<Feature<P>>,
}

/// A GeoJSON feature. The geometry is kept as raw JSON since it is only
/// ever passed through.
#[derive(Deserialize)]
pub struct Feature<P> {
    pub properties: P,

    #[serde(default)]
    pub geometry: Option<serde_json::Value>,
}

/// The only property the geometry dataset needs to carry.
#[derive(Deserialize)]
pub struct GeometryProperties {
    #[serde(default)]
    pub project_id: Option<ProjectId>,
}

// Counts sometimes arrive as floats (`12.0`) from tabular exports. Whole,
// non-negative floats are accepted; anything else is rejected.
fn deserialize_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<f64>::deserialize(deserializer)? {
        None => Ok(None),
        Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= u64::MAX as f64 => {
            Ok(Some(n as u64))
        }
        Some(n) => Err(de::Error::custom(format!(
            "contributor count must be a non-negative integer, got {}",
            n
        ))),
    }
}
