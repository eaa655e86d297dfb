//! The fixed catalogue of downloadable result artifacts published for every
//! project on the results host.

use crate::url::{TemplateError, UrlTemplate, PLACEHOLDER};
use serde::Serialize;
use url::Url;

/// The results host used when none is configured.
pub const DEFAULT_RESULTS_HOST: &str = "https://apps.mapswipe.org/api/";

/// A display hint for the kind of file an artifact is. It is not verified
/// against the content actually served.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Geojson,
    Csv,
}

impl FileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Geojson => "geojson",
            FileKind::Csv => "csv",
        }
    }
}

/// The closed set of artifacts published for a project.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    AggregatedResults,
    AggregatedResultsWithGeometry,
    HotTaskingManagerGeometries,
    ModerateToHighAgreementYesMaybeGeometries,
    Groups,
    History,
    Results,
    Tasks,
    Users,
    AreaOfInterest,
}

impl Artifact {
    /// Every artifact, in the order they are listed on a page.
    pub const ALL: [Artifact; 10] = [
        Artifact::AggregatedResults,
        Artifact::AggregatedResultsWithGeometry,
        Artifact::HotTaskingManagerGeometries,
        Artifact::ModerateToHighAgreementYesMaybeGeometries,
        Artifact::Groups,
        Artifact::History,
        Artifact::Results,
        Artifact::Tasks,
        Artifact::Users,
        Artifact::AreaOfInterest,
    ];

    /// The artifact's name as written to page data.
    pub fn as_str(self) -> &'static str {
        match self {
            Artifact::AggregatedResults => "aggregated_results",
            Artifact::AggregatedResultsWithGeometry => "aggregated_results_with_geometry",
            Artifact::HotTaskingManagerGeometries => "hot_tasking_manager_geometries",
            Artifact::ModerateToHighAgreementYesMaybeGeometries => {
                "moderate_to_high_agreement_yes_maybe_geometries"
            }
            Artifact::Groups => "groups",
            Artifact::History => "history",
            Artifact::Results => "results",
            Artifact::Tasks => "tasks",
            Artifact::Users => "users",
            Artifact::AreaOfInterest => "area_of_interest",
        }
    }

    pub fn file_kind(self) -> FileKind {
        match self {
            Artifact::AggregatedResultsWithGeometry
            | Artifact::HotTaskingManagerGeometries
            | Artifact::ModerateToHighAgreementYesMaybeGeometries
            | Artifact::AreaOfInterest => FileKind::Geojson,
            Artifact::AggregatedResults
            | Artifact::Groups
            | Artifact::History
            | Artifact::Results
            | Artifact::Tasks
            | Artifact::Users => FileKind::Csv,
        }
    }

    /// The artifact's path below the results host, with the placeholder.
    fn path(self) -> String {
        let (dir, file) = match self {
            Artifact::AggregatedResults => ("agg_results", "agg_results_{}.csv.gz"),
            Artifact::AggregatedResultsWithGeometry => {
                ("agg_results", "agg_results_{}_geom.geojson.gz")
            }
            Artifact::HotTaskingManagerGeometries => ("hot_tm", "hot_tm_{}.geojson"),
            Artifact::ModerateToHighAgreementYesMaybeGeometries => {
                ("yes_maybe", "yes_maybe_{}.geojson")
            }
            Artifact::Groups => ("groups", "groups_{}.csv.gz"),
            Artifact::History => ("history", "history_{}.csv"),
            Artifact::Results => ("results", "results_{}.csv.gz"),
            Artifact::Tasks => ("tasks", "tasks_{}.csv.gz"),
            Artifact::Users => ("users", "users_{}.csv.gz"),
            Artifact::AreaOfInterest => ("project_geometries", "project_geom_{}.geojson"),
        };
        format!("{}/{}", dir, file.replacen("{}", PLACEHOLDER, 1))
    }
}

/// One downloadable artifact: what it is and where to find it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DownloadDescriptor {
    pub name: Artifact,
    pub file_kind: FileKind,
    pub url_template: UrlTemplate,
}

/// The descriptors for all of [`Artifact::ALL`], in that order.
#[derive(Clone, Debug, PartialEq)]
pub struct DownloadCatalogue(Vec<DownloadDescriptor>);

impl DownloadCatalogue {
    /// Builds the catalogue for artifacts published below `results_host`.
    pub fn new(results_host: &Url) -> Result<DownloadCatalogue, TemplateError> {
        // Templates are assembled as text: `Url::join` would percent-encode
        // the placeholder braces.
        let host = results_host.as_str();
        let separator = if host.ends_with('/') { "" } else { "/" };
        Artifact::ALL
            .iter()
            .map(|&name| {
                Ok(DownloadDescriptor {
                    name,
                    file_kind: name.file_kind(),
                    url_template: UrlTemplate::new(format!(
                        "{}{}{}",
                        host,
                        separator,
                        name.path()
                    ))?,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(DownloadCatalogue)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DownloadDescriptor> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
