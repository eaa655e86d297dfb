//! Defines [`PageData`], everything the presentation layer needs to render a
//! project detail page, and [`assemble`], the pure step that builds it.

use crate::join::Joined;
use crate::probe::AssetProbeResult;
use crate::project::{ProjectId, ProjectStatus};
use serde::Serialize;

/// The data for one project detail page. It is identical for every locale.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PageData {
    pub project_id: ProjectId,
    pub name: String,

    /// The rendered description HTML.
    pub description: String,

    pub status: ProjectStatus,

    /// Completion as a whole percentage.
    pub progress: Option<i64>,

    /// Area in whole square kilometers.
    pub area: i64,

    pub contributors: Option<u64>,
    pub geometry: Option<serde_json::Value>,
    pub history: Option<String>,

    /// One entry per download artifact, in catalogue order.
    pub downloads: Vec<AssetProbeResult>,
}

/// Combines the joined records, the rendered description and the probe
/// results into a [`PageData`], normalizing the numeric fields.
pub fn assemble(
    joined: Joined<'_>,
    description: String,
    downloads: Vec<AssetProbeResult>,
) -> PageData {
    let summary = joined.summary;
    PageData {
        project_id: summary.id.clone(),
        name: summary.name.clone(),
        description,
        status: summary.status,
        progress: progress_percent(summary.progress),
        area: rounded_area(summary.area),
        contributors: summary.contributors,
        geometry: joined.geometry.cloned(),
        history: joined.history.map(str::to_owned),
        downloads,
    }
}

/// Converts a completion fraction into a whole percentage. Absence is
/// preserved.
pub fn progress_percent(fraction: Option<f64>) -> Option<i64> {
    fraction.map(|f| round_half_up(f * 100.0))
}

/// Rounds an area to whole square kilometers; a missing area is 0.
pub fn rounded_area(area: Option<f64>) -> i64 {
    round_half_up(area.unwrap_or(0.0))
}

// Halves round towards positive infinity (2.5 -> 3, -2.5 -> -2).
fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}
