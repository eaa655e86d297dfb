//! Joins the independently-fetched datasets for one project by identifier.

use crate::project::{GeometryRecord, HistoryRecord, ProjectId, ProjectSummary};
use thiserror::Error;

/// The records found for one project. Only the summary is required.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Joined<'a> {
    pub summary: &'a ProjectSummary,
    pub geometry: Option<&'a serde_json::Value>,
    pub history: Option<&'a str>,
}

/// Finds the records for `id` in each collection by linear scan. The first
/// match wins when a collection repeats an identifier. Fails only when there
/// is no summary for `id`.
pub fn join<'a>(
    id: &ProjectId,
    summaries: &'a [ProjectSummary],
    geometries: &'a [GeometryRecord],
    histories: &'a [HistoryRecord],
) -> Result<Joined<'a>> {
    let summary = summaries
        .iter()
        .find(|s| &s.id == id)
        .ok_or_else(|| Error::NotFound(id.clone()))?;

    Ok(Joined {
        summary,
        geometry: geometries.iter().find(|g| &g.id == id).map(|g| &g.geometry),
        history: histories
            .iter()
            .find(|h| &h.id == id)
            .map(|h| h.payload.as_str()),
    })
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failed join.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the catalogue has no summary for the requested project.
    #[error("project `{0}` not found in catalogue")]
    NotFound(ProjectId),
}
