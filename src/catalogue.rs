//! Retrieves the datasets a page is built from. The project catalogue is
//! load-bearing: if it can't be fetched or parsed the build fails. The
//! geometry and history datasets are best effort; failures are logged and
//! treated as empty collections.

use crate::fetch::{self, Remote};
use crate::project::{
    FeatureCollection, GeometryProperties, GeometryRecord, HistoryRecord, ProjectId,
    ProjectSummary,
};
use crate::url::UrlTemplate;
use thiserror::Error;
use url::Url;

/// Fetches the project catalogue (the centroid feature collection) from
/// `url`. Each feature's properties become one [`ProjectSummary`].
pub async fn fetch_catalogue<R: Remote + ?Sized>(
    remote: &R,
    url: &Url,
) -> Result<Vec<ProjectSummary>> {
    let body = remote.get(url).await?;
    let summaries = parse_catalogue(&body).map_err(|err| Error::Malformed {
        url: url.to_string(),
        err,
    })?;
    tracing::info!(url = %url, projects = summaries.len(), "fetched project catalogue");
    Ok(summaries)
}

/// Parses a catalogue feature collection.
pub fn parse_catalogue(input: &str) -> serde_json::Result<Vec<ProjectSummary>> {
    let collection: FeatureCollection<ProjectSummary> = serde_json::from_str(input)?;
    Ok(collection.features.into_iter().map(|f| f.properties).collect())
}

/// Fetches the project geometry feature collection. Any failure yields an
/// empty collection so that pages are built without maps.
pub async fn fetch_geometries<R: Remote + ?Sized>(remote: &R, url: &Url) -> Vec<GeometryRecord> {
    let body = match remote.get(url).await {
        Ok(body) => body,
        Err(err) => {
            tracing::warn!(url = %url, error = %err, "geometry dataset unavailable");
            return Vec::new();
        }
    };

    match parse_geometries(&body) {
        Ok(records) => {
            tracing::info!(url = %url, geometries = records.len(), "fetched project geometries");
            records
        }
        Err(err) => {
            tracing::warn!(url = %url, error = %err, "geometry dataset malformed");
            Vec::new()
        }
    }
}

/// Parses a geometry feature collection. Features without a project
/// identifier or without a geometry are skipped.
pub fn parse_geometries(input: &str) -> serde_json::Result<Vec<GeometryRecord>> {
    let collection: FeatureCollection<GeometryProperties> = serde_json::from_str(input)?;
    Ok(collection
        .features
        .into_iter()
        .filter_map(|feature| match (feature.properties.project_id, feature.geometry) {
            (Some(id), Some(geometry)) if !geometry.is_null() => {
                Some(GeometryRecord { id, geometry })
            }
            _ => None,
        })
        .collect())
}

/// Fetches the history of a single project. Returns an empty collection when
/// no history source is configured or the history can't be retrieved.
pub async fn fetch_history<R: Remote + ?Sized>(
    remote: &R,
    template: Option<&UrlTemplate>,
    id: &ProjectId,
) -> Vec<HistoryRecord> {
    let template = match template {
        Some(template) => template,
        None => return Vec::new(),
    };

    let url = match template.expand(id) {
        Ok(url) => url,
        Err(err) => {
            tracing::warn!(project_id = %id, error = %err, "invalid history URL");
            return Vec::new();
        }
    };

    match remote.get(&url).await {
        Ok(payload) => vec![HistoryRecord {
            id: id.clone(),
            payload,
        }],
        Err(err) => {
            tracing::warn!(project_id = %id, error = %err, "history unavailable");
            Vec::new()
        }
    }
}

/// The result of fetching the catalogue.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure to obtain the project catalogue. Both variants are
/// fatal to the build.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the catalogue can't be retrieved.
    #[error("fetching project catalogue: {0}")]
    Fetch(#[from] fetch::Error),

    /// Returned when the catalogue isn't a valid feature collection of
    /// project summaries.
    #[error("parsing project catalogue from `{url}`: {err}")]
    Malformed {
        url: String,
        #[source]
        err: serde_json::Error,
    },
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fetch::fake::FakeRemote;
    use crate::project::ProjectStatus;

    const CATALOGUE_URL: &str = "https://data.example.org/projects_centroid.geojson";
    const GEOMETRY_URL: &str = "https://data.example.org/projects.geojson";

    const CATALOGUE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [1.0, 2.0]},
                "properties": {
                    "project_id": "a",
                    "name": "Alpha",
                    "status": "finished",
                    "progress": 1.0,
                    "area_sqkm": 4.2,
                    "number_of_users": 7,
                    "project_details": "Alpha *details*"
                }
            },
            {
                "type": "Feature",
                "geometry": null,
                "properties": {"project_id": "b", "name": "Beta", "status": "draft"}
            }
        ]
    }"#;

    #[tokio::test]
    async fn test_fetch_catalogue() -> Result<()> {
        let remote = FakeRemote::new().with_body(CATALOGUE_URL, CATALOGUE);
        let summaries = fetch_catalogue(&remote, &Url::parse(CATALOGUE_URL).unwrap()).await?;

        assert_eq!(2, summaries.len());
        assert_eq!("Alpha", summaries[0].name);
        assert_eq!(ProjectStatus::Finished, summaries[0].status);
        assert_eq!(ProjectStatus::Draft, summaries[1].status);
        assert_eq!(None, summaries[1].progress);
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_catalogue_unreachable() {
        let remote = FakeRemote::new();
        let result = fetch_catalogue(&remote, &Url::parse(CATALOGUE_URL).unwrap()).await;
        assert!(matches!(result, Err(Error::Fetch(_))));
    }

    #[tokio::test]
    async fn test_fetch_catalogue_malformed() {
        let remote = FakeRemote::new().with_body(CATALOGUE_URL, r#"{"features": [{"properties": {}}]}"#);
        let result = fetch_catalogue(&remote, &Url::parse(CATALOGUE_URL).unwrap()).await;
        assert!(matches!(result, Err(Error::Malformed { .. })));
    }

    #[tokio::test]
    async fn test_fetch_geometries_skips_incomplete_features() {
        let remote = FakeRemote::new().with_body(
            GEOMETRY_URL,
            r#"{"type": "FeatureCollection", "features": [
                {"properties": {"project_id": "a"}, "geometry": {"type": "Polygon", "coordinates": []}},
                {"properties": {"project_id": "b"}, "geometry": null},
                {"properties": {}, "geometry": {"type": "Polygon", "coordinates": []}}
            ]}"#,
        );
        let records = fetch_geometries(&remote, &Url::parse(GEOMETRY_URL).unwrap()).await;
        assert_eq!(1, records.len());
        assert_eq!(ProjectId::from("a"), records[0].id);
    }

    #[tokio::test]
    async fn test_fetch_geometries_degrades_to_empty() {
        let remote = FakeRemote::new().with_body(GEOMETRY_URL, "not json");
        assert!(fetch_geometries(&remote, &Url::parse(GEOMETRY_URL).unwrap())
            .await
            .is_empty());

        let remote = FakeRemote::new();
        assert!(fetch_geometries(&remote, &Url::parse(GEOMETRY_URL).unwrap())
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_fetch_history() {
        let template = UrlTemplate::new("https://data.example.org/history_{project_id}.csv").unwrap();
        let remote = FakeRemote::new().with_body(
            "https://data.example.org/history_a.csv",
            "day,number_of_results\n2021-01-01,5\n",
        );

        let history = fetch_history(&remote, Some(&template), &ProjectId::from("a")).await;
        assert_eq!(1, history.len());
        assert!(history[0].payload.starts_with("day,"));

        let missing = fetch_history(&remote, Some(&template), &ProjectId::from("b")).await;
        assert!(missing.is_empty());

        let unconfigured = fetch_history(&remote, None, &ProjectId::from("a")).await;
        assert!(unconfigured.is_empty());
    }
}
