//! Probes the download catalogue of a project. Every artifact is checked with
//! a header-only request; all checks run concurrently and the prober waits
//! for each of them to settle. A failed check never fails the others: the
//! artifact is simply reported as unreachable.

use crate::downloads::{DownloadCatalogue, DownloadDescriptor};
use crate::fetch::{self, Head, Remote};
use crate::project::ProjectId;
use futures::future::join_all;
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// A [`DownloadDescriptor`] together with the outcome of probing it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssetProbeResult {
    #[serde(flatten)]
    pub descriptor: DownloadDescriptor,

    pub reachable: bool,

    /// The advertised size in bytes; 0 if unknown or unreachable.
    pub byte_size: u64,
}

/// Checks the availability of download artifacts through a [`Remote`].
pub struct Prober<'a, R: ?Sized> {
    remote: &'a R,

    /// The longest a single check may take before it counts as failed.
    timeout: Duration,
}

impl<'a, R: Remote + ?Sized> Prober<'a, R> {
    pub fn new(remote: &'a R, timeout: Duration) -> Prober<'a, R> {
        Prober { remote, timeout }
    }

    /// Probes every artifact in `catalogue` for project `id`. The result has
    /// one entry per descriptor, in catalogue order.
    pub async fn probe_all(
        &self,
        id: &ProjectId,
        catalogue: &DownloadCatalogue,
    ) -> Vec<AssetProbeResult> {
        let results =
            join_all(catalogue.iter().map(|descriptor| self.probe(id, descriptor))).await;

        let reachable = results.iter().filter(|r| r.reachable).count();
        tracing::info!(
            project_id = %id,
            reachable,
            total = results.len(),
            "probed downloads"
        );
        results
    }

    async fn probe(&self, id: &ProjectId, descriptor: &DownloadDescriptor) -> AssetProbeResult {
        let outcome = match descriptor.url_template.expand(id) {
            Ok(url) => self.check(&url).await,
            Err(err) => Err(fetch::Error::Transport {
                url: descriptor.url_template.to_string(),
                message: err.to_string(),
            }),
        };

        match outcome {
            Ok(head) => AssetProbeResult {
                descriptor: descriptor.clone(),
                reachable: true,
                byte_size: head.content_length.unwrap_or(0),
            },
            Err(err) => {
                tracing::debug!(
                    project_id = %id,
                    artifact = ?descriptor.name,
                    error = %err,
                    "download unavailable"
                );
                AssetProbeResult {
                    descriptor: descriptor.clone(),
                    reachable: false,
                    byte_size: 0,
                }
            }
        }
    }

    async fn check(&self, url: &Url) -> fetch::Result<Head> {
        match tokio::time::timeout(self.timeout, self.remote.head(url)).await {
            Ok(result) => result,
            Err(_) => Err(fetch::Error::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::downloads::Artifact;
    use crate::fetch::fake::FakeRemote;

    const HOST: &str = "https://results.example.org/api/";

    fn catalogue() -> DownloadCatalogue {
        DownloadCatalogue::new(&Url::parse(HOST).unwrap()).unwrap()
    }

    fn url(path: &str) -> String {
        format!("{}{}", HOST, path)
    }

    #[tokio::test]
    async fn test_all_reachable() {
        let catalogue = catalogue();
        let id = ProjectId::from("p1");
        let mut remote = FakeRemote::new();
        for (i, d) in catalogue.iter().enumerate() {
            remote = remote.with_head(d.url_template.expand(&id).unwrap().as_str(), Some(100 + i as u64));
        }

        let results = Prober::new(&remote, Duration::from_secs(5))
            .probe_all(&id, &catalogue)
            .await;

        assert_eq!(10, results.len());
        for (i, result) in results.iter().enumerate() {
            assert_eq!(Artifact::ALL[i], result.descriptor.name);
            assert!(result.reachable);
            assert_eq!(100 + i as u64, result.byte_size);
        }
    }

    #[tokio::test]
    async fn test_none_reachable() {
        let remote = FakeRemote::new();
        let results = Prober::new(&remote, Duration::from_secs(5))
            .probe_all(&ProjectId::from("p1"), &catalogue())
            .await;

        assert_eq!(10, results.len());
        let names: Vec<Artifact> = results.iter().map(|r| r.descriptor.name).collect();
        assert_eq!(Artifact::ALL.to_vec(), names);
        assert!(results.iter().all(|r| !r.reachable && r.byte_size == 0));
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_order() {
        let remote = FakeRemote::new()
            .with_head(&url("users/users_p1.csv.gz"), Some(2048))
            .with_head(&url("history/history_p1.csv"), None)
            .with_hanging(&url("tasks/tasks_p1.csv.gz"));

        let results = Prober::new(&remote, Duration::from_millis(200))
            .probe_all(&ProjectId::from("p1"), &catalogue())
            .await;

        assert_eq!(10, results.len());
        for result in &results {
            match result.descriptor.name {
                Artifact::Users => {
                    assert!(result.reachable);
                    assert_eq!(2048, result.byte_size);
                }
                Artifact::History => {
                    // reachable, but no size advertised
                    assert!(result.reachable);
                    assert_eq!(0, result.byte_size);
                }
                _ => {
                    assert!(!result.reachable);
                    assert_eq!(0, result.byte_size);
                }
            }
        }
        assert_eq!(Artifact::Tasks, results[7].descriptor.name);
    }

    #[tokio::test]
    async fn test_probes_are_concurrent() {
        // Every probe hangs; if they ran one after another the whole call
        // would take ten timeouts rather than one.
        let catalogue = catalogue();
        let id = ProjectId::from("p1");
        let mut remote = FakeRemote::new();
        for d in catalogue.iter() {
            remote = remote.with_hanging(d.url_template.expand(&id).unwrap().as_str());
        }

        let started = std::time::Instant::now();
        let results = Prober::new(&remote, Duration::from_millis(300))
            .probe_all(&id, &catalogue)
            .await;

        assert_eq!(10, results.len());
        assert!(results.iter().all(|r| !r.reachable));
        assert_eq!(10, remote.requests().len());
        assert!(started.elapsed() < Duration::from_millis(3000));
    }
}
