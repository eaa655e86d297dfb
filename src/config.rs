use crate::downloads::{DownloadCatalogue, DEFAULT_RESULTS_HOST};
use crate::paths::Locales;
use crate::url::UrlTemplate;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// The name of the project file searched for by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "projectpages.yaml";

#[derive(Deserialize)]
struct RequestTimeout(u64);
impl Default for RequestTimeout {
    fn default() -> Self {
        RequestTimeout(10)
    }
}

#[derive(Deserialize)]
struct Concurrency(usize);
impl Default for Concurrency {
    fn default() -> Self {
        Concurrency(8)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Project {
    pub catalogue_url: Url,
    pub geometry_url: Url,

    #[serde(default)]
    pub history_url: Option<UrlTemplate>,

    #[serde(default)]
    pub results_host: Option<Url>,

    #[serde(default)]
    pub locales: Locales,

    #[serde(default)]
    pub request_timeout_secs: RequestTimeout,

    #[serde(default)]
    pub concurrency: Concurrency,

    #[serde(default)]
    pub page_template: Vec<PathBuf>,

    #[serde(default)]
    pub keep_going: bool,
}

/// Settings given on the command line, which take precedence over the
/// project file.
#[derive(Default)]
pub struct Overrides {
    pub concurrency: Option<usize>,
    pub keep_going: bool,
}

pub struct Config {
    pub catalogue_url: Url,
    pub geometry_url: Url,
    pub history_url: Option<UrlTemplate>,
    pub downloads: DownloadCatalogue,
    pub locales: Locales,
    pub request_timeout: Duration,
    pub concurrency: usize,
    pub page_template: Vec<PathBuf>,
    pub keep_going: bool,
}

impl Config {
    /// Looks for [`PROJECT_FILE`] in `dir` and then in each of its parents.
    pub fn from_directory(dir: &Path, overrides: Overrides) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path, overrides)
                .with_context(|| format!("Loading configuration from `{}`", path.display()))
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, overrides),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    pub fn from_project_file(path: &Path, overrides: Overrides) -> Result<Config> {
        let project: Project = serde_yaml::from_reader(open(path, "project")?)?;
        let project_root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )
        })?;
        Config::from_project(project, project_root, overrides)
    }

    fn from_project(project: Project, project_root: &Path, overrides: Overrides) -> Result<Config> {
        let results_host = match project.results_host {
            Some(host) => host,
            None => Url::parse(DEFAULT_RESULTS_HOST)?,
        };
        let concurrency = overrides.concurrency.unwrap_or(project.concurrency.0);
        if concurrency == 0 {
            return Err(anyhow!("`concurrency` must be at least 1"));
        }
        if project.request_timeout_secs.0 == 0 {
            return Err(anyhow!("`request_timeout_secs` must be at least 1"));
        }

        Ok(Config {
            catalogue_url: project.catalogue_url,
            geometry_url: project.geometry_url,
            history_url: project.history_url,
            downloads: DownloadCatalogue::new(&results_host)?,
            locales: project.locales,
            request_timeout: Duration::from_secs(project.request_timeout_secs.0),
            concurrency,
            page_template: project
                .page_template
                .iter()
                .map(|relpath| project_root.join(relpath))
                .collect(),
            keep_going: overrides.keep_going || project.keep_going,
        })
    }
}

fn open(path: &Path, kind: &str) -> Result<File> {
    File::open(path).with_context(|| format!("Opening {} file `{}`", kind, path.display()))
}

#[cfg(test)]
mod test {
    use super::*;

    const MINIMAL: &str = "
catalogue_url: https://data.example.org/projects_centroid.geojson
geometry_url: https://data.example.org/projects.geojson
";

    fn parse(yaml: &str, overrides: Overrides) -> Result<Config> {
        let project: Project = serde_yaml::from_str(yaml)?;
        Config::from_project(project, Path::new("/site"), overrides)
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let config = parse(MINIMAL, Overrides::default())?;
        assert_eq!(None, config.history_url);
        assert_eq!(Locales::default(), config.locales);
        assert_eq!(Duration::from_secs(10), config.request_timeout);
        assert_eq!(8, config.concurrency);
        assert_eq!(10, config.downloads.len());
        assert!(config.page_template.is_empty());
        assert!(!config.keep_going);
        Ok(())
    }

    #[test]
    fn test_full_project() -> Result<()> {
        let yaml = format!(
            "{}{}",
            MINIMAL,
            "
history_url: https://data.example.org/history/history_{project_id}.csv
results_host: https://results.example.org/api/
locales: [en, de, fr]
request_timeout_secs: 3
concurrency: 2
page_template: [theme/project.html]
keep_going: true
"
        );
        let config = parse(&yaml, Overrides::default())?;
        assert!(config.history_url.is_some());
        assert_eq!(3, config.locales.len());
        assert_eq!(Duration::from_secs(3), config.request_timeout);
        assert_eq!(2, config.concurrency);
        assert_eq!(vec![PathBuf::from("/site/theme/project.html")], config.page_template);
        assert!(config.keep_going);
        assert!(config
            .downloads
            .iter()
            .all(|d| d.url_template.as_str().starts_with("https://results.example.org/api/")));
        Ok(())
    }

    #[test]
    fn test_overrides() -> Result<()> {
        let config = parse(
            MINIMAL,
            Overrides {
                concurrency: Some(1),
                keep_going: true,
            },
        )?;
        assert_eq!(1, config.concurrency);
        assert!(config.keep_going);
        Ok(())
    }

    #[test]
    fn test_invalid_values() {
        assert!(parse(&format!("{}locales: []\n", MINIMAL), Overrides::default()).is_err());
        assert!(parse(&format!("{}concurrency: 0\n", MINIMAL), Overrides::default()).is_err());
        assert!(parse(
            &format!("{}history_url: https://example.org/history.csv\n", MINIMAL),
            Overrides::default()
        )
        .is_err());
        assert!(parse(&format!("{}unknown_key: 1\n", MINIMAL), Overrides::default()).is_err());
    }

    #[test]
    fn test_from_directory_searches_parents() -> Result<()> {
        let root = tempfile::tempdir()?;
        std::fs::write(root.path().join(PROJECT_FILE), MINIMAL)?;
        let nested = root.path().join("a/b");
        std::fs::create_dir_all(&nested)?;

        let config = Config::from_directory(&nested, Overrides::default())?;
        assert_eq!(
            "https://data.example.org/projects.geojson",
            config.geometry_url.as_str()
        );
        Ok(())
    }
}
