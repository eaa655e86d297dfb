//! Exports the [`build_site`] function which stitches together the steps of a
//! build: fetching the shared datasets ([`crate::catalogue`]), computing the
//! build matrix ([`crate::paths`]), building the data for each project page
//! ([`PageBuilder`]) and writing one copy of it per locale
//! ([`crate::write`]).

use crate::catalogue::{self, fetch_catalogue, fetch_geometries, fetch_history};
use crate::config::Config;
use crate::downloads::DownloadCatalogue;
use crate::fetch::{self, HttpRemote, Remote};
use crate::join::{self, join};
use crate::markdown::{render_description, CommonMark, Markup};
use crate::page::{assemble, PageData};
use crate::paths::{BuildMatrix, Locales};
use crate::probe::Prober;
use crate::project::{GeometryRecord, ProjectId, ProjectSummary};
use crate::url::UrlTemplate;
use crate::write::{self, Writer};
use futures::stream::{self, StreamExt};
use gtmpl::Template;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// The datasets shared by every page of a build. They are fetched once and
/// only read afterwards.
pub struct Sources {
    pub summaries: Vec<ProjectSummary>,
    pub geometries: Vec<GeometryRecord>,
}

impl Sources {
    /// Fetches the catalogue and the geometry dataset concurrently. Only a
    /// catalogue failure is an error.
    pub async fn fetch<R: Remote + ?Sized>(remote: &R, config: &Config) -> Result<Sources> {
        let (summaries, geometries) = futures::join!(
            fetch_catalogue(remote, &config.catalogue_url),
            fetch_geometries(remote, &config.geometry_url),
        );
        Ok(Sources {
            summaries: summaries?,
            geometries,
        })
    }
}

/// Builds the [`PageData`] for individual projects.
pub struct PageBuilder<'a, R: ?Sized> {
    remote: &'a R,
    markup: &'a dyn Markup,
    downloads: &'a DownloadCatalogue,
    history_url: Option<&'a UrlTemplate>,
    probe_timeout: Duration,
}

impl<'a, R: Remote + ?Sized> PageBuilder<'a, R> {
    pub fn new(remote: &'a R, markup: &'a dyn Markup, config: &'a Config) -> PageBuilder<'a, R> {
        PageBuilder {
            remote,
            markup,
            downloads: &config.downloads,
            history_url: config.history_url.as_ref(),
            probe_timeout: config.request_timeout,
        }
    }

    /// Joins, renders, probes and assembles the page for `id`. Fails only if
    /// `id` isn't in the catalogue.
    pub async fn build_page(&self, id: &ProjectId, sources: &Sources) -> join::Result<PageData> {
        let histories = fetch_history(self.remote, self.history_url, id).await;
        let joined = join(id, &sources.summaries, &sources.geometries, &histories)?;

        if joined.geometry.is_none() {
            tracing::debug!(project_id = %id, "no geometry");
        }

        let description = render_description(
            self.markup,
            joined.summary.description.as_deref().unwrap_or_default(),
        );
        let downloads = Prober::new(self.remote, self.probe_timeout)
            .probe_all(id, self.downloads)
            .await;

        Ok(assemble(joined, description, downloads))
    }
}

/// A summary of a finished build.
#[derive(Debug, Default, PartialEq)]
pub struct Report {
    /// The number of (project, locale) pages written.
    pub pages_written: usize,

    /// Projects whose pages were skipped because of page-level errors.
    pub omitted: Vec<ProjectId>,

    /// The number of download rows reported as unavailable, counted once per
    /// project.
    pub unavailable_downloads: usize,
}

/// Builds the site described by `config` into `output_directory`.
pub async fn build_site(config: &Config, output_directory: &Path) -> Result<Report> {
    let remote = HttpRemote::new(config.request_timeout)?;
    build_site_with(&remote, &CommonMark, config, output_directory).await
}

/// Builds the data for a single project page without writing anything.
pub async fn build_page(config: &Config, id: &ProjectId) -> Result<PageData> {
    let remote = HttpRemote::new(config.request_timeout)?;
    let sources = Sources::fetch(&remote, config).await?;
    let builder = PageBuilder::new(&remote, &CommonMark, config);
    Ok(builder.build_page(id, &sources).await?)
}

/// Like [`build_site`], but with the [`Remote`] and [`Markup`] supplied by
/// the caller.
pub async fn build_site_with<R: Remote + ?Sized>(
    remote: &R,
    markup: &dyn Markup,
    config: &Config,
    output_directory: &Path,
) -> Result<Report> {
    // Parse the template first so a broken theme fails before any requests.
    let template = match config.page_template.is_empty() {
        true => None,
        false => Some(parse_template(config.page_template.iter())?),
    };

    let sources = Sources::fetch(remote, config).await?;
    let matrix = BuildMatrix::new(&sources.summaries, &config.locales);
    tracing::info!(
        projects = matrix.projects().len(),
        locales = matrix.locales().len(),
        pages = matrix.len(),
        "computed build matrix"
    );

    let writer = Writer {
        output_directory,
        template: template.as_ref(),
    };
    writer.clean(matrix.locales())?;
    writer.write_paths(&matrix)?;

    // Page data doesn't depend on the locale, so each project is built once
    // and written once per locale.
    let builder = PageBuilder::new(remote, markup, config);
    let sources = &sources;
    let builder = &builder;
    let mut pages = stream::iter(matrix.projects())
        .map(|id| async move { (id, builder.build_page(id, sources).await) })
        .buffer_unordered(config.concurrency);

    let mut report = Report::default();
    while let Some((id, result)) = pages.next().await {
        let outcome = match result {
            Ok(page) => write_locales(&writer, matrix.locales(), &page).map(|written| {
                let unavailable = page.downloads.iter().filter(|d| !d.reachable).count();
                (written, unavailable)
            }),
            Err(err) => Err(Error::from(err)),
        };

        match outcome {
            Ok((written, unavailable)) => {
                tracing::info!(project_id = %id, pages = written, "wrote project pages");
                report.pages_written += written;
                report.unavailable_downloads += unavailable;
            }
            Err(err) if config.keep_going && err.is_page_scoped() => {
                tracing::warn!(project_id = %id, error = %err, "omitting project pages");
                report.omitted.push(id.clone());
            }
            Err(err) => return Err(err),
        }
    }

    tracing::info!(
        pages = report.pages_written,
        omitted = report.omitted.len(),
        unavailable_downloads = report.unavailable_downloads,
        "build complete"
    );
    Ok(report)
}

fn write_locales(writer: &Writer, locales: &Locales, page: &PageData) -> Result<usize> {
    let mut written = 0;
    for locale in locales.iter() {
        writer.write_page(locale, page)?;
        written += 1;
    }
    Ok(written)
}

// Loads the template file contents, concatenates them, and parses the result
// into a template.
fn parse_template<P: AsRef<Path>>(template_files: impl Iterator<Item = P>) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        use std::io::Read;
        let template_file = template_file.as_ref();
        File::open(&template_file)
            .and_then(|mut f| f.read_to_string(&mut contents))
            .map_err(|e| Error::OpenTemplateFile {
                path: template_file.to_owned(),
                err: e,
            })?;
        contents.push(' ');
    }

    let mut template = Template::default();
    template
        .parse(&contents)
        .map_err(|e| Error::ParseTemplate(e.to_string()))?;
    Ok(template)
}

pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the HTTP client can't be set up.
    #[error(transparent)]
    Fetch(#[from] fetch::Error),

    /// Returned when the project catalogue can't be obtained.
    #[error(transparent)]
    Catalogue(#[from] catalogue::Error),

    /// Returned when a requested project has no catalogue entry.
    #[error(transparent)]
    Join(#[from] join::Error),

    /// Returned for errors writing pages to disk.
    #[error(transparent)]
    Write(#[from] write::Error),

    /// Returned for I/O problems while opening template files.
    #[error("opening template file `{}`: {}", .path.display(), .err)]
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    #[error("parsing page template: {0}")]
    ParseTemplate(String),
}

impl Error {
    /// Whether the error only concerns a single project's pages rather than
    /// the whole build.
    pub fn is_page_scoped(&self) -> bool {
        matches!(
            self,
            Error::Join(join::Error::NotFound(_))
                | Error::Write(write::Error::InvalidProjectId(_))
        )
    }
}
