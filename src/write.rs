//! Writes page data to disk. Every page is written once per locale as
//! `{output_directory}/{locale}/projects/{project_id}.json`, and, when a page
//! template is configured, also rendered to the sibling `.html` file. The
//! build matrix itself is written to `{output_directory}/paths.json`.

use crate::page::PageData;
use crate::paths::{BuildMatrix, Locales};
use crate::project::ProjectId;
use gtmpl::{Template, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Responsible for writing [`PageData`] to the output directory.
pub struct Writer<'a> {
    /// The root of the exported site.
    pub output_directory: &'a Path,

    /// The template for HTML pages, if any. It is executed with an object
    /// with fields `page`, `locale` and `project_id`.
    pub template: Option<&'a Template>,
}

impl Writer<'_> {
    /// Removes the page directories for `locales` so stale pages from a
    /// previous build don't survive. Other files in the output directory are
    /// left alone.
    pub fn clean(&self, locales: &Locales) -> Result<()> {
        for locale in locales.iter() {
            rmdir(&self.page_directory(locale))?;
        }
        Ok(())
    }

    /// Writes the list of (project, locale) pairs in the build.
    pub fn write_paths(&self, matrix: &BuildMatrix) -> Result<()> {
        create_dir_all(self.output_directory)?;
        let path = self.output_directory.join("paths.json");
        let pairs: Vec<_> = matrix.pairs().collect();
        write_json(&path, &pairs)
    }

    /// Writes `page` for `locale`.
    pub fn write_page(&self, locale: &str, page: &PageData) -> Result<()> {
        let stem = file_stem(&page.project_id)?;
        let directory = self.page_directory(locale);
        create_dir_all(&directory)?;

        write_json(&directory.join(format!("{}.json", stem)), page)?;

        if let Some(template) = self.template {
            let path = directory.join(format!("{}.html", stem));
            let context = gtmpl::Context::from(page_context(locale, page))
                .map_err(|e| Error::Template(e.to_string()))?;
            let mut w = BufWriter::new(create_file(&path)?);
            template
                .execute(&mut w, &context)
                .map_err(|e| Error::Template(e.to_string()))?;
            w.flush().map_err(|err| Error::Io { path, err })?;
        }
        Ok(())
    }

    fn page_directory(&self, locale: &str) -> PathBuf {
        self.output_directory.join(locale).join("projects")
    }
}

/// Builds the template context for one page.
fn page_context(locale: &str, page: &PageData) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("page".to_owned(), Value::from(page));
    m.insert("locale".to_owned(), locale.into());
    m.insert("project_id".to_owned(), page.project_id.as_str().into());
    Value::Object(m)
}

/// Project identifiers become file names, so they must be a single, normal
/// path component.
fn file_stem(id: &ProjectId) -> Result<&str> {
    let s = id.as_str();
    if s.is_empty() || s == "." || s == ".." || s.contains(|c: char| c == '/' || c == '\\') {
        return Err(Error::InvalidProjectId(id.clone()));
    }
    Ok(s)
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut w = BufWriter::new(create_file(path)?);
    serde_json::to_writer_pretty(&mut w, value)?;
    w.flush().map_err(|err| Error::Io {
        path: path.to_owned(),
        err,
    })
}

fn create_file(path: &Path) -> Result<File> {
    File::create(path).map_err(|err| Error::Io {
        path: path.to_owned(),
        err,
    })
}

fn create_dir_all(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|err| Error::Io {
        path: dir.to_owned(),
        err,
    })
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Io {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when a project identifier can't be used as a file name.
    #[error("project identifier `{0}` can't be used as a file name")]
    InvalidProjectId(ProjectId),

    /// An error serializing page data.
    #[error("serializing page data: {0}")]
    Json(#[from] serde_json::Error),

    /// An error during templating.
    #[error("rendering page template: {0}")]
    Template(String),

    /// An error writing the output files.
    #[error("writing `{}`: {}", .path.display(), .err)]
    Io { path: PathBuf, err: io::Error },
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::project::{ProjectStatus, ProjectSummary};

    fn page(id: &str) -> PageData {
        PageData {
            project_id: ProjectId::from(id),
            name: "Project".to_owned(),
            description: "<p>About</p>\n".to_owned(),
            status: ProjectStatus::Active,
            progress: Some(46),
            area: 12,
            contributors: None,
            geometry: None,
            history: None,
            downloads: Vec::new(),
        }
    }

    #[test]
    fn test_write_page_json() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let writer = Writer {
            output_directory: dir.path(),
            template: None,
        };
        writer.write_page("de", &page("abc"))?;

        let path = dir.path().join("de/projects/abc.json");
        let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        assert_eq!("abc", written["project_id"]);
        assert_eq!(46, written["progress"]);
        assert!(written["contributors"].is_null());
        assert!(!dir.path().join("de/projects/abc.html").exists());
        Ok(())
    }

    #[test]
    fn test_write_page_template() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let mut template = Template::default();
        template
            .parse("<h1>{{ .page.name }}</h1><p>{{ .locale }}/{{ .project_id }}</p>")
            .map_err(|e| e.to_string())?;
        let writer = Writer {
            output_directory: dir.path(),
            template: Some(&template),
        };
        writer.write_page("en", &page("abc"))?;

        let html = std::fs::read_to_string(dir.path().join("en/projects/abc.html"))?;
        assert_eq!("<h1>Project</h1><p>en/abc</p>", html);
        Ok(())
    }

    #[test]
    fn test_invalid_project_id() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let writer = Writer {
            output_directory: dir.path(),
            template: None,
        };
        for id in &["../escape", "a/b", ".."] {
            match writer.write_page("en", &page(id)) {
                Err(Error::InvalidProjectId(_)) => {}
                other => panic!("wanted InvalidProjectId for {}, got {:?}", id, other),
            }
        }
        Ok(())
    }

    #[test]
    fn test_write_paths_and_clean() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let writer = Writer {
            output_directory: dir.path(),
            template: None,
        };
        let catalogue = vec![ProjectSummary {
            id: ProjectId::from("a"),
            name: "A".to_owned(),
            status: ProjectStatus::Active,
            progress: None,
            area: None,
            contributors: None,
            description: None,
        }];
        let locales = Locales::new(vec!["en", "de"])?;
        writer.write_paths(&BuildMatrix::new(&catalogue, &locales))?;

        let paths: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("paths.json"))?)?;
        assert_eq!(
            serde_json::json!([
                {"project_id": "a", "locale": "en"},
                {"project_id": "a", "locale": "de"},
            ]),
            paths
        );

        writer.write_page("en", &page("stale"))?;
        writer.clean(&locales)?;
        assert!(!dir.path().join("en/projects").exists());
        assert!(dir.path().join("paths.json").exists());
        Ok(())
    }
}
