//! Computes the build matrix: every cataloged project paired with every
//! supported locale.

use crate::project::{ProjectId, ProjectSummary};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

/// The supported locale codes. Codes are unique, non-empty and usable as a
/// single path component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Locales(Vec<String>);

impl Locales {
    /// Validates `codes`, dropping repeated entries.
    pub fn new<I, S>(codes: I) -> Result<Locales, String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut locales = Vec::new();
        for code in codes {
            let code = code.into();
            if code.is_empty()
                || code == "."
                || code == ".."
                || code.contains(|c: char| c == '/' || c == '\\')
            {
                return Err(format!("invalid locale code `{}`", code));
            }
            if seen.insert(code.clone()) {
                locales.push(code);
            }
        }
        if locales.is_empty() {
            return Err("at least one locale is required".to_owned());
        }
        Ok(Locales(locales))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Locales {
    fn default() -> Self {
        Locales(vec!["en".to_owned()])
    }
}

impl<'de> Deserialize<'de> for Locales {
    fn deserialize<D>(deserializer: D) -> Result<Locales, D::Error>
    where
        D: Deserializer<'de>,
    {
        Locales::new(Vec::<String>::deserialize(deserializer)?).map_err(D::Error::custom)
    }
}

/// One page to build.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct PagePath<'a> {
    pub project_id: &'a ProjectId,
    pub locale: &'a str,
}

/// The complete set of pages for a build.
#[derive(Clone, Debug)]
pub struct BuildMatrix {
    projects: Vec<ProjectId>,
    locales: Locales,
}

impl BuildMatrix {
    /// Builds the matrix for every distinct project in `catalogue`, keeping
    /// catalogue order. A repeated identifier only counts once.
    pub fn new(catalogue: &[ProjectSummary], locales: &Locales) -> BuildMatrix {
        let mut seen = HashSet::new();
        BuildMatrix {
            projects: catalogue
                .iter()
                .filter(|summary| seen.insert(&summary.id))
                .map(|summary| summary.id.clone())
                .collect(),
            locales: locales.clone(),
        }
    }

    pub fn projects(&self) -> &[ProjectId] {
        &self.projects
    }

    pub fn locales(&self) -> &Locales {
        &self.locales
    }

    /// Every (project, locale) pair, project-major.
    pub fn pairs(&self) -> impl Iterator<Item = PagePath<'_>> {
        let locales = &self.locales;
        self.projects.iter().flat_map(move |project_id| {
            locales.iter().map(move |locale| PagePath { project_id, locale })
        })
    }

    pub fn len(&self) -> usize {
        self.projects.len() * self.locales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
