//! The library code for the `projectpages` page data generator. A build turns
//! a remote project catalogue into one data file per (project, locale) pair,
//! which a static site then renders as project detail pages. It breaks down
//! into the following steps:
//!
//! 1. Fetching the shared datasets: the project catalogue, which the build
//!    can't do without, and the project geometries, which it can
//!    ([`crate::catalogue`])
//! 2. Enumerating the pages to build from the catalogue and the configured
//!    locales ([`crate::paths`])
//! 3. Building the data for each project page ([`crate::build`])
//! 4. Writing the page data to disk ([`crate::write`])
//!
//! The third step is the more involved. For every project it fetches the
//! project's history, joins the per-project records together
//! ([`crate::join`]), renders the markdown description to HTML
//! ([`crate::markdown`]), checks which download artifacts exist on the
//! results host ([`crate::probe`]) and finally assembles everything into a
//! [`crate::page::PageData`] ([`crate::page`]).
//!
//! Since the page data doesn't depend on the locale, each project is built
//! once and written once per locale.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod catalogue;
pub mod config;
pub mod downloads;
pub mod fetch;
pub mod join;
pub mod markdown;
pub mod page;
pub mod paths;
pub mod probe;
pub mod project;
pub mod url;
pub mod value;
pub mod write;
