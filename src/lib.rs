//! Site Sync Core Library
//!
//! Keeps an academic site's generated data files current: repository
//! metadata from the GitHub REST API and a BibTeX bibliography from a Google
//! Scholar profile.
//!
//! # Architecture
//!
//! - [`config`] - Site configuration lookup (`_data/socials.yml`)
//! - [`github`] - GitHub REST client and repository records
//! - [`repos`] - Repository aggregate loading, merging and change detection
//! - [`scholar`] - Scholar sources, relay chain and publication fetching
//! - [`bibtex`] - Citation keys, entry rendering and the managed bibliography
//! - [`http`] - Shared HTTP client construction and retry policy

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bibtex;
pub mod config;
pub mod github;
pub mod http;
pub mod publication;
pub mod repos;
pub mod scholar;
pub(crate) mod user_agent;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::{ConfigError, load_scholar_user_id};
pub use github::{GithubClient, GithubError, RepoMetadata};
pub use http::{RetryPolicy, run_with_retry};
pub use publication::{Publication, PublicationStub};
pub use repos::{SiteData, SyncOutcome, sync_repositories};
pub use scholar::{CitationSource, RelayEndpoints, RelayEnv, ScholarError, configure_session};
