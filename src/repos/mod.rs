//! Repository metadata sync: discover slugs, fetch metadata, compute the next
//! aggregate document, and decide whether it needs to be written.
//!
//! [`compute_next_state`] and [`merge_repo_slugs`] are pure so the policy is
//! tested without network access; [`sync_repositories`] wires them to a
//! [`GithubClient`].

mod data_file;
mod error;

pub use data_file::{SiteData, write_data_file};
pub use error::DataFileError;

use std::collections::HashSet;

use serde_yaml::{Mapping, Value};
use tracing::info;

use crate::github::{GithubClient, GithubError, RepoMetadata};

use data_file::{DESCRIPTION_LINES_KEY, GITHUB_REPOS_KEY, GITHUB_USERS_KEY, METADATA_KEY};

/// Default location of the repository aggregate.
pub const DEFAULT_DATA_FILE: &str = "_data/repositories.yml";

/// Written when the stored file has no `repo_description_lines_max`.
pub const DEFAULT_DESCRIPTION_LINES_MAX: u64 = 2;

/// Result of a repository sync, before anything is written.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Neither `github_repos` nor any account produced a slug.
    NoRepositories,
    /// Stored slugs and metadata already match upstream.
    UpToDate {
        /// Number of repositories checked.
        count: usize,
    },
    /// The document differs and should be written.
    Changed {
        /// Full replacement document.
        document: Mapping,
        /// Number of repositories with metadata.
        count: usize,
    },
}

/// Unions explicit slugs with discovered ones.
///
/// Explicit slugs come first in configured order, then discovered slugs not
/// already present, in discovery order.
#[must_use]
pub fn merge_repo_slugs(manual: &[String], discovered: &[Vec<String>]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut resolved = Vec::new();

    for slug in manual.iter().chain(discovered.iter().flatten()) {
        if seen.insert(slug.as_str()) {
            resolved.push(slug.clone());
        }
    }
    resolved
}

/// Computes the next aggregate document, or `None` when the stored
/// `github_repos` and `github_repos_metadata` already equal the computed values.
///
/// Managed keys are emitted first in fixed order; every other stored key
/// follows in its original order.
///
/// # Errors
///
/// Returns [`DataFileError::Serialize`] if the records cannot be converted to YAML values.
pub fn compute_next_state(
    stored: &SiteData,
    repos: &[String],
    metadata: &[RepoMetadata],
) -> Result<Option<Mapping>, DataFileError> {
    let repos_value =
        serde_yaml::to_value(repos).map_err(|source| DataFileError::Serialize { source })?;
    let metadata_value =
        serde_yaml::to_value(metadata).map_err(|source| DataFileError::Serialize { source })?;

    if stored.get(METADATA_KEY) == Some(&metadata_value)
        && stored.get(GITHUB_REPOS_KEY) == Some(&repos_value)
    {
        return Ok(None);
    }

    let mut document = Mapping::new();
    document.insert(
        GITHUB_USERS_KEY.into(),
        stored
            .get(GITHUB_USERS_KEY)
            .cloned()
            .unwrap_or_else(|| Value::Sequence(Vec::new())),
    );
    document.insert(
        DESCRIPTION_LINES_KEY.into(),
        stored
            .get(DESCRIPTION_LINES_KEY)
            .cloned()
            .unwrap_or_else(|| Value::from(DEFAULT_DESCRIPTION_LINES_MAX)),
    );
    document.insert(GITHUB_REPOS_KEY.into(), repos_value);
    document.insert(METADATA_KEY.into(), metadata_value);

    for (key, value) in stored.as_mapping() {
        if !document.contains_key(key) {
            document.insert(key.clone(), value.clone());
        }
    }

    Ok(Some(document))
}

/// Errors from [`sync_repositories`].
#[derive(Debug, thiserror::Error)]
pub enum RepoSyncError {
    /// A GitHub request failed
    #[error(transparent)]
    Github(#[from] GithubError),
    /// The next document could not be built
    #[error(transparent)]
    DataFile(#[from] DataFileError),
}

/// Resolves slugs, fetches every repository, and computes the outcome.
///
/// The first hard error from any account or slug aborts the sync; no partial
/// result is returned.
///
/// # Errors
///
/// Returns [`RepoSyncError`] on the first failed request.
pub async fn sync_repositories(
    stored: &SiteData,
    client: &GithubClient,
) -> Result<SyncOutcome, RepoSyncError> {
    let mut discovered = Vec::new();
    for user in stored.github_users() {
        discovered.push(client.list_user_repos(&user).await?);
    }

    let repos = merge_repo_slugs(&stored.github_repos(), &discovered);
    if repos.is_empty() {
        return Ok(SyncOutcome::NoRepositories);
    }

    let mut metadata = Vec::with_capacity(repos.len());
    for slug in &repos {
        let record = client.fetch_repo(slug).await?;
        info!("Fetched metadata for {}", record.slug);
        metadata.push(record);
    }

    let count = metadata.len();
    Ok(match compute_next_state(stored, &repos, &metadata)? {
        Some(document) => SyncOutcome::Changed { document, count },
        None => SyncOutcome::UpToDate { count },
    })
}
