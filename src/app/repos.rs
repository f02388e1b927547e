//! `site-sync repos`: refresh the repository aggregate.

use std::time::Duration;

use anyhow::{Context, Result};
use site_sync::github::{GithubClient, TOKEN_ENV_VAR, require_token};
use site_sync::repos::{SiteData, SyncOutcome, sync_repositories, write_data_file};
use tracing::info;

use crate::cli::ReposArgs;

pub(crate) async fn run(args: &ReposArgs) -> Result<()> {
    let path = &args.data_file;
    let stored = SiteData::load(path)?;
    let token = require_token(std::env::var(TOKEN_ENV_VAR).ok())?;
    let client = GithubClient::with_base_url(
        &token,
        &args.api_base_url,
        Duration::from_secs(args.timeout_secs),
    )?;

    match sync_repositories(&stored, &client).await? {
        SyncOutcome::NoRepositories => {
            info!(
                "No repositories found. Populate 'github_users' or 'github_repos' in {}.",
                path.display()
            );
        }
        SyncOutcome::UpToDate { .. } => {
            info!("Repository metadata already up-to-date. Skipping write.");
        }
        SyncOutcome::Changed { document, count } => {
            write_data_file(path, &document)
                .with_context(|| format!("Failed to update {}", path.display()))?;
            info!(
                "Saved metadata for {count} repositories to {}.",
                path.display()
            );
        }
    }
    Ok(())
}
