//! `site-sync scholar`: regenerate the managed bibliography.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use site_sync::bibtex::{
    build_entries, load_manual_overrides, merge_with_overrides, render_bibliography,
    write_bibliography,
};
use site_sync::config::load_scholar_user_id;
use site_sync::http::RetryPolicy;
use site_sync::scholar::{RelayEndpoints, RelayEnv, configure_session, fetch_publications};
use tracing::info;

use crate::cli::ScholarArgs;

pub(crate) async fn run(args: &ScholarArgs) -> Result<()> {
    let scholar_id = load_scholar_user_id(&args.config)?;

    let endpoints = RelayEndpoints {
        scholar_base_url: args.scholar_base_url.clone(),
        serpapi_base_url: args.serpapi_base_url.clone(),
        proxy_list_url: args.proxy_list_url.clone(),
    };
    let timeout = Duration::from_secs(args.timeout_secs);
    let source = configure_session(&RelayEnv::from_env(), &endpoints, timeout).await?;

    let policy = RetryPolicy::with_max_attempts(args.retries);
    let publications = fetch_publications(source.as_ref(), &scholar_id, &policy).await?;

    let overrides = load_manual_overrides(&args.manual)?;
    let (entries, _skipped) = merge_with_overrides(build_entries(publications), &overrides);

    let manual_label = args.manual.display().to_string();
    let contents = render_bibliography(&entries, &scholar_id, &overrides, &manual_label, Utc::now());
    write_bibliography(&args.output, &contents)
        .with_context(|| format!("Failed to regenerate {}", args.output.display()))?;

    if overrides.is_empty() {
        info!("Saved {} entries to {}.", entries.len(), args.output.display());
    } else {
        info!(
            "Saved {} auto-generated entries plus manual overrides to {}.",
            entries.len(),
            args.output.display()
        );
    }
    Ok(())
}
