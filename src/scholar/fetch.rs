//! Profile-to-publications loop with per-item retry and soft skips.

use tracing::{info, warn};

use crate::http::{RetryPolicy, run_with_retry};
use crate::publication::Publication;

use super::{CitationSource, ScholarError};

/// Fetches the profile for `user_id`, then the full record of every listed publication.
///
/// A publication whose detail fetch still fails after `policy` is exhausted is
/// logged and omitted.
///
/// # Errors
///
/// Returns [`ScholarError::AuthorFetch`] when the profile cannot be fetched and
/// [`ScholarError::NoPublications`] when no record survives.
#[tracing::instrument(skip(source, policy), fields(source = source.label()))]
pub async fn fetch_publications(
    source: &dyn CitationSource,
    user_id: &str,
    policy: &RetryPolicy,
) -> Result<Vec<Publication>, ScholarError> {
    let profile = run_with_retry(policy, "scholar profile", || source.fetch_author(user_id))
        .await
        .map_err(|error| ScholarError::AuthorFetch {
            user_id: user_id.to_string(),
            source: Box::new(error),
        })?;
    info!(
        "Found {} publications on the profile of {}.",
        profile.publications.len(),
        profile.name.as_deref().unwrap_or(user_id)
    );

    let mut publications = Vec::with_capacity(profile.publications.len());
    for stub in &profile.publications {
        match run_with_retry(policy, "scholar detail", || source.fill_publication(stub)).await {
            Ok(publication) => publications.push(publication),
            Err(error) => warn!(
                "Could not fetch full data for '{}': {}",
                stub.display_title(),
                error
            ),
        }
    }

    if publications.is_empty() {
        return Err(ScholarError::NoPublications);
    }
    Ok(publications)
}
