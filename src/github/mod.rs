//! GitHub REST API access: repository discovery per account and metadata per slug.

mod client;
mod error;
mod record;

pub use client::{
    DEFAULT_API_BASE_URL, DEFAULT_TIMEOUT, GithubClient, REPOS_PER_PAGE, TOKEN_ENV_VAR,
    require_token,
};
pub use error::GithubError;
pub use record::RepoMetadata;
