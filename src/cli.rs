//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use site_sync::bibtex::{DEFAULT_MANUAL_PATH, DEFAULT_OUTPUT_PATH};
use site_sync::config::DEFAULT_SOCIALS_PATH;
use site_sync::github::DEFAULT_API_BASE_URL;
use site_sync::http::DEFAULT_MAX_ATTEMPTS;
use site_sync::repos::DEFAULT_DATA_FILE;
use site_sync::scholar::{
    DEFAULT_PROXY_LIST_URL, DEFAULT_SCHOLAR_BASE_URL, DEFAULT_SERPAPI_BASE_URL,
};

/// Keep a site's generated data files in sync with GitHub and Google Scholar.
#[derive(Parser, Debug)]
#[command(name = "site-sync")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored log output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Sync targets.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Refresh repository metadata in the repository data file
    Repos(ReposArgs),
    /// Regenerate the BibTeX bibliography from a Google Scholar profile
    Scholar(ScholarArgs),
}

/// Options for `site-sync repos`.
#[derive(ClapArgs, Debug)]
pub struct ReposArgs {
    /// Repository aggregate to read and update
    #[arg(long, default_value = DEFAULT_DATA_FILE)]
    pub data_file: PathBuf,

    /// GitHub API base URL (GitHub Enterprise or a test server)
    #[arg(long, default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    /// Per-request timeout in seconds (1-600)
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..=600))]
    pub timeout_secs: u64,
}

/// Options for `site-sync scholar`.
#[derive(ClapArgs, Debug)]
pub struct ScholarArgs {
    /// Socials config holding `scholar_userid`
    #[arg(long, default_value = DEFAULT_SOCIALS_PATH)]
    pub config: PathBuf,

    /// Managed bibliography to regenerate
    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// Hand-authored entries that replace generated ones and are appended verbatim
    #[arg(long, default_value = DEFAULT_MANUAL_PATH)]
    pub manual: PathBuf,

    /// Google Scholar base URL
    #[arg(long, default_value = DEFAULT_SCHOLAR_BASE_URL)]
    pub scholar_base_url: String,

    /// SerpAPI base URL
    #[arg(long, default_value = DEFAULT_SERPAPI_BASE_URL)]
    pub serpapi_base_url: String,

    /// Plain-text list of host:port proxies tried in CI
    #[arg(long, default_value = DEFAULT_PROXY_LIST_URL)]
    pub proxy_list_url: String,

    /// Per-request timeout in seconds (1-600)
    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u64).range(1..=600))]
    pub timeout_secs: u64,

    /// Attempts per publication detail, including the first (1-10)
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub retries: u32,
}
