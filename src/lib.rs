//! Star-history collection and reporting for the jdx repositories.
//!
//! Each entry point under `src/bin` is a self-contained task working on
//! fixed CSV files in the data directory: full-history fetches that merge
//! cumulative star counts into the tables, a windowed backfill that
//! reconciles a baseline from the current totals, and a README generator
//! that renders crossover predictions and a 30-day growth table.

pub mod args;
pub mod commands;
pub mod readme;
pub mod table;

use args::Args;
use github_client::{GithubClient, GithubClientBuilder};
use star_history::api::{Error, Result};

/// Builds the GitHub client or fails fast when the token is absent. Nothing
/// touches the network before this check.
pub fn build_client(args: &Args, rate_limit_threshold: u32) -> Result<GithubClient> {
    let token = args
        .api_token
        .clone()
        .ok_or(Error::Message("GITHUB_TOKEN environment variable is required"))?;
    GithubClientBuilder::default()
        .with_github_url(&args.api_url)
        .with_rate_limit_threshold(rate_limit_threshold)
        .try_with_token(token)?
        .build()
}
