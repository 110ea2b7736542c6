//! GitHub implementation of the star-history client trait.
//!
//! Uses the `application/vnd.github.v3.star+json` media type so stargazer
//! pages carry `starred_at` timestamps, and throttles itself from the
//! `x-ratelimit-*` response headers.

use anyhow::Context;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use star_history::api::{Error, RepoId, Result, StarClient, StarEvent};

mod builder;
mod limiter;
mod payload;

pub use builder::GithubClientBuilder;
use limiter::RateLimiter;

pub struct GithubClient {
    client: Client,
    github_url: String,
    limiter: RateLimiter,
}

#[async_trait]
impl StarClient for GithubClient {
    async fn repo_stars(&self, repo: &RepoId) -> Result<Option<u64>> {
        self.limiter.wait().await;
        let request_url = format!("{}/repos/{}/{}", self.github_url, repo.owner, repo.name);
        let response = self
            .client
            .get(request_url)
            .send()
            .await
            .context("repository metadata request failed")?;
        self.limiter.observe(response.headers()).await;
        if !response.status().is_success() {
            return Err(Error::Status(response.status().as_u16()));
        }
        let body: payload::Repo = response
            .json()
            .await
            .context("malformed repository metadata")?;
        Ok(body.stargazers_count)
    }

    async fn stargazer_page(
        &self,
        repo: &RepoId,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<StarEvent>> {
        self.limiter.wait().await;
        let request_url = format!(
            "{}/repos/{}/{}/stargazers",
            self.github_url, repo.owner, repo.name
        );
        let response = self
            .client
            .get(request_url)
            .query(&[("page", page.to_string()), ("per_page", per_page.to_string())])
            .send()
            .await
            .context("stargazers page request failed")?;
        self.limiter.observe(response.headers()).await;
        if !response.status().is_success() {
            return Err(Error::Status(response.status().as_u16()));
        }
        let body: Vec<payload::Stargazer> = response
            .json()
            .await
            .context("malformed stargazers page")?;
        debug!("{}: stargazers page {} with {} entries", repo, page, body.len());
        // entries without starred_at (older API variants) are skipped
        Ok(body
            .into_iter()
            .filter_map(|star| star.starred_at.map(|starred_at| StarEvent { starred_at }))
            .collect())
    }
}
