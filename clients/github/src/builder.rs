use anyhow::Context;
use reqwest::header;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use reqwest::ClientBuilder;
use secrecy::ExposeSecret;
use star_history::api::Result;

use crate::limiter::RateLimiter;
use crate::GithubClient;

pub struct GithubClientBuilder {
    client_builder: ClientBuilder,
    github_url: String,
    headers: HeaderMap,
    rate_limit_threshold: u32,
}

impl Default for GithubClientBuilder {
    fn default() -> Self {
        let mut headers = HeaderMap::default();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("star-history-app"));
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3.star+json"),
        );
        Self {
            client_builder: ClientBuilder::default(),
            github_url: "https://api.github.com".to_string(),
            headers,
            rate_limit_threshold: 1,
        }
    }
}

impl GithubClientBuilder {
    pub fn try_with_token(self, token: secrecy::SecretString) -> Result<GithubClientBuilder> {
        let value = format!("Bearer {}", token.expose_secret());
        let mut builder = self.try_with_header(header::AUTHORIZATION, value)?;
        if let Some(header) = builder.headers.get_mut(header::AUTHORIZATION) {
            header.set_sensitive(true);
        }
        Ok(builder)
    }

    pub fn try_with_user_agent<STR: AsRef<str>>(self, user_agent: STR) -> Result<GithubClientBuilder> {
        Ok(self.try_with_header(header::USER_AGENT, user_agent)?)
    }

    pub fn with_github_url<STR: AsRef<str>>(mut self, url: STR) -> GithubClientBuilder {
        self.github_url = url.as_ref().trim_end_matches('/').to_string();
        self
    }

    /// Remaining-quota level at or below which requests wait for the reset.
    pub fn with_rate_limit_threshold(mut self, threshold: u32) -> GithubClientBuilder {
        self.rate_limit_threshold = threshold;
        self
    }

    fn try_with_header(
        mut self,
        key: HeaderName,
        val: impl AsRef<str>,
    ) -> anyhow::Result<GithubClientBuilder> {
        let val = HeaderValue::from_str(val.as_ref()).context("invalid header value")?;
        self.headers.insert(key, val);
        Ok(self)
    }

    pub fn build(self) -> Result<GithubClient> {
        let client = self
            .client_builder
            .default_headers(self.headers)
            .build()
            .context("building HTTP client")?;
        Ok(GithubClient {
            client,
            github_url: self.github_url,
            limiter: RateLimiter::new(self.rate_limit_threshold),
        })
    }
}

#[test]
fn builder_strips_trailing_slash() {
    let builder = GithubClientBuilder::default().with_github_url("http://localhost:8080/");
    assert_eq!(builder.github_url, "http://localhost:8080");
}
