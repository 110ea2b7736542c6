use std::fmt::Display;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Message(&'static str),
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A tracked repository, addressed as `owner/name`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        RepoId {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() => {
                Ok(RepoId::new(owner, name))
            }
            _ => Err(Error::Message("repository must be written as owner/name")),
        }
    }
}

/// A single star with its UTC timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StarEvent {
    pub starred_at: DateTime<Utc>,
}

impl StarEvent {
    /// The UTC calendar day this event is bucketed into.
    pub fn day(&self) -> NaiveDate {
        self.starred_at.date_naive()
    }
}

/// Client for a paginated star-event feed.
///
/// Implementations are expected to handle their own rate limiting; callers
/// fetch one repository's pages strictly in order, so a page request may
/// suspend but must not reorder or drop events.
#[async_trait]
pub trait StarClient: Send + Sync {
    const FIRST_PAGE: u32 = 1;
    const PAGE_SIZE: u32 = 100;

    /// Current total star count, or `None` when the metadata response lacks
    /// the count field.
    async fn repo_stars(&self, repo: &RepoId) -> Result<Option<u64>>;

    /// One page of star events in the feed's chronological insertion order.
    async fn stargazer_page(&self, repo: &RepoId, page: u32, per_page: u32)
        -> Result<Vec<StarEvent>>;
}

#[test]
fn repo_id_round_trip() {
    let repo: RepoId = "jdx/mise".parse().unwrap();
    assert_eq!(repo, RepoId::new("jdx", "mise"));
    assert_eq!(repo.to_string(), "jdx/mise");
}

#[test]
fn repo_id_rejects_missing_separator() {
    assert!("mise".parse::<RepoId>().is_err());
    assert!("/mise".parse::<RepoId>().is_err());
    assert!("jdx/".parse::<RepoId>().is_err());
}
