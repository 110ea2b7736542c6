//! Paginated star-history fetching, one task per repository.

use std::sync::Arc;

use chrono::NaiveDate;
use futures::future;
use log::{debug, warn};

use crate::accumulate::DailyDelta;
use crate::api::{RepoId, StarClient};

/// Date bounds applied while scanning pages.
///
/// `stop_at_cutoff` may only be set when the feed is known to return events
/// in ascending chronological order; it stops pagination after the first
/// page containing an event past `end`, while still scanning that page for
/// in-range events.
#[derive(Clone, Copy, Debug, Default)]
pub struct FetchWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub stop_at_cutoff: bool,
}

impl FetchWindow {
    /// No bounds: every page until exhaustion.
    pub fn full() -> Self {
        FetchWindow::default()
    }

    /// Inclusive bounds with early termination on an ordered feed.
    pub fn bounded(start: NaiveDate, end: NaiveDate) -> Self {
        FetchWindow {
            start: Some(start),
            end: Some(end),
            stop_at_cutoff: true,
        }
    }

    fn includes(&self, day: NaiveDate) -> bool {
        if let Some(start) = self.start {
            if day < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if day > end {
                return false;
            }
        }
        true
    }
}

/// Everything one run learns about a repository's stars.
#[derive(Clone, Debug)]
pub struct RepoHistory {
    pub repo: RepoId,
    /// Current total from the metadata response; `None` when the field was
    /// missing or the metadata fetch failed.
    pub total: Option<u64>,
    pub deltas: DailyDelta,
}

impl RepoHistory {
    fn empty(repo: RepoId) -> Self {
        RepoHistory {
            repo,
            total: None,
            deltas: DailyDelta::new(),
        }
    }
}

/// Fetches a repository's star events page by page and buckets them by UTC
/// day.
///
/// Failures degrade rather than abort: a failed metadata fetch or a missing
/// total yields an empty history, and a failed page keeps whatever earlier
/// pages produced.
pub async fn fetch_daily_deltas<C: StarClient>(
    client: &C,
    repo: &RepoId,
    window: FetchWindow,
) -> RepoHistory {
    let total = match client.repo_stars(repo).await {
        Ok(Some(total)) => total,
        Ok(None) => {
            warn!("No star count in metadata for {}, skipping", repo);
            return RepoHistory::empty(repo.clone());
        }
        Err(err) => {
            warn!("Failed to fetch metadata for {}: {}", repo, err);
            return RepoHistory::empty(repo.clone());
        }
    };

    let mut deltas = DailyDelta::new();
    let mut page = C::FIRST_PAGE;
    loop {
        let events = match client.stargazer_page(repo, page, C::PAGE_SIZE).await {
            Ok(events) => events,
            Err(err) => {
                warn!(
                    "Stargazer page {} for {} failed ({}), keeping partial data",
                    page, repo, err
                );
                break;
            }
        };
        if events.is_empty() {
            debug!("Exhausted stargazer pages for {} at page {}", repo, page);
            break;
        }

        let mut past_cutoff = false;
        for event in &events {
            let day = event.day();
            if window.stop_at_cutoff {
                if let Some(end) = window.end {
                    if day > end {
                        past_cutoff = true;
                    }
                }
            }
            if window.includes(day) {
                deltas.record(day);
            }
        }
        debug!("Fetched page {} for {} ({} events)", page, repo, events.len());

        if past_cutoff {
            debug!("Reached cutoff for {}", repo);
            break;
        }
        page += 1;
    }

    RepoHistory {
        repo: repo.clone(),
        total: Some(total),
        deltas,
    }
}

/// Fetches several repositories concurrently, one spawned task each.
///
/// Pagination within a repository stays sequential; results come back in
/// input order. A panicked task drops only that repository's history.
pub async fn fetch_all<C>(client: Arc<C>, repos: Vec<RepoId>, window: FetchWindow) -> Vec<RepoHistory>
where
    C: StarClient + 'static,
{
    let tasks: Vec<_> = repos
        .into_iter()
        .map(|repo| {
            let client = Arc::clone(&client);
            tokio::spawn(async move { fetch_daily_deltas(client.as_ref(), &repo, window).await })
        })
        .collect();

    let mut histories = Vec::with_capacity(tasks.len());
    for outcome in future::join_all(tasks).await {
        match outcome {
            Ok(history) => histories.push(history),
            Err(err) => warn!("Star-history task failed: {}", err),
        }
    }
    histories
}

/// History for `repo` out of a [`fetch_all`] result, empty when the task
/// produced nothing.
pub fn history_for(histories: &[RepoHistory], repo: &RepoId) -> RepoHistory {
    histories
        .iter()
        .find(|history| &history.repo == repo)
        .cloned()
        .unwrap_or_else(|| RepoHistory::empty(repo.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Error, Result, StarEvent};
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct PagedClient {
        total: Option<u64>,
        pages: Vec<Vec<StarEvent>>,
        fail_on_page: Option<u32>,
        requested: AtomicU32,
    }

    impl PagedClient {
        fn new(total: Option<u64>, pages: Vec<Vec<StarEvent>>) -> Self {
            PagedClient {
                total,
                pages,
                fail_on_page: None,
                requested: AtomicU32::new(0),
            }
        }

        fn pages_requested(&self) -> u32 {
            self.requested.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StarClient for PagedClient {
        async fn repo_stars(&self, _repo: &RepoId) -> Result<Option<u64>> {
            Ok(self.total)
        }

        async fn stargazer_page(
            &self,
            _repo: &RepoId,
            page: u32,
            _per_page: u32,
        ) -> Result<Vec<StarEvent>> {
            self.requested.fetch_add(1, Ordering::SeqCst);
            if self.fail_on_page == Some(page) {
                return Err(Error::Status(500));
            }
            Ok(self
                .pages
                .get((page - 1) as usize)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn event(day: u32, hour: u32) -> StarEvent {
        StarEvent {
            starred_at: Utc.with_ymd_and_hms(2025, 2, day, hour, 0, 0).unwrap(),
        }
    }

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, n).unwrap()
    }

    fn repo() -> RepoId {
        RepoId::new("jdx", "mise")
    }

    #[tokio::test]
    async fn stops_on_empty_page_and_buckets_by_day() {
        let client = PagedClient::new(
            Some(4),
            vec![vec![event(1, 3), event(1, 22), event(2, 5)], vec![event(4, 1)], vec![]],
        );
        let history = fetch_daily_deltas(&client, &repo(), FetchWindow::full()).await;
        assert_eq!(history.total, Some(4));
        assert_eq!(history.deltas.get(day(1)), 2);
        assert_eq!(history.deltas.get(day(2)), 1);
        assert_eq!(history.deltas.get(day(4)), 1);
        assert_eq!(client.pages_requested(), 3);
    }

    #[tokio::test]
    async fn cutoff_stops_after_the_straddling_page() {
        // page 2 straddles the cutoff: day 3 is in range, day 6 is past it
        let client = PagedClient::new(
            Some(10),
            vec![
                vec![event(1, 0), event(2, 0)],
                vec![event(3, 12), event(6, 0)],
                vec![event(7, 0)],
            ],
        );
        let window = FetchWindow::bounded(day(1), day(5));
        let history = fetch_daily_deltas(&client, &repo(), window).await;
        assert_eq!(history.deltas.get(day(3)), 1);
        assert_eq!(history.deltas.get(day(6)), 0);
        assert_eq!(history.deltas.sum(), 3);
        assert_eq!(client.pages_requested(), 2, "no page after the cutoff page");
    }

    #[tokio::test]
    async fn cutoff_day_itself_is_included() {
        let client = PagedClient::new(Some(2), vec![vec![event(5, 23), event(6, 0)], vec![]]);
        let window = FetchWindow::bounded(day(1), day(5));
        let history = fetch_daily_deltas(&client, &repo(), window).await;
        assert_eq!(history.deltas.get(day(5)), 1);
        assert_eq!(history.deltas.sum(), 1);
    }

    #[tokio::test]
    async fn start_bound_filters_earlier_events_without_stopping() {
        let client = PagedClient::new(
            Some(3),
            vec![vec![event(1, 0), event(3, 0)], vec![event(4, 0)], vec![]],
        );
        let window = FetchWindow {
            start: Some(day(3)),
            end: None,
            stop_at_cutoff: false,
        };
        let history = fetch_daily_deltas(&client, &repo(), window).await;
        assert_eq!(history.deltas.get(day(1)), 0);
        assert_eq!(history.deltas.sum(), 2);
        assert_eq!(client.pages_requested(), 3);
    }

    #[tokio::test]
    async fn failed_page_keeps_partial_data() {
        let mut client = PagedClient::new(
            Some(3),
            vec![vec![event(1, 0), event(2, 0)], vec![event(3, 0)]],
        );
        client.fail_on_page = Some(2);
        let history = fetch_daily_deltas(&client, &repo(), FetchWindow::full()).await;
        assert_eq!(history.total, Some(3));
        assert_eq!(history.deltas.sum(), 2, "page 1 data survives the page 2 failure");
    }

    #[tokio::test]
    async fn missing_total_yields_empty_history() {
        let client = PagedClient::new(None, vec![vec![event(1, 0)]]);
        let history = fetch_daily_deltas(&client, &repo(), FetchWindow::full()).await;
        assert_eq!(history.total, None);
        assert!(history.deltas.is_empty());
        assert_eq!(client.pages_requested(), 0, "no page fetches without a total");
    }

    #[tokio::test]
    async fn fetch_all_returns_histories_in_input_order() {
        let client = Arc::new(PagedClient::new(Some(1), vec![vec![event(1, 0)], vec![]]));
        let repos = vec![RepoId::new("jdx", "mise"), RepoId::new("jdx", "hk")];
        let histories = fetch_all(client, repos.clone(), FetchWindow::full()).await;
        assert_eq!(histories.len(), 2);
        assert_eq!(histories[0].repo, repos[0]);
        assert_eq!(histories[1].repo, repos[1]);

        let found = history_for(&histories, &repos[1]);
        assert_eq!(found.deltas.sum(), 1);
        let missing = history_for(&histories, &RepoId::new("jdx", "fnox"));
        assert!(missing.deltas.is_empty());
    }
}
