//! Windowed backfill of `fnox-competitors.csv` with baseline
//! reconciliation.
//!
//! The window runs from fnox's first star date to yesterday. For each repo
//! the baseline before the window is derived from three fetches: the
//! current total, the in-window deltas, and the deltas strictly after the
//! window end (so a window ending yesterday does not double-count today's
//! stars). The stargazer feed returns events oldest first, which lets both
//! windowed fetches stop early at their cutoff.

use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};
use log::{info, warn};
use star_history::accumulate::{baseline, cumulative_over, CumulativeSeries, DateRange};
use star_history::api::{RepoId, StarClient};
use star_history::fetch::{fetch_daily_deltas, FetchWindow};

use crate::args::Args;
use crate::table::Table;

pub const OUTPUT_FILE: &str = "fnox-competitors.csv";

/// Day fnox received its first star.
const WINDOW_START: &str = "2025-10-20";

const COLUMNS: [&str; 3] = ["date", "fnox_stars", "sops_stars"];
const COMPETITORS: [(&str, &str, &str); 2] =
    [("jdx", "fnox", "fnox_stars"), ("getsops", "sops", "sops_stars")];

async fn backfill_one<C: StarClient>(
    client: Arc<C>,
    repo: RepoId,
    range: DateRange,
    today: NaiveDate,
) -> CumulativeSeries {
    let window = FetchWindow::bounded(range.start, range.end);
    let in_window = fetch_daily_deltas(client.as_ref(), &repo, window).await;
    let post_window =
        fetch_daily_deltas(client.as_ref(), &repo, FetchWindow::bounded(range.end, today)).await;

    let current_total = in_window.total.unwrap_or(0);
    // the post-window fetch starts on the window's last day; only strictly
    // later events count, otherwise that day would be subtracted twice
    let after = post_window.deltas.sum_after(range.end);
    let base = baseline(current_total, in_window.deltas.sum(), after);
    if base < 0 {
        warn!("Negative baseline {} for {}, totals moved during the run", base, repo);
    }
    info!("{} baseline before {}: {}", repo, range.start, base);

    cumulative_over(range.days(), base, &in_window.deltas)
}

pub async fn run(args: &Args) -> Result<()> {
    let start = NaiveDate::parse_from_str(WINDOW_START, "%Y-%m-%d")?;
    let today = Utc::now().date_naive();
    let end = today - Duration::days(1);
    let range = DateRange::new(start, end);
    info!("Backfilling competitor data from {} to {}", start, end);

    let client = Arc::new(crate::build_client(args, 10)?);
    let tasks: Vec<_> = COMPETITORS
        .iter()
        .map(|&(owner, name, _)| {
            let client = Arc::clone(&client);
            tokio::spawn(backfill_one(client, RepoId::new(owner, name), range, today))
        })
        .collect();

    let mut series = Vec::with_capacity(tasks.len());
    for (task, &(owner, name, _)) in tasks.into_iter().zip(&COMPETITORS) {
        match task.await {
            Ok(result) => series.push(result),
            Err(err) => {
                warn!("Backfill task for {}/{} failed: {}", owner, name, err);
                series.push(CumulativeSeries::default());
            }
        }
    }

    let path = args.path(OUTPUT_FILE);
    let mut table = Table::new(&COLUMNS, 1);
    for (index, date) in range.days().enumerate() {
        let date_cell = date.format("%Y-%m-%d").to_string();
        for (result, &(_, _, column)) in series.iter().zip(&COMPETITORS) {
            if let Some(&(_, value)) = result.points().get(index) {
                table.upsert(&[date_cell.as_str()], &[(column, value.to_string())])?;
            }
        }
    }
    table.write(&path)?;
    info!("Backfilled {} days into {}", table.len(), path.display());

    for (result, &(_, name, _)) in series.iter().zip(&COMPETITORS) {
        if let Some(total) = result.last_value() {
            info!("Current {} stars: {}", name, total);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use star_history::api::{Result, StarEvent};

    struct RecordedStars {
        total: u64,
        events: Vec<StarEvent>,
    }

    #[async_trait]
    impl StarClient for RecordedStars {
        async fn repo_stars(&self, _repo: &RepoId) -> Result<Option<u64>> {
            Ok(Some(self.total))
        }

        async fn stargazer_page(
            &self,
            _repo: &RepoId,
            page: u32,
            _per_page: u32,
        ) -> Result<Vec<StarEvent>> {
            if page == 1 {
                Ok(self.events.clone())
            } else {
                Ok(Vec::new())
            }
        }
    }

    fn event(day: u32) -> StarEvent {
        StarEvent {
            starred_at: Utc.with_ymd_and_hms(2025, 11, day, 12, 0, 0).unwrap(),
        }
    }

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, n).unwrap()
    }

    #[tokio::test]
    async fn window_end_stars_are_subtracted_only_once_from_the_baseline() {
        // 10 stars total: 1 on day 4, 2 on the window-end day, 3 after it,
        // leaving 4 from before the window
        let client = Arc::new(RecordedStars {
            total: 10,
            events: vec![event(4), event(5), event(5), event(6), event(6), event(6)],
        });
        let range = DateRange::new(day(1), day(5));
        let series = backfill_one(client, RepoId::new("jdx", "fnox"), range, day(7)).await;

        assert_eq!(series.len(), 5);
        assert_eq!(series.points().first(), Some(&(day(1), 4)));
        // day-5 stars count in the window, not as post-window
        assert_eq!(series.last_value(), Some(7));
    }

    #[tokio::test]
    async fn history_ending_on_the_window_end_reconciles_to_the_total() {
        // nothing after the window, so the series must end at the total
        let client = Arc::new(RecordedStars {
            total: 6,
            events: vec![event(3), event(5), event(5)],
        });
        let range = DateRange::new(day(1), day(5));
        let series = backfill_one(client, RepoId::new("getsops", "sops"), range, day(7)).await;
        assert_eq!(series.points().first(), Some(&(day(1), 3)));
        assert_eq!(series.last_value(), Some(6));
    }
}
