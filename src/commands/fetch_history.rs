//! Full-history fetch for mise and its competitors.
//!
//! Merges mise's cumulative stars into `mise.csv` without disturbing the
//! brew columns, and rebuilds `competitors.csv` over the union of every
//! observed star date.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use log::info;
use star_history::accumulate::cumulative_over;
use star_history::api::RepoId;
use star_history::fetch::{fetch_all, history_for, FetchWindow};

use crate::args::Args;
use crate::table::Table;

pub const MISE_FILE: &str = "mise.csv";
pub const COMPETITORS_FILE: &str = "competitors.csv";

const MISE_COLUMNS: [&str; 5] = ["date", "brew_rank", "brew_installs", "brew_pct", "github_stars"];
const COMPETITOR_COLUMNS: [&str; 4] = ["date", "mise_stars", "asdf_stars", "hk_stars"];

pub async fn run(args: &Args) -> Result<()> {
    let client = crate::build_client(args, 1)?;

    let mise = RepoId::new("jdx", "mise");
    let asdf = RepoId::new("asdf-vm", "asdf");
    let hk = RepoId::new("jdx", "hk");
    let repos = vec![mise.clone(), asdf.clone(), hk.clone()];

    info!("Fetching full star history for {} repos", repos.len());
    let histories = fetch_all(Arc::new(client), repos, FetchWindow::full()).await;

    let mise_history = history_for(&histories, &mise);
    let asdf_history = history_for(&histories, &asdf);
    let hk_history = history_for(&histories, &hk);

    // mise.csv: one row per day mise gained stars, brew fields preserved
    let mise_path = args.path(MISE_FILE);
    let mut mise_table =
        Table::read(&mise_path, 1)?.unwrap_or_else(|| Table::new(&MISE_COLUMNS, 1));
    let observed: Vec<NaiveDate> = mise_history.deltas.dates().collect();
    let mise_series = cumulative_over(observed, 0, &mise_history.deltas);
    for &(date, total) in mise_series.points() {
        mise_table.upsert(
            &[date.format("%Y-%m-%d").to_string().as_str()],
            &[("github_stars", total.to_string())],
        )?;
    }
    mise_table.write(&mise_path)?;
    info!("Wrote {} rows to {}", mise_table.len(), mise_path.display());

    // competitors.csv: cumulative totals for every repo over the union axis
    let union: BTreeSet<NaiveDate> = histories
        .iter()
        .flat_map(|history| history.deltas.dates())
        .collect();
    let axis: Vec<NaiveDate> = union.into_iter().collect();

    let columns = [
        ("mise_stars", cumulative_over(axis.iter().copied(), 0, &mise_history.deltas)),
        ("asdf_stars", cumulative_over(axis.iter().copied(), 0, &asdf_history.deltas)),
        ("hk_stars", cumulative_over(axis.iter().copied(), 0, &hk_history.deltas)),
    ];

    let competitors_path = args.path(COMPETITORS_FILE);
    let mut competitors_table = Table::new(&COMPETITOR_COLUMNS, 1);
    for (index, date) in axis.iter().enumerate() {
        let date_cell = date.format("%Y-%m-%d").to_string();
        for (column, series) in &columns {
            let value = series.points()[index].1;
            competitors_table.upsert(&[date_cell.as_str()], &[(column, value.to_string())])?;
        }
    }
    competitors_table.write(&competitors_path)?;
    info!(
        "Wrote {} rows to {}",
        competitors_table.len(),
        competitors_path.display()
    );

    Ok(())
}
