//! Full-history fetch for every repository listed in `top-repos-list.txt`,
//! merged into the date+name keyed `top-repos.csv`.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::info;
use star_history::accumulate::cumulative_over;
use star_history::api::RepoId;
use star_history::fetch::{fetch_all, history_for, FetchWindow};

use crate::args::Args;
use crate::table::Table;

pub const LIST_FILE: &str = "top-repos-list.txt";
pub const TOP_REPOS_FILE: &str = "top-repos.csv";

const COLUMNS: [&str; 6] = [
    "date",
    "repo_name",
    "github_stars",
    "brew_rank",
    "brew_installs",
    "brew_pct",
];

/// Lines of the tracked-repo list, with blank lines and `#` comments
/// dropped. Bare names are repos under the jdx org.
pub fn parse_repo_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub async fn run(args: &Args) -> Result<()> {
    let list_path = args.path(LIST_FILE);
    let contents = std::fs::read_to_string(&list_path)
        .with_context(|| format!("reading {}", list_path.display()))?;
    let names = parse_repo_list(&contents);
    info!("Tracking {} repos: {}", names.len(), names.join(", "));

    let repos: Vec<RepoId> = names.iter().map(|name| RepoId::new("jdx", name)).collect();
    let client = crate::build_client(args, 1)?;
    let histories = fetch_all(Arc::new(client), repos.clone(), FetchWindow::full()).await;

    let union: BTreeSet<NaiveDate> = histories
        .iter()
        .flat_map(|history| history.deltas.dates())
        .collect();
    let axis: Vec<NaiveDate> = union.into_iter().collect();
    info!("Merging {} unique dates", axis.len());

    let path = args.path(TOP_REPOS_FILE);
    let mut table = Table::read(&path, 2)?.unwrap_or_else(|| {
        info!("No existing {}, creating a new table", TOP_REPOS_FILE);
        Table::new(&COLUMNS, 2)
    });

    for (name, repo) in names.iter().zip(&repos) {
        let history = history_for(&histories, repo);
        let series = cumulative_over(axis.iter().copied(), 0, &history.deltas);
        for &(date, total) in series.points() {
            table.upsert(
                &[date.format("%Y-%m-%d").to_string().as_str(), name.as_str()],
                &[("github_stars", total.to_string())],
            )?;
        }
    }

    table.write(&path)?;
    info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}
