//! Renders the Upcoming Crossovers and Fastest Growing sections of
//! README.md from the persisted tables. Purely local: no network.

use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};
use log::{info, warn};
use star_history::accumulate::{CumulativeSeries, DateRange};
use star_history::predict::{predict_crossing, rank_crossings, Crossing, DEFAULT_WINDOWS};

use crate::args::Args;
use crate::readme;
use crate::readme::RepoGrowth;
use crate::table::Table;

pub const README_FILE: &str = "README.md";
const REFERENCE_COLUMN: &str = "mise_stars";
const STARS_SUFFIX: &str = "_stars";
const GROWTH_WINDOW_DAYS: i64 = 30;
const TOP_CROSSOVERS: usize = 5;
const TOP_GROWERS: usize = 3;

/// Parses one column of a date-keyed table into a cumulative series,
/// skipping rows whose date or value does not parse (blank cells included).
fn column_series(table: &Table, column: &str) -> CumulativeSeries {
    let date_index = match table.column_index("date") {
        Some(index) => index,
        None => return CumulativeSeries::default(),
    };
    let value_index = match table.column_index(column) {
        Some(index) => index,
        None => return CumulativeSeries::default(),
    };
    let points = table
        .rows()
        .filter_map(|row| {
            let date = NaiveDate::parse_from_str(&row[date_index], "%Y-%m-%d").ok()?;
            let value = row[value_index].parse::<i64>().ok()?;
            Some((date, value))
        })
        .collect();
    CumulativeSeries::from_points(points)
}

fn crossover_body(table: &Table, today: NaiveDate) -> String {
    if table.column_index(REFERENCE_COLUMN).is_none() {
        return "No competitor data available.".to_string();
    }
    let reference = column_series(table, REFERENCE_COLUMN);

    let mut predictions: Vec<(String, Crossing)> = Vec::new();
    for column in table.columns() {
        if !column.ends_with(STARS_SUFFIX) || column == REFERENCE_COLUMN {
            continue;
        }
        let competitor = column_series(table, column);
        if let Some(crossing) = predict_crossing(&reference, &competitor, &DEFAULT_WINDOWS, today) {
            let name = column.trim_end_matches(STARS_SUFFIX).to_string();
            predictions.push((name, crossing));
        }
    }
    if predictions.is_empty() {
        return "No upcoming crossovers predicted.".to_string();
    }
    let ranked = rank_crossings(predictions, TOP_CROSSOVERS);
    readme::crossover_table(&ranked, today)
}

fn growth_body(table: &Table) -> Option<String> {
    let name_index = table.column_index("repo_name")?;

    let mut names: Vec<String> = table.rows().map(|row| row[name_index].clone()).collect();
    names.sort();
    names.dedup();

    let latest = names
        .iter()
        .filter_map(|name| repo_series(table, name, name_index).last_date())
        .max()?;
    let earliest = names
        .iter()
        .filter_map(|name| repo_series(table, name, name_index).first_date())
        .min()?;
    let window_start = std::cmp::max(latest - Duration::days(GROWTH_WINDOW_DAYS - 1), earliest);
    let range = DateRange::new(window_start, latest);

    let mut repos: Vec<RepoGrowth> = names
        .into_iter()
        .filter_map(|name| {
            let series = repo_series(table, &name, name_index).reindex(range);
            let growth = series.last_value()? - series.points().first()?.1;
            Some(RepoGrowth { name, series, growth })
        })
        .collect();
    // fastest growers first, ties broken by name
    repos.sort_by(|a, b| b.growth.cmp(&a.growth).then_with(|| a.name.cmp(&b.name)));
    repos.truncate(TOP_GROWERS);
    if repos.is_empty() {
        return None;
    }

    let body = format!(
        "Data window: {} → {} (UTC)\n\n{}\n\n{}",
        range.start.format("%Y-%m-%d"),
        range.end.format("%Y-%m-%d"),
        readme::growth_table(&repos),
        readme::growth_summary(&repos)
    );
    Some(body)
}

fn repo_series(table: &Table, name: &str, name_index: usize) -> CumulativeSeries {
    let date_index = match table.column_index("date") {
        Some(index) => index,
        None => return CumulativeSeries::default(),
    };
    let value_index = match table.column_index("github_stars") {
        Some(index) => index,
        None => return CumulativeSeries::default(),
    };
    let points = table
        .rows()
        .filter(|row| row[name_index] == name)
        .filter_map(|row| {
            let date = NaiveDate::parse_from_str(&row[date_index], "%Y-%m-%d").ok()?;
            let value = row[value_index].parse::<i64>().ok()?;
            Some((date, value))
        })
        .collect();
    CumulativeSeries::from_points(points)
}

pub fn run(args: &Args) -> Result<()> {
    let competitors_path = args.path(super::fetch_history::COMPETITORS_FILE);
    let competitors = match Table::read(&competitors_path, 1)? {
        Some(table) => table,
        None => {
            warn!("{} not found, run fetch-history first", competitors_path.display());
            return Ok(());
        }
    };
    let top_repos_path = args.path(super::fetch_top_repos::TOP_REPOS_FILE);
    let top_repos = match Table::read(&top_repos_path, 2)? {
        Some(table) => table,
        None => {
            warn!("{} not found, run fetch-top-repos first", top_repos_path.display());
            return Ok(());
        }
    };

    let readme_path = args.path(README_FILE);
    let mut text = match std::fs::read_to_string(&readme_path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!("{} not found, nothing to update", readme_path.display());
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let today = Utc::now().date_naive();
    text = readme::replace_section(
        &text,
        readme::CROSSOVER_HEADER,
        readme::CROSSOVER_START,
        readme::CROSSOVER_END,
        &crossover_body(&competitors, today),
    );
    if let Some(body) = growth_body(&top_repos) {
        text = readme::replace_section(
            &text,
            readme::FASTEST_HEADER,
            readme::FASTEST_START,
            readme::FASTEST_END,
            &body,
        );
    }
    std::fs::write(&readme_path, text)?;
    info!("Updated {}", readme_path.display());
    Ok(())
}
