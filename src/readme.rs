//! README section templating.
//!
//! Generated blocks live between HTML-comment markers so reruns replace
//! them in place instead of appending duplicates.

use chrono::NaiveDate;
use star_history::accumulate::CumulativeSeries;
use star_history::predict::Crossing;

pub const CROSSOVER_HEADER: &str = "## Upcoming Crossovers";
pub const CROSSOVER_START: &str = "<!-- START upcoming-crossovers -->";
pub const CROSSOVER_END: &str = "<!-- END upcoming-crossovers -->";

pub const FASTEST_HEADER: &str = "## Fastest Growing jdx Repos (30 Days)";
pub const FASTEST_START: &str = "<!-- START fastest-growing -->";
pub const FASTEST_END: &str = "<!-- END fastest-growing -->";

/// Replaces the marker-bounded block with `body`, or appends a fresh
/// section (header plus markers) when the markers are absent. Applying the
/// same body twice yields identical text.
pub fn replace_section(
    text: &str,
    header: &str,
    start_marker: &str,
    end_marker: &str,
    body: &str,
) -> String {
    if let (Some(start), Some(end)) = (text.find(start_marker), text.find(end_marker)) {
        if start < end {
            let mut out = String::with_capacity(text.len() + body.len());
            out.push_str(&text[..start + start_marker.len()]);
            out.push_str("\n\n");
            out.push_str(body);
            out.push_str("\n\n");
            out.push_str(&text[end..]);
            return out;
        }
    }
    // markers absent or out of order: drop any stale ones, then append a
    // fresh block
    let stripped = text.replace(start_marker, "").replace(end_marker, "");
    let mut out = stripped.trim_end_matches('\n').to_string();
    if !out.is_empty() {
        out.push_str("\n\n");
    }
    out.push_str(header);
    out.push_str("\n\n");
    out.push_str(start_marker);
    out.push_str("\n\n");
    out.push_str(body);
    out.push_str("\n\n");
    out.push_str(end_marker);
    out.push('\n');
    out
}

/// `12345` -> `12,345`.
pub fn format_count(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    let lead = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - lead) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Signed variant of [`format_count`]: `+1,234`, `-5`, `+0`.
pub fn format_delta(value: i64) -> String {
    if value >= 0 {
        format!("+{}", format_count(value))
    } else {
        format_count(value)
    }
}

/// Markdown table of the soonest predicted crossovers.
pub fn crossover_table(predictions: &[(String, Crossing)], today: NaiveDate) -> String {
    let mut lines = vec![
        "| Competitor | Expected Crossover | Days Until | mise lead gain (stars/day) |".to_string(),
        "| --- | --- | --- | --- |".to_string(),
    ];
    for (competitor, crossing) in predictions {
        let days_until = (crossing.date - today).num_days().max(0);
        lines.push(format!(
            "| {} | {} | {} | {:.1} |",
            competitor,
            crossing.date.format("%Y-%m-%d"),
            days_until,
            crossing.daily_gain
        ));
    }
    lines.join("\n")
}

/// One repository's reindexed window series and its growth over the window.
pub struct RepoGrowth {
    pub name: String,
    pub series: CumulativeSeries,
    pub growth: i64,
}

/// Markdown table with one row per window day and a `total (+delta)` cell
/// per repository.
pub fn growth_table(repos: &[RepoGrowth]) -> String {
    let mut header = vec!["Date".to_string()];
    header.extend(repos.iter().map(|repo| repo.name.clone()));
    let mut lines = vec![
        format!("| {} |", header.join(" | ")),
        format!("| {} |", vec!["---"; header.len()].join(" | ")),
    ];

    let days = match repos.first() {
        Some(repo) => repo.series.len(),
        None => 0,
    };
    for index in 0..days {
        let date = repos[0].series.points()[index].0;
        let mut cells = vec![date.format("%Y-%m-%d").to_string()];
        for repo in repos {
            let points = repo.series.points();
            let value = points[index].1;
            let delta = if index == 0 { 0 } else { value - points[index - 1].1 };
            cells.push(format!("{} ({})", format_count(value), format_delta(delta)));
        }
        lines.push(format!("| {} |", cells.join(" | ")));
    }
    lines.join("\n")
}

/// Summary bullets under the growth table.
pub fn growth_summary(repos: &[RepoGrowth]) -> String {
    repos
        .iter()
        .map(|repo| format!("- `{}` grew by {} stars", repo.name, format_delta(repo.growth)))
        .collect::<Vec<_>>()
        .join("\n")
}
