pub mod backfill_competitors;
pub mod fetch_history;
pub mod fetch_top_repos;
pub mod generate_readme;
