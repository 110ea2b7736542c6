use anyhow::Result;
use clap::Parser;
use star_history_app::args::Args;
use star_history_app::commands;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    let args = Args::parse();
    commands::fetch_history::run(&args).await
}
