use std::path::{Path, PathBuf};

use clap::Parser;
use secrecy::SecretString;

/// Shared flags for every entry point. All of them default sensibly, so the
/// binaries run with no arguments; the overrides exist for tests and odd
/// deployments.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// API OAuth access token
    #[clap(long, env = "GITHUB_TOKEN")]
    pub api_token: Option<SecretString>,

    /// Repository API URL
    #[clap(long, env, default_value = "https://api.github.com")]
    pub api_url: String,

    /// Directory holding the CSV tables and README.md
    #[clap(long, env, default_value = ".")]
    pub data_dir: PathBuf,
}

impl Args {
    pub fn path(&self, file_name: impl AsRef<Path>) -> PathBuf {
        self.data_dir.join(file_name)
    }
}
