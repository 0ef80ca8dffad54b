use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(author, version, long_about = None)]
#[command(name = "posts-demo")]
#[command(about = "Walks the post cache and mutation flow against the mock store")]
pub struct Cli {
    /// JSON file with `store`, `cache` and `query` sections.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Overrides every simulated store latency.
    #[arg(long)]
    pub latency_ms: Option<u64>,

    /// Per-call timeout in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

impl Cli {
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config
            .clone()
            .or_else(|| std::env::var("POSTS_DEMO_CONFIG").ok().map(PathBuf::from))
    }
}
