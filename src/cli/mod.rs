use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "cvevault")]
#[command(about = "Archive web pages referenced by CVE records", long_about = None)]
pub struct Cli {
    /// Dataset JSON file: an array of {cve_id, urls} objects
    #[arg(short, long, default_value = "dataset.json")]
    pub dataset: PathBuf,

    /// SQLite database to archive into
    #[arg(long, default_value = "cvevault.sqlite3")]
    pub db: PathBuf,

    /// Number of concurrent workers; overrides the config file
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
