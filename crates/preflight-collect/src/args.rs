use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
pub struct Args {
    /// Directory scanned for per-node result records.
    #[arg(long, env = "RESULTS_DIR", default_value = "/results")]
    pub results_dir: PathBuf,

    /// Report output file; defaults to `test_report.json` inside the results
    /// directory. The Markdown rendering lands next to it.
    #[arg(long, env = "OUTPUT_FILE")]
    pub output_file: Option<PathBuf>,

    /// Node names that are expected to have checked in. When set, an expected
    /// node missing from a partially populated env-check category is reported
    /// as an issue instead of passing silently.
    #[arg(long, env = "EXPECTED_NODES", value_delimiter = ',')]
    pub expected_nodes: Vec<String>,
}
