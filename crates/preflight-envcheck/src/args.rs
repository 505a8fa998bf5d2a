use clap::Parser;

#[derive(Debug, Parser)]
pub struct Args {
    /// Name this node's record is keyed by on the result store.
    #[arg(long, env = "NODE_NAME", default_value = "unknown")]
    pub node_name: String,

    /// Shared result store directory.
    #[arg(long, env = "OUTPUT_DIR", default_value = "/results")]
    pub output_dir: String,

    /// Python interpreter used for the torch/sglang probes.
    #[arg(long, default_value = "python3")]
    pub python_bin: String,
}
