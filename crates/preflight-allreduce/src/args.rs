use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Rendezvous over TCP at the master address.
    Tcp,
    /// Single-participant group, no communication.
    Loopback,
}

#[derive(Debug, Parser)]
pub struct Args {
    /// This process's rank, assigned by the launcher.
    #[arg(long, env = "RANK")]
    pub rank: u32,

    /// Total participant count.
    #[arg(long, env = "WORLD_SIZE")]
    pub world_size: u32,

    /// Device index on this node.
    #[arg(long, env = "LOCAL_RANK", default_value_t = 0)]
    pub local_rank: u32,

    #[arg(long, env = "MASTER_ADDR", default_value = "127.0.0.1")]
    pub master_addr: String,

    #[arg(long, env = "MASTER_PORT", default_value_t = 29500)]
    pub master_port: u16,

    #[arg(long, env = "NODE_NAME", default_value = "unknown")]
    pub node_name: String,

    /// Shared result store directory.
    #[arg(long, env = "OUTPUT_DIR", default_value = "/results")]
    pub output_dir: String,

    /// Reduction buffer size in MiB.
    #[arg(long, default_value_t = 256)]
    pub tensor_mb: usize,

    #[arg(long, default_value_t = 5)]
    pub warmup_iters: u32,

    #[arg(long, default_value_t = 20)]
    pub iters: u32,

    /// Collective transport backend.
    #[arg(long, value_enum, default_value_t = Backend::Tcp)]
    pub backend: Backend,

    /// Fail before benchmarking unless nvidia-smi reports a device.
    #[arg(long, default_value_t = false)]
    pub require_gpu: bool,
}
