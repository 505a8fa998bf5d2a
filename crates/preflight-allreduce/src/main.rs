mod args;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use preflight_allreduce::{bench, BenchOptions, Collective, LoopbackCollective, TcpCollective};
use preflight_common::{gpu, AllReduceRecord, Category, ProbeError};
use preflight_store::{DirStore, ResultStore};

use crate::args::{Args, Backend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    if args.require_gpu {
        let gpus = gpu::read_gpu_info().await;
        if gpus.is_empty() {
            return Err(ProbeError::EnvironmentUnavailable(
                "no NVIDIA device visible to nvidia-smi".to_string(),
            )
            .into());
        }
        tracing::info!(
            gpu_count = gpus.len(),
            local_rank = args.local_rank,
            "local device present"
        );
    }

    tracing::info!(
        rank = args.rank,
        world_size = args.world_size,
        backend = ?args.backend,
        "starting all-reduce benchmark"
    );

    let mut collective: Box<dyn Collective> = match args.backend {
        Backend::Loopback => {
            if args.world_size != 1 {
                anyhow::bail!(
                    "loopback backend only supports world size 1 (got {})",
                    args.world_size
                );
            }
            Box::new(LoopbackCollective::new())
        }
        Backend::Tcp => Box::new(
            TcpCollective::connect(&args.master_addr, args.master_port, args.rank, args.world_size)
                .await?,
        ),
    };

    let opts = BenchOptions {
        elements: args.tensor_mb * 1024 * 1024 / std::mem::size_of::<f32>(),
        warmup_iters: args.warmup_iters,
        iters: args.iters,
    };
    let outcome = bench::run(collective.as_mut(), &opts).await?;

    let record = AllReduceRecord {
        test: "nccl_allreduce".to_string(),
        node_name: args.node_name.clone(),
        master_addr: args.master_addr.clone(),
        rank: args.rank,
        local_rank: args.local_rank,
        world_size: args.world_size,
        tensor_size_mb: outcome.tensor_bytes as f64 / 1e6,
        tensor_size_bytes: outcome.tensor_bytes,
        iterations: outcome.iterations,
        elapsed_time_s: round3(outcome.elapsed_s),
        bandwidth_gbps: round2(outcome.bandwidth_gbps),
        status: "success".to_string(),
    };

    let store = DirStore::new(&args.output_dir);
    store
        .write(
            Category::AllReduce,
            &format!("rank{}", args.rank),
            serde_json::to_vec_pretty(&record)?,
        )
        .await?;
    tracing::info!(rank = args.rank, dir = %args.output_dir, "benchmark record written");

    if args.rank == 0 {
        print_summary(&record);
    }

    Ok(())
}

fn print_summary(record: &AllReduceRecord) {
    println!("\n=== AllReduce Bandwidth ===");
    println!("  {:<14}: {}", "World size", record.world_size);
    println!("  {:<14}: {:.1} MB", "Tensor size", record.tensor_size_mb);
    println!("  {:<14}: {}", "Iterations", record.iterations);
    println!("  {:<14}: {:.3} s", "Elapsed time", record.elapsed_time_s);
    println!("  {:<14}: {:.2} GB/s", "Effective BW", record.bandwidth_gbps);
    println!();
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
