mod args;
mod probe;

use std::collections::BTreeMap;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use preflight_common::{
    gpu, Category, CheckOutcome, EnvCheckRecord, TorchDetails, CHECK_CUDA_AVAILABLE,
    CHECK_NVIDIA_SMI, CHECK_SGLANG_IMPORT,
};
use preflight_store::{DirStore, ResultStore};

use crate::args::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::info!(node = %args.node_name, "probing node environment");

    let gpus = gpu::read_gpu_info().await;
    let driver_version = gpus
        .first()
        .map(|g| g.driver_version.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let cuda_version = probe::cuda_version().await;
    let python_version = probe::python_version(&args.python_bin).await;
    let torch = probe::torch_details(&args.python_bin).await;
    let sglang_ok = probe::sglang_importable(&args.python_bin).await;

    let cuda_available = torch.as_ref().map(|(_, cuda)| *cuda).unwrap_or(false);

    let mut checks: BTreeMap<String, CheckOutcome> = BTreeMap::new();
    checks.insert(
        CHECK_NVIDIA_SMI.to_string(),
        CheckOutcome::from_bool(!gpus.is_empty()),
    );
    checks.insert(
        CHECK_CUDA_AVAILABLE.to_string(),
        CheckOutcome::from_bool(cuda_available),
    );
    checks.insert(
        CHECK_SGLANG_IMPORT.to_string(),
        CheckOutcome::from_bool(sglang_ok),
    );

    let record = EnvCheckRecord {
        node_name: args.node_name.clone(),
        gpu_count: gpus.len() as u32,
        nvidia_driver_version: driver_version,
        cuda_version: cuda_version.unwrap_or_else(|| "unknown".to_string()),
        python_version: python_version.unwrap_or_else(|| "unknown".to_string()),
        torch_details: torch
            .map(|(torch_version, cuda_available)| TorchDetails {
                torch_version,
                cuda_available,
            })
            .unwrap_or_default(),
        checks,
    };

    for (name, outcome) in &record.checks {
        if outcome.is_fail() {
            tracing::warn!(node = %args.node_name, check = %name, "sub-check failed");
        }
    }

    let store = DirStore::new(&args.output_dir);
    store
        .write(
            Category::EnvCheck,
            &args.node_name,
            serde_json::to_vec_pretty(&record)?,
        )
        .await?;
    tracing::info!(
        node = %args.node_name,
        gpu_count = record.gpu_count,
        dir = %args.output_dir,
        "environment record written"
    );

    print_summary(&record);
    Ok(())
}

fn print_summary(record: &EnvCheckRecord) {
    println!("\n=== Environment Check: {} ===", record.node_name);
    println!("  {:<16}: {}", "GPUs", record.gpu_count);
    println!("  {:<16}: {}", "Driver", record.nvidia_driver_version);
    println!("  {:<16}: {}", "CUDA", record.cuda_version);
    println!("  {:<16}: {}", "Python", record.python_version);
    println!("  {:<16}: {}", "Torch", record.torch_details.torch_version);
    for (name, outcome) in &record.checks {
        let mark = if outcome.is_fail() { "FAIL" } else { "ok" };
        println!("  check {:<20} {}", name, mark);
    }
    println!();
}
