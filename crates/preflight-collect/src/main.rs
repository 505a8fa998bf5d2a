mod args;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use preflight_collect::render::{print_report, render_markdown};
use preflight_collect::{
    summarize_allreduce, summarize_cublas, summarize_env_checks, summarize_perf, OverallStatus,
    Report,
};
use preflight_common::Category;
use preflight_store::{DirStore, ResultStore};

use crate::args::Args;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let store = DirStore::new(&args.results_dir);
    tracing::info!(dir = %args.results_dir.display(), "collecting results");

    let env_records = store.list(Category::EnvCheck).await?;
    let allreduce_records = store.list(Category::AllReduce).await?;
    let perf_records = store.list(Category::Perf).await?;
    let cublas_records = store.list(Category::Cublas).await?;
    tracing::info!(
        env_check = env_records.len(),
        nccl_allreduce = allreduce_records.len(),
        nccl_perf = perf_records.len(),
        cublas = cublas_records.len(),
        "result records discovered"
    );

    let report = Report::compile(
        summarize_env_checks(&env_records, &args.expected_nodes),
        summarize_allreduce(&allreduce_records),
        summarize_perf(&perf_records),
        summarize_cublas(&cublas_records),
    );

    let output_file = args
        .output_file
        .clone()
        .unwrap_or_else(|| args.results_dir.join("test_report.json"));
    if let Some(parent) = output_file.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    tokio::fs::write(&output_file, serde_json::to_vec_pretty(&report)?)
        .await
        .with_context(|| format!("failed to write {}", output_file.display()))?;

    let md_file = output_file.with_extension("md");
    tokio::fs::write(&md_file, render_markdown(&report))
        .await
        .with_context(|| format!("failed to write {}", md_file.display()))?;

    print_report(&report);
    tracing::info!(
        json = %output_file.display(),
        markdown = %md_file.display(),
        "report written"
    );

    // The exit code is the sole machine-actionable verdict.
    Ok(if report.summary.overall_status == OverallStatus::Pass {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
