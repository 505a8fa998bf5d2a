use std::fmt::Write as _;

use preflight_common::CategoryStatus;

use crate::report::Report;

/// Console rendering of the report, derived from the `Report` value alone.
pub fn print_report(report: &Report) {
    println!("\n{}", "=".repeat(60));
    println!("Cluster Preflight Report");
    println!("{}", "=".repeat(60));
    println!("Generated at   : {}", report.generated_at.to_rfc3339());
    println!("Overall status : {}", report.summary.overall_status);
    println!();

    println!("## Test Status");
    for line in &report.summary.test_status {
        println!("  - {line}");
    }
    println!();

    if !report.summary.issues.is_empty() {
        println!("## Issues");
        for issue in &report.summary.issues {
            println!("  - {issue}");
        }
        println!();
    }

    let env = &report.details.env_check;
    if env.status != CategoryStatus::NoResults {
        println!("## Environment Check");
        println!("  Nodes checked     : {}", env.total_nodes);
        println!("  Driver consistent : {}", yes_no(env.consistency.driver_consistent));
        println!("  CUDA consistent   : {}", yes_no(env.consistency.cuda_consistent));
        println!("  Torch consistent  : {}", yes_no(env.consistency.torch_consistent));
        if !env.consistency.driver_versions.is_empty() {
            println!("  Driver versions   : {}", env.consistency.driver_versions.join(", "));
        }
        if !env.consistency.cuda_versions.is_empty() {
            println!("  CUDA versions     : {}", env.consistency.cuda_versions.join(", "));
        }
        if !env.consistency.torch_versions.is_empty() {
            println!("  Torch versions    : {}", env.consistency.torch_versions.join(", "));
        }
        println!();
    }

    let allreduce = &report.details.nccl_allreduce;
    if allreduce.status == CategoryStatus::Success {
        println!("## AllReduce Interconnect");
        println!("  World size   : {}", allreduce.world_size);
        println!("  Effective BW : {:.2} GB/s", allreduce.bandwidth_gbps);
        println!();
    }

    let perf = &report.details.nccl_perf;
    if perf.status == CategoryStatus::Success {
        println!("## NCCL Performance");
        println!("  Nodes tested : {}", perf.total_nodes);
        println!("  Average BW   : {:.2} GB/s", perf.overall_avg_bandwidth_gbps);
        for node in &perf.nodes {
            println!("    - {}: {:.2} GB/s", node.node, node.avg_bandwidth_gbps);
        }
        println!();
    }

    let cublas = &report.details.cublas;
    if cublas.status == CategoryStatus::Success {
        println!("## cuBLAS Compute");
        println!("  Nodes tested : {}", cublas.total_nodes);
        for node in &cublas.nodes {
            println!("    - {}: {:.1} TFLOPS", node.node, node.tflops);
        }
        println!();
    }

    println!("{}", "=".repeat(60));
}

/// Markdown rendering of the report, written next to the JSON output.
pub fn render_markdown(report: &Report) -> String {
    let mut md = String::new();

    let _ = writeln!(md, "# Cluster Preflight Report\n");
    let _ = writeln!(md, "Generated at: {}\n", report.generated_at.to_rfc3339());
    let _ = writeln!(md, "Overall status: **{}**\n", report.summary.overall_status);

    let _ = writeln!(md, "## Test Status\n");
    for line in &report.summary.test_status {
        let _ = writeln!(md, "- {line}");
    }
    let _ = writeln!(md);

    if !report.summary.issues.is_empty() {
        let _ = writeln!(md, "## Issues\n");
        for issue in &report.summary.issues {
            let _ = writeln!(md, "- {issue}");
        }
        let _ = writeln!(md);
    }

    let env = &report.details.env_check;
    if env.status != CategoryStatus::NoResults {
        let _ = writeln!(md, "## Environment Check\n");
        let _ = writeln!(md, "| Node | GPUs | Driver | CUDA | Python | Torch |");
        let _ = writeln!(md, "|------|------|--------|------|--------|-------|");
        for node in &env.nodes {
            let _ = writeln!(
                md,
                "| {} | {} | {} | {} | {} | {} |",
                node.name,
                node.gpu_count,
                node.driver_version,
                node.cuda_version,
                node.python_version,
                node.torch_version
            );
        }
        let _ = writeln!(md);
        let _ = writeln!(
            md,
            "Driver consistent: {}, CUDA consistent: {}, Torch consistent: {}\n",
            yes_no(env.consistency.driver_consistent),
            yes_no(env.consistency.cuda_consistent),
            yes_no(env.consistency.torch_consistent)
        );
    }

    let allreduce = &report.details.nccl_allreduce;
    if allreduce.status == CategoryStatus::Success {
        let _ = writeln!(md, "## AllReduce Interconnect\n");
        let _ = writeln!(md, "- World size: {}", allreduce.world_size);
        let _ = writeln!(md, "- Tensor size: {:.1} MB", allreduce.tensor_size_mb);
        let _ = writeln!(md, "- Elapsed time: {:.3} s", allreduce.elapsed_time_s);
        let _ = writeln!(md, "- Effective bandwidth: {:.2} GB/s\n", allreduce.bandwidth_gbps);
    }

    let perf = &report.details.nccl_perf;
    if perf.status == CategoryStatus::Success {
        let _ = writeln!(md, "## NCCL Performance\n");
        let _ = writeln!(
            md,
            "Average bus bandwidth across {} node(s): {:.2} GB/s\n",
            perf.total_nodes, perf.overall_avg_bandwidth_gbps
        );
        for node in &perf.nodes {
            let _ = writeln!(md, "- {}: {:.2} GB/s", node.node, node.avg_bandwidth_gbps);
        }
        let _ = writeln!(md);
    }

    let cublas = &report.details.cublas;
    if cublas.status == CategoryStatus::Success {
        let _ = writeln!(md, "## cuBLAS Compute\n");
        for node in &cublas.nodes {
            let _ = writeln!(
                md,
                "- {}: {} avg {:.3} ms, {:.1} TFLOPS",
                node.node, node.matrix_size, node.avg_time_ms, node.tflops
            );
        }
        let _ = writeln!(md);
    }

    md
}

fn yes_no(v: bool) -> &'static str {
    if v {
        "yes"
    } else {
        "no"
    }
}
