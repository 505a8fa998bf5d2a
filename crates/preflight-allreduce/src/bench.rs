use std::time::Instant;

use anyhow::Result;

use preflight_common::ProbeError;

use crate::collective::Collective;

/// Default reduction buffer: 256 MiB of f32.
pub const DEFAULT_TENSOR_BYTES: u64 = 256 * 1024 * 1024;
pub const DEFAULT_WARMUP_ITERS: u32 = 5;
pub const DEFAULT_ITERS: u32 = 20;

const FILL_VALUE: f32 = 1.0;

#[derive(Debug, Clone)]
pub struct BenchOptions {
    /// Number of f32 elements in the reduction buffer.
    pub elements: usize,
    /// Untimed operations to absorb first-call initialization cost.
    pub warmup_iters: u32,
    /// Timed operations.
    pub iters: u32,
}

impl Default for BenchOptions {
    fn default() -> Self {
        Self {
            elements: (DEFAULT_TENSOR_BYTES / std::mem::size_of::<f32>() as u64) as usize,
            warmup_iters: DEFAULT_WARMUP_ITERS,
            iters: DEFAULT_ITERS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BenchOutcome {
    pub tensor_bytes: u64,
    pub iterations: u32,
    pub elapsed_s: f64,
    pub bandwidth_gbps: f64,
}

/// Effective bandwidth of `iters` all-reduce operations over a `bytes`-sized
/// buffer, in GB/s (1e9 bytes/s). Each all-reduce over N participants moves
/// `2*(N-1)/N` times the buffer size (ring communication-volume model). A
/// single participant moves nothing, so its bandwidth is 0 by definition.
pub fn effective_bandwidth_gbps(
    bytes: u64,
    iters: u32,
    world_size: u32,
    elapsed_s: f64,
) -> Result<f64, ProbeError> {
    if world_size <= 1 {
        return Ok(0.0);
    }
    if !elapsed_s.is_finite() || elapsed_s <= 0.0 {
        return Err(ProbeError::Measurement(format!(
            "non-positive elapsed time: {elapsed_s}"
        )));
    }
    let n = world_size as f64;
    let volume = bytes as f64 * iters as f64 * 2.0 * (n - 1.0) / n;
    Ok(volume / elapsed_s / 1e9)
}

/// Warmup, timed phase, and bandwidth derivation over an established
/// collective group. The wall clock covers the whole timed batch, closed by
/// a synchronize so no outstanding operation leaks out of the measurement.
pub async fn run(collective: &mut dyn Collective, opts: &BenchOptions) -> Result<BenchOutcome> {
    let mut buf = vec![FILL_VALUE; opts.elements];
    let tensor_bytes = (opts.elements * std::mem::size_of::<f32>()) as u64;

    tracing::info!(
        rank = collective.rank(),
        tensor_bytes,
        warmup_iters = opts.warmup_iters,
        "warming up"
    );
    for _ in 0..opts.warmup_iters {
        collective.all_reduce(&mut buf).await?;
    }
    collective.synchronize().await?;

    let start = Instant::now();
    for _ in 0..opts.iters {
        collective.all_reduce(&mut buf).await?;
    }
    collective.synchronize().await?;
    let elapsed_s = start.elapsed().as_secs_f64();

    let bandwidth_gbps =
        effective_bandwidth_gbps(tensor_bytes, opts.iters, collective.world_size(), elapsed_s)?;

    tracing::info!(
        rank = collective.rank(),
        elapsed_s,
        bandwidth_gbps,
        "timed phase complete"
    );

    Ok(BenchOutcome {
        tensor_bytes,
        iterations: opts.iters,
        elapsed_s,
        bandwidth_gbps,
    })
}
