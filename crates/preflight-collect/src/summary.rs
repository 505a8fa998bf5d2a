use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use preflight_common::{
    AllReduceRecord, CategoryStatus, CheckOutcome, CublasRecord, EnvCheckRecord, PerfRecord,
    CHECK_CUDA_AVAILABLE, CHECK_NVIDIA_SMI, CHECK_SGLANG_IMPORT,
};
use preflight_store::RawRecord;

/// Stand-in for a record that was present on the store but unparsable. One
/// bad file never blocks visibility into the rest of the cluster; it is
/// carried as data instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadError {
    pub file: String,
    pub error: String,
}

fn decode<T: serde::de::DeserializeOwned>(raw: &RawRecord) -> Result<T, ReadError> {
    serde_json::from_slice(&raw.bytes).map_err(|e| ReadError {
        file: raw.name.clone(),
        error: e.to_string(),
    })
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// The set of known version values observed across nodes, sorted and
/// deduplicated. `"unknown"` observations are excluded: a node that failed
/// to detect its own version must not break cluster-wide consistency.
pub fn known_versions<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let set: BTreeSet<&str> = values.into_iter().filter(|v| *v != "unknown").collect();
    set.into_iter().map(String::from).collect()
}

/// Consistency holds iff at most one distinct known value was observed.
pub fn versions_consistent(known: &[String]) -> bool {
    known.len() <= 1
}

// ---------------------------------------------------------------------------
// EnvCheck
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvNode {
    pub name: String,
    pub gpu_count: u32,
    pub driver_version: String,
    pub cuda_version: String,
    pub python_version: String,
    pub torch_version: String,
    pub cuda_available: bool,
    pub checks: BTreeMap<String, CheckOutcome>,
}

impl EnvNode {
    fn from_record(rec: EnvCheckRecord) -> Self {
        Self {
            name: rec.node_name,
            gpu_count: rec.gpu_count,
            driver_version: rec.nvidia_driver_version,
            cuda_version: rec.cuda_version,
            python_version: rec.python_version,
            torch_version: rec.torch_details.torch_version,
            cuda_available: rec.torch_details.cuda_available,
            checks: rec.checks,
        }
    }

    fn unknown() -> Self {
        Self {
            name: "unknown".to_string(),
            gpu_count: 0,
            driver_version: "unknown".to_string(),
            cuda_version: "unknown".to_string(),
            python_version: "unknown".to_string(),
            torch_version: "unknown".to_string(),
            cuda_available: false,
            checks: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionConsistency {
    pub driver_consistent: bool,
    pub cuda_consistent: bool,
    pub torch_consistent: bool,
    pub driver_versions: Vec<String>,
    pub cuda_versions: Vec<String>,
    pub torch_versions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvCheckSummary {
    pub status: CategoryStatus,
    pub total_nodes: usize,
    pub nodes: Vec<EnvNode>,
    pub issues: Vec<String>,
    pub consistency: VersionConsistency,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub read_errors: Vec<ReadError>,
}

/// `expected_nodes` gates partial coverage: when non-empty and at least one
/// record was discovered, every expected node without a record becomes an
/// issue. A fully absent category stays `no_results` (the check never ran,
/// which is not the same as nodes going missing mid-run).
pub fn summarize_env_checks(records: &[RawRecord], expected_nodes: &[String]) -> EnvCheckSummary {
    let mut nodes = Vec::new();
    let mut issues = Vec::new();
    let mut read_errors = Vec::new();

    for raw in records {
        match decode::<EnvCheckRecord>(raw) {
            Ok(rec) => {
                let node = EnvNode::from_record(rec);
                if check_failed(&node, CHECK_NVIDIA_SMI) {
                    issues.push(format!("{}: nvidia-smi unavailable", node.name));
                }
                if check_failed(&node, CHECK_CUDA_AVAILABLE) {
                    issues.push(format!("{}: CUDA unavailable", node.name));
                }
                if check_failed(&node, CHECK_SGLANG_IMPORT) {
                    issues.push(format!("{}: sglang import failed", node.name));
                }
                nodes.push(node);
            }
            Err(e) => {
                tracing::warn!(file = %e.file, error = %e.error, "unreadable env-check record");
                read_errors.push(e);
                nodes.push(EnvNode::unknown());
            }
        }
    }

    if !nodes.is_empty() {
        for expected in expected_nodes {
            if !nodes.iter().any(|n| &n.name == expected) {
                issues.push(format!("{expected}: no env_check record"));
            }
        }
    }

    let driver_versions = known_versions(nodes.iter().map(|n| n.driver_version.as_str()));
    let cuda_versions = known_versions(nodes.iter().map(|n| n.cuda_version.as_str()));
    let torch_versions = known_versions(nodes.iter().map(|n| n.torch_version.as_str()));

    let driver_consistent = versions_consistent(&driver_versions);
    let cuda_consistent = versions_consistent(&cuda_versions);
    let torch_consistent = versions_consistent(&torch_versions);

    if !driver_consistent {
        issues.push(format!(
            "driver version mismatch across nodes: {}",
            driver_versions.join(", ")
        ));
    }
    if !cuda_consistent {
        issues.push(format!(
            "CUDA version mismatch across nodes: {}",
            cuda_versions.join(", ")
        ));
    }
    if !torch_consistent {
        issues.push(format!(
            "torch version mismatch across nodes: {}",
            torch_versions.join(", ")
        ));
    }

    let status = if nodes.is_empty() {
        CategoryStatus::NoResults
    } else if issues.is_empty() {
        CategoryStatus::Success
    } else {
        CategoryStatus::Warning
    };

    EnvCheckSummary {
        status,
        total_nodes: nodes.len(),
        nodes,
        issues,
        consistency: VersionConsistency {
            driver_consistent,
            cuda_consistent,
            torch_consistent,
            driver_versions,
            cuda_versions,
            torch_versions,
        },
        read_errors,
    }
}

fn check_failed(node: &EnvNode, check: &str) -> bool {
    node.checks.get(check).map(|c| c.is_fail()).unwrap_or(false)
}

// ---------------------------------------------------------------------------
// AllReduce
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllReduceSummary {
    pub status: CategoryStatus,
    pub world_size: u32,
    pub bandwidth_gbps: f64,
    pub elapsed_time_s: f64,
    pub tensor_size_mb: f64,
    pub details: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub read_errors: Vec<ReadError>,
}

pub fn summarize_allreduce(records: &[RawRecord]) -> AllReduceSummary {
    let mut details = Vec::new();
    let mut parsed: Vec<AllReduceRecord> = Vec::new();
    let mut read_errors = Vec::new();

    for raw in records {
        match decode::<Value>(raw) {
            Ok(value) => {
                if let Ok(rec) = serde_json::from_value::<AllReduceRecord>(value.clone()) {
                    parsed.push(rec);
                }
                details.push(value);
            }
            Err(e) => {
                tracing::warn!(file = %e.file, error = %e.error, "unreadable all-reduce record");
                details.push(json!({ "error": e.error, "file": e.file }));
                read_errors.push(e);
            }
        }
    }

    if details.is_empty() {
        return AllReduceSummary {
            status: CategoryStatus::NoResults,
            world_size: 0,
            bandwidth_gbps: 0.0,
            elapsed_time_s: 0.0,
            tensor_size_mb: 0.0,
            details,
            read_errors,
        };
    }

    // Lowest rank present is the representative; discovery order never
    // decides the headline numbers.
    let representative = parsed.iter().min_by_key(|r| r.rank);

    AllReduceSummary {
        status: CategoryStatus::Success,
        world_size: representative
            .map(|r| r.world_size)
            .unwrap_or(details.len() as u32),
        bandwidth_gbps: representative.map(|r| r.bandwidth_gbps).unwrap_or(0.0),
        elapsed_time_s: representative.map(|r| r.elapsed_time_s).unwrap_or(0.0),
        tensor_size_mb: representative.map(|r| r.tensor_size_mb).unwrap_or(0.0),
        details,
        read_errors,
    }
}

// ---------------------------------------------------------------------------
// Perf
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerfNode {
    pub node: String,
    pub avg_bandwidth_gbps: f64,
    pub results: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerfSummary {
    pub status: CategoryStatus,
    pub total_nodes: usize,
    pub overall_avg_bandwidth_gbps: f64,
    pub nodes: Vec<PerfNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub read_errors: Vec<ReadError>,
}

pub fn summarize_perf(records: &[RawRecord]) -> PerfSummary {
    let mut nodes = Vec::new();
    let mut read_errors = Vec::new();

    for raw in records {
        match decode::<PerfRecord>(raw) {
            Ok(rec) => nodes.push(PerfNode {
                node: rec.node_name,
                avg_bandwidth_gbps: rec.avg_bus_bandwidth_gbps,
                results: rec.results,
            }),
            Err(e) => {
                tracing::warn!(file = %e.file, error = %e.error, "unreadable perf record");
                read_errors.push(e);
                nodes.push(PerfNode {
                    node: "unknown".to_string(),
                    avg_bandwidth_gbps: 0.0,
                    results: Vec::new(),
                });
            }
        }
    }

    // Zero means "no valid measurement" and is excluded from the average,
    // not treated as a zero sample.
    let positive: Vec<f64> = nodes
        .iter()
        .map(|n| n.avg_bandwidth_gbps)
        .filter(|bw| *bw > 0.0)
        .collect();
    let overall = if positive.is_empty() {
        0.0
    } else {
        round2(positive.iter().sum::<f64>() / positive.len() as f64)
    };

    PerfSummary {
        status: if nodes.is_empty() {
            CategoryStatus::NoResults
        } else {
            CategoryStatus::Success
        },
        total_nodes: nodes.len(),
        overall_avg_bandwidth_gbps: overall,
        nodes,
        read_errors,
    }
}

// ---------------------------------------------------------------------------
// Cublas
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CublasNode {
    pub node: String,
    pub matrix_size: String,
    pub avg_time_ms: f64,
    pub tflops: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CublasSummary {
    pub status: CategoryStatus,
    pub total_nodes: usize,
    pub nodes: Vec<CublasNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub read_errors: Vec<ReadError>,
}

pub fn summarize_cublas(records: &[RawRecord]) -> CublasSummary {
    let mut nodes = Vec::new();
    let mut read_errors = Vec::new();

    for raw in records {
        match decode::<CublasRecord>(raw) {
            Ok(rec) => nodes.push(CublasNode {
                node: rec.node_name,
                matrix_size: rec.matrix_size,
                avg_time_ms: rec.avg_time_ms,
                tflops: rec.tflops,
            }),
            Err(e) => {
                tracing::warn!(file = %e.file, error = %e.error, "unreadable cublas record");
                read_errors.push(e);
                nodes.push(CublasNode {
                    node: "unknown".to_string(),
                    matrix_size: "unknown".to_string(),
                    avg_time_ms: 0.0,
                    tflops: 0.0,
                });
            }
        }
    }

    CublasSummary {
        status: if nodes.is_empty() {
            CategoryStatus::NoResults
        } else {
            CategoryStatus::Success
        },
        total_nodes: nodes.len(),
        nodes,
        read_errors,
    }
}
