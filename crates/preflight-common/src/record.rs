use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Names of the env-check sub-checks shared between the probe that writes
/// them and the aggregator that inspects them.
pub const CHECK_NVIDIA_SMI: &str = "nvidia_smi";
pub const CHECK_CUDA_AVAILABLE: &str = "cuda_available";
pub const CHECK_SGLANG_IMPORT: &str = "sglang_import";

fn unknown() -> String {
    "unknown".to_string()
}

/// Pass/fail verdict of a single named sub-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckOutcome {
    Pass,
    Fail,
}

impl CheckOutcome {
    pub fn from_bool(ok: bool) -> Self {
        if ok {
            CheckOutcome::Pass
        } else {
            CheckOutcome::Fail
        }
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, CheckOutcome::Fail)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorchDetails {
    #[serde(default = "unknown")]
    pub torch_version: String,
    #[serde(default)]
    pub cuda_available: bool,
}

impl Default for TorchDetails {
    fn default() -> Self {
        Self {
            torch_version: unknown(),
            cuda_available: false,
        }
    }
}

/// One node's environment probe result. Every field tolerates absence so a
/// partially written record still aggregates; unknown versions are excluded
/// from cross-node consistency comparison rather than treated as mismatches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvCheckRecord {
    #[serde(default = "unknown")]
    pub node_name: String,
    #[serde(default)]
    pub gpu_count: u32,
    #[serde(default = "unknown")]
    pub nvidia_driver_version: String,
    #[serde(default = "unknown")]
    pub cuda_version: String,
    #[serde(default = "unknown")]
    pub python_version: String,
    #[serde(default)]
    pub torch_details: TorchDetails,
    #[serde(default)]
    pub checks: BTreeMap<String, CheckOutcome>,
}

/// One rank's all-reduce bandwidth measurement. `rank` and `world_size` are
/// required: an object without them is not a usable measurement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllReduceRecord {
    #[serde(default = "AllReduceRecord::test_tag")]
    pub test: String,
    #[serde(default = "unknown")]
    pub node_name: String,
    #[serde(default = "unknown")]
    pub master_addr: String,
    pub rank: u32,
    #[serde(default)]
    pub local_rank: u32,
    pub world_size: u32,
    #[serde(default)]
    pub tensor_size_mb: f64,
    #[serde(default)]
    pub tensor_size_bytes: u64,
    #[serde(default)]
    pub iterations: u32,
    #[serde(default)]
    pub elapsed_time_s: f64,
    #[serde(default)]
    pub bandwidth_gbps: f64,
    #[serde(default = "unknown")]
    pub status: String,
}

impl AllReduceRecord {
    fn test_tag() -> String {
        "nccl_allreduce".to_string()
    }
}

/// One node's bus-bandwidth sweep. A zero average means "no valid
/// measurement", not a measured zero. The per-size sub-measurements are
/// opaque to the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerfRecord {
    #[serde(default = "unknown")]
    pub node_name: String,
    #[serde(default)]
    pub avg_bus_bandwidth_gbps: f64,
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
}

/// One node's matmul throughput result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CublasRecord {
    #[serde(default = "unknown")]
    pub node_name: String,
    #[serde(default = "unknown")]
    pub matrix_size: String,
    #[serde(default = "unknown")]
    pub data_type: String,
    #[serde(default)]
    pub iterations: u32,
    #[serde(default)]
    pub avg_time_ms: f64,
    #[serde(default)]
    pub tflops: f64,
    #[serde(default = "unknown")]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_check_record_defaults() {
        let rec: EnvCheckRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(rec.node_name, "unknown");
        assert_eq!(rec.gpu_count, 0);
        assert_eq!(rec.torch_details.torch_version, "unknown");
        assert!(!rec.torch_details.cuda_available);
        assert!(rec.checks.is_empty());
    }

    #[test]
    fn test_check_outcome_lowercase() {
        let rec: EnvCheckRecord = serde_json::from_str(
            r#"{"node_name": "n1", "checks": {"nvidia_smi": "pass", "cuda_available": "fail"}}"#,
        )
        .unwrap();
        assert_eq!(rec.checks[CHECK_NVIDIA_SMI], CheckOutcome::Pass);
        assert!(rec.checks[CHECK_CUDA_AVAILABLE].is_fail());
    }

    #[test]
    fn test_allreduce_record_requires_rank_and_world_size() {
        assert!(serde_json::from_str::<AllReduceRecord>("{}").is_err());
        let rec: AllReduceRecord =
            serde_json::from_str(r#"{"rank": 1, "world_size": 4}"#).unwrap();
        assert_eq!(rec.rank, 1);
        assert_eq!(rec.world_size, 4);
        assert_eq!(rec.test, "nccl_allreduce");
        assert_eq!(rec.bandwidth_gbps, 0.0);
    }
}
