use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use preflight_common::{Category, CategoryStatus};

use crate::summary::{AllReduceSummary, CublasSummary, EnvCheckSummary, PerfSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallStatus {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "WARNING")]
    Warning,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverallStatus::Pass => f.write_str("PASS"),
            OverallStatus::Warning => f.write_str("WARNING"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub overall_status: OverallStatus,
    pub test_status: Vec<String>,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDetails {
    pub env_check: EnvCheckSummary,
    pub nccl_allreduce: AllReduceSummary,
    pub nccl_perf: PerfSummary,
    pub cublas: CublasSummary,
}

/// The terminal artifact of an aggregation pass: a pure function of the
/// records present on the store at the time of the read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,
    pub details: ReportDetails,
}

impl Report {
    pub fn compile(
        env_check: EnvCheckSummary,
        nccl_allreduce: AllReduceSummary,
        nccl_perf: PerfSummary,
        cublas: CublasSummary,
    ) -> Self {
        let statuses = [
            (Category::EnvCheck, env_check.status),
            (Category::AllReduce, nccl_allreduce.status),
            (Category::Perf, nccl_perf.status),
            (Category::Cublas, cublas.status),
        ];

        let test_status = statuses
            .iter()
            .map(|(category, status)| status_line(*category, *status))
            .collect();

        // Worst-of reduction over the explicit per-category statuses. A
        // category that produced no records stays out of the verdict: absence
        // of evidence is reported, not punished.
        let overall_status = if statuses
            .iter()
            .any(|(_, status)| *status == CategoryStatus::Warning)
        {
            OverallStatus::Warning
        } else {
            OverallStatus::Pass
        };

        let issues = env_check.issues.clone();

        Report {
            generated_at: Utc::now(),
            summary: ReportSummary {
                overall_status,
                test_status,
                issues,
            },
            details: ReportDetails {
                env_check,
                nccl_allreduce,
                nccl_perf,
                cublas,
            },
        }
    }
}

/// One status line per category, e.g. `"env_check: PASS"` or
/// `"nccl_perf: NO_RESULTS"`.
pub fn status_line(category: Category, status: CategoryStatus) -> String {
    match status {
        CategoryStatus::Success => format!("{category}: PASS"),
        other => format!("{category}: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::{
        summarize_allreduce, summarize_cublas, summarize_env_checks, summarize_perf,
    };
    use preflight_store::RawRecord;
    use serde_json::json;

    fn raw(name: &str, value: serde_json::Value) -> RawRecord {
        RawRecord {
            name: name.to_string(),
            bytes: serde_json::to_vec(&value).unwrap(),
        }
    }

    fn passing_env_records() -> Vec<RawRecord> {
        vec![raw(
            "env_check_node1.json",
            json!({
                "node_name": "node1",
                "gpu_count": 8,
                "nvidia_driver_version": "550.54.15",
                "cuda_version": "12.4",
                "python_version": "3.10.12",
                "torch_details": {"torch_version": "2.5.1", "cuda_available": true},
                "checks": {"nvidia_smi": "pass", "cuda_available": "pass", "sglang_import": "pass"},
            }),
        )]
    }

    fn full_report(env_records: &[RawRecord]) -> Report {
        Report::compile(
            summarize_env_checks(env_records, &[]),
            summarize_allreduce(&[raw(
                "nccl_allreduce_rank0.json",
                json!({"rank": 0, "world_size": 4, "bandwidth_gbps": 4.03,
                       "elapsed_time_s": 2.0, "tensor_size_mb": 268.435456}),
            )]),
            summarize_perf(&[raw(
                "nccl_perf_node1.json",
                json!({"node_name": "node1", "avg_bus_bandwidth_gbps": 98.2, "results": []}),
            )]),
            summarize_cublas(&[raw(
                "cublas_test_node1.json",
                json!({"node_name": "node1", "matrix_size": "8192x8192x8192",
                       "avg_time_ms": 1.66, "tflops": 661.3}),
            )]),
        )
    }

    #[test]
    fn test_all_success_is_pass() {
        let report = full_report(&passing_env_records());
        assert_eq!(report.summary.overall_status, OverallStatus::Pass);
        assert_eq!(
            report.summary.test_status,
            vec![
                "env_check: PASS",
                "nccl_allreduce: PASS",
                "nccl_perf: PASS",
                "cublas: PASS",
            ]
        );
        assert!(report.summary.issues.is_empty());
    }

    #[test]
    fn test_one_failing_env_check_flips_overall_to_warning() {
        let env = vec![raw(
            "env_check_node1.json",
            json!({
                "node_name": "node1",
                "checks": {"nvidia_smi": "fail"},
            }),
        )];
        let report = full_report(&env);
        assert_eq!(report.summary.overall_status, OverallStatus::Warning);
        assert_eq!(report.summary.test_status[0], "env_check: WARNING");
        assert_eq!(
            report.summary.issues,
            vec!["node1: nvidia-smi unavailable".to_string()]
        );
    }

    #[test]
    fn test_missing_categories_report_no_results_but_do_not_demote() {
        let report = Report::compile(
            summarize_env_checks(&passing_env_records(), &[]),
            summarize_allreduce(&[]),
            summarize_perf(&[]),
            summarize_cublas(&[]),
        );
        assert_eq!(report.summary.overall_status, OverallStatus::Pass);
        assert_eq!(
            report.summary.test_status,
            vec![
                "env_check: PASS",
                "nccl_allreduce: NO_RESULTS",
                "nccl_perf: NO_RESULTS",
                "cublas: NO_RESULTS",
            ]
        );
    }

    #[test]
    fn test_report_round_trip_preserves_verdict() {
        let report = full_report(&passing_env_records());
        let bytes = serde_json::to_vec_pretty(&report).unwrap();
        let reloaded: Report = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            reloaded.summary.overall_status,
            report.summary.overall_status
        );
        assert_eq!(reloaded.summary.test_status, report.summary.test_status);
        assert_eq!(reloaded.generated_at, report.generated_at);
    }

    #[tokio::test]
    async fn test_report_compiles_from_store_listings() {
        use preflight_common::Category;
        use preflight_store::{MemoryStore, ResultStore};

        let store = MemoryStore::new();
        store
            .write(
                Category::EnvCheck,
                "node1",
                passing_env_records()[0].bytes.clone(),
            )
            .await
            .unwrap();
        store
            .write(
                Category::AllReduce,
                "rank0",
                serde_json::to_vec(&json!({"rank": 0, "world_size": 2, "bandwidth_gbps": 3.1}))
                    .unwrap(),
            )
            .await
            .unwrap();

        let report = Report::compile(
            summarize_env_checks(&store.list(Category::EnvCheck).await.unwrap(), &[]),
            summarize_allreduce(&store.list(Category::AllReduce).await.unwrap()),
            summarize_perf(&store.list(Category::Perf).await.unwrap()),
            summarize_cublas(&store.list(Category::Cublas).await.unwrap()),
        );

        assert_eq!(report.summary.overall_status, OverallStatus::Pass);
        assert_eq!(report.details.nccl_allreduce.world_size, 2);
        assert_eq!(report.details.nccl_perf.status, CategoryStatus::NoResults);
    }

    #[test]
    fn test_overall_status_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&OverallStatus::Pass).unwrap(),
            "\"PASS\""
        );
        assert_eq!(
            serde_json::to_string(&OverallStatus::Warning).unwrap(),
            "\"WARNING\""
        );
    }
}
