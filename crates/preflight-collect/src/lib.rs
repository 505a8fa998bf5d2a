pub mod render;
pub mod report;
pub mod summary;

pub use report::{OverallStatus, Report, ReportDetails, ReportSummary};
pub use summary::{
    summarize_allreduce, summarize_cublas, summarize_env_checks, summarize_perf,
    AllReduceSummary, CublasSummary, EnvCheckSummary, PerfSummary,
};
