use std::fmt;

use serde::{Deserialize, Serialize};

/// The four probe categories, in the fixed order they appear in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    EnvCheck,
    AllReduce,
    Perf,
    Cublas,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::EnvCheck,
        Category::AllReduce,
        Category::Perf,
        Category::Cublas,
    ];

    /// File-name prefix for records of this category on the result store.
    pub fn prefix(&self) -> &'static str {
        match self {
            Category::EnvCheck => "env_check_",
            Category::AllReduce => "nccl_allreduce_",
            Category::Perf => "nccl_perf_",
            Category::Cublas => "cublas_test_",
        }
    }

    /// Key used for this category in the report's `details` map and in
    /// status lines.
    pub fn report_key(&self) -> &'static str {
        match self {
            Category::EnvCheck => "env_check",
            Category::AllReduce => "nccl_allreduce",
            Category::Perf => "nccl_perf",
            Category::Cublas => "cublas",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.report_key())
    }
}

/// Outcome of summarizing one category. `NoResults` is a first-class state:
/// a category with zero discovered records is neither a pass nor a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryStatus {
    NoResults,
    Success,
    Warning,
}

impl fmt::Display for CategoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CategoryStatus::NoResults => "NO_RESULTS",
            CategoryStatus::Success => "SUCCESS",
            CategoryStatus::Warning => "WARNING",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serde_names() {
        assert_eq!(
            serde_json::to_string(&Category::EnvCheck).unwrap(),
            "\"env_check\""
        );
        assert_eq!(
            serde_json::to_string(&CategoryStatus::NoResults).unwrap(),
            "\"no_results\""
        );
        let status: CategoryStatus = serde_json::from_str("\"warning\"").unwrap();
        assert_eq!(status, CategoryStatus::Warning);
    }

    #[test]
    fn test_prefixes_are_distinct() {
        for a in Category::ALL {
            for b in Category::ALL {
                if a != b {
                    assert!(!a.prefix().starts_with(b.prefix()));
                }
            }
        }
    }
}
