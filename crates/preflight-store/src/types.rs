use anyhow::Result;
use async_trait::async_trait;

use preflight_common::Category;

/// One record as discovered on the store: the name it was stored under and
/// its unparsed bytes. Parsing (and recovery from unparsable bytes) is the
/// consumer's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// The result store shared between probe producers and the aggregator.
///
/// Producers write one record per (category, key); keys are unique per
/// producer (node name or rank), so concurrent writers never collide and the
/// store needs no locking. The aggregator lists a category after all
/// producers have exited and treats the store as quiescent.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// All records of a category, sorted by name. An empty list is a normal
    /// outcome (the category was never probed), not an error.
    async fn list(&self, category: Category) -> Result<Vec<RawRecord>>;

    /// Write one record under `<prefix><key>.json`.
    async fn write(&self, category: Category, key: &str, bytes: Vec<u8>) -> Result<()>;
}
