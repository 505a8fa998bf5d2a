use anyhow::Result;
use async_trait::async_trait;

/// The seam to the execution environment's collective-reduction runtime.
///
/// The benchmark only drives this trait and times it; it never looks inside
/// the reduction. Implementations may be backed by an accelerator-native
/// library, the baseline TCP transport, or the loopback group.
#[async_trait]
pub trait Collective: Send {
    /// In-place sum-reduction of `buf` across all ranks. On return every
    /// rank holds the combined result.
    async fn all_reduce(&mut self, buf: &mut [f32]) -> Result<()>;

    /// Barrier for outstanding collective work on this rank. Not a
    /// cluster-wide barrier; cluster ordering is the collective's own
    /// concern.
    async fn synchronize(&mut self) -> Result<()>;

    fn rank(&self) -> u32;

    fn world_size(&self) -> u32;
}

/// Degenerate single-participant group: no communication, the local buffer
/// already is the combined result. Used for single-node smoke runs and
/// tests.
#[derive(Debug, Default)]
pub struct LoopbackCollective;

impl LoopbackCollective {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Collective for LoopbackCollective {
    async fn all_reduce(&mut self, _buf: &mut [f32]) -> Result<()> {
        Ok(())
    }

    async fn synchronize(&mut self) -> Result<()> {
        Ok(())
    }

    fn rank(&self) -> u32 {
        0
    }

    fn world_size(&self) -> u32 {
        1
    }
}
