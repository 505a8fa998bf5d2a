pub mod bench;
pub mod collective;
pub mod tcp;

pub use bench::{effective_bandwidth_gbps, BenchOptions, BenchOutcome};
pub use collective::{Collective, LoopbackCollective};
pub use tcp::TcpCollective;
