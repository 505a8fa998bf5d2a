pub mod dir;
pub mod memory;
pub mod types;

pub use dir::DirStore;
pub use memory::MemoryStore;
pub use types::{RawRecord, ResultStore};
