pub mod category;
pub mod error;
pub mod gpu;
pub mod record;

pub use category::{Category, CategoryStatus};
pub use error::ProbeError;
pub use record::{
    AllReduceRecord, CheckOutcome, CublasRecord, EnvCheckRecord, PerfRecord, TorchDetails,
    CHECK_CUDA_AVAILABLE, CHECK_NVIDIA_SMI, CHECK_SGLANG_IMPORT,
};
