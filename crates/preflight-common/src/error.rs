use thiserror::Error;

/// Producer-side failure taxonomy; fatal to the producing process, which
/// exits without writing a record. Consumer-side failures (an unreadable
/// record on the store) are not errors at all: the aggregator carries them
/// as error-tagged stand-in data instead of crashing.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("accelerator runtime unavailable: {0}")]
    EnvironmentUnavailable(String),

    #[error("degenerate measurement: {0}")]
    Measurement(String),
}
