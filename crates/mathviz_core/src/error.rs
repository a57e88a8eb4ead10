use thiserror::Error;

/// Ways a visualization request can violate its parameter contract.
///
/// Requests are checked once, before any engine runs; the engines themselves
/// assume validated input and have no error paths.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("viewport dimensions must be positive (got {width}x{height})")]
    EmptyViewport { width: u32, height: u32 },
    #[error("iteration budget must be positive")]
    ZeroIterationBudget,
    #[error("zoom must be positive and finite (got {0})")]
    InvalidZoom(f64),
    #[error("viewport center must be finite (got {x}, {y})")]
    NonFiniteCenter { x: f64, y: f64 },
    #[error("frequency must be positive and finite (got {0})")]
    InvalidFrequency(f64),
    #[error("amplitude must be finite (got {0})")]
    NonFiniteAmplitude(f64),
    #[error("sample rate must be positive")]
    ZeroSampleRate,
    #[error("duration must be positive and finite (got {0})")]
    InvalidDuration(f64),
    #[error("sample rate and duration must yield at least one sample")]
    EmptySignal,
}
