use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LocatorError {
    #[error("depth frame size mismatch: got {got}, expected {expected}")]
    DepthSizeMismatch { got: usize, expected: usize },
    #[error("body index frame size mismatch: got {got}, expected {expected}")]
    BodyIndexSizeMismatch { got: usize, expected: usize },
    #[error("sensor geometry has an empty {0} frame")]
    EmptyFrame(&'static str),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SmootherError {
    #[error("smoother history size must be at least 1")]
    ZeroHistory,
    #[error("smoother margin must be finite and non-negative, got {0}")]
    InvalidMargin(f64),
}
