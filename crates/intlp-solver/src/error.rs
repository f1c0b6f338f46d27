use thiserror::Error;

/// Structural errors raised by matrix and problem construction.
///
/// Infeasible and unbounded programs are not errors; they are reported through
/// [`Solution`](crate::Solution) sentinels.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Index out of range: {0}")]
    OutOfRange(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

pub type Result<T> = std::result::Result<T, Error>;
