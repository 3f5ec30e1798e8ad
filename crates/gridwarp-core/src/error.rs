//! Error types for interpolation and transformation operations.
//!
//! This module provides structured error types shared by the host and
//! device code paths.

use thiserror::Error;
use crate::order::Execution;

/// Main error type for gridwarp operations.
#[derive(Error, Debug)]
pub enum WarpError {
    /// The requested spline order exceeds what the execution path implements.
    #[error("Spline order {order} is not supported on the {execution} path (maximum {max})")]
    UnsupportedOrder {
        order: u8,
        execution: Execution,
        max: u8,
    },

    /// Spline order outside the range any path implements.
    #[error("Invalid spline order: {0}")]
    InvalidOrder(u8),

    /// Rank or axis count mismatch.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Shape mismatch.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Malformed sampling or control-point grid.
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    /// Unknown boundary mode name.
    #[error("Invalid boundary mode: {0}")]
    InvalidMode(String),

    /// Tensor data could not be read back from the backend.
    #[error("Tensor data error: {0}")]
    TensorData(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for gridwarp operations.
pub type Result<T> = std::result::Result<T, WarpError>;

impl WarpError {
    /// Create a dimension mismatch error.
    pub fn dimension_mismatch(msg: impl Into<String>) -> Self {
        Self::DimensionMismatch(msg.into())
    }

    /// Create an invalid grid error.
    pub fn invalid_grid(msg: impl Into<String>) -> Self {
        Self::InvalidGrid(msg.into())
    }

    /// Create a tensor data error.
    pub fn tensor_data(msg: impl Into<String>) -> Self {
        Self::TensorData(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
