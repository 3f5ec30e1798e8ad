//! Transform trait for coordinate transformations.
//!
//! This module defines the core Transform trait that every grid transform
//! implements, so host and device transforms can be mixed in one chain.

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use crate::error::Result;

/// Maps points of the normalized domain to new positions.
///
/// Column `d` of the points addresses array axis `d`.
///
/// # Type Parameters
/// * `B` - The Burn backend
/// * `D` - The spatial dimensionality
pub trait Transform<B: Backend, const D: usize> {
    /// Apply transform to a batch of points.
    ///
    /// # Arguments
    /// * `points` - Tensor of shape `[N, D]` containing the input points
    ///
    /// # Returns
    /// Tensor of shape `[N, D]` containing the transformed points
    fn transform_points(&self, points: Tensor<B, 2>) -> Result<Tensor<B, 2>>;

    /// Get the inverse transform (if available).
    ///
    /// Deformable transforms have no closed-form inverse and return `None`.
    fn inverse(&self) -> Option<Box<dyn Transform<B, D>>> {
        None
    }
}
