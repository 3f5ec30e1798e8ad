//! Translation transform implementation.
//!
//! This module provides a transform that shifts every point by a fixed offset.

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use crate::backend::{check_points, upload};
use crate::error::Result;
use super::trait_::Transform;

/// Translates points by a fixed offset vector.
#[derive(Debug, Clone)]
pub struct TranslationTransform<B: Backend, const D: usize> {
    offset: [f64; D],
    /// Offset as a `[1, D]` row for broadcasting.
    row: Tensor<B, 2>,
}

impl<B: Backend, const D: usize> TranslationTransform<B, D> {
    /// Create a new translation transform.
    ///
    /// # Arguments
    /// * `offset` - Shift along each axis, in normalized units
    /// * `device` - Device to create tensors on
    pub fn new(offset: [f64; D], device: &B::Device) -> Self {
        let values = offset.iter().map(|&v| v as f32).collect();
        Self {
            offset,
            row: upload(values, [1, D], device),
        }
    }

    /// Get the offset.
    pub fn offset(&self) -> [f64; D] {
        self.offset
    }
}

impl<B: Backend, const D: usize> Transform<B, D> for TranslationTransform<B, D> {
    fn transform_points(&self, points: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        check_points::<B, D>(&points)?;
        Ok(points + self.row.clone())
    }

    fn inverse(&self) -> Option<Box<dyn Transform<B, D>>> {
        let negated = self.offset.map(|v| -v);
        Some(Box::new(Self::new(negated, &self.row.device())))
    }
}
