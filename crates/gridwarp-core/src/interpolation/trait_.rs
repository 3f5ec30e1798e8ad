//! Interpolator trait for sampling an image at continuous coordinates.
//!
//! This module defines the core Interpolator trait shared by the host and
//! device B-spline interpolators, so either can be swapped in by name.

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use crate::config::{SampleOptions, SamplingConfig};
use crate::error::Result;
use crate::grid::Grid;
use crate::order::Execution;
use crate::transform::Transform;

/// Interpolator wrapping one image.
///
/// # Type Parameters
/// * `B` - The Burn backend
/// * `D` - The image dimensionality
pub trait Interpolator<B: Backend, const D: usize> {
    /// The wrapped image.
    fn image(&self) -> &Tensor<B, D>;

    /// The image's own sampling grid.
    fn grid(&self) -> &Grid<B, D>;

    /// Default order, mode and fill value.
    fn config(&self) -> &SamplingConfig;

    /// Code path used for sampling.
    fn execution(&self) -> Execution;

    /// Sample the image at continuous indices `points` `[N, D]`.
    ///
    /// # Returns
    /// Tensor of sampled values `[N]`
    fn sample(&self, points: Tensor<B, 2>, options: SampleOptions) -> Result<Tensor<B, 1>>;

    /// Resample the image on `grid`.
    ///
    /// The grid's normalized points are scaled to the image shape before
    /// sampling; the output takes the grid's shape.
    fn resample(&self, grid: &Grid<B, D>, options: SampleOptions) -> Result<Tensor<B, D>> {
        let rescaled = grid.scaled_to(self.image().dims());
        let values = self.sample(rescaled.points(), options)?;
        Ok(values.reshape(grid.shape()))
    }

    /// Transform the image by moving its grid through `transforms` and
    /// resampling at the moved points.
    fn transform(&self, transforms: &[&dyn Transform<B, D>], options: SampleOptions) -> Result<Tensor<B, D>> {
        let transformed = self.grid().transform(transforms)?;
        self.resample(&transformed, options)
    }
}
