//! Device B-spline transform.
//!
//! Same semantics as [`BSplineTransform`](super::BSplineTransform), computed
//! with tensor ops so points never leave the device. Orders 0 and 1 only.

use std::fmt;
use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use tracing::debug;
use crate::backend::check_points;
use crate::boundary::BoundaryMode;
use crate::config::SamplingConfig;
use crate::error::Result;
use crate::interpolation::map_coordinates;
use crate::order::Execution;
use super::bspline::ControlGrid;
use super::trait_::Transform;

/// B-Spline transform evaluated on the tensor device.
///
/// # Type Parameters
/// * `B` - The Burn backend
/// * `D` - The spatial dimensionality
#[derive(Debug, Clone)]
pub struct BSplineTransformGpu<B: Backend, const D: usize> {
    grid: ControlGrid<B, D>,
}

impl<B: Backend, const D: usize> BSplineTransformGpu<B, D> {
    /// Create a new B-Spline transform.
    ///
    /// # Arguments
    /// * `components` - `D` displacement arrays of equal shape, one per axis
    /// * `order` - B-spline order (0 or 1)
    pub fn new(components: Vec<Tensor<B, D>>, order: u8) -> Result<Self> {
        Ok(Self {
            grid: ControlGrid::new(components, order, Execution::Device)?,
        })
    }

    /// Create a transform from a component-major buffer of
    /// `D * prod(grid_shape)` displacements.
    pub fn from_flat(grid_shape: [usize; D], values: &[f32], order: u8, device: &B::Device) -> Result<Self> {
        Self::new(ControlGrid::split_flat(grid_shape, values, device)?, order)
    }

    /// Set the boundary mode used when interpolating the control grid.
    pub fn with_mode(mut self, mode: BoundaryMode) -> Self {
        self.grid.config.mode = mode;
        self
    }

    /// Set the fill value for constant mode.
    pub fn with_cval(mut self, cval: f32) -> Self {
        self.grid.config.cval = cval;
        self
    }

    /// Control-grid shape.
    pub fn grid_shape(&self) -> [usize; D] {
        self.grid.shape
    }

    /// One displacement grid per axis.
    pub fn components(&self) -> &[Tensor<B, D>] {
        &self.grid.components
    }

    /// Sampling defaults for the displacement grids.
    pub fn config(&self) -> &SamplingConfig {
        &self.grid.config
    }
}

impl<B: Backend, const D: usize> Transform<B, D> for BSplineTransformGpu<B, D> {
    fn transform_points(&self, points: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        let n = check_points::<B, D>(&points)?;
        let config = self.grid.config;
        debug!(points = n, order = config.order.get(), mode = %config.mode, "B-spline transform on device");

        let coords = self.grid.control_coordinates(points.clone());
        let displacement = self
            .grid
            .components
            .iter()
            .map(|component| map_coordinates(component, coords.clone(), config.order, config.mode, config.cval))
            .collect::<Result<Vec<_>>>()?;
        Ok(points + Tensor::stack::<2>(displacement, 1))
    }
}

impl<B: Backend, const D: usize> fmt::Display for BSplineTransformGpu<B, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.grid.fmt_named("BSplineTransformGpu", f)
    }
}
