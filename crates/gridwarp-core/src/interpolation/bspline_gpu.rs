//! Device B-spline interpolator.
//!
//! Same interface as [`BSplineInterpolator`](super::BSplineInterpolator),
//! evaluated entirely with tensor ops on the image's device. Only orders 0
//! and 1 are available; anything higher is rejected both at construction
//! and when passed as a per-call override.

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use tracing::{debug, warn};
use crate::backend::check_points;
use crate::boundary::BoundaryMode;
use crate::config::{SampleOptions, SamplingConfig};
use crate::error::Result;
use crate::grid::Grid;
use crate::order::{Execution, SplineOrder};
use super::bspline::ImageState;
use super::device::map_coordinates;
use super::trait_::Interpolator;

/// B-spline interpolator evaluated on the tensor device.
///
/// # Type Parameters
/// * `B` - The Burn backend
/// * `D` - The image dimensionality
#[derive(Debug, Clone)]
pub struct BSplineInterpolatorGpu<B: Backend, const D: usize> {
    state: ImageState<B, D>,
}

impl<B: Backend, const D: usize> BSplineInterpolatorGpu<B, D> {
    /// Create an interpolator with the given default order (0 or 1).
    pub fn new(image: Tensor<B, D>, order: u8) -> Result<Self> {
        Self::with_config(image, SamplingConfig::new().with_order(SplineOrder::new(order)?))
    }

    /// Create an interpolator from a full config.
    pub fn with_config(image: Tensor<B, D>, config: SamplingConfig) -> Result<Self> {
        let state = ImageState::new(image, config, Execution::Device).inspect_err(|e| {
            warn!(order = config.order.get(), error = %e, "rejected device interpolator");
        })?;
        Ok(Self { state })
    }

    /// Set the default boundary mode.
    pub fn with_mode(mut self, mode: BoundaryMode) -> Self {
        self.state.config.mode = mode;
        self
    }

    /// Set the default fill value for constant mode.
    pub fn with_cval(mut self, cval: f32) -> Self {
        self.state.config.cval = cval;
        self
    }
}

impl<B: Backend, const D: usize> Interpolator<B, D> for BSplineInterpolatorGpu<B, D> {
    fn image(&self) -> &Tensor<B, D> {
        &self.state.image
    }

    fn grid(&self) -> &Grid<B, D> {
        &self.state.grid
    }

    fn config(&self) -> &SamplingConfig {
        &self.state.config
    }

    fn execution(&self) -> Execution {
        Execution::Device
    }

    fn sample(&self, points: Tensor<B, 2>, options: SampleOptions) -> Result<Tensor<B, 1>> {
        let config = options.resolve(&self.state.config);
        Execution::Device.validate(config.order).inspect_err(|e| {
            warn!(order = config.order.get(), error = %e, "rejected order override");
        })?;
        let n = check_points::<B, D>(&points)?;
        debug!(points = n, order = config.order.get(), mode = %config.mode, "sampling on device");
        map_coordinates(&self.state.image, points, config.order, config.mode, config.cval)
    }
}
