//! Host B-spline interpolator.
//!
//! Reads the image back to the CPU once per order and boundary extension,
//! converts it to spline coefficients and evaluates points in parallel.
//! Supports orders 0 to 3.

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use tracing::debug;
use crate::backend::{check_points, check_rank, read_f32, upload};
use crate::boundary::BoundaryMode;
use crate::config::{SampleOptions, SamplingConfig};
use crate::error::{Result, WarpError};
use crate::grid::Grid;
use crate::order::{Execution, SplineOrder};
use super::kernel::{HostSpline, SplineCache};
use super::trait_::Interpolator;

/// Image, default grid and defaults shared by both interpolator variants.
#[derive(Debug, Clone)]
pub(crate) struct ImageState<B: Backend, const D: usize> {
    pub image: Tensor<B, D>,
    pub grid: Grid<B, D>,
    pub config: SamplingConfig,
}

impl<B: Backend, const D: usize> ImageState<B, D> {
    pub fn new(image: Tensor<B, D>, config: SamplingConfig, execution: Execution) -> Result<Self> {
        check_rank::<D>()?;
        execution.validate(config.order)?;
        let shape = image.dims();
        if shape.iter().any(|&s| s == 0) {
            return Err(WarpError::invalid_grid(format!("image shape {shape:?} has an empty axis")));
        }
        let grid = Grid::new(shape, &image.device())?;
        debug!(
            ?shape,
            order = config.order.get(),
            mode = %config.mode,
            %execution,
            "created interpolator"
        );
        Ok(Self { image, grid, config })
    }
}

/// B-spline interpolator evaluated on the host.
///
/// # Examples
/// ```rust
/// use burn::tensor::Tensor;
/// use gridwarp_core::backend::Cpu;
/// use gridwarp_core::interpolation::{BSplineInterpolator, Interpolator};
/// use gridwarp_core::transform::BSplineTransform;
/// use gridwarp_core::config::SampleOptions;
///
/// let device = Default::default();
/// let image = Tensor::<Cpu, 2>::ones([16, 16], &device);
/// let interpolator = BSplineInterpolator::new(image, 3).unwrap();
///
/// let grid = Tensor::<Cpu, 2>::zeros([3, 3], &device);
/// let transform = BSplineTransform::new(vec![grid.clone(), grid], 3).unwrap();
/// let warped = interpolator.transform(&[&transform], SampleOptions::default()).unwrap();
/// assert_eq!(warped.dims(), [16, 16]);
/// ```
#[derive(Debug, Clone)]
pub struct BSplineInterpolator<B: Backend, const D: usize> {
    state: ImageState<B, D>,
    /// Coefficients per order, built on first use.
    splines: SplineCache,
}

impl<B: Backend, const D: usize> BSplineInterpolator<B, D> {
    /// Create an interpolator with the given default order (0 to 3).
    ///
    /// Mode defaults to [`BoundaryMode::Constant`] with fill value 0.
    pub fn new(image: Tensor<B, D>, order: u8) -> Result<Self> {
        Self::with_config(image, SamplingConfig::new().with_order(SplineOrder::new(order)?))
    }

    /// Create an interpolator from a full config.
    pub fn with_config(image: Tensor<B, D>, config: SamplingConfig) -> Result<Self> {
        Ok(Self {
            state: ImageState::new(image, config, Execution::Host)?,
            splines: Default::default(),
        })
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

    fn spline(&self, order: SplineOrder, mode: BoundaryMode) -> Result<&HostSpline> {
        self.splines.get_or_build(order, mode, || {
            let shape = self.state.image.dims();
            debug!(order = order.get(), %mode, ?shape, "computing spline coefficients");
            Ok((read_f32(self.state.image.clone())?, shape.to_vec()))
        })
    }
}

impl<B: Backend, const D: usize> Interpolator<B, D> for BSplineInterpolator<B, D> {
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
        Execution::Host
    }

    fn sample(&self, points: Tensor<B, 2>, options: SampleOptions) -> Result<Tensor<B, 1>> {
        let config = options.resolve(&self.state.config);
        let n = check_points::<B, D>(&points)?;
        let device = points.device();
        let coords = read_f32(points)?;
        let spline = self.spline(config.order, config.mode)?;
        debug!(points = n, order = spline.order().get(), mode = %config.mode, "sampling on host");
        let values = spline.sample(&coords, config.mode, config.cval);
        Ok(upload(values, [n], &device))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::TensorData;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn ramp_2d(device: &<TestBackend as Backend>::Device) -> Tensor<TestBackend, 2> {
        let values: Vec<f32> = (0..24).map(|i| i as f32).collect();
        Tensor::from_data(TensorData::new(values, [4, 6]), device)
    }

    #[test]
    fn test_rejects_invalid_order() {
        let device = Default::default();
        let err = BSplineInterpolator::new(ramp_2d(&device), 4).unwrap_err();
        assert!(matches!(err, WarpError::InvalidOrder(4)));
    }

    #[test]
    fn test_sample_linear() {
        let device = Default::default();
        let interpolator = BSplineInterpolator::new(ramp_2d(&device), 1).unwrap();
        let points = Tensor::<TestBackend, 2>::from_floats([[0.5, 0.5], [3.0, 5.0]], &device);
        let out = interpolator.sample(points, SampleOptions::default()).unwrap();
        let out = out.into_data().to_vec::<f32>().unwrap();
        // (0 + 1 + 6 + 7) / 4
        assert!((out[0] - 3.5).abs() < 1e-5);
        assert!((out[1] - 23.0).abs() < 1e-5);
    }

    #[test]
    fn test_sample_order_override() {
        let device = Default::default();
        let interpolator = BSplineInterpolator::new(ramp_2d(&device), 3).unwrap();
        let points = Tensor::<TestBackend, 2>::from_floats([[1.4, 2.4]], &device);
        let nearest = interpolator
            .sample(points, SampleOptions::new().with_order(SplineOrder::NEAREST))
            .unwrap();
        assert_eq!(nearest.into_data().to_vec::<f32>().unwrap(), vec![8.0]);
    }

    #[test]
    fn test_constant_fill() {
        let device = Default::default();
        let interpolator = BSplineInterpolator::new(ramp_2d(&device), 1).unwrap().with_cval(-3.0);
        let points = Tensor::<TestBackend, 2>::from_floats([[-1.0, 0.0], [0.0, 7.0]], &device);
        let out = interpolator.sample(points, SampleOptions::default()).unwrap();
        assert_eq!(out.into_data().to_vec::<f32>().unwrap(), vec![-3.0, -3.0]);
    }

    #[test]
    fn test_resample_identity_grid() {
        let device = Default::default();
        let image = ramp_2d(&device);
        for order in 0..=3 {
            let interpolator = BSplineInterpolator::new(image.clone(), order).unwrap();
            let out = interpolator
                .resample(interpolator.grid(), SampleOptions::default())
                .unwrap();
            let got = out.into_data().to_vec::<f32>().unwrap();
            for (i, v) in got.iter().enumerate() {
                assert!((v - i as f32).abs() < 1e-3, "order {order} at {i}: {v}");
            }
        }
    }

    #[test]
    fn test_resample_upsampled_grid() {
        let device = Default::default();
        let data = Tensor::<TestBackend, 1>::from_floats([0.0, 10.0, 20.0, 30.0], &device);
        let interpolator = BSplineInterpolator::new(data, 1).unwrap().with_mode(BoundaryMode::Nearest);
        let grid = Grid::<TestBackend, 1>::new([8], &device).unwrap();
        let out = interpolator.resample(&grid, SampleOptions::default()).unwrap();
        assert_eq!(out.dims(), [8]);
        let got = out.into_data().to_vec::<f32>().unwrap();
        for (i, v) in got.iter().enumerate() {
            let expected = (i as f32 * 0.5 * 10.0).min(30.0);
            assert!((v - expected).abs() < 1e-4, "{i}: {v} vs {expected}");
        }
    }

    #[test]
    fn test_coefficients_cached() {
        let device = Default::default();
        let interpolator = BSplineInterpolator::new(ramp_2d(&device), 3).unwrap();
        let points = Tensor::<TestBackend, 2>::from_floats([[1.0, 1.0]], &device);
        interpolator.sample(points, SampleOptions::default()).unwrap();
        assert!(interpolator.splines.is_built(SplineOrder::CUBIC, BoundaryMode::Constant));
        assert!(!interpolator.splines.is_built(SplineOrder::QUADRATIC, BoundaryMode::Constant));
        assert!(!interpolator.splines.is_built(SplineOrder::CUBIC, BoundaryMode::Wrap));
        let cloned = interpolator.clone();
        assert!(cloned.splines.is_built(SplineOrder::CUBIC, BoundaryMode::Mirror));
    }
}
