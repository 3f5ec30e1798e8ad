//! Interpolation types and operations.
//!
//! This module provides the [`Interpolator`] trait and the two B-spline
//! interpolators: [`BSplineInterpolator`] evaluates orders 0 to 3 on the
//! host, [`BSplineInterpolatorGpu`] evaluates orders 0 and 1 with tensor ops
//! on the device.

pub mod trait_;
pub mod bspline;
pub mod bspline_gpu;
pub mod device;
pub(crate) mod kernel;

pub use trait_::Interpolator;
pub use bspline::BSplineInterpolator;
pub use bspline_gpu::BSplineInterpolatorGpu;
pub use device::map_coordinates;
