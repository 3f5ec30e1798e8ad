//! B-spline interpolation and deformable transformation of N-dimensional
//! arrays, on the host or on a tensor device.

pub mod backend;
pub mod boundary;
pub mod config;
pub mod error;
pub mod grid;
pub mod order;
pub mod transform;
pub mod interpolation;

pub use boundary::BoundaryMode;
pub use config::{SampleOptions, SamplingConfig};
pub use error::{Result, WarpError};
pub use grid::Grid;
pub use order::{Execution, SplineOrder};
pub use interpolation::{BSplineInterpolator, BSplineInterpolatorGpu, Interpolator};
pub use transform::{AffineTransform, BSplineTransform, BSplineTransformGpu, Transform, TranslationTransform};
