//! Transform types and operations.
//!
//! This module provides the [`Transform`] trait and the transforms that move
//! grid points: translation, affine, and the host and device B-spline
//! deformations.

pub mod trait_;
pub mod translation;
pub mod affine;
pub mod bspline;
pub mod bspline_gpu;

pub use trait_::Transform;
pub use translation::TranslationTransform;
pub use affine::AffineTransform;
pub use bspline::BSplineTransform;
pub use bspline_gpu::BSplineTransformGpu;
