//! B-Spline transform implementation.
//!
//! This module provides the host B-spline free-form deformation. A control
//! grid of `D` displacement components spans the normalized domain; each
//! component is interpolated at the point's position on the control grid and
//! added to the point.

use std::fmt;
use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use tracing::debug;
use crate::backend::{check_points, check_rank, read_f32, upload};
use crate::boundary::BoundaryMode;
use crate::config::SamplingConfig;
use crate::error::{Result, WarpError};
use crate::interpolation::kernel::SplineCache;
use crate::order::{Execution, SplineOrder};
use super::trait_::Transform;

/// Displacement components on a regular control grid.
#[derive(Debug, Clone)]
pub(crate) struct ControlGrid<B: Backend, const D: usize> {
    pub components: Vec<Tensor<B, D>>,
    pub shape: [usize; D],
    pub config: SamplingConfig,
}

impl<B: Backend, const D: usize> ControlGrid<B, D> {
    pub fn new(components: Vec<Tensor<B, D>>, order: u8, execution: Execution) -> Result<Self> {
        check_rank::<D>()?;
        let order = execution.validate(SplineOrder::new(order)?)?;
        if components.len() != D {
            return Err(WarpError::dimension_mismatch(format!(
                "a {D}D transform needs {D} displacement components, got {}",
                components.len()
            )));
        }
        let shape = components[0].dims();
        if let Some(other) = components.iter().map(|c| c.dims()).find(|dims| *dims != shape) {
            return Err(WarpError::ShapeMismatch {
                expected: shape.to_vec(),
                actual: other.to_vec(),
            });
        }
        if shape.iter().any(|&s| s == 0) {
            return Err(WarpError::invalid_grid(format!(
                "control grid shape {shape:?} has an empty axis"
            )));
        }
        debug!(?shape, order = order.get(), %execution, "created B-spline transform");
        Ok(Self {
            components,
            shape,
            config: SamplingConfig::for_transform(order),
        })
    }

    /// Split a component-major buffer of `D * prod(grid_shape)` values.
    pub fn split_flat(grid_shape: [usize; D], values: &[f32], device: &B::Device) -> Result<Vec<Tensor<B, D>>> {
        check_rank::<D>()?;
        let per_component: usize = grid_shape.iter().product();
        if per_component == 0 {
            return Err(WarpError::invalid_grid(format!(
                "control grid shape {grid_shape:?} has an empty axis"
            )));
        }
        if values.len() != D * per_component {
            return Err(WarpError::ShapeMismatch {
                expected: std::iter::once(D).chain(grid_shape).collect(),
                actual: vec![values.len()],
            });
        }
        Ok(values
            .chunks(per_component)
            .map(|chunk| upload(chunk.to_vec(), grid_shape, device))
            .collect())
    }

    /// Map normalized points onto control-grid indices: `p_d * (N_d - 1)`.
    pub fn control_coordinates(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let factors = self.shape.iter().map(|&n| (n - 1) as f32).collect();
        points * upload::<B, 2>(factors, [1, D], &self.components[0].device())
    }

    pub fn fmt_named(&self, name: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape: Vec<String> = self.shape.iter().map(|s| s.to_string()).collect();
        write!(f, "{name}({D}D, {})", shape.join("x"))
    }
}

/// B-Spline transform evaluated on the host.
///
/// Supports orders 0 to 3. Coefficients are computed on first use and
/// cached. Defaults to mirror boundaries with fill value 0.
///
/// # Type Parameters
/// * `B` - The Burn backend
/// * `D` - The spatial dimensionality
#[derive(Debug, Clone)]
pub struct BSplineTransform<B: Backend, const D: usize> {
    grid: ControlGrid<B, D>,
    /// One cache per component.
    splines: Vec<SplineCache>,
}

impl<B: Backend, const D: usize> BSplineTransform<B, D> {
    /// Create a new B-Spline transform.
    ///
    /// # Arguments
    /// * `components` - `D` displacement arrays of equal shape, one per axis
    /// * `order` - B-spline order (0 to 3)
    pub fn new(components: Vec<Tensor<B, D>>, order: u8) -> Result<Self> {
        let grid = ControlGrid::new(components, order, Execution::Host)?;
        let splines = vec![SplineCache::default(); D];
        Ok(Self { grid, splines })
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

    /// Get the control grid shape.
    pub fn grid_shape(&self) -> [usize; D] {
        self.grid.shape
    }

    /// Get the displacement components.
    pub fn components(&self) -> &[Tensor<B, D>] {
        &self.grid.components
    }

    /// Get the sampling defaults for the displacement grids.
    pub fn config(&self) -> &SamplingConfig {
        &self.grid.config
    }
}

impl<B: Backend, const D: usize> Transform<B, D> for BSplineTransform<B, D> {
    fn transform_points(&self, points: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        let n = check_points::<B, D>(&points)?;
        let config = self.grid.config;
        debug!(points = n, order = config.order.get(), mode = %config.mode, "B-spline transform on host");

        let coords = read_f32(self.grid.control_coordinates(points.clone()))?;
        let displacement = self
            .splines
            .iter()
            .zip(&self.grid.components)
            .map(|(cache, component)| {
                let spline = cache.get_or_build(config.order, config.mode, || {
                    Ok((read_f32(component.clone())?, self.grid.shape.to_vec()))
                })?;
                Ok(spline.sample(&coords, config.mode, config.cval))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut interleaved = Vec::with_capacity(n * D);
        for i in 0..n {
            interleaved.extend(displacement.iter().map(|component| component[i]));
        }
        let device = points.device();
        Ok(points + upload(interleaved, [n, D], &device))
    }
}

impl<B: Backend, const D: usize> fmt::Display for BSplineTransform<B, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.grid.fmt_named("BSplineTransform", f)
    }
}
