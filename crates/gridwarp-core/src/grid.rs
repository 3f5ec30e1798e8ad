//! Sampling grids in the normalized domain.
//!
//! A [`Grid`] holds one point per output sample, in row-major order, with
//! coordinates in `[0, 1)` along every axis. Transforms move the points; an
//! interpolator scales them to the index space of its image before sampling.

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use crate::backend::{check_rank, upload};
use crate::error::{Result, WarpError};
use crate::transform::Transform;

/// A set of sample points with a logical output shape.
///
/// # Type Parameters
/// * `B` - The Burn backend
/// * `D` - The spatial dimensionality
#[derive(Debug, Clone)]
pub struct Grid<B: Backend, const D: usize> {
    shape: [usize; D],
    /// Points `[N, D]`, column `d` addresses array axis `d`.
    points: Tensor<B, 2>,
}

impl<B: Backend, const D: usize> Grid<B, D> {
    /// Create the regular grid for `shape`.
    ///
    /// Point `(i_0, ..., i_{D-1})` sits at `(i_0 / shape[0], ..., i_{D-1} / shape[D-1])`.
    pub fn new(shape: [usize; D], device: &B::Device) -> Result<Self> {
        check_rank::<D>()?;
        if shape.iter().any(|&s| s == 0) {
            return Err(WarpError::invalid_grid(format!("grid shape {shape:?} has an empty axis")));
        }
        let total: usize = shape.iter().product();

        let mut coords = Vec::with_capacity(total * D);
        let mut index = [0usize; D];
        for _ in 0..total {
            for d in 0..D {
                coords.push(index[d] as f32 / shape[d] as f32);
            }
            // Row-major odometer, last axis fastest.
            for d in (0..D).rev() {
                index[d] += 1;
                if index[d] < shape[d] {
                    break;
                }
                index[d] = 0;
            }
        }

        Ok(Self {
            shape,
            points: upload(coords, [total, D], device),
        })
    }

    /// Wrap existing points `[prod(shape), D]` as a grid.
    pub fn from_points(shape: [usize; D], points: Tensor<B, 2>) -> Result<Self> {
        check_rank::<D>()?;
        let total: usize = shape.iter().product();
        let dims = points.dims();
        if dims != [total, D] {
            return Err(WarpError::ShapeMismatch {
                expected: vec![total, D],
                actual: dims.to_vec(),
            });
        }
        Ok(Self { shape, points })
    }

    /// Logical shape of the grid.
    pub fn shape(&self) -> [usize; D] {
        self.shape
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The grid points `[N, D]`.
    pub fn points(&self) -> Tensor<B, 2> {
        self.points.clone()
    }

    /// Scale normalized points to the index space of an array of `shape`.
    pub fn scaled_to(&self, shape: [usize; D]) -> Self {
        let device = self.points.device();
        let factors: Vec<f32> = shape.iter().map(|&s| s as f32).collect();
        let factors = upload::<B, 2>(factors, [1, D], &device);
        Self {
            shape: self.shape,
            points: self.points.clone() * factors,
        }
    }

    /// Apply `transforms` in order, keeping the grid's shape.
    pub fn transform(&self, transforms: &[&dyn Transform<B, D>]) -> Result<Self> {
        let mut points = self.points.clone();
        for transform in transforms {
            points = transform.transform_points(points)?;
        }
        Self::from_points(self.shape, points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{read_f32, Cpu};
    use crate::transform::TranslationTransform;

    #[test]
    fn test_grid_points_2d() {
        let device = Default::default();
        let grid = Grid::<Cpu, 2>::new([2, 4], &device).unwrap();
        assert_eq!(grid.len(), 8);
        assert_eq!(grid.points().dims(), [8, 2]);

        let values = read_f32(grid.points()).unwrap();
        // Row-major: (0,0) (0,1) (0,2) (0,3) (1,0) ...
        assert_eq!(&values[0..8], &[0.0, 0.0, 0.0, 0.25, 0.0, 0.5, 0.0, 0.75]);
        assert_eq!(&values[8..10], &[0.5, 0.0]);
    }

    #[test]
    fn test_scaled_to_index_space() {
        let device = Default::default();
        let grid = Grid::<Cpu, 2>::new([2, 4], &device).unwrap();
        let scaled = grid.scaled_to([2, 4]);
        let values = read_f32(scaled.points()).unwrap();
        for (i, row) in values.chunks(2).enumerate() {
            assert!((row[0] - (i / 4) as f32).abs() < 1e-6);
            assert!((row[1] - (i % 4) as f32).abs() < 1e-6);
        }
        assert_eq!(scaled.shape(), [2, 4]);
    }

    #[test]
    fn test_empty_axis_rejected() {
        let device = Default::default();
        assert!(matches!(
            Grid::<Cpu, 2>::new([0, 4], &device),
            Err(WarpError::InvalidGrid(_))
        ));
    }

    #[test]
    fn test_from_points_shape_check() {
        let device = Default::default();
        let points = Tensor::<Cpu, 2>::zeros([6, 2], &device);
        assert!(Grid::<Cpu, 2>::from_points([2, 3], points.clone()).is_ok());
        assert!(matches!(
            Grid::<Cpu, 2>::from_points([2, 2], points),
            Err(WarpError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_transform_applies_in_order() {
        let device = Default::default();
        let grid = Grid::<Cpu, 1>::new([4], &device).unwrap();
        let first = TranslationTransform::<Cpu, 1>::new([0.5], &device);
        let second = TranslationTransform::<Cpu, 1>::new([-0.25], &device);
        let moved = grid.transform(&[&first, &second]).unwrap();
        let values = read_f32(moved.points()).unwrap();
        assert_eq!(values, vec![0.25, 0.5, 0.75, 1.0]);
    }
}
