//! Affine transform implementation.
//!
//! This module provides an affine transform (linear transformation + translation).

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use nalgebra::{DMatrix, SMatrix};
use crate::backend::{check_points, upload};
use crate::error::Result;
use super::trait_::Transform;

/// Affine Transform (Linear transformation + Translation).
///
/// Represents a general affine transformation with a fixed center:
/// T(x) = A(x - c) + c + t
///
/// where:
/// * A is a D×D matrix (linear transformation: rotation, scale, shear)
/// * t is a D-dimensional translation vector
/// * c is a D-dimensional fixed center of rotation/scaling
///
/// Parameters live on the host as `f64`; the device only sees the folded
/// form `x A^T + b` with `b = c + t - A c`.
#[derive(Debug, Clone)]
pub struct AffineTransform<B: Backend, const D: usize> {
    matrix: SMatrix<f64, D, D>,
    translation: [f64; D],
    center: [f64; D],
    /// A^T, `[D, D]`.
    matrix_t: Tensor<B, 2>,
    /// b, `[1, D]`.
    bias: Tensor<B, 2>,
}

impl<B: Backend, const D: usize> AffineTransform<B, D> {
    /// Create a new affine transform.
    ///
    /// # Arguments
    /// * `matrix` - The linear part `A`
    /// * `translation` - The translation vector `t`
    /// * `center` - The fixed center `c`
    /// * `device` - Device to create tensors on
    pub fn new(
        matrix: SMatrix<f64, D, D>,
        translation: [f64; D],
        center: [f64; D],
        device: &B::Device,
    ) -> Self {
        let mut transposed = Vec::with_capacity(D * D);
        for i in 0..D {
            for j in 0..D {
                transposed.push(matrix[(j, i)] as f32);
            }
        }

        let mut bias = Vec::with_capacity(D);
        for i in 0..D {
            let mut b = center[i] + translation[i];
            for j in 0..D {
                b -= matrix[(i, j)] * center[j];
            }
            bias.push(b as f32);
        }

        Self {
            matrix,
            translation,
            center,
            matrix_t: upload(transposed, [D, D], device),
            bias: upload(bias, [1, D], device),
        }
    }

    /// Create an identity affine transform.
    pub fn identity(device: &B::Device) -> Self {
        Self::new(SMatrix::identity(), [0.0; D], [0.0; D], device)
    }

    /// Scale each axis by `factors` about `center`.
    pub fn scaling(factors: [f64; D], center: [f64; D], device: &B::Device) -> Self {
        let matrix = SMatrix::from_fn(|i, j| if i == j { factors[i] } else { 0.0 });
        Self::new(matrix, [0.0; D], center, device)
    }

    /// Get the transformation matrix.
    pub fn matrix(&self) -> SMatrix<f64, D, D> {
        self.matrix
    }

    /// Get the translation vector.
    pub fn translation(&self) -> [f64; D] {
        self.translation
    }

    /// Get the center of rotation.
    pub fn center(&self) -> [f64; D] {
        self.center
    }
}

impl<B: Backend> AffineTransform<B, 2> {
    /// Rotate by `angle` radians about `center`.
    ///
    /// Positive angles turn axis 0 towards axis 1.
    pub fn rotation_2d(angle: f64, center: [f64; 2], device: &B::Device) -> Self {
        let (sin, cos) = angle.sin_cos();
        let matrix = SMatrix::<f64, 2, 2>::new(cos, -sin, sin, cos);
        Self::new(matrix, [0.0; 2], center, device)
    }
}

impl<B: Backend, const D: usize> Transform<B, D> for AffineTransform<B, D> {
    fn transform_points(&self, points: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        check_points::<B, D>(&points)?;
        // Row vectors: y = x A^T + b
        Ok(points.matmul(self.matrix_t.clone()) + self.bias.clone())
    }

    fn inverse(&self) -> Option<Box<dyn Transform<B, D>>> {
        let inverse = DMatrix::from_fn(D, D, |i, j| self.matrix[(i, j)]).try_inverse()?;
        let matrix = SMatrix::<f64, D, D>::from_fn(|i, j| inverse[(i, j)]);
        // T^-1(y) = A^-1 (y - c) + c - A^-1 t
        let translation = std::array::from_fn(|i| {
            -(0..D).map(|j| matrix[(i, j)] * self.translation[j]).sum::<f64>()
        });
        Some(Box::new(Self::new(matrix, translation, self.center, &self.bias.device())))
    }
}
