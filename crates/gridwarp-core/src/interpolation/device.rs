//! Device coordinate mapping.
//!
//! Nearest-neighbour and linear sampling written purely with tensor ops
//! (floor, gather, masks) so that the whole computation runs on the
//! backend's device. Higher orders need a recursive prefilter and are only
//! available on the host.

use burn::tensor::{Int, Tensor};
use burn::tensor::backend::Backend;
use crate::backend::{check_points, check_rank, strides};
use crate::boundary::{BoundaryMode, CONSTANT_TOLERANCE};
use crate::error::{Result, WarpError};
use crate::order::{Execution, SplineOrder};

/// Sample `data` at continuous indices `points` `[N, D]`.
///
/// Column `d` of `points` addresses axis `d` of `data`. Returns `[N]` values.
pub fn map_coordinates<B: Backend, const D: usize>(
    data: &Tensor<B, D>,
    points: Tensor<B, 2>,
    order: SplineOrder,
    mode: BoundaryMode,
    cval: f32,
) -> Result<Tensor<B, 1>> {
    check_rank::<D>()?;
    Execution::Device.validate(order)?;
    let n = check_points::<B, D>(&points)?;

    let shape = data.dims();
    if shape.iter().any(|&s| s == 0) {
        return Err(WarpError::invalid_grid(format!("cannot sample empty array of shape {shape:?}")));
    }
    let device = points.device();
    let total: usize = shape.iter().product();
    let strides = index_strides(&shape)?;
    let flat = data.clone().reshape([total]);

    let coords: Vec<Tensor<B, 1>> = (0..D)
        .map(|d| points.clone().narrow(1, d, 1).reshape([n]))
        .collect();

    let values = if order == SplineOrder::NEAREST {
        let mut index = Tensor::<B, 1, Int>::zeros([n], &device);
        for d in 0..D {
            let i = fold_indices(coords[d].clone().add_scalar(0.5).floor(), shape[d], mode);
            index = index + i.int().mul_scalar(strides[d]);
        }
        flat.gather(0, index)
    } else {
        // Multilinear: accumulate the 2^D corners.
        let mut lower = Vec::with_capacity(D);
        let mut upper = Vec::with_capacity(D);
        let mut frac = Vec::with_capacity(D);
        for d in 0..D {
            let i0 = coords[d].clone().floor();
            let t = coords[d].clone() - i0.clone();
            upper.push(fold_indices(i0.clone().add_scalar(1.0), shape[d], mode).int());
            lower.push(fold_indices(i0, shape[d], mode).int());
            frac.push(t);
        }

        let mut acc = Tensor::<B, 1>::zeros([n], &device);
        for corner in 0..(1usize << D) {
            let mut index = Tensor::<B, 1, Int>::zeros([n], &device);
            let mut weight = Tensor::<B, 1>::ones([n], &device);
            for d in 0..D {
                let (i, w) = if (corner >> d) & 1 == 1 {
                    (upper[d].clone(), frac[d].clone())
                } else {
                    (lower[d].clone(), frac[d].clone().neg().add_scalar(1.0))
                };
                index = index + i.mul_scalar(strides[d]);
                weight = weight * w;
            }
            acc = acc + flat.clone().gather(0, index) * weight;
        }
        acc
    };

    if mode != BoundaryMode::Constant {
        return Ok(values);
    }

    // Points outside the image extent take `cval`.
    let mut inside = Tensor::<B, 1>::ones([n], &device);
    for d in 0..D {
        let upper_bound = (shape[d] as f64 - 1.0 + CONSTANT_TOLERANCE) as f32;
        let lower_ok = coords[d].clone().greater_equal_elem(-CONSTANT_TOLERANCE as f32).float();
        let upper_ok = coords[d].clone().lower_equal_elem(upper_bound).float();
        inside = inside * lower_ok * upper_ok;
    }
    let outside = inside.clone().neg().add_scalar(1.0);
    Ok(values * inside + outside.mul_scalar(cval))
}

/// Fold integer-valued float indices into `0..len` following `mode`.
///
/// `Constant` clamps; the out-of-extent mask is applied by the caller.
pub(crate) fn fold_indices<B: Backend>(index: Tensor<B, 1>, len: usize, mode: BoundaryMode) -> Tensor<B, 1> {
    let n = len as f32;
    let folded = match mode {
        BoundaryMode::Constant | BoundaryMode::Nearest => index,
        BoundaryMode::Mirror => {
            if len == 1 {
                index.zeros_like()
            } else {
                let period = 2.0 * n - 2.0;
                let i = rem_euclid(index, period);
                let over = i.clone().greater_equal_elem(n);
                i.clone().mask_where(over, i.neg().add_scalar(period))
            }
        }
        BoundaryMode::Reflect => {
            let period = 2.0 * n;
            let i = rem_euclid(index, period);
            let over = i.clone().greater_equal_elem(n);
            i.clone().mask_where(over, i.neg().add_scalar(period - 1.0))
        }
        BoundaryMode::Wrap => rem_euclid(index, n),
    };
    folded.clamp(0.0, n - 1.0)
}

/// Row-major strides as device `Int` scalars.
///
/// Backends may store `Int` tensors as `i32`, so flat indices must fit in it.
fn index_strides(shape: &[usize]) -> Result<Vec<i32>> {
    let total = shape.iter().try_fold(1usize, |acc, &s| acc.checked_mul(s));
    if total.map_or(true, |t| t > i32::MAX as usize) {
        return Err(WarpError::invalid_grid(format!(
            "array of shape {shape:?} is too large to index on the device"
        )));
    }
    strides(shape)
        .into_iter()
        .map(|s| i32::try_from(s).map_err(|_| WarpError::invalid_grid(format!("stride {s} overflows"))))
        .collect()
}

fn rem_euclid<B: Backend>(x: Tensor<B, 1>, period: f32) -> Tensor<B, 1> {
    x.clone() - x.div_scalar(period).floor().mul_scalar(period)
}
