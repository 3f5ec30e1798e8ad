//! Tensor backends and host/device data helpers.

use burn::tensor::{Tensor, TensorData};
use burn::tensor::backend::Backend;
use crate::error::{Result, WarpError};

/// CPU tensor backend, always available.
pub type Cpu = burn_ndarray::NdArray<f32>;

/// GPU tensor backend.
#[cfg(feature = "wgpu")]
pub type Gpu = burn::backend::Wgpu;

/// Highest spatial rank supported by the samplers.
pub const MAX_RANK: usize = 4;

/// Reject spatial ranks the samplers do not implement.
pub(crate) fn check_rank<const D: usize>() -> Result<()> {
    if D == 0 || D > MAX_RANK {
        return Err(WarpError::dimension_mismatch(format!(
            "only 1D to {MAX_RANK}D data is supported, got {D}D"
        )));
    }
    Ok(())
}

/// Check that `points` is a `[N, D]` batch and return `N`.
pub(crate) fn check_points<B: Backend, const D: usize>(points: &Tensor<B, 2>) -> Result<usize> {
    let [n, rank] = points.dims();
    if rank != D {
        return Err(WarpError::dimension_mismatch(format!(
            "points have {rank} coordinates per row, expected {D}"
        )));
    }
    Ok(n)
}

/// Row-major strides for `shape`.
pub(crate) fn strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for d in (0..shape.len().saturating_sub(1)).rev() {
        strides[d] = strides[d + 1] * shape[d + 1];
    }
    strides
}

/// Read a tensor back to the host as `f32`.
pub(crate) fn read_f32<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| WarpError::tensor_data(format!("{e:?}")))
}

/// Upload host values as a tensor of the given shape.
pub(crate) fn upload<B: Backend, const D: usize>(
    values: Vec<f32>,
    shape: [usize; D],
    device: &B::Device,
) -> Tensor<B, D> {
    Tensor::from_data(TensorData::new(values, shape.to_vec()), device)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strides() {
        assert_eq!(strides(&[2, 3, 4]), vec![12, 4, 1]);
        assert_eq!(strides(&[5]), vec![1]);
        assert!(strides(&[]).is_empty());
    }

    #[test]
    fn test_check_rank() {
        assert!(check_rank::<1>().is_ok());
        assert!(check_rank::<4>().is_ok());
        assert!(check_rank::<5>().is_err());
    }

    #[test]
    fn test_read_back() {
        let device = Default::default();
        let tensor = upload::<Cpu, 2>(vec![1.0, 2.0, 3.0, 4.0], [2, 2], &device);
        assert_eq!(read_f32(tensor).unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_check_points_rank() {
        let device = Default::default();
        let points = Tensor::<Cpu, 2>::zeros([7, 3], &device);
        assert_eq!(check_points::<Cpu, 3>(&points).unwrap(), 7);
        assert!(check_points::<Cpu, 2>(&points).is_err());
    }
}
