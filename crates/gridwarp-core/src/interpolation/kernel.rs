//! Host B-spline kernel.
//!
//! Evaluates B-splines of order 0 to 3 on the CPU. Samples are converted to
//! spline coefficients once with a separable recursive prefilter (orders 2
//! and 3), after which every point is evaluated independently in parallel.
//! The prefilter extends the signal by mirroring, or periodically for
//! [`BoundaryMode::Wrap`].

use std::sync::OnceLock;
use rayon::prelude::*;
use crate::backend::{strides, MAX_RANK};
use crate::boundary::BoundaryMode;
use crate::error::Result;
use crate::order::SplineOrder;

/// Relative accuracy of the truncated causal initialisation.
const PREFILTER_TOLERANCE: f64 = 1e-9;

/// Contiguous neighbourhood of a point along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Support {
    /// Index of the first neighbour, possibly outside the array.
    pub start: i64,
    pub weights: [f64; 4],
    pub len: usize,
}

/// Neighbour indices and weights of the order-`order` B-spline at `x`.
///
/// Index arithmetic saturates, so huge or infinite coordinates yield indices
/// at the ends of the `i64` range rather than overflowing.
pub(crate) fn support(order: SplineOrder, x: f64) -> Support {
    match order.get() {
        0 => Support {
            start: (x + 0.5).floor() as i64,
            weights: [1.0, 0.0, 0.0, 0.0],
            len: 1,
        },
        1 => {
            let i0 = x.floor();
            let t = x - i0;
            Support {
                start: i0 as i64,
                weights: [1.0 - t, t, 0.0, 0.0],
                len: 2,
            }
        }
        2 => {
            let centre = (x + 0.5).floor();
            let t = x - centre;
            Support {
                start: (centre as i64).saturating_sub(1),
                weights: [
                    0.5 * (0.5 - t) * (0.5 - t),
                    0.75 - t * t,
                    0.5 * (t + 0.5) * (t + 0.5),
                    0.0,
                ],
                len: 3,
            }
        }
        _ => {
            let i0 = x.floor();
            let t = x - i0;
            let t2 = t * t;
            let t3 = t2 * t;
            let one_minus_t = 1.0 - t;
            Support {
                start: (i0 as i64).saturating_sub(1),
                weights: [
                    one_minus_t * one_minus_t * one_minus_t / 6.0,
                    (3.0 * t3 - 6.0 * t2 + 4.0) / 6.0,
                    (-3.0 * t3 + 3.0 * t2 + 3.0 * t + 1.0) / 6.0,
                    t3 / 6.0,
                ],
                len: 4,
            }
        }
    }
}

/// Pole of the recursive prefilter for `order`.
fn pole(order: SplineOrder) -> Option<f64> {
    match order.get() {
        2 => Some(8f64.sqrt() - 3.0),
        3 => Some(3f64.sqrt() - 2.0),
        _ => None,
    }
}

/// Convert one line of samples to B-spline coefficients in place.
///
/// Mirror-symmetric boundary conditions on both ends.
fn prefilter_line(line: &mut [f64], z: f64) {
    let n = line.len();
    if n < 2 {
        return;
    }

    let gain = (1.0 - z) * (1.0 - 1.0 / z);
    for c in line.iter_mut() {
        *c *= gain;
    }

    // Causal initialisation.
    let horizon = (PREFILTER_TOLERANCE.ln() / z.abs().ln()).ceil() as usize;
    if horizon < n {
        let mut zn = z;
        let mut sum = line[0];
        for c in line.iter().take(horizon).skip(1) {
            sum += zn * c;
            zn *= z;
        }
        line[0] = sum;
    } else {
        let iz = 1.0 / z;
        let mut zn = z;
        let mut z2n = z.powi(n as i32 - 1);
        let mut sum = line[0] + z2n * line[n - 1];
        z2n *= z2n * iz;
        for c in line.iter().take(n - 1).skip(1) {
            sum += (zn + z2n) * c;
            zn *= z;
            z2n *= iz;
        }
        line[0] = sum / (1.0 - zn * zn);
    }

    for k in 1..n {
        line[k] += z * line[k - 1];
    }

    // Anti-causal initialisation and recursion.
    line[n - 1] = (z / (z * z - 1.0)) * (z * line[n - 2] + line[n - 1]);
    for k in (0..n - 1).rev() {
        line[k] = z * (line[k + 1] - line[k]);
    }
}

/// Periodic variant of [`prefilter_line`]; both initialisations are exact.
fn prefilter_line_periodic(line: &mut [f64], z: f64) {
    let n = line.len();
    if n < 2 {
        return;
    }

    let gain = (1.0 - z) * (1.0 - 1.0 / z);
    for c in line.iter_mut() {
        *c *= gain;
    }
    let wrap = 1.0 - z.powi(n as i32);

    let mut zk = 1.0;
    let mut sum = 0.0;
    for k in 0..n {
        sum += zk * line[(n - k) % n];
        zk *= z;
    }
    line[0] = sum / wrap;
    for k in 1..n {
        line[k] += z * line[k - 1];
    }

    let mut zk = 1.0;
    let mut sum = 0.0;
    for k in 0..n {
        sum += zk * line[(n - 1 + k) % n];
        zk *= z;
    }
    line[n - 1] = -z * sum / wrap;
    for k in (0..n - 1).rev() {
        line[k] = z * (line[k + 1] - line[k]);
    }
}

/// Separable prefilter over every axis of a row-major array.
pub(crate) fn prefilter(data: &mut [f64], shape: &[usize], order: SplineOrder, periodic: bool) {
    let Some(z) = pole(order) else {
        return;
    };
    let strides = strides(shape);
    for (axis, &len) in shape.iter().enumerate() {
        if len < 2 {
            continue;
        }
        let stride = strides[axis];
        let outer: usize = shape[..axis].iter().product();
        let mut line = vec![0.0; len];
        for o in 0..outer {
            for inner in 0..stride {
                let base = o * len * stride + inner;
                for (k, value) in line.iter_mut().enumerate() {
                    *value = data[base + k * stride];
                }
                if periodic {
                    prefilter_line_periodic(&mut line, z);
                } else {
                    prefilter_line(&mut line, z);
                }
                for (k, value) in line.iter().enumerate() {
                    data[base + k * stride] = *value;
                }
            }
        }
    }
}

/// Spline coefficients of one array, ready for evaluation.
#[derive(Debug, Clone)]
pub(crate) struct HostSpline {
    coefficients: Vec<f64>,
    shape: Vec<usize>,
    strides: Vec<usize>,
    order: SplineOrder,
    periodic: bool,
}

impl HostSpline {
    /// Build the spline of `values` (row-major, `shape`) for `order`,
    /// prefiltered for evaluation under `mode`.
    pub fn new(values: &[f32], shape: &[usize], order: SplineOrder, mode: BoundaryMode) -> Self {
        let periodic = mode.is_periodic();
        let mut coefficients: Vec<f64> = values.iter().map(|&v| v as f64).collect();
        prefilter(&mut coefficients, shape, order, periodic);
        Self {
            coefficients,
            shape: shape.to_vec(),
            strides: strides(shape),
            order,
            periodic,
        }
    }

    pub fn order(&self) -> SplineOrder {
        self.order
    }

    /// Evaluate at every point of a row-major `[N, rank]` coordinate buffer.
    ///
    /// `mode` must have the same periodicity the spline was built for.
    pub fn sample(&self, points: &[f32], mode: BoundaryMode, cval: f32) -> Vec<f32> {
        let rank = self.shape.len();
        points
            .par_chunks(rank)
            .map(|point| self.sample_point(point, mode, cval))
            .collect()
    }

    fn sample_point(&self, point: &[f32], mode: BoundaryMode, cval: f32) -> f32 {
        let rank = self.shape.len();
        if mode == BoundaryMode::Constant
            && point
                .iter()
                .zip(&self.shape)
                .any(|(&c, &len)| BoundaryMode::is_outside(c as f64, len))
        {
            return cval;
        }

        debug_assert_eq!(mode.is_periodic(), self.periodic);
        let neighbour = mode.neighbour_mode(self.order);
        let fold = self.order.needs_prefilter();
        let mut index = [[0usize; 4]; MAX_RANK];
        let mut weight = [[0f64; 4]; MAX_RANK];
        let mut count = [0usize; MAX_RANK];

        for d in 0..rank {
            let x = if fold {
                mode.fold_coordinate(point[d] as f64, self.shape[d])
            } else {
                point[d] as f64
            };
            let s = support(self.order, x);
            for k in 0..s.len {
                let Some(i) = neighbour.map_index(s.start.saturating_add(k as i64), self.shape[d]) else {
                    continue;
                };
                index[d][count[d]] = i;
                weight[d][count[d]] = s.weights[k];
                count[d] += 1;
            }
            if count[d] == 0 {
                return cval;
            }
        }

        let mut counter = [0usize; MAX_RANK];
        let mut acc = 0.0;
        'outer: loop {
            let mut w = 1.0;
            let mut flat = 0;
            for d in 0..rank {
                w *= weight[d][counter[d]];
                flat += index[d][counter[d]] * self.strides[d];
            }
            acc += w * self.coefficients[flat];

            let mut d = rank;
            loop {
                if d == 0 {
                    break 'outer;
                }
                d -= 1;
                counter[d] += 1;
                if counter[d] < count[d] {
                    break;
                }
                counter[d] = 0;
            }
        }
        acc as f32
    }
}

/// Lazily built splines of one array, one slot per order and extension.
#[derive(Debug, Clone, Default)]
pub(crate) struct SplineCache {
    slots: [OnceLock<HostSpline>; 8],
}

impl SplineCache {
    /// Get the spline for `order` under `mode`, building it from `values`
    /// (row-major, `shape`) on first use.
    pub fn get_or_build<F>(&self, order: SplineOrder, mode: BoundaryMode, values: F) -> Result<&HostSpline>
    where
        F: FnOnce() -> Result<(Vec<f32>, Vec<usize>)>,
    {
        let slot = &self.slots[2 * order.get() as usize + mode.is_periodic() as usize];
        if let Some(spline) = slot.get() {
            return Ok(spline);
        }
        let (values, shape) = values()?;
        Ok(slot.get_or_init(|| HostSpline::new(&values, &shape, order, mode)))
    }

    #[cfg(test)]
    pub fn is_built(&self, order: SplineOrder, mode: BoundaryMode) -> bool {
        self.slots[2 * order.get() as usize + mode.is_periodic() as usize].get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_support_partition_of_unity() {
        for order in 0..=3 {
            let order = SplineOrder::new(order).unwrap();
            for &x in &[0.0, 0.2, 0.5, 1.49, 2.75, -0.3] {
                let s = support(order, x);
                let sum: f64 = s.weights[..s.len].iter().sum();
                assert!((sum - 1.0).abs() < 1e-12, "order {order} at {x}: {sum}");
            }
        }
    }

    #[test]
    fn test_support_nearest_rounding() {
        assert_eq!(support(SplineOrder::NEAREST, 1.49).start, 1);
        assert_eq!(support(SplineOrder::NEAREST, 1.5).start, 2);
        assert_eq!(support(SplineOrder::NEAREST, -0.6).start, -1);
    }

    #[test]
    fn test_cubic_weights_at_node() {
        let s = support(SplineOrder::CUBIC, 2.0);
        assert_eq!(s.start, 1);
        assert!((s.weights[0] - 1.0 / 6.0).abs() < 1e-12);
        assert!((s.weights[1] - 2.0 / 3.0).abs() < 1e-12);
        assert!((s.weights[2] - 1.0 / 6.0).abs() < 1e-12);
        assert!(s.weights[3].abs() < 1e-12);
    }

    #[test]
    fn test_prefilter_constant_signal() {
        // A constant signal is its own spline coefficient sequence.
        for order in [SplineOrder::QUADRATIC, SplineOrder::CUBIC] {
            for n in [2usize, 5, 40] {
                for periodic in [false, true] {
                    let mut line = vec![3.0; n];
                    prefilter(&mut line, &[n], order, periodic);
                    for c in &line {
                        assert!((c - 3.0).abs() < 1e-6, "order {order}, n {n}: {c}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_spline_interpolates_nodes() {
        let values: Vec<f32> = (0..12).map(|i| ((i * 7) % 5) as f32).collect();
        for order in 0..=3 {
            let order = SplineOrder::new(order).unwrap();
            for mode in BoundaryMode::ALL {
                let spline = HostSpline::new(&values, &[12], order, mode);
                let points: Vec<f32> = (0..12).map(|i| i as f32).collect();
                let sampled = spline.sample(&points, mode, 0.0);
                for (got, want) in sampled.iter().zip(&values) {
                    assert!((got - want).abs() < 1e-4, "order {order} {mode}: {got} vs {want}");
                }
            }
        }
    }

    #[test]
    fn test_spline_interpolates_nodes_2d() {
        let shape = [5, 6];
        let values: Vec<f32> = (0..30).map(|i| (i as f32 * 0.37).sin()).collect();
        let spline = HostSpline::new(&values, &shape, SplineOrder::CUBIC, BoundaryMode::Mirror);
        let mut points = Vec::new();
        for r in 0..5 {
            for c in 0..6 {
                points.push(r as f32);
                points.push(c as f32);
            }
        }
        let sampled = spline.sample(&points, BoundaryMode::Mirror, 0.0);
        for (got, want) in sampled.iter().zip(&values) {
            assert!((got - want).abs() < 1e-4, "{got} vs {want}");
        }
    }

    #[test]
    fn test_cubic_reproduces_ramp_interior() {
        let values: Vec<f32> = (0..20).map(|i| i as f32).collect();
        let spline = HostSpline::new(&values, &[20], SplineOrder::CUBIC, BoundaryMode::Mirror);
        let sampled = spline.sample(&[9.5, 10.25], BoundaryMode::Mirror, 0.0);
        assert!((sampled[0] - 9.5).abs() < 1e-3);
        assert!((sampled[1] - 10.25).abs() < 1e-3);
    }

    #[test]
    fn test_linear_midpoint() {
        let spline = HostSpline::new(&[0.0, 10.0, 20.0, 30.0], &[4], SplineOrder::LINEAR, BoundaryMode::Nearest);
        let sampled = spline.sample(&[0.5, 2.25], BoundaryMode::Nearest, 0.0);
        assert!((sampled[0] - 5.0).abs() < 1e-6);
        assert!((sampled[1] - 22.5).abs() < 1e-6);
    }

    #[test]
    fn test_constant_mode_fill() {
        let spline = HostSpline::new(&[1.0, 2.0, 3.0], &[3], SplineOrder::CUBIC, BoundaryMode::Constant);
        let sampled = spline.sample(&[-1.0, 2.5, 1.0], BoundaryMode::Constant, -7.0);
        assert_eq!(sampled[0], -7.0);
        assert_eq!(sampled[1], -7.0);
        assert!((sampled[2] - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_wrap_mode_periodic() {
        let spline = HostSpline::new(&[0.0, 1.0, 2.0, 3.0], &[4], SplineOrder::NEAREST, BoundaryMode::Wrap);
        let sampled = spline.sample(&[4.0, -1.0, 5.2], BoundaryMode::Wrap, 0.0);
        assert_eq!(sampled, vec![0.0, 3.0, 1.0]);
    }

    #[test]
    fn test_cubic_wrap_is_periodic() {
        let values: Vec<f32> = (0..8).map(|i| (i as f32 * 0.9).cos()).collect();
        let spline = HostSpline::new(&values, &[8], SplineOrder::CUBIC, BoundaryMode::Wrap);
        let sampled = spline.sample(&[0.3, 8.3, -7.7, 7.5], BoundaryMode::Wrap, 0.0);
        assert!((sampled[0] - sampled[1]).abs() < 1e-5);
        assert!((sampled[0] - sampled[2]).abs() < 1e-5);
        // Between the last sample and the first one.
        let lo = values[7].min(values[0]) - 0.5;
        let hi = values[7].max(values[0]) + 0.5;
        assert!(sampled[3] > lo && sampled[3] < hi);
    }

    #[test]
    fn test_cubic_nearest_clamps_outside() {
        let values: Vec<f32> = vec![1.0, 4.0, 2.0, 8.0, 5.0];
        let spline = HostSpline::new(&values, &[5], SplineOrder::CUBIC, BoundaryMode::Nearest);
        let sampled = spline.sample(&[-3.0, 12.0], BoundaryMode::Nearest, 0.0);
        assert!((sampled[0] - 1.0).abs() < 1e-4);
        assert!((sampled[1] - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_support_saturates_far_coordinates() {
        for order in 0..=3 {
            let order = SplineOrder::new(order).unwrap();
            assert!(support(order, f64::INFINITY).start > i64::MAX - 4);
            assert_eq!(support(order, f64::NEG_INFINITY).start, i64::MIN);
            assert_eq!(support(order, -1e30).start, i64::MIN);
        }
    }

    #[test]
    fn test_far_coordinates_do_not_overflow() {
        let values = [0.0f32, 1.0, 2.0];
        let far = [1e30f32, -1e30, f32::INFINITY, f32::NEG_INFINITY];
        for order in [SplineOrder::LINEAR, SplineOrder::CUBIC] {
            for mode in BoundaryMode::ALL {
                let spline = HostSpline::new(&values, &[3], order, mode);
                let sampled = spline.sample(&far, mode, -1.0);
                assert_eq!(sampled.len(), far.len());
                if mode == BoundaryMode::Constant {
                    assert!(sampled.iter().all(|&v| v == -1.0), "{order}: {sampled:?}");
                }
                if mode == BoundaryMode::Nearest {
                    assert!((sampled[0] - 2.0).abs() < 1e-4, "{order}: {sampled:?}");
                    assert!((sampled[1] - 0.0).abs() < 1e-4, "{order}: {sampled:?}");
                }
            }
        }
    }

    #[test]
    fn test_spline_cache() {
        let cache = SplineCache::default();
        let build = || Ok((vec![0.0, 1.0, 4.0], vec![3]));
        assert!(!cache.is_built(SplineOrder::CUBIC, BoundaryMode::Wrap));
        let spline = cache.get_or_build(SplineOrder::CUBIC, BoundaryMode::Wrap, build).unwrap();
        assert_eq!(spline.order(), SplineOrder::CUBIC);
        assert!(cache.is_built(SplineOrder::CUBIC, BoundaryMode::Wrap));
        assert!(!cache.is_built(SplineOrder::CUBIC, BoundaryMode::Mirror));
        let failing = || Err(crate::error::WarpError::tensor_data("unreachable"));
        assert!(cache.get_or_build(SplineOrder::CUBIC, BoundaryMode::Wrap, failing).is_ok());
    }
}
