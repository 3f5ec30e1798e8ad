//! Boundary modes for sampling outside the image domain.
//!
//! Given an array `a b c d`, the modes extend it as:
//! * `Constant`: `k k k k | a b c d | k k k k`
//! * `Nearest`:  `a a a a | a b c d | d d d d`
//! * `Mirror`:   `d c b | a b c d | c b a`
//! * `Reflect`:  `d c b a | a b c d | d c b a`
//! * `Wrap`:     `a b c d | a b c d | a b c d`

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use crate::error::{Result, WarpError};
use crate::order::SplineOrder;

/// Tolerance on the image extent used by `Constant` mode.
///
/// Grid points scaled back to index space carry rounding error, a point at
/// `n - 1 + 1e-6` still counts as inside.
pub const CONSTANT_TOLERANCE: f64 = 1e-4;

/// How samples beyond the edge of the image are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryMode {
    /// Points outside the image take the constant value `cval`.
    #[default]
    Constant,
    /// Repeat the edge value.
    Nearest,
    /// Whole-sample symmetric extension.
    Mirror,
    /// Half-sample symmetric extension.
    Reflect,
    /// Periodic extension.
    Wrap,
}

impl BoundaryMode {
    /// Every mode, in declaration order.
    pub const ALL: [BoundaryMode; 5] = [
        BoundaryMode::Constant,
        BoundaryMode::Nearest,
        BoundaryMode::Mirror,
        BoundaryMode::Reflect,
        BoundaryMode::Wrap,
    ];

    /// Lowercase name, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            BoundaryMode::Constant => "constant",
            BoundaryMode::Nearest => "nearest",
            BoundaryMode::Mirror => "mirror",
            BoundaryMode::Reflect => "reflect",
            BoundaryMode::Wrap => "wrap",
        }
    }

    /// Map an integer sample index into `0..len`.
    ///
    /// Returns `None` for `Constant` when the index is outside the array.
    pub fn map_index(self, index: i64, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let n = len as i64;
        let mapped = match self {
            BoundaryMode::Constant => {
                if index < 0 || index >= n {
                    return None;
                }
                index
            }
            BoundaryMode::Nearest => index.clamp(0, n - 1),
            BoundaryMode::Mirror => {
                if n == 1 {
                    return Some(0);
                }
                let period = 2 * n - 2;
                let i = index.rem_euclid(period);
                if i >= n { period - i } else { i }
            }
            BoundaryMode::Reflect => {
                let period = 2 * n;
                let i = index.rem_euclid(period);
                if i >= n { period - 1 - i } else { i }
            }
            BoundaryMode::Wrap => index.rem_euclid(n),
        };
        Some(mapped as usize)
    }

    /// Whether a continuous coordinate lies outside `[0, len - 1]`.
    pub fn is_outside(coord: f64, len: usize) -> bool {
        coord < -CONSTANT_TOLERANCE || coord > (len as f64 - 1.0) + CONSTANT_TOLERANCE
    }

    /// Mode used to fold spline neighbours back into the array.
    ///
    /// Orders 0 and 1 fold neighbours with the mode itself, except that
    /// `Constant` only decides which points get `cval` and clamps the rest.
    /// Higher orders evaluate mirror-extended coefficients, or periodic ones
    /// for `Wrap`; see [`BoundaryMode::fold_coordinate`].
    pub(crate) fn neighbour_mode(self, order: SplineOrder) -> BoundaryMode {
        match self {
            BoundaryMode::Wrap => BoundaryMode::Wrap,
            _ if order.needs_prefilter() => BoundaryMode::Mirror,
            BoundaryMode::Constant => BoundaryMode::Nearest,
            other => other,
        }
    }

    /// Move a coordinate into the range where a mirror-extended spline
    /// agrees with this mode. Only used for orders 2 and 3.
    pub(crate) fn fold_coordinate(self, x: f64, len: usize) -> f64 {
        let n = len as f64;
        match self {
            BoundaryMode::Nearest => x.clamp(0.0, n - 1.0),
            BoundaryMode::Reflect => {
                // Half-sample symmetric about -0.5 and n - 0.5.
                let period = 2.0 * n;
                let y = (x + 0.5).rem_euclid(period);
                let y = if y >= n { period - y } else { y };
                y - 0.5
            }
            _ => x,
        }
    }

    /// Whether spline coefficients for this mode use a periodic extension.
    pub(crate) fn is_periodic(self) -> bool {
        self == BoundaryMode::Wrap
    }
}

impl fmt::Display for BoundaryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoundaryMode {
    type Err = WarpError;

    fn from_str(s: &str) -> Result<Self> {
        BoundaryMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| WarpError::InvalidMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extend(mode: BoundaryMode, len: usize, range: std::ops::Range<i64>) -> Vec<Option<usize>> {
        range.map(|i| mode.map_index(i, len)).collect()
    }

    #[test]
    fn test_mirror_pattern() {
        // d c b | a b c d | c b a
        let got = extend(BoundaryMode::Mirror, 4, -3..7);
        let expected: [usize; 10] = [3, 2, 1, 0, 1, 2, 3, 2, 1, 0];
        assert_eq!(got, expected.iter().map(|&i| Some(i)).collect::<Vec<_>>());
    }

    #[test]
    fn test_reflect_pattern() {
        // d c b a | a b c d | d c b a
        let got = extend(BoundaryMode::Reflect, 4, -4..8);
        let expected: [usize; 12] = [3, 2, 1, 0, 0, 1, 2, 3, 3, 2, 1, 0];
        assert_eq!(got, expected.iter().map(|&i| Some(i)).collect::<Vec<_>>());
    }

    #[test]
    fn test_wrap_and_nearest() {
        assert_eq!(BoundaryMode::Wrap.map_index(-1, 4), Some(3));
        assert_eq!(BoundaryMode::Wrap.map_index(9, 4), Some(1));
        assert_eq!(BoundaryMode::Nearest.map_index(-5, 4), Some(0));
        assert_eq!(BoundaryMode::Nearest.map_index(12, 4), Some(3));
    }

    #[test]
    fn test_constant_outside() {
        assert_eq!(BoundaryMode::Constant.map_index(-1, 4), None);
        assert_eq!(BoundaryMode::Constant.map_index(4, 4), None);
        assert_eq!(BoundaryMode::Constant.map_index(2, 4), Some(2));
        assert!(BoundaryMode::is_outside(-0.5, 4));
        assert!(BoundaryMode::is_outside(3.01, 4));
        assert!(!BoundaryMode::is_outside(3.0 + 1e-6, 4));
    }

    #[test]
    fn test_single_sample_axis() {
        for mode in [BoundaryMode::Mirror, BoundaryMode::Reflect, BoundaryMode::Wrap, BoundaryMode::Nearest] {
            assert_eq!(mode.map_index(-3, 1), Some(0), "{mode}");
            assert_eq!(mode.map_index(5, 1), Some(0), "{mode}");
        }
    }

    #[test]
    fn test_parse_and_display() {
        for mode in BoundaryMode::ALL {
            assert_eq!(mode.to_string().parse::<BoundaryMode>().unwrap(), mode);
        }
        assert_eq!("MIRROR".parse::<BoundaryMode>().unwrap(), BoundaryMode::Mirror);
        assert!(matches!("grid-wrap".parse::<BoundaryMode>(), Err(WarpError::InvalidMode(_))));
    }

    #[test]
    fn test_neighbour_mode() {
        assert_eq!(BoundaryMode::Constant.neighbour_mode(SplineOrder::LINEAR), BoundaryMode::Nearest);
        assert_eq!(BoundaryMode::Constant.neighbour_mode(SplineOrder::CUBIC), BoundaryMode::Mirror);
        assert_eq!(BoundaryMode::Wrap.neighbour_mode(SplineOrder::CUBIC), BoundaryMode::Wrap);
        assert_eq!(BoundaryMode::Reflect.neighbour_mode(SplineOrder::QUADRATIC), BoundaryMode::Mirror);
        assert_eq!(BoundaryMode::Reflect.neighbour_mode(SplineOrder::LINEAR), BoundaryMode::Reflect);
    }

    #[test]
    fn test_fold_coordinate() {
        assert_eq!(BoundaryMode::Nearest.fold_coordinate(-2.5, 4), 0.0);
        assert_eq!(BoundaryMode::Nearest.fold_coordinate(7.0, 4), 3.0);
        // Reflect: -1.25 sits 0.75 beyond -0.5, so it folds to 0.25.
        assert!((BoundaryMode::Reflect.fold_coordinate(-1.25, 4) - 0.25).abs() < 1e-12);
        assert!((BoundaryMode::Reflect.fold_coordinate(4.0, 4) - 3.0).abs() < 1e-12);
        assert!((BoundaryMode::Reflect.fold_coordinate(9.0, 4) - 1.0).abs() < 1e-12);
        assert_eq!(BoundaryMode::Mirror.fold_coordinate(-1.5, 4), -1.5);
    }
}
