//! Spline orders and execution paths.
//!
//! The host path evaluates splines of order 0 through 3. The device path
//! keeps all work in tensor ops and only implements nearest-neighbour and
//! linear sampling.

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use crate::error::{Result, WarpError};

/// B-spline interpolation order.
///
/// Order 0 is nearest-neighbour, order 1 is (multi)linear, orders 2 and 3
/// are quadratic and cubic B-splines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SplineOrder(u8);

impl SplineOrder {
    pub const NEAREST: Self = Self(0);
    pub const LINEAR: Self = Self(1);
    pub const QUADRATIC: Self = Self(2);
    pub const CUBIC: Self = Self(3);

    /// Highest order any execution path implements.
    pub const MAX: u8 = 3;

    /// Create a spline order, rejecting orders above [`SplineOrder::MAX`].
    pub fn new(order: u8) -> Result<Self> {
        if order > Self::MAX {
            return Err(WarpError::InvalidOrder(order));
        }
        Ok(Self(order))
    }

    /// The order as an integer.
    pub fn get(self) -> u8 {
        self.0
    }

    /// Whether the device path can sample with this order.
    pub fn is_device_supported(self) -> bool {
        self.0 <= Execution::Device.max_order()
    }

    /// Orders above 1 need samples converted to spline coefficients first.
    pub(crate) fn needs_prefilter(self) -> bool {
        self.0 > 1
    }
}

impl Default for SplineOrder {
    fn default() -> Self {
        Self::LINEAR
    }
}

impl TryFrom<u8> for SplineOrder {
    type Error = WarpError;

    fn try_from(order: u8) -> Result<Self> {
        Self::new(order)
    }
}

impl From<SplineOrder> for u8 {
    fn from(order: SplineOrder) -> Self {
        order.0
    }
}

impl fmt::Display for SplineOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Code path used to evaluate a sampling operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Execution {
    /// Samples are read back and evaluated on the CPU.
    #[default]
    Host,
    /// Samples stay on the tensor backend's device.
    Device,
}

impl Execution {
    /// Highest spline order this path implements.
    pub fn max_order(self) -> u8 {
        match self {
            Execution::Host => SplineOrder::MAX,
            Execution::Device => 1,
        }
    }

    /// Check that `order` can be evaluated on this path.
    pub fn validate(self, order: SplineOrder) -> Result<SplineOrder> {
        if order.get() > self.max_order() {
            return Err(WarpError::UnsupportedOrder {
                order: order.get(),
                execution: self,
                max: self.max_order(),
            });
        }
        Ok(order)
    }

    /// Lowercase name, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            Execution::Host => "host",
            Execution::Device => "device",
        }
    }
}

impl fmt::Display for Execution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Execution {
    type Err = WarpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "host" | "cpu" => Ok(Execution::Host),
            "device" | "gpu" => Ok(Execution::Device),
            other => Err(WarpError::config(format!("unknown execution path '{other}'"))),
        }
    }
}
