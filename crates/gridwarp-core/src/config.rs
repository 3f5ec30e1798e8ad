//! Sampling configuration.
//!
//! Interpolators and transforms carry a [`SamplingConfig`] with their default
//! order, boundary mode and fill value. Individual calls may override any of
//! these through [`SampleOptions`].

use std::path::Path;
use serde::{Serialize, Deserialize};
use crate::boundary::BoundaryMode;
use crate::error::{Result, WarpError};
use crate::order::SplineOrder;

/// Default sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// B-spline order.
    pub order: SplineOrder,
    /// Treatment of samples beyond the image edge.
    pub mode: BoundaryMode,
    /// Fill value for [`BoundaryMode::Constant`].
    pub cval: f32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            order: SplineOrder::LINEAR,
            mode: BoundaryMode::Constant,
            cval: 0.0,
        }
    }
}

impl SamplingConfig {
    /// Create a config with default settings (linear, constant, 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults for displacement grids: mirrored edges.
    pub fn for_transform(order: SplineOrder) -> Self {
        Self {
            order,
            mode: BoundaryMode::Mirror,
            cval: 0.0,
        }
    }

    /// Set the spline order.
    pub fn with_order(mut self, order: SplineOrder) -> Self {
        self.order = order;
        self
    }

    /// Set the boundary mode.
    pub fn with_mode(mut self, mode: BoundaryMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the fill value for constant mode.
    pub fn with_cval(mut self, cval: f32) -> Self {
        self.cval = cval;
        self
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    ///
    /// ```
    /// use gridwarp_core::config::SamplingConfig;
    /// use gridwarp_core::{BoundaryMode, SplineOrder};
    ///
    /// let config = SamplingConfig::from_json_str(r#"{ "order": 3, "mode": "mirror" }"#).unwrap();
    /// assert_eq!(config.order, SplineOrder::CUBIC);
    /// assert_eq!(config.mode, BoundaryMode::Mirror);
    /// assert_eq!(config.cval, 0.0);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| WarpError::config(e.to_string()))
    }

    /// Read a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }
}

/// Per-call overrides of a [`SamplingConfig`].
///
/// Unset fields fall back to the owner's defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleOptions {
    /// Spline order override.
    pub order: Option<SplineOrder>,
    /// Boundary mode override.
    pub mode: Option<BoundaryMode>,
    /// Fill value override.
    pub cval: Option<f32>,
}

impl SampleOptions {
    /// Options with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the spline order.
    pub fn with_order(mut self, order: SplineOrder) -> Self {
        self.order = Some(order);
        self
    }

    /// Set the boundary mode.
    pub fn with_mode(mut self, mode: BoundaryMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Set the fill value for constant mode.
    pub fn with_cval(mut self, cval: f32) -> Self {
        self.cval = Some(cval);
        self
    }

    /// Merge these overrides onto `base`.
    pub fn resolve(&self, base: &SamplingConfig) -> SamplingConfig {
        SamplingConfig {
            order: self.order.unwrap_or(base.order),
            mode: self.mode.unwrap_or(base.mode),
            cval: self.cval.unwrap_or(base.cval),
        }
    }
}
