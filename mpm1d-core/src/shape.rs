//! Nodal shape functions and their gradients.
//!
//! Two families are available:
//!
//! - Linear tent functions of half-width `L` centred at the node.
//! - Contiguous-particle GIMP (cpGIMP) functions, which account for the
//!   finite half-size `lp` of the material point and smooth the gradient
//!   jump when a particle crosses a cell boundary.
//!
//! All functions take the particle position `x`, the node position `xi`
//! and the cell spacing `l`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Linear tent function value.
pub fn linear_weight(x: f64, xi: f64, l: f64) -> f64 {
    let s = x - xi;
    if s.abs() >= l {
        0.0
    } else if s <= 0.0 {
        1.0 + s / l
    } else {
        1.0 - s / l
    }
}

/// Linear tent function gradient.
pub fn linear_gradient(x: f64, xi: f64, l: f64) -> f64 {
    let s = x - xi;
    if s.abs() >= l {
        0.0
    } else if s <= 0.0 {
        1.0 / l
    } else {
        -1.0 / l
    }
}

/// Contiguous-particle GIMP function value.
///
/// `lp` is the particle half-size. A non-positive half-size falls back to
/// the linear tent function.
pub fn gimp_weight(x: f64, xi: f64, l: f64, lp: f64) -> f64 {
    if lp <= 0.0 {
        return linear_weight(x, xi, l);
    }

    let s = x - xi;
    if s.abs() >= l + lp {
        0.0
    } else if s <= -l + lp {
        (l + lp + s).powi(2) / (4.0 * l * lp)
    } else if s <= -lp {
        1.0 + s / l
    } else if s <= lp {
        1.0 - (s * s + lp * lp) / (2.0 * l * lp)
    } else if s <= l - lp {
        1.0 - s / l
    } else {
        (l + lp - s).powi(2) / (4.0 * l * lp)
    }
}

/// Contiguous-particle GIMP function gradient.
pub fn gimp_gradient(x: f64, xi: f64, l: f64, lp: f64) -> f64 {
    if lp <= 0.0 {
        return linear_gradient(x, xi, l);
    }

    let s = x - xi;
    if s.abs() >= l + lp {
        0.0
    } else if s <= -l + lp {
        (l + lp + s) / (2.0 * l * lp)
    } else if s <= -lp {
        1.0 / l
    } else if s <= lp {
        -s / (l * lp)
    } else if s <= l - lp {
        -1.0 / l
    } else {
        -(l + lp - s) / (2.0 * l * lp)
    }
}

/// Shape function family used to interpolate between particles and nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeFunction {
    /// Piecewise-linear tent functions.
    #[default]
    Linear,
    /// Contiguous-particle GIMP functions.
    #[serde(rename = "cpgimp", alias = "cpGIMP", alias = "gimp")]
    CpGimp,
}

impl ShapeFunction {
    /// Weight of node `xi` at position `x`.
    ///
    /// `half_size` is ignored by the linear family.
    pub fn weight(self, x: f64, xi: f64, l: f64, half_size: f64) -> f64 {
        match self {
            ShapeFunction::Linear => linear_weight(x, xi, l),
            ShapeFunction::CpGimp => gimp_weight(x, xi, l, half_size),
        }
    }

    /// Gradient of the weight of node `xi` at position `x`.
    pub fn gradient(self, x: f64, xi: f64, l: f64, half_size: f64) -> f64 {
        match self {
            ShapeFunction::Linear => linear_gradient(x, xi, l),
            ShapeFunction::CpGimp => gimp_gradient(x, xi, l, half_size),
        }
    }

    /// Evaluate weight and gradient together.
    pub fn evaluate(self, x: f64, xi: f64, l: f64, half_size: f64) -> (f64, f64) {
        (
            self.weight(x, xi, l, half_size),
            self.gradient(x, xi, l, half_size),
        )
    }
}

impl FromStr for ShapeFunction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "linear" => Ok(ShapeFunction::Linear),
            "cpgimp" | "cpGIMP" | "gimp" => Ok(ShapeFunction::CpGimp),
            _ => Err(Error::Config(format!(
                "unknown shape function '{}', expected linear or cpgimp",
                s
            ))),
        }
    }
}
