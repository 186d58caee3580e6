//! Uehling vacuum-polarization correction for a point or uniformly charged
//! spherical nucleus.
//!
//! For a point charge
//!
//! ```text
//! V(r) = -(2 alpha Z / (3 pi r)) * int_0^1 w(u) / u * exp(-lambda r) du
//! w(u) = sqrt(1 - u^2) (1 + u^2 / 2),   lambda = 2c / u
//! ```
//!
//! The sphere folds the Yukawa kernel over the nuclear volume, which has a
//! closed form in `r` for every `u`; only the `u` integral is numerical. It
//! runs over a logarithmic `u` lattice because the integrand behaves like
//! `1/u` near the origin.

use crate::common::constants::{ALPHA, SPEED_OF_LIGHT};
use crate::domain::{AtomError, AtomResult};
use crate::modules::traits::Potential;
use crate::numerics::stable_sum;
use std::f64::consts::PI;

pub const DEFAULT_UEHLING_STEPS: usize = 2_000;
const MIN_U: f64 = 1.0e-10;
// exp(-800) underflows; the correction is exactly zero beyond that range.
const MAX_EXPONENT: f64 = 800.0;
const SERIES_LIMIT: f64 = 1.0e-2;

#[derive(Debug, Clone, PartialEq)]
pub struct UehlingPotential {
    z: f64,
    radius: f64,
    /// `(u, w(u), trapezoid weight in ln u)` for every quadrature node.
    nodes: Vec<(f64, f64, f64)>,
}

impl UehlingPotential {
    pub fn new(z: f64, radius: f64, steps: usize) -> AtomResult<Self> {
        if steps < 2 {
            return Err(AtomError::configuration(
                "uehling steps",
                format!("at least 2 integration steps are required, got {steps}"),
            ));
        }

        let log_min = MIN_U.ln();
        let step = -log_min / (steps - 1) as f64;
        let nodes = (0..steps)
            .map(|index| {
                let u = if index == steps - 1 {
                    1.0
                } else {
                    (log_min + index as f64 * step).exp()
                };
                let kernel = (1.0 - u * u).max(0.0).sqrt() * (1.0 + 0.5 * u * u);
                let end_weight = if index == 0 || index == steps - 1 {
                    0.5
                } else {
                    1.0
                };
                (u, kernel, end_weight * step)
            })
            .collect();

        Ok(Self { z, radius, nodes })
    }

    pub fn point(z: f64, steps: usize) -> AtomResult<Self> {
        Self::new(z, -1.0, steps)
    }

    pub fn steps(&self) -> usize {
        self.nodes.len()
    }

    fn point_value(&self, r: f64) -> f64 {
        if r <= 0.0 {
            return f64::NEG_INFINITY;
        }
        if 2.0 * SPEED_OF_LIGHT * r > MAX_EXPONENT {
            return 0.0;
        }

        // d(ln u) absorbs the 1/u of the integrand.
        let terms: Vec<f64> = self
            .nodes
            .iter()
            .map(|&(u, kernel, weight)| {
                let lambda = 2.0 * SPEED_OF_LIGHT / u;
                weight * kernel * (-lambda * r).exp()
            })
            .collect();
        -2.0 * ALPHA * self.z / (3.0 * PI * r) * stable_sum(&terms)
    }

    fn sphere_value(&self, r: f64) -> f64 {
        let radius = self.radius;
        if 2.0 * SPEED_OF_LIGHT * (r - radius) > MAX_EXPONENT {
            return 0.0;
        }

        let density = 3.0 * self.z / (4.0 * PI * radius.powi(3));
        let terms: Vec<f64> = self
            .nodes
            .iter()
            .map(|&(u, kernel, weight)| {
                let lambda = 2.0 * SPEED_OF_LIGHT / u;
                weight * u * kernel / (2.0 * SPEED_OF_LIGHT) * folded_yukawa(r, radius, lambda)
            })
            .collect();
        -4.0 * ALPHA * density / 3.0 * stable_sum(&terms)
    }
}

/// `(1/r) * int_0^R r' [exp(-lambda |r - r'|) - exp(-lambda (r + r'))] dr'`,
/// the angular average of a Yukawa kernel over a sphere of radius `R`.
fn folded_yukawa(r: f64, radius: f64, lambda: f64) -> f64 {
    let a = lambda * radius;
    if r >= radius {
        // 2 (a cosh a - sinh a) exp(-lambda r)
        let shell = if a < SERIES_LIMIT {
            2.0 / 3.0 * a.powi(3) * (1.0 + a * a / 10.0) * (-lambda * r).exp()
        } else {
            (a - 1.0) * (-lambda * (r - radius)).exp() + (a + 1.0) * (-lambda * (r + radius)).exp()
        };
        return shell / (lambda * lambda * r);
    }

    let b = lambda * r;
    if a < SERIES_LIMIT {
        // 1 - (1 + a) exp(-a) and sinh(b) / b - 1
        let core = a * a / 2.0 - a.powi(3) / 3.0 + a.powi(4) / 8.0 - a.powi(5) / 30.0;
        let spread = b * b / 6.0 + b.powi(4) / 120.0;
        return 2.0 / lambda * (core - (1.0 - core) * spread);
    }

    let shell_over_r = if b < SERIES_LIMIT {
        2.0 * lambda * (-a).exp() * (1.0 + b * b / 6.0)
    } else {
        ((-lambda * (radius - r)).exp() - (-lambda * (radius + r)).exp()) / r
    };
    2.0 / lambda - (a + 1.0) / (lambda * lambda) * shell_over_r
}

impl Potential for UehlingPotential {
    fn evaluate(&self, r: f64) -> f64 {
        if self.radius <= 0.0 {
            self.point_value(r)
        } else {
            self.sphere_value(r)
        }
    }
}
