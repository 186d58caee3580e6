use crate::domain::{AtomError, AtomResult};
use crate::modules::traits::Potential;
use crate::numerics::{LogGrid, lerp};

/// Electrostatic potential of a spherical background charge tabulated on a
/// logarithmic lattice.
///
/// `density` is the charge per unit radius, `dq/dr`, so that the enclosed
/// charge is `Q(r) = int_0^r density dr'`. The potential energy is
/// `V(r) = -(Q(r) / r + int_r^inf density / r' dr')`. Inside the first
/// lattice point the charge is continued as a uniform sphere; past the last
/// point the potential is that of the total charge.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundChargePotential {
    grid: LogGrid,
    values: Vec<f64>,
    inner_charge: f64,
    outer_shells: f64,
    total_charge: f64,
}

impl BackgroundChargePotential {
    pub fn new(density: &[f64], rc: f64, dx: f64, i0: i32, i1: i32) -> AtomResult<Self> {
        let grid = LogGrid::from_indices(rc, dx, i0, i1)?;
        if density.len() != grid.len() {
            return Err(AtomError::configuration(
                "background density",
                format!(
                    "expected {} samples for indices [{i0}, {i1}], got {}",
                    grid.len(),
                    density.len()
                ),
            ));
        }
        if let Some(bad) = density.iter().find(|value| !value.is_finite()) {
            return Err(AtomError::configuration(
                "background density",
                format!("density samples must be finite, got {bad}"),
            ));
        }

        let radii = grid.radii();
        // A uniform sphere has dq/dr proportional to r^2 below the first point.
        let inner_charge = density[0] * radii[0] / 3.0;

        // dr = r dx for the enclosed charge, dr/r = dx for the outer shells.
        let mut enclosed = Vec::with_capacity(density.len());
        let mut running = inner_charge;
        enclosed.push(running);
        for index in 1..density.len() {
            running += 0.5
                * dx
                * (density[index - 1] * radii[index - 1] + density[index] * radii[index]);
            enclosed.push(running);
        }

        let mut shells = vec![0.0; density.len()];
        for index in (0..density.len() - 1).rev() {
            shells[index] = shells[index + 1] + 0.5 * dx * (density[index] + density[index + 1]);
        }

        let values = enclosed
            .iter()
            .zip(&shells)
            .zip(radii)
            .map(|((charge, shell), r)| -(charge / r + shell))
            .collect();

        Ok(Self {
            values,
            inner_charge,
            outer_shells: shells[0],
            total_charge: running,
            grid,
        })
    }

    pub fn total_charge(&self) -> f64 {
        self.total_charge
    }

    pub fn grid(&self) -> &LogGrid {
        &self.grid
    }

    fn inside_value(&self, r: f64) -> f64 {
        let r0 = self.grid.inner_radius();
        -self.inner_charge * (3.0 * r0 * r0 - r * r) / (2.0 * r0.powi(3)) - self.outer_shells
    }
}

impl Potential for BackgroundChargePotential {
    fn evaluate(&self, r: f64) -> f64 {
        if r <= self.grid.inner_radius() {
            return self.inside_value(r);
        }
        if r >= self.grid.outer_radius() {
            return -self.total_charge / r;
        }

        let radii = self.grid.radii();
        let position = ((r / self.grid.rc()).ln() / self.grid.dx()).floor() as i32;
        let left = self
            .grid
            .offset_of(position)
            .unwrap_or(0)
            .min(radii.len() - 2);
        // Round-off in the index estimate can land one cell off.
        let left = if r < radii[left] {
            left.saturating_sub(1)
        } else if r > radii[left + 1] {
            (left + 1).min(radii.len() - 2)
        } else {
            left
        };

        let fraction = (r - radii[left]) / (radii[left + 1] - radii[left]);
        lerp(self.values[left], self.values[left + 1], fraction)
    }

    fn evaluate_lattice(&self, rc: f64, dx: f64, i: i32) -> f64 {
        if rc == self.grid.rc() && dx == self.grid.dx() {
            if let Some(offset) = self.grid.offset_of(i) {
                return self.values[offset];
            }
        }
        self.evaluate(rc * (f64::from(i) * dx).exp())
    }
}
