//! Two-sided shooting integration of the radial Dirac equation on a
//! logarithmic grid.
//!
//! With `x = ln r` the large and small components obey
//!
//! ```text
//! dP/dx = -k P + r (E - V + mc^2) / c * Q
//! dQ/dx =  k Q - r (E - V - mc^2) / c * P
//! ```
//!
//! Both halves are advanced with the two-step implicit Adams-Moulton rule.
//! The system is linear in `(P, Q)`, so the implicit step reduces to a 2x2
//! solve. The inner sweep runs up to the classical turning point and the
//! outer sweep comes back down to it.

use super::grid::LogGrid;
use crate::common::constants::{ALPHA, SPEED_OF_LIGHT};
use crate::domain::{AtomError, AtomResult};

pub const MIN_SHOOTING_POINTS: usize = 6;

/// Small-r seed of the inner sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiracBoundary {
    /// Coulomb singularity at the origin: `P = r^gamma`.
    PointNucleus,
    /// The first grid point lies inside a finite nucleus where the potential
    /// is flat and equal to `core_potential`.
    FiniteNucleus { core_potential: f64 },
}

/// Everything the integrator needs to know about one trial solution.
#[derive(Debug, Clone, Copy)]
pub struct RadialProblem<'a> {
    pub grid: &'a LogGrid,
    pub potential: &'a [f64],
    pub energy: f64,
    pub k: i32,
    pub mass: f64,
    pub z: f64,
    pub boundary: DiracBoundary,
}

impl RadialProblem<'_> {
    fn rest_energy(&self) -> f64 {
        self.mass * SPEED_OF_LIGHT * SPEED_OF_LIGHT
    }

    fn validate(&self, p: &[f64], q: &[f64]) -> AtomResult<usize> {
        let count = self.grid.len();
        if count < MIN_SHOOTING_POINTS {
            return Err(AtomError::configuration(
                "grid size",
                format!("shooting needs at least {MIN_SHOOTING_POINTS} points, got {count}"),
            ));
        }
        if self.potential.len() != count || p.len() != count || q.len() != count {
            return Err(AtomError::configuration(
                "radial arrays",
                format!(
                    "grid has {count} points but V, P, Q have {}, {}, {}",
                    self.potential.len(),
                    p.len(),
                    q.len()
                ),
            ));
        }
        Ok(count)
    }

    fn coefficients(&self) -> RadialCoefficients {
        let rest = self.rest_energy();
        let (upper, lower) = self
            .grid
            .radii()
            .iter()
            .zip(self.potential)
            .map(|(r, v)| {
                let kinetic = self.energy - v;
                (
                    r * (kinetic + rest) / SPEED_OF_LIGHT,
                    r * (kinetic - rest) / SPEED_OF_LIGHT,
                )
            })
            .unzip();
        RadialCoefficients {
            k: f64::from(self.k),
            upper,
            lower,
        }
    }

    /// Last index where the trial is classically allowed, kept clear of the
    /// two seeds at either edge.
    fn turning_index(&self) -> usize {
        let binding = self.energy - self.rest_energy();
        let count = self.grid.len();
        let last_allowed = self
            .potential
            .iter()
            .rposition(|v| *v < binding)
            .unwrap_or(0);
        last_allowed.clamp(2, count - 3)
    }
}

/// Inner (`i`) and outer (`e`) solutions at the matching index `i`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurningPoint {
    pub i: usize,
    pub pi: f64,
    pub pe: f64,
    pub qi: f64,
    pub qe: f64,
}

impl TurningPoint {
    /// Jump of the logarithmic ratio `Q/P` across the matching point.
    pub fn mismatch(&self) -> f64 {
        self.qi / self.pi - self.qe / self.pe
    }

    /// Factor bringing the outer solution onto the inner one.
    pub fn continuity_scale(&self) -> f64 {
        self.pi / self.pe
    }
}

/// `K = sqrt((mc)^2 - (E/c)^2)`, the asymptotic decay rate.
pub fn decay_constant(energy: f64, mass: f64, k: i32) -> AtomResult<f64> {
    let squared = (mass * SPEED_OF_LIGHT).powi(2) - (energy / SPEED_OF_LIGHT).powi(2);
    if squared.is_nan() || squared <= 0.0 {
        return Err(AtomError::UnboundState { energy, k });
    }
    Ok(squared.sqrt())
}

/// `gamma = sqrt(k^2 - (Z alpha)^2)`, the small-r power of a point nucleus.
pub fn coulomb_gamma(k: i32, z: f64) -> AtomResult<f64> {
    let gamma_squared = f64::from(k).powi(2) - (z * ALPHA).powi(2);
    if gamma_squared.is_nan() || gamma_squared < 0.0 {
        return Err(AtomError::SmallGamma {
            k,
            z,
            gamma_squared,
        });
    }
    Ok(gamma_squared.sqrt())
}

/// Seeds the first and last two points of `P` and `Q`.
pub fn apply_dirac_boundary(
    problem: &RadialProblem<'_>,
    p: &mut [f64],
    q: &mut [f64],
) -> AtomResult<()> {
    let count = problem.validate(p, q)?;
    let decay = decay_constant(problem.energy, problem.mass, problem.k)?;
    let radii = problem.grid.radii();
    let rest = problem.rest_energy();
    let k = f64::from(problem.k);

    match problem.boundary {
        DiracBoundary::PointNucleus => {
            let gamma = coulomb_gamma(problem.k, problem.z)?;
            let ratio = (k + gamma) / (problem.z * ALPHA);
            for index in 0..2 {
                p[index] = radii[index].powf(gamma);
                q[index] = p[index] * ratio;
            }
        }
        DiracBoundary::FiniteNucleus { core_potential } => {
            let kinetic = problem.energy - core_potential;
            for index in 0..2 {
                let r = radii[index];
                if problem.k < 0 {
                    p[index] = r.powf(-k);
                    q[index] =
                        -(kinetic - rest) * r.powf(1.0 - k) / (SPEED_OF_LIGHT * (1.0 - 2.0 * k));
                } else {
                    q[index] = r.powf(k);
                    p[index] =
                        (kinetic + rest) * r.powf(k + 1.0) / (SPEED_OF_LIGHT * (2.0 * k + 1.0));
                }
            }
        }
    }

    let tail_ratio = -decay * SPEED_OF_LIGHT / (problem.energy + rest);
    for index in count - 2..count {
        p[index] = (-decay * radii[index]).exp();
        q[index] = tail_ratio * p[index];
    }
    Ok(())
}

/// Integrates both halves of a seeded trial. Indices below the turning point
/// keep the inner solution, the turning point and above hold the outer one;
/// the inner values at the turning point are returned in the [`TurningPoint`].
pub fn shoot_dirac_log(
    problem: &RadialProblem<'_>,
    p: &mut [f64],
    q: &mut [f64],
) -> AtomResult<TurningPoint> {
    let count = problem.validate(p, q)?;
    let coefficients = problem.coefficients();
    let turning = problem.turning_index();
    let step = problem.grid.dx();
    let homogeneous = |_: usize| (0.0, 0.0);

    for next in 2..=turning {
        coefficients.adams_moulton_step(step, [next, next - 1, next - 2], p, q, &homogeneous);
    }
    let (pi, qi) = (p[turning], q[turning]);

    for next in (turning..count - 2).rev() {
        coefficients.adams_moulton_step(-step, [next, next + 1, next + 2], p, q, &homogeneous);
    }

    Ok(TurningPoint {
        i: turning,
        pi,
        pe: p[turning],
        qi,
        qe: q[turning],
    })
}

/// Seeds `dP/dE` and `dQ/dE` from the energy derivatives of the boundary
/// forms used by [`apply_dirac_boundary`].
pub fn energy_derivative_boundary(
    problem: &RadialProblem<'_>,
    pd: &mut [f64],
    qd: &mut [f64],
) -> AtomResult<()> {
    let count = problem.validate(pd, qd)?;
    let decay = decay_constant(problem.energy, problem.mass, problem.k)?;
    let radii = problem.grid.radii();
    let rest = problem.rest_energy();
    let k = f64::from(problem.k);

    for index in 0..2 {
        let r = radii[index];
        let (dp, dq) = match problem.boundary {
            DiracBoundary::PointNucleus => (0.0, 0.0),
            DiracBoundary::FiniteNucleus { .. } if problem.k < 0 => (
                0.0,
                -r.powf(1.0 - k) / (SPEED_OF_LIGHT * (1.0 - 2.0 * k)),
            ),
            DiracBoundary::FiniteNucleus { .. } => (
                r.powf(k + 1.0) / (SPEED_OF_LIGHT * (2.0 * k + 1.0)),
                0.0,
            ),
        };
        pd[index] = dp;
        qd[index] = dq;
    }

    let total = problem.energy + rest;
    let tail_ratio = -decay * SPEED_OF_LIGHT / total;
    let tail_ratio_slope = problem.mass * SPEED_OF_LIGHT / (decay * total);
    for index in count - 2..count {
        let r = radii[index];
        let p = (-decay * r).exp();
        pd[index] = r * problem.energy / (SPEED_OF_LIGHT * SPEED_OF_LIGHT * decay) * p;
        qd[index] = tail_ratio_slope * p + tail_ratio * pd[index];
    }
    Ok(())
}

/// Newton correction `dE = err / d(err)/dE` for a trial produced by
/// [`shoot_dirac_log`]. `p` and `q` must not have been rescaled yet.
pub fn shoot_dirac_energy_derivative(
    problem: &RadialProblem<'_>,
    p: &[f64],
    q: &[f64],
    turning_point: &TurningPoint,
) -> AtomResult<f64> {
    let count = problem.validate(p, q)?;
    let mut pd = vec![0.0; count];
    let mut qd = vec![0.0; count];
    energy_derivative_boundary(problem, &mut pd, &mut qd)?;

    let coefficients = problem.coefficients();
    let step = problem.grid.dx();
    let turning = turning_point.i;
    let drive = |index: usize, (large, small): (f64, f64)| {
        let r = problem.grid.radii()[index];
        (r / SPEED_OF_LIGHT * small, -r / SPEED_OF_LIGHT * large)
    };
    // The stored arrays hold the outer solution at the turning point.
    let inner_source = |index: usize| {
        if index == turning {
            drive(index, (turning_point.pi, turning_point.qi))
        } else {
            drive(index, (p[index], q[index]))
        }
    };
    let outer_source = |index: usize| drive(index, (p[index], q[index]));

    for next in 2..=turning {
        coefficients.adams_moulton_step(
            step,
            [next, next - 1, next - 2],
            &mut pd,
            &mut qd,
            &inner_source,
        );
    }
    let inner_slope = ratio_slope(turning_point.pi, turning_point.qi, pd[turning], qd[turning]);

    for next in (turning..count - 2).rev() {
        coefficients.adams_moulton_step(
            -step,
            [next, next + 1, next + 2],
            &mut pd,
            &mut qd,
            &outer_source,
        );
    }
    let outer_slope = ratio_slope(turning_point.pe, turning_point.qe, pd[turning], qd[turning]);

    Ok(turning_point.mismatch() / (inner_slope - outer_slope))
}

/// `d(Q/P)/dE` from the solution and its energy derivative.
fn ratio_slope(p: f64, q: f64, pd: f64, qd: f64) -> f64 {
    (qd * p - q * pd) / (p * p)
}

struct RadialCoefficients {
    k: f64,
    upper: Vec<f64>,
    lower: Vec<f64>,
}

impl RadialCoefficients {
    fn slope(&self, index: usize, p: f64, q: f64) -> (f64, f64) {
        (
            -self.k * p + self.upper[index] * q,
            self.k * q - self.lower[index] * p,
        )
    }

    /// One implicit step onto `next` from `current` and `previous`, for
    /// `y' = A y + s` with signed step `h`.
    fn adams_moulton_step<S>(
        &self,
        h: f64,
        [next, current, previous]: [usize; 3],
        p: &mut [f64],
        q: &mut [f64],
        source: &S,
    ) where
        S: Fn(usize) -> (f64, f64),
    {
        let derivative = |index: usize| {
            let (dp, dq) = self.slope(index, p[index], q[index]);
            let (sp, sq) = source(index);
            (dp + sp, dq + sq)
        };
        let (fp_current, fq_current) = derivative(current);
        let (fp_previous, fq_previous) = derivative(previous);
        let (sp_next, sq_next) = source(next);

        let implicit = 5.0 * h / 12.0;
        let explicit = h / 12.0;
        let rhs_p = p[current] + explicit * (8.0 * fp_current - fp_previous) + implicit * sp_next;
        let rhs_q = q[current] + explicit * (8.0 * fq_current - fq_previous) + implicit * sq_next;

        let ck = implicit * self.k;
        let ca = implicit * self.upper[next];
        let cb = implicit * self.lower[next];
        let determinant = (1.0 + ck) * (1.0 - ck) + ca * cb;

        p[next] = ((1.0 - ck) * rhs_p + ca * rhs_q) / determinant;
        q[next] = ((1.0 + ck) * rhs_q - cb * rhs_p) / determinant;
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DiracBoundary, RadialProblem, TurningPoint, apply_dirac_boundary, coulomb_gamma,
        decay_constant, shoot_dirac_energy_derivative, shoot_dirac_log,
    };
    use crate::common::constants::SPEED_OF_LIGHT;
    use crate::domain::{AtomError, AtomErrorCategory};
    use crate::numerics::{LogGrid, count_nodes, hydrogenic_dirac_energy};

    fn hydrogen_grid() -> (LogGrid, Vec<f64>) {
        let dx = 0.005;
        let i0 = (1.0e-5_f64.ln() / dx).floor() as i32;
        let i1 = (40.0_f64.ln() / dx).ceil() as i32;
        let grid = LogGrid::from_indices(1.0, dx, i0, i1).unwrap();
        let potential = grid.radii().iter().map(|r| -1.0 / r).collect();
        (grid, potential)
    }

    fn shoot(
        grid: &LogGrid,
        potential: &[f64],
        energy: f64,
        k: i32,
    ) -> (Vec<f64>, Vec<f64>, TurningPoint) {
        let problem = RadialProblem {
            grid,
            potential,
            energy,
            k,
            mass: 1.0,
            z: 1.0,
            boundary: DiracBoundary::PointNucleus,
        };
        let mut p = vec![0.0; grid.len()];
        let mut q = vec![0.0; grid.len()];
        apply_dirac_boundary(&problem, &mut p, &mut q).unwrap();
        let turning_point = shoot_dirac_log(&problem, &mut p, &mut q).unwrap();
        (p, q, turning_point)
    }

    fn newton_step(grid: &LogGrid, potential: &[f64], energy: f64, k: i32) -> f64 {
        let (p, q, turning_point) = shoot(grid, potential, energy, k);
        let problem = RadialProblem {
            grid,
            potential,
            energy,
            k,
            mass: 1.0,
            z: 1.0,
            boundary: DiracBoundary::PointNucleus,
        };
        shoot_dirac_energy_derivative(&problem, &p, &q, &turning_point).unwrap()
    }

    #[test]
    fn mismatch_changes_sign_across_the_ground_state() {
        let (grid, potential) = hydrogen_grid();
        let exact = hydrogenic_dirac_energy(1.0, 1.0, 1, -1);

        let (_, _, below) = shoot(&grid, &potential, exact - 1.0e-3, -1);
        let (_, _, above) = shoot(&grid, &potential, exact + 1.0e-3, -1);

        assert!(below.mismatch() * above.mismatch() < 0.0);
    }

    #[test]
    fn turning_point_sits_at_the_classical_radius() {
        let (grid, potential) = hydrogen_grid();
        let exact = hydrogenic_dirac_energy(1.0, 1.0, 1, -1);
        let (_, _, turning_point) = shoot(&grid, &potential, exact, -1);

        // V = E - mc^2 at r = 2 for the hydrogen ground state.
        let r = grid.radii()[turning_point.i];
        assert!((r - 2.0).abs() < 0.02);
    }

    #[test]
    fn newton_step_lands_near_the_eigenvalue() {
        let (grid, potential) = hydrogen_grid();
        let exact = hydrogenic_dirac_energy(1.0, 1.0, 1, -1);
        let start = exact + 2.0e-3;

        let refined = start - newton_step(&grid, &potential, start, -1);
        assert!((refined - exact).abs() < 2.0e-4);

        let again = refined - newton_step(&grid, &potential, refined, -1);
        assert!((again - exact).abs() < 1.0e-5);
    }

    #[test]
    fn newton_step_matches_finite_difference_slope() {
        let (grid, potential) = hydrogen_grid();
        let energy = hydrogenic_dirac_energy(1.0, 1.0, 2, 1) + 5.0e-4;
        let h = 1.0e-6;

        let (_, _, centre) = shoot(&grid, &potential, energy, 1);
        let (_, _, lower) = shoot(&grid, &potential, energy - h, 1);
        let (_, _, upper) = shoot(&grid, &potential, energy + h, 1);
        let slope = (upper.mismatch() - lower.mismatch()) / (2.0 * h);

        let step = newton_step(&grid, &potential, energy, 1);
        let expected = centre.mismatch() / slope;
        assert!((step - expected).abs() < 1.0e-4 * expected.abs());
    }

    #[test]
    fn continuity_rescale_removes_the_jump_in_p() {
        let (grid, potential) = hydrogen_grid();
        let exact = hydrogenic_dirac_energy(1.0, 1.0, 2, -1);
        let (mut p, _, turning_point) = shoot(&grid, &potential, exact, -1);

        let scale = turning_point.continuity_scale();
        for value in &mut p[turning_point.i..] {
            *value *= scale;
        }
        assert!((p[turning_point.i] / turning_point.pi - 1.0).abs() < 1.0e-14);
        // 2s has one radial node.
        assert_eq!(count_nodes(&p, 1.0e-8), 1);
    }

    #[test]
    fn finite_nucleus_seeds_follow_the_flat_core() {
        let grid = LogGrid::from_indices(1.0e-4, 0.01, 0, 20).unwrap();
        let potential = vec![-3.0; grid.len()];
        let rest = SPEED_OF_LIGHT * SPEED_OF_LIGHT;
        let energy = rest - 1.0;
        let mut p = vec![0.0; grid.len()];
        let mut q = vec![0.0; grid.len()];

        for k in [-1, 1] {
            let problem = RadialProblem {
                grid: &grid,
                potential: &potential,
                energy,
                k,
                mass: 1.0,
                z: 1.0,
                boundary: DiracBoundary::FiniteNucleus {
                    core_potential: -3.0,
                },
            };
            apply_dirac_boundary(&problem, &mut p, &mut q).unwrap();
            let r = grid.radii()[0];
            if k < 0 {
                assert!((p[0] - r).abs() < 1.0e-18);
                assert!(q[0] < 0.0);
            } else {
                assert!((q[0] - r).abs() < 1.0e-18);
                assert!(p[0] > 0.0);
            }
        }
    }

    #[test]
    fn infeasible_trials_are_rejected() {
        let rest = SPEED_OF_LIGHT * SPEED_OF_LIGHT;
        assert!(matches!(
            decay_constant(rest + 1.0, 1.0, -1),
            Err(AtomError::UnboundState { k: -1, .. })
        ));
        let small_gamma = coulomb_gamma(-1, 140.0).unwrap_err();
        assert_eq!(
            small_gamma.category(),
            AtomErrorCategory::PhysicalInfeasibility
        );

        let grid = LogGrid::from_indices(1.0, 0.1, 0, 4).unwrap();
        let potential = vec![-1.0; grid.len()];
        let problem = RadialProblem {
            grid: &grid,
            potential: &potential,
            energy: rest - 0.5,
            k: -1,
            mass: 1.0,
            z: 1.0,
            boundary: DiracBoundary::PointNucleus,
        };
        let mut p = vec![0.0; grid.len()];
        let mut q = vec![0.0; grid.len()];
        let error = shoot_dirac_log(&problem, &mut p, &mut q).unwrap_err();
        assert_eq!(error.category(), AtomErrorCategory::Configuration);
    }
}
