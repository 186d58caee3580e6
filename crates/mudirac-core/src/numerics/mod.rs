pub mod grid;
pub mod hydrogenic;
pub mod integrate;

pub use grid::{LatticeTable, LogGrid};
pub use hydrogenic::{effective_mass, hydrogenic_dirac_energy};
pub use integrate::{
    DiracBoundary, MIN_SHOOTING_POINTS, RadialProblem, TurningPoint, apply_dirac_boundary,
    coulomb_gamma, decay_constant, energy_derivative_boundary, shoot_dirac_energy_derivative,
    shoot_dirac_log,
};

fn kahan_add(sum: &mut f64, correction: &mut f64, value: f64) {
    let corrected = value - *correction;
    let next = *sum + corrected;
    *correction = (next - *sum) - corrected;
    *sum = next;
}

pub fn stable_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut correction = 0.0;

    for &value in values {
        kahan_add(&mut sum, &mut correction, value);
    }

    sum
}

/// Trapezoidal rule on a uniform abscissa of step `step`.
pub fn trapezoid(step: f64, values: &[f64]) -> f64 {
    match values.len() {
        0 | 1 => 0.0,
        count => {
            let interior = stable_sum(&values[1..count - 1]);
            step * (interior + 0.5 * (values[0] + values[count - 1]))
        }
    }
}

/// `∫ f(r) dr` for samples on a logarithmic grid, using `dr = r dx`.
pub fn trapezoid_log(grid: &LogGrid, values: &[f64]) -> f64 {
    let weighted: Vec<f64> = values
        .iter()
        .zip(grid.radii())
        .map(|(value, r)| value * r)
        .collect();
    trapezoid(grid.dx(), &weighted)
}

/// Counts sign changes, ignoring samples whose magnitude is below
/// `tolerance` times the largest magnitude.
pub fn count_nodes(values: &[f64], tolerance: f64) -> usize {
    let peak = values.iter().fold(0.0_f64, |acc, value| acc.max(value.abs()));
    if peak == 0.0 || !peak.is_finite() {
        return 0;
    }

    let threshold = peak * tolerance.max(0.0);
    let mut nodes = 0;
    let mut previous_sign = 0.0_f64;
    for value in values {
        if value.abs() <= threshold {
            continue;
        }
        let sign = value.signum();
        if previous_sign != 0.0 && sign != previous_sign {
            nodes += 1;
        }
        previous_sign = sign;
    }
    nodes
}

pub fn lerp(lhs: f64, rhs: f64, fraction: f64) -> f64 {
    lhs + (rhs - lhs) * fraction
}
