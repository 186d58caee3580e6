//! Closed-form results for a point-nucleus one-particle atom.

use crate::common::constants::{ALPHA, SPEED_OF_LIGHT};

/// Two-body reduced mass.
pub fn effective_mass(m1: f64, m2: f64) -> f64 {
    m1 * m2 / (m1 + m2)
}

/// Total Dirac energy (rest mass included) of the `(n, k)` level for nuclear
/// charge `z` and particle mass `mu`.
pub fn hydrogenic_dirac_energy(z: f64, mu: f64, n: u32, k: i32) -> f64 {
    let za = z * ALPHA;
    let k = f64::from(k);
    let gamma = (k * k - za * za).sqrt();
    let denominator = f64::from(n) - k.abs() + gamma;
    mu * SPEED_OF_LIGHT * SPEED_OF_LIGHT / (1.0 + (za / denominator).powi(2)).sqrt()
}

/// Non-relativistic hydrogenic radial function `R_nl` (only `l = 0`, `n <= 3`).
#[cfg(test)]
pub(crate) fn hydrogenic_s_radial(z: f64, mu: f64, n: u32, r: f64) -> f64 {
    let rho = z * mu * r;
    let scale = (z * mu).powf(1.5);
    match n {
        1 => 2.0 * scale * (-rho).exp(),
        2 => scale / 2.0_f64.sqrt() * (1.0 - rho / 2.0) * (-rho / 2.0).exp(),
        3 => {
            2.0 * scale / (3.0 * 3.0_f64.sqrt())
                * (1.0 - 2.0 * rho / 3.0 + 2.0 * rho * rho / 27.0)
                * (-rho / 3.0).exp()
        }
        _ => panic!("only n <= 3 is tabulated"),
    }
}
