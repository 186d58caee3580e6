use crate::domain::{orbital_from_kappa, principal_from_nodes};
use crate::numerics::{LogGrid, TurningPoint, count_nodes, trapezoid_log};
use serde::Serialize;

/// One solution (converged or trial) of the radial Dirac equation.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialState {
    pub grid: LogGrid,
    pub p: Vec<f64>,
    pub q: Vec<f64>,
    pub v: Vec<f64>,
    pub energy: f64,
    pub k: i32,
    pub nodes: usize,
    pub nodes_q: usize,
    pub initialized: bool,
}

impl RadialState {
    /// Trial state with zeroed wavefunction on `grid`.
    pub fn new(grid: LogGrid, v: Vec<f64>, energy: f64, k: i32) -> Self {
        let count = grid.len();
        Self {
            grid,
            p: vec![0.0; count],
            q: vec![0.0; count],
            v,
            energy,
            k,
            nodes: 0,
            nodes_q: 0,
            initialized: false,
        }
    }

    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    pub fn l(&self) -> u32 {
        orbital_from_kappa(self.k).0
    }

    pub fn s(&self) -> bool {
        orbital_from_kappa(self.k).1
    }

    pub fn n(&self) -> u32 {
        principal_from_nodes(self.nodes, self.l())
    }

    /// `int (P^2 + Q^2) dr` over the grid.
    pub fn norm(&self) -> f64 {
        let density: Vec<f64> = self
            .p
            .iter()
            .zip(&self.q)
            .map(|(p, q)| p * p + q * q)
            .collect();
        trapezoid_log(&self.grid, &density)
    }

    /// Scales everything from the turning point outwards so that `P` is
    /// continuous there.
    pub fn continuify(&mut self, turning_point: &TurningPoint) {
        let scale = turning_point.continuity_scale();
        for value in &mut self.p[turning_point.i..] {
            *value *= scale;
        }
        for value in &mut self.q[turning_point.i..] {
            *value *= scale;
        }
    }

    pub fn normalize(&mut self) {
        let norm = self.norm().sqrt();
        if norm > 0.0 && norm.is_finite() {
            for value in self.p.iter_mut().chain(self.q.iter_mut()) {
                *value /= norm;
            }
        }
    }

    pub fn find_nodes(&mut self, tolerance: f64) {
        self.nodes = count_nodes(&self.p, tolerance);
        self.nodes_q = count_nodes(&self.q, tolerance);
    }

    /// Rows of `r P Q V` for reports.
    pub fn profile(&self) -> Vec<StateSample> {
        self.grid
            .radii()
            .iter()
            .zip(&self.p)
            .zip(&self.q)
            .zip(&self.v)
            .map(|(((r, p), q), v)| StateSample {
                r: *r,
                p: *p,
                q: *q,
                v: *v,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StateSample {
    pub r: f64,
    pub p: f64,
    pub q: f64,
    pub v: f64,
}

#[cfg(test)]
mod tests {
    use super::RadialState;
    use crate::numerics::{LogGrid, TurningPoint};

    fn hydrogen_like(k: i32) -> RadialState {
        let grid = LogGrid::from_endpoints(1.0e-6, 40.0, 3_001).unwrap();
        let v = grid.radii().iter().map(|r| -1.0 / r).collect();
        let mut state = RadialState::new(grid, v, -0.5, k);
        // 2s-like large component with one node at r = 2.
        state.p = state
            .grid
            .radii()
            .iter()
            .map(|r| r * (2.0 - r) * (-0.5 * r).exp())
            .collect();
        state.q = state.p.iter().map(|p| -1.0e-3 * p).collect();
        state
    }

    #[test]
    fn quantum_numbers_follow_kappa_and_nodes() {
        let mut state = hydrogen_like(-1);
        state.find_nodes(1.0e-8);
        assert_eq!(state.nodes, 1);
        assert_eq!(state.nodes_q, 1);
        assert_eq!((state.n(), state.l(), state.s()), (2, 0, true));

        let mut p_state = hydrogen_like(1);
        p_state.nodes = 0;
        assert_eq!((p_state.n(), p_state.l(), p_state.s()), (2, 1, false));
    }

    #[test]
    fn normalize_sets_unit_norm() {
        let mut state = hydrogen_like(-1);
        assert!(state.norm() > 1.0);
        state.normalize();
        assert!((state.norm() - 1.0).abs() < 1.0e-12);
    }

    #[test]
    fn continuify_rescales_the_outer_part_only() {
        let mut state = hydrogen_like(-1);
        let before = state.p.clone();
        let turning_point = TurningPoint {
            i: 10,
            pi: 2.0,
            pe: 1.0,
            qi: 0.0,
            qe: 0.0,
        };
        state.continuify(&turning_point);

        assert_eq!(state.p[9], before[9]);
        assert_eq!(state.p[10], 2.0 * before[10]);
        assert_eq!(state.p[3_000], 2.0 * before[3_000]);
    }

    #[test]
    fn profile_lists_every_grid_point() {
        let state = hydrogen_like(-1);
        let profile = state.profile();
        assert_eq!(profile.len(), state.len());
        assert_eq!(profile[0].r, state.grid.inner_radius());
        assert_eq!(profile[0].v, state.v[0]);
    }
}
