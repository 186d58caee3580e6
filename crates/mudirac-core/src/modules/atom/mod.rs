//! Bound states of one particle around one nucleus.
//!
//! [`DiracAtom`] owns everything that does not change between solves (charge,
//! masses, nuclear size, grid lattice and potential) together with two
//! growing tables: the potential sampled on the lattice and the cache of
//! converged states.

mod cache;
mod search;

pub use cache::StateCache;
pub use search::SolverOptions;

use crate::common::constants::{
    ATOMIC_MASS_UNIT, MUON_MASS, NUCLEAR_RADIUS_CONSTANT, SPEED_OF_LIGHT,
};
use crate::domain::{
    AtomError, AtomResult, NuclearModel, StateKey, orbital_from_kappa, principal_from_nodes,
};
use crate::modules::potential::{CompositePotential, CoulombSpherePotential, UehlingPotential};
use crate::modules::state::RadialState;
use crate::modules::traits::Potential;
use crate::numerics::{
    DiracBoundary, LatticeTable, LogGrid, RadialProblem, TurningPoint, apply_dirac_boundary,
    coulomb_gamma, decay_constant, effective_mass, shoot_dirac_energy_derivative,
    shoot_dirac_log,
};
use tracing::{debug, trace};

/// Mass number meaning "infinitely heavy, point-like nucleus".
pub const INFINITE_MASS: f64 = -1.0;

#[derive(Debug)]
pub struct DiracAtomBuilder {
    z: f64,
    a: f64,
    m: f64,
    model: NuclearModel,
    fc: f64,
    dx: f64,
    uehling_steps: Option<usize>,
    extra_terms: Vec<Box<dyn Potential + Send>>,
    options: SolverOptions,
}

impl DiracAtomBuilder {
    pub fn new(z: f64) -> Self {
        Self {
            z,
            a: INFINITE_MASS,
            m: MUON_MASS,
            model: NuclearModel::Point,
            fc: 1.0,
            dx: 0.005,
            uehling_steps: None,
            extra_terms: Vec::new(),
            options: SolverOptions::default(),
        }
    }

    /// Particle mass in electron masses.
    pub fn mass(mut self, m: f64) -> Self {
        self.m = m;
        self
    }

    /// Nuclear mass number; [`INFINITE_MASS`] disables recoil and finite size.
    pub fn isotope(mut self, a: f64) -> Self {
        self.a = a;
        self
    }

    pub fn nuclear_model(mut self, model: NuclearModel) -> Self {
        self.model = model;
        self
    }

    /// Lattice centre factor `fc` (`rc = fc / (Z mu)`) and log step `dx`.
    pub fn grid(mut self, fc: f64, dx: f64) -> Self {
        self.fc = fc;
        self.dx = dx;
        self
    }

    pub fn uehling(mut self, steps: usize) -> Self {
        self.uehling_steps = Some(steps);
        self
    }

    /// Adds a further potential term on top of the nuclear Coulomb field.
    pub fn potential_term<P>(mut self, term: P) -> Self
    where
        P: Potential + Send + 'static,
    {
        self.extra_terms.push(Box::new(term));
        self
    }

    pub fn options(mut self, options: SolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> AtomResult<DiracAtom> {
        let Self {
            z,
            a,
            m,
            model,
            fc,
            dx,
            uehling_steps,
            extra_terms,
            options,
        } = self;

        if !(z.is_finite() && z > 0.0) {
            return Err(AtomError::configuration(
                "atomic number",
                format!("Z must be finite and > 0, got {z}"),
            ));
        }
        if !(m.is_finite() && m > 0.0) {
            return Err(AtomError::configuration(
                "particle mass",
                format!("m must be finite and > 0, got {m}"),
            ));
        }
        if !a.is_finite() || (a >= 0.0 && a < 1.0) {
            return Err(AtomError::configuration(
                "mass number",
                format!("A must be >= 1, or {INFINITE_MASS} for an infinite mass, got {a}"),
            ));
        }
        if !(fc.is_finite() && fc > 0.0) {
            return Err(AtomError::configuration(
                "grid centre factor",
                format!("fc must be finite and > 0, got {fc}"),
            ));
        }
        if !(dx.is_finite() && dx > 0.0) {
            return Err(AtomError::configuration(
                "grid step",
                format!("dx must be finite and > 0, got {dx}"),
            ));
        }
        options.validate()?;

        let finite_mass = a > 0.0;
        let mu = if finite_mass {
            effective_mass(m, a * ATOMIC_MASS_UNIT)
        } else {
            m
        };
        let radius = match model {
            NuclearModel::Sphere if finite_mass => NUCLEAR_RADIUS_CONSTANT * a.cbrt(),
            NuclearModel::Sphere => {
                debug!("sphere model requested without a mass number; using a point nucleus");
                -1.0
            }
            NuclearModel::Point => -1.0,
        };

        let mut potential = CompositePotential::new();
        potential.push(CoulombSpherePotential::new(z, radius));
        if let Some(steps) = uehling_steps {
            potential.push(UehlingPotential::new(z, radius, steps)?);
        }
        for term in extra_terms {
            potential.push_boxed(term);
        }

        debug!(
            "atom built: Z = {z}, A = {a}, m = {m}, mu = {mu}, R = {radius}, {} potential terms",
            potential.len()
        );

        Ok(DiracAtom {
            z,
            a,
            m,
            mu,
            radius,
            rest_energy: mu * SPEED_OF_LIGHT * SPEED_OF_LIGHT,
            rc: fc / (z * mu),
            dx,
            potential,
            lattice: LatticeTable::new(),
            cache: StateCache::new(),
            options,
        })
    }
}

#[derive(Debug)]
pub struct DiracAtom {
    z: f64,
    a: f64,
    m: f64,
    mu: f64,
    radius: f64,
    rest_energy: f64,
    rc: f64,
    dx: f64,
    potential: CompositePotential,
    lattice: LatticeTable,
    cache: StateCache,
    pub options: SolverOptions,
}

impl DiracAtom {
    pub fn builder(z: f64) -> DiracAtomBuilder {
        DiracAtomBuilder::new(z)
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    pub fn a(&self) -> f64 {
        self.a
    }

    pub fn m(&self) -> f64 {
        self.m
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn rest_energy(&self) -> f64 {
        self.rest_energy
    }

    /// Radius of the uniform-sphere nucleus, negative for a point nucleus.
    pub fn nuclear_radius(&self) -> f64 {
        self.radius
    }

    pub fn rc(&self) -> f64 {
        self.rc
    }

    pub fn dx(&self) -> f64 {
        self.dx
    }

    pub fn potential_at(&self, r: f64) -> f64 {
        self.potential.evaluate(r)
    }

    pub fn cache(&self) -> &StateCache {
        &self.cache
    }

    /// Lattice window `[i_in, i_out]` wide enough for a state of energy `E`.
    pub fn grid_limits(&self, energy: f64, k: i32) -> AtomResult<(i32, i32)> {
        let decay = decay_constant(energy, self.mu, k)?;
        let gamma = coulomb_gamma(k, self.z)?;
        let SolverOptions { in_eps, out_eps, .. } = self.options;

        if !(out_eps > 0.0 && out_eps < 1.0) {
            return Err(AtomError::configuration(
                "out_eps",
                format!("must lie in (0, 1), got {out_eps}"),
            ));
        }
        if !(in_eps > 0.0 && in_eps < 1.0) {
            return Err(AtomError::configuration(
                "in_eps",
                format!("must lie in (0, 1), got {in_eps}"),
            ));
        }

        let r_tp = self.z / (energy - self.rest_energy).abs();
        let r_out = r_tp - out_eps.ln() / decay;
        let r_in = in_eps.powf(1.0 / gamma) / std::f64::consts::E * gamma / decay;
        if r_in > r_tp {
            return Err(AtomError::configuration(
                "in_eps",
                format!(
                    "inner radius {r_in:.6e} exceeds the turning point {r_tp:.6e}; decrease in_eps"
                ),
            ));
        }

        let i_in = ((r_in / self.rc).ln() / self.dx).floor() as i32;
        let i_out = ((r_out / self.rc).ln() / self.dx).ceil() as i32;
        trace!("grid limits for E = {energy:.10e}, k = {k}: [{i_in}, {i_out}]");
        Ok((i_in, i_out))
    }

    /// `[max(V(0) + mc^2, -mc^2), mc^2]`, narrowed by cached states of the
    /// same `l` and `s`.
    pub fn energy_limits(&self, nodes: usize, k: i32) -> (f64, f64) {
        let floor = (self.potential_at(0.0) + self.rest_energy).max(-self.rest_energy);
        let ceiling = self.rest_energy;
        let (l, s) = orbital_from_kappa(k);
        let key = StateKey {
            n: principal_from_nodes(nodes, l),
            l,
            s,
        };
        self.cache.energy_bounds(&key, floor, ceiling)
    }

    /// Fresh trial state of energy `E` on its own lattice window, with the
    /// potential sampled from the shared table.
    pub fn init_state(&mut self, energy: f64, k: i32) -> AtomResult<RadialState> {
        let (i0, i1) = self.grid_limits(energy, k)?;
        let grid = LogGrid::from_indices(self.rc, self.dx, i0, i1)?;
        let v = self.sample_potential(i0, i1);
        Ok(RadialState::new(grid, v, energy, k))
    }

    fn sample_potential(&mut self, i0: i32, i1: i32) -> Vec<f64> {
        let Self {
            potential,
            lattice,
            rc,
            dx,
            ..
        } = self;
        if !lattice.covers(i0, i1) {
            trace!("sampling potential over [{i0}, {i1}]");
            lattice.extend_to(i0, i1, |i| potential.evaluate_lattice(*rc, *dx, i));
        }
        lattice.slice(i0, i1).unwrap_or_default()
    }

    fn boundary_for(&self, state: &RadialState) -> DiracBoundary {
        if self.radius > state.grid.inner_radius() {
            DiracBoundary::FiniteNucleus {
                core_potential: state.v[0],
            }
        } else {
            DiracBoundary::PointNucleus
        }
    }

    fn problem<'a>(&self, state: &'a RadialState) -> RadialProblem<'a> {
        RadialProblem {
            grid: &state.grid,
            potential: &state.v,
            energy: state.energy,
            k: state.k,
            mass: self.mu,
            z: self.z,
            boundary: self.boundary_for(state),
        }
    }

    /// Seeds and integrates `state` in place; the arrays are left as the
    /// integrator produced them, without the continuity rescale.
    pub fn integrate_state(&self, state: &mut RadialState) -> AtomResult<TurningPoint> {
        let mut p = std::mem::take(&mut state.p);
        let mut q = std::mem::take(&mut state.q);
        let result = {
            let problem = self.problem(state);
            apply_dirac_boundary(&problem, &mut p, &mut q)
                .and_then(|()| shoot_dirac_log(&problem, &mut p, &mut q))
        };
        state.p = p;
        state.q = q;
        result
    }

    /// As [`Self::integrate_state`], also returning the Newton correction.
    pub fn integrate_state_with_correction(
        &self,
        state: &mut RadialState,
    ) -> AtomResult<(TurningPoint, f64)> {
        let turning_point = self.integrate_state(state)?;
        let problem = self.problem(state);
        let correction =
            shoot_dirac_energy_derivative(&problem, &state.p, &state.q, &turning_point)?;
        Ok((turning_point, correction))
    }
}

#[cfg(test)]
mod tests {
    use super::{DiracAtom, INFINITE_MASS, SolverOptions};
    use crate::common::constants::{ATOMIC_MASS_UNIT, FEMTOMETRE, MUON_MASS, SPEED_OF_LIGHT};
    use crate::domain::{AtomErrorCategory, NuclearModel};

    #[test]
    fn builder_derives_reduced_mass_and_radius() {
        let atom = DiracAtom::builder(1.0)
            .mass(1.0)
            .isotope(1.0)
            .build()
            .unwrap();
        let expected = ATOMIC_MASS_UNIT / (1.0 + ATOMIC_MASS_UNIT);
        assert!((atom.mu() - expected).abs() < 1.0e-12);
        assert!(atom.nuclear_radius() < 0.0);
        assert!((atom.rest_energy() - expected * SPEED_OF_LIGHT.powi(2)).abs() < 1.0e-9);

        let lead = DiracAtom::builder(82.0)
            .isotope(208.0)
            .nuclear_model(NuclearModel::Sphere)
            .build()
            .unwrap();
        let radius = 1.2 * FEMTOMETRE * 208.0_f64.cbrt();
        assert!((lead.nuclear_radius() - radius).abs() < 1.0e-12 * radius);
        assert!(lead.mu() < MUON_MASS);
    }

    #[test]
    fn infinite_mass_keeps_the_bare_particle() {
        let atom = DiracAtom::builder(6.0)
            .isotope(INFINITE_MASS)
            .nuclear_model(NuclearModel::Sphere)
            .build()
            .unwrap();
        assert_eq!(atom.mu(), MUON_MASS);
        assert!(atom.nuclear_radius() < 0.0);
        assert!((atom.rc() - 1.0 / (6.0 * MUON_MASS)).abs() < 1.0e-15);
    }

    #[test]
    fn invalid_construction_is_a_configuration_error() {
        for builder in [
            DiracAtom::builder(0.0),
            DiracAtom::builder(1.0).mass(-1.0),
            DiracAtom::builder(1.0).isotope(0.5),
            DiracAtom::builder(1.0).grid(0.0, 0.005),
            DiracAtom::builder(1.0).grid(1.0, -0.005),
        ] {
            let error = builder.build().unwrap_err();
            assert_eq!(error.category(), AtomErrorCategory::Configuration);
        }
    }

    #[test]
    fn energy_limits_without_cache_span_the_bound_range() {
        let point = DiracAtom::builder(1.0).mass(1.0).build().unwrap();
        let rest = SPEED_OF_LIGHT.powi(2);
        assert_eq!(point.energy_limits(0, -1), (-rest, rest));

        let sphere = DiracAtom::builder(20.0)
            .isotope(40.0)
            .nuclear_model(NuclearModel::Sphere)
            .build()
            .unwrap();
        let (low, high) = sphere.energy_limits(0, -1);
        assert!((low - (sphere.potential_at(0.0) + sphere.rest_energy())).abs() < 1.0e-6);
        assert_eq!(high, sphere.rest_energy());
    }

    #[test]
    fn grid_limits_bracket_the_turning_point() {
        let atom = DiracAtom::builder(1.0).mass(1.0).build().unwrap();
        let energy = atom.rest_energy() - 0.5;
        let (i_in, i_out) = atom.grid_limits(energy, -1).unwrap();

        let r_in = atom.rc() * (f64::from(i_in) * atom.dx()).exp();
        let r_out = atom.rc() * (f64::from(i_out) * atom.dx()).exp();
        assert!(r_in < 1.0e-4);
        assert!(r_out > 2.0 && r_out < 20.0);
    }

    #[test]
    fn grid_limits_reject_invalid_tolerances() {
        let mut atom = DiracAtom::builder(1.0).mass(1.0).build().unwrap();
        let energy = atom.rest_energy() - 0.5;

        atom.options.out_eps = 1.5;
        assert_eq!(
            atom.grid_limits(energy, -1).unwrap_err().category(),
            AtomErrorCategory::Configuration
        );

        atom.options = SolverOptions {
            in_eps: 0.0,
            ..SolverOptions::default()
        };
        assert!(atom.grid_limits(energy, -1).is_err());

        atom.options = SolverOptions::default();
        assert_eq!(
            atom.grid_limits(atom.rest_energy() + 1.0, -1)
                .unwrap_err()
                .category(),
            AtomErrorCategory::PhysicalInfeasibility
        );
    }

    #[test]
    fn init_state_samples_the_potential_on_its_window() {
        let mut atom = DiracAtom::builder(2.0).mass(1.0).build().unwrap();
        let state = atom.init_state(atom.rest_energy() - 2.0, -1).unwrap();

        assert_eq!(state.v.len(), state.grid.len());
        for (r, v) in state.grid.radii().iter().zip(&state.v) {
            assert!((v + 2.0 / r).abs() < 1.0e-9 * v.abs());
        }
        assert!(!state.initialized);
    }
}
