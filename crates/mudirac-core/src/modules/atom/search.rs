//! Energy searches: node bisection, damped Newton refinement and the
//! memoized per-state orchestration on top of them.

use super::DiracAtom;
use crate::domain::{AtomError, AtomResult, SearchStage, StateKey};
use crate::modules::state::RadialState;
use crate::numerics::hydrogenic_dirac_energy;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info, trace};

/// Tunables of the eigenvalue search.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverOptions {
    /// Newton stops once `|dE|` drops below this (Hartree).
    pub energy_tolerance: f64,
    /// Fraction of each Newton step actually applied.
    pub energy_damping: f64,
    /// Largest allowed `|dE / E|` per Newton step.
    pub max_step_ratio: f64,
    pub max_iterations: usize,
    /// Factor applied to the binding energy when a search lands on the
    /// wrong principal number.
    pub energy_search_factor: f64,
    pub in_eps: f64,
    pub out_eps: f64,
    /// Samples below this fraction of the peak are ignored by node counting.
    pub node_tolerance: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            energy_tolerance: 1.0e-7,
            energy_damping: 0.5,
            max_step_ratio: 0.1,
            max_iterations: 100,
            energy_search_factor: 1.5,
            in_eps: 1.0e-5,
            out_eps: 1.0e-5,
            node_tolerance: 1.0e-8,
        }
    }
}

impl SolverOptions {
    pub fn validate(&self) -> AtomResult<()> {
        let positive = [
            ("energy_tolerance", self.energy_tolerance),
            ("max_step_ratio", self.max_step_ratio),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(AtomError::configuration(
                    field,
                    format!("must be finite and > 0, got {value}"),
                ));
            }
        }
        if !(self.energy_damping > 0.0 && self.energy_damping <= 1.0) {
            return Err(AtomError::configuration(
                "energy_damping",
                format!("must lie in (0, 1], got {}", self.energy_damping),
            ));
        }
        if self.max_iterations == 0 {
            return Err(AtomError::configuration(
                "max_iterations",
                "at least one iteration is required",
            ));
        }
        if !(self.energy_search_factor.is_finite() && self.energy_search_factor > 1.0) {
            return Err(AtomError::configuration(
                "energy_search_factor",
                format!("must be finite and > 1, got {}", self.energy_search_factor),
            ));
        }
        for (field, value) in [("in_eps", self.in_eps), ("out_eps", self.out_eps)] {
            if !(value > 0.0 && value < 1.0) {
                return Err(AtomError::configuration(
                    field,
                    format!("must lie in (0, 1), got {value}"),
                ));
            }
        }
        if !(self.node_tolerance >= 0.0 && self.node_tolerance < 1.0) {
            return Err(AtomError::configuration(
                "node_tolerance",
                format!("must lie in [0, 1), got {}", self.node_tolerance),
            ));
        }
        Ok(())
    }
}

impl DiracAtom {
    /// Integrates a trial of energy `E`, makes it continuous and counts its
    /// nodes.
    fn trial_nodes(&mut self, energy: f64, k: i32) -> AtomResult<RadialState> {
        let mut state = self.init_state(energy, k)?;
        let turning_point = self.integrate_state(&mut state)?;
        state.continuify(&turning_point);
        state.find_nodes(self.options.node_tolerance);
        Ok(state)
    }

    /// Tertile bisection on the node count of `P` inside `[min_e, max_e]`.
    /// Returns the first trial state with `target_nodes` nodes; the bracket is
    /// narrowed in place.
    pub fn converge_nodes(
        &mut self,
        k: i32,
        target_nodes: usize,
        min_e: &mut f64,
        max_e: &mut f64,
    ) -> AtomResult<RadialState> {
        let mut low_energy = *min_e + (*max_e - *min_e) / 3.0;
        let mut high_energy = *max_e - (*max_e - *min_e) / 3.0;
        let mut low_nodes: Option<usize> = None;
        let mut high_nodes: Option<usize> = None;

        for iteration in 0..self.options.max_iterations {
            let nodes_low = match low_nodes {
                Some(nodes) => nodes,
                None => {
                    let trial = self.trial_nodes(low_energy, k)?;
                    if trial.nodes == target_nodes {
                        return Ok(trial);
                    }
                    trial.nodes
                }
            };
            let nodes_high = match high_nodes {
                Some(nodes) => nodes,
                None => {
                    let trial = self.trial_nodes(high_energy, k)?;
                    if trial.nodes == target_nodes {
                        return Ok(trial);
                    }
                    trial.nodes
                }
            };
            trace!(
                "node bisection {iteration}: {nodes_low} nodes at {low_energy:.10e}, {nodes_high} nodes at {high_energy:.10e}"
            );

            match (
                nodes_low.cmp(&target_nodes),
                nodes_high.cmp(&target_nodes),
            ) {
                (Ordering::Greater, Ordering::Greater) => {
                    high_energy = low_energy;
                    high_nodes = Some(nodes_low);
                    low_energy = 0.5 * (*min_e + low_energy);
                    low_nodes = None;
                    *max_e = high_energy;
                }
                (Ordering::Less, Ordering::Less) => {
                    low_energy = high_energy;
                    low_nodes = Some(nodes_high);
                    high_energy = 0.5 * (*max_e + high_energy);
                    high_nodes = None;
                    *min_e = low_energy;
                }
                (Ordering::Less, Ordering::Greater) => {
                    *min_e = low_energy;
                    low_energy = 0.5 * (low_energy + high_energy);
                    low_nodes = None;
                    high_nodes = Some(nodes_high);
                }
                _ => {
                    return Err(AtomError::InconsistentBracket {
                        energy_low: low_energy,
                        nodes_low,
                        energy_high: high_energy,
                        nodes_high,
                    });
                }
            }
        }

        Err(AtomError::SearchExhausted {
            stage: SearchStage::NodeBisection,
            iterations: self.options.max_iterations,
            energy: low_energy,
        })
    }

    /// Energy inside `[min_e, max_e]` whose trial has `nodes` nodes in `P`.
    pub fn search_basin_e(
        &mut self,
        k: i32,
        nodes: usize,
        min_e: f64,
        max_e: f64,
    ) -> AtomResult<f64> {
        let (mut low, mut high) = (min_e, max_e);
        self.converge_nodes(k, nodes, &mut low, &mut high)
            .map(|state| state.energy)
            .map_err(|error| match error {
                AtomError::SearchExhausted {
                    iterations, energy, ..
                } => AtomError::SearchExhausted {
                    stage: SearchStage::BasinSearch,
                    iterations,
                    energy,
                },
                other => other,
            })
    }

    /// Damped Newton iteration on the matching mismatch, starting from
    /// `energy` and never leaving `(min_e, max_e)`. The returned state is
    /// continuous with its nodes counted, but not normalized.
    pub fn converge_e(
        &mut self,
        energy: f64,
        k: i32,
        min_e: f64,
        max_e: f64,
    ) -> AtomResult<RadialState> {
        let SolverOptions {
            energy_tolerance,
            energy_damping,
            max_step_ratio,
            max_iterations,
            node_tolerance,
            ..
        } = self.options;
        let mut energy = energy;

        for iteration in 0..max_iterations {
            let mut state = self.init_state(energy, k)?;
            let (turning_point, correction) = self.integrate_state_with_correction(&mut state)?;
            trace!("Newton {iteration}: E = {energy:.12e}, dE = {correction:.6e}");

            if !correction.is_finite() {
                return Err(AtomError::Divergence {
                    stage: SearchStage::NewtonRefinement,
                    iteration,
                    energy,
                    detail: "non-finite energy correction",
                });
            }
            if correction.abs() < energy_tolerance {
                state.energy = energy - correction;
                state.continuify(&turning_point);
                state.find_nodes(node_tolerance);
                debug!(
                    "Newton converged after {} iterations: E = {:.12e}",
                    iteration + 1,
                    state.energy
                );
                return Ok(state);
            }

            let limit = energy.abs() * max_step_ratio;
            let step = correction.clamp(-limit, limit);
            let mut next = energy - energy_damping * step;
            if next <= min_e {
                next = 0.5 * (energy + min_e);
            } else if next >= max_e {
                next = 0.5 * (energy + max_e);
            }
            energy = next;
        }

        Err(AtomError::SearchExhausted {
            stage: SearchStage::NewtonRefinement,
            iterations: max_iterations,
            energy,
        })
    }

    /// Newton refinement inside the bound-state range, then normalization
    /// and the nodal check between `P` and `Q`.
    pub fn converge_state(&mut self, energy: f64, k: i32) -> AtomResult<RadialState> {
        let floor = (self.potential_at(0.0) + self.rest_energy()).max(-self.rest_energy());
        let ceiling = self.rest_energy();
        let mut state = self.converge_e(energy, k, floor, ceiling)?;

        state.normalize();
        state.find_nodes(self.options.node_tolerance);

        // Q carries one extra node for k > 0.
        let expected = usize::from(k > 0);
        if state.nodes_q != state.nodes + expected {
            return Err(AtomError::NodeMismatch {
                k,
                nodes_p: state.nodes,
                nodes_q: state.nodes_q,
                expected,
            });
        }
        state.initialized = true;
        Ok(state)
    }

    /// Solves and caches the `(n, l, s)` state unless a valid one is cached
    /// already (or `force` is set).
    pub fn calc_state(&mut self, n: u32, l: u32, s: bool, force: bool) -> AtomResult<()> {
        let key = StateKey::new(n, l, s)?;
        if !force && self.cache.initialized(&key).is_some() {
            trace!("state {key} served from cache");
            return Ok(());
        }

        let k = key.kappa();
        let rest = self.rest_energy();
        let factor = self.options.energy_search_factor;
        let mut energy = hydrogenic_dirac_energy(self.z(), self.mu(), n, k);
        if self.nuclear_radius() > 0.0 {
            let floor = self.potential_at(0.0) + rest;
            if energy <= floor {
                energy = floor + 0.1;
            }
        }
        debug!("solving {key} (k = {k}) from E - mc^2 = {:.10e}", energy - rest);

        for attempt in 0..self.options.max_iterations {
            let state = self.converge_state(energy, k)?;
            let found = state.n();
            if found == n {
                info!("state {key} converged: E - mc^2 = {:.10e}", state.energy - rest);
                self.cache.insert(key, state);
                return Ok(());
            }

            let found_key = StateKey { n: found, ..key };
            debug!(
                "attempt {attempt} for {key} converged on {found_key} at E - mc^2 = {:.10e}",
                state.energy - rest
            );
            self.cache.insert(found_key, state);

            let binding = energy - rest;
            energy = if found > n {
                rest + binding * factor
            } else {
                rest + binding / factor
            };

            let (low, high) = self.energy_limits(key.nodes(), k);
            if energy >= high {
                energy = rest + (high - rest) * factor;
            } else if energy <= low {
                energy = rest + (low - rest) / factor;
            }
            if !(energy > low && energy < high) {
                energy = 0.5 * (low + high);
            }
        }

        Err(AtomError::SearchExhausted {
            stage: SearchStage::StateSearch,
            iterations: self.options.max_iterations,
            energy,
        })
    }

    /// Converged `(n, l, s)` state, solved on first request.
    pub fn get_state(&mut self, n: u32, l: u32, s: bool) -> AtomResult<RadialState> {
        self.calc_state(n, l, s, false)?;
        let key = StateKey::new(n, l, s)?;
        self.cache
            .initialized(&key)
            .cloned()
            .ok_or(AtomError::SearchExhausted {
                stage: SearchStage::StateSearch,
                iterations: 0,
                energy: f64::NAN,
            })
    }

    /// Every state up to principal number `max_n`, in increasing `n`.
    pub fn calc_all_states(&mut self, max_n: u32, force: bool) -> AtomResult<()> {
        for n in 1..=max_n {
            for l in 0..n {
                self.calc_state(n, l, true, force)?;
                if l > 0 {
                    self.calc_state(n, l, false, force)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SolverOptions;
    use crate::domain::{AtomError, AtomErrorCategory, SearchStage};
    use crate::modules::{DiracAtom, Potential};

    /// Zero up to the given radius, NaN beyond.
    #[derive(Debug)]
    struct UndefinedBeyond(f64);

    impl Potential for UndefinedBeyond {
        fn evaluate(&self, r: f64) -> f64 {
            if r > self.0 { f64::NAN } else { 0.0 }
        }
    }

    #[test]
    fn non_finite_correction_is_a_divergence() {
        let mut atom = DiracAtom::builder(1.0)
            .mass(1.0)
            .potential_term(UndefinedBeyond(5.0))
            .build()
            .unwrap();
        let rest = atom.rest_energy();

        let error = atom
            .converge_e(rest - 0.5, -1, rest - 1.0, rest)
            .unwrap_err();
        assert!(matches!(
            error,
            AtomError::Divergence {
                stage: SearchStage::NewtonRefinement,
                iteration: 0,
                ..
            }
        ));
        assert_eq!(error.category(), AtomErrorCategory::NumericalDivergence);
    }

    #[test]
    fn node_counts_falling_with_energy_are_inconsistent() {
        let mut atom = DiracAtom::builder(1.0).mass(1.0).build().unwrap();
        let rest = atom.rest_energy();
        // Reversed bracket: the tertile trials land at E - mc^2 = -0.04,
        // above the 3s level, and at -0.6, below the 1s level.
        let (mut low, mut high) = (rest + 0.52, rest - 1.16);

        let error = atom
            .converge_nodes(-1, 1, &mut low, &mut high)
            .unwrap_err();
        assert_eq!(error.category(), AtomErrorCategory::ConsistencyViolation);
        match error {
            AtomError::InconsistentBracket {
                energy_low,
                nodes_low,
                energy_high,
                nodes_high,
            } => {
                assert!((energy_low - rest + 0.04).abs() < 1.0e-9);
                assert!((energy_high - rest + 0.6).abs() < 1.0e-9);
                assert!(nodes_low > 1);
                assert_eq!(nodes_high, 0);
            }
            other => panic!("expected an inconsistent bracket, got {other:?}"),
        }
    }

    #[test]
    fn default_options_are_valid() {
        assert!(SolverOptions::default().validate().is_ok());
    }

    #[test]
    fn invalid_options_are_rejected() {
        let cases = [
            SolverOptions {
                energy_tolerance: 0.0,
                ..SolverOptions::default()
            },
            SolverOptions {
                energy_damping: 1.5,
                ..SolverOptions::default()
            },
            SolverOptions {
                max_iterations: 0,
                ..SolverOptions::default()
            },
            SolverOptions {
                energy_search_factor: 1.0,
                ..SolverOptions::default()
            },
            SolverOptions {
                out_eps: 1.0,
                ..SolverOptions::default()
            },
            SolverOptions {
                node_tolerance: -1.0,
                ..SolverOptions::default()
            },
        ];
        for options in cases {
            assert_eq!(
                options.validate().unwrap_err().category(),
                AtomErrorCategory::Configuration
            );
        }
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: SolverOptions =
            serde_json::from_str(r#"{ "energy_tolerance": 1e-9, "max_iterations": 50 }"#).unwrap();
        assert_eq!(options.energy_tolerance, 1.0e-9);
        assert_eq!(options.max_iterations, 50);
        assert_eq!(options.energy_damping, SolverOptions::default().energy_damping);

        assert!(serde_json::from_str::<SolverOptions>(r#"{ "unknown": 1 }"#).is_err());
    }
}
