use crate::domain::StateKey;
use crate::modules::state::RadialState;
use std::collections::BTreeMap;

/// Converged states of one atom keyed by `(n, l, s)`. Entries are added or
/// overwritten, never removed.
#[derive(Debug, Clone, Default)]
pub struct StateCache {
    states: BTreeMap<StateKey, RadialState>,
}

impl StateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn get(&self, key: &StateKey) -> Option<&RadialState> {
        self.states.get(key)
    }

    /// The cached state for `key`, provided it passed validation.
    pub fn initialized(&self, key: &StateKey) -> Option<&RadialState> {
        self.get(key).filter(|state| state.initialized)
    }

    pub fn insert(&mut self, key: StateKey, state: RadialState) {
        self.states.insert(key, state);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &RadialState)> {
        self.states.iter()
    }

    /// Narrows `[floor, ceiling]` with the energies of cached states sharing
    /// `l` and `s` with `key`: states with lower `n` raise the floor, states
    /// with higher `n` lower the ceiling.
    pub fn energy_bounds(&self, key: &StateKey, floor: f64, ceiling: f64) -> (f64, f64) {
        self.states
            .iter()
            .filter(|(cached, state)| {
                state.initialized && cached.l == key.l && cached.s == key.s && cached.n != key.n
            })
            .fold((floor, ceiling), |(low, high), (cached, state)| {
                if cached.n < key.n {
                    (low.max(state.energy), high)
                } else {
                    (low, high.min(state.energy))
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::StateCache;
    use crate::domain::StateKey;
    use crate::modules::state::RadialState;
    use crate::numerics::LogGrid;

    fn cached_state(energy: f64, k: i32) -> RadialState {
        let grid = LogGrid::from_indices(1.0, 0.1, 0, 9).unwrap();
        let v = vec![0.0; grid.len()];
        let mut state = RadialState::new(grid, v, energy, k);
        state.initialized = true;
        state
    }

    #[test]
    fn bounds_use_neighbours_with_the_same_orbital() {
        let mut cache = StateCache::new();
        cache.insert(StateKey::new(1, 0, true).unwrap(), cached_state(-0.5, -1));
        cache.insert(StateKey::new(3, 0, true).unwrap(), cached_state(-0.055, -1));
        cache.insert(StateKey::new(4, 0, true).unwrap(), cached_state(-0.031, -1));
        cache.insert(StateKey::new(3, 1, true).unwrap(), cached_state(-0.056, -2));

        let target = StateKey::new(2, 0, true).unwrap();
        let (low, high) = cache.energy_bounds(&target, -10.0, 0.0);
        assert_eq!(low, -0.5);
        assert_eq!(high, -0.055);
    }

    #[test]
    fn uninitialized_and_identical_keys_are_ignored() {
        let mut cache = StateCache::new();
        let key = StateKey::new(2, 0, true).unwrap();
        cache.insert(key, cached_state(-0.125, -1));
        let mut trial = cached_state(-0.6, -1);
        trial.initialized = false;
        cache.insert(StateKey::new(1, 0, true).unwrap(), trial);

        assert_eq!(cache.energy_bounds(&key, -10.0, 0.0), (-10.0, 0.0));
        assert!(cache.initialized(&StateKey::new(1, 0, true).unwrap()).is_none());
        assert!(cache.initialized(&key).is_some());
        assert_eq!(cache.len(), 2);
    }
}
