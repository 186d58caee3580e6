use crate::domain::{AtomError, AtomResult};

/// Logarithmic radial grid `r[i] = rc * exp(i * dx)` over the signed index
/// range `[i0, i1]`, stored with an explicit offset so that negative indices
/// never need pointer arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub struct LogGrid {
    rc: f64,
    dx: f64,
    first_index: i32,
    radii: Vec<f64>,
    log_radii: Vec<f64>,
}

impl LogGrid {
    pub fn from_indices(rc: f64, dx: f64, i0: i32, i1: i32) -> AtomResult<Self> {
        if !(rc.is_finite() && rc > 0.0) {
            return Err(AtomError::configuration(
                "grid centre",
                format!("rc must be finite and > 0, got {rc}"),
            ));
        }
        if !(dx.is_finite() && dx > 0.0) {
            return Err(AtomError::configuration(
                "grid step",
                format!("dx must be finite and > 0, got {dx}"),
            ));
        }
        if i0 > i1 {
            return Err(AtomError::configuration(
                "grid indices",
                format!("i0 = {i0} must not exceed i1 = {i1}"),
            ));
        }

        let log_rc = rc.ln();
        let log_radii: Vec<f64> = (i0..=i1)
            .map(|index| log_rc + f64::from(index) * dx)
            .collect();
        let radii = log_radii.iter().map(|x| x.exp()).collect();

        Ok(Self {
            rc,
            dx,
            first_index: i0,
            radii,
            log_radii,
        })
    }

    /// Grid of `count` points spaced logarithmically from `r0` to `r1`.
    pub fn from_endpoints(r0: f64, r1: f64, count: usize) -> AtomResult<Self> {
        if count < 2 {
            return Err(AtomError::configuration(
                "grid size",
                format!("at least 2 points are required, got {count}"),
            ));
        }
        if !(r0.is_finite() && r0 > 0.0 && r1.is_finite() && r1 > r0) {
            return Err(AtomError::configuration(
                "grid radii",
                format!("need 0 < r0 < r1, got r0 = {r0}, r1 = {r1}"),
            ));
        }

        let dx = (r1 / r0).ln() / (count - 1) as f64;
        let mut grid = Self::from_indices(r0, dx, 0, (count - 1) as i32)?;
        // Pin both ends so round-off in exp() does not move them.
        grid.radii[0] = r0;
        if let Some(last) = grid.radii.last_mut() {
            *last = r1;
        }
        if let Some(last) = grid.log_radii.last_mut() {
            *last = r1.ln();
        }
        Ok(grid)
    }

    pub fn rc(&self) -> f64 {
        self.rc
    }

    pub fn dx(&self) -> f64 {
        self.dx
    }

    pub fn first_index(&self) -> i32 {
        self.first_index
    }

    pub fn last_index(&self) -> i32 {
        self.first_index + self.radii.len() as i32 - 1
    }

    pub fn len(&self) -> usize {
        self.radii.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radii.is_empty()
    }

    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    pub fn log_radii(&self) -> &[f64] {
        &self.log_radii
    }

    /// Storage offset of the signed grid index, if it lies on this grid.
    pub fn offset_of(&self, index: i32) -> Option<usize> {
        let offset = i64::from(index) - i64::from(self.first_index);
        (offset >= 0 && (offset as usize) < self.radii.len()).then_some(offset as usize)
    }

    pub fn index_of(&self, offset: usize) -> i32 {
        self.first_index + offset as i32
    }

    pub fn radius(&self, index: i32) -> Option<f64> {
        self.offset_of(index).map(|offset| self.radii[offset])
    }

    pub fn inner_radius(&self) -> f64 {
        self.radii[0]
    }

    pub fn outer_radius(&self) -> f64 {
        self.radii[self.radii.len() - 1]
    }
}

/// Values sampled on the lattice `rc * exp(i * dx)` over a growable signed
/// index window.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LatticeTable {
    first_index: i32,
    values: Vec<f64>,
}

impl LatticeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: i32) -> Option<f64> {
        let offset = i64::from(index) - i64::from(self.first_index);
        if offset < 0 {
            return None;
        }
        self.values.get(offset as usize).copied()
    }

    pub fn covers(&self, i0: i32, i1: i32) -> bool {
        !self.values.is_empty()
            && i0 >= self.first_index
            && i64::from(i1) < i64::from(self.first_index) + self.values.len() as i64
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Grows the window to include `[i0, i1]`, calling `sample` only for the
    /// indices not already stored.
    pub fn extend_to<F>(&mut self, i0: i32, i1: i32, mut sample: F)
    where
        F: FnMut(i32) -> f64,
    {
        if self.values.is_empty() {
            self.first_index = i0;
            self.values = (i0..=i1).map(&mut sample).collect();
            return;
        }

        let last = self.first_index + self.values.len() as i32 - 1;
        if i0 < self.first_index {
            let mut head: Vec<f64> = (i0..self.first_index).map(&mut sample).collect();
            head.append(&mut self.values);
            self.values = head;
            self.first_index = i0;
        }
        if i1 > last {
            self.values.extend((last + 1..=i1).map(&mut sample));
        }
    }

    /// Copies the window `[i0, i1]`; `None` unless it is fully covered.
    pub fn slice(&self, i0: i32, i1: i32) -> Option<Vec<f64>> {
        if !self.covers(i0, i1) {
            return None;
        }
        let start = (i0 - self.first_index) as usize;
        let end = (i1 - self.first_index) as usize;
        Some(self.values[start..=end].to_vec())
    }
}
