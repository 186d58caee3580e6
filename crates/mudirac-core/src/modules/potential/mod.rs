mod background;
mod uehling;

pub use background::BackgroundChargePotential;
pub use uehling::{DEFAULT_UEHLING_STEPS, UehlingPotential};

use super::traits::Potential;

/// Coulomb potential of a point nucleus (`radius <= 0`) or of a uniformly
/// charged sphere of the given radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoulombSpherePotential {
    z: f64,
    radius: f64,
}

impl CoulombSpherePotential {
    pub fn new(z: f64, radius: f64) -> Self {
        Self { z, radius }
    }

    pub fn point(z: f64) -> Self {
        Self::new(z, -1.0)
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl Potential for CoulombSpherePotential {
    fn evaluate(&self, r: f64) -> f64 {
        let radius = self.radius;
        if radius <= 0.0 || r >= radius {
            -self.z / r
        } else {
            self.z * r * r / (2.0 * radius.powi(3)) - 1.5 * self.z / radius
        }
    }
}

/// Sum of independent potential terms.
#[derive(Debug, Default)]
pub struct CompositePotential {
    terms: Vec<Box<dyn Potential + Send>>,
}

impl CompositePotential {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<P>(&mut self, term: P)
    where
        P: Potential + Send + 'static,
    {
        self.terms.push(Box::new(term));
    }

    pub fn push_boxed(&mut self, term: Box<dyn Potential + Send>) {
        self.terms.push(term);
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl Potential for CompositePotential {
    fn evaluate(&self, r: f64) -> f64 {
        self.terms.iter().map(|term| term.evaluate(r)).sum()
    }

    fn evaluate_lattice(&self, rc: f64, dx: f64, i: i32) -> f64 {
        self.terms
            .iter()
            .map(|term| term.evaluate_lattice(rc, dx, i))
            .sum()
    }
}
