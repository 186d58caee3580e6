use std::fmt::Debug;

/// Spherically symmetric potential energy seen by the orbiting particle.
pub trait Potential: Debug {
    /// Potential energy at radius `r >= 0`.
    fn evaluate(&self, r: f64) -> f64;

    /// Potential energy on the lattice point `rc * exp(i * dx)`. Potentials
    /// that are themselves tabulated on a lattice override this to return
    /// their stored values without interpolation.
    fn evaluate_lattice(&self, rc: f64, dx: f64, i: i32) -> f64 {
        self.evaluate(rc * (f64::from(i) * dx).exp())
    }
}

impl<T> Potential for Box<T>
where
    T: Potential + ?Sized,
{
    fn evaluate(&self, r: f64) -> f64 {
        (**self).evaluate(r)
    }

    fn evaluate_lattice(&self, rc: f64, dx: f64, i: i32) -> f64 {
        (**self).evaluate_lattice(rc, dx, i)
    }
}

#[cfg(test)]
mod tests {
    use super::Potential;

    #[derive(Debug)]
    struct Harmonic;

    impl Potential for Harmonic {
        fn evaluate(&self, r: f64) -> f64 {
            0.5 * r * r
        }
    }

    #[test]
    fn lattice_access_defaults_to_direct_evaluation() {
        let potential = Harmonic;
        let r = 2.0 * (3.0 * 0.1_f64).exp();
        assert!((potential.evaluate_lattice(2.0, 0.1, 3) - 0.5 * r * r).abs() < 1.0e-12);
    }

    #[test]
    fn boxed_potentials_forward_both_methods() {
        let potential: Box<dyn Potential> = Box::new(Harmonic);
        assert_eq!(potential.evaluate(2.0), 2.0);
        assert_eq!(potential.evaluate_lattice(2.0, 0.1, 0), 2.0);
    }
}
