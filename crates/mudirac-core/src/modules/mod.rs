pub mod atom;
pub mod potential;
pub mod state;

mod traits;

pub use atom::{DiracAtom, DiracAtomBuilder, INFINITE_MASS, SolverOptions, StateCache};
pub use potential::{
    BackgroundChargePotential, CompositePotential, CoulombSpherePotential, DEFAULT_UEHLING_STEPS,
    UehlingPotential,
};
pub use state::{RadialState, StateSample};
pub use traits::Potential;
