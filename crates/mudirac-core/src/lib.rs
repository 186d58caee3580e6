//! Relativistic bound states of a single particle in the field of a nucleus.
//!
//! The radial Dirac equation is solved on a logarithmic grid by two-sided
//! shooting, a node-count bisection and a damped Newton refinement of the
//! energy. [`modules::DiracAtom`] ties these together and memoizes every
//! converged state.

pub mod common;
pub mod config;
pub mod domain;
pub mod modules;
pub mod numerics;

pub use config::{Config, ConfigError};
pub use domain::{AtomError, AtomErrorCategory, AtomResult, NuclearModel, StateKey, XrayLine};
pub use modules::{DiracAtom, DiracAtomBuilder, Potential, RadialState, SolverOptions};
