//! Physical constants in Hartree atomic units (CODATA 2014).
//!
//! Lengths are in Bohr radii, energies in Hartree and masses in electron
//! masses, so `hbar = m_e = e = 1` and the speed of light is `1 / alpha`.

pub const ALPHA: f64 = 7.297_352_566_4e-3;
pub const SPEED_OF_LIGHT: f64 = 137.035_999_139;

pub const ELECTRON_MASS: f64 = 1.0;
pub const MUON_MASS: f64 = 1.0 / 4.836_331_70e-3;
pub const PROTON_MASS: f64 = 1.0 / 5.446_170_213_52e-4;

pub const METRE: f64 = 1.0 / 5.291_772_106_7e-11;
pub const ANGSTROM: f64 = 1.0 / 5.291_772_106_7e-1;
pub const FEMTOMETRE: f64 = 1.0 / 5.291_772_106_7e4;
pub const ELECTRON_VOLT: f64 = 1.0 / 27.211_385;
pub const ATOMIC_MASS_UNIT: f64 = 1_822.888_486_192;

/// Radius constant of the `R = r0 A^(1/3)` uniform-sphere nuclear model.
pub const NUCLEAR_RADIUS_CONSTANT: f64 = 1.2 * FEMTOMETRE;
