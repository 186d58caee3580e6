//! JSON input file describing one atom and the X-ray lines to compute.

use crate::common::constants::{ELECTRON_MASS, MUON_MASS};
use crate::common::{MAX_ATOMIC_NUMBER, atomic_number_for_symbol, element_symbol};
use crate::domain::{AtomError, AtomResult, NuclearModel, XrayLine};
use crate::modules::{DEFAULT_UEHLING_STEPS, DiracAtom, INFINITE_MASS, SolverOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const MAX_OUTPUT_LEVEL: u8 = 2;
pub const MAX_VERBOSITY: u8 = 3;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read input file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse input file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Invalid(#[from] AtomError),
}

/// Particle mass: `"mu"`, `"e"` or a value in electron masses.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ParticleMass {
    Value(f64),
    Named(String),
}

impl Default for ParticleMass {
    fn default() -> Self {
        Self::Named("mu".to_string())
    }
}

impl ParticleMass {
    pub fn resolve(&self) -> AtomResult<f64> {
        match self {
            Self::Value(value) if value.is_finite() && *value > 0.0 => Ok(*value),
            Self::Value(value) => Err(AtomError::configuration(
                "mass",
                format!("must be finite and > 0, got {value}"),
            )),
            Self::Named(name) => match name.trim().to_ascii_lowercase().as_str() {
                "mu" | "muon" => Ok(MUON_MASS),
                "e" | "electron" => Ok(ELECTRON_MASS),
                other => Err(AtomError::configuration(
                    "mass",
                    format!("unknown particle '{other}', expected 'mu', 'e' or a number"),
                )),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    pub fc: f64,
    pub dx: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { fc: 1.0, dx: 0.005 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub element: Option<String>,
    pub atomic_number: Option<u32>,
    /// Mass number, or `-1` for an infinitely heavy point nucleus.
    pub isotope: f64,
    pub mass: ParticleMass,
    pub nuclear_model: NuclearModel,
    pub uehling: bool,
    pub uehling_steps: usize,
    pub grid: GridConfig,
    pub solver: SolverOptions,
    pub xr_lines: Vec<String>,
    pub output: u8,
    pub verbosity: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            element: None,
            atomic_number: None,
            isotope: INFINITE_MASS,
            mass: ParticleMass::default(),
            nuclear_model: NuclearModel::Point,
            uehling: false,
            uehling_steps: DEFAULT_UEHLING_STEPS,
            grid: GridConfig::default(),
            solver: SolverOptions::default(),
            xr_lines: Vec::new(),
            output: 1,
            verbosity: 1,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&source, path)
    }

    /// Parses and validates `source`; `origin` only labels errors.
    pub fn from_json(source: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(source).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AtomResult<()> {
        self.z()?;
        self.mass.resolve()?;
        self.xray_lines()?;
        self.solver.validate()?;
        if self.output > MAX_OUTPUT_LEVEL {
            return Err(AtomError::configuration(
                "output",
                format!("must be at most {MAX_OUTPUT_LEVEL}, got {}", self.output),
            ));
        }
        if self.verbosity > MAX_VERBOSITY {
            return Err(AtomError::configuration(
                "verbosity",
                format!("must be at most {MAX_VERBOSITY}, got {}", self.verbosity),
            ));
        }
        Ok(())
    }

    /// Atomic number from `atomic_number` or `element`; both must agree
    /// when given.
    pub fn z(&self) -> AtomResult<u32> {
        let from_symbol = match &self.element {
            Some(symbol) => Some(
                atomic_number_for_symbol(symbol)
                    .map(|z| z as u32)
                    .ok_or_else(|| {
                        AtomError::configuration("element", format!("unknown symbol '{symbol}'"))
                    })?,
            ),
            None => None,
        };

        match (self.atomic_number, from_symbol) {
            (Some(z), _) if z == 0 || z as usize > MAX_ATOMIC_NUMBER => Err(
                AtomError::configuration(
                    "atomic_number",
                    format!("must lie in [1, {MAX_ATOMIC_NUMBER}], got {z}"),
                ),
            ),
            (Some(z), Some(symbol_z)) if z != symbol_z => Err(AtomError::configuration(
                "element",
                format!("atomic number {z} does not match element with Z = {symbol_z}"),
            )),
            (Some(z), _) | (None, Some(z)) => Ok(z),
            (None, None) => Err(AtomError::configuration(
                "element",
                "either 'element' or 'atomic_number' is required",
            )),
        }
    }

    pub fn element_symbol(&self) -> Option<&'static str> {
        self.z().ok().and_then(|z| element_symbol(z as usize))
    }

    pub fn xray_lines(&self) -> AtomResult<Vec<XrayLine>> {
        self.xr_lines.iter().map(|line| line.parse()).collect()
    }

    pub fn build_atom(&self) -> AtomResult<DiracAtom> {
        let mut builder = DiracAtom::builder(f64::from(self.z()?))
            .mass(self.mass.resolve()?)
            .isotope(self.isotope)
            .nuclear_model(self.nuclear_model)
            .grid(self.grid.fc, self.grid.dx)
            .options(self.solver);
        if self.uehling {
            builder = builder.uehling(self.uehling_steps);
        }
        builder.build()
    }
}
