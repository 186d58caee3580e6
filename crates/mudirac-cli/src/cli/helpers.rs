use super::CliError;
use anyhow::Context;
use mudirac_core::common::constants::ELECTRON_VOLT;
use mudirac_core::{Config, DiracAtom, RadialState, StateKey, XrayLine};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

pub(super) fn log_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs the stderr subscriber. `RUST_LOG` wins over the verbosity level.
pub(super) fn init_logging(verbosity: u8) {
    let level = log_level(verbosity);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mudirac_core={level},mudirac={level}")));
    // A subscriber may already be installed when running in-process.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// File name up to its first `.`, as in `pb208.in.json` -> `pb208`.
pub(super) fn seed_from_path(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.split('.').next())
        .filter(|seed| !seed.is_empty())
        .unwrap_or("mudirac")
        .to_string()
}

/// Both states of one computed X-ray line.
#[derive(Debug, Clone)]
pub(super) struct Transition {
    pub(super) line: XrayLine,
    pub(super) lower: RadialState,
    pub(super) upper: RadialState,
}

impl Transition {
    /// `E(upper) - E(lower)` in eV.
    pub(super) fn energy_ev(&self) -> f64 {
        (self.upper.energy - self.lower.energy) / ELECTRON_VOLT
    }

    pub(super) fn states(&self) -> [(usize, &RadialState); 2] {
        [(1, &self.lower), (2, &self.upper)]
    }
}

pub(super) fn render_xr_out(atom: &DiracAtom, transitions: &[Transition]) -> String {
    let mut out = format!(
        "# Z = {}, A = {} amu, m = {} au\nLine\tDeltaE (eV)\n",
        atom.z(),
        atom.a(),
        atom.m()
    );
    for transition in transitions {
        let _ = writeln!(out, "{}\t{:.10e}", transition.line, transition.energy_ev());
    }
    out
}

pub(super) fn render_state(state: &RadialState) -> String {
    let mut out = String::with_capacity(state.len() * 96);
    for sample in state.profile() {
        let _ = writeln!(
            out,
            "{:.15e}\t{:.15e}\t{:.15e}\t{:.15e}",
            sample.r, sample.p, sample.q, sample.v
        );
    }
    out
}

pub(super) fn write_text(path: &Path, contents: &str) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory '{}'", parent.display()))?;
    }
    fs::write(path, contents)
        .with_context(|| format!("failed to write '{}'", path.display()))?;
    Ok(())
}

pub(super) fn xr_out_path(output_dir: &Path, seed: &str) -> PathBuf {
    output_dir.join(format!("{seed}.xr.out"))
}

pub(super) fn state_path(output_dir: &Path, seed: &str, line: &XrayLine, index: usize) -> PathBuf {
    output_dir.join(format!("{seed}.{line}.{index}.out"))
}

#[derive(Debug, Serialize)]
struct RunReport<'a> {
    seed: &'a str,
    z: f64,
    a: f64,
    m: f64,
    mu: f64,
    nuclear_model: &'static str,
    nuclear_radius: f64,
    lines: Vec<LineReport>,
}

#[derive(Debug, Serialize)]
struct LineReport {
    line: String,
    energy_ev: f64,
    lower: StateReport,
    upper: StateReport,
}

#[derive(Debug, Serialize)]
struct StateReport {
    state: String,
    k: i32,
    nodes: usize,
    binding_energy_ev: f64,
}

impl StateReport {
    fn new(key: StateKey, state: &RadialState, rest_energy: f64) -> Self {
        Self {
            state: key.to_string(),
            k: state.k,
            nodes: state.nodes,
            binding_energy_ev: (state.energy - rest_energy) / ELECTRON_VOLT,
        }
    }
}

pub(super) fn render_report(
    seed: &str,
    config: &Config,
    atom: &DiracAtom,
    transitions: &[Transition],
) -> Result<String, CliError> {
    let rest = atom.rest_energy();
    let report = RunReport {
        seed,
        z: atom.z(),
        a: atom.a(),
        m: atom.m(),
        mu: atom.mu(),
        nuclear_model: config.nuclear_model.as_str(),
        nuclear_radius: atom.nuclear_radius(),
        lines: transitions
            .iter()
            .map(|transition| LineReport {
                line: transition.line.to_string(),
                energy_ev: transition.energy_ev(),
                lower: StateReport::new(transition.line.lower, &transition.lower, rest),
                upper: StateReport::new(transition.line.upper, &transition.upper, rest),
            })
            .collect(),
    };
    let rendered =
        serde_json::to_string_pretty(&report).context("failed to serialize the run report")?;
    Ok(rendered)
}
