use std::fmt::{Display, Formatter};

pub type AtomResult<T> = Result<T, AtomError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomErrorCategory {
    Configuration,
    PhysicalInfeasibility,
    NumericalDivergence,
    SearchExhaustion,
    ConsistencyViolation,
}

impl AtomErrorCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "Configuration",
            Self::PhysicalInfeasibility => "PhysicalInfeasibility",
            Self::NumericalDivergence => "NumericalDivergence",
            Self::SearchExhaustion => "SearchExhaustion",
            Self::ConsistencyViolation => "ConsistencyViolation",
        }
    }

    /// Process exit code used by the command line front-end.
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Configuration => 2,
            Self::PhysicalInfeasibility => 4,
            Self::NumericalDivergence => 5,
            Self::SearchExhaustion => 6,
            Self::ConsistencyViolation => 7,
        }
    }

    /// Infeasibility errors only reject the current trial; a search may pick
    /// another energy or quantum number and carry on.
    pub const fn is_recoverable(self) -> bool {
        matches!(self, Self::PhysicalInfeasibility)
    }
}

impl Display for AtomErrorCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchStage {
    NodeBisection,
    BasinSearch,
    NewtonRefinement,
    StateSearch,
}

impl SearchStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NodeBisection => "node bisection",
            Self::BasinSearch => "basin search",
            Self::NewtonRefinement => "Newton refinement",
            Self::StateSearch => "state search",
        }
    }
}

impl Display for SearchStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AtomError {
    #[error("invalid {field}: {reason}")]
    InvalidConfiguration { field: &'static str, reason: String },
    #[error("energy E = {energy:.10e} does not give a bound state for k = {k}")]
    UnboundState { energy: f64, k: i32 },
    #[error("gamma^2 = {gamma_squared:.6e} is negative for k = {k}, Z = {z}")]
    SmallGamma { k: i32, z: f64, gamma_squared: f64 },
    #[error("{stage} diverged at iteration {iteration}: {detail} (E = {energy:.10e})")]
    Divergence {
        stage: SearchStage,
        iteration: usize,
        energy: f64,
        detail: &'static str,
    },
    #[error("{stage} did not converge within {iterations} iterations (last E = {energy:.10e})")]
    SearchExhausted {
        stage: SearchStage,
        iterations: usize,
        energy: f64,
    },
    #[error(
        "energy bracket is inconsistent: {nodes_low} nodes at E = {energy_low:.10e} but {nodes_high} nodes at higher E = {energy_high:.10e}"
    )]
    InconsistentBracket {
        energy_low: f64,
        nodes_low: usize,
        energy_high: f64,
        nodes_high: usize,
    },
    #[error(
        "nodal theorem violated for k = {k}: P has {nodes_p} nodes, Q has {nodes_q}, expected Q - P = {expected}"
    )]
    NodeMismatch {
        k: i32,
        nodes_p: usize,
        nodes_q: usize,
        expected: usize,
    },
}

impl AtomError {
    pub fn configuration(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field,
            reason: reason.into(),
        }
    }

    pub const fn category(&self) -> AtomErrorCategory {
        match self {
            Self::InvalidConfiguration { .. } => AtomErrorCategory::Configuration,
            Self::UnboundState { .. } | Self::SmallGamma { .. } => {
                AtomErrorCategory::PhysicalInfeasibility
            }
            Self::Divergence { .. } => AtomErrorCategory::NumericalDivergence,
            Self::SearchExhausted { .. } => AtomErrorCategory::SearchExhaustion,
            Self::InconsistentBracket { .. } | Self::NodeMismatch { .. } => {
                AtomErrorCategory::ConsistencyViolation
            }
        }
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.category(), self)
    }
}
