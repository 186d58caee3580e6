pub mod errors;

pub use errors::{AtomError, AtomErrorCategory, AtomResult, SearchStage};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Finite-size model of the nucleus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NuclearModel {
    #[default]
    Point,
    Sphere,
}

impl NuclearModel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Sphere => "sphere",
        }
    }
}

impl Display for NuclearModel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Relativistic angular quantum number for orbital `l` and spin flag `s`
/// (`s = true` is `j = l + 1/2`). `l = 0` always maps to `k = -1`.
pub fn kappa_from_orbital(l: u32, s: bool) -> i32 {
    let l = l as i32;
    if s || l == 0 { -l - 1 } else { l }
}

/// Inverse of [`kappa_from_orbital`]: `(l, s)` for a non-zero `k`.
pub fn orbital_from_kappa(k: i32) -> (u32, bool) {
    if k < 0 {
        ((-k - 1) as u32, true)
    } else {
        (k as u32, false)
    }
}

pub fn principal_from_nodes(nodes: usize, l: u32) -> u32 {
    nodes as u32 + l + 1
}

/// Cache key of a bound state: principal `n`, orbital `l`, spin flag `s`.
/// Every `l = 0` key carries `s = true`, since both spin flags give `k = -1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey {
    pub n: u32,
    pub l: u32,
    pub s: bool,
}

impl StateKey {
    pub fn new(n: u32, l: u32, s: bool) -> AtomResult<Self> {
        if n == 0 {
            return Err(AtomError::configuration(
                "principal quantum number",
                "n must be >= 1",
            ));
        }
        if l >= n {
            return Err(AtomError::configuration(
                "orbital quantum number",
                format!("l = {l} must be smaller than n = {n}"),
            ));
        }
        Ok(Self {
            n,
            l,
            s: s || l == 0,
        })
    }

    pub fn kappa(self) -> i32 {
        kappa_from_orbital(self.l, self.s)
    }

    pub fn nodes(self) -> usize {
        (self.n - self.l - 1) as usize
    }

    /// IUPAC X-ray notation, e.g. `K1`, `L3`, `M5`.
    pub fn iupac(self) -> String {
        let shell = SHELL_LETTERS
            .get((self.n - 1) as usize)
            .copied()
            .unwrap_or('?');
        let index = if self.l == 0 {
            1
        } else {
            2 * self.l + u32::from(self.s)
        };
        format!("{shell}{index}")
    }
}

impl Display for StateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let twice_j = 2 * self.l as i32 + if self.s || self.l == 0 { 1 } else { -1 };
        write!(
            f,
            "{}{}{}/2",
            self.n,
            ORBITAL_LETTERS.get(self.l as usize).copied().unwrap_or('?'),
            twice_j
        )
    }
}

const SHELL_LETTERS: [char; 7] = ['K', 'L', 'M', 'N', 'O', 'P', 'Q'];
const ORBITAL_LETTERS: [char; 7] = ['s', 'p', 'd', 'f', 'g', 'h', 'i'];

/// Parses an IUPAC shell label (`K`, `K1`, `L2`, `M5`, ...).
pub fn parse_iupac_state(label: &str) -> AtomResult<StateKey> {
    let label = label.trim();
    let mut chars = label.chars();
    let shell = chars
        .next()
        .ok_or_else(|| AtomError::configuration("IUPAC state", "empty label"))?;
    let n = SHELL_LETTERS
        .iter()
        .position(|letter| letter.eq_ignore_ascii_case(&shell))
        .map(|index| index as u32 + 1)
        .ok_or_else(|| {
            AtomError::configuration("IUPAC state", format!("unknown shell in '{label}'"))
        })?;

    let digits = chars.as_str();
    let index = if digits.is_empty() {
        1
    } else {
        digits.parse::<u32>().map_err(|_| {
            AtomError::configuration("IUPAC state", format!("invalid sub-shell in '{label}'"))
        })?
    };
    if index == 0 || index > 2 * n - 1 {
        return Err(AtomError::configuration(
            "IUPAC state",
            format!("sub-shell {index} does not exist in shell {shell}"),
        ));
    }

    StateKey::new(n, index / 2, index % 2 == 1)
}

/// An X-ray line between two states, written `"K1-L2"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct XrayLine {
    pub lower: StateKey,
    pub upper: StateKey,
}

impl FromStr for XrayLine {
    type Err = AtomError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = value.split('-').collect();
        if parts.len() != 2 {
            return Err(AtomError::configuration(
                "X-ray line",
                format!("'{value}' must have the form 'K1-L2'"),
            ));
        }
        Ok(Self {
            lower: parse_iupac_state(parts[0])?,
            upper: parse_iupac_state(parts[1])?,
        })
    }
}

impl Display for XrayLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.lower.iupac(), self.upper.iupac())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        StateKey, XrayLine, kappa_from_orbital, orbital_from_kappa,
        parse_iupac_state, principal_from_nodes,
    };

    #[test]
    fn kappa_round_trips_through_orbital_numbers() {
        assert_eq!(kappa_from_orbital(0, true), -1);
        assert_eq!(kappa_from_orbital(0, false), -1);
        assert_eq!(kappa_from_orbital(1, false), 1);
        assert_eq!(kappa_from_orbital(1, true), -2);
        assert_eq!(kappa_from_orbital(2, false), 2);

        for k in [-4, -3, -2, -1, 1, 2, 3] {
            let (l, s) = orbital_from_kappa(k);
            assert_eq!(kappa_from_orbital(l, s), k);
        }
    }

    #[test]
    fn principal_number_follows_the_node_count() {
        assert_eq!(principal_from_nodes(0, 0), 1);
        assert_eq!(principal_from_nodes(1, 0), 2);
        assert_eq!(principal_from_nodes(0, 2), 3);
        for (n, l) in [(1, 0), (3, 1), (4, 3)] {
            let key = StateKey::new(n, l, true).unwrap();
            assert_eq!(principal_from_nodes(key.nodes(), l), n);
        }
    }

    #[test]
    fn s_states_share_one_key_for_both_spin_flags() {
        let up = StateKey::new(2, 0, true).unwrap();
        let down = StateKey::new(2, 0, false).unwrap();
        assert_eq!(up, down);
        assert!(down.s);
        assert_eq!(down.kappa(), -1);
        assert_ne!(
            StateKey::new(2, 1, true).unwrap(),
            StateKey::new(2, 1, false).unwrap()
        );
    }

    #[test]
    fn iupac_labels_map_to_quantum_numbers() {
        assert_eq!(parse_iupac_state("K").unwrap(), StateKey::new(1, 0, true).unwrap());
        assert_eq!(parse_iupac_state("K1").unwrap(), StateKey::new(1, 0, true).unwrap());
        assert_eq!(parse_iupac_state("L1").unwrap(), StateKey::new(2, 0, true).unwrap());
        assert_eq!(parse_iupac_state("L2").unwrap(), StateKey::new(2, 1, false).unwrap());
        assert_eq!(parse_iupac_state("l3").unwrap(), StateKey::new(2, 1, true).unwrap());
        assert_eq!(parse_iupac_state("M5").unwrap(), StateKey::new(3, 2, true).unwrap());

        assert!(parse_iupac_state("").is_err());
        assert!(parse_iupac_state("K2").is_err());
        assert!(parse_iupac_state("X1").is_err());
        assert!(parse_iupac_state("Lx").is_err());
    }

    #[test]
    fn state_labels_render_back() {
        let key = parse_iupac_state("L3").unwrap();
        assert_eq!(key.iupac(), "L3");
        assert_eq!(key.to_string(), "2p3/2");
        assert_eq!(parse_iupac_state("L2").unwrap().to_string(), "2p1/2");
        assert_eq!(parse_iupac_state("K1").unwrap().to_string(), "1s1/2");
    }

    #[test]
    fn xray_lines_parse_both_states() {
        let line: XrayLine = "K1-L2".parse().unwrap();
        assert_eq!(line.lower, StateKey::new(1, 0, true).unwrap());
        assert_eq!(line.upper, StateKey::new(2, 1, false).unwrap());
        assert_eq!(line.to_string(), "K1-L2");
        assert!("K1".parse::<XrayLine>().is_err());
        assert!("K1-L2-M3".parse::<XrayLine>().is_err());
    }

    #[test]
    fn state_key_rejects_invalid_numbers() {
        assert!(StateKey::new(0, 0, true).is_err());
        assert!(StateKey::new(2, 2, true).is_err());
        assert_eq!(StateKey::new(3, 1, true).unwrap().nodes(), 1);
    }
}
