//! Named column ranges of the input, state and output vectors.

use std::ops::Range;

/// Input holding vertex displacements.
pub const ZETA: &str = "zeta";
/// Input holding vertex velocities.
pub const ZETA_DOT: &str = "zeta_dot";
/// Input holding external (gust) velocities.
pub const U_GUST: &str = "u_gust";
pub const GAMMA: &str = "gamma";
pub const GAMMA_W: &str = "gamma_w";
/// `dt` times the circulation rate.
pub const DTGAMMA_DOT: &str = "dtgamma_dot";
pub const GAMMA_M1: &str = "gamma_m1";
pub const FORCES: &str = "forces";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub range: Range<usize>,
}

/// Ordered, contiguous set of named variables.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VariableMap {
    vars: Vec<Variable>,
}

impl VariableMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a variable of `len` entries after the existing ones.
    pub fn push(&mut self, name: &str, len: usize) -> &mut Self {
        let start = self.len();
        self.vars.push(Variable {
            name: name.to_string(),
            range: start..start + len,
        });
        self
    }

    pub fn with(mut self, name: &str, len: usize) -> Self {
        self.push(name, len);
        self
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.vars.last().map_or(0, |v| v.range.end)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.vars.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.vars.iter().map(|v| v.name.as_str()).collect()
    }

    pub fn range(&self, name: &str) -> Option<Range<usize>> {
        self.vars
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.range.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.range(name).is_some()
    }

    /// Drop the named variables. Returns the trimmed map and the kept
    /// indices of the original vector, in order. Unknown names are ignored.
    pub fn without(&self, names: &[&str]) -> (VariableMap, Vec<usize>) {
        let mut out = VariableMap::new();
        let mut kept = Vec::new();
        for v in &self.vars {
            if names.contains(&v.name.as_str()) {
                continue;
            }
            out.push(&v.name, v.range.len());
            kept.extend(v.range.clone());
        }
        (out, kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_are_contiguous() {
        let map = VariableMap::new().with(ZETA, 6).with(ZETA_DOT, 6).with(U_GUST, 6);
        assert_eq!(map.len(), 18);
        assert_eq!(map.range(ZETA_DOT), Some(6..12));
        assert_eq!(map.range(FORCES), None);
        assert_eq!(map.names(), vec![ZETA, ZETA_DOT, U_GUST]);
    }

    #[test]
    fn without_reindexes_remaining_variables() {
        let map = VariableMap::new().with(ZETA, 2).with(ZETA_DOT, 3).with(U_GUST, 1);
        let (trimmed, kept) = map.without(&[ZETA_DOT]);
        assert_eq!(kept, vec![0, 1, 5]);
        assert_eq!(trimmed.range(U_GUST), Some(2..3));
        assert!(!trimmed.contains(ZETA_DOT));
    }
}
