use std::collections::HashSet;
use std::str::FromStr;

use thiserror::Error;

use crate::validator::CandidateAddress;

/// Which pattern family feeds the orchestrator.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuessStrategy {
    /// Every first/last token pair, nine patterns per pair.
    #[default]
    Basic,
    /// One first/last split and a fixed priority list.
    Smart,
}

impl FromStr for GuessStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "smart" => Ok(Self::Smart),
            other => Err(format!("unknown guess strategy '{other}' (basic|smart)")),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GuessError {
    #[error("invalid domain '{0}'")]
    InvalidDomain(String),
}

/// Ranked candidate list. Insertion order is the likelihood ranking and an
/// address is only ever stored once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuessSet {
    ordered: Vec<CandidateAddress>,
    seen: HashSet<String>,
}

impl GuessSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the address was already present.
    pub fn push(&mut self, candidate: CandidateAddress) -> bool {
        if !self.seen.insert(candidate.to_string()) {
            return false;
        }
        self.ordered.push(candidate);
        true
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CandidateAddress> {
        self.ordered.iter()
    }

    pub fn addresses(&self) -> Vec<String> {
        self.ordered.iter().map(ToString::to_string).collect()
    }

    pub fn into_vec(self) -> Vec<CandidateAddress> {
        self.ordered
    }
}

impl<'a> IntoIterator for &'a GuessSet {
    type Item = &'a CandidateAddress;
    type IntoIter = std::slice::Iter<'a, CandidateAddress>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
