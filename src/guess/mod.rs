//! Candidate local-part generation from a human name.
//!
//! The public entry point is [`generate_guesses`]; [`guesses_for_name`] runs
//! the name normalizer first.

mod types;

pub use types::{GuessError, GuessSet, GuessStrategy};

use crate::names::{NameTokens, normalize_name};
use crate::validator::{CandidateAddress, check_local, is_valid_domain, normalize_domain};

/// Normalizes `name` then generates the ranked guesses for `domain`.
pub fn guesses_for_name(
    name: &str,
    domain: &str,
    strategy: GuessStrategy,
) -> Result<GuessSet, GuessError> {
    generate_guesses(&normalize_name(name), domain, strategy)
}

pub fn generate_guesses(
    tokens: &NameTokens,
    domain: &str,
    strategy: GuessStrategy,
) -> Result<GuessSet, GuessError> {
    if !is_valid_domain(domain) {
        return Err(GuessError::InvalidDomain(domain.trim().to_string()));
    }
    let (domain, _) = normalize_domain(domain);

    let mut set = GuessSet::new();
    if !tokens.is_sufficient() {
        return Ok(set);
    }

    let locals = match strategy {
        GuessStrategy::Basic => basic_locals(tokens.as_slice()),
        GuessStrategy::Smart => smart_locals(tokens.as_slice()),
    };

    // les tokens exotiques (parenthèses, '@', ...) sont simplement ignorés
    for local in locals.iter().filter(|local| check_local(local).is_ok()) {
        if let Ok(candidate) = CandidateAddress::new(local, &domain) {
            set.push(candidate);
        }
    }
    Ok(set)
}

fn initial(token: &str) -> &str {
    token
        .char_indices()
        .nth(1)
        .map(|(idx, _)| &token[..idx])
        .unwrap_or(token)
}

fn basic_locals(tokens: &[String]) -> Vec<String> {
    let split = tokens.len().div_ceil(2);
    let (firsts, lasts) = tokens.split_at(split);

    let mut out = Vec::with_capacity(firsts.len() * lasts.len() * 9);
    for first in firsts {
        for last in lasts {
            let f = initial(first);
            let l = initial(last);
            out.push(first.clone());
            out.push(last.clone());
            out.push(format!("{first}.{last}"));
            out.push(format!("{last}.{first}"));
            out.push(format!("{first}{last}"));
            out.push(format!("{last}{first}"));
            out.push(format!("{f}.{last}"));
            out.push(format!("{f}{last}"));
            out.push(format!("{f}{l}"));
        }
    }
    out
}

fn smart_locals(tokens: &[String]) -> Vec<String> {
    let first = tokens[0].as_str();
    let last = tokens[1..].concat();
    let f = initial(first);
    let l = initial(&last);

    vec![
        format!("{first}.{last}"),
        first.to_string(),
        format!("{f}{last}"),
        format!("{first}{last}"),
        format!("{f}.{last}"),
        format!("{first}_{last}"),
        last.clone(),
        format!("{last}.{first}"),
        format!("{last}{first}"),
        format!("{first}{l}"),
        format!("{first}.{l}"),
        format!("{first}-{last}"),
        format!("{last}{f}"),
        format!("{first}.{last}1"),
        format!("{first}{last}1"),
    ]
}

#[cfg(test)]
mod tests;
