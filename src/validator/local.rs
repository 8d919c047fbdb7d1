//! Local-part rules: a dot-atom of RFC 5322 `atext`, at most 64 octets.
//! Quoted local parts are never produced by the guess generator and are
//! refused here.

use std::fmt;

use phf::phf_set;

pub(crate) const MAX_LOCAL_OCTETS: usize = 64;

static ATEXT_SPECIALS: phf::Set<char> = phf_set! {
    '!', '#', '$', '%', '&', '\'', '*', '+', '-', '/', '=', '?', '^', '_', '`',
    '{', '|', '}', '~',
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LocalIssue {
    Empty,
    TooLong(usize),
    EdgeDot,
    DoubleDot,
    Forbidden(char),
}

impl fmt::Display for LocalIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("local part is empty"),
            Self::TooLong(len) => write!(f, "local part length {len} > {MAX_LOCAL_OCTETS}"),
            Self::EdgeDot => f.write_str("local part starts or ends with '.'"),
            Self::DoubleDot => f.write_str("local part contains '..'"),
            Self::Forbidden(c) => write!(f, "character {c:?} not allowed in local part"),
        }
    }
}

/// First rule `local` breaks. Cheap enough to filter guesses before they are
/// turned into addresses.
pub(crate) fn check_local(local: &str) -> Result<(), LocalIssue> {
    if local.is_empty() {
        return Err(LocalIssue::Empty);
    }
    if local.len() > MAX_LOCAL_OCTETS {
        return Err(LocalIssue::TooLong(local.len()));
    }
    if local.starts_with('.') || local.ends_with('.') {
        return Err(LocalIssue::EdgeDot);
    }
    if local.contains("..") {
        return Err(LocalIssue::DoubleDot);
    }
    match local.chars().find(|&c| c != '.' && !is_atext(c)) {
        Some(c) => Err(LocalIssue::Forbidden(c)),
        None => Ok(()),
    }
}

fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric() || ATEXT_SPECIALS.contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dots_only_between_atoms() {
        assert_eq!(check_local(".abc"), Err(LocalIssue::EdgeDot));
        assert_eq!(check_local("abc."), Err(LocalIssue::EdgeDot));
        assert_eq!(check_local("a..b"), Err(LocalIssue::DoubleDot));
        assert_eq!(check_local("mario.rosa"), Ok(()));
    }

    #[test]
    fn length_is_bounded() {
        assert_eq!(check_local(""), Err(LocalIssue::Empty));
        assert_eq!(check_local(&"a".repeat(64)), Ok(()));
        assert_eq!(check_local(&"a".repeat(65)), Err(LocalIssue::TooLong(65)));
    }

    #[test]
    fn only_ascii_atext() {
        assert_eq!(check_local("o'neil"), Ok(()));
        assert_eq!(check_local("mario_rosa+news"), Ok(()));
        assert_eq!(check_local("mario rosa"), Err(LocalIssue::Forbidden(' ')));
        assert_eq!(check_local("иван"), Err(LocalIssue::Forbidden('и')));
        assert_eq!(check_local("\"a b\""), Err(LocalIssue::Forbidden('"')));
    }
}
