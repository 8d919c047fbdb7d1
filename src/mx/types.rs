use std::fmt;

/// One mail exchanger of a domain. Ordering is by preference, then host, so a
/// sorted list is the order in which exchangers should be tried.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MxRecord {
    pub preference: u16,
    /// Lowercased host name without the trailing root dot.
    pub exchange: String,
}

impl MxRecord {
    pub fn new(preference: u16, exchange: impl AsRef<str>) -> Self {
        Self {
            preference,
            exchange: exchange.as_ref().trim_end_matches('.').to_ascii_lowercase(),
        }
    }

    /// RFC 7505 null MX (`0 .`): the domain accepts no mail at all.
    pub fn is_null(&self) -> bool {
        self.exchange.is_empty()
    }
}

impl fmt::Display for MxRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>5} {}", self.preference, self.exchange)
    }
}
