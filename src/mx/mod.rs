//! DNS MX resolution.
//!
//! [`resolve_mx`] works against any [`LookupMx`] implementation;
//! [`system_resolver`] builds the production one.

mod error;
mod resolver;
mod types;

pub use error::MxError as Error;
pub use resolver::{LookupMx, resolve_mx, system_resolver};
pub use types::MxRecord;

#[cfg(test)]
pub(crate) mod tests;
