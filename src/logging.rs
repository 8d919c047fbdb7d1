//! Global `tracing` subscriber for the binary.
//!
//! Filter from `RUST_LOG`, `info` when unset. The `tracing_json` feature
//! switches to JSON lines, `tracing_noansi` disables colours.

use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the subscriber. `verbose` raises the default level to `debug`
/// when `RUST_LOG` is not set.
pub fn setup_tracing(verbose: bool) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let filter = if verbose && std::env::var_os("RUST_LOG").is_none() {
        EnvFilter::new("debug")
    } else {
        env_filter()
    };

    if cfg!(feature = "tracing_json") {
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish();
        return tracing::subscriber::set_global_default(subscriber);
    }

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(!cfg!(feature = "tracing_noansi"))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_is_info() {
        if std::env::var_os("RUST_LOG").is_none() {
            assert_eq!(env_filter().to_string(), "info");
        }
    }
}
