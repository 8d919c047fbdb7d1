#[path = "mailprobe-cli/args.rs"]
mod args;
#[path = "mailprobe-cli/output.rs"]
mod output;

use std::io::{self, BufRead};
use std::sync::Arc;

use anyhow::{Context, Result};
use mailprobe_lib::logging::setup_tracing;
use mailprobe_lib::{ProbeContext, RateLimitOptions, Verifier, guesses_for_name};
use tracing::debug;

use crate::args::{Cli, Commands};

// codes de sortie : 0 trouvé/délivrable, 2 rien de confirmé, 1 fatal
const EXIT_UNCONFIRMED: i32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(err) = dotenv::dotenv() {
        // pas de .env : configuration par l'environnement uniquement
        if !err.not_found() {
            eprintln!("ignoring .env: {err}");
        }
    }
    let cli = Cli::parse();
    setup_tracing(cli.verbose).context("install tracing subscriber")?;

    match &cli.cmd {
        Commands::Guesses { name, domain } => {
            let guesses = guesses_for_name(name, domain, cli.probe.strategy)?;
            output::write_guesses(&guesses, &cli)?;
        }
        Commands::Find { name, domain } => {
            let context = ProbeContext::new(cli.probe.throttle_options(), RateLimitOptions::default());
            let verifier = Verifier::from_system(
                cli.probe.verifier_options(),
                cli.probe.smtp_options(),
                Arc::clone(&context.throttle),
            )?;
            let report = verifier.find(name, domain).await?;
            output::write_find(&report, &cli)?;
            if report.found().is_none() {
                std::process::exit(EXIT_UNCONFIRMED);
            }
        }
        Commands::Validate { emails, stdin } => {
            let mut addresses = emails.clone();
            if *stdin {
                for line in io::stdin().lock().lines() {
                    let line = line.context("read stdin")?;
                    if !line.trim().is_empty() {
                        addresses.push(line);
                    }
                }
            }
            if addresses.is_empty() {
                anyhow::bail!("no address given (pass EMAIL arguments or --stdin)");
            }

            let context = ProbeContext::new(cli.probe.throttle_options(), RateLimitOptions::default());
            let verifier = Verifier::from_system(
                cli.probe.verifier_options(),
                cli.probe.smtp_options(),
                Arc::clone(&context.throttle),
            )?;
            let mut rows = Vec::with_capacity(addresses.len());
            for address in &addresses {
                debug!(%address, "validating");
                rows.push(verifier.validate(address).await);
            }
            output::write_verdicts(&rows, &cli)?;
            if rows.iter().any(|row| !row.is_deliverable()) {
                std::process::exit(EXIT_UNCONFIRMED);
            }
        }
        #[cfg(feature = "with-http")]
        Commands::Serve {
            bind,
            rate_limit,
            rate_window_secs,
        } => {
            serve::run(&cli, *bind, *rate_limit, *rate_window_secs).await?;
        }
    }
    Ok(())
}

#[cfg(feature = "with-http")]
mod serve {
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::{Context, Result};
    use mailprobe_lib::http::{AppState, build_app, serve};
    use mailprobe_lib::{ProbeContext, RateLimitOptions, Verifier};
    use tokio::net::TcpListener;
    use tracing::{debug, info};

    use crate::args::Cli;

    const PURGE_EVERY: Duration = Duration::from_secs(300);

    pub async fn run(cli: &Cli, bind: SocketAddr, limit: u32, window_secs: u64) -> Result<()> {
        let context = ProbeContext::new(
            cli.probe.throttle_options(),
            RateLimitOptions { limit, window_secs },
        );
        let verifier = Verifier::from_system(
            cli.probe.verifier_options(),
            cli.probe.smtp_options(),
            Arc::clone(&context.throttle),
        )?;

        let limiter = Arc::clone(&context.limiter);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(PURGE_EVERY);
            loop {
                ticker.tick().await;
                let dropped = limiter.purge_expired(tokio::time::Instant::now());
                debug!(dropped, "rate limit entries purged");
            }
        });

        let app = build_app(AppState::new(Arc::new(verifier), Arc::clone(&context.limiter)));
        let listener = TcpListener::bind(bind)
            .await
            .with_context(|| format!("bind {bind}"))?;
        serve(listener, app, async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await
        .context("HTTP service failed")
    }
}
