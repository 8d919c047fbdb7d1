use clap::{Args, Parser, Subcommand};
#[cfg(feature = "with-http")]
use std::net::SocketAddr;

use mailprobe_lib::finder::HostSelection;
use mailprobe_lib::{
    GuessStrategy, ProbeDepth, SmtpProbeOptions, ThrottleOptions, VerifierOptions,
};

#[derive(Parser)]
#[command(name = "mailprobe-cli", version, about = "Find and verify email addresses")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,

    /// format: human|json|ndjson|csv
    #[arg(long, global = true, env = "MAILPROBE_FORMAT", default_value = "human")]
    pub format: String,

    /// écrit le rapport dans un fichier (tous formats, écriture atomique)
    #[arg(long, global = true)]
    pub out: Option<String>,

    /// logs en debug quand RUST_LOG n'est pas défini
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub probe: ProbeArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Guess and verify the address of a person at a domain
    Find {
        #[arg(long)]
        name: String,
        #[arg(long)]
        domain: String,
    },
    /// Verify one or more addresses
    Validate {
        emails: Vec<String>,
        /// lit des adresses depuis stdin (une par ligne)
        #[arg(long)]
        stdin: bool,
    },
    /// Print the ranked guesses without any network access
    Guesses {
        #[arg(long)]
        name: String,
        #[arg(long)]
        domain: String,
    },
    /// Run the HTTP API
    #[cfg(feature = "with-http")]
    Serve {
        #[arg(long, env = "MAILPROBE_BIND", default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
        /// requests per client and window
        #[arg(long, env = "MAILPROBE_RATE_LIMIT", default_value_t = 10)]
        rate_limit: u32,
        #[arg(long, env = "MAILPROBE_RATE_WINDOW_SECS", default_value_t = 3_600)]
        rate_window_secs: u64,
    },
}

#[derive(Args)]
pub struct ProbeArgs {
    /// nom annoncé en EHLO/HELO (par défaut le domaine destinataire)
    #[arg(long, global = true, env = "MAILPROBE_HELO")]
    pub helo: Option<String>,

    /// annonce un nom d'hôte aléatoire à chaque sonde
    #[arg(long, global = true, env = "MAILPROBE_RANDOMIZE_HELO")]
    pub randomize_helo: bool,

    /// partie locale de MAIL FROM, vide pour <>
    #[arg(long, global = true, env = "MAILPROBE_FROM_LOCAL", default_value = "postmaster")]
    pub from_local: String,

    #[arg(long, global = true, env = "MAILPROBE_PORT", default_value_t = 25)]
    pub port: u16,

    #[arg(long = "connect-timeout", global = true, env = "MAILPROBE_CONNECT_TIMEOUT_MS", default_value_t = 5_000)]
    pub connect_timeout_ms: u64,

    #[arg(long = "command-timeout", global = true, env = "MAILPROBE_COMMAND_TIMEOUT_MS", default_value_t = 5_000)]
    pub command_timeout_ms: u64,

    #[arg(long = "probe-timeout", global = true, env = "MAILPROBE_PROBE_TIMEOUT_MS", default_value_t = 12_000)]
    pub probe_timeout_ms: u64,

    /// adresses aléatoires testées pour détecter un catch-all (max 3)
    #[arg(long, global = true, env = "MAILPROBE_CATCHALL_PROBES", default_value_t = 0)]
    pub catchall_probes: u8,

    /// basic|smart
    #[arg(long, global = true, env = "MAILPROBE_STRATEGY", default_value = "basic")]
    pub strategy: GuessStrategy,

    /// MX lookup only, no SMTP
    #[arg(long, global = true, env = "MAILPROBE_DNS_ONLY")]
    pub dns_only: bool,

    /// primary|random
    #[arg(long = "hosts", global = true, env = "MAILPROBE_HOST_SELECTION", default_value = "primary")]
    pub host_selection: HostSelection,

    #[arg(long, global = true, env = "MAILPROBE_MAX_HOSTS", default_value_t = 2)]
    pub max_hosts: usize,

    /// no random pause between candidates
    #[arg(long, global = true, env = "MAILPROBE_NO_JITTER")]
    pub no_jitter: bool,

    #[arg(long, global = true, env = "MAILPROBE_BASE_DELAY_MS", default_value_t = 1_000)]
    pub base_delay_ms: u64,

    #[arg(long, global = true, env = "MAILPROBE_MAX_DELAY_MS", default_value_t = 30_000)]
    pub max_delay_ms: u64,

    #[arg(long, global = true, env = "MAILPROBE_BLOCK_THRESHOLD", default_value_t = 5)]
    pub block_threshold: u32,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

impl ProbeArgs {
    pub fn smtp_options(&self) -> SmtpProbeOptions {
        SmtpProbeOptions {
            port: self.port,
            helo_domain: self.helo.clone().unwrap_or_default(),
            randomize_helo: self.randomize_helo,
            mail_from_local: self.from_local.clone(),
            connect_timeout_ms: self.connect_timeout_ms,
            command_timeout_ms: self.command_timeout_ms,
            probe_timeout_ms: self.probe_timeout_ms,
            catchall_probes: self.catchall_probes,
        }
    }

    pub fn verifier_options(&self) -> VerifierOptions {
        let defaults = VerifierOptions::default();
        VerifierOptions {
            guess_strategy: self.strategy,
            probe_depth: if self.dns_only {
                ProbeDepth::DnsOnly
            } else {
                ProbeDepth::DnsAndSmtp
            },
            host_selection: self.host_selection,
            max_hosts: self.max_hosts,
            inter_probe_delay_ms: if self.no_jitter {
                None
            } else {
                defaults.inter_probe_delay_ms
            },
        }
    }

    pub fn throttle_options(&self) -> ThrottleOptions {
        ThrottleOptions {
            base_delay_ms: self.base_delay_ms,
            max_delay_ms: self.max_delay_ms,
            block_threshold: self.block_threshold,
        }
    }
}
