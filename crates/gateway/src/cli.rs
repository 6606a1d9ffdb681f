//! Command-line and environment configuration.

use clap::{Parser, ValueEnum};

#[derive(Parser)]
#[command(name = "Mapdart", version, about, author)]
pub struct Cli {
    /// Port to serve on.
    #[arg(short, long, env = "MAPDART_PORT", default_value_t = 8085)]
    pub port: u16,

    /// Seconds per round half-cycle: the guess window, and the pause after
    /// a reveal before the next target.
    #[arg(long, env = "MAPDART_ROUND_SECS", default_value_t = 5)]
    pub round_secs: u64,

    /// Catalog shuffle seed; a fixed seed reproduces the target order.
    #[arg(long, env = "MAPDART_SEED", default_value_t = 0)]
    pub seed: u64,

    /// Log verbosity.
    #[arg(long, env = "MAPDART_LOG", value_enum, default_value_t = LoggingLevel::Info)]
    pub log_level: LoggingLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LoggingLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LoggingLevel {
    pub fn as_tracing(self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }
}

pub fn get_settings() -> Cli {
    Cli::parse()
}
