//! Command-line entry point.

use clap::Parser;

/// Distributed work queue over Redis Streams.
#[derive(Parser)]
#[command(name = "starq")]
#[command(about = "Distributed work queue over Redis Streams")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error). Overridden by `RUST_LOG`.
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Runs the HTTP control plane.
    Serve(ServeArgs),
}

#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address the HTTP listener binds to.
    #[arg(long, env = "STARQ_BIND_ADDR")]
    pub bind: Option<String>,

    /// Datastore connection string.
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,
}
