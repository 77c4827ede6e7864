use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(about = "Dashboard data server.")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the aggregated payload over HTTP.
    Http {
        #[arg(env = "PORT", long, default_value_t = 3000)]
        port: u16,
    },
    /// Fetch every source once and print the payload.
    Snapshot,
}
