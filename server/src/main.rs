use clap::Parser;
use cli::{Cli, Command};
use config::Config;
use std::net::SocketAddr;

mod aggregate;
mod cli;
mod config;
mod normalize;
mod server;
mod sources;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Cli::parse();
    let config = Config::from_env()?;

    match args.cmd {
        Command::Http { port } => server::run(SocketAddr::from(([0, 0, 0, 0], port)), config).await,
        Command::Snapshot => {
            let sources = sources::Sources::new()?;
            let payload = aggregate::snapshot(&sources, &config).await;
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
    }
}
