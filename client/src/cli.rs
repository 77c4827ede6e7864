use clap::Parser;
use std::path::PathBuf;

use crate::api::PayloadSource;
use crate::sink::{PngFile, RawFrame, Sink};

#[derive(Debug, Parser)]
#[command(about = "Render the dashboard frame.")]
pub struct Cli {
    /// Aggregation endpoint.
    #[arg(long, env = "API_URL", default_value = "http://localhost:3000/display")]
    pub api_url: String,

    #[arg(long, env = "API_KEY")]
    pub api_key: Option<String>,

    /// Render a payload read from this JSON file instead of fetching it.
    #[arg(long)]
    pub payload: Option<PathBuf>,

    #[arg(long, env = "DASHBOARD_OUTPUT", default_value = "/tmp/dump.png")]
    pub output: PathBuf,

    /// Also write the packed frame buffer here.
    #[arg(long)]
    pub raw: Option<PathBuf>,
}

impl Cli {
    pub fn payload_source(&self) -> PayloadSource {
        match &self.payload {
            Some(path) => PayloadSource::File(path.clone()),
            None => PayloadSource::Api {
                url: self.api_url.clone(),
                api_key: self.api_key.clone().filter(|key| !key.is_empty()),
            },
        }
    }

    pub fn sinks(&self) -> Vec<Box<dyn Sink>> {
        let mut sinks: Vec<Box<dyn Sink>> = vec![Box::new(PngFile {
            path: self.output.clone(),
        })];
        if let Some(path) = &self.raw {
            sinks.push(Box::new(RawFrame { path: path.clone() }));
        }
        sinks
    }
}
