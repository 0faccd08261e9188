//! Tallyframe node binary.
//!
//! # Usage
//!
//! ```bash
//! # Start responders first; each waits for the coordinator
//! tallyframe-node responder --listen 127.0.0.1:7101 --dataset r1.json
//! tallyframe-node responder --listen 127.0.0.1:7102 --dataset r2.json
//!
//! # Coordinator dials responders in the given order, then waits for a requester
//! tallyframe-node coordinator --listen 127.0.0.1:7000 \
//!     --responder 127.0.0.1:7101 --responder 127.0.0.1:7102 --dataset local.json
//!
//! # Send commands; replies are written to stdout as JSON lines
//! tallyframe-node request --coordinator 127.0.0.1:7000 give:9000:90 query:9050 terminate
//! ```

use std::{
    io::{self, Write},
    net::SocketAddr,
    path::PathBuf,
};

use clap::{Parser, Subcommand};
use tallyframe_core::{CoordinatorConfig, WireConfig, config::DEFAULT_REQUEST_BUDGET};
use tallyframe_server::{
    CoordinatorNodeConfig, NodeConfig, NodeError, RequestCommand, RequestConfig,
    ResponderNodeConfig, amount_width, run_coordinator, run_request, run_responder,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Tallyframe balance node
#[derive(Parser, Debug)]
#[command(name = "tallyframe-node")]
#[command(about = "Tallyframe coordinator, responder and requester")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// GIVE amount width in bytes (3 or 4)
    #[arg(long, default_value_t = 4, global = true)]
    amount_width: u8,

    #[command(subcommand)]
    role: Role,
}

#[derive(Subcommand, Debug)]
enum Role {
    /// Run the primary node
    Coordinator {
        /// Address the requester connects to
        #[arg(short, long, default_value = "127.0.0.1:7000")]
        listen: SocketAddr,

        /// Responder address; repeat in search order
        #[arg(short, long = "responder")]
        responders: Vec<SocketAddr>,

        /// Initial local records (JSON)
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Requests served before shutting down
        #[arg(long, default_value_t = DEFAULT_REQUEST_BUDGET)]
        budget: usize,

        /// Always query every remote instead of skipping predicted misses
        #[arg(long)]
        no_predictor: bool,
    },

    /// Run a remote store node
    Responder {
        /// Address the coordinator connects to
        #[arg(short, long, default_value = "127.0.0.1:7100")]
        listen: SocketAddr,

        /// Initial records (JSON)
        #[arg(short, long)]
        dataset: Option<PathBuf>,
    },

    /// Send commands to a coordinator
    Request {
        /// Coordinator address
        #[arg(short, long, default_value = "127.0.0.1:7000")]
        coordinator: SocketAddr,

        /// Commands: query:ID, give:ID:AMOUNT, find:ID, terminate
        #[arg(required = true)]
        commands: Vec<RequestCommand>,
    },
}

impl TryFrom<Args> for NodeConfig {
    type Error = NodeError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let wire = WireConfig { amount_width: amount_width(args.amount_width)? };

        Ok(match args.role {
            Role::Coordinator { listen, responders, dataset, budget, no_predictor } => {
                let core =
                    CoordinatorConfig { request_budget: budget, predictor: !no_predictor, wire };
                Self::Coordinator(CoordinatorNodeConfig { listen, responders, dataset, core })
            },
            Role::Responder { listen, dataset } => {
                Self::Responder(ResponderNodeConfig { listen, dataset })
            },
            Role::Request { coordinator, commands } => {
                Self::Request(RequestConfig { coordinator, commands, wire })
            },
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let config = NodeConfig::try_from(args)?;
    tracing::info!(role = config.role(), "tallyframe node starting");

    match config {
        NodeConfig::Coordinator(config) => {
            let stats = run_coordinator(&config)?;
            tracing::info!(?stats, "coordinator stopped");
        },
        NodeConfig::Responder(config) => {
            let stats = run_responder(&config)?;
            tracing::info!(?stats, "responder stopped");
        },
        NodeConfig::Request(config) => {
            let mut out = io::stdout().lock();
            for result in run_request(&config)? {
                serde_json::to_writer(&mut out, &result)?;
                writeln!(out)?;
            }
        },
    }

    Ok(())
}
