mod handlers;
mod job;
mod server;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use gridleaser_client::agent::AgentConfig;
use gridleaser_client::compute::SyncCompute;
use gridleaser_client::coordinator::{ClientCoordinator, CoordinatorConfig};
use gridleaser_client::messages::CoordinatorEvent;
use gridleaser_client::storage::JsonFileStore;
use gridleaser_client::transport::Transport;
use gridleaser_client::transport_http::HttpTransport;

#[derive(Parser)]
#[command(
    name = "gridleaser",
    about = "Gridleaser — lease-based distributed batch computing",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the task server with the built-in range-search job
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3200")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Storage backend: "memory" or "sqlite:<path>"
        #[arg(long, default_value = "memory", env = "GRIDLEASER_STORAGE")]
        storage: String,

        /// Number of work units the search space splits into
        #[arg(long, default_value = "2048")]
        total: u64,

        /// Candidates scanned per unit
        #[arg(long, default_value = "1000")]
        step: u64,

        /// The square to find the root of
        #[arg(long, default_value = "1524155677489")]
        target: u64,

        /// Lease grace period in milliseconds
        #[arg(long, default_value = "60000")]
        ttl: u64,
    },

    /// Run a worker pool against a gridleaser server
    Work {
        /// Server base URL
        #[arg(long, default_value = "http://127.0.0.1:3200")]
        url: String,

        /// Compute agents in the pool
        #[arg(long, default_value = "2")]
        agents: usize,

        /// Results buffered locally before one flush
        #[arg(long, default_value = "1")]
        buffer: usize,

        /// Durable state file shared by worker instances on this machine
        #[arg(long, default_value = "gridleaser-state.json")]
        state: String,
    },

    /// Print version information
    Version,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            host,
            storage,
            total,
            step,
            target,
            ttl,
        } => {
            let job = job::RangeSearchJob {
                total,
                step,
                target,
                ttl_ms: ttl,
            };
            server::run(&host, port, &storage, job).await;
        }
        Commands::Work {
            url,
            agents,
            buffer,
            state,
        } => {
            run_worker(&url, agents, buffer, &state).await;
        }
        Commands::Version => {
            println!("gridleaser {}", env!("CARGO_PKG_VERSION"));
            println!("Lease-based batch computing over untrusted volunteer workers");
        }
    }
}

async fn run_worker(url: &str, agents: usize, buffer: usize, state_path: &str) {
    let transport = match HttpTransport::new(url, Duration::from_secs(5)) {
        Ok(transport) => Arc::new(transport),
        Err(err) => {
            tracing::error!(error = %err, "invalid server URL or client setup");
            return;
        }
    };

    if let Err(err) = transport.login().await {
        tracing::error!(error = %err, "login failed");
        return;
    }
    tracing::info!(url, agents, "logged in; starting worker pool");

    let config = CoordinatorConfig {
        agents,
        agent: AgentConfig {
            max_buffer: buffer,
            ..AgentConfig::default()
        },
        ..CoordinatorConfig::default()
    };

    let handle = ClientCoordinator::spawn(
        transport,
        Arc::new(SyncCompute(job::range_search)),
        JsonFileStore::new(state_path),
        JsonFileStore::new(state_path),
        config,
    );
    let mut events = handle.events();

    loop {
        match events.recv().await {
            Ok(CoordinatorEvent::Unlocked) => tracing::info!("this instance is active"),
            Ok(CoordinatorEvent::Locked) => {
                tracing::info!("another instance is active; standing by")
            }
            Ok(CoordinatorEvent::NoTasks) => {
                tracing::info!("no more work available; shutting down");
                break;
            }
            Ok(CoordinatorEvent::Unauthorized) => {
                tracing::error!("server rejected the session; shutting down");
                break;
            }
            Err(_) => break,
        }
    }

    handle.shutdown().await;
}
