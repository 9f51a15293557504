use std::sync::Arc;

use clap::Parser;
use fire_projection::api::{AppState, run_http_server};
use fire_projection::cli::{self, Cli, Command};
use fire_projection::store::InMemoryProfileStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_filter);

    let result = match cli.command {
        Command::Serve(config) => {
            let state = AppState::new(Arc::new(InMemoryProfileStore::new()))
                .with_start_year(config.start_year);
            run_http_server(&config, state)
                .await
                .map_err(|e| format!("Server error: {e}"))
        }
        Command::Project(args) => cli::run_project(&args).map(|json| println!("{json}")),
        Command::Solve(args) => cli::run_solve(&args).map(|json| println!("{json}")),
    };

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
