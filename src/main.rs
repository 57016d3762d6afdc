use std::{error::Error, path::PathBuf, process::ExitCode, sync::Arc};

use clap::Parser;
use log::{error, info};

use dockyard::{
    config::ServerConfig, health::HealthCheckRegistry, server::environment::Environment,
    ServerAssembler,
};

#[derive(Parser)]
#[command(
    name = "dockyard",
    about = "dockyard - configuration-driven HTTP server assembly",
    long_about = r#"
dockyard - configuration-driven HTTP server assembly

Loads a server configuration, assembles it and prints the resulting
listener topology and chain bindings. Nothing is bound.

Usage:
    dockyard [OPTIONS]

Options:
    -h, --help       Print help information
    -V, --version    Print version information
    -c, --config     <CONFIG>
                     Config file to use
    -n, --name       <NAME>
                     Service name
"#
)]
struct Args {
    #[arg(short, long, required = false, help = "Config file to use.")]
    config: Option<PathBuf>,

    #[arg(short, long, default_value = "dockyard", help = "Service name.")]
    name: String,
}

fn run() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => {
            info!("No config file given, using defaults");
            ServerConfig::default()
        }
    };

    let registry = Arc::new(HealthCheckRegistry::new());
    let server = ServerAssembler::new(registry).assemble(&config, Environment::new(&args.name))?;

    info!("Assembled {:?} mode server", server.mode());
    for listener in server.listeners() {
        info!(
            "  listener {:<8} {}:{} {}{}",
            listener.name(),
            listener
                .host()
                .unwrap_or("*"),
            listener.port(),
            listener
                .transport()
                .transport_type(),
            if listener.is_secure() { " (tls)" } else { "" }
        );
    }
    for chain in server.chains() {
        info!(
            "  chain    {:<8} {} on [{}] {:?}",
            chain.name(),
            chain.context_path(),
            chain
                .listeners()
                .join(", "),
            chain.layers()
        );
    }
    info!(
        "  pool     {} {}..{} threads, graceful shutdown {:?}",
        server
            .thread_pool()
            .name(),
        server
            .thread_pool()
            .min_threads(),
        server
            .thread_pool()
            .max_threads(),
        server
            .shutdown_policy()
            .graceful_timeout()
    );

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
