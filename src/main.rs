use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use clap::Parser;
use log::{error, info};

use ocp_demo_app::config::AppConfig;
use ocp_demo_app::logging;
use ocp_demo_app::metrics::MetricsRegistry;
use ocp_demo_app::routes::{self, AppState};

#[derive(Parser, Debug)]
#[command(
    name = "ocp-demo-app",
    version,
    about = "HPA demo service: CPU burn, pod info and health probes"
)]
struct Cli {
    /// TOML config file with [app] and [server] sections
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind, overrides config and SERVER_HOST
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, overrides config and SERVER_PORT
    #[arg(short, long)]
    port: Option<u16>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();
    logging::setup_logger(cli.verbose);

    let mut config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let metrics = Arc::new(MetricsRegistry::new());
    let state = web::Data::new(AppState::new(config.app.clone(), metrics));

    let (host, port) = config.bind_address();
    info!(
        "Starting ocp-demo-app {} ({}) on {}:{}",
        config.app.version, config.app.colour, host, port
    );

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(routes::configure)
    });
    if let Some(workers) = config.server.workers {
        server = server.workers(workers);
    }

    server.bind((host, port))?.run().await
}
