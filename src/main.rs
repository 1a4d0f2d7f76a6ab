use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::time::Duration;

use sharkstats::api::{routes, AppState};
use sharkstats::models::config::AppConfig;
use sharkstats::utils::logging;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Per-protocol traffic statistics for uploaded packet captures")]
struct Args {
    /// Address to bind the HTTP server to
    #[clap(long, default_value = "0.0.0.0")]
    host: String,

    /// Port for the REST API server
    #[clap(short, long, default_value = "5000")]
    port: u16,

    /// Path to the tshark binary
    #[clap(long, default_value = "tshark")]
    tshark: PathBuf,

    /// Kill tshark if a single analysis runs longer than this many seconds
    #[clap(long)]
    timeout_secs: Option<u64>,

    /// Directory to stage uploaded captures in (defaults to the system temp dir)
    #[clap(long)]
    upload_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[clap(long, default_value = "info")]
    log_level: String,

    /// Debug mode, raises logging to at least debug
    #[clap(short, long)]
    debug: bool,
}

#[actix_web::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger with specified level
    logging::init_logger(logging::get_log_level(&args.log_level, args.debug));

    info!("Starting sharkstats v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig {
        host: args.host,
        port: args.port,
        tshark_path: args.tshark,
        tool_timeout: args.timeout_secs.map(Duration::from_secs),
        upload_dir: args.upload_dir,
    };

    let state = AppState::new(config.clone());

    // Report early; requests still preflight on their own
    let tshark = state.analyzer.tshark();
    match tshark.version() {
        Ok(version) => info!("Using {} ({})", tshark.program().display(), version),
        Err(e) => warn!(
            "{} ({}); /analyze will fail until it is installed",
            e,
            tshark.program().display()
        ),
    }

    if config.tool_timeout.is_none() {
        info!("No decoder timeout configured, analyses run until tshark exits");
    }

    let app_state = web::Data::new(state);

    info!("Starting sharkstats API server on {}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .app_data(app_state.clone())
            .configure(routes::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
