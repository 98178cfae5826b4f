use crate::config::Config;
use crate::db::connection::{init_db, Database};
use crate::router::{handle, App};
use astra::Server;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod auth;
mod config;
mod db;
mod domain;
mod errors;
mod handlers;
mod rate_limit;
mod responses;
mod router;
mod spreadsheets;
mod templates;


fn main() {
    let config = Config::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = Database::new(config.database.clone());
    if let Err(e) = init_db(&db, &config.schema) {
        error!(error = %e, "database initialization failed");
        std::process::exit(1);
    }

    let app = App::new(db, &config);
    info!(addr = %config.addr, workers = config.workers, "starting server");

    let server = Server::bind(&config.addr).max_workers(config.workers);
    let result = server.serve(move |req, info: astra::ConnectionInfo| match handle(req, &app, info.peer_addr()) {
        Ok(resp) => resp,
        Err(err) => templates::html_error_response(err),
    });

    if let Err(e) = result {
        error!(error = %e, "server ended with error");
    }

    info!("server shut down");
}
