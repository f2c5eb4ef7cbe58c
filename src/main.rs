use mango_gateway::config::{Args, GatewayConfig};
use mango_gateway::server::{self, AppState};

use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{web, App, HttpServer};
use clap::Parser as _;

use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::prelude::*;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let (writer, _guard) = tracing_appender::non_blocking(std::io::stdout());

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(writer).compact())
        .with(filter)
        .init();

    let config = GatewayConfig::from(Args::parse());

    let state = match AppState::from_config(&config) {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            tracing::error!("failed to build the upstream client: {e}");
            return Err(std::io::Error::other(e));
        }
    };

    tracing::info!(
        api = %config.api_base_url,
        covers = %config.cover_base_url,
        relay_hosts = ?config.relay_allowed_hosts,
        "starting gateway on {}:{}",
        config.host,
        config.port
    );

    if config.relay_allowed_hosts.is_empty() {
        tracing::warn!("image relay allow-list is empty, any host can be fetched through the gateway");
    }

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(DefaultHeaders::new().add(("Access-Control-Allow-Origin", "*")))
            .app_data(state.clone())
            .configure(server::configure)
    })
    .bind(config.bind_address())?
    .run()
    .await
}
