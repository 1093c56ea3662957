mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;
mod utils;

use actix_files::Files;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::error::AppError;
use crate::middleware::cors;
use crate::services::photo_store::PhotoStore;
use crate::utils::jwt::JwtKeys;

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,petmatch_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(origins = ?config.cors_allow_origins, "Configuration loaded");

    tracing::info!("Connecting to database...");
    let db = db::establish_connection(&config.database_url).await?;
    db::create_schema(&db).await?;
    tracing::info!("Database ready");

    let keys = JwtKeys::from_config(&config);
    let store = PhotoStore::from_config(&config);
    store.ensure_media_dir().await?;

    let address = config.server_address();
    tracing::info!("Starting server on http://{}", address);

    let config_data = web::Data::new(config);
    let db_data = web::Data::new(db);
    let keys_data = web::Data::new(keys);
    let store_data = web::Data::new(store);

    HttpServer::new(move || {
        let config = config_data.clone();
        App::new()
            .wrap(cors(&config.cors_allow_origins))
            .wrap(Logger::default())
            .app_data(config.clone())
            .app_data(db_data.clone())
            .app_data(keys_data.clone())
            .app_data(store_data.clone())
            .service(Files::new(&config.media_base_url, store_data.media_dir()))
            .configure(|cfg| routes::configure_routes(cfg, &config.api_prefix))
    })
    .bind(address)?
    .run()
    .await?;

    Ok(())
}
