pub mod auth;
pub mod health;
pub mod matches;
pub mod messages;
pub mod pairs;
pub mod pets;
pub mod photos;

use actix_web::web;

use crate::error::AppError;

/// Monte toutes les routes: /healthz à la racine, le reste sous `api_prefix`
pub fn configure_routes(cfg: &mut web::ServiceConfig, api_prefix: &str) {
    // Corps JSON ou query string mal formés -> 422 au format {"error": ...}
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::Unprocessable(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::Unprocessable(err.to_string()).into()),
    )
    .service(health::health_check)
    .service(
        web::scope(api_prefix)
            .configure(auth::configure)
            // Avant le scope /pets, qui capturerait /pets/{id}/photos
            .configure(photos::configure)
            .configure(pets::configure)
            .configure(matches::configure)
            .configure(pairs::configure)
            .configure(messages::configure),
    );
}
