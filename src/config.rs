// Configuration de l'application
//
// Chargée une seule fois au démarrage depuis les variables d'environnement
// (le fichier .env est lu en premier), puis passée explicitement aux
// composants qui en ont besoin (JwtKeys, PhotoStore).

use std::env;
use std::str::FromStr;

use crate::error::AppError;

const DEFAULT_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub api_prefix: String,
    pub jwt_secret: String,
    pub access_token_expire_minutes: i64,
    pub media_dir: String,
    pub media_base_url: String,
    pub photo_max_bytes: u64,
    pub photo_allowed: Vec<String>,
    pub cors_allow_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            database_url: "sqlite://petmatch.db?mode=rwc".to_string(),
            api_prefix: "/api/v1".to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            access_token_expire_minutes: 60,
            media_dir: "media".to_string(),
            media_base_url: "/media".to_string(),
            photo_max_bytes: 2_000_000,
            photo_allowed: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/webp".to_string(),
            ],
            cors_allow_origins: vec!["*".to_string()],
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv::dotenv().ok();

        let defaults = Config::default();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set, using the development default (INSECURE)");
            defaults.jwt_secret.clone()
        });

        let photo_allowed = match env::var("PHOTO_ALLOWED") {
            Ok(raw) => parse_list(&raw),
            Err(_) => defaults.photo_allowed.clone(),
        };

        let cors_allow_origins = match env::var("CORS_ALLOW_ORIGINS") {
            Ok(raw) => parse_origins(&raw)?,
            Err(_) => defaults.cors_allow_origins.clone(),
        };

        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_var("SERVER_PORT", defaults.server_port)?,
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            api_prefix: env::var("API_PREFIX").unwrap_or(defaults.api_prefix),
            jwt_secret,
            access_token_expire_minutes: parse_var(
                "ACCESS_TOKEN_EXPIRE_MINUTES",
                defaults.access_token_expire_minutes,
            )?,
            media_dir: env::var("MEDIA_DIR").unwrap_or(defaults.media_dir),
            media_base_url: env::var("MEDIA_BASE_URL").unwrap_or(defaults.media_base_url),
            photo_max_bytes: parse_var("PHOTO_MAX_BYTES", defaults.photo_max_bytes)?,
            photo_allowed,
            cors_allow_origins,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// Lit une variable numérique, avec valeur par défaut si absente
fn parse_var<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

/// "a, b,,c" -> ["a", "b", "c"] (en minuscules)
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|part| part.trim().to_lowercase())
        .filter(|part| !part.is_empty())
        .collect()
}

/// "" ou "*" -> ["*"], sinon tableau JSON (`["http://a"]`) ou liste "a, b"
fn parse_origins(raw: &str) -> Result<Vec<String>, AppError> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "*" {
        return Ok(vec!["*".to_string()]);
    }

    let origins: Vec<String> = match serde_json::from_str::<Vec<String>>(raw) {
        Ok(list) if raw.starts_with('[') => list
            .into_iter()
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect(),
        _ => raw
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
    };

    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        return Ok(vec!["*".to_string()]);
    }

    // actix-cors panique sur une origine invalide
    for origin in &origins {
        origin
            .parse::<actix_web::http::Uri>()
            .map_err(|e| AppError::Config(format!("Invalid CORS origin {}: {}", origin, e)))?;
    }

    Ok(origins)
}
