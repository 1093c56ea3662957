use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey, Algorithm};
use serde::{Deserialize, Serialize};
use chrono::{Utc, Duration};

use crate::config::Config;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,     // email de l'utilisateur
    pub exp: i64,        // expiration timestamp
}

/// Clés de signature JWT, construites depuis la Config au démarrage
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expire_minutes: i64,
}

impl JwtKeys {
    pub fn new(secret: &str, expire_minutes: i64) -> Self {
        JwtKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expire_minutes,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.jwt_secret, config.access_token_expire_minutes)
    }

    /// Génère un JWT token pour un email
    pub fn generate_token(&self, email: &str) -> Result<String, String> {
        self.generate_token_with_ttl(email, Duration::minutes(self.expire_minutes))
    }

    fn generate_token_with_ttl(&self, email: &str, ttl: Duration) -> Result<String, String> {
        let expiration = Utc::now()
            .checked_add_signed(ttl)
            .ok_or("Failed to calculate expiration")?
            .timestamp();

        let claims = Claims {
            sub: email.to_string(),
            exp: expiration,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| format!("Failed to generate token: {}", e))
    }

    /// Vérifie et décode un JWT token
    pub fn verify_token(&self, token: &str) -> Result<Claims, String> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| format!("Invalid token: {}", e))
    }
}
