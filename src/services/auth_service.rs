use chrono::Utc;
use sea_orm::*;

use crate::error::AppError;
use crate::models::users;
use crate::utils::jwt::JwtKeys;
use crate::utils::password;

pub struct AuthService;

impl AuthService {
    /// Crée un compte et renvoie un token lié à l'email
    /// Conflict si l'email existe déjà
    pub async fn signup<C: ConnectionTrait>(
        db: &C,
        keys: &JwtKeys,
        email: &str,
        raw_password: &str,
    ) -> Result<String, AppError> {
        // 1. Vérifier si l'email existe déjà
        let existing = Self::find_by_email(db, email).await?;
        if existing.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        // 2. Hash le mot de passe
        let password_hash = password::hash_password(raw_password).map_err(AppError::Internal)?;

        // 3. Créer l'utilisateur (l'index unique reste le filet de sécurité)
        let new_user = users::ActiveModel {
            email: Set(email.to_string()),
            password_hash: Set(password_hash),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let user = new_user.insert(db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Email already registered".to_string())
            }
            _ => AppError::Database(e),
        })?;

        tracing::info!(user_id = user.id, "user signed up");

        // 4. Générer le JWT
        keys.generate_token(&user.email).map_err(AppError::Internal)
    }

    /// Vérifie les identifiants et renvoie un token
    /// Unauthorized si l'email est inconnu ou le mot de passe faux
    pub async fn login<C: ConnectionTrait>(
        db: &C,
        keys: &JwtKeys,
        email: &str,
        raw_password: &str,
    ) -> Result<String, AppError> {
        let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

        let user = Self::find_by_email(db, email).await?.ok_or_else(invalid)?;

        // Un hash illisible est traité comme un échec d'authentification
        let is_valid = password::verify_password(raw_password, &user.password_hash)
            .unwrap_or_else(|e| {
                tracing::warn!(user_id = user.id, error = %e, "stored password hash is unreadable");
                false
            });

        if !is_valid {
            return Err(invalid());
        }

        keys.generate_token(&user.email).map_err(AppError::Internal)
    }

    pub async fn find_by_email<C: ConnectionTrait>(
        db: &C,
        email: &str,
    ) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::setup_db;

    fn keys() -> JwtKeys {
        JwtKeys::new("test-secret", 60)
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let db = setup_db().await;
        let keys = keys();

        let token = AuthService::signup(&db, &keys, "a@example.com", "password123")
            .await
            .unwrap();
        assert_eq!(keys.verify_token(&token).unwrap().sub, "a@example.com");

        let token = AuthService::login(&db, &keys, "a@example.com", "password123")
            .await
            .unwrap();
        assert_eq!(keys.verify_token(&token).unwrap().sub, "a@example.com");
    }

    #[tokio::test]
    async fn test_signup_duplicate_email_conflicts() {
        let db = setup_db().await;
        let keys = keys();

        AuthService::signup(&db, &keys, "a@example.com", "password123")
            .await
            .unwrap();
        let again = AuthService::signup(&db, &keys, "a@example.com", "other-password").await;

        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let db = setup_db().await;
        let keys = keys();

        AuthService::signup(&db, &keys, "a@example.com", "password123")
            .await
            .unwrap();

        let wrong_password = AuthService::login(&db, &keys, "a@example.com", "nope").await;
        assert!(matches!(wrong_password, Err(AppError::Unauthorized(_))));

        let unknown = AuthService::login(&db, &keys, "b@example.com", "password123").await;
        assert!(matches!(unknown, Err(AppError::Unauthorized(_))));
    }
}
