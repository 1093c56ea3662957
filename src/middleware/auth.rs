use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::users::{Column as UserColumn, Entity as Users};
use crate::utils::jwt::JwtKeys;

/// Structure qui contient les infos de l'utilisateur authentifié
/// Utilisée comme extracteur dans les routes protégées
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
}

/// Extrait le token du header "Authorization: Bearer <token>"
fn bearer_token(req: &HttpRequest) -> Result<String, AppError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header".to_string()))?;

    auth_str
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized(
                "Invalid Authorization format (expected: Bearer <token>)".to_string(),
            )
        })
}

/// Implémentation de FromRequest pour AuthUser
/// Le sujet du token (email) doit correspondre à un utilisateur existant
impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let keys = req.app_data::<web::Data<JwtKeys>>().cloned();
        let db = req.app_data::<web::Data<DatabaseConnection>>().cloned();

        Box::pin(async move {
            let token = token?;
            let (Some(keys), Some(db)) = (keys, db) else {
                return Err(AppError::Internal("auth dependencies not configured".to_string()));
            };

            // 1. Vérifier le token JWT
            let claims = keys
                .verify_token(&token)
                .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

            if claims.sub.is_empty() {
                return Err(AppError::Unauthorized("Invalid token".to_string()));
            }

            // 2. Résoudre l'email vers un utilisateur
            let user = Users::find()
                .filter(UserColumn::Email.eq(&claims.sub))
                .one(db.get_ref())
                .await?
                .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

            Ok(AuthUser {
                user_id: user.id,
                email: user.email,
            })
        })
    }
}
