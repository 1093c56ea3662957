use actix_web::{get, post, web, HttpResponse};
use sea_orm::{DatabaseConnection, EntityTrait, TransactionTrait};
use validator::Validate;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{LoginRequest, MeResponse, SignupRequest, TokenResponse};
use crate::models::users::Entity as Users;
use crate::services::auth_service::AuthService;
use crate::utils::jwt::JwtKeys;

/// POST /auth/signup - Créer un compte (PUBLIC)
#[post("/signup")]
pub async fn signup(
    body: web::Json<SignupRequest>,
    db: web::Data<DatabaseConnection>,
    keys: web::Data<JwtKeys>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    let txn = db.begin().await?;
    let token = AuthService::signup(&txn, &keys, &body.email, &body.password).await?;
    txn.commit().await?;

    Ok(HttpResponse::Ok().json(TokenResponse::bearer(token)))
}

/// POST /auth/login - Se connecter (PUBLIC)
#[post("/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
    keys: web::Data<JwtKeys>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    let token = AuthService::login(db.get_ref(), &keys, &body.email, &body.password).await?;

    Ok(HttpResponse::Ok().json(TokenResponse::bearer(token)))
}

/// GET /auth/me - Vérifier le token (PROTÉGÉE)
#[get("/me")]
pub async fn me(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let user = Users::find_by_id(auth_user.user_id)
        .one(db.get_ref())
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(MeResponse {
        id: user.id,
        email: user.email,
        created_at: user.created_at,
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(signup)
            .service(login)
            .service(me),
    );
}
