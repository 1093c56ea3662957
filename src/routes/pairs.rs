use actix_web::{get, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::services::pair_service::PairService;
use crate::utils::pagination::{paginated, LimitOffset};

const DEFAULT_PAIR_LIMIT: u64 = 20;

/// GET /pairs - paires du demandeur, plus récentes d'abord
#[get("")]
pub async fn list_pairs(
    auth_user: AuthUser,
    query: web::Query<LimitOffset>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let window = query.window(DEFAULT_PAIR_LIMIT)?;
    let (pairs, total) = PairService::list_pairs_for_user(db.get_ref(), auth_user.user_id, window).await?;

    Ok(paginated(&pairs, total))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/pairs").service(list_pairs));
}
