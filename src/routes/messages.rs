use actix_web::{get, post, web, HttpResponse};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Deserialize;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{MessageCreate, MessageOut};
use crate::services::message_service::MessageService;
use crate::utils::pagination::{paginated, LimitOffset};

const DEFAULT_MESSAGE_LIMIT: u64 = 50;

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub pair_id: i32,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[post("")]
pub async fn send_message(
    auth_user: AuthUser,
    body: web::Json<MessageCreate>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let txn = db.begin().await?;
    let message = MessageService::send_message(&txn, body.pair_id, auth_user.user_id, &body.body).await?;
    txn.commit().await?;

    Ok(HttpResponse::Ok().json(MessageOut::from(message)))
}

/// GET /messages?pair_id= - ordre chronologique
#[get("")]
pub async fn list_messages(
    auth_user: AuthUser,
    query: web::Query<MessagesQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let window = LimitOffset {
        limit: query.limit,
        offset: query.offset,
    }
    .window(DEFAULT_MESSAGE_LIMIT)?;

    let (messages, total) =
        MessageService::list_messages(db.get_ref(), query.pair_id, auth_user.user_id, window).await?;
    let messages: Vec<MessageOut> = messages.into_iter().map(MessageOut::from).collect();

    Ok(paginated(&messages, total))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/messages")
            .service(send_message)
            .service(list_messages),
    );
}
