use actix_multipart::Multipart;
use actix_web::{delete, get, post, web, HttpResponse};
use futures::TryStreamExt;
use sea_orm::{DatabaseConnection, TransactionTrait};

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::PhotoOut;
use crate::services::pet_service::PetService;
use crate::services::photo_store::PhotoStore;
use crate::utils::pagination::{paginated, LimitOffset};

const PHOTO_FIELD: &str = "file";
const DEFAULT_PHOTO_LIMIT: u64 = 20;

/// POST /pets/{pet_id}/photos - upload multipart, champ "file"
#[post("/pets/{pet_id}/photos")]
pub async fn upload_photo(
    auth_user: AuthUser,
    path: web::Path<i32>,
    mut payload: Multipart,
    db: web::Data<DatabaseConnection>,
    store: web::Data<PhotoStore>,
) -> Result<HttpResponse, AppError> {
    let pet_id = path.into_inner();

    let txn = db.begin().await?;
    PetService::get_owned_pet(&txn, pet_id, auth_user.user_id).await?;

    let mut saved = None;
    while let Some(field) = payload.try_next().await? {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(|mime| mime.essence_str().to_string());
        let photo = store
            .save_photo(&txn, pet_id, content_type.as_deref(), Box::pin(field))
            .await?;
        saved = Some(photo);
        break;
    }

    let photo = saved.ok_or_else(|| AppError::BadRequest("missing file field".to_string()))?;

    if let Err(e) = txn.commit().await {
        store.discard_files(&[photo.filename]).await;
        return Err(e.into());
    }

    Ok(HttpResponse::Created().json(PhotoOut::from(photo)))
}

#[get("/pets/{pet_id}/photos")]
pub async fn list_photos(
    auth_user: AuthUser,
    path: web::Path<i32>,
    query: web::Query<LimitOffset>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let window = query.window(DEFAULT_PHOTO_LIMIT)?;
    let pet = PetService::get_owned_pet(db.get_ref(), path.into_inner(), auth_user.user_id).await?;

    let (photos, total) = PhotoStore::list_photos(db.get_ref(), pet.id, window).await?;
    let photos: Vec<PhotoOut> = photos.into_iter().map(PhotoOut::from).collect();

    Ok(paginated(&photos, total))
}

#[delete("/photos/{photo_id}")]
pub async fn delete_photo(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
    store: web::Data<PhotoStore>,
) -> Result<HttpResponse, AppError> {
    let txn = db.begin().await?;
    let filename = PhotoStore::delete_photo(&txn, auth_user.user_id, path.into_inner()).await?;
    txn.commit().await?;

    store.discard_files(&[filename]).await;

    Ok(HttpResponse::NoContent().finish())
}

#[post("/photos/{photo_id}/primary")]
pub async fn set_primary(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let txn = db.begin().await?;
    let photo = PhotoStore::set_primary(&txn, auth_user.user_id, path.into_inner()).await?;
    txn.commit().await?;

    Ok(HttpResponse::Ok().json(PhotoOut::from(photo)))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(upload_photo)
        .service(list_photos)
        .service(delete_photo)
        .service(set_primary);
}
