use actix_web::{delete, get, patch, post, put, web, HttpResponse};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Deserialize;
use validator::Validate;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::PetRequest;
use crate::models::pets::Gender;
use crate::services::pet_service::PetService;
use crate::services::photo_store::PhotoStore;
use crate::utils::pagination::{paginated, PageQuery};

// ?species=&gender=&page=&page_size=
#[derive(Debug, Deserialize)]
pub struct PetsQuery {
    pub species: Option<String>,
    pub gender: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PrimaryPhotoQuery {
    pub photo_id: i32,
}

/// POST /pets
#[post("")]
pub async fn create_pet(
    auth_user: AuthUser,
    body: web::Json<PetRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    let txn = db.begin().await?;
    let pet = PetService::create_pet(&txn, auth_user.user_id, body.into_inner()).await?;
    txn.commit().await?;

    Ok(HttpResponse::Ok().json(pet))
}

/// GET /pets - pets du demandeur, paginés par page/page_size
#[get("")]
pub async fn list_pets(
    auth_user: AuthUser,
    query: web::Query<PetsQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let window = PageQuery {
        page: query.page,
        page_size: query.page_size,
    }
    .window()?;

    // Un genre inconnu est ignoré
    let gender = query.gender.as_deref().and_then(Gender::parse);

    let (pets, total) = PetService::list_pets(
        db.get_ref(),
        auth_user.user_id,
        query.species.as_deref(),
        gender,
        window,
    )
    .await?;

    Ok(paginated(&pets, total))
}

#[get("/{pet_id}")]
pub async fn get_pet(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let pet = PetService::get_pet(db.get_ref(), path.into_inner(), auth_user.user_id).await?;
    Ok(HttpResponse::Ok().json(pet))
}

#[put("/{pet_id}")]
pub async fn update_pet(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<PetRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    let txn = db.begin().await?;
    let pet = PetService::update_pet(&txn, path.into_inner(), auth_user.user_id, body.into_inner())
        .await?;
    txn.commit().await?;

    Ok(HttpResponse::Ok().json(pet))
}

/// DELETE /pets/{id} - les fichiers photo sont retirés après commit
#[delete("/{pet_id}")]
pub async fn delete_pet(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
    store: web::Data<PhotoStore>,
) -> Result<HttpResponse, AppError> {
    let txn = db.begin().await?;
    let filenames = PetService::delete_pet(&txn, path.into_inner(), auth_user.user_id).await?;
    txn.commit().await?;

    store.discard_files(&filenames).await;

    Ok(HttpResponse::NoContent().finish())
}

#[patch("/{pet_id}/primary_photo")]
pub async fn set_primary_photo(
    auth_user: AuthUser,
    path: web::Path<i32>,
    query: web::Query<PrimaryPhotoQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let txn = db.begin().await?;
    let pet = PetService::set_primary_photo(
        &txn,
        path.into_inner(),
        auth_user.user_id,
        query.photo_id,
    )
    .await?;
    txn.commit().await?;

    Ok(HttpResponse::Ok().json(pet))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/pets")
            .service(create_pet)
            .service(list_pets)
            .service(get_pet)
            .service(update_pet)
            .service(delete_pet)
            .service(set_primary_photo),
    );
}
