use actix_web::{delete, get, post, web, HttpResponse};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Deserialize;
use validator::Validate;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{DecisionRequest, GenerateRequest, GenerateResponse, MatchOut};
use crate::models::matches::MatchDecision;
use crate::models::pets::Gender;
use crate::services::match_service::MatchService;
use crate::services::pet_service::PetService;
use crate::utils::pagination::{paginated, LimitOffset};

const DEFAULT_MATCH_LIMIT: u64 = 10;

#[derive(Debug, Deserialize)]
pub struct MatchesQuery {
    pub decision: Option<MatchDecision>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// POST /matches/generate - crée des matches "undecided" vers des candidats
#[post("/generate")]
pub async fn generate(
    auth_user: AuthUser,
    body: web::Json<GenerateRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    // Genre vide = pas de filtre
    let gender = match body.gender.as_deref().map(str::trim).filter(|g| !g.is_empty()) {
        None => None,
        Some(raw) => Some(
            Gender::parse(raw).ok_or_else(|| AppError::BadRequest("Invalid gender filter".to_string()))?,
        ),
    };

    let txn = db.begin().await?;
    let (created, candidates) = MatchService::generate_matches(
        &txn,
        auth_user.user_id,
        body.species.as_deref(),
        gender,
        body.limit,
    )
    .await?;
    let candidates = PetService::with_photos(&txn, candidates).await?;
    txn.commit().await?;

    Ok(HttpResponse::Ok().json(GenerateResponse { created, candidates }))
}

/// GET /matches/stats - nombre de matches par décision
#[get("/stats")]
pub async fn stats(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let counts = MatchService::count_by_decision(db.get_ref(), auth_user.user_id).await?;
    Ok(HttpResponse::Ok().json(counts))
}

#[post("/{target_pet_id}/decision")]
pub async fn decide(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<DecisionRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let txn = db.begin().await?;
    let decided =
        MatchService::decide_match(&txn, auth_user.user_id, path.into_inner(), body.decision).await?;
    txn.commit().await?;

    Ok(HttpResponse::Ok().json(MatchOut::from(decided)))
}

#[get("")]
pub async fn list_matches(
    auth_user: AuthUser,
    query: web::Query<MatchesQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let window = LimitOffset {
        limit: query.limit,
        offset: query.offset,
    }
    .window(DEFAULT_MATCH_LIMIT)?;

    let (items, total) =
        MatchService::list_matches(db.get_ref(), auth_user.user_id, query.decision, window).await?;
    let items: Vec<MatchOut> = items.into_iter().map(MatchOut::from).collect();

    Ok(paginated(&items, total))
}

#[delete("/{target_pet_id}")]
pub async fn delete_match(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let txn = db.begin().await?;
    let deleted = MatchService::delete_match(&txn, auth_user.user_id, path.into_inner()).await?;
    txn.commit().await?;

    if !deleted {
        return Err(AppError::NotFound("match not found".to_string()));
    }

    Ok(HttpResponse::NoContent().finish())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/matches")
            .service(generate)
            .service(stats)
            .service(decide)
            .service(list_matches)
            .service(delete_match),
    );
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::json;

    use crate::db::testing::{create_pet, create_user};
    use crate::models::pets::Gender;
    use crate::routes::testing::{url, TestContext};
    use crate::utils::pagination::TOTAL_COUNT_HEADER;

    #[actix_web::test]
    async fn test_mutual_like_flow() {
        let ctx = TestContext::new().await;
        let a = create_user(&ctx.db, "a@example.com").await;
        let b = create_user(&ctx.db, "b@example.com").await;
        let p1 = create_pet(&ctx.db, a.id, "P1", "dog", Gender::Male).await;
        let p2 = create_pet(&ctx.db, b.id, "P2", "dog", Gender::Female).await;
        let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

        let req = test::TestRequest::post()
            .uri(&url(&format!("/matches/{}/decision", p2.id)))
            .insert_header(ctx.bearer("a@example.com"))
            .set_json(json!({ "decision": "liked" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["decision"], "liked");

        let req = test::TestRequest::post()
            .uri(&url(&format!("/matches/{}/decision", p1.id)))
            .insert_header(ctx.bearer("b@example.com"))
            .set_json(json!({ "decision": "liked" }))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get()
            .uri(&url("/pairs"))
            .insert_header(ctx.bearer("a@example.com"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.headers().get(TOTAL_COUNT_HEADER).unwrap(), "1");
        let pairs: Vec<serde_json::Value> = test::read_body_json(resp).await;
        assert_eq!(pairs[0]["other_user_id"], b.id);

        let req = test::TestRequest::get()
            .uri(&url("/matches/stats"))
            .insert_header(ctx.bearer("a@example.com"))
            .to_request();
        let stats: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stats, json!({ "liked": 1, "passed": 0, "undecided": 0 }));
    }

    #[actix_web::test]
    async fn test_decision_errors() {
        let ctx = TestContext::new().await;
        let a = create_user(&ctx.db, "a@example.com").await;
        let own = create_pet(&ctx.db, a.id, "Mine", "dog", Gender::Male).await;
        let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

        let req = test::TestRequest::post()
            .uri(&url(&format!("/matches/{}/decision", own.id)))
            .insert_header(ctx.bearer("a@example.com"))
            .set_json(json!({ "decision": "liked" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri(&url("/matches/999/decision"))
            .insert_header(ctx.bearer("a@example.com"))
            .set_json(json!({ "decision": "liked" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post()
            .uri(&url(&format!("/matches/{}/decision", own.id)))
            .insert_header(ctx.bearer("a@example.com"))
            .set_json(json!({ "decision": "maybe" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn test_generate_list_and_delete() {
        let ctx = TestContext::new().await;
        create_user(&ctx.db, "a@example.com").await;
        let b = create_user(&ctx.db, "b@example.com").await;
        let d1 = create_pet(&ctx.db, b.id, "D1", "dog", Gender::Female).await;
        create_pet(&ctx.db, b.id, "D2", "dog", Gender::Male).await;
        create_pet(&ctx.db, b.id, "C1", "cat", Gender::Female).await;
        let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

        let req = test::TestRequest::post()
            .uri(&url("/matches/generate"))
            .insert_header(ctx.bearer("a@example.com"))
            .set_json(json!({ "species": "dog" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["created"], 2);
        assert_eq!(body["candidates"][0]["id"], d1.id);

        let req = test::TestRequest::get()
            .uri(&url("/matches?decision=undecided&limit=1"))
            .insert_header(ctx.bearer("a@example.com"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.headers().get(TOTAL_COUNT_HEADER).unwrap(), "2");
        let page: Vec<serde_json::Value> = test::read_body_json(resp).await;
        assert_eq!(page.len(), 1);

        for expected in [StatusCode::NO_CONTENT, StatusCode::NOT_FOUND] {
            let req = test::TestRequest::delete()
                .uri(&url(&format!("/matches/{}", d1.id)))
                .insert_header(ctx.bearer("a@example.com"))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), expected);
        }
    }

    #[actix_web::test]
    async fn test_generate_rejects_bad_input() {
        let ctx = TestContext::new().await;
        create_user(&ctx.db, "a@example.com").await;
        let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

        let req = test::TestRequest::post()
            .uri(&url("/matches/generate"))
            .insert_header(ctx.bearer("a@example.com"))
            .set_json(json!({ "limit": 51 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let req = test::TestRequest::post()
            .uri(&url("/matches/generate"))
            .insert_header(ctx.bearer("a@example.com"))
            .set_json(json!({ "gender": "dragon" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri(&url("/matches/generate"))
            .insert_header(ctx.bearer("a@example.com"))
            .set_json(json!({ "gender": "  ", "species": "" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri(&url("/matches?limit=0"))
            .insert_header(ctx.bearer("a@example.com"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
