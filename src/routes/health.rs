use actix_web::{get, HttpResponse};

use crate::models::health::HealthResponse;

#[get("/healthz")]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse { ok: true })
}

#[cfg(test)]
mod tests {
    use actix_web::{test, App};

    use crate::routes::testing::TestContext;

    #[actix_web::test]
    async fn test_healthz() {
        let ctx = TestContext::new().await;
        let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

        let req = test::TestRequest::get().uri("/healthz").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body, serde_json::json!({ "ok": true }));
    }
}
