use actix_web::{web, HttpResponse};

use crate::auth::permissions::MANAGE_SPECIALTIES;
use crate::database::Database;
use crate::middleware::RequirePermission;
use crate::models::SpecialtyRequest;
use crate::services::specialty_service;
use crate::utils::AppResult;

pub fn routes(cfg: &mut web::ServiceConfig) {
    let manage = || RequirePermission::new(MANAGE_SPECIALTIES);

    super::protected(cfg, "/getAll", RequirePermission::authenticated(), web::get().to(get_all));
    super::protected(cfg, "/get/{id}", RequirePermission::authenticated(), web::get().to(get_by_id));
    super::protected(cfg, "/create", manage(), web::post().to(create));
    super::protected(cfg, "/update/{id}", manage(), web::put().to(update));
    super::protected(cfg, "/delete/{id}", manage(), web::delete().to(delete));
}

#[utoipa::path(
    get,
    path = "/api/Specialty/getAll",
    tag = "Specialty",
    responses((status = 200, description = "All specialties")),
    security(("bearer_auth" = []))
)]
pub async fn get_all(db: web::Data<Database>) -> AppResult<HttpResponse> {
    super::listed("specialties", specialty_service::get_all(&db).await?)
}

pub async fn get_by_id(db: web::Data<Database>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let specialty = super::found("Specialty", id, specialty_service::get_by_id(&db, id).await?)?;
    super::single("specialty", specialty)
}

#[utoipa::path(
    post,
    path = "/api/Specialty/create",
    tag = "Specialty",
    request_body = SpecialtyRequest,
    responses(
        (status = 201, description = "Specialty created"),
        (status = 409, description = "Name already in use")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create(db: web::Data<Database>, request: web::Json<SpecialtyRequest>) -> AppResult<HttpResponse> {
    log::info!("➕ POST /api/Specialty/create - {}", request.name);
    super::created("specialty", specialty_service::create(&db, &request).await?)
}

pub async fn update(
    db: web::Data<Database>,
    path: web::Path<i64>,
    request: web::Json<SpecialtyRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let specialty = super::found("Specialty", id, specialty_service::update(&db, id, &request).await?)?;
    super::single("specialty", specialty)
}

pub async fn delete(db: web::Data<Database>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    super::deleted("Specialty", id, specialty_service::delete(&db, id).await?)
}

#[cfg(test)]
mod tests {
    use crate::api::testing::{test_app, TestState};
    use crate::auth::permissions::MANAGE_SPECIALTIES;
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn reads_need_a_token_writes_need_the_permission() {
        let state = TestState::new().await;
        let app = test_app!(state);

        let anonymous = test::TestRequest::get().uri("/api/Specialty/getAll").to_request();
        assert_eq!(test::call_service(&app, anonymous).await.status(), StatusCode::UNAUTHORIZED);

        let plain = test::TestRequest::post()
            .uri("/api/Specialty/create")
            .insert_header(state.bearer(&[]))
            .set_json(json!({ "name": "Cardiology" }))
            .to_request();
        assert_eq!(test::call_service(&app, plain).await.status(), StatusCode::FORBIDDEN);

        let admin = test::TestRequest::post()
            .uri("/api/Specialty/create")
            .insert_header(state.bearer(&[MANAGE_SPECIALTIES]))
            .set_json(json!({ "name": "Cardiology" }))
            .to_request();
        assert_eq!(test::call_service(&app, admin).await.status(), StatusCode::CREATED);

        let list = test::TestRequest::get()
            .uri("/api/Specialty/getAll")
            .insert_header(state.bearer(&[]))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, list).await;
        assert_eq!(body["specialties"][0]["name"], "Cardiology");
    }
}
