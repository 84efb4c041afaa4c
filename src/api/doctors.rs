use actix_web::{web, HttpResponse};

use crate::auth::permissions::MANAGE_DOCTORS;
use crate::database::Database;
use crate::middleware::RequirePermission;
use crate::models::DoctorRequest;
use crate::services::doctor_service;
use crate::utils::{AppError, AppResult};

pub fn routes(cfg: &mut web::ServiceConfig) {
    let manage = || RequirePermission::new(MANAGE_DOCTORS);

    super::protected(cfg, "/getAll", RequirePermission::authenticated(), web::get().to(get_all));
    super::protected(cfg, "/get/{id}", RequirePermission::authenticated(), web::get().to(get_by_id));
    super::protected(cfg, "/getByUser/{userId}", RequirePermission::authenticated(), web::get().to(get_by_user));
    super::protected(cfg, "/create", manage(), web::post().to(create));
    super::protected(cfg, "/update/{id}", manage(), web::put().to(update));
    super::protected(cfg, "/delete/{id}", manage(), web::delete().to(delete));
}

#[utoipa::path(
    get,
    path = "/api/Doctor/getAll",
    tag = "Doctor",
    responses((status = 200, description = "All doctors with name and specialty")),
    security(("bearer_auth" = []))
)]
pub async fn get_all(db: web::Data<Database>) -> AppResult<HttpResponse> {
    super::listed("doctors", doctor_service::get_all(&db).await?)
}

pub async fn get_by_id(db: web::Data<Database>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let doctor = super::found("Doctor", id, doctor_service::get_by_id(&db, id).await?)?;
    super::single("doctor", doctor)
}

pub async fn get_by_user(db: web::Data<Database>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();
    let doctor = doctor_service::get_by_user_id(&db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} has no doctor profile", user_id)))?;
    super::single("doctor", doctor)
}

#[utoipa::path(
    post,
    path = "/api/Doctor/create",
    tag = "Doctor",
    request_body = DoctorRequest,
    responses(
        (status = 201, description = "Doctor created"),
        (status = 400, description = "Unknown user or specialty")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create(db: web::Data<Database>, request: web::Json<DoctorRequest>) -> AppResult<HttpResponse> {
    log::info!("➕ POST /api/Doctor/create - user: {}", request.user_id);
    super::created("doctor", doctor_service::create(&db, &request).await?)
}

pub async fn update(
    db: web::Data<Database>,
    path: web::Path<i64>,
    request: web::Json<DoctorRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let doctor = super::found("Doctor", id, doctor_service::update(&db, id, &request).await?)?;
    super::single("doctor", doctor)
}

pub async fn delete(db: web::Data<Database>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    super::deleted("Doctor", id, doctor_service::delete(&db, id).await?)
}

#[cfg(test)]
mod tests {
    use crate::api::testing::{test_app, TestState};
    use crate::test_support;
    use actix_web::{http::StatusCode, test};
    use serde_json::Value;

    #[actix_web::test]
    async fn lookup_by_user_joins_the_display_name() {
        let state = TestState::new().await;
        let doctor = test_support::insert_doctor(state.db.get_ref(), "mgarcia", "María García").await;
        let app = test_app!(state);

        let req = test::TestRequest::get()
            .uri(&format!("/api/Doctor/getByUser/{}", doctor.user_id))
            .insert_header(state.bearer(&[]))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["doctor"]["doctorId"], doctor.id);
        assert_eq!(body["doctor"]["fullName"], "María García");

        let missing = test::TestRequest::get()
            .uri("/api/Doctor/getByUser/999")
            .insert_header(state.bearer(&[]))
            .to_request();
        assert_eq!(test::call_service(&app, missing).await.status(), StatusCode::NOT_FOUND);
    }
}
