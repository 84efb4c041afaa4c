use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::permissions::{MANAGE_PATIENTS, VIEW_PATIENTS};
use crate::database::Database;
use crate::middleware::RequirePermission;
use crate::models::PatientRequest;
use crate::services::patient_service;
use crate::utils::AppResult;

pub fn routes(cfg: &mut web::ServiceConfig) {
    let view = || RequirePermission::new(VIEW_PATIENTS);
    let manage = || RequirePermission::new(MANAGE_PATIENTS);

    super::protected(cfg, "/getAll", view(), web::get().to(get_all));
    super::protected(cfg, "/getInfo", view(), web::get().to(get_info));
    super::protected(cfg, "/search", view(), web::get().to(search));
    super::protected(cfg, "/getByIdentification/{number}", view(), web::get().to(get_by_identification));
    super::protected(cfg, "/create", manage(), web::post().to(create));
    super::protected(cfg, "/update/{id}", manage(), web::put().to(update));
    super::protected(cfg, "/delete/{id}", manage(), web::delete().to(delete));
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInfoQuery {
    pub patient_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: String,
}

#[utoipa::path(
    get,
    path = "/api/Patient/getAll",
    tag = "Patient",
    responses((status = 200, description = "All patients ordered by name")),
    security(("bearer_auth" = []))
)]
pub async fn get_all(db: web::Data<Database>) -> AppResult<HttpResponse> {
    log::info!("📋 GET /api/Patient/getAll");
    super::listed("patients", patient_service::get_all(&db).await?)
}

#[utoipa::path(
    get,
    path = "/api/Patient/getInfo",
    tag = "Patient",
    params(("patientId" = i64, Query, description = "Patient id")),
    responses(
        (status = 200, description = "Patient found"),
        (status = 404, description = "Patient not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_info(db: web::Data<Database>, query: web::Query<PatientInfoQuery>) -> AppResult<HttpResponse> {
    let id = query.patient_id;
    let patient = super::found("Patient", id, patient_service::get_by_id(&db, id).await?)?;
    super::single("patient", patient)
}

#[utoipa::path(
    get,
    path = "/api/Patient/search",
    tag = "Patient",
    params(("name" = String, Query, description = "Part of the patient's name")),
    responses((status = 200, description = "Matching patients")),
    security(("bearer_auth" = []))
)]
pub async fn search(db: web::Data<Database>, query: web::Query<NameQuery>) -> AppResult<HttpResponse> {
    log::info!("🔍 GET /api/Patient/search - name: {}", query.name);
    super::listed("patients", patient_service::search_by_name(&db, &query.name).await?)
}

pub async fn get_by_identification(db: web::Data<Database>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let number = path.into_inner();
    let patient = patient_service::get_by_identification_number(&db, &number)
        .await?
        .ok_or_else(|| crate::utils::AppError::NotFound(format!("No patient with identification '{}'", number)))?;
    super::single("patient", patient)
}

#[utoipa::path(
    post,
    path = "/api/Patient/create",
    tag = "Patient",
    request_body = PatientRequest,
    responses(
        (status = 201, description = "Patient created"),
        (status = 409, description = "Identification number already registered")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create(db: web::Data<Database>, request: web::Json<PatientRequest>) -> AppResult<HttpResponse> {
    log::info!("➕ POST /api/Patient/create");
    super::created("patient", patient_service::create(&db, &request).await?)
}

#[utoipa::path(
    put,
    path = "/api/Patient/update/{id}",
    tag = "Patient",
    request_body = PatientRequest,
    params(("id" = i64, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient updated"),
        (status = 404, description = "Patient not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update(
    db: web::Data<Database>,
    path: web::Path<i64>,
    request: web::Json<PatientRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    log::info!("✏️ PUT /api/Patient/update/{}", id);
    let patient = super::found("Patient", id, patient_service::update(&db, id, &request).await?)?;
    super::single("patient", patient)
}

#[utoipa::path(
    delete,
    path = "/api/Patient/delete/{id}",
    tag = "Patient",
    params(("id" = i64, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient deleted"),
        (status = 404, description = "Patient not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete(db: web::Data<Database>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    log::info!("🗑️ DELETE /api/Patient/delete/{}", id);
    super::deleted("Patient", id, patient_service::delete(&db, id).await?)
}
