use actix_web::{web, HttpResponse};

use crate::auth::permissions::{MANAGE_MEDICAL_NOTES, VIEW_MEDICAL_NOTES};
use crate::database::Database;
use crate::middleware::RequirePermission;
use crate::models::MedicalNoteRequest;
use crate::services::medical_note_service;
use crate::utils::AppResult;

pub fn routes(cfg: &mut web::ServiceConfig) {
    let view = || RequirePermission::new(VIEW_MEDICAL_NOTES);
    let manage = || RequirePermission::new(MANAGE_MEDICAL_NOTES);

    super::protected(cfg, "/GetAll", view(), web::get().to(get_all));
    super::protected(cfg, "/Get/{id}", view(), web::get().to(get_by_id));
    super::protected(cfg, "/GetByAppointment/{appointmentId}", view(), web::get().to(get_by_appointment));
    super::protected(cfg, "/CreateMedicalNote", manage(), web::post().to(create));
    super::protected(cfg, "/Update/{id}", manage(), web::put().to(update));
    super::protected(cfg, "/Delete/{id}", manage(), web::delete().to(delete));
}

pub async fn get_all(db: web::Data<Database>) -> AppResult<HttpResponse> {
    super::listed("notes", medical_note_service::get_all(&db).await?)
}

pub async fn get_by_id(db: web::Data<Database>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let note = super::found("Medical note", id, medical_note_service::get_by_id(&db, id).await?)?;
    super::single("note", note)
}

pub async fn get_by_appointment(db: web::Data<Database>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    super::listed("notes", medical_note_service::get_by_appointment(&db, path.into_inner()).await?)
}

#[utoipa::path(
    post,
    path = "/api/MedicalNote/CreateMedicalNote",
    tag = "MedicalNote",
    request_body = MedicalNoteRequest,
    responses(
        (status = 201, description = "Note created"),
        (status = 400, description = "Unknown appointment or empty text")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create(db: web::Data<Database>, request: web::Json<MedicalNoteRequest>) -> AppResult<HttpResponse> {
    super::created("note", medical_note_service::create(&db, &request).await?)
}

pub async fn update(
    db: web::Data<Database>,
    path: web::Path<i64>,
    request: web::Json<MedicalNoteRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let note = super::found("Medical note", id, medical_note_service::update(&db, id, &request).await?)?;
    super::single("note", note)
}

pub async fn delete(db: web::Data<Database>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    super::deleted("Medical note", id, medical_note_service::delete(&db, id).await?)
}
