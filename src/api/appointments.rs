use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::auth::permissions::{MANAGE_APPOINTMENTS, VIEW_APPOINTMENTS};
use crate::database::Database;
use crate::middleware::RequirePermission;
use crate::models::AppointmentRequest;
use crate::services::appointment_service;
use crate::utils::AppResult;

pub fn routes(cfg: &mut web::ServiceConfig) {
    let view = || RequirePermission::new(VIEW_APPOINTMENTS);
    let manage = || RequirePermission::new(MANAGE_APPOINTMENTS);

    super::protected(cfg, "/getAll", view(), web::get().to(get_all));
    super::protected(cfg, "/get/{id}", view(), web::get().to(get_by_id));
    super::protected(cfg, "/getByDoctor/{doctorId}", view(), web::get().to(get_by_doctor));
    super::protected(cfg, "/getByDoctorAndDate/{doctorId}", view(), web::get().to(get_by_doctor_and_date));
    super::protected(cfg, "/getByPatient/{patientId}", view(), web::get().to(get_by_patient));
    super::protected(cfg, "/create", manage(), web::post().to(create));
    super::protected(cfg, "/update/{appointmentId}", manage(), web::put().to(update));
    super::protected(cfg, "/delete/{id}", manage(), web::delete().to(delete));
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

pub async fn get_all(db: web::Data<Database>) -> AppResult<HttpResponse> {
    super::listed("appointments", appointment_service::get_all(&db).await?)
}

pub async fn get_by_id(db: web::Data<Database>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let appointment = super::found("Appointment", id, appointment_service::get_by_id(&db, id).await?)?;
    super::single("appointment", appointment)
}

pub async fn get_by_doctor(db: web::Data<Database>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    super::listed("appointments", appointment_service::get_by_doctor(&db, path.into_inner()).await?)
}

#[utoipa::path(
    get,
    path = "/api/Appointment/getByDoctorAndDate/{doctorId}",
    tag = "Appointment",
    params(
        ("doctorId" = i64, Path, description = "Doctor id"),
        ("date" = String, Query, description = "Calendar day, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "The doctor's agenda for that day, with patient and doctor data"),
        (status = 400, description = "Malformed date")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_by_doctor_and_date(
    db: web::Data<Database>,
    path: web::Path<i64>,
    query: web::Query<DateQuery>,
) -> AppResult<HttpResponse> {
    let doctor_id = path.into_inner();
    log::info!("📅 GET agenda of doctor {} on {}", doctor_id, query.date);
    super::listed(
        "appointments",
        appointment_service::get_by_doctor_and_date(&db, doctor_id, query.date).await?,
    )
}

pub async fn get_by_patient(db: web::Data<Database>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    super::listed("appointments", appointment_service::get_by_patient(&db, path.into_inner()).await?)
}

#[utoipa::path(
    post,
    path = "/api/Appointment/create",
    tag = "Appointment",
    request_body = AppointmentRequest,
    responses(
        (status = 201, description = "Appointment created"),
        (status = 400, description = "Unknown patient or doctor")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create(db: web::Data<Database>, request: web::Json<AppointmentRequest>) -> AppResult<HttpResponse> {
    super::created("appointment", appointment_service::create(&db, &request).await?)
}

#[utoipa::path(
    put,
    path = "/api/Appointment/update/{appointmentId}",
    tag = "Appointment",
    request_body = AppointmentRequest,
    params(("appointmentId" = i64, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment overwritten"),
        (status = 404, description = "Appointment not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update(
    db: web::Data<Database>,
    path: web::Path<i64>,
    request: web::Json<AppointmentRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let appointment = super::found("Appointment", id, appointment_service::update(&db, id, &request).await?)?;
    super::single("appointment", appointment)
}

pub async fn delete(db: web::Data<Database>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    super::deleted("Appointment", id, appointment_service::delete(&db, id).await?)
}
