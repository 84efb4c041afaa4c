use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::permissions::{GENERATE_SUMMARIES, VIEW_SUMMARIES};
use crate::database::Database;
use crate::middleware::RequirePermission;
use crate::models::ClinicalSummaryRequest;
use crate::services::clinical_summary_service;
use crate::utils::AppResult;

pub fn routes(cfg: &mut web::ServiceConfig) {
    let view = || RequirePermission::new(VIEW_SUMMARIES);
    let generate = || RequirePermission::new(GENERATE_SUMMARIES);

    super::protected(cfg, "/getAll", view(), web::get().to(get_all));
    super::protected(cfg, "/get/{id}", view(), web::get().to(get_by_id));
    super::protected(cfg, "/getByNote/{noteId}", view(), web::get().to(get_by_note));
    super::protected(cfg, "/getByPatient/{patientId}", view(), web::get().to(get_by_patient));
    super::protected(cfg, "/searchByDiagnosis", view(), web::get().to(search_by_diagnosis));
    super::protected(cfg, "/create", generate(), web::post().to(create));
    super::protected(cfg, "/update/{id}", generate(), web::put().to(update));
    super::protected(cfg, "/delete/{id}", generate(), web::delete().to(delete));
}

#[derive(Debug, Deserialize)]
pub struct KeywordQuery {
    pub keyword: String,
}

pub async fn get_all(db: web::Data<Database>) -> AppResult<HttpResponse> {
    super::listed("summaries", clinical_summary_service::get_all(&db).await?)
}

pub async fn get_by_id(db: web::Data<Database>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let summary = super::found("Clinical summary", id, clinical_summary_service::get_by_id(&db, id).await?)?;
    super::single("summary", summary)
}

pub async fn get_by_note(db: web::Data<Database>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    super::listed("summaries", clinical_summary_service::get_by_note(&db, path.into_inner()).await?)
}

#[utoipa::path(
    get,
    path = "/api/ClinicalSummary/getByPatient/{patientId}",
    tag = "ClinicalSummary",
    params(("patientId" = i64, Path, description = "Patient id")),
    responses((status = 200, description = "The patient's summaries, newest first")),
    security(("bearer_auth" = []))
)]
pub async fn get_by_patient(db: web::Data<Database>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    super::listed("summaries", clinical_summary_service::get_by_patient(&db, path.into_inner()).await?)
}

#[utoipa::path(
    get,
    path = "/api/ClinicalSummary/searchByDiagnosis",
    tag = "ClinicalSummary",
    params(("keyword" = String, Query, description = "Text searched in diagnosis and treatment")),
    responses((status = 200, description = "Matching summaries")),
    security(("bearer_auth" = []))
)]
pub async fn search_by_diagnosis(db: web::Data<Database>, query: web::Query<KeywordQuery>) -> AppResult<HttpResponse> {
    log::info!("🔍 GET /api/ClinicalSummary/searchByDiagnosis - keyword: {}", query.keyword);
    super::listed(
        "summaries",
        clinical_summary_service::search_by_diagnosis(&db, &query.keyword).await?,
    )
}

pub async fn create(db: web::Data<Database>, request: web::Json<ClinicalSummaryRequest>) -> AppResult<HttpResponse> {
    super::created("summary", clinical_summary_service::create(&db, &request).await?)
}

pub async fn update(
    db: web::Data<Database>,
    path: web::Path<i64>,
    request: web::Json<ClinicalSummaryRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let summary = super::found("Clinical summary", id, clinical_summary_service::update(&db, id, &request).await?)?;
    super::single("summary", summary)
}

pub async fn delete(db: web::Data<Database>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    super::deleted("Clinical summary", id, clinical_summary_service::delete(&db, id).await?)
}

#[cfg(test)]
mod tests {
    use crate::api::testing::{test_app, TestState};
    use crate::auth::permissions::{GENERATE_SUMMARIES, MANAGE_MEDICAL_NOTES, VIEW_SUMMARIES};
    use crate::services::patient_service;
    use crate::test_support::{insert_appointment, insert_doctor, patient_request};
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn note_then_summary_then_patient_history() {
        let state = TestState::new().await;
        let patient = patient_service::create(&state.db, &patient_request("Juan Pérez", "1")).await.unwrap();
        let doctor = insert_doctor(&state.db, "house", "Gregory House").await;
        let visit = insert_appointment(&state.db, patient.patient_id, doctor.id, "2025-03-10", "09:00").await;
        let app = test_app!(state);

        let note = test::TestRequest::post()
            .uri("/api/MedicalNote/CreateMedicalNote")
            .insert_header(state.bearer(&[MANAGE_MEDICAL_NOTES]))
            .set_json(json!({ "appointmentId": visit.id, "freeText": "Persistent cough, mild fever" }))
            .to_request();
        let note: Value = test::call_and_read_body_json(&app, note).await;
        let note_id = note["note"]["noteId"].as_i64().unwrap();

        let summary = test::TestRequest::post()
            .uri("/api/ClinicalSummary/create")
            .insert_header(state.bearer(&[GENERATE_SUMMARIES]))
            .set_json(json!({ "noteId": note_id, "diagnosis": "Bronquitis aguda", "treatment": "Reposo" }))
            .to_request();
        assert_eq!(test::call_service(&app, summary).await.status(), StatusCode::CREATED);

        let history = test::TestRequest::get()
            .uri(&format!("/api/ClinicalSummary/getByPatient/{}", patient.patient_id))
            .insert_header(state.bearer(&[VIEW_SUMMARIES]))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, history).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["summaries"][0]["diagnosis"], "Bronquitis aguda");

        let search = test::TestRequest::get()
            .uri("/api/ClinicalSummary/searchByDiagnosis?keyword=bronquitis")
            .insert_header(state.bearer(&[VIEW_SUMMARIES]))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, search).await;
        assert_eq!(body["total"], 1);
    }
}
