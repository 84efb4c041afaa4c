use chrono::Utc;

use crate::database::{Database, Filter};
use crate::models::{Appointment, ClinicalSummary, ClinicalSummaryRequest, ClinicalSummaryResponse, MedicalNote};
use crate::utils::{normalize_for_search, AppError, AppResult};

async fn validate(db: &Database, request: &ClinicalSummaryRequest) -> AppResult<()> {
    if request.diagnosis.trim().is_empty() {
        return Err(AppError::InvalidRequest("Diagnosis is required".to_string()));
    }
    if db.collection::<MedicalNote>().get(request.note_id).await?.is_none() {
        return Err(AppError::InvalidRequest(format!("Medical note {} does not exist", request.note_id)));
    }
    Ok(())
}

fn newest_first(summaries: &mut [ClinicalSummary]) {
    summaries.sort_by(|a, b| b.generated_date.cmp(&a.generated_date).then(b.id.cmp(&a.id)));
}

pub async fn create(db: &Database, request: &ClinicalSummaryRequest) -> AppResult<ClinicalSummaryResponse> {
    validate(db, request).await?;

    let mut summary = ClinicalSummary {
        id: 0,
        note_id: request.note_id,
        diagnosis: request.diagnosis.clone(),
        treatment: request.treatment.clone(),
        recommendations: request.recommendations.clone(),
        next_steps: request.next_steps.clone(),
        generated_date: Utc::now(),
    };
    db.collection::<ClinicalSummary>().insert(&mut summary).await?;

    log::info!("🩺 Clinical summary {} created for note {}", summary.id, summary.note_id);
    Ok(ClinicalSummaryResponse::from(summary))
}

pub async fn get_by_id(db: &Database, id: i64) -> AppResult<Option<ClinicalSummaryResponse>> {
    Ok(db
        .collection::<ClinicalSummary>()
        .get(id)
        .await?
        .map(ClinicalSummaryResponse::from))
}

pub async fn get_all(db: &Database) -> AppResult<Vec<ClinicalSummaryResponse>> {
    let mut summaries = db.collection::<ClinicalSummary>().all().await?;
    newest_first(&mut summaries);
    Ok(summaries.into_iter().map(ClinicalSummaryResponse::from).collect())
}

pub async fn get_by_note(db: &Database, note_id: i64) -> AppResult<Vec<ClinicalSummaryResponse>> {
    let mut summaries = db
        .collection::<ClinicalSummary>()
        .find(&Filter::new().eq("note_id", note_id))
        .await?;
    newest_first(&mut summaries);
    Ok(summaries.into_iter().map(ClinicalSummaryResponse::from).collect())
}

/// Summaries reached through patient → appointments → notes, newest first.
pub async fn get_by_patient(db: &Database, patient_id: i64) -> AppResult<Vec<ClinicalSummaryResponse>> {
    let appointment_ids: Vec<i64> = db
        .collection::<Appointment>()
        .find(&Filter::new().eq("patient_id", patient_id))
        .await?
        .into_iter()
        .map(|appointment| appointment.id)
        .collect();
    if appointment_ids.is_empty() {
        return Ok(Vec::new());
    }

    let note_ids: Vec<i64> = db
        .collection::<MedicalNote>()
        .find(&Filter::new().any_of("appointment_id", appointment_ids))
        .await?
        .into_iter()
        .map(|note| note.id)
        .collect();
    if note_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut summaries = db
        .collection::<ClinicalSummary>()
        .find(&Filter::new().any_of("note_id", note_ids))
        .await?;
    newest_first(&mut summaries);
    Ok(summaries.into_iter().map(ClinicalSummaryResponse::from).collect())
}

/// Accent- and case-insensitive keyword match over diagnosis and treatment.
pub async fn search_by_diagnosis(db: &Database, keyword: &str) -> AppResult<Vec<ClinicalSummaryResponse>> {
    let needle = normalize_for_search(keyword);
    if needle.is_empty() {
        return Ok(Vec::new());
    }

    let mut summaries: Vec<ClinicalSummary> = db
        .collection::<ClinicalSummary>()
        .all()
        .await?
        .into_iter()
        .filter(|summary| {
            normalize_for_search(&summary.diagnosis).contains(&needle)
                || normalize_for_search(&summary.treatment).contains(&needle)
        })
        .collect();
    newest_first(&mut summaries);
    Ok(summaries.into_iter().map(ClinicalSummaryResponse::from).collect())
}

/// Overwrites the clinical fields. `generated_date` is kept.
pub async fn update(
    db: &Database,
    id: i64,
    request: &ClinicalSummaryRequest,
) -> AppResult<Option<ClinicalSummaryResponse>> {
    let summaries = db.collection::<ClinicalSummary>();
    let Some(mut summary) = summaries.get(id).await? else {
        return Ok(None);
    };

    validate(db, request).await?;

    summary.note_id = request.note_id;
    summary.diagnosis = request.diagnosis.clone();
    summary.treatment = request.treatment.clone();
    summary.recommendations = request.recommendations.clone();
    summary.next_steps = request.next_steps.clone();
    summaries.replace(&summary).await?;

    Ok(Some(ClinicalSummaryResponse::from(summary)))
}

pub async fn delete(db: &Database, id: i64) -> AppResult<bool> {
    let deleted = db.collection::<ClinicalSummary>().delete(id).await?;
    if deleted {
        log::info!("🗑️ Clinical summary {} deleted", id);
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::patient_service;
    use crate::test_support::{insert_appointment, insert_doctor, insert_note, patient_request};

    fn request(note_id: i64, diagnosis: &str, treatment: &str) -> ClinicalSummaryRequest {
        ClinicalSummaryRequest {
            note_id,
            diagnosis: diagnosis.into(),
            treatment: treatment.into(),
            recommendations: String::new(),
            next_steps: String::new(),
        }
    }

    #[tokio::test]
    async fn patient_history_follows_appointments_and_notes() {
        let db = Database::in_memory();
        let juan = patient_service::create(&db, &patient_request("Juan Pérez", "1")).await.unwrap();
        let ana = patient_service::create(&db, &patient_request("Ana Ruiz", "2")).await.unwrap();
        let doctor = insert_doctor(&db, "house", "Gregory House").await;

        let juan_visit = insert_appointment(&db, juan.patient_id, doctor.id, "2025-03-10", "09:00").await;
        let ana_visit = insert_appointment(&db, ana.patient_id, doctor.id, "2025-03-10", "10:00").await;
        let juan_note = insert_note(&db, juan_visit.id, "Cough").await;
        let ana_note = insert_note(&db, ana_visit.id, "Fever").await;

        let bronchitis = create(&db, &request(juan_note.id, "Bronquitis", "Rest")).await.unwrap();
        create(&db, &request(ana_note.id, "Influenza", "Fluids")).await.unwrap();

        assert_eq!(get_by_patient(&db, juan.patient_id).await.unwrap(), vec![bronchitis.clone()]);
        assert_eq!(get_by_note(&db, juan_note.id).await.unwrap(), vec![bronchitis]);
        assert!(get_by_patient(&db, 999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_matches_diagnosis_or_treatment_ignoring_accents() {
        let db = Database::in_memory();
        let note = insert_note(&db, 1, "text").await;
        create(&db, &request(note.id, "Hipertensión arterial", "Losartán")).await.unwrap();
        create(&db, &request(note.id, "Diabetes tipo 2", "Metformina")).await.unwrap();

        assert_eq!(search_by_diagnosis(&db, "HIPERTENSION").await.unwrap().len(), 1);
        assert_eq!(search_by_diagnosis(&db, "metformina").await.unwrap().len(), 1);
        assert!(search_by_diagnosis(&db, "asma").await.unwrap().is_empty());
        assert!(search_by_diagnosis(&db, "").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn summary_must_reference_an_existing_note() {
        let db = Database::in_memory();
        let err = create(&db, &request(5, "Influenza", "Fluids")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn update_and_delete() {
        let db = Database::in_memory();
        let note = insert_note(&db, 1, "text").await;
        let created = create(&db, &request(note.id, "Influenza", "Fluids")).await.unwrap();

        let updated = update(&db, created.summary_id, &request(note.id, "Influenza A", "Oseltamivir"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.summary_id, created.summary_id);
        assert_eq!(updated.generated_date, created.generated_date);
        assert_eq!(updated.treatment, "Oseltamivir");
        assert!(update(&db, 99, &request(note.id, "x", "y")).await.unwrap().is_none());

        assert!(delete(&db, created.summary_id).await.unwrap());
        assert!(!delete(&db, created.summary_id).await.unwrap());
    }
}
