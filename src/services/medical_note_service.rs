use chrono::Utc;

use crate::database::{Database, Filter};
use crate::models::{Appointment, ClinicalSummary, MedicalNote, MedicalNoteRequest, MedicalNoteResponse};
use crate::utils::{AppError, AppResult};

async fn validate(db: &Database, request: &MedicalNoteRequest) -> AppResult<()> {
    if request.free_text.trim().is_empty() {
        return Err(AppError::InvalidRequest("Note text is required".to_string()));
    }
    if db.collection::<Appointment>().get(request.appointment_id).await?.is_none() {
        return Err(AppError::InvalidRequest(format!(
            "Appointment {} does not exist",
            request.appointment_id
        )));
    }
    Ok(())
}

pub async fn create(db: &Database, request: &MedicalNoteRequest) -> AppResult<MedicalNoteResponse> {
    validate(db, request).await?;

    let mut note = MedicalNote {
        id: 0,
        appointment_id: request.appointment_id,
        free_text: request.free_text.clone(),
        creation_date: Utc::now(),
    };
    db.collection::<MedicalNote>().insert(&mut note).await?;

    log::info!("📝 Medical note {} created for appointment {}", note.id, note.appointment_id);
    Ok(MedicalNoteResponse::from(note))
}

pub async fn get_by_id(db: &Database, id: i64) -> AppResult<Option<MedicalNoteResponse>> {
    Ok(db.collection::<MedicalNote>().get(id).await?.map(MedicalNoteResponse::from))
}

pub async fn get_all(db: &Database) -> AppResult<Vec<MedicalNoteResponse>> {
    let notes = db.collection::<MedicalNote>().all().await?;
    Ok(notes.into_iter().map(MedicalNoteResponse::from).collect())
}

pub async fn get_by_appointment(db: &Database, appointment_id: i64) -> AppResult<Vec<MedicalNoteResponse>> {
    let notes = db
        .collection::<MedicalNote>()
        .find(&Filter::new().eq("appointment_id", appointment_id))
        .await?;
    Ok(notes.into_iter().map(MedicalNoteResponse::from).collect())
}

/// Overwrites the text and appointment link. The creation date is kept.
pub async fn update(db: &Database, id: i64, request: &MedicalNoteRequest) -> AppResult<Option<MedicalNoteResponse>> {
    let notes = db.collection::<MedicalNote>();
    let Some(mut note) = notes.get(id).await? else {
        return Ok(None);
    };

    validate(db, request).await?;

    note.appointment_id = request.appointment_id;
    note.free_text = request.free_text.clone();
    notes.replace(&note).await?;

    Ok(Some(MedicalNoteResponse::from(note)))
}

/// Deletes the note together with its clinical summaries.
pub async fn delete(db: &Database, id: i64) -> AppResult<bool> {
    let deleted = db.collection::<MedicalNote>().delete(id).await?;
    if deleted {
        let summaries = db
            .collection::<ClinicalSummary>()
            .delete_where(&Filter::new().eq("note_id", id))
            .await?;
        log::info!("🗑️ Medical note {} deleted ({} summaries removed)", id, summaries);
    }
    Ok(deleted)
}

/// Removes every note taken during the given appointments, and their summaries.
pub(crate) async fn delete_for_appointments(db: &Database, appointment_ids: &[i64]) -> AppResult<u64> {
    if appointment_ids.is_empty() {
        return Ok(0);
    }

    let notes = db.collection::<MedicalNote>();
    let by_appointment = Filter::new().any_of("appointment_id", appointment_ids.iter().copied());
    let note_ids: Vec<i64> = notes.find(&by_appointment).await?.into_iter().map(|n| n.id).collect();

    if !note_ids.is_empty() {
        db.collection::<ClinicalSummary>()
            .delete_where(&Filter::new().any_of("note_id", note_ids))
            .await?;
    }
    Ok(notes.delete_where(&by_appointment).await?)
}
