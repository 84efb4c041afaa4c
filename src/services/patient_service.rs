use chrono::Utc;

use crate::database::{Database, Filter};
use crate::models::{Patient, PatientRequest, PatientResponse};
use crate::services::appointment_service;
use crate::utils::{normalize_for_search, AppError, AppResult};

fn validate(request: &PatientRequest) -> AppResult<()> {
    if request.name.trim().is_empty() {
        return Err(AppError::InvalidRequest("Patient name is required".to_string()));
    }
    if request.identification_number.trim().is_empty() {
        return Err(AppError::InvalidRequest("Identification number is required".to_string()));
    }
    if !request.email.is_empty() && !request.email.contains('@') {
        return Err(AppError::InvalidRequest(format!("Invalid email '{}'", request.email)));
    }
    Ok(())
}

async fn ensure_unique_identification(db: &Database, number: &str, except: Option<i64>) -> AppResult<()> {
    let clash = db
        .collection::<Patient>()
        .find_one(&Filter::new().eq("identification_number", number))
        .await?;
    match clash {
        Some(existing) if Some(existing.id) != except => Err(AppError::Conflict(format!(
            "A patient with identification number '{}' already exists",
            number
        ))),
        _ => Ok(()),
    }
}

pub async fn create(db: &Database, request: &PatientRequest) -> AppResult<PatientResponse> {
    validate(request)?;
    let identification_number = request.identification_number.trim().to_string();
    ensure_unique_identification(db, &identification_number, None).await?;

    let mut patient = Patient {
        id: 0,
        full_name: request.name.trim().to_string(),
        identification_number,
        date_of_birth: request.date_of_birth,
        phone: request.phone_number.clone(),
        email: request.email.clone(),
        created_at: Utc::now(),
    };
    db.collection::<Patient>().insert(&mut patient).await?;

    log::info!("✅ Patient {} created", patient.id);
    Ok(PatientResponse::from(patient))
}

pub async fn get_by_id(db: &Database, id: i64) -> AppResult<Option<PatientResponse>> {
    Ok(db.collection::<Patient>().get(id).await?.map(PatientResponse::from))
}

pub async fn get_all(db: &Database) -> AppResult<Vec<PatientResponse>> {
    let mut patients = db.collection::<Patient>().all().await?;
    patients.sort_by(|a, b| a.full_name.cmp(&b.full_name));
    Ok(patients.into_iter().map(PatientResponse::from).collect())
}

pub async fn get_by_identification_number(db: &Database, number: &str) -> AppResult<Option<PatientResponse>> {
    Ok(db
        .collection::<Patient>()
        .find_one(&Filter::new().eq("identification_number", number.trim()))
        .await?
        .map(PatientResponse::from))
}

/// Accent- and case-insensitive substring search on the full name.
pub async fn search_by_name(db: &Database, name: &str) -> AppResult<Vec<PatientResponse>> {
    let needle = normalize_for_search(name);
    if needle.is_empty() {
        return Ok(Vec::new());
    }

    let mut matches: Vec<Patient> = db
        .collection::<Patient>()
        .all()
        .await?
        .into_iter()
        .filter(|patient| normalize_for_search(&patient.full_name).contains(&needle))
        .collect();
    matches.sort_by(|a, b| a.full_name.cmp(&b.full_name));

    Ok(matches.into_iter().map(PatientResponse::from).collect())
}

pub async fn update(db: &Database, id: i64, request: &PatientRequest) -> AppResult<Option<PatientResponse>> {
    let patients = db.collection::<Patient>();
    let Some(mut patient) = patients.get(id).await? else {
        return Ok(None);
    };

    validate(request)?;
    let identification_number = request.identification_number.trim().to_string();
    ensure_unique_identification(db, &identification_number, Some(id)).await?;

    patient.full_name = request.name.trim().to_string();
    patient.identification_number = identification_number;
    patient.date_of_birth = request.date_of_birth;
    patient.phone = request.phone_number.clone();
    patient.email = request.email.clone();
    patients.replace(&patient).await?;

    Ok(Some(PatientResponse::from(patient)))
}

/// Deletes the patient along with its appointment history.
pub async fn delete(db: &Database, id: i64) -> AppResult<bool> {
    let deleted = db.collection::<Patient>().delete(id).await?;
    if deleted {
        let appointments =
            appointment_service::delete_matching(db, &Filter::new().eq("patient_id", id)).await?;
        log::info!("🗑️ Patient {} deleted ({} appointments removed)", id, appointments);
    }
    Ok(deleted)
}
