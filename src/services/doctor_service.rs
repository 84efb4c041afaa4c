use std::collections::HashMap;

use crate::database::{Database, Filter};
use crate::models::{Doctor, DoctorRequest, DoctorResponse, Specialty, User};
use crate::services::appointment_service;
use crate::utils::{AppError, AppResult};

/// Joins user names and specialty names onto a batch of doctors.
pub(crate) async fn with_details(db: &Database, doctors: Vec<Doctor>) -> AppResult<Vec<DoctorResponse>> {
    if doctors.is_empty() {
        return Ok(Vec::new());
    }

    let user_ids: Vec<i64> = doctors.iter().map(|d| d.user_id).collect();
    let specialty_ids: Vec<i64> = doctors.iter().filter_map(|d| d.specialty_id).collect();

    let names: HashMap<i64, String> = db
        .collection::<User>()
        .find(&Filter::new().any_of("id", user_ids))
        .await?
        .into_iter()
        .map(|user| (user.id, user.full_name))
        .collect();

    let specialties: HashMap<i64, String> = db
        .collection::<Specialty>()
        .find(&Filter::new().any_of("id", specialty_ids))
        .await?
        .into_iter()
        .map(|specialty| (specialty.id, specialty.name))
        .collect();

    Ok(doctors
        .into_iter()
        .map(|doctor| {
            let full_name = names.get(&doctor.user_id).cloned();
            let specialty_name = doctor.specialty_id.and_then(|id| specialties.get(&id).cloned());
            DoctorResponse::new(doctor, full_name, specialty_name)
        })
        .collect())
}

async fn single(db: &Database, doctor: Option<Doctor>) -> AppResult<Option<DoctorResponse>> {
    match doctor {
        Some(doctor) => Ok(with_details(db, vec![doctor]).await?.pop()),
        None => Ok(None),
    }
}

async fn validate_references(db: &Database, request: &DoctorRequest) -> AppResult<()> {
    if db.collection::<User>().get(request.user_id).await?.is_none() {
        return Err(AppError::InvalidRequest(format!("User {} does not exist", request.user_id)));
    }
    if let Some(specialty_id) = request.specialty_id {
        if db.collection::<Specialty>().get(specialty_id).await?.is_none() {
            return Err(AppError::InvalidRequest(format!("Specialty {} does not exist", specialty_id)));
        }
    }
    Ok(())
}

/// A user owns at most one doctor profile.
async fn ensure_single_profile(db: &Database, user_id: i64, except: Option<i64>) -> AppResult<()> {
    let existing = db
        .collection::<Doctor>()
        .find_one(&Filter::new().eq("user_id", user_id))
        .await?;
    match existing {
        Some(doctor) if Some(doctor.id) != except => Err(AppError::Conflict(format!(
            "User {} already has doctor profile {}",
            user_id, doctor.id
        ))),
        _ => Ok(()),
    }
}

pub async fn create(db: &Database, request: &DoctorRequest) -> AppResult<DoctorResponse> {
    validate_references(db, request).await?;
    ensure_single_profile(db, request.user_id, None).await?;

    let mut doctor = Doctor {
        id: 0,
        user_id: request.user_id,
        specialty_id: request.specialty_id,
        license_number: request.license_number.clone(),
    };
    db.collection::<Doctor>().insert(&mut doctor).await?;

    log::info!("✅ Doctor {} created for user {}", doctor.id, doctor.user_id);
    single(db, Some(doctor))
        .await?
        .ok_or_else(|| AppError::Internal("Doctor vanished after insert".to_string()))
}

pub async fn get_by_id(db: &Database, id: i64) -> AppResult<Option<DoctorResponse>> {
    let doctor = db.collection::<Doctor>().get(id).await?;
    single(db, doctor).await
}

pub async fn get_all(db: &Database) -> AppResult<Vec<DoctorResponse>> {
    let doctors = db.collection::<Doctor>().all().await?;
    with_details(db, doctors).await
}

pub async fn get_by_user_id(db: &Database, user_id: i64) -> AppResult<Option<DoctorResponse>> {
    let doctor = db
        .collection::<Doctor>()
        .find_one(&Filter::new().eq("user_id", user_id))
        .await?;
    single(db, doctor).await
}

pub async fn update(db: &Database, id: i64, request: &DoctorRequest) -> AppResult<Option<DoctorResponse>> {
    let doctors = db.collection::<Doctor>();
    let Some(mut doctor) = doctors.get(id).await? else {
        return Ok(None);
    };

    validate_references(db, request).await?;
    ensure_single_profile(db, request.user_id, Some(id)).await?;

    doctor.user_id = request.user_id;
    doctor.specialty_id = request.specialty_id;
    doctor.license_number = request.license_number.clone();
    doctors.replace(&doctor).await?;

    single(db, Some(doctor)).await
}

/// Deletes the doctor and every appointment booked with them.
pub async fn delete(db: &Database, id: i64) -> AppResult<bool> {
    let deleted = db.collection::<Doctor>().delete(id).await?;
    if deleted {
        let appointments =
            appointment_service::delete_matching(db, &Filter::new().eq("doctor_id", id)).await?;
        log::info!("🗑️ Doctor {} deleted ({} appointments removed)", id, appointments);
    }
    Ok(deleted)
}

pub(crate) async fn delete_for_user(db: &Database, user_id: i64) -> AppResult<u64> {
    let doctors = db
        .collection::<Doctor>()
        .find(&Filter::new().eq("user_id", user_id))
        .await?;

    let mut removed = 0;
    for doctor in doctors {
        if delete(db, doctor.id).await? {
            removed += 1;
        }
    }
    Ok(removed)
}
