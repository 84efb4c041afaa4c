use std::collections::HashMap;

use chrono::NaiveDate;

use crate::database::{Database, Filter};
use crate::models::{
    Appointment, AppointmentDetails, AppointmentRequest, AppointmentResponse, Doctor, Patient, PatientResponse,
};
use crate::services::{doctor_service, medical_note_service};
use crate::utils::{AppError, AppResult};

async fn validate_references(db: &Database, request: &AppointmentRequest) -> AppResult<()> {
    if db.collection::<Patient>().get(request.patient_id).await?.is_none() {
        return Err(AppError::InvalidRequest(format!("Patient {} does not exist", request.patient_id)));
    }
    if db.collection::<Doctor>().get(request.doctor_id).await?.is_none() {
        return Err(AppError::InvalidRequest(format!("Doctor {} does not exist", request.doctor_id)));
    }
    Ok(())
}

/// Attaches patient and doctor data to each appointment.
async fn with_details(db: &Database, appointments: Vec<Appointment>) -> AppResult<Vec<AppointmentDetails>> {
    if appointments.is_empty() {
        return Ok(Vec::new());
    }

    let patient_ids: Vec<i64> = appointments.iter().map(|a| a.patient_id).collect();
    let doctor_ids: Vec<i64> = appointments.iter().map(|a| a.doctor_id).collect();

    let patients: HashMap<i64, PatientResponse> = db
        .collection::<Patient>()
        .find(&Filter::new().any_of("id", patient_ids))
        .await?
        .into_iter()
        .map(|patient| (patient.id, PatientResponse::from(patient)))
        .collect();

    let doctors = db
        .collection::<Doctor>()
        .find(&Filter::new().any_of("id", doctor_ids))
        .await?;
    let doctors: HashMap<i64, _> = doctor_service::with_details(db, doctors)
        .await?
        .into_iter()
        .map(|doctor| (doctor.doctor_id, doctor))
        .collect();

    Ok(appointments
        .into_iter()
        .map(|appointment| AppointmentDetails {
            patient: patients.get(&appointment.patient_id).cloned(),
            doctor: doctors.get(&appointment.doctor_id).cloned(),
            appointment: AppointmentResponse::from(appointment),
        })
        .collect())
}

fn by_schedule(appointments: &mut [Appointment]) {
    appointments.sort_by(|a, b| {
        (a.appointment_date, a.appointment_time, a.id).cmp(&(b.appointment_date, b.appointment_time, b.id))
    });
}

pub async fn create(db: &Database, request: &AppointmentRequest) -> AppResult<AppointmentResponse> {
    validate_references(db, request).await?;

    let mut appointment = Appointment {
        id: 0,
        patient_id: request.patient_id,
        doctor_id: request.doctor_id,
        appointment_date: request.appointment_date,
        appointment_time: request.appointment_time,
        status: request.status,
        notes: request.notes.clone(),
    };
    db.collection::<Appointment>().insert(&mut appointment).await?;

    log::info!(
        "📅 Appointment {} created for patient {} with doctor {} on {} {}",
        appointment.id,
        appointment.patient_id,
        appointment.doctor_id,
        appointment.appointment_date,
        appointment.appointment_time
    );
    Ok(AppointmentResponse::from(appointment))
}

pub async fn get_by_id(db: &Database, id: i64) -> AppResult<Option<AppointmentDetails>> {
    match db.collection::<Appointment>().get(id).await? {
        Some(appointment) => Ok(with_details(db, vec![appointment]).await?.pop()),
        None => Ok(None),
    }
}

pub async fn get_all(db: &Database) -> AppResult<Vec<AppointmentResponse>> {
    let mut appointments = db.collection::<Appointment>().all().await?;
    by_schedule(&mut appointments);
    Ok(appointments.into_iter().map(AppointmentResponse::from).collect())
}

pub async fn get_by_doctor(db: &Database, doctor_id: i64) -> AppResult<Vec<AppointmentDetails>> {
    let mut appointments = db
        .collection::<Appointment>()
        .find(&Filter::new().eq("doctor_id", doctor_id))
        .await?;
    by_schedule(&mut appointments);
    with_details(db, appointments).await
}

/// Appointments of one doctor on one calendar day, earliest first.
pub async fn get_by_doctor_and_date(
    db: &Database,
    doctor_id: i64,
    date: NaiveDate,
) -> AppResult<Vec<AppointmentDetails>> {
    let filter = Filter::new()
        .eq("doctor_id", doctor_id)
        .eq("appointment_date", date.to_string());
    let mut appointments = db.collection::<Appointment>().find(&filter).await?;
    by_schedule(&mut appointments);
    with_details(db, appointments).await
}

pub async fn get_by_patient(db: &Database, patient_id: i64) -> AppResult<Vec<AppointmentDetails>> {
    let mut appointments = db
        .collection::<Appointment>()
        .find(&Filter::new().eq("patient_id", patient_id))
        .await?;
    by_schedule(&mut appointments);
    with_details(db, appointments).await
}

/// Overwrites every mutable field. A missing id yields `None` and writes nothing.
pub async fn update(
    db: &Database,
    id: i64,
    request: &AppointmentRequest,
) -> AppResult<Option<AppointmentResponse>> {
    let appointments = db.collection::<Appointment>();
    let Some(mut appointment) = appointments.get(id).await? else {
        return Ok(None);
    };

    validate_references(db, request).await?;

    appointment.patient_id = request.patient_id;
    appointment.doctor_id = request.doctor_id;
    appointment.appointment_date = request.appointment_date;
    appointment.appointment_time = request.appointment_time;
    appointment.status = request.status;
    appointment.notes = request.notes.clone();
    appointments.replace(&appointment).await?;

    Ok(Some(AppointmentResponse::from(appointment)))
}

/// Deletes the appointment and the notes and summaries hanging off it.
pub async fn delete(db: &Database, id: i64) -> AppResult<bool> {
    let deleted = db.collection::<Appointment>().delete(id).await?;
    if deleted {
        let notes = medical_note_service::delete_for_appointments(db, &[id]).await?;
        log::info!("🗑️ Appointment {} deleted ({} notes removed)", id, notes);
    }
    Ok(deleted)
}

/// Cascade used when a patient or doctor goes away.
pub(crate) async fn delete_matching(db: &Database, filter: &Filter) -> AppResult<u64> {
    let appointments = db.collection::<Appointment>();
    let ids: Vec<i64> = appointments.find(filter).await?.into_iter().map(|a| a.id).collect();
    if ids.is_empty() {
        return Ok(0);
    }

    medical_note_service::delete_for_appointments(db, &ids).await?;
    Ok(appointments.delete_where(&Filter::new().any_of("id", ids)).await?)
}
