//! Fixtures shared by the unit tests.

use chrono::{NaiveDate, NaiveTime, Utc};

use crate::database::Database;
use crate::models::{
    Appointment, AppointmentStatus, ClinicalSummary, Doctor, MedicalNote, PatientRequest, User,
};

pub async fn insert_user(db: &Database, username: &str, full_name: &str) -> User {
    let mut user = User {
        id: 0,
        username: username.to_string(),
        full_name: full_name.to_string(),
        email: format!("{}@medbot.com", username),
        password_hash: String::new(),
        role: "Doctor".to_string(),
        is_active: true,
        created_at: Utc::now(),
    };
    db.collection::<User>().insert(&mut user).await.unwrap();
    user
}

pub async fn insert_doctor(db: &Database, username: &str, full_name: &str) -> Doctor {
    let user = insert_user(db, username, full_name).await;
    let mut doctor = Doctor {
        id: 0,
        user_id: user.id,
        specialty_id: None,
        license_number: None,
    };
    db.collection::<Doctor>().insert(&mut doctor).await.unwrap();
    doctor
}

pub fn patient_request(name: &str, identification_number: &str) -> PatientRequest {
    PatientRequest {
        name: name.to_string(),
        identification_number: identification_number.to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 15).unwrap(),
        phone_number: "555-0100".to_string(),
        email: "patient@medbot.com".to_string(),
    }
}

pub async fn insert_appointment(db: &Database, patient_id: i64, doctor_id: i64, date: &str, time: &str) -> Appointment {
    let mut appointment = Appointment {
        id: 0,
        patient_id,
        doctor_id,
        appointment_date: date.parse().unwrap(),
        appointment_time: NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
        status: AppointmentStatus::Scheduled,
        notes: None,
    };
    db.collection::<Appointment>().insert(&mut appointment).await.unwrap();
    appointment
}

pub async fn insert_note(db: &Database, appointment_id: i64, text: &str) -> MedicalNote {
    let mut note = MedicalNote {
        id: 0,
        appointment_id,
        free_text: text.to_string(),
        creation_date: Utc::now(),
    };
    db.collection::<MedicalNote>().insert(&mut note).await.unwrap();
    note
}

pub async fn insert_summary(db: &Database, note_id: i64, diagnosis: &str) -> ClinicalSummary {
    let mut summary = ClinicalSummary {
        id: 0,
        note_id,
        diagnosis: diagnosis.to_string(),
        treatment: String::new(),
        recommendations: String::new(),
        next_steps: String::new(),
        generated_date: Utc::now(),
    };
    db.collection::<ClinicalSummary>().insert(&mut summary).await.unwrap();
    summary
}
