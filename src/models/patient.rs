use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub full_name: String,
    pub identification_number: String,
    pub date_of_birth: NaiveDate,
    pub phone: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

entity!(Patient, "patients");

impl Patient {
    /// Completed years between birth and `today`.
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        let birth = self.date_of_birth;
        let mut years = today.year() - birth.year();
        if (today.month(), today.day()) < (birth.month(), birth.day()) {
            years -= 1;
        }
        years.max(0) as u32
    }
}

/// Body for creating or updating a patient. Updates overwrite every field.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientRequest {
    pub name: String,
    pub identification_number: String,
    pub date_of_birth: NaiveDate,
    pub phone_number: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientResponse {
    pub patient_id: i64,
    pub name: String,
    pub identification_number: String,
    pub date_of_birth: NaiveDate,
    pub age: u32,
    pub phone_number: String,
    pub email: String,
}

impl From<Patient> for PatientResponse {
    fn from(patient: Patient) -> Self {
        let age = patient.age_on(Utc::now().date_naive());
        PatientResponse {
            patient_id: patient.id,
            name: patient.full_name,
            identification_number: patient.identification_number,
            date_of_birth: patient.date_of_birth,
            age,
            phone_number: patient.phone,
            email: patient.email,
        }
    }
}
