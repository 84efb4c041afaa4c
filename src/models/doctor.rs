use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub user_id: i64,
    pub specialty_id: Option<i64>,
    pub license_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Specialty {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

entity!(Doctor, "doctors");
entity!(Specialty, "specialties");

/// Body for creating or updating a doctor. Updates overwrite every field.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoctorRequest {
    pub user_id: i64,
    pub specialty_id: Option<i64>,
    pub license_number: Option<String>,
}

/// Doctor with the display data joined in from its user and specialty.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoctorResponse {
    pub doctor_id: i64,
    pub user_id: i64,
    pub full_name: Option<String>,
    pub specialty_id: Option<i64>,
    pub specialty_name: Option<String>,
    pub license_number: Option<String>,
}

impl DoctorResponse {
    pub fn new(doctor: Doctor, full_name: Option<String>, specialty_name: Option<String>) -> Self {
        DoctorResponse {
            doctor_id: doctor.id,
            user_id: doctor.user_id,
            full_name,
            specialty_id: doctor.specialty_id,
            specialty_name,
            license_number: doctor.license_number,
        }
    }
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpecialtyRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpecialtyResponse {
    pub specialty_id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl From<Specialty> for SpecialtyResponse {
    fn from(specialty: Specialty) -> Self {
        SpecialtyResponse {
            specialty_id: specialty.id,
            name: specialty.name,
            description: specialty.description,
        }
    }
}
