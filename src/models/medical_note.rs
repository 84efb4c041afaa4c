use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalNote {
    pub id: i64,
    pub appointment_id: i64,
    pub free_text: String,
    pub creation_date: DateTime<Utc>,
}

entity!(MedicalNote, "medical_notes");

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MedicalNoteRequest {
    pub appointment_id: i64,
    pub free_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MedicalNoteResponse {
    pub note_id: i64,
    pub appointment_id: i64,
    pub free_text: String,
    pub creation_date: DateTime<Utc>,
}

impl From<MedicalNote> for MedicalNoteResponse {
    fn from(note: MedicalNote) -> Self {
        MedicalNoteResponse {
            note_id: note.id,
            appointment_id: note.appointment_id,
            free_text: note.free_text,
            creation_date: note.creation_date,
        }
    }
}
