use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured summary generated from a single medical note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicalSummary {
    pub id: i64,
    pub note_id: i64,
    pub diagnosis: String,
    pub treatment: String,
    pub recommendations: String,
    pub next_steps: String,
    pub generated_date: DateTime<Utc>,
}

entity!(ClinicalSummary, "clinical_summaries");

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalSummaryRequest {
    pub note_id: i64,
    pub diagnosis: String,
    pub treatment: String,
    #[serde(default)]
    pub recommendations: String,
    #[serde(default)]
    pub next_steps: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalSummaryResponse {
    pub summary_id: i64,
    pub note_id: i64,
    pub diagnosis: String,
    pub treatment: String,
    pub recommendations: String,
    pub next_steps: String,
    pub generated_date: DateTime<Utc>,
}

impl From<ClinicalSummary> for ClinicalSummaryResponse {
    fn from(summary: ClinicalSummary) -> Self {
        ClinicalSummaryResponse {
            summary_id: summary.id,
            note_id: summary.note_id,
            diagnosis: summary.diagnosis,
            treatment: summary.treatment,
            recommendations: summary.recommendations,
            next_steps: summary.next_steps,
            generated_date: summary.generated_date,
        }
    }
}
