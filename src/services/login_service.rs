use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::JwtManager;
use crate::database::Database;
use crate::services::{auth_service, doctor_service};
use crate::services::auth_service::LoginRequest;
use crate::utils::AppResult;

/// Login payload returned to clients: the session token plus the doctor
/// profile of the user, when there is one.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub username: String,
    pub role: String,
    pub permissions: Vec<String>,
    pub doctor_id: Option<i64>,
    pub expires_at: DateTime<Utc>,
}

/// Authenticates, then looks up the caller's doctor record. The two reads are
/// independent; a user without a doctor row still logs in.
pub async fn login(db: &Database, jwt: &JwtManager, request: &LoginRequest) -> AppResult<Option<LoginResponse>> {
    let Some(issued) = auth_service::login(db, jwt, request).await? else {
        return Ok(None);
    };

    let doctor_id = doctor_service::get_by_user_id(db, issued.user_id)
        .await?
        .map(|doctor| doctor.doctor_id);

    Ok(Some(LoginResponse {
        success: true,
        token: issued.token,
        username: issued.username,
        role: issued.role,
        permissions: issued.permissions,
        doctor_id,
        expires_at: issued.expires_at,
    }))
}
