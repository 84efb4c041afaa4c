use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::jwt::TokenSubject;
use crate::auth::password::{hash_password, verify_against_dummy, verify_password};
use crate::auth::permissions::DEFAULT_ROLE;
use crate::auth::JwtManager;
use crate::database::{Database, Filter};
use crate::models::{Doctor, User};
use crate::services::role_service;
use crate::utils::{AppError, AppResult};

// Request/Response structures
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
    pub specialty_id: Option<i64>,
    pub license_number: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyTokenResponse {
    pub valid: bool,
    pub user_id: String,
    pub username: String,
    pub role: String,
    pub permissions: Vec<String>,
    pub exp: usize,
}

/// A freshly signed session token and who it belongs to.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub user_id: i64,
    pub username: String,
    pub role: String,
    pub permissions: Vec<String>,
    pub expires_at: DateTime<Utc>,
}

/// Checks credentials and issues a token. Unknown user, wrong password and a
/// deactivated account all come back as `None`.
pub async fn login(db: &Database, jwt: &JwtManager, request: &LoginRequest) -> AppResult<Option<IssuedToken>> {
    let user = db
        .collection::<User>()
        .find_one(&Filter::new().eq("username", request.username.as_str()))
        .await?;

    let Some(user) = user else {
        verify_against_dummy(&request.password);
        return Ok(None);
    };

    if !verify_password(&request.password, &user.password_hash)? || !user.is_active {
        return Ok(None);
    }

    let permissions = role_service::permission_names_for_user(db, user.id).await?;

    let (token, claims) = jwt
        .issue(TokenSubject {
            user_id: user.id,
            username: &user.username,
            email: &user.email,
            role: &user.role,
            permissions,
        })
        .map_err(AppError::Internal)?;

    let expires_at = Utc
        .timestamp_opt(claims.exp as i64, 0)
        .single()
        .unwrap_or_else(Utc::now);

    Ok(Some(IssuedToken {
        token,
        user_id: user.id,
        username: user.username,
        role: user.role,
        permissions: claims.permissions,
        expires_at,
    }))
}

/// Creates a user under the default role and provisions its Doctor record.
pub async fn register(db: &Database, request: &RegisterRequest, hash_cost: u32) -> AppResult<String> {
    let username = request.username.trim();
    if username.is_empty() || request.password.is_empty() {
        return Err(AppError::InvalidRequest("Username and password are required".to_string()));
    }

    let users = db.collection::<User>();
    if users.exists(&Filter::new().eq("username", username)).await? {
        return Err(AppError::Conflict(format!("Username '{}' is already taken", username)));
    }

    let role = role_service::find_role_by_name(db, DEFAULT_ROLE)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Default role '{}' is not configured", DEFAULT_ROLE)))?;

    let mut user = User {
        id: 0,
        username: username.to_string(),
        full_name: request.full_name.clone(),
        email: request.email.clone(),
        password_hash: hash_password(&request.password, hash_cost)?,
        role: role.name.clone(),
        is_active: true,
        created_at: Utc::now(),
    };
    users.insert(&mut user).await?;

    role_service::assign_role(db, user.id, role.id).await?;

    let mut doctor = Doctor {
        id: 0,
        user_id: user.id,
        specialty_id: request.specialty_id,
        license_number: request.license_number.clone(),
    };
    db.collection::<Doctor>().insert(&mut doctor).await?;

    log::info!("✅ User registered: {} (user {}, doctor {})", user.username, user.id, doctor.id);
    Ok("User registered successfully".to_string())
}
