use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Application user. `role` is the role name copied in at registration time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

entity!(User, "users");

fn default_is_active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub full_name: String,
    pub email: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            user_id: user.id,
            username: user.username,
            full_name: user.full_name,
            email: user.email,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}
