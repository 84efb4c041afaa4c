use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// Link row: user → role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRole {
    pub id: i64,
    pub user_id: i64,
    pub role_id: i64,
}

/// Link row: role → permission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolePermission {
    pub id: i64,
    pub role_id: i64,
    pub permission_id: i64,
}

entity!(Role, "roles");
entity!(Permission, "permissions");
entity!(UserRole, "user_roles");
entity!(RolePermission, "role_permissions");

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoleRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePermissionRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RolePermissionRequest {
    pub role_id: i64,
    pub permission_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    pub role_id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionResponse {
    pub permission_id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        RoleResponse {
            role_id: role.id,
            name: role.name,
            description: role.description,
        }
    }
}

impl From<Permission> for PermissionResponse {
    fn from(permission: Permission) -> Self {
        PermissionResponse {
            permission_id: permission.id,
            name: permission.name,
            description: permission.description,
        }
    }
}
