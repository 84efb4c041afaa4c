use std::collections::BTreeSet;

use crate::database::{Database, Filter};
use crate::models::{
    CreatePermissionRequest, CreateRoleRequest, Permission, PermissionResponse, Role, RolePermission,
    RoleResponse, UserRole,
};
use crate::utils::{AppError, AppResult};

/// Permission names reachable from a user through
/// UserRole → RolePermission → Permission, de-duplicated and sorted.
pub async fn permission_names_for_user(db: &Database, user_id: i64) -> AppResult<Vec<String>> {
    let role_ids: Vec<i64> = db
        .collection::<UserRole>()
        .find(&Filter::new().eq("user_id", user_id))
        .await?
        .into_iter()
        .map(|link| link.role_id)
        .collect();

    if role_ids.is_empty() {
        return Ok(Vec::new());
    }

    let permission_ids: BTreeSet<i64> = db
        .collection::<RolePermission>()
        .find(&Filter::new().any_of("role_id", role_ids))
        .await?
        .into_iter()
        .map(|grant| grant.permission_id)
        .collect();

    if permission_ids.is_empty() {
        return Ok(Vec::new());
    }

    let names: BTreeSet<String> = db
        .collection::<Permission>()
        .find(&Filter::new().any_of("id", permission_ids))
        .await?
        .into_iter()
        .map(|permission| permission.name)
        .collect();

    Ok(names.into_iter().collect())
}

pub async fn find_role_by_name(db: &Database, name: &str) -> AppResult<Option<Role>> {
    Ok(db.collection::<Role>().find_one(&Filter::new().eq("name", name)).await?)
}

pub async fn find_permission_by_name(db: &Database, name: &str) -> AppResult<Option<Permission>> {
    Ok(db
        .collection::<Permission>()
        .find_one(&Filter::new().eq("name", name))
        .await?)
}

pub async fn get_all_roles(db: &Database) -> AppResult<Vec<RoleResponse>> {
    let roles = db.collection::<Role>().all().await?;
    Ok(roles.into_iter().map(RoleResponse::from).collect())
}

pub async fn create_role(db: &Database, request: &CreateRoleRequest) -> AppResult<RoleResponse> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidRequest("Role name is required".to_string()));
    }
    if find_role_by_name(db, name).await?.is_some() {
        return Err(AppError::Conflict(format!("Role '{}' already exists", name)));
    }

    let mut role = Role {
        id: 0,
        name: name.to_string(),
        description: request.description.clone(),
    };
    db.collection::<Role>().insert(&mut role).await?;

    log::info!("✅ Role created: {} (id {})", role.name, role.id);
    Ok(RoleResponse::from(role))
}

pub async fn get_all_permissions(db: &Database) -> AppResult<Vec<PermissionResponse>> {
    let permissions = db.collection::<Permission>().all().await?;
    Ok(permissions.into_iter().map(PermissionResponse::from).collect())
}

pub async fn create_permission(db: &Database, request: &CreatePermissionRequest) -> AppResult<PermissionResponse> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidRequest("Permission name is required".to_string()));
    }
    if find_permission_by_name(db, name).await?.is_some() {
        return Err(AppError::Conflict(format!("Permission '{}' already exists", name)));
    }

    let mut permission = Permission {
        id: 0,
        name: name.to_string(),
        description: request.description.clone(),
    };
    db.collection::<Permission>().insert(&mut permission).await?;

    log::info!("✅ Permission created: {} (id {})", permission.name, permission.id);
    Ok(PermissionResponse::from(permission))
}

/// Permissions granted to a role, or `None` if the role does not exist.
pub async fn get_role_permissions(db: &Database, role_id: i64) -> AppResult<Option<Vec<PermissionResponse>>> {
    if db.collection::<Role>().get(role_id).await?.is_none() {
        return Ok(None);
    }

    let permission_ids: Vec<i64> = db
        .collection::<RolePermission>()
        .find(&Filter::new().eq("role_id", role_id))
        .await?
        .into_iter()
        .map(|grant| grant.permission_id)
        .collect();

    let permissions = db
        .collection::<Permission>()
        .find(&Filter::new().any_of("id", permission_ids))
        .await?;

    Ok(Some(permissions.into_iter().map(PermissionResponse::from).collect()))
}

/// Grants a permission to a role. Granting twice is a no-op.
pub async fn grant_permission(db: &Database, role_id: i64, permission_id: i64) -> AppResult<()> {
    if db.collection::<Role>().get(role_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Role {} not found", role_id)));
    }
    if db.collection::<Permission>().get(permission_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Permission {} not found", permission_id)));
    }

    let grants = db.collection::<RolePermission>();
    let existing = Filter::new().eq("role_id", role_id).eq("permission_id", permission_id);
    if grants.exists(&existing).await? {
        return Ok(());
    }

    let mut grant = RolePermission {
        id: 0,
        role_id,
        permission_id,
    };
    grants.insert(&mut grant).await?;

    log::info!("🔑 Granted permission {} to role {}", permission_id, role_id);
    Ok(())
}

/// Removes a grant. Returns whether one existed.
pub async fn revoke_permission(db: &Database, role_id: i64, permission_id: i64) -> AppResult<bool> {
    let removed = db
        .collection::<RolePermission>()
        .delete_where(&Filter::new().eq("role_id", role_id).eq("permission_id", permission_id))
        .await?;

    if removed > 0 {
        log::info!("🔒 Revoked permission {} from role {}", permission_id, role_id);
    }
    Ok(removed > 0)
}

/// Links a user to a role.
pub async fn assign_role(db: &Database, user_id: i64, role_id: i64) -> AppResult<()> {
    let mut link = UserRole {
        id: 0,
        user_id,
        role_id,
    };
    db.collection::<UserRole>().insert(&mut link).await?;
    Ok(())
}
