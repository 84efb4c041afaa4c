use chrono::Utc;

use crate::auth::password::hash_password;
use crate::auth::permissions::{self, ADMIN_ROLE, DEFAULT_ROLE, DOCTOR_GRANTS};
use crate::database::{Database, Filter};
use crate::models::{CreatePermissionRequest, CreateRoleRequest, User};
use crate::services::role_service;
use crate::utils::AppResult;

/// Seeds the permission catalogue and the `Admin` and `Doctor` roles.
/// Safe to run on every start: existing rows are kept, missing ones added.
pub async fn seed_roles_and_permissions(db: &Database) -> AppResult<()> {
    log::info!("📋 Seeding roles and permissions...");

    let mut created = 0;
    for (name, description) in permissions::ALL {
        if role_service::find_permission_by_name(db, name).await?.is_none() {
            role_service::create_permission(
                db,
                &CreatePermissionRequest {
                    name: name.to_string(),
                    description: Some(description.to_string()),
                },
            )
            .await?;
            created += 1;
        }
    }

    let admin_id = ensure_role(db, ADMIN_ROLE, "Full access to every resource").await?;
    let doctor_id = ensure_role(db, DEFAULT_ROLE, "Clinical staff").await?;

    for (name, _) in permissions::ALL {
        grant_by_name(db, admin_id, name).await?;
    }
    for name in DOCTOR_GRANTS {
        grant_by_name(db, doctor_id, name).await?;
    }

    log::info!("   ✅ Roles ready ({} new permissions)", created);
    Ok(())
}

/// Creates an `Admin` user with the given credentials unless the username is
/// already taken.
pub async fn seed_admin_user(db: &Database, username: &str, password: &str, cost: u32) -> AppResult<()> {
    let users = db.collection::<User>();
    if users.exists(&Filter::new().eq("username", username)).await? {
        log::info!("   ℹ️  Admin user '{}' already exists, skipping", username);
        return Ok(());
    }

    let admin_role = ensure_role(db, ADMIN_ROLE, "Full access to every resource").await?;

    let mut admin = User {
        id: 0,
        username: username.to_string(),
        full_name: "Administrator".to_string(),
        email: format!("{}@medbotassist.local", username),
        password_hash: hash_password(password, cost)?,
        role: ADMIN_ROLE.to_string(),
        is_active: true,
        created_at: Utc::now(),
    };
    users.insert(&mut admin).await?;
    role_service::assign_role(db, admin.id, admin_role).await?;

    log::info!("   ✅ Admin user '{}' created", username);
    Ok(())
}

async fn ensure_role(db: &Database, name: &str, description: &str) -> AppResult<i64> {
    if let Some(role) = role_service::find_role_by_name(db, name).await? {
        return Ok(role.id);
    }
    let role = role_service::create_role(
        db,
        &CreateRoleRequest {
            name: name.to_string(),
            description: Some(description.to_string()),
        },
    )
    .await?;
    Ok(role.role_id)
}

async fn grant_by_name(db: &Database, role_id: i64, permission: &str) -> AppResult<()> {
    if let Some(found) = role_service::find_permission_by_name(db, permission).await? {
        role_service::grant_permission(db, role_id, found.id).await?;
    }
    Ok(())
}
