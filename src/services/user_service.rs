use crate::database::{Database, Filter};
use crate::models::{UpdateUserRequest, User, UserResponse, UserRole};
use crate::services::{doctor_service, role_service};
use crate::utils::{AppError, AppResult};

pub async fn get_all(db: &Database) -> AppResult<Vec<UserResponse>> {
    let users = db.collection::<User>().all().await?;
    Ok(users.into_iter().map(UserResponse::from).collect())
}

pub async fn get_by_id(db: &Database, id: i64) -> AppResult<Option<UserResponse>> {
    Ok(db.collection::<User>().get(id).await?.map(UserResponse::from))
}

/// Overwrites profile fields and the active flag. Username, role and
/// password are not touched here.
pub async fn update(db: &Database, id: i64, request: &UpdateUserRequest) -> AppResult<Option<UserResponse>> {
    let users = db.collection::<User>();
    let Some(mut user) = users.get(id).await? else {
        return Ok(None);
    };

    if request.full_name.trim().is_empty() {
        return Err(AppError::InvalidRequest("Full name is required".to_string()));
    }

    user.full_name = request.full_name.trim().to_string();
    user.email = request.email.clone();
    user.is_active = request.is_active;
    users.replace(&user).await?;

    if !user.is_active {
        log::warn!("⚠️ User {} deactivated", user.username);
    }
    Ok(Some(UserResponse::from(user)))
}

/// Deletes the user, its role links and its doctor profile.
pub async fn delete(db: &Database, id: i64) -> AppResult<bool> {
    let deleted = db.collection::<User>().delete(id).await?;
    if !deleted {
        return Ok(false);
    }

    let links = db
        .collection::<UserRole>()
        .delete_where(&Filter::new().eq("user_id", id))
        .await?;
    let doctors = doctor_service::delete_for_user(db, id).await?;

    log::info!("🗑️ User {} deleted ({} role links, {} doctor profiles removed)", id, links, doctors);
    Ok(true)
}

/// Effective permission names of a user, or `None` if the user does not exist.
pub async fn get_permissions(db: &Database, id: i64) -> AppResult<Option<Vec<String>>> {
    if db.collection::<User>().get(id).await?.is_none() {
        return Ok(None);
    }
    Ok(Some(role_service::permission_names_for_user(db, id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::permissions::{DEFAULT_ROLE, DOCTOR_GRANTS};
    use crate::seeds::roles_seed;
    use crate::models::Doctor;
    use crate::test_support::{insert_doctor, insert_user};

    #[tokio::test]
    async fn update_changes_profile_only() {
        let db = Database::in_memory();
        let user = insert_user(&db, "jperez", "Juan Pérez").await;

        let updated = update(
            &db,
            user.id,
            &UpdateUserRequest { full_name: "Juan P. Pérez".into(), email: "jp@medbot.com".into(), is_active: false },
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(updated.username, "jperez");
        assert_eq!(updated.full_name, "Juan P. Pérez");
        assert!(!updated.is_active);

        let missing = update(
            &db,
            999,
            &UpdateUserRequest { full_name: "x".into(), email: String::new(), is_active: true },
        )
        .await
        .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn delete_also_drops_role_links() {
        let db = Database::in_memory();
        roles_seed::seed_roles_and_permissions(&db).await.unwrap();
        let user = insert_user(&db, "jperez", "Juan Pérez").await;
        let role = role_service::find_role_by_name(&db, DEFAULT_ROLE).await.unwrap().unwrap();
        role_service::assign_role(&db, user.id, role.id).await.unwrap();

        assert_eq!(get_permissions(&db, user.id).await.unwrap().unwrap().len(), DOCTOR_GRANTS.len());

        assert!(delete(&db, user.id).await.unwrap());
        assert!(db.collection::<UserRole>().all().await.unwrap().is_empty());
        assert!(get_permissions(&db, user.id).await.unwrap().is_none());
        assert!(!delete(&db, user.id).await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_the_doctor_profile() {
        let db = Database::in_memory();
        let house = insert_doctor(&db, "house", "Gregory House").await;

        assert!(delete(&db, house.user_id).await.unwrap());
        assert!(db.collection::<Doctor>().get(house.id).await.unwrap().is_none());
    }
}
