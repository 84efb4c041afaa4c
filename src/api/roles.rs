use actix_web::{web, HttpResponse};

use crate::auth::permissions::MANAGE_USERS;
use crate::database::Database;
use crate::middleware::RequirePermission;
use crate::models::{CreatePermissionRequest, CreateRoleRequest, RolePermissionRequest};
use crate::services::role_service;
use crate::utils::{AppError, AppResult};

pub fn role_routes(cfg: &mut web::ServiceConfig) {
    let admin = || RequirePermission::new(MANAGE_USERS);

    super::protected(cfg, "/getAll", admin(), web::get().to(get_roles));
    super::protected(cfg, "/create", admin(), web::post().to(create_role));
    super::protected(cfg, "/{id}/permissions", admin(), web::get().to(get_role_permissions));
    super::protected(cfg, "/grant", admin(), web::post().to(grant));
    super::protected(cfg, "/revoke", admin(), web::post().to(revoke));
}

pub fn permission_routes(cfg: &mut web::ServiceConfig) {
    let admin = || RequirePermission::new(MANAGE_USERS);

    super::protected(cfg, "/getAll", admin(), web::get().to(get_permissions));
    super::protected(cfg, "/create", admin(), web::post().to(create_permission));
}

pub async fn get_roles(db: web::Data<Database>) -> AppResult<HttpResponse> {
    super::listed("roles", role_service::get_all_roles(&db).await?)
}

pub async fn create_role(db: web::Data<Database>, request: web::Json<CreateRoleRequest>) -> AppResult<HttpResponse> {
    super::created("role", role_service::create_role(&db, &request).await?)
}

pub async fn get_role_permissions(db: web::Data<Database>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let permissions = super::found("Role", id, role_service::get_role_permissions(&db, id).await?)?;
    super::listed("permissions", permissions)
}

#[utoipa::path(
    post,
    path = "/api/Role/grant",
    tag = "Role",
    request_body = RolePermissionRequest,
    responses(
        (status = 200, description = "Permission granted (idempotent)"),
        (status = 404, description = "Unknown role or permission")
    ),
    security(("bearer_auth" = []))
)]
pub async fn grant(db: web::Data<Database>, request: web::Json<RolePermissionRequest>) -> AppResult<HttpResponse> {
    role_service::grant_permission(&db, request.role_id, request.permission_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": format!("Permission {} granted to role {}", request.permission_id, request.role_id)
    })))
}

pub async fn revoke(db: web::Data<Database>, request: web::Json<RolePermissionRequest>) -> AppResult<HttpResponse> {
    if !role_service::revoke_permission(&db, request.role_id, request.permission_id).await? {
        return Err(AppError::NotFound(format!(
            "Role {} does not have permission {}",
            request.role_id, request.permission_id
        )));
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": format!("Permission {} revoked from role {}", request.permission_id, request.role_id)
    })))
}

pub async fn get_permissions(db: web::Data<Database>) -> AppResult<HttpResponse> {
    super::listed("permissions", role_service::get_all_permissions(&db).await?)
}

pub async fn create_permission(
    db: web::Data<Database>,
    request: web::Json<CreatePermissionRequest>,
) -> AppResult<HttpResponse> {
    super::created("permission", role_service::create_permission(&db, &request).await?)
}
