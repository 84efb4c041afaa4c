use actix_web::{web, HttpResponse};

use crate::auth::permissions::MANAGE_USERS;
use crate::database::Database;
use crate::middleware::RequirePermission;
use crate::models::UpdateUserRequest;
use crate::services::user_service;
use crate::utils::AppResult;

pub fn routes(cfg: &mut web::ServiceConfig) {
    let admin = || RequirePermission::new(MANAGE_USERS);

    super::protected(cfg, "/getAll", admin(), web::get().to(get_all));
    super::protected(cfg, "/get/{id}", admin(), web::get().to(get_by_id));
    super::protected(cfg, "/permissions/{id}", admin(), web::get().to(get_permissions));
    super::protected(cfg, "/update/{id}", admin(), web::put().to(update));
    super::protected(cfg, "/delete/{id}", admin(), web::delete().to(delete));
}

#[utoipa::path(
    get,
    path = "/api/User/getAll",
    tag = "User",
    responses((status = 200, description = "All users")),
    security(("bearer_auth" = []))
)]
pub async fn get_all(db: web::Data<Database>) -> AppResult<HttpResponse> {
    super::listed("users", user_service::get_all(&db).await?)
}

pub async fn get_by_id(db: web::Data<Database>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let user = super::found("User", id, user_service::get_by_id(&db, id).await?)?;
    super::single("user", user)
}

pub async fn get_permissions(db: web::Data<Database>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let permissions = super::found("User", id, user_service::get_permissions(&db, id).await?)?;
    super::listed("permissions", permissions)
}

pub async fn update(
    db: web::Data<Database>,
    path: web::Path<i64>,
    request: web::Json<UpdateUserRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    log::info!("✏️ PUT /api/User/update/{}", id);
    let user = super::found("User", id, user_service::update(&db, id, &request).await?)?;
    super::single("user", user)
}

pub async fn delete(db: web::Data<Database>, path: web::Path<i64>) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    log::info!("🗑️ DELETE /api/User/delete/{}", id);
    super::deleted("User", id, user_service::delete(&db, id).await?)
}

#[cfg(test)]
mod tests {
    use crate::api::testing::{test_app, TestState};
    use crate::auth::permissions::MANAGE_USERS;
    use crate::test_support;
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn deactivating_then_deleting_a_user() {
        let state = TestState::new().await;
        let user = test_support::insert_user(state.db.get_ref(), "jperez", "Juan Pérez").await;
        let app = test_app!(state);

        let update = test::TestRequest::put()
            .uri(&format!("/api/User/update/{}", user.id))
            .insert_header(state.bearer(&[MANAGE_USERS]))
            .set_json(json!({ "fullName": "Juan Pérez", "email": "juan@medbot.com", "isActive": false }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, update).await;
        assert_eq!(body["user"]["isActive"], false);
        assert_eq!(body["user"]["email"], "juan@medbot.com");

        let delete = || {
            test::TestRequest::delete()
                .uri(&format!("/api/User/delete/{}", user.id))
                .insert_header(state.bearer(&[MANAGE_USERS]))
                .to_request()
        };
        assert_eq!(test::call_service(&app, delete()).await.status(), StatusCode::OK);
        assert_eq!(test::call_service(&app, delete()).await.status(), StatusCode::NOT_FOUND);
    }
}
