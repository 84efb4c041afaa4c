use actix_web::{web, HttpRequest, HttpResponse};

use crate::auth::permissions::USE_AGENT;
use crate::auth::Claims;
use crate::database::Database;
use crate::middleware::{bearer_token, RequirePermission};
use crate::models::ChatRequest;
use crate::services::{chatbot_service, ChatbotClient};
use crate::utils::{AppError, AppResult};

pub fn routes(cfg: &mut web::ServiceConfig) {
    super::protected(cfg, "/send", RequirePermission::new(USE_AGENT), web::post().to(send));
    cfg.service(
        web::resource("/history/{conversationId}")
            .wrap(RequirePermission::new(USE_AGENT))
            .route(web::get().to(history))
            .route(web::delete().to(clear_history)),
    );
}

fn caller_id(claims: &Claims) -> AppResult<i64> {
    claims
        .user_id()
        .ok_or_else(|| AppError::Unauthorized(format!("Token subject '{}' is not a user id", claims.sub)))
}

#[utoipa::path(
    post,
    path = "/api/Chat/send",
    tag = "Chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Agent reply", body = crate::models::ChatResponse),
        (status = 400, description = "Empty or oversized message"),
        (status = 502, description = "Agent unavailable")
    ),
    security(("bearer_auth" = []))
)]
pub async fn send(
    req: HttpRequest,
    claims: web::ReqData<Claims>,
    db: web::Data<Database>,
    client: web::Data<ChatbotClient>,
    request: web::Json<ChatRequest>,
) -> AppResult<HttpResponse> {
    let user_id = caller_id(&claims)?;
    log::info!("💬 POST /api/Chat/send - user: {}", user_id);

    let token = bearer_token(req.headers())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization token".to_string()))?;

    let reply = chatbot_service::send(&db, &client, user_id, token, &request).await?;
    Ok(HttpResponse::Ok().json(reply))
}

#[utoipa::path(
    get,
    path = "/api/Chat/history/{conversationId}",
    tag = "Chat",
    params(("conversationId" = String, Path, description = "Conversation id returned by the agent")),
    responses((status = 200, description = "The caller's messages in the conversation, oldest first")),
    security(("bearer_auth" = []))
)]
pub async fn history(
    claims: web::ReqData<Claims>,
    db: web::Data<Database>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let user_id = caller_id(&claims)?;
    let conversation_id = path.into_inner();
    super::listed(
        "interactions",
        chatbot_service::history(&db, user_id, &conversation_id).await?,
    )
}

#[utoipa::path(
    delete,
    path = "/api/Chat/history/{conversationId}",
    tag = "Chat",
    params(("conversationId" = String, Path, description = "Conversation to clear")),
    responses((status = 200, description = "The caller's interactions were removed and the agent was told to forget the conversation")),
    security(("bearer_auth" = []))
)]
pub async fn clear_history(
    req: HttpRequest,
    claims: web::ReqData<Claims>,
    db: web::Data<Database>,
    client: web::Data<ChatbotClient>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let user_id = caller_id(&claims)?;
    let conversation_id = path.into_inner();
    log::info!("🗑️ DELETE /api/Chat/history/{} - user: {}", conversation_id, user_id);

    let token = bearer_token(req.headers())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization token".to_string()))?;

    let removed = chatbot_service::clear_history(&db, &client, user_id, token, &conversation_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "conversationId": conversation_id,
        "removed": removed,
    })))
}
