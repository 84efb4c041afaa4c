use chrono::Utc;
use serde::Serialize;

use crate::database::{Database, Filter};
use crate::models::{
    AgentReply, ChatRequest, ChatResponse, ChatbotInteraction, InteractionResponse, MAX_CHAT_MESSAGE_LEN,
};
use crate::utils::{AppError, AppResult};

/// HTTP client for the external medical agent.
#[derive(Clone)]
pub struct ChatbotClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct AgentQuery<'a> {
    message: &'a str,
    conversation_id: Option<&'a str>,
}

impl ChatbotClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn chat_url(&self) -> String {
        format!("{}/agent/chat", self.base_url)
    }

    /// Forwards one message, authenticating as the caller.
    pub async fn ask(&self, bearer_token: &str, message: &str, conversation_id: Option<&str>) -> AppResult<AgentReply> {
        log::info!("🤖 Forwarding chat message to {}", self.chat_url());

        let response = self
            .http
            .post(self.chat_url())
            .bearer_auth(bearer_token)
            .json(&AgentQuery { message, conversation_id })
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Chatbot unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!("Chatbot returned {}", response.status())));
        }

        response
            .json::<AgentReply>()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse chatbot response: {}", e)))
    }

    /// Asks the agent to drop its memory of a conversation.
    pub async fn clear_conversation(&self, bearer_token: &str, conversation_id: &str) -> AppResult<()> {
        let url = format!("{}/agent/conversation/{}", self.base_url, conversation_id);

        let response = self
            .http
            .delete(&url)
            .bearer_auth(bearer_token)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Chatbot unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!("Chatbot returned {}", response.status())));
        }
        Ok(())
    }
}

pub fn validate_message(message: &str) -> AppResult<()> {
    let length = message.trim().chars().count();
    if length == 0 {
        return Err(AppError::InvalidRequest("Message cannot be empty".to_string()));
    }
    if message.chars().count() > MAX_CHAT_MESSAGE_LEN {
        return Err(AppError::InvalidRequest(format!(
            "Message exceeds {} characters",
            MAX_CHAT_MESSAGE_LEN
        )));
    }
    Ok(())
}

/// Keyword classification of a user message, first match wins.
pub fn classify_interaction(message: &str) -> &'static str {
    const RULES: &[(&str, &[&str])] = &[
        ("Appointment", &["appointment", "cita", "consulta", "agenda"]),
        ("Summary", &["summary", "resumen", "estadistic", "count", "total"]),
        ("MedicalHistory", &["history", "historial", "medical", "médico"]),
        ("Diagnosis", &["diagnosis", "diagnóstico", "disease", "enfermedad"]),
        ("PatientSearch", &["search", "buscar", "find", "encontrar", "patient", "paciente"]),
        ("PatientCreation", &["create", "crear", "new", "nuevo"]),
        ("PatientUpdate", &["update", "actualizar", "modify", "modificar"]),
    ];

    let lowered = message.to_lowercase();
    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(kind, _)| *kind)
        .unwrap_or("General")
}

/// Persists one exchange. The agent's conversation id wins over the one the
/// caller sent.
pub async fn record_interaction(
    db: &Database,
    user_id: i64,
    request: &ChatRequest,
    reply: &AgentReply,
) -> AppResult<ChatbotInteraction> {
    let mut interaction = ChatbotInteraction {
        id: 0,
        user_id,
        conversation_id: reply.conversation_id.clone().or_else(|| request.conversation_id.clone()),
        interaction_type: classify_interaction(&request.message).to_string(),
        user_message: request.message.clone(),
        bot_response: reply.response.clone(),
        timestamp: Utc::now(),
    };
    db.collection::<ChatbotInteraction>().insert(&mut interaction).await?;

    log::info!(
        "💬 Stored chatbot interaction {} for user {} ({})",
        interaction.id,
        user_id,
        interaction.interaction_type
    );
    Ok(interaction)
}

pub async fn send(
    db: &Database,
    client: &ChatbotClient,
    user_id: i64,
    bearer_token: &str,
    request: &ChatRequest,
) -> AppResult<ChatResponse> {
    validate_message(&request.message)?;

    let reply = client
        .ask(bearer_token, &request.message, request.conversation_id.as_deref())
        .await?;
    if let Some(status) = reply.status.as_deref() {
        log::debug!("Chatbot status: {}", status);
    }

    let interaction = record_interaction(db, user_id, request, &reply).await?;

    Ok(ChatResponse {
        response: interaction.bot_response,
        conversation_id: interaction.conversation_id,
    })
}

/// The caller's interactions in one conversation, oldest first.
pub async fn history(db: &Database, user_id: i64, conversation_id: &str) -> AppResult<Vec<InteractionResponse>> {
    let mut interactions = db
        .collection::<ChatbotInteraction>()
        .find(&Filter::new().eq("user_id", user_id).eq("conversation_id", conversation_id))
        .await?;
    interactions.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
    Ok(interactions.into_iter().map(InteractionResponse::from).collect())
}

/// Deletes the caller's stored interactions for a conversation and tells the
/// agent to forget it. The agent's memory is ephemeral, so a failed forward
/// is logged and the local deletion still stands.
pub async fn clear_history(
    db: &Database,
    client: &ChatbotClient,
    user_id: i64,
    bearer_token: &str,
    conversation_id: &str,
) -> AppResult<u64> {
    let removed = db
        .collection::<ChatbotInteraction>()
        .delete_where(&Filter::new().eq("user_id", user_id).eq("conversation_id", conversation_id))
        .await?;
    log::info!("🧹 Cleared {} interactions of conversation {} for user {}", removed, conversation_id, user_id);

    if let Err(e) = client.clear_conversation(bearer_token, conversation_id).await {
        log::warn!("⚠️ Agent did not clear conversation {}: {}", conversation_id, e);
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(message: &str, conversation_id: Option<&str>) -> ChatRequest {
        ChatRequest { message: message.into(), conversation_id: conversation_id.map(Into::into) }
    }

    fn reply(text: &str, conversation_id: Option<&str>) -> AgentReply {
        AgentReply { response: text.into(), conversation_id: conversation_id.map(Into::into), status: None }
    }

    #[test]
    fn message_length_bounds() {
        assert!(validate_message("hola").is_ok());
        assert!(validate_message(&"a".repeat(MAX_CHAT_MESSAGE_LEN)).is_ok());
        assert!(matches!(validate_message("   "), Err(AppError::InvalidRequest(_))));
        assert!(matches!(
            validate_message(&"a".repeat(MAX_CHAT_MESSAGE_LEN + 1)),
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[test]
    fn classifies_by_first_matching_keyword() {
        assert_eq!(classify_interaction("Agenda una cita para mañana"), "Appointment");
        assert_eq!(classify_interaction("Find patients with heart disease"), "Diagnosis");
        assert_eq!(classify_interaction("Buscar paciente Juan"), "PatientSearch");
        assert_eq!(classify_interaction("hello"), "General");
    }

    #[tokio::test]
    async fn history_is_scoped_to_user_and_conversation() {
        let db = Database::in_memory();
        record_interaction(&db, 1, &chat("first", Some("c1")), &reply("r1", None)).await.unwrap();
        record_interaction(&db, 1, &chat("second", Some("c1")), &reply("r2", Some("c1"))).await.unwrap();
        record_interaction(&db, 2, &chat("other user", Some("c1")), &reply("r3", None)).await.unwrap();
        record_interaction(&db, 1, &chat("new thread", None), &reply("r4", Some("c2"))).await.unwrap();

        let messages: Vec<String> = history(&db, 1, "c1")
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.user_message)
            .collect();
        assert_eq!(messages, vec!["first".to_string(), "second".to_string()]);
        assert_eq!(history(&db, 1, "c2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unreachable_agent_is_upstream_error_and_nothing_is_stored() {
        let db = Database::in_memory();
        let client = ChatbotClient::new("http://127.0.0.1:1/api/v1/");

        let err = send(&db, &client, 1, "token", &chat("hola", None)).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
        assert!(db.collection::<ChatbotInteraction>().all().await.unwrap().is_empty());
    }

    #[test]
    fn chat_url_ignores_trailing_slash() {
        let client = ChatbotClient::new("http://localhost:8000/api/v1/");
        assert_eq!(client.chat_url(), "http://localhost:8000/api/v1/agent/chat");
    }

    #[actix_web::test]
    async fn clear_history_forwards_to_the_agent_and_keeps_other_users() {
        use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
        use std::sync::{Arc, Mutex};

        let seen: Arc<Mutex<Vec<String>>> = Arc::default();
        let recorder = seen.clone();
        let server = HttpServer::new(move || {
            let recorder = recorder.clone();
            App::new().route(
                "/api/v1/agent/conversation/{id}",
                web::delete().to(move |req: HttpRequest| {
                    let recorder = recorder.clone();
                    async move {
                        let auth = req
                            .headers()
                            .get("Authorization")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default()
                            .to_string();
                        recorder.lock().unwrap().push(format!("{} {}", req.path(), auth));
                        HttpResponse::Ok().finish()
                    }
                }),
            )
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());

        let db = Database::in_memory();
        record_interaction(&db, 1, &chat("hola", Some("c1")), &reply("r1", None)).await.unwrap();
        record_interaction(&db, 1, &chat("otra", Some("c1")), &reply("r2", None)).await.unwrap();
        record_interaction(&db, 2, &chat("ajeno", Some("c1")), &reply("r3", None)).await.unwrap();

        let client = ChatbotClient::new(&format!("http://{}/api/v1", addr));
        assert_eq!(clear_history(&db, &client, 1, "tok", "c1").await.unwrap(), 2);

        assert!(history(&db, 1, "c1").await.unwrap().is_empty());
        assert_eq!(history(&db, 2, "c1").await.unwrap().len(), 1);
        assert_eq!(
            seen.lock().unwrap().clone(),
            vec!["/api/v1/agent/conversation/c1 Bearer tok".to_string()]
        );
    }

    #[tokio::test]
    async fn clear_history_survives_an_unreachable_agent() {
        let db = Database::in_memory();
        record_interaction(&db, 1, &chat("hola", Some("c1")), &reply("r1", None)).await.unwrap();
        let client = ChatbotClient::new("http://127.0.0.1:1/api/v1");

        assert_eq!(clear_history(&db, &client, 1, "tok", "c1").await.unwrap(), 1);
        assert_eq!(clear_history(&db, &client, 1, "tok", "c1").await.unwrap(), 0);
    }
}
