use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_CHAT_MESSAGE_LEN: usize = 2000;

/// One exchange with the external medical agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatbotInteraction {
    pub id: i64,
    pub user_id: i64,
    pub conversation_id: Option<String>,
    pub interaction_type: String,
    pub user_message: String,
    pub bot_response: String,
    pub timestamp: DateTime<Utc>,
}

entity!(ChatbotInteraction, "chatbot_interactions");

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub conversation_id: Option<String>,
}

/// Payload returned by the agent's `/agent/chat` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentReply {
    pub response: String,
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InteractionResponse {
    pub interaction_id: i64,
    pub conversation_id: Option<String>,
    pub user_message: String,
    pub bot_response: String,
    pub timestamp: DateTime<Utc>,
}

impl From<ChatbotInteraction> for InteractionResponse {
    fn from(interaction: ChatbotInteraction) -> Self {
        InteractionResponse {
            interaction_id: interaction.id,
            conversation_id: interaction.conversation_id,
            user_message: interaction.user_message,
            bot_response: interaction.bot_response,
            timestamp: interaction.timestamp,
        }
    }
}
