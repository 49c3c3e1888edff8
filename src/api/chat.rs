//! Chat sessions and messages (`/chat/`)

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

use super::{ApiClient, ApiError, Audit, RequestOptions};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    #[serde(alias = "id")]
    pub cht_id: String,
    #[serde(alias = "name")]
    pub cht_name: String,
    #[serde(alias = "agent")]
    pub cht_agt_id: String,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Ai,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("USER"),
            Self::Ai => f.write_str("AI"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(alias = "id")]
    pub msg_id: String,
    #[serde(alias = "chatSession")]
    pub msg_cht_id: String,
    #[serde(alias = "agentName")]
    pub msg_agent_name: String,
    #[serde(alias = "role")]
    pub msg_role: Role,
    /// Array of content parts, stored as-is by the service
    #[serde(alias = "content", default)]
    pub msg_content: Value,
    #[serde(flatten)]
    pub audit: Audit,
}

impl ChatMessage {
    /// Concatenated text of the content parts
    ///
    /// Parts are either plain strings or objects with a `text` (or
    /// `content`) field; anything else is skipped.
    pub fn text(&self) -> String {
        fn part_text(part: &Value) -> Option<&str> {
            match part {
                Value::String(s) => Some(s),
                Value::Object(map) => map
                    .get("text")
                    .or_else(|| map.get("content"))
                    .and_then(Value::as_str),
                _ => None,
            }
        }

        match &self.msg_content {
            Value::Array(parts) => parts
                .iter()
                .filter_map(part_text)
                .collect::<Vec<_>>()
                .join("\n\n"),
            other => part_text(other).unwrap_or_default().to_string(),
        }
    }
}

/// Sessions, optionally filtered by agent
pub async fn sessions(
    client: &ApiClient,
    agent_id: Option<&str>,
    skip: usize,
    limit: usize,
) -> Result<Vec<ChatSession>, ApiError> {
    let mut options = RequestOptions::new().param("skip", skip).param("limit", limit);
    if let Some(agent_id) = agent_id {
        options = options.param("agent_id", agent_id);
    }
    client.get("/chat/sessions", options).await?.json()
}

pub async fn create_session(
    client: &ApiClient,
    name: &str,
    description: Option<&str>,
    agent_id: &str,
) -> Result<ChatSession, ApiError> {
    let body = json!({ "name": name, "description": description, "agent": agent_id });
    client
        .post("/chat/sessions", body, RequestOptions::new())
        .await?
        .json()
}

pub async fn delete_session(client: &ApiClient, session_id: &str) -> Result<(), ApiError> {
    let path = format!("/chat/sessions/{}", urlencoding::encode(session_id));
    client.delete(&path, RequestOptions::new()).await?;
    Ok(())
}

pub async fn messages(client: &ApiClient, session_id: &str) -> Result<Vec<ChatMessage>, ApiError> {
    let path = format!("/chat/sessions/{}/messages", urlencoding::encode(session_id));
    client.get(&path, RequestOptions::new()).await?.json()
}

pub async fn post_message(
    client: &ApiClient,
    session_id: &str,
    agent_name: &str,
    role: Role,
    text: &str,
) -> Result<ChatMessage, ApiError> {
    let body = json!({
        "chatSession": session_id,
        "agentName": agent_name,
        "role": role,
        "content": [{ "type": "text", "text": text }],
    });
    client
        .post("/chat/messages", body, RequestOptions::new())
        .await?
        .json()
}
