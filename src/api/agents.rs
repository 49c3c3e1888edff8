//! Agents (`/agents/`) and their tool / knowledge-base links

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ApiClient, ApiError, Audit, RequestOptions, Resource};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub agt_id: String,
    pub agt_name: String,
    #[serde(default)]
    pub agt_description: Option<String>,
    /// LLM configuration the agent runs on
    pub agt_llc_id: String,
    #[serde(default)]
    pub agt_system_prompt: Option<String>,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewAgent {
    pub agt_id: String,
    pub agt_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agt_description: Option<String>,
    pub agt_llc_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agt_system_prompt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agt_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agt_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agt_llc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agt_system_prompt: Option<String>,
}

impl From<NewAgent> for AgentUpdate {
    fn from(new: NewAgent) -> Self {
        Self {
            agt_name: Some(new.agt_name),
            agt_description: new.agt_description,
            agt_llc_id: Some(new.agt_llc_id),
            agt_system_prompt: new.agt_system_prompt,
        }
    }
}

impl Resource for Agent {
    const PATH: &'static str = "agents";
    type Create = NewAgent;
    type Update = AgentUpdate;

    fn key(&self) -> &str {
        &self.agt_id
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Relationships
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTool {
    pub ato_agt_id: String,
    pub ato_tol_id: String,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentKnowledgeBase {
    pub akb_agt_id: String,
    pub akb_knb_id: String,
    #[serde(flatten)]
    pub audit: Audit,
}

const TOOL_LINKS: &str = "/agent-relationships/tools";
const KB_LINKS: &str = "/agent-relationships/knowledge-bases";

/// Every agent/tool link; the endpoint has no agent filter
pub async fn tool_links(client: &ApiClient) -> Result<Vec<AgentTool>, ApiError> {
    client.get(TOOL_LINKS, RequestOptions::new()).await?.json()
}

/// Tool ids linked to one agent
pub async fn tools_of(client: &ApiClient, agent_id: &str) -> Result<Vec<String>, ApiError> {
    Ok(tool_links(client)
        .await?
        .into_iter()
        .filter(|link| link.ato_agt_id == agent_id)
        .map(|link| link.ato_tol_id)
        .collect())
}

pub async fn link_tool(client: &ApiClient, agent_id: &str, tool_id: &str) -> Result<AgentTool, ApiError> {
    let body = json!({ "ato_agt_id": agent_id, "ato_tol_id": tool_id });
    client.post(TOOL_LINKS, body, RequestOptions::new()).await?.json()
}

pub async fn unlink_tool(client: &ApiClient, agent_id: &str, tool_id: &str) -> Result<(), ApiError> {
    let path = format!(
        "{}/{}/{}",
        TOOL_LINKS,
        urlencoding::encode(agent_id),
        urlencoding::encode(tool_id)
    );
    client.delete(&path, RequestOptions::new()).await?;
    Ok(())
}

pub async fn knowledge_base_links(client: &ApiClient) -> Result<Vec<AgentKnowledgeBase>, ApiError> {
    client.get(KB_LINKS, RequestOptions::new()).await?.json()
}

/// Knowledge base ids linked to one agent
pub async fn knowledge_bases_of(client: &ApiClient, agent_id: &str) -> Result<Vec<String>, ApiError> {
    Ok(knowledge_base_links(client)
        .await?
        .into_iter()
        .filter(|link| link.akb_agt_id == agent_id)
        .map(|link| link.akb_knb_id)
        .collect())
}

pub async fn link_knowledge_base(
    client: &ApiClient,
    agent_id: &str,
    kb_id: &str,
) -> Result<AgentKnowledgeBase, ApiError> {
    let body = json!({ "akb_agt_id": agent_id, "akb_knb_id": kb_id });
    client.post(KB_LINKS, body, RequestOptions::new()).await?.json()
}

pub async fn unlink_knowledge_base(client: &ApiClient, agent_id: &str, kb_id: &str) -> Result<(), ApiError> {
    let path = format!(
        "{}/{}/{}",
        KB_LINKS,
        urlencoding::encode(agent_id),
        urlencoding::encode(kb_id)
    );
    client.delete(&path, RequestOptions::new()).await?;
    Ok(())
}
