//! REST API client and typed endpoints of the backing service
//!
//! [`ApiClient`] is the transport: explicit configuration, JSON or
//! multipart bodies, content-type aware response parsing. The submodules
//! wrap individual endpoints with typed records.

pub mod agents;
pub mod chat;
mod client;
mod error;
pub mod files;
pub mod health;
pub mod knowledge_base;
pub mod llm;
pub mod lookups;
pub mod resource;
pub mod tools;

#[cfg(test)]
pub(crate) mod fake;

pub use client::{
    ApiClient, ApiResponse, ClientConfig, RequestBody, RequestOptions, ResponseData, DEFAULT_TIMEOUT,
};
pub use error::ApiError;
pub use resource::Resource;

use serde::{Deserialize, Serialize};

/// Bookkeeping columns present on every stored record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_dt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_dt: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::agents::{self, Agent, NewAgent};
    use super::fake::FakeBackend;
    use super::knowledge_base::{self, KnowledgeBase, NewKnowledgeBase};
    use super::llm::{LlmConfig, LlmConfigUpdate, NewLlmConfig};
    use super::tools::{self, NewTool, Tool};
    use super::*;
    use serde_json::json;

    fn new_llm(id: &str) -> NewLlmConfig {
        NewLlmConfig {
            llc_id: id.to_string(),
            llc_provider_type_cd: "OLLAMA".to_string(),
            llc_model_cd: "llama3".to_string(),
            llc_endpoint_url: Some("http://localhost:11434".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_generic_crud_round() {
        let backend = FakeBackend::spawn().await;
        let client = backend.client();

        let created: LlmConfig = resource::create(&client, &new_llm("llm-1")).await.unwrap();
        assert_eq!(created.key(), "llm-1");

        let listed: Vec<LlmConfig> = resource::list(&client, RequestOptions::new()).await.unwrap();
        assert_eq!(listed.len(), 1);

        let update = LlmConfigUpdate {
            llc_model_cd: Some("llama3.1".to_string()),
            ..Default::default()
        };
        let updated: LlmConfig = resource::update(&client, "llm-1", &update).await.unwrap();
        assert_eq!(updated.llc_model_cd, "llama3.1");
        assert_eq!(updated.llc_provider_type_cd, "OLLAMA");

        resource::remove::<LlmConfig>(&client, "llm-1").await.unwrap();
        let err = resource::fetch::<LlmConfig>(&client, "llm-1").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_audit_fields_flattened() {
        let value = json!({
            "knb_id": "kb",
            "knb_name": "Docs",
            "created_by": "admin",
            "last_updated_dt": "2025-06-01T10:00:00",
        });
        let kb: KnowledgeBase = serde_json::from_value(value).unwrap();
        assert_eq!(kb.knb_description, None);
        assert_eq!(kb.audit.created_by.as_deref(), Some("admin"));
        assert_eq!(kb.audit.last_updated_dt.as_deref(), Some("2025-06-01T10:00:00"));
    }

    #[tokio::test]
    async fn test_tool_env_variables() {
        let backend = FakeBackend::spawn().await;
        let client = backend.client();
        let tool = NewTool {
            tol_id: "fs".to_string(),
            tol_name: "Filesystem".to_string(),
            tol_mcp_command: "npx @modelcontextprotocol/server-filesystem".to_string(),
            ..Default::default()
        };
        let _: Tool = resource::create(&client, &tool).await.unwrap();

        tools::add_env_var(&client, "fs", "ROOT", Some("/tmp")).await.unwrap();
        let changed = tools::update_env_var(&client, "fs", "ROOT", Some("/srv")).await.unwrap();
        assert_eq!(changed.tev_value.as_deref(), Some("/srv"));

        let vars = tools::env_vars(&client, "fs").await.unwrap();
        assert_eq!(vars.len(), 1);
        assert_eq!(vars[0].tev_key, "ROOT");

        tools::remove_env_var(&client, "fs", "ROOT").await.unwrap();
        assert!(tools::env_vars(&client, "fs").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_agent_links_filtered_per_agent() {
        let backend = FakeBackend::spawn().await;
        let client = backend.client();
        for id in ["a1", "a2"] {
            let agent = NewAgent {
                agt_id: id.to_string(),
                agt_name: id.to_uppercase(),
                agt_llc_id: "llm-1".to_string(),
                ..Default::default()
            };
            let _: Agent = resource::create(&client, &agent).await.unwrap();
        }
        let kb = NewKnowledgeBase {
            knb_id: "kb".to_string(),
            knb_name: "Docs".to_string(),
            knb_description: None,
        };
        let _: KnowledgeBase = resource::create(&client, &kb).await.unwrap();

        agents::link_tool(&client, "a1", "fs").await.unwrap();
        agents::link_tool(&client, "a2", "web").await.unwrap();
        agents::link_knowledge_base(&client, "a1", "kb").await.unwrap();

        assert_eq!(agents::tools_of(&client, "a1").await.unwrap(), vec!["fs"]);
        assert_eq!(agents::knowledge_bases_of(&client, "a1").await.unwrap(), vec!["kb"]);
        assert!(agents::knowledge_bases_of(&client, "a2").await.unwrap().is_empty());

        agents::unlink_tool(&client, "a1", "fs").await.unwrap();
        assert!(agents::tools_of(&client, "a1").await.unwrap().is_empty());

        knowledge_base::add_document(&client, "kb", "file-1").await.unwrap();
        let docs = knowledge_base::documents(&client, "kb").await.unwrap();
        assert_eq!(docs[0].kbd_fls_id, "file-1");
    }

    #[tokio::test]
    async fn test_chat_lookups_upload_and_health() {
        let backend = FakeBackend::spawn().await;
        backend.seed_lookup("PROVIDER_TYPE", "OPENAI", Some("OpenAI"), Some(2));
        backend.seed_lookup("PROVIDER_TYPE", "OLLAMA", Some("Ollama"), Some(1));
        backend.seed_lookup("SOURCE_TYPE", "KNOWLEDGE_BASE", None, None);
        let client = backend.client();

        let providers = lookups::details(&client, lookups::PROVIDER_TYPE).await.unwrap();
        let codes: Vec<_> = providers.iter().map(|d| d.lkd_code.as_str()).collect();
        assert_eq!(codes, vec!["OLLAMA", "OPENAI"]);
        assert_eq!(providers[0].label(), "Ollama");

        let session = chat::create_session(&client, "First", None, "a1").await.unwrap();
        chat::create_session(&client, "Other", None, "a2").await.unwrap();
        assert_eq!(chat::sessions(&client, Some("a1"), 0, 100).await.unwrap().len(), 1);
        assert_eq!(chat::sessions(&client, None, 0, 100).await.unwrap().len(), 2);

        let sent = chat::post_message(&client, &session.cht_id, "helper", chat::Role::User, "hello")
            .await
            .unwrap();
        assert_eq!(sent.text(), "hello");
        let history = chat::messages(&client, &session.cht_id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].msg_role, chat::Role::User);

        let stored = files::upload(&client, "notes.md", b"# hi".to_vec(), files::SOURCE_KNOWLEDGE_BASE, "kb")
            .await
            .unwrap();
        assert_eq!(stored.fls_file_name, "notes.md");
        assert_eq!(stored.fls_source_id, "kb");

        let health = health::check(&client).await.unwrap();
        assert!(health.is_healthy());
    }
}
