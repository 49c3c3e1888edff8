//! Knowledge bases (`/knowledge-bases/`) and their documents

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ApiClient, ApiError, Audit, RequestOptions, Resource};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub knb_id: String,
    pub knb_name: String,
    #[serde(default)]
    pub knb_description: Option<String>,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewKnowledgeBase {
    pub knb_id: String,
    pub knb_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knb_description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KnowledgeBaseUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knb_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knb_description: Option<String>,
}

impl From<NewKnowledgeBase> for KnowledgeBaseUpdate {
    fn from(new: NewKnowledgeBase) -> Self {
        Self {
            knb_name: Some(new.knb_name),
            knb_description: new.knb_description,
        }
    }
}

impl Resource for KnowledgeBase {
    const PATH: &'static str = "knowledge-bases";
    type Create = NewKnowledgeBase;
    type Update = KnowledgeBaseUpdate;

    fn key(&self) -> &str {
        &self.knb_id
    }
}

/// Link between a knowledge base and an uploaded file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseDocument {
    pub kbd_knb_id: String,
    pub kbd_fls_id: String,
    #[serde(flatten)]
    pub audit: Audit,
}

fn documents_path(kb_id: &str) -> String {
    format!("/knowledge-bases/{}/documents", urlencoding::encode(kb_id))
}

pub async fn documents(client: &ApiClient, kb_id: &str) -> Result<Vec<KnowledgeBaseDocument>, ApiError> {
    client.get(&documents_path(kb_id), RequestOptions::new()).await?.json()
}

pub async fn add_document(
    client: &ApiClient,
    kb_id: &str,
    file_id: &str,
) -> Result<KnowledgeBaseDocument, ApiError> {
    let body = json!({ "kbd_knb_id": kb_id, "kbd_fls_id": file_id });
    client
        .post(&documents_path(kb_id), body, RequestOptions::new())
        .await?
        .json()
}

pub async fn remove_document(client: &ApiClient, kb_id: &str, file_id: &str) -> Result<(), ApiError> {
    let path = format!("{}/{}", documents_path(kb_id), urlencoding::encode(file_id));
    client.delete(&path, RequestOptions::new()).await?;
    Ok(())
}
