//! File store uploads (`/file-store/upload`)

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiError, Audit, RequestOptions};

/// Source type code for files attached to a knowledge base
pub const SOURCE_KNOWLEDGE_BASE: &str = "KNOWLEDGE_BASE";
/// Source type code for files attached to an LLM configuration
pub const SOURCE_LLM: &str = "LLM";

/// Stored file metadata; content is never returned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFile {
    pub fls_id: String,
    pub fls_source_type_cd: String,
    pub fls_source_id: String,
    pub fls_file_name: String,
    #[serde(flatten)]
    pub audit: Audit,
}

/// Upload one file as multipart form data
pub async fn upload(
    client: &ApiClient,
    file_name: &str,
    content: Vec<u8>,
    source_type: &str,
    source_id: &str,
) -> Result<StoredFile, ApiError> {
    let form = Form::new()
        .part("file", Part::bytes(content).file_name(file_name.to_string()))
        .text("source_type_code", source_type.to_string())
        .text("source_id", source_id.to_string());
    client
        .post("/file-store/upload", form, RequestOptions::new())
        .await?
        .json()
}
