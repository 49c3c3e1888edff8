//! LLM provider configurations (`/llm/`)

use serde::{Deserialize, Serialize};

use super::{Audit, Resource};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    pub llc_id: String,
    pub llc_provider_type_cd: String,
    pub llc_model_cd: String,
    #[serde(default)]
    pub llc_endpoint_url: Option<String>,
    #[serde(default)]
    pub llc_api_key: Option<String>,
    /// Uploaded provider file (e.g. service account credentials)
    #[serde(default)]
    pub llc_fls_id: Option<String>,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewLlmConfig {
    pub llc_id: String,
    pub llc_provider_type_cd: String,
    pub llc_model_cd: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llc_endpoint_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llc_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llc_fls_id: Option<String>,
}

/// Partial update; unset fields are left untouched server-side
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LlmConfigUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llc_provider_type_cd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llc_model_cd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llc_endpoint_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llc_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llc_fls_id: Option<String>,
}

impl From<NewLlmConfig> for LlmConfigUpdate {
    fn from(new: NewLlmConfig) -> Self {
        Self {
            llc_provider_type_cd: Some(new.llc_provider_type_cd),
            llc_model_cd: Some(new.llc_model_cd),
            llc_endpoint_url: new.llc_endpoint_url,
            llc_api_key: new.llc_api_key,
            llc_fls_id: new.llc_fls_id,
        }
    }
}

impl Resource for LlmConfig {
    const PATH: &'static str = "llm";
    type Create = NewLlmConfig;
    type Update = LlmConfigUpdate;

    fn key(&self) -> &str {
        &self.llc_id
    }
}
