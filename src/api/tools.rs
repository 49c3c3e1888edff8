//! MCP tools (`/tools/`) and their environment variables

use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiError, Audit, RequestOptions, Resource};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub tol_id: String,
    pub tol_name: String,
    #[serde(default)]
    pub tol_description: Option<String>,
    /// Command line that starts the MCP server
    pub tol_mcp_command: String,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewTool {
    pub tol_id: String,
    pub tol_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tol_description: Option<String>,
    pub tol_mcp_command: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ToolUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tol_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tol_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tol_mcp_command: Option<String>,
}

impl From<NewTool> for ToolUpdate {
    fn from(new: NewTool) -> Self {
        Self {
            tol_name: Some(new.tol_name),
            tol_description: new.tol_description,
            tol_mcp_command: Some(new.tol_mcp_command),
        }
    }
}

impl Resource for Tool {
    const PATH: &'static str = "tools";
    type Create = NewTool;
    type Update = ToolUpdate;

    fn key(&self) -> &str {
        &self.tol_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolEnvVar {
    pub tev_tol_id: String,
    pub tev_key: String,
    #[serde(default)]
    pub tev_value: Option<String>,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Serialize)]
struct EnvVarBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    tev_tol_id: Option<&'a str>,
    tev_key: &'a str,
    tev_value: Option<&'a str>,
}

fn env_path(tool_id: &str) -> String {
    format!("/tools/{}/env-variables", urlencoding::encode(tool_id))
}

pub async fn env_vars(client: &ApiClient, tool_id: &str) -> Result<Vec<ToolEnvVar>, ApiError> {
    client.get(&env_path(tool_id), RequestOptions::new()).await?.json()
}

pub async fn add_env_var(
    client: &ApiClient,
    tool_id: &str,
    key: &str,
    value: Option<&str>,
) -> Result<ToolEnvVar, ApiError> {
    let body = EnvVarBody {
        tev_tol_id: Some(tool_id),
        tev_key: key,
        tev_value: value,
    };
    let body = serde_json::to_value(body).map_err(ApiError::decode)?;
    client
        .post(&env_path(tool_id), body, RequestOptions::new())
        .await?
        .json()
}

pub async fn update_env_var(
    client: &ApiClient,
    tool_id: &str,
    key: &str,
    value: Option<&str>,
) -> Result<ToolEnvVar, ApiError> {
    let body = EnvVarBody {
        tev_tol_id: None,
        tev_key: key,
        tev_value: value,
    };
    let body = serde_json::to_value(body).map_err(ApiError::decode)?;
    let path = format!("{}/{}", env_path(tool_id), urlencoding::encode(key));
    client.put(&path, body, RequestOptions::new()).await?.json()
}

pub async fn remove_env_var(client: &ApiClient, tool_id: &str, key: &str) -> Result<(), ApiError> {
    let path = format!("{}/{}", env_path(tool_id), urlencoding::encode(key));
    client.delete(&path, RequestOptions::new()).await?;
    Ok(())
}
