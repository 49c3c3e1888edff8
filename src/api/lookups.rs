//! Lookup code tables (`/lookups/`)

use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiError, Audit, RequestOptions};

/// Lookup type holding LLM provider codes
pub const PROVIDER_TYPE: &str = "PROVIDER_TYPE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupDetail {
    pub lkd_lkt_type: String,
    pub lkd_code: String,
    #[serde(default)]
    pub lkd_description: Option<String>,
    #[serde(default)]
    pub lkd_sub_code: Option<String>,
    #[serde(default)]
    pub lkd_sort: Option<i64>,
    #[serde(flatten)]
    pub audit: Audit,
}

impl LookupDetail {
    /// Description when present, else the code
    pub fn label(&self) -> &str {
        self.lkd_description.as_deref().unwrap_or(&self.lkd_code)
    }
}

/// Details of one lookup type, ordered by `lkd_sort` then code
pub async fn details(client: &ApiClient, type_code: &str) -> Result<Vec<LookupDetail>, ApiError> {
    let mut details: Vec<LookupDetail> = client
        .get("/lookups/details", RequestOptions::new().param("type_code", type_code))
        .await?
        .json()?;
    details.sort_by(|a, b| {
        a.lkd_sort
            .unwrap_or(i64::MAX)
            .cmp(&b.lkd_sort.unwrap_or(i64::MAX))
            .then_with(|| a.lkd_code.cmp(&b.lkd_code))
    });
    Ok(details)
}
