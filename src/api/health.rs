//! Service health (`/health/`)

use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiError, RequestOptions};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
}

impl Health {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

pub async fn check(client: &ApiClient) -> Result<Health, ApiError> {
    client.get("/health/", RequestOptions::new()).await?.json()
}
