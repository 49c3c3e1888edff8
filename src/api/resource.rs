//! Generic CRUD over collection endpoints
//!
//! Every backend collection follows the same shape: `GET /{path}/` lists,
//! `GET /{path}/{id}` fetches, `POST /{path}/` creates, `PUT /{path}/{id}`
//! updates and `DELETE /{path}/{id}` removes.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{ApiClient, ApiError, RequestOptions};

/// A record type served by a collection endpoint
pub trait Resource: DeserializeOwned + Send + 'static {
    /// Collection path without slashes, e.g. `llm` or `knowledge-bases`
    const PATH: &'static str;

    /// Body accepted on create
    type Create: Serialize + Send + Sync;
    /// Body accepted on update
    type Update: Serialize + Send + Sync;

    /// Primary key
    fn key(&self) -> &str;
}

fn collection<R: Resource>() -> String {
    format!("/{}/", R::PATH)
}

fn item<R: Resource>(id: &str) -> String {
    format!("/{}/{}", R::PATH, urlencoding::encode(id))
}

fn to_json<T: Serialize>(body: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(ApiError::decode)
}

pub async fn list<R: Resource>(client: &ApiClient, options: RequestOptions) -> Result<Vec<R>, ApiError> {
    client.get(&collection::<R>(), options).await?.json()
}

pub async fn fetch<R: Resource>(client: &ApiClient, id: &str) -> Result<R, ApiError> {
    client.get(&item::<R>(id), RequestOptions::new()).await?.json()
}

pub async fn create<R: Resource>(client: &ApiClient, body: &R::Create) -> Result<R, ApiError> {
    client
        .post(&collection::<R>(), to_json(body)?, RequestOptions::new())
        .await?
        .json()
}

pub async fn update<R: Resource>(client: &ApiClient, id: &str, body: &R::Update) -> Result<R, ApiError> {
    client
        .put(&item::<R>(id), to_json(body)?, RequestOptions::new())
        .await?
        .json()
}

pub async fn remove<R: Resource>(client: &ApiClient, id: &str) -> Result<(), ApiError> {
    client.delete(&item::<R>(id), RequestOptions::new()).await?;
    Ok(())
}
