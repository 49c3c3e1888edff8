//! Fetch component resources from a static HTTP server

use futures::future::{BoxFuture, FutureExt};
use std::time::Duration;

use super::{FetchError, ResourceFetcher};

/// Fetches resources relative to a base URL
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Reuse an existing client (shares its connection pool)
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl ResourceFetcher for HttpFetcher {
    fn fetch(&self, path: &str) -> BoxFuture<'static, Result<String, FetchError>> {
        let client = self.client.clone();
        let url = self.url_for(path);
        let path = path.to_string();

        async move {
            tracing::trace!(url = %url, "Fetching component resource");
            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|e| FetchError::Transport {
                    path: path.clone(),
                    message: e.to_string(),
                })?;

            let status = response.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(FetchError::NotFound { path });
            }
            if !status.is_success() {
                return Err(FetchError::Status {
                    path,
                    status: status.as_u16(),
                });
            }

            response.text().await.map_err(|e| FetchError::Body {
                path,
                message: e.to_string(),
            })
        }
        .boxed()
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};
    use tokio::net::TcpListener;

    async fn spawn(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_fetch_success_and_errors() {
        let router = Router::new()
            .route("/components/a/a.html", get(|| async { "<p>a</p>" }))
            .route(
                "/components/b/b.html",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            );
        let base = spawn(router).await;
        let fetcher = HttpFetcher::new(format!("{}/", base), Duration::from_secs(5)).unwrap();

        assert_eq!(fetcher.fetch("components/a/a.html").await.unwrap(), "<p>a</p>");
        assert_eq!(
            fetcher.fetch("/components/b/b.html").await,
            Err(FetchError::Status {
                path: "/components/b/b.html".to_string(),
                status: 500
            })
        );
        assert!(matches!(
            fetcher.fetch("components/c/c.html").await,
            Err(FetchError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_transport_failure() {
        // Bind then drop to get a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = HttpFetcher::new(format!("http://{}", addr), Duration::from_secs(2)).unwrap();
        assert!(matches!(
            fetcher.fetch("components/x/x.html").await,
            Err(FetchError::Transport { .. })
        ));
    }

    #[test]
    fn test_url_join() {
        let fetcher = HttpFetcher::with_client(reqwest::Client::new(), "http://h:1/ui/");
        assert_eq!(fetcher.url_for("/components/x/x.css"), "http://h:1/ui/components/x/x.css");
        assert_eq!(fetcher.describe(), "http://h:1/ui");
    }
}
