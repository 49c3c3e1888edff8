//! In-memory resources with scripted latency and failures
//!
//! Records every requested path, which makes it the fetcher of choice for
//! exercising build ordering and de-duplication.

use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::{FetchError, ResourceFetcher};

#[derive(Debug, Clone)]
struct Entry {
    outcome: Result<String, FetchError>,
    delay: Option<Duration>,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<String, Entry>,
    requests: Vec<String>,
}

/// Shared in-memory resource table
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    state: Arc<Mutex<State>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serve `body` at `path` immediately
    pub fn insert(&self, path: impl Into<String>, body: impl Into<String>) -> &Self {
        self.script(path, Ok(body.into()), None)
    }

    /// Serve `body` at `path` after `delay`
    pub fn insert_delayed(
        &self,
        path: impl Into<String>,
        body: impl Into<String>,
        delay: Duration,
    ) -> &Self {
        self.script(path, Ok(body.into()), Some(delay))
    }

    /// Fail requests for `path` with `error`
    pub fn fail(&self, path: impl Into<String>, error: FetchError) -> &Self {
        self.script(path, Err(error), None)
    }

    /// Fail requests for `path` with `error` after `delay`
    pub fn fail_delayed(&self, path: impl Into<String>, error: FetchError, delay: Duration) -> &Self {
        self.script(path, Err(error), Some(delay))
    }

    fn script(
        &self,
        path: impl Into<String>,
        outcome: Result<String, FetchError>,
        delay: Option<Duration>,
    ) -> &Self {
        self.state()
            .entries
            .insert(path.into(), Entry { outcome, delay });
        self
    }

    /// Every requested path, in request order
    pub fn requests(&self) -> Vec<String> {
        self.state().requests.clone()
    }

    pub fn request_count(&self, path: &str) -> usize {
        self.state().requests.iter().filter(|p| *p == path).count()
    }
}

impl ResourceFetcher for MemoryFetcher {
    fn fetch(&self, path: &str) -> BoxFuture<'static, Result<String, FetchError>> {
        let entry = {
            let mut state = self.state();
            state.requests.push(path.to_string());
            state.entries.get(path).cloned()
        };
        let path = path.to_string();

        async move {
            let Some(entry) = entry else {
                return Err(FetchError::NotFound { path });
            };
            if let Some(delay) = entry.delay {
                tokio::time::sleep(delay).await;
            }
            entry.outcome
        }
        .boxed()
    }

    fn describe(&self) -> String {
        format!("memory ({} resources)", self.state().entries.len())
    }
}
