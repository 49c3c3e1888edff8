//! Fetch component resources from a local application root

use futures::future::{BoxFuture, FutureExt};
use std::path::{Component, Path, PathBuf};

use super::{FetchError, ResourceFetcher};

/// Reads resources below a directory
#[derive(Debug, Clone)]
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a resource path below the root; `None` if it would escape it
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl ResourceFetcher for FileFetcher {
    fn fetch(&self, path: &str) -> BoxFuture<'static, Result<String, FetchError>> {
        let resolved = self.resolve(path);
        let path = path.to_string();

        async move {
            let Some(file) = resolved else {
                return Err(FetchError::NotFound { path });
            };
            match tokio::fs::read_to_string(&file).await {
                Ok(body) => Ok(body),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Err(FetchError::NotFound { path })
                }
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => Err(FetchError::Body {
                    path,
                    message: e.to_string(),
                }),
                Err(e) => Err(FetchError::Transport {
                    path,
                    message: e.to_string(),
                }),
            }
        }
        .boxed()
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}
