//! Explicit component registry
//!
//! Tags are registered on a registry value handed to the application
//! bootstrap; nothing registers itself at load time. Each factory receives
//! the [`AppContext`] and returns a fresh view.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::api::ApiClient;
use crate::lifecycle::{ComponentLoader, InitOptions};
use crate::report::ErrorReporter;
use crate::views::{AgentsCanvas, ChatCanvas, LlmCanvas, Navigation, RagCanvas, ToolsCanvas, View, ViewId};

/// Everything a view needs from the application
#[derive(Clone)]
pub struct AppContext {
    pub loader: ComponentLoader,
    pub api: ApiClient,
    pub reporter: Arc<dyn ErrorReporter>,
    /// Options each view initializes its component with
    pub init: InitOptions,
}

impl AppContext {
    pub fn new(loader: ComponentLoader, api: ApiClient, init: InitOptions) -> Self {
        let reporter = loader.reporter().clone();
        Self {
            loader,
            api,
            reporter,
            init,
        }
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("loader", &self.loader)
            .field("api", &self.api.config().base_url)
            .field("init", &self.init)
            .finish()
    }
}

/// Builds a view for one tag
pub type ViewFactory = Arc<dyn Fn(&AppContext) -> Arc<dyn View> + Send + Sync>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tag already registered: {0}")]
    Duplicate(String),
    #[error("invalid custom element tag: {0}")]
    InvalidTag(String),
    #[error("unknown component tag: {0}")]
    Unknown(String),
}

/// Tag name → view factory
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    factories: BTreeMap<String, ViewFactory>,
}

fn factory<V: View + 'static>(build: fn(&AppContext) -> V) -> ViewFactory {
    Arc::new(move |ctx: &AppContext| -> Arc<dyn View> { Arc::new(build(ctx)) })
}

/// Custom element names are lowercase and contain a hyphen
fn valid_tag(tag: &str) -> bool {
    tag.contains('-')
        && tag.starts_with(|c: char| c.is_ascii_lowercase())
        && tag
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' || c == '.')
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in view
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let builtins: [(ViewId, ViewFactory); 6] = [
            (ViewId::LlmCanvas, factory(LlmCanvas::new)),
            (ViewId::ToolsCanvas, factory(ToolsCanvas::new)),
            (ViewId::RagCanvas, factory(RagCanvas::new)),
            (ViewId::AgentsCanvas, factory(AgentsCanvas::new)),
            (ViewId::ChatCanvas, factory(ChatCanvas::new)),
            (ViewId::Navigation, factory(Navigation::new)),
        ];
        for (id, build) in builtins {
            registry.factories.insert(id.tag().to_string(), build);
        }
        registry
    }

    pub fn register(
        &mut self,
        tag: &str,
        factory: impl Fn(&AppContext) -> Arc<dyn View> + Send + Sync + 'static,
    ) -> Result<(), RegistryError> {
        if !valid_tag(tag) {
            return Err(RegistryError::InvalidTag(tag.to_string()));
        }
        if self.factories.contains_key(tag) {
            return Err(RegistryError::Duplicate(tag.to_string()));
        }
        self.factories.insert(tag.to_string(), Arc::new(factory));
        Ok(())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    /// Registered tags in sorted order
    pub fn tags(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Instantiate the view registered for `tag`
    pub fn create(&self, tag: &str, ctx: &AppContext) -> Result<Arc<dyn View>, RegistryError> {
        let factory = self
            .factories
            .get(&tag.trim().to_ascii_lowercase())
            .ok_or_else(|| RegistryError::Unknown(tag.to_string()))?;
        Ok(factory(ctx))
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}
