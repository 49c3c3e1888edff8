//! View components: the screens built on top of the lifecycle layer
//!
//! Every view owns one [`ComponentInstance`]. Mounting initializes the
//! instance, wires event listeners once, then loads data through the
//! [`ApiClient`] and renders it into the root. Failures are reported through
//! the shared [`ErrorReporter`], shown in the view's `#status` line, and
//! returned to the caller.
//!
//! ```text
//!  ComponentRegistry ──creates──▶ View ──owns──▶ ComponentInstance
//!                                   │                  │
//!                                   ▼                  ▼
//!                               ApiClient          RenderRoot
//! ```

mod agents;
mod chat;
mod form;
mod llm;
mod nav;
mod rag;
mod tools;

#[cfg(test)]
pub(crate) mod testing;

pub use agents::AgentsCanvas;
pub use chat::ChatCanvas;
pub use form::{input_value, set_input_value, set_options};
pub use llm::LlmCanvas;
pub use nav::{NavSelection, Navigation, Section};
pub use rag::RagCanvas;
pub use tools::ToolsCanvas;

use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::api::{ApiClient, ApiError};
use crate::dom::{Element, RenderRoot};
use crate::lifecycle::{ComponentInstance, InitOptions, LifecycleError};
use crate::registry::AppContext;
use crate::report::{ErrorKind, ErrorReport, ErrorReporter};

// ─────────────────────────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Built-in views, one per custom element tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewId {
    LlmCanvas,
    ToolsCanvas,
    RagCanvas,
    AgentsCanvas,
    ChatCanvas,
    Navigation,
}

impl ViewId {
    pub const ALL: [ViewId; 6] = [
        Self::LlmCanvas,
        Self::ToolsCanvas,
        Self::RagCanvas,
        Self::AgentsCanvas,
        Self::ChatCanvas,
        Self::Navigation,
    ];

    /// Custom element tag, also the template identifier
    pub fn tag(&self) -> &'static str {
        match self {
            Self::LlmCanvas => "viki-llm-canvas",
            Self::ToolsCanvas => "viki-tools-canvas",
            Self::RagCanvas => "viki-rag-canvas",
            Self::AgentsCanvas => "viki-agents-canvas",
            Self::ChatCanvas => "viki-chat-canvas",
            Self::Navigation => "viki-left-nav",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.tag() == tag)
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error)]
pub enum ViewError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// User input rejected before any request was made
    #[error("{0}")]
    Validation(String),

    /// An operation needed the render root before the view was mounted
    #[error("view is not mounted")]
    NotMounted,

    /// The template lacks an element the view renders into
    #[error("template has no element matching {0}")]
    MissingElement(String),
}

impl ViewError {
    fn report_kind(&self) -> Option<ErrorKind> {
        match self {
            // Reported by the lifecycle layer itself
            Self::Lifecycle(_) => None,
            Self::Validation(_) => None,
            Self::Api(_) => Some(ErrorKind::Api),
            Self::NotMounted | Self::MissingElement(_) => Some(ErrorKind::Render),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(error) => error.status(),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// View trait
// ─────────────────────────────────────────────────────────────────────────────

/// A mountable screen
///
/// Views are cheap to clone; clones share state. Event listeners hold
/// clones, so [`View::unmount`] (which releases the render root) is what
/// frees them.
pub trait View: Send + Sync {
    fn id(&self) -> ViewId;

    fn instance(&self) -> &ComponentInstance;

    /// Initialize the component, wire listeners, load and render data
    fn mount(&self) -> BoxFuture<'_, Result<RenderRoot, ViewError>>;

    fn unmount(&self) {
        self.instance().detach();
    }

    /// Serialized render root; empty before mounting
    fn html(&self) -> String {
        self.instance()
            .get_render_root()
            .map(|root| root.inner_html())
            .unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared plumbing
// ─────────────────────────────────────────────────────────────────────────────

/// State every view carries
#[derive(Clone)]
pub(crate) struct ViewBase {
    id: ViewId,
    instance: Arc<ComponentInstance>,
    api: ApiClient,
    reporter: Arc<dyn ErrorReporter>,
    init: InitOptions,
    wired: Arc<AtomicBool>,
}

impl ViewBase {
    pub(crate) fn new(id: ViewId, ctx: &AppContext) -> Self {
        Self {
            id,
            instance: Arc::new(ComponentInstance::new(ctx.loader.clone())),
            api: ctx.api.clone(),
            reporter: ctx.reporter.clone(),
            init: ctx.init.clone(),
            wired: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn instance(&self) -> &ComponentInstance {
        &self.instance
    }

    pub(crate) fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Initialize the component. The flag is true exactly once per view,
    /// for the caller that should wire listeners.
    pub(crate) async fn initialize(&self) -> Result<(RenderRoot, bool), ViewError> {
        let root = self
            .instance
            .initialize(self.id.tag(), self.init.clone())
            .await?;
        let first = !self.wired.swap(true, Ordering::SeqCst);
        Ok((root, first))
    }

    pub(crate) fn root(&self) -> Result<RenderRoot, ViewError> {
        self.instance.get_render_root().ok_or(ViewError::NotMounted)
    }

    /// Report `error`, show it in the status line and hand it back
    pub(crate) fn fail(&self, error: impl Into<ViewError>) -> ViewError {
        let error = error.into();
        if let Some(kind) = error.report_kind() {
            self.reporter.report(
                ErrorReport::new(self.id.tag(), kind, error.to_string()).with_status(error.status()),
            );
        }
        if let Some(root) = self.instance.get_render_root() {
            set_status(&root, &error.to_string(), true);
        }
        error
    }

    /// Run a fallible step, routing its failure through [`ViewBase::fail`]
    pub(crate) async fn attempt<T, E>(&self, step: impl Future<Output = Result<T, E>>) -> Result<T, ViewError>
    where
        E: Into<ViewError>,
    {
        step.await.map_err(|e| self.fail(e))
    }

    pub(crate) fn notify(&self, message: &str) {
        if let Some(root) = self.instance.get_render_root() {
            set_status(&root, message, false);
        }
    }

    /// Run an action from an event handler in the background.
    /// Its failure has already been reported when it returns.
    pub(crate) fn spawn<F>(&self, action: F)
    where
        F: Future<Output = Result<(), ViewError>> + Send + 'static,
    {
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let tag = self.id.tag();
                runtime.spawn(async move {
                    if let Err(error) = action.await {
                        tracing::debug!(view = tag, %error, "View action failed");
                    }
                });
            }
            Err(_) => tracing::warn!(view = self.id.tag(), "No runtime to run view action"),
        }
    }
}

/// Write `message` into `#status`
pub(crate) fn set_status(root: &RenderRoot, message: &str, error: bool) {
    root.set_text("#status", message);
    root.set_attribute("#status", "class", if error { "status error" } else { "status ok" });
}

/// A list row: `<li class="item" data-id="..">` with a name and optional detail
pub(crate) fn list_item(id: &str, name: &str, detail: Option<&str>, selected: bool) -> Element {
    let class = if selected { "item selected" } else { "item" };
    let mut item = Element::new("li")
        .with_attr("class", class)
        .with_attr("data-id", id)
        .with_child(Element::new("span").with_attr("class", "name").with_text(name));
    if let Some(detail) = detail.filter(|d| !d.is_empty()) {
        item = item.with_child(Element::new("span").with_attr("class", "detail").with_text(detail));
    }
    item
}

/// Placeholder row for an empty list
pub(crate) fn empty_item(message: &str) -> Element {
    Element::new("li").with_attr("class", "empty").with_text(message)
}

/// `data-id` of the list row an event was dispatched on
pub(crate) fn event_row_id(event: &crate::dom::Event) -> Option<String> {
    event
        .target
        .attr("data-id")
        .map(str::to_string)
        .or_else(|| event.detail.get("id").and_then(|v| v.as_str()).map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip() {
        for id in ViewId::ALL {
            assert_eq!(ViewId::from_tag(id.tag()), Some(id));
        }
        assert_eq!(ViewId::from_tag("viki-unknown"), None);
    }

    #[test]
    fn test_list_item_markup() {
        let row = list_item("a<1>", "Name & co", Some("detail"), true);
        assert_eq!(
            row.outer_html(),
            r#"<li class="item selected" data-id="a&lt;1&gt;"><span class="name">Name &amp; co</span><span class="detail">detail</span></li>"#
        );
        assert_eq!(list_item("x", "X", Some(""), false).children.len(), 1);
    }
}
