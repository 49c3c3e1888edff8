//! Component lifecycle: turning a bare instance into a rendered, styled root
//!
//! A [`ComponentInstance`] builds its render root exactly once:
//!
//! 1. fetch `components/<id>/<id>.html`
//! 2. create the isolated [`RenderRoot`]
//! 3. parse the markup and append it to the root
//! 4. attach `components/<id>/<id>.css` as a `<link>` and wait for it to load
//!
//! The build is memoized as a shared future on the instance. Calls made while
//! it is pending receive the same handle; calls made after it succeeded get
//! the finished root back without any new fetch. State only moves forward:
//!
//! ```text
//! Uninitialized -> Initializing -> Ready | Failed
//!        \______________\_____________\______\____-> Detached
//! ```
//!
//! A failed build is not rolled back. Whatever was appended before the
//! failing stage stays in the (unpublished) root, available through
//! [`ComponentInstance::partial_render_root`] for diagnostics.

mod error;


pub use error::LifecycleError;

use futures::future::{self, BoxFuture, FutureExt, Shared};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::dom::{Element, Fragment, IsolationMode, RenderRoot, Stylesheet};
use crate::report::{ErrorKind, ErrorReport, ErrorReporter};
use crate::resource::{ResourceFetcher, ResourcePaths, TemplateId};

/// Outcome of a build
pub type BuildResult = Result<RenderRoot, LifecycleError>;

/// Handle to a (possibly pending) build; clones observe the same outcome
pub type BuildHandle = Shared<BoxFuture<'static, BuildResult>>;

/// Marker attribute on the `<link>` a build attaches for the component stylesheet
const STYLE_LINK_ATTR: &str = "data-component-style";

// ─────────────────────────────────────────────────────────────────────────────
// State and options
// ─────────────────────────────────────────────────────────────────────────────

/// Coarse progress of an instance's one-time build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
    /// Torn down by the host; terminal
    Detached,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Detached => "detached",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options of the call that starts a build.
/// Calls joining a pending build do not change it.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    pub isolation: IsolationMode,
    /// Fail the build with [`LifecycleError::Timeout`] after this long
    pub timeout: Option<Duration>,
    /// Fail the build with [`LifecycleError::Cancelled`] once cancelled
    pub cancel: Option<CancellationToken>,
}

impl InitOptions {
    pub fn new(isolation: IsolationMode) -> Self {
        Self {
            isolation,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Loader (shared by all instances of an application)
// ─────────────────────────────────────────────────────────────────────────────

/// Where templates come from and where failures go
#[derive(Clone)]
pub struct ComponentLoader {
    fetcher: Arc<dyn ResourceFetcher>,
    paths: ResourcePaths,
    reporter: Arc<dyn ErrorReporter>,
}

impl ComponentLoader {
    pub fn new(
        fetcher: Arc<dyn ResourceFetcher>,
        paths: ResourcePaths,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            fetcher,
            paths,
            reporter,
        }
    }

    pub fn paths(&self) -> &ResourcePaths {
        &self.paths
    }

    pub fn reporter(&self) -> &Arc<dyn ErrorReporter> {
        &self.reporter
    }

    /// Run the four build stages strictly in order
    async fn run_stages(
        &self,
        id: &TemplateId,
        isolation: IsolationMode,
        inner: &Arc<Mutex<InstanceInner>>,
    ) -> BuildResult {
        let markup_path = self.paths.markup(id);
        let markup = self
            .fetcher
            .fetch(&markup_path)
            .await
            .map_err(LifecycleError::from_template)?;
        tracing::trace!(component = %id, bytes = markup.len(), "Template fetched");

        let root = RenderRoot::new(isolation);
        lock(inner).building = Some(root.clone());

        root.append_fragment(Fragment::parse(&markup));

        let href = self.paths.stylesheet(id);
        root.append_child(
            Element::new("link")
                .with_attr("rel", "stylesheet")
                .with_attr("href", href.as_str())
                .with_attr(STYLE_LINK_ATTR, ""),
        );
        let link = format!("link[{}]", STYLE_LINK_ATTR);

        match self.fetcher.fetch(&href).await {
            Ok(text) => {
                root.set_attribute(&link, "data-state", "loaded");
                root.adopt_stylesheet(Stylesheet { href, text });
                Ok(root)
            }
            Err(cause) => {
                root.set_attribute(&link, "data-state", "error");
                Err(LifecycleError::StylesheetLoad { href, cause })
            }
        }
    }
}

impl fmt::Debug for ComponentLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentLoader")
            .field("fetcher", &self.fetcher.describe())
            .field("paths", &self.paths)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Instance
// ─────────────────────────────────────────────────────────────────────────────

struct InstanceInner {
    state: LifecycleState,
    template: Option<TemplateId>,
    /// Published root; set only once the build succeeded
    root: Option<RenderRoot>,
    /// Root under construction (kept after a failed build)
    building: Option<RenderRoot>,
    pending: Option<BuildHandle>,
    failure: Option<LifecycleError>,
    detach: CancellationToken,
}

fn lock(inner: &Mutex<InstanceInner>) -> MutexGuard<'_, InstanceInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

fn resolved(result: BuildResult) -> BuildHandle {
    future::ready(result).boxed().shared()
}

async fn cancelled(token: Option<CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => future::pending().await,
    }
}

/// Needs the tokio time driver when `timeout` is set
async fn expired(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => tokio::time::sleep(timeout).await,
        None => future::pending().await,
    }
}

/// One component instance and its render root
pub struct ComponentInstance {
    loader: ComponentLoader,
    inner: Arc<Mutex<InstanceInner>>,
}

impl ComponentInstance {
    pub fn new(loader: ComponentLoader) -> Self {
        Self {
            loader,
            inner: Arc::new(Mutex::new(InstanceInner {
                state: LifecycleState::Uninitialized,
                template: None,
                root: None,
                building: None,
                pending: None,
                failure: None,
                detach: CancellationToken::new(),
            })),
        }
    }

    pub fn loader(&self) -> &ComponentLoader {
        &self.loader
    }

    /// Build the render root for `template`, at most once.
    ///
    /// - pending build: returns the same handle
    /// - finished build: returns the root, already resolved
    /// - failed/detached instance: returns the recorded failure, no retry
    /// - otherwise: starts the build and returns its handle
    ///
    /// Inside a tokio runtime the build is spawned right away, so it makes
    /// progress even if nobody polls the handle. Called outside one, nothing
    /// runs until the handle is polled, and that poll must happen inside a
    /// tokio runtime with the time driver enabled (fetch delays and
    /// `InitOptions::timeout` use tokio timers).
    pub fn initialize(&self, template: &str, options: InitOptions) -> BuildHandle {
        let mut inner = lock(&self.inner);
        match inner.state {
            LifecycleState::Ready => {
                return resolved(inner.root.clone().ok_or(LifecycleError::Detached));
            }
            LifecycleState::Initializing => {
                if let Some(pending) = &inner.pending {
                    return pending.clone();
                }
            }
            LifecycleState::Failed => {
                return resolved(Err(inner
                    .failure
                    .clone()
                    .unwrap_or(LifecycleError::Cancelled)));
            }
            LifecycleState::Detached => return resolved(Err(LifecycleError::Detached)),
            LifecycleState::Uninitialized => {}
        }

        let id = match TemplateId::new(template) {
            Ok(id) => id,
            Err(invalid) => {
                drop(inner);
                let error = LifecycleError::from(invalid);
                self.loader.reporter.report(ErrorReport::new(
                    template,
                    ErrorKind::Lifecycle,
                    error.to_string(),
                ));
                return resolved(Err(error));
            }
        };

        tracing::debug!(component = %id, isolation = %options.isolation, "Starting component build");
        inner.template = Some(id.clone());
        inner.state = LifecycleState::Initializing;
        let handle = self.build(id, options, inner.detach.clone()).shared();
        inner.pending = Some(handle.clone());
        drop(inner);

        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(handle.clone());
        }
        handle
    }

    fn build(
        &self,
        id: TemplateId,
        options: InitOptions,
        detach: CancellationToken,
    ) -> BoxFuture<'static, BuildResult> {
        let loader = self.loader.clone();
        let inner = self.inner.clone();

        async move {
            let InitOptions {
                isolation,
                timeout,
                cancel,
            } = options;

            let result = tokio::select! {
                result = loader.run_stages(&id, isolation, &inner) => result,
                _ = detach.cancelled() => Err(LifecycleError::Detached),
                _ = cancelled(cancel) => Err(LifecycleError::Cancelled),
                _ = expired(timeout) => Err(LifecycleError::Timeout(timeout.unwrap_or_default())),
            };

            let settled = {
                let mut inner = lock(&inner);
                inner.pending = None;
                if inner.state != LifecycleState::Initializing {
                    false
                } else {
                    match &result {
                        Ok(root) => {
                            inner.state = LifecycleState::Ready;
                            inner.root = Some(root.clone());
                            inner.building = None;
                        }
                        Err(error) => {
                            inner.state = LifecycleState::Failed;
                            inner.failure = Some(error.clone());
                        }
                    }
                    true
                }
            };

            match &result {
                Ok(_) => tracing::debug!(component = %id, "Component ready"),
                Err(error) if settled => loader.reporter.report(ErrorReport::new(
                    id.as_str(),
                    ErrorKind::Lifecycle,
                    error.to_string(),
                )),
                Err(error) => tracing::debug!(component = %id, %error, "Build ended after detach"),
            }
            result
        }
        .boxed()
    }

    /// The render root, once the first build has completed successfully
    pub fn get_render_root(&self) -> Option<RenderRoot> {
        let inner = lock(&self.inner);
        match inner.state {
            LifecycleState::Ready => inner.root.clone(),
            _ => None,
        }
    }

    /// The root as outside code sees it: only for open, finished instances
    pub fn shadow_root(&self) -> Option<RenderRoot> {
        self.get_render_root()
            .filter(|root| root.mode() == IsolationMode::Open)
    }

    /// Tree left behind by a failed build
    pub fn partial_render_root(&self) -> Option<RenderRoot> {
        let inner = lock(&self.inner);
        match inner.state {
            LifecycleState::Failed => inner.building.clone(),
            _ => None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        lock(&self.inner).state
    }

    pub fn template_id(&self) -> Option<TemplateId> {
        lock(&self.inner).template.clone()
    }

    pub fn failure(&self) -> Option<LifecycleError> {
        lock(&self.inner).failure.clone()
    }

    /// Tear the instance down: cancel a pending build and release the root.
    /// Every later `initialize` resolves to [`LifecycleError::Detached`].
    pub fn detach(&self) {
        let mut inner = lock(&self.inner);
        if inner.state == LifecycleState::Detached {
            return;
        }
        let previous = inner.state;
        inner.state = LifecycleState::Detached;
        inner.pending = None;
        inner.root = None;
        inner.building = None;
        inner.detach.cancel();
        tracing::debug!(
            component = ?inner.template.as_ref().map(TemplateId::as_str),
            from = %previous,
            "Component detached"
        );
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("ComponentInstance")
            .field("template", &inner.template)
            .field("state", &inner.state)
            .finish()
    }
}
