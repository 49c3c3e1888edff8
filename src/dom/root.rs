//! Isolated render root
//!
//! A `RenderRoot` is the subtree a component renders into. Handles are cheap
//! clones of one shared tree; `ptr_eq` tells whether two handles are the same
//! root. Listener callbacks run without any internal lock held, so handlers
//! are free to mutate the root they were attached to.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{
    element_at_mut, element_with_ancestors, find_paths, serialize_nodes, Element, Fragment,
    IsolationMode, Node, Selector,
};

/// Callback attached with [`RenderRoot::add_event_listener`]
pub type EventHandler = Arc<dyn Fn(&Event) + Send + Sync>;

/// An event dispatched through a render root
#[derive(Debug, Clone)]
pub struct Event {
    /// Event name ("click", "input", "submit", ...)
    pub kind: String,
    /// Snapshot of the element the event was dispatched on
    pub target: Element,
    /// Free-form payload supplied by the dispatcher
    pub detail: serde_json::Value,
}

/// A stylesheet adopted by the root after its `<link>` finished loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stylesheet {
    pub href: String,
    pub text: String,
}

enum ListenerTarget {
    Root,
    Matching(Selector),
}

struct Listener {
    target: ListenerTarget,
    kind: String,
    handler: EventHandler,
}

struct RootInner {
    mode: IsolationMode,
    children: Mutex<Vec<Node>>,
    stylesheets: Mutex<Vec<Stylesheet>>,
    listeners: Mutex<Vec<Listener>>,
}

/// Handle to an isolated render tree
#[derive(Clone)]
pub struct RenderRoot {
    inner: Arc<RootInner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RenderRoot {
    /// Create an empty root with the given isolation mode
    pub fn new(mode: IsolationMode) -> Self {
        Self {
            inner: Arc::new(RootInner {
                mode,
                children: Mutex::new(Vec::new()),
                stylesheets: Mutex::new(Vec::new()),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn mode(&self) -> IsolationMode {
        self.inner.mode
    }

    /// Whether both handles point at the same root
    pub fn ptr_eq(&self, other: &RenderRoot) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mutation
    // ─────────────────────────────────────────────────────────────────────

    /// Move every node of a fragment to the end of the root
    pub fn append_fragment(&self, fragment: Fragment) {
        lock(&self.inner.children).extend(fragment.into_nodes());
    }

    pub fn append_child(&self, node: impl Into<Node>) {
        lock(&self.inner.children).push(node.into());
    }

    /// Number of top-level nodes
    pub fn child_count(&self) -> usize {
        lock(&self.inner.children).len()
    }

    /// Run `f` on the first element matching `selector`
    pub fn with_element_mut<R>(&self, selector: &str, f: impl FnOnce(&mut Element) -> R) -> Option<R> {
        let selector = Selector::parse(selector)?;
        let mut children = lock(&self.inner.children);
        let path = find_paths(&children, &selector, true).into_iter().next()?;
        element_at_mut(&mut children, &path).map(f)
    }

    /// Run `f` on every element matching `selector`; returns the match count
    pub fn for_each_mut(&self, selector: &str, mut f: impl FnMut(&mut Element)) -> usize {
        let Some(selector) = Selector::parse(selector) else {
            return 0;
        };
        let mut children = lock(&self.inner.children);
        let paths = find_paths(&children, &selector, false);
        for path in &paths {
            if let Some(element) = element_at_mut(&mut children, path) {
                f(element);
            }
        }
        paths.len()
    }

    /// Replace the children of the first match with parsed markup
    pub fn set_inner_html(&self, selector: &str, markup: &str) -> bool {
        let nodes = Fragment::parse(markup).into_nodes();
        self.with_element_mut(selector, |el| el.children = nodes).is_some()
    }

    /// Replace the children of the first match with a text node
    pub fn set_text(&self, selector: &str, text: &str) -> bool {
        self.with_element_mut(selector, |el| el.set_text(text)).is_some()
    }

    pub fn set_attribute(&self, selector: &str, name: &str, value: &str) -> bool {
        self.with_element_mut(selector, |el| el.set_attr(name, value)).is_some()
    }

    /// Replace the children of the first match with `nodes`
    pub fn replace_children(&self, selector: &str, nodes: Vec<Node>) -> bool {
        self.with_element_mut(selector, |el| el.children = nodes).is_some()
    }

    /// Detach the first element matching `selector`, returning it
    pub fn remove(&self, selector: &str) -> Option<Element> {
        let selector = Selector::parse(selector)?;
        let mut children = lock(&self.inner.children);
        let path = find_paths(&children, &selector, true).into_iter().next()?;
        let (last, parent_path) = path.split_last()?;
        let siblings = if parent_path.is_empty() {
            &mut *children
        } else {
            &mut element_at_mut(&mut children, parent_path)?.children
        };
        match siblings.remove(*last) {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    /// Snapshot of the first element matching `selector`
    pub fn query_selector(&self, selector: &str) -> Option<Element> {
        let selector = Selector::parse(selector)?;
        let children = lock(&self.inner.children);
        let path = find_paths(&children, &selector, true).into_iter().next()?;
        element_with_ancestors(&children, &path).map(|(el, _)| el.clone())
    }

    /// Snapshots of every element matching `selector`, in document order
    pub fn query_selector_all(&self, selector: &str) -> Vec<Element> {
        let Some(selector) = Selector::parse(selector) else {
            return Vec::new();
        };
        let children = lock(&self.inner.children);
        find_paths(&children, &selector, false)
            .iter()
            .filter_map(|path| element_with_ancestors(&children, path).map(|(el, _)| el.clone()))
            .collect()
    }

    /// Serialized content of the root
    pub fn inner_html(&self) -> String {
        serialize_nodes(&lock(&self.inner.children))
    }

    /// Text content of the whole root
    pub fn text_content(&self) -> String {
        lock(&self.inner.children)
            .iter()
            .map(|node| match node {
                Node::Text(t) => t.clone(),
                Node::Element(e) => e.text_content(),
            })
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Styles
    // ─────────────────────────────────────────────────────────────────────

    pub fn adopt_stylesheet(&self, sheet: Stylesheet) {
        lock(&self.inner.stylesheets).push(sheet);
    }

    pub fn stylesheets(&self) -> Vec<Stylesheet> {
        lock(&self.inner.stylesheets).clone()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Events
    // ─────────────────────────────────────────────────────────────────────

    /// Attach a listener to elements matching `selector`.
    /// Matching is evaluated at dispatch time, so rows rendered later are
    /// covered too. Returns false for a malformed selector.
    pub fn add_event_listener(
        &self,
        selector: &str,
        kind: &str,
        handler: impl Fn(&Event) + Send + Sync + 'static,
    ) -> bool {
        let Some(selector) = Selector::parse(selector) else {
            return false;
        };
        lock(&self.inner.listeners).push(Listener {
            target: ListenerTarget::Matching(selector),
            kind: kind.to_string(),
            handler: Arc::new(handler),
        });
        true
    }

    /// Attach a listener to the root itself; it sees every event that bubbles up
    pub fn add_root_listener(&self, kind: &str, handler: impl Fn(&Event) + Send + Sync + 'static) {
        lock(&self.inner.listeners).push(Listener {
            target: ListenerTarget::Root,
            kind: kind.to_string(),
            handler: Arc::new(handler),
        });
    }

    /// Dispatch an event on the first element matching `target`.
    ///
    /// Listeners on the target and on its ancestors run first (innermost
    /// first), then root listeners. Returns how many handlers ran.
    pub fn dispatch(&self, target: &str, kind: &str, detail: serde_json::Value) -> usize {
        let Some(target_selector) = Selector::parse(target) else {
            return 0;
        };

        // Snapshot the target chain so handlers run without the tree locked
        let chain: Vec<Element> = {
            let children = lock(&self.inner.children);
            let Some(path) = find_paths(&children, &target_selector, true).into_iter().next() else {
                return 0;
            };
            let Some((element, ancestors)) = element_with_ancestors(&children, &path) else {
                return 0;
            };
            ancestors.into_iter().cloned().chain(std::iter::once(element.clone())).collect()
        };
        let Some(target_element) = chain.last().cloned() else {
            return 0;
        };

        let handlers: Vec<EventHandler> = {
            let listeners = lock(&self.inner.listeners);
            let mut bubbling = Vec::new();
            for depth in (0..chain.len()).rev() {
                let ancestors: Vec<&Element> = chain[..depth].iter().collect();
                for listener in listeners.iter().filter(|l| l.kind == kind) {
                    if let ListenerTarget::Matching(sel) = &listener.target {
                        if sel.matches(&chain[depth], &ancestors) {
                            bubbling.push(listener.handler.clone());
                        }
                    }
                }
            }
            bubbling.extend(
                listeners
                    .iter()
                    .filter(|l| l.kind == kind && matches!(l.target, ListenerTarget::Root))
                    .map(|l| l.handler.clone()),
            );
            bubbling
        };

        let event = Event {
            kind: kind.to_string(),
            target: target_element,
            detail,
        };
        for handler in &handlers {
            handler(&event);
        }
        handlers.len()
    }
}

impl fmt::Debug for RenderRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderRoot")
            .field("mode", &self.inner.mode)
            .field("children", &lock(&self.inner.children).len())
            .field("stylesheets", &lock(&self.inner.stylesheets).len())
            .field("listeners", &lock(&self.inner.listeners).len())
            .finish()
    }
}
