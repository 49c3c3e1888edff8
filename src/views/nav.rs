//! `viki-left-nav`: section entries and the chat session list
//!
//! Navigation only records what was picked. Hosts that switch screens
//! follow [`Navigation::subscribe`].

use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

use crate::api::chat::{self, ChatSession};
use crate::dom::{Element, Node, RenderRoot};
use crate::lifecycle::ComponentInstance;
use crate::registry::AppContext;

use super::{empty_item, event_row_id, list_item, View, ViewBase, ViewError, ViewId};

/// Sessions shown in the list
const SESSION_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    #[default]
    Llm,
    Tools,
    Rag,
    Agents,
    Chat,
}

impl Section {
    pub const ALL: [Section; 5] = [Self::Llm, Self::Tools, Self::Rag, Self::Agents, Self::Chat];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Llm => "llm",
            Self::Tools => "tools",
            Self::Rag => "rag",
            Self::Agents => "agents",
            Self::Chat => "chat",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Llm => "LLMs",
            Self::Tools => "Tools",
            Self::Rag => "Knowledge Bases",
            Self::Agents => "Agents",
            Self::Chat => "Chat",
        }
    }

    /// The view that shows this section
    pub fn view(&self) -> ViewId {
        match self {
            Self::Llm => ViewId::LlmCanvas,
            Self::Tools => ViewId::ToolsCanvas,
            Self::Rag => ViewId::RagCanvas,
            Self::Agents => ViewId::AgentsCanvas,
            Self::Chat => ViewId::ChatCanvas,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the user last picked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavSelection {
    pub section: Section,
    pub session: Option<String>,
}

#[derive(Default)]
struct State {
    sessions: Vec<ChatSession>,
}

#[derive(Clone)]
pub struct Navigation {
    base: ViewBase,
    state: Arc<Mutex<State>>,
    selection: Arc<watch::Sender<NavSelection>>,
}

impl Navigation {
    pub fn new(ctx: &AppContext) -> Self {
        let (selection, _) = watch::channel(NavSelection::default());
        Self {
            base: ViewBase::new(ViewId::Navigation, ctx),
            state: Arc::default(),
            selection: Arc::new(selection),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn sessions(&self) -> Vec<ChatSession> {
        self.state().sessions.clone()
    }

    pub fn selection(&self) -> NavSelection {
        self.selection.borrow().clone()
    }

    pub fn active_section(&self) -> Section {
        self.selection.borrow().section
    }

    pub fn active_session(&self) -> Option<String> {
        self.selection.borrow().session.clone()
    }

    /// Receiver that sees every change of the selection
    pub fn subscribe(&self) -> watch::Receiver<NavSelection> {
        self.selection.subscribe()
    }

    fn wire(&self, root: &RenderRoot) {
        let view = self.clone();
        root.add_event_listener("#nav-sections", "click", move |event| {
            let section = event
                .target
                .attr("data-section")
                .or_else(|| event.detail.get("section").and_then(|s| s.as_str()))
                .and_then(Section::from_key);
            if let Some(section) = section {
                let _ = view.select_section(section);
            }
        });
        let view = self.clone();
        root.add_event_listener("#session-list", "click", move |event| {
            if let Some(id) = event_row_id(event) {
                let _ = view.select_session(&id);
            }
        });
    }

    pub async fn refresh(&self) -> Result<(), ViewError> {
        let sessions = self
            .base
            .attempt(chat::sessions(self.base.api(), None, 0, SESSION_LIMIT))
            .await?;
        let active = self.active_session();
        if active.is_some_and(|id| !sessions.iter().any(|s| s.cht_id == id)) {
            self.selection.send_modify(|s| s.session = None);
        }
        self.state().sessions = sessions;
        self.render()
    }

    fn render(&self) -> Result<(), ViewError> {
        let root = self.base.root()?;
        let selection = self.selection();

        let sections: Vec<Node> = Section::ALL
            .iter()
            .map(|section| {
                let class = if *section == selection.section {
                    "nav-item active"
                } else {
                    "nav-item"
                };
                Element::new("li")
                    .with_attr("class", class)
                    .with_attr("data-section", section.key())
                    .with_text(section.label())
                    .into()
            })
            .collect();
        if !root.replace_children("#nav-sections", sections) {
            return Err(self.base.fail(ViewError::MissingElement("#nav-sections".to_string())));
        }

        let state = self.state();
        let sessions: Vec<Node> = if state.sessions.is_empty() {
            vec![empty_item("No chat sessions").into()]
        } else {
            state
                .sessions
                .iter()
                .map(|s| {
                    let active = selection.session.as_deref() == Some(s.cht_id.as_str());
                    let mut row = list_item(&s.cht_id, &s.cht_name, Some(s.cht_agt_id.as_str()), active);
                    if active {
                        row.set_attr("class", "item selected active");
                    }
                    row.into()
                })
                .collect()
        };
        root.replace_children("#session-list", sessions);
        Ok(())
    }

    pub fn select_section(&self, section: Section) -> Result<(), ViewError> {
        tracing::debug!(section = section.key(), "Section selected");
        self.selection.send_modify(|s| s.section = section);
        self.render()
    }

    /// Activate a session, which also switches to the chat section
    pub fn select_session(&self, session_id: &str) -> Result<(), ViewError> {
        if !self.state().sessions.iter().any(|s| s.cht_id == session_id) {
            return Err(self
                .base
                .fail(ViewError::Validation(format!("unknown chat session {}", session_id))));
        }
        tracing::debug!(session = session_id, "Session selected");
        self.selection.send_modify(|s| {
            s.section = Section::Chat;
            s.session = Some(session_id.to_string());
        });
        self.render()
    }

    /// Create a session for `agent_id` and make it active
    pub async fn new_session(&self, name: &str, agent_id: &str) -> Result<ChatSession, ViewError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(self.base.fail(ViewError::Validation("Name is required".to_string())));
        }
        let session = self
            .base
            .attempt(chat::create_session(self.base.api(), name, None, agent_id))
            .await?;
        tracing::info!(session = %session.cht_id, agent = agent_id, "Chat session created");
        self.refresh().await?;
        self.select_session(&session.cht_id)?;
        Ok(session)
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<(), ViewError> {
        self.base
            .attempt(chat::delete_session(self.base.api(), session_id))
            .await?;
        tracing::info!(session = session_id, "Chat session deleted");
        self.refresh().await
    }
}

impl View for Navigation {
    fn id(&self) -> ViewId {
        ViewId::Navigation
    }

    fn instance(&self) -> &ComponentInstance {
        self.base.instance()
    }

    fn mount(&self) -> BoxFuture<'_, Result<RenderRoot, ViewError>> {
        async move {
            let (root, first) = self.base.initialize().await?;
            if first {
                self.wire(&root);
            }
            self.refresh().await?;
            Ok(root)
        }
        .boxed()
    }
}
