//! `viki-chat-canvas`: message history of one chat session

use futures::future::{BoxFuture, FutureExt};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::agents::Agent;
use crate::api::chat::{self, ChatMessage, ChatSession, Role};
use crate::api::resource;
use crate::dom::{Element, Fragment, Node, RenderRoot};
use crate::lifecycle::ComponentInstance;
use crate::registry::AppContext;
use crate::render::markdown_to_safe_html;

use super::form::{required, set_input_value};
use super::{View, ViewBase, ViewError, ViewId};

/// Sessions looked up when opening one by id
const SESSION_PAGE: usize = 100;

#[derive(Default)]
struct State {
    session: Option<ChatSession>,
    agent_name: String,
    messages: Vec<ChatMessage>,
}

#[derive(Clone)]
pub struct ChatCanvas {
    base: ViewBase,
    state: Arc<Mutex<State>>,
}

fn message_node(message: &ChatMessage) -> Node {
    let role = match message.msg_role {
        Role::User => "user",
        Role::Ai => "ai",
    };
    let body = Fragment::parse(&markdown_to_safe_html(&message.text()));
    let mut content = Element::new("div").with_attr("class", "content");
    content.children = body.into_nodes();
    Element::new("div")
        .with_attr("class", format!("message {}", role))
        .with_attr("data-id", message.msg_id.as_str())
        .with_child(
            Element::new("div")
                .with_attr("class", "author")
                .with_text(match message.msg_role {
                    Role::User => "You",
                    Role::Ai => message.msg_agent_name.as_str(),
                }),
        )
        .with_child(content)
        .into()
}

impl ChatCanvas {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            base: ViewBase::new(ViewId::ChatCanvas, ctx),
            state: Arc::default(),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn session(&self) -> Option<ChatSession> {
        self.state().session.clone()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state().messages.clone()
    }

    fn wire(&self, root: &RenderRoot) {
        let view = self.clone();
        root.add_event_listener("#send-btn", "click", move |_| {
            let view = view.clone();
            view.base.clone().spawn(async move { view.send().await.map(|_| ()) });
        });
        // Enter sends, Shift+Enter inserts a newline
        let view = self.clone();
        root.add_event_listener("#message-input", "keydown", move |event| {
            let enter = event.detail.get("key").and_then(|k| k.as_str()) == Some("Enter");
            let shift = event
                .detail
                .get("shiftKey")
                .and_then(|s| s.as_bool())
                .unwrap_or(false);
            if enter && !shift {
                let view = view.clone();
                view.base.clone().spawn(async move { view.send().await.map(|_| ()) });
            }
        });
    }

    /// Show the messages of `session_id`
    pub async fn open_session(&self, session_id: &str) -> Result<(), ViewError> {
        let api = self.base.api();
        let sessions = self
            .base
            .attempt(chat::sessions(api, None, 0, SESSION_PAGE))
            .await?;
        let Some(session) = sessions.into_iter().find(|s| s.cht_id == session_id) else {
            return Err(self
                .base
                .fail(ViewError::Validation(format!("unknown chat session {}", session_id))));
        };
        let agent_name = match resource::fetch::<Agent>(api, &session.cht_agt_id).await {
            Ok(agent) => agent.agt_name,
            Err(e) if e.is_not_found() => session.cht_agt_id.clone(),
            Err(e) => return Err(self.base.fail(e)),
        };
        tracing::debug!(session = %session.cht_id, agent = %agent_name, "Opening chat session");
        {
            let mut state = self.state();
            state.session = Some(session);
            state.agent_name = agent_name;
            state.messages.clear();
        }
        self.reload().await
    }

    pub fn close_session(&self) -> Result<(), ViewError> {
        {
            let mut state = self.state();
            state.session = None;
            state.messages.clear();
        }
        self.render()
    }

    /// Reload the messages of the open session
    pub async fn reload(&self) -> Result<(), ViewError> {
        let Some(session_id) = self.state().session.as_ref().map(|s| s.cht_id.clone()) else {
            return self.render();
        };
        let messages = self
            .base
            .attempt(chat::messages(self.base.api(), &session_id))
            .await?;
        self.state().messages = messages;
        self.render()
    }

    fn render(&self) -> Result<(), ViewError> {
        let root = self.base.root()?;
        let state = self.state();
        let (title, nodes): (&str, Vec<Node>) = match &state.session {
            None => (
                "Chat",
                vec![Element::new("p")
                    .with_attr("class", "empty")
                    .with_text("Select a chat session")
                    .into()],
            ),
            Some(session) if state.messages.is_empty() => (
                session.cht_name.as_str(),
                vec![Element::new("p")
                    .with_attr("class", "empty")
                    .with_text("No messages yet")
                    .into()],
            ),
            Some(session) => (
                session.cht_name.as_str(),
                state.messages.iter().map(message_node).collect(),
            ),
        };
        root.set_text("#chat-title", title);
        if !root.replace_children("#message-list", nodes) {
            return Err(self.base.fail(ViewError::MissingElement("#message-list".to_string())));
        }
        Ok(())
    }

    /// Post the composer text as a USER message
    pub async fn send(&self) -> Result<ChatMessage, ViewError> {
        let root = self.base.root()?;
        let open = {
            let state = self.state();
            state
                .session
                .as_ref()
                .map(|session| (session.cht_id.clone(), state.agent_name.clone()))
        };
        let Some((session_id, agent_name)) = open else {
            return Err(self
                .base
                .fail(ViewError::Validation("open a chat session first".to_string())));
        };
        let text = required(&root, "#message-input", "Message").map_err(|e| self.base.fail(e))?;

        let message = self
            .base
            .attempt(chat::post_message(self.base.api(), &session_id, &agent_name, Role::User, &text))
            .await?;
        tracing::debug!(session = %session_id, message = %message.msg_id, "Message sent");
        set_input_value(&root, "#message-input", "");
        self.reload().await?;
        Ok(message)
    }
}

impl View for ChatCanvas {
    fn id(&self) -> ViewId {
        ViewId::ChatCanvas
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
            self.reload().await?;
            Ok(root)
        }
        .boxed()
    }
}
