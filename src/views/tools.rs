//! `viki-tools-canvas`: MCP tools and their environment variables

use futures::future::{BoxFuture, FutureExt};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::tools::{self, NewTool, Tool, ToolEnvVar, ToolUpdate};
use crate::api::{resource, RequestOptions};
use crate::dom::{Element, Node, RenderRoot};
use crate::lifecycle::ComponentInstance;
use crate::registry::AppContext;

use super::form::{fill, optional, required};
use super::{empty_item, event_row_id, list_item, View, ViewBase, ViewError, ViewId};

#[derive(Default)]
struct State {
    tools: Vec<Tool>,
    selected: Option<String>,
    env: Vec<ToolEnvVar>,
}

#[derive(Clone)]
pub struct ToolsCanvas {
    base: ViewBase,
    state: Arc<Mutex<State>>,
}

impl ToolsCanvas {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            base: ViewBase::new(ViewId::ToolsCanvas, ctx),
            state: Arc::default(),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn tools(&self) -> Vec<Tool> {
        self.state().tools.clone()
    }

    pub fn selected(&self) -> Option<String> {
        self.state().selected.clone()
    }

    pub fn env_vars(&self) -> Vec<ToolEnvVar> {
        self.state().env.clone()
    }

    fn wire(&self, root: &RenderRoot) {
        let view = self.clone();
        root.add_event_listener("#tool-list", "click", move |event| {
            if let Some(id) = event_row_id(event) {
                let view = view.clone();
                view.base.clone().spawn(async move { view.select(&id).await });
            }
        });
        let view = self.clone();
        root.add_event_listener("#env-list button", "click", move |event| {
            if let Some(key) = event_row_id(event) {
                let view = view.clone();
                view.base.clone().spawn(async move { view.remove_env_var(&key).await });
            }
        });
        let view = self.clone();
        root.add_event_listener("#env-add-btn", "click", move |_| {
            let view = view.clone();
            view.base.clone().spawn(async move { view.put_env_var().await });
        });
        let view = self.clone();
        root.add_event_listener("#new-btn", "click", move |_| {
            let _ = view.clear();
        });
        let view = self.clone();
        root.add_event_listener("#save-btn", "click", move |_| {
            let view = view.clone();
            view.base.clone().spawn(async move { view.save().await.map(|_| ()) });
        });
        let view = self.clone();
        root.add_event_listener("#delete-btn", "click", move |_| {
            let view = view.clone();
            view.base.clone().spawn(async move { view.delete().await });
        });
    }

    pub async fn refresh(&self) -> Result<(), ViewError> {
        let tools: Vec<Tool> = self
            .base
            .attempt(resource::list(self.base.api(), RequestOptions::new()))
            .await?;
        {
            let mut state = self.state();
            let stale = state
                .selected
                .as_ref()
                .is_some_and(|id| !tools.iter().any(|t| &t.tol_id == id));
            if stale {
                state.selected = None;
                state.env.clear();
            }
            state.tools = tools;
        }
        self.render()
    }

    fn render(&self) -> Result<(), ViewError> {
        let root = self.base.root()?;
        let state = self.state();

        let rows: Vec<Node> = if state.tools.is_empty() {
            vec![empty_item("No tools yet").into()]
        } else {
            state
                .tools
                .iter()
                .map(|t| {
                    let selected = state.selected.as_deref() == Some(t.tol_id.as_str());
                    list_item(&t.tol_id, &t.tol_name, t.tol_description.as_deref(), selected).into()
                })
                .collect()
        };
        if !root.replace_children("#tool-list", rows) {
            return Err(self.base.fail(ViewError::MissingElement("#tool-list".to_string())));
        }

        let env_rows: Vec<Node> = state
            .env
            .iter()
            .map(|var| {
                Element::new("li")
                    .with_attr("class", "env-var")
                    .with_attr("data-id", var.tev_key.as_str())
                    .with_child(Element::new("span").with_attr("class", "key").with_text(var.tev_key.as_str()))
                    .with_child(
                        Element::new("span")
                            .with_attr("class", "value")
                            .with_text(var.tev_value.as_deref().unwrap_or_default()),
                    )
                    .with_child(
                        Element::new("button")
                            .with_attr("type", "button")
                            .with_attr("class", "env-remove")
                            .with_attr("data-id", var.tev_key.as_str())
                            .with_text("Remove"),
                    )
                    .into()
            })
            .collect();
        root.replace_children("#env-list", env_rows);
        Ok(())
    }

    /// Load a tool into the form together with its environment variables
    pub async fn select(&self, id: &str) -> Result<(), ViewError> {
        let root = self.base.root()?;
        let Some(tool) = self.state().tools.iter().find(|t| t.tol_id == id).cloned() else {
            return Err(self.base.fail(ViewError::Validation(format!("unknown tool {}", id))));
        };
        let env = self.base.attempt(tools::env_vars(self.base.api(), id)).await?;
        {
            let mut state = self.state();
            state.selected = Some(id.to_string());
            state.env = env;
        }
        self.render()?;
        fill(
            &root,
            &[
                ("#tol_id", Some(tool.tol_id.as_str())),
                ("#tol_name", Some(tool.tol_name.as_str())),
                ("#tol_description", tool.tol_description.as_deref()),
                ("#tol_mcp_command", Some(tool.tol_mcp_command.as_str())),
                ("#tev_key", None),
                ("#tev_value", None),
            ],
        );
        root.set_attribute("#tol_id", "readonly", "");
        Ok(())
    }

    pub fn clear(&self) -> Result<(), ViewError> {
        let root = self.base.root()?;
        {
            let mut state = self.state();
            state.selected = None;
            state.env.clear();
        }
        self.render()?;
        fill(
            &root,
            &[
                ("#tol_id", None),
                ("#tol_name", None),
                ("#tol_description", None),
                ("#tol_mcp_command", None),
                ("#tev_key", None),
                ("#tev_value", None),
            ],
        );
        root.with_element_mut("#tol_id", |e| e.remove_attr("readonly"));
        Ok(())
    }

    pub async fn save(&self) -> Result<Tool, ViewError> {
        let root = self.base.root()?;
        let form = (|| -> Result<NewTool, ViewError> {
            Ok(NewTool {
                tol_id: required(&root, "#tol_id", "ID")?,
                tol_name: required(&root, "#tol_name", "Name")?,
                tol_description: optional(&root, "#tol_description"),
                tol_mcp_command: required(&root, "#tol_mcp_command", "MCP command")?,
            })
        })()
        .map_err(|e| self.base.fail(e))?;

        let api = self.base.api();
        let saved: Tool = match self.selected() {
            Some(id) => {
                let update = ToolUpdate::from(form);
                self.base.attempt(resource::update(api, &id, &update)).await?
            }
            None => self.base.attempt(resource::create(api, &form)).await?,
        };
        tracing::info!(tool = %saved.tol_id, "Tool saved");

        self.refresh().await?;
        self.select(&saved.tol_id).await?;
        self.base.notify("Saved");
        Ok(saved)
    }

    pub async fn delete(&self) -> Result<(), ViewError> {
        let Some(id) = self.selected() else {
            return Err(self.base.fail(ViewError::Validation("select a tool first".to_string())));
        };
        self.base
            .attempt(resource::remove::<Tool>(self.base.api(), &id))
            .await?;
        tracing::info!(tool = %id, "Tool deleted");
        self.clear()?;
        self.refresh().await?;
        self.base.notify("Deleted");
        Ok(())
    }

    /// Add the variable from `#tev_key`/`#tev_value`, or update it when the
    /// key already exists on the selected tool
    pub async fn put_env_var(&self) -> Result<(), ViewError> {
        let root = self.base.root()?;
        let Some(tool_id) = self.selected() else {
            return Err(self.base.fail(ViewError::Validation("save the tool first".to_string())));
        };
        let key = required(&root, "#tev_key", "Key").map_err(|e| self.base.fail(e))?;
        let value = optional(&root, "#tev_value");

        let exists = self.state().env.iter().any(|v| v.tev_key == key);
        let api = self.base.api();
        if exists {
            self.base
                .attempt(tools::update_env_var(api, &tool_id, &key, value.as_deref()))
                .await?;
        } else {
            self.base
                .attempt(tools::add_env_var(api, &tool_id, &key, value.as_deref()))
                .await?;
        }
        tracing::debug!(tool = %tool_id, key = %key, "Environment variable stored");
        fill(&root, &[("#tev_key", None), ("#tev_value", None)]);
        self.reload_env(&tool_id).await
    }

    pub async fn remove_env_var(&self, key: &str) -> Result<(), ViewError> {
        let Some(tool_id) = self.selected() else {
            return Err(self.base.fail(ViewError::Validation("select a tool first".to_string())));
        };
        self.base
            .attempt(tools::remove_env_var(self.base.api(), &tool_id, key))
            .await?;
        self.reload_env(&tool_id).await
    }

    async fn reload_env(&self, tool_id: &str) -> Result<(), ViewError> {
        let env = self.base.attempt(tools::env_vars(self.base.api(), tool_id)).await?;
        self.state().env = env;
        self.render()
    }
}

impl View for ToolsCanvas {
    fn id(&self) -> ViewId {
        ViewId::ToolsCanvas
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
