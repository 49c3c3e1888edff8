//! `viki-agents-canvas`: agents and their tool / knowledge-base links

use futures::future::{BoxFuture, FutureExt};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::agents::{self, Agent, AgentUpdate, NewAgent};
use crate::api::knowledge_base::KnowledgeBase;
use crate::api::llm::LlmConfig;
use crate::api::tools::Tool;
use crate::api::{resource, RequestOptions};
use crate::dom::{Element, Node, RenderRoot};
use crate::lifecycle::ComponentInstance;
use crate::registry::AppContext;

use super::form::{fill, optional, required, set_input_value, set_options};
use super::{empty_item, event_row_id, list_item, View, ViewBase, ViewError, ViewId};

const TOOL_ATTR: &str = "data-tool-id";
const KB_ATTR: &str = "data-kb-id";

#[derive(Default)]
struct State {
    agents: Vec<Agent>,
    llms: Vec<(String, String)>,
    tools: Vec<Tool>,
    bases: Vec<KnowledgeBase>,
    selected: Option<String>,
    linked_tools: BTreeSet<String>,
    linked_bases: BTreeSet<String>,
}

#[derive(Clone)]
pub struct AgentsCanvas {
    base: ViewBase,
    state: Arc<Mutex<State>>,
}

/// One checkbox row; `attr` carries the linked id
fn option_row(attr: &str, id: &str, label: &str, checked: bool) -> Node {
    let mut input = Element::new("input")
        .with_attr("type", "checkbox")
        .with_attr("value", id)
        .with_attr(attr, id);
    if checked {
        input.set_attr("checked", "");
    }
    Element::new("li")
        .with_child(Element::new("label").with_child(input).with_text(label))
        .into()
}

/// Ids of the checked boxes under `list`
fn checked_ids(root: &RenderRoot, list: &str, attr: &str) -> BTreeSet<String> {
    root.query_selector_all(&format!("{} input[{}][checked]", list, attr))
        .iter()
        .filter_map(|input| input.attr(attr).map(str::to_string))
        .collect()
}

impl AgentsCanvas {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            base: ViewBase::new(ViewId::AgentsCanvas, ctx),
            state: Arc::default(),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn agents(&self) -> Vec<Agent> {
        self.state().agents.clone()
    }

    pub fn selected(&self) -> Option<String> {
        self.state().selected.clone()
    }

    pub fn linked_tools(&self) -> Vec<String> {
        self.state().linked_tools.iter().cloned().collect()
    }

    pub fn linked_knowledge_bases(&self) -> Vec<String> {
        self.state().linked_bases.iter().cloned().collect()
    }

    fn wire(&self, root: &RenderRoot) {
        let view = self.clone();
        root.add_event_listener("#agent-list", "click", move |event| {
            if let Some(id) = event_row_id(event) {
                let view = view.clone();
                view.base.clone().spawn(async move { view.select(&id).await });
            }
        });
        // Clicking a checkbox toggles it
        for (list, attr) in [("#tool-options", TOOL_ATTR), ("#kb-options", KB_ATTR)] {
            let view = self.clone();
            root.add_event_listener(&format!("{} input", list), "click", move |event| {
                let (Some(id), Ok(root)) = (event.target.attr(attr), view.base.root()) else {
                    return;
                };
                let checked = event.target.attr("checked").is_some();
                // Ids are free-form, so match on the attribute rather than a selector
                root.for_each_mut(&format!("{} input", list), |input| {
                    if input.attr(attr) != Some(id) {
                        return;
                    }
                    if checked {
                        input.remove_attr("checked");
                    } else {
                        input.set_attr("checked", "");
                    }
                });
            });
        }
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

    /// Reload agents and everything an agent can reference
    pub async fn refresh(&self) -> Result<(), ViewError> {
        let api = self.base.api();
        let agents: Vec<Agent> = self.base.attempt(resource::list(api, RequestOptions::new())).await?;
        let llms: Vec<LlmConfig> = self.base.attempt(resource::list(api, RequestOptions::new())).await?;
        let tools: Vec<Tool> = self.base.attempt(resource::list(api, RequestOptions::new())).await?;
        let bases: Vec<KnowledgeBase> = self.base.attempt(resource::list(api, RequestOptions::new())).await?;
        {
            let mut state = self.state();
            let stale = state
                .selected
                .as_ref()
                .is_some_and(|id| !agents.iter().any(|a| &a.agt_id == id));
            if stale {
                state.selected = None;
                state.linked_tools.clear();
                state.linked_bases.clear();
            }
            state.agents = agents;
            state.llms = llms
                .into_iter()
                .map(|c| {
                    let label = format!("{} ({})", c.llc_id, c.llc_model_cd);
                    (c.llc_id, label)
                })
                .collect();
            state.tools = tools;
            state.bases = bases;
        }
        self.render()
    }

    fn render(&self) -> Result<(), ViewError> {
        let root = self.base.root()?;
        let state = self.state();

        let rows: Vec<Node> = if state.agents.is_empty() {
            vec![empty_item("No agents yet").into()]
        } else {
            state
                .agents
                .iter()
                .map(|a| {
                    let selected = state.selected.as_deref() == Some(a.agt_id.as_str());
                    list_item(&a.agt_id, &a.agt_name, Some(a.agt_llc_id.as_str()), selected).into()
                })
                .collect()
        };
        if !root.replace_children("#agent-list", rows) {
            return Err(self.base.fail(ViewError::MissingElement("#agent-list".to_string())));
        }

        let current_llm = state
            .selected
            .as_ref()
            .and_then(|id| state.agents.iter().find(|a| &a.agt_id == id))
            .map(|a| a.agt_llc_id.clone());
        set_options(&root, "#agt_llc_id", &state.llms, current_llm.as_deref());

        let tools: Vec<Node> = state
            .tools
            .iter()
            .map(|t| option_row(TOOL_ATTR, &t.tol_id, &t.tol_name, state.linked_tools.contains(&t.tol_id)))
            .collect();
        root.replace_children("#tool-options", tools);
        let bases: Vec<Node> = state
            .bases
            .iter()
            .map(|kb| option_row(KB_ATTR, &kb.knb_id, &kb.knb_name, state.linked_bases.contains(&kb.knb_id)))
            .collect();
        root.replace_children("#kb-options", bases);
        Ok(())
    }

    /// Load an agent and its current links into the form
    pub async fn select(&self, id: &str) -> Result<(), ViewError> {
        let root = self.base.root()?;
        let Some(agent) = self.state().agents.iter().find(|a| a.agt_id == id).cloned() else {
            return Err(self.base.fail(ViewError::Validation(format!("unknown agent {}", id))));
        };
        let api = self.base.api();
        let tools = self.base.attempt(agents::tools_of(api, id)).await?;
        let bases = self.base.attempt(agents::knowledge_bases_of(api, id)).await?;
        {
            let mut state = self.state();
            state.selected = Some(id.to_string());
            state.linked_tools = tools.into_iter().collect();
            state.linked_bases = bases.into_iter().collect();
        }
        self.render()?;
        fill(
            &root,
            &[
                ("#agt_id", Some(agent.agt_id.as_str())),
                ("#agt_name", Some(agent.agt_name.as_str())),
                ("#agt_description", agent.agt_description.as_deref()),
                ("#agt_system_prompt", agent.agt_system_prompt.as_deref()),
            ],
        );
        set_input_value(&root, "#agt_llc_id", &agent.agt_llc_id);
        root.set_attribute("#agt_id", "readonly", "");
        Ok(())
    }

    pub fn clear(&self) -> Result<(), ViewError> {
        let root = self.base.root()?;
        {
            let mut state = self.state();
            state.selected = None;
            state.linked_tools.clear();
            state.linked_bases.clear();
        }
        self.render()?;
        fill(
            &root,
            &[
                ("#agt_id", None),
                ("#agt_name", None),
                ("#agt_description", None),
                ("#agt_system_prompt", None),
            ],
        );
        root.with_element_mut("#agt_id", |e| e.remove_attr("readonly"));
        Ok(())
    }

    /// Save the agent, then bring its links in line with the checkboxes
    pub async fn save(&self) -> Result<Agent, ViewError> {
        let root = self.base.root()?;
        let form = (|| -> Result<NewAgent, ViewError> {
            Ok(NewAgent {
                agt_id: required(&root, "#agt_id", "ID")?,
                agt_name: required(&root, "#agt_name", "Name")?,
                agt_description: optional(&root, "#agt_description"),
                agt_llc_id: required(&root, "#agt_llc_id", "LLM")?,
                agt_system_prompt: optional(&root, "#agt_system_prompt"),
            })
        })()
        .map_err(|e| self.base.fail(e))?;
        let wanted_tools = checked_ids(&root, "#tool-options", TOOL_ATTR);
        let wanted_bases = checked_ids(&root, "#kb-options", KB_ATTR);

        let api = self.base.api();
        let saved: Agent = match self.selected() {
            Some(id) => {
                let update = AgentUpdate::from(form);
                self.base.attempt(resource::update(api, &id, &update)).await?
            }
            None => self.base.attempt(resource::create(api, &form)).await?,
        };
        let agent_id = saved.agt_id.as_str();

        let linked: BTreeSet<String> = self
            .base
            .attempt(agents::tools_of(api, agent_id))
            .await?
            .into_iter()
            .collect();
        for tool in wanted_tools.difference(&linked) {
            self.base.attempt(agents::link_tool(api, agent_id, tool)).await?;
        }
        for tool in linked.difference(&wanted_tools) {
            self.base.attempt(agents::unlink_tool(api, agent_id, tool)).await?;
        }

        let linked: BTreeSet<String> = self
            .base
            .attempt(agents::knowledge_bases_of(api, agent_id))
            .await?
            .into_iter()
            .collect();
        for kb in wanted_bases.difference(&linked) {
            self.base
                .attempt(agents::link_knowledge_base(api, agent_id, kb))
                .await?;
        }
        for kb in linked.difference(&wanted_bases) {
            self.base
                .attempt(agents::unlink_knowledge_base(api, agent_id, kb))
                .await?;
        }
        tracing::info!(
            agent = %agent_id,
            tools = wanted_tools.len(),
            knowledge_bases = wanted_bases.len(),
            "Agent saved"
        );

        self.refresh().await?;
        self.select(agent_id).await?;
        self.base.notify("Saved");
        Ok(saved)
    }

    pub async fn delete(&self) -> Result<(), ViewError> {
        let Some(id) = self.selected() else {
            return Err(self.base.fail(ViewError::Validation("select an agent first".to_string())));
        };
        self.base
            .attempt(resource::remove::<Agent>(self.base.api(), &id))
            .await?;
        tracing::info!(agent = %id, "Agent deleted");
        self.clear()?;
        self.refresh().await?;
        self.base.notify("Deleted");
        Ok(())
    }
}

impl View for AgentsCanvas {
    fn id(&self) -> ViewId {
        ViewId::AgentsCanvas
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
