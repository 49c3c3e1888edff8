//! `viki-llm-canvas`: LLM provider configurations

use futures::future::{BoxFuture, FutureExt};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::llm::{LlmConfig, LlmConfigUpdate, NewLlmConfig};
use crate::api::{lookups, resource, RequestOptions};
use crate::dom::{Node, RenderRoot};
use crate::lifecycle::ComponentInstance;
use crate::registry::AppContext;

use super::form::{fill, optional, required, set_input_value, set_options};
use super::{empty_item, event_row_id, list_item, View, ViewBase, ViewError, ViewId};

#[derive(Default)]
struct State {
    configs: Vec<LlmConfig>,
    providers: Vec<(String, String)>,
    selected: Option<String>,
}

/// List and edit LLM configurations
#[derive(Clone)]
pub struct LlmCanvas {
    base: ViewBase,
    state: Arc<Mutex<State>>,
}

impl LlmCanvas {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            base: ViewBase::new(ViewId::LlmCanvas, ctx),
            state: Arc::default(),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn configs(&self) -> Vec<LlmConfig> {
        self.state().configs.clone()
    }

    pub fn selected(&self) -> Option<String> {
        self.state().selected.clone()
    }

    fn wire(&self, root: &RenderRoot) {
        let view = self.clone();
        root.add_event_listener("#llm-list", "click", move |event| {
            if let Some(id) = event_row_id(event) {
                let _ = view.select(&id);
            }
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

    /// Reload providers and configurations from the API
    pub async fn refresh(&self) -> Result<(), ViewError> {
        let api = self.base.api();
        let providers = self.base.attempt(lookups::details(api, lookups::PROVIDER_TYPE)).await?;
        let configs: Vec<LlmConfig> = self
            .base
            .attempt(resource::list(api, RequestOptions::new()))
            .await?;
        {
            let mut state = self.state();
            state.providers = providers
                .iter()
                .map(|d| (d.lkd_code.clone(), d.label().to_string()))
                .collect();
            let stale = state
                .selected
                .as_ref()
                .is_some_and(|id| !configs.iter().any(|c| &c.llc_id == id));
            if stale {
                state.selected = None;
            }
            state.configs = configs;
        }
        self.render()
    }

    fn render(&self) -> Result<(), ViewError> {
        let root = self.base.root()?;
        let state = self.state();
        let rows: Vec<Node> = if state.configs.is_empty() {
            vec![empty_item("No LLM configurations yet").into()]
        } else {
            state
                .configs
                .iter()
                .map(|c| {
                    let selected = state.selected.as_deref() == Some(c.llc_id.as_str());
                    let detail = format!("{} · {}", c.llc_provider_type_cd, c.llc_model_cd);
                    list_item(&c.llc_id, &c.llc_id, Some(detail.as_str()), selected).into()
                })
                .collect()
        };
        if !root.replace_children("#llm-list", rows) {
            return Err(self.base.fail(ViewError::MissingElement("#llm-list".to_string())));
        }

        let current = state
            .selected
            .as_ref()
            .and_then(|id| state.configs.iter().find(|c| &c.llc_id == id))
            .map(|c| c.llc_provider_type_cd.clone());
        set_options(&root, "#llc_provider_type_cd", &state.providers, current.as_deref());
        Ok(())
    }

    /// Load a configuration into the form
    pub fn select(&self, id: &str) -> Result<(), ViewError> {
        let root = self.base.root()?;
        let config = {
            let mut state = self.state();
            let Some(config) = state.configs.iter().find(|c| c.llc_id == id).cloned() else {
                drop(state);
                return Err(self.base.fail(ViewError::Validation(format!("unknown LLM configuration {}", id))));
            };
            state.selected = Some(id.to_string());
            config
        };
        self.render()?;
        fill(
            &root,
            &[
                ("#llc_id", Some(config.llc_id.as_str())),
                ("#llc_model_cd", Some(config.llc_model_cd.as_str())),
                ("#llc_endpoint_url", config.llc_endpoint_url.as_deref()),
                // Stored keys are never echoed back
                ("#llc_api_key", None),
            ],
        );
        set_input_value(&root, "#llc_provider_type_cd", &config.llc_provider_type_cd);
        root.set_attribute("#llc_id", "readonly", "");
        Ok(())
    }

    /// Reset the form for a new configuration
    pub fn clear(&self) -> Result<(), ViewError> {
        let root = self.base.root()?;
        self.state().selected = None;
        self.render()?;
        fill(
            &root,
            &[
                ("#llc_id", None),
                ("#llc_model_cd", None),
                ("#llc_endpoint_url", None),
                ("#llc_api_key", None),
            ],
        );
        root.with_element_mut("#llc_id", |e| e.remove_attr("readonly"));
        Ok(())
    }

    /// Create or update from the form, depending on whether a row is selected
    pub async fn save(&self) -> Result<LlmConfig, ViewError> {
        let root = self.base.root()?;
        let form = (|| -> Result<NewLlmConfig, ViewError> {
            Ok(NewLlmConfig {
                llc_id: required(&root, "#llc_id", "ID")?,
                llc_provider_type_cd: required(&root, "#llc_provider_type_cd", "Provider")?,
                llc_model_cd: required(&root, "#llc_model_cd", "Model")?,
                llc_endpoint_url: optional(&root, "#llc_endpoint_url"),
                llc_api_key: optional(&root, "#llc_api_key"),
                llc_fls_id: None,
            })
        })()
        .map_err(|e| self.base.fail(e))?;

        let api = self.base.api();
        let existing = self.selected();
        let saved: LlmConfig = match existing {
            Some(id) => {
                let update = LlmConfigUpdate::from(form);
                self.base.attempt(resource::update(api, &id, &update)).await?
            }
            None => self.base.attempt(resource::create(api, &form)).await?,
        };
        tracing::info!(llm = %saved.llc_id, "LLM configuration saved");

        self.state().selected = Some(saved.llc_id.clone());
        self.refresh().await?;
        self.select(&saved.llc_id)?;
        self.base.notify("Saved");
        Ok(saved)
    }

    /// Delete the selected configuration
    pub async fn delete(&self) -> Result<(), ViewError> {
        let Some(id) = self.selected() else {
            return Err(self.base.fail(ViewError::Validation("select a configuration first".to_string())));
        };
        self.base
            .attempt(resource::remove::<LlmConfig>(self.base.api(), &id))
            .await?;
        tracing::info!(llm = %id, "LLM configuration deleted");
        self.clear()?;
        self.refresh().await?;
        self.base.notify("Deleted");
        Ok(())
    }
}

impl View for LlmCanvas {
    fn id(&self) -> ViewId {
        ViewId::LlmCanvas
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ErrorKind;
    use crate::views::form::input_value;
    use crate::views::testing::{eventually, row_ids, Harness};
    use serde_json::json;

    #[tokio::test]
    async fn test_mount_lists_configs_and_providers() {
        let h = Harness::new().await;
        h.seed_providers();
        h.seed_llm("gpt", "OPENAI", "gpt-4o");
        h.seed_llm("local", "OLLAMA", "llama3");

        let view = LlmCanvas::new(&h.ctx);
        let root = view.mount().await.unwrap();

        assert_eq!(row_ids(&root, "#llm-list"), vec!["gpt", "local"]);
        assert!(root.inner_html().contains("OPENAI · gpt-4o"));
        let options = root.query_selector_all("#llc_provider_type_cd option");
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].attr("value"), Some("OLLAMA"));
    }

    #[tokio::test]
    async fn test_select_fills_form_without_api_key() {
        let h = Harness::new().await;
        h.seed_providers();
        h.seed_llm("gpt", "OPENAI", "gpt-4o");
        let view = LlmCanvas::new(&h.ctx);
        let root = view.mount().await.unwrap();

        root.dispatch(r#"li[data-id="gpt"]"#, "click", json!({}));

        assert_eq!(view.selected().as_deref(), Some("gpt"));
        assert_eq!(input_value(&root, "#llc_id").as_deref(), Some("gpt"));
        assert_eq!(input_value(&root, "#llc_model_cd").as_deref(), Some("gpt-4o"));
        assert_eq!(input_value(&root, "#llc_provider_type_cd").as_deref(), Some("OPENAI"));
        assert_eq!(input_value(&root, "#llc_api_key").as_deref(), Some(""));
        assert!(!root.inner_html().contains("secret-key"));
        assert!(root.query_selector("li.selected").is_some());
    }

    #[tokio::test]
    async fn test_save_creates_then_updates() {
        let h = Harness::new().await;
        h.seed_providers();
        let view = LlmCanvas::new(&h.ctx);
        let root = view.mount().await.unwrap();

        set_input_value(&root, "#llc_id", "local");
        set_input_value(&root, "#llc_provider_type_cd", "OLLAMA");
        set_input_value(&root, "#llc_model_cd", "llama3");
        set_input_value(&root, "#llc_endpoint_url", "http://localhost:11434");
        let created = view.save().await.unwrap();
        assert_eq!(created.llc_endpoint_url.as_deref(), Some("http://localhost:11434"));
        assert_eq!(row_ids(&root, "#llm-list"), vec!["local"]);

        set_input_value(&root, "#llc_model_cd", "llama3.1");
        view.save().await.unwrap();
        let stored = h.backend.table("llm");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0]["llc_model_cd"], "llama3.1");
        assert!(h.backend.requests().contains(&"PUT /llm/local".to_string()));
        assert_eq!(root.query_selector("#status").unwrap().text_content(), "Saved");
    }

    #[tokio::test]
    async fn test_validation_shown_not_reported() {
        let h = Harness::new().await;
        let view = LlmCanvas::new(&h.ctx);
        let root = view.mount().await.unwrap();

        let err = view.save().await.unwrap_err();
        assert!(matches!(err, ViewError::Validation(_)));
        let status = root.query_selector("#status").unwrap();
        assert_eq!(status.text_content(), "ID is required");
        assert_eq!(status.attr("class"), Some("status error"));
        assert!(h.reporter.is_empty());
    }

    #[tokio::test]
    async fn test_api_failure_reported_with_status() {
        let h = Harness::new().await;
        h.seed_llm("gpt", "OPENAI", "gpt-4o");
        let view = LlmCanvas::new(&h.ctx);
        view.mount().await.unwrap();
        view.select("gpt").unwrap();

        h.backend.fail("DELETE", "/llm/gpt", 500);
        let err = view.delete().await.unwrap_err();
        assert_eq!(err.status(), Some(500));

        let reports = h.reporter.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].component, "viki-llm-canvas");
        assert_eq!(reports[0].kind, ErrorKind::Api);
        assert_eq!(reports[0].status, Some(500));
    }

    #[tokio::test]
    async fn test_delete_button_removes_selected() {
        let h = Harness::new().await;
        h.seed_llm("gpt", "OPENAI", "gpt-4o");
        let view = LlmCanvas::new(&h.ctx);
        let root = view.mount().await.unwrap();
        view.select("gpt").unwrap();

        root.dispatch("#delete-btn", "click", json!({}));

        assert!(eventually(|| h.backend.table("llm").is_empty()).await);
        assert!(eventually(|| row_ids(&root, "#llm-list").is_empty()).await);
    }

    #[tokio::test]
    async fn test_mount_twice_wires_once() {
        let h = Harness::new().await;
        h.seed_llm("gpt", "OPENAI", "gpt-4o");
        let view = LlmCanvas::new(&h.ctx);
        let first = view.mount().await.unwrap();
        let second = view.mount().await.unwrap();
        assert!(first.ptr_eq(&second));
        assert_eq!(first.dispatch("#new-btn", "click", json!({})), 1);
        assert_eq!(h.fetcher.request_count("components/viki-llm-canvas/viki-llm-canvas.html"), 1);
    }

    #[tokio::test]
    async fn test_missing_template_fails_mount() {
        let h = Harness::new().await;
        h.fetcher.fail(
            "components/viki-llm-canvas/viki-llm-canvas.html",
            crate::resource::FetchError::Status {
                path: "components/viki-llm-canvas/viki-llm-canvas.html".to_string(),
                status: 404,
            },
        );
        let view = LlmCanvas::new(&h.ctx);
        let err = view.mount().await.unwrap_err();
        assert!(matches!(err, ViewError::Lifecycle(_)));
        assert_eq!(h.reporter.len(), 1);
        assert_eq!(h.reporter.reports()[0].kind, ErrorKind::Lifecycle);
        assert_eq!(view.html(), "");
    }
}
