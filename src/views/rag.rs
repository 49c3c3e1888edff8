//! `viki-rag-canvas`: knowledge bases and their documents

use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::files::{self, StoredFile};
use crate::api::knowledge_base::{self, KnowledgeBase, KnowledgeBaseDocument, KnowledgeBaseUpdate, NewKnowledgeBase};
use crate::api::{resource, RequestOptions};
use crate::dom::{Element, Node, RenderRoot};
use crate::lifecycle::ComponentInstance;
use crate::registry::AppContext;

use super::form::{fill, optional, required};
use super::{empty_item, event_row_id, list_item, View, ViewBase, ViewError, ViewId};

#[derive(Default)]
struct State {
    bases: Vec<KnowledgeBase>,
    selected: Option<String>,
    documents: Vec<KnowledgeBaseDocument>,
    /// File id → name, for files uploaded through this view
    file_names: HashMap<String, String>,
}

#[derive(Clone)]
pub struct RagCanvas {
    base: ViewBase,
    state: Arc<Mutex<State>>,
}

impl RagCanvas {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            base: ViewBase::new(ViewId::RagCanvas, ctx),
            state: Arc::default(),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn knowledge_bases(&self) -> Vec<KnowledgeBase> {
        self.state().bases.clone()
    }

    pub fn selected(&self) -> Option<String> {
        self.state().selected.clone()
    }

    pub fn documents(&self) -> Vec<KnowledgeBaseDocument> {
        self.state().documents.clone()
    }

    fn wire(&self, root: &RenderRoot) {
        let view = self.clone();
        root.add_event_listener("#kb-list", "click", move |event| {
            if let Some(id) = event_row_id(event) {
                let view = view.clone();
                view.base.clone().spawn(async move { view.select(&id).await });
            }
        });
        let view = self.clone();
        root.add_event_listener("#document-list button", "click", move |event| {
            if let Some(file_id) = event_row_id(event) {
                let view = view.clone();
                view.base.clone().spawn(async move { view.remove_document(&file_id).await });
            }
        });
        // The host passes the picked file as `{ "name": .., "content": .. }`
        let view = self.clone();
        root.add_event_listener("#upload-btn", "click", move |event| {
            let name = event.detail.get("name").and_then(|v| v.as_str()).map(str::to_string);
            let content = event
                .detail
                .get("content")
                .and_then(|v| v.as_str())
                .map(|s| s.as_bytes().to_vec())
                .unwrap_or_default();
            let view = view.clone();
            view.base.clone().spawn(async move {
                match name {
                    Some(name) => view.upload(&name, content).await.map(|_| ()),
                    None => Err(view.base.fail(ViewError::Validation("choose a file to upload".to_string()))),
                }
            });
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
        let bases: Vec<KnowledgeBase> = self
            .base
            .attempt(resource::list(self.base.api(), RequestOptions::new()))
            .await?;
        {
            let mut state = self.state();
            let stale = state
                .selected
                .as_ref()
                .is_some_and(|id| !bases.iter().any(|kb| &kb.knb_id == id));
            if stale {
                state.selected = None;
                state.documents.clear();
            }
            state.bases = bases;
        }
        self.render()
    }

    fn render(&self) -> Result<(), ViewError> {
        let root = self.base.root()?;
        let state = self.state();

        let rows: Vec<Node> = if state.bases.is_empty() {
            vec![empty_item("No knowledge bases yet").into()]
        } else {
            state
                .bases
                .iter()
                .map(|kb| {
                    let selected = state.selected.as_deref() == Some(kb.knb_id.as_str());
                    list_item(&kb.knb_id, &kb.knb_name, kb.knb_description.as_deref(), selected).into()
                })
                .collect()
        };
        if !root.replace_children("#kb-list", rows) {
            return Err(self.base.fail(ViewError::MissingElement("#kb-list".to_string())));
        }

        let documents: Vec<Node> = state
            .documents
            .iter()
            .map(|doc| {
                let name = state
                    .file_names
                    .get(&doc.kbd_fls_id)
                    .map(String::as_str)
                    .unwrap_or(doc.kbd_fls_id.as_str());
                Element::new("li")
                    .with_attr("class", "document")
                    .with_attr("data-id", doc.kbd_fls_id.as_str())
                    .with_child(Element::new("span").with_attr("class", "name").with_text(name))
                    .with_child(
                        Element::new("button")
                            .with_attr("type", "button")
                            .with_attr("class", "document-remove")
                            .with_attr("data-id", doc.kbd_fls_id.as_str())
                            .with_text("Remove"),
                    )
                    .into()
            })
            .collect();
        root.replace_children("#document-list", documents);
        Ok(())
    }

    pub async fn select(&self, id: &str) -> Result<(), ViewError> {
        let root = self.base.root()?;
        let Some(kb) = self.state().bases.iter().find(|kb| kb.knb_id == id).cloned() else {
            return Err(self.base.fail(ViewError::Validation(format!("unknown knowledge base {}", id))));
        };
        let documents = self
            .base
            .attempt(knowledge_base::documents(self.base.api(), id))
            .await?;
        {
            let mut state = self.state();
            state.selected = Some(id.to_string());
            state.documents = documents;
        }
        self.render()?;
        fill(
            &root,
            &[
                ("#knb_id", Some(kb.knb_id.as_str())),
                ("#knb_name", Some(kb.knb_name.as_str())),
                ("#knb_description", kb.knb_description.as_deref()),
            ],
        );
        root.set_attribute("#knb_id", "readonly", "");
        Ok(())
    }

    pub fn clear(&self) -> Result<(), ViewError> {
        let root = self.base.root()?;
        {
            let mut state = self.state();
            state.selected = None;
            state.documents.clear();
        }
        self.render()?;
        fill(&root, &[("#knb_id", None), ("#knb_name", None), ("#knb_description", None)]);
        root.with_element_mut("#knb_id", |e| e.remove_attr("readonly"));
        Ok(())
    }

    pub async fn save(&self) -> Result<KnowledgeBase, ViewError> {
        let root = self.base.root()?;
        let form = (|| -> Result<NewKnowledgeBase, ViewError> {
            Ok(NewKnowledgeBase {
                knb_id: required(&root, "#knb_id", "ID")?,
                knb_name: required(&root, "#knb_name", "Name")?,
                knb_description: optional(&root, "#knb_description"),
            })
        })()
        .map_err(|e| self.base.fail(e))?;

        let api = self.base.api();
        let saved: KnowledgeBase = match self.selected() {
            Some(id) => {
                let update = KnowledgeBaseUpdate::from(form);
                self.base.attempt(resource::update(api, &id, &update)).await?
            }
            None => self.base.attempt(resource::create(api, &form)).await?,
        };
        tracing::info!(knowledge_base = %saved.knb_id, "Knowledge base saved");

        self.refresh().await?;
        self.select(&saved.knb_id).await?;
        self.base.notify("Saved");
        Ok(saved)
    }

    pub async fn delete(&self) -> Result<(), ViewError> {
        let Some(id) = self.selected() else {
            return Err(self
                .base
                .fail(ViewError::Validation("select a knowledge base first".to_string())));
        };
        self.base
            .attempt(resource::remove::<KnowledgeBase>(self.base.api(), &id))
            .await?;
        tracing::info!(knowledge_base = %id, "Knowledge base deleted");
        self.clear()?;
        self.refresh().await?;
        self.base.notify("Deleted");
        Ok(())
    }

    /// Store a file and attach it to the selected knowledge base
    pub async fn upload(&self, file_name: &str, content: Vec<u8>) -> Result<StoredFile, ViewError> {
        let Some(kb_id) = self.selected() else {
            return Err(self
                .base
                .fail(ViewError::Validation("save the knowledge base first".to_string())));
        };
        let api = self.base.api();
        let stored = self
            .base
            .attempt(files::upload(api, file_name, content, files::SOURCE_KNOWLEDGE_BASE, &kb_id))
            .await?;
        self.base
            .attempt(knowledge_base::add_document(api, &kb_id, &stored.fls_id))
            .await?;
        tracing::info!(knowledge_base = %kb_id, file = %stored.fls_id, "Document uploaded");

        self.state()
            .file_names
            .insert(stored.fls_id.clone(), stored.fls_file_name.clone());
        self.reload_documents(&kb_id).await?;
        self.base.notify(&format!("Uploaded {}", stored.fls_file_name));
        Ok(stored)
    }

    pub async fn remove_document(&self, file_id: &str) -> Result<(), ViewError> {
        let Some(kb_id) = self.selected() else {
            return Err(self
                .base
                .fail(ViewError::Validation("select a knowledge base first".to_string())));
        };
        self.base
            .attempt(knowledge_base::remove_document(self.base.api(), &kb_id, file_id))
            .await?;
        self.reload_documents(&kb_id).await
    }

    async fn reload_documents(&self, kb_id: &str) -> Result<(), ViewError> {
        let documents = self
            .base
            .attempt(knowledge_base::documents(self.base.api(), kb_id))
            .await?;
        self.state().documents = documents;
        self.render()
    }
}

impl View for RagCanvas {
    fn id(&self) -> ViewId {
        ViewId::RagCanvas
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
    use crate::views::form::{input_value, set_input_value};
    use crate::views::testing::{eventually, row_ids, Harness};
    use serde_json::json;

    #[tokio::test]
    async fn test_mount_and_select_lists_documents() {
        let h = Harness::new().await;
        h.seed_kb("docs", "Docs");
        h.seed_kb("faq", "FAQ");
        h.backend
            .seed("documents", json!({ "kbd_knb_id": "docs", "kbd_fls_id": "file-9" }));
        let view = RagCanvas::new(&h.ctx);
        let root = view.mount().await.unwrap();
        assert_eq!(row_ids(&root, "#kb-list"), vec!["docs", "faq"]);

        view.select("docs").await.unwrap();
        assert_eq!(input_value(&root, "#knb_name").as_deref(), Some("Docs"));
        let docs = root.query_selector_all("#document-list li.document");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].attr("data-id"), Some("file-9"));

        view.select("faq").await.unwrap();
        assert!(root.query_selector_all("#document-list li").is_empty());
    }

    #[tokio::test]
    async fn test_upload_attaches_document() {
        let h = Harness::new().await;
        h.seed_kb("docs", "Docs");
        let view = RagCanvas::new(&h.ctx);
        let root = view.mount().await.unwrap();
        view.select("docs").await.unwrap();

        let stored = view.upload("notes.md", b"# Notes".to_vec()).await.unwrap();
        assert_eq!(stored.fls_file_name, "notes.md");
        assert_eq!(stored.fls_source_type_cd, files::SOURCE_KNOWLEDGE_BASE);
        assert_eq!(stored.fls_source_id, "docs");
        assert_eq!(view.documents().len(), 1);
        assert_eq!(view.documents()[0].kbd_fls_id, stored.fls_id);

        let row = root.query_selector("#document-list li.document .name").unwrap();
        assert_eq!(row.text_content(), "notes.md");
        assert_eq!(
            root.query_selector("#status").unwrap().text_content(),
            "Uploaded notes.md"
        );
    }

    #[tokio::test]
    async fn test_upload_button_uses_event_payload() {
        let h = Harness::new().await;
        h.seed_kb("docs", "Docs");
        let view = RagCanvas::new(&h.ctx);
        let root = view.mount().await.unwrap();
        view.select("docs").await.unwrap();

        root.dispatch("#upload-btn", "click", json!({ "name": "a.txt", "content": "alpha" }));
        assert!(eventually(|| view.documents().len() == 1).await);
        assert_eq!(h.backend.table("files")[0]["fls_file_name"], "a.txt");

        let file_id = view.documents()[0].kbd_fls_id.clone();
        root.dispatch(
            &format!(r#"#document-list button[data-id="{}"]"#, file_id),
            "click",
            json!({}),
        );
        assert!(eventually(|| view.documents().is_empty()).await);
    }

    #[tokio::test]
    async fn test_upload_requires_selection() {
        let h = Harness::new().await;
        let view = RagCanvas::new(&h.ctx);
        view.mount().await.unwrap();
        let err = view.upload("a.txt", Vec::new()).await.unwrap_err();
        assert!(matches!(err, ViewError::Validation(_)));
        assert!(h.backend.table("files").is_empty());
        assert!(h.reporter.is_empty());
    }

    #[tokio::test]
    async fn test_create_then_delete() {
        let h = Harness::new().await;
        let view = RagCanvas::new(&h.ctx);
        let root = view.mount().await.unwrap();

        set_input_value(&root, "#knb_id", "kb1");
        set_input_value(&root, "#knb_name", "Handbook");
        view.save().await.unwrap();
        assert_eq!(row_ids(&root, "#kb-list"), vec!["kb1"]);

        h.backend.fail("DELETE", "/knowledge-bases/kb1", 409);
        let err = view.delete().await.unwrap_err();
        assert_eq!(err.status(), Some(409));
        assert_eq!(h.reporter.reports()[0].kind, ErrorKind::Api);
        assert_eq!(view.selected().as_deref(), Some("kb1"));
    }
}
