//! Shared fixture for view tests: fake REST service, in-memory component
//! assets and a recording reporter

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::api::fake::FakeBackend;
use crate::dom::RenderRoot;
use crate::lifecycle::{ComponentLoader, InitOptions};
use crate::registry::AppContext;
use crate::report::RecordingReporter;
use crate::resource::{MemoryFetcher, ResourcePaths};

macro_rules! asset {
    ($tag:literal) => {
        (
            $tag,
            include_str!(concat!("../../components/", $tag, "/", $tag, ".html")),
            include_str!(concat!("../../components/", $tag, "/", $tag, ".css")),
        )
    };
}

const ASSETS: [(&str, &str, &str); 6] = [
    asset!("viki-llm-canvas"),
    asset!("viki-tools-canvas"),
    asset!("viki-rag-canvas"),
    asset!("viki-agents-canvas"),
    asset!("viki-chat-canvas"),
    asset!("viki-left-nav"),
];

pub(crate) struct Harness {
    pub(crate) backend: FakeBackend,
    pub(crate) fetcher: MemoryFetcher,
    pub(crate) reporter: RecordingReporter,
    pub(crate) ctx: AppContext,
}

impl Harness {
    pub(crate) async fn new() -> Self {
        let backend = FakeBackend::spawn().await;
        let fetcher = MemoryFetcher::new();
        let paths = ResourcePaths::default();
        for (tag, html, css) in ASSETS {
            fetcher
                .insert(format!("components/{tag}/{tag}.html"), html)
                .insert(format!("components/{tag}/{tag}.css"), css);
        }
        let reporter = RecordingReporter::new();
        let loader = ComponentLoader::new(Arc::new(fetcher.clone()), paths, Arc::new(reporter.clone()));
        let ctx = AppContext::new(loader, backend.client(), InitOptions::default());
        Self {
            backend,
            fetcher,
            reporter,
            ctx,
        }
    }

    pub(crate) fn seed_llm(&self, id: &str, provider: &str, model: &str) {
        self.backend.seed(
            "llm",
            json!({
                "llc_id": id,
                "llc_provider_type_cd": provider,
                "llc_model_cd": model,
                "llc_endpoint_url": null,
                "llc_api_key": "secret-key",
            }),
        );
    }

    pub(crate) fn seed_providers(&self) {
        self.backend.seed_lookup("PROVIDER_TYPE", "OLLAMA", Some("Ollama"), Some(1));
        self.backend.seed_lookup("PROVIDER_TYPE", "OPENAI", Some("OpenAI"), Some(2));
    }

    pub(crate) fn seed_tool(&self, id: &str, name: &str) {
        self.backend.seed(
            "tools",
            json!({ "tol_id": id, "tol_name": name, "tol_mcp_command": format!("run-{}", id) }),
        );
    }

    pub(crate) fn seed_kb(&self, id: &str, name: &str) {
        self.backend
            .seed("knowledge-bases", json!({ "knb_id": id, "knb_name": name }));
    }

    pub(crate) fn seed_agent(&self, id: &str, name: &str, llm: &str) {
        self.backend.seed(
            "agents",
            json!({ "agt_id": id, "agt_name": name, "agt_llc_id": llm }),
        );
    }

    pub(crate) fn seed_session(&self, id: &str, name: &str, agent: &str) {
        self.backend.seed(
            "sessions",
            json!({ "cht_id": id, "cht_name": name, "cht_agt_id": agent }),
        );
    }

    pub(crate) fn seed_message(&self, id: &str, session: &str, role: &str, content: Value) {
        self.backend.seed(
            "messages",
            json!({
                "msg_id": id,
                "msg_cht_id": session,
                "msg_agent_name": "helper",
                "msg_role": role,
                "msg_content": content,
            }),
        );
    }
}

/// `data-id` of every row under `list`
pub(crate) fn row_ids(root: &RenderRoot, list: &str) -> Vec<String> {
    root.query_selector_all(&format!("{} li.item", list))
        .iter()
        .filter_map(|row| row.attr("data-id").map(str::to_string))
        .collect()
}

/// Poll `check` until it holds, for actions started from event handlers
pub(crate) async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
