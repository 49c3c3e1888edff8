//! In-process stand-in for the REST service, used by client and view tests

use axum::{
    body::Bytes,
    extract::{Multipart, Query, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use super::{ApiClient, ClientConfig};

/// Collections addressed as `/{name}/` and `/{name}/{key}`
const KEYED: &[(&str, &str)] = &[
    ("llm", "llc_id"),
    ("tools", "tol_id"),
    ("knowledge-bases", "knb_id"),
    ("agents", "agt_id"),
];

#[derive(Default)]
struct FakeState {
    tables: HashMap<String, Vec<Value>>,
    requests: Vec<String>,
    failures: HashMap<String, u16>,
    next_id: u64,
}

impl FakeState {
    fn table(&mut self, name: &str) -> &mut Vec<Value> {
        self.tables.entry(name.to_string()).or_default()
    }

    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

type Shared = Arc<Mutex<FakeState>>;

pub(crate) struct FakeBackend {
    state: Shared,
    base_url: String,
}

impl FakeBackend {
    pub(crate) async fn spawn() -> Self {
        let state: Shared = Arc::default();
        let router = Router::new()
            .route("/file-store/upload", post(upload))
            .fallback(dispatch)
            .with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Self {
            state,
            base_url: format!("http://{}", addr),
        }
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn client(&self) -> ApiClient {
        ApiClient::new(ClientConfig::new(self.base_url.clone())).unwrap()
    }

    /// Insert a raw record into a table
    pub(crate) fn seed(&self, table: &str, record: Value) {
        self.state.lock().unwrap().table(table).push(record);
    }

    pub(crate) fn seed_lookup(&self, kind: &str, code: &str, description: Option<&str>, sort: Option<i64>) {
        self.seed(
            "lookups",
            json!({
                "lkd_lkt_type": kind,
                "lkd_code": code,
                "lkd_description": description,
                "lkd_sort": sort,
            }),
        );
    }

    /// Answer `"{METHOD} {path}"` with `status` from now on
    pub(crate) fn fail(&self, method: &str, path: &str, status: u16) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(format!("{} {}", method, path), status);
    }

    pub(crate) fn table(&self, name: &str) -> Vec<Value> {
        self.state.lock().unwrap().table(name).clone()
    }

    /// `"{METHOD} {path}"` of every request served
    pub(crate) fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }
}

fn detail(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "detail": message.into() }))).into_response()
}

fn created(value: Value) -> Response {
    (StatusCode::CREATED, Json(value)).into_response()
}

fn merge(target: &mut Value, patch: Value) {
    if let (Value::Object(target), Value::Object(patch)) = (target, patch) {
        for (k, v) in patch {
            target.insert(k, v);
        }
    }
}

fn field<'a>(record: &'a Value, name: &str) -> &'a str {
    record.get(name).and_then(Value::as_str).unwrap_or_default()
}

async fn upload(State(state): State<Shared>, mut multipart: Multipart) -> Response {
    let mut fields = Map::new();
    while let Ok(Some(part)) = multipart.next_field().await {
        let name = part.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = part.file_name().unwrap_or("unnamed_file").to_string();
            fields.insert("fls_file_name".to_string(), Value::String(file_name));
            let _ = part.bytes().await;
        } else if let Ok(text) = part.text().await {
            fields.insert(name, Value::String(text));
        }
    }
    let mut state = state.lock().unwrap();
    state.requests.push("POST /file-store/upload".to_string());
    let id = state.id("file");
    let record = json!({
        "fls_id": id,
        "fls_source_type_cd": fields.get("source_type_code").cloned().unwrap_or(Value::Null),
        "fls_source_id": fields.get("source_id").cloned().unwrap_or(Value::Null),
        "fls_file_name": fields.get("fls_file_name").cloned().unwrap_or(Value::Null),
    });
    state.table("files").push(record.clone());
    created(record)
}

async fn dispatch(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let path = uri.path().to_string();
    let decoded: Vec<String> = path
        .trim_matches('/')
        .split('/')
        .map(|s| urlencoding::decode(s).map(|d| d.into_owned()).unwrap_or_else(|_| s.to_string()))
        .collect();
    let segments: Vec<&str> = decoded.iter().map(String::as_str).collect();

    let mut state = state.lock().unwrap();
    let line = format!("{} {}", method, path);
    state.requests.push(line.clone());
    if let Some(status) = state.failures.get(&line) {
        let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return detail(status, "injected failure");
    }

    match (method.as_str(), segments.as_slice()) {
        ("GET", ["health"]) => Json(json!({ "status": "healthy", "version": "test" })).into_response(),

        ("GET", ["lookups", "details"]) => {
            let kind = query.get("type_code").cloned().unwrap_or_default();
            let rows: Vec<Value> = state
                .table("lookups")
                .iter()
                .filter(|r| field(r, "lkd_lkt_type") == kind)
                .cloned()
                .collect();
            Json(rows).into_response()
        }

        // ── chat ────────────────────────────────────────────────────────────
        ("GET", ["chat", "sessions"]) => {
            let agent = query.get("agent_id");
            let rows: Vec<Value> = state
                .table("sessions")
                .iter()
                .filter(|r| agent.map_or(true, |a| field(r, "cht_agt_id") == a.as_str()))
                .cloned()
                .collect();
            Json(rows).into_response()
        }
        ("POST", ["chat", "sessions"]) => {
            let id = state.id("session");
            let record = json!({
                "cht_id": id,
                "cht_name": body["name"],
                "cht_agt_id": body["agent"],
            });
            state.table("sessions").push(record.clone());
            created(record)
        }
        ("DELETE", ["chat", "sessions", id]) => {
            let id = id.to_string();
            state.table("sessions").retain(|r| field(r, "cht_id") != id);
            state.table("messages").retain(|r| field(r, "msg_cht_id") != id);
            StatusCode::NO_CONTENT.into_response()
        }
        ("GET", ["chat", "sessions", id, "messages"]) => {
            let id = id.to_string();
            let rows: Vec<Value> = state
                .table("messages")
                .iter()
                .filter(|r| field(r, "msg_cht_id") == id)
                .cloned()
                .collect();
            Json(rows).into_response()
        }
        ("POST", ["chat", "messages"]) => {
            let session = body["chatSession"].as_str().unwrap_or_default().to_string();
            if !state.table("sessions").iter().any(|r| field(r, "cht_id") == session) {
                return detail(
                    StatusCode::NOT_FOUND,
                    format!("Chat session with ID {} not found", session),
                );
            }
            let id = state.id("message");
            let record = json!({
                "msg_id": id,
                "msg_cht_id": session,
                "msg_agent_name": body["agentName"],
                "msg_role": body["role"],
                "msg_content": body["content"],
            });
            state.table("messages").push(record.clone());
            created(record)
        }

        // ── relationships ───────────────────────────────────────────────────
        ("GET", ["agent-relationships", kind]) => Json(state.table(&format!("rel-{}", kind)).clone()).into_response(),
        ("POST", ["agent-relationships", kind]) => {
            state.table(&format!("rel-{}", kind)).push(body.clone());
            created(body)
        }
        ("DELETE", ["agent-relationships", kind, agent, other]) => {
            let (agent_key, other_key) = if *kind == "tools" {
                ("ato_agt_id", "ato_tol_id")
            } else {
                ("akb_agt_id", "akb_knb_id")
            };
            let (agent, other) = (agent.to_string(), other.to_string());
            state
                .table(&format!("rel-{}", kind))
                .retain(|r| !(field(r, agent_key) == agent && field(r, other_key) == other));
            StatusCode::NO_CONTENT.into_response()
        }

        // ── nested collections ──────────────────────────────────────────────
        ("GET", ["tools", tool, "env-variables"]) => {
            let tool = tool.to_string();
            let rows: Vec<Value> = state
                .table("env")
                .iter()
                .filter(|r| field(r, "tev_tol_id") == tool)
                .cloned()
                .collect();
            Json(rows).into_response()
        }
        ("POST", ["tools", _, "env-variables"]) => {
            state.table("env").push(body.clone());
            created(body)
        }
        ("PUT", ["tools", tool, "env-variables", key]) => {
            let (tool, key) = (tool.to_string(), key.to_string());
            let found = state
                .table("env")
                .iter_mut()
                .find(|r| field(r, "tev_tol_id") == tool && field(r, "tev_key") == key);
            match found {
                Some(record) => {
                    merge(record, body);
                    Json(record.clone()).into_response()
                }
                None => detail(StatusCode::NOT_FOUND, "Environment variable not found"),
            }
        }
        ("DELETE", ["tools", tool, "env-variables", key]) => {
            let (tool, key) = (tool.to_string(), key.to_string());
            state
                .table("env")
                .retain(|r| !(field(r, "tev_tol_id") == tool && field(r, "tev_key") == key));
            StatusCode::NO_CONTENT.into_response()
        }
        ("GET", ["knowledge-bases", kb, "documents"]) => {
            let kb = kb.to_string();
            let rows: Vec<Value> = state
                .table("documents")
                .iter()
                .filter(|r| field(r, "kbd_knb_id") == kb)
                .cloned()
                .collect();
            Json(rows).into_response()
        }
        ("POST", ["knowledge-bases", _, "documents"]) => {
            state.table("documents").push(body.clone());
            created(body)
        }
        ("DELETE", ["knowledge-bases", kb, "documents", file]) => {
            let (kb, file) = (kb.to_string(), file.to_string());
            state
                .table("documents")
                .retain(|r| !(field(r, "kbd_knb_id") == kb && field(r, "kbd_fls_id") == file));
            StatusCode::NO_CONTENT.into_response()
        }

        // ── keyed collections ───────────────────────────────────────────────
        (verb, [collection, rest @ ..]) if rest.len() <= 1 => {
            let Some((_, key)) = KEYED.iter().find(|(name, _)| name == collection) else {
                return detail(StatusCode::NOT_FOUND, "Not Found");
            };
            let table = state.table(collection);
            match (verb, rest) {
                ("GET", []) => Json(table.clone()).into_response(),
                ("POST", []) => {
                    let id = field(&body, key).to_string();
                    if table.iter().any(|r| field(r, key) == id) {
                        return detail(StatusCode::BAD_REQUEST, format!("{} already exists", id));
                    }
                    table.push(body.clone());
                    created(body)
                }
                ("GET", [id]) => match table.iter().find(|r| field(r, key) == *id) {
                    Some(record) => Json(record.clone()).into_response(),
                    None => detail(StatusCode::NOT_FOUND, format!("{} not found", id)),
                },
                ("PUT", [id]) => match table.iter_mut().find(|r| field(r, key) == *id) {
                    Some(record) => {
                        merge(record, body);
                        Json(record.clone()).into_response()
                    }
                    None => detail(StatusCode::NOT_FOUND, format!("{} not found", id)),
                },
                ("DELETE", [id]) => {
                    let before = table.len();
                    table.retain(|r| field(r, key) != *id);
                    if table.len() == before {
                        detail(StatusCode::NOT_FOUND, format!("{} not found", id))
                    } else {
                        StatusCode::NO_CONTENT.into_response()
                    }
                }
                _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
            }
        }

        _ => detail(StatusCode::NOT_FOUND, "Not Found"),
    }
}
