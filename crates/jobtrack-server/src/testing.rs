//! In-process ChromaDB stand-in for tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use jobtrack_core::{JobId, JobSnapshot};
use jobtrack_registry::JobRegistry;

/// Poll until the job is terminal, failing the test after five seconds.
pub async fn wait_terminal(registry: &JobRegistry, id: &JobId) -> JobSnapshot {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let snap = registry.get(id).expect("job should exist");
        if snap.is_terminal() {
            return snap;
        }
        assert!(Instant::now() < deadline, "job {id} did not finish");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[derive(Debug, Default)]
struct StubCollection {
    id: String,
    metadata: Option<Value>,
    docs: Vec<(String, String)>,
}

type Store = Arc<Mutex<BTreeMap<String, StubCollection>>>;

/// Handle to a running stub server.
pub struct StubChroma {
    pub url: String,
    store: Store,
}

impl StubChroma {
    /// Document ids currently stored in a collection.
    pub fn documents(&self, name: &str) -> Vec<Value> {
        let store = self.store.lock().unwrap();
        store
            .get(name)
            .map(|c| c.docs.iter().map(|(id, _)| json!(id)).collect())
            .unwrap_or_default()
    }
}

/// Start a stub bound to an ephemeral port.
pub async fn spawn_chroma_stub() -> StubChroma {
    let store = Store::default();
    let router = Router::new()
        .route("/api/v1/collections", get(list).post(create))
        .route("/api/v1/collections/:name", get(fetch).delete(remove))
        .route("/api/v1/collections/:name/add", post(add))
        .route("/api/v1/collections/:name/query", post(query))
        .route("/api/v1/collections/:name/delete", post(delete_docs))
        .with_state(Arc::clone(&store));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    StubChroma {
        url: format!("http://{addr}"),
        store,
    }
}

fn render(name: &str, c: &StubCollection) -> Value {
    json!({"id": c.id, "name": name, "metadata": c.metadata})
}

fn not_found(name: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": format!("Collection {name} does not exist.")})),
    )
        .into_response()
}

async fn list(State(store): State<Store>) -> Json<Value> {
    let store = store.lock().unwrap();
    Json(Value::Array(
        store.iter().map(|(name, c)| render(name, c)).collect(),
    ))
}

async fn create(State(store): State<Store>, Json(body): Json<Value>) -> Response {
    let name = body["name"].as_str().unwrap_or_default().to_string();
    let mut store = store.lock().unwrap();
    if store.contains_key(&name) {
        return (
            StatusCode::CONFLICT,
            Json(json!({"error": format!("Collection {name} already exists")})),
        )
            .into_response();
    }
    let collection = StubCollection {
        id: format!("id-{name}"),
        metadata: body.get("metadata").cloned(),
        docs: Vec::new(),
    };
    let rendered = render(&name, &collection);
    store.insert(name, collection);
    Json(rendered).into_response()
}

async fn fetch(State(store): State<Store>, Path(name): Path<String>) -> Response {
    let store = store.lock().unwrap();
    match store.get(&name) {
        Some(c) => Json(render(&name, c)).into_response(),
        None => not_found(&name),
    }
}

async fn remove(State(store): State<Store>, Path(name): Path<String>) -> Response {
    match store.lock().unwrap().remove(&name) {
        Some(_) => Json(Value::Null).into_response(),
        None => not_found(&name),
    }
}

/// Document routes address collections by id.
fn by_id<'a>(
    store: &'a mut BTreeMap<String, StubCollection>,
    id: &str,
) -> Option<&'a mut StubCollection> {
    store.values_mut().find(|c| c.id == id)
}

async fn add(State(store): State<Store>, Path(id): Path<String>, Json(body): Json<Value>) -> Response {
    let mut store = store.lock().unwrap();
    let Some(collection) = by_id(&mut store, &id) else {
        return not_found(&id);
    };
    let ids = body["ids"].as_array().cloned().unwrap_or_default();
    let docs = body["documents"].as_array().cloned().unwrap_or_default();
    for (doc_id, doc) in ids.iter().zip(docs.iter()) {
        collection.docs.push((
            doc_id.as_str().unwrap_or_default().to_string(),
            doc.as_str().unwrap_or_default().to_string(),
        ));
    }
    Json(json!(true)).into_response()
}

async fn query(State(store): State<Store>, Path(id): Path<String>, Json(body): Json<Value>) -> Response {
    let mut store = store.lock().unwrap();
    let Some(collection) = by_id(&mut store, &id) else {
        return not_found(&id);
    };
    let n = body["n_results"].as_u64().unwrap_or(10) as usize;
    let hits: Vec<&(String, String)> = collection.docs.iter().take(n).collect();
    Json(json!({
        "ids": [hits.iter().map(|(id, _)| id).collect::<Vec<_>>()],
        "documents": [hits.iter().map(|(_, doc)| doc).collect::<Vec<_>>()],
        "distances": [hits.iter().enumerate().map(|(i, _)| i as f64 * 0.1).collect::<Vec<_>>()],
        "metadatas": null,
        "embeddings": null
    }))
    .into_response()
}

async fn delete_docs(
    State(store): State<Store>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut store = store.lock().unwrap();
    let Some(collection) = by_id(&mut store, &id) else {
        return not_found(&id);
    };
    let ids: Vec<String> = body["ids"]
        .as_array()
        .map(|ids| ids.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default();
    collection.docs.retain(|(doc_id, _)| !ids.contains(doc_id));
    Json(json!(ids)).into_response()
}
