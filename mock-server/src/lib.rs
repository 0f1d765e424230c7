use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
}

#[derive(Deserialize)]
pub struct ItemInput {
    pub name: String,
}

#[derive(Deserialize)]
pub struct ItemFilter {
    pub name: Option<String>,
}

#[derive(Default)]
pub struct Store {
    items: RwLock<BTreeMap<u64, Item>>,
    next_id: AtomicU64,
}

pub type Db = Arc<Store>;

pub fn app() -> Router {
    let db: Db = Arc::new(Store::default());
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/{id}", get(get_item).put(update_item).delete(delete_item))
        .route("/headers", get(echo_headers))
        .route("/echo", post(echo_body))
        .route("/fail", get(fail))
        .route("/moved", get(moved))
        .route("/bin", get(binary))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({"error": "not found"})))
}

async fn list_items(State(db): State<Db>, Query(filter): Query<ItemFilter>) -> Json<Vec<Item>> {
    let items = db.items.read().await;
    Json(
        items
            .values()
            .filter(|item| filter.name.as_deref().map_or(true, |name| item.name == name))
            .cloned()
            .collect(),
    )
}

async fn create_item(State(db): State<Db>, Json(input): Json<ItemInput>) -> (StatusCode, Json<Item>) {
    let item = Item {
        id: db.next_id.fetch_add(1, Ordering::SeqCst) + 1,
        name: input.name,
    };
    db.items.write().await.insert(item.id, item.clone());
    (StatusCode::CREATED, Json(item))
}

async fn get_item(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<Item>, (StatusCode, Json<Value>)> {
    let items = db.items.read().await;
    items.get(&id).cloned().map(Json).ok_or_else(not_found)
}

async fn update_item(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<ItemInput>,
) -> Result<Json<Item>, (StatusCode, Json<Value>)> {
    let mut items = db.items.write().await;
    let item = items.get_mut(&id).ok_or_else(not_found)?;
    item.name = input.name;
    Ok(Json(item.clone()))
}

async fn delete_item(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    let mut items = db.items.write().await;
    items.remove(&id).map(|_| StatusCode::NO_CONTENT).ok_or_else(not_found)
}

/// Reflect request headers as a JSON object.
async fn echo_headers(headers: HeaderMap) -> Json<BTreeMap<String, String>> {
    Json(
        headers
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect(),
    )
}

/// Return the raw body as plain text.
async fn echo_body(body: String) -> impl IntoResponse {
    body
}

async fn fail() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

/// Temporary redirect to the item list.
async fn moved() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/items")])
}

/// Bytes that are not valid UTF-8.
pub const BINARY_BODY: [u8; 4] = [0xff, 0xfe, 0x00, 0x80];

async fn binary() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        BINARY_BODY.to_vec(),
    )
}
