use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{extract::State, response::IntoResponse, routing::post, Form, Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use photo_storage::{CloudinaryConfig, CloudinaryStorage};
use serde_json::{json, Value};

const CLOUD_NAME: &str = "booth";

type Assets = Arc<Mutex<BTreeMap<String, DateTime<Utc>>>>;

/// In-process asset host serving search and destroy for a seeded folder.
///
/// Search honours `max_results`, the `created_at` sort direction and
/// `next_cursor`; signatures are not checked here.
pub struct FakeAssetHost {
    assets: Assets,
    addr: SocketAddr,
}

impl FakeAssetHost {
    pub async fn start() -> Self {
        let assets = Assets::default();
        let router = Router::new()
            .route(&format!("/v1_1/{CLOUD_NAME}/resources/search"), post(search))
            .route(&format!("/v1_1/{CLOUD_NAME}/image/destroy"), post(destroy))
            .with_state(assets.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { assets, addr }
    }

    pub fn storage(&self) -> CloudinaryStorage {
        let mut config = CloudinaryConfig::new(
            CLOUD_NAME.to_string(),
            "key".to_string(),
            "secret".to_string(),
        );
        config.api_base = format!("http://{}", self.addr);
        CloudinaryStorage::new(config).unwrap()
    }

    pub fn insert(&self, public_id: &str, created_at: DateTime<Utc>) {
        self.assets
            .lock()
            .unwrap()
            .insert(public_id.to_string(), created_at);
    }

    pub fn public_ids(&self) -> Vec<String> {
        self.assets.lock().unwrap().keys().cloned().collect()
    }
}

async fn search(State(assets): State<Assets>, Json(request): Json<Value>) -> impl IntoResponse {
    let max_results = request["max_results"].as_u64().unwrap_or(50) as usize;
    let offset: usize = request["next_cursor"]
        .as_str()
        .map_or(0, |cursor| cursor.parse().unwrap());

    let assets = assets.lock().unwrap();
    let mut sorted: Vec<_> = assets.iter().collect();
    sorted.sort_by_key(|(public_id, created_at)| (**created_at, (*public_id).clone()));
    if request["sort_by"][0]["created_at"] == "desc" {
        sorted.reverse();
    }

    let resources: Vec<_> = sorted
        .iter()
        .skip(offset)
        .take(max_results)
        .map(|(public_id, created_at)| {
            json!({
                "public_id": public_id,
                "secure_url": format!("https://res.cloudinary.com/{CLOUD_NAME}/image/upload/v1/{public_id}.jpg"),
                "created_at": created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            })
        })
        .collect();

    let next = offset + resources.len();
    let mut body = json!({ "total_count": sorted.len(), "resources": resources });
    if next < sorted.len() {
        body["next_cursor"] = json!(next.to_string());
    }
    Json(body)
}

async fn destroy(
    State(assets): State<Assets>,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    let removed = assets.lock().unwrap().remove(&form["public_id"]);
    let result = if removed.is_some() { "ok" } else { "not found" };
    Json(json!({ "result": result }))
}
