//! Service description served at the root URL

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, header},
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;

/// Static facts about the running service
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub project_name: String,
    pub version: String,
    pub documentation: String,
    /// End-of-service date, announced when set
    pub eos: Option<String>,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            project_name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            documentation: "https://readinglist.rtfd.org/".to_string(),
            eos: None,
        }
    }
}

/// Body of `GET /`
#[derive(Debug, Serialize)]
pub struct HelloResponse {
    pub hello: String,
    pub version: String,
    pub url: String,
    pub documentation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eos: Option<String>,
}

pub fn hello_routes(info: ServiceInfo) -> Router {
    Router::new()
        .route("/", get(hello))
        .with_state(Arc::new(info))
}

async fn hello(State(info): State<Arc<ServiceInfo>>, headers: HeaderMap) -> Json<HelloResponse> {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");

    let eos = info
        .eos
        .as_deref()
        .map(str::trim)
        .filter(|eos| !eos.is_empty())
        .map(str::to_string);

    Json(HelloResponse {
        hello: info.project_name.clone(),
        version: info.version.clone(),
        url: format!("http://{}", host),
        documentation: info.documentation.clone(),
        eos,
    })
}
