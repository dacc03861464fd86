//! HTTP handlers and routes for resources
//!
//! Handlers are generic: they turn the request into an [`Operation`] and a
//! [`ResourceRequest`], check the operation's permission, run the resource
//! controller and render whatever it produced.

use crate::core::auth::{AuthProvider, PermissionPolicy};
use crate::core::error::{Location, RequestErrors};
use crate::resource::{Operation, Resource, ResourceRequest};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;

/// State shared by the routes of one resource
#[derive(Clone)]
pub struct ResourceState {
    pub resource: Arc<Resource>,
    pub auth_provider: Arc<dyn AuthProvider>,
    pub policy: Arc<PermissionPolicy>,
}

type Params = Query<Vec<(String, String)>>;

/// Build the routes of one resource
///
/// - GET    /{name}       list records
/// - POST   /{name}       create a record
/// - GET    /{name}/{id}  read a record
/// - PUT    /{name}/{id}  replace a record
/// - PATCH  /{name}/{id}  merge into a record
/// - DELETE /{name}/{id}  delete a record
pub fn build_resource_routes(state: ResourceState) -> Router {
    let collection_path = format!("/{}", state.resource.name());
    let record_path = format!("/{}/{{id}}", state.resource.name());

    Router::new()
        .route(&collection_path, get(collection_get).post(collection_post))
        .route(
            &record_path,
            get(get_record)
                .put(put_record)
                .patch(patch_record)
                .delete(delete_record),
        )
        .with_state(state)
}

pub async fn collection_get(
    State(state): State<ResourceState>,
    headers: HeaderMap,
    Query(params): Params,
) -> Response {
    dispatch(&state, Operation::CollectionGet, &headers, params, Bytes::new()).await
}

pub async fn collection_post(
    State(state): State<ResourceState>,
    headers: HeaderMap,
    Query(params): Params,
    body: Bytes,
) -> Response {
    dispatch(&state, Operation::CollectionPost, &headers, params, body).await
}

pub async fn get_record(
    State(state): State<ResourceState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Query(params): Params,
) -> Response {
    dispatch(&state, Operation::Get(id), &headers, params, Bytes::new()).await
}

pub async fn put_record(
    State(state): State<ResourceState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Query(params): Params,
    body: Bytes,
) -> Response {
    dispatch(&state, Operation::Put(id), &headers, params, body).await
}

pub async fn patch_record(
    State(state): State<ResourceState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Query(params): Params,
    body: Bytes,
) -> Response {
    dispatch(&state, Operation::Patch(id), &headers, params, body).await
}

pub async fn delete_record(
    State(state): State<ResourceState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Query(params): Params,
) -> Response {
    dispatch(&state, Operation::Delete(id), &headers, params, Bytes::new()).await
}

/// Authenticate, authorize, run the operation and render its outcome
async fn dispatch(
    state: &ResourceState,
    operation: Operation,
    headers: &HeaderMap,
    params: Vec<(String, String)>,
    body: Bytes,
) -> Response {
    let resource = state.resource.name();

    let auth = match state.auth_provider.extract_context(headers).await {
        Ok(auth) => auth,
        Err(e) => {
            tracing::warn!(resource, error = %e, "Rejected credentials");
            return denied(StatusCode::UNAUTHORIZED, e.to_string());
        }
    };

    let permission = operation.permission();
    if !state.policy.check(&auth, permission) {
        tracing::warn!(
            resource,
            operation = operation.name(),
            user_id = auth.user_id(),
            "Permission '{}' denied",
            permission
        );
        let status = if auth.is_authenticated() {
            StatusCode::FORBIDDEN
        } else {
            StatusCode::UNAUTHORIZED
        };
        return denied(status, format!("Permission '{}' required", permission));
    }

    let mut request = ResourceRequest {
        auth,
        params,
        body,
        errors: RequestErrors::new(),
    };

    match state.resource.handle(&operation, &mut request).await {
        Err(err) => {
            tracing::error!(
                resource,
                operation = operation.name(),
                error = %err,
                "Resource operation failed"
            );
            err.into_response()
        }
        Ok(Some(body)) if request.errors.is_empty() => {
            let status = match operation {
                Operation::CollectionPost => StatusCode::CREATED,
                _ => StatusCode::OK,
            };
            (status, Json(body)).into_response()
        }
        Ok(_) => request.errors.into_response(),
    }
}

fn denied(status: StatusCode, message: impl Into<String>) -> Response {
    let mut errors = RequestErrors::new();
    errors.add(Location::Header, "authorization", message);
    errors.set_status(status);
    errors.into_response()
}
