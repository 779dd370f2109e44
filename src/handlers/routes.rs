use axum::extract::{rejection::JsonRejection, Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult};
use crate::routes::model::{Route, RouteId};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub ids: Vec<RouteId>,
}

/// GET /api/routes - List every route
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Route>> {
    let routes = state.store.list_routes().await?;
    Ok(ApiResponse::success(routes))
}

/// POST /api/routes - Create routes in bulk
pub async fn bulk_create(
    State(state): State<AppState>,
    payload: Result<Json<Vec<Route>>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(routes) = payload?;
    state.store.create_routes(&routes).await?;

    tracing::info!("Created {} routes", routes.len());
    Ok(ApiResponse::created(json!({ "created": routes.len() })))
}

/// PUT /api/routes - Replace routes in bulk, matched by id
pub async fn bulk_update(
    State(state): State<AppState>,
    payload: Result<Json<Vec<Route>>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(routes) = payload?;
    state.store.update_routes(&routes).await?;

    tracing::info!("Updated {} routes", routes.len());
    Ok(ApiResponse::success(json!({ "updated": routes.len() })))
}

/// DELETE /api/routes - Delete routes in bulk
pub async fn bulk_delete(
    State(state): State<AppState>,
    payload: Result<Json<DeleteRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(request) = payload?;
    state.store.delete_routes(&request.ids).await?;

    tracing::info!("Deleted {} routes", request.ids.len());
    Ok(ApiResponse::success(json!({ "deleted": request.ids.len() })))
}

/// DELETE /api/routes/:id - Delete a single route
pub async fn delete_one(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = RouteId::new(id);
    state.store.delete_route(&id).await?;

    tracing::info!("Deleted route {}", id);
    Ok(ApiResponse::success(json!({ "deleted": 1 })))
}
