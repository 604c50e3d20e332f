//! Route handlers. Each one extracts the caller and delegates to the gateway.

use crate::error::ApiError;
use crate::extract::UserId;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use gatehouse_core::QueryHistory;
use gatehouse_runtime::{
    AddColumnRequest, AddColumnResponse, CreateTableRequest, DdlResponse, DeleteColumnRequest,
    DeleteRowRequest, DeleteTableRequest, ExecuteQueryRequest, ExecuteQueryResponse,
    InsertRowRequest, InsertRowResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

type ApiResult<T> = Result<T, ApiError>;

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "gatehouse",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn execute_query(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(project_id): Path<Uuid>,
    Json(request): Json<ExecuteQueryRequest>,
) -> ApiResult<Json<ExecuteQueryResponse>> {
    let response = state
        .gateway
        .execute_query(user_id, project_id, &request)
        .await?;
    Ok(Json(response))
}

pub async fn insert_row(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(project_id): Path<Uuid>,
    Json(request): Json<InsertRowRequest>,
) -> ApiResult<(StatusCode, Json<InsertRowResponse>)> {
    let response = state
        .gateway
        .insert_row(user_id, project_id, &request)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn delete_row(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path((project_id, row_id)): Path<(Uuid, String)>,
    Json(request): Json<DeleteRowRequest>,
) -> ApiResult<StatusCode> {
    state
        .gateway
        .delete_row(user_id, project_id, &row_id, &request)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_column(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(project_id): Path<Uuid>,
    Json(request): Json<AddColumnRequest>,
) -> ApiResult<(StatusCode, Json<AddColumnResponse>)> {
    let response = state
        .gateway
        .add_column(user_id, project_id, &request)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn delete_column(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path((project_id, column_name)): Path<(Uuid, String)>,
    Json(request): Json<DeleteColumnRequest>,
) -> ApiResult<StatusCode> {
    state
        .gateway
        .delete_column(user_id, project_id, &column_name, &request)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_table(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(project_id): Path<Uuid>,
    Json(request): Json<CreateTableRequest>,
) -> ApiResult<(StatusCode, Json<DdlResponse>)> {
    let response = state
        .gateway
        .create_table(user_id, project_id, &request)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn delete_table(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(project_id): Path<Uuid>,
    Json(request): Json<DeleteTableRequest>,
) -> ApiResult<Json<DdlResponse>> {
    let response = state
        .gateway
        .delete_table(user_id, project_id, &request)
        .await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

pub async fn query_history(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Query(params): Query<HistoryParams>,
) -> ApiResult<Json<Vec<QueryHistory>>> {
    let history = state.gateway.query_history(user_id, params.limit).await?;
    Ok(Json(history))
}
