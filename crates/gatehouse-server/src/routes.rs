//! Route definitions.

use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/projects/{project_id}/query", post(handlers::execute_query))
        .route("/projects/{project_id}/rows", post(handlers::insert_row))
        .route(
            "/projects/{project_id}/rows/{row_id}",
            delete(handlers::delete_row),
        )
        .route("/projects/{project_id}/columns", post(handlers::add_column))
        .route(
            "/projects/{project_id}/columns/{column_name}",
            delete(handlers::delete_column),
        )
        .route(
            "/projects/{project_id}/tables",
            post(handlers::create_table).delete(handlers::delete_table),
        )
        .route("/queries/history", get(handlers::query_history))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
