// App list, detail and delete handlers.
//
// GET    /api/apps          — all stored apps
// GET    /api/apps/{app_id} — one app with its reviews
// DELETE /api/apps/{app_id} — remove an app and its reviews

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::web::{api_error, AppState};

/// GET /api/apps
pub async fn list_apps(State(state): State<AppState>) -> Response {
    match state.db.list_apps().await {
        Ok(apps) => Json(apps).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "DB error listing apps");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}

/// GET /api/apps/{app_id}
pub async fn get_app(State(state): State<AppState>, Path(app_id): Path<String>) -> Response {
    let app = match state.db.get_app(&app_id).await {
        Ok(Some(app)) => app,
        Ok(None) => return api_error(StatusCode::NOT_FOUND, "App not found"),
        Err(e) => {
            tracing::error!(error = %e, app_id = %app_id, "DB error fetching app");
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    };

    match state.db.get_reviews(&app_id, None).await {
        Ok(reviews) => Json(serde_json::json!({
            "app_info": app,
            "reviews": reviews,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, app_id = %app_id, "DB error fetching reviews");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}

/// DELETE /api/apps/{app_id}
pub async fn delete_app(State(state): State<AppState>, Path(app_id): Path<String>) -> Response {
    match state.db.delete_app(&app_id).await {
        Ok(true) => Json(serde_json::json!({
            "message": format!("App {app_id} and its reviews were deleted"),
        }))
        .into_response(),
        Ok(false) => api_error(StatusCode::NOT_FOUND, "App not found"),
        Err(e) => {
            tracing::error!(error = %e, app_id = %app_id, "DB error deleting app");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}
