// POST /api/apps/topic-modeling — run the topic pipeline over an app's reviews.
//
// Body: {"app_id": "...", "n_topics"?: K, "n_top_words"?: N}
//
// 200 with the report, 404 for an unknown app, 400 when the reviews cannot
// support a model (too few, or too few adjectives), 500 otherwise. The
// pipeline is CPU-bound and runs on the blocking pool; the database lock is
// released before it starts.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::topics::{perform_topic_modeling_with, Review};
use crate::web::{api_error, AppState};

#[derive(Debug, Deserialize)]
pub struct TopicModelingRequest {
    pub app_id: String,
    pub n_topics: Option<usize>,
    pub n_top_words: Option<usize>,
}

pub async fn run_topic_modeling(
    State(state): State<AppState>,
    Json(request): Json<TopicModelingRequest>,
) -> Response {
    if request.n_topics == Some(0) {
        return api_error(StatusCode::BAD_REQUEST, "n_topics must be at least 1");
    }

    match state.db.get_app(&request.app_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return api_error(StatusCode::NOT_FOUND, "App not found"),
        Err(e) => {
            tracing::error!(error = %e, app_id = %request.app_id, "DB error fetching app");
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    }

    let reviews: Vec<Review> = match state.db.get_reviews(&request.app_id, None).await {
        Ok(stored) => stored.iter().map(Review::from).collect(),
        Err(e) => {
            tracing::error!(error = %e, app_id = %request.app_id, "DB error fetching reviews");
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    };

    let options = state
        .config
        .topic_options(request.n_topics, request.n_top_words);
    let outcome =
        tokio::task::spawn_blocking(move || perform_topic_modeling_with(&options, &reviews)).await;

    match outcome {
        Ok(Ok(result)) => Json(result).into_response(),
        Ok(Err(e)) if e.is_client_error() => api_error(StatusCode::BAD_REQUEST, &e.user_message()),
        Ok(Err(e)) => {
            tracing::error!(error = %e, app_id = %request.app_id, "Topic modeling failed");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Topic modeling failed due to an internal error",
            )
        }
        Err(e) => {
            tracing::error!(error = %e, app_id = %request.app_id, "Topic modeling task panicked");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Topic modeling failed due to an internal error",
            )
        }
    }
}
