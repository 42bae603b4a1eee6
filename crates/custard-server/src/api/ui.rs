use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;

use super::AppState;

#[derive(Debug, Serialize)]
struct UiMissing {
    message: String,
}

pub(super) async fn root() -> Redirect {
    Redirect::temporary("/ui")
}

/// The single-page UI, or a JSON note saying where it was expected.
pub(super) async fn index(State(state): State<AppState>) -> Response {
    let index = state.static_dir.join("index.html");
    match tokio::fs::read_to_string(&index).await {
        Ok(page) => Html(page).into_response(),
        Err(e) => {
            tracing::warn!(path = %index.display(), error = %e, "web UI not found");
            Json(UiMissing {
                message: format!("Web UI not found. Looking for: {}", index.display()),
            })
            .into_response()
        }
    }
}
