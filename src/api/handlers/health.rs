use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use super::AppState;

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let authenticated = state.service.session().is_authenticated().await;

    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "authenticated": authenticated,
        })),
    )
}
