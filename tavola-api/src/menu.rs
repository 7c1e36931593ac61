use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/menu", get(menu))
}

/// GET /api/menu
async fn menu(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "success": true,
        "dishes": state.menu.dishes,
        "combos": state.menu.combos,
    }))
}
