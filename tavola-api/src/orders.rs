use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use tavola_order::PlaceOrderRequest;

use crate::error::AppError;
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/orders", post(place_order))
        .route("/api/orders/recommend", get(recommend_combo))
        .route("/api/orders/recommendTop3", get(recommend_top3))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DishQuery {
    pub dish_id: Option<String>,
}

/// POST /api/orders
async fn place_order(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<PlaceOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let order = state.orders.place_order(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Order placed.",
            "order": order,
        })),
    ))
}

/// GET /api/orders/recommend?dishId=
async fn recommend_combo(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DishQuery>,
) -> Result<impl IntoResponse, AppError> {
    let suggestion = state.orders.recommend_combo(query.dish_id.as_deref()).await?;
    Ok(Json(json!({ "success": true, "suggestion": suggestion })))
}

/// GET /api/orders/recommendTop3?dishId=
async fn recommend_top3(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DishQuery>,
) -> Result<impl IntoResponse, AppError> {
    let suggestions = state.orders.recommend_top3(query.dish_id.as_deref()).await?;
    Ok(Json(json!({ "success": true, "suggestions": suggestions })))
}
