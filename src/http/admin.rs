//! Admin routes (spec §6).

use super::envelope::{ApiError, ApiResponse};
use super::AppState;
use crate::money::Money;
use axum::extract::State;
use axum::routing::put;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

pub fn routes() -> Router<AppState> {
    Router::new().route("/shop/admin/balance", put(set_balance))
}

#[derive(Debug, Deserialize)]
struct SetBalanceRequest {
    #[serde(rename = "playerId")]
    player_id: String,
    #[serde(rename = "newBalance")]
    new_balance: f64,
}

#[derive(Debug, Serialize)]
struct SetBalanceResponse {
    #[serde(rename = "playerId")]
    player_id: String,
    balance: f64,
}

async fn set_balance(
    State(state): State<AppState>,
    Json(req): Json<SetBalanceRequest>,
) -> Result<ApiResponse<SetBalanceResponse>, ApiError> {
    let balance = Money::from_f64(req.new_balance);
    state.ledger.set_balance(&req.player_id, balance)?;
    Ok(ApiResponse::ok(
        "balance updated",
        SetBalanceResponse {
            player_id: req.player_id,
            balance: balance.to_f64(),
        },
    ))
}
