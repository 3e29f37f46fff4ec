//! Player-facing shop routes (spec §6).

use super::envelope::{ApiError, ApiResponse, Page};
use super::AppState;
use crate::executor::BatchEntry;
use crate::model::{Category, Direction, Item, Transaction};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/shop/buy", post(buy))
        .route("/shop/sell", post(sell))
        .route("/shop/batch", post(batch))
        .route("/shop/balance/{playerId}", get(balance))
        .route("/shop/history/{playerId}", get(history))
        .route("/shop/items", get(list_items))
        .route("/shop/items/{itemId}", get(item_detail))
        .route("/shop/price/{itemId}", get(price))
}

#[derive(Debug, Deserialize)]
struct TradeRequest {
    #[serde(rename = "playerId")]
    player_id: String,
    #[serde(rename = "playerName", default)]
    player_name: Option<String>,
    #[serde(rename = "itemId")]
    item_id: String,
    quantity: i64,
}

#[derive(Debug, Serialize)]
struct TradeResponse {
    #[serde(rename = "transactionId")]
    transaction_id: i64,
    #[serde(rename = "unitPrice")]
    unit_price: f64,
    total: f64,
    #[serde(rename = "newBalance")]
    new_balance: f64,
}

async fn buy(State(state): State<AppState>, Json(req): Json<TradeRequest>) -> Result<ApiResponse<TradeResponse>, ApiError> {
    trade(state, req, Direction::PlayerBuys).await
}

async fn sell(State(state): State<AppState>, Json(req): Json<TradeRequest>) -> Result<ApiResponse<TradeResponse>, ApiError> {
    trade(state, req, Direction::PlayerSells).await
}

async fn trade(state: AppState, req: TradeRequest, direction: Direction) -> Result<ApiResponse<TradeResponse>, ApiError> {
    let player_name = req.player_name.unwrap_or_else(|| req.player_id.clone());
    let result = state
        .executor
        .execute(&req.player_id, &player_name, &req.item_id, req.quantity, direction)
        .await?;
    Ok(ApiResponse::ok(
        "trade executed",
        TradeResponse {
            transaction_id: result.transaction_id,
            unit_price: result.unit_price.to_f64(),
            total: result.total.to_f64(),
            new_balance: result.new_balance.to_f64(),
        },
    ))
}

#[derive(Debug, Deserialize)]
struct BatchRequest {
    #[serde(rename = "playerId")]
    player_id: String,
    #[serde(rename = "playerName", default)]
    player_name: Option<String>,
    transactions: Vec<BatchTransactionRequest>,
}

#[derive(Debug, Deserialize)]
struct BatchTransactionRequest {
    #[serde(rename = "itemId")]
    item_id: String,
    quantity: i64,
    direction: String,
}

#[derive(Debug, Serialize)]
struct BatchEntryResult {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    transaction_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn batch(State(state): State<AppState>, Json(req): Json<BatchRequest>) -> Result<ApiResponse<Vec<BatchEntryResult>>, ApiError> {
    let player_name = req.player_name.unwrap_or_else(|| req.player_id.clone());
    let entries: Vec<BatchEntry> = req
        .transactions
        .iter()
        .map(|t| BatchEntry {
            item_id: t.item_id.clone(),
            quantity: t.quantity,
            direction: Direction::from_str(&t.direction).unwrap_or(Direction::PlayerBuys),
        })
        .collect();

    let results = state.executor.execute_batch(&req.player_id, &player_name, &entries).await?;
    let out = results
        .into_iter()
        .map(|r| match r {
            Ok(exec) => BatchEntryResult {
                success: true,
                transaction_id: Some(exec.transaction_id),
                error: None,
            },
            Err(e) => BatchEntryResult {
                success: false,
                transaction_id: None,
                error: Some(e.to_string()),
            },
        })
        .collect();
    Ok(ApiResponse::ok("batch processed", out))
}

#[derive(Debug, Serialize)]
struct BalanceResponse {
    #[serde(rename = "playerId")]
    player_id: String,
    balance: f64,
}

async fn balance(State(state): State<AppState>, Path(player_id): Path<String>) -> Result<ApiResponse<BalanceResponse>, ApiError> {
    let balance = state.ledger.balance(&player_id)?;
    Ok(ApiResponse::ok(
        "ok",
        BalanceResponse {
            player_id,
            balance: balance.to_f64(),
        },
    ))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    page: Option<u32>,
    size: Option<u32>,
    #[serde(rename = "type")]
    direction: Option<String>,
}

async fn history(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<ApiResponse<Page<Transaction>>, ApiError> {
    let page = query.page.unwrap_or(0);
    let size = query.size.unwrap_or(20).min(200);
    let direction = query.direction.as_deref().and_then(Direction::from_str);
    let items = state.ledger.history_for_player(&player_id, page, size, direction)?;
    Ok(ApiResponse::ok("ok", Page { items, page, size }))
}

async fn list_items(State(state): State<AppState>, Query(query): Query<HashMap<String, String>>) -> Result<ApiResponse<Vec<Item>>, ApiError> {
    let category = query.get("category").and_then(|c| Category::from_str(c));
    let items = state.catalog.list(category)?;
    Ok(ApiResponse::ok("ok", items))
}

async fn item_detail(State(state): State<AppState>, Path(item_id): Path<String>) -> Result<ApiResponse<Item>, ApiError> {
    let item = state.catalog.get(&item_id)?;
    Ok(ApiResponse::ok("ok", item))
}

#[derive(Debug, Serialize)]
struct PriceResponse {
    #[serde(rename = "itemId")]
    item_id: String,
    #[serde(rename = "buyPrice")]
    buy_price: f64,
    #[serde(rename = "sellPrice")]
    sell_price: f64,
    #[serde(rename = "lastUpdated")]
    last_updated: chrono::DateTime<chrono::Utc>,
}

async fn price(State(state): State<AppState>, Path(item_id): Path<String>) -> Result<ApiResponse<PriceResponse>, ApiError> {
    let item = state.catalog.get(&item_id)?;
    let buy_price = state.pricing.quote(&item, Direction::PlayerBuys)?;
    let sell_price = state.pricing.quote(&item, Direction::PlayerSells)?;
    Ok(ApiResponse::ok(
        "ok",
        PriceResponse {
            item_id,
            buy_price: buy_price.to_f64(),
            sell_price: sell_price.to_f64(),
            last_updated: chrono::Utc::now(),
        },
    ))
}
