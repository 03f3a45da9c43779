//! Thin axum router mapping the HTTP/JSON boundary (§6) onto `Node`
//! operations. Handlers extract shared state, call exactly one façade
//! method, and translate the result into the JSON envelope.

use crate::error::{ErrorBody, NodeError};
use crate::node::Node;
use crate::{address, transaction::Transaction};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

impl IntoResponse for NodeError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorBody::from(&self))).into_response()
    }
}

pub fn router(node: Arc<Node>) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/network/info", get(network_info))
        .route("/network/chain", get(network_chain))
        .route("/network/latestblock", get(network_latestblock))
        .route("/network/totalsupply", get(network_totalsupply))
        .route("/network/block/:n", get(network_block))
        .route("/network/blocks", get(network_blocks))
        .route("/network/getblockbyhash/:hash", get(network_block_by_hash))
        .route("/network/transactionbyid/:txid", get(network_transaction_by_id))
        .route("/network/transactions/:addr", get(network_transactions_by_address))
        .route("/network/transactions", get(network_recent_transactions))
        .route("/network/hashrate", get(network_hashrate))
        .route("/network/fee_estimate", get(network_fee_estimate))
        .route("/network/checkaddrdiff/:addr", get(network_checkaddrdiff))
        .route("/mining/info", get(mining_info))
        .route("/mining/submitblock", post(mining_submitblock))
        .route("/wallet/create", get(wallet_create))
        .route("/wallet/import", post(wallet_import))
        .route("/wallet/validate/:addr", get(wallet_validate))
        .route("/wallet/balance/:addr", get(wallet_balance))
        .route("/transaction/create", post(transaction_create))
        .route("/mempool/info", get(mempool_info))
        .route("/mempool/transactions", get(mempool_transactions))
        .with_state(node)
}

#[derive(Debug, Deserialize)]
struct CountQuery {
    count: Option<usize>,
}

async fn ping() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "result": "pong!" }))
}

async fn network_info(State(node): State<Arc<Node>>) -> Json<crate::node::NetworkInfo> {
    Json(node.network_info())
}

#[derive(Debug, Serialize)]
struct ChainResponse {
    length: u64,
    chain: Vec<crate::block::Block>,
}

async fn network_chain(State(node): State<Arc<Node>>) -> Json<ChainResponse> {
    let chain = node.chain();
    Json(ChainResponse {
        length: chain.len() as u64,
        chain,
    })
}

async fn network_latestblock(State(node): State<Arc<Node>>) -> Json<crate::block::Block> {
    Json(node.latest_block())
}

#[derive(Debug, Serialize)]
struct TotalSupplyResponse {
    total_supply: f64,
}

async fn network_totalsupply(State(node): State<Arc<Node>>) -> Json<TotalSupplyResponse> {
    Json(TotalSupplyResponse {
        total_supply: node.total_supply(),
    })
}

async fn network_block(
    State(node): State<Arc<Node>>,
    Path(n): Path<u64>,
) -> Result<Json<crate::block::Block>, NodeError> {
    Ok(Json(node.block_by_index(n)?))
}

async fn network_blocks(
    State(node): State<Arc<Node>>,
    Query(query): Query<CountQuery>,
) -> Json<Vec<crate::block::Block>> {
    Json(node.recent_blocks(query.count.unwrap_or(10)))
}

async fn network_block_by_hash(
    State(node): State<Arc<Node>>,
    Path(hash): Path<String>,
) -> Result<Json<crate::block::Block>, NodeError> {
    node.block_by_hash(&hash)
        .map(Json)
        .ok_or_else(|| NodeError::NotFound(format!("no block with hash {hash}")))
}

async fn network_transaction_by_id(
    State(node): State<Arc<Node>>,
    Path(txid): Path<String>,
) -> Result<Json<crate::node::TransactionContext>, NodeError> {
    node.transaction_by_id(&txid)
        .map(Json)
        .ok_or_else(|| NodeError::NotFound(format!("no transaction with id {txid}")))
}

async fn network_transactions_by_address(
    State(node): State<Arc<Node>>,
    Path(addr): Path<String>,
) -> Json<Vec<crate::node::TransactionContext>> {
    Json(node.transactions_by_address(&addr))
}

async fn network_recent_transactions(
    State(node): State<Arc<Node>>,
    Query(query): Query<CountQuery>,
) -> Json<Vec<crate::node::TransactionContext>> {
    Json(node.recent_transactions(query.count.unwrap_or(10)))
}

#[derive(Debug, Serialize)]
struct HashrateResponse {
    hashrate: f64,
}

async fn network_hashrate(State(node): State<Arc<Node>>) -> Json<HashrateResponse> {
    Json(HashrateResponse {
        hashrate: node.hashrate(),
    })
}

async fn network_fee_estimate(State(node): State<Arc<Node>>) -> Json<crate::node::FeeEstimate> {
    Json(node.fee_estimate())
}

#[derive(Debug, Serialize)]
struct CheckAddrDiffResponse {
    address: String,
    status: &'static str,
    effective_difficulty: u32,
    multiplier: f64,
}

async fn network_checkaddrdiff(
    State(node): State<Arc<Node>>,
    Path(addr): Path<String>,
) -> Result<Json<CheckAddrDiffResponse>, NodeError> {
    if !address::validate(&addr) {
        return Err(NodeError::InvalidAddress(addr));
    }
    let (effective_difficulty, multiplier) = node.checkaddrdiff(&addr);
    let status = if multiplier > 1.0 { "high" } else { "normal" };
    Ok(Json(CheckAddrDiffResponse {
        address: addr,
        status,
        effective_difficulty,
        multiplier,
    }))
}

async fn mining_info(State(node): State<Arc<Node>>) -> Json<crate::node::MiningInfo> {
    Json(node.mining_info())
}

#[derive(Debug, Deserialize)]
struct SubmitBlockRequest {
    index: u64,
    #[serde(rename = "proofN")]
    proof_n: u64,
    prev_hash: String,
    miner_address: String,
    timestamp: f64,
}

async fn mining_submitblock(
    State(node): State<Arc<Node>>,
    Json(body): Json<SubmitBlockRequest>,
) -> Result<(StatusCode, Json<crate::block::Block>), NodeError> {
    let block = node.submit_mined_block(
        body.index,
        body.proof_n,
        body.prev_hash,
        &body.miner_address,
        body.timestamp,
    )?;
    Ok((StatusCode::CREATED, Json(block)))
}

async fn wallet_create() -> Json<address::GeneratedAddress> {
    Json(address::generate(None))
}

#[derive(Debug, Deserialize)]
struct WalletImportRequest {
    seed: String,
}

#[derive(Debug, Serialize)]
struct WalletImportResponse {
    address: String,
}

async fn wallet_import(Json(body): Json<WalletImportRequest>) -> Json<WalletImportResponse> {
    Json(WalletImportResponse {
        address: address::generate(Some(body.seed)).address,
    })
}

#[derive(Debug, Serialize)]
struct WalletValidateResponse {
    valid: bool,
}

async fn wallet_validate(Path(addr): Path<String>) -> Json<WalletValidateResponse> {
    Json(WalletValidateResponse {
        valid: address::validate(&addr),
    })
}

#[derive(Debug, Serialize)]
struct WalletBalanceResponse {
    address: String,
    balance: f64,
}

async fn wallet_balance(
    State(node): State<Arc<Node>>,
    Path(addr): Path<String>,
) -> Json<WalletBalanceResponse> {
    Json(WalletBalanceResponse {
        balance: node.balance(&addr),
        address: addr,
    })
}

#[derive(Debug, Deserialize)]
struct CreateTransactionRequest {
    sender: String,
    recipient: String,
    amount: f64,
    seed: String,
}

async fn transaction_create(
    State(node): State<Arc<Node>>,
    Json(body): Json<CreateTransactionRequest>,
) -> Result<Json<crate::node::CreateTransactionReceipt>, NodeError> {
    Ok(Json(node.create_transaction(
        &body.sender,
        &body.recipient,
        body.amount,
        &body.seed,
    )?))
}

async fn mempool_info(State(node): State<Arc<Node>>) -> Json<crate::node::MempoolInfo> {
    Json(node.mempool_info())
}

async fn mempool_transactions(
    State(node): State<Arc<Node>>,
    Query(query): Query<CountQuery>,
) -> Json<Vec<Transaction>> {
    Json(node.mempool_transactions(query.count.unwrap_or(100)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::Body;
    use axum::http::Request;
    use tempfile::tempdir;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = dir.path().to_path_buf();
        let node = Arc::new(Node::new(config).unwrap());
        drop(dir);
        router(node)
    }

    #[tokio::test]
    async fn ping_returns_pong() {
        let response = test_router()
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn out_of_range_block_is_a_400() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/network/block/999")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_block_hash_is_a_404() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/network/getblockbyhash/does-not-exist")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn wallet_create_returns_a_valid_address() {
        let response = test_router()
            .oneshot(Request::builder().uri("/wallet/create").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
