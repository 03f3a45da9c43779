//! End-to-end tests driving the HTTP boundary, the way a wallet or miner
//! would.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tempfile::tempdir;
use tower::ServiceExt;
use zedovium_node::block::satisfies_difficulty;
use zedovium_node::config::Config;
use zedovium_node::http::router;
use zedovium_node::node::Node;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn test_node() -> (Arc<Node>, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let mut config = Config::default();
    config.data_dir = dir.path().to_path_buf();
    config.difficulty.initial_difficulty = 0;
    (Arc::new(Node::new(config).unwrap()), dir)
}

fn brute_force(prev_proof: u64, difficulty: u32) -> u64 {
    (0..1_000_000).find(|&candidate| satisfies_difficulty(prev_proof, candidate, difficulty)).unwrap()
}

#[tokio::test]
async fn ping_reports_liveness() {
    let (node, _dir) = test_node();
    let app = router(node);
    let response = app
        .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["result"], "pong!");
}

#[tokio::test]
async fn wallet_create_import_and_validate_round_trip() {
    let (node, _dir) = test_node();
    let app = router(node);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/wallet/create").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let created = body_json(response).await;
    let address = created["address"].as_str().unwrap().to_string();
    let seed = created["seed"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/wallet/import")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::json!({ "seed": seed }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let imported = body_json(response).await;
    assert_eq!(imported["address"], address);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/wallet/validate/{address}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let validated = body_json(response).await;
    assert_eq!(validated["valid"], true);
}

#[tokio::test]
async fn mining_settles_balances_over_http() {
    let (node, _dir) = test_node();
    let app = router(node.clone());

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/mining/info").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let info = body_json(response).await;
    let difficulty = info["difficulty"].as_u64().unwrap() as u32;
    let last_proof_n = info["latestblock"]["proofN"].as_u64().unwrap();
    let last_index = info["latestblock"]["index"].as_u64().unwrap();
    let prev_hash = node.latest_block().hash();

    let proof_n = brute_force(last_proof_n, difficulty);
    let miner = zedovium_node::address::generate(None).address;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/mining/submitblock")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "index": last_index + 1,
                        "proofN": proof_n,
                        "prev_hash": prev_hash,
                        "miner_address": miner,
                        "timestamp": zedovium_node::block::now_ts(),
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/wallet/balance/{miner}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let balance = body_json(response).await;
    assert_eq!(balance["balance"], 80.0);

    let response = app
        .oneshot(Request::builder().uri("/network/chain").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let chain = body_json(response).await;
    assert_eq!(chain["length"], 2);
}

#[tokio::test]
async fn transaction_create_rejects_unowned_sender() {
    let (node, _dir) = test_node();
    let app = router(node);

    let sender = zedovium_node::address::generate(None).address;
    let recipient = zedovium_node::address::generate(None).address;
    let wrong_seed = "ff".repeat(16);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/transaction/create")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "sender": sender,
                        "recipient": recipient,
                        "amount": 1.0,
                        "seed": wrong_seed,
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["kind"], "Unauthorized");
}

#[tokio::test]
async fn mempool_info_reports_zero_pending_on_a_fresh_node() {
    let (node, _dir) = test_node();
    let app = router(node);
    let response = app
        .oneshot(Request::builder().uri("/mempool/info").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let info = body_json(response).await;
    assert_eq!(info["size"], 0);
}
