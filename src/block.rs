//! Blocks: immutable records chained by hash.

use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the epoch, as a float — matches the timestamp granularity
/// transactions and blocks are compared and hashed with.
pub fn now_ts() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_secs_f64()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    #[serde(rename = "proofN")]
    pub proof_n: u64,
    pub prev_hash: String,
    pub transactions: Vec<Transaction>,
    pub timestamp: f64,
}

impl Block {
    pub fn genesis() -> Self {
        Self {
            index: 0,
            proof_n: 0,
            prev_hash: "0".to_string(),
            transactions: Vec::new(),
            timestamp: now_ts(),
        }
    }

    /// 512-bit digest of `index|proofN|prev_hash|transactions|timestamp`,
    /// where `transactions` renders as its canonical JSON array form.
    pub fn hash(&self) -> String {
        let tx_repr = serde_json::to_string(&self.transactions).expect("transactions always serialize");
        let payload = format!(
            "{}{}{}{}{}",
            self.index, self.proof_n, self.prev_hash, tx_repr, self.timestamp
        );
        hex::encode(Sha512::digest(payload.as_bytes()))
    }
}

/// The proof rule shared by mining and submission: the 512-bit digest of
/// `concat(prev_proof, proof)` must begin with `difficulty` zero hex chars.
pub fn satisfies_difficulty(prev_proof: u64, proof: u64, difficulty: u32) -> bool {
    let payload = format!("{prev_proof}{proof}");
    let digest = hex::encode(Sha512::digest(payload.as_bytes()));
    let required = difficulty as usize;
    required <= digest.len() && digest[..required].chars().all(|c| c == '0')
}
