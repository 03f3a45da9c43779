//! Append-only block storage, atomic persistence, and replay.

use crate::address::COINBASE;
use crate::block::Block;
use crate::error::NodeError;
use crate::transaction::Sender;
use std::collections::HashMap;
use std::path::PathBuf;

pub struct ChainStore {
    path: PathBuf,
}

impl ChainStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the persisted chain, or creates and persists a genesis block if
    /// none exists yet.
    pub fn load_or_genesis(&self) -> Result<Vec<Block>, NodeError> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            serde_json::from_str(&content).map_err(|e| NodeError::Io(e.to_string()))
        } else {
            let genesis = Block::genesis();
            self.persist(std::slice::from_ref(&genesis))?;
            Ok(vec![genesis])
        }
    }

    /// Writes `chain` to a temp file beside the target path, then renames it
    /// atomically into place. Callers should take a stable snapshot and
    /// release the core lock before calling this.
    pub fn persist(&self, chain: &[Block]) -> Result<(), NodeError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(chain).map_err(|e| NodeError::Io(e.to_string()))?;
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Rebuilt fresh on every replay rather than patched incrementally, so it is
/// always consistent with the in-memory chain (§9).
pub fn build_hash_index(chain: &[Block]) -> HashMap<String, usize> {
    chain.iter().enumerate().map(|(i, b)| (b.hash(), i)).collect()
}

/// Replays every block's transactions in order, applying the spend policy
/// from §3/§9: `quantity + fee` leaves the sender, `quantity` reaches the
/// recipient, and non-zero fees accrue to `fee_recipient`. The reserved
/// coinbase address is forced to zero afterward.
pub fn replay_balances(chain: &[Block], fee_recipient: &str) -> HashMap<String, f64> {
    let mut balances: HashMap<String, f64> = HashMap::new();
    for block in chain {
        for tx in &block.transactions {
            *balances.entry(tx.recipient.clone()).or_insert(0.0) += tx.quantity;
            if let Sender::External(addr) = &tx.sender {
                *balances.entry(addr.clone()).or_insert(0.0) -= tx.quantity + tx.fee;
                if tx.fee != 0.0 {
                    *balances.entry(fee_recipient.to_string()).or_insert(0.0) += tx.fee;
                }
            }
        }
    }
    balances.insert(COINBASE.to_string(), 0.0);
    balances
}
