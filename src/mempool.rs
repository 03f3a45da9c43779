//! The bounded pool of admitted-but-unconfirmed transactions.

use crate::config::MempoolConfig;
use crate::error::NodeError;
use crate::transaction::{Sender, Transaction};
use std::collections::HashSet;

#[derive(Debug)]
pub struct Mempool {
    config: MempoolConfig,
    transactions: Vec<Transaction>,
}

impl Mempool {
    pub fn new(config: MempoolConfig) -> Self {
        Self {
            config,
            transactions: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Rounds to the nearest `fee_step`, capped at `max_fee`. Pure function
    /// of current occupancy.
    pub fn current_fee_percent(&self) -> f64 {
        let fullness = self.transactions.len() as f64 / self.config.max_size as f64;
        let raw = self.config.base_fee + fullness * (self.config.max_fee - self.config.base_fee);
        let stepped = (raw / self.config.fee_step).round() * self.config.fee_step;
        stepped.min(self.config.max_fee)
    }

    /// Sum of `quantity * (1 + fee_percent)` over this sender's currently
    /// pending transactions — the amount still tentatively reserved against
    /// their balance.
    pub fn pending_spends(&self, sender: &str) -> f64 {
        self.transactions
            .iter()
            .filter(|tx| tx.sender.as_str() == sender)
            .map(|tx| tx.quantity * (1.0 + tx.fee_percent))
            .sum()
    }

    pub fn add(&mut self, tx: Transaction) -> Result<(), NodeError> {
        if self.transactions.len() >= self.config.max_size {
            return Err(NodeError::MempoolFull);
        }
        if self.transactions.iter().any(|existing| existing.txid == tx.txid) {
            return Err(NodeError::DuplicateTx);
        }
        self.transactions.push(tx);
        Ok(())
    }

    /// Up to `block_tx_limit` transactions, stable-sorted by descending fee
    /// (ties broken by original insertion order).
    pub fn block_candidates(&self) -> Vec<Transaction> {
        let mut indexed: Vec<(usize, &Transaction)> = self.transactions.iter().enumerate().collect();
        indexed.sort_by(|(ia, a), (ib, b)| {
            b.fee
                .partial_cmp(&a.fee)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(ia.cmp(ib))
        });
        indexed
            .into_iter()
            .take(self.config.block_tx_limit)
            .map(|(_, tx)| tx.clone())
            .collect()
    }

    pub fn remove_confirmed(&mut self, confirmed_txids: &HashSet<String>) {
        self.transactions.retain(|tx| !confirmed_txids.contains(&tx.txid));
    }
}
