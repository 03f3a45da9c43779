//! Peer-to-peer stub. Real gossip and discovery are out of scope; this
//! gives the node façade a seam to call through without them.

use crate::block::Block;
use crate::transaction::Transaction;

pub trait Broadcaster: Send + Sync {
    fn broadcast_block(&self, block: &Block);
    fn broadcast_transaction(&self, tx: &Transaction);
}

/// The only implementation shipped: logs what would have gone out over the
/// wire. No peer discovery, handshake, or wire protocol.
pub struct LoggingBroadcaster;

impl Broadcaster for LoggingBroadcaster {
    fn broadcast_block(&self, block: &Block) {
        tracing::info!(index = block.index, hash = %block.hash(), "would broadcast block");
    }

    fn broadcast_transaction(&self, tx: &Transaction) {
        tracing::info!(txid = %tx.txid, "would broadcast transaction");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_broadcaster_does_not_panic() {
        let broadcaster = LoggingBroadcaster;
        broadcaster.broadcast_block(&Block::genesis());
        broadcaster.broadcast_transaction(&Transaction::coinbase("ZED-a-b-c-d-ffff", 80.0, 0));
    }
}
