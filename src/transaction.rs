//! Transactions and the polymorphic sender they carry.

use crate::address::COINBASE;
use crate::block::now_ts;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha512};
use std::fmt;

/// Tagged sender so a coinbase transaction can never accidentally be run
/// through ownership or balance checks meant for an external address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sender {
    Coinbase,
    External(String),
}

impl Sender {
    pub fn as_str(&self) -> &str {
        match self {
            Sender::Coinbase => COINBASE,
            Sender::External(addr) => addr,
        }
    }
}

impl From<String> for Sender {
    fn from(s: String) -> Self {
        if s == COINBASE {
            Sender::Coinbase
        } else {
            Sender::External(s)
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Sender {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Sender {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Sender::from(raw))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: Sender,
    pub recipient: String,
    pub quantity: f64,
    pub fee: f64,
    pub fee_percent: f64,
    pub txid: String,
    pub timestamp: f64,
}

impl Transaction {
    /// A content-independent id: a 512-bit digest of the admission timestamp
    /// concatenated with the chain length at admission time. Two
    /// transactions admitted in the same instant against the same chain
    /// length are indistinguishable by this scheme, which is why the
    /// mempool still checks for txid collisions on `add`.
    pub fn compute_txid(timestamp: f64, chain_len: u64) -> String {
        let payload = format!("{timestamp}{chain_len}");
        hex::encode(Sha512::digest(payload.as_bytes()))
    }

    pub fn coinbase(recipient: &str, quantity: f64, chain_len: u64) -> Self {
        let timestamp = now_ts();
        Self {
            sender: Sender::Coinbase,
            recipient: recipient.to_string(),
            quantity,
            fee: 0.0,
            fee_percent: 0.0,
            txid: Self::compute_txid(timestamp, chain_len),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coinbase_sender_round_trips_through_json_as_node() {
        let tx = Transaction::coinbase("ZED-a-b-c-d-ffff", 80.0, 0);
        let encoded = serde_json::to_string(&tx).unwrap();
        assert!(encoded.contains("\"node\""));
        let decoded: Transaction = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.sender, Sender::Coinbase);
    }

    #[test]
    fn external_sender_round_trips_as_its_address() {
        let sender = Sender::from("ZED-a-b-c-d-ffff".to_string());
        assert_eq!(sender, Sender::External("ZED-a-b-c-d-ffff".to_string()));
        assert_eq!(sender.as_str(), "ZED-a-b-c-d-ffff");
    }

    #[test]
    fn txid_is_deterministic_for_identical_inputs() {
        let a = Transaction::compute_txid(123.0, 4);
        let b = Transaction::compute_txid(123.0, 4);
        assert_eq!(a, b);
    }
}
