//! The node façade: the single lock-guarded aggregate of chain, mempool,
//! balances and difficulty, and every operation the HTTP boundary calls.

use crate::address;
use crate::block::{now_ts, satisfies_difficulty, Block};
use crate::chain::{build_hash_index, replay_balances, ChainStore};
use crate::config::Config;
use crate::difficulty::DifficultyEngine;
use crate::error::NodeError;
use crate::mempool::Mempool;
use crate::network::{Broadcaster, LoggingBroadcaster};
use crate::transaction::{Sender, Transaction};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

struct NodeState {
    chain: Vec<Block>,
    hash_index: HashMap<String, usize>,
    balances: HashMap<String, f64>,
    mempool: Mempool,
    difficulty: DifficultyEngine,
}

pub struct Node {
    config: Config,
    store: ChainStore,
    state: RwLock<NodeState>,
    broadcaster: Box<dyn Broadcaster>,
}

#[derive(Debug, Serialize)]
pub struct CreateTransactionReceipt {
    pub txid: String,
    pub fee: f64,
}

#[derive(Debug, Serialize)]
pub struct NetworkInfo {
    pub height: u64,
    pub total_supply: f64,
    pub difficulty: u32,
    pub block_reward: f64,
    pub node_count: u32,
    pub threshold: usize,
    pub window: u64,
    pub zedoguard: bool,
}

#[derive(Debug, Serialize)]
pub struct MiningInfo {
    pub difficulty: u32,
    pub latestblock: Block,
}

#[derive(Debug, Serialize)]
pub struct FeeEstimate {
    pub fee_percent: f64,
    pub mempool_fullness: f64,
    pub pending_count: usize,
    pub aggregate_fees: f64,
}

#[derive(Debug, Serialize)]
pub struct MempoolInfo {
    pub size: usize,
    pub max_size: usize,
    pub block_tx_limit: usize,
    pub current_fee_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionContext {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub block_index: u64,
}

impl Node {
    pub fn new(config: Config) -> Result<Self, NodeError> {
        let store = ChainStore::new(config.chain_file());
        let chain = store.load_or_genesis()?;
        let hash_index = build_hash_index(&chain);
        let balances = replay_balances(&chain, &config.economics.fee_recipient);
        let mempool = Mempool::new(config.mempool.clone());
        let difficulty = DifficultyEngine::new(config.difficulty.clone());

        Ok(Self {
            config,
            store,
            state: RwLock::new(NodeState {
                chain,
                hash_index,
                balances,
                mempool,
                difficulty,
            }),
            broadcaster: Box::new(LoggingBroadcaster),
        })
    }

    /// §4.5 transaction admission pipeline.
    pub fn create_transaction(
        &self,
        sender: &str,
        recipient: &str,
        quantity: f64,
        seed: &str,
    ) -> Result<CreateTransactionReceipt, NodeError> {
        if !address::validate(recipient) {
            return Err(NodeError::InvalidAddress(recipient.to_string()));
        }
        let sender_tag = Sender::from(sender.to_string());
        if let Sender::External(addr) = &sender_tag {
            if !address::validate(addr) {
                return Err(NodeError::InvalidAddress(addr.clone()));
            }
            if !address::verify_ownership(addr, seed) {
                return Err(NodeError::Unauthorized);
            }
        }

        let mut state = self.state.write();
        let fee_percent = state.mempool.current_fee_percent();
        let fee = match &sender_tag {
            Sender::Coinbase => 0.0,
            Sender::External(_) => quantity * fee_percent,
        };

        if let Sender::External(addr) = &sender_tag {
            let pending = state.mempool.pending_spends(addr);
            let balance = state.balances.get(addr).copied().unwrap_or(0.0);
            if balance - pending < quantity {
                return Err(NodeError::InsufficientFunds);
            }
        }

        if let Sender::External(addr) = &sender_tag {
            *state.balances.entry(addr.clone()).or_insert(0.0) -= quantity + fee;
        }
        *state.balances.entry(recipient.to_string()).or_insert(0.0) += quantity;

        let timestamp = now_ts();
        let chain_len = state.chain.len() as u64;
        let txid = Transaction::compute_txid(timestamp, chain_len);
        let tx = Transaction {
            sender: sender_tag.clone(),
            recipient: recipient.to_string(),
            quantity,
            fee,
            fee_percent,
            txid: txid.clone(),
            timestamp,
        };

        if let Err(err) = state.mempool.add(tx.clone()) {
            if let Sender::External(addr) = &sender_tag {
                *state.balances.entry(addr.clone()).or_insert(0.0) += quantity + fee;
            }
            *state.balances.entry(recipient.to_string()).or_insert(0.0) -= quantity;
            return Err(err);
        }

        drop(state);
        self.broadcaster.broadcast_transaction(&tx);
        Ok(CreateTransactionReceipt { txid, fee })
    }

    /// §4.6: brute-forces a proof against the current global difficulty
    /// without holding the core lock, then constructs and appends the block.
    pub fn mine_block(&self, miner: &str) -> Result<Block, NodeError> {
        let (last_proof_n, last_index, difficulty) = {
            let state = self.state.read();
            let last = state.chain.last().expect("chain always has a genesis block");
            (last.proof_n, last.index, state.difficulty.current())
        };

        let proof_n = brute_force_proof(last_proof_n, difficulty);

        let mut state = self.state.write();
        let last = state.chain.last().expect("chain always has a genesis block").clone();
        if last.index != last_index {
            return Err(NodeError::InvalidIndex);
        }
        let timestamp = now_ts().max(last.timestamp + f64::EPSILON);
        let chain_len = state.chain.len() as u64;
        let coinbase_tx = Transaction::coinbase(miner, self.config.economics.block_reward, chain_len);
        let block = self.construct_block(&mut state, last.index + 1, proof_n, last.hash(), coinbase_tx, timestamp);
        let snapshot = state.chain.clone();
        drop(state);
        self.store.persist(&snapshot)?;
        self.broadcaster.broadcast_block(&block);
        Ok(block)
    }

    /// §4.7: validates an externally-submitted proof and, if it holds,
    /// constructs and appends the block.
    pub fn submit_mined_block(
        &self,
        index: u64,
        proof_n: u64,
        prev_hash: String,
        miner: &str,
        timestamp: f64,
    ) -> Result<Block, NodeError> {
        let mut state = self.state.write();
        let last = state.chain.last().expect("chain always has a genesis block").clone();

        if index != last.index + 1 {
            return Err(NodeError::InvalidIndex);
        }
        if prev_hash != last.hash() {
            return Err(NodeError::InvalidPrevHash);
        }
        if timestamp <= last.timestamp {
            return Err(NodeError::InvalidTimestamp);
        }

        let (required, multiplier) = state.difficulty.prune_and_peek(miner, timestamp);
        if !satisfies_difficulty(last.proof_n, proof_n, required) {
            return Err(NodeError::LowDifficulty { required, multiplier });
        }
        state.difficulty.record_block(miner, timestamp);

        let chain_len = state.chain.len() as u64;
        let coinbase_tx = Transaction::coinbase(miner, self.config.economics.block_reward, chain_len);
        let block = self.construct_block(&mut state, index, proof_n, prev_hash, coinbase_tx, timestamp);
        let snapshot = state.chain.clone();
        drop(state);
        self.store.persist(&snapshot)?;
        self.broadcaster.broadcast_block(&block);
        Ok(block)
    }

    /// Shared tail of §4.6/§4.7: gathers mempool candidates, credits fees and
    /// the coinbase reward, appends the block, updates the hash index,
    /// retargets, and prunes confirmed transactions from the mempool.
    fn construct_block(
        &self,
        state: &mut NodeState,
        index: u64,
        proof_n: u64,
        prev_hash: String,
        coinbase_tx: Transaction,
        timestamp: f64,
    ) -> Block {
        let candidates = state.mempool.block_candidates();
        let fee_sum: f64 = candidates.iter().map(|tx| tx.fee).sum();
        if fee_sum != 0.0 {
            *state
                .balances
                .entry(self.config.economics.fee_recipient.clone())
                .or_insert(0.0) += fee_sum;
        }
        *state.balances.entry(coinbase_tx.recipient.clone()).or_insert(0.0) += coinbase_tx.quantity;

        let mut transactions = vec![coinbase_tx];
        transactions.extend(candidates);
        let confirmed: HashSet<String> = transactions.iter().map(|tx| tx.txid.clone()).collect();

        let block = Block {
            index,
            proof_n,
            prev_hash,
            transactions,
            timestamp,
        };
        state.chain.push(block.clone());
        let position = state.chain.len() - 1;
        state.hash_index.insert(block.hash(), position);
        state.difficulty.retarget(&state.chain);
        state.mempool.remove_confirmed(&confirmed);
        block
    }

    pub fn balance(&self, addr: &str) -> f64 {
        self.state.read().balances.get(addr).copied().unwrap_or(0.0)
    }

    pub fn latest_block(&self) -> Block {
        self.state.read().chain.last().expect("chain always has a genesis block").clone()
    }

    pub fn chain(&self) -> Vec<Block> {
        self.state.read().chain.clone()
    }

    pub fn chain_len(&self) -> u64 {
        self.state.read().chain.len() as u64
    }

    pub fn block_by_index(&self, index: u64) -> Result<Block, NodeError> {
        self.state
            .read()
            .chain
            .get(index as usize)
            .cloned()
            .ok_or(NodeError::InvalidIndex)
    }

    pub fn recent_blocks(&self, count: usize) -> Vec<Block> {
        let state = self.state.read();
        state.chain.iter().rev().take(count).cloned().collect()
    }

    pub fn block_by_hash(&self, hash: &str) -> Option<Block> {
        let state = self.state.read();
        state.hash_index.get(hash).and_then(|&i| state.chain.get(i)).cloned()
    }

    pub fn transaction_by_id(&self, txid: &str) -> Option<TransactionContext> {
        let state = self.state.read();
        state.chain.iter().find_map(|block| {
            block
                .transactions
                .iter()
                .find(|tx| tx.txid == txid)
                .map(|tx| TransactionContext {
                    transaction: tx.clone(),
                    block_index: block.index,
                })
        })
    }

    pub fn transactions_by_address(&self, addr: &str) -> Vec<TransactionContext> {
        let state = self.state.read();
        state
            .chain
            .iter()
            .flat_map(|block| {
                block
                    .transactions
                    .iter()
                    .filter(|tx| tx.sender.as_str() == addr || tx.recipient == addr)
                    .map(|tx| TransactionContext {
                        transaction: tx.clone(),
                        block_index: block.index,
                    })
            })
            .collect()
    }

    pub fn recent_transactions(&self, count: usize) -> Vec<TransactionContext> {
        let state = self.state.read();
        state
            .chain
            .iter()
            .rev()
            .flat_map(|block| {
                block.transactions.iter().rev().map(|tx| TransactionContext {
                    transaction: tx.clone(),
                    block_index: block.index,
                })
            })
            .take(count)
            .collect()
    }

    pub fn total_supply(&self) -> f64 {
        self.state.read().balances.values().filter(|&&v| v > 0.0).sum()
    }

    /// `2^difficulty / avg_block_time` over the last up-to-60 blocks.
    pub fn hashrate(&self) -> f64 {
        let state = self.state.read();
        let n = state.chain.len();
        if n < 2 {
            return 0.0;
        }
        let window = n.min(60);
        let slice = &state.chain[n - window..];
        let span = slice.last().unwrap().timestamp - slice.first().unwrap().timestamp;
        let avg_block_time = span / (slice.len() as f64 - 1.0);
        if avg_block_time <= 0.0 {
            return 0.0;
        }
        2f64.powi(state.difficulty.current() as i32) / avg_block_time
    }

    pub fn fee_estimate(&self) -> FeeEstimate {
        let state = self.state.read();
        FeeEstimate {
            fee_percent: state.mempool.current_fee_percent(),
            mempool_fullness: state.mempool.len() as f64 / self.config.mempool.max_size as f64,
            pending_count: state.mempool.len(),
            aggregate_fees: state.mempool.transactions().iter().map(|tx| tx.fee).sum(),
        }
    }

    /// Read-only: the effective difficulty a miner would be held to right
    /// now, without mutating their guard window.
    pub fn checkaddrdiff(&self, addr: &str) -> (u32, f64) {
        self.state.read().difficulty.peek_effective_difficulty(addr)
    }

    pub fn mempool_info(&self) -> MempoolInfo {
        let state = self.state.read();
        MempoolInfo {
            size: state.mempool.len(),
            max_size: self.config.mempool.max_size,
            block_tx_limit: self.config.mempool.block_tx_limit,
            current_fee_percent: state.mempool.current_fee_percent(),
        }
    }

    pub fn mempool_transactions(&self, count: usize) -> Vec<Transaction> {
        let state = self.state.read();
        state.mempool.transactions().iter().take(count.min(1000)).cloned().collect()
    }

    pub fn mining_info(&self) -> MiningInfo {
        let state = self.state.read();
        MiningInfo {
            difficulty: state.difficulty.current(),
            latestblock: state.chain.last().expect("chain always has a genesis block").clone(),
        }
    }

    pub fn network_info(&self) -> NetworkInfo {
        let state = self.state.read();
        NetworkInfo {
            height: state.chain.len() as u64,
            total_supply: state.balances.values().filter(|&&v| v > 0.0).sum(),
            difficulty: state.difficulty.current(),
            block_reward: self.config.economics.block_reward,
            node_count: 1,
            threshold: state.difficulty.threshold(),
            window: state.difficulty.window_secs(),
            zedoguard: state.difficulty.guard_enabled(),
        }
    }
}

/// Brute-force search for a nonce satisfying the proof rule, sharded and
/// searched in parallel so the core lock is never held for the duration.
fn brute_force_proof(prev_proof: u64, difficulty: u32) -> u64 {
    use rayon::prelude::*;
    const SHARD: u64 = 200_000;
    let mut start = 0u64;
    loop {
        let found = (start..start + SHARD)
            .into_par_iter()
            .find_any(|&candidate| satisfies_difficulty(prev_proof, candidate, difficulty));
        if let Some(candidate) = found {
            return candidate;
        }
        start += SHARD;
    }
}
