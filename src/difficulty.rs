//! Global difficulty retargeting and the per-miner guard amplifier.

use crate::address::COINBASE;
use crate::block::Block;
use crate::config::DifficultyConfig;
use std::collections::HashMap;

#[derive(Debug)]
pub struct DifficultyEngine {
    config: DifficultyConfig,
    diff: u32,
    miner_windows: HashMap<String, Vec<f64>>,
}

impl DifficultyEngine {
    pub fn new(config: DifficultyConfig) -> Self {
        let diff = config.initial_difficulty.max(1);
        Self {
            config,
            diff,
            miner_windows: HashMap::new(),
        }
    }

    pub fn current(&self) -> u32 {
        self.diff
    }

    /// Fires only at chain lengths that are positive multiples of
    /// `adjustment_interval`; `diff` never drops below 1.
    pub fn retarget(&mut self, chain: &[Block]) {
        let n = chain.len() as u64;
        if n == 0 || n % self.config.adjustment_interval != 0 {
            return;
        }
        let interval = self.config.adjustment_interval;
        let last = &chain[(n - 1) as usize];
        let prev = &chain[(n - interval) as usize];
        let actual = last.timestamp - prev.timestamp;
        let expected = (self.config.block_time_target * interval) as f64;
        if actual < expected {
            self.diff += 1;
        } else if actual > expected && self.diff > 1 {
            self.diff -= 1;
        }
    }

    /// Prunes `miner`'s sliding window to `timestamp` and returns the
    /// effective difficulty demanded of them along with the multiplier that
    /// produced it. Call this before checking a submitted proof; the window
    /// is not appended to until the block is actually accepted, via
    /// `record_block`.
    pub fn prune_and_peek(&mut self, miner: &str, timestamp: f64) -> (u32, f64) {
        if miner != COINBASE {
            let window = self.miner_windows.entry(miner.to_string()).or_default();
            window.retain(|&t| timestamp - t <= self.config.guard_window_secs as f64);
        }
        self.effective_difficulty(miner)
    }

    /// Appends `timestamp` to `miner`'s window. Call exactly once per
    /// accepted block, for non-coinbase miners only (§4.4/§9).
    pub fn record_block(&mut self, miner: &str, timestamp: f64) {
        if miner != COINBASE {
            self.miner_windows.entry(miner.to_string()).or_default().push(timestamp);
        }
    }

    fn effective_difficulty(&self, miner: &str) -> (u32, f64) {
        if !self.config.guard_enabled || miner == COINBASE {
            return (self.diff, 1.0);
        }
        let count = self.miner_windows.get(miner).map(Vec::len).unwrap_or(0);
        let multiplier = if count <= self.config.guard_threshold {
            1.0
        } else {
            1.0 + 0.5 * ((count - self.config.guard_threshold) as f64)
        };
        (((self.diff as f64) * multiplier).floor() as u32, multiplier)
    }

    /// Read-only view used by `/network/checkaddrdiff`, without mutating the
    /// miner's window.
    pub fn peek_effective_difficulty(&self, miner: &str) -> (u32, f64) {
        self.effective_difficulty(miner)
    }

    pub fn threshold(&self) -> usize {
        self.config.guard_threshold
    }

    pub fn window_secs(&self) -> u64 {
        self.config.guard_window_secs
    }

    pub fn guard_enabled(&self) -> bool {
        self.config.guard_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Transaction;

    fn block_at(index: u64, timestamp: f64) -> Block {
        Block {
            index,
            proof_n: 0,
            prev_hash: "0".to_string(),
            transactions: Vec::<Transaction>::new(),
            timestamp,
        }
    }

    #[test]
    fn retarget_only_fires_on_multiples_of_the_interval() {
        let config = DifficultyConfig {
            adjustment_interval: 12,
            block_time_target: 300,
            ..DifficultyConfig::default()
        };
        let mut engine = DifficultyEngine::new(config);
        let chain: Vec<Block> = (0..11).map(|i| block_at(i, i as f64 * 300.0)).collect();
        engine.retarget(&chain);
        assert_eq!(engine.current(), 1);
    }

    #[test]
    fn faster_than_expected_increments_difficulty() {
        let config = DifficultyConfig {
            adjustment_interval: 12,
            block_time_target: 300,
            ..DifficultyConfig::default()
        };
        let mut engine = DifficultyEngine::new(config);
        let chain: Vec<Block> = (0..12).map(|i| block_at(i, i as f64 * 150.0)).collect();
        engine.retarget(&chain);
        assert_eq!(engine.current(), 2);
    }

    #[test]
    fn difficulty_never_drops_below_one() {
        let config = DifficultyConfig {
            adjustment_interval: 12,
            block_time_target: 300,
            initial_difficulty: 1,
            ..DifficultyConfig::default()
        };
        let mut engine = DifficultyEngine::new(config);
        let chain: Vec<Block> = (0..12).map(|i| block_at(i, i as f64 * 1000.0)).collect();
        engine.retarget(&chain);
        assert_eq!(engine.current(), 1);
    }

    #[test]
    fn guard_off_gives_every_miner_the_global_difficulty() {
        let config = DifficultyConfig {
            guard_enabled: false,
            ..DifficultyConfig::default()
        };
        let mut engine = DifficultyEngine::new(config);
        for i in 0..20 {
            engine.prune_and_peek("M", i as f64);
            engine.record_block("M", i as f64);
        }
        assert_eq!(engine.prune_and_peek("M", 20.0), (1, 1.0));
    }

    #[test]
    fn guard_amplifies_a_miner_exceeding_the_threshold_within_the_window() {
        let config = DifficultyConfig {
            guard_enabled: true,
            guard_threshold: 10,
            guard_window_secs: 300,
            initial_difficulty: 1,
            ..DifficultyConfig::default()
        };
        let mut engine = DifficultyEngine::new(config);
        for i in 0..13 {
            engine.prune_and_peek("M", i as f64);
            engine.record_block("M", i as f64);
        }
        // 13 prior accepted blocks sit in the window; the 14th submission is
        // judged against that count, not 14.
        let (difficulty, multiplier) = engine.prune_and_peek("M", 13.0);
        assert_eq!(multiplier, 2.5);
        assert_eq!(difficulty, 2);
    }

    #[test]
    fn coinbase_is_never_amplified() {
        let config = DifficultyConfig {
            guard_enabled: true,
            guard_threshold: 0,
            ..DifficultyConfig::default()
        };
        let mut engine = DifficultyEngine::new(config);
        assert_eq!(engine.prune_and_peek(COINBASE, 0.0), (1, 1.0));
    }
}
