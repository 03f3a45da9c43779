//! Miner process: polls the node for work, brute-forces a proof, submits it.

use clap::Parser;
use rayon::prelude::*;
use serde::Deserialize;
use zedovium_node::block::{now_ts, satisfies_difficulty, Block};

#[derive(Parser, Debug)]
#[command(name = "zedovium-miner", about = "Polls a node for work and submits mined blocks")]
struct Args {
    /// Base URL of the node's HTTP API.
    #[arg(long, default_value = "http://127.0.0.1:4024")]
    node_url: String,

    /// Address to receive the block reward.
    #[arg(long)]
    miner: String,

    /// How many blocks to mine before exiting; omit to run forever.
    #[arg(long)]
    blocks: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct MiningInfo {
    difficulty: u32,
    latestblock: Block,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    required_difficulty: Option<u32>,
}

const SHARD: u64 = 200_000;

fn brute_force_proof(prev_proof: u64, difficulty: u32) -> u64 {
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

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let client = reqwest::blocking::Client::new();

    let mut mined = 0u64;
    loop {
        if let Some(limit) = args.blocks {
            if mined >= limit {
                break;
            }
        }

        let info: MiningInfo = client
            .get(format!("{}/mining/info", args.node_url))
            .send()?
            .json()?;

        let mut difficulty = info.difficulty;
        let last = info.latestblock;

        loop {
            let proof_n = brute_force_proof(last.proof_n, difficulty);
            let response = client
                .post(format!("{}/mining/submitblock", args.node_url))
                .json(&serde_json::json!({
                    "index": last.index + 1,
                    "proofN": proof_n,
                    "prev_hash": last.hash(),
                    "miner_address": args.miner,
                    "timestamp": now_ts(),
                }))
                .send()?;

            if response.status().is_success() {
                tracing::info!(index = last.index + 1, proof_n, "block accepted");
                mined += 1;
                break;
            }

            let body: ErrorBody = response.json()?;
            match body.required_difficulty {
                Some(required) if required > difficulty => {
                    tracing::info!(required, "difficulty raised by guard, retrying");
                    difficulty = required;
                }
                _ => {
                    tracing::warn!(reason = %body.error, "submission rejected, refreshing work");
                    break;
                }
            }
        }
    }

    Ok(())
}
