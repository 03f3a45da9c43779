//! Wallet CLI: a thin HTTP client over the node's API. Owns no consensus
//! logic of its own.

use clap::{Parser, Subcommand};
use zedovium_node::address;

#[derive(Parser, Debug)]
#[command(name = "zedovium-wallet", about = "Create addresses and send transactions")]
struct Args {
    /// Base URL of the node's HTTP API.
    #[arg(long, default_value = "http://127.0.0.1:4024")]
    node_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generates a new address and seed locally, no network round trip.
    Create,
    /// Re-derives the address for an existing seed.
    Import { seed: String },
    /// Looks up an address's balance.
    Balance { address: String },
    /// Sends `amount` from the address owning `sender_seed` to `recipient`.
    Send {
        sender_seed: String,
        recipient: String,
        amount: f64,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let client = reqwest::blocking::Client::new();

    match args.command {
        Command::Create => {
            let generated = address::generate(None);
            println!("address: {}", generated.address);
            println!("seed:    {}", generated.seed);
        }
        Command::Import { seed } => {
            let generated = address::generate(Some(seed));
            println!("address: {}", generated.address);
        }
        Command::Balance { address } => {
            let url = format!("{}/wallet/balance/{}", args.node_url, address);
            let response = client.get(&url).send()?;
            println!("{}", response.text()?);
        }
        Command::Send {
            sender_seed,
            recipient,
            amount,
        } => {
            let sender = address::generate(Some(sender_seed.clone())).address;
            let url = format!("{}/transaction/create", args.node_url);
            let response = client
                .post(&url)
                .json(&serde_json::json!({
                    "sender": sender,
                    "recipient": recipient,
                    "amount": amount,
                    "seed": sender_seed,
                }))
                .send()?;
            println!("{}", response.text()?);
        }
    }

    Ok(())
}
