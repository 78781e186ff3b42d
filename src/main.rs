use anyhow::Context;
use log::info;

mod ledger;

use ledger::{pow, BlockStore, ChainController, Keypair, MineOutcome, Transaction};

fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let data_dir = "data/ledger";
    std::fs::create_dir_all(data_dir).context("failed to create data directory")?;

    let store = BlockStore::open(data_dir, pow::DEFAULT_DIFFICULTY)?;
    let chain = ChainController::new(store);

    // Demo keypairs standing in for external wallets
    let alice = Keypair::generate();
    let bob = Keypair::generate();
    info!("Demo sender public key: {}", alice.public_key_hex());

    // Queue a couple of transfers and mine them into a block
    submit_transfer(&chain, &alice, &bob, 1.0)?;
    submit_transfer(&chain, &alice, &bob, 0.5)?;
    mine(&chain)?;

    // And another round
    submit_transfer(&chain, &bob, &alice, 0.1)?;
    submit_transfer(&chain, &bob, &alice, 2.0)?;
    mine(&chain)?;

    for block in chain.blocks()? {
        println!("\nBlock #{}:", block.index);
        println!("Hash: {}", block.hash);
        println!("Previous hash: {}", block.previous_hash);
        println!("Nonce: {}", block.nonce);
        println!("Transactions: {}", block.transactions.len());
    }

    println!("\nChain valid? {}", chain.validate_chain()?);

    Ok(())
}

fn submit_transfer(
    chain: &ChainController,
    from: &Keypair,
    to: &Keypair,
    amount: f64,
) -> anyhow::Result<()> {
    let mut transaction = Transaction::new(from.public_key_hex(), to.public_key_hex(), amount);
    transaction.sign(&from.secret_key_hex())?;

    chain.submit_transaction(transaction)?;

    Ok(())
}

fn mine(chain: &ChainController) -> anyhow::Result<()> {
    match chain.mine()? {
        MineOutcome::Mined(block) => info!("Mined block {}: {}", block.index, block.hash),
        MineOutcome::NoPendingTransactions => info!("No transactions to mine"),
    }

    Ok(())
}
