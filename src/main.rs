mod character;
mod config;
mod core;
mod credentials;
mod error;
mod logging;
mod memory;
mod models;
mod providers;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;

use crate::character::Character;
use crate::config::Config;
use crate::core::agent::build_agent;
use crate::core::mode::{choose_mode, Mode};
use crate::core::runtime::{LoopExit, Runtime};
use crate::credentials::WalletStore;
use crate::providers::blockscout::Blockscout;
use crate::providers::twitter::TwitterClient;
use crate::providers::wallet::{LocalWallet, WalletProvider};

#[derive(Debug, Parser)]
#[command(name = "poggy-agent", about = "Poggygotchi: a wallet-holding chatbot")]
struct Cli {
    /// Skip the mode prompt
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Seconds between autonomous ticks
    #[arg(long)]
    interval: Option<u64>,

    /// Where the wallet export is persisted
    #[arg(long)]
    wallet_file: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    if let Err(e) = dotenv::dotenv() {
        eprintln!("Error loading .env file: {}", e);
    }
    logging::init(cli.verbose);

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(secs) = cli.interval {
        config.autonomous_interval_secs = secs;
    }
    if let Some(path) = cli.wallet_file {
        config.wallet_data_file = path;
    }

    let character = Character::load(config.character_name.as_deref())
        .context("Failed to load character")?;

    let store = WalletStore::new(&config.wallet_data_file);
    let wallet = store
        .initialize(|data| {
            let wallet = LocalWallet::open(data, &config.network_id, &config.rpc_url)?;
            Ok(Arc::new(wallet) as Arc<dyn WalletProvider>)
        })
        .context("Failed to initialize wallet")?;

    let (agent, agent_config) = build_agent(&config, wallet.clone(), &character);

    let mut runtime = Runtime::new(
        Box::new(agent),
        agent_config,
        Box::new(Blockscout::new(&config.blockscout_base_url)),
    )
    .with_wallet(wallet)
    .with_character_name(&character.name)
    .with_token_address(&config.token_address)
    .with_balance_asset(&config.balance_asset)
    .with_interval(config.autonomous_interval());

    if config.social_enabled {
        if let Some(credentials) = config.twitter_credentials() {
            runtime = runtime.with_social(
                Box::new(TwitterClient::new(&credentials)),
                &config.twitter_username,
            );
            tracing::info!(username = %config.twitter_username, "Social activity enabled");
        }
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("Interrupt received");
            on_interrupt.cancel();
        }
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Second interrupt, exiting immediately");
            std::process::exit(0);
        }
    });

    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();

    println!("Starting Agent...");
    let mode = match cli.mode {
        Some(mode) => mode,
        None => tokio::select! {
            _ = cancel.cancelled() => {
                println!("Goodbye Agent!");
                exit_now();
            }
            mode = choose_mode(&mut stdin, &mut stdout) => mode.context("No mode selected")?,
        },
    };
    tracing::info!(?mode, "Mode selected");

    let exit = match mode {
        Mode::Chat => runtime.run_chat(&mut stdin, &mut stdout, &cancel).await?,
        Mode::Auto => runtime.run_autonomous(&mut stdout, &cancel).await?,
    };
    match exit {
        LoopExit::Finished => tracing::info!("Chat ended"),
        LoopExit::Interrupted => {
            tracing::debug!("Stopped by interrupt");
            exit_now();
        }
    }

    Ok(())
}

/// Interrupts end the process with status 0. Returning from `main` instead would
/// wait on tokio's blocking stdin reader until another line arrives.
fn exit_now() -> ! {
    let _ = std::io::stdout().flush();
    std::process::exit(0)
}
