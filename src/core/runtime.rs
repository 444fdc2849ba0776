use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::{
    core::agent::AgentExecutor,
    core::prompt::{build_thought, MarketSnapshot},
    error::Result,
    models::AgentConfig,
    providers::blockscout::{token_quote, PriceSource, DEFAULT_TOKEN_ADDRESS},
    providers::twitter::{posts_and_comments, SocialClient},
    providers::wallet::WalletProvider,
};

const SEPARATOR: &str = "-------------------";
const FAREWELL: &str = "Goodbye Agent!";

pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// How a loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The user typed `exit` or closed the input.
    Finished,
    /// Cancelled from outside (Ctrl-C).
    Interrupted,
}

/// Balance of `asset` on the wallet's default address. A missing wallet reads as zero.
pub async fn get_balance(wallet: Option<&dyn WalletProvider>, asset: &str) -> Result<f64> {
    match wallet {
        Some(wallet) => wallet.balance(asset).await,
        None => {
            tracing::error!("Error: Agent not initialized");
            Ok(0.0)
        }
    }
}

/// Drive `work` to completion unless `cancel` fires first, which yields `Ok(false)`.
async fn unless_cancelled<F>(cancel: &CancellationToken, work: F) -> Result<bool>
where
    F: Future<Output = Result<()>>,
{
    tokio::select! {
        _ = cancel.cancelled() => Ok(false),
        result = work => result.map(|_| true),
    }
}

pub struct Runtime {
    agent: Box<dyn AgentExecutor>,
    agent_config: AgentConfig,
    prices: Box<dyn PriceSource>,
    wallet: Option<Arc<dyn WalletProvider>>,
    social: Option<(Box<dyn SocialClient>, String)>,
    clock: Box<dyn Clock>,
    character_name: String,
    token_address: String,
    balance_asset: String,
    interval: Duration,
}

impl Runtime {
    pub fn new(
        agent: Box<dyn AgentExecutor>,
        agent_config: AgentConfig,
        prices: Box<dyn PriceSource>,
    ) -> Self {
        Runtime {
            agent,
            agent_config,
            prices,
            wallet: None,
            social: None,
            clock: Box::new(SystemClock),
            character_name: "Poggygotchi".to_string(),
            token_address: DEFAULT_TOKEN_ADDRESS.to_string(),
            balance_asset: "eth".to_string(),
            interval: Duration::from_secs(10),
        }
    }

    pub fn with_wallet(mut self, wallet: Arc<dyn WalletProvider>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    pub fn with_social(mut self, client: Box<dyn SocialClient>, username: &str) -> Self {
        self.social = Some((client, username.to_string()));
        self
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_character_name(mut self, name: &str) -> Self {
        self.character_name = name.to_string();
        self
    }

    pub fn with_token_address(mut self, address: &str) -> Self {
        self.token_address = address.to_string();
        self
    }

    pub fn with_balance_asset(mut self, asset: &str) -> Self {
        self.balance_asset = asset.to_string();
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run one message through the agent, printing every chunk as it arrives.
    pub async fn stream_response<W: Write + Send>(&self, message: &str, out: &mut W) -> Result<()> {
        let mut write_error = None;
        let mut sink = |chunk: crate::models::AgentChunk| {
            if write_error.is_some() {
                return;
            }
            if let Err(e) = writeln!(out, "{}", chunk.content())
                .and_then(|_| writeln!(out, "{}", SEPARATOR))
            {
                write_error = Some(e);
            }
        };
        self.agent
            .stream(message, &self.agent_config, &mut sink)
            .await?;

        match write_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// One autonomous iteration: observe, build the prompt, let the agent act.
    pub async fn tick<W: Write + Send>(&self, out: &mut W) -> Result<()> {
        let quote = token_quote(self.prices.as_ref(), &self.token_address).await;
        let balance = get_balance(self.wallet.as_deref(), &self.balance_asset).await?;
        let balance_usd = quote.usd_value(balance);

        writeln!(out, "ETH Price: ${:.2} USD", quote.price)?;
        writeln!(out, "ETH Decimals: {}", quote.decimals)?;
        writeln!(out, "ETH Balance: {}", balance)?;
        writeln!(out, "Wallet Balance: ${:.2} USD", balance_usd)?;

        let posts = match &self.social {
            Some((client, username)) => posts_and_comments(client.as_ref(), username).await,
            None => Vec::new(),
        };

        let thought = build_thought(
            &self.character_name,
            &MarketSnapshot {
                time: self.clock.now(),
                price: quote.price,
                balance_usd,
                posts: &posts,
            },
        );
        tracing::debug!(%thought, "Autonomous prompt");

        self.stream_response(&thought, out).await
    }

    /// Tick, sleep, repeat until cancelled. Errors inside a tick end the loop.
    pub async fn run_autonomous<W: Write + Send>(
        &self,
        out: &mut W,
        cancel: &CancellationToken,
    ) -> Result<LoopExit> {
        writeln!(out, "Starting autonomous mode...")?;
        loop {
            if cancel.is_cancelled() {
                writeln!(out, "{}", FAREWELL)?;
                return Ok(LoopExit::Interrupted);
            }

            if !unless_cancelled(cancel, self.tick(out)).await? {
                writeln!(out, "{}", FAREWELL)?;
                return Ok(LoopExit::Interrupted);
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    writeln!(out, "{}", FAREWELL)?;
                    return Ok(LoopExit::Interrupted);
                }
                _ = sleep(self.interval) => {}
            }
        }
    }

    /// Read a line, answer it, repeat until `exit`, end of input, or cancellation.
    pub async fn run_chat<R, W>(
        &self,
        input: &mut R,
        out: &mut W,
        cancel: &CancellationToken,
    ) -> Result<LoopExit>
    where
        R: AsyncBufRead + Unpin + Send,
        W: Write + Send,
    {
        writeln!(out, "Starting chat mode... Type 'exit' to end.")?;
        loop {
            if cancel.is_cancelled() {
                writeln!(out, "{}", FAREWELL)?;
                return Ok(LoopExit::Interrupted);
            }

            write!(out, "\nUser: ")?;
            out.flush()?;

            let mut line = String::new();
            let read = tokio::select! {
                _ = cancel.cancelled() => {
                    writeln!(out, "{}", FAREWELL)?;
                    return Ok(LoopExit::Interrupted);
                }
                read = input.read_line(&mut line) => read?,
            };
            if read == 0 {
                return Ok(LoopExit::Finished);
            }

            let message = line.trim_end_matches(['\r', '\n']);
            if message.to_lowercase() == "exit" {
                return Ok(LoopExit::Finished);
            }

            if !unless_cancelled(cancel, self.stream_response(message, out)).await? {
                writeln!(out, "{}", FAREWELL)?;
                return Ok(LoopExit::Interrupted);
            }
        }
    }
}
