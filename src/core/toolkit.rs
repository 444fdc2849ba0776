//! Wallet operations exposed to the model as callable tools.

use std::sync::Arc;

use async_trait::async_trait;
use rig::completion::ToolDefinition;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::providers::wallet::WalletProvider;

#[async_trait]
pub trait WalletTool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn input_schema(&self) -> Value;

    async fn execute(&self, args: Value) -> Result<String>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.input_schema(),
        }
    }
}

fn parse_args<T: for<'de> Deserialize<'de>>(tool: &'static str, args: Value) -> Result<T> {
    // Some models send `null` or a JSON-encoded string instead of an object.
    let args = match args {
        Value::Null => json!({}),
        Value::String(s) => serde_json::from_str(&s).map_err(|e| Error::ToolArgs {
            tool,
            reason: e.to_string(),
        })?,
        other => other,
    };
    serde_json::from_value(args).map_err(|e| Error::ToolArgs {
        tool,
        reason: e.to_string(),
    })
}

pub struct GetWalletDetails {
    wallet: Arc<dyn WalletProvider>,
}

#[async_trait]
impl WalletTool for GetWalletDetails {
    fn name(&self) -> &'static str {
        "get_wallet_details"
    }

    fn description(&self) -> &'static str {
        "Get the details of the wallet: its id, network and default address."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, _args: Value) -> Result<String> {
        Ok(format!(
            "Wallet: {} on network: {} with default address: {}",
            self.wallet.wallet_id(),
            self.wallet.network_id(),
            self.wallet.default_address()
        ))
    }
}

#[derive(Debug, Deserialize)]
struct BalanceArgs {
    asset_id: String,
}

pub struct GetBalance {
    wallet: Arc<dyn WalletProvider>,
}

#[async_trait]
impl WalletTool for GetBalance {
    fn name(&self) -> &'static str {
        "get_balance"
    }

    fn description(&self) -> &'static str {
        "Get the balance of an asset in the wallet's default address. \
         Takes the asset id, e.g. `eth`, `usdc` or `weth`."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "asset_id": {
                    "type": "string",
                    "description": "The asset to check, e.g. 'eth', 'usdc', 'weth'"
                }
            },
            "required": ["asset_id"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let args: BalanceArgs = parse_args(self.name(), args)?;
        let balance = self.wallet.balance(&args.asset_id).await?;
        Ok(format!(
            "Balance of {} at address {}: {}",
            args.asset_id,
            self.wallet.default_address(),
            balance
        ))
    }
}

#[derive(Debug, Deserialize)]
struct TransferArgs {
    amount: String,
    asset_id: String,
    destination: String,
}

pub struct Transfer {
    wallet: Arc<dyn WalletProvider>,
}

#[async_trait]
impl WalletTool for Transfer {
    fn name(&self) -> &'static str {
        "transfer"
    }

    fn description(&self) -> &'static str {
        "Transfer an amount of an asset from the wallet to a destination address. \
         Amounts are in whole units, e.g. '0.01' eth."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "amount": {
                    "type": "string",
                    "description": "Amount to send in whole units, e.g. '0.01'"
                },
                "asset_id": {
                    "type": "string",
                    "description": "The asset to send, e.g. 'eth'"
                },
                "destination": {
                    "type": "string",
                    "description": "Destination address (0x-prefixed)"
                }
            },
            "required": ["amount", "asset_id", "destination"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let args: TransferArgs = parse_args(self.name(), args)?;
        let tx_hash = self
            .wallet
            .transfer(&args.amount, &args.asset_id, &args.destination)
            .await?;
        Ok(format!(
            "Transferred {} {} to {}. Transaction hash: {}",
            args.amount, args.asset_id, args.destination, tx_hash
        ))
    }
}

/// The set of tools bound to one wallet.
pub struct Toolkit {
    tools: Vec<Box<dyn WalletTool>>,
}

impl Toolkit {
    pub fn from_wallet(wallet: Arc<dyn WalletProvider>) -> Self {
        Toolkit {
            tools: vec![
                Box::new(GetWalletDetails {
                    wallet: wallet.clone(),
                }),
                Box::new(GetBalance {
                    wallet: wallet.clone(),
                }),
                Box::new(Transfer { wallet }),
            ],
        }
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub async fn call(&self, name: &str, args: Value) -> Result<String> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| Error::UnknownTool(name.to_string()))?;
        tracing::debug!(tool = name, %args, "Calling tool");
        tool.execute(args).await
    }
}
