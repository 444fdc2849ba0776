//! Wallet access for the agent.
//!
//! `WalletProvider` is the contract the rest of the crate relies on: export the
//! serialized state, report balances, move funds. `LocalWallet` implements it
//! with a locally held key and plain JSON-RPC calls.

use std::str::FromStr;

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::utils::{format_units, parse_units};
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn wallet_id(&self) -> &str;

    fn network_id(&self) -> &str;

    /// The zeroth address of the wallet.
    fn default_address(&self) -> String;

    /// Serialized wallet state, suitable for handing back to the constructor.
    fn export(&self) -> Result<String>;

    /// Balance of `asset` held by the default address, in whole units.
    async fn balance(&self, asset: &str) -> Result<f64>;

    /// Send `amount` (whole units) of `asset` to `destination`. Returns the transaction hash.
    async fn transfer(&self, amount: &str, asset: &str, destination: &str) -> Result<String>;
}

/// Serialized form of a `LocalWallet`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletData {
    pub wallet_id: String,
    pub seed: String,
    pub network_id: String,
}

struct KnownToken {
    address: &'static str,
    decimals: u8,
}

fn known_token(network_id: &str, asset: &str) -> Option<KnownToken> {
    match (network_id, asset) {
        ("base-mainnet", "usdc") => Some(KnownToken {
            address: "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913",
            decimals: 6,
        }),
        ("base-sepolia", "usdc") => Some(KnownToken {
            address: "0x036cbd53842c5426634e7929541ec2318f3dcf7e",
            decimals: 6,
        }),
        ("base-mainnet" | "base-sepolia", "weth") => Some(KnownToken {
            address: "0x4200000000000000000000000000000000000006",
            decimals: 18,
        }),
        _ => None,
    }
}

/// A single-key wallet talking to one JSON-RPC endpoint.
pub struct LocalWallet {
    wallet_id: String,
    network_id: String,
    signer: PrivateKeySigner,
    address: Address,
    rpc_url: String,
}

impl LocalWallet {
    /// Create a wallet with a fresh random key.
    pub fn create(network_id: &str, rpc_url: &str) -> Self {
        let signer = PrivateKeySigner::random();
        Self::from_signer(uuid::Uuid::new_v4().to_string(), network_id, signer, rpc_url)
    }

    /// Restore a wallet from the output of [`WalletProvider::export`].
    pub fn import(wallet_data: &str, rpc_url: &str) -> Result<Self> {
        let data: WalletData = serde_json::from_str(wallet_data)
            .map_err(|e| Error::Wallet(format!("Invalid wallet data: {}", e)))?;
        let seed = data.seed.strip_prefix("0x").unwrap_or(&data.seed);
        let signer: PrivateKeySigner = seed
            .parse()
            .map_err(|e| Error::Wallet(format!("Invalid wallet seed: {}", e)))?;
        Ok(Self::from_signer(data.wallet_id, &data.network_id, signer, rpc_url))
    }

    /// Import persisted state if there is any, otherwise create a new wallet.
    pub fn open(wallet_data: Option<&str>, network_id: &str, rpc_url: &str) -> Result<Self> {
        match wallet_data {
            Some(data) => {
                let wallet = Self::import(data, rpc_url)?;
                if wallet.network_id != network_id {
                    tracing::warn!(
                        persisted = %wallet.network_id,
                        configured = %network_id,
                        "Persisted wallet belongs to a different network; keeping the persisted one"
                    );
                }
                Ok(wallet)
            }
            None => {
                tracing::info!(network = %network_id, "No persisted wallet, creating a new one");
                Ok(Self::create(network_id, rpc_url))
            }
        }
    }

    fn from_signer(
        wallet_id: String,
        network_id: &str,
        signer: PrivateKeySigner,
        rpc_url: &str,
    ) -> Self {
        let address = signer.address();
        Self {
            wallet_id,
            network_id: network_id.to_string(),
            signer,
            address,
            rpc_url: rpc_url.to_string(),
        }
    }

    fn rpc_endpoint(&self) -> Result<reqwest::Url> {
        self.rpc_url
            .parse()
            .map_err(|e| Error::Config(format!("Invalid RPC URL {}: {}", self.rpc_url, e)))
    }

    async fn native_balance(&self) -> Result<f64> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_endpoint()?);
        let balance = provider
            .get_balance(self.address)
            .await
            .map_err(|e| Error::Wallet(format!("Failed to get balance: {}", e)))?;
        to_whole_units(balance, 18)
    }

    async fn token_balance(&self, token: &KnownToken) -> Result<f64> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_endpoint()?);
        let token_addr = Address::from_str(token.address)
            .map_err(|e| Error::Wallet(format!("Invalid token address: {}", e)))?;

        // balanceOf(address): selector + address left-padded to 32 bytes
        let mut calldata = vec![0x70, 0xa0, 0x82, 0x31];
        calldata.extend_from_slice(&[0u8; 12]);
        calldata.extend_from_slice(self.address.as_slice());

        let tx = TransactionRequest::default()
            .to(token_addr)
            .input(Bytes::from(calldata).into());

        let result = provider
            .call(tx)
            .await
            .map_err(|e| Error::Wallet(format!("Failed to get token balance: {}", e)))?;

        let balance = if result.len() >= 32 {
            U256::from_be_slice(&result[..32])
        } else {
            U256::ZERO
        };
        to_whole_units(balance, token.decimals)
    }
}

fn to_whole_units(value: U256, decimals: u8) -> Result<f64> {
    let formatted = format_units(value, decimals)
        .map_err(|e| Error::Wallet(format!("Failed to format balance: {}", e)))?;
    formatted.parse::<f64>().map_err(|_| Error::InvalidField {
        field: "balance",
        value: formatted,
    })
}

fn parse_amount(amount: &str, decimals: u8) -> Result<U256> {
    let amount = amount.trim();
    if amount.starts_with('-') {
        return Err(Error::InvalidField {
            field: "amount",
            value: amount.to_string(),
        });
    }
    let value = parse_units(amount, decimals)
        .map_err(|_| Error::InvalidField {
            field: "amount",
            value: amount.to_string(),
        })?
        .get_absolute();
    if value.is_zero() {
        return Err(Error::InvalidField {
            field: "amount",
            value: amount.to_string(),
        });
    }
    Ok(value)
}

#[async_trait]
impl WalletProvider for LocalWallet {
    fn wallet_id(&self) -> &str {
        &self.wallet_id
    }

    fn network_id(&self) -> &str {
        &self.network_id
    }

    fn default_address(&self) -> String {
        self.address.to_string()
    }

    fn export(&self) -> Result<String> {
        let data = WalletData {
            wallet_id: self.wallet_id.clone(),
            seed: alloy::primitives::hex::encode_prefixed(self.signer.to_bytes()),
            network_id: self.network_id.clone(),
        };
        Ok(serde_json::to_string(&data)?)
    }

    async fn balance(&self, asset: &str) -> Result<f64> {
        let asset = asset.to_lowercase();
        if asset == "eth" {
            return self.native_balance().await;
        }
        match known_token(&self.network_id, &asset) {
            Some(token) => self.token_balance(&token).await,
            None => Err(Error::UnsupportedAsset {
                asset,
                network: self.network_id.clone(),
            }),
        }
    }

    async fn transfer(&self, amount: &str, asset: &str, destination: &str) -> Result<String> {
        if !asset.eq_ignore_ascii_case("eth") {
            return Err(Error::UnsupportedAsset {
                asset: asset.to_string(),
                network: self.network_id.clone(),
            });
        }
        let value = parse_amount(amount, 18)?;
        let to = Address::from_str(destination.trim()).map_err(|_| Error::InvalidField {
            field: "destination",
            value: destination.to_string(),
        })?;

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(self.signer.clone()))
            .connect_http(self.rpc_endpoint()?);

        let tx = TransactionRequest::default().with_to(to).with_value(value);

        tracing::info!(%to, amount, network = %self.network_id, "Sending transfer");
        let pending = provider
            .send_transaction(tx)
            .await
            .map_err(|e| Error::Wallet(format!("Failed to send transaction: {}", e)))?;
        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| Error::Wallet(format!("Failed to confirm transaction: {}", e)))?;

        Ok(format!("{:?}", receipt.transaction_hash))
    }
}

// The signer never shows up in logs.
impl std::fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWallet")
            .field("wallet_id", &self.wallet_id)
            .field("network_id", &self.network_id)
            .field("address", &self.address)
            .field("signer", &"[REDACTED]")
            .finish()
    }
}
