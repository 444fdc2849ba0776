use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Runtime settings, read from the process environment (after `.env` is loaded).
///
/// Every field maps to the upper-cased environment variable of the same name,
/// e.g. `openai_model` is read from `OPENAI_MODEL`.
#[derive(Debug, Clone, Serialize, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing)]
    pub openai_api_key: String,
    #[default = "gpt-4o-mini"]
    pub openai_model: String,
    #[default = 10]
    pub max_agent_steps: usize,
    #[default = "CDP Agentkit Chatbot Example!"]
    pub thread_id: String,

    #[default = "wallet_data.txt"]
    pub wallet_data_file: PathBuf,
    #[default = "base-sepolia"]
    pub network_id: String,
    #[default = "https://sepolia.base.org"]
    pub rpc_url: String,

    #[default = "https://base.blockscout.com/api/v2"]
    pub blockscout_base_url: String,
    #[default = "0x4200000000000000000000000000000000000006"]
    pub token_address: String,
    #[default = "eth"]
    pub balance_asset: String,
    #[default = 10]
    pub autonomous_interval_secs: u64,

    pub social_enabled: bool,
    #[default = "poggygotchi"]
    pub twitter_username: String,
    #[serde(skip_serializing)]
    pub twitter_api_key: Option<String>,
    #[serde(skip_serializing)]
    pub twitter_api_secret: Option<String>,
    #[serde(skip_serializing)]
    pub twitter_access_token: Option<String>,
    #[serde(skip_serializing)]
    pub twitter_access_token_secret: Option<String>,

    pub character_name: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config = envy::from_env::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.openai_api_key.trim().is_empty() {
            return Err(Error::Config("OPENAI_API_KEY not set".to_string()));
        }
        if self.max_agent_steps == 0 {
            return Err(Error::Config("MAX_AGENT_STEPS must be at least 1".to_string()));
        }
        if self.social_enabled && self.twitter_credentials().is_none() {
            return Err(Error::Config(
                "SOCIAL_ENABLED requires TWITTER_API_KEY, TWITTER_API_SECRET, \
                 TWITTER_ACCESS_TOKEN and TWITTER_ACCESS_TOKEN_SECRET"
                    .to_string(),
            ));
        }
        Ok(())
    }

    pub fn autonomous_interval(&self) -> Duration {
        Duration::from_secs(self.autonomous_interval_secs)
    }

    /// The four OAuth 1.0a secrets, if all of them are present.
    pub fn twitter_credentials(&self) -> Option<TwitterCredentials> {
        Some(TwitterCredentials {
            api_key: non_empty(&self.twitter_api_key)?,
            api_secret: non_empty(&self.twitter_api_secret)?,
            access_token: non_empty(&self.twitter_access_token)?,
            access_token_secret: non_empty(&self.twitter_access_token_secret)?,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Clone)]
pub struct TwitterCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}
