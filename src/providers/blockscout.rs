use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::TokenQuote;

/// Wrapped ether on Base.
pub const DEFAULT_TOKEN_ADDRESS: &str = "0x4200000000000000000000000000000000000006";
pub const DEFAULT_BASE_URL: &str = "https://base.blockscout.com/api/v2";

#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_quote(&self, token_address: &str) -> Result<TokenQuote>;
}

/// Fetch a quote, substituting [`TokenQuote::FALLBACK`] on any failure.
pub async fn token_quote(source: &dyn PriceSource, token_address: &str) -> TokenQuote {
    match source.fetch_quote(token_address).await {
        Ok(quote) => quote,
        Err(e) => {
            tracing::error!(token = %token_address, error = %e, "Error getting token price");
            TokenQuote::FALLBACK
        }
    }
}

/// Blockscout serves some numeric fields as strings, others as numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(serde_json::Number),
    String(String),
}

impl NumberOrString {
    fn as_text(&self) -> String {
        match self {
            NumberOrString::Number(n) => n.to_string(),
            NumberOrString::String(s) => s.trim().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    #[serde(default)]
    exchange_rate: Option<NumberOrString>,
    #[serde(default)]
    decimals: Option<NumberOrString>,
    #[serde(default)]
    symbol: Option<String>,
}

/// Extract a quote from a `/tokens/{address}` response body.
pub fn parse_quote(body: &str) -> Result<TokenQuote> {
    let info: TokenInfo = serde_json::from_str(body)?;

    let rate = info
        .exchange_rate
        .ok_or(Error::MissingField("exchange_rate"))?
        .as_text();
    let price = rate
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
        .ok_or(Error::InvalidField {
            field: "exchange_rate",
            value: rate,
        })?;

    let decimals = info.decimals.ok_or(Error::MissingField("decimals"))?.as_text();
    let decimals = decimals.parse::<u32>().map_err(|_| Error::InvalidField {
        field: "decimals",
        value: decimals,
    })?;

    tracing::debug!(symbol = ?info.symbol, price, decimals, "Parsed token quote");
    Ok(TokenQuote { price, decimals })
}

pub struct Blockscout {
    base_url: String,
    client: reqwest::Client,
}

impl Blockscout {
    pub fn new(base_url: &str) -> Self {
        Blockscout {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn token_url(&self, token_address: &str) -> String {
        format!("{}/tokens/{}", self.base_url, token_address)
    }
}

impl Default for Blockscout {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl PriceSource for Blockscout {
    async fn fetch_quote(&self, token_address: &str) -> Result<TokenQuote> {
        let url = self.token_url(token_address);
        tracing::debug!(%url, "Requesting token info");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        parse_quote(&body)
    }
}
