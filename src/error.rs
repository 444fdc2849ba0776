//! Error types for the agent

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment error: {0}")]
    Env(#[from] envy::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Missing field in response: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {value}")]
    InvalidField { field: &'static str, value: String },

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Unsupported asset '{asset}' on {network}")]
    UnsupportedAsset { asset: String, network: String },

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid tool arguments for {tool}: {reason}")]
    ToolArgs { tool: &'static str, reason: String },

    #[error("Social API error: {0}")]
    Social(String),

    #[error("Input closed")]
    InputClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
