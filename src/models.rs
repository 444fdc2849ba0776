use serde::{Deserialize, Serialize};

/// Price and precision of a token, as reported by the explorer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenQuote {
    pub price: f64,
    pub decimals: u32,
}

impl TokenQuote {
    /// Used whenever a quote cannot be fetched.
    pub const FALLBACK: TokenQuote = TokenQuote {
        price: 0.0,
        decimals: 18,
    };

    /// `balance / decimals * price`. Zero decimals yields zero rather than infinity.
    pub fn usd_value(&self, balance: f64) -> f64 {
        if self.decimals == 0 {
            tracing::warn!(price = self.price, "Quote reports zero decimals, valuing balance at $0");
            return 0.0;
        }
        balance / f64::from(self.decimals) * self.price
    }
}

impl Default for TokenQuote {
    fn default() -> Self {
        Self::FALLBACK
    }
}

/// Per-process agent settings passed alongside every invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    thread_id: String,
}

impl AgentConfig {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
        }
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }
}

/// One fragment of a streamed agent response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentChunk {
    Agent(String),
    Tools(String),
}

impl AgentChunk {
    pub fn content(&self) -> &str {
        match self {
            AgentChunk::Agent(text) | AgentChunk::Tools(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub author: String,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostWithComments {
    pub post: String,
    pub post_id: String,
    pub timestamp: Option<String>,
    pub comments: Vec<Comment>,
}
