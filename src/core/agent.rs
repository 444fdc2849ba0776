use std::sync::Arc;

use async_trait::async_trait;
use rig::completion::{CompletionModel, Message, ModelChoice, ToolDefinition};
use rig::providers::openai;
use serde_json::Value;

use crate::character::Character;
use crate::config::Config;
use crate::core::toolkit::Toolkit;
use crate::error::{Error, Result};
use crate::memory::{assistant_message, user_message, ConversationMemory};
use crate::models::{AgentChunk, AgentConfig};
use crate::providers::wallet::WalletProvider;

/// Something that answers a message, emitting fragments as they are produced.
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    async fn stream(
        &self,
        message: &str,
        config: &AgentConfig,
        sink: &mut (dyn FnMut(AgentChunk) + Send),
    ) -> Result<()>;
}

/// What the model decided to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Answer(String),
    ToolCall { name: String, args: Value },
}

pub struct StepRequest<'a> {
    pub prompt: &'a str,
    pub preamble: &'a str,
    pub history: &'a [Message],
    pub tools: Vec<ToolDefinition>,
}

#[async_trait]
pub trait ReasoningModel: Send + Sync {
    async fn next_step(&self, request: StepRequest<'_>) -> Result<Step>;
}

/// Adapter from a rig completion model.
pub struct RigModel<M: CompletionModel> {
    model: M,
    temperature: f64,
}

impl<M: CompletionModel> RigModel<M> {
    pub fn new(model: M) -> Self {
        RigModel {
            model,
            temperature: 0.7,
        }
    }
}

#[async_trait]
impl<M> ReasoningModel for RigModel<M>
where
    M: CompletionModel + 'static,
{
    async fn next_step(&self, request: StepRequest<'_>) -> Result<Step> {
        let response = self
            .model
            .completion_request(request.prompt)
            .preamble(request.preamble.to_string())
            .messages(request.history.to_vec())
            .tools(request.tools)
            .temperature(self.temperature)
            .send()
            .await
            .map_err(|e| Error::Agent(e.to_string()))?;

        Ok(match response.choice {
            ModelChoice::Message(text) => Step::Answer(text),
            ModelChoice::ToolCall(name, args) => Step::ToolCall { name, args },
        })
    }
}

/// Reason-act loop: ask the model, run the tools it picks, feed results back
/// until it answers.
pub struct ReactAgent<R: ReasoningModel> {
    model: R,
    preamble: String,
    toolkit: Toolkit,
    memory: ConversationMemory,
    max_steps: usize,
}

impl<R: ReasoningModel> ReactAgent<R> {
    pub fn new(
        model: R,
        preamble: &str,
        toolkit: Toolkit,
        memory: ConversationMemory,
        max_steps: usize,
    ) -> Self {
        ReactAgent {
            model,
            preamble: preamble.to_string(),
            toolkit,
            memory,
            max_steps,
        }
    }

    #[cfg(test)]
    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }
}

#[async_trait]
impl<R: ReasoningModel> AgentExecutor for ReactAgent<R> {
    async fn stream(
        &self,
        message: &str,
        config: &AgentConfig,
        sink: &mut (dyn FnMut(AgentChunk) + Send),
    ) -> Result<()> {
        let thread_id = config.thread_id();
        let mut history = self.memory.history(thread_id);
        let prior = history.len();
        let mut prompt = message.to_string();

        for step in 1..=self.max_steps {
            let next = self
                .model
                .next_step(StepRequest {
                    prompt: &prompt,
                    preamble: &self.preamble,
                    history: &history,
                    tools: self.toolkit.definitions(),
                })
                .await?;

            match next {
                Step::Answer(text) => {
                    sink(AgentChunk::Agent(text.clone()));

                    let mut exchange = history.split_off(prior);
                    exchange.push(user_message(&prompt));
                    exchange.push(assistant_message(&text));
                    self.memory.append_exchange(thread_id, exchange);
                    tracing::debug!(
                        thread_id,
                        step,
                        turns = self.memory.turns(thread_id),
                        "Agent answered"
                    );
                    return Ok(());
                }
                Step::ToolCall { name, args } => {
                    tracing::info!(thread_id, step, tool = %name, "Agent called a tool");
                    let output = match self.toolkit.call(&name, args.clone()).await {
                        Ok(output) => output,
                        Err(e) => {
                            tracing::warn!(tool = %name, error = %e, "Tool call failed");
                            format!("Error calling {}: {}", name, e)
                        }
                    };
                    sink(AgentChunk::Tools(output.clone()));

                    history.push(user_message(&prompt));
                    history.push(assistant_message(&format!(
                        "Calling tool {} with arguments {}",
                        name, args
                    )));
                    prompt = format!("Tool {} returned: {}", name, output);
                }
            }
        }

        Err(Error::Agent(format!(
            "No answer after {} steps",
            self.max_steps
        )))
    }
}

/// Assemble the production agent and the config that must accompany every call.
pub fn build_agent(
    config: &Config,
    wallet: Arc<dyn WalletProvider>,
    character: &Character,
) -> (ReactAgent<RigModel<openai::CompletionModel>>, AgentConfig) {
    let client = openai::Client::new(&config.openai_api_key);
    let model = RigModel::new(client.completion_model(&config.openai_model));

    let toolkit = Toolkit::from_wallet(wallet);
    tracing::info!(
        model = %config.openai_model,
        tools = ?toolkit.names(),
        character = %character.name,
        "Agent initialized"
    );

    let agent = ReactAgent::new(
        model,
        &character.prompt,
        toolkit,
        ConversationMemory::new(),
        config.max_agent_steps,
    );
    (agent, AgentConfig::new(config.thread_id.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct Seen {
        prompt: String,
        history_len: usize,
        tools: usize,
    }

    struct ScriptedModel {
        steps: Mutex<VecDeque<Step>>,
        seen: Mutex<Vec<Seen>>,
    }

    impl ScriptedModel {
        fn new(steps: Vec<Step>) -> Self {
            ScriptedModel {
                steps: Mutex::new(steps.into()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ReasoningModel for ScriptedModel {
        async fn next_step(&self, request: StepRequest<'_>) -> Result<Step> {
            self.seen.lock().unwrap().push(Seen {
                prompt: request.prompt.to_string(),
                history_len: request.history.len(),
                tools: request.tools.len(),
            });
            self.steps
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| Error::Agent("script exhausted".to_string()))
        }
    }

    struct FixedWallet;

    #[async_trait]
    impl WalletProvider for FixedWallet {
        fn wallet_id(&self) -> &str {
            "w"
        }

        fn network_id(&self) -> &str {
            "base-sepolia"
        }

        fn default_address(&self) -> String {
            "0xpogg".to_string()
        }

        fn export(&self) -> Result<String> {
            Ok(String::new())
        }

        async fn balance(&self, _asset: &str) -> Result<f64> {
            Ok(2.0)
        }

        async fn transfer(&self, _amount: &str, _asset: &str, _destination: &str) -> Result<String> {
            Err(Error::Wallet("insufficient funds".to_string()))
        }
    }

    fn agent(steps: Vec<Step>, max_steps: usize) -> ReactAgent<ScriptedModel> {
        ReactAgent::new(
            ScriptedModel::new(steps),
            "You are a test hedgehog.",
            Toolkit::from_wallet(Arc::new(FixedWallet)),
            ConversationMemory::new(),
            max_steps,
        )
    }

    async fn collect(
        agent: &ReactAgent<ScriptedModel>,
        message: &str,
        config: &AgentConfig,
    ) -> Result<Vec<AgentChunk>> {
        let mut chunks = Vec::new();
        agent
            .stream(message, config, &mut |chunk| chunks.push(chunk))
            .await?;
        Ok(chunks)
    }

    #[tokio::test]
    async fn direct_answer_is_one_agent_chunk() {
        let agent = agent(vec![Step::Answer("pogg pogg".to_string())], 5);
        let config = AgentConfig::new("thread");

        let chunks = collect(&agent, "hello", &config).await.unwrap();
        assert_eq!(chunks, vec![AgentChunk::Agent("pogg pogg".to_string())]);
        assert_eq!(agent.memory().turns("thread"), 1);

        let seen = agent.model.seen.lock().unwrap();
        assert_eq!(seen[0].prompt, "hello");
        assert_eq!(seen[0].tools, 3);
    }

    #[tokio::test]
    async fn tool_results_are_streamed_and_fed_back() {
        let agent = agent(
            vec![
                Step::ToolCall {
                    name: "get_balance".to_string(),
                    args: json!({"asset_id": "eth"}),
                },
                Step::Answer("i am a chunky boi".to_string()),
            ],
            5,
        );
        let config = AgentConfig::new("thread");

        let chunks = collect(&agent, "how round are you?", &config).await.unwrap();
        assert_eq!(
            chunks,
            vec![
                AgentChunk::Tools("Balance of eth at address 0xpogg: 2".to_string()),
                AgentChunk::Agent("i am a chunky boi".to_string()),
            ]
        );

        let seen = agent.model.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].prompt, "Tool get_balance returned: Balance of eth at address 0xpogg: 2");
        assert_eq!(seen[1].history_len, 2);
    }

    #[tokio::test]
    async fn failing_tool_does_not_abort_the_turn() {
        let agent = agent(
            vec![
                Step::ToolCall {
                    name: "transfer".to_string(),
                    args: json!({"amount": "1", "asset_id": "eth", "destination": "0x1"}),
                },
                Step::Answer("curling up till green".to_string()),
            ],
            5,
        );
        let config = AgentConfig::new("thread");

        let chunks = collect(&agent, "send me 1 eth", &config).await.unwrap();
        assert!(matches!(&chunks[0], AgentChunk::Tools(t) if t.contains("insufficient funds")));
        assert_eq!(chunks.len(), 2);
    }

    #[tokio::test]
    async fn history_carries_over_within_a_thread() {
        let agent = agent(
            vec![
                Step::Answer("first".to_string()),
                Step::Answer("second".to_string()),
                Step::Answer("other".to_string()),
            ],
            5,
        );
        let main = AgentConfig::new("main");
        let other = AgentConfig::new("other");

        collect(&agent, "one", &main).await.unwrap();
        collect(&agent, "two", &main).await.unwrap();
        collect(&agent, "three", &other).await.unwrap();

        let seen = agent.model.seen.lock().unwrap();
        assert_eq!(seen[0].history_len, 0);
        assert_eq!(seen[1].history_len, 2);
        assert_eq!(seen[2].history_len, 0);
    }

    #[tokio::test]
    async fn tool_exchanges_are_remembered_for_later_turns() {
        let agent = agent(
            vec![
                Step::ToolCall {
                    name: "get_wallet_details".to_string(),
                    args: json!({}),
                },
                Step::Answer("my burrow is 0xpogg".to_string()),
                Step::Answer("still 0xpogg".to_string()),
            ],
            5,
        );
        let config = AgentConfig::new("thread");

        collect(&agent, "where do you live?", &config).await.unwrap();
        let history = agent.memory().history("thread");
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec![
                "where do you live?",
                "Calling tool get_wallet_details with arguments {}",
                "Tool get_wallet_details returned: Wallet: w on network: base-sepolia with default address: 0xpogg",
                "my burrow is 0xpogg",
            ]
        );
        assert_eq!(agent.memory().turns("thread"), 1);

        collect(&agent, "remind me?", &config).await.unwrap();
        let seen = agent.model.seen.lock().unwrap();
        assert_eq!(seen[2].history_len, 4);
        assert_eq!(agent.memory().turns("thread"), 2);
    }

    #[tokio::test]
    async fn step_limit_is_enforced() {
        let call = || Step::ToolCall {
            name: "get_wallet_details".to_string(),
            args: json!({}),
        };
        let agent = agent(vec![call(), call(), call()], 2);
        let config = AgentConfig::new("thread");

        let mut chunks = Vec::new();
        let err = agent
            .stream("loop forever", &config, &mut |chunk| chunks.push(chunk))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Agent(msg) if msg.contains("2 steps")));
        assert_eq!(chunks.len(), 2);
        assert_eq!(agent.memory().turns("thread"), 0);
    }
}
