//! Orchestration loop
//!
//! This module implements the bounded tool-calling loop at the heart of
//! the service:
//! - Sends the running transcript plus tool schemas to the model
//! - Executes requested tool calls in order, feeding results back
//! - Collects client actions emitted by tool results
//! - Enforces the round budget and the per-turn wall-clock deadline
//!
//! The loop fails open on the round budget: the last round runs with tools
//! disabled so the user always hears a complete sentence, even from a
//! model that keeps requesting tools.

use crate::agent::actions::{ActionCollector, CollectedActions};
use crate::auth::AuthContext;
use crate::config::AgentConfig;
use crate::error::{Result, VoxcrmError};
use crate::prompts::{Language, PromptLibrary};
use crate::providers::{Message, Provider};
use crate::tools::ToolExecutor;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Instruction added before the forced final round
const FINAL_ROUND_NUDGE: &str = "Tool calls are no longer available for this \
request. Answer the user now, in one or two short sentences, using the \
information already gathered.";

/// One turn's input
pub struct TurnRequest<'a> {
    /// The user's utterance
    pub question: &'a str,
    /// Response language
    pub language: Language,
    /// Prior session messages, in append order
    pub history: &'a [Message],
    /// The caller's auth context, passed through to tool handlers
    pub ctx: &'a AuthContext,
}

/// One turn's result
#[derive(Debug)]
pub struct TurnOutcome {
    /// Final natural-language response
    pub response: String,
    /// Whether any tool call was executed this turn
    pub used_tools: bool,
    /// Rounds consumed (1-based, never exceeds the configured maximum)
    pub rounds: usize,
    /// Model the response came from
    pub model: String,
    /// Client actions collected from tool results, partitioned for delivery
    pub actions: CollectedActions,
    /// Messages to append to the session, in exact transcript order
    pub new_messages: Vec<Message>,
}

/// The orchestrator driving model rounds and tool execution
pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    executor: ToolExecutor,
    prompts: Arc<PromptLibrary>,
    config: AgentConfig,
}

impl Orchestrator {
    /// Creates a new orchestrator
    ///
    /// # Errors
    ///
    /// Returns `VoxcrmError::Config` if `max_rounds` is zero.
    pub fn new(
        provider: Arc<dyn Provider>,
        executor: ToolExecutor,
        prompts: Arc<PromptLibrary>,
        config: AgentConfig,
    ) -> Result<Self> {
        if config.max_rounds == 0 {
            return Err(VoxcrmError::Config("max_rounds must be greater than 0".to_string()).into());
        }

        Ok(Self {
            provider,
            executor,
            prompts,
            config,
        })
    }

    /// Runs one conversational turn to completion
    ///
    /// # Errors
    ///
    /// Returns `VoxcrmError::Provider` when a model call fails, the reply
    /// is unusable before the final round, or the turn deadline elapses.
    /// Tool failures never propagate; they are folded into the transcript.
    pub async fn run_turn(&self, request: TurnRequest<'_>) -> Result<TurnOutcome> {
        let start = Instant::now();
        let deadline = Duration::from_secs(self.config.deadline_seconds);
        let prompt_set = self.prompts.select(request.language);
        let definitions = self.executor.definitions();

        let mut transcript: Vec<Message> =
            Vec::with_capacity(prompt_set.few_shot.len() + request.history.len() + 2);
        transcript.push(Message::system(prompt_set.system_prompt.clone()));
        transcript.extend(prompt_set.few_shot.iter().cloned());
        transcript.extend_from_slice(request.history);

        let user_message = Message::user(request.question);
        transcript.push(user_message.clone());
        let mut new_messages = vec![user_message];

        let mut collector = ActionCollector::new();
        let mut used_tools = false;

        for round in 1..=self.config.max_rounds {
            if start.elapsed() > deadline {
                warn!("Turn deadline exceeded after {:?}", start.elapsed());
                return Err(VoxcrmError::Provider(format!(
                    "turn deadline exceeded after {} seconds",
                    self.config.deadline_seconds
                ))
                .into());
            }

            let is_final_round = round == self.config.max_rounds;
            if is_final_round {
                // Nudge lives in the transcript only; it is not part of the
                // session history.
                transcript.push(Message::system(FINAL_ROUND_NUDGE));
            }

            let tools: &[Value] = if is_final_round { &[] } else { &definitions };
            debug!(
                "Round {}/{}, transcript={} messages, tools={}",
                round,
                self.config.max_rounds,
                transcript.len(),
                tools.len()
            );

            let completion = self.provider.complete(&transcript, tools).await?;
            let message = completion.message;
            let tool_calls = message.tool_calls.clone().unwrap_or_default();

            if !tool_calls.is_empty() && !is_final_round {
                used_tools = true;
                transcript.push(message.clone());
                new_messages.push(message);

                for tool_call in &tool_calls {
                    let args: Value = match serde_json::from_str(&tool_call.function.arguments) {
                        Ok(args) => args,
                        Err(e) => {
                            warn!(
                                "Unparseable arguments for tool {}: {}",
                                tool_call.function.name, e
                            );
                            Value::Null
                        }
                    };

                    let outcome = if args.is_null() {
                        crate::tools::ToolOutcome::error("tool arguments were not valid JSON")
                    } else {
                        self.executor
                            .execute(&tool_call.function.name, args, request.ctx)
                            .await
                    };

                    if let Some(action) = &outcome.client_action {
                        collector.record(action.clone());
                    }

                    let tool_message = Message::tool_result(&tool_call.id, outcome.to_message());
                    transcript.push(tool_message.clone());
                    new_messages.push(tool_message);
                }

                continue;
            }

            if !tool_calls.is_empty() {
                // Round budget reached with pending tool intents: drop them
                // without executing and answer from what we have.
                let names: Vec<&str> = tool_calls
                    .iter()
                    .map(|c| c.function.name.as_str())
                    .collect();
                warn!(
                    "Dropping {} pending tool call(s) at round budget: {}",
                    names.len(),
                    names.join(", ")
                );
            }

            let text = message
                .content
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string);

            match text {
                Some(response) => {
                    new_messages.push(Message::assistant(response.clone()));
                    info!(
                        "Turn completed in {} round(s), {} ms",
                        round,
                        start.elapsed().as_millis()
                    );
                    return Ok(TurnOutcome {
                        response,
                        used_tools,
                        rounds: round,
                        model: self.provider.model(),
                        actions: collector.finish(),
                        new_messages,
                    });
                }
                None if is_final_round => {
                    // Fail open: a fixed complete sentence beats an empty
                    // response.
                    warn!("Forced final round produced no text, using fallback");
                    let response = prompt_set.fallback_response.clone();
                    new_messages.push(Message::assistant(response.clone()));
                    return Ok(TurnOutcome {
                        response,
                        used_tools,
                        rounds: round,
                        model: self.provider.model(),
                        actions: collector.finish(),
                        new_messages,
                    });
                }
                None => {
                    warn!("Model returned neither content nor tool calls");
                    return Err(VoxcrmError::Provider(
                        "model returned neither content nor tool calls".to_string(),
                    )
                    .into());
                }
            }
        }

        // The final round always returns above.
        Err(VoxcrmError::Provider("round budget exhausted without a final response".to_string())
            .into())
    }
}
