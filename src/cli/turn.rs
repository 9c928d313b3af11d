//! One user exchange: invoke the oracle, dispatch tool calls, repeat until
//! the model answers in plain text or the turn budget runs out.

use eyre::{Result, eyre};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

use crate::actions::{self, Parsed, ToolCall};
use crate::config::Config;
use crate::display::Display;
use crate::history::{self, Message};
use crate::oracle::{ModelOracle, OracleError};
use crate::tools::{Outcome, RUN_CMD, ToolExecutor};

/// Everything a turn needs, borrowed from the session.
pub struct TurnContext<'a> {
    pub oracle: &'a dyn ModelOracle,
    pub executor: &'a ToolExecutor,
    pub display: Arc<Display>,
    pub config: &'a Config,
}

/// Phases of one exchange.
enum LoopState {
    /// Waiting for the oracle to produce text.
    AwaitingModel,
    /// A call was extracted and is being executed.
    DispatchingTool(ToolCall),
    /// The exchange is over; carry the final answer.
    Terminal(String),
}

/// Run one exchange against the current log, appending turns as they
/// happen. Tool failures are reported to the model as tool-role turns;
/// only oracle faults escape as errors.
pub async fn attempt_turn(ctx: &TurnContext<'_>, messages: &mut Vec<Message>) -> Result<String> {
    let mut state = LoopState::AwaitingModel;
    let mut oracle_calls = 0usize;
    let mut last_text = String::new();

    loop {
        state = match state {
            LoopState::AwaitingModel => {
                if oracle_calls >= ctx.config.max_turns {
                    ctx.display
                        .show_log("turn limit reached; answering with what we have")
                        .await;
                    LoopState::Terminal(last_text.clone())
                } else {
                    let window = history::windowed(messages, ctx.config.short_term_cap);

                    let spinner = ctx.display.start_spinning().await;
                    let (tx, rx) = unbounded_channel::<String>();
                    let pump = tokio::spawn(pump_answer(rx, ctx.display.clone(), spinner));

                    let generated = ctx.oracle.generate(&window, Some(tx)).await;
                    let gate = pump.await.map_err(|e| eyre!(e))?;

                    let text = generated?;
                    oracle_calls += 1;
                    last_text = text.clone();
                    messages.push(Message::Assistant(text.clone()));

                    match actions::extract_action(&text) {
                        Ok(Parsed::NoCall) => {
                            // The stream may have held nothing back; flush
                            // whatever it did.
                            ctx.display.show_delta(gate.remainder()).await;
                            ctx.display.end_answer().await;
                            LoopState::Terminal(text)
                        }
                        Ok(Parsed::Call(call)) => LoopState::DispatchingTool(call),
                        Err(parse_error) => {
                            tracing::warn!("action block did not parse: {parse_error}");
                            messages.push(Message::Tool(render_parse_error(&parse_error)));
                            LoopState::AwaitingModel
                        }
                    }
                }
            }
            LoopState::DispatchingTool(call) => {
                ctx.display.show_tool_call(&call.name, &call.args).await;

                if call.name == RUN_CMD && !ctx.display.confirm_command(&call.args).await {
                    messages.push(Message::Tool(render_denied(&call)));
                } else {
                    let result = ctx.executor.execute(call).await;
                    match &result.outcome {
                        Outcome::Success(text) if result.call.name == RUN_CMD => {
                            ctx.display.show_tool_output(&result.call.name, text).await;
                        }
                        Outcome::Failure(failure) => {
                            ctx.display
                                .show_log(&format!("{} failed: {failure}", result.call.name))
                                .await;
                        }
                        Outcome::Success(_) => {}
                    }
                    messages.push(Message::Tool(result.render()));
                }
                // Whatever happened, the model hears about it next.
                LoopState::AwaitingModel
            }
            LoopState::Terminal(answer) => return Ok(answer),
        };
    }
}

/// Run one exchange, retrying transparently when the oracle transport
/// hiccups. Progress made before a retry (appended turns) is kept.
pub async fn run_turn(ctx: &TurnContext<'_>, messages: &mut Vec<Message>) -> Result<String> {
    use std::time::Duration;

    let max_attempts = 6;
    let mut attempt = 0;

    loop {
        match attempt_turn(ctx, messages).await {
            Ok(answer) => return Ok(answer),
            Err(e) => {
                let transient = e
                    .downcast_ref::<OracleError>()
                    .map(|o| o.is_transient())
                    .unwrap_or(false);
                if !transient || attempt >= max_attempts {
                    return Err(e);
                }
                tokio::time::sleep(Duration::from_millis(1u64 << attempt.min(6))).await;
                attempt += 1;
            }
        }
    }
}

fn render_parse_error(error: &actions::ParseError) -> String {
    serde_json::json!({
        "tool": "action_parser",
        "result": { "error": { "kind": "malformed_call", "message": error.to_string() } },
    })
    .to_string()
}

fn render_denied(call: &ToolCall) -> String {
    serde_json::json!({
        "tool": call.name,
        "args": call.args,
        "result": { "error": { "kind": "permission_denied", "message": "user denied" } },
    })
    .to_string()
}

/// Forward answer deltas to the display, stopping the spinner on the first
/// one and holding back anything that looks like the start of an action
/// block; calls are rendered prettily after parsing instead.
async fn pump_answer(
    mut rx: UnboundedReceiver<String>,
    display: Arc<Display>,
    spinner: crate::display::Spinner,
) -> AnswerGate {
    let mut spinner = Some(spinner);
    let mut gate = AnswerGate::new();
    while let Some(delta) = rx.recv().await {
        let _ = spinner.take().map(drop);
        let printable = gate.push(&delta);
        if !printable.is_empty() {
            display.show_delta(&printable).await;
        }
    }
    gate
}

const FENCE_OPENER: &str = "```json";

/// Decides, chunk by chunk, how much of the answer stream is safe to show:
/// everything before a possible action fence, nothing from the fence on.
struct AnswerGate {
    buffer: String,
    printed: usize,
    held: bool,
}

impl AnswerGate {
    fn new() -> Self {
        Self {
            buffer: String::new(),
            printed: 0,
            held: false,
        }
    }

    /// Absorb a delta; return the part that may be printed right away.
    fn push(&mut self, delta: &str) -> String {
        self.buffer.push_str(delta);
        if self.held {
            return String::new();
        }
        if let Some(found) = self.buffer[self.printed..].find(FENCE_OPENER) {
            let stop = self.printed + found;
            let out = self.buffer[self.printed..stop].to_string();
            self.printed = stop;
            self.held = true;
            return out;
        }
        // Do not emit a partial opener; it may complete in the next chunk.
        let hold_back = overlap(&self.buffer, FENCE_OPENER);
        let safe = self.buffer.len().saturating_sub(hold_back).max(self.printed);
        let out = self.buffer[self.printed..safe].to_string();
        self.printed = safe;
        out
    }

    /// Everything not yet shown; flushed when the reply turns out to be a
    /// plain answer after all.
    fn remainder(&self) -> &str {
        &self.buffer[self.printed..]
    }
}

/// Longest suffix of `s` that is a prefix of `delim`.
fn overlap(s: &str, delim: &str) -> usize {
    let max = std::cmp::min(delim.len() - 1, s.len());
    for i in (1..=max).rev() {
        if s.ends_with(&delim[..i]) {
            return i;
        }
    }
    0
}
