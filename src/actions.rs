//! Extracts a structured tool invocation from raw model output.
//!
//! The model is instructed to announce a tool call as a fenced ```json block
//! holding an object with exactly `action` and `args` keys. Everything around
//! the block (thoughts, prose) is ignored here.

/// One tool invocation as requested by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    /// Tool name; resolved against the registry at dispatch time.
    pub name: String,
    /// Single opaque string payload; the tool decodes its own sub-fields.
    pub args: String,
    /// The exact substring the call was extracted from.
    pub raw: String,
}

impl ToolCall {
    /// Render the call back into the fenced block format the model emits.
    pub fn to_block(&self) -> String {
        let body = serde_json::json!({ "action": self.name, "args": self.args });
        format!("```json\n{}\n```", body)
    }
}

/// Outcome of scanning one model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    /// A single well-formed call was found.
    Call(ToolCall),
    /// The reply contains no action block; it is a plain answer.
    NoCall,
}

/// The reply contained action blocks, but none of them were usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed action block: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

const FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";

/// Scan `text` for fenced action blocks and extract a call.
///
/// Multiple well-formed blocks may appear when the model corrects itself
/// mid-reply; the last one wins. A reply with blocks that are all broken
/// (bad JSON, wrong shape, unterminated fence) is an error, never a panic.
/// A reply with no block at all is a plain answer.
pub fn extract_action(text: &str) -> Result<Parsed, ParseError> {
    let mut saw_block = false;
    let mut last_good: Option<ToolCall> = None;
    let mut last_error = String::new();

    let mut rest = text;
    while let Some(open) = rest.find(FENCE_OPEN) {
        saw_block = true;
        let after_open = &rest[open + FENCE_OPEN.len()..];
        let Some(close) = after_open.find(FENCE_CLOSE) else {
            last_error = "unterminated fence".to_string();
            break;
        };
        let inner = after_open[..close].trim();
        let raw = &rest[open..open + FENCE_OPEN.len() + close + FENCE_CLOSE.len()];
        match decode_block(inner) {
            Ok((name, args)) => {
                last_good = Some(ToolCall {
                    name,
                    args,
                    raw: raw.to_string(),
                });
            }
            Err(message) => last_error = message,
        }
        rest = &after_open[close + FENCE_CLOSE.len()..];
    }

    if let Some(call) = last_good {
        return Ok(Parsed::Call(call));
    }
    if saw_block {
        return Err(ParseError {
            message: last_error,
        });
    }
    Ok(Parsed::NoCall)
}

/// Decode one block body into `(action, args)`, enforcing the exact shape.
fn decode_block(inner: &str) -> Result<(String, String), String> {
    let value: serde_json::Value =
        serde_json::from_str(inner).map_err(|e| format!("not valid json: {e}"))?;
    let Some(object) = value.as_object() else {
        return Err("block is not a json object".to_string());
    };
    let Some(action) = object.get("action") else {
        return Err("missing `action` key".to_string());
    };
    let Some(name) = action.as_str() else {
        return Err("`action` is not a string".to_string());
    };
    let Some(args) = object.get("args") else {
        return Err("missing `args` key".to_string());
    };
    let Some(args) = args.as_str() else {
        return Err("`args` is not a string".to_string());
    };
    if object.len() != 2 {
        return Err(format!(
            "expected exactly `action` and `args`, got {} keys",
            object.len()
        ));
    }
    Ok((name.to_string(), args.to_string()))
}

mod tests;
