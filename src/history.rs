//! The conversation log: an append-only sequence of role-tagged turns.

/// One turn in the log. The log is only ever extended; a turn is never
/// rewritten after it is appended (the leading system turn is the one
/// exception, refreshed with recalled context before each user exchange).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    System(String),
    Developer(String),
    User(String),
    Assistant(String),
    Tool(String),
}

impl Message {
    /// Role tag on the oracle's wire format.
    pub fn wire_role(&self) -> &'static str {
        match self {
            Message::System(_) | Message::Developer(_) => "system",
            Message::User(_) => "user",
            Message::Assistant(_) => "assistant",
            Message::Tool(_) => "tool",
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Message::System(s)
            | Message::Developer(s)
            | Message::User(s)
            | Message::Assistant(s)
            | Message::Tool(s) => s,
        }
    }

    fn is_preamble(&self) -> bool {
        matches!(self, Message::System(_) | Message::Developer(_))
    }
}

/// Compose a fresh session log: the system preamble, tool guidance, and
/// optional stdin/redirection context in the canonical order.
pub fn make_history(
    preamble: String,
    tool_guidance: String,
    stdin_content: Option<String>,
    stdout_is_redirected: bool,
) -> Vec<Message> {
    let mut history = vec![Message::System(preamble)];
    let guidance = tool_guidance.trim();
    if !guidance.is_empty() {
        history.push(Message::Developer(guidance.to_string()));
    }
    if let Some(s) = stdin_content {
        let s = s.trim();
        if !s.is_empty() {
            history.push(Message::Developer(
                "The next message is the full stdin content.".to_string(),
            ));
            history.push(Message::Developer(s.to_string()));
        }
    }
    if stdout_is_redirected {
        history.push(Message::Developer(
            "Your final answer is redirected to a file, so do not fence anything and produce the content directly without any extra prose.".to_string(),
        ));
    }
    history
}

/// Swap the leading system turn for one carrying freshly recalled context.
pub fn refresh_system(history: &mut [Message], preamble: String) {
    if let Some(first @ Message::System(_)) = history.first_mut() {
        *first = Message::System(preamble);
    }
}

/// The view sent to the oracle: the full preamble prefix plus the last
/// `cap` exchanges (user/assistant/tool pairs count individually, so this
/// keeps `2 * cap` trailing turns). Old turns stay in the log; they are
/// only dropped from the oracle's window, never from memory of the session.
pub fn windowed(history: &[Message], cap: usize) -> Vec<Message> {
    let prefix_len = history
        .iter()
        .take_while(|m| m.is_preamble())
        .count();
    let rest = &history[prefix_len..];
    let keep = cap.saturating_mul(2);
    let tail_start = rest.len().saturating_sub(keep);
    let mut out = Vec::with_capacity(prefix_len + rest.len() - tail_start);
    out.extend_from_slice(&history[..prefix_len]);
    out.extend_from_slice(&rest[tail_start..]);
    out
}
