//! What we tell the model to do.

use crate::tools::ToolRegistry;

/// The message that primes the assistant with its identity and capabilities.
/// `¶` markers are filled in before each exchange.
pub const SYSTEM_PREAMBLE: &str = r#"You are a capable agent running locally on the user's computer.
You have permission to create, read, and modify files on this system, run commands, and search the web, through the tools listed below.
Current date: ¶today

Available tools:
¶tools

Relevant past context:
¶memory

Guidelines:
1. When the user asks you to do something a tool can do, do it with the tool.
2. Do not tell the user to run commands themselves; run them yourself with run_cmd.
3. For file paths, `~/` means the user's home directory and `.` means the current directory.
"#;

/// How to format a tool invocation.
pub const TOOL_GUIDANCE: &str = r#"To call a tool, first state your reasoning in plain text, then emit exactly one fenced block of the form:

```json
{
  "action": "write_file",
  "args": "~/Desktop/test.txt|Content here"
}
```

Rules:
- `action` is the tool name; `args` is always a single string.
- Tools with several fields take them pipe-separated in the order listed; only the first pipe splits, so content may itself contain pipes.
- Emit at most one call per reply. After the tool result arrives, continue, or answer the user in plain text with no fenced json block.
- If a tool reports an error, read it and decide: correct the call, try another tool, or explain the problem to the user.
"#;

/// Render the preamble with the tool table, recalled context, and date.
pub fn render_preamble(registry: &ToolRegistry, recalled: &[String]) -> String {
    let today = time::OffsetDateTime::now_local()
        .unwrap_or_else(|_| time::OffsetDateTime::now_utc())
        .date()
        .to_string();
    let memory = if recalled.is_empty() {
        "(none)".to_string()
    } else {
        recalled.join("\n---\n")
    };
    SYSTEM_PREAMBLE
        .replace("¶today", &today)
        .replace("¶tools", &render_tool_lines(registry))
        .replace("¶memory", &memory)
}

/// One line per tool: name, signature, description.
pub fn render_tool_lines(registry: &ToolRegistry) -> String {
    let mut lines = Vec::with_capacity(registry.len());
    for entry in registry.entries() {
        lines.push(format!(
            "- {} (args: {}): {}",
            entry.name,
            entry.signature(),
            entry.desc
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtin_registry;

    #[test]
    fn preamble_lists_every_builtin_tool() {
        let registry = builtin_registry(&reqwest::Client::new()).unwrap();
        let rendered = render_preamble(&registry, &[]);
        for name in ["read_file", "write_file", "run_cmd", "search_web"] {
            assert!(rendered.contains(name), "missing {name}");
        }
        assert!(rendered.contains("(none)"));
        assert!(!rendered.contains('¶'));
    }

    #[test]
    fn recalled_context_is_joined_with_separators() {
        let registry = builtin_registry(&reqwest::Client::new()).unwrap();
        let recalled = vec!["first memory".to_string(), "second memory".to_string()];
        let rendered = render_preamble(&registry, &recalled);
        assert!(rendered.contains("first memory\n---\nsecond memory"));
    }

    #[test]
    fn write_file_signature_shows_both_fields() {
        let registry = builtin_registry(&reqwest::Client::new()).unwrap();
        let lines = render_tool_lines(&registry);
        assert!(lines.contains("write_file (args: path|content)"));
    }
}
