use eyre::{Result, eyre};

use crate::history::{self, Message};
use crate::memory::MemoryBank;
use crate::prompting;

use super::turn::{TurnContext, run_turn};

/// How many recalled logs go into the preamble each exchange.
const RECALL_DEPTH: usize = 2;

/// Interactive loop: read a line, run the exchange, remember it.
/// `/quit` leaves, `/save` snapshots recent context to long-term memory.
pub async fn interact_forever(
    ctx: &TurnContext<'_>,
    memory: &mut MemoryBank,
    history: Vec<Message>,
) -> Result<()> {
    use rustyline::error::ReadlineError::{Eof, Interrupted};

    let mut rl = rustyline::DefaultEditor::new().map_err(|e| eyre!(e))?;
    let mut history = history;
    loop {
        let line = match rl.readline(">> ") {
            Ok(line) => line,
            Err(Eof) | Err(Interrupted) => break,
            Err(e) => return Err(eyre!(e)),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        rl.add_history_entry(line).ok();

        if line.eq_ignore_ascii_case("/quit") {
            break;
        }
        if line.eq_ignore_ascii_case("/save") {
            let snapshot = recent_snapshot(&history);
            match memory.add_log(&snapshot) {
                Ok(()) => ctx.display.show_log("saved recent context to memory").await,
                Err(e) => tracing::warn!("memory save failed: {e}"),
            }
            continue;
        }

        // Refresh the preamble with context recalled for this input.
        let recalled = memory.recall(line, RECALL_DEPTH);
        history::refresh_system(
            &mut history,
            prompting::render_preamble(ctx.executor.registry(), &recalled),
        );

        history.push(Message::User(line.to_string()));
        let answer = run_turn(ctx, &mut history).await?;
        eprintln!();

        if let Err(e) = memory.add_log(&format!("User: {line}\nAssistant: {answer}")) {
            tracing::warn!("memory write failed: {e}");
        }
    }
    Ok(())
}

/// A compressed view of the last few turns, for explicit `/save`.
fn recent_snapshot(history: &[Message]) -> String {
    let recent: Vec<String> = history
        .iter()
        .rev()
        .filter(|m| matches!(m, Message::User(_) | Message::Assistant(_)))
        .take(6)
        .map(|m| {
            let clipped: String = m.content().chars().take(200).collect();
            format!("{}: {}", m.wire_role(), clipped)
        })
        .collect();
    let mut ordered = recent;
    ordered.reverse();
    format!("Conversation summary: {}", ordered.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_keeps_the_latest_exchanges_in_order() {
        let mut history = vec![Message::System("preamble".to_string())];
        for i in 0..5 {
            history.push(Message::User(format!("q{i}")));
            history.push(Message::Assistant(format!("a{i}")));
        }
        let snapshot = recent_snapshot(&history);
        assert!(snapshot.starts_with("Conversation summary: "));
        // Only the last three exchanges survive, oldest first.
        assert!(snapshot.contains("user: q2"));
        assert!(snapshot.contains("assistant: a4"));
        assert!(!snapshot.contains("q1"));
        let q2 = snapshot.find("q2").unwrap();
        let a4 = snapshot.find("a4").unwrap();
        assert!(q2 < a4);
    }
}
