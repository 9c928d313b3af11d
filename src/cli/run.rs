use eyre::{Result, eyre};
use std::sync::Arc;

use crate::config::Config;
use crate::display;
use crate::history::{self, Message};
use crate::memory::MemoryBank;
use crate::oracle::OllamaOracle;
use crate::prompting;
use crate::tools::{Budgets, ToolExecutor, builtin_registry};

use super::io;
use super::repl::interact_forever;
use super::specials;
use super::turn::{TurnContext, run_turn};

/// CLI entrypoint: wire everything up, then decide between the REPL and a
/// one-shot batch prompt.
pub async fn run() -> Result<()> {
    let config = Config::from_env();

    // Start display; all user-visible output goes through it.
    let display = Arc::new(display::make_display());
    crate::logging::setup_tracing_display_logger(display.clone());

    let client = reqwest::Client::builder()
        .build()
        .map_err(|e| eyre!("http client: {e}"))?;

    // The tool table is fixed before the first turn; a conflict here is
    // a startup failure, not something the session can limp through.
    let registry = builtin_registry(&client).map_err(|e| eyre!("startup: {e}"))?;

    // One-shot specials (help/version/tools) exit before any session work.
    if specials::handle_specials_if_needed(&registry)? {
        return Ok(());
    }

    let mut memory = match MemoryBank::open(config.memory_path.clone()) {
        Ok(bank) => bank,
        Err(e) => {
            tracing::warn!("starting with empty memory: {e}");
            MemoryBank::empty(config.memory_path.clone())
        }
    };

    let stdout_is_tty = atty::is(atty::Stream::Stdout);
    let stderr_is_tty = atty::is(atty::Stream::Stderr);
    let stdin_is_tty = atty::is(atty::Stream::Stdin);
    let stdin_content = io::read_whole_stdin()?;

    // Collect positional args into a single prompt. If none provided,
    // drop into the REPL.
    let prompt = {
        let mut args = std::env::args();
        let _ = args.next(); // binary name
        args.collect::<Vec<String>>().join(" ")
    };

    let executor = ToolExecutor::new(Arc::new(registry), Budgets::from_config(&config));
    let oracle = OllamaOracle::new(client, config.oracle_url.clone(), config.model.clone());

    let recalled = memory.recall(&prompt, 2);
    let preamble = prompting::render_preamble(executor.registry(), &recalled);
    let mut history = history::make_history(
        preamble,
        prompting::TOOL_GUIDANCE.to_string(),
        stdin_content,
        io::stdout_is_redirected(),
    );

    let ctx = TurnContext {
        oracle: &oracle,
        executor: &executor,
        display,
        config: &config,
    };

    // Step into interactive mode only when stdout, stderr, and stdin are
    // all teletype devices and the user provided no prompt.
    if stdout_is_tty && stderr_is_tty && stdin_is_tty && prompt.is_empty() {
        interact_forever(&ctx, &mut memory, history).await?;
    } else {
        // One-shot: append the user turn and run a single exchange.
        history.push(Message::User(prompt.clone()));
        let answer = run_turn(&ctx, &mut history).await?;
        if let Err(e) = memory.add_log(&format!("User: {prompt}\nAssistant: {answer}")) {
            tracing::warn!("memory write failed: {e}");
        }
    }

    Ok(())
}
