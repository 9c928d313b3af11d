use eyre::Result;

use crate::prompting;
use crate::tools::ToolRegistry;

/// Handle special one-shot CLI commands like `--help`, `--version`, or
/// `tools`. Returns true if a special action was handled and the program
/// should exit.
pub fn handle_specials_if_needed(registry: &ToolRegistry) -> Result<bool> {
    let mut args = std::env::args();
    let _ = args.next(); // binary name

    let arg = args.next().unwrap_or_default();

    if matches!(arg.as_str(), "help" | "--help" | "-H" | "-h" | "-?") {
        println!(
            "{}",
            concat!(
                "gofer: a local agent that runs your errands\n\n",
                "  $ gofer                        # interactive session\n",
                "  $ gofer write a haiku to ~/Desktop/haiku.txt\n",
                "  $ git diff | gofer summarize this change\n\n",
                "Session commands: /quit, /save\n"
            )
        );
        return Ok(true);
    }

    if matches!(arg.as_str(), "version" | "--version" | "-V" | "-v") {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(true);
    }

    if matches!(arg.as_str(), "tools" | "--tools") {
        println!("{}", prompting::render_tool_lines(registry));
        return Ok(true);
    }

    // Otherwise, not a special
    Ok(false)
}
