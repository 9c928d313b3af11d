//! All user-visible output funnels through here so stdout stays clean for
//! piping: answers go to stdout, everything else (readout, tool calls,
//! prompts) to stderr.

use crossterm::cursor;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};

#[derive(Clone, Copy)]
struct Caps {
    /// We can emit ANSI color/UI sequences to stderr.
    colorful: bool,
    /// We can safely prompt and wait for stdin input.
    can_prompt_user: bool,
}

/// Display interface used by the turn runner and the REPL.
pub struct Display {
    caps: Caps,
}

impl Display {
    /// Return a guard that keeps a spinner going until dropped.
    pub async fn start_spinning(&self) -> Spinner {
        if self.caps.colorful {
            Spinner::start()
        } else {
            Spinner::start_empty()
        }
    }

    /// Append a line to the technical readout.
    pub async fn show_log(&self, line: &str) {
        let line = line.trim_end();
        if line.is_empty() {
            return;
        }
        if self.caps.colorful {
            let _ = crossterm::execute!(
                std::io::stderr(),
                SetForegroundColor(Color::DarkCyan),
                Print("| "),
                Print(line),
                ResetColor,
                Print("\n"),
            );
        } else {
            eprintln!("| {line}");
        }
    }

    /// Append a piece of the answer stream.
    pub async fn show_delta(&self, s: &str) {
        // `stdout` should be free from control sequences so it can be piped.
        let _ = crossterm::execute!(std::io::stdout(), Print(s));
    }

    /// Close out the answer with a newline.
    pub async fn end_answer(&self) {
        let _ = crossterm::execute!(std::io::stdout(), Print("\n"));
    }

    /// Show a pretty-formatted tool call before it runs.
    pub async fn show_tool_call(&self, name: &str, args: &str) {
        if self.caps.colorful {
            let _ = crossterm::execute!(
                std::io::stderr(),
                SetForegroundColor(Color::DarkCyan),
                Print(name),
                Print(" "),
                Print(args),
                ResetColor,
                Print("\n"),
            );
        } else {
            eprintln!("call: {name} {args}");
        }
    }

    /// Show what a tool produced.
    pub async fn show_tool_output(&self, name: &str, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.caps.colorful {
            let _ = crossterm::execute!(
                std::io::stderr(),
                SetForegroundColor(Color::DarkCyan),
                Print(format!("{name} output:")),
                ResetColor,
                Print("\n"),
            );
        } else {
            eprintln!("{name} output:");
        }
        eprintln!("{text}");
        eprintln!();
    }

    /// Ask the user to approve a command before it runs.
    /// Returns true only if approved.
    pub async fn confirm_command(&self, command: &str) -> bool {
        if !self.caps.can_prompt_user {
            eprintln!("rejecting run_cmd in non-interactive mode");
            return false;
        }
        if self.caps.colorful {
            let _ = crossterm::execute!(
                std::io::stderr(),
                SetForegroundColor(Color::DarkYellow),
                Print(format!("$ {command}")),
                ResetColor,
                Print("\nProceed? [y/N] "),
            );
        } else {
            eprint!("$ {command}\nProceed? [y/N] ");
        }
        yes_or_no()
    }
}

fn yes_or_no() -> bool {
    let mut buffer = String::new();
    let stdin = std::io::stdin();
    let Ok(_read) = stdin.read_line(&mut buffer) else {
        return false;
    };
    let first_char = buffer.trim().chars().next().unwrap_or('n');
    first_char.eq_ignore_ascii_case(&'y')
}

/// Prefer a colorful UI on TTY stderr; fall back to plain printing.
pub fn make_display() -> Display {
    let stderr_is_tty = atty::is(atty::Stream::Stderr);
    let stdin_is_tty = atty::is(atty::Stream::Stdin);
    Display {
        caps: Caps {
            colorful: stderr_is_tty,
            can_prompt_user: stdin_is_tty && stderr_is_tty,
        },
    }
}

async fn display_spinner() {
    use std::time::Duration;
    let frames = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let mut index: usize = 0;

    let _ = crossterm::execute!(std::io::stderr(), cursor::Hide);
    loop {
        let frame = frames[index];
        let _ = crossterm::execute!(
            std::io::stderr(),
            Print("\r"),
            SetForegroundColor(Color::DarkGrey),
            Print(frame),
            ResetColor
        );
        index += 1;
        index %= frames.len();

        tokio::time::sleep(Duration::from_millis(120)).await;
    }
}

/// Guard to keep the spinner active while in scope.
pub struct Spinner {
    task: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    fn start_empty() -> Self {
        Spinner { task: None }
    }

    fn start() -> Self {
        Spinner {
            task: Some(tokio::spawn(display_spinner())),
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.task.take().map(|task| {
            tokio::spawn(async move {
                task.abort();
                let _ = task.await;
                let _ = crossterm::execute!(
                    std::io::stderr(),
                    Clear(ClearType::CurrentLine),
                    Print("\r"),
                    ResetColor,
                    cursor::Show,
                );
            })
        });
    }
}
