use eyre::eyre;
use std::io::Read;

fn stdin_is_tty() -> bool {
    atty::is(atty::Stream::Stdin)
}

/// If stdin is not a TTY, read it fully as a single UTF-8 string.
/// Returns `None` when stdin is a TTY or when the input is empty/whitespace.
pub fn read_whole_stdin() -> eyre::Result<Option<String>> {
    if stdin_is_tty() {
        return Ok(None);
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .map_err(|e| eyre!(e))?;
    if buf.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(buf))
    }
}

/// True when stdout goes somewhere other than a terminal (file, pipe).
/// The model is told so it can skip fences and prose.
pub fn stdout_is_redirected() -> bool {
    !atty::is(atty::Stream::Stdout)
}
