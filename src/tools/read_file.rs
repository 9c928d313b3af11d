use super::common::{FromToolArgs, resolve_tool_path, with_args};
use super::executor::{Failure, FailureKind};
use super::registry::{Param, ToolClass, ToolEntry};

pub const NAME: &str = "read_file";

/// Keep huge files from flooding the context window.
const MAX_BYTES: usize = 512 * 1024;

#[derive(Debug)]
pub struct Args {
    path: String,
}

impl FromToolArgs for Args {
    fn from_raw(raw: &str) -> Result<Self, Failure> {
        let path = raw.trim();
        if path.is_empty() {
            return Err(Failure::new(
                FailureKind::InvalidArgs,
                "read_file requires a path",
            ));
        }
        Ok(Args {
            path: path.to_string(),
        })
    }
}

pub async fn call(args: Args) -> Result<String, Failure> {
    let path = resolve_tool_path(&args.path)?;
    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Failure::new(
                FailureKind::Io,
                format!("file not found: {}", path.display()),
            )
        } else {
            Failure::from_io(&e)
        }
    })?;
    let mut text = String::from_utf8_lossy(&bytes[..bytes.len().min(MAX_BYTES)]).to_string();
    if bytes.len() > MAX_BYTES {
        text.push_str("\n[truncated]");
    }
    Ok(text)
}

pub fn entry() -> ToolEntry {
    ToolEntry::new(
        NAME,
        "Read a file's content. Supports ~ for the user's home directory.",
        vec![Param::required("path", "absolute, relative, or ~-prefixed path")],
        ToolClass::File,
        with_args(call),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_args_are_rejected() {
        let err = Args::from_raw("   ").unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidArgs);
    }

    #[tokio::test]
    async fn missing_file_is_a_classified_failure() {
        let args = Args::from_raw("~/gofer-definitely-missing-file.txt").unwrap();
        let err = call(args).await.unwrap_err();
        assert!(err.message.contains("not found") || err.kind == FailureKind::PermissionDenied);
    }
}
