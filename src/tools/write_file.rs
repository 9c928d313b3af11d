use super::common::{FromToolArgs, resolve_tool_path, split_first_pipe, with_args};
use super::executor::{Failure, FailureKind};
use super::registry::{Param, ToolClass, ToolEntry};

pub const NAME: &str = "write_file";

#[derive(Debug)]
pub struct Args {
    path: String,
    content: String,
}

impl FromToolArgs for Args {
    fn from_raw(raw: &str) -> Result<Self, Failure> {
        // Only the first pipe separates path from content; the content may
        // contain as many pipes as it likes.
        let Some((path, content)) = split_first_pipe(raw) else {
            return Err(Failure::new(
                FailureKind::InvalidArgs,
                "write_file requires args in the form path|content",
            ));
        };
        let path = path.trim();
        if path.is_empty() {
            return Err(Failure::new(
                FailureKind::InvalidArgs,
                "write_file requires a non-empty path before the pipe",
            ));
        }
        Ok(Args {
            path: path.to_string(),
            content: content.to_string(),
        })
    }
}

pub async fn call(args: Args) -> Result<String, Failure> {
    let path = resolve_tool_path(&args.path)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Failure::from_io(&e))?;
    }
    tokio::fs::write(&path, args.content.as_bytes())
        .await
        .map_err(|e| Failure::from_io(&e))?;
    Ok(format!(
        "wrote {} bytes to {}",
        args.content.len(),
        path.display()
    ))
}

pub fn entry() -> ToolEntry {
    ToolEntry::new(
        NAME,
        "Write content to a file, creating parent directories. Supports ~ for the user's home directory.",
        vec![
            Param::required("path", "where to write"),
            Param::required("content", "everything after the first pipe, written verbatim"),
        ],
        ToolClass::File,
        with_args(call),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_split_on_the_first_pipe_only() {
        let args = Args::from_raw("~/tmp/b.txt|a|b").unwrap();
        assert_eq!(args.path, "~/tmp/b.txt");
        assert_eq!(args.content, "a|b");
    }

    #[test]
    fn missing_pipe_is_invalid_args() {
        let err = Args::from_raw("just-a-path.txt").unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidArgs);
    }

    #[test]
    fn empty_content_is_allowed() {
        let args = Args::from_raw("notes.txt|").unwrap();
        assert_eq!(args.content, "");
    }

    #[tokio::test]
    async fn written_content_reads_back_verbatim() {
        let dir = std::env::temp_dir().join(format!("gofer-write-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let target = dir.join("a.txt");

        let raw = format!("{}|Hello from the agent.", target.display());
        let report = call(Args::from_raw(&raw).unwrap()).await.unwrap();
        assert!(report.contains("a.txt"));

        let read_args =
            super::super::read_file::Args::from_raw(&target.display().to_string()).unwrap();
        let read_back = super::super::read_file::call(read_args).await.unwrap();
        assert_eq!(read_back, "Hello from the agent.");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn pipes_in_content_survive_the_round_trip() {
        let dir = std::env::temp_dir().join(format!("gofer-pipes-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let target = dir.join("b.txt");

        let raw = format!("{}|a|b", target.display());
        call(Args::from_raw(&raw).unwrap()).await.unwrap();

        let read_args =
            super::super::read_file::Args::from_raw(&target.display().to_string()).unwrap();
        let read_back = super::super::read_file::call(read_args).await.unwrap();
        assert_eq!(read_back, "a|b");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
