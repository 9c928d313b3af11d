use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::{env, fs, io};

use super::executor::{Failure, FailureKind};

/// Anything that can be invoked with the raw single-string payload.
pub type AsyncTool = Box<
    dyn Fn(String) -> Pin<Box<dyn Future<Output = Result<String, Failure>> + Send>>
        + Send
        + Sync,
>;

/// Decode a tool's typed arguments from the raw payload string.
pub trait FromToolArgs: Sized {
    fn from_raw(raw: &str) -> Result<Self, Failure>;
}

/// Adapt a typed async handler to the uniform `Fn(String) -> Future` shape
/// the registry stores. Keeps strongly-typed ergonomics at the edges; the
/// closure is `Arc`-cloned for reuse.
pub fn with_args<Args, Fut, F>(f: F) -> AsyncTool
where
    Args: FromToolArgs + Send + 'static,
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, Failure>> + Send + 'static,
{
    let f = Arc::new(f);
    Box::new(move |raw: String| {
        let parsed = Args::from_raw(&raw);
        let f = Arc::clone(&f);
        Box::pin(async move {
            match parsed {
                Ok(args) => (f)(args).await,
                Err(failure) => Err(failure),
            }
        })
    })
}

/// Split a pipe-delimited payload into exactly two parts on the FIRST pipe.
/// The tail may legitimately contain more pipes; they belong to the content.
pub fn split_first_pipe(raw: &str) -> Option<(&str, &str)> {
    raw.split_once('|')
}

/// Expand a leading `~` to the given home directory.
pub fn expand_home(raw: &str, home: &Path) -> PathBuf {
    if raw == "~" {
        return home.to_path_buf();
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        return home.join(rest);
    }
    PathBuf::from(raw)
}

/// Resolve a user-supplied path against the allowed roots.
///
/// - `~` expands to the invoking user's home before any access.
/// - Relative paths are taken from the current directory.
/// - The result must land under one of `roots` after following symlinks
///   for the deepest existing ancestor; escaping is an access violation,
///   surfaced as `PermissionDenied`, never a raw fault.
pub fn resolve_within(raw: &str, home: &Path, roots: &[PathBuf]) -> Result<PathBuf, Failure> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Failure::new(FailureKind::InvalidArgs, "empty path"));
    }
    let expanded = expand_home(raw, home);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        env::current_dir()
            .map_err(|e| Failure::from_io(&e))?
            .join(expanded)
    };
    let real = soft_canonicalize(&absolute).map_err(|e| Failure::from_io(&e))?;
    for root in roots {
        if real.starts_with(root) {
            return Ok(real);
        }
    }
    Err(Failure::new(
        FailureKind::PermissionDenied,
        format!("{} is outside the allowed roots", real.display()),
    ))
}

/// The roots file tools may touch: the user's home, the working directory,
/// and the system temp directory.
pub fn allowed_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Ok(cwd) = env::current_dir()
        && let Ok(cwd) = cwd.canonicalize()
    {
        roots.push(cwd);
    }
    if let Ok(home) = home_dir().canonicalize() {
        roots.push(home);
    }
    if let Ok(tmp) = env::temp_dir().canonicalize() {
        roots.push(tmp);
    }
    roots
}

/// The invoking user's home, falling back to the current directory.
pub fn home_dir() -> PathBuf {
    env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Resolve a path with the process-wide policy applied.
pub fn resolve_tool_path(raw: &str) -> Result<PathBuf, Failure> {
    resolve_within(raw, &home_dir(), &allowed_roots())
}

/// Canonicalize the deepest existing ancestor of `p`, then append the missing
/// tail. This follows symlinks in the existing prefix but does not require
/// the leaf to exist.
pub fn soft_canonicalize<P: AsRef<Path>>(p: P) -> io::Result<PathBuf> {
    let mut probe = p.as_ref();

    // Peel off non-existent tail components.
    let mut tail = Vec::new();
    while fs::symlink_metadata(probe).is_err() {
        match probe.parent() {
            Some(parent) => {
                if let Some(name) = probe.file_name() {
                    tail.push(name.to_os_string());
                }
                probe = parent;
            }
            None => break,
        }
    }

    // Canonicalize the existing prefix (if any), then append the tail back.
    let mut base = if fs::symlink_metadata(probe).is_ok() {
        probe.canonicalize()?
    } else {
        PathBuf::new()
    };
    for seg in tail.into_iter().rev() {
        base.push(seg);
    }
    Ok(base)
}
