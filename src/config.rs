//! Process configuration, read once from the environment at startup.

use std::path::PathBuf;
use std::time::Duration;

/// Everything tunable in one place. Values come from `GOFER_*` environment
/// variables and fall back to the listed defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Ollama-compatible endpoint serving `/api/chat`.
    pub oracle_url: String,
    /// Model name passed through to the oracle verbatim.
    pub model: String,
    /// Hard cap on oracle invocations within a single user turn.
    pub max_turns: usize,
    /// How many past exchanges stay in the context window.
    pub short_term_cap: usize,
    /// Timeout for local file tools.
    pub file_timeout: Duration,
    /// Timeout for network tools.
    pub net_timeout: Duration,
    /// Timeout for spawned commands.
    pub cmd_timeout: Duration,
    /// Where the long-term memory log lives.
    pub memory_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            oracle_url: "http://127.0.0.1:11434".to_string(),
            model: "gpt-oss:20b".to_string(),
            max_turns: 16,
            short_term_cap: 10,
            file_timeout: Duration::from_secs(5),
            net_timeout: Duration::from_secs(30),
            cmd_timeout: Duration::from_secs(60),
            memory_path: data_dir().join("memory.log"),
        }
    }
}

impl Config {
    /// Load the configuration, letting environment variables override defaults.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        if let Ok(url) = std::env::var("GOFER_ORACLE_URL") {
            config.oracle_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = std::env::var("GOFER_MODEL") {
            config.model = model;
        }
        if let Some(n) = env_usize("GOFER_MAX_TURNS") {
            config.max_turns = n.max(1);
        }
        if let Some(n) = env_usize("GOFER_SHORT_TERM_CAP") {
            config.short_term_cap = n.max(1);
        }
        if let Some(secs) = env_usize("GOFER_FILE_TIMEOUT_SECS") {
            config.file_timeout = Duration::from_secs(secs as u64);
        }
        if let Some(secs) = env_usize("GOFER_NET_TIMEOUT_SECS") {
            config.net_timeout = Duration::from_secs(secs as u64);
        }
        if let Some(secs) = env_usize("GOFER_CMD_TIMEOUT_SECS") {
            config.cmd_timeout = Duration::from_secs(secs as u64);
        }
        if let Ok(path) = std::env::var("GOFER_MEMORY_PATH") {
            config.memory_path = PathBuf::from(path);
        }
        config
    }
}

/// Default data directory under `~/.gofer`.
pub fn data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| String::from("."));
    PathBuf::from(home).join(".gofer")
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let c = Config::default();
        assert_eq!(c.max_turns, 16);
        assert_eq!(c.short_term_cap, 10);
        assert!(c.net_timeout > c.file_timeout);
        assert!(c.memory_path.ends_with("memory.log"));
    }
}
