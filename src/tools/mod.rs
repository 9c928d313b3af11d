//! The agent's capabilities: file I/O, shell commands, web search.

pub mod common;
pub mod executor;
pub mod registry;

mod read_file;
mod run_cmd;
mod search_web;
mod write_file;

pub use executor::{Budgets, Failure, FailureKind, Outcome, ToolExecutor, ToolResult};
pub use registry::{RegistryError, ToolRegistry};

pub use run_cmd::NAME as RUN_CMD;

/// Assemble the built-in tool set. Any registration conflict here is a
/// startup error; the process must not reach its first turn with an
/// ambiguous table.
pub fn builtin_registry(client: &reqwest::Client) -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    registry.register(read_file::entry())?;
    registry.register(write_file::entry())?;
    registry.register(run_cmd::entry())?;
    registry.register(search_web::entry(client.clone()))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_set_registers_cleanly() {
        let registry = builtin_registry(&reqwest::Client::new()).unwrap();
        for name in ["read_file", "write_file", "run_cmd", "search_web"] {
            assert!(registry.resolve(name).is_some(), "missing {name}");
        }
        assert_eq!(registry.len(), 4);
    }
}
