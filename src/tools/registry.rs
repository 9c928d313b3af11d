//! The static name → handler table, built once at startup.

use std::collections::BTreeMap;

use super::common::AsyncTool;
use super::executor::Failure;

/// One pipe-delimited sub-field of a tool's single string payload.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: &'static str,
    pub desc: &'static str,
    pub required: bool,
}

impl Param {
    pub fn required(name: &'static str, desc: &'static str) -> Self {
        Self {
            name,
            desc,
            required: true,
        }
    }
}

/// Execution class; decides which budget and retry policy applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolClass {
    File,
    Network,
    Command,
}

/// A registered tool: its description for the prompt, its argument
/// convention, and the handler itself.
pub struct ToolEntry {
    pub name: &'static str,
    pub desc: &'static str,
    pub params: Vec<Param>,
    pub class: ToolClass,
    handler: AsyncTool,
}

impl ToolEntry {
    pub fn new(
        name: &'static str,
        desc: &'static str,
        params: Vec<Param>,
        class: ToolClass,
        handler: AsyncTool,
    ) -> Self {
        Self {
            name,
            desc,
            params,
            class,
            handler,
        }
    }

    pub fn invoke(
        &self,
        raw: String,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<String, Failure>> + Send>>
    {
        (self.handler)(raw)
    }

    /// `path|content`-style signature for the prompt.
    pub fn signature(&self) -> String {
        let fields: Vec<&str> = self.params.iter().map(|p| p.name).collect();
        fields.join("|")
    }
}

/// Registration problems are fatal: they abort startup before any
/// conversation turn begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    Duplicate { name: String },
    InvalidName { name: String },
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::Duplicate { name } => {
                write!(f, "tool `{name}` registered twice")
            }
            RegistryError::InvalidName { name } => {
                write!(f, "tool name `{name}` is not identifier-shaped")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Immutable after startup; the only state shared across a session.
#[derive(Default)]
pub struct ToolRegistry {
    entries: BTreeMap<&'static str, ToolEntry>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. Duplicate names and names that could not round-trip
    /// through the action block format are rejected here, not at dispatch.
    pub fn register(&mut self, entry: ToolEntry) -> Result<(), RegistryError> {
        if !is_identifier_shaped(entry.name) {
            return Err(RegistryError::InvalidName {
                name: entry.name.to_string(),
            });
        }
        if self.entries.contains_key(entry.name) {
            return Err(RegistryError::Duplicate {
                name: entry.name.to_string(),
            });
        }
        self.entries.insert(entry.name, entry);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Option<&ToolEntry> {
        self.entries.get(name)
    }

    /// Entries in stable name order, for prompt rendering and listings.
    pub fn entries(&self) -> impl Iterator<Item = &ToolEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Tool names travel inside JSON and prompts; keep them identifier-shaped.
fn is_identifier_shaped(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first == '_' || unicode_ident::is_xid_start(first)) {
        return false;
    }
    chars.all(|c| c == '_' || unicode_ident::is_xid_continue(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_entry(name: &'static str) -> ToolEntry {
        let handler: AsyncTool = Box::new(|_raw| Box::pin(async { Ok(String::new()) }));
        ToolEntry::new(
            name,
            "does nothing",
            vec![Param::required("args", "ignored")],
            ToolClass::File,
            handler,
        )
    }

    #[test]
    fn duplicate_registration_fails_fast() {
        let mut registry = ToolRegistry::new();
        registry.register(noop_entry("read_file")).unwrap();
        let err = registry.register(noop_entry("read_file")).unwrap_err();
        assert_eq!(
            err,
            RegistryError::Duplicate {
                name: "read_file".to_string()
            }
        );
    }

    #[test]
    fn names_must_be_identifier_shaped() {
        let mut registry = ToolRegistry::new();
        for bad in ["", "with space", "1starts_with_digit", "pipe|name"] {
            // Leak is fine in tests; registration needs 'static names.
            let name: &'static str = Box::leak(bad.to_string().into_boxed_str());
            assert!(
                registry.register(noop_entry(name)).is_err(),
                "accepted {bad:?}"
            );
        }
        registry.register(noop_entry("run_cmd")).unwrap();
    }

    #[test]
    fn resolve_is_exact() {
        let mut registry = ToolRegistry::new();
        registry.register(noop_entry("search_web")).unwrap();
        assert!(registry.resolve("search_web").is_some());
        assert!(registry.resolve("Search_Web").is_none());
        assert!(registry.resolve("delete_universe").is_none());
    }

    #[test]
    fn signature_joins_fields_with_pipes() {
        let handler: AsyncTool = Box::new(|_raw| Box::pin(async { Ok(String::new()) }));
        let entry = ToolEntry::new(
            "write_file",
            "write",
            vec![
                Param::required("path", "where"),
                Param::required("content", "what"),
            ],
            ToolClass::File,
            handler,
        );
        assert_eq!(entry.signature(), "path|content");
    }
}
