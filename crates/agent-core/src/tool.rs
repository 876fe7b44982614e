//! Tool System
//!
//! Named capabilities the model can invoke with `Name[argument]`.
//! Tools are registered up front and resolved by name at dispatch time.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;

/// Tool trait - implement to add new capabilities
///
/// A tool takes the raw bracketed argument text and returns the observation
/// text. Errors are turned into observations by the loop, never propagated.
#[async_trait]
pub trait Tool: Send + Sync {
    async fn call(&self, input: &str) -> Result<String>;
}

/// Adapts a plain closure into a [`Tool`]
pub struct FnTool<F>(pub F);

#[async_trait]
impl<F> Tool for FnTool<F>
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    async fn call(&self, input: &str) -> Result<String> {
        (self.0)(input)
    }
}

struct ToolEntry {
    name: String,
    description: String,
    handler: Arc<dyn Tool>,
}

/// Registry for available tools
///
/// Names are case-sensitive. Registering an existing name replaces its
/// description and handler but keeps its original position in
/// [`ToolRegistry::describe_all`].
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<ToolEntry>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool already registered under `name`
    pub fn register<T: Tool + 'static>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        tool: T,
    ) {
        self.register_arc(name, description, Arc::new(tool));
    }

    /// Register a closure as a tool
    pub fn register_fn<F>(&mut self, name: impl Into<String>, description: impl Into<String>, f: F)
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        self.register(name, description, FnTool(f));
    }

    /// Register a shared tool
    pub fn register_arc(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        handler: Arc<dyn Tool>,
    ) {
        let name = name.into();
        let entry = ToolEntry {
            name: name.clone(),
            description: description.into(),
            handler,
        };

        if let Some(&idx) = self.index.get(&name) {
            tracing::warn!(tool = %name, "Tool already registered, overwriting");
            self.entries[idx] = entry;
        } else {
            tracing::debug!(tool = %name, "Registered tool");
            self.index.insert(name, self.entries.len());
            self.entries.push(entry);
        }
    }

    /// Get a tool handler by name
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index
            .get(name)
            .map(|&idx| Arc::clone(&self.entries[idx].handler))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// `- {name}: {description}` per tool, in registration order
    pub fn describe_all(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("- {}: {}", e.name, e.description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Tool names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;

    struct Upper;

    #[async_trait]
    impl Tool for Upper {
        async fn call(&self, input: &str) -> Result<String> {
            Ok(input.to_uppercase())
        }
    }

    #[tokio::test]
    async fn test_tool_registry() {
        let mut registry = ToolRegistry::new();
        registry.register("Upper", "Uppercases text", Upper);
        registry.register_fn("Echo", "Echoes input", |s| Ok(s.to_string()));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("Upper"));
        assert!(registry.resolve("upper").is_none());
        assert!(registry.resolve("unknown").is_none());

        let upper = registry.resolve("Upper").unwrap();
        assert_eq!(upper.call("abc").await.unwrap(), "ABC");
    }

    #[test]
    fn test_describe_all_in_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register_fn("Search", "Web search", |s| Ok(s.into()));
        registry.register_fn("Weather", "Current weather", |s| Ok(s.into()));
        registry.register_fn("Attraction", "Sights to see", |s| Ok(s.into()));

        assert_eq!(
            registry.describe_all(),
            "- Search: Web search\n- Weather: Current weather\n- Attraction: Sights to see"
        );
        assert_eq!(registry.names(), ["Search", "Weather", "Attraction"]);
    }

    #[tokio::test]
    async fn test_overwrite_last_registration_wins() {
        let mut registry = ToolRegistry::new();
        registry.register_fn("Search", "old", |_| Ok("old".into()));
        registry.register_fn("Other", "other", |_| Ok("other".into()));
        registry.register_fn("Search", "new", |_| Ok("new".into()));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.describe_all(), "- Search: new\n- Other: other");
        let search = registry.resolve("Search").unwrap();
        assert_eq!(search.call("q").await.unwrap(), "new");
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_overwrite_logs_warning() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut registry = ToolRegistry::new();
            registry.register_fn("Search", "old", |_| Ok("old".into()));
            registry.register_fn("Weather", "fresh", |_| Ok("w".into()));
            registry.register_fn("Search", "new", |_| Ok("new".into()));
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output.matches("overwriting").count(), 1, "{output}");
        assert!(output.contains("WARN"));
        assert!(output.contains("tool=Search"));
    }

    #[tokio::test]
    async fn test_fn_tool_propagates_errors() {
        let tool = FnTool(|_: &str| -> Result<String> {
            Err(AgentError::ToolExecution("boom".into()))
        });
        assert!(matches!(
            tool.call("x").await,
            Err(AgentError::ToolExecution(msg)) if msg == "boom"
        ));
    }
}
