//! Tools module for voxcrm
//!
//! This module contains the closed tool-name enumeration, the two handler
//! calling conventions (read and write), the registry that maps names to
//! handlers, and the executor the orchestration loop drives.
//!
//! Handler failures never abort a turn: the executor converts them into
//! in-band `{"error": ...}` results so the model can react in natural
//! language.

pub mod activities;
pub mod contacts;
pub mod deals;
pub mod navigate;
pub mod registry_builder;
pub mod ui_controls;

use crate::agent::actions::ClientAction;
use crate::auth::{Actor, AuthContext};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// All tools the agent can call, as a closed enumeration
///
/// New tools are added here first; the registry and the executor dispatch
/// on this type, so an unhandled variant is a compile error rather than a
/// runtime surprise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ToolName {
    /// Create a contact (write)
    CreateContact,
    /// Create a deal (write)
    CreateDeal,
    /// Log an activity against a contact or deal (write)
    LogActivity,
    /// Move a deal to another stage (write)
    UpdateDealStage,
    /// List or search contacts (read)
    ListContacts,
    /// Search deals by stage or text (read)
    SearchDeals,
    /// Aggregate the pipeline per stage (read)
    PipelineSummary,
    /// Navigate the UI (client action only)
    Navigate,
    /// Set a list filter in the UI (client action only)
    SetFilter,
    /// Fill a search box in the UI (client action only)
    SetSearch,
    /// Open a create form in the UI (client action only)
    OpenForm,
}

impl ToolName {
    /// Every tool, in registry order
    pub const ALL: [ToolName; 11] = [
        ToolName::CreateContact,
        ToolName::CreateDeal,
        ToolName::LogActivity,
        ToolName::UpdateDealStage,
        ToolName::ListContacts,
        ToolName::SearchDeals,
        ToolName::PipelineSummary,
        ToolName::Navigate,
        ToolName::SetFilter,
        ToolName::SetSearch,
        ToolName::OpenForm,
    ];

    /// The wire name the model calls the tool by
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::CreateContact => "create_contact",
            ToolName::CreateDeal => "create_deal",
            ToolName::LogActivity => "log_activity",
            ToolName::UpdateDealStage => "update_deal_stage",
            ToolName::ListContacts => "list_contacts",
            ToolName::SearchDeals => "search_deals",
            ToolName::PipelineSummary => "pipeline_summary",
            ToolName::Navigate => "navigate",
            ToolName::SetFilter => "set_filter",
            ToolName::SetSearch => "set_search",
            ToolName::OpenForm => "open_form",
        }
    }

    /// Parses a wire name; unknown names are `None`, not an error
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == name)
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one tool execution
///
/// `data` is the JSON-shaped result fed back to the model; `client_action`
/// is the optional UI directive routed to the action collector. When both
/// are present, the serialized tool message carries the action under a
/// `client_action` field so the transcript matches what the UI was told.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    /// JSON result returned to the model
    pub data: Value,
    /// Optional UI directive
    pub client_action: Option<ClientAction>,
}

impl ToolOutcome {
    /// Creates a plain data outcome
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            client_action: None,
        }
    }

    /// Creates an in-band error outcome
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            data: json!({ "error": message.into() }),
            client_action: None,
        }
    }

    /// Attaches a client action to the outcome
    pub fn with_action(mut self, action: ClientAction) -> Self {
        self.client_action = Some(action);
        self
    }

    /// Serializes the outcome for the `tool` transcript message
    pub fn to_message(&self) -> String {
        let mut data = self.data.clone();
        if let (Some(action), Some(obj)) = (&self.client_action, data.as_object_mut()) {
            obj.insert(
                "client_action".to_string(),
                serde_json::to_value(action).unwrap_or(Value::Null),
            );
        }
        data.to_string()
    }
}

/// Read-convention tool handler
///
/// Reads and UI-only tools need the caller's auth context but no actor
/// attribution.
#[async_trait]
pub trait ReadTool: Send + Sync {
    /// Returns the tool definition in chat-completions function format
    fn definition(&self) -> Value;

    /// Executes the tool with the given arguments
    async fn call(&self, args: Value, ctx: &AuthContext) -> Result<ToolOutcome>;
}

/// Write-convention tool handler
///
/// Writes additionally receive the acting user for attribution on the
/// created or mutated rows.
#[async_trait]
pub trait WriteTool: Send + Sync {
    /// Returns the tool definition in chat-completions function format
    fn definition(&self) -> Value;

    /// Executes the tool as the given actor
    async fn call(&self, actor: &Actor, args: Value, ctx: &AuthContext) -> Result<ToolOutcome>;
}

/// A registered handler, tagged by calling convention
///
/// The executor dispatches on this union; there is no name-set membership
/// check deciding how a tool is invoked.
#[derive(Clone)]
pub enum ToolHandler {
    /// Read-convention handler
    Read(Arc<dyn ReadTool>),
    /// Write-convention handler
    Write(Arc<dyn WriteTool>),
}

impl ToolHandler {
    fn definition(&self) -> Value {
        match self {
            ToolHandler::Read(tool) => tool.definition(),
            ToolHandler::Write(tool) => tool.definition(),
        }
    }
}

/// Tool registry mapping tool names to handlers
///
/// Built once at startup; pure lookup table afterwards.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<ToolName, ToolHandler>,
}

impl ToolRegistry {
    /// Creates a new empty tool registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under a tool name
    pub fn register(&mut self, name: ToolName, handler: ToolHandler) {
        self.tools.insert(name, handler);
    }

    /// Gets a handler by name
    pub fn get(&self, name: ToolName) -> Option<&ToolHandler> {
        self.tools.get(&name)
    }

    /// Returns all tool definitions in registry order
    pub fn all_definitions(&self) -> Vec<Value> {
        self.tools
            .values()
            .map(|handler| handler.definition())
            .collect()
    }

    /// Returns the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns true if no tools are registered
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Executes tool calls requested by the model
///
/// All failure modes are in-band: unknown names, unparseable arguments,
/// and handler errors each produce an `{"error": ...}` outcome instead of
/// propagating, which keeps the orchestration loop uniform.
pub struct ToolExecutor {
    registry: ToolRegistry,
}

impl ToolExecutor {
    /// Creates an executor over a registry
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    /// Returns the definitions of every registered tool
    pub fn definitions(&self) -> Vec<Value> {
        self.registry.all_definitions()
    }

    /// Returns the number of registered tools
    pub fn num_tools(&self) -> usize {
        self.registry.len()
    }

    /// Executes one tool call
    ///
    /// # Arguments
    ///
    /// * `name` - Wire name the model requested
    /// * `args` - Parsed JSON arguments
    /// * `ctx` - The caller's auth context; write tools also receive the
    ///   actor derived from it
    pub async fn execute(&self, name: &str, args: Value, ctx: &AuthContext) -> ToolOutcome {
        let Some(tool_name) = ToolName::parse(name) else {
            tracing::warn!("Model requested unknown tool: {}", name);
            return ToolOutcome::error("Unknown tool");
        };

        let Some(handler) = self.registry.get(tool_name) else {
            tracing::warn!("Tool {} is not registered", tool_name);
            return ToolOutcome::error("Unknown tool");
        };

        let result = match handler {
            ToolHandler::Read(tool) => tool.call(args, ctx).await,
            ToolHandler::Write(tool) => tool.call(&ctx.actor(), args, ctx).await,
        };

        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("Tool {} failed: {}", tool_name, e);
                ToolOutcome::error(e.to_string())
            }
        }
    }
}

/// Extracts a required string argument
pub(crate) fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("missing required argument: {}", key))
}

/// Extracts an optional string argument
pub(crate) fn optional_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Extracts an optional positive integer argument
pub(crate) fn optional_u64(args: &Value, key: &str) -> Option<u64> {
    args.get(key).and_then(Value::as_u64).filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_ctx() -> AuthContext {
        AuthContext {
            user_id: "u-1".to_string(),
            display_name: "Ana".to_string(),
            cookie: "crm_session=x".to_string(),
        }
    }

    struct EchoReadTool;

    #[async_trait]
    impl ReadTool for EchoReadTool {
        fn definition(&self) -> Value {
            json!({"name": "list_contacts", "description": "echo", "parameters": {"type": "object"}})
        }

        async fn call(&self, args: Value, _ctx: &AuthContext) -> Result<ToolOutcome> {
            Ok(ToolOutcome::ok(json!({ "echo": args })))
        }
    }

    struct AttributingWriteTool;

    #[async_trait]
    impl WriteTool for AttributingWriteTool {
        fn definition(&self) -> Value {
            json!({"name": "create_contact", "description": "write", "parameters": {"type": "object"}})
        }

        async fn call(
            &self,
            actor: &Actor,
            _args: Value,
            _ctx: &AuthContext,
        ) -> Result<ToolOutcome> {
            Ok(ToolOutcome::ok(json!({ "ok": true, "owner": actor.id })))
        }
    }

    struct FailingReadTool;

    #[async_trait]
    impl ReadTool for FailingReadTool {
        fn definition(&self) -> Value {
            json!({"name": "search_deals", "description": "fails", "parameters": {"type": "object"}})
        }

        async fn call(&self, _args: Value, _ctx: &AuthContext) -> Result<ToolOutcome> {
            anyhow::bail!("upstream exploded")
        }
    }

    #[test]
    fn test_tool_name_roundtrip() {
        for tool in ToolName::ALL {
            assert_eq!(ToolName::parse(tool.as_str()), Some(tool));
        }
    }

    #[test]
    fn test_tool_name_unknown() {
        assert_eq!(ToolName::parse("drop_database"), None);
    }

    #[test]
    fn test_outcome_message_plain() {
        let outcome = ToolOutcome::ok(json!({"ok": true}));
        assert_eq!(outcome.to_message(), r#"{"ok":true}"#);
    }

    #[test]
    fn test_outcome_message_includes_client_action() {
        let outcome = ToolOutcome::ok(json!({"ok": true})).with_action(ClientAction::Navigate {
            route: "/pipeline".to_string(),
            target: "pipeline".to_string(),
        });
        let message = outcome.to_message();
        let value: Value = serde_json::from_str(&message).unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(value["client_action"]["type"], "navigate");
        assert_eq!(value["client_action"]["route"], "/pipeline");
    }

    #[test]
    fn test_registry_register_and_get() {
        let mut registry = ToolRegistry::new();
        registry.register(ToolName::ListContacts, ToolHandler::Read(Arc::new(EchoReadTool)));
        assert_eq!(registry.len(), 1);
        assert!(registry.get(ToolName::ListContacts).is_some());
        assert!(registry.get(ToolName::Navigate).is_none());
    }

    #[tokio::test]
    async fn test_executor_unknown_tool_is_in_band() {
        let executor = ToolExecutor::new(ToolRegistry::new());
        let outcome = executor.execute("nonexistent", json!({}), &test_ctx()).await;
        assert_eq!(outcome.data["error"], "Unknown tool");
    }

    #[tokio::test]
    async fn test_executor_unregistered_known_name_is_in_band() {
        let executor = ToolExecutor::new(ToolRegistry::new());
        let outcome = executor.execute("navigate", json!({}), &test_ctx()).await;
        assert_eq!(outcome.data["error"], "Unknown tool");
    }

    #[tokio::test]
    async fn test_executor_dispatches_read() {
        let mut registry = ToolRegistry::new();
        registry.register(ToolName::ListContacts, ToolHandler::Read(Arc::new(EchoReadTool)));
        let executor = ToolExecutor::new(registry);

        let outcome = executor
            .execute("list_contacts", json!({"query": "ana"}), &test_ctx())
            .await;
        assert_eq!(outcome.data["echo"]["query"], "ana");
    }

    #[tokio::test]
    async fn test_executor_dispatches_write_with_actor() {
        let mut registry = ToolRegistry::new();
        registry.register(
            ToolName::CreateContact,
            ToolHandler::Write(Arc::new(AttributingWriteTool)),
        );
        let executor = ToolExecutor::new(registry);

        let outcome = executor.execute("create_contact", json!({}), &test_ctx()).await;
        assert_eq!(outcome.data["owner"], "u-1");
    }

    #[tokio::test]
    async fn test_executor_converts_handler_error() {
        let mut registry = ToolRegistry::new();
        registry.register(ToolName::SearchDeals, ToolHandler::Read(Arc::new(FailingReadTool)));
        let executor = ToolExecutor::new(registry);

        let outcome = executor.execute("search_deals", json!({}), &test_ctx()).await;
        assert_eq!(outcome.data["error"], "upstream exploded");
    }

    #[test]
    fn test_required_str_helpers() {
        let args = json!({"name": "Acme", "blank": "  "});
        assert_eq!(required_str(&args, "name").unwrap(), "Acme");
        assert!(required_str(&args, "blank").is_err());
        assert!(required_str(&args, "missing").is_err());
        assert_eq!(optional_str(&args, "name"), Some("Acme"));
        assert_eq!(optional_str(&args, "blank"), None);
    }

    #[test]
    fn test_optional_u64_helper() {
        let args = json!({"limit": 25, "zero": 0, "text": "5"});
        assert_eq!(optional_u64(&args, "limit"), Some(25));
        assert_eq!(optional_u64(&args, "zero"), None);
        assert_eq!(optional_u64(&args, "text"), None);
    }
}
