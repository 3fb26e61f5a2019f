//! UI-state tools
//!
//! Filter, search-box, and form-opening directives. Like navigation these
//! return only a `client_action`; the separation between "tell the UI what
//! to do" and "mutate the database" is deliberate.

use crate::agent::actions::ClientAction;
use crate::auth::AuthContext;
use crate::error::Result;
use crate::tools::{required_str, ReadTool, ToolOutcome};
use async_trait::async_trait;
use serde_json::{json, Value};

/// List views whose filters and search boxes the agent can drive
const SCOPES: [&str; 3] = ["contacts", "pipeline", "activities"];

/// Forms the agent can open
const FORMS: [&str; 3] = ["contact", "deal", "activity"];

fn validate_scope(scope: &str) -> Result<()> {
    if SCOPES.contains(&scope) {
        Ok(())
    } else {
        anyhow::bail!("unknown scope '{}', expected one of: {}", scope, SCOPES.join(", "))
    }
}

/// Applies a filter to a list view
pub struct SetFilterTool;

#[async_trait]
impl ReadTool for SetFilterTool {
    fn definition(&self) -> Value {
        json!({
            "name": "set_filter",
            "description": "Filter a list view by a field value, e.g. show only deals in a stage.",
            "parameters": {
                "type": "object",
                "properties": {
                    "scope": { "type": "string", "enum": SCOPES, "description": "List view to filter" },
                    "field": { "type": "string", "description": "Field to filter on" },
                    "value": { "type": "string", "description": "Value to filter for" }
                },
                "required": ["scope", "field", "value"]
            }
        })
    }

    async fn call(&self, args: Value, _ctx: &AuthContext) -> Result<ToolOutcome> {
        let scope = required_str(&args, "scope")?;
        let field = required_str(&args, "field")?;
        let value = required_str(&args, "value")?;
        validate_scope(scope)?;

        Ok(
            ToolOutcome::ok(json!({ "ok": true })).with_action(ClientAction::UiAction {
                scope: scope.to_string(),
                action: "set_filter".to_string(),
                payload: json!({ "field": field, "value": value }),
            }),
        )
    }
}

/// Fills the search box of a list view
pub struct SetSearchTool;

#[async_trait]
impl ReadTool for SetSearchTool {
    fn definition(&self) -> Value {
        json!({
            "name": "set_search",
            "description": "Type a query into the search box of a list view.",
            "parameters": {
                "type": "object",
                "properties": {
                    "scope": { "type": "string", "enum": SCOPES, "description": "List view to search in" },
                    "query": { "type": "string", "description": "Search text" }
                },
                "required": ["scope", "query"]
            }
        })
    }

    async fn call(&self, args: Value, _ctx: &AuthContext) -> Result<ToolOutcome> {
        let scope = required_str(&args, "scope")?;
        let query = required_str(&args, "query")?;
        validate_scope(scope)?;

        Ok(
            ToolOutcome::ok(json!({ "ok": true })).with_action(ClientAction::UiAction {
                scope: scope.to_string(),
                action: "set_search".to_string(),
                payload: json!({ "query": query }),
            }),
        )
    }
}

/// Opens a create form as a modal
pub struct OpenFormTool;

#[async_trait]
impl ReadTool for OpenFormTool {
    fn definition(&self) -> Value {
        json!({
            "name": "open_form",
            "description": "Open a create form for the user to fill in manually.",
            "parameters": {
                "type": "object",
                "properties": {
                    "form": { "type": "string", "enum": FORMS, "description": "Form to open" }
                },
                "required": ["form"]
            }
        })
    }

    async fn call(&self, args: Value, _ctx: &AuthContext) -> Result<ToolOutcome> {
        let form = required_str(&args, "form")?;
        if !FORMS.contains(&form) {
            anyhow::bail!("unknown form '{}', expected one of: {}", form, FORMS.join(", "));
        }

        Ok(
            ToolOutcome::ok(json!({ "ok": true })).with_action(ClientAction::UiAction {
                scope: "forms".to_string(),
                action: "open_form".to_string(),
                payload: json!({ "form": form }),
            }),
        )
    }
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

    #[tokio::test]
    async fn test_set_filter_emits_action() {
        let outcome = SetFilterTool
            .call(
                json!({"scope": "pipeline", "field": "stage", "value": "won"}),
                &test_ctx(),
            )
            .await
            .unwrap();

        match outcome.client_action.unwrap() {
            ClientAction::UiAction { scope, action, payload } => {
                assert_eq!(scope, "pipeline");
                assert_eq!(action, "set_filter");
                assert_eq!(payload["field"], "stage");
                assert_eq!(payload["value"], "won");
            }
            other => panic!("expected ui_action, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_set_filter_rejects_unknown_scope() {
        let result = SetFilterTool
            .call(
                json!({"scope": "billing", "field": "x", "value": "y"}),
                &test_ctx(),
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_set_search_emits_action() {
        let outcome = SetSearchTool
            .call(json!({"scope": "contacts", "query": "acme"}), &test_ctx())
            .await
            .unwrap();
        match outcome.client_action.unwrap() {
            ClientAction::UiAction { action, payload, .. } => {
                assert_eq!(action, "set_search");
                assert_eq!(payload["query"], "acme");
            }
            other => panic!("expected ui_action, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_open_form_emits_action() {
        let outcome = OpenFormTool
            .call(json!({"form": "deal"}), &test_ctx())
            .await
            .unwrap();
        match outcome.client_action.unwrap() {
            ClientAction::UiAction { scope, action, payload } => {
                assert_eq!(scope, "forms");
                assert_eq!(action, "open_form");
                assert_eq!(payload["form"], "deal");
            }
            other => panic!("expected ui_action, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_open_form_rejects_unknown_form() {
        let result = OpenFormTool.call(json!({"form": "invoice"}), &test_ctx()).await;
        assert!(result.is_err());
    }
}
