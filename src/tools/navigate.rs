//! Navigation tool
//!
//! Pure UI directive: maps a closed set of logical targets to routes and
//! returns a `client_action` without touching CRM data.

use crate::agent::actions::ClientAction;
use crate::auth::AuthContext;
use crate::error::Result;
use crate::tools::{required_str, ReadTool, ToolOutcome};
use async_trait::async_trait;
use serde_json::{json, Value};

/// The navigable pages of the CRM, as (target, route) pairs
const TARGETS: [(&str, &str); 6] = [
    ("dashboard", "/"),
    ("contacts", "/contacts"),
    ("pipeline", "/pipeline"),
    ("activities", "/activities"),
    ("reports", "/reports"),
    ("settings", "/settings"),
];

fn route_for(target: &str) -> Option<&'static str> {
    TARGETS
        .iter()
        .find(|(name, _)| *name == target)
        .map(|(_, route)| *route)
}

/// Navigates the UI to a named page
pub struct NavigateTool;

#[async_trait]
impl ReadTool for NavigateTool {
    fn definition(&self) -> Value {
        let targets: Vec<&str> = TARGETS.iter().map(|(name, _)| *name).collect();
        json!({
            "name": "navigate",
            "description": "Open a page of the CRM for the user. Use when the user asks to open, show, or go to a page.",
            "parameters": {
                "type": "object",
                "properties": {
                    "target": {
                        "type": "string",
                        "enum": targets,
                        "description": "Page to open"
                    }
                },
                "required": ["target"]
            }
        })
    }

    async fn call(&self, args: Value, _ctx: &AuthContext) -> Result<ToolOutcome> {
        let target = required_str(&args, "target")?;
        let route = route_for(target).ok_or_else(|| {
            anyhow::anyhow!(
                "unknown navigation target '{}', expected one of: {}",
                target,
                TARGETS.map(|(name, _)| name).join(", ")
            )
        })?;

        Ok(
            ToolOutcome::ok(json!({ "ok": true })).with_action(ClientAction::Navigate {
                route: route.to_string(),
                target: target.to_string(),
            }),
        )
    }
}
