//! Activity logging tool
//!
//! Logs a call, email, meeting, or note against a contact or deal.

use crate::auth::{Actor, AuthContext};
use crate::crm::CrmClient;
use crate::error::Result;
use crate::tools::{optional_str, required_str, ToolOutcome, WriteTool};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

const KINDS: [&str; 4] = ["call", "email", "meeting", "note"];

/// Logs an activity attributed to the acting user
pub struct LogActivityTool {
    crm: Arc<CrmClient>,
}

impl LogActivityTool {
    pub fn new(crm: Arc<CrmClient>) -> Self {
        Self { crm }
    }
}

#[async_trait]
impl WriteTool for LogActivityTool {
    fn definition(&self) -> Value {
        json!({
            "name": "log_activity",
            "description": "Log an activity (call, email, meeting, or note), optionally linked to a contact or deal.",
            "parameters": {
                "type": "object",
                "properties": {
                    "kind": {
                        "type": "string",
                        "enum": KINDS,
                        "description": "Kind of activity"
                    },
                    "note": { "type": "string", "description": "What happened" },
                    "contact_id": { "type": "string", "description": "Contact the activity relates to" },
                    "deal_id": { "type": "string", "description": "Deal the activity relates to" }
                },
                "required": ["kind", "note"]
            }
        })
    }

    async fn call(&self, actor: &Actor, args: Value, ctx: &AuthContext) -> Result<ToolOutcome> {
        let kind = required_str(&args, "kind")?;
        let note = required_str(&args, "note")?;
        if !KINDS.contains(&kind) {
            anyhow::bail!("unknown activity kind '{}', expected one of: {}", kind, KINDS.join(", "));
        }

        let mut payload = json!({
            "kind": kind,
            "note": note,
            "user_id": actor.id,
            "user_name": actor.name,
        });
        for field in ["contact_id", "deal_id"] {
            if let Some(value) = optional_str(&args, field) {
                payload[field] = Value::String(value.to_string());
            }
        }

        let created = self.crm.create("activities", &payload, Some(&ctx.cookie)).await?;
        Ok(ToolOutcome::ok(json!({ "ok": true, "activity": created })))
    }
}
