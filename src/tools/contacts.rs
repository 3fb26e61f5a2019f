//! Contact tools
//!
//! One read handler (list/search) and one write handler (create), both a
//! single coherent unit of work against the `contacts` table.

use crate::auth::{Actor, AuthContext};
use crate::crm::CrmClient;
use crate::error::Result;
use crate::tools::{optional_str, optional_u64, required_str, ReadTool, ToolOutcome, WriteTool};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

const DEFAULT_LIST_LIMIT: u64 = 20;

/// Lists or searches contacts
pub struct ListContactsTool {
    crm: Arc<CrmClient>,
}

impl ListContactsTool {
    pub fn new(crm: Arc<CrmClient>) -> Self {
        Self { crm }
    }
}

#[async_trait]
impl ReadTool for ListContactsTool {
    fn definition(&self) -> Value {
        json!({
            "name": "list_contacts",
            "description": "List the user's contacts, optionally filtered by a search term.",
            "parameters": {
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search term matched against name, email, and company"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of contacts to return (default 20)"
                    }
                }
            }
        })
    }

    async fn call(&self, args: Value, ctx: &AuthContext) -> Result<ToolOutcome> {
        let limit = optional_u64(&args, "limit").unwrap_or(DEFAULT_LIST_LIMIT);
        let mut filters = vec![("limit", limit.to_string())];
        if let Some(query) = optional_str(&args, "query") {
            filters.push(("q", query.to_string()));
        }

        let contacts = self.crm.read("contacts", &filters, Some(&ctx.cookie)).await?;
        let count = contacts.as_array().map(Vec::len).unwrap_or(0);
        Ok(ToolOutcome::ok(json!({
            "contacts": contacts,
            "count": count,
        })))
    }
}

/// Creates a contact attributed to the acting user
pub struct CreateContactTool {
    crm: Arc<CrmClient>,
}

impl CreateContactTool {
    pub fn new(crm: Arc<CrmClient>) -> Self {
        Self { crm }
    }
}

#[async_trait]
impl WriteTool for CreateContactTool {
    fn definition(&self) -> Value {
        json!({
            "name": "create_contact",
            "description": "Create a new contact. Requires a name; email, phone, and company are optional.",
            "parameters": {
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Full name of the contact" },
                    "email": { "type": "string", "description": "Email address" },
                    "phone": { "type": "string", "description": "Phone number" },
                    "company": { "type": "string", "description": "Company the contact works for" }
                },
                "required": ["name"]
            }
        })
    }

    async fn call(&self, actor: &Actor, args: Value, ctx: &AuthContext) -> Result<ToolOutcome> {
        let name = required_str(&args, "name")?;

        let mut payload = json!({
            "name": name,
            "owner_id": actor.id,
        });
        for field in ["email", "phone", "company"] {
            if let Some(value) = optional_str(&args, field) {
                payload[field] = Value::String(value.to_string());
            }
        }

        let created = self.crm.create("contacts", &payload, Some(&ctx.cookie)).await?;
        Ok(ToolOutcome::ok(json!({ "ok": true, "contact": created })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrmConfig;

    fn crm() -> Arc<CrmClient> {
        Arc::new(CrmClient::new(CrmConfig::default()).unwrap())
    }

    #[test]
    fn test_list_definition_shape() {
        let tool = ListContactsTool::new(crm());
        let def = tool.definition();
        assert_eq!(def["name"], "list_contacts");
        assert!(def["parameters"]["properties"]["query"].is_object());
    }

    #[test]
    fn test_create_definition_requires_name() {
        let tool = CreateContactTool::new(crm());
        let def = tool.definition();
        assert_eq!(def["parameters"]["required"][0], "name");
    }
}
