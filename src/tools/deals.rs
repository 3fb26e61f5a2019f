//! Deal tools
//!
//! Read handlers for searching deals and aggregating the pipeline, plus
//! write handlers for creating deals and moving them between stages.

use crate::auth::{Actor, AuthContext};
use crate::crm::CrmClient;
use crate::error::Result;
use crate::tools::{optional_str, optional_u64, required_str, ReadTool, ToolOutcome, WriteTool};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

const DEFAULT_SEARCH_LIMIT: u64 = 20;

/// The pipeline stages a deal can be in
const STAGES: [&str; 5] = ["lead", "qualified", "proposal", "won", "lost"];

fn validate_stage(stage: &str) -> Result<()> {
    if STAGES.contains(&stage) {
        Ok(())
    } else {
        anyhow::bail!("unknown stage '{}', expected one of: {}", stage, STAGES.join(", "))
    }
}

/// Searches deals by stage and/or text
pub struct SearchDealsTool {
    crm: Arc<CrmClient>,
}

impl SearchDealsTool {
    pub fn new(crm: Arc<CrmClient>) -> Self {
        Self { crm }
    }
}

#[async_trait]
impl ReadTool for SearchDealsTool {
    fn definition(&self) -> Value {
        json!({
            "name": "search_deals",
            "description": "Search the user's deals, optionally filtered by pipeline stage or a search term.",
            "parameters": {
                "type": "object",
                "properties": {
                    "stage": {
                        "type": "string",
                        "enum": STAGES,
                        "description": "Pipeline stage to filter by"
                    },
                    "query": { "type": "string", "description": "Search term matched against the deal title" },
                    "limit": { "type": "integer", "description": "Maximum number of deals to return (default 20)" }
                }
            }
        })
    }

    async fn call(&self, args: Value, ctx: &AuthContext) -> Result<ToolOutcome> {
        let limit = optional_u64(&args, "limit").unwrap_or(DEFAULT_SEARCH_LIMIT);
        let mut filters = vec![("limit", limit.to_string())];
        if let Some(stage) = optional_str(&args, "stage") {
            validate_stage(stage)?;
            filters.push(("stage", stage.to_string()));
        }
        if let Some(query) = optional_str(&args, "query") {
            filters.push(("q", query.to_string()));
        }

        let deals = self.crm.read("deals", &filters, Some(&ctx.cookie)).await?;
        let count = deals.as_array().map(Vec::len).unwrap_or(0);
        Ok(ToolOutcome::ok(json!({ "deals": deals, "count": count })))
    }
}

/// Aggregates the pipeline: per-stage deal count and total value
pub struct PipelineSummaryTool {
    crm: Arc<CrmClient>,
}

impl PipelineSummaryTool {
    pub fn new(crm: Arc<CrmClient>) -> Self {
        Self { crm }
    }
}

#[async_trait]
impl ReadTool for PipelineSummaryTool {
    fn definition(&self) -> Value {
        json!({
            "name": "pipeline_summary",
            "description": "Summarize the sales pipeline: number of deals and total value per stage.",
            "parameters": { "type": "object", "properties": {} }
        })
    }

    async fn call(&self, _args: Value, ctx: &AuthContext) -> Result<ToolOutcome> {
        let deals = self.crm.read("deals", &[], Some(&ctx.cookie)).await?;
        let deals = deals.as_array().cloned().unwrap_or_default();

        let mut stages = Vec::with_capacity(STAGES.len());
        let mut total_count = 0usize;
        let mut total_value = 0.0f64;

        for stage in STAGES {
            let mut count = 0usize;
            let mut value = 0.0f64;
            for deal in &deals {
                if deal.get("stage").and_then(Value::as_str) == Some(stage) {
                    count += 1;
                    value += deal.get("value").and_then(Value::as_f64).unwrap_or(0.0);
                }
            }
            total_count += count;
            total_value += value;
            stages.push(json!({ "stage": stage, "count": count, "total_value": value }));
        }

        Ok(ToolOutcome::ok(json!({
            "stages": stages,
            "total_count": total_count,
            "total_value": total_value,
        })))
    }
}

/// Creates a deal attributed to the acting user
pub struct CreateDealTool {
    crm: Arc<CrmClient>,
}

impl CreateDealTool {
    pub fn new(crm: Arc<CrmClient>) -> Self {
        Self { crm }
    }
}

#[async_trait]
impl WriteTool for CreateDealTool {
    fn definition(&self) -> Value {
        json!({
            "name": "create_deal",
            "description": "Create a new deal. Requires a title; value, stage, and contact are optional.",
            "parameters": {
                "type": "object",
                "properties": {
                    "title": { "type": "string", "description": "Deal title" },
                    "value": { "type": "number", "description": "Deal value in the account currency" },
                    "stage": {
                        "type": "string",
                        "enum": STAGES,
                        "description": "Initial pipeline stage (default lead)"
                    },
                    "contact_id": { "type": "string", "description": "Contact to link the deal to" }
                },
                "required": ["title"]
            }
        })
    }

    async fn call(&self, actor: &Actor, args: Value, ctx: &AuthContext) -> Result<ToolOutcome> {
        let title = required_str(&args, "title")?;
        let stage = optional_str(&args, "stage").unwrap_or("lead");
        validate_stage(stage)?;

        let mut payload = json!({
            "title": title,
            "stage": stage,
            "owner_id": actor.id,
        });
        if let Some(value) = args.get("value").and_then(Value::as_f64) {
            payload["value"] = json!(value);
        }
        if let Some(contact_id) = optional_str(&args, "contact_id") {
            payload["contact_id"] = Value::String(contact_id.to_string());
        }

        let created = self.crm.create("deals", &payload, Some(&ctx.cookie)).await?;
        Ok(ToolOutcome::ok(json!({ "ok": true, "deal": created })))
    }
}

/// Moves a deal to another pipeline stage
pub struct UpdateDealStageTool {
    crm: Arc<CrmClient>,
}

impl UpdateDealStageTool {
    pub fn new(crm: Arc<CrmClient>) -> Self {
        Self { crm }
    }
}

#[async_trait]
impl WriteTool for UpdateDealStageTool {
    fn definition(&self) -> Value {
        json!({
            "name": "update_deal_stage",
            "description": "Move an existing deal to another pipeline stage.",
            "parameters": {
                "type": "object",
                "properties": {
                    "deal_id": { "type": "string", "description": "Identifier of the deal to move" },
                    "stage": {
                        "type": "string",
                        "enum": STAGES,
                        "description": "Stage to move the deal to"
                    }
                },
                "required": ["deal_id", "stage"]
            }
        })
    }

    async fn call(&self, actor: &Actor, args: Value, ctx: &AuthContext) -> Result<ToolOutcome> {
        let deal_id = required_str(&args, "deal_id")?;
        let stage = required_str(&args, "stage")?;
        validate_stage(stage)?;

        let payload = json!({ "stage": stage, "updated_by": actor.id });
        let updated = self
            .crm
            .update("deals", deal_id, &payload, Some(&ctx.cookie))
            .await?;
        Ok(ToolOutcome::ok(json!({ "ok": true, "deal": updated })))
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
    fn test_validate_stage() {
        assert!(validate_stage("lead").is_ok());
        assert!(validate_stage("won").is_ok());
        assert!(validate_stage("archived").is_err());
    }

    #[test]
    fn test_search_definition_enumerates_stages() {
        let tool = SearchDealsTool::new(crm());
        let def = tool.definition();
        let stages = def["parameters"]["properties"]["stage"]["enum"]
            .as_array()
            .unwrap();
        assert_eq!(stages.len(), 5);
    }

    #[test]
    fn test_update_definition_requires_both_fields() {
        let tool = UpdateDealStageTool::new(crm());
        let def = tool.definition();
        let required = def["parameters"]["required"].as_array().unwrap();
        assert_eq!(required.len(), 2);
    }
}
