//! Default tool registry construction
//!
//! Builds the registry the server installs at startup: every tool the
//! agent can call, with CRM-backed handlers sharing one data-API client.

use std::sync::Arc;

use crate::crm::CrmClient;
use crate::tools::activities::LogActivityTool;
use crate::tools::contacts::{CreateContactTool, ListContactsTool};
use crate::tools::deals::{CreateDealTool, PipelineSummaryTool, SearchDealsTool, UpdateDealStageTool};
use crate::tools::navigate::NavigateTool;
use crate::tools::ui_controls::{OpenFormTool, SetFilterTool, SetSearchTool};
use crate::tools::{ToolHandler, ToolName, ToolRegistry};

/// Builds the default tool registry
///
/// # Arguments
///
/// * `crm` - Shared CRM data-API client for the data-backed handlers
pub fn build_default_registry(crm: Arc<CrmClient>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    // Write tools: need the acting user for attribution
    registry.register(
        ToolName::CreateContact,
        ToolHandler::Write(Arc::new(CreateContactTool::new(crm.clone()))),
    );
    registry.register(
        ToolName::CreateDeal,
        ToolHandler::Write(Arc::new(CreateDealTool::new(crm.clone()))),
    );
    registry.register(
        ToolName::LogActivity,
        ToolHandler::Write(Arc::new(LogActivityTool::new(crm.clone()))),
    );
    registry.register(
        ToolName::UpdateDealStage,
        ToolHandler::Write(Arc::new(UpdateDealStageTool::new(crm.clone()))),
    );

    // Read tools
    registry.register(
        ToolName::ListContacts,
        ToolHandler::Read(Arc::new(ListContactsTool::new(crm.clone()))),
    );
    registry.register(
        ToolName::SearchDeals,
        ToolHandler::Read(Arc::new(SearchDealsTool::new(crm.clone()))),
    );
    registry.register(
        ToolName::PipelineSummary,
        ToolHandler::Read(Arc::new(PipelineSummaryTool::new(crm))),
    );

    // UI-only tools: no data mutation, client_action only
    registry.register(ToolName::Navigate, ToolHandler::Read(Arc::new(NavigateTool)));
    registry.register(ToolName::SetFilter, ToolHandler::Read(Arc::new(SetFilterTool)));
    registry.register(ToolName::SetSearch, ToolHandler::Read(Arc::new(SetSearchTool)));
    registry.register(ToolName::OpenForm, ToolHandler::Read(Arc::new(OpenFormTool)));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrmConfig;

    #[test]
    fn test_default_registry_is_complete() {
        let crm = Arc::new(CrmClient::new(CrmConfig::default()).unwrap());
        let registry = build_default_registry(crm);

        assert_eq!(registry.len(), ToolName::ALL.len());
        for tool in ToolName::ALL {
            assert!(registry.get(tool).is_some(), "missing handler for {}", tool);
        }
    }

    #[test]
    fn test_definitions_match_wire_names() {
        let crm = Arc::new(CrmClient::new(CrmConfig::default()).unwrap());
        let registry = build_default_registry(crm);

        let names: Vec<String> = registry
            .all_definitions()
            .iter()
            .map(|d| d["name"].as_str().unwrap().to_string())
            .collect();

        for tool in ToolName::ALL {
            assert!(names.contains(&tool.as_str().to_string()));
        }
    }
}
