//! Hire a new persona onto the team.
//!
//! Authority is checked against the caller's hire list: a persona may only
//! hire roles its handler declares. Hiring has no natural inverse and is
//! explicitly irreversible.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use devsquad_core::error::ErrorCode;
use devsquad_core::tool::{Tool, ToolContext, ToolResult};
use devsquad_core::{AgentInstance, PersonaRole};
use devsquad_store::ProjectStore;

pub struct HireAgentTool {
    store: Arc<dyn ProjectStore>,
}

impl HireAgentTool {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for HireAgentTool {
    fn name(&self) -> &str {
        "hire_agent"
    }

    fn description(&self) -> &str {
        "Hire a team member by role (architect, backend_lead, frontend_lead, qa). Hiring cannot be reversed."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "role": { "type": "string", "description": "architect | backend_lead | frontend_lead | qa" },
                "model": { "type": "string", "description": "Optional model override for the new agent" }
            },
            "required": ["role"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value, ctx: &ToolContext) -> ToolResult {
        let role_raw = arguments["role"].as_str().unwrap_or_default();

        let role = match serde_json::from_value::<PersonaRole>(serde_json::json!(role_raw)) {
            Ok(r) => r,
            Err(_) => {
                return ToolResult::failure(
                    "hire_agent",
                    ErrorCode::InvalidArgs,
                    format!("Unknown role '{role_raw}'"),
                );
            }
        };

        if !ctx.allowed_hires.contains(&role) {
            return ToolResult::failure(
                "hire_agent",
                ErrorCode::InsufficientAuthority,
                format!(
                    "{} is not authorized to hire a {}",
                    ctx.persona.display_name(),
                    role.display_name()
                ),
            );
        }

        let model = arguments["model"].as_str().unwrap_or("default").to_string();
        let hired = AgentInstance::new(role, model).hired_by(ctx.agent_id.clone());
        let hired_id = hired.id.clone();
        let hired_name = hired.display_name.clone();

        if let Err(e) = self.store.insert_agent(hired).await {
            return ToolResult::failure("hire_agent", ErrorCode::ExecutionError, e.to_string());
        }

        // Record the hire on the caller, if the caller is persisted.
        if let Ok(mut hirer) = self.store.agent(&ctx.agent_id).await {
            hirer.hired_agents.push(hired_id.clone());
            hirer.updated_at = chrono::Utc::now();
            if let Err(e) = self.store.update_agent(&hirer).await {
                return ToolResult::failure("hire_agent", ErrorCode::ExecutionError, e.to_string());
            }
        }

        info!(role = %role, agent_id = %hired_id, "Agent hired");

        // No reverse action: hiring is explicitly irreversible.
        ToolResult::ok("hire_agent", format!("{hired_name} has joined the team"))
            .with_data(serde_json::json!({ "agent_id": hired_id.to_string() }))
    }
}
