//! Persona handlers — one implementation per team role.
//!
//! A handler is a capability interface: system prompt, tool allowlist,
//! hire list, iteration cap, temperature. Handlers are selected through an
//! explicit registry keyed by [`PersonaRole`] — never via string-typed
//! subclass chains.

mod architect;
mod backend;
mod frontend;
mod orchestrator;
mod qa;

pub use architect::ArchitectHandler;
pub use backend::BackendLeadHandler;
pub use frontend::FrontendLeadHandler;
pub use orchestrator::OrchestratorHandler;
pub use qa::QaHandler;

use std::collections::HashMap;
use std::sync::Arc;

use devsquad_core::PersonaRole;

/// The capability interface for one persona.
pub trait PersonaHandler: Send + Sync {
    fn role(&self) -> PersonaRole;

    /// The scripted system prompt for this persona.
    fn system_prompt(&self) -> &str;

    /// Tools this persona may call. Calls outside this list fail with
    /// `INSUFFICIENT_AUTHORITY`.
    fn allowed_tools(&self) -> &[&'static str];

    /// Roles this persona may hire.
    fn hire_list(&self) -> &[PersonaRole];

    /// Iteration cap for the runtime loop.
    fn max_iterations(&self) -> u32 {
        10
    }

    fn temperature(&self) -> f32 {
        0.7
    }
}

/// Registry of persona handlers, keyed by role.
pub struct PersonaRegistry {
    handlers: HashMap<PersonaRole, Arc<dyn PersonaHandler>>,
}

impl PersonaRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler. Replaces any existing handler for the role.
    pub fn register(&mut self, handler: Arc<dyn PersonaHandler>) {
        self.handlers.insert(handler.role(), handler);
    }

    pub fn get(&self, role: PersonaRole) -> Option<Arc<dyn PersonaHandler>> {
        self.handlers.get(&role).cloned()
    }

    /// All five built-in personas.
    pub fn defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(OrchestratorHandler));
        registry.register(Arc::new(ArchitectHandler));
        registry.register(Arc::new(BackendLeadHandler));
        registry.register(Arc::new(FrontendLeadHandler));
        registry.register(Arc::new(QaHandler));
        registry
    }
}

impl Default for PersonaRegistry {
    fn default() -> Self {
        Self::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_role() {
        let registry = PersonaRegistry::defaults();
        for role in PersonaRole::all() {
            let handler = registry.get(role).unwrap_or_else(|| panic!("no handler for {role}"));
            assert_eq!(handler.role(), role);
            assert!(!handler.system_prompt().is_empty());
            assert!(handler.max_iterations() > 0);
        }
    }

    #[test]
    fn only_orchestrator_hires() {
        let registry = PersonaRegistry::defaults();
        assert!(!registry
            .get(PersonaRole::Orchestrator)
            .unwrap()
            .hire_list()
            .is_empty());
        assert!(registry
            .get(PersonaRole::BackendLead)
            .unwrap()
            .hire_list()
            .is_empty());
    }

    #[test]
    fn leads_cannot_hire_but_can_write_code() {
        let registry = PersonaRegistry::defaults();
        let marcus = registry.get(PersonaRole::BackendLead).unwrap();
        assert!(marcus.allowed_tools().contains(&"write_file"));
        assert!(!marcus.allowed_tools().contains(&"hire_agent"));
    }
}
