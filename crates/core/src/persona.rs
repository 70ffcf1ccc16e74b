//! Persona roles — the fixed, named members of the AI development team.

use serde::{Deserialize, Serialize};

/// The fixed persona roles the runtime knows how to drive.
///
/// Personas are selected through an explicit registry keyed by this enum —
/// never by string-typed dynamic dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaRole {
    /// Alex — runs the conversation, decomposes work, hires the team.
    Orchestrator,
    /// Sarah — system design, schemas, API contracts.
    Architect,
    /// Marcus — server-side implementation.
    BackendLead,
    /// Elena — client-side implementation.
    FrontendLead,
    /// Priya — test plans, regression checks.
    Qa,
}

impl PersonaRole {
    /// The persona's first name, as used in conversation transcripts and
    /// `[HIRE <name>]` markers.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Orchestrator => "Alex",
            Self::Architect => "Sarah",
            Self::BackendLead => "Marcus",
            Self::FrontendLead => "Elena",
            Self::Qa => "Priya",
        }
    }

    /// Resolve a display name back to a role (case-insensitive).
    pub fn from_display_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "alex" => Some(Self::Orchestrator),
            "sarah" => Some(Self::Architect),
            "marcus" => Some(Self::BackendLead),
            "elena" => Some(Self::FrontendLead),
            "priya" => Some(Self::Qa),
            _ => None,
        }
    }

    /// Position in the hire hierarchy: 0 is the top.
    pub fn hierarchy_level(&self) -> u8 {
        match self {
            Self::Orchestrator => 0,
            Self::Architect => 1,
            Self::BackendLead | Self::FrontendLead | Self::Qa => 2,
        }
    }

    /// All roles, in hierarchy order.
    pub fn all() -> [PersonaRole; 5] {
        [
            Self::Orchestrator,
            Self::Architect,
            Self::BackendLead,
            Self::FrontendLead,
            Self::Qa,
        ]
    }
}

impl std::fmt::Display for PersonaRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_roundtrip() {
        for role in PersonaRole::all() {
            assert_eq!(PersonaRole::from_display_name(role.display_name()), Some(role));
        }
    }

    #[test]
    fn display_name_is_case_insensitive() {
        assert_eq!(
            PersonaRole::from_display_name("SARAH"),
            Some(PersonaRole::Architect)
        );
        assert_eq!(
            PersonaRole::from_display_name("marcus"),
            Some(PersonaRole::BackendLead)
        );
        assert_eq!(PersonaRole::from_display_name("nobody"), None);
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&PersonaRole::BackendLead).unwrap();
        assert_eq!(json, "\"backend_lead\"");
    }
}
