//! Turn-selection rules for the team conversation.
//!
//! An explicit ordered list of (predicate, action) rules evaluated
//! top-to-bottom; the first match wins and falling through every rule
//! means "wait for the user". Keeping the table as data makes each rule
//! testable on its own and the first-match semantics visible, instead of
//! encoding them in nested control flow.
//!
//! The only non-deterministic branch is the lead pick after Sarah's
//! second architecture message: a uniform choice between exactly Marcus
//! and Elena.

use devsquad_core::message::{ConversationMessage, MessageRole};
use devsquad_core::PersonaRole;
use rand::RngCore;

/// Messages at least this long count as "substantial" for the heuristics.
pub const SUBSTANTIAL_LEN: usize = 80;

/// What a matched rule decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    Speak(PersonaRole),
    WaitForUser,
}

/// The conversation state a rule may inspect.
pub struct TurnContext<'a> {
    pub turns_taken: usize,
    pub max_turns: usize,
    pub messages: &'a [ConversationMessage],
}

impl<'a> TurnContext<'a> {
    pub fn last_message(&self) -> Option<&ConversationMessage> {
        self.messages.last()
    }

    pub fn previous_speaker(&self) -> Option<&str> {
        self.last_message().map(|m| m.speaker.as_str())
    }

    fn previous_role(&self) -> Option<PersonaRole> {
        self.last_message()
            .filter(|m| m.role == MessageRole::Agent)
            .and_then(|m| PersonaRole::from_display_name(&m.speaker))
    }

    pub fn spoken_count(&self, role: PersonaRole) -> usize {
        self.messages
            .iter()
            .filter(|m| m.speaker == role.display_name())
            .count()
    }

    pub fn substantial_count(&self, role: PersonaRole) -> usize {
        self.messages
            .iter()
            .filter(|m| m.speaker == role.display_name() && m.content.len() >= SUBSTANTIAL_LEN)
            .count()
    }

    pub fn has_joined(&self, role: PersonaRole) -> bool {
        self.spoken_count(role) > 0
    }

    fn is_first_message(&self) -> bool {
        self.messages.len() == 1 && self.messages[0].role == MessageRole::User
    }
}

/// One rule: a name for logs/tests and an evaluation function that
/// returns `Some(outcome)` on match.
pub struct TurnRule {
    pub name: &'static str,
    pub eval: fn(&TurnContext<'_>, &mut dyn RngCore) -> Option<RuleOutcome>,
}

/// Scan a message for `[HIRE <name>]` markers (case-insensitive) and
/// return the earliest-mentioned persona.
fn hire_marker(content: &str) -> Option<PersonaRole> {
    let lower = content.to_lowercase();
    [
        PersonaRole::Architect,
        PersonaRole::BackendLead,
        PersonaRole::FrontendLead,
    ]
    .into_iter()
    .filter_map(|role| {
        let marker = format!("[hire {}]", role.display_name().to_lowercase());
        lower.find(&marker).map(|idx| (idx, role))
    })
    .min_by_key(|(idx, _)| *idx)
    .map(|(_, role)| role)
}

fn looks_like_design_deliverable(content: &str) -> bool {
    let lower = content.to_lowercase();
    content.contains("```") || lower.contains("schema") || lower.contains("architecture")
}

/// The built-in rule table, in evaluation order.
pub fn default_rules() -> Vec<TurnRule> {
    vec![
        TurnRule {
            name: "max-turns",
            eval: |ctx, _| (ctx.turns_taken >= ctx.max_turns).then_some(RuleOutcome::WaitForUser),
        },
        TurnRule {
            name: "first-message",
            eval: |ctx, _| {
                ctx.is_first_message()
                    .then_some(RuleOutcome::Speak(PersonaRole::Orchestrator))
            },
        },
        TurnRule {
            name: "after-user",
            eval: |ctx, _| {
                let after_user = match ctx.last_message() {
                    None => true,
                    Some(m) => m.role == MessageRole::User,
                };
                after_user.then_some(RuleOutcome::Speak(PersonaRole::Orchestrator))
            },
        },
        TurnRule {
            name: "alex-hire-marker",
            eval: |ctx, _| {
                if ctx.previous_role() != Some(PersonaRole::Orchestrator) {
                    return None;
                }
                hire_marker(&ctx.last_message()?.content).map(RuleOutcome::Speak)
            },
        },
        TurnRule {
            name: "alex-brings-architect",
            eval: |ctx, _| {
                (ctx.previous_role() == Some(PersonaRole::Orchestrator)
                    && ctx.spoken_count(PersonaRole::Orchestrator) >= 2
                    && !ctx.has_joined(PersonaRole::Architect))
                .then_some(RuleOutcome::Speak(PersonaRole::Architect))
            },
        },
        TurnRule {
            name: "alex-waits",
            eval: |ctx, _| {
                (ctx.previous_role() == Some(PersonaRole::Orchestrator))
                    .then_some(RuleOutcome::WaitForUser)
            },
        },
        TurnRule {
            name: "sarah-design-handback",
            eval: |ctx, _| {
                (ctx.previous_role() == Some(PersonaRole::Architect)
                    && looks_like_design_deliverable(&ctx.last_message()?.content)
                    && ctx.substantial_count(PersonaRole::Architect) <= 2)
                    .then_some(RuleOutcome::Speak(PersonaRole::Orchestrator))
            },
        },
        TurnRule {
            name: "sarah-brings-lead",
            eval: |ctx, rng| {
                if ctx.previous_role() != Some(PersonaRole::Architect)
                    || ctx.spoken_count(PersonaRole::Architect) < 2
                    || ctx.has_joined(PersonaRole::BackendLead)
                    || ctx.has_joined(PersonaRole::FrontendLead)
                {
                    return None;
                }
                // Uniform between exactly the two lead personas.
                let lead = if rng.next_u32() & 1 == 0 {
                    PersonaRole::BackendLead
                } else {
                    PersonaRole::FrontendLead
                };
                Some(RuleOutcome::Speak(lead))
            },
        },
        TurnRule {
            name: "sarah-question",
            eval: |ctx, _| {
                let content = &ctx.last_message()?.content;
                (ctx.previous_role() == Some(PersonaRole::Architect)
                    && (content.contains('?') || content.to_lowercase().contains("question")))
                .then_some(RuleOutcome::Speak(PersonaRole::Orchestrator))
            },
        },
        TurnRule {
            name: "sarah-waits",
            eval: |ctx, _| {
                (ctx.previous_role() == Some(PersonaRole::Architect))
                    .then_some(RuleOutcome::WaitForUser)
            },
        },
        TurnRule {
            name: "lead-code-handback",
            eval: |ctx, _| {
                let prev = ctx.previous_role()?;
                if !matches!(prev, PersonaRole::BackendLead | PersonaRole::FrontendLead) {
                    return None;
                }
                (ctx.last_message()?.content.contains("```") && ctx.substantial_count(prev) <= 2)
                    .then_some(RuleOutcome::Speak(PersonaRole::Orchestrator))
            },
        },
        TurnRule {
            name: "lead-brings-other",
            eval: |ctx, _| {
                let prev = ctx.previous_role()?;
                let other = match prev {
                    PersonaRole::BackendLead => PersonaRole::FrontendLead,
                    PersonaRole::FrontendLead => PersonaRole::BackendLead,
                    _ => return None,
                };
                (!ctx.has_joined(other)).then_some(RuleOutcome::Speak(other))
            },
        },
        TurnRule {
            name: "lead-waits",
            eval: |ctx, _| {
                matches!(
                    ctx.previous_role()?,
                    PersonaRole::BackendLead | PersonaRole::FrontendLead
                )
                .then_some(RuleOutcome::WaitForUser)
            },
        },
    ]
}

/// Evaluate the rules in order; first match wins, fallthrough waits.
pub fn select_next_speaker(
    ctx: &TurnContext<'_>,
    rng: &mut dyn RngCore,
    rules: &[TurnRule],
) -> (RuleOutcome, &'static str) {
    for rule in rules {
        if let Some(outcome) = (rule.eval)(ctx, rng) {
            return (outcome, rule.name);
        }
    }
    (RuleOutcome::WaitForUser, "fallthrough")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn user(content: &str) -> ConversationMessage {
        ConversationMessage::user(content)
    }

    fn agent(name: &str, content: &str) -> ConversationMessage {
        ConversationMessage::agent(name, content)
    }

    fn select(messages: &[ConversationMessage], turns: usize) -> (RuleOutcome, &'static str) {
        let ctx = TurnContext {
            turns_taken: turns,
            max_turns: 20,
            messages,
        };
        select_next_speaker(&ctx, &mut rng(), &default_rules())
    }

    #[test]
    fn scenario_b_first_message_always_alex() {
        // Regardless of content, the first speaker is Alex.
        for content in ["build me a game", "schema architecture ???", "[HIRE Elena]"] {
            let messages = vec![user(content)];
            let (outcome, rule) = select(&messages, 0);
            assert_eq!(outcome, RuleOutcome::Speak(PersonaRole::Orchestrator));
            assert_eq!(rule, "first-message");
        }
    }

    #[test]
    fn max_turns_stops_everything() {
        let messages = vec![user("hello")];
        let ctx = TurnContext {
            turns_taken: 20,
            max_turns: 20,
            messages: &messages,
        };
        let (outcome, rule) = select_next_speaker(&ctx, &mut rng(), &default_rules());
        assert_eq!(outcome, RuleOutcome::WaitForUser);
        assert_eq!(rule, "max-turns");
    }

    #[test]
    fn after_user_routes_to_alex() {
        let messages = vec![
            user("build an app"),
            agent("Alex", "On it."),
            user("make it blue"),
        ];
        let (outcome, rule) = select(&messages, 2);
        assert_eq!(outcome, RuleOutcome::Speak(PersonaRole::Orchestrator));
        assert_eq!(rule, "after-user");
    }

    #[test]
    fn scenario_c_hire_marker_beats_architect_heuristic() {
        // Only one Alex message, so the 2+ heuristic does not hold; the
        // marker still routes to Sarah.
        let messages = vec![user("build an app"), agent("Alex", "Let's design first. [HIRE Sarah]")];
        let (outcome, rule) = select(&messages, 1);
        assert_eq!(outcome, RuleOutcome::Speak(PersonaRole::Architect));
        assert_eq!(rule, "alex-hire-marker");
    }

    #[test]
    fn hire_marker_is_case_insensitive() {
        let messages = vec![user("x"), agent("Alex", "[hire marcus] please")];
        let (outcome, _) = select(&messages, 1);
        assert_eq!(outcome, RuleOutcome::Speak(PersonaRole::BackendLead));
    }

    #[test]
    fn earliest_hire_marker_wins() {
        let messages = vec![user("x"), agent("Alex", "[HIRE Elena] and later [HIRE Sarah]")];
        let (outcome, _) = select(&messages, 1);
        assert_eq!(outcome, RuleOutcome::Speak(PersonaRole::FrontendLead));
    }

    #[test]
    fn alex_twice_without_architect_brings_sarah() {
        let messages = vec![
            user("build an app"),
            agent("Alex", "Tell me more."),
            user("a todo app"),
            agent("Alex", "Got it, we need a design."),
        ];
        let (outcome, rule) = select(&messages, 3);
        assert_eq!(outcome, RuleOutcome::Speak(PersonaRole::Architect));
        assert_eq!(rule, "alex-brings-architect");
    }

    #[test]
    fn alex_once_without_marker_waits() {
        let messages = vec![user("build an app"), agent("Alex", "Tell me more about it.")];
        let (outcome, rule) = select(&messages, 1);
        assert_eq!(outcome, RuleOutcome::WaitForUser);
        assert_eq!(rule, "alex-waits");
    }

    #[test]
    fn sarah_schema_hands_back_to_alex() {
        let long_schema = format!("Here is the schema:\n```sql\n{}\n```", "x".repeat(100));
        let messages = vec![
            user("build an app"),
            agent("Alex", "Bringing in design. [HIRE Sarah]"),
            agent("Sarah", &long_schema),
        ];
        let (outcome, rule) = select(&messages, 2);
        assert_eq!(outcome, RuleOutcome::Speak(PersonaRole::Orchestrator));
        assert_eq!(rule, "sarah-design-handback");
    }

    #[test]
    fn sarah_second_message_brings_a_lead() {
        // Two Sarah messages, no deliverable in the last one, no leads yet.
        let messages = vec![
            user("build an app"),
            agent("Alex", "[HIRE Sarah]"),
            agent("Sarah", "I'll sketch the data model first."),
            agent("Alex", "Sounds good."),
            agent("Sarah", "The data model is settled; time to implement."),
        ];
        let (outcome, rule) = select(&messages, 4);
        match outcome {
            RuleOutcome::Speak(role) => assert!(matches!(
                role,
                PersonaRole::BackendLead | PersonaRole::FrontendLead
            )),
            other => panic!("expected a lead, got {other:?}"),
        }
        assert_eq!(rule, "sarah-brings-lead");
    }

    #[test]
    fn lead_pick_is_uniform_over_exactly_two_leads() {
        let messages = vec![
            user("build an app"),
            agent("Alex", "[HIRE Sarah]"),
            agent("Sarah", "Sketching."),
            agent("Alex", "Go on."),
            agent("Sarah", "Ready for implementation."),
        ];
        let ctx = TurnContext {
            turns_taken: 4,
            max_turns: 20,
            messages: &messages,
        };
        let rules = default_rules();

        let mut seen = std::collections::HashSet::new();
        // Over 64 seeded draws both leads appear, and nothing but a lead
        // is ever selected.
        let mut seeded = StdRng::seed_from_u64(7);
        for _ in 0..64 {
            let (outcome, _) = select_next_speaker(&ctx, &mut seeded, &rules);
            match outcome {
                RuleOutcome::Speak(role) => {
                    seen.insert(role);
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(
            seen,
            [PersonaRole::BackendLead, PersonaRole::FrontendLead]
                .into_iter()
                .collect()
        );
    }

    #[test]
    fn sarah_question_routes_to_alex() {
        let messages = vec![
            user("build an app"),
            agent("Alex", "[HIRE Sarah]"),
            agent("Marcus", "backend here"), // a lead has joined, so rule 8 is out
            agent("Sarah", "Which auth provider do we standardize on?"),
            agent("Sarah", "Still an open question for me."),
        ];
        let (outcome, rule) = select(&messages, 4);
        assert_eq!(outcome, RuleOutcome::Speak(PersonaRole::Orchestrator));
        assert_eq!(rule, "sarah-question");
    }

    #[test]
    fn lead_code_hands_back_to_alex() {
        let code = format!("Done:\n```rust\n{}\n```", "let x = 1;\n".repeat(10));
        let messages = vec![
            user("build"),
            agent("Alex", "[HIRE Marcus]"),
            agent("Marcus", &code),
        ];
        let (outcome, rule) = select(&messages, 2);
        assert_eq!(outcome, RuleOutcome::Speak(PersonaRole::Orchestrator));
        assert_eq!(rule, "lead-code-handback");
    }

    #[test]
    fn lead_without_code_brings_other_lead() {
        let messages = vec![
            user("build"),
            agent("Alex", "[HIRE Marcus]"),
            agent("Marcus", "Backend endpoints are scoped out."),
        ];
        let (outcome, rule) = select(&messages, 2);
        assert_eq!(outcome, RuleOutcome::Speak(PersonaRole::FrontendLead));
        assert_eq!(rule, "lead-brings-other");
    }

    #[test]
    fn lead_waits_when_other_already_spoke() {
        let messages = vec![
            user("build"),
            agent("Alex", "[HIRE Marcus]"),
            agent("Elena", "Frontend scoped."),
            agent("Marcus", "Backend scoped."),
        ];
        let (outcome, rule) = select(&messages, 3);
        assert_eq!(outcome, RuleOutcome::WaitForUser);
        assert_eq!(rule, "lead-waits");
    }

    #[test]
    fn identical_history_is_deterministic() {
        // Same history, same outcome — the only random branch is
        // sarah-brings-lead, exercised separately above.
        let messages = vec![
            user("build an app"),
            agent("Alex", "Tell me more."),
            user("a todo app"),
            agent("Alex", "We need a design."),
        ];
        let first = select(&messages, 3);
        let second = select(&messages, 3);
        assert_eq!(first.0, second.0);
        assert_eq!(first.1, second.1);
    }
}
