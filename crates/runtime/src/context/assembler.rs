//! Context assembly — the greedy, per-section token-budgeted bundle
//! builder.
//!
//! Sections are filled in a fixed priority order with cumulative
//! accounting: each section gets `min(nominal allocation, remaining)` and
//! items are added greedily while they fit. There is no global
//! optimization — this is a deliberately simple greedy allocator, not a
//! scheduler. Sections are skipped entirely once the running total
//! reaches the ceiling, so the included total never exceeds `max_tokens`.
//!
//! Token counts are the chars/4 approximation from [`super::token`].

use devsquad_config::ContextBudgetConfig;
use devsquad_core::agent::AgentInstance;
use devsquad_core::message::ConversationMessage;
use devsquad_core::project::{ApiContract, Artifact, Decision, MemoryNote, ProjectManifest};
use devsquad_core::task::{Task, TaskStatus};
use devsquad_core::ActionRecord;

use super::token::estimate_tokens;

/// Everything the assembler may draw from for one iteration.
pub struct AssemblyInput<'a> {
    pub manifest: Option<&'a ProjectManifest>,
    pub task: &'a Task,
    /// Most-recent decisions, newest first (callers pass at most 10).
    pub decisions: &'a [Decision],
    pub contracts: &'a [ApiContract],
    /// Most-recently-updated files first.
    pub artifacts: &'a [Artifact],
    /// All live agents on the team.
    pub team: &'a [AgentInstance],
    /// Agents hired by the executing agent.
    pub subteam: &'a [AgentInstance],
    /// Recent actions, newest first (callers pass the last hour, ≤ 20).
    pub actions: &'a [ActionRecord],
    /// Tasks this task depends on.
    pub dependencies: &'a [Task],
    /// The agent's own conversation history (full; the assembler windows it).
    pub conversation: &'a [ConversationMessage],
    /// Memory notes ranked by importance, highest first.
    pub memories: &'a [MemoryNote],
}

/// Per-section accounting.
#[derive(Debug, Clone)]
pub struct SectionStats {
    pub name: &'static str,
    pub tokens: usize,
    pub items_included: usize,
    pub items_total: usize,
    /// True when the running total left no room for this section.
    pub skipped: bool,
}

/// The assembled context, ready to append to a system prompt.
#[derive(Debug, Clone)]
pub struct ContextBundle {
    pub text: String,
    pub total_tokens: usize,
    pub sections: Vec<SectionStats>,
}

/// The context assembler. Stateless — create one and reuse it.
pub struct ContextAssembler {
    budget: ContextBudgetConfig,
}

impl ContextAssembler {
    pub fn new(budget: ContextBudgetConfig) -> Self {
        Self { budget }
    }

    pub fn with_default_budget() -> Self {
        Self::new(ContextBudgetConfig::default())
    }

    pub fn max_tokens(&self) -> usize {
        self.budget.max_tokens
    }

    /// Assemble the bundle. Sections fill in fixed priority order:
    /// manifest → task → decisions → contracts → code → team → subteam →
    /// actions → dependencies → conversation → memories.
    pub fn assemble(&self, input: &AssemblyInput<'_>) -> ContextBundle {
        let mut remaining = self.budget.max_tokens;
        let mut sections: Vec<SectionStats> = Vec::with_capacity(11);
        let mut parts: Vec<String> = Vec::new();

        let mut run = |name: &'static str,
                       nominal: usize,
                       remaining: &mut usize,
                       render: &dyn Fn(usize) -> (String, usize, usize)| {
            if *remaining == 0 {
                sections.push(SectionStats {
                    name,
                    tokens: 0,
                    items_included: 0,
                    items_total: 0,
                    skipped: true,
                });
                return;
            }
            let sub_budget = nominal.min(*remaining);
            let (text, included, total) = render(sub_budget);
            let used = estimate_tokens(&text);
            debug_assert!(used <= sub_budget || text.is_empty());
            *remaining -= used.min(*remaining);
            if !text.is_empty() {
                parts.push(text);
            }
            sections.push(SectionStats {
                name,
                tokens: used,
                items_included: included,
                items_total: total,
                skipped: false,
            });
        };

        run("manifest", self.budget.manifest, &mut remaining, &|b| {
            Self::render_manifest(input.manifest, b)
        });
        run("task", self.budget.task, &mut remaining, &|b| {
            Self::render_task(input.task, b)
        });
        run("decisions", self.budget.decisions, &mut remaining, &|b| {
            Self::render_decisions(input.decisions, b)
        });
        run("contracts", self.budget.contracts, &mut remaining, &|b| {
            Self::render_contracts(input.contracts, b)
        });
        run("code", self.budget.code, &mut remaining, &|b| {
            Self::render_code(input.artifacts, b)
        });
        run("team_status", self.budget.team_status, &mut remaining, &|b| {
            Self::render_agents("[Team Status]", input.team, b)
        });
        run(
            "subteam_status",
            self.budget.subteam_status,
            &mut remaining,
            &|b| Self::render_agents("[Your Team]", input.subteam, b),
        );
        run("actions", self.budget.actions, &mut remaining, &|b| {
            Self::render_actions(input.actions, b)
        });
        run(
            "dependencies",
            self.budget.dependencies,
            &mut remaining,
            &|b| Self::render_dependencies(input.dependencies, b),
        );
        run(
            "conversation",
            self.budget.conversation,
            &mut remaining,
            &|b| Self::render_conversation(input.conversation, b),
        );
        run("memories", self.budget.memories, &mut remaining, &|b| {
            Self::render_memories(input.memories, b)
        });

        let text = parts.join("\n");
        let total_tokens = sections.iter().map(|s| s.tokens).sum();

        ContextBundle {
            text,
            total_tokens,
            sections,
        }
    }

    // ── Section renderers ─────────────────────────────────────────────────
    //
    // Each returns (text, items_included, items_total) with
    // estimate_tokens(text) <= budget.

    fn render_manifest(manifest: Option<&ProjectManifest>, budget: usize) -> (String, usize, usize) {
        let Some(manifest) = manifest else {
            return (String::new(), 0, 0);
        };
        let text = format!(
            "[Project]\n{} — {}\nStack: {}\n",
            manifest.name,
            manifest.description,
            manifest.tech_stack.join(", ")
        );
        if estimate_tokens(&text) > budget {
            return (String::new(), 0, 1);
        }
        (text, 1, 1)
    }

    fn render_task(task: &Task, budget: usize) -> (String, usize, usize) {
        let mut text = format!(
            "[Current Task]\n{} ({:?} priority)\n{}\n",
            task.title, task.priority, task.description
        );
        let push_list = |text: &mut String, header: &str, items: &[String]| {
            if !items.is_empty() {
                text.push_str(header);
                text.push('\n');
                for item in items {
                    text.push_str(&format!("- {item}\n"));
                }
            }
        };
        push_list(&mut text, "Requirements:", &task.requirements);
        push_list(&mut text, "Acceptance criteria:", &task.acceptance_criteria);
        push_list(&mut text, "Deliverables:", &task.deliverables);

        if estimate_tokens(&text) > budget {
            // Fall back to the bare header — the task must be identifiable
            // even under a starved budget.
            let minimal = format!("[Current Task]\n{}\n", task.title);
            if estimate_tokens(&minimal) > budget {
                return (String::new(), 0, 1);
            }
            return (minimal, 1, 1);
        }
        (text, 1, 1)
    }

    fn render_decisions(decisions: &[Decision], budget: usize) -> (String, usize, usize) {
        Self::render_items(
            "[Recent Decisions]",
            decisions,
            budget,
            |d| format!("- {}: {}\n", d.title, d.body),
        )
    }

    fn render_contracts(contracts: &[ApiContract], budget: usize) -> (String, usize, usize) {
        Self::render_items(
            "[API Contracts]",
            contracts,
            budget,
            |c| format!("- {}: {}\n", c.name, c.definition),
        )
    }

    /// Greedy by recency; a file that would overflow the remaining
    /// sub-budget is truncated to its structural skeleton (imports, type
    /// and function signatures) before being dropped outright.
    fn render_code(artifacts: &[Artifact], budget: usize) -> (String, usize, usize) {
        if artifacts.is_empty() {
            return (String::new(), 0, 0);
        }
        let header = "[Relevant Code]\n";
        let header_tokens = estimate_tokens(header);
        if header_tokens >= budget {
            return (String::new(), 0, artifacts.len());
        }

        let mut used = header_tokens;
        let mut out = String::from(header);
        let mut included = 0;

        for artifact in artifacts {
            let full = format!("--- {} (v{})\n{}\n", artifact.path, artifact.version, artifact.content);
            let full_tokens = estimate_tokens(&full);
            if used + full_tokens <= budget {
                out.push_str(&full);
                used += full_tokens;
                included += 1;
                continue;
            }

            // Preserve structural skeleton over body.
            let skeleton = code_skeleton(&artifact.content);
            let trimmed = format!(
                "--- {} (v{}, signatures only)\n{}\n",
                artifact.path, artifact.version, skeleton
            );
            let trimmed_tokens = estimate_tokens(&trimmed);
            if used + trimmed_tokens <= budget {
                out.push_str(&trimmed);
                used += trimmed_tokens;
                included += 1;
            }
        }

        if included == 0 {
            return (String::new(), 0, artifacts.len());
        }
        (out, included, artifacts.len())
    }

    fn render_agents(
        header: &str,
        agents: &[AgentInstance],
        budget: usize,
    ) -> (String, usize, usize) {
        Self::render_items(header, agents, budget, |a| {
            let task = a
                .current_task
                .as_ref()
                .map(|t| format!(" on task {t}"))
                .unwrap_or_default();
            format!("- {} ({}): {}{}\n", a.display_name, a.persona, a.status.as_str(), task)
        })
    }

    fn render_actions(actions: &[ActionRecord], budget: usize) -> (String, usize, usize) {
        Self::render_items("[Recent Actions]", actions, budget, |a| {
            let status = if a.success { "ok" } else { "failed" };
            format!("- {} {} ({})\n", a.tool_name, a.arguments_summary, status)
        })
    }

    fn render_dependencies(dependencies: &[Task], budget: usize) -> (String, usize, usize) {
        Self::render_items("[Dependencies]", dependencies, budget, |t| {
            let detail = match t.status {
                TaskStatus::Completed => t
                    .completion_summary
                    .clone()
                    .unwrap_or_else(|| "completed".into()),
                TaskStatus::Blocked => format!(
                    "BLOCKED: {}",
                    t.blocker.clone().unwrap_or_else(|| "unknown".into())
                ),
                other => other.as_str().to_string(),
            };
            format!("- {}: {}\n", t.title, detail)
        })
    }

    /// Sliding window: newest messages first while they fit, rendered in
    /// chronological order. Older messages drop out of context but stay in
    /// the session log.
    fn render_conversation(
        conversation: &[ConversationMessage],
        budget: usize,
    ) -> (String, usize, usize) {
        if conversation.is_empty() {
            return (String::new(), 0, 0);
        }
        let header = "[Conversation]\n";
        let header_tokens = estimate_tokens(header);
        if header_tokens >= budget {
            return (String::new(), 0, conversation.len());
        }

        let mut used = header_tokens;
        let mut lines: Vec<String> = Vec::new();
        for msg in conversation.iter().rev() {
            let line = format!("{}: {}\n", msg.speaker, msg.content);
            let tokens = estimate_tokens(&line);
            if used + tokens > budget {
                break;
            }
            lines.push(line);
            used += tokens;
        }
        if lines.is_empty() {
            return (String::new(), 0, conversation.len());
        }
        lines.reverse();

        let mut out = String::from(header);
        for line in &lines {
            out.push_str(line);
        }
        (out, lines.len(), conversation.len())
    }

    fn render_memories(memories: &[MemoryNote], budget: usize) -> (String, usize, usize) {
        Self::render_items("[Memories]", memories, budget, |m| {
            format!("- ({:.2}) {}\n", m.importance, m.content)
        })
    }

    /// Shared greedy item renderer: header + items while they fit.
    fn render_items<T>(
        header: &str,
        items: &[T],
        budget: usize,
        line: impl Fn(&T) -> String,
    ) -> (String, usize, usize) {
        if items.is_empty() {
            return (String::new(), 0, 0);
        }
        let header_line = format!("{header}\n");
        let mut used = estimate_tokens(&header_line);
        if used >= budget {
            return (String::new(), 0, items.len());
        }

        let mut out = header_line;
        let mut included = 0;
        for item in items {
            let rendered = line(item);
            let tokens = estimate_tokens(&rendered);
            if used + tokens > budget {
                continue;
            }
            out.push_str(&rendered);
            used += tokens;
            included += 1;
        }

        if included == 0 {
            return (String::new(), 0, items.len());
        }
        (out, included, items.len())
    }
}

/// Reduce source text to import/type/function signature lines, preserving
/// structural skeleton over body.
pub fn code_skeleton(content: &str) -> String {
    const PREFIXES: [&str; 16] = [
        "use ", "mod ", "pub ", "fn ", "struct ", "enum ", "trait ", "impl ", "const ", "type ",
        "import ", "from ", "class ", "def ", "function ", "export ",
    ];
    content
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            PREFIXES.iter().any(|p| trimmed.starts_with(p))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use devsquad_core::PersonaRole;

    fn base_task() -> Task {
        Task::new("Build login", "Implement the login endpoint")
            .with_requirements(vec!["JWT auth".into()])
            .with_deliverables(vec!["src/auth.rs".into()])
    }

    fn input_with<'a>(task: &'a Task, artifacts: &'a [Artifact]) -> AssemblyInput<'a> {
        AssemblyInput {
            manifest: None,
            task,
            decisions: &[],
            contracts: &[],
            artifacts,
            team: &[],
            subteam: &[],
            actions: &[],
            dependencies: &[],
            conversation: &[],
            memories: &[],
        }
    }

    #[test]
    fn task_section_always_renders() {
        let asm = ContextAssembler::with_default_budget();
        let task = base_task();
        let bundle = asm.assemble(&input_with(&task, &[]));
        assert!(bundle.text.contains("[Current Task]"));
        assert!(bundle.text.contains("Build login"));
        assert!(bundle.text.contains("JWT auth"));
    }

    #[test]
    fn total_never_exceeds_ceiling() {
        let mut budget = ContextBudgetConfig::default();
        budget.max_tokens = 200; // starved

        let asm = ContextAssembler::new(budget);
        let task = base_task();
        let artifacts: Vec<Artifact> = (0..10)
            .map(|i| Artifact::new(format!("src/file{i}.rs"), "fn body() {}\n".repeat(50)))
            .collect();
        let decisions: Vec<Decision> = (0..10)
            .map(|i| Decision::new(format!("ADR-{i}"), "a long decision body ".repeat(20)))
            .collect();

        let mut input = input_with(&task, &artifacts);
        input.decisions = &decisions;

        let bundle = asm.assemble(&input);
        // The greedy packer stops adding whole sections at the ceiling.
        assert!(bundle.total_tokens <= 200, "total {} > 200", bundle.total_tokens);
    }

    #[test]
    fn sum_of_section_stats_matches_total() {
        let asm = ContextAssembler::with_default_budget();
        let task = base_task();
        let artifacts = vec![Artifact::new("src/a.rs", "pub fn a() {}")];
        let bundle = asm.assemble(&input_with(&task, &artifacts));
        let sum: usize = bundle.sections.iter().map(|s| s.tokens).sum();
        assert_eq!(sum, bundle.total_tokens);
    }

    #[test]
    fn priority_order_starves_later_sections() {
        let mut budget = ContextBudgetConfig::default();
        budget.max_tokens = 120;

        let asm = ContextAssembler::new(budget);
        let task = base_task();
        let memories = vec![MemoryNote::new("late-priority memory ".repeat(10), 0.9)];
        let conversation: Vec<ConversationMessage> = (0..20)
            .map(|i| ConversationMessage::user(format!("message number {i} with some length")))
            .collect();

        let mut input = input_with(&task, &[]);
        input.memories = &memories;
        input.conversation = &conversation;

        let bundle = asm.assemble(&input);
        let task_stats = bundle.sections.iter().find(|s| s.name == "task").unwrap();
        assert_eq!(task_stats.items_included, 1, "task (high priority) included");

        let mem_stats = bundle.sections.iter().find(|s| s.name == "memories").unwrap();
        assert_eq!(mem_stats.items_included, 0, "memories starved under tight budget");
    }

    #[test]
    fn oversized_file_truncated_to_skeleton() {
        let mut budget = ContextBudgetConfig::default();
        budget.code = 100;

        let asm = ContextAssembler::new(budget);
        let task = base_task();
        let body = format!(
            "use std::io;\npub fn handler() {{\n{}}}\n",
            "    let x = compute_something_long();\n".repeat(40)
        );
        let artifacts = vec![Artifact::new("src/big.rs", body)];

        let bundle = asm.assemble(&input_with(&task, &artifacts));
        assert!(bundle.text.contains("signatures only"));
        assert!(bundle.text.contains("use std::io;"));
        assert!(bundle.text.contains("pub fn handler()"));
        assert!(!bundle.text.contains("compute_something_long"));
    }

    #[test]
    fn conversation_window_keeps_newest() {
        let mut budget = ContextBudgetConfig::default();
        budget.conversation = 30;

        let asm = ContextAssembler::new(budget);
        let task = base_task();
        let conversation: Vec<ConversationMessage> = (0..10)
            .map(|i| ConversationMessage::user(format!("message {i}")))
            .collect();

        let mut input = input_with(&task, &[]);
        input.conversation = &conversation;

        let bundle = asm.assemble(&input);
        let stats = bundle
            .sections
            .iter()
            .find(|s| s.name == "conversation")
            .unwrap();
        assert!(stats.items_included < 10);
        // The newest message survives; the oldest is dropped.
        assert!(bundle.text.contains("message 9"));
        assert!(!bundle.text.contains("message 0"));
    }

    #[test]
    fn deterministic_assembly() {
        let asm = ContextAssembler::with_default_budget();
        let task = base_task();
        let artifacts = vec![Artifact::new("src/a.rs", "pub fn a() {}")];
        let input = input_with(&task, &artifacts);

        let first = asm.assemble(&input);
        let second = asm.assemble(&input);
        assert_eq!(first.text, second.text);
        assert_eq!(first.total_tokens, second.total_tokens);
    }

    #[test]
    fn team_status_lists_agents() {
        let asm = ContextAssembler::with_default_budget();
        let task = base_task();
        let mut sarah = AgentInstance::new(PersonaRole::Architect, "m");
        sarah.status = devsquad_core::AgentStatus::Working;
        sarah.current_task = Some(devsquad_core::TaskId::from("t-1"));
        let team = vec![sarah];

        let mut input = input_with(&task, &[]);
        input.team = &team;

        let bundle = asm.assemble(&input);
        assert!(bundle.text.contains("[Team Status]"));
        assert!(bundle.text.contains("Sarah"));
        assert!(bundle.text.contains("working"));
        assert!(bundle.text.contains("t-1"));
    }

    #[test]
    fn skeleton_filters_body_lines() {
        let src = "use a::b;\n\nfn main() {\n    let x = 1;\n    println!(\"{x}\");\n}\npub struct Config {\n    field: u32,\n}\n";
        let skeleton = code_skeleton(src);
        assert!(skeleton.contains("use a::b;"));
        assert!(skeleton.contains("fn main()"));
        assert!(skeleton.contains("pub struct Config"));
        assert!(!skeleton.contains("println!"));
    }
}
