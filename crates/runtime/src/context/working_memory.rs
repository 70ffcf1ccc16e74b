//! Working memory — a bounded FIFO of recent tool-call summaries.
//!
//! Capped at 20 entries, oldest evicted first. A plain FIFO, not an LRU:
//! reading an entry does not refresh it. The runtime appends one summary
//! per tool execution and persists the entries on the agent instance and
//! in checkpoints.

use std::collections::VecDeque;

use devsquad_core::agent::ToolCallSummary;

/// Default number of retained entries.
pub const DEFAULT_CAPACITY: usize = 20;

/// The agent's bounded scratchpad of recent tool activity.
#[derive(Debug, Clone)]
pub struct WorkingMemory {
    entries: VecDeque<ToolCallSummary>,
    capacity: usize,
}

impl WorkingMemory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Rebuild working memory from persisted entries, enforcing the cap.
    pub fn from_entries(entries: Vec<ToolCallSummary>, capacity: usize) -> Self {
        let mut wm = Self::new(capacity);
        for entry in entries {
            wm.push(entry);
        }
        wm
    }

    /// Append a summary, evicting the oldest entry when full.
    pub fn push(&mut self, entry: ToolCallSummary) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order (oldest first), for persistence.
    pub fn entries(&self) -> Vec<ToolCallSummary> {
        self.entries.iter().cloned().collect()
    }

    /// Render as a prompt section.
    pub fn render(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        let mut out = String::from("[Recent Tool Activity]\n");
        for entry in &self.entries {
            let status = if entry.success { "ok" } else { "failed" };
            out.push_str(&format!("- {} ({}): {}\n", entry.tool_name, status, entry.summary));
        }
        out
    }
}

impl Default for WorkingMemory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
