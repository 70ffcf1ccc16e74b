//! Project-scoped context records consumed by the context assembler.
//!
//! These are owned by the project aggregate (out of core scope); the
//! orchestration core only borrows them for the duration of an iteration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The project manifest — what is being built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
}

/// A versioned file record written by the file tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub path: String,
    pub content: String,
    pub version: u32,
    pub updated_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            version: 1,
            updated_at: Utc::now(),
        }
    }
}

/// An architecture decision record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Decision {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            created_at: Utc::now(),
        }
    }
}

/// A declared API contract between components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiContract {
    pub name: String,
    pub definition: String,
}

/// A semantic memory note, ranked by importance and recency when the
/// assembler has budget left over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryNote {
    pub content: String,
    /// 0.0–1.0; higher sorts earlier.
    pub importance: f32,
    pub created_at: DateTime<Utc>,
}

impl MemoryNote {
    pub fn new(content: impl Into<String>, importance: f32) -> Self {
        Self {
            content: content.into(),
            importance,
            created_at: Utc::now(),
        }
    }
}
