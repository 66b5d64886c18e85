//! Types for the repair loop (spec §4.9).

use serde::{Deserialize, Serialize};

/// A targeted hint constructed from a failed candidate's errors/lint, fed
/// into the delta prompt rather than the full base prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RepairHint {
    /// A column reference resolved to the wrong table; names the correct one.
    CrossTable {
        column: String,
        wrong_table: String,
        correct_table: String,
    },
    /// A referenced column does not exist anywhere in the context packet.
    PhantomColumn { table: String, column: String },
    /// Candidate columns the generator should choose from, closest-match first.
    SurgicalWhitelist {
        original: String,
        candidates: Vec<String>,
    },
}

/// One attempt's worth of repair bookkeeping, accumulated across the bounded
/// retry loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairAttempt {
    pub attempt_number: usize,
    pub previous_sql: String,
    pub hints: Vec<RepairHint>,
    pub delta_prompt: String,
    pub outcome_sql: Option<String>,
}

/// Accumulated repair state for one candidate across the bounded attempt loop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepairContext {
    pub attempts: Vec<RepairAttempt>,
}

impl RepairContext {
    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }

    pub fn last_hints(&self) -> &[RepairHint] {
        self.attempts.last().map(|a| a.hints.as_slice()).unwrap_or(&[])
    }
}
