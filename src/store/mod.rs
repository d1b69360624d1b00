//! Pending change lifecycle.
//!
//! `Generated --create--> Pending --apply--> Applied`
//! `Pending --reject--> Rejected`
//!
//! Applied and rejected are terminal: the entry leaves the store, so a second
//! apply or reject on the same id is `NotFound`. The store is owned by the
//! session and injected into the engine; it has no internal locking.

use crate::diff::TransformResult;
use crate::editor::{Cursor, LiveDocument};
use crate::errors::VibeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// A computed transformation awaiting an apply or reject decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingChange {
    pub id: String,
    pub result: TransformResult,
    pub instruction: String,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a successful apply.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedChange {
    pub change: PendingChange,
    /// 0-based line the cursor was moved to, if the move succeeded.
    pub cursor_line: Option<usize>,
}

#[derive(Debug, Default)]
pub struct PendingChangeStore {
    entries: HashMap<String, (u64, PendingChange)>,
    next_seq: u64,
    current: Option<String>,
}

impl PendingChangeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new pending change and make it current.
    pub fn create(&mut self, result: TransformResult, instruction: &str) -> PendingChange {
        let change = PendingChange {
            id: uuid::Uuid::new_v4().to_string(),
            result,
            instruction: instruction.to_string(),
            created_at: Utc::now(),
        };
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(change.id.clone(), (seq, change.clone()));
        self.current = Some(change.id.clone());
        info!(
            id = %change.id,
            added = change.result.added_count,
            removed = change.result.removed_count,
            "pending change created"
        );
        change
    }

    pub fn get(&self, id: &str) -> Option<&PendingChange> {
        self.entries.get(id).map(|(_, change)| change)
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current(&self) -> Option<&PendingChange> {
        self.current.as_deref().and_then(|id| self.get(id))
    }

    pub fn has_pending(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Snapshot of all pending changes, oldest first.
    pub fn list(&self) -> Vec<PendingChange> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, change)| change.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the document with the change's modified text.
    ///
    /// A failed replace leaves the change pending. Cursor placement on the
    /// first added line is best-effort and never rolls the apply back.
    pub fn apply(
        &mut self,
        id: &str,
        document: &mut dyn LiveDocument,
    ) -> Result<AppliedChange, VibeError> {
        let change = match self.get(id) {
            Some(change) => change,
            None => return Err(not_found(id)),
        };

        document.replace_all(&change.result.modified_text)?;

        let change = self.remove(id).ok_or_else(|| not_found(id))?;
        let cursor_line = change.result.first_added_line().and_then(|line| {
            let target = Cursor::new(line - 1, 0);
            match document.set_cursor(target) {
                Ok(()) => Some(target.line),
                Err(e) => {
                    warn!(id = %change.id, error = %e, "could not move cursor to first added line");
                    None
                }
            }
        });

        info!(id = %change.id, ?cursor_line, "pending change applied");
        Ok(AppliedChange {
            change,
            cursor_line,
        })
    }

    /// Discard a pending change without touching any document.
    pub fn reject(&mut self, id: &str) -> Result<PendingChange, VibeError> {
        let change = self.remove(id).ok_or_else(|| not_found(id))?;
        info!(id = %change.id, "pending change rejected");
        Ok(change)
    }

    fn remove(&mut self, id: &str) -> Option<PendingChange> {
        let (_, change) = self.entries.remove(id)?;
        if self.current.as_deref() == Some(id) {
            debug!(id, "clearing current pending change");
            self.current = None;
        }
        Some(change)
    }
}

fn not_found(id: &str) -> VibeError {
    VibeError::NotFound { id: id.to_string() }
}
