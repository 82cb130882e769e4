//! Change recorder
//!
//! Writes change-log entries and credits contributors. Both sinks are
//! best-effort: failures are logged and never reach the caller.

use onto_model::{ChangeLogId, NodeChange};
use onto_store::{ChangeLogSink, ContributorSink};
use std::collections::HashSet;

/// Records changes to a change-log sink and credits their actors
#[derive(Debug, Clone)]
pub struct ChangeRecorder<C, K> {
    change_log: C,
    contributors: K,
    system_users: HashSet<String>,
}

impl<C: ChangeLogSink, K: ContributorSink> ChangeRecorder<C, K> {
    /// Create recorder over the two sinks
    #[must_use]
    pub fn new(change_log: C, contributors: K) -> Self {
        Self {
            change_log,
            contributors,
            system_users: HashSet::new(),
        }
    }

    /// Accounts whose changes are logged but never credited
    #[must_use]
    pub fn with_system_users<I, T>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.system_users.extend(users.into_iter().map(Into::into));
        self
    }

    /// Whether `username` is a system account
    #[inline]
    #[must_use]
    pub fn is_system_user(&self, username: &str) -> bool {
        self.system_users.contains(username)
    }

    /// Log one change and credit its actor
    ///
    /// Returns the entry id when the change-log write succeeded. Entries
    /// without an actor are skipped entirely.
    pub async fn record(&self, change: NodeChange) -> Option<ChangeLogId> {
        if change.modified_by.is_empty() {
            tracing::debug!(node = %change.node_id, change = %change.change_type, "change without actor not recorded");
            return None;
        }
        let node_id = change.node_id.clone();
        let actor = change.modified_by.clone();
        let property = change.modified_property.clone();

        let id = match self.change_log.log(change).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::error!(node = %node_id, error = %e, "change log write failed");
                None
            }
        };

        if !self.is_system_user(&actor) {
            if let Err(e) = self
                .contributors
                .update_contributors(&node_id, &actor, property.as_deref())
                .await
            {
                tracing::error!(node = %node_id, actor = %actor, error = %e, "contributor update failed");
            }
        }
        id
    }

    /// Record changes in order
    pub async fn record_all(&self, changes: impl IntoIterator<Item = NodeChange>) -> Vec<ChangeLogId> {
        let mut ids = Vec::new();
        for change in changes {
            if let Some(id) = self.record(change).await {
                ids.push(id);
            }
        }
        ids
    }
}
