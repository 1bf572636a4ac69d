//! Tracking of concurrent, independent revoke requests.

use std::{collections::HashMap, rc::Rc, time::Duration};

use metrics::counter;
use tokio::{task, time};
use tracing::{debug, info, warn};

use crate::{
    domain::{
        error::RequestFailure,
        results::{ActionKey, RevokeMessage},
    },
    presentation::document::ResultsView,
};

use super::backend::SearchBackend;

pub const DEFAULT_REVOKE_TIMEOUT: Duration = Duration::from_secs(30);

pub type RevokeOutcome = Result<RevokeMessage, RequestFailure>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevokeEntry {
    pub action: ActionKey,
    pub status: RevokeStatus,
    pub message: Option<String>,
}

impl RevokeEntry {
    fn pending(action: ActionKey) -> Self {
        Self {
            action,
            status: RevokeStatus::Pending,
            message: None,
        }
    }
}

/// In-flight revokes keyed by action.
///
/// Revokes are never cancelled: each runs to completion or failure under its
/// own timeout, regardless of searches or other revokes.
pub struct RevokeActionTracker {
    backend: Rc<dyn SearchBackend>,
    timeout: Duration,
    entries: HashMap<ActionKey, RevokeEntry>,
}

impl RevokeActionTracker {
    pub fn new(backend: Rc<dyn SearchBackend>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            entries: HashMap::new(),
        }
    }

    pub fn is_pending(&self, action: &ActionKey) -> bool {
        self.entries.contains_key(action)
    }

    pub fn pending_keys(&self) -> impl Iterator<Item = &ActionKey> {
        self.entries.keys()
    }

    pub fn has_pending(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Upper bound on how long any single revoke stays pending.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Starts revoking `action` unless it is already pending.
    ///
    /// Marks the control pending in `view` and spawns the request on the
    /// current [`tokio::task::LocalSet`]. `on_complete` runs once the request
    /// finishes; it is expected to hand the outcome to [`Self::complete`].
    pub fn revoke<V, F>(&mut self, action: ActionKey, view: &mut V, on_complete: F) -> bool
    where
        V: ResultsView + ?Sized,
        F: FnOnce(ActionKey, RevokeOutcome) + 'static,
    {
        if self.is_pending(&action) {
            debug!(action = %action, "revoke already pending, ignoring");
            return false;
        }

        self.entries
            .insert(action.clone(), RevokeEntry::pending(action.clone()));
        view.mark_revoke_pending(&action);

        counter!("rights_debugger_revoke_requests_total").increment(1);
        info!(action = %action, "issuing revoke request");

        let backend = Rc::clone(&self.backend);
        let timeout = self.timeout;
        task::spawn_local(async move {
            let outcome = match time::timeout(timeout, backend.revoke_once(&action)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(RequestFailure::Timeout),
            };
            on_complete(action, outcome);
        });
        true
    }

    /// Settles a finished revoke and updates its control, looked up afresh.
    pub fn complete<V>(
        &mut self,
        action: &ActionKey,
        outcome: RevokeOutcome,
        view: &mut V,
    ) -> Option<RevokeEntry>
    where
        V: ResultsView + ?Sized,
    {
        let Some(mut entry) = self.entries.remove(action) else {
            warn!(action = %action, "completion for untracked revoke");
            return None;
        };

        match outcome {
            Ok(message) => {
                info!(action = %action, message = %message, "revoke completed");
                if !view.replace_revoke_content(action, message.as_str()) {
                    view.notify(message.as_str());
                }
                entry.status = RevokeStatus::Completed;
                entry.message = Some(message.0);
            }
            Err(failure) => {
                counter!("rights_debugger_revoke_failures_total").increment(1);
                warn!(action = %action, error = %failure, "revoke failed");
                let reason = failure.to_string();
                view.replace_revoke_content(action, &reason);
                view.notify(&reason);
                entry.status = RevokeStatus::Failed;
                entry.message = Some(reason);
            }
        }
        Some(entry)
    }

    /// Re-applies pending state to freshly rendered controls.
    ///
    /// Returns how many pending actions still have a rendered control.
    pub fn reapply<V>(&self, view: &mut V) -> usize
    where
        V: ResultsView + ?Sized,
    {
        self.entries
            .keys()
            .filter(|action| view.mark_revoke_pending(action))
            .count()
    }
}
