//! Ownership of the single in-flight search request.

use std::{fmt, rc::Rc, time::Duration};

use metrics::counter;
use tokio::{
    task::{self, AbortHandle},
    time,
};
use tracing::{debug, warn};

use crate::domain::{criteria::SearchCriteria, error::RequestFailure, results::ResultList};

use super::backend::SearchBackend;

pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

pub type SearchOutcome = Result<ResultList, RequestFailure>;

/// Sequence number of a search request issued by one manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct InFlightSearch {
    id: RequestId,
    handle: AbortHandle,
}

/// Issues search requests with cancel-then-issue semantics.
///
/// Each request runs as a local task. Issuing a new request aborts the
/// outstanding task, and an aborted task never runs its completion callback,
/// so only the latest request can reach the display. Must be used from within
/// a [`tokio::task::LocalSet`].
pub struct RequestLifecycleManager {
    backend: Rc<dyn SearchBackend>,
    timeout: Duration,
    current: Option<InFlightSearch>,
    issued: u64,
}

impl RequestLifecycleManager {
    pub fn new(backend: Rc<dyn SearchBackend>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            current: None,
            issued: 0,
        }
    }

    /// Cancels any outstanding search and issues a new one for `criteria`.
    ///
    /// `on_complete` runs exactly once if the request finishes (successfully
    /// or with a genuine failure) and never if it is superseded.
    pub fn refresh<F>(&mut self, criteria: SearchCriteria, on_complete: F) -> RequestId
    where
        F: FnOnce(RequestId, SearchOutcome) + 'static,
    {
        self.cancel();

        self.issued += 1;
        let id = RequestId(self.issued);
        let backend = Rc::clone(&self.backend);
        let timeout = self.timeout;

        counter!("rights_debugger_search_requests_total").increment(1);
        debug!(request = %id, criteria = %criteria, "issuing search request");

        let handle = task::spawn_local(async move {
            let outcome = match time::timeout(timeout, backend.search_once(&criteria)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(RequestFailure::Timeout),
            };
            if let Err(failure) = &outcome {
                counter!("rights_debugger_search_failures_total").increment(1);
                warn!(request = %id, error = %failure, "search request failed");
            }
            on_complete(id, outcome);
        });

        self.current = Some(InFlightSearch {
            id,
            handle: handle.abort_handle(),
        });
        id
    }

    /// Aborts the outstanding search, if any, without issuing another.
    pub fn cancel(&mut self) -> Option<RequestId> {
        let search = self.current.take()?;
        search.handle.abort();
        counter!("rights_debugger_search_superseded_total").increment(1);
        debug!(request = %search.id, "search request superseded");
        Some(search.id)
    }

    /// Releases the slot held by `id` once its callback runs.
    ///
    /// Returns `false` if `id` is no longer the current request.
    pub fn finish(&mut self, id: RequestId) -> bool {
        match &self.current {
            Some(search) if search.id == id => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<RequestId> {
        self.current.as_ref().map(|search| search.id)
    }
}

impl Drop for RequestLifecycleManager {
    fn drop(&mut self) {
        if let Some(search) = self.current.take() {
            search.handle.abort();
        }
    }
}
