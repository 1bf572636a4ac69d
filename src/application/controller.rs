//! Orchestration of the live search form.

use std::{
    cell::{Ref, RefCell},
    rc::{Rc, Weak},
    time::Duration,
};

use tokio::{sync::Notify, time};
use tracing::{debug, info, warn};

use crate::{
    domain::{
        criteria::{FieldEdit, SearchCriteria, SearchForm},
        results::ActionKey,
    },
    presentation::{document::ResultsView, render::ResultRenderer},
};

use super::{
    backend::SearchBackend,
    lifecycle::{DEFAULT_SEARCH_TIMEOUT, RequestId, RequestLifecycleManager, SearchOutcome},
    revoke::{DEFAULT_REVOKE_TIMEOUT, RevokeActionTracker, RevokeOutcome},
};

/// Slack on top of the revoke timeout when waiting for revokes to settle.
const REVOKE_DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Visible state of the search region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Idle,
    Refreshing,
    Error,
}

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub search_timeout: Duration,
    pub revoke_timeout: Duration,
    /// Form field whose value is highlighted in results.
    pub term_field: String,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            search_timeout: DEFAULT_SEARCH_TIMEOUT,
            revoke_timeout: DEFAULT_REVOKE_TIMEOUT,
            term_field: "q".to_string(),
        }
    }
}

struct ControllerState<V> {
    form: SearchForm,
    state: FormState,
    renderer: ResultRenderer,
    lifecycle: RequestLifecycleManager,
    revokes: RevokeActionTracker,
    revokes_settled: Rc<Notify>,
    view: V,
}

/// Handle to the search form controller.
///
/// Clones share one controller; event bindings hold a clone. Requests run as
/// local tasks, so the controller must be driven inside a
/// [`tokio::task::LocalSet`].
pub struct SearchFormController<V> {
    inner: Rc<RefCell<ControllerState<V>>>,
}

impl<V> Clone for SearchFormController<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V: ResultsView + 'static> SearchFormController<V> {
    pub fn new(
        form: SearchForm,
        backend: Rc<dyn SearchBackend>,
        view: V,
        options: ControllerOptions,
    ) -> Self {
        let state = ControllerState {
            form,
            state: FormState::Idle,
            renderer: ResultRenderer::new(options.term_field),
            lifecycle: RequestLifecycleManager::new(Rc::clone(&backend), options.search_timeout),
            revokes: RevokeActionTracker::new(backend, options.revoke_timeout),
            revokes_settled: Rc::new(Notify::new()),
            view,
        };
        Self {
            inner: Rc::new(RefCell::new(state)),
        }
    }

    /// Issues the unconditional initial refresh.
    pub fn start(&self) -> RequestId {
        info!("loading initial results");
        self.refresh()
    }

    /// Applies an edit to field `name`; search inputs trigger a refresh.
    pub fn input(&self, name: &str, value: &str) -> Option<RequestId> {
        let edit = self.inner.borrow_mut().form.set(name, value);
        match edit {
            FieldEdit::Search => Some(self.refresh()),
            FieldEdit::Passive => {
                debug!(field = name, "non-search field updated");
                None
            }
            FieldEdit::Unknown => {
                warn!(field = name, "no such form field");
                None
            }
        }
    }

    /// Handles a click on the revoke control for `action`.
    ///
    /// Returns `true` if a revoke request was issued.
    pub fn click_revoke(&self, action: ActionKey) -> bool {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;

        if !inner.view.has_revoke_control(&action) {
            warn!(action = %action, "no revoke control rendered for action");
            return false;
        }

        let weak = Rc::downgrade(&self.inner);
        inner.revokes.revoke(action, &mut inner.view, move |action, outcome| {
            complete_revoke(&weak, action, outcome);
        })
    }

    pub fn state(&self) -> FormState {
        self.inner.borrow().state
    }

    pub fn criteria(&self) -> SearchCriteria {
        self.inner.borrow().form.serialize()
    }

    pub fn is_revoke_pending(&self, action: &ActionKey) -> bool {
        self.inner.borrow().revokes.is_pending(action)
    }

    pub fn pending_revokes(&self) -> Vec<ActionKey> {
        self.inner.borrow().revokes.pending_keys().cloned().collect()
    }

    /// Waits for in-flight revokes to settle.
    ///
    /// Each revoke is bounded by its own timeout, so this returns within one
    /// revoke timeout plus [`REVOKE_DRAIN_GRACE`]. Returns the actions still
    /// pending at that point.
    pub async fn drain_revokes(&self) -> Vec<ActionKey> {
        let (settled, limit) = {
            let inner = self.inner.borrow();
            (
                Rc::clone(&inner.revokes_settled),
                inner.revokes.timeout() + REVOKE_DRAIN_GRACE,
            )
        };

        let wait = async {
            loop {
                let notified = settled.notified();
                if !self.inner.borrow().revokes.has_pending() {
                    break;
                }
                notified.await;
            }
        };
        if time::timeout(limit, wait).await.is_err() {
            warn!("gave up waiting for pending revokes");
        }
        self.pending_revokes()
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.borrow().lifecycle.is_pending()
    }

    /// Borrows the view. The borrow must end before control returns to the
    /// event loop.
    pub fn view(&self) -> Ref<'_, V> {
        Ref::map(self.inner.borrow(), |inner| &inner.view)
    }

    fn refresh(&self) -> RequestId {
        let mut inner = self.inner.borrow_mut();
        let criteria = inner.form.serialize();
        inner.state = FormState::Refreshing;

        let weak = Rc::downgrade(&self.inner);
        let captured = criteria.clone();
        inner.lifecycle.refresh(criteria, move |id, outcome| {
            complete_search(&weak, id, &captured, outcome);
        })
    }
}

fn complete_search<V: ResultsView>(
    weak: &Weak<RefCell<ControllerState<V>>>,
    id: RequestId,
    criteria: &SearchCriteria,
    outcome: SearchOutcome,
) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    inner.borrow_mut().apply_search(id, criteria, outcome);
}

fn complete_revoke<V: ResultsView>(
    weak: &Weak<RefCell<ControllerState<V>>>,
    action: ActionKey,
    outcome: RevokeOutcome,
) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    let mut guard = inner.borrow_mut();
    let inner = &mut *guard;
    inner.revokes.complete(&action, outcome, &mut inner.view);
    inner.revokes_settled.notify_waiters();
}

impl<V: ResultsView> ControllerState<V> {
    fn apply_search(&mut self, id: RequestId, criteria: &SearchCriteria, outcome: SearchOutcome) {
        self.lifecycle.finish(id);

        let items = match outcome {
            Ok(items) => items,
            Err(failure) => {
                self.view.show_error(&failure.to_string());
                self.state = FormState::Error;
                return;
            }
        };

        let rendered: Result<Vec<_>, _> = items
            .iter()
            .map(|item| self.renderer.render(criteria, item))
            .collect();
        match rendered {
            Ok(rendered) => {
                let count = rendered.len();
                self.view.show_results(rendered);
                let reapplied = self.revokes.reapply(&mut self.view);
                self.state = FormState::Idle;
                debug!(request = %id, results = count, pending_revokes = reapplied, "results rendered");
            }
            Err(err) => {
                warn!(request = %id, error = %err, "failed to render results");
                self.view.show_error(&err.to_string());
                self.state = FormState::Error;
            }
        }
    }
}
