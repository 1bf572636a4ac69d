//! Scripted collaborators for exercising the controller without a network.

use std::{cell::RefCell, future::Future, rc::Rc};

use async_trait::async_trait;
use metrics_util::debugging::{DebugValue, Snapshotter};
use serde_json::json;
use tokio::{
    sync::oneshot,
    task::{self, LocalSet},
};

use crate::domain::{
    criteria::SearchCriteria,
    error::RequestFailure,
    results::{ActionKey, ResultItem, ResultList, RevokeMessage},
};

use super::backend::SearchBackend;

type SearchReply = oneshot::Sender<Result<ResultList, RequestFailure>>;
type RevokeReply = oneshot::Sender<Result<RevokeMessage, RequestFailure>>;

/// Backend whose requests stay pending until a test resolves them.
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    searches: RefCell<Vec<(SearchCriteria, Option<SearchReply>)>>,
    revokes: RefCell<Vec<(ActionKey, Option<RevokeReply>)>>,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub(crate) fn search_calls(&self) -> Vec<SearchCriteria> {
        self.searches
            .borrow()
            .iter()
            .map(|(criteria, _)| criteria.clone())
            .collect()
    }

    pub(crate) fn revoke_calls(&self) -> Vec<ActionKey> {
        self.revokes
            .borrow()
            .iter()
            .map(|(action, _)| action.clone())
            .collect()
    }

    /// Answers the `index`-th search call. Returns `false` if the request
    /// was dropped before the answer arrived.
    pub(crate) fn resolve_search(
        &self,
        index: usize,
        outcome: Result<ResultList, RequestFailure>,
    ) -> bool {
        let reply = self
            .searches
            .borrow_mut()
            .get_mut(index)
            .and_then(|(_, reply)| reply.take());
        reply.is_some_and(|reply| reply.send(outcome).is_ok())
    }

    pub(crate) fn resolve_revoke(
        &self,
        index: usize,
        outcome: Result<RevokeMessage, RequestFailure>,
    ) -> bool {
        let reply = self
            .revokes
            .borrow_mut()
            .get_mut(index)
            .and_then(|(_, reply)| reply.take());
        reply.is_some_and(|reply| reply.send(outcome).is_ok())
    }
}

#[async_trait(?Send)]
impl SearchBackend for ScriptedBackend {
    async fn search_once(&self, criteria: &SearchCriteria) -> Result<ResultList, RequestFailure> {
        let (tx, rx) = oneshot::channel();
        self.searches
            .borrow_mut()
            .push((criteria.clone(), Some(tx)));
        rx.await
            .unwrap_or_else(|_| Err(RequestFailure::transport("reply dropped")))
    }

    async fn revoke_once(&self, action: &ActionKey) -> Result<RevokeMessage, RequestFailure> {
        let (tx, rx) = oneshot::channel();
        self.revokes.borrow_mut().push((action.clone(), Some(tx)));
        rx.await
            .unwrap_or_else(|_| Err(RequestFailure::transport("reply dropped")))
    }
}

pub(crate) async fn run_local<F: Future>(future: F) -> F::Output {
    LocalSet::new().run_until(future).await
}

/// Lets every runnable local task make progress.
pub(crate) async fn settle() {
    for _ in 0..32 {
        task::yield_now().await;
    }
}

pub(crate) fn item(id: &str) -> ResultItem {
    serde_json::from_value(json!({
        "id": id,
        "actionUrl": format!("/revoke/{id}"),
        "principal": id,
    }))
    .expect("result item")
}

pub(crate) fn message(text: &str) -> RevokeMessage {
    RevokeMessage(text.to_string())
}

/// Current value of counter `name`, or zero if it was never touched.
pub(crate) fn counter_value(snapshotter: &Snapshotter, name: &str) -> u64 {
    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .find_map(|(key, _, _, value)| match value {
            DebugValue::Counter(count) if key.key().name() == name => Some(count),
            _ => None,
        })
        .unwrap_or(0)
}
