//! The two network operations the search form depends on.

use async_trait::async_trait;

use crate::domain::{
    criteria::SearchCriteria,
    error::RequestFailure,
    results::{ActionKey, ResultList, RevokeMessage},
};

/// Transport for the search and revoke endpoints.
///
/// Implementations only perform the request; timeouts and cancellation are
/// owned by the callers.
#[async_trait(?Send)]
pub trait SearchBackend {
    async fn search_once(&self, criteria: &SearchCriteria) -> Result<ResultList, RequestFailure>;

    async fn revoke_once(&self, action: &ActionKey) -> Result<RevokeMessage, RequestFailure>;
}
