//! HTTP transport for the search and revoke endpoints.

use async_trait::async_trait;
use reqwest::{
    Client, Response, StatusCode, Url,
    header::{ACCEPT, CONTENT_TYPE},
};
use serde::de::DeserializeOwned;

use crate::{
    application::backend::SearchBackend,
    config::SearchMethod,
    domain::{
        criteria::SearchCriteria,
        error::RequestFailure,
        results::{ActionKey, ResultList, RevokeMessage, RevokeResponse, SearchResponse},
    },
};

use super::error::InfraError;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    endpoint: Url,
    method: SearchMethod,
}

impl HttpBackend {
    pub fn new(endpoint: Url, method: SearchMethod) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            method,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("rights-debugger/", env!("CARGO_PKG_VERSION"))
    }

    /// Resolves an action key against the search endpoint.
    pub fn action_url(&self, action: &ActionKey) -> Result<Url, RequestFailure> {
        self.endpoint
            .join(action.as_str())
            .map_err(|err| RequestFailure::InvalidRequest(format!("{action}: {err}")))
    }
}

#[async_trait(?Send)]
impl SearchBackend for HttpBackend {
    async fn search_once(&self, criteria: &SearchCriteria) -> Result<ResultList, RequestFailure> {
        let request = match self.method {
            SearchMethod::Get => {
                let mut url = self.endpoint.clone();
                url.query_pairs_mut().extend_pairs(criteria.pairs().iter());
                self.client.get(url)
            }
            SearchMethod::Post => self
                .client
                .post(self.endpoint.clone())
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(criteria.to_form_urlencoded()),
        };

        let response = request
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport_failure)?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_failure(status));
        }
        let payload: SearchResponse = decode(response).await?;
        Ok(payload.results)
    }

    async fn revoke_once(&self, action: &ActionKey) -> Result<RevokeMessage, RequestFailure> {
        let url = self.action_url(action)?;
        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status();
        if !status.is_success() {
            // Rejections may still carry a readable `msg`.
            return match decode::<RevokeResponse>(response).await {
                Ok(payload) => Err(RequestFailure::rejected(payload.msg)),
                Err(_) => Err(status_failure(status)),
            };
        }
        let payload: RevokeResponse = decode(response).await?;
        payload.into_outcome()
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RequestFailure> {
    let bytes = response.bytes().await.map_err(transport_failure)?;
    serde_json::from_slice(&bytes).map_err(|err| RequestFailure::decode(err.to_string()))
}

fn status_failure(status: StatusCode) -> RequestFailure {
    RequestFailure::Status {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("error").to_string(),
    }
}

fn transport_failure(err: reqwest::Error) -> RequestFailure {
    if err.is_timeout() {
        RequestFailure::Timeout
    } else {
        RequestFailure::transport(err.to_string())
    }
}
