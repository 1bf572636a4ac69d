//! Response payloads of the search and revoke endpoints.

use std::{borrow::Cow, fmt};

use serde::Deserialize;
use serde_json::{Map, Value};

use super::error::RequestFailure;

/// Opaque reference to one revocable grant: both the revoke endpoint and the
/// key under which an in-flight revoke is tracked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct ActionKey(String);

impl ActionKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActionKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One record returned by the search endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResultItem {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "actionUrl")]
    pub action: ActionKey,
    /// Every other member of the record, handed to the renderer untouched.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ResultItem {
    /// Displayable text of each field; nulls are skipped.
    pub fn display_fields(&self) -> impl Iterator<Item = (&str, Cow<'_, str>)> {
        self.fields.iter().filter_map(|(name, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(text) => Cow::Borrowed(text.as_str()),
                other => Cow::Owned(other.to_string()),
            };
            Some((name.as_str(), text))
        })
    }
}

pub type ResultList = Vec<ResultItem>;

/// `{ "results": [...] }`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub results: ResultList,
}

/// Message reported by a completed revoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevokeMessage(pub String);

impl RevokeMessage {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RevokeMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `{ "msg": "...", "ok": bool? }`
#[derive(Debug, Clone, Deserialize)]
pub struct RevokeResponse {
    pub msg: String,
    #[serde(default)]
    pub ok: Option<bool>,
}

impl RevokeResponse {
    /// An explicit `"ok": false` is an application-level rejection.
    pub fn into_outcome(self) -> Result<RevokeMessage, RequestFailure> {
        match self.ok {
            Some(false) => Err(RequestFailure::rejected(self.msg)),
            _ => Ok(RevokeMessage(self.msg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_item_keeps_unknown_members_in_server_order() {
        let item: ResultItem = serde_json::from_str(
            r#"{"id":"a1","actionUrl":"/revoke/a1","right":"ShowTicket","principal":"alice","note":null,"level":3}"#,
        )
        .expect("result item");

        assert_eq!(item.action.as_str(), "/revoke/a1");
        let fields: Vec<_> = item
            .display_fields()
            .map(|(name, text)| (name.to_string(), text.into_owned()))
            .collect();
        assert_eq!(
            fields,
            [
                ("right".to_string(), "ShowTicket".to_string()),
                ("principal".to_string(), "alice".to_string()),
                ("level".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn result_item_without_action_is_rejected() {
        let err = serde_json::from_str::<ResultItem>(r#"{"id":"a1"}"#).expect_err("missing action");
        assert!(err.to_string().contains("actionUrl"));
    }

    #[test]
    fn revoke_response_with_ok_false_is_a_rejection() {
        let response: RevokeResponse =
            serde_json::from_str(r#"{"ok":false,"msg":"permission denied"}"#).expect("payload");
        assert_eq!(
            response.into_outcome(),
            Err(RequestFailure::Rejected("permission denied".into()))
        );

        let response: RevokeResponse =
            serde_json::from_str(r#"{"msg":"revoked"}"#).expect("payload");
        assert_eq!(
            response.into_outcome(),
            Ok(RevokeMessage("revoked".into()))
        );
    }
}
