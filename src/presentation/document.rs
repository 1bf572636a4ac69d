//! In-memory model of the results region of the search page.
//!
//! Result elements receive an [`ElementId`] when they are rendered. Revoke
//! controls are located through an action-key index that is rebuilt on every
//! re-render, so a lookup never reaches an element that a later render has
//! already discarded.

use std::collections::HashMap;

use lol_html::{RewriteStrSettings, element, html_content::ContentType, rewrite_str};
use thiserror::Error;

use crate::domain::results::ActionKey;

use super::render::escape_html;

const PROGRESS_INDICATOR: &str =
    r#"<span class="revoke-progress" role="status" aria-label="Revoking"></span>"#;

/// Markup for one result, as produced by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedResult {
    pub action: ActionKey,
    pub markup: String,
}

/// Operations the search controller performs on the results region.
pub trait ResultsView {
    /// Replaces the whole result list and clears any error state.
    fn show_results(&mut self, results: Vec<RenderedResult>);

    /// Empties the result list and shows `reason` in its place.
    fn show_error(&mut self, reason: &str);

    /// Whether a clickable revoke control for `action` is currently rendered.
    fn has_revoke_control(&self, action: &ActionKey) -> bool;

    /// Disables the revoke control for `action` and shows a progress indicator.
    ///
    /// Returns `false` when no such control is rendered.
    fn mark_revoke_pending(&mut self, action: &ActionKey) -> bool;

    /// Replaces the content of the revoke container for `action` with `text`.
    ///
    /// Returns `false` when the container no longer exists.
    fn replace_revoke_content(&mut self, action: &ActionKey, text: &str) -> bool;

    /// Raises a blocking notification.
    fn notify(&mut self, message: &str);
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to rewrite result markup: {0}")]
    Rewrite(String),
}

/// Render-time identity of a result element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlState {
    Ready,
    /// Disabled, with a progress indicator.
    Pending,
    /// The container content was replaced by a message.
    Replaced(String),
}

#[derive(Debug, Clone)]
pub struct ResultElement {
    pub id: ElementId,
    pub action: ActionKey,
    pub markup: String,
    pub control: ControlState,
}

impl ResultElement {
    /// Current markup of the element with its control state applied.
    pub fn to_html(&self) -> Result<String, DocumentError> {
        let rewritten = match &self.control {
            ControlState::Ready => return Ok(self.markup.clone()),
            ControlState::Pending => rewrite_str(
                &self.markup,
                RewriteStrSettings {
                    element_content_handlers: vec![element!("[data-action]", |el| {
                        el.set_attribute("disabled", "")?;
                        el.set_attribute("aria-busy", "true")?;
                        el.after(PROGRESS_INDICATOR, ContentType::Html);
                        Ok(())
                    })],
                    ..RewriteStrSettings::default()
                },
            ),
            ControlState::Replaced(text) => rewrite_str(
                &self.markup,
                RewriteStrSettings {
                    element_content_handlers: vec![element!(".revoke-container", |el| {
                        el.set_inner_content(text, ContentType::Text);
                        Ok(())
                    })],
                    ..RewriteStrSettings::default()
                },
            ),
        };
        rewritten.map_err(|err| DocumentError::Rewrite(err.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct Document {
    elements: Vec<ResultElement>,
    by_action: HashMap<ActionKey, Vec<ElementId>>,
    error: Option<String>,
    notifications: Vec<String>,
    next_id: u64,
    renders: u64,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elements(&self) -> &[ResultElement] {
        &self.elements
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Number of full result re-renders so far.
    pub fn render_count(&self) -> u64 {
        self.renders
    }

    pub fn notifications(&self) -> &[String] {
        &self.notifications
    }

    /// Ids currently registered for `action`.
    pub fn element_ids(&self, action: &ActionKey) -> &[ElementId] {
        self.by_action
            .get(action)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Control state of the first element rendered for `action`.
    pub fn control_state(&self, action: &ActionKey) -> Option<&ControlState> {
        let id = self.element_ids(action).first()?;
        self.elements
            .iter()
            .find(|element| element.id == *id)
            .map(|element| &element.control)
    }

    /// Serializes the region with every control state applied.
    pub fn to_html(&self) -> Result<String, DocumentError> {
        if let Some(reason) = &self.error {
            return Ok(format!(
                r#"<div class="results error">{}</div>"#,
                escape_html(reason)
            ));
        }

        let mut html = String::from(r#"<ol class="results">"#);
        for element in &self.elements {
            html.push_str(&element.to_html()?);
        }
        html.push_str("</ol>");
        Ok(html)
    }

    fn resolve_mut(&mut self, action: &ActionKey) -> impl Iterator<Item = &mut ResultElement> {
        let ids = self.by_action.get(action).cloned().unwrap_or_default();
        self.elements
            .iter_mut()
            .filter(move |element| ids.contains(&element.id))
    }
}

impl ResultsView for Document {
    fn show_results(&mut self, results: Vec<RenderedResult>) {
        self.error = None;
        self.elements.clear();
        self.by_action.clear();
        self.renders += 1;

        for rendered in results {
            self.next_id += 1;
            let id = ElementId(self.next_id);
            self.by_action
                .entry(rendered.action.clone())
                .or_default()
                .push(id);
            self.elements.push(ResultElement {
                id,
                action: rendered.action,
                markup: rendered.markup,
                control: ControlState::Ready,
            });
        }
    }

    fn show_error(&mut self, reason: &str) {
        self.elements.clear();
        self.by_action.clear();
        self.error = Some(reason.to_string());
    }

    fn has_revoke_control(&self, action: &ActionKey) -> bool {
        self.element_ids(action).iter().any(|id| {
            self.elements
                .iter()
                .any(|element| {
                    element.id == *id && !matches!(element.control, ControlState::Replaced(_))
                })
        })
    }

    fn mark_revoke_pending(&mut self, action: &ActionKey) -> bool {
        let mut marked = false;
        for element in self.resolve_mut(action) {
            if !matches!(element.control, ControlState::Replaced(_)) {
                element.control = ControlState::Pending;
                marked = true;
            }
        }
        marked
    }

    fn replace_revoke_content(&mut self, action: &ActionKey, text: &str) -> bool {
        let mut replaced = false;
        for element in self.resolve_mut(action) {
            element.control = ControlState::Replaced(text.to_string());
            replaced = true;
        }
        replaced
    }

    fn notify(&mut self, message: &str) {
        self.notifications.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(action: &str) -> RenderedResult {
        RenderedResult {
            action: ActionKey::from(action),
            markup: format!(
                r#"<li class="result"><span class="revoke-container"><button type="button" class="revoke" data-action="{action}">Revoke</button></span></li>"#
            ),
        }
    }

    #[test]
    fn rerender_assigns_fresh_element_ids() {
        let mut document = Document::new();
        let key = ActionKey::from("/revoke/a1");

        document.show_results(vec![rendered("/revoke/a1")]);
        let first = document.element_ids(&key).to_vec();
        document.show_results(vec![rendered("/revoke/a1")]);
        let second = document.element_ids(&key).to_vec();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_ne!(first, second);
        assert_eq!(document.render_count(), 2);
    }

    #[test]
    fn pending_control_is_disabled_with_progress() {
        let mut document = Document::new();
        let key = ActionKey::from("/revoke/a1");
        document.show_results(vec![rendered("/revoke/a1")]);

        assert!(document.mark_revoke_pending(&key));
        assert_eq!(document.control_state(&key), Some(&ControlState::Pending));

        let html = document.to_html().expect("html");
        assert!(html.contains("disabled"));
        assert!(html.contains(r#"class="revoke-progress""#));
    }

    #[test]
    fn replaced_content_is_escaped_text() {
        let mut document = Document::new();
        let key = ActionKey::from("/revoke/a1");
        document.show_results(vec![rendered("/revoke/a1")]);

        assert!(document.replace_revoke_content(&key, "<b>gone</b>"));
        assert!(!document.has_revoke_control(&key));
        assert!(!document.mark_revoke_pending(&key));

        let html = document.to_html().expect("html");
        assert!(html.contains("&lt;b&gt;gone&lt;/b&gt;"));
        assert!(!html.contains("<button"));
    }

    #[test]
    fn missing_elements_are_reported() {
        let mut document = Document::new();
        let key = ActionKey::from("/revoke/zz");
        document.show_results(vec![rendered("/revoke/a1")]);

        assert!(!document.has_revoke_control(&key));
        assert!(!document.mark_revoke_pending(&key));
        assert!(!document.replace_revoke_content(&key, "revoked"));
    }

    #[test]
    fn error_replaces_results() {
        let mut document = Document::new();
        document.show_results(vec![rendered("/revoke/a1")]);
        document.show_error("timeout");

        assert!(document.elements().is_empty());
        assert_eq!(document.error(), Some("timeout"));
        assert_eq!(
            document.to_html().expect("html"),
            r#"<div class="results error">timeout</div>"#
        );

        document.show_results(Vec::new());
        assert_eq!(document.error(), None);
    }
}
