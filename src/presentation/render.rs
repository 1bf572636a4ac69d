//! Markup for individual search results.
//!
//! Field text is escaped first and highlighted second. Highlighting is a
//! literal, case-sensitive match of the search term against the escaped text,
//! so a term that only occurs in the raw text (for example `a&b`) is not
//! marked, while a term that occurs inside an entity is: `amp` against `a&b`
//! yields `a&<mark>amp</mark>;b`.

use askama::Template;
use thiserror::Error;

use crate::domain::{criteria::SearchCriteria, results::ResultItem};

use super::document::RenderedResult;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to render result `{id}`: {source}")]
    Template {
        id: String,
        #[source]
        source: askama::Error,
    },
}

struct FieldView<'a> {
    name: &'a str,
    html: String,
}

#[derive(Template)]
#[template(
    source = r#"<li class="result" data-result-id="{{ id }}"><dl class="result-fields">{% for field in fields %}<dt>{{ field.name }}</dt><dd>{{ field.html|safe }}</dd>{% endfor %}</dl><span class="revoke-container"><button type="button" class="revoke" data-action="{{ action }}">Revoke</button></span></li>"#,
    ext = "html"
)]
struct ResultItemTemplate<'a> {
    id: &'a str,
    fields: Vec<FieldView<'a>>,
    action: &'a str,
}

/// Renders result records against the criteria they were searched with.
#[derive(Debug, Clone)]
pub struct ResultRenderer {
    term_field: String,
}

impl ResultRenderer {
    /// `term_field` names the form field whose value is highlighted.
    pub fn new(term_field: impl Into<String>) -> Self {
        Self {
            term_field: term_field.into(),
        }
    }

    /// The highlight term, if the criteria carry a non-blank one.
    pub fn term<'c>(&self, criteria: &'c SearchCriteria) -> Option<&'c str> {
        criteria
            .get(&self.term_field)
            .filter(|term| !term.trim().is_empty())
    }

    pub fn render(
        &self,
        criteria: &SearchCriteria,
        item: &ResultItem,
    ) -> Result<RenderedResult, RenderError> {
        let term = self.term(criteria);
        let fields = item
            .display_fields()
            .map(|(name, text)| FieldView {
                name,
                html: highlight(&escape_html(&text), term),
            })
            .collect();

        let markup = ResultItemTemplate {
            id: &item.id,
            fields,
            action: item.action.as_str(),
        }
        .render()
        .map_err(|source| RenderError::Template {
            id: item.id.clone(),
            source,
        })?;

        Ok(RenderedResult {
            action: item.action.clone(),
            markup,
        })
    }
}

pub(crate) fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Wraps every occurrence of `term` in already-escaped `text` in `<mark>`.
fn highlight(text: &str, term: Option<&str>) -> String {
    let Some(term) = term.filter(|term| !term.is_empty()) else {
        return text.to_string();
    };

    let mut out = String::with_capacity(text.len() + 16);
    let mut rest = text;
    while let Some(pos) = rest.find(term) {
        let (before, matched) = rest.split_at(pos);
        out.push_str(before);
        out.push_str("<mark>");
        out.push_str(&matched[..term.len()]);
        out.push_str("</mark>");
        rest = &matched[term.len()..];
    }
    out.push_str(rest);
    out
}
