//! Form fields and the search criteria captured from them.

use std::fmt;

use serde::Deserialize;

/// One input of the search form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(default)]
    pub value: String,
    /// Edits to search inputs trigger a live refresh; other inputs only ride along.
    #[serde(default = "default_search")]
    pub search: bool,
}

fn default_search() -> bool {
    true
}

impl FormField {
    pub fn search(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            search: true,
        }
    }

    pub fn fixed(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            search: false,
        }
    }
}

/// Result of applying an edit to the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEdit {
    /// A search input changed; the results must be refreshed.
    Search,
    /// A non-search input changed.
    Passive,
    /// No input carries that name.
    Unknown,
}

/// Live state of the form inputs, in document order.
#[derive(Debug, Clone, Default)]
pub struct SearchForm {
    fields: Vec<FormField>,
}

impl SearchForm {
    pub fn new(fields: Vec<FormField>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// Updates every input named `name`.
    pub fn set(&mut self, name: &str, value: &str) -> FieldEdit {
        let mut edit = FieldEdit::Unknown;
        for field in self.fields.iter_mut().filter(|field| field.name == name) {
            field.value = value.to_string();
            if field.search {
                edit = FieldEdit::Search;
            } else if edit == FieldEdit::Unknown {
                edit = FieldEdit::Passive;
            }
        }
        edit
    }

    /// Captures the current inputs as an immutable criteria snapshot.
    pub fn serialize(&self) -> SearchCriteria {
        SearchCriteria {
            pairs: self
                .fields
                .iter()
                .map(|field| (field.name.clone(), field.value.clone()))
                .collect(),
        }
    }
}

/// Ordered field name/value pairs sent with one search request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    pairs: Vec<(String, String)>,
}

impl SearchCriteria {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Value of the first field named `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// `application/x-www-form-urlencoded` rendition of the pairs.
    pub fn to_form_urlencoded(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

impl fmt::Display for SearchCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_form_urlencoded())
    }
}
