//! Vocabularies of terms backing choice fields.

use indexmap::IndexMap;
use thiserror::Error;

use crate::error::{FormError, Result};
use crate::value::Value;

/// Lookup failure for a value or token that has no term.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    /// No term carries this value.
    #[error("value {0:?} is not in vocabulary")]
    Value(Value),
    /// No term carries this token.
    #[error("token {0:?} is not in vocabulary")]
    Token(String),
}

/// One option of a vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    /// Typed payload.
    pub value: Value,
    /// Identifier safe for HTML attributes and query strings.
    pub token: String,
    /// Display label.
    pub title: Option<String>,
    /// Optional longer description.
    pub description: Option<String>,
}

impl Term {
    /// Creates a term.
    pub fn new(value: impl Into<Value>, token: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            token: token.into(),
            title: Some(title.into()),
            description: None,
        }
    }

    /// Creates a term whose token is the display form of its value.
    pub fn from_value(value: impl Into<Value>) -> Self {
        let value = value.into();
        Self {
            token: value.to_string(),
            value,
            title: None,
            description: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Returns the title, falling back to the token.
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.token)
    }
}

/// An ordered collection of terms keyed by their unique tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    terms: IndexMap<String, Term>,
}

impl Vocabulary {
    /// Creates a vocabulary, rejecting duplicate tokens.
    pub fn new(terms: impl IntoIterator<Item = Term>) -> Result<Self> {
        let mut vocabulary = Self::default();
        for term in terms {
            if vocabulary.terms.contains_key(&term.token) {
                return Err(FormError::DuplicateToken(term.token));
            }
            vocabulary.terms.insert(term.token.clone(), term);
        }
        Ok(vocabulary)
    }

    /// Creates a vocabulary from `(value, token, title)` triples.
    pub fn from_items<V, T, L>(items: impl IntoIterator<Item = (V, T, L)>) -> Result<Self>
    where
        V: Into<Value>,
        T: Into<String>,
        L: Into<String>,
    {
        Self::new(
            items
                .into_iter()
                .map(|(value, token, title)| Term::new(value, token, title)),
        )
    }

    /// Creates a vocabulary from values, using their display form as token.
    pub fn from_values<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Result<Self> {
        Self::new(values.into_iter().map(Term::from_value))
    }

    /// Returns the term carrying `value`.
    pub fn get_term(&self, value: &Value) -> std::result::Result<&Term, LookupError> {
        self.terms
            .values()
            .find(|term| &term.value == value)
            .ok_or_else(|| LookupError::Value(value.clone()))
    }

    /// Returns the term carrying `token`.
    pub fn get_term_by_token(&self, token: &str) -> std::result::Result<&Term, LookupError> {
        self.terms
            .get(token)
            .ok_or_else(|| LookupError::Token(token.to_string()))
    }

    /// The yes/no vocabulary of boolean fields.
    pub fn boolean() -> Self {
        Self::new([
            Term::new(true, "true", "yes"),
            Term::new(false, "false", "no"),
        ])
        .unwrap_or_default()
    }

    /// Returns the value for `token`.
    pub fn get_value(&self, token: &str) -> std::result::Result<&Value, LookupError> {
        self.get_term_by_token(token).map(|term| &term.value)
    }

    /// Returns the term at `index`.
    pub fn get(&self, index: usize) -> Option<&Term> {
        self.terms.get_index(index).map(|(_, term)| term)
    }

    /// Returns whether a term carries `value`.
    pub fn contains(&self, value: &Value) -> bool {
        self.get_term(value).is_ok()
    }

    /// Returns the number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Returns whether the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Returns an iterator over the terms in insertion order.
    pub fn iter(&self) -> indexmap::map::Values<'_, String, Term> {
        self.terms.values()
    }
}

impl<'a> IntoIterator for &'a Vocabulary {
    type Item = &'a Term;
    type IntoIter = indexmap::map::Values<'a, String, Term>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
