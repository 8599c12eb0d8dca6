//! Submitted request parameters.

use crate::error::{FormError, Result};
use crate::value::{Upload, Value};

/// A single submitted parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    /// Plain text value.
    Text(String),
    /// Uploaded file.
    File(Upload),
}

impl Param {
    /// Returns the text if this is a text parameter.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::File(_) => None,
        }
    }

    /// Converts the parameter into its raw wire [`Value`].
    pub fn to_value(&self) -> Value {
        match self {
            Self::Text(s) => Value::Text(s.clone()),
            Self::File(upload) => Value::File(upload.clone()),
        }
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Upload> for Param {
    fn from(value: Upload) -> Self {
        Self::File(value)
    }
}

/// An ordered multi-value parameter map.
///
/// Keys may repeat; [`Params::get`] returns the last value submitted for a
/// key and [`Params::get_all`] returns every value in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    items: Vec<(String, Param)>,
}

impl Params {
    /// Creates an empty parameter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `application/x-www-form-urlencoded` input.
    pub fn parse(input: &str) -> Result<Self> {
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_str(input).map_err(|e| FormError::ParseError(e.to_string()))?;
        Ok(pairs.into_iter().collect())
    }

    /// Appends a value for a key.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<Param>) {
        self.items.push((key.into(), value.into()));
    }

    /// Builder method to append a value for a key.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Param>) -> Self {
        self.add(key, value);
        self
    }

    /// Returns the last value submitted for a key.
    pub fn get(&self, key: &str) -> Option<&Param> {
        self.items
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Returns the last text value submitted for a key.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Param::as_str)
    }

    /// Returns every value submitted for a key.
    pub fn get_all(&self, key: &str) -> Vec<&Param> {
        self.items
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v)
            .collect()
    }

    /// Returns whether any value was submitted for a key.
    pub fn contains(&self, key: &str) -> bool {
        self.items.iter().any(|(k, _)| k == key)
    }

    /// Returns the number of submitted values.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns whether nothing was submitted.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns an iterator over all key/value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<Param>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            items: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
