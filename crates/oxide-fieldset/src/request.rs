//! The request a fieldset or form is bound to.

use std::sync::Arc;

use serde::Deserialize;

use crate::error::Result;
use crate::params::{Param, Params};
use crate::registry::FieldRegistry;

/// HTTP request methods a form can be submitted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// GET method
    #[default]
    Get,
    /// POST method
    Post,
}

impl Method {
    /// Parses a method from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            _ => None,
        }
    }

    /// Returns the method as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A submitted request.
///
/// Carries the query and body parameters, the session's CSRF token and the
/// field-type registry consulted by [`FieldFactory`](crate::registry::FieldFactory).
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Request URL.
    pub url: String,
    /// Query string parameters.
    pub get: Params,
    /// Body parameters.
    pub post: Params,
    /// CSRF token stored in the session.
    pub csrf_token: Option<String>,
    /// Field-type registry.
    pub registry: Arc<FieldRegistry>,
}

impl Default for Request {
    fn default() -> Self {
        Self::new(Method::Get, "/")
    }
}

impl Request {
    /// Creates a new request with the default field registry.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            get: Params::new(),
            post: Params::new(),
            csrf_token: None,
            registry: Arc::new(FieldRegistry::with_defaults()),
        }
    }

    /// Creates a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Creates a POST request.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    /// Parses and sets the query string.
    pub fn query(mut self, query: &str) -> Result<Self> {
        self.get = Params::parse(query)?;
        Ok(self)
    }

    /// Parses and sets an urlencoded body.
    pub fn body(mut self, body: &str) -> Result<Self> {
        self.post = Params::parse(body)?;
        Ok(self)
    }

    /// Adds a parameter to the params of the request method.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Param>) -> Self {
        match self.method {
            Method::Get => self.get.add(key, value),
            Method::Post => self.post.add(key, value),
        }
        self
    }

    /// Sets the session CSRF token.
    #[must_use]
    pub fn csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    /// Sets the field registry.
    #[must_use]
    pub fn registry(mut self, registry: FieldRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Returns the params of the request method.
    pub fn params(&self) -> &Params {
        match self.method {
            Method::Get => &self.get,
            Method::Post => &self.post,
        }
    }
}
