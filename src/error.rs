//! Error types for query validation and search execution.

use std::error::Error as StdError;
use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::query::null_as_default;

/// Boxed error produced by an injected transport.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Result type for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors raised while building or executing a search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// A qualifier or parameter rejected a candidate value.
    #[error("invalid value for {key}: {source}")]
    InvalidValue {
        key: String,
        #[source]
        source: ValidationError,
    },

    /// The request could not be sent or its response could not be read.
    #[error("{0}")]
    Transport(BoxError),

    /// The server answered with a non-2xx status.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// A response body was not the expected JSON shape.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured host produced an unparsable URL.
    #[error("invalid search URL: {0}")]
    Url(#[from] url::ParseError),
}

impl SearchError {
    /// Returns the HTTP error when this is a server-side failure.
    pub fn as_http(&self) -> Option<&HttpError> {
        match self {
            SearchError::Http(err) => Some(err),
            _ => None,
        }
    }
}

/// Why a validator rejected a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{value} is not included in [{}]", .allowed.join(", "))]
    NotAnOption { value: String, allowed: Vec<String> },

    #[error("{value:?} is not included in [{}]", .allowed.join(", "))]
    NotAnOptionInList { value: String, allowed: Vec<String> },

    #[error("{0} is not a boolean value")]
    NotBoolean(String),

    #[error("{0} is an invalid range format")]
    InvalidRange(String),

    #[error("{0} is an invalid date format")]
    InvalidDate(String),
}

impl ValidationError {
    /// The offending value, or sub-value for comma separated lists.
    pub fn value(&self) -> &str {
        match self {
            ValidationError::NotAnOption { value, .. }
            | ValidationError::NotAnOptionInList { value, .. } => value,
            ValidationError::NotBoolean(value)
            | ValidationError::InvalidRange(value)
            | ValidationError::InvalidDate(value) => value,
        }
    }

    /// The allowed values for options-style validators.
    pub fn allowed(&self) -> Option<&[String]> {
        match self {
            ValidationError::NotAnOption { allowed, .. }
            | ValidationError::NotAnOptionInList { allowed, .. } => Some(allowed),
            _ => None,
        }
    }
}

/// One entry of the `errors` array in a GitHub error body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpErrorItem {
    #[serde(deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(deserialize_with = "null_as_default")]
    pub field: String,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(deserialize_with = "null_as_default")]
    pub resource: String,
}

/// A non-2xx response from the search API.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub status: StatusCode,
    pub message: String,
    pub errors: Vec<HttpErrorItem>,
    pub request_url: Url,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HttpErrorBody {
    #[serde(deserialize_with = "null_as_default")]
    message: String,
    #[serde(deserialize_with = "null_as_default")]
    errors: Vec<HttpErrorItem>,
}

impl HttpError {
    /// Builds an error from the status, content type and body of a failed response.
    ///
    /// The body is only decoded when the content type is JSON; otherwise the
    /// canonical reason phrase stands in for the message.
    pub(crate) fn from_response(
        status: StatusCode,
        content_type: Option<&str>,
        body: &[u8],
        request_url: Url,
    ) -> std::result::Result<Self, serde_json::Error> {
        let mut err = HttpError {
            status,
            message: String::new(),
            errors: Vec::new(),
            request_url,
        };

        if !content_type.is_some_and(is_json_content_type) {
            err.message = status.canonical_reason().unwrap_or_default().to_string();
            return Ok(err);
        }

        let decoded: HttpErrorBody = serde_json::from_slice(body)?;
        err.message = decoded.message;
        err.errors = decoded.errors;
        Ok(err)
    }

    /// True for 422, the server's rejection of the query content.
    pub fn is_unprocessable(&self) -> bool {
        self.status == StatusCode::UNPROCESSABLE_ENTITY
    }

    /// The literal `q` value that was submitted.
    pub fn query(&self) -> String {
        self.request_url
            .query_pairs()
            .find(|(k, _)| k == "q")
            .map(|(_, v)| v.trim().to_string())
            .unwrap_or_default()
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_unprocessable() {
            return write!(
                f,
                "HTTP {}: {} ({})",
                self.status.as_u16(),
                self.message,
                self.request_url
            );
        }
        let detail = self
            .errors
            .first()
            .map(|e| e.message.as_str())
            .unwrap_or(self.message.as_str());
        write!(f, "Invalid search query {:?}.\n{}", self.query(), detail)
    }
}

impl StdError for HttpError {}

static JSON_CONTENT_TYPE: once_cell::sync::Lazy<regex::Regex> =
    once_cell::sync::Lazy::new(|| regex::Regex::new(r"[/+]json($|;)").unwrap());

fn is_json_content_type(content_type: &str) -> bool {
    JSON_CONTENT_TYPE.is_match(content_type)
}
