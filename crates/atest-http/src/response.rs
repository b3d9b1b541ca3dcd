//! Captured handler responses.

use crate::recorder::ResponseRecorder;
use atest::HarnessResult;
use http::{header, HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;

/// What a handler produced for one synthetic request.
///
/// `json` is filled only when the body is non-empty and parses as a JSON
/// object. Any other body leaves it empty; the harness does not assume
/// responses are JSON.
pub struct CapturedResponse {
    /// The recorder the handler wrote into, for protocol-level inspection.
    pub recorder: ResponseRecorder,
    /// Numeric status code.
    pub code: u16,
    /// Raw body text (lossy UTF-8).
    pub body: String,
    /// Decoded JSON object body, or empty.
    pub json: Map<String, Value>,
}

impl CapturedResponse {
    /// Captures the state of a recorder after the handler returned.
    pub fn from_recorder(recorder: ResponseRecorder) -> Self {
        let body = String::from_utf8_lossy(recorder.body()).into_owned();
        let json = decode_object(&body);
        Self {
            code: recorder.status().as_u16(),
            recorder,
            body,
            json,
        }
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.recorder.status()
    }

    /// Returns true if the status is successful (2xx).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status().is_success()
    }

    /// Returns true if the status is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }

    /// Returns true if the status is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }

    /// Returns a reference to the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.recorder.headers()
    }

    /// Gets a header value as a string.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers()
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// Returns the body text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.body
    }

    /// Deserializes the body as JSON into any type.
    ///
    /// # Example
    ///
    /// ```ignore
    /// #[derive(Deserialize)]
    /// struct User {
    ///     id: String,
    /// }
    ///
    /// let response = t.perform_request(&handler, "GET", "/users/123", None, "")?;
    /// let user: User = t.require(response.json_as())?;
    /// t.assert_equal(user.id.as_str(), "123")?;
    /// ```
    pub fn json_as<T: DeserializeOwned>(&self) -> HarnessResult<T> {
        Ok(serde_json::from_slice(self.recorder.body())?)
    }

    /// Looks up a field of the decoded JSON body by dot path.
    ///
    /// Numeric segments index into arrays: `"items.0.name"`.
    #[must_use]
    pub fn json_field(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.').filter(|s| !s.is_empty());
        let mut current = self.json.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => current.get(segment)?,
            };
        }
        Some(current)
    }
}

impl fmt::Debug for CapturedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedResponse")
            .field("code", &self.code)
            .field("headers", self.headers())
            .field("body_len", &self.body.len())
            .field("json_keys", &self.json.len())
            .finish()
    }
}

fn decode_object(body: &str) -> Map<String, Value> {
    if body.is_empty() {
        return Map::new();
    }
    match serde_json::from_str::<Map<String, Value>>(body) {
        Ok(map) => map,
        Err(e) => {
            tracing::info!(error = %e, body = %body, "response body is not a JSON object");
            Map::new()
        }
    }
}
