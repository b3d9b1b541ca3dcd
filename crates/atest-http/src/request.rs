//! Synthetic request building.

use crate::handler::Request;
use atest::{HarnessError, HarnessResult};
use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use serde::Serialize;

/// Describes a synthetic request: method, endpoint, headers and body.
///
/// Nothing is validated until [`build`](Self::build); invalid pieces are
/// remembered and reported there, so a usage mistake surfaces as one
/// harness failure instead of a panic inside a builder call.
#[must_use]
#[derive(Debug)]
pub struct RequestSpec {
    method: String,
    endpoint: String,
    headers: HeaderMap,
    body: Bytes,
    problems: Vec<HarnessError>,
}

impl RequestSpec {
    /// Creates a request for `method` and `endpoint` (path plus optional query).
    pub fn new(method: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            endpoint: endpoint.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            problems: Vec::new(),
        }
    }

    /// Creates a GET request.
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET.as_str(), endpoint)
    }

    /// Creates a POST request.
    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST.as_str(), endpoint)
    }

    /// Creates a PUT request.
    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PUT.as_str(), endpoint)
    }

    /// Creates a PATCH request.
    pub fn patch(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PATCH.as_str(), endpoint)
    }

    /// Creates a DELETE request.
    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::DELETE.as_str(), endpoint)
    }

    /// Appends a header.
    ///
    /// # Example
    ///
    /// ```
    /// use atest_http::RequestSpec;
    ///
    /// let request = RequestSpec::get("/users")
    ///     .header("X-Request-ID", "12345")
    ///     .header("Accept", "application/json")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(request.headers()["x-request-id"], "12345");
    /// ```
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        match (
            HeaderName::try_from(name),
            HeaderValue::try_from(value.as_ref()),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            (Err(e), _) => self
                .problems
                .push(HarnessError::request_build_from(format!("invalid header name {name:?}"), e)),
            (_, Err(e)) => self.problems.push(HarnessError::request_build_from(
                format!("invalid value for header {name:?}"),
                e,
            )),
        }
        self
    }

    /// Appends every header in `headers`.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        let mut last_name = None;
        for (name, value) in headers {
            if let Some(name) = name {
                last_name = Some(name);
            }
            if let Some(name) = &last_name {
                self.headers.append(name.clone(), value);
            }
        }
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.headers.remove(header::CONTENT_TYPE);
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the Authorization header with a Bearer token.
    pub fn bearer_token(mut self, token: impl AsRef<str>) -> Self {
        self.headers.remove(header::AUTHORIZATION);
        self.header(
            header::AUTHORIZATION.as_str(),
            format!("Bearer {}", token.as_ref()),
        )
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the request body as JSON.
    ///
    /// This also sets the `Content-Type` header to `application/json`.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body = Bytes::from(bytes),
            Err(e) => self
                .problems
                .push(HarnessError::request_build_from("JSON body serialization failed", e)),
        }
        self.content_type("application/json")
    }

    /// Builds the request.
    ///
    /// An empty method means GET.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::RequestBuild` for an invalid method, endpoint,
    /// header, or JSON body.
    pub fn build(self) -> HarnessResult<Request> {
        if let Some(problem) = self.problems.into_iter().next() {
            return Err(problem);
        }

        let method = if self.method.is_empty() {
            Method::GET
        } else {
            Method::from_bytes(self.method.as_bytes()).map_err(|e| {
                HarnessError::request_build_from(format!("invalid method {:?}", self.method), e)
            })?
        };

        let uri: Uri = self.endpoint.parse().map_err(|e: http::uri::InvalidUri| {
            HarnessError::request_build_from(format!("invalid endpoint {:?}", self.endpoint), e)
        })?;

        let mut request = http::Request::builder()
            .method(method)
            .uri(uri)
            .body(self.body)
            .map_err(|e| HarnessError::request_build_from("invalid request", e))?;
        *request.headers_mut() = self.headers;
        Ok(request)
    }
}
