//! Driving handlers from a test context.

use crate::handler::Handler;
use crate::recorder::ResponseRecorder;
use crate::request::RequestSpec;
use crate::response::CapturedResponse;
use crate::scope::RequestScope;
use atest::{compare, AssertResult, TestContext};
use http::HeaderMap;
use serde_json::Value;

/// Request harness operations on a [`TestContext`].
///
/// Requests are handled in-process and synchronously: no transport, no
/// timeout. A request that cannot be built is a fatal failure, since it is a
/// mistake in the test rather than handler behavior. Whatever the handler
/// answers, including error statuses and non-JSON bodies, is captured
/// without failing.
///
/// # Example
///
/// ```
/// use atest::{compare, AssertResult, TestContext};
/// use atest_http::{handlers, HttpHarness};
///
/// fn echo_roundtrip() -> AssertResult {
///     let mut t = TestContext::new(0);
///     let response = t.perform_request(&handlers::echo(), "POST", "/x", None, r#"{"k":"v"}"#)?;
///     t.assert_equal(response.code, 200)?;
///     t.assert_equal(response.json.get("k"), Some(&serde_json::json!("v")))?;
///     t.assert_equal(response.body.as_str(), r#"{"k":"v"}"#)?;
///     t.finish()
/// }
///
/// echo_roundtrip().unwrap();
/// ```
pub trait HttpHarness {
    /// Sends `method endpoint` with optional headers and a raw body.
    ///
    /// `None` headers leaves the request with an empty header map.
    fn perform_request<H>(
        &mut self,
        handler: &H,
        method: &str,
        endpoint: &str,
        headers: Option<HeaderMap>,
        body: &str,
    ) -> AssertResult<CapturedResponse>
    where
        H: Handler + ?Sized;

    /// Sends a request described by a [`RequestSpec`].
    fn perform<H>(&mut self, handler: &H, request: RequestSpec) -> AssertResult<CapturedResponse>
    where
        H: Handler + ?Sized;

    /// Fails (fatal) unless the response has the expected status code.
    fn assert_status(&mut self, response: &CapturedResponse, expected: u16) -> AssertResult;

    /// Fails (fatal) unless the header is present with the expected value.
    fn assert_header(
        &mut self,
        response: &CapturedResponse,
        name: &str,
        expected: &str,
    ) -> AssertResult;

    /// Fails (fatal) unless the decoded JSON body has `expected` at `path`.
    ///
    /// Values compare by JSON content, so `1` matches `1.0`.
    fn assert_json_field(
        &mut self,
        response: &CapturedResponse,
        path: &str,
        expected: &Value,
    ) -> AssertResult;
}

impl HttpHarness for TestContext {
    #[track_caller]
    fn perform_request<H>(
        &mut self,
        handler: &H,
        method: &str,
        endpoint: &str,
        headers: Option<HeaderMap>,
        body: &str,
    ) -> AssertResult<CapturedResponse>
    where
        H: Handler + ?Sized,
    {
        let mut request = RequestSpec::new(method, endpoint).body(body.to_owned());
        if let Some(headers) = headers {
            request = request.headers(headers);
        }
        self.perform(handler, request)
    }

    #[track_caller]
    fn perform<H>(&mut self, handler: &H, request: RequestSpec) -> AssertResult<CapturedResponse>
    where
        H: Handler + ?Sized,
    {
        let request = self.require(request.build())?;

        let scope = RequestScope::new();
        let span = tracing::debug_span!(
            "perform_request",
            request_id = %scope.request_id(),
            method = %request.method(),
            uri = %request.uri(),
        );
        let _guard = span.enter();

        let mut recorder = ResponseRecorder::new();
        handler.serve(&scope, &request, &mut recorder);
        if !recorder.status_written() {
            tracing::debug!("handler wrote nothing; assuming 200 OK");
        }

        let response = CapturedResponse::from_recorder(recorder);
        tracing::debug!(
            status = response.code,
            body_len = response.body.len(),
            elapsed_us = u64::try_from(scope.elapsed().as_micros()).unwrap_or(u64::MAX),
            "handler returned"
        );
        Ok(response)
    }

    #[track_caller]
    fn assert_status(&mut self, response: &CapturedResponse, expected: u16) -> AssertResult {
        self.assert_equal(response.code, expected)
    }

    #[track_caller]
    fn assert_header(
        &mut self,
        response: &CapturedResponse,
        name: &str,
        expected: &str,
    ) -> AssertResult {
        self.assert_equal(response.header_str(name), Some(expected))
    }

    #[track_caller]
    fn assert_json_field(
        &mut self,
        response: &CapturedResponse,
        path: &str,
        expected: &Value,
    ) -> AssertResult {
        let found = response.json_field(path);
        if found.is_some_and(|value| compare::json_equal(value, expected)) {
            return Ok(());
        }
        self.assert_equal(found, Some(expected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{handler_fn, handlers, respond_with};
    use atest::{ContextConfig, FailureKind, LogConfig};
    use bytes::Bytes;
    use http::{header, HeaderValue, StatusCode};
    use http_body_util::Full;
    use serde_json::json;

    fn context() -> TestContext {
        TestContext::from_config(
            &ContextConfig::default()
                .with_log(LogConfig::quiet())
                .with_panic_on_unfinished(false),
        )
        .unwrap()
    }

    #[test]
    fn test_echo_round_trip() {
        let mut t = context();
        let response = t
            .perform_request(&handlers::echo(), "POST", "/x", None, r#"{"k":"v"}"#)
            .unwrap();
        assert_eq!(response.code, 200);
        assert_eq!(response.body, r#"{"k":"v"}"#);
        assert_eq!(response.json.get("k"), Some(&json!("v")));
        assert!(!t.failed());
    }

    #[test]
    fn test_plain_text_error_tolerated() {
        let mut t = context();
        let handler = handlers::fixed(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
        let response = t.perform_request(&handler, "GET", "/", None, "").unwrap();
        assert_eq!(response.code, 500);
        assert_eq!(response.body, "internal error");
        assert!(response.json.is_empty());
        assert!(!t.failed());
    }

    #[test]
    fn test_headers_reach_handler() {
        let mut t = context();
        let handler = handler_fn(|_scope, request, response| {
            let auth = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("none");
            response.write(auth);
        });

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        let response = t
            .perform_request(&handler, "GET", "/me", Some(headers), "")
            .unwrap();
        assert_eq!(response.body, "Bearer abc");

        let response = t.perform_request(&handler, "GET", "/me", None, "").unwrap();
        assert_eq!(response.body, "none");
    }

    #[test]
    fn test_handler_sees_method_path_and_query() {
        let mut t = context();
        let handler = respond_with(|_scope, request| {
            let body = json!({
                "method": request.method().as_str(),
                "path": request.uri().path(),
                "query": request.uri().query(),
            });
            http::Response::builder()
                .status(StatusCode::OK)
                .body(Full::new(Bytes::from(body.to_string())))
                .unwrap()
        });

        let response = t
            .perform_request(&handler, "DELETE", "/items/7?force=true", None, "")
            .unwrap();
        assert_eq!(response.json_field("method"), Some(&json!("DELETE")));
        assert_eq!(response.json_field("path"), Some(&json!("/items/7")));
        assert_eq!(response.json_field("query"), Some(&json!("force=true")));
    }

    #[test]
    fn test_malformed_request_is_fatal() {
        let mut t = context();
        let line = line!() + 1;
        let failure = t.perform_request(&handlers::echo(), "NOT VALID", "/x", None, "").unwrap_err();
        let fatal = failure.fatal().unwrap();
        assert_eq!(fatal.kind(), FailureKind::UnexpectedError);
        assert!(fatal.got().contains("invalid method"));
        assert!(fatal.points_at("harness.rs", line));
    }

    #[test]
    fn test_perform_with_spec() {
        let mut t = context();
        let response = t
            .perform(
                &handlers::echo(),
                RequestSpec::put("/users/1").json(&json!({"name": "Bob"})),
            )
            .unwrap();
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.json_field("name"), Some(&json!("Bob")));
    }

    #[test]
    fn test_response_assertions() {
        let mut t = context();
        let response = t
            .perform(
                &handlers::echo(),
                RequestSpec::post("/x").json(&json!({"user": {"id": 3}})),
            )
            .unwrap();

        assert!(t.assert_status(&response, 200).is_ok());
        assert!(t.assert_header(&response, "content-type", "application/json").is_ok());
        assert!(t.assert_json_field(&response, "user.id", &json!(3)).is_ok());

        let failure = t.assert_status(&response, 404).unwrap_err();
        assert_eq!(failure.fatal().unwrap().want(), "404");
        assert!(t.assert_header(&response, "x-missing", "v").is_err());
        assert!(t.assert_json_field(&response, "user.id", &json!(4)).is_err());
    }

    #[test]
    fn test_json_field_compares_by_content() {
        let mut t = context();
        let response = t
            .perform_request(&handlers::echo(), "POST", "/", None, r#"{"n":1.0,"o":{"b":2.0,"a":1}}"#)
            .unwrap();

        assert!(t.assert_json_field(&response, "n", &json!(1)).is_ok());
        assert!(t.assert_json_field(&response, "o", &json!({"a": 1, "b": 2})).is_ok());

        let line = line!() + 1;
        let failure = t.assert_json_field(&response, "n", &json!(2)).unwrap_err();
        let fatal = failure.fatal().unwrap();
        assert_eq!(fatal.kind(), FailureKind::NotEqual);
        assert!(fatal.points_at("harness.rs", line));
        assert!(t.assert_json_field(&response, "missing", &json!(1)).is_err());
    }

    #[test]
    fn test_dyn_handler() {
        let mut t = context();
        let handler: Box<dyn Handler> = Box::new(handlers::echo());
        let response = t.perform_request(handler.as_ref(), "POST", "/", None, "hi").unwrap();
        assert_eq!(response.body, "hi");
    }
}
