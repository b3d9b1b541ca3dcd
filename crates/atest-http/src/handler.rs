//! The handler-under-test interface.
//!
//! The harness only knows [`Handler`]: something that takes a request and a
//! response sink. Closures become handlers through [`handler_fn`] (sink
//! style) or [`respond_with`] (return a complete response).

use crate::recorder::ResponseRecorder;
use crate::scope::RequestScope;
use bytes::Bytes;
use http::{header, StatusCode};
use http_body_util::Full;
use std::sync::Arc;

/// The synthetic request type handed to handlers.
pub type Request = http::Request<Bytes>;

/// The complete response type accepted by [`respond_with`].
pub type Response = http::Response<Full<Bytes>>;

/// A request processor under test.
///
/// # Example
///
/// ```
/// use atest_http::{Handler, Request, RequestScope, ResponseRecorder};
/// use http::StatusCode;
///
/// struct Health;
///
/// impl Handler for Health {
///     fn serve(&self, _scope: &RequestScope, _request: &Request, response: &mut ResponseRecorder) {
///         response.write_status(StatusCode::OK);
///         response.write("ok");
///     }
/// }
/// ```
pub trait Handler {
    /// Processes `request`, writing the outcome into `response`.
    fn serve(&self, scope: &RequestScope, request: &Request, response: &mut ResponseRecorder);
}

impl<H: Handler + ?Sized> Handler for &H {
    fn serve(&self, scope: &RequestScope, request: &Request, response: &mut ResponseRecorder) {
        (**self).serve(scope, request, response);
    }
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn serve(&self, scope: &RequestScope, request: &Request, response: &mut ResponseRecorder) {
        (**self).serve(scope, request, response);
    }
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn serve(&self, scope: &RequestScope, request: &Request, response: &mut ResponseRecorder) {
        (**self).serve(scope, request, response);
    }
}

/// A handler backed by a sink-style closure. See [`handler_fn`].
#[derive(Clone)]
pub struct HandlerFn<F> {
    func: F,
}

/// Wraps a closure that writes into the response sink.
pub fn handler_fn<F>(func: F) -> HandlerFn<F>
where
    F: Fn(&RequestScope, &Request, &mut ResponseRecorder),
{
    HandlerFn { func }
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&RequestScope, &Request, &mut ResponseRecorder),
{
    fn serve(&self, scope: &RequestScope, request: &Request, response: &mut ResponseRecorder) {
        (self.func)(scope, request, response);
    }
}

/// A handler backed by a closure returning a complete response. See
/// [`respond_with`].
#[derive(Clone)]
pub struct RespondWith<F> {
    func: F,
}

/// Wraps a closure that returns a complete [`Response`].
pub fn respond_with<F>(func: F) -> RespondWith<F>
where
    F: Fn(&RequestScope, &Request) -> Response,
{
    RespondWith { func }
}

impl<F> Handler for RespondWith<F>
where
    F: Fn(&RequestScope, &Request) -> Response,
{
    fn serve(&self, scope: &RequestScope, request: &Request, response: &mut ResponseRecorder) {
        response.record((self.func)(scope, request));
    }
}

/// Canned handlers for exercising the harness itself.
pub mod handlers {
    use super::*;

    /// Echoes the request body back with `200 OK`, copying the request's
    /// `Content-Type` if it has one.
    pub fn echo() -> impl Handler + Clone {
        handler_fn(|_scope, request, response| {
            if let Some(content_type) = request.headers().get(header::CONTENT_TYPE) {
                response.insert_header(header::CONTENT_TYPE, content_type.clone());
            }
            response.write_status(StatusCode::OK);
            response.write(request.body());
        })
    }

    /// Always answers with `status` and a plain-text `body`.
    pub fn fixed(status: StatusCode, body: impl Into<String>) -> impl Handler + Clone {
        let body = Bytes::from(body.into());
        handler_fn(move |_scope, _request, response| {
            response.insert_header(
                header::CONTENT_TYPE,
                header::HeaderValue::from_static("text/plain; charset=utf-8"),
            );
            response.write_status(status);
            response.write(&body);
        })
    }
}
