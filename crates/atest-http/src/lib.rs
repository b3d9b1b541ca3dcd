//! # atest-http
//!
//! In-process request harness for HTTP handlers. A handler is invoked
//! directly with a synthetic request, without sockets or a server, and its
//! response is captured for assertions made through [`atest`].
//!
//! ## Key Features
//!
//! - **In-Memory Testing**: no network connections or port binding
//! - **Handler Interface**: sink-style closures, response-returning closures,
//!   or any type implementing [`Handler`]
//! - **Tolerant Capture**: JSON object bodies are decoded, anything else is
//!   kept as text without failing the test
//! - **Caller Attribution**: harness failures point at the test line
//!
//! ## Example
//!
//! ```
//! use atest::{AssertResult, TestContext};
//! use atest_http::{handler_fn, HttpHarness, RequestSpec};
//! use http::StatusCode;
//!
//! fn create_user() -> AssertResult {
//!     let mut t = TestContext::new(0);
//!
//!     let handler = handler_fn(|_scope, request, response| {
//!         if request.body().is_empty() {
//!             response.write_status(StatusCode::BAD_REQUEST);
//!             response.write("missing body");
//!             return;
//!         }
//!         response.write_status(StatusCode::CREATED);
//!         response.write(request.body());
//!     });
//!
//!     let response = t.perform(&handler, RequestSpec::post("/users").json(&serde_json::json!({
//!         "name": "Alice"
//!     })))?;
//!     t.assert_status(&response, 201)?;
//!     t.assert_json_equal(&response.body, r#"{ "name": "Alice" }"#)?;
//!
//!     let response = t.perform_request(&handler, "POST", "/users", None, "")?;
//!     t.assert_status(&response, 400)?;
//!     t.assert(response.json.is_empty())?;
//!
//!     t.finish()
//! }
//!
//! create_user().unwrap();
//! ```

#![doc(html_root_url = "https://docs.rs/atest-http/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod handler;
mod harness;
mod recorder;
mod request;
mod response;
mod scope;

pub use handler::{
    handler_fn, handlers, respond_with, Handler, HandlerFn, Request, RespondWith, Response,
};
pub use harness::HttpHarness;
pub use recorder::ResponseRecorder;
pub use request::RequestSpec;
pub use response::CapturedResponse;
pub use scope::{RequestId, RequestScope};
