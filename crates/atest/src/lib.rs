//! # atest
//!
//! Assertions for tests that report failures at the test's own call site,
//! compare JSON by content, and distinguish failures that stop a test from
//! failures that are only recorded.
//!
//! ## Key Features
//!
//! - **Caller Attribution**: every assertion is `#[track_caller]`; helper
//!   frames are kept and trimmed with a per-context skip count
//! - **Explicit Control Flow**: fatal assertions return `Err(TestFailure)`,
//!   propagated with `?`; non-fatal ones are recorded and the test continues
//! - **JSON Comparison**: documents are canonicalized (sorted keys, compact,
//!   integral floats as integers) before comparing
//! - **Working Directories**: optional per-test temporary directory
//!
//! ## Example
//!
//! ```
//! use atest::{AssertResult, TestContext};
//!
//! fn parses_config() -> AssertResult {
//!     let mut t = TestContext::with_dir("config-test", 0)?;
//!
//!     let file = t.create_file("settings.json")?;
//!     t.assert(file.metadata().is_ok())?;
//!
//!     let parsed: Result<u16, _> = "8080".parse();
//!     t.assert_no_error(&parsed)?;
//!     t.assert_equal(parsed, Ok(8080))?;
//!
//!     t.assert_json_equal(r#"{"port":8080,"tls":false}"#, r#"{"tls": false, "port": 8080}"#)?;
//!     t.close()
//! }
//!
//! parses_config().unwrap();
//! ```
//!
//! In a `#[test]` function, return the [`AssertResult`] directly; the test
//! runner prints the collected report when it is an `Err`.

#![doc(html_root_url = "https://docs.rs/atest/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod canonical;
pub mod compare;
mod config;
mod context;
mod error;
pub mod logging;
mod report;

pub use compare::NilLike;
pub use config::ContextConfig;
pub use context::TestContext;
pub use error::{HarnessError, HarnessResult};
pub use logging::LogConfig;
pub use report::{
    AssertResult, CallPath, Diagnostic, FailureKind, Frame, Reporter, Severity, TestFailure,
};
