//! The per-test context and its assertions.

use crate::canonical;
use crate::compare::{self, NilLike};
use crate::config::ContextConfig;
use crate::error::HarnessError;
use crate::frame;
use crate::logging;
use crate::report::{
    AssertResult, CallPath, Diagnostic, FailureKind, Frame, Reporter, Severity, TestFailure,
};
use serde_json::Value;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Component, Path, PathBuf};
use tempfile::TempDir;

/// State for one logical test.
///
/// A context owns the skip count used for failure attribution, an optional
/// temporary directory, and the non-fatal failures recorded so far.
///
/// Fatal assertions return `Err(TestFailure)`; propagate it with `?` so the
/// test stops there. The error carries every failure recorded before it.
/// Non-fatal failures (JSON mismatches) are kept in the context and turned
/// into the test outcome by [`finish`](Self::finish) or [`close`](Self::close).
///
/// # Example
///
/// ```
/// use atest::{AssertResult, TestContext};
///
/// fn check() -> AssertResult {
///     let mut t = TestContext::new(0);
///     t.assert_equal(vec![1, 2], vec![1, 2])?;
///     t.assert_json_equal(r#"{"a":1,"b":2}"#, r#"{"b": 2, "a": 1}"#)?;
///     t.finish()
/// }
///
/// check().unwrap();
/// ```
#[derive(Debug)]
pub struct TestContext {
    reporter: Reporter,
    dir: Option<TempDir>,
    failures: Vec<Diagnostic>,
    panic_on_unfinished: bool,
}

impl TestContext {
    /// Creates a context with the given skip count and no directory.
    pub fn new(skip: usize) -> Self {
        let config = ContextConfig::default().with_skip(skip);
        if let Err(err) = logging::init_test_logging(&config.log) {
            tracing::warn!(error = %err, "test logging not installed");
        }
        Self::from_parts(&config, None)
    }

    /// Creates a context that owns a fresh temporary directory.
    ///
    /// The directory name starts with `prefix` and is unique.
    #[track_caller]
    pub fn with_dir(prefix: &str, skip: usize) -> AssertResult<Self> {
        let config = ContextConfig::default()
            .with_skip(skip)
            .with_dir_prefix(prefix);
        Self::from_config(&config)
    }

    /// Creates a context from a full configuration.
    ///
    /// An invalid configuration or a failed directory creation is a fatal
    /// failure.
    #[track_caller]
    pub fn from_config(config: &ContextConfig) -> AssertResult<Self> {
        let site = Frame::caller();
        let mut ctx = Self::from_parts(config, None);

        let validated = config
            .validate()
            .and_then(|()| logging::init_test_logging(&config.log));
        ctx.require_at(CallPath::new(site).through(frame!()), validated)?;

        if let Some(prefix) = &config.dir_prefix {
            let created = tempfile::Builder::new()
                .prefix(prefix)
                .tempdir()
                .map_err(HarnessError::TempDir);
            let dir = ctx.require_at(CallPath::new(site).through(frame!()), created)?;
            tracing::debug!(dir = %dir.path().display(), "created test directory");
            ctx.dir = Some(dir);
        }

        Ok(ctx)
    }

    fn from_parts(config: &ContextConfig, dir: Option<TempDir>) -> Self {
        Self {
            reporter: Reporter::new(config.skip),
            dir,
            failures: Vec::new(),
            panic_on_unfinished: config.panic_on_unfinished,
        }
    }

    /// Returns the skip count.
    pub fn skip(&self) -> usize {
        self.reporter.skip()
    }

    /// Returns the temporary directory, if one was provisioned.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_ref().map(TempDir::path)
    }

    /// Returns the non-fatal failures recorded so far.
    pub fn failures(&self) -> &[Diagnostic] {
        &self.failures
    }

    /// Returns true if any failure has been recorded.
    pub fn failed(&self) -> bool {
        !self.failures.is_empty()
    }

    // Assertions

    /// Fails (fatal) unless `actual` equals `expected`.
    #[track_caller]
    pub fn assert_equal<A, E>(&mut self, actual: A, expected: E) -> AssertResult
    where
        A: PartialEq<E> + fmt::Debug,
        E: fmt::Debug,
    {
        if compare::equal(&actual, &expected) {
            return Ok(());
        }
        self.fatal(
            FailureKind::NotEqual,
            CallPath::new(Frame::caller()),
            format!("{expected:?}"),
            format!("{actual:?}"),
        )
    }

    /// Fails (fatal) if `actual` equals `unexpected`.
    #[track_caller]
    pub fn assert_not_equal<A, E>(&mut self, actual: A, unexpected: E) -> AssertResult
    where
        A: PartialEq<E> + fmt::Debug,
        E: fmt::Debug,
    {
        if !compare::equal(&actual, &unexpected) {
            return Ok(());
        }
        self.fatal(
            FailureKind::UnexpectedlyEqual,
            CallPath::new(Frame::caller()),
            format!("anything but {unexpected:?}"),
            format!("{actual:?}"),
        )
    }

    /// Fails (fatal) unless `result` holds an error.
    #[track_caller]
    pub fn assert_error<T, E>(&mut self, result: &Result<T, E>) -> AssertResult {
        let path = CallPath::new(Frame::caller()).through(frame!());
        self.expect_error(path, result.is_err())
    }

    /// Fails (fatal) unless an error is present.
    #[track_caller]
    pub fn assert_error_opt<E>(&mut self, error: &Option<E>) -> AssertResult {
        let path = CallPath::new(Frame::caller()).through(frame!());
        self.expect_error(path, error.is_some())
    }

    /// Fails (fatal) if `result` holds an error.
    #[track_caller]
    pub fn assert_no_error<T, E>(&mut self, result: &Result<T, E>) -> AssertResult
    where
        E: fmt::Display,
    {
        let path = CallPath::new(Frame::caller()).through(frame!());
        self.expect_no_error(path, result.as_ref().err())
    }

    /// Fails (fatal) if an error is present.
    #[track_caller]
    pub fn assert_no_error_opt<E>(&mut self, error: &Option<E>) -> AssertResult
    where
        E: fmt::Display,
    {
        let path = CallPath::new(Frame::caller()).through(frame!());
        self.expect_no_error(path, error.as_ref())
    }

    /// Returns the `Ok` value, or fails (fatal) with the error.
    #[track_caller]
    pub fn require<T, E: fmt::Display>(&mut self, result: Result<T, E>) -> AssertResult<T> {
        let path = CallPath::new(Frame::caller()).through(frame!());
        self.require_at(path, result)
    }

    /// Fails (fatal) unless `value` is in its "no value" state.
    #[track_caller]
    pub fn assert_nil<T>(&mut self, value: &T) -> AssertResult
    where
        T: NilLike + fmt::Debug + ?Sized,
    {
        if compare::is_nil_like(value) {
            return Ok(());
        }
        self.fatal(
            FailureKind::NotNil,
            CallPath::new(Frame::caller()),
            "nil".to_string(),
            format!("{value:?}"),
        )
    }

    /// Fails (fatal) if `cond` is false.
    #[track_caller]
    pub fn assert(&mut self, cond: bool) -> AssertResult {
        if cond {
            return Ok(());
        }
        let path = CallPath::new(Frame::caller()).through(frame!());
        self.fatal(
            FailureKind::ConditionFalse,
            path,
            "true".to_string(),
            "false".to_string(),
        )
    }

    /// Compares two JSON texts by content.
    ///
    /// A text that does not parse is a fatal failure. Differing content is
    /// recorded as a non-fatal failure showing both canonical forms, and the
    /// test continues.
    #[track_caller]
    pub fn assert_json_equal(&mut self, got: &str, want: &str) -> AssertResult {
        let site = Frame::caller();
        let got = self.require_at(
            CallPath::new(site).through(frame!()),
            canonical::canonical_string(got),
        )?;
        let want = self.require_at(
            CallPath::new(site).through(frame!()),
            canonical::canonical_string(want),
        )?;

        if got != want {
            self.record(FailureKind::JsonMismatch, CallPath::new(site), want, got);
        }
        Ok(())
    }

    /// Compares two decoded JSON trees by content.
    ///
    /// Same rules and severity as [`assert_json_equal`](Self::assert_json_equal):
    /// a difference is recorded as a non-fatal failure.
    #[track_caller]
    pub fn assert_json_value_equal(&mut self, got: &Value, want: &Value) -> AssertResult {
        if !compare::json_equal(got, want) {
            self.record(
                FailureKind::JsonMismatch,
                CallPath::new(Frame::caller()),
                canonical::value_string(want.clone()),
                canonical::value_string(got.clone()),
            );
        }
        Ok(())
    }

    /// Fails (fatal) unconditionally.
    #[track_caller]
    pub fn fail(&mut self, message: impl fmt::Display) -> AssertResult {
        self.fatal(
            FailureKind::Explicit,
            CallPath::new(Frame::caller()),
            "success".to_string(),
            message.to_string(),
        )
    }

    // Files

    /// Creates (or truncates) `name` inside the context's directory and
    /// opens it for reading and writing.
    ///
    /// `name` must be relative and must not climb out with `..`; anything
    /// else is a fatal failure and nothing is created.
    #[track_caller]
    pub fn create_file(&mut self, name: impl AsRef<Path>) -> AssertResult<File> {
        let path = CallPath::new(Frame::caller()).through(frame!());
        let opened = match self.dir() {
            Some(dir) => resolve_inside(dir, name.as_ref()).and_then(|target| {
                open_truncated(&target).map_err(|e| HarnessError::io(target, e))
            }),
            None => Err(HarnessError::NoDirectory),
        };
        self.require_at(path, opened)
    }

    // Outcome

    /// Ends the test, turning recorded non-fatal failures into the outcome.
    pub fn finish(mut self) -> AssertResult {
        self.take_outcome()
    }

    /// Removes the temporary directory and ends the test.
    ///
    /// A directory that is already gone counts as removed. Any other failure
    /// to remove it is a fatal failure.
    #[track_caller]
    pub fn close(mut self) -> AssertResult {
        let path = CallPath::new(Frame::caller()).through(frame!());
        if let Some(dir) = self.dir.take() {
            let location = dir.path().to_path_buf();
            let removed = match dir.close() {
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    tracing::debug!(dir = %location.display(), "test directory already gone");
                    Ok(())
                }
                other => other.map_err(HarnessError::TempDir),
            };
            self.require_at(path, removed)?;
            tracing::debug!(dir = %location.display(), "removed test directory");
        }
        self.take_outcome()
    }

    // Internals

    fn expect_error(&mut self, path: CallPath, present: bool) -> AssertResult {
        if present {
            return Ok(());
        }
        self.fatal(
            FailureKind::ExpectedError,
            path,
            "an error".to_string(),
            "no error".to_string(),
        )
    }

    fn expect_no_error<E>(&mut self, path: CallPath, error: Option<&E>) -> AssertResult
    where
        E: fmt::Display,
    {
        match error {
            None => Ok(()),
            Some(err) => self.fatal(
                FailureKind::UnexpectedError,
                path,
                "no error".to_string(),
                err.to_string(),
            ),
        }
    }

    fn require_at<T, E>(&mut self, path: CallPath, result: Result<T, E>) -> AssertResult<T>
    where
        E: fmt::Display,
    {
        match result {
            Ok(value) => Ok(value),
            Err(err) => Err(self.stop(
                FailureKind::UnexpectedError,
                path,
                "no error".to_string(),
                err.to_string(),
            )),
        }
    }

    fn fatal(
        &mut self,
        kind: FailureKind,
        path: CallPath,
        want: String,
        got: String,
    ) -> AssertResult {
        Err(self.stop(kind, path, want, got))
    }

    fn stop(
        &mut self,
        kind: FailureKind,
        path: CallPath,
        want: String,
        got: String,
    ) -> TestFailure {
        let diagnostic = self.reporter.report(kind, Severity::Fatal, &path, want, got);
        let mut diagnostics = std::mem::take(&mut self.failures);
        diagnostics.push(diagnostic);
        TestFailure::new(diagnostics)
    }

    fn record(&mut self, kind: FailureKind, path: CallPath, want: String, got: String) {
        let diagnostic = self.reporter.report(kind, Severity::NonFatal, &path, want, got);
        self.failures.push(diagnostic);
    }

    fn take_outcome(&mut self) -> AssertResult {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(TestFailure::new(std::mem::take(&mut self.failures)))
        }
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        if self.failures.is_empty() || !self.panic_on_unfinished || std::thread::panicking() {
            return;
        }
        let failure = TestFailure::new(std::mem::take(&mut self.failures));
        panic!("test context dropped with unreported failures: {failure}");
    }
}

/// Joins `name` onto `dir`, refusing names that would land outside it.
fn resolve_inside(dir: &Path, name: &Path) -> Result<PathBuf, HarnessError> {
    let contained = name
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    let names_file = name.components().any(|c| matches!(c, Component::Normal(_)));
    if contained && names_file {
        Ok(dir.join(name))
    } else {
        Err(HarnessError::OutsideDirectory {
            name: name.to_path_buf(),
        })
    }
}

fn open_truncated(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::{Read, Seek, SeekFrom, Write};

    fn quiet(skip: usize) -> TestContext {
        TestContext::from_config(
            &ContextConfig::default()
                .with_skip(skip)
                .with_panic_on_unfinished(false),
        )
        .unwrap()
    }

    #[test]
    fn test_assert_equal_passes() {
        let mut t = quiet(0);
        let nested = vec![HashMap::from([("k", vec![Some(1), None])])];
        assert!(t.assert_equal(&nested, &nested.clone()).is_ok());
        assert!(t.finish().is_ok());
    }

    #[test]
    fn test_assert_equal_reports_call_site() {
        let mut t = quiet(0);
        let line = line!() + 1;
        let failure = t.assert_equal(1, 2).unwrap_err();
        let fatal = failure.fatal().unwrap();
        assert_eq!(fatal.kind(), FailureKind::NotEqual);
        assert_eq!(fatal.frames().len(), 1);
        assert!(fatal.points_at("context.rs", line));
        assert_eq!(fatal.want(), "2");
        assert_eq!(fatal.got(), "1");
    }

    #[test]
    fn test_assert_not_equal() {
        let mut t = quiet(0);
        assert!(t.assert_not_equal("a", "b").is_ok());
        let failure = t.assert_not_equal("a", "a").unwrap_err();
        assert_eq!(failure.fatal().unwrap().kind(), FailureKind::UnexpectedlyEqual);
    }

    #[test]
    fn test_dispatched_assertion_reports_two_frames() {
        let mut t = quiet(0);
        let err: Result<(), String> = Err("boom".to_string());
        let failure = t.assert_no_error(&err).unwrap_err();
        let fatal = failure.fatal().unwrap();
        assert_eq!(fatal.kind(), FailureKind::UnexpectedError);
        assert_eq!(fatal.frames().len(), 2);
        assert_eq!(fatal.got(), "boom");
    }

    #[test]
    fn test_skip_drops_helper_frame() {
        let mut t = quiet(1);
        let line = line!() + 1;
        let failure = t.assert(false).unwrap_err();
        let fatal = failure.fatal().unwrap();
        assert_eq!(fatal.frames().len(), 1);
        assert!(fatal.points_at("context.rs", line));
    }

    #[test]
    fn test_assert_error_variants() {
        let mut t = quiet(0);
        let ok: Result<u8, String> = Ok(1);
        let err: Result<u8, String> = Err("e".to_string());
        assert!(t.assert_error(&err).is_ok());
        assert!(t.assert_no_error(&ok).is_ok());
        assert_eq!(
            t.assert_error(&ok).unwrap_err().fatal().unwrap().kind(),
            FailureKind::ExpectedError
        );
        assert!(t.assert_error_opt(&Some("e")).is_ok());
        assert!(t.assert_error_opt::<String>(&None).is_err());
        assert!(t.assert_no_error_opt::<String>(&None).is_ok());
        assert!(t.assert_no_error_opt(&Some("e")).is_err());
    }

    #[test]
    fn test_require() {
        let mut t = quiet(0);
        let value = t.require("42".parse::<u32>()).unwrap();
        assert_eq!(value, 42);
        assert!(t.require("x".parse::<u32>()).is_err());
    }

    #[test]
    fn test_assert_nil() {
        let mut t = quiet(0);
        assert!(t.assert_nil(&None::<String>).is_ok());
        assert!(t.assert_nil(&serde_json::Value::Null).is_ok());
        let failure = t.assert_nil(&Some("x")).unwrap_err();
        assert_eq!(failure.fatal().unwrap().got(), "Some(\"x\")");
    }

    #[test]
    fn test_json_mismatch_is_non_fatal() {
        let mut t = quiet(0);
        assert!(t.assert_json_equal(r#"{"a":1}"#, r#"{"a":2}"#).is_ok());
        assert!(t.failed());
        let recorded = &t.failures()[0];
        assert_eq!(recorded.kind(), FailureKind::JsonMismatch);
        assert_eq!(recorded.severity(), Severity::NonFatal);
        assert_eq!(recorded.want(), r#"{"a":2}"#);
        assert_eq!(recorded.got(), r#"{"a":1}"#);

        let outcome = t.finish().unwrap_err();
        assert_eq!(outcome.diagnostics().len(), 1);
        assert!(outcome.fatal().is_none());
    }

    #[test]
    fn test_json_parse_failure_is_fatal() {
        let mut t = quiet(0);
        let failure = t.assert_json_equal("{", "{}").unwrap_err();
        let fatal = failure.fatal().unwrap();
        assert_eq!(fatal.kind(), FailureKind::UnexpectedError);
        assert_eq!(fatal.frames().len(), 2);
    }

    #[test]
    fn test_fatal_carries_earlier_failures() {
        let mut t = quiet(0);
        t.assert_json_equal("[1]", "[2]").unwrap();
        let failure = t.fail("stop here").unwrap_err();
        assert_eq!(failure.diagnostics().len(), 2);
        assert_eq!(failure.fatal().unwrap().got(), "stop here");
        assert!(!t.failed());
    }

    #[test]
    fn test_dir_lifecycle() {
        let mut t = TestContext::with_dir("atest-unit", 0).unwrap();
        let dir = t.dir().unwrap().to_path_buf();
        assert!(dir.is_dir());
        assert!(dir
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("atest-unit")));

        let mut file = t.create_file("data.txt").unwrap();
        file.write_all(b"hello").unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();
        let mut contents = String::new();
        file.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "hello");
        assert!(dir.join("data.txt").is_file());
        drop(file);

        t.close().unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn test_create_file_truncates() {
        let mut t = TestContext::with_dir("atest-trunc", 0).unwrap();
        t.create_file("f").unwrap().write_all(b"first").unwrap();
        let file = t.create_file("f").unwrap();
        assert_eq!(file.metadata().unwrap().len(), 0);
        t.close().unwrap();
    }

    #[test]
    fn test_create_file_without_dir_fails() {
        let mut t = quiet(0);
        let failure = t.create_file("x").unwrap_err();
        assert_eq!(
            failure.fatal().unwrap().got(),
            HarnessError::NoDirectory.to_string()
        );
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let config = ContextConfig::default().with_dir_prefix("a/b");
        let failure = TestContext::from_config(&config).unwrap_err();
        assert!(failure.fatal().unwrap().got().contains("dir_prefix"));
    }

    #[test]
    fn test_empty_prefix_gets_unique_dir() {
        let first = TestContext::with_dir("", 0).unwrap();
        let second = TestContext::with_dir("", 0).unwrap();
        assert!(first.dir().unwrap().is_dir());
        assert_ne!(first.dir(), second.dir());
        first.close().unwrap();
        second.close().unwrap();
    }

    #[test]
    fn test_create_file_stays_inside_dir() {
        let outside = tempfile::tempdir().unwrap();
        let target = outside.path().join("escaped.txt");
        let mut t = TestContext::from_config(
            &ContextConfig::default()
                .with_dir_prefix("atest-escape")
                .with_panic_on_unfinished(false),
        )
        .unwrap();

        for name in [target.as_path(), Path::new("../escaped.txt"), Path::new("a/../../b")] {
            let failure = t.create_file(name).unwrap_err();
            assert!(failure.fatal().unwrap().got().contains("must be relative"));
        }
        assert!(t.create_file(".").is_err());
        assert!(!target.exists());

        assert!(t.create_file("./inside.txt").is_ok());
        assert!(t.dir().unwrap().join("inside.txt").is_file());
        t.close().unwrap();
    }

    #[test]
    fn test_close_after_dir_removed() {
        let t = TestContext::with_dir("atest-gone", 0).unwrap();
        let dir = t.dir().unwrap().to_path_buf();
        std::fs::remove_dir_all(&dir).unwrap();
        assert!(t.close().is_ok());
        assert!(!dir.exists());
    }

    #[test]
    fn test_assert_json_value_equal() {
        use serde_json::json;

        let mut t = quiet(0);
        let got = json!({"n": 1.0, "a": [1]});
        t.assert_json_value_equal(&got, &json!({"a": [1], "n": 1})).unwrap();
        assert!(!t.failed());

        t.assert_json_value_equal(&json!({"n": 1}), &json!({"n": 2})).unwrap();
        let recorded = &t.failures()[0];
        assert_eq!(recorded.kind(), FailureKind::JsonMismatch);
        assert_eq!(recorded.want(), r#"{"n":2}"#);
        assert_eq!(recorded.got(), r#"{"n":1}"#);
    }

    #[test]
    #[should_panic(expected = "unreported failures")]
    fn test_drop_with_unreported_failures_panics() {
        let mut t = TestContext::new(0);
        t.assert_json_equal("1", "2").unwrap();
    }
}
