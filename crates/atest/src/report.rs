//! Failure reporting.
//!
//! Every failed assertion produces a [`Diagnostic`]: where it happened, what
//! was wanted and what was found. Locations are [`Frame`]s captured with
//! `#[track_caller]`, so a failure points at the test's own call expression
//! rather than at this crate.
//!
//! An assertion that dispatches through an internal helper records the
//! helper's frame as well. The [`Reporter`]'s skip count decides which part
//! of that [`CallPath`] is shown: frames are ordered innermost first and the
//! report starts `skip` frames in, never past the test's call site.

use std::fmt;
use std::panic::Location;

/// A source location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame {
    file: &'static str,
    line: u32,
    column: u32,
}

impl Frame {
    /// Creates a frame from explicit coordinates.
    pub const fn new(file: &'static str, line: u32, column: u32) -> Self {
        Self { file, line, column }
    }

    /// Captures the location of the caller.
    ///
    /// Inside a `#[track_caller]` function this is the location that called
    /// that function.
    #[track_caller]
    pub fn caller() -> Self {
        Self::from_location(Location::caller())
    }

    /// Converts a std [`Location`].
    pub fn from_location(location: &'static Location<'static>) -> Self {
        Self::new(location.file(), location.line(), location.column())
    }

    /// Returns the source file path.
    pub const fn file(&self) -> &'static str {
        self.file
    }

    /// Returns the final component of the source file path.
    pub fn file_name(&self) -> &'static str {
        self.file.rsplit(['/', '\\']).next().unwrap_or(self.file)
    }

    /// Returns the line number.
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// Returns the column number.
    pub const fn column(&self) -> u32 {
        self.column
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Captures the location of the macro invocation as a [`Frame`].
#[macro_export]
macro_rules! frame {
    () => {
        $crate::Frame::new(file!(), line!(), column!())
    };
}

/// The frames that led to a failure, innermost first.
///
/// The last frame is always the test's call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallPath {
    frames: Vec<Frame>,
}

impl CallPath {
    /// Starts a path at the test's call site.
    pub fn new(site: Frame) -> Self {
        Self { frames: vec![site] }
    }

    /// Records an internal helper frame below the frames already present.
    pub fn through(mut self, helper: Frame) -> Self {
        self.frames.insert(0, helper);
        self
    }

    /// Returns all recorded frames, innermost first.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Returns the test's call site.
    pub fn site(&self) -> Frame {
        self.frames[self.frames.len() - 1]
    }

    /// Returns true if the assertion went through an internal helper.
    pub fn is_dispatched(&self) -> bool {
        self.frames.len() > 1
    }

    /// Selects the frames to report for a given skip count.
    ///
    /// One frame for a direct assertion, two consecutive frames for a
    /// dispatched one, starting `skip` frames in and clamped to the call site.
    pub fn select(&self, skip: usize) -> &[Frame] {
        let start = skip.min(self.frames.len() - 1);
        let end = (start + 2).min(self.frames.len());
        &self.frames[start..end]
    }
}

/// Whether a failure stops the test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The assertion returns `Err` and the test stops at `?`.
    Fatal,
    /// The failure is recorded and the test continues.
    NonFatal,
}

/// What kind of check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Values differed where equality was asserted.
    NotEqual,
    /// Values were equal where inequality was asserted.
    UnexpectedlyEqual,
    /// An error was expected but none was present.
    ExpectedError,
    /// An error was present where none was expected.
    UnexpectedError,
    /// A value was expected to be nil.
    NotNil,
    /// A boolean condition was false.
    ConditionFalse,
    /// Two JSON documents differed after canonicalization.
    JsonMismatch,
    /// The test failed explicitly.
    Explicit,
}

impl FailureKind {
    /// Returns a stable snake_case name for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotEqual => "not_equal",
            Self::UnexpectedlyEqual => "unexpectedly_equal",
            Self::ExpectedError => "expected_error",
            Self::UnexpectedError => "unexpected_error",
            Self::NotNil => "not_nil",
            Self::ConditionFalse => "condition_false",
            Self::JsonMismatch => "json_mismatch",
            Self::Explicit => "explicit",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single reported failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    kind: FailureKind,
    severity: Severity,
    frames: Vec<Frame>,
    want: String,
    got: String,
}

impl Diagnostic {
    /// Returns the failure kind.
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Returns the severity.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the reported frames.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Returns the expected value's text.
    pub fn want(&self) -> &str {
        &self.want
    }

    /// Returns the actual value's text.
    pub fn got(&self) -> &str {
        &self.got
    }

    /// Returns true if any reported frame is in a file ending with `file`.
    pub fn points_at(&self, file: &str, line: u32) -> bool {
        self.frames
            .iter()
            .any(|frame| frame.file().ends_with(file) && frame.line() == line)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in &self.frames {
            writeln!(f, "** {frame} **")?;
        }
        writeln!(f, "want: {}", self.want)?;
        write!(f, " got: {}", self.got)
    }
}

/// The outcome of a failed test: every diagnostic collected until it stopped.
///
/// `Debug` renders the same report as `Display`, since the test runner prints
/// a returned error with `{:?}`.
#[derive(Clone, PartialEq, Eq)]
pub struct TestFailure {
    diagnostics: Vec<Diagnostic>,
}

impl TestFailure {
    /// Wraps collected diagnostics.
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// Returns the collected diagnostics in the order they were reported.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Returns the diagnostic that stopped the test, if it was stopped.
    pub fn fatal(&self) -> Option<&Diagnostic> {
        self.diagnostics
            .last()
            .filter(|d| d.severity() == Severity::Fatal)
    }
}

impl fmt::Display for TestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} assertion(s) failed", self.diagnostics.len())?;
        for diagnostic in &self.diagnostics {
            write!(f, "\n{diagnostic}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl std::error::Error for TestFailure {}

/// Result of an assertion; `Err` means the test must stop.
pub type AssertResult<T = ()> = Result<T, TestFailure>;

/// Turns mismatches into diagnostics and logs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Reporter {
    skip: usize,
}

impl Reporter {
    /// Creates a reporter with the given skip count.
    pub const fn new(skip: usize) -> Self {
        Self { skip }
    }

    /// Returns the skip count.
    pub const fn skip(&self) -> usize {
        self.skip
    }

    /// Builds and logs a diagnostic for a failed check.
    pub fn report(
        &self,
        kind: FailureKind,
        severity: Severity,
        path: &CallPath,
        want: String,
        got: String,
    ) -> Diagnostic {
        let diagnostic = Diagnostic {
            kind,
            severity,
            frames: path.select(self.skip).to_vec(),
            want,
            got,
        };

        tracing::error!(
            kind = %kind,
            fatal = severity == Severity::Fatal,
            location = %path.site(),
            want = %diagnostic.want,
            got = %diagnostic.got,
            "assertion failed"
        );

        diagnostic
    }
}
