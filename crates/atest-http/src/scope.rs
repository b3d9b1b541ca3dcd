//! Request-scoped context handed to handlers.

use std::time::{Duration, Instant};
use uuid::Uuid;

/// A unique identifier for each synthetic request, using UUID v7.
///
/// UUID v7 is time-ordered, so ids sort in the order requests were made,
/// which keeps log correlation across a test readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Context for one handler invocation.
///
/// Handlers that expect a cancellation-aware context get one, but the
/// harness never cancels it and sets no deadline: [`is_cancelled`] is always
/// false.
///
/// [`is_cancelled`]: RequestScope::is_cancelled
#[derive(Debug, Clone)]
pub struct RequestScope {
    request_id: RequestId,
    started_at: Instant,
}

impl RequestScope {
    /// Creates a scope with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: RequestId::new(),
            started_at: Instant::now(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns whether the request was cancelled. Always false.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        false
    }

    /// Returns the deadline for the request. Always `None`.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        None
    }

    /// Returns the elapsed time since the scope was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for RequestScope {
    fn default() -> Self {
        Self::new()
    }
}
