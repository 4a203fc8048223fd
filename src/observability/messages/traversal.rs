// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for action traversal events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A child of an action reported an error. Its siblings keep running.
///
/// # Log Level
/// `warn!` - The error is also returned in the aggregated action error
pub struct ChildFailed<'a> {
    pub action: &'a str,
    pub child: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ChildFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Child '{}' of action '{}' failed: {}",
            self.child, self.action, self.error
        )
    }
}

impl StructuredLog for ChildFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            action = self.action,
            child = self.child,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "child_failed",
            span_name = name,
            action = self.action,
            child = self.child,
        )
    }
}

/// A child can never become ready: its upstream list names a missing
/// sibling or is part of a cycle.
///
/// # Log Level
/// `warn!` - The child never runs and is reported in the traversal error
///
/// # Example
/// ```
/// use zorro_core::observability::messages::traversal::ChildNeverReady;
///
/// let upstream = vec!["3".to_string()];
/// let msg = ChildNeverReady {
///     action: "build",
///     child: "2",
///     upstream: &upstream,
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "Child '2' of action 'build' skipped: upstream [3] can never complete"
/// );
/// ```
pub struct ChildNeverReady<'a> {
    pub action: &'a str,
    pub child: &'a str,
    pub upstream: &'a [String],
}

impl Display for ChildNeverReady<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Child '{}' of action '{}' skipped: upstream [{}] can never complete",
            self.child,
            self.action,
            self.upstream.join(", ")
        )
    }
}

impl StructuredLog for ChildNeverReady<'_> {
    fn log(&self) {
        tracing::warn!(
            action = self.action,
            child = self.child,
            upstream = ?self.upstream,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "child_never_ready",
            span_name = name,
            action = self.action,
            child = self.child,
        )
    }
}

/// Every dispatched child of an action reported.
///
/// # Log Level
/// `debug!` - Detailed traversal information
pub struct TraversalCompleted<'a> {
    pub action: &'a str,
    pub children: usize,
    pub failed: usize,
}

impl Display for TraversalCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Traversal of action '{}' completed: {} children, {} failed",
            self.action, self.children, self.failed
        )
    }
}

impl StructuredLog for TraversalCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            action = self.action,
            children = self.children,
            failed = self.failed,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("traversal", span_name = name, action = self.action)
    }
}
