//! Diagnostic failures produced by terminated waits.
//!
//! The poller never surfaces its internal mismatch/transient signals. When a
//! wait ends without success, [`ErrorFactory`] turns the last observed outcome
//! into one immutable [`DiagnosticError`] that carries the expected/actual
//! contrast, the elapsed time and the last underlying cause.

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::condition::{Condition, EvalError};
use crate::element::{render_element_list, Subject};
use crate::locator::LocateError;
use crate::poller::PollOutcome;

/// Actual value reported when the locator found nothing
pub const ELEMENT_NOT_FOUND: &str = "element not found";

/// How the poller treats a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// Nothing matched; counts as a mismatch
    NotFound,
    /// Possibly recoverable; keep polling
    Transient,
    /// Not recoverable; abort the wait
    Fatal,
}

/// Underlying failure of a single poll attempt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollFailure {
    /// Locator failed to resolve the subject
    #[error(transparent)]
    Locate(#[from] LocateError),

    /// Condition failed to evaluate
    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl PollFailure {
    /// Retry class of the underlying error
    #[must_use]
    pub const fn class(&self) -> FailureClass {
        match self {
            Self::Locate(e) => e.class(),
            Self::Eval(e) => e.class(),
        }
    }

    /// Short kind name of the underlying error
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Locate(e) => e.kind(),
            Self::Eval(e) => e.kind(),
        }
    }
}

/// Which terminal failure a wait produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Element(s) found but the condition never held
    ConditionNotMet,
    /// The locator never found anything
    ElementNotFound,
    /// A size comparison never held
    ListSizeMismatch,
    /// The condition kept holding when it should have stopped
    ConditionMet,
    /// A non-recoverable error aborted the wait
    Fatal,
}

impl DiagnosticKind {
    /// Whether this failure is an assertion (as opposed to an infrastructure error)
    #[must_use]
    pub const fn is_assertion(&self) -> bool {
        !matches!(self, Self::Fatal)
    }
}

/// Terminal, human-readable result of a failed wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticError {
    /// Failure kind
    pub kind: DiagnosticKind,
    /// Locator description, e.g. the selector
    pub locator: String,
    /// Condition name
    pub condition: String,
    /// Headline, e.g. `Element should be visible`
    pub description: String,
    /// Negated condition form
    pub negative_description: String,
    /// Expected value
    pub expected: String,
    /// Actual value at termination
    pub actual: String,
    /// Subject snapshot at termination, when one was resolved
    pub subject: Option<Subject>,
    /// Free-text reason supplied with the wait
    pub explanation: Option<String>,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Last underlying failure, if any
    pub cause: Option<PollFailure>,
}

impl DiagnosticError {
    /// Whether this is an assertion-style failure
    #[must_use]
    pub const fn is_assertion(&self) -> bool {
        self.kind.is_assertion()
    }

    fn expected_clause(&self) -> String {
        match &self.explanation {
            Some(because) => format!("{} (because {because})", self.expected),
            None => self.expected.clone(),
        }
    }

    fn write_subject(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subject {
            Some(Subject::Single(element)) => writeln!(f, "Element: '{element}'"),
            Some(subject @ Subject::Collection(_)) => {
                writeln!(f, "Elements: {}", subject.render_elements())
            }
            None => Ok(()),
        }
    }

    fn write_footer(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timeout: {}", format_timeout(self.elapsed))?;
        if let Some(cause) = &self.cause {
            write!(f, "\nCaused by: {}: {cause}", cause.kind())?;
        }
        Ok(())
    }
}

impl fmt::Display for DiagnosticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DiagnosticKind::ListSizeMismatch => {
                writeln!(
                    f,
                    "List size mismatch: expected: {}, actual: {}, collection: {}",
                    self.expected_clause(),
                    self.actual,
                    self.locator
                )?;
                let elements = self
                    .subject
                    .as_ref()
                    .map_or_else(|| render_element_list(&[]), Subject::render_elements);
                writeln!(f, "Elements: {elements}")?;
            }
            DiagnosticKind::ElementNotFound => {
                writeln!(f, "Element not found {{{}}}", self.locator)?;
                writeln!(f, "Expected: {}", self.expected_clause())?;
            }
            DiagnosticKind::ConditionNotMet | DiagnosticKind::ConditionMet => {
                writeln!(f, "{} {{{}}}", self.description, self.locator)?;
                self.write_subject(f)?;
                writeln!(f, "Expected: {}", self.expected_clause())?;
                writeln!(f, "Actual: {}", self.actual)?;
            }
            DiagnosticKind::Fatal => {
                let reason = self
                    .cause
                    .as_ref()
                    .map_or_else(|| "unknown error".to_string(), ToString::to_string);
                writeln!(f, "Wait aborted {{{}}}: {reason}", self.locator)?;
                writeln!(f, "Expected: {}", self.expected_clause())?;
            }
        }
        self.write_footer(f)
    }
}

impl StdError for DiagnosticError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_ref().map(|c| c as &(dyn StdError + 'static))
    }
}

/// Render a wait duration for messages: `250 ms.` below one second, whole
/// seconds (`4 s.`) otherwise
#[must_use]
pub fn format_timeout(elapsed: Duration) -> String {
    let ms = elapsed.as_millis();
    if ms < 1000 {
        format!("{ms} ms.")
    } else {
        format!("{} s.", elapsed.as_secs())
    }
}

/// What the factory needs to know about the wait that failed
#[derive(Debug, Clone, Copy)]
pub struct FailureContext<'a> {
    /// Locator description
    pub locator: &'a str,
    /// The condition being waited for
    pub condition: &'a Condition,
    /// Free-text reason
    pub explanation: Option<&'a str>,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Whether the wait was for the condition to stop holding
    pub negated: bool,
}

/// Builds [`DiagnosticError`]s; never fails
#[derive(Debug)]
pub struct ErrorFactory;

impl ErrorFactory {
    /// Actual value of `subject`, or a placeholder if extraction fails
    #[must_use]
    pub fn actual_or_placeholder(condition: &Condition, subject: &Subject) -> String {
        condition
            .actual_value(subject)
            .unwrap_or_else(|e| format!("<unavailable: {e}>"))
    }

    fn base(ctx: &FailureContext<'_>, kind: DiagnosticKind) -> DiagnosticError {
        DiagnosticError {
            kind,
            locator: ctx.locator.to_string(),
            condition: ctx.condition.name(),
            description: String::new(),
            negative_description: ctx.condition.negative_description(),
            expected: ctx.condition.expected_value(),
            actual: String::new(),
            subject: None,
            explanation: ctx.explanation.map(str::to_string),
            elapsed: ctx.elapsed,
            cause: None,
        }
    }

    /// Terminal error from the last non-success outcome and the last cause
    #[must_use]
    pub fn from_outcome(
        ctx: &FailureContext<'_>,
        outcome: &PollOutcome,
        last_cause: Option<&PollFailure>,
    ) -> DiagnosticError {
        match outcome {
            PollOutcome::FatalError(failure) => Self::fatal(ctx, failure.clone()),
            PollOutcome::TransientError(failure) => {
                let mut error = Self::base(ctx, DiagnosticKind::ConditionNotMet);
                error.description = Self::headline(ctx, None);
                error.actual = format!("<unavailable: {failure}>");
                error.cause = Some(failure.clone());
                error
            }
            PollOutcome::Mismatch { subject, actual } => {
                let kind = match (subject, ctx.negated) {
                    (_, true) => DiagnosticKind::ConditionMet,
                    (_, false) if ctx.condition.is_size() => DiagnosticKind::ListSizeMismatch,
                    (None, false) => DiagnosticKind::ElementNotFound,
                    (Some(_), false) => DiagnosticKind::ConditionNotMet,
                };
                let mut error = Self::base(ctx, kind);
                error.description = Self::headline(ctx, subject.as_ref());
                error.actual.clone_from(actual);
                error.subject.clone_from(subject);
                error.cause = last_cause.cloned();
                error
            }
            // An inverted wait whose condition still held at the deadline.
            PollOutcome::Success(subject) => {
                let mut error = Self::condition_met(ctx, subject);
                error.cause = last_cause.cloned();
                error
            }
        }
    }

    /// Error for a wait aborted by a non-recoverable failure
    #[must_use]
    pub fn fatal(ctx: &FailureContext<'_>, failure: PollFailure) -> DiagnosticError {
        let mut error = Self::base(ctx, DiagnosticKind::Fatal);
        error.description = Self::headline(ctx, None);
        error.actual = format!("<unavailable: {failure}>");
        error.cause = Some(failure);
        error
    }

    /// Error for a condition that held when it should not have
    #[must_use]
    pub fn condition_met(ctx: &FailureContext<'_>, subject: &Subject) -> DiagnosticError {
        let mut error = Self::base(ctx, DiagnosticKind::ConditionMet);
        error.description = format!(
            "{} {}",
            ctx.condition.describe(subject),
            ctx.condition.negative_description()
        );
        error.actual = Self::actual_or_placeholder(ctx.condition, subject);
        error.subject = Some(subject.clone());
        error
    }

    fn headline(ctx: &FailureContext<'_>, subject: Option<&Subject>) -> String {
        let who = subject.map_or_else(
            || {
                if ctx.condition.is_size() {
                    "Collection".to_string()
                } else {
                    "Element".to_string()
                }
            },
            |s| ctx.condition.describe(s),
        );
        let what = if ctx.negated {
            ctx.condition.negative_description()
        } else {
            ctx.condition.description()
        };
        format!("{who} {what}")
    }
}
