//! Locator abstraction for resolving poll subjects.
//!
//! A locator is re-resolved on every poll attempt so that a page which has
//! re-rendered between attempts is always observed fresh. Resolution failures
//! carry a kind that the poller maps onto its retry classification:
//!
//! | Error | Class |
//! |---|---|
//! | `NotFound` | not found (mismatch, keep polling) |
//! | `Stale`, `Detached`, `Driver` | transient (keep polling) |
//! | `InvalidSelector`, `SessionTerminated` | fatal (abort) |

use std::fmt;

use thiserror::Error;

use crate::element::Subject;
use crate::error::FailureClass;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// XPath selector
    XPath(String),
    /// Text content selector
    Text(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::XPath(expression.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "{s}"),
            Self::XPath(s) => write!(f, "By.xpath: {s}"),
            Self::Text(t) => write!(f, "by text: {t}"),
            Self::TestId(id) => write!(f, "[data-testid=\"{id}\"]"),
        }
    }
}

/// Why a locator could not produce a subject
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocateError {
    /// Nothing matched the selector
    #[error("no element matches {selector}")]
    NotFound {
        /// Selector description
        selector: String,
    },

    /// The element reference went stale during resolution
    #[error("stale element reference: {message}")]
    Stale {
        /// Driver message
        message: String,
    },

    /// The element was detached from the document
    #[error("element detached from document: {message}")]
    Detached {
        /// Driver message
        message: String,
    },

    /// The selector itself is malformed
    #[error("invalid selector {selector}: {message}")]
    InvalidSelector {
        /// Selector description
        selector: String,
        /// Parser message
        message: String,
    },

    /// The browser session is gone
    #[error("browser session terminated: {message}")]
    SessionTerminated {
        /// Driver message
        message: String,
    },

    /// Any other driver failure
    #[error("driver error: {message}")]
    Driver {
        /// Driver message
        message: String,
    },
}

impl LocateError {
    /// Create a not-found error for a selector description
    #[must_use]
    pub fn not_found(selector: impl Into<String>) -> Self {
        Self::NotFound {
            selector: selector.into(),
        }
    }

    /// Create a stale-reference error
    #[must_use]
    pub fn stale(message: impl Into<String>) -> Self {
        Self::Stale {
            message: message.into(),
        }
    }

    /// Create a generic driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Retry class of this error
    #[must_use]
    pub const fn class(&self) -> FailureClass {
        match self {
            Self::NotFound { .. } => FailureClass::NotFound,
            Self::Stale { .. } | Self::Detached { .. } | Self::Driver { .. } => {
                FailureClass::Transient
            }
            Self::InvalidSelector { .. } | Self::SessionTerminated { .. } => FailureClass::Fatal,
        }
    }

    /// Short kind name used in "Caused by" lines
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NotFound",
            Self::Stale { .. } => "StaleElement",
            Self::Detached { .. } => "Detached",
            Self::InvalidSelector { .. } => "InvalidSelector",
            Self::SessionTerminated { .. } => "SessionTerminated",
            Self::Driver { .. } => "Driver",
        }
    }
}

/// Capability that resolves a live subject on demand
pub trait Locator {
    /// Human-readable description, e.g. the selector
    fn description(&self) -> String;

    /// Resolve the current subject
    fn resolve(&self) -> Result<Subject, LocateError>;
}

/// A locator backed by a closure, typically wrapping a driver query
pub struct FnLocator<F>
where
    F: Fn() -> Result<Subject, LocateError>,
{
    selector: Selector,
    resolve: F,
}

impl<F> FnLocator<F>
where
    F: Fn() -> Result<Subject, LocateError>,
{
    /// Create a locator for `selector` resolved by `resolve`
    pub const fn new(selector: Selector, resolve: F) -> Self {
        Self { selector, resolve }
    }

    /// The selector this locator describes
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }
}

impl<F> fmt::Debug for FnLocator<F>
where
    F: Fn() -> Result<Subject, LocateError>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnLocator")
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

impl<F> Locator for FnLocator<F>
where
    F: Fn() -> Result<Subject, LocateError>,
{
    fn description(&self) -> String {
        self.selector.to_string()
    }

    fn resolve(&self) -> Result<Subject, LocateError> {
        (self.resolve)()
    }
}
