//! Conditions evaluated by the poller.
//!
//! A [`Condition`] is an immutable, named predicate over a [`Subject`]. The set
//! of variants is closed: size comparisons, per-element predicates with an
//! aggregation rule, and custom closures. Every variant answers the same four
//! questions the diagnostics need (`describe`, `negative_description`,
//! `expected_value`, `actual_value`) and all of them are pure functions of the
//! subject passed in.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::element::{Element, Subject};
use crate::error::FailureClass;

/// Error raised while evaluating a condition against a subject
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The subject went stale while being inspected
    #[error("stale element: {message}")]
    Stale {
        /// Driver message
        message: String,
    },

    /// A read-only browser query failed
    #[error("script evaluation failed: {message}")]
    Script {
        /// Driver message
        message: String,
    },

    /// The condition itself is malformed (e.g. an invalid regex)
    #[error("invalid condition argument: {message}")]
    InvalidArgument {
        /// Description of the problem
        message: String,
    },
}

impl EvalError {
    /// Create a stale-element error
    #[must_use]
    pub fn stale(message: impl Into<String>) -> Self {
        Self::Stale {
            message: message.into(),
        }
    }

    /// Create a script error
    #[must_use]
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script {
            message: message.into(),
        }
    }

    /// Retry class of this error
    #[must_use]
    pub const fn class(&self) -> FailureClass {
        match self {
            Self::Stale { .. } | Self::Script { .. } => FailureClass::Transient,
            Self::InvalidArgument { .. } => FailureClass::Fatal,
        }
    }

    /// Short kind name used in "Caused by" lines
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Stale { .. } => "StaleElement",
            Self::Script { .. } => "Script",
            Self::InvalidArgument { .. } => "InvalidArgument",
        }
    }
}

/// Comparison operator for size conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOp {
    /// `=`
    Eq,
    /// `<=`
    Le,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `>`
    Gt,
}

impl ComparisonOp {
    /// Operator symbol as shown in messages
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Le => "<=",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Gt => ">",
        }
    }

    /// Whether `actual <op> bound` holds
    #[must_use]
    pub const fn compare(&self, actual: usize, bound: usize) -> bool {
        match self {
            Self::Eq => actual == bound,
            Self::Le => actual <= bound,
            Self::Lt => actual < bound,
            Self::Ge => actual >= bound,
            Self::Gt => actual > bound,
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// How a per-element predicate combines over a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Aggregation {
    /// Every element must satisfy the predicate
    #[default]
    All,
    /// At least one element must satisfy the predicate
    Any,
}

/// Predicate over a single element
#[derive(Debug, Clone)]
pub enum ElementPredicate {
    /// Element is displayed
    Visible,
    /// Element is not displayed (a missing element counts as hidden)
    Hidden,
    /// Element is present in the DOM
    Exists,
    /// Text equals the value exactly
    ExactText(String),
    /// Text contains the value
    TextContains(String),
    /// Text matches the regular expression
    TextMatches(Regex),
    /// Attribute has the value
    Attribute {
        /// Attribute name
        name: String,
        /// Expected value
        value: String,
    },
    /// `class` attribute contains the class
    CssClass(String),
}

impl ElementPredicate {
    fn test(&self, element: &Element) -> bool {
        match self {
            Self::Visible => element.displayed,
            Self::Hidden => !element.displayed,
            Self::Exists => true,
            Self::ExactText(text) => element.text == *text,
            Self::TextContains(text) => element.text.contains(text.as_str()),
            Self::TextMatches(re) => re.is_match(&element.text),
            Self::Attribute { name, value } => element.attribute(name) == Some(value.as_str()),
            Self::CssClass(class_name) => element.has_class(class_name),
        }
    }

    fn name(&self) -> String {
        match self {
            Self::Visible => "visible".to_string(),
            Self::Hidden => "hidden".to_string(),
            Self::Exists => "exist".to_string(),
            Self::ExactText(text) => format!("exact text \"{text}\""),
            Self::TextContains(text) => format!("text \"{text}\""),
            Self::TextMatches(re) => format!("match text \"{}\"", re.as_str()),
            Self::Attribute { name, value } => format!("attribute {name}=\"{value}\""),
            Self::CssClass(class_name) => format!("css class \"{class_name}\""),
        }
    }

    fn phrase(&self) -> String {
        match self {
            Self::Visible => "be visible".to_string(),
            Self::Hidden => "be hidden".to_string(),
            Self::Exists => "exist".to_string(),
            Self::TextMatches(re) => format!("match text \"{}\"", re.as_str()),
            other => format!("have {}", other.name()),
        }
    }

    fn negative_phrase(&self) -> String {
        match self {
            Self::Visible => "not be visible".to_string(),
            Self::Hidden => "not be hidden".to_string(),
            Self::Exists => "not exist".to_string(),
            Self::TextMatches(re) => format!("not match text \"{}\"", re.as_str()),
            other => format!("not have {}", other.name()),
        }
    }

    fn actual(&self, element: &Element) -> String {
        match self {
            Self::Visible | Self::Hidden => {
                if element.displayed {
                    "visible".to_string()
                } else {
                    "hidden".to_string()
                }
            }
            Self::Exists => "exists".to_string(),
            Self::ExactText(_) | Self::TextContains(_) | Self::TextMatches(_) => {
                format!("text \"{}\"", element.text)
            }
            Self::Attribute { name, .. } => match element.attribute(name) {
                Some(value) => format!("{name}=\"{value}\""),
                None => format!("{name} absent"),
            },
            Self::CssClass(_) => match element.attribute("class") {
                Some(classes) => format!("class \"{classes}\""),
                None => "no class attribute".to_string(),
            },
        }
    }
}

/// Predicate used by [`Condition::Custom`]
pub type CustomPredicate = Arc<dyn Fn(&Subject) -> Result<bool, EvalError> + Send + Sync>;

/// Actual-value extractor used by [`Condition::Custom`]
pub type CustomActual = Arc<dyn Fn(&Subject) -> Result<String, EvalError> + Send + Sync>;

/// A named predicate over a subject
#[derive(Clone)]
pub enum Condition {
    /// Collection size compared against a bound
    Size {
        /// Comparison operator
        op: ComparisonOp,
        /// Expected bound
        bound: usize,
    },
    /// Predicate applied to every element, combined by `aggregation`
    Element {
        /// Per-element predicate
        predicate: ElementPredicate,
        /// Combination rule over collections
        aggregation: Aggregation,
    },
    /// User-supplied predicate
    Custom {
        /// Condition name, used as the "should ..." phrase
        name: String,
        /// Expected value for diagnostics
        expected: String,
        /// The predicate
        predicate: CustomPredicate,
        /// Optional actual-value extractor (defaults to the subject rendering)
        actual: Option<CustomActual>,
    },
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Size { op, bound } => f
                .debug_struct("Size")
                .field("op", op)
                .field("bound", bound)
                .finish(),
            Self::Element {
                predicate,
                aggregation,
            } => f
                .debug_struct("Element")
                .field("predicate", predicate)
                .field("aggregation", aggregation)
                .finish(),
            Self::Custom { name, expected, .. } => f
                .debug_struct("Custom")
                .field("name", name)
                .field("expected", expected)
                .finish_non_exhaustive(),
        }
    }
}

impl Condition {
    fn element(predicate: ElementPredicate) -> Self {
        Self::Element {
            predicate,
            aggregation: Aggregation::All,
        }
    }

    /// Element is displayed
    #[must_use]
    pub fn visible() -> Self {
        Self::element(ElementPredicate::Visible)
    }

    /// Element is hidden or absent
    #[must_use]
    pub fn hidden() -> Self {
        Self::element(ElementPredicate::Hidden)
    }

    /// Element is present; a collection needs at least one member
    #[must_use]
    pub fn exist() -> Self {
        Self::element(ElementPredicate::Exists).any()
    }

    /// Text equals `text`
    #[must_use]
    pub fn exact_text(text: impl Into<String>) -> Self {
        Self::element(ElementPredicate::ExactText(text.into()))
    }

    /// Text contains `text`
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::element(ElementPredicate::TextContains(text.into()))
    }

    /// Text matches `pattern`
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::InvalidArgument`] if the pattern does not compile
    pub fn match_text(pattern: &str) -> Result<Self, EvalError> {
        let re = Regex::new(pattern).map_err(|e| EvalError::InvalidArgument {
            message: e.to_string(),
        })?;
        Ok(Self::element(ElementPredicate::TextMatches(re)))
    }

    /// Attribute `name` equals `value`
    #[must_use]
    pub fn attribute(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::element(ElementPredicate::Attribute {
            name: name.into(),
            value: value.into(),
        })
    }

    /// `class` attribute contains `class_name`
    #[must_use]
    pub fn css_class(class_name: impl Into<String>) -> Self {
        Self::element(ElementPredicate::CssClass(class_name.into()))
    }

    /// Collection has exactly `n` elements
    #[must_use]
    pub const fn size(n: usize) -> Self {
        Self::Size {
            op: ComparisonOp::Eq,
            bound: n,
        }
    }

    /// Collection has more than `n` elements
    #[must_use]
    pub const fn size_greater_than(n: usize) -> Self {
        Self::Size {
            op: ComparisonOp::Gt,
            bound: n,
        }
    }

    /// Collection has at least `n` elements
    #[must_use]
    pub const fn size_greater_than_or_equal(n: usize) -> Self {
        Self::Size {
            op: ComparisonOp::Ge,
            bound: n,
        }
    }

    /// Collection has fewer than `n` elements
    #[must_use]
    pub const fn size_less_than(n: usize) -> Self {
        Self::Size {
            op: ComparisonOp::Lt,
            bound: n,
        }
    }

    /// Collection has at most `n` elements
    #[must_use]
    pub const fn size_less_than_or_equal(n: usize) -> Self {
        Self::Size {
            op: ComparisonOp::Le,
            bound: n,
        }
    }

    /// Custom condition; `name` becomes the "should ..." phrase
    pub fn custom<F>(name: impl Into<String>, expected: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Subject) -> Result<bool, EvalError> + Send + Sync + 'static,
    {
        Self::Custom {
            name: name.into(),
            expected: expected.into(),
            predicate: Arc::new(predicate),
            actual: None,
        }
    }

    /// Attach an actual-value extractor to a custom condition
    ///
    /// Has no effect on built-in variants.
    #[must_use]
    pub fn with_actual<F>(self, extractor: F) -> Self
    where
        F: Fn(&Subject) -> Result<String, EvalError> + Send + Sync + 'static,
    {
        match self {
            Self::Custom {
                name,
                expected,
                predicate,
                ..
            } => Self::Custom {
                name,
                expected,
                predicate,
                actual: Some(Arc::new(extractor)),
            },
            other => other,
        }
    }

    /// Require only one element of a collection to satisfy the predicate
    ///
    /// Has no effect on size and custom conditions.
    #[must_use]
    pub fn any(self) -> Self {
        match self {
            Self::Element { predicate, .. } => Self::Element {
                predicate,
                aggregation: Aggregation::Any,
            },
            other => other,
        }
    }

    /// Short condition name, e.g. `visible` or `size <= 10`
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Size { op, bound } => format!("size {op} {bound}"),
            Self::Element { predicate, .. } => predicate.name(),
            Self::Custom { name, .. } => name.clone(),
        }
    }

    /// Positive form, e.g. `should be visible`
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Size { op, bound } => format!("should have size {op} {bound}"),
            Self::Element { predicate, .. } => format!("should {}", predicate.phrase()),
            Self::Custom { name, .. } => format!("should {name}"),
        }
    }

    /// Negated form, e.g. `should not be visible`
    #[must_use]
    pub fn negative_description(&self) -> String {
        match self {
            Self::Size { op, bound } => format!("should not have size {op} {bound}"),
            Self::Element { predicate, .. } => format!("should {}", predicate.negative_phrase()),
            Self::Custom { name, .. } => format!("should not {name}"),
        }
    }

    /// Subject phrase for messages: `Element`, `Collection`, `Each element`
    /// or `At least one element`
    #[must_use]
    pub fn describe(&self, subject: &Subject) -> String {
        match (self, subject) {
            (Self::Size { .. }, _) => "Collection".to_string(),
            (_, Subject::Single(_)) => "Element".to_string(),
            (
                Self::Element {
                    aggregation: Aggregation::Any,
                    ..
                },
                Subject::Collection(_),
            ) => "At least one element".to_string(),
            (Self::Element { .. }, Subject::Collection(_)) => "Each element".to_string(),
            (Self::Custom { .. }, Subject::Collection(_)) => "Collection".to_string(),
        }
    }

    /// Expected value, e.g. `visible` or `<= 10`
    #[must_use]
    pub fn expected_value(&self) -> String {
        match self {
            Self::Size { op, bound } => format!("{op} {bound}"),
            Self::Element { predicate, .. } => predicate.name(),
            Self::Custom { expected, .. } => expected.clone(),
        }
    }

    /// Actual value observed on `subject`
    ///
    /// # Errors
    ///
    /// Custom extractors may fail; built-in variants never do
    pub fn actual_value(&self, subject: &Subject) -> Result<String, EvalError> {
        match self {
            Self::Size { .. } => Ok(subject.size().to_string()),
            Self::Element { predicate, .. } => match subject {
                Subject::Single(element) => Ok(predicate.actual(element)),
                Subject::Collection(elements) => {
                    let values: Vec<String> = elements.iter().map(|e| predicate.actual(e)).collect();
                    Ok(format!("[{}]", values.join(", ")))
                }
            },
            Self::Custom { actual, .. } => match actual {
                Some(extractor) => extractor(subject),
                None => Ok(subject.to_string()),
            },
        }
    }

    /// Evaluate the condition
    ///
    /// # Errors
    ///
    /// Propagates evaluation errors from custom predicates
    pub fn apply(&self, subject: &Subject) -> Result<bool, EvalError> {
        match self {
            Self::Size { op, bound } => Ok(op.compare(subject.size(), *bound)),
            Self::Element {
                predicate,
                aggregation,
            } => {
                let elements = subject.elements();
                Ok(match aggregation {
                    Aggregation::All => elements.iter().all(|e| predicate.test(e)),
                    Aggregation::Any => elements.iter().any(|e| predicate.test(e)),
                })
            }
            Self::Custom { predicate, .. } => predicate(subject),
        }
    }

    /// Whether the condition holds when the locator finds nothing
    #[must_use]
    pub fn holds_when_missing(&self) -> bool {
        match self {
            Self::Size { op, bound } => op.compare(0, *bound),
            Self::Element { predicate, .. } => matches!(predicate, ElementPredicate::Hidden),
            Self::Custom { .. } => false,
        }
    }

    /// Whether this is a size comparison
    #[must_use]
    pub const fn is_size(&self) -> bool {
        matches!(self, Self::Size { .. })
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
