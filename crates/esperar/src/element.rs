//! Element snapshots and poll subjects.
//!
//! A [`Subject`] is what a locator hands back on every poll attempt: either one
//! element or an ordered collection. Snapshots are plain values; nothing here
//! talks to a browser.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Point-in-time view of a single DOM element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Lower-case tag name (e.g. `div`)
    pub tag: String,
    /// Rendered text content
    pub text: String,
    /// Whether the element is displayed
    pub displayed: bool,
    /// Attribute values by name
    pub attributes: BTreeMap<String, String>,
}

impl Element {
    /// Create a displayed element with the given tag and text
    #[must_use]
    pub fn new(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: text.into(),
            displayed: true,
            attributes: BTreeMap::new(),
        }
    }

    /// Set the displayed flag
    #[must_use]
    pub const fn displayed(mut self, displayed: bool) -> Self {
        self.displayed = displayed;
        self
    }

    /// Add an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Look up an attribute value
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Whether the `class` attribute contains `class_name` as a whole word
    #[must_use]
    pub fn has_class(&self, class_name: &str) -> bool {
        self.attribute("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class_name))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{tag} displayed:{displayed}>{text}</{tag}>",
            tag = self.tag,
            displayed = self.displayed,
            text = self.text
        )
    }
}

/// What a locator resolved to on one poll attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Subject {
    /// A single element
    Single(Element),
    /// An ordered collection of elements
    Collection(Vec<Element>),
}

impl Subject {
    /// Number of elements in the subject
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Collection(elements) => elements.len(),
        }
    }

    /// Elements in document order
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        match self {
            Self::Single(element) => std::slice::from_ref(element),
            Self::Collection(elements) => elements,
        }
    }

    /// Whether this subject is a collection
    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self, Self::Collection(_))
    }

    /// Multi-line rendering used by diagnostics:
    ///
    /// ```text
    /// [
    /// 	<div displayed:false>Niff</div>,
    /// 	<div displayed:false>Naff</div>
    /// ]
    /// ```
    #[must_use]
    pub fn render_elements(&self) -> String {
        render_element_list(self.elements())
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(element) => write!(f, "{element}"),
            Self::Collection(elements) => {
                let rendered: Vec<String> = elements.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
        }
    }
}

/// Render elements one per line, tab-indented, inside brackets
#[must_use]
pub fn render_element_list(elements: &[Element]) -> String {
    if elements.is_empty() {
        return "[]".to_string();
    }
    let lines: Vec<String> = elements.iter().map(|e| format!("\t{e}")).collect();
    format!("[\n{}\n]", lines.join(",\n"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_element_display() {
        let element = Element::new("div", "Niff").displayed(false);
        assert_eq!(element.to_string(), "<div displayed:false>Niff</div>");
    }

    #[test]
    fn test_has_class_matches_whole_words() {
        let element = Element::new("button", "Go").with_attribute("class", "btn btn-primary");
        assert!(element.has_class("btn"));
        assert!(element.has_class("btn-primary"));
        assert!(!element.has_class("primary"));
    }

    #[test]
    fn test_subject_size() {
        assert_eq!(Subject::Single(Element::new("a", "")).size(), 1);
        assert_eq!(Subject::Collection(vec![]).size(), 0);
        let three = Subject::Collection(vec![
            Element::new("li", "1"),
            Element::new("li", "2"),
            Element::new("li", "3"),
        ]);
        assert_eq!(three.size(), 3);
        assert!(three.is_collection());
    }

    #[test]
    fn test_render_elements() {
        let subject = Subject::Collection(vec![
            Element::new("div", "Niff").displayed(false),
            Element::new("div", "Naff").displayed(false),
        ]);
        assert_eq!(
            subject.render_elements(),
            "[\n\t<div displayed:false>Niff</div>,\n\t<div displayed:false>Naff</div>\n]"
        );
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_element_list(&[]), "[]");
    }

    #[test]
    fn test_single_elements_slice() {
        let subject = Subject::Single(Element::new("span", "x"));
        assert_eq!(subject.elements().len(), 1);
        assert_eq!(subject.elements()[0].tag, "span");
    }
}
