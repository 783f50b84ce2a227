//! Selector-based extraction over parsed HTML.
//!
//! Parsing is best-effort: html5ever recovers from malformed markup, so
//! the only hard failures are invalid selectors and missing matches.

use crate::error::ParseError;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

/// An owned snapshot of one matched element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Trimmed visible text.
    pub text: String,
    attributes: Vec<(String, String)>,
}

impl Element {
    fn from_ref(elem: ElementRef<'_>) -> Self {
        Self {
            text: elem.text().collect::<String>().trim().to_string(),
            attributes: elem
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Returns the value of an attribute, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn href(&self) -> Option<&str> {
        self.attribute("href")
    }
}

/// A parsed HTML document.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(text: &str) -> Self {
        Self {
            html: Html::parse_document(text),
        }
    }

    /// Returns every element matching `selector`, in document order.
    pub fn select(&self, selector: &str) -> Result<Vec<Element>, ParseError> {
        let selector = compile(selector)?;
        Ok(self.html.select(&selector).map(Element::from_ref).collect())
    }

    /// Returns the text lines of every element matching `selector`.
    ///
    /// All text inside a match is kept. A new line starts at each `<br>`
    /// and wherever text moves into or out of a block element such as
    /// `<p>`, so loose text between paragraphs survives as its own line.
    /// Blank lines are dropped.
    pub fn text_blocks(&self, selector: &str) -> Result<Vec<String>, ParseError> {
        let selector = compile(selector)?;

        let mut lines = Vec::new();
        for elem in self.html.select(&selector) {
            element_lines(elem, &mut lines);
        }
        Ok(lines)
    }

    /// Returns the first element matching `selector`.
    pub fn select_one(&self, selector: &str) -> Result<Element, ParseError> {
        let compiled = compile(selector)?;
        self.html
            .select(&compiled)
            .next()
            .map(Element::from_ref)
            .ok_or_else(|| ParseError::MissingElement(selector.to_string()))
    }
}

/// Elements whose text is set apart from the text around them.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "li", "section", "article", "blockquote", "pre", "h1", "h2", "h3", "h4", "h5",
    "h6",
];

fn element_lines(elem: ElementRef<'_>, lines: &mut Vec<String>) {
    let root = elem.id();
    let mut current = String::new();
    let mut current_block = None;

    for node in elem.descendants() {
        match node.value() {
            Node::Element(e) if e.name() == "br" => flush_line(&mut current, lines),
            Node::Text(text) => {
                // Nearest enclosing block inside the match, or the match itself.
                let block = node
                    .ancestors()
                    .find(|a| {
                        a.id() == root
                            || a
                                .value()
                                .as_element()
                                .is_some_and(|e| BLOCK_ELEMENTS.contains(&e.name()))
                    })
                    .map(|a| a.id())
                    .unwrap_or(root);

                if current_block != Some(block) {
                    flush_line(&mut current, lines);
                    current_block = Some(block);
                }
                current.push_str(text);
            }
            _ => {}
        }
    }
    flush_line(&mut current, lines);
}

fn flush_line(current: &mut String, lines: &mut Vec<String>) {
    let line = current.trim();
    if !line.is_empty() {
        lines.push(line.to_string());
    }
    current.clear();
}

fn compile(selector: &str) -> Result<Selector, ParseError> {
    Selector::parse(selector).map_err(|e| ParseError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Convenience wrapper: parse `text` and select in one step.
pub fn select(text: &str, selector: &str) -> Result<Vec<Element>, ParseError> {
    Document::parse(text).select(selector)
}

/// Convenience wrapper: parse `text` and select the first match.
pub fn select_one(text: &str, selector: &str) -> Result<Element, ParseError> {
    Document::parse(text).select_one(selector)
}
