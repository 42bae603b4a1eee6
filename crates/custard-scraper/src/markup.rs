//! Tree-query layer over parsed HTML.
//!
//! Extractors are written against [`ParsedMarkup`] and [`Node`] rather than
//! against the parser's own types. A parsed tree is not `Send`, so it is
//! built synchronously at the point of use and dropped before the next
//! `.await`.

use scraper::{ElementRef, Html, Selector};

/// Elements whose boundaries separate words in rendered text.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p",
    "section", "table", "tbody", "td", "th", "thead", "tr", "ul",
];

pub struct ParsedMarkup {
    doc: Html,
}

impl ParsedMarkup {
    #[must_use]
    pub fn parse(html: &str) -> Self {
        Self {
            doc: Html::parse_document(html),
        }
    }

    /// Parse a snippet such as an overlay's inner HTML.
    #[must_use]
    pub fn parse_fragment(html: &str) -> Self {
        Self {
            doc: Html::parse_fragment(html),
        }
    }

    /// All elements matching `css`, in document order. An unparseable
    /// selector matches nothing.
    #[must_use]
    pub fn select(&self, css: &str) -> Vec<Node<'_>> {
        let Some(selector) = compile(css) else {
            return Vec::new();
        };
        self.doc.select(&selector).map(Node::new).collect()
    }

    #[must_use]
    pub fn select_first(&self, css: &str) -> Option<Node<'_>> {
        let selector = compile(css)?;
        self.doc.select(&selector).next().map(Node::new)
    }

    /// Elements with the given tag name that satisfy `predicate`.
    pub fn find_all<P>(&self, tag: &str, predicate: P) -> Vec<Node<'_>>
    where
        P: Fn(&Node<'_>) -> bool,
    {
        self.select(tag)
            .into_iter()
            .filter(|node| predicate(node))
            .collect()
    }

    /// Every element that follows `node` in document order, including its
    /// own descendants.
    #[must_use]
    pub fn elements_after<'a>(&'a self, node: &Node<'a>) -> Vec<Node<'a>> {
        let target = node.el.id();
        self.doc
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .skip_while(|el| el.id() != target)
            .skip(1)
            .map(Node::new)
            .collect()
    }

    /// Inline `<script>` bodies (no `src`), in document order.
    #[must_use]
    pub fn inline_scripts(&self) -> Vec<String> {
        self.select("script")
            .into_iter()
            .filter(|s| s.attr("src").is_none())
            .map(|s| s.raw_text())
            .collect()
    }
}

/// A single element inside a [`ParsedMarkup`] tree.
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    el: ElementRef<'a>,
}

impl<'a> Node<'a> {
    fn new(el: ElementRef<'a>) -> Self {
        Self { el }
    }

    #[must_use]
    pub fn tag(&self) -> &'a str {
        self.el.value().name()
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.el.value().attr(name)
    }

    /// `true` when any class token contains `needle`, ignoring ASCII case.
    #[must_use]
    pub fn has_class_containing(&self, needle: &str) -> bool {
        let needle = needle.to_ascii_lowercase();
        self.el
            .value()
            .classes()
            .any(|c| c.to_ascii_lowercase().contains(&needle))
    }

    /// Rendered text with whitespace collapsed to single spaces.
    #[must_use]
    pub fn text(&self) -> String {
        let mut raw = String::new();
        for node in self.el.descendants() {
            if let Some(text) = node.value().as_text() {
                raw.push_str(text);
            } else if let Some(element) = node.value().as_element() {
                if BLOCK_TAGS.contains(&element.name()) {
                    raw.push(' ');
                }
            }
        }
        collapse_whitespace(&raw)
    }

    /// Concatenated text nodes exactly as they appear in the source.
    #[must_use]
    pub fn raw_text(&self) -> String {
        self.el.text().collect()
    }

    #[must_use]
    pub fn select(&self, css: &str) -> Vec<Node<'a>> {
        let Some(selector) = compile(css) else {
            return Vec::new();
        };
        self.el.select(&selector).map(Node::new).collect()
    }

    #[must_use]
    pub fn select_first(&self, css: &str) -> Option<Node<'a>> {
        let selector = compile(css)?;
        self.el.select(&selector).next().map(Node::new)
    }

    #[must_use]
    pub fn next_element_sibling(&self) -> Option<Node<'a>> {
        self.el
            .next_siblings()
            .find_map(ElementRef::wrap)
            .map(Node::new)
    }

    #[must_use]
    pub fn parent_element(&self) -> Option<Node<'a>> {
        self.el.parent().and_then(ElementRef::wrap).map(Node::new)
    }
}

fn compile(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::debug!(css, error = %e, "ignoring unparseable selector");
            None
        }
    }
}

#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_separates_block_boundaries_but_not_inline_ones() {
        let doc = ParsedMarkup::parse(
            "<table><tr><td>Tue<br>15</td><td><strong>LEMON</strong> <b>BERRY</b></td></tr></table>",
        );
        let cells = doc.select("td");
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].text(), "Tue 15");
        assert_eq!(cells[1].text(), "LEMON BERRY");
    }

    #[test]
    fn class_match_is_substring_and_case_insensitive() {
        let doc = ParsedMarkup::parse(
            r#"<div class="FlavorOfTheDayDetails_containerPrimaryContentDescription__x1">d</div>"#,
        );
        let div = doc.select_first("div").unwrap();
        assert!(div.has_class_containing("FlavorOfTheDayDetails_containerPrimaryContentDescription"));
        assert!(div.has_class_containing("description"));
        assert!(!div.has_class_containing("heading"));
    }

    #[test]
    fn elements_after_follows_document_order() {
        let doc = ParsedMarkup::parse_fragment(
            "<div><p>before</p><h4>Title</h4><span>one</span><div><p>two</p></div></div>",
        );
        let heading = doc.select_first("h4").unwrap();
        let after: Vec<String> = doc
            .elements_after(&heading)
            .iter()
            .map(|n| format!("{}:{}", n.tag(), n.text()))
            .collect();
        assert_eq!(after, vec!["span:one", "div:two", "p:two"]);
    }

    #[test]
    fn next_element_sibling_skips_text_nodes() {
        let doc = ParsedMarkup::parse("<div><h3>Mint</h3>\n  <p>Cool and green.</p></div>");
        let heading = doc.select_first("h3").unwrap();
        let sibling = heading.next_element_sibling().unwrap();
        assert_eq!(sibling.tag(), "p");
        assert_eq!(sibling.text(), "Cool and green.");
    }

    #[test]
    fn invalid_selector_matches_nothing() {
        let doc = ParsedMarkup::parse("<p>x</p>");
        assert!(doc.select("p[").is_empty());
        assert!(doc.select_first("p[").is_none());
    }

    #[test]
    fn inline_scripts_skip_external_sources() {
        let doc = ParsedMarkup::parse(
            r#"<script src="/app.js"></script><script>window.A = 1;</script>"#,
        );
        assert_eq!(doc.inline_scripts(), vec!["window.A = 1;".to_string()]);
    }
}
