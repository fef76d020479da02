//! A minimal structural view of an HTML tree.
//!
//! Everything above this module (link discovery, infobox location, field
//! extraction) only needs "children", "attribute" and "visible text", so it is
//! written against [DomNode]. [HtmlNode] backs it with a `tl` DOM parsed from
//! a [Source]; [Fixture] is a hand-built tree for tests.

use std::borrow::Cow;

use crate::util;
use tl::{Node, NodeHandle, Parser, VDom};

/// Structural operations on a node of an HTML tree.
///
/// Nodes are cheap handles (`Copy`); collections of children are returned by value.
pub trait DomNode: Copy {
    /// Lowercase tag name, `None` for text nodes and the document root.
    fn tag_name(&self) -> Option<String>;

    /// Value of attribute `name`. Attributes without a value yield `""`.
    fn attr(&self, name: &str) -> Option<String>;

    /// Child nodes in document order (text nodes included, comments excluded).
    fn children(&self) -> Vec<Self>;

    /// The text of a text node, `None` for elements.
    fn raw_text(&self) -> Option<String>;

    /// Serialized HTML of this node and its subtree.
    fn outer_html(&self) -> String;

    fn is_element(&self) -> bool {
        self.tag_name().is_some()
    }

    fn is_tag(&self, name: &str) -> bool {
        self.tag_name()
            .map(|tag| tag.eq_ignore_ascii_case(name))
            .unwrap_or(false)
    }

    fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    fn is_tag_with_class(&self, name: &str, class: &str) -> bool {
        self.is_tag(name) && self.has_class(class)
    }

    /// Concatenated text of all text nodes below (and including) this node.
    fn text(&self) -> String {
        if let Some(text) = self.raw_text() {
            return text;
        }
        self.children().iter().map(|child| child.text()).collect()
    }

    /// All nodes below this one, in document (pre-)order.
    fn descendants(&self) -> Vec<Self> {
        let mut out = Vec::new();
        let mut stack = self.children();
        stack.reverse();
        while let Some(node) = stack.pop() {
            out.push(node);
            let mut children = node.children();
            children.reverse();
            stack.append(&mut children);
        }
        out
    }

    fn find_all<P: Fn(&Self) -> bool>(&self, predicate: P) -> Vec<Self> {
        self.descendants()
            .into_iter()
            .filter(|node| predicate(node))
            .collect()
    }

    /// First descendant in document order matching `predicate`.
    fn find<P: Fn(&Self) -> bool>(&self, predicate: P) -> Option<Self> {
        self.descendants().into_iter().find(|node| predicate(node))
    }

    /// Direct element children matching `predicate`.
    fn child_elements<P: Fn(&Self) -> bool>(&self, predicate: P) -> Vec<Self> {
        self.children()
            .into_iter()
            .filter(|node| node.is_element() && predicate(node))
            .collect()
    }
}

/// HTML text ready for `tl`.
///
/// `tl` reads `<br/>` as an element named `br/` that is never closed, and
/// then drops every closing tag that follows, so the rest of the document
/// ends up inside it. [Source::new] spells such tags `<br />`, which `tl`
/// closes.
pub struct Source<'a>(Cow<'a, str>);

impl<'a> Source<'a> {
    pub fn new(html: &'a str) -> Self {
        Source(close_bare_tags(html))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the document with `tl`.
    pub fn parse(&self) -> Option<VDom<'_>> {
        tl::parse(&self.0, tl::ParserOptions::default()).ok()
    }
}

/// Insert a space between a tag name and a directly following `/>`.
fn close_bare_tags(html: &str) -> Cow<'_, str> {
    let bytes = html.as_bytes();
    let mut out = String::new();
    let mut copied = 0;
    let mut i = 0;
    while let Some(offset) = html[i..].find('<') {
        let start = i + offset + 1;
        let end = start
            + bytes[start..]
                .iter()
                .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':'))
                .count();
        if end > start && bytes[start].is_ascii_alphabetic() && bytes[end..].starts_with(b"/>") {
            out.push_str(&html[copied..end]);
            out.push(' ');
            copied = end;
        }
        i = end;
    }
    if copied == 0 {
        return Cow::Borrowed(html);
    }
    out.push_str(&html[copied..]);
    Cow::Owned(out)
}

/// A node of a parsed `tl` document.
#[derive(Clone, Copy)]
pub struct HtmlNode<'d> {
    parser: &'d Parser<'d>,
    position: Position<'d>,
}

#[derive(Clone, Copy)]
enum Position<'d> {
    Document(&'d [NodeHandle]),
    Node(NodeHandle),
}

impl<'d> HtmlNode<'d> {
    /// The document root. Its children are the top-level nodes of the DOM.
    pub fn root(dom: &'d VDom<'d>) -> Self {
        HtmlNode {
            parser: dom.parser(),
            position: Position::Document(dom.children()),
        }
    }

    fn node(&self) -> Option<&'d Node<'d>> {
        match self.position {
            Position::Node(handle) => handle.get(self.parser),
            Position::Document(_) => None,
        }
    }

    fn wrap(&self, handles: &[NodeHandle]) -> Vec<Self> {
        handles
            .iter()
            .filter(|handle| !util::node_is_comment(handle, self.parser))
            .map(|handle| HtmlNode {
                parser: self.parser,
                position: Position::Node(*handle),
            })
            .collect()
    }
}

impl<'d> DomNode for HtmlNode<'d> {
    fn tag_name(&self) -> Option<String> {
        self.node()?
            .as_tag()
            .map(|tag| tag.name().as_utf8_str().to_ascii_lowercase())
    }

    fn attr(&self, name: &str) -> Option<String> {
        util::get_attr_value(self.node()?.as_tag()?, name)
    }

    fn is_element(&self) -> bool {
        match self.position {
            Position::Node(handle) => util::node_is_tag(&handle, self.parser),
            Position::Document(_) => false,
        }
    }

    fn children(&self) -> Vec<Self> {
        match self.position {
            Position::Document(handles) => self.wrap(handles),
            Position::Node(handle) => match handle.get(self.parser) {
                Some(Node::Tag(tag)) => {
                    let handles: Vec<NodeHandle> =
                        tag.children().top().iter().copied().collect();
                    self.wrap(&handles)
                }
                _ => Vec::new(),
            },
        }
    }

    fn raw_text(&self) -> Option<String> {
        match self.node()? {
            Node::Raw(bytes) => Some(util::decode_entities(&bytes.as_utf8_str()).into_owned()),
            _ => None,
        }
    }

    fn outer_html(&self) -> String {
        match self.node() {
            Some(Node::Tag(tag)) => tag.outer_html(self.parser).to_string(),
            Some(Node::Raw(bytes)) | Some(Node::Comment(bytes)) => {
                bytes.as_utf8_str().into_owned()
            }
            None => self
                .children()
                .iter()
                .map(|child| child.outer_html())
                .collect(),
        }
    }
}

/// Hand-built HTML tree, mainly for tests.
///
/// ```
/// use infobox_scraper::dom::{DomNode, Fixture};
///
/// let row = Fixture::element("div")
///     .with_class("pi-data-value")
///     .with_child(Fixture::text("60"));
/// assert_eq!((&row).text(), "60");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fixture {
    Element {
        name: String,
        attributes: Vec<(String, String)>,
        children: Vec<Fixture>,
    },
    Text(String),
}

impl Fixture {
    pub fn element(name: &str) -> Self {
        Fixture::Element {
            name: name.to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn text(text: &str) -> Self {
        Fixture::Text(text.to_string())
    }

    /// Line-break marker.
    pub fn br() -> Self {
        Fixture::element("br")
    }

    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        if let Fixture::Element { attributes, .. } = &mut self {
            attributes.push((key.to_string(), value.to_string()));
        }
        self
    }

    pub fn with_class(self, class: &str) -> Self {
        self.with_attr("class", class)
    }

    pub fn with_child(mut self, child: Fixture) -> Self {
        if let Fixture::Element { children, .. } = &mut self {
            children.push(child);
        }
        self
    }

    pub fn with_children<I: IntoIterator<Item = Fixture>>(self, children: I) -> Self {
        children
            .into_iter()
            .fold(self, |parent, child| parent.with_child(child))
    }
}

impl<'a> DomNode for &'a Fixture {
    fn tag_name(&self) -> Option<String> {
        match self {
            Fixture::Element { name, .. } => Some(name.clone()),
            Fixture::Text(_) => None,
        }
    }

    fn attr(&self, key: &str) -> Option<String> {
        match self {
            Fixture::Element { attributes, .. } => attributes
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.clone()),
            Fixture::Text(_) => None,
        }
    }

    fn children(&self) -> Vec<Self> {
        match self {
            Fixture::Element { children, .. } => children.iter().collect(),
            Fixture::Text(_) => Vec::new(),
        }
    }

    fn raw_text(&self) -> Option<String> {
        match self {
            Fixture::Text(text) => Some(text.clone()),
            Fixture::Element { .. } => None,
        }
    }

    fn outer_html(&self) -> String {
        match self {
            Fixture::Text(text) => text.clone(),
            Fixture::Element {
                name,
                attributes,
                children,
            } => {
                let attributes: String = attributes
                    .iter()
                    .map(|(key, value)| format!(" {key}=\"{value}\""))
                    .collect();
                if name == "br" || name == "img" {
                    return format!("<{name}{attributes}>");
                }
                let inner: String = children.iter().map(|child| child.outer_html()).collect();
                format!("<{name}{attributes}>{inner}</{name}>")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::dom::*;

    const HTML: &'static str = r#"
    <div id="root" class="outer box">
        <h2>Title <span>here</span></h2>
        <!-- a comment -->
        <p class="first">one&amp;two</p>
        <p>three</p>
    </div>
    "#;

    #[test]
    fn html_structure() {
        let source = Source::new(HTML);
        let dom = source.parse().unwrap();
        let root = HtmlNode::root(&dom);
        let div = root.find(|node| node.is_tag("div")).unwrap();
        assert!(div.has_class("outer"));
        assert!(div.has_class("box"));
        assert!(!div.has_class("out"));
        assert_eq!(div.attr("id").unwrap(), "root");

        let paragraphs = div.child_elements(|node| node.is_tag("p"));
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].text(), "one&two");
        assert_eq!(paragraphs[1].text(), "three");

        // Comments are not part of the tree
        assert!(div
            .children()
            .iter()
            .all(|child| child.is_element() || !child.text().contains("comment")));

        let heading = div.find(|node| node.is_tag("h2")).unwrap();
        assert_eq!(heading.text(), "Title here");
    }

    #[test]
    fn html_descendants_in_document_order() {
        let source = Source::new(HTML);
        let dom = source.parse().unwrap();
        let root = HtmlNode::root(&dom);
        let tags: Vec<String> = root
            .descendants()
            .iter()
            .filter_map(|node| node.tag_name())
            .collect();
        assert_eq!(tags, vec!["div", "h2", "span", "p", "p"]);
    }

    #[test]
    fn html_outer_html() {
        let source = Source::new(r#"<p class="x">hi <b>there</b></p>"#);
        let dom = source.parse().unwrap();
        let root = HtmlNode::root(&dom);
        let bold = root.find(|node| node.is_tag("b")).unwrap();
        assert_eq!(bold.outer_html(), "<b>there</b>");
    }

    #[test]
    fn bare_self_closing_tags() {
        assert_eq!(
            Source::new("a<br/>b<br />c<br>d<img src=\"x.png\"/>").as_str(),
            "a<br />b<br />c<br>d<img src=\"x.png\"/>"
        );
        assert!(matches!(Source::new("<p>1 < 2</p>").0, Cow::Borrowed(_)));
        assert_eq!(Source::new("x<").as_str(), "x<");
    }

    #[test]
    fn br_does_not_swallow_siblings() {
        let source = Source::new(r#"<div><p>a<br/>b</p><p>c</p></div>"#);
        let dom = source.parse().unwrap();
        let div = HtmlNode::root(&dom).find(|node| node.is_tag("div")).unwrap();
        let paragraphs = div.child_elements(|node| node.is_tag("p"));
        assert_eq!(paragraphs.len(), 2);
        let names: Vec<String> = paragraphs[0]
            .children()
            .iter()
            .map(|child| child.tag_name().unwrap_or_else(|| child.text()))
            .collect();
        assert_eq!(names, vec!["a", "br", "b"]);
        assert_eq!(paragraphs[1].text(), "c");
    }

    #[test]
    fn fixture_tree() {
        let tree = Fixture::element("div")
            .with_class("pi-data-value pi-font")
            .with_children([
                Fixture::text("100 "),
                Fixture::element("a").with_attr("title", "Food").with_child(Fixture::text("Food")),
                Fixture::br(),
            ]);
        let node = &tree;
        assert!(node.is_tag_with_class("div", "pi-data-value"));
        assert_eq!(node.text(), "100 Food");
        assert_eq!(node.children().len(), 3);
        assert_eq!(node.child_elements(|child| child.is_tag("a")).len(), 1);
        assert_eq!(
            node.outer_html(),
            r#"<div class="pi-data-value pi-font">100 <a title="Food">Food</a><br></div>"#
        );
    }
}