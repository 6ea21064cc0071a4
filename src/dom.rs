//! HTML parser and arena document – the "live document" the engine reads and
//! the annotator writes back to.
//!
//! Nodes live in a flat `Vec` and are addressed by [`NodeId`]; every node keeps
//! its parent and ordered children explicitly. Detached nodes simply stay in
//! the arena unreferenced, which keeps ids stable for the whole pass.
//!
//! Parsing handles the controlled subset we care about:
//! - elements, attributes (quoted and bare), void elements
//! - text with the common named entities
//! - comments (kept, they matter for "comment-only" blocks)
//! - raw text inside `<script>` / `<style>`

use std::fmt;

// ---------------------------------------------------------------------------
// DOM types
// ---------------------------------------------------------------------------

/// Index of a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The tag name of an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Html,
    Head,
    Body,
    Div,
    P,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Ul,
    Ol,
    Li,
    Table,
    Tr,
    Td,
    Th,
    Pre,
    Blockquote,
    Section,
    Article,
    Header,
    Footer,
    Figure,
    Hr,
    Span,
    A,
    B,
    Strong,
    I,
    Em,
    U,
    Tt,
    Code,
    Small,
    Sub,
    Sup,
    Img,
    Br,
    Script,
    Style,
    Template,
    Title,
    Meta,
    Link,
    /// Anything else, including the engine's own `paged-*` elements.
    Custom(String),
}

impl Tag {
    pub fn from_str(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "html" => Tag::Html,
            "head" => Tag::Head,
            "body" => Tag::Body,
            "div" => Tag::Div,
            "p" => Tag::P,
            "h1" => Tag::H1,
            "h2" => Tag::H2,
            "h3" => Tag::H3,
            "h4" => Tag::H4,
            "h5" => Tag::H5,
            "h6" => Tag::H6,
            "ul" => Tag::Ul,
            "ol" => Tag::Ol,
            "li" => Tag::Li,
            "table" => Tag::Table,
            "tr" => Tag::Tr,
            "td" => Tag::Td,
            "th" => Tag::Th,
            "pre" => Tag::Pre,
            "blockquote" => Tag::Blockquote,
            "section" => Tag::Section,
            "article" => Tag::Article,
            "header" => Tag::Header,
            "footer" => Tag::Footer,
            "figure" => Tag::Figure,
            "hr" => Tag::Hr,
            "span" => Tag::Span,
            "a" => Tag::A,
            "b" => Tag::B,
            "strong" => Tag::Strong,
            "i" => Tag::I,
            "em" => Tag::Em,
            "u" => Tag::U,
            "tt" => Tag::Tt,
            "code" => Tag::Code,
            "small" => Tag::Small,
            "sub" => Tag::Sub,
            "sup" => Tag::Sup,
            "img" => Tag::Img,
            "br" => Tag::Br,
            "script" => Tag::Script,
            "style" => Tag::Style,
            "template" => Tag::Template,
            "title" => Tag::Title,
            "meta" => Tag::Meta,
            "link" => Tag::Link,
            other => Tag::Custom(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Tag::Html => "html",
            Tag::Head => "head",
            Tag::Body => "body",
            Tag::Div => "div",
            Tag::P => "p",
            Tag::H1 => "h1",
            Tag::H2 => "h2",
            Tag::H3 => "h3",
            Tag::H4 => "h4",
            Tag::H5 => "h5",
            Tag::H6 => "h6",
            Tag::Ul => "ul",
            Tag::Ol => "ol",
            Tag::Li => "li",
            Tag::Table => "table",
            Tag::Tr => "tr",
            Tag::Td => "td",
            Tag::Th => "th",
            Tag::Pre => "pre",
            Tag::Blockquote => "blockquote",
            Tag::Section => "section",
            Tag::Article => "article",
            Tag::Header => "header",
            Tag::Footer => "footer",
            Tag::Figure => "figure",
            Tag::Hr => "hr",
            Tag::Span => "span",
            Tag::A => "a",
            Tag::B => "b",
            Tag::Strong => "strong",
            Tag::I => "i",
            Tag::Em => "em",
            Tag::U => "u",
            Tag::Tt => "tt",
            Tag::Code => "code",
            Tag::Small => "small",
            Tag::Sub => "sub",
            Tag::Sup => "sup",
            Tag::Img => "img",
            Tag::Br => "br",
            Tag::Script => "script",
            Tag::Style => "style",
            Tag::Template => "template",
            Tag::Title => "title",
            Tag::Meta => "meta",
            Tag::Link => "link",
            Tag::Custom(name) => name,
        }
    }

    /// Elements rendered inline by default.
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            Tag::Span
                | Tag::A
                | Tag::B
                | Tag::Strong
                | Tag::I
                | Tag::Em
                | Tag::U
                | Tag::Tt
                | Tag::Code
                | Tag::Small
                | Tag::Sub
                | Tag::Sup
                | Tag::Img
                | Tag::Br
        )
    }

    /// Elements without children or a closing tag.
    pub fn is_void(&self) -> bool {
        matches!(self, Tag::Img | Tag::Br | Tag::Hr | Tag::Meta | Tag::Link)
    }

    /// Elements that never produce boxes.
    pub fn is_non_rendered(&self) -> bool {
        matches!(
            self,
            Tag::Head
                | Tag::Script
                | Tag::Style
                | Tag::Template
                | Tag::Title
                | Tag::Meta
                | Tag::Link
        )
    }

    fn is_raw_text(&self) -> bool {
        matches!(self, Tag::Script | Tag::Style)
    }
}

/// An element: tag plus attributes in source order.
#[derive(Debug, Clone)]
pub struct ElementData {
    pub tag: Tag,
    pub attributes: Vec<(String, String)>,
}

impl ElementData {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn classes(&self) -> Vec<&str> {
        self.attr("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn inline_style(&self) -> Option<&str> {
        self.attr("style")
    }

    pub fn src(&self) -> Option<&str> {
        self.attr("src")
    }
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub data: NodeData,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Arena-backed document tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    doctype: Option<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
            doctype: None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    // -----------------------------------------------------------------------
    // Node creation
    // -----------------------------------------------------------------------

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeData::Element(ElementData::new(Tag::from_str(name))))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Comment(text.to_string()))
    }

    /// Copy an element's tag and attributes into a new, childless node.
    pub fn shallow_clone(&mut self, id: NodeId) -> NodeId {
        let data = match &self.nodes[id.0].data {
            NodeData::Element(e) => NodeData::Element(e.clone()),
            other => other.clone(),
        };
        self.push(data)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id.0].data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[id.0].data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&Tag> {
        self.element(id).map(|e| &e.tag)
    }

    /// True when `id` is an element with the given tag name.
    pub fn is(&self, id: NodeId, name: &str) -> bool {
        self.tag(id).map(|t| t.name() == name).unwrap_or(false)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_comment(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].data, NodeData::Comment(_))
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(name))
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let idx = self.index_in_parent(id)?;
        self.children(parent).get(idx + 1).copied()
    }

    /// All descendants of `id` in document (pre-)order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev());
        }
        out
    }

    /// Every element in the document with the given tag name, in order.
    pub fn elements_by_name(&self, name: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&n| self.is(n, name))
            .collect()
    }

    /// Every element carrying `attr` (with `value`, if given), in order.
    pub fn elements_with_attr(&self, attr: &str, value: Option<&str>) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&n| match (self.attr(n, attr), value) {
                (Some(v), Some(want)) => v == want,
                (Some(_), None) => true,
                (None, _) => false,
            })
            .collect()
    }

    pub fn first_element_by_name(&self, name: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&n| self.is(n, name))
    }

    /// The `<body>` element, or the document node when there is none.
    pub fn body(&self) -> NodeId {
        self.first_element_by_name("body").unwrap_or(self.root)
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(t) = self.text(id) {
            out.push_str(t);
        }
        for d in self.descendants(id) {
            if let Some(t) = self.text(d) {
                out.push_str(t);
            }
        }
        out
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(e) = self.element_mut(id) {
            if let Some(slot) = e.attributes.iter_mut().find(|(k, _)| k == name) {
                slot.1 = value.to_string();
            } else {
                e.attributes.push((name.to_string(), value.to_string()));
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(e) = self.element_mut(id) {
            e.attributes.retain(|(k, _)| k != name);
        }
    }

    /// Remove `id` from its parent. The node keeps its own subtree.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `new` right before `reference` under the same parent.
    pub fn insert_before(&mut self, reference: NodeId, new: NodeId) {
        self.detach(new);
        if let Some(parent) = self.parent(reference) {
            let idx = self.index_in_parent(reference).unwrap_or(0);
            self.nodes[new.0].parent = Some(parent);
            self.nodes[parent.0].children.insert(idx, new);
        }
    }

    /// Move the contiguous `nodes` (siblings, in order) into `wrapper`, which
    /// takes the place of the first of them.
    pub fn wrap_all(&mut self, nodes: &[NodeId], wrapper: NodeId) {
        let Some(&first) = nodes.first() else {
            return;
        };
        self.insert_before(first, wrapper);
        for &n in nodes {
            self.append_child(wrapper, n);
        }
    }

    /// Replace `id` by its children.
    pub fn unwrap(&mut self, id: NodeId) {
        let children = self.nodes[id.0].children.clone();
        for c in children {
            self.insert_before(id, c);
        }
        self.detach(id);
    }

    /// Merge runs of adjacent text nodes under `id`, recursively.
    pub fn merge_adjacent_text(&mut self, id: NodeId) {
        let children = self.nodes[id.0].children.clone();
        let mut prev_text: Option<NodeId> = None;
        for c in children {
            match (&self.nodes[c.0].data, prev_text) {
                (NodeData::Text(t), Some(p)) => {
                    let t = t.clone();
                    if let NodeData::Text(pt) = &mut self.nodes[p.0].data {
                        pt.push_str(&t);
                    }
                    self.detach(c);
                }
                (NodeData::Text(_), None) => prev_text = Some(c),
                _ => {
                    prev_text = None;
                    self.merge_adjacent_text(c);
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Serialisation
    // -----------------------------------------------------------------------

    /// Serialise the whole document back to HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        if let Some(doctype) = &self.doctype {
            out.push_str(doctype);
        }
        for &c in self.children(self.root) {
            self.write_node(c, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].data {
            NodeData::Document => {
                for &c in self.children(id) {
                    self.write_node(c, out);
                }
            }
            NodeData::Text(t) => {
                let raw = self
                    .parent(id)
                    .and_then(|p| self.tag(p))
                    .map(|t| t.is_raw_text())
                    .unwrap_or(false);
                if raw {
                    out.push_str(t);
                } else {
                    out.push_str(&encode_entities(t, false));
                }
            }
            NodeData::Comment(c) => {
                out.push_str("<!--");
                out.push_str(c);
                out.push_str("-->");
            }
            NodeData::Element(e) => {
                out.push('<');
                out.push_str(e.tag.name());
                for (k, v) in &e.attributes {
                    out.push(' ');
                    out.push_str(k);
                    if !v.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&encode_entities(v, true));
                        out.push('"');
                    }
                }
                out.push('>');
                if e.tag.is_void() {
                    return;
                }
                for &c in self.children(id) {
                    self.write_node(c, out);
                }
                out.push_str("</");
                out.push_str(e.tag.name());
                out.push('>');
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Parser – simple recursive descent over HTML
// ---------------------------------------------------------------------------

/// Parse an HTML string into a [`Document`].
///
/// A hand-written parser for controlled inputs: no implied end tags, no
/// foster parenting. Mismatched closing tags close the current element.
pub fn parse_html(html: &str) -> Document {
    let mut doc = Document::new();
    let mut parser = Parser::new(html);
    let root = doc.root();
    loop {
        parser.parse_nodes(&mut doc, root);
        if parser.eof() {
            break;
        }
        // Stray closing tag at the top level.
        parser.advance(2);
        parser.parse_tag_name();
        while !parser.eof() && !parser.starts_with(">") {
            parser.advance(1);
        }
        parser.advance(1);
    }
    doc.doctype = parser.doctype.take();
    doc
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    doctype: Option<String>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            doctype: None,
        }
    }

    fn parse_nodes(&mut self, doc: &mut Document, parent: NodeId) {
        loop {
            if self.eof() || self.starts_with("</") {
                break;
            }
            self.parse_node(doc, parent);
        }
    }

    fn parse_node(&mut self, doc: &mut Document, parent: NodeId) {
        if self.starts_with("<!--") {
            let comment = self.parse_comment();
            let id = doc.create_comment(&comment);
            doc.append_child(parent, id);
            return;
        }
        if self.starts_with("<!") || self.starts_with("<?") {
            let start = self.pos;
            while !self.eof() && !self.starts_with(">") {
                self.advance(1);
            }
            if !self.eof() {
                self.advance(1); // skip '>'
            }
            if self.input[start..].to_ascii_lowercase().starts_with("<!doctype") {
                self.doctype = Some(self.input[start..self.pos].to_string());
            }
            return;
        }
        let next_is_tag = self.input[self.pos..]
            .chars()
            .nth(1)
            .map(|c| c.is_ascii_alphabetic())
            .unwrap_or(false);
        if self.starts_with("<") && next_is_tag {
            self.parse_element(doc, parent);
        } else {
            self.parse_text(doc, parent);
        }
    }

    fn parse_text(&mut self, doc: &mut Document, parent: NodeId) {
        let start = self.pos;
        // A lone '<' that does not open a tag is plain text.
        if self.starts_with("<") {
            self.advance(1);
        }
        while !self.eof() && !self.starts_with("<") {
            self.advance(1);
        }
        let text = decode_entities(&self.input[start..self.pos]);
        let id = doc.create_text(&text);
        doc.append_child(parent, id);
    }

    fn parse_element(&mut self, doc: &mut Document, parent: NodeId) {
        // Consume '<'
        self.advance(1);
        let tag_name = self.parse_tag_name();
        let tag = Tag::from_str(&tag_name);
        let mut elem = ElementData::new(tag.clone());

        // Parse attributes
        loop {
            self.skip_whitespace();
            if self.eof() || self.starts_with(">") || self.starts_with("/>") {
                break;
            }
            let (key, value) = self.parse_attribute();
            if key.is_empty() {
                // Garbage character inside the tag: skip it.
                self.advance(1);
                continue;
            }
            if elem.attr(&key).is_none() {
                elem.attributes.push((key, value));
            }
        }

        let id = doc.push(NodeData::Element(elem));
        doc.append_child(parent, id);

        if self.starts_with("/>") {
            self.advance(2);
            return;
        }
        if self.starts_with(">") {
            self.advance(1);
        }
        if tag.is_void() {
            return;
        }

        if tag.is_raw_text() {
            let close = format!("</{}", tag.name());
            let start = self.pos;
            while !self.eof() && !self.starts_with_ignore_case(&close) {
                self.advance(1);
            }
            let raw = self.input[start..self.pos].to_string();
            if !raw.is_empty() {
                let text = doc.create_text(&raw);
                doc.append_child(id, text);
            }
        } else {
            self.parse_nodes(doc, id);
        }

        // Consume closing tag
        if self.starts_with("</") {
            self.advance(2);
            self.parse_tag_name(); // skip tag name
            self.skip_whitespace();
            if self.starts_with(">") {
                self.advance(1);
            }
        }
    }

    fn parse_tag_name(&mut self) -> String {
        let start = self.pos;
        while !self.eof() {
            let c = self.current_char();
            if c.is_alphanumeric() || c == '-' || c == '_' || c == ':' {
                self.advance(1);
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_ascii_lowercase()
    }

    fn parse_attribute(&mut self) -> (String, String) {
        let key = self.parse_tag_name();
        self.skip_whitespace();
        if !self.starts_with("=") {
            return (key, String::new());
        }
        self.advance(1); // skip '='
        self.skip_whitespace();
        let value = self.parse_attr_value();
        (key, value)
    }

    fn parse_attr_value(&mut self) -> String {
        for quote in ["\"", "'"] {
            if self.starts_with(quote) {
                self.advance(1);
                let start = self.pos;
                while !self.eof() && !self.starts_with(quote) {
                    self.advance(1);
                }
                let val = self.input[start..self.pos].to_string();
                if !self.eof() {
                    self.advance(1);
                }
                return decode_entities(&val);
            }
        }
        let start = self.pos;
        while !self.eof() {
            let c = self.current_char();
            if c.is_whitespace() || c == '>' {
                break;
            }
            self.advance(1);
        }
        decode_entities(&self.input[start..self.pos])
    }

    fn parse_comment(&mut self) -> String {
        self.advance(4); // skip <!--
        let start = self.pos;
        while !self.eof() && !self.starts_with("-->") {
            self.advance(1);
        }
        let body = self.input[start..self.pos].to_string();
        if !self.eof() {
            self.advance(3);
        }
        body
    }

    fn skip_whitespace(&mut self) {
        while !self.eof() && self.current_char().is_whitespace() {
            self.advance(1);
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn starts_with_ignore_case(&self, s: &str) -> bool {
        self.input
            .get(self.pos..self.pos + s.len())
            .map(|head| head.eq_ignore_ascii_case(s))
            .unwrap_or(false)
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn current_char(&self) -> char {
        self.input[self.pos..].chars().next().unwrap_or('\0')
    }

    fn advance(&mut self, n: usize) {
        // Advance by `n` characters (not bytes).
        for _ in 0..n {
            if let Some(c) = self.input[self.pos..].chars().next() {
                self.pos += c.len_utf8();
            }
        }
    }
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", "\u{00A0}")
        .replace("&amp;", "&")
}

fn encode_entities(s: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_element(doc: &Document) -> NodeId {
        doc.children(doc.root())
            .iter()
            .copied()
            .find(|&c| doc.element(c).is_some())
            .expect("no element")
    }

    #[test]
    fn parse_simple_div() {
        let doc = parse_html(r#"<div class="flex p-4"><p>Hello</p></div>"#);
        let div = first_element(&doc);
        let e = doc.element(div).unwrap();
        assert_eq!(e.tag, Tag::Div);
        assert_eq!(e.classes(), vec!["flex", "p-4"]);
        assert_eq!(doc.children(div).len(), 1);
    }

    #[test]
    fn parse_void_elements() {
        let doc = parse_html(r#"<p>a<br>b<img src="logo.png"></p>"#);
        let p = first_element(&doc);
        assert_eq!(doc.children(p).len(), 4);
        let img = doc.children(p)[3];
        assert_eq!(doc.element(img).unwrap().src(), Some("logo.png"));
    }

    #[test]
    fn parse_keeps_comments_and_inline_whitespace() {
        let doc = parse_html("<p><b>a</b> <i>b</i><!-- note --></p>");
        let p = first_element(&doc);
        let kids = doc.children(p);
        assert_eq!(kids.len(), 4);
        assert_eq!(doc.text(kids[1]), Some(" "));
        assert!(doc.is_comment(kids[3]));
    }

    #[test]
    fn raw_text_is_not_parsed() {
        let doc = parse_html("<style>p > b { color: red }</style><p>x</p>");
        let style = first_element(&doc);
        assert_eq!(doc.text_content(style), "p > b { color: red }");
        assert_eq!(doc.elements_by_name("p").len(), 1);
    }

    #[test]
    fn serialisation_round_trips() {
        let html = r#"<div id="a" hidden><p>x &amp; y</p><!--c--><br></div>"#;
        let doc = parse_html(html);
        assert_eq!(doc.to_html(), html);
    }

    #[test]
    fn wrap_and_unwrap_restore_structure() {
        let mut doc = parse_html("<div><b>a</b>b<i>c</i></div>");
        let div = first_element(&doc);
        let kids = doc.children(div).to_vec();
        let wrapper = doc.create_element("section");
        doc.wrap_all(&kids[..2], wrapper);
        assert_eq!(doc.to_html(), "<div><section><b>a</b>b</section><i>c</i></div>");
        doc.unwrap(wrapper);
        assert_eq!(doc.to_html(), "<div><b>a</b>b<i>c</i></div>");
    }

    #[test]
    fn merge_adjacent_text_nodes() {
        let mut doc = parse_html("<p>ab</p>");
        let p = first_element(&doc);
        let extra = doc.create_text("cd");
        doc.append_child(p, extra);
        doc.merge_adjacent_text(doc.root());
        assert_eq!(doc.children(p).len(), 1);
        assert_eq!(doc.text_content(p), "abcd");
    }
}
