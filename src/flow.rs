//! Content flow preparation and the per-pass flow tree.
//!
//! [`prepare`] moves the body content into the engine's structural wrappers
//! and gives every inline run of a mixed container its own block. The
//! [`FlowTree`] is then built from the prepared content flow: one
//! [`FlowNode`] per block-level box, with its kind and content computed once.

use std::collections::HashMap;

use crate::dom::{Document, NodeId, Tag};
use crate::style::{Clear, ComputedStyle, Display, StyleMap};
use crate::surface::Surface;
use crate::text_block::{inline_role, is_text_block, InlineRole, SplitBlock, TextBlockSplitter};

pub const ROOT: &str = "paged-root";
pub const PAPER_FLOW: &str = "paged-paper-flow";
pub const OVERLAY_FLOW: &str = "paged-overlay-flow";
pub const CONTENT_FLOW: &str = "paged-content-flow";
pub const CONTENT_START: &str = "paged-content-flow-start";
pub const CONTENT_END: &str = "paged-content-flow-end";
pub const COMPLEX_TEXT_BLOCK: &str = "paged-complex-text-block";
/// Author-facing forced page break element.
pub const PAGE_BREAK: &str = "paged-page-break";

/// Handles to the structural wrappers created by [`prepare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prepared {
    pub root: NodeId,
    pub paper_flow: NodeId,
    pub overlay_flow: NodeId,
    pub content_flow: NodeId,
    pub start: NodeId,
    pub end: NodeId,
}

/// Wrap the body content into `paged-root` and split inline runs of mixed
/// containers into `paged-complex-text-block`s.
pub fn prepare(doc: &mut Document) -> Prepared {
    let body = doc.body();
    let content: Vec<NodeId> = doc.children(body).to_vec();

    let root = doc.create_element(ROOT);
    let paper_flow = doc.create_element(PAPER_FLOW);
    let overlay_flow = doc.create_element(OVERLAY_FLOW);
    let content_flow = doc.create_element(CONTENT_FLOW);
    let start = doc.create_element(CONTENT_START);
    let end = doc.create_element(CONTENT_END);

    doc.append_child(body, root);
    doc.append_child(root, paper_flow);
    doc.append_child(root, overlay_flow);
    doc.append_child(root, content_flow);
    doc.append_child(content_flow, start);
    for c in content {
        doc.append_child(content_flow, c);
    }
    doc.append_child(content_flow, end);

    let styles = StyleMap::compute(doc, content_flow);
    let mut wrapped = 0;
    let mut containers = vec![content_flow];
    containers.extend(doc.descendants(content_flow));
    for id in containers {
        if is_block_container(doc, &styles, id) {
            wrapped += wrap_inline_runs(doc, &styles, id);
        }
    }
    log::debug!("prepared content flow {content_flow}: {wrapped} inline runs wrapped");

    Prepared {
        root,
        paper_flow,
        overlay_flow,
        content_flow,
        start,
        end,
    }
}

fn is_block_container(doc: &Document, styles: &StyleMap, id: NodeId) -> bool {
    let rendered = !doc.tag(id).map(Tag::is_non_rendered).unwrap_or(true);
    match styles.get(id) {
        Some(s) => rendered && s.display != Display::None && !s.is_inline_level(),
        None => false,
    }
}

/// Wrap every maximal run of non-block children holding inline content.
fn wrap_inline_runs(doc: &mut Document, styles: &StyleMap, container: NodeId) -> usize {
    let children = doc.children(container).to_vec();
    let roles: Vec<InlineRole> = children.iter().map(|&c| inline_role(doc, styles, c)).collect();
    if !roles.contains(&InlineRole::Block) || !roles.contains(&InlineRole::Inline) {
        return 0;
    }

    let mut runs: Vec<Vec<NodeId>> = Vec::new();
    let mut run: Vec<NodeId> = Vec::new();
    let mut has_inline = false;
    for (&c, role) in children.iter().zip(&roles) {
        match role {
            InlineRole::Block => {
                if has_inline {
                    runs.push(std::mem::take(&mut run));
                }
                run.clear();
                has_inline = false;
            }
            InlineRole::Inline => {
                run.push(c);
                has_inline = true;
            }
            InlineRole::Neutral => run.push(c),
        }
    }
    if has_inline {
        runs.push(run);
    }

    for run in &runs {
        let wrapper = doc.create_element(COMPLEX_TEXT_BLOCK);
        doc.wrap_all(run, wrapper);
    }
    runs.len()
}

// ---------------------------------------------------------------------------
// Flow tree
// ---------------------------------------------------------------------------

/// Index of a [`FlowNode`] inside a [`FlowTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowId(pub usize);

/// How a box relates to its neighbours for margin collapsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Float,
    Absolute,
    /// A lone inline wrapper standing between blocks.
    StandaloneInline,
    Clear,
    Plain,
}

/// What a box holds, as far as pagination is concerned.
#[derive(Debug, Clone)]
pub enum Content {
    /// No rendered content and zero height.
    Empty,
    /// Inline content, already broken into lines and groups.
    Text(SplitBlock),
    /// Placed whole.
    Atomic,
    /// Block children the partitioner may descend into.
    Container,
    /// Forced page break element.
    Break,
}

impl Content {
    pub fn is_empty(&self) -> bool {
        matches!(self, Content::Empty)
    }
}

#[derive(Debug, Clone)]
pub struct FlowNode {
    pub dom: NodeId,
    pub kind: NodeKind,
    pub content: Content,
    pub style: ComputedStyle,
    /// Border-box height.
    pub height: f32,
    pub parent: Option<FlowId>,
    pub prev: Option<FlowId>,
    pub next: Option<FlowId>,
    pub children: Vec<FlowId>,
    /// A forced break sits somewhere inside this container.
    pub holds_break: bool,
}

impl FlowNode {
    /// Takes part in block flow (not skipped by the partitioner or chains).
    pub fn is_in_flow(&self) -> bool {
        !matches!(self.kind, NodeKind::Absolute | NodeKind::Float)
            && !matches!(self.content, Content::Empty | Content::Break)
    }
}

/// Arena of flow nodes rooted at the content flow.
#[derive(Debug, Clone)]
pub struct FlowTree {
    nodes: Vec<FlowNode>,
    by_dom: HashMap<NodeId, FlowId>,
}

struct BuildCtx<'a> {
    doc: &'a Document,
    surface: &'a dyn Surface,
    splitter: &'a TextBlockSplitter<'a>,
}

impl FlowTree {
    /// Build the tree for `content_flow` from resolved geometry.
    pub fn build(
        doc: &Document,
        surface: &dyn Surface,
        splitter: &TextBlockSplitter<'_>,
        content_flow: NodeId,
    ) -> Self {
        let mut tree = FlowTree {
            nodes: Vec::new(),
            by_dom: HashMap::new(),
        };
        let ctx = BuildCtx {
            doc,
            surface,
            splitter,
        };
        let root = tree.push(FlowNode {
            dom: content_flow,
            kind: NodeKind::Plain,
            content: Content::Container,
            style: surface.style(content_flow).cloned().unwrap_or_default(),
            height: surface.geometry(content_flow).map(|g| g.height).unwrap_or(0.0),
            parent: None,
            prev: None,
            next: None,
            children: Vec::new(),
            holds_break: false,
        });
        tree.add_children(&ctx, root);
        log::debug!("flow tree: {} nodes", tree.nodes.len());
        tree
    }

    fn push(&mut self, node: FlowNode) -> FlowId {
        let id = FlowId(self.nodes.len());
        self.by_dom.insert(node.dom, id);
        self.nodes.push(node);
        id
    }

    fn add_children(&mut self, ctx: &BuildCtx<'_>, parent: FlowId) {
        let dom_parent = self.nodes[parent.0].dom;
        let mut prev: Option<FlowId> = None;
        for &c in ctx.doc.children(dom_parent) {
            let Some(style) = ctx.surface.style(c) else {
                continue;
            };
            let non_rendered = ctx.doc.tag(c).map(Tag::is_non_rendered).unwrap_or(false);
            if style.display == Display::None
                || non_rendered
                || ctx.doc.is(c, CONTENT_START)
                || ctx.doc.is(c, CONTENT_END)
            {
                continue;
            }

            let id = self.push(FlowNode {
                dom: c,
                kind: classify(ctx.doc, ctx.surface.styles(), c, style),
                content: Content::Empty,
                style: style.clone(),
                height: ctx.surface.geometry(c).map(|g| g.height).unwrap_or(0.0),
                parent: Some(parent),
                prev,
                next: None,
                children: Vec::new(),
                holds_break: false,
            });
            if let Some(p) = prev {
                self.nodes[p.0].next = Some(id);
            }
            self.nodes[parent.0].children.push(id);
            prev = Some(id);

            let content = self.content_of(ctx, id);
            self.nodes[id.0].content = content;
        }
    }

    fn content_of(&mut self, ctx: &BuildCtx<'_>, id: FlowId) -> Content {
        let (dom, kind, height) = {
            let n = &self.nodes[id.0];
            (n.dom, n.kind, n.height)
        };
        let sized = if height > 0.0 { Content::Atomic } else { Content::Empty };

        if ctx.doc.is(dom, PAGE_BREAK) {
            return Content::Break;
        }
        if kind == NodeKind::Absolute {
            return Content::Empty;
        }
        let style = &self.nodes[id.0].style;
        if style.is_monolithic() || ctx.doc.is(dom, "img") {
            return sized;
        }
        if style.is_inline_level() || is_text_block(ctx.doc, ctx.surface.styles(), dom) {
            let split = ctx.splitter.split(dom);
            return if split.lines.is_empty() { sized } else { Content::Text(split) };
        }

        self.add_children(ctx, id);
        let holds_break = self.nodes[id.0].children.iter().any(|&c| {
            let n = &self.nodes[c.0];
            n.kind != NodeKind::Absolute
                && (matches!(n.content, Content::Break)
                    || n.style.break_before
                    || n.style.break_after
                    || n.holds_break)
        });
        self.nodes[id.0].holds_break = holds_break;
        let any = self.nodes[id.0].children.iter().any(|&c| {
            let n = &self.nodes[c.0];
            n.kind != NodeKind::Absolute && !n.content.is_empty()
        });
        if any {
            Content::Container
        } else {
            sized
        }
    }

    pub fn root(&self) -> FlowId {
        FlowId(0)
    }

    pub fn node(&self, id: FlowId) -> &FlowNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn find(&self, dom: NodeId) -> Option<FlowId> {
        self.by_dom.get(&dom).copied()
    }

    pub fn parent(&self, id: FlowId) -> Option<FlowId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: FlowId) -> &[FlowId] {
        &self.nodes[id.0].children
    }

    /// First child taking part in block flow.
    pub fn first_in_flow_child(&self, id: FlowId) -> Option<FlowId> {
        self.children(id).iter().copied().find(|&c| self.node(c).is_in_flow())
    }

    pub fn last_in_flow_child(&self, id: FlowId) -> Option<FlowId> {
        self.children(id).iter().rev().copied().find(|&c| self.node(c).is_in_flow())
    }

    /// Nearest preceding sibling taking part in block flow.
    pub fn prev_in_flow(&self, id: FlowId) -> Option<FlowId> {
        let mut cur = self.node(id).prev;
        while let Some(c) = cur {
            if self.node(c).is_in_flow() {
                return Some(c);
            }
            cur = self.node(c).prev;
        }
        None
    }

    /// Whether every earlier sibling of `id` is empty, a break or out of flow.
    pub fn is_first_content_child(&self, id: FlowId) -> bool {
        self.prev_in_flow(id).is_none()
            && !self.siblings_before(id).any(|s| self.node(s).kind == NodeKind::Float)
    }

    fn siblings_before(&self, id: FlowId) -> impl Iterator<Item = FlowId> + '_ {
        let mut cur = self.node(id).prev;
        std::iter::from_fn(move || {
            let c = cur?;
            cur = self.node(c).prev;
            Some(c)
        })
    }

    /// All flow nodes under `id` (excluding `id`), in document order.
    pub fn descendants(&self, id: FlowId) -> Vec<FlowId> {
        let mut out = Vec::new();
        let mut stack: Vec<FlowId> = self.children(id).iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev());
        }
        out
    }
}

fn classify(doc: &Document, styles: &StyleMap, id: NodeId, style: &ComputedStyle) -> NodeKind {
    if style.is_out_of_flow() {
        NodeKind::Absolute
    } else if style.is_floated() {
        NodeKind::Float
    } else if style.clear != Clear::None {
        NodeKind::Clear
    } else if style.is_inline_level() || is_lone_wrapper(doc, styles, id) {
        NodeKind::StandaloneInline
    } else {
        NodeKind::Plain
    }
}

/// A complex text block whose only rendered content is one inline element.
fn is_lone_wrapper(doc: &Document, styles: &StyleMap, id: NodeId) -> bool {
    if !doc.is(id, COMPLEX_TEXT_BLOCK) {
        return false;
    }
    let mut inline = doc
        .children(id)
        .iter()
        .filter(|&&c| inline_role(doc, styles, c) == InlineRole::Inline);
    match (inline.next(), inline.next()) {
        (Some(&only), None) => doc.element(only).is_some(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;
    use crate::fonts::FontManager;
    use crate::layout::TaffyHost;
    use crate::text_block::SplitConfig;

    #[test]
    fn prepare_wraps_body_and_inline_runs() {
        let mut doc = parse_html("<body>lead <b>bold</b><div>block</div>tail</body>");
        let p = prepare(&mut doc);
        let body = doc.body();
        assert_eq!(doc.children(body), &[p.root]);
        assert_eq!(doc.children(p.root), &[p.paper_flow, p.overlay_flow, p.content_flow]);

        let kids = doc.children(p.content_flow).to_vec();
        assert_eq!(kids.first(), Some(&p.start));
        assert_eq!(kids.last(), Some(&p.end));
        let wrappers = doc.elements_by_name(COMPLEX_TEXT_BLOCK);
        assert_eq!(wrappers.len(), 2);
        assert_eq!(doc.text_content(wrappers[0]), "lead bold");
        assert_eq!(doc.text_content(wrappers[1]), "tail");
    }

    #[test]
    fn whitespace_between_blocks_is_not_wrapped() {
        let mut doc = parse_html("<body>\n<p>a</p>\n<p>b</p>\n</body>");
        prepare(&mut doc);
        assert!(doc.elements_by_name(COMPLEX_TEXT_BLOCK).is_empty());
    }

    fn tree_for(html: &str) -> (Document, FlowTree) {
        let mut doc = parse_html(html);
        let p = prepare(&mut doc);
        let host = TaffyHost::default();
        let surface = host.layout(&doc, p.content_flow, 400.0).unwrap();
        let fonts = FontManager::default();
        let splitter = TextBlockSplitter::new(&doc, &surface, &fonts, SplitConfig::default());
        let tree = FlowTree::build(&doc, &surface, &splitter, p.content_flow);
        (doc, tree)
    }

    #[test]
    fn kinds_and_contents() {
        let (doc, tree) = tree_for(
            r#"<body><p>text</p><p><!-- only --></p><div style="float: left; height: 10px"></div><div style="position: absolute">x</div><div style="clear: both"><p>c</p></div><paged-page-break></paged-page-break><div style="height: 12px"></div></body>"#,
        );
        let kids: Vec<&FlowNode> =
            tree.children(tree.root()).iter().map(|&c| tree.node(c)).collect();
        assert_eq!(kids.len(), 7);
        assert!(matches!(kids[0].content, Content::Text(_)));
        assert!(matches!(kids[1].content, Content::Empty));
        assert_eq!(kids[2].kind, NodeKind::Float);
        assert_eq!(kids[3].kind, NodeKind::Absolute);
        assert_eq!(kids[4].kind, NodeKind::Clear);
        assert!(matches!(kids[4].content, Content::Container));
        assert!(matches!(kids[5].content, Content::Break));
        assert!(matches!(kids[6].content, Content::Atomic));
        assert_eq!(tree.find(kids[0].dom), Some(tree.children(tree.root())[0]));
        assert!(doc.is(kids[6].dom, "div"));
    }

    #[test]
    fn first_content_child_skips_empty_siblings() {
        let (_, tree) = tree_for("<body><div><p></p><p>x</p><p>y</p></div></body>");
        let div = tree.children(tree.root())[0];
        let ps = tree.children(div);
        assert!(tree.is_first_content_child(ps[1]));
        assert!(!tree.is_first_content_child(ps[2]));
        assert_eq!(tree.first_in_flow_child(div), Some(ps[1]));
    }
}
