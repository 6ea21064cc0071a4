//! Flow partitioner – walks the flow tree in document order and decides
//! where every page starts and ends.
//!
//! The walk keeps the height used on the open page. Boxes that fit are
//! placed whole; containers that don't are descended into; text blocks are
//! placed group by group; unsplittable boxes move to a fresh page and may
//! overflow it when nothing smaller exists.

use std::collections::HashMap;

use crate::collapse::{Boundary, CollapseResolver};
use crate::dom::NodeId;
use crate::error::{PagedError, UnsupportedReason};
use crate::flow::{Content, FlowId, FlowTree, NodeKind, Prepared};
use crate::text_block::{place_groups, FitPolicy, SplitBlock};

/// The element (or text group of a split block) carrying a page marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorRef {
    Node(NodeId),
    Group { block: NodeId, index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    pub number: usize,
    pub start: AnchorRef,
    pub end: AnchorRef,
}

/// A text block split into groups, with the page each group landed on.
#[derive(Debug, Clone)]
pub struct TextBlockPlan {
    pub split: SplitBlock,
    pub group_pages: Vec<usize>,
}

/// Everything the annotator needs to write one pass back.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub pages: Vec<PagePlan>,
    pub text_blocks: Vec<TextBlockPlan>,
    pub zero_top: Vec<NodeId>,
    pub zero_bottom: Vec<NodeId>,
    pub unsupported: Vec<(NodeId, UnsupportedReason)>,
    pub warnings: Vec<String>,
}

impl Plan {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// No unsupported layout case was met.
    pub fn success(&self) -> bool {
        self.unsupported.is_empty()
    }
}

/// Mutable state of one walk.
struct Walk {
    starts: Vec<AnchorRef>,
    used: f32,
    has_content: bool,
    /// Top of a page opened by a break: leading margins are truncated.
    fresh: bool,
    pending_break: bool,
    group_pages: HashMap<NodeId, Vec<usize>>,
    unsupported: Vec<(NodeId, UnsupportedReason)>,
    warnings: Vec<String>,
}

impl Walk {
    fn page(&self) -> usize {
        self.starts.len()
    }
}

pub struct Partitioner<'a> {
    tree: &'a FlowTree,
    collapse: CollapseResolver<'a>,
    policy: &'a dyn FitPolicy,
    budget: f32,
    prepared: Prepared,
}

impl<'a> Partitioner<'a> {
    pub fn new(
        tree: &'a FlowTree,
        policy: &'a dyn FitPolicy,
        body_height: f32,
        prepared: Prepared,
    ) -> Self {
        Self {
            tree,
            collapse: CollapseResolver::new(tree),
            policy,
            budget: body_height,
            prepared,
        }
    }

    pub fn run(&self) -> Plan {
        let mut w = Walk {
            starts: vec![AnchorRef::Node(self.prepared.start)],
            used: 0.0,
            has_content: false,
            fresh: false,
            pending_break: false,
            group_pages: HashMap::new(),
            unsupported: Vec::new(),
            warnings: Vec::new(),
        };
        for &c in self.tree.children(self.tree.root()) {
            self.visit(&mut w, c);
        }

        let count = w.starts.len();
        let pages: Vec<PagePlan> = (0..count)
            .map(|k| PagePlan {
                number: k + 1,
                start: w.starts[k],
                end: if k + 1 < count {
                    self.left_neighbour(w.starts[k + 1])
                } else {
                    self.last_content()
                },
            })
            .collect();

        let mut plan = Plan {
            pages,
            ..Plan::default()
        };
        self.zero_boundary_margins(&mut plan, &mut w);

        for id in self.tree.descendants(self.tree.root()) {
            if let Content::Text(split) = &self.tree.node(id).content {
                if !split.is_splittable() {
                    continue;
                }
                let group_pages = w
                    .group_pages
                    .remove(&split.block)
                    .unwrap_or_else(|| vec![1; split.groups.len()]);
                plan.text_blocks.push(TextBlockPlan {
                    split: split.clone(),
                    group_pages,
                });
            }
        }
        plan.unsupported = w.unsupported;
        plan.warnings = w.warnings;
        log::debug!("partitioned into {} pages", plan.page_count());
        plan
    }

    fn fits(&self, needed: f32) -> bool {
        self.policy.fits(needed, self.budget)
    }

    fn visit(&self, w: &mut Walk, n: FlowId) {
        let node = self.tree.node(n);
        if node.kind == NodeKind::Absolute {
            return;
        }
        match node.content {
            Content::Break => {
                if w.has_content {
                    w.pending_break = true;
                }
                return;
            }
            Content::Empty => {
                if w.has_content && (node.style.break_before || node.style.break_after) {
                    w.pending_break = true;
                }
                return;
            }
            _ => {}
        }

        if w.has_content && (w.pending_break || node.style.break_before) {
            self.open_page(w, AnchorRef::Node(node.dom));
        }
        w.pending_break = false;

        let gap = if w.fresh { 0.0 } else { self.collapse.gap_before(n) };
        let floated = node.kind == NodeKind::Float;
        match &node.content {
            Content::Container if !floated => {
                if !node.holds_break && self.fits(w.used + gap + node.height) {
                    self.place_whole(w, n, gap + node.height);
                } else {
                    w.used += gap + node.style.top_edge();
                    for &c in self.tree.children(n) {
                        self.visit(w, c);
                    }
                    w.used += self.collapse.trailing_margin(n) + node.style.bottom_edge();
                }
            }
            Content::Text(split) if split.is_splittable() && !floated => {
                self.place_text(w, n, split, gap)
            }
            _ => self.place_atomic(w, n, gap),
        }

        if node.style.break_after && w.has_content {
            w.pending_break = true;
        }
    }

    fn place_whole(&self, w: &mut Walk, n: FlowId, advance: f32) {
        w.used += advance;
        w.has_content = true;
        w.fresh = false;
        self.mark_pages(w, n);
    }

    /// Record the open page for every text block in the subtree of `n`.
    fn mark_pages(&self, w: &mut Walk, n: FlowId) {
        let page = w.page();
        for id in std::iter::once(n).chain(self.tree.descendants(n)) {
            if let Content::Text(split) = &self.tree.node(id).content {
                w.group_pages.insert(split.block, vec![page; split.groups.len()]);
            }
        }
    }

    fn place_atomic(&self, w: &mut Walk, n: FlowId, mut gap: f32) {
        let node = self.tree.node(n);
        if !self.fits(w.used + gap + node.height) && w.has_content {
            self.open_after_overflow(w, n, AnchorRef::Node(node.dom), node.height);
            gap = if w.fresh { 0.0 } else { self.collapse.gap_before(n) };
        }
        if !self.fits(w.used + gap + node.height) {
            match &node.content {
                Content::Text(split) if split.lines.len() == 1 => {
                    w.unsupported.push((node.dom, UnsupportedReason::OversizedLine));
                }
                _ => w.warnings.push(format!(
                    "{} overflows page {} by {:.1}px",
                    node.dom,
                    w.page(),
                    w.used + gap + node.height - self.budget
                )),
            }
        }
        self.place_whole(w, n, gap + node.height);
    }

    fn place_text(&self, w: &mut Walk, n: FlowId, split: &SplitBlock, gap: f32) {
        let node = self.tree.node(n);
        if self.fits(w.used + gap + node.height) {
            self.place_whole(w, n, gap + node.height);
            return;
        }

        let total = split.groups.len();
        w.used += gap + node.style.top_edge();
        let mut first = 0;
        loop {
            let placement = place_groups(
                &split.groups[first..],
                self.budget - w.used,
                !w.has_content,
                self.policy,
            );
            let page = w.page();
            let pages = w.group_pages.entry(split.block).or_insert_with(|| vec![page; total]);
            for g in &split.groups[first..first + placement.placed] {
                pages[g.index] = page;
                w.used += g.height;
            }
            if placement.placed > 0 {
                w.has_content = true;
                w.fresh = false;
            }
            if placement.overflow {
                if split.groups[first].line_count() == 1 {
                    w.unsupported.push((split.block, UnsupportedReason::OversizedLine));
                } else {
                    w.warnings.push(format!(
                        "text group {} of {} overflows page {}",
                        first,
                        split.block,
                        page
                    ));
                }
            }
            first += placement.placed;
            if first >= total {
                break;
            }
            if first == 0 {
                let needed = node.style.top_edge() + split.groups[0].height;
                let anchor = AnchorRef::Group {
                    block: split.block,
                    index: 0,
                };
                if self.open_after_overflow(w, n, anchor, needed) {
                    w.used += self.collapse.gap_before(n) + node.style.top_edge();
                }
                continue;
            }
            self.open_page(
                w,
                AnchorRef::Group {
                    block: split.block,
                    index: first,
                },
            );
        }
        w.used += node.style.bottom_edge();
    }

    /// Open a page for `n`, which does not fit the rest of the open page.
    /// A `break-after: avoid` box right before `n` moves along with it when
    /// both fit the new page. Returns whether such a box was moved.
    fn open_after_overflow(
        &self,
        w: &mut Walk,
        n: FlowId,
        anchor: AnchorRef,
        needed: f32,
    ) -> bool {
        match self.hanging_before(w, n, needed) {
            Some(prev) => {
                let height = self.tree.node(prev).height;
                self.open_page(w, AnchorRef::Node(self.tree.node(prev).dom));
                self.place_whole(w, prev, height);
                true
            }
            None => {
                self.open_page(w, anchor);
                false
            }
        }
    }

    /// The box that would be left hanging at the end of the open page when
    /// a new one starts at `n`, if it can follow `n` over.
    fn hanging_before(&self, w: &Walk, n: FlowId, needed: f32) -> Option<FlowId> {
        let dom = self.tree.node(n).dom;
        if self.promote(AnchorRef::Node(dom)).0 != AnchorRef::Node(dom) {
            return None;
        }
        let prev = self.tree.prev_in_flow(n)?;
        let p = self.tree.node(prev);
        let splittable = matches!(&p.content, Content::Text(split) if split.is_splittable());
        if !p.style.break_after_avoid || splittable {
            return None;
        }
        let (start, edges) = self.promote(AnchorRef::Node(p.dom));
        let current = *w.starts.last()?;
        if start == current
            || self.starts_within(current, prev)
            || self.left_neighbour(start) == AnchorRef::Node(self.prepared.start)
        {
            return None;
        }
        let needed = edges + p.height + self.collapse.gap_before(n) + needed;
        self.fits(needed).then_some(prev)
    }

    /// Whether `anchor` lies inside the subtree of `id`.
    fn starts_within(&self, anchor: AnchorRef, id: FlowId) -> bool {
        let dom = match anchor {
            AnchorRef::Group { block, .. } => block,
            AnchorRef::Node(n) => n,
        };
        let mut cur = self.tree.find(dom);
        while let Some(c) = cur {
            if c == id {
                return true;
            }
            cur = self.tree.parent(c);
        }
        false
    }

    /// Close the open page and start the next one at `anchor`.
    fn open_page(&self, w: &mut Walk, anchor: AnchorRef) {
        let (anchor, edges) = self.promote(anchor);
        w.starts.push(anchor);
        w.used = edges;
        w.has_content = false;
        w.fresh = true;
        log::debug!("page {} starts at {:?}", w.page(), anchor);
    }

    /// Lift a start anchor to the outermost ancestor it opens, returning the
    /// top border/padding those ancestors carry onto the new page.
    fn promote(&self, anchor: AnchorRef) -> (AnchorRef, f32) {
        let (dom, mut edges) = match anchor {
            AnchorRef::Group { index, .. } if index > 0 => return (anchor, 0.0),
            AnchorRef::Group { block, .. } => {
                let edge = self
                    .tree
                    .find(block)
                    .map(|b| self.tree.node(b).style.top_edge())
                    .unwrap_or(0.0);
                (block, edge)
            }
            AnchorRef::Node(n) => (n, 0.0),
        };
        let Some(mut id) = self.tree.find(dom) else {
            return (AnchorRef::Node(dom), edges);
        };
        while let Some(parent) = self.tree.parent(id) {
            if parent == self.tree.root() || !self.tree.is_first_content_child(id) {
                break;
            }
            edges += self.tree.node(parent).style.top_edge();
            id = parent;
        }
        (AnchorRef::Node(self.tree.node(id).dom), edges)
    }

    /// The anchor that ends the page before the one starting at `start`.
    fn left_neighbour(&self, start: AnchorRef) -> AnchorRef {
        let dom = match start {
            AnchorRef::Group { block, index } if index > 0 => {
                return AnchorRef::Group { block, index: index - 1 };
            }
            AnchorRef::Group { block, .. } => block,
            AnchorRef::Node(n) => n,
        };
        let Some(mut id) = self.tree.find(dom) else {
            return AnchorRef::Node(self.prepared.start);
        };
        loop {
            let mut prev = self.tree.node(id).prev;
            while let Some(p) = prev {
                let pn = self.tree.node(p);
                if pn.kind != NodeKind::Absolute && !matches!(pn.content, Content::Break) {
                    return self.end_anchor_of(p);
                }
                prev = pn.prev;
            }
            match self.tree.parent(id) {
                Some(parent) if parent != self.tree.root() => id = parent,
                _ => return AnchorRef::Node(self.prepared.start),
            }
        }
    }

    fn last_content(&self) -> AnchorRef {
        self.tree
            .children(self.tree.root())
            .iter()
            .rev()
            .copied()
            .find(|&c| {
                let n = self.tree.node(c);
                n.kind != NodeKind::Absolute && !matches!(n.content, Content::Break)
            })
            .map(|c| self.end_anchor_of(c))
            .unwrap_or(AnchorRef::Node(self.prepared.end))
    }

    fn end_anchor_of(&self, id: FlowId) -> AnchorRef {
        let n = self.tree.node(id);
        match &n.content {
            Content::Text(split) if split.is_splittable() => AnchorRef::Group {
                block: n.dom,
                index: split.groups.len() - 1,
            },
            _ => AnchorRef::Node(n.dom),
        }
    }

    /// Collect the margin chains adjoining every page boundary.
    fn zero_boundary_margins(&self, plan: &mut Plan, w: &mut Walk) {
        let last = plan.pages.len();
        for page in &plan.pages {
            if page.number > 1 {
                if let AnchorRef::Node(n) = page.start {
                    self.zero_chain(n, Boundary::PageStart, &mut plan.zero_top, w);
                }
            }
            if page.number < last {
                if let AnchorRef::Node(n) = page.end {
                    self.zero_chain(n, Boundary::PageEnd, &mut plan.zero_bottom, w);
                }
            }
        }
    }

    fn zero_chain(&self, dom: NodeId, boundary: Boundary, out: &mut Vec<NodeId>, w: &mut Walk) {
        let Some(id) = self.tree.find(dom) else {
            return;
        };
        match self.collapse.resolve(id, boundary) {
            Ok(_) => {}
            Err(PagedError::Unsupported { node, reason }) => {
                log::debug!("unsupported boundary at {node}: {reason}");
                w.unsupported.push((node, reason));
            }
            Err(e) => w.warnings.push(e.to_string()),
        }
        let chain = match boundary {
            Boundary::PageEnd => self.collapse.bottom_chain(id),
            _ => self.collapse.top_chain(id),
        };
        for c in chain {
            let dom = self.tree.node(c).dom;
            if !out.contains(&dom) {
                out.push(dom);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_html, Document};
    use crate::flow::prepare;
    use crate::fonts::FontManager;
    use crate::layout::TaffyHost;
    use crate::text_block::{InclusiveFit, SplitConfig, TextBlockSplitter};

    fn plan_for(html: &str, body_height: f32) -> (Document, Prepared, Plan) {
        let mut doc = parse_html(html);
        let prepared = prepare(&mut doc);
        let surface = TaffyHost::default().layout(&doc, prepared.content_flow, 400.0).unwrap();
        let fonts = FontManager::default();
        let splitter = TextBlockSplitter::new(&doc, &surface, &fonts, SplitConfig::default());
        let tree = FlowTree::build(&doc, &surface, &splitter, prepared.content_flow);
        let plan = Partitioner::new(&tree, &InclusiveFit, body_height, prepared).run();
        (doc, prepared, plan)
    }

    fn block(h: u32) -> String {
        format!(r#"<div style="height: {h}px"></div>"#)
    }

    fn by_id(doc: &Document, id: &str) -> NodeId {
        doc.elements_with_attr("id", Some(id))[0]
    }

    #[test]
    fn exact_fit_stays_on_one_page() {
        let html = format!("<body>{}{}</body>", block(60), block(40));
        let (doc, prepared, plan) = plan_for(&html, 100.0);
        assert_eq!(plan.page_count(), 1);
        assert_eq!(plan.pages[0].start, AnchorRef::Node(prepared.start));
        let divs = doc.elements_by_name("div");
        assert_eq!(plan.pages[0].end, AnchorRef::Node(divs[1]));
        assert!(plan.success());
    }

    #[test]
    fn overflowing_box_opens_a_page() {
        let html = format!("<body>{}{}{}</body>", block(60), block(50), block(30));
        let (doc, _, plan) = plan_for(&html, 100.0);
        let divs = doc.elements_by_name("div");
        assert_eq!(plan.page_count(), 2);
        assert_eq!(plan.pages[0].end, AnchorRef::Node(divs[0]));
        assert_eq!(plan.pages[1].start, AnchorRef::Node(divs[1]));
        assert_eq!(plan.pages[1].end, AnchorRef::Node(divs[2]));
        assert_eq!(plan.zero_top, vec![divs[1]]);
        assert_eq!(plan.zero_bottom, vec![divs[0]]);
    }

    #[test]
    fn start_anchor_is_promoted_to_the_opened_container() {
        let html = format!(
            r#"<body>{}<section style="padding-top: 4px">{}{}</section></body>"#,
            block(90),
            block(50),
            block(50)
        );
        let (doc, _, plan) = plan_for(&html, 100.0);
        let section = doc.first_element_by_name("section").unwrap();
        assert_eq!(plan.page_count(), 3);
        assert_eq!(plan.pages[1].start, AnchorRef::Node(section));
    }

    #[test]
    fn forced_breaks_need_content_on_both_sides() {
        let brk = "<paged-page-break></paged-page-break>";
        let html = format!("<body>{brk}{}{brk}{}{brk}</body>", block(10), block(10));
        let (_, _, plan) = plan_for(&html, 100.0);
        assert_eq!(plan.page_count(), 2);

        let html = format!(
            r#"<body>{}<div style="break-before: page; height: 5px"></div></body>"#,
            block(10)
        );
        let (_, _, plan) = plan_for(&html, 100.0);
        assert_eq!(plan.page_count(), 2);
    }

    #[test]
    fn oversized_box_overflows_alone() {
        let html = format!("<body>{}{}</body>", block(10), block(150));
        let (_, _, plan) = plan_for(&html, 100.0);
        assert_eq!(plan.page_count(), 2);
        assert_eq!(plan.warnings.len(), 1);
        assert!(plan.success());
    }

    #[test]
    fn text_groups_follow_the_budget() {
        let html =
            r#"<body><p style="line-height: 20px; margin: 0">a<br>b<br>c<br>d<br>e<br>f</p></body>"#;
        let (doc, _, plan) = plan_for(html, 60.0);
        let p = doc.first_element_by_name("p").unwrap();
        assert_eq!(plan.page_count(), 2);
        assert_eq!(plan.text_blocks.len(), 1);
        assert_eq!(plan.text_blocks[0].group_pages, vec![1, 1, 2, 2]);
        assert_eq!(plan.pages[1].start, AnchorRef::Group { block: p, index: 2 });
        assert_eq!(plan.pages[0].end, AnchorRef::Group { block: p, index: 1 });
        assert_eq!(plan.pages[1].end, AnchorRef::Group { block: p, index: 3 });
    }

    #[test]
    fn single_oversized_line_is_unsupported() {
        let html = r#"<body><p style="line-height: 150px; margin: 0">tall</p></body>"#;
        let (_, _, plan) = plan_for(html, 100.0);
        assert_eq!(plan.page_count(), 1);
        assert!(!plan.success());
        assert_eq!(plan.unsupported[0].1, UnsupportedReason::OversizedLine);
    }

    #[test]
    fn breaks_inside_a_fitting_container_are_honoured() {
        let html = format!(
            "<body><div>{}<paged-page-break></paged-page-break>{}</div></body>",
            block(10),
            block(10)
        );
        let (doc, _, plan) = plan_for(&html, 100.0);
        let divs = doc.elements_by_name("div");
        assert_eq!(plan.page_count(), 2);
        assert_eq!(plan.pages[0].end, AnchorRef::Node(divs[1]));
        assert_eq!(plan.pages[1].start, AnchorRef::Node(divs[2]));

        let html = format!(
            r#"<body><section>{}<div id="next" style="break-before: page; height: 10px"></div></section></body>"#,
            block(10)
        );
        let (doc, _, plan) = plan_for(&html, 100.0);
        assert_eq!(plan.page_count(), 2);
        assert_eq!(plan.pages[1].start, AnchorRef::Node(by_id(&doc, "next")));
    }

    #[test]
    fn margin_kept_inside_a_split_container_counts() {
        let html = format!(
            r#"<body><div style="padding-bottom: 1px">{}<div style="height: 40px; margin-bottom: 30px"></div></div><div id="tail" style="height: 15px"></div></body>"#,
            block(40)
        );
        let (doc, _, plan) = plan_for(&html, 100.0);
        assert_eq!(plan.page_count(), 2);
        assert_eq!(plan.pages[1].start, AnchorRef::Node(by_id(&doc, "tail")));
    }

    #[test]
    fn heading_follows_the_box_after_it() {
        let html = format!(
            r#"<body>{}<h2 style="margin: 0; height: 10px">Title</h2>{}</body>"#,
            block(80),
            block(20)
        );
        let (doc, _, plan) = plan_for(&html, 100.0);
        let h2 = doc.first_element_by_name("h2").unwrap();
        let divs = doc.elements_by_name("div");
        assert_eq!(plan.page_count(), 2);
        assert_eq!(plan.pages[0].end, AnchorRef::Node(divs[0]));
        assert_eq!(plan.pages[1].start, AnchorRef::Node(h2));
        assert_eq!(plan.zero_top, vec![h2]);

        // A plain box stays behind.
        let html = format!("<body>{}{}{}</body>", block(80), block(10), block(20));
        let (doc, _, plan) = plan_for(&html, 100.0);
        let divs = doc.elements_by_name("div");
        assert_eq!(plan.pages[1].start, AnchorRef::Node(divs[2]));
    }

    #[test]
    fn heading_alone_on_a_page_does_not_move() {
        let html = format!(
            r#"<body><h2 style="margin: 20px 0 0; height: 10px">Title</h2>{}</body>"#,
            block(75)
        );
        let (doc, _, plan) = plan_for(&html, 100.0);
        let divs = doc.elements_by_name("div");
        assert_eq!(plan.page_count(), 2);
        assert_eq!(plan.pages[1].start, AnchorRef::Node(divs[0]));
    }

    // Page 2 opens at `#p` in each layout below, and the chain zeroed there
    // must skip or stop at its first child.

    #[test]
    fn boundary_chain_skips_a_leading_float() {
        let html = format!(
            r#"<body>{}<div id="p"><div id="f" style="float: left; height: 30px"></div><div id="q" style="height: 30px"></div></div></body>"#,
            block(80)
        );
        let (doc, _, plan) = plan_for(&html, 100.0);
        let p = by_id(&doc, "p");
        assert_eq!(plan.pages[1].start, AnchorRef::Node(p));
        assert!(plan.zero_top.contains(&p));
        assert!(plan.zero_top.contains(&by_id(&doc, "q")));
        assert!(!plan.zero_top.contains(&by_id(&doc, "f")));
        assert_eq!(plan.zero_bottom, vec![doc.elements_by_name("div")[0]]);
    }

    #[test]
    fn boundary_chain_skips_a_leading_absolute_box() {
        let html = format!(
            r#"<body>{}<div id="p"><div id="a" style="position: absolute; height: 30px"></div><div id="q" style="height: 30px"></div></div></body>"#,
            block(80)
        );
        let (doc, _, plan) = plan_for(&html, 100.0);
        let p = by_id(&doc, "p");
        assert_eq!(plan.pages[1].start, AnchorRef::Node(p));
        assert!(plan.zero_top.contains(&p));
        assert!(plan.zero_top.contains(&by_id(&doc, "q")));
        assert!(!plan.zero_top.contains(&by_id(&doc, "a")));
    }

    #[test]
    fn boundary_chain_stops_at_an_inline_wrapper() {
        let html = format!(
            r#"<body>{}<div id="p"><span id="s">words</span><div id="q" style="height: 30px"></div></div></body>"#,
            block(95)
        );
        let (doc, _, plan) = plan_for(&html, 100.0);
        let p = by_id(&doc, "p");
        let wrapper = doc.first_element_by_name(crate::flow::COMPLEX_TEXT_BLOCK).unwrap();
        assert_eq!(plan.pages[1].start, AnchorRef::Node(p));
        assert_eq!(plan.zero_top, vec![p]);
        assert!(!plan.zero_top.contains(&wrapper));
        assert!(!plan.zero_top.contains(&by_id(&doc, "s")));
        assert!(!plan.zero_top.contains(&by_id(&doc, "q")));
    }

    #[test]
    fn boundary_chain_stops_at_a_cleared_box() {
        let html = format!(
            r#"<body>{}<div id="p"><div id="c" style="clear: both; height: 30px"></div><div id="q" style="height: 10px"></div></div></body>"#,
            block(80)
        );
        let (doc, _, plan) = plan_for(&html, 100.0);
        let p = by_id(&doc, "p");
        assert_eq!(plan.pages[1].start, AnchorRef::Node(p));
        assert_eq!(plan.zero_top, vec![p]);
        assert!(!plan.zero_top.contains(&by_id(&doc, "c")));
    }
}
