//! Margin collapse resolver.
//!
//! Computes the vertical gap between adjacent boxes the way CSS collapses
//! block margins, and the chains of margins that adjoin a page boundary and
//! must be forced to zero there.

use crate::error::{PagedError, Result, UnsupportedReason};
use crate::flow::{Content, FlowId, FlowTree, NodeKind};
use crate::style::Dimension;

/// Where a node sits relative to a page boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    None,
    PageStart,
    PageEnd,
}

/// Effective margins of one node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MarginResolution {
    pub top: f32,
    pub bottom: f32,
    pub zero_top: bool,
    pub zero_bottom: bool,
}

/// Collapse a set of adjoining margins: the largest positive margin minus the
/// largest magnitude among the negative ones.
pub fn collapse_margins(margins: &[f32]) -> f32 {
    let max_pos = margins.iter().copied().filter(|&m| m > 0.0).fold(0.0, f32::max);
    let max_neg = margins.iter().copied().filter(|&m| m < 0.0).map(f32::abs).fold(0.0, f32::max);
    max_pos - max_neg
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Top,
    Bottom,
}

pub struct CollapseResolver<'a> {
    tree: &'a FlowTree,
}

impl<'a> CollapseResolver<'a> {
    pub fn new(tree: &'a FlowTree) -> Self {
        Self { tree }
    }

    /// `node` followed by the descendants whose top margins collapse with it.
    pub fn top_chain(&self, node: FlowId) -> Vec<FlowId> {
        self.chain(node, Side::Top)
    }

    /// `node` followed by the descendants whose bottom margins collapse with it.
    pub fn bottom_chain(&self, node: FlowId) -> Vec<FlowId> {
        self.chain(node, Side::Bottom)
    }

    fn chain(&self, node: FlowId, side: Side) -> Vec<FlowId> {
        let mut chain = vec![node];
        let mut cur = node;
        loop {
            let n = self.tree.node(cur);
            let s = &n.style;
            let blocked = match side {
                Side::Top => s.top_edge() > 0.0,
                Side::Bottom => s.bottom_edge() > 0.0 || matches!(s.height, Dimension::Px(_)),
            };
            if blocked || s.establishes_bfc() || !matches!(n.content, Content::Container) {
                break;
            }
            let next = match side {
                Side::Top => self.tree.first_in_flow_child(cur),
                Side::Bottom => self.tree.last_in_flow_child(cur),
            };
            let Some(child) = next else {
                break;
            };
            let kind = self.tree.node(child).kind;
            let clears = matches!(side, Side::Top) && kind == NodeKind::Clear;
            if kind == NodeKind::StandaloneInline || clears {
                break;
            }
            chain.push(child);
            cur = child;
        }
        chain
    }

    fn collapsed(&self, chain: &[FlowId], side: Side) -> f32 {
        let margins: Vec<f32> = chain
            .iter()
            .map(|&c| {
                let s = &self.tree.node(c).style;
                match side {
                    Side::Top => s.margin_top,
                    Side::Bottom => s.margin_bottom,
                }
            })
            .collect();
        collapse_margins(&margins)
    }

    /// Vertical space between the previous in-flow box (or the parent's
    /// content edge) and the border box of `node`.
    pub fn gap_before(&self, node: FlowId) -> f32 {
        let n = self.tree.node(node);
        match n.kind {
            NodeKind::Float => return n.style.margin_top,
            NodeKind::Absolute | NodeKind::StandaloneInline => return 0.0,
            _ => {}
        }
        let own = self.top_chain(node);

        match self.tree.prev_in_flow(node) {
            Some(prev) => {
                let above = self.bottom_chain(prev);
                if n.kind == NodeKind::Clear {
                    return self.collapsed(&above, Side::Bottom) + self.collapsed(&own, Side::Top);
                }
                let mut margins: Vec<f32> = above
                    .iter()
                    .map(|&c| self.tree.node(c).style.margin_bottom)
                    .collect();
                margins.extend(own.iter().map(|&c| self.tree.node(c).style.margin_top));
                collapse_margins(&margins)
            }
            None => {
                let folded_into_parent = n
                    .parent
                    .map(|p| self.top_chain(p).contains(&node))
                    .unwrap_or(false);
                if folded_into_parent {
                    0.0
                } else {
                    self.collapsed(&own, Side::Top)
                }
            }
        }
    }

    /// Bottom margin of the last in-flow child of `node` that stays inside
    /// it instead of collapsing through its bottom edge.
    pub fn trailing_margin(&self, node: FlowId) -> f32 {
        match self.tree.last_in_flow_child(node) {
            Some(last) if !self.bottom_chain(node).contains(&last) => {
                self.collapsed(&self.bottom_chain(last), Side::Bottom)
            }
            _ => 0.0,
        }
    }

    /// Effective margins of `node` at `boundary`. At a page start the top
    /// chain is zeroed, at a page end the bottom chain.
    pub fn resolve(&self, node: FlowId, boundary: Boundary) -> Result<MarginResolution> {
        let n = self.tree.node(node);
        let mut r = if n.kind == NodeKind::Float {
            MarginResolution {
                top: n.style.margin_top,
                bottom: n.style.margin_bottom,
                ..Default::default()
            }
        } else {
            MarginResolution {
                top: self.collapsed(&self.top_chain(node), Side::Top),
                bottom: self.collapsed(&self.bottom_chain(node), Side::Bottom),
                ..Default::default()
            }
        };
        match boundary {
            Boundary::None => {}
            Boundary::PageStart => {
                self.check_boundary_chain(&self.top_chain(node), Side::Top)?;
                r.top = 0.0;
                r.zero_top = true;
            }
            Boundary::PageEnd => {
                self.check_boundary_chain(&self.bottom_chain(node), Side::Bottom)?;
                r.bottom = 0.0;
                r.zero_bottom = true;
            }
        }
        Ok(r)
    }

    /// Boxes whose position depends on the margins we are about to zero.
    fn check_boundary_chain(&self, chain: &[FlowId], side: Side) -> Result<()> {
        for &c in chain {
            let n = self.tree.node(c);
            let s = &n.style;
            let reason = if s.has_vertical_offset() {
                Some(UnsupportedReason::RelativeOffset)
            } else if s.transform {
                Some(UnsupportedReason::Transform)
            } else {
                let (margin, parent_edge) = match (side, n.parent) {
                    (Side::Top, Some(p)) => (s.margin_top, self.tree.node(p).style.top_edge()),
                    (Side::Bottom, Some(p)) => {
                        (s.margin_bottom, self.tree.node(p).style.bottom_edge())
                    }
                    (_, None) => (0.0, 0.0),
                };
                (margin < 0.0 && parent_edge > 0.0)
                    .then_some(UnsupportedReason::NegativeMarginCompensation)
            };
            if let Some(reason) = reason {
                return Err(PagedError::Unsupported { node: n.dom, reason });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_html, Document};
    use crate::flow::prepare;
    use crate::fonts::FontManager;
    use crate::layout::TaffyHost;
    use crate::text_block::{SplitConfig, TextBlockSplitter};

    fn tree_for(html: &str) -> (Document, FlowTree) {
        let mut doc = parse_html(html);
        let p = prepare(&mut doc);
        let surface = TaffyHost::default().layout(&doc, p.content_flow, 400.0).unwrap();
        let fonts = FontManager::default();
        let splitter = TextBlockSplitter::new(&doc, &surface, &fonts, SplitConfig::default());
        let tree = FlowTree::build(&doc, &surface, &splitter, p.content_flow);
        (doc, tree)
    }

    fn child(tree: &FlowTree, parent: FlowId, i: usize) -> FlowId {
        tree.children(parent)[i]
    }

    #[test]
    fn mixed_sign_margins() {
        assert_eq!(collapse_margins(&[10.0, 20.0]), 20.0);
        assert_eq!(collapse_margins(&[20.0, -5.0]), 15.0);
        assert_eq!(collapse_margins(&[-4.0, -9.0]), -9.0);
        assert_eq!(collapse_margins(&[]), 0.0);
    }

    #[test]
    fn siblings_collapse_to_the_larger_margin() {
        let (_, tree) = tree_for(
            r#"<body><div style="margin-bottom: 30px">a</div><div style="margin-top: 12px">b</div></body>"#,
        );
        let r = CollapseResolver::new(&tree);
        let second = child(&tree, tree.root(), 1);
        assert_eq!(r.gap_before(second), 30.0);
    }

    #[test]
    fn parent_padding_stops_the_chain() {
        let (_, tree) = tree_for(
            r#"<body><div style="margin-top: 5px"><p style="margin-top: 20px">a</p></div><div style="padding-top: 1px; margin-top: 5px"><p style="margin-top: 20px">b</p></div></body>"#,
        );
        let r = CollapseResolver::new(&tree);
        let open = child(&tree, tree.root(), 0);
        let padded = child(&tree, tree.root(), 1);
        assert_eq!(r.top_chain(open).len(), 2);
        assert_eq!(r.top_chain(padded).len(), 1);
        assert_eq!(r.gap_before(child(&tree, open, 0)), 0.0);
        assert_eq!(r.gap_before(child(&tree, padded, 0)), 20.0);
        assert_eq!(r.resolve(open, Boundary::None).unwrap().top, 20.0);
    }

    #[test]
    fn clear_and_float_do_not_collapse() {
        let (_, tree) = tree_for(
            r#"<body><div style="margin-bottom: 10px">a</div><div style="clear: both; margin-top: 6px">b</div><div style="float: left; margin-top: 4px; height: 5px"></div></body>"#,
        );
        let r = CollapseResolver::new(&tree);
        assert_eq!(r.gap_before(child(&tree, tree.root(), 1)), 16.0);
        assert_eq!(r.gap_before(child(&tree, tree.root(), 2)), 4.0);
    }

    #[test]
    fn padding_keeps_the_last_margin_inside() {
        let (_, tree) = tree_for(
            r#"<body><div style="padding-bottom: 1px"><p style="margin-bottom: 30px">a</p></div><div><p style="margin-bottom: 30px">b</p></div></body>"#,
        );
        let r = CollapseResolver::new(&tree);
        assert_eq!(r.trailing_margin(child(&tree, tree.root(), 0)), 30.0);
        assert_eq!(r.trailing_margin(child(&tree, tree.root(), 1)), 0.0);
    }

    #[test]
    fn empty_blocks_are_transparent() {
        let (_, tree) = tree_for(
            r#"<body><div style="margin-bottom: 8px">a</div><p style="margin: 50px 0"></p><div style="margin-top: 3px">b</div></body>"#,
        );
        let r = CollapseResolver::new(&tree);
        assert_eq!(r.gap_before(child(&tree, tree.root(), 2)), 8.0);
    }

    #[test]
    fn boundary_zeroes_and_flags() {
        let (_, tree) = tree_for(r#"<body><div style="margin: 9px 0">a</div></body>"#);
        let r = CollapseResolver::new(&tree);
        let div = child(&tree, tree.root(), 0);
        let start = r.resolve(div, Boundary::PageStart).unwrap();
        assert!(start.zero_top && !start.zero_bottom);
        assert_eq!((start.top, start.bottom), (0.0, 9.0));
        let end = r.resolve(div, Boundary::PageEnd).unwrap();
        assert!(end.zero_bottom && !end.zero_top);
    }

    #[test]
    fn offsets_at_a_boundary_are_unsupported() {
        let (_, tree) = tree_for(
            r#"<body><div style="position: relative; top: 4px">a</div><div style="border-top: 1px solid"><p style="margin-top: -6px">b</p></div></body>"#,
        );
        let r = CollapseResolver::new(&tree);
        let shifted = child(&tree, tree.root(), 0);
        assert!(matches!(
            r.resolve(shifted, Boundary::PageStart),
            Err(PagedError::Unsupported {
                reason: UnsupportedReason::RelativeOffset,
                ..
            })
        ));
        assert!(r.resolve(shifted, Boundary::None).is_ok());

        let bordered = child(&tree, tree.root(), 1);
        let inner = child(&tree, bordered, 0);
        assert!(matches!(
            r.resolve(inner, Boundary::PageStart),
            Err(PagedError::Unsupported {
                reason: UnsupportedReason::NegativeMarginCompensation,
                ..
            })
        ));
    }
}
