//! Text block splitter – breaks the inline content of a block into lines and
//! coalesces the lines into groups that always travel to a page together.
//!
//! Grouping is orphan/widow control: the first `min_leading_lines` lines form
//! one group, the last `min_trailing_lines` another, every line in between is
//! a group of its own. Blocks shorter than `min_breakable_lines` are one group.
//!
//! Lines keep enough provenance (`Fragment`s pointing back at text byte ranges
//! and inline nodes) for the annotator to rebuild the block group by group.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::dom::{Document, NodeId};
use crate::fonts::FontManager;
use crate::layout::inline_box_size;
use crate::style::{ComputedStyle, Display, StyleMap};
use crate::surface::Surface;

const EPSILON: f32 = 0.01;

/// Line grouping knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub min_leading_lines: usize,
    pub min_trailing_lines: usize,
    pub min_breakable_lines: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            min_leading_lines: 2,
            min_trailing_lines: 2,
            min_breakable_lines: 4,
        }
    }
}

// ---------------------------------------------------------------------------
// Lines and groups
// ---------------------------------------------------------------------------

/// A piece of the block's DOM that sits on one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Byte range of a text node.
    Text { node: NodeId, start: usize, end: usize },
    /// An inline node carried whole: atomic box, `<br>`, comment, or an
    /// inline element with no content of its own.
    Inline { node: NodeId },
}

impl Fragment {
    pub fn node(&self) -> NodeId {
        match self {
            Fragment::Text { node, .. } | Fragment::Inline { node } => *node,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub index: usize,
    pub width: f32,
    pub height: f32,
    pub fragments: Vec<Fragment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextGroup {
    pub index: usize,
    pub lines: Range<usize>,
    pub height: f32,
    /// The inline wrapper owning every line of the group, if there is one.
    pub standalone: Option<NodeId>,
}

impl TextGroup {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// A block after line breaking and grouping.
#[derive(Debug, Clone)]
pub struct SplitBlock {
    pub block: NodeId,
    pub lines: Vec<TextLine>,
    pub groups: Vec<TextGroup>,
}

impl SplitBlock {
    pub fn is_splittable(&self) -> bool {
        self.groups.len() > 1
    }
}

// ---------------------------------------------------------------------------
// Inline classification
// ---------------------------------------------------------------------------

/// How a child takes part in its parent's formatting context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineRole {
    Inline,
    Block,
    /// Whitespace, comments and non-rendered elements: go with either.
    Neutral,
}

pub fn inline_role(doc: &Document, styles: &StyleMap, id: NodeId) -> InlineRole {
    if let Some(t) = doc.text(id) {
        return if is_blank(t) {
            InlineRole::Neutral
        } else {
            InlineRole::Inline
        };
    }
    if doc.is_comment(id) {
        return InlineRole::Neutral;
    }
    let Some(style) = styles.get(id) else {
        return InlineRole::Neutral;
    };
    if style.display == Display::None || doc.tag(id).map(|t| t.is_non_rendered()).unwrap_or(false) {
        InlineRole::Neutral
    } else if style.is_floated() || style.is_out_of_flow() || !style.is_inline_level() {
        InlineRole::Block
    } else {
        InlineRole::Inline
    }
}

/// A block container whose children are all inline content.
pub fn is_text_block(doc: &Document, styles: &StyleMap, id: NodeId) -> bool {
    match styles.get(id) {
        Some(s) if s.display != Display::None && !s.is_inline_level() => {}
        _ => return false,
    }
    let mut any_inline = false;
    for &c in doc.children(id) {
        match inline_role(doc, styles, c) {
            InlineRole::Block => return false,
            InlineRole::Inline => any_inline = true,
            InlineRole::Neutral => {}
        }
    }
    any_inline
}

fn is_blank(text: &str) -> bool {
    text.chars().all(|c| c.is_ascii_whitespace())
}

// ---------------------------------------------------------------------------
// Line breaking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum ItemKind {
    Word { start: usize, hard_break_after: bool },
    Space,
    Atomic,
    Break,
}

#[derive(Debug, Clone)]
struct Item {
    node: NodeId,
    kind: ItemKind,
    width: f32,
    height: f32,
    space_before: f32,
    line: usize,
}

struct Collector<'a> {
    doc: &'a Document,
    styles: &'a StyleMap,
    fonts: &'a FontManager,
    max_width: f32,
    items: Vec<Item>,
    pending_space: bool,
}

impl<'a> Collector<'a> {
    fn push(&mut self, node: NodeId, kind: ItemKind, width: f32, height: f32, space: f32) {
        let space_before = if self.pending_space { space } else { 0.0 };
        self.items.push(Item {
            node,
            kind,
            width,
            height,
            space_before,
            line: 0,
        });
    }

    fn measure(&self, style: &ComputedStyle, text: &str) -> f32 {
        self.fonts.measure_text_width(
            text,
            style.font_size,
            style.is_bold(),
            style.is_italic(),
            &style.font_family,
        )
    }

    fn collect(&mut self, parent: NodeId) {
        let children = self.doc.children(parent).to_vec();
        for child in children {
            if let Some(text) = self.doc.text(child) {
                self.collect_text(child, text);
                continue;
            }
            if self.doc.is_comment(child) {
                self.push(child, ItemKind::Atomic, 0.0, 0.0, 0.0);
                continue;
            }
            let style = match self.styles.get(child) {
                Some(s) if s.display != Display::None => s,
                _ => {
                    self.push(child, ItemKind::Atomic, 0.0, 0.0, 0.0);
                    continue;
                }
            };
            if self.doc.is(child, "br") {
                let lh = style.line_height_px();
                self.push(child, ItemKind::Break, 0.0, lh, 0.0);
                self.pending_space = false;
            } else if style.display == Display::InlineBlock || self.doc.is(child, "img") {
                let (w, h) = inline_box_size(self.doc, style, child, self.max_width);
                let space = self.measure(style, " ");
                self.push(child, ItemKind::Atomic, w, h, space);
                self.pending_space = false;
            } else {
                let before = self.items.len();
                self.collect(child);
                if self.items.len() == before {
                    self.push(child, ItemKind::Atomic, 0.0, 0.0, 0.0);
                }
            }
        }
    }

    fn collect_text(&mut self, node: NodeId, text: &str) {
        let style = self.styles.effective(self.doc, node).clone();
        let lh = style.line_height_px();
        let space = self.measure(&style, " ");

        if style.white_space_pre {
            let mut start = 0;
            let segments: Vec<&str> = text.split('\n').collect();
            let last = segments.len() - 1;
            for (i, seg) in segments.iter().enumerate() {
                let w = self.measure(&style, seg);
                self.pending_space = false;
                self.push(
                    node,
                    ItemKind::Word {
                        start,
                        hard_break_after: i < last,
                    },
                    w,
                    lh,
                    0.0,
                );
                start += seg.len() + 1;
            }
            return;
        }

        let spans = word_spans(text);
        if spans.is_empty() {
            self.push(node, ItemKind::Space, 0.0, 0.0, 0.0);
            if !text.is_empty() {
                self.pending_space = true;
            }
            return;
        }
        let mut prev_end = 0;
        for (start, end) in spans {
            if start > prev_end {
                self.pending_space = true;
            }
            let w = self.measure(&style, &text[start..end]);
            self.push(
                node,
                ItemKind::Word {
                    start,
                    hard_break_after: false,
                },
                w,
                lh,
                space,
            );
            self.pending_space = false;
            prev_end = end;
        }
        if prev_end < text.len() {
            self.pending_space = true;
        }
    }
}

/// Byte spans of whitespace-separated words.
fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        if c.is_ascii_whitespace() {
            if let Some(s) = start.take() {
                spans.push((s, i));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}

struct LineBox {
    width: f32,
    height: f32,
}

/// Greedy line assignment. Returns the line boxes and writes each item's line.
fn assign_lines(items: &mut [Item], max_width: f32, strut: f32) -> Vec<LineBox> {
    let mut lines = Vec::new();
    let mut width = 0.0f32;
    let mut height = strut;
    let mut has_content = false;

    fn close(
        lines: &mut Vec<LineBox>,
        width: &mut f32,
        height: &mut f32,
        has_content: &mut bool,
        strut: f32,
    ) {
        lines.push(LineBox {
            width: *width,
            height: *height,
        });
        *width = 0.0;
        *height = strut;
        *has_content = false;
    }

    for item in items.iter_mut() {
        match item.kind {
            ItemKind::Word { hard_break_after, .. } => {
                let mut advance = if has_content { item.space_before } else { 0.0 } + item.width;
                if has_content && width + advance > max_width + EPSILON {
                    close(&mut lines, &mut width, &mut height, &mut has_content, strut);
                    advance = item.width;
                }
                item.line = lines.len();
                width += advance;
                height = height.max(item.height);
                has_content = true;
                if hard_break_after {
                    close(&mut lines, &mut width, &mut height, &mut has_content, strut);
                }
            }
            ItemKind::Atomic => {
                let sized = item.width > 0.0 || item.height > 0.0;
                let mut advance = if has_content { item.space_before } else { 0.0 } + item.width;
                if sized && has_content && width + advance > max_width + EPSILON {
                    close(&mut lines, &mut width, &mut height, &mut has_content, strut);
                    advance = item.width;
                }
                item.line = lines.len();
                if sized {
                    width += advance;
                    height = height.max(item.height);
                    has_content = true;
                }
            }
            ItemKind::Space => item.line = lines.len(),
            ItemKind::Break => {
                item.line = lines.len();
                height = height.max(item.height);
                close(&mut lines, &mut width, &mut height, &mut has_content, strut);
            }
        }
    }

    if has_content {
        close(&mut lines, &mut width, &mut height, &mut has_content, strut);
    } else {
        // Trailing zero-size items ride on the last real line.
        let open = lines.len();
        let fallback = open.saturating_sub(1);
        for item in items.iter_mut().filter(|i| i.line == open) {
            item.line = fallback;
        }
    }
    lines
}

/// Break the inline content of `block` into lines at most `max_width` wide.
pub fn break_lines(
    doc: &Document,
    styles: &StyleMap,
    fonts: &FontManager,
    block: NodeId,
    max_width: f32,
) -> Vec<TextLine> {
    let strut = styles.effective(doc, block).line_height_px();
    let mut collector = Collector {
        doc,
        styles,
        fonts,
        max_width,
        items: Vec::new(),
        pending_space: false,
    };
    collector.collect(block);
    let mut items = collector.items;
    let boxes = assign_lines(&mut items, max_width, strut);
    if boxes.is_empty() {
        return Vec::new();
    }

    let mut lines: Vec<TextLine> = boxes
        .iter()
        .enumerate()
        .map(|(index, b)| TextLine {
            index,
            width: b.width,
            height: b.height,
            fragments: Vec::new(),
        })
        .collect();

    // Slice text nodes at the first word of every new line so the pieces
    // concatenate back to the original text.
    let mut open: Option<(NodeId, usize, usize)> = None;
    for item in &items {
        let text_len = doc.text(item.node).map(str::len).unwrap_or(0);
        match item.kind {
            ItemKind::Word { start, .. } => match open {
                Some((node, line, _)) if node == item.node && line == item.line => {}
                Some((node, line, frag)) if node == item.node => {
                    if let Fragment::Text { end, .. } = &mut lines[line].fragments[frag] {
                        *end = start;
                    }
                    let frags = &mut lines[item.line].fragments;
                    frags.push(Fragment::Text {
                        node: item.node,
                        start,
                        end: text_len,
                    });
                    open = Some((item.node, item.line, frags.len() - 1));
                }
                _ => {
                    let frags = &mut lines[item.line].fragments;
                    frags.push(Fragment::Text {
                        node: item.node,
                        start: 0,
                        end: text_len,
                    });
                    open = Some((item.node, item.line, frags.len() - 1));
                }
            },
            ItemKind::Space => {
                lines[item.line].fragments.push(Fragment::Text {
                    node: item.node,
                    start: 0,
                    end: text_len,
                });
                open = None;
            }
            ItemKind::Atomic | ItemKind::Break => {
                lines[item.line].fragments.push(Fragment::Inline { node: item.node });
                open = None;
            }
        }
    }
    lines
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Coalesce lines into placement groups.
pub fn group_lines(
    doc: &Document,
    block: NodeId,
    lines: &[TextLine],
    config: &SplitConfig,
) -> Vec<TextGroup> {
    let n = lines.len();
    if n == 0 {
        return Vec::new();
    }
    let lead = config.min_leading_lines.max(1);
    let trail = config.min_trailing_lines.max(1);

    let ranges: Vec<Range<usize>> = if n < config.min_breakable_lines || lead + trail > n {
        vec![0..n]
    } else {
        let mut r = vec![0..lead];
        r.extend((lead..n - trail).map(|i| i..i + 1));
        r.push(n - trail..n);
        r
    };

    ranges
        .into_iter()
        .enumerate()
        .map(|(index, range)| TextGroup {
            index,
            height: lines[range.clone()].iter().map(|l| l.height).sum(),
            standalone: standalone_wrapper(doc, block, &lines[range.clone()]),
            lines: range,
        })
        .collect()
}

/// The single inline element (a direct child of `block`) that owns every
/// visible fragment of `lines`.
fn standalone_wrapper(doc: &Document, block: NodeId, lines: &[TextLine]) -> Option<NodeId> {
    let mut owner: Option<NodeId> = None;
    for frag in lines.iter().flat_map(|l| &l.fragments) {
        let node = frag.node();
        let invisible = doc.is(node, "br")
            || doc.is_comment(node)
            || doc.text(node).map(is_blank).unwrap_or(false);
        if invisible {
            continue;
        }
        let mut top = node;
        while let Some(p) = doc.parent(top) {
            if p == block {
                break;
            }
            top = p;
        }
        match owner {
            None => owner = Some(top),
            Some(o) if o == top => {}
            Some(_) => return None,
        }
    }
    owner.filter(|&o| doc.element(o).is_some())
}

// ---------------------------------------------------------------------------
// Splitter and placement
// ---------------------------------------------------------------------------

/// Breaks and groups text blocks against resolved geometry.
pub struct TextBlockSplitter<'a> {
    doc: &'a Document,
    surface: &'a dyn Surface,
    fonts: &'a FontManager,
    config: SplitConfig,
}

impl<'a> TextBlockSplitter<'a> {
    pub fn new(
        doc: &'a Document,
        surface: &'a dyn Surface,
        fonts: &'a FontManager,
        config: SplitConfig,
    ) -> Self {
        Self {
            doc,
            surface,
            fonts,
            config,
        }
    }

    pub fn split(&self, block: NodeId) -> SplitBlock {
        let edges = self.surface.style(block).map(|s| s.horizontal_edges()).unwrap_or(0.0);
        let width = self
            .surface
            .geometry(block)
            .map(|g| (g.width - edges).max(0.0))
            .unwrap_or(0.0);
        let lines = break_lines(self.doc, self.surface.styles(), self.fonts, block, width);
        let groups = group_lines(self.doc, block, &lines, &self.config);
        log::debug!(
            "split {block}: {} lines into {} groups",
            lines.len(),
            groups.len()
        );
        SplitBlock { block, lines, groups }
    }
}

/// Decides whether content of a given height fits a budget.
pub trait FitPolicy {
    fn fits(&self, needed: f32, budget: f32) -> bool;
}

/// Exact equality fits.
#[derive(Debug, Clone, Copy, Default)]
pub struct InclusiveFit;

impl FitPolicy for InclusiveFit {
    fn fits(&self, needed: f32, budget: f32) -> bool {
        needed <= budget + EPSILON
    }
}

/// Exact equality overflows.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictFit;

impl FitPolicy for StrictFit {
    fn fits(&self, needed: f32, budget: f32) -> bool {
        needed + EPSILON < budget
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Number of leading groups placed on the current page.
    pub placed: usize,
    /// The single placed group is taller than the page.
    pub overflow: bool,
}

/// Place the longest prefix of `groups` whose total height fits `budget`.
/// On an empty page at least one group is placed, overflowing if it must.
pub fn place_groups(
    groups: &[TextGroup],
    budget: f32,
    page_empty: bool,
    policy: &dyn FitPolicy,
) -> Placement {
    let mut used = 0.0;
    let mut placed = 0;
    for g in groups {
        if !policy.fits(used + g.height, budget) {
            break;
        }
        used += g.height;
        placed += 1;
    }
    if placed == 0 && page_empty && !groups.is_empty() {
        return Placement {
            placed: 1,
            overflow: true,
        };
    }
    Placement {
        placed,
        overflow: false,
    }
}
