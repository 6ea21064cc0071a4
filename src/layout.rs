//! Layout host – uses Taffy to compute block/flex/grid geometry for the
//! content flow and exposes the result through the [`Surface`] trait.
//!
//! Text blocks become Taffy leaves sized by the same line breaker the
//! splitter uses, so a block's measured height always equals the sum of its
//! line heights plus its vertical edges.

use std::cell::Cell;
use std::collections::HashMap;

use taffy::{
    AvailableSpace, LengthPercentage, LengthPercentageAuto, Rect, Size, Style, TaffyTree,
};

use crate::dom::{Document, NodeId, Tag};
use crate::error::Result;
use crate::fonts::FontManager;
use crate::style::{self, ComputedStyle, Dimension, Display, StyleMap};
use crate::surface::{BoxGeometry, Surface};
use crate::text_block::{break_lines, is_text_block};

/// Something that can turn a (prepared) content flow into resolved geometry.
pub trait LayoutHost {
    fn fonts(&self) -> &FontManager;

    /// Lay out `content_flow` at `width` and return a queryable surface.
    fn measure(&self, doc: &Document, content_flow: NodeId, width: f32) -> Result<Box<dyn Surface>>;
}

/// Geometry computed by [`TaffyHost`].
#[derive(Debug, Clone)]
pub struct LayoutTree {
    styles: StyleMap,
    boxes: HashMap<NodeId, BoxGeometry>,
    revision: u64,
}

impl LayoutTree {
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

impl Surface for LayoutTree {
    fn styles(&self) -> &StyleMap {
        &self.styles
    }

    fn geometry(&self, node: NodeId) -> Option<BoxGeometry> {
        self.boxes.get(&node).copied()
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

/// The bundled Taffy-backed host.
pub struct TaffyHost {
    fonts: FontManager,
    measurements: Cell<u64>,
}

impl TaffyHost {
    pub fn new(fonts: FontManager) -> Self {
        Self {
            fonts,
            measurements: Cell::new(0),
        }
    }

    /// Concrete variant of [`LayoutHost::measure`].
    pub fn layout(&self, doc: &Document, content_flow: NodeId, width: f32) -> Result<LayoutTree> {
        let styles = StyleMap::compute(doc, content_flow);
        let mut builder = LayoutBuilder {
            doc,
            styles: &styles,
            fonts: &self.fonts,
            taffy: TaffyTree::new(),
            dom_nodes: HashMap::new(),
        };
        builder.taffy.disable_rounding();

        let root = match builder.build(content_flow, width)? {
            Some(root) => root,
            None => builder.taffy.new_leaf(Style::default())?,
        };
        builder.taffy.compute_layout(
            root,
            Size {
                width: AvailableSpace::Definite(width),
                height: AvailableSpace::MaxContent,
            },
        )?;

        let mut boxes = HashMap::new();
        builder.extract(root, 0.0, 0.0, &mut boxes)?;

        let revision = self.measurements.get() + 1;
        self.measurements.set(revision);
        log::debug!("measured {} boxes at {width}px (revision {revision})", boxes.len());

        Ok(LayoutTree {
            styles,
            boxes,
            revision,
        })
    }
}

impl Default for TaffyHost {
    fn default() -> Self {
        Self::new(FontManager::default())
    }
}

impl LayoutHost for TaffyHost {
    fn fonts(&self) -> &FontManager {
        &self.fonts
    }

    fn measure(
        &self,
        doc: &Document,
        content_flow: NodeId,
        width: f32,
    ) -> Result<Box<dyn Surface>> {
        Ok(Box::new(self.layout(doc, content_flow, width)?))
    }
}

// ---------------------------------------------------------------------------
// Build Taffy tree from the styled document
// ---------------------------------------------------------------------------

struct LayoutBuilder<'a> {
    doc: &'a Document,
    styles: &'a StyleMap,
    fonts: &'a FontManager,
    taffy: TaffyTree<()>,
    dom_nodes: HashMap<taffy::NodeId, NodeId>,
}

impl<'a> LayoutBuilder<'a> {
    /// Build the Taffy node for element `id` given the border-box width its
    /// containing block offers. Returns `None` for elements without a box.
    fn build(&mut self, id: NodeId, available: f32) -> Result<Option<taffy::NodeId>> {
        let (doc, styles) = (self.doc, self.styles);
        let Some(style) = styles.get(id) else {
            return Ok(None);
        };
        let non_rendered = doc.tag(id).map(Tag::is_non_rendered).unwrap_or(false);
        if style.display == Display::None || non_rendered {
            return Ok(None);
        }

        let border_box = match style.width {
            Dimension::Px(w) => w + style.horizontal_edges(),
            Dimension::Percent(p) => available * p / 100.0,
            Dimension::Auto => available - style.margin_left - style.margin_right,
        };
        let inner = (border_box - style.horizontal_edges()).max(0.0);
        let mut ts = computed_to_taffy(style, doc.tag(id));

        let node = if doc.is(id, "img") {
            let (w, h) = inline_box_size(doc, style, id, available);
            ts.size = Size {
                width: taffy::Dimension::Length(w),
                height: taffy::Dimension::Length(h),
            };
            self.taffy.new_leaf(ts)?
        } else if style.is_inline_level() || is_text_block(doc, styles, id) {
            let lines = break_lines(doc, styles, self.fonts, id, inner);
            if matches!(style.height, Dimension::Auto) {
                let content: f32 = lines.iter().map(|l| l.height).sum();
                let edges = style.top_edge() + style.bottom_edge();
                ts.size.height = taffy::Dimension::Length(content + edges);
            }
            self.taffy.new_leaf(ts)?
        } else {
            let child_width = self.child_width(id, style, inner);
            let mut children = Vec::new();
            for &c in doc.children(id) {
                if doc.element(c).is_none() {
                    continue;
                }
                if let Some(child) = self.build(c, child_width)? {
                    children.push(child);
                }
            }
            self.taffy.new_with_children(ts, &children)?
        };

        self.dom_nodes.insert(node, id);
        Ok(Some(node))
    }

    /// Estimate the width each child gets, so text is broken to the right
    /// column width before Taffy runs.
    fn child_width(&self, id: NodeId, style: &ComputedStyle, inner: f32) -> f32 {
        let columns = match style.display {
            Display::Flex if style.flex_direction == style::FlexDirection::Row => {
                self.element_children(id)
            }
            Display::TableRow => self.element_children(id),
            Display::Grid => style.grid_columns.max(1),
            _ => 1,
        };
        if columns <= 1 {
            return inner;
        }
        let gaps = style.gap * (columns - 1) as f32;
        ((inner - gaps) / columns as f32).max(1.0)
    }

    fn element_children(&self, id: NodeId) -> usize {
        self.doc
            .children(id)
            .iter()
            .filter(|&&c| {
                self.styles
                    .get(c)
                    .map(|s| s.display != Display::None && !s.is_out_of_flow())
                    .unwrap_or(false)
            })
            .count()
            .max(1)
    }

    /// Collect border boxes relative to the root's top-left corner.
    fn extract(
        &self,
        node: taffy::NodeId,
        offset_x: f32,
        offset_y: f32,
        out: &mut HashMap<NodeId, BoxGeometry>,
    ) -> Result<()> {
        let layout = self.taffy.layout(node)?;
        let x = offset_x + layout.location.x;
        let y = offset_y + layout.location.y;
        if let Some(&dom) = self.dom_nodes.get(&node) {
            out.insert(
                dom,
                BoxGeometry {
                    x,
                    y,
                    width: layout.size.width,
                    height: layout.size.height,
                },
            );
        }
        for child in self.taffy.children(node)? {
            self.extract(child, x, y, out)?;
        }
        Ok(())
    }
}

fn computed_to_taffy(s: &ComputedStyle, tag: Option<&Tag>) -> Style {
    let mut ts = Style::default();

    // HTML table model maps onto flex: rows stack, cells share the row.
    match (s.display, tag) {
        (Display::Table, _) | (_, Some(Tag::Table)) => {
            ts.display = taffy::Display::Flex;
            ts.flex_direction = taffy::FlexDirection::Column;
        }
        (Display::TableRow, _) | (_, Some(Tag::Tr)) => {
            ts.display = taffy::Display::Flex;
            ts.flex_direction = taffy::FlexDirection::Row;
            ts.align_items = Some(taffy::AlignItems::Stretch);
        }
        (Display::TableCell, _) => {
            ts.display = taffy::Display::Flex;
            ts.flex_direction = taffy::FlexDirection::Column;
            ts.flex_grow = 1.0;
            ts.flex_shrink = 1.0;
            ts.flex_basis = taffy::Dimension::Length(0.0);
        }
        (Display::Flex, _) => {
            ts.display = taffy::Display::Flex;
            ts.flex_direction = match s.flex_direction {
                style::FlexDirection::Row => taffy::FlexDirection::Row,
                style::FlexDirection::Column => taffy::FlexDirection::Column,
            };
        }
        (Display::Grid, _) => {
            ts.display = taffy::Display::Grid;
            ts.grid_template_columns = vec![taffy::prelude::fr(1.0); s.grid_columns.max(1)];
        }
        // Floats have no Taffy counterpart and are stacked like blocks.
        _ => ts.display = taffy::Display::Block,
    }

    ts.position = match s.position {
        style::Position::Absolute | style::Position::Fixed => taffy::Position::Absolute,
        _ => taffy::Position::Relative,
    };
    let inset = |v: Option<f32>| match v {
        Some(px) => LengthPercentageAuto::Length(px),
        None => LengthPercentageAuto::Auto,
    };
    ts.inset = Rect {
        top: inset(s.inset_top),
        bottom: inset(s.inset_bottom),
        left: LengthPercentageAuto::Auto,
        right: LengthPercentageAuto::Auto,
    };

    // CSS sizes are content-box, Taffy's are border-box.
    ts.size = Size {
        width: dim_to_taffy(s.width, s.horizontal_edges()),
        height: dim_to_taffy(s.height, s.top_edge() + s.bottom_edge()),
    };
    ts.min_size.width = taffy::Dimension::Length(0.0);

    ts.margin = Rect {
        top: LengthPercentageAuto::Length(s.margin_top),
        right: LengthPercentageAuto::Length(s.margin_right),
        bottom: LengthPercentageAuto::Length(s.margin_bottom),
        left: LengthPercentageAuto::Length(s.margin_left),
    };
    ts.padding = Rect {
        top: LengthPercentage::Length(s.padding_top),
        right: LengthPercentage::Length(s.padding_right),
        bottom: LengthPercentage::Length(s.padding_bottom),
        left: LengthPercentage::Length(s.padding_left),
    };
    ts.border = Rect {
        top: LengthPercentage::Length(s.border_top),
        right: LengthPercentage::Length(s.border_right),
        bottom: LengthPercentage::Length(s.border_bottom),
        left: LengthPercentage::Length(s.border_left),
    };
    ts.gap = Size {
        width: LengthPercentage::Length(s.gap),
        height: LengthPercentage::Length(s.gap),
    };
    ts
}

fn dim_to_taffy(d: Dimension, edges: f32) -> taffy::Dimension {
    match d {
        Dimension::Auto => taffy::Dimension::Auto,
        Dimension::Px(v) => taffy::Dimension::Length(v + edges),
        Dimension::Percent(v) => taffy::Dimension::Percent(v / 100.0),
    }
}

// ---------------------------------------------------------------------------
// Intrinsic size of atomic inline boxes
// ---------------------------------------------------------------------------

/// Border-box size of an atomic inline (image or inline-block) as it sits on
/// a line. Images with a base64 data-URI source fall back to their intrinsic
/// pixel dimensions for any `auto` side, keeping the aspect ratio.
pub fn inline_box_size(
    doc: &Document,
    style: &ComputedStyle,
    node: NodeId,
    max_width: f32,
) -> (f32, f32) {
    let known_w = match style.width {
        Dimension::Px(v) => Some(v),
        Dimension::Percent(p) => Some(max_width * p / 100.0),
        Dimension::Auto => None,
    };
    let known_h = match style.height {
        Dimension::Px(v) => Some(v),
        _ => None,
    };

    let intrinsic = if doc.is(node, "img") && (known_w.is_none() || known_h.is_none()) {
        doc.element(node).and_then(|e| e.src()).and_then(decode_data_uri_size)
    } else {
        None
    };

    let (w, h) = match (known_w, known_h, intrinsic) {
        (Some(w), Some(h), _) => (w, h),
        // Width known → derive height from aspect ratio.
        (Some(w), None, Some((iw, ih))) => (w, (w * ih / iw).max(1.0)),
        // Height known → derive width from aspect ratio.
        (None, Some(h), Some((iw, ih))) => ((h * iw / ih).max(1.0), h),
        (None, None, Some((iw, ih))) => (iw, ih),
        (w, h, None) => (
            w.unwrap_or(0.0),
            h.unwrap_or(if doc.is(node, "img") { 0.0 } else { style.line_height_px() }),
        ),
    };
    (
        w + style.horizontal_edges(),
        h + style.top_edge() + style.bottom_edge(),
    )
}

/// Pixel dimensions of a base64 `data:` image, if it decodes.
fn decode_data_uri_size(src: &str) -> Option<(f32, f32)> {
    use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};

    if !src.starts_with("data:") || !src.contains(";base64,") {
        return None;
    }
    let comma = src.find(',')?;
    let bytes = BASE64_STD.decode(src[comma + 1..].trim()).ok()?;
    let img = ::image::load_from_memory(&bytes).ok()?;
    let (w, h) = (img.width() as f32, img.height() as f32);
    if w == 0.0 || h == 0.0 {
        None
    } else {
        Some((w, h))
    }
}
