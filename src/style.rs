//! Style resolver – maps tag defaults, Tailwind-like utility classes and the
//! inline `style` attribute to a flat [`ComputedStyle`] per element.
//!
//! Only the properties pagination depends on are modelled: the box model per
//! side, display and positioning scheme, float/clear, forced breaks and the
//! font properties that drive line breaking.

use std::collections::HashMap;

use crate::dom::{Document, ElementData, NodeId, Tag};

/// Fully resolved style for a single element.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    // Display / positioning
    pub display: Display,
    pub position: Position,
    pub float: Float,
    pub clear: Clear,
    pub overflow_clip: bool,
    pub transform: bool,
    pub inset_top: Option<f32>,
    pub inset_bottom: Option<f32>,

    // Flex / grid containers (laid out as a unit)
    pub flex_direction: FlexDirection,
    pub gap: f32,
    pub grid_columns: usize,

    // Sizing
    pub width: Dimension,
    pub height: Dimension,

    // Spacing (px)
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub padding_top: f32,
    pub padding_right: f32,
    pub padding_bottom: f32,
    pub padding_left: f32,

    // Border widths (px)
    pub border_top: f32,
    pub border_right: f32,
    pub border_bottom: f32,
    pub border_left: f32,

    // Typography
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    pub font_family: String,
    pub line_height: LineHeight,
    pub white_space_pre: bool,

    // Fragmentation
    pub break_before: bool,
    pub break_after: bool,
    pub break_inside_avoid: bool,
    /// Must not be the last box on a page (`break-after: avoid`).
    pub break_after_avoid: bool,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Block,
            position: Position::Static,
            float: Float::None,
            clear: Clear::None,
            overflow_clip: false,
            transform: false,
            inset_top: None,
            inset_bottom: None,
            flex_direction: FlexDirection::Row,
            gap: 0.0,
            grid_columns: 1,
            width: Dimension::Auto,
            height: Dimension::Auto,
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            padding_top: 0.0,
            padding_right: 0.0,
            padding_bottom: 0.0,
            padding_left: 0.0,
            border_top: 0.0,
            border_right: 0.0,
            border_bottom: 0.0,
            border_left: 0.0,
            font_size: 16.0,
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            font_family: "Helvetica".to_string(),
            line_height: LineHeight::Factor(1.4),
            white_space_pre: false,
            break_before: false,
            break_after: false,
            break_inside_avoid: false,
            break_after_avoid: false,
        }
    }
}

impl ComputedStyle {
    pub fn is_out_of_flow(&self) -> bool {
        matches!(self.position, Position::Absolute | Position::Fixed)
    }

    pub fn is_floated(&self) -> bool {
        self.float != Float::None
    }

    pub fn is_inline_level(&self) -> bool {
        matches!(self.display, Display::Inline | Display::InlineBlock)
    }

    /// Containers laid out as a whole (never descended into by pagination).
    pub fn is_monolithic(&self) -> bool {
        matches!(
            self.display,
            Display::Flex | Display::Grid | Display::Table | Display::TableRow | Display::TableCell
        ) || self.break_inside_avoid
    }

    /// Whether this box starts a new block formatting context, which keeps
    /// its children's margins from collapsing through it.
    pub fn establishes_bfc(&self) -> bool {
        self.overflow_clip
            || self.is_floated()
            || self.is_out_of_flow()
            || matches!(
                self.display,
                Display::FlowRoot
                    | Display::InlineBlock
                    | Display::Flex
                    | Display::Grid
                    | Display::Table
            )
    }

    pub fn line_height_px(&self) -> f32 {
        match self.line_height {
            LineHeight::Factor(f) => self.font_size * f,
            LineHeight::Px(px) => px,
        }
    }

    pub fn top_edge(&self) -> f32 {
        self.border_top + self.padding_top
    }

    pub fn bottom_edge(&self) -> f32 {
        self.border_bottom + self.padding_bottom
    }

    pub fn horizontal_edges(&self) -> f32 {
        self.border_left + self.padding_left + self.border_right + self.padding_right
    }

    /// Relative positioning that moves the box vertically.
    pub fn has_vertical_offset(&self) -> bool {
        self.position == Position::Relative
            && (self.inset_top.unwrap_or(0.0) != 0.0 || self.inset_bottom.unwrap_or(0.0) != 0.0)
    }

    pub fn is_bold(&self) -> bool {
        self.font_weight == FontWeight::Bold
    }

    pub fn is_italic(&self) -> bool {
        self.font_style == FontStyle::Italic
    }
}

// ---------------------------------------------------------------------------
// Supporting enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    FlowRoot,
    Inline,
    InlineBlock,
    ListItem,
    Flex,
    Grid,
    Table,
    TableRow,
    TableCell,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Static,
    Relative,
    Absolute,
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Float {
    None,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clear {
    None,
    Left,
    Right,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexDirection {
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineHeight {
    Factor(f32),
    Px(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Auto,
    Px(f32),
    Percent(f32),
}

// ---------------------------------------------------------------------------
// Style resolution
// ---------------------------------------------------------------------------

/// Resolve the style for an element, inheriting text properties from its parent.
pub fn resolve_style(element: &ElementData, parent: Option<&ComputedStyle>) -> ComputedStyle {
    let mut style = base_style_for_tag(&element.tag);

    // Inherit text properties from parent
    if let Some(p) = parent {
        style.font_weight = match element.tag {
            Tag::B
            | Tag::Strong
            | Tag::Th
            | Tag::H1
            | Tag::H2
            | Tag::H3
            | Tag::H4
            | Tag::H5
            | Tag::H6 => FontWeight::Bold,
            _ => p.font_weight,
        };
        style.font_style = match element.tag {
            Tag::I | Tag::Em => FontStyle::Italic,
            _ => p.font_style,
        };
        if !is_heading(&element.tag) {
            style.font_size = p.font_size;
        }
        style.font_family = p.font_family.clone();
        style.line_height = p.line_height;
        style.white_space_pre = p.white_space_pre || element.tag == Tag::Pre;
    }

    // Apply Tailwind classes
    for class in element.classes() {
        apply_tailwind_class(&mut style, class);
    }

    // Apply inline style attribute
    if let Some(inline) = element.inline_style() {
        apply_inline_style(&mut style, inline, parent);
    }

    // Floats and out-of-flow boxes are blockified.
    if (style.is_floated() || style.is_out_of_flow()) && style.display == Display::Inline {
        style.display = Display::Block;
    }

    style
}

fn is_heading(tag: &Tag) -> bool {
    matches!(tag, Tag::H1 | Tag::H2 | Tag::H3 | Tag::H4 | Tag::H5 | Tag::H6)
}

/// Default styles based on tag semantics.
fn base_style_for_tag(tag: &Tag) -> ComputedStyle {
    let mut s = ComputedStyle::default();
    match tag {
        Tag::H1 => {
            s.break_after_avoid = true;
            s.font_size = 32.0;
            s.font_weight = FontWeight::Bold;
            s.margin_top = 16.0;
            s.margin_bottom = 12.0;
        }
        Tag::H2 => {
            s.break_after_avoid = true;
            s.font_size = 24.0;
            s.font_weight = FontWeight::Bold;
            s.margin_top = 14.0;
            s.margin_bottom = 10.0;
        }
        Tag::H3 | Tag::H4 | Tag::H5 | Tag::H6 => {
            s.break_after_avoid = true;
            s.font_size = 20.0;
            s.font_weight = FontWeight::Bold;
            s.margin_top = 12.0;
            s.margin_bottom = 8.0;
        }
        Tag::P => {
            s.margin_bottom = 10.0;
        }
        Tag::Ul | Tag::Ol => {
            s.margin_bottom = 10.0;
            s.padding_left = 24.0;
        }
        Tag::Li => {
            s.display = Display::ListItem;
            s.margin_bottom = 4.0;
        }
        Tag::Blockquote | Tag::Figure => {
            s.margin_top = 10.0;
            s.margin_bottom = 10.0;
            s.margin_left = 24.0;
        }
        Tag::Pre => {
            s.white_space_pre = true;
            s.font_family = "Courier".to_string();
            s.margin_bottom = 10.0;
        }
        Tag::Hr => {
            s.border_top = 1.0;
            s.margin_top = 8.0;
            s.margin_bottom = 8.0;
        }
        Tag::Table => {
            s.display = Display::Table;
        }
        Tag::Tr => {
            s.display = Display::TableRow;
        }
        Tag::Td | Tag::Th => {
            s.display = Display::TableCell;
            s.padding_top = 4.0;
            s.padding_right = 8.0;
            s.padding_bottom = 4.0;
            s.padding_left = 8.0;
        }
        Tag::Tt | Tag::Code => {
            s.display = Display::Inline;
            s.font_family = "Courier".to_string();
        }
        Tag::Img => {
            s.display = Display::InlineBlock;
        }
        t if t.is_inline() => {
            s.display = Display::Inline;
        }
        t if t.is_non_rendered() => {
            s.display = Display::None;
        }
        Tag::Custom(name) => {
            s.display = custom_element_display(name);
        }
        _ => {}
    }
    s
}

/// The engine's own wrappers are blocks except the per-line pieces; unknown
/// custom elements default to inline like in browsers.
fn custom_element_display(name: &str) -> Display {
    match name {
        "paged-text-node" | "paged-text-line" => Display::Inline,
        n if n.starts_with("paged-") => Display::Block,
        _ => Display::Inline,
    }
}

/// Apply a single Tailwind utility class.
fn apply_tailwind_class(s: &mut ComputedStyle, class: &str) {
    match class {
        // Display
        "flex" => s.display = Display::Flex,
        "grid" => s.display = Display::Grid,
        "block" => s.display = Display::Block,
        "flow-root" => s.display = Display::FlowRoot,
        "inline" => s.display = Display::Inline,
        "inline-block" => s.display = Display::InlineBlock,
        "hidden" => s.display = Display::None,

        // Flex direction
        "flex-row" => s.flex_direction = FlexDirection::Row,
        "flex-col" => s.flex_direction = FlexDirection::Column,

        // Positioning
        "static" => s.position = Position::Static,
        "relative" => s.position = Position::Relative,
        "absolute" => s.position = Position::Absolute,
        "fixed" => s.position = Position::Fixed,
        "float-left" => s.float = Float::Left,
        "float-right" => s.float = Float::Right,
        "float-none" => s.float = Float::None,
        "clear-left" => s.clear = Clear::Left,
        "clear-right" => s.clear = Clear::Right,
        "clear-both" => s.clear = Clear::Both,
        "clear-none" => s.clear = Clear::None,
        "overflow-hidden" | "overflow-auto" | "overflow-scroll" => s.overflow_clip = true,

        // Borders
        "border" => set_all_borders(s, 1.0),
        "border-0" => set_all_borders(s, 0.0),
        "border-t" => s.border_top = 1.0,
        "border-b" => s.border_bottom = 1.0,

        // Font weight / style
        "font-bold" => s.font_weight = FontWeight::Bold,
        "font-normal" => s.font_weight = FontWeight::Normal,
        "italic" => s.font_style = FontStyle::Italic,
        "not-italic" => s.font_style = FontStyle::Normal,
        "font-mono" => s.font_family = "Courier".to_string(),

        // Font sizes
        "text-xs" => s.font_size = 12.0,
        "text-sm" => s.font_size = 14.0,
        "text-base" => s.font_size = 16.0,
        "text-lg" => s.font_size = 18.0,
        "text-xl" => s.font_size = 20.0,
        "text-2xl" => s.font_size = 24.0,
        "text-3xl" => s.font_size = 30.0,
        "text-4xl" => s.font_size = 36.0,

        // Width
        "w-full" => s.width = Dimension::Percent(100.0),
        "w-auto" => s.width = Dimension::Auto,
        "w-1/2" => s.width = Dimension::Percent(50.0),
        "w-1/3" => s.width = Dimension::Percent(33.333),
        "w-2/3" => s.width = Dimension::Percent(66.666),
        "w-1/4" => s.width = Dimension::Percent(25.0),
        "w-3/4" => s.width = Dimension::Percent(75.0),

        // Page break
        "break-before" | "break-before-page" => s.break_before = true,
        "break-after" | "break-after-page" => s.break_after = true,
        "break-inside-avoid" => s.break_inside_avoid = true,
        "break-after-avoid" => s.break_after_avoid = true,
        "break-after-auto" => s.break_after_avoid = false,
        "page-break" => s.break_after = true,

        _ => {
            // Dynamic patterns
            try_parse_spacing_class(s, class);
            try_parse_gap_class(s, class);
            try_parse_grid_cols_class(s, class);
            try_parse_size_class(s, class);
            try_parse_border_class(s, class);
        }
    }
}

fn set_all_borders(s: &mut ComputedStyle, w: f32) {
    s.border_top = w;
    s.border_right = w;
    s.border_bottom = w;
    s.border_left = w;
}

fn try_parse_spacing_class(s: &mut ComputedStyle, class: &str) {
    // p-{n}, px-{n}, pt-{n}, m-{n}, -mt-{n} … (1 unit = 4px)
    let (negative, class) = match class.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, class),
    };
    let Some((prefix, value_str)) = class.rsplit_once('-') else {
        return;
    };
    let value: f32 = match value_str.parse::<f32>() {
        Ok(v) => v * 4.0,
        Err(_) => return,
    };
    let margin = if negative { -value } else { value };

    match prefix {
        "p" if !negative => {
            s.padding_top = value;
            s.padding_right = value;
            s.padding_bottom = value;
            s.padding_left = value;
        }
        "px" if !negative => {
            s.padding_left = value;
            s.padding_right = value;
        }
        "py" if !negative => {
            s.padding_top = value;
            s.padding_bottom = value;
        }
        "pt" if !negative => s.padding_top = value,
        "pr" if !negative => s.padding_right = value,
        "pb" if !negative => s.padding_bottom = value,
        "pl" if !negative => s.padding_left = value,
        "m" => {
            s.margin_top = margin;
            s.margin_right = margin;
            s.margin_bottom = margin;
            s.margin_left = margin;
        }
        "mx" => {
            s.margin_left = margin;
            s.margin_right = margin;
        }
        "my" => {
            s.margin_top = margin;
            s.margin_bottom = margin;
        }
        "mt" => s.margin_top = margin,
        "mr" => s.margin_right = margin,
        "mb" => s.margin_bottom = margin,
        "ml" => s.margin_left = margin,
        _ => {}
    }
}

fn try_parse_gap_class(s: &mut ComputedStyle, class: &str) {
    if let Some(rest) = class.strip_prefix("gap-") {
        if let Ok(v) = rest.parse::<f32>() {
            s.gap = v * 4.0;
        }
    }
}

fn try_parse_grid_cols_class(s: &mut ComputedStyle, class: &str) {
    if let Some(rest) = class.strip_prefix("grid-cols-") {
        if let Ok(n) = rest.parse::<usize>() {
            s.grid_columns = n.max(1);
        }
    }
}

fn try_parse_size_class(s: &mut ComputedStyle, class: &str) {
    if let Some(rest) = class.strip_prefix("w-") {
        if let Ok(v) = rest.parse::<f32>() {
            s.width = Dimension::Px(v * 4.0);
        }
    }
    if let Some(rest) = class.strip_prefix("h-") {
        if let Ok(v) = rest.parse::<f32>() {
            s.height = Dimension::Px(v * 4.0);
        }
    }
}

fn try_parse_border_class(s: &mut ComputedStyle, class: &str) {
    if let Some(rest) = class.strip_prefix("border-") {
        if let Ok(v) = rest.parse::<f32>() {
            set_all_borders(s, v);
        }
    }
}

// ---------------------------------------------------------------------------
// Inline style parsing (limited subset)
// ---------------------------------------------------------------------------

fn apply_inline_style(s: &mut ComputedStyle, style_str: &str, parent: Option<&ComputedStyle>) {
    for decl in style_str.split(';') {
        let decl = decl.trim();
        if decl.is_empty() {
            continue;
        }
        let Some((prop, val)) = decl.split_once(':') else {
            continue;
        };
        let val = val.trim().trim_end_matches("!important").trim();
        apply_css_property(s, &prop.trim().to_ascii_lowercase(), val, parent);
    }
}

fn apply_css_property(
    s: &mut ComputedStyle,
    prop: &str,
    val: &str,
    parent: Option<&ComputedStyle>,
) {
    match prop {
        "display" => {
            s.display = match val {
                "block" => Display::Block,
                "flow-root" => Display::FlowRoot,
                "inline" => Display::Inline,
                "inline-block" => Display::InlineBlock,
                "list-item" => Display::ListItem,
                "flex" => Display::Flex,
                "grid" => Display::Grid,
                "table" => Display::Table,
                "table-row" => Display::TableRow,
                "table-cell" => Display::TableCell,
                "none" => Display::None,
                _ => s.display,
            }
        }
        "position" => {
            s.position = match val {
                "relative" => Position::Relative,
                "absolute" => Position::Absolute,
                "fixed" => Position::Fixed,
                "static" | "sticky" => Position::Static,
                _ => s.position,
            }
        }
        "top" => s.inset_top = parse_px(val),
        "bottom" => s.inset_bottom = parse_px(val),
        "float" => {
            s.float = match val {
                "left" | "inline-start" => Float::Left,
                "right" | "inline-end" => Float::Right,
                _ => Float::None,
            }
        }
        "clear" => {
            s.clear = match val {
                "left" => Clear::Left,
                "right" => Clear::Right,
                "both" => Clear::Both,
                _ => Clear::None,
            }
        }
        "overflow" | "overflow-y" => {
            s.overflow_clip = matches!(val, "hidden" | "auto" | "scroll" | "clip");
        }
        "transform" => s.transform = val != "none",
        "flex-direction" => {
            s.flex_direction = match val {
                "column" | "column-reverse" => FlexDirection::Column,
                _ => FlexDirection::Row,
            }
        }
        "gap" | "row-gap" => {
            if let Some(px) = parse_px(val) {
                s.gap = px;
            }
        }
        "font-size" => {
            let base = parent.map(|p| p.font_size).unwrap_or(16.0);
            if let Some(px) = parse_length(val, base) {
                s.font_size = px;
            }
        }
        "font-weight" => {
            s.font_weight = match val {
                "bold" | "bolder" | "600" | "700" | "800" | "900" => FontWeight::Bold,
                _ => FontWeight::Normal,
            }
        }
        "font-style" => {
            s.font_style = match val {
                "italic" | "oblique" => FontStyle::Italic,
                _ => FontStyle::Normal,
            }
        }
        "font-family" => {
            if let Some(first) = val.split(',').next() {
                s.font_family = first.trim().trim_matches(|c| c == '"' || c == '\'').to_string();
            }
        }
        "line-height" => {
            if val == "normal" {
                s.line_height = LineHeight::Factor(1.2);
            } else if let Ok(v) = val.parse::<f32>() {
                s.line_height = LineHeight::Factor(v);
            } else if let Some(pct) =
                val.strip_suffix('%').and_then(|v| v.trim().parse::<f32>().ok())
            {
                s.line_height = LineHeight::Px(s.font_size * pct / 100.0);
            } else if let Some(px) = parse_length(val, s.font_size) {
                s.line_height = LineHeight::Px(px);
            }
        }
        "white-space" => s.white_space_pre = val.starts_with("pre"),
        "width" => s.width = parse_dimension(val),
        "height" => s.height = parse_dimension(val),
        "margin" => apply_shorthand_spacing(
            val,
            &mut s.margin_top,
            &mut s.margin_right,
            &mut s.margin_bottom,
            &mut s.margin_left,
        ),
        "margin-top" => set_px(&mut s.margin_top, val),
        "margin-right" => set_px(&mut s.margin_right, val),
        "margin-bottom" => set_px(&mut s.margin_bottom, val),
        "margin-left" => set_px(&mut s.margin_left, val),
        "padding" => apply_shorthand_spacing(
            val,
            &mut s.padding_top,
            &mut s.padding_right,
            &mut s.padding_bottom,
            &mut s.padding_left,
        ),
        "padding-top" => set_px(&mut s.padding_top, val),
        "padding-right" => set_px(&mut s.padding_right, val),
        "padding-bottom" => set_px(&mut s.padding_bottom, val),
        "padding-left" => set_px(&mut s.padding_left, val),
        "border" | "border-width" => {
            if prop == "border" {
                set_all_borders(s, parse_border_width(val));
            } else {
                apply_shorthand_spacing(
                    val,
                    &mut s.border_top,
                    &mut s.border_right,
                    &mut s.border_bottom,
                    &mut s.border_left,
                );
            }
        }
        "border-top" | "border-top-width" => s.border_top = parse_border_width(val),
        "border-right" | "border-right-width" => s.border_right = parse_border_width(val),
        "border-bottom" | "border-bottom-width" => s.border_bottom = parse_border_width(val),
        "border-left" | "border-left-width" => s.border_left = parse_border_width(val),
        "break-before" | "page-break-before" => s.break_before = is_forced_break(val),
        "break-after" | "page-break-after" => {
            s.break_after = is_forced_break(val);
            s.break_after_avoid = val == "avoid" || val == "avoid-page";
        }
        "break-inside" | "page-break-inside" => {
            s.break_inside_avoid = val == "avoid" || val == "avoid-page";
        }
        _ => {}
    }
}

fn is_forced_break(val: &str) -> bool {
    matches!(val, "always" | "page" | "left" | "right" | "recto" | "verso")
}

fn set_px(slot: &mut f32, val: &str) {
    if let Some(px) = parse_px(val) {
        *slot = px;
    }
}

pub(crate) fn parse_px(s: &str) -> Option<f32> {
    let s = s.trim();
    let s = s.strip_suffix("px").unwrap_or(s);
    s.trim().parse().ok()
}

/// Parse `px`, `em`, `rem` and `pt` lengths against a font size.
fn parse_length(s: &str, em: f32) -> Option<f32> {
    let s = s.trim();
    if let Some(v) = s.strip_suffix("rem") {
        return v.trim().parse::<f32>().ok().map(|v| v * 16.0);
    }
    if let Some(v) = s.strip_suffix("em") {
        return v.trim().parse::<f32>().ok().map(|v| v * em);
    }
    if let Some(v) = s.strip_suffix("pt") {
        return v.trim().parse::<f32>().ok().map(|v| v * 96.0 / 72.0);
    }
    parse_px(s)
}

fn parse_border_width(val: &str) -> f32 {
    if val.split_whitespace().any(|t| t == "none" || t == "hidden") {
        return 0.0;
    }
    val.split_whitespace()
        .find_map(|t| match t {
            "thin" => Some(1.0),
            "medium" => Some(3.0),
            "thick" => Some(5.0),
            _ if t.ends_with("px") || t == "0" => parse_px(t),
            _ => None,
        })
        .unwrap_or(0.0)
}

fn parse_dimension(s: &str) -> Dimension {
    let s = s.trim();
    if s == "auto" {
        Dimension::Auto
    } else if let Some(pct) = s.strip_suffix('%') {
        pct.parse::<f32>()
            .map(Dimension::Percent)
            .unwrap_or(Dimension::Auto)
    } else {
        parse_px(s).map(Dimension::Px).unwrap_or(Dimension::Auto)
    }
}

fn apply_shorthand_spacing(
    val: &str,
    top: &mut f32,
    right: &mut f32,
    bottom: &mut f32,
    left: &mut f32,
) {
    // `auto` behaves as zero for the vertical sides we care about.
    let parts: Vec<f32> = val
        .split_whitespace()
        .map(|p| if p == "auto" { Some(0.0) } else { parse_px(p) })
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default();
    match parts.len() {
        1 => {
            *top = parts[0];
            *right = parts[0];
            *bottom = parts[0];
            *left = parts[0];
        }
        2 => {
            *top = parts[0];
            *bottom = parts[0];
            *right = parts[1];
            *left = parts[1];
        }
        3 => {
            *top = parts[0];
            *right = parts[1];
            *left = parts[1];
            *bottom = parts[2];
        }
        4 => {
            *top = parts[0];
            *right = parts[1];
            *bottom = parts[2];
            *left = parts[3];
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Style map over a document
// ---------------------------------------------------------------------------

/// Computed styles for every element under a subtree.
#[derive(Debug, Clone, Default)]
pub struct StyleMap {
    styles: HashMap<NodeId, ComputedStyle>,
    fallback: ComputedStyle,
}

impl StyleMap {
    /// Resolve styles top-down for `root` and its descendants.
    pub fn compute(doc: &Document, root: NodeId) -> Self {
        let mut map = StyleMap::default();
        let mut inherited = None;
        // Inherit from the ancestors of `root` so text properties set on
        // <body> still reach the content.
        let mut chain = Vec::new();
        let mut cur = doc.parent(root);
        while let Some(c) = cur {
            chain.push(c);
            cur = doc.parent(c);
        }
        for &a in chain.iter().rev() {
            if let Some(e) = doc.element(a) {
                let s = resolve_style(e, inherited.as_ref());
                inherited = Some(s);
            }
        }
        map.walk(doc, root, inherited.as_ref());
        map
    }

    fn walk(&mut self, doc: &Document, id: NodeId, parent: Option<&ComputedStyle>) {
        let own = doc.element(id).map(|e| resolve_style(e, parent));
        let next_parent = own.as_ref().or(parent).cloned();
        if let Some(s) = own {
            self.styles.insert(id, s);
        }
        for &c in doc.children(id) {
            if doc.element(c).is_some() {
                self.walk(doc, c, next_parent.as_ref());
            }
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&ComputedStyle> {
        self.styles.get(&id)
    }

    /// Style of an element, or of the nearest styled ancestor for text nodes.
    pub fn effective(&self, doc: &Document, id: NodeId) -> &ComputedStyle {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if let Some(s) = self.styles.get(&c) {
                return s;
            }
            cur = doc.parent(c);
        }
        &self.fallback
    }
}
