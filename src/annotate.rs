//! DOM annotator – writes a pass's decisions back onto the document and
//! removes everything a previous pass wrote.
//!
//! `strip` followed by `apply` is the whole write protocol. Running it on a
//! document that already carries annotations yields the same markup as
//! running it on the pristine document.

use std::collections::HashMap;

use crate::dom::{Document, NodeId};
use crate::flow::{self, Prepared};
use crate::paper::PageGeometry;
use crate::partition::{AnchorRef, Plan, TextBlockPlan};
use crate::text_block::Fragment;

pub const PAGE_MARKER: &str = "paged-page";
pub const VIRTUAL_PAPER: &str = "paged-virtual-paper";
pub const PAGE_CHROME: &str = "paged-page-chrome";
pub const PAGE_HEADER: &str = "paged-page-header";
pub const PAGE_BODY_SPACER: &str = "paged-page-body-spacer";
pub const PAGE_FOOTER: &str = "paged-page-footer";
pub const TEXT_GROUP: &str = "paged-text-group";
pub const TEXT_NODE: &str = "paged-text-node";
pub const TEXT_LINE: &str = "paged-text-line";

pub const ATTR_PAGE: &str = "page";
pub const ATTR_PAGES: &str = "pages";
pub const ATTR_SUCCESS: &str = "success";
pub const ATTR_PAGE_START: &str = "page-start";
pub const ATTR_PAGE_END: &str = "page-end";
pub const ATTR_DATA_CHILD: &str = "data-child";
pub const ATTR_CLONE: &str = "paged-clone";
const ATTR_STYLE_BACKUP: &str = "data-paged-style";
const ATTR_ENGINE_STYLE: &str = "data-paged";

/// Element ids of what [`apply`] wrote, for reporting.
#[derive(Debug, Clone, Default)]
pub struct Applied {
    /// `(page, start, end)` per page.
    pub pages: Vec<(usize, NodeId, NodeId)>,
    /// Text group wrapper per `(block, group index)`.
    pub groups: HashMap<(NodeId, usize), NodeId>,
}

// ---------------------------------------------------------------------------
// Strip
// ---------------------------------------------------------------------------

/// Remove every artefact of a previous pass. Returns whether any was found.
pub fn strip(doc: &mut Document) -> bool {
    let had_root = doc.first_element_by_name(flow::ROOT).is_some();

    for marker in doc.elements_by_name(PAGE_MARKER) {
        doc.detach(marker);
    }
    for name in [TEXT_GROUP, TEXT_LINE, TEXT_NODE] {
        for el in doc.elements_by_name(name) {
            doc.unwrap(el);
        }
    }
    merge_clones(doc);

    for el in doc.elements_by_name(flow::COMPLEX_TEXT_BLOCK) {
        doc.unwrap(el);
    }
    for name in [flow::CONTENT_START, flow::CONTENT_END, flow::PAPER_FLOW, flow::OVERLAY_FLOW] {
        for el in doc.elements_by_name(name) {
            doc.detach(el);
        }
    }
    for el in doc.elements_with_attr(ATTR_ENGINE_STYLE, None) {
        doc.detach(el);
    }
    for name in [flow::CONTENT_FLOW, flow::ROOT] {
        for el in doc.elements_by_name(name) {
            doc.unwrap(el);
        }
    }

    for attr in [ATTR_PAGE_START, ATTR_PAGE_END] {
        for el in doc.elements_with_attr(attr, None) {
            doc.remove_attr(el, attr);
        }
    }
    for el in doc.elements_with_attr(ATTR_STYLE_BACKUP, None) {
        let original = doc.attr(el, ATTR_STYLE_BACKUP).unwrap_or_default().to_string();
        if original.is_empty() {
            doc.remove_attr(el, "style");
        } else {
            doc.set_attr(el, "style", &original);
        }
        doc.remove_attr(el, ATTR_STYLE_BACKUP);
    }

    let root = doc.root();
    doc.merge_adjacent_text(root);
    if had_root {
        log::debug!("stripped previous pagination");
    }
    had_root
}

/// Fold consecutive clones of one inline element back into a single element.
fn merge_clones(doc: &mut Document) {
    for el in doc.elements_with_attr(ATTR_CLONE, None) {
        if doc.parent(el).is_none() {
            continue;
        }
        let Some(key) = doc.attr(el, ATTR_CLONE).map(str::to_string) else {
            continue;
        };
        while let Some(next) = doc.next_sibling(el) {
            if doc.attr(next, ATTR_CLONE) != Some(key.as_str()) {
                break;
            }
            for child in doc.children(next).to_vec() {
                doc.append_child(el, child);
            }
            doc.detach(next);
        }
    }
    for el in doc.elements_with_attr(ATTR_CLONE, None) {
        doc.remove_attr(el, ATTR_CLONE);
        doc.remove_attr(el, ATTR_DATA_CHILD);
    }
}

// ---------------------------------------------------------------------------
// Apply
// ---------------------------------------------------------------------------

/// Write `plan` onto a freshly prepared document.
pub fn apply(
    doc: &mut Document,
    prepared: &Prepared,
    plan: &Plan,
    geometry: &PageGeometry,
) -> Applied {
    let mut applied = Applied::default();
    let mut standalone: HashMap<(NodeId, usize), NodeId> = HashMap::new();
    let mut clone_counter = 0usize;

    for block in &plan.text_blocks {
        let wrappers = materialize(doc, block, &mut clone_counter);
        for (index, (wrapper, owner)) in wrappers.into_iter().enumerate() {
            applied.groups.insert((block.split.block, index), wrapper);
            if let Some(owner) = owner {
                standalone.insert((block.split.block, index), owner);
            }
        }
    }

    let resolve = |anchor: AnchorRef| match anchor {
        AnchorRef::Node(n) => n,
        AnchorRef::Group { block, index } => {
            applied.groups.get(&(block, index)).copied().unwrap_or(block)
        }
    };
    let mut pages = Vec::with_capacity(plan.pages.len());
    for page in &plan.pages {
        let k = page.number.to_string();
        let start = resolve(page.start);
        let end = resolve(page.end);

        let marker = doc.create_element(PAGE_MARKER);
        doc.set_attr(marker, ATTR_PAGE, &k);
        doc.insert_before(start, marker);
        doc.set_attr(start, ATTR_PAGE_START, &k);
        if let AnchorRef::Group { block, index } = page.start {
            if let Some(&owner) = standalone.get(&(block, index)) {
                doc.set_attr(owner, ATTR_PAGE_START, &k);
            }
        }
        doc.set_attr(end, ATTR_PAGE_END, &k);
        pages.push((page.number, start, end));
    }
    applied.pages = pages;

    for &n in &plan.zero_top {
        zero_margin(doc, n, "margin-top");
    }
    for &n in &plan.zero_bottom {
        zero_margin(doc, n, "margin-bottom");
    }

    let count = plan.page_count();
    doc.set_attr(prepared.root, ATTR_PAGES, &count.to_string());
    if plan.success() {
        doc.set_attr(prepared.root, ATTR_SUCCESS, "");
    }

    let style = doc.create_element("style");
    doc.set_attr(style, ATTR_ENGINE_STYLE, "");
    let css = doc.create_text(&engine_css(geometry));
    doc.append_child(style, css);
    doc.insert_before(prepared.paper_flow, style);

    for k in 1..=count {
        let paper = doc.create_element(VIRTUAL_PAPER);
        doc.set_attr(paper, ATTR_PAGE, &k.to_string());
        doc.append_child(prepared.paper_flow, paper);

        let chrome = page_chrome(doc, geometry, k, count);
        doc.append_child(prepared.overlay_flow, chrome);
    }
    let flow_height = format!("height: {}px", geometry.paper_flow_height(count));
    doc.set_attr(prepared.paper_flow, "style", &flow_height);
    doc.set_attr(prepared.overlay_flow, "style", &flow_height);

    log::debug!(
        "annotated {count} pages, {} split blocks, {} margin overrides",
        plan.text_blocks.len(),
        plan.zero_top.len() + plan.zero_bottom.len()
    );
    applied
}

fn zero_margin(doc: &mut Document, node: NodeId, property: &str) {
    if !doc.has_attr(node, ATTR_STYLE_BACKUP) {
        let original = doc.attr(node, "style").unwrap_or_default().to_string();
        doc.set_attr(node, ATTR_STYLE_BACKUP, &original);
    }
    let current = doc
        .attr(node, "style")
        .unwrap_or_default()
        .trim()
        .trim_end_matches(';')
        .to_string();
    let updated = if current.is_empty() {
        format!("{property}: 0px !important")
    } else {
        format!("{current}; {property}: 0px !important")
    };
    doc.set_attr(node, "style", &updated);
}

fn page_chrome(doc: &mut Document, geometry: &PageGeometry, page: usize, count: usize) -> NodeId {
    let chrome = doc.create_element(PAGE_CHROME);
    doc.set_attr(chrome, ATTR_PAGE, &page.to_string());
    doc.set_attr(chrome, "style", &format!("top: {}px", geometry.paper_offset(page)));

    let header = doc.create_element(PAGE_HEADER);
    doc.set_attr(header, "style", &format!("height: {}px", geometry.header_height));
    let spacer = doc.create_element(PAGE_BODY_SPACER);
    doc.set_attr(spacer, "style", &format!("height: {}px", geometry.body_height));
    let footer = doc.create_element(PAGE_FOOTER);
    doc.set_attr(footer, "style", &format!("height: {}px", geometry.footer_height));
    let label = doc.create_text(&format!("{page} / {count}"));
    doc.append_child(footer, label);

    doc.append_child(chrome, header);
    doc.append_child(chrome, spacer);
    doc.append_child(chrome, footer);
    chrome
}

fn engine_css(g: &PageGeometry) -> String {
    format!(
        "paged-root{{display:block;position:relative}}\
paged-paper-flow,paged-overlay-flow{{position:absolute;top:0;left:0;width:{pw}px}}\
paged-overlay-flow{{pointer-events:none}}\
paged-virtual-paper{{display:block;width:{pw}px;height:{ph}px;margin-bottom:{gap}px;background:#fff}}\
paged-page-chrome{{position:absolute;left:0;width:{pw}px;height:{ph}px;padding-top:{mt}px;box-sizing:border-box}}\
paged-page-header,paged-page-body-spacer,paged-page-footer{{display:block;margin-left:{ml}px;width:{bw}px}}\
paged-content-flow{{display:block;position:relative;width:{bw}px;margin-left:{ml}px;padding-top:{top}px}}\
paged-page{{display:block;height:0}}\
paged-text-group,paged-complex-text-block{{display:block}}\
paged-text-node,paged-text-line{{display:inline}}\
@media print{{paged-page:not([page=\"1\"]){{break-before:page}}paged-paper-flow,paged-overlay-flow{{display:none}}}}",
        pw = g.paper_width,
        ph = g.paper_height,
        gap = g.gap,
        mt = g.margin_top,
        ml = g.margin_left,
        bw = g.printable_width,
        top = g.margin_top + g.header_height,
    )
}

/// Rebuild a split block as one `paged-text-group` per group. Returns each
/// group's wrapper and the clone of its standalone inline owner, if any.
fn materialize(
    doc: &mut Document,
    plan: &TextBlockPlan,
    counter: &mut usize,
) -> Vec<(NodeId, Option<NodeId>)> {
    let split = &plan.split;
    let block = split.block;
    let original: Vec<NodeId> = doc.children(block).to_vec();
    let mut clone_keys: HashMap<NodeId, String> = HashMap::new();
    let mut out = Vec::with_capacity(split.groups.len());

    for group in &split.groups {
        let wrapper = doc.create_element(TEXT_GROUP);
        doc.set_attr(wrapper, ATTR_DATA_CHILD, &group.index.to_string());
        let mut clones: HashMap<NodeId, NodeId> = HashMap::new();
        let mut text_nodes: HashMap<NodeId, NodeId> = HashMap::new();

        for frag in split.lines[group.lines.clone()].iter().flat_map(|l| &l.fragments) {
            let source = frag.node();
            let mut chain = Vec::new();
            let mut cur = doc.parent(source);
            while let Some(p) = cur {
                if p == block {
                    break;
                }
                chain.push(p);
                cur = doc.parent(p);
            }

            let mut container = wrapper;
            for &ancestor in chain.iter().rev() {
                container = match clones.get(&ancestor) {
                    Some(&c) => c,
                    None => {
                        let c = doc.shallow_clone(ancestor);
                        let key = clone_keys
                            .entry(ancestor)
                            .or_insert_with(|| {
                                *counter += 1;
                                counter.to_string()
                            })
                            .clone();
                        doc.set_attr(c, ATTR_CLONE, &key);
                        doc.append_child(container, c);
                        clones.insert(ancestor, c);
                        c
                    }
                };
            }

            match frag {
                Fragment::Text { node, start, end } => {
                    let slice = doc
                        .text(*node)
                        .and_then(|t| t.get(*start..*end))
                        .unwrap_or_default()
                        .to_string();
                    let text_node = match text_nodes.get(node) {
                        Some(&t) => t,
                        None => {
                            let t = doc.create_element(TEXT_NODE);
                            doc.append_child(container, t);
                            text_nodes.insert(*node, t);
                            t
                        }
                    };
                    let line = doc.create_element(TEXT_LINE);
                    let text = doc.create_text(&slice);
                    doc.append_child(line, text);
                    doc.append_child(text_node, line);
                }
                Fragment::Inline { node } => doc.append_child(container, *node),
            }
        }

        let owner = group.standalone.and_then(|o| clones.get(&o).copied());
        if let Some(owner) = owner {
            doc.set_attr(owner, ATTR_DATA_CHILD, &group.index.to_string());
        }
        out.push((wrapper, owner));
    }

    for c in original {
        if doc.parent(c) == Some(block) {
            doc.detach(c);
        }
    }
    for &(wrapper, _) in &out {
        doc.append_child(block, wrapper);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;
    use crate::flow::{prepare, FlowTree};
    use crate::fonts::FontManager;
    use crate::layout::TaffyHost;
    use crate::paper::PaperConfig;
    use crate::partition::Partitioner;
    use crate::text_block::{InclusiveFit, SplitConfig, TextBlockSplitter};

    fn annotate(doc: &mut Document, body_height: f32) -> Applied {
        strip(doc);
        let prepared = prepare(doc);
        let geometry = PaperConfig::with_body(400.0, body_height).geometry().unwrap();
        let plan = {
            let surface = TaffyHost::default().layout(doc, prepared.content_flow, 400.0).unwrap();
            let fonts = FontManager::default();
            let splitter = TextBlockSplitter::new(doc, &surface, &fonts, SplitConfig::default());
            let tree = FlowTree::build(doc, &surface, &splitter, prepared.content_flow);
            Partitioner::new(&tree, &InclusiveFit, geometry.body_height, prepared).run()
        };
        apply(doc, &prepared, &plan, &geometry)
    }

    const SIX_LINES: &str = r#"<body><p style="line-height: 20px; margin: 0">one <b>two<br>three</b><br>four<br><tt>five</tt><br>six<br>seven</p><div style="height: 30px"></div></body>"#;

    #[test]
    fn strip_restores_the_original_markup() {
        let mut doc = parse_html(SIX_LINES);
        let original = doc.to_html();
        annotate(&mut doc, 60.0);
        assert_ne!(doc.to_html(), original);
        assert!(strip(&mut doc));
        assert_eq!(doc.to_html(), original);
    }

    #[test]
    fn one_marker_paper_and_chrome_per_page() {
        let mut doc = parse_html(SIX_LINES);
        let applied = annotate(&mut doc, 60.0);
        let count = applied.pages.len();
        assert!(count >= 2);
        assert_eq!(doc.elements_by_name(PAGE_MARKER).len(), count);
        assert_eq!(doc.elements_by_name(VIRTUAL_PAPER).len(), count);
        assert_eq!(doc.elements_by_name(PAGE_CHROME).len(), count);
        let root = doc.first_element_by_name(flow::ROOT).unwrap();
        assert_eq!(doc.attr(root, ATTR_PAGES), Some(count.to_string().as_str()));
        assert!(doc.has_attr(root, ATTR_SUCCESS));
        let footer = doc.elements_by_name(PAGE_FOOTER)[1];
        assert_eq!(doc.text_content(footer), format!("2 / {count}"));
    }

    #[test]
    fn groups_carry_the_text_and_clones() {
        let mut doc = parse_html(SIX_LINES);
        let p = doc.first_element_by_name("p").unwrap();
        let text = doc.text_content(p);
        annotate(&mut doc, 60.0);

        let groups = doc.elements_by_name(TEXT_GROUP);
        assert_eq!(groups.len(), 4);
        for (i, &g) in groups.iter().enumerate() {
            assert_eq!(doc.attr(g, ATTR_DATA_CHILD), Some(i.to_string().as_str()));
        }
        let joined: String = groups.iter().map(|&g| doc.text_content(g)).collect();
        assert_eq!(joined, text);
        // <b> spans lines 1–2, both in the first group: a single clone.
        assert_eq!(doc.elements_by_name("b").len(), 1);
        // The middle group holding only <tt> names it as its owner.
        let tt = doc.first_element_by_name("tt").unwrap();
        assert_eq!(doc.attr(tt, ATTR_DATA_CHILD), Some("2"));
    }

    #[test]
    fn reannotation_is_byte_identical() {
        let mut doc = parse_html(SIX_LINES);
        annotate(&mut doc, 60.0);
        let first = doc.to_html();
        annotate(&mut doc, 60.0);
        assert_eq!(doc.to_html(), first);
    }
}
