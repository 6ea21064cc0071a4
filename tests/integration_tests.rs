//! Integration tests for the paged pipeline.
//!
//! These tests validate:
//! - Line grouping and group placement for the reference scenarios
//! - Forced breaks around empty and near-empty blocks
//! - The markup contract (markers, virtual papers, chrome, anchors)
//! - Idempotent re-pagination and all-or-nothing commits
//! - The diagnostic log order

use paged::annotate::{PAGE_CHROME, PAGE_MARKER, TEXT_GROUP, VIRTUAL_PAPER};
use paged::dom::{parse_html, Document};
use paged::flow::ROOT;
use paged::pipeline::{paginate_html, PaginationConfig, Paginator, PassOutcome};
use paged::report::PassReport;
use paged::{PagedError, PaperConfig};
use sha2::{Digest, Sha256};

// =====================================================================
// Helper
// =====================================================================

fn body_config(body_height: f32) -> PaginationConfig {
    PaginationConfig {
        paper: PaperConfig::with_body(400.0, body_height),
        ..PaginationConfig::default()
    }
}

fn run(doc: &mut Document, config: &PaginationConfig) -> PassReport {
    match Paginator::new(config.clone()).run(doc).unwrap() {
        PassOutcome::Committed(report) => report,
        PassOutcome::Superseded => panic!("a lone paginator cannot be superseded"),
    }
}

fn digest(html: &str) -> Vec<u8> {
    Sha256::digest(html.as_bytes()).to_vec()
}

fn page_attrs(doc: &Document, name: &str) -> Vec<String> {
    doc.elements_by_name(name)
        .into_iter()
        .filter_map(|e| doc.attr(e, "page").map(str::to_string))
        .collect()
}

const SIX_LINES: &str =
    r#"<body><p style="line-height: 20px; margin: 0">a<br>b<br>c<br>d<br>e<br>f</p></body>"#;

fn many_paragraphs(n: usize) -> String {
    let mut html = String::from("<body><h1>Report</h1>");
    for i in 0..n {
        html.push_str(&format!(
            "<p>Paragraph {i} carries a sentence long enough to wrap once the column gets narrow.</p>"
        ));
    }
    html.push_str("</body>");
    html
}

// =====================================================================
// Text block scenarios
// =====================================================================

#[test]
fn six_lines_fit_one_page() {
    let (_, report) = paginate_html(SIX_LINES, &body_config(200.0)).unwrap();
    assert_eq!(report.page_count, 1);
    let block = &report.text_blocks[0];
    assert_eq!(block.lines, 6);
    let counts: Vec<usize> = block.groups.iter().map(|g| g.line_count).collect();
    assert_eq!(counts, vec![2, 1, 1, 2]);
    assert_eq!(report.group_pages(), vec![vec![1, 1, 1, 1]]);
}

#[test]
fn budget_of_four_lines_moves_the_last_group() {
    let (_, report) = paginate_html(SIX_LINES, &body_config(80.0)).unwrap();
    assert_eq!(report.page_count, 2);
    assert_eq!(report.group_pages(), vec![vec![1, 1, 1, 2]]);
    assert_eq!(report.pages[1].start.group, Some(3));
    assert_eq!(report.pages[1].start.tag, TEXT_GROUP);
    assert_eq!(report.pages[0].end.group, Some(2));
}

#[test]
fn budget_of_three_lines_splits_in_the_middle() {
    let (html, report) = paginate_html(SIX_LINES, &body_config(60.0)).unwrap();
    assert_eq!(report.page_count, 2);
    assert_eq!(report.group_pages(), vec![vec![1, 1, 2, 2]]);
    assert_eq!(report.pages[1].start.group, Some(2));
    let boundary =
        r#"<paged-page page="2"></paged-page><paged-text-group data-child="2" page-start="2">"#;
    assert!(html.contains(boundary));
}

#[test]
fn groups_never_straddle_a_marker() {
    let mut doc = parse_html(SIX_LINES);
    run(&mut doc, &body_config(60.0));
    for group in doc.elements_by_name(TEXT_GROUP) {
        let inside = doc.descendants(group);
        assert!(inside.iter().all(|&n| !doc.is(n, PAGE_MARKER)));
    }
}

// =====================================================================
// Forced breaks
// =====================================================================

#[test]
fn empty_paragraph_before_a_break_ends_the_page() {
    let html = r#"<body><div style="height: 100px"></div><p></p><paged-page-break></paged-page-break><h1>Next</h1></body>"#;
    let (_, report) = paginate_html(html, &body_config(100.0)).unwrap();
    assert_eq!(report.page_count, 2);
    assert_eq!(report.pages[0].end.tag, "p");
    assert_eq!(report.pages[1].start.tag, "h1");
}

#[test]
fn paragraph_with_a_line_break_gets_its_own_page() {
    let html = r#"<body><div style="height: 100px"></div><p><br></p><paged-page-break></paged-page-break><h1>Next</h1></body>"#;
    let (_, report) = paginate_html(html, &body_config(100.0)).unwrap();
    assert_eq!(report.page_count, 3);
    assert_eq!(report.pages[1].start.tag, "p");
    assert_eq!(report.pages[2].start.tag, "h1");
}

#[test]
fn trailing_break_opens_no_page() {
    let html = r#"<body><p>Only</p><div style="break-after: page"></div></body>"#;
    let (_, report) = paginate_html(html, &body_config(100.0)).unwrap();
    assert_eq!(report.page_count, 1);
}

#[test]
fn break_inside_avoid_moves_the_container_whole() {
    let inner = r#"<p style="height: 15px; margin: 0"></p><p style="height: 15px; margin: 0"></p>"#;
    let split = format!(r#"<body><div style="height: 80px"></div><div>{inner}</div></body>"#);
    let kept = format!(
        r#"<body><div style="height: 80px"></div><div style="break-inside: avoid">{inner}</div></body>"#
    );

    let (_, report) = paginate_html(&split, &body_config(100.0)).unwrap();
    assert_eq!(report.page_count, 2);
    assert_eq!(report.pages[1].start.tag, "p");

    let (_, report) = paginate_html(&kept, &body_config(100.0)).unwrap();
    assert_eq!(report.page_count, 2);
    assert_eq!(report.pages[1].start.tag, "div");
}

#[test]
fn break_nested_in_a_short_section_still_splits() {
    let html = r#"<body><section><div style="height: 10px"></div><paged-page-break></paged-page-break><div style="height: 10px"></div></section></body>"#;
    let (_, report) = paginate_html(html, &body_config(100.0)).unwrap();
    assert_eq!(report.page_count, 2);
    assert_eq!(report.pages[1].start.tag, "div");
}

#[test]
fn heading_moves_with_the_box_after_it() {
    let html = r#"<body><div style="height: 80px"></div><h2 style="margin: 0; height: 10px">Totals</h2><div style="height: 20px"></div></body>"#;
    let mut doc = parse_html(html);
    let report = run(&mut doc, &body_config(100.0));
    assert_eq!(report.page_count, 2);
    assert_eq!(report.pages[1].start.tag, "h2");
    let h2 = doc.first_element_by_name("h2").unwrap();
    assert_eq!(doc.attr(h2, "page-start"), Some("2"));
}

// =====================================================================
// Markup contract
// =====================================================================

#[test]
fn short_document_is_one_page() {
    let mut doc = parse_html("<body><h1>Title</h1><p>Short body.</p></body>");
    let report = run(&mut doc, &PaginationConfig::default());
    assert_eq!(report.page_count, 1);
    assert!(report.success);
    assert_eq!(page_attrs(&doc, PAGE_MARKER), vec!["1"]);
    assert!(doc.elements_with_attr("page-start", Some("2")).is_empty());
}

#[test]
fn one_marker_paper_and_chrome_per_page() {
    let mut doc = parse_html(&many_paragraphs(120));
    let report = run(&mut doc, &PaginationConfig::default());
    let n = report.page_count;
    assert!(n >= 2, "expected several pages, got {n}");

    let expected: Vec<String> = (1..=n).map(|k| k.to_string()).collect();
    assert_eq!(page_attrs(&doc, PAGE_MARKER), expected);
    assert_eq!(page_attrs(&doc, VIRTUAL_PAPER), expected);
    assert_eq!(page_attrs(&doc, PAGE_CHROME), expected);

    let root = doc.first_element_by_name(ROOT).unwrap();
    assert_eq!(doc.attr(root, "pages"), Some(n.to_string().as_str()));
    assert!(doc.has_attr(root, "success"));
}

#[test]
fn page_numbers_increase_by_one_in_document_order() {
    let mut doc = parse_html(&many_paragraphs(120));
    let report = run(&mut doc, &PaginationConfig::default());
    let numbers: Vec<usize> = report.pages.iter().map(|p| p.number).collect();
    assert_eq!(numbers, (1..=report.page_count).collect::<Vec<_>>());

    let starts: Vec<String> = doc
        .descendants(doc.root())
        .into_iter()
        .filter_map(|n| doc.attr(n, "page-start").map(str::to_string))
        .collect();
    let expected: Vec<String> = (2..=report.page_count).map(|k| k.to_string()).collect();
    // Page 1 starts at the content-flow start sentinel.
    assert_eq!(starts[0], "1");
    assert_eq!(starts[1..].to_vec(), expected);
}

#[test]
fn boundary_margins_are_zeroed_only_at_the_boundary() {
    let html = r#"<body><div id="a" style="height: 60px; margin-bottom: 10px"></div><div id="b" style="height: 20px; margin: 5px 0"></div><div id="c" style="height: 50px; margin-top: 15px"></div></body>"#;
    let mut doc = parse_html(html);
    let report = run(&mut doc, &body_config(100.0));
    assert_eq!(report.page_count, 2);

    let by_id = |id: &str| doc.elements_with_attr("id", Some(id))[0];
    let style = |id: &str| doc.attr(by_id(id), "style").unwrap_or_default().to_string();
    assert!(!style("a").contains("!important"));
    assert!(style("b").contains("margin-bottom: 0px !important"));
    assert!(!style("b").contains("margin-top: 0px"));
    assert!(style("c").contains("margin-top: 0px !important"));
    assert!(!style("c").contains("margin-bottom: 0px"));
}

#[test]
fn unsupported_case_withholds_success() {
    let html = r#"<body><div style="height: 80px"></div><div style="position: relative; top: 6px; height: 50px"></div></body>"#;
    let mut doc = parse_html(html);
    let report = run(&mut doc, &body_config(100.0));
    assert_eq!(report.page_count, 2);
    assert!(!report.success);
    assert!(report.warnings.iter().any(|w| w.contains("relative offset")));
    let root = doc.first_element_by_name(ROOT).unwrap();
    assert!(!doc.has_attr(root, "success"));
}

// =====================================================================
// Re-pagination
// =====================================================================

#[test]
fn repagination_is_byte_identical() {
    let config = body_config(60.0);
    let head = &SIX_LINES[..SIX_LINES.len() - 7];
    let mut doc = parse_html(&format!("{head}<h2>Tail</h2></body>"));
    run(&mut doc, &config);
    let first = doc.to_html();
    run(&mut doc, &config);
    assert_eq!(digest(&doc.to_html()), digest(&first));

    let (again, _) = paginate_html(&first, &config).unwrap();
    assert_eq!(digest(&again), digest(&first));
}

#[test]
fn invalid_paper_leaves_the_document_alone() {
    let mut doc = parse_html(SIX_LINES);
    let before = doc.to_html();
    let config = PaginationConfig {
        paper: PaperConfig {
            paper_width: 0.0,
            ..PaperConfig::default()
        },
        ..PaginationConfig::default()
    };
    let err = Paginator::new(config).run(&mut doc).unwrap_err();
    assert!(matches!(err, PagedError::Configuration(_)));
    assert_eq!(doc.to_html(), before);
}

// =====================================================================
// Diagnostics
// =====================================================================

#[test]
fn log_lines_come_in_contract_order() {
    let html = r#"<body><div style="height: 10px"></div><div style="height: 150px"></div></body>"#;
    let (_, report) = paginate_html(html, &body_config(100.0)).unwrap();
    let log = &report.log;
    assert!(log[0].starts_with("Version: "));
    assert!(log[1].starts_with("Config: {"));
    assert!(log[2].starts_with("Warning: "));
    assert_eq!(log[log.len() - 2], "Page count: 2");
    assert!(log[log.len() - 1].starts_with("Total time: "));
    assert_eq!(log.iter().filter(|l| l.starts_with("Page count:")).count(), 1);
}

#[test]
fn report_json_roundtrip() {
    let (_, report) = paginate_html(SIX_LINES, &body_config(60.0)).unwrap();
    let back = PassReport::from_json(&report.to_json().unwrap()).unwrap();
    assert_eq!(back, report);
}
