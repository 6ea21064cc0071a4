//! Pipeline – ties together preparation, measurement, planning and
//! annotation into one pagination pass.
//!
//! A pass works on a staged clone of the document and swaps it in only when
//! it commits. Geometry that moves while the pass reads it aborts the attempt
//! and the pass starts over; a newer pass requested through the
//! [`RelayoutHandle`] makes the older one commit nothing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::annotate::{self, Applied};
use crate::diagnostics::EventLog;
use crate::dom::{parse_html, Document, NodeId};
use crate::error::{PagedError, Result};
use crate::flow::{self, FlowTree};
use crate::layout::{LayoutHost, TaffyHost};
use crate::paper::{PageGeometry, PaperConfig};
use crate::partition::{AnchorRef, Partitioner, Plan};
use crate::report::{AnchorReport, GroupReport, PageReport, PassReport, TextBlockReport};
use crate::text_block::{FitPolicy, InclusiveFit, SplitConfig, TextBlockSplitter};

/// Configuration of a pagination pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub paper: PaperConfig,
    pub split: SplitConfig,
    /// Attempts before a measurement inconsistency is reported (default: 3).
    pub max_attempts: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            paper: PaperConfig::default(),
            split: SplitConfig::default(),
            max_attempts: 3,
        }
    }
}

impl PaginationConfig {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Generation counter shared by everyone who may request a relayout.
/// The latest request wins; older passes notice and back off.
#[derive(Debug, Clone, Default)]
pub struct RelayoutHandle {
    generation: Arc<AtomicU64>,
}

impl RelayoutHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation, superseding any pass in flight.
    pub fn request(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    Committed(PassReport),
    /// A newer pass was requested; the document was left untouched.
    Superseded,
}

/// What one successful attempt produced, not yet committed.
struct Staged {
    doc: Document,
    plan: Plan,
    applied: Applied,
}

pub struct Paginator<H: LayoutHost = TaffyHost> {
    host: H,
    config: PaginationConfig,
    handle: RelayoutHandle,
    fit: Box<dyn FitPolicy>,
}

impl Paginator<TaffyHost> {
    /// A paginator over the bundled Taffy host with heuristic font metrics.
    pub fn new(config: PaginationConfig) -> Self {
        Self::with_host(TaffyHost::default(), config)
    }
}

impl<H: LayoutHost> Paginator<H> {
    pub fn with_host(host: H, config: PaginationConfig) -> Self {
        Self {
            host,
            config,
            handle: RelayoutHandle::new(),
            fit: Box::new(InclusiveFit),
        }
    }

    /// Share a relayout handle with other requesters.
    pub fn with_handle(mut self, handle: RelayoutHandle) -> Self {
        self.handle = handle;
        self
    }

    pub fn with_fit_policy(mut self, fit: impl FitPolicy + 'static) -> Self {
        self.fit = Box::new(fit);
        self
    }

    pub fn handle(&self) -> RelayoutHandle {
        self.handle.clone()
    }

    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// Paginate `doc` in place.
    ///
    /// Invalid paper settings fail before the document is touched. On any
    /// error, and when superseded, `doc` is left exactly as it was.
    pub fn run(&self, doc: &mut Document) -> Result<PassOutcome> {
        let started = Instant::now();
        let geometry = self.config.paper.geometry()?;
        let generation = self.handle.request();
        let max_attempts = self.config.max_attempts.max(1);

        let mut attempt = 0;
        let staged = loop {
            attempt += 1;
            match self.attempt(doc, &geometry, generation) {
                Ok(Some(staged)) => break staged,
                Ok(None) => {
                    log::debug!("pass {generation} superseded by {}", self.handle.current());
                    return Ok(PassOutcome::Superseded);
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    log::warn!("attempt {attempt}/{max_attempts} aborted: {e}");
                }
                Err(e) => return Err(e),
            }
        };

        let Staged { doc: staged, plan, applied } = staged;
        let mut events = EventLog::new();
        events.version(env!("CARGO_PKG_VERSION"));
        events.config(&serde_json::to_string(&self.config)?);
        let warnings = plan_warnings(&plan);
        for w in &warnings {
            events.warn(w.as_str());
        }
        events.page_count(plan.page_count());
        events.total_time(started.elapsed());

        *doc = staged;
        let mut report = build_report(doc, &geometry, &plan, &applied, attempt);
        report.warnings = warnings;
        report.log = events.flush();
        Ok(PassOutcome::Committed(report))
    }

    /// One attempt from a pristine staged copy. `None` when superseded.
    fn attempt(
        &self,
        doc: &Document,
        geometry: &PageGeometry,
        generation: u64,
    ) -> Result<Option<Staged>> {
        let mut staged = doc.clone();
        annotate::strip(&mut staged);
        let prepared = flow::prepare(&mut staged);

        let surface = self
            .host
            .measure(&staged, prepared.content_flow, geometry.printable_width)?;
        let before = surface.revision();

        let plan = {
            let splitter = TextBlockSplitter::new(
                &staged,
                surface.as_ref(),
                self.host.fonts(),
                self.config.split,
            );
            let tree = FlowTree::build(&staged, surface.as_ref(), &splitter, prepared.content_flow);
            Partitioner::new(&tree, self.fit.as_ref(), geometry.body_height, prepared).run()
        };

        let after = surface.revision();
        if after != before {
            return Err(PagedError::MeasurementInconsistency(format!(
                "surface revision moved from {before} to {after} during planning"
            )));
        }
        if self.handle.current() != generation {
            return Ok(None);
        }

        let applied = annotate::apply(&mut staged, &prepared, &plan, geometry);
        Ok(Some(Staged {
            doc: staged,
            plan,
            applied,
        }))
    }
}

/// Parse `html`, paginate it with a fresh paginator and serialize the result.
pub fn paginate_html(html: &str, config: &PaginationConfig) -> Result<(String, PassReport)> {
    let mut doc = parse_html(html);
    match Paginator::new(config.clone()).run(&mut doc)? {
        PassOutcome::Committed(report) => Ok((doc.to_html(), report)),
        PassOutcome::Superseded => Err(PagedError::Layout("pass superseded".into())),
    }
}

fn plan_warnings(plan: &Plan) -> Vec<String> {
    let mut out = plan.warnings.clone();
    out.extend(plan.unsupported.iter().map(|(node, reason)| {
        PagedError::Unsupported {
            node: *node,
            reason: reason.clone(),
        }
        .to_string()
    }));
    out
}

fn build_report(
    doc: &Document,
    geometry: &PageGeometry,
    plan: &Plan,
    applied: &Applied,
    attempts: usize,
) -> PassReport {
    let anchor = |node: NodeId, anchor: AnchorRef| AnchorReport {
        node: node.0,
        group: match anchor {
            AnchorRef::Group { block, index } if applied.groups.contains_key(&(block, index)) => {
                Some(index)
            }
            _ => None,
        },
        tag: doc.tag(node).map(|t| t.name().to_string()).unwrap_or_default(),
    };

    let pages = applied
        .pages
        .iter()
        .zip(&plan.pages)
        .map(|(&(number, start, end), page)| PageReport {
            number,
            body_top: geometry.body_offset(number),
            start: anchor(start, page.start),
            end: anchor(end, page.end),
        })
        .collect();

    let text_blocks = plan
        .text_blocks
        .iter()
        .map(|b| TextBlockReport {
            node: b.split.block.0,
            lines: b.split.lines.len(),
            groups: b
                .split
                .groups
                .iter()
                .zip(&b.group_pages)
                .map(|(g, &page)| GroupReport {
                    index: g.index,
                    first_line: g.lines.start,
                    line_count: g.line_count(),
                    page,
                })
                .collect(),
        })
        .collect();

    PassReport {
        page_count: plan.page_count(),
        success: plan.success(),
        attempts,
        pages,
        text_blocks,
        warnings: Vec::new(),
        log: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::fonts::FontManager;
    use crate::layout::LayoutTree;
    use crate::style::StyleMap;
    use crate::surface::{BoxGeometry, Surface};

    fn config(body_height: f32) -> PaginationConfig {
        PaginationConfig {
            paper: PaperConfig::with_body(400.0, body_height),
            ..PaginationConfig::default()
        }
    }

    /// A surface whose revision moves on every read.
    struct Drifting {
        inner: LayoutTree,
        reads: Cell<u64>,
    }

    impl Surface for Drifting {
        fn styles(&self) -> &StyleMap {
            self.inner.styles()
        }

        fn geometry(&self, node: NodeId) -> Option<BoxGeometry> {
            self.inner.geometry(node)
        }

        fn revision(&self) -> u64 {
            self.reads.set(self.reads.get() + 1);
            self.reads.get()
        }
    }

    /// Hands out drifting surfaces for the first `unstable` measurements.
    struct UnstableHost {
        inner: TaffyHost,
        unstable: Cell<usize>,
    }

    impl LayoutHost for UnstableHost {
        fn fonts(&self) -> &FontManager {
            self.inner.fonts()
        }

        fn measure(
            &self,
            doc: &Document,
            content_flow: NodeId,
            width: f32,
        ) -> Result<Box<dyn Surface>> {
            let inner = self.inner.layout(doc, content_flow, width)?;
            if self.unstable.get() > 0 {
                self.unstable.set(self.unstable.get() - 1);
                return Ok(Box::new(Drifting {
                    inner,
                    reads: Cell::new(0),
                }));
            }
            Ok(Box::new(inner))
        }
    }

    /// Requests a newer generation while measuring.
    struct InterruptingHost {
        inner: TaffyHost,
        handle: RelayoutHandle,
    }

    impl LayoutHost for InterruptingHost {
        fn fonts(&self) -> &FontManager {
            self.inner.fonts()
        }

        fn measure(
            &self,
            doc: &Document,
            content_flow: NodeId,
            width: f32,
        ) -> Result<Box<dyn Surface>> {
            self.handle.request();
            self.inner.measure(doc, content_flow, width)
        }
    }

    const HTML: &str =
        r#"<body><div style="height: 70px"></div><div style="height: 70px"></div></body>"#;

    #[test]
    fn pipeline_basic() {
        let (html, report) = paginate_html(HTML, &config(100.0)).unwrap();
        assert_eq!(report.page_count, 2);
        assert!(report.success);
        assert_eq!(report.attempts, 1);
        assert!(html.contains(r#"<paged-root pages="2" success>"#));
    }

    #[test]
    fn drifting_geometry_is_retried() {
        let host = UnstableHost {
            inner: TaffyHost::default(),
            unstable: Cell::new(1),
        };
        let mut doc = parse_html(HTML);
        let outcome = Paginator::with_host(host, config(100.0)).run(&mut doc).unwrap();
        let PassOutcome::Committed(report) = outcome else {
            panic!("expected a committed pass");
        };
        assert_eq!(report.attempts, 2);
        assert_eq!(report.page_count, 2);
    }

    #[test]
    fn persistent_drift_fails_without_touching_the_document() {
        let host = UnstableHost {
            inner: TaffyHost::default(),
            unstable: Cell::new(10),
        };
        let mut doc = parse_html(HTML);
        let before = doc.to_html();
        let err = Paginator::with_host(host, config(100.0)).run(&mut doc).unwrap_err();
        assert!(matches!(err, PagedError::MeasurementInconsistency(_)));
        assert_eq!(doc.to_html(), before);
    }

    #[test]
    fn superseded_pass_commits_nothing() {
        let handle = RelayoutHandle::new();
        let host = InterruptingHost {
            inner: TaffyHost::default(),
            handle: handle.clone(),
        };
        let mut doc = parse_html(HTML);
        let before = doc.to_html();
        let outcome = Paginator::with_host(host, config(100.0))
            .with_handle(handle)
            .run(&mut doc)
            .unwrap();
        assert_eq!(outcome, PassOutcome::Superseded);
        assert_eq!(doc.to_html(), before);
    }

    #[test]
    fn invalid_paper_is_rejected_up_front() {
        let mut cfg = config(100.0);
        cfg.paper.margin_top = 80.0;
        cfg.paper.margin_bottom = 80.0;
        let mut doc = parse_html(HTML);
        let before = doc.to_html();
        let err = Paginator::new(cfg).run(&mut doc).unwrap_err();
        assert!(matches!(err, PagedError::Configuration(_)));
        assert_eq!(doc.to_html(), before);
    }

    #[test]
    fn config_json_roundtrip() {
        let cfg = config(250.0);
        assert_eq!(PaginationConfig::from_json(&cfg.to_json().unwrap()).unwrap(), cfg);
        let partial = PaginationConfig::from_json(r#"{"max_attempts": 5}"#).unwrap();
        assert_eq!(partial.max_attempts, 5);
        assert_eq!(partial.paper, PaperConfig::default());
    }
}
