//! # paged – HTML pagination engine
//!
//! Splits an HTML document's flowing content into fixed-size virtual pages
//! and writes the result back onto the document as markup a host can render
//! on screen or print. The stages of one pass are:
//!
//! 1. **Prepare** – wrap the body in the paper/overlay/content flows and
//!    isolate inline runs ([`flow`])
//! 2. **Measure** – lay the content flow out through a [`layout::LayoutHost`]
//!    and read geometry from a [`surface::Surface`]
//! 3. **Plan** – collapse margins ([`collapse`]), break text into line groups
//!    ([`text_block`]) and choose page boundaries ([`partition`])
//! 4. **Annotate** – write markers, anchors, text groups and page chrome onto
//!    a staged copy ([`annotate`])
//! 5. **Commit** – swap the staged copy in and emit the diagnostic log
//!    ([`pipeline`], [`diagnostics`])
//!
//! The document model ([`dom`]) and cascade ([`style`]) are deliberately
//! small: they cover controlled, template-like inputs.

pub mod annotate;
pub mod collapse;
pub mod diagnostics;
pub mod dom;
pub mod error;
pub mod flow;
pub mod fonts;
pub mod layout;
pub mod paper;
pub mod partition;
pub mod pipeline;
pub mod report;
pub mod style;
pub mod surface;
pub mod text_block;

// Re-exports for convenience
pub use error::{PagedError, Result};
pub use paper::{PageOrientation, PaperConfig};
pub use pipeline::{paginate_html, PaginationConfig, Paginator, PassOutcome, RelayoutHandle};
pub use report::PassReport;
