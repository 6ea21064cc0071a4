//! Paper/page model – paper size, print margins and header/footer chrome,
//! reduced to the printable body every page offers to the content flow.
//!
//! All lengths are CSS pixels (96 per inch).

use serde::{Deserialize, Serialize};

use crate::error::{PagedError, Result};

/// A4 at 96 dpi.
pub const A4_WIDTH_PX: f32 = 794.0;
pub const A4_HEIGHT_PX: f32 = 1123.0;

/// Page orientation for the virtual paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageOrientation {
    /// Portrait mode: height > width (default).
    #[default]
    Portrait,
    /// Landscape mode: width and height swapped.
    Landscape,
}

/// User-facing paper settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperConfig {
    /// Paper width in px, before orientation (default: A4 = 794).
    pub paper_width: f32,
    /// Paper height in px, before orientation (default: A4 = 1123).
    pub paper_height: f32,
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    /// Height reserved for the running header on every page.
    pub header_height: f32,
    /// Height reserved for the running footer (page number label).
    pub footer_height: f32,
    /// Vertical gap between virtual papers in the on-screen preview.
    pub virtual_pages_gap: f32,
    pub orientation: PageOrientation,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            paper_width: A4_WIDTH_PX,
            paper_height: A4_HEIGHT_PX,
            margin_top: 48.0,
            margin_right: 64.0,
            margin_bottom: 48.0,
            margin_left: 64.0,
            header_height: 0.0,
            footer_height: 32.0,
            virtual_pages_gap: 16.0,
            orientation: PageOrientation::Portrait,
        }
    }
}

impl PaperConfig {
    /// Create an A4 landscape config.
    pub fn a4_landscape() -> Self {
        Self {
            orientation: PageOrientation::Landscape,
            ..Self::default()
        }
    }

    /// A paper whose printable body is exactly `width` × `body_height`
    /// (no margins, no chrome). Handy for hosts that already did the maths.
    pub fn with_body(width: f32, body_height: f32) -> Self {
        Self {
            paper_width: width,
            paper_height: body_height,
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            header_height: 0.0,
            footer_height: 0.0,
            virtual_pages_gap: 0.0,
            orientation: PageOrientation::Portrait,
        }
    }

    /// Effective paper width after applying orientation.
    pub fn effective_width(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.paper_width,
            PageOrientation::Landscape => self.paper_height,
        }
    }

    /// Effective paper height after applying orientation.
    pub fn effective_height(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.paper_height,
            PageOrientation::Landscape => self.paper_width,
        }
    }

    /// Validate the settings and derive the page geometry.
    pub fn geometry(&self) -> Result<PageGeometry> {
        let inputs = [
            ("paper_width", self.paper_width),
            ("paper_height", self.paper_height),
            ("margin_top", self.margin_top),
            ("margin_right", self.margin_right),
            ("margin_bottom", self.margin_bottom),
            ("margin_left", self.margin_left),
            ("header_height", self.header_height),
            ("footer_height", self.footer_height),
            ("virtual_pages_gap", self.virtual_pages_gap),
        ];
        for (name, value) in inputs {
            if !value.is_finite() || value < 0.0 {
                return Err(PagedError::Configuration(format!(
                    "{name} must be a finite, non-negative length (got {value})"
                )));
            }
        }

        let paper_width = self.effective_width();
        let paper_height = self.effective_height();
        let printable_width = paper_width - self.margin_left - self.margin_right;
        let body_height = paper_height
            - self.margin_top
            - self.margin_bottom
            - self.header_height
            - self.footer_height;

        if printable_width <= 0.0 {
            return Err(PagedError::Configuration(format!(
                "printable width is {printable_width}px; margins exceed the paper width"
            )));
        }
        if body_height <= 0.0 {
            return Err(PagedError::Configuration(format!(
                "printable height is {body_height}px; margins and chrome exceed the paper height"
            )));
        }

        Ok(PageGeometry {
            paper_width,
            paper_height,
            printable_width,
            body_height,
            margin_top: self.margin_top,
            margin_left: self.margin_left,
            header_height: self.header_height,
            footer_height: self.footer_height,
            gap: self.virtual_pages_gap,
        })
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialise from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Validated geometry of one virtual page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageGeometry {
    pub paper_width: f32,
    pub paper_height: f32,
    /// Width available to the content flow.
    pub printable_width: f32,
    /// Height available to the content flow on every page.
    pub body_height: f32,
    pub margin_top: f32,
    pub margin_left: f32,
    pub header_height: f32,
    pub footer_height: f32,
    pub gap: f32,
}

impl PageGeometry {
    /// Top edge of virtual paper `page` (1-based) in the paper flow.
    pub fn paper_offset(&self, page: usize) -> f32 {
        page.saturating_sub(1) as f32 * (self.paper_height + self.gap)
    }

    /// Top edge of the body area of `page` in the paper flow.
    pub fn body_offset(&self, page: usize) -> f32 {
        self.paper_offset(page) + self.margin_top + self.header_height
    }

    /// Total height of a paper flow holding `pages` virtual papers.
    pub fn paper_flow_height(&self, pages: usize) -> f32 {
        if pages == 0 {
            0.0
        } else {
            self.paper_offset(pages) + self.paper_height
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_defaults_yield_positive_body() {
        let g = PaperConfig::default().geometry().unwrap();
        assert_eq!(g.printable_width, 794.0 - 128.0);
        assert_eq!(g.body_height, 1123.0 - 96.0 - 32.0);
    }

    #[test]
    fn landscape_swaps_dimensions() {
        let g = PaperConfig::a4_landscape().geometry().unwrap();
        assert_eq!(g.paper_width, A4_HEIGHT_PX);
        assert_eq!(g.paper_height, A4_WIDTH_PX);
    }

    #[test]
    fn zero_or_negative_area_is_a_configuration_error() {
        let cfg = PaperConfig {
            margin_top: 600.0,
            margin_bottom: 600.0,
            ..PaperConfig::default()
        };
        assert!(matches!(cfg.geometry(), Err(PagedError::Configuration(_))));

        let cfg = PaperConfig::with_body(0.0, 100.0);
        assert!(matches!(cfg.geometry(), Err(PagedError::Configuration(_))));

        let cfg = PaperConfig {
            header_height: -1.0,
            ..PaperConfig::default()
        };
        assert!(matches!(cfg.geometry(), Err(PagedError::Configuration(_))));
    }

    #[test]
    fn paper_offsets_include_gap() {
        let cfg = PaperConfig {
            virtual_pages_gap: 10.0,
            ..PaperConfig::with_body(100.0, 200.0)
        };
        let g = cfg.geometry().unwrap();
        assert_eq!(g.paper_offset(1), 0.0);
        assert_eq!(g.paper_offset(3), 420.0);
        assert_eq!(g.paper_flow_height(2), 410.0);
    }

    #[test]
    fn json_keeps_defaults_for_missing_fields() {
        let json = r#"{"paper_height": 500, "orientation": "landscape"}"#;
        let cfg = PaperConfig::from_json(json).unwrap();
        assert_eq!(cfg.paper_height, 500.0);
        assert_eq!(cfg.paper_width, A4_WIDTH_PX);
        assert_eq!(cfg.orientation, PageOrientation::Landscape);
    }
}
