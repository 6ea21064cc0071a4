//! Pass report – a frozen, serializable summary of what a committed pass
//! wrote onto the document: where each page starts and ends, and where every
//! split text block's groups landed.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Result of one committed pagination pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassReport {
    pub page_count: usize,
    /// False when an unsupported layout case was met.
    pub success: bool,
    /// Passes run before this one committed (1 when nothing was retried).
    pub attempts: usize,
    pub pages: Vec<PageReport>,
    #[serde(default)]
    pub text_blocks: Vec<TextBlockReport>,
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Diagnostic log lines, in emission order.
    #[serde(default)]
    pub log: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageReport {
    pub number: usize,
    /// Top of the page body in the paper flow, in px.
    pub body_top: f32,
    pub start: AnchorReport,
    pub end: AnchorReport,
}

/// A page anchor. `node` is an arena index into the committed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorReport {
    pub node: usize,
    /// Set when the anchor is a text group wrapper.
    pub group: Option<usize>,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlockReport {
    pub node: usize,
    pub lines: usize,
    pub groups: Vec<GroupReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupReport {
    pub index: usize,
    pub first_line: usize,
    pub line_count: usize,
    pub page: usize,
}

impl PassReport {
    /// Serialise to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Page of every group, block by block.
    pub fn group_pages(&self) -> Vec<Vec<usize>> {
        self.text_blocks
            .iter()
            .map(|b| b.groups.iter().map(|g| g.page).collect())
            .collect()
    }
}
