// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sign numbers from a page's embedded text layer
//!
//! The structured layer (blocks, lines, spans) gives exact boxes per text run.
//! A second walk over the plain block text catches labels the structured
//! layer split or merged oddly; those only get an approximate box.

use crate::config::{DuplicatePolicy, EmbeddedConfig};
use crate::geometry::hotspot;
use crate::label::is_label;
use crate::types::{BBox, Confidence, LabelDetection};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Block type of text blocks in the structured layer (images use 1)
const TEXT_BLOCK: u32 = 0;

/// Structured text layer of one page
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TextLayer {
    #[serde(default)]
    pub blocks: Vec<TextBlock>,
    /// Block-level plain text, used as a fallback
    #[serde(default)]
    pub plain_blocks: Vec<PlainBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextBlock {
    #[serde(rename = "type", default)]
    pub kind: u32,
    #[serde(default)]
    pub lines: Vec<TextLine>,
}

impl TextBlock {
    pub fn is_text(&self) -> bool {
        self.kind == TEXT_BLOCK
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextLine {
    #[serde(default)]
    pub spans: Vec<TextSpan>,
}

/// A run of text with uniform styling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextSpan {
    pub text: String,
    /// `[x0, y0, x1, y1]` in page units
    pub bbox: [f64; 4],
}

/// Plain text of a whole block, possibly spanning several lines
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlainBlock {
    pub bbox: [f64; 4],
    pub text: String,
}

/// Text layer together with the page size it is expressed in
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PageText {
    pub width: f64,
    pub height: f64,
    #[serde(flatten)]
    pub layer: TextLayer,
}

impl PageText {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Extract every sign number from a text layer
pub fn extract_embedded(
    layer: &TextLayer,
    page_width: f64,
    page_height: f64,
    page_number: u32,
    config: &EmbeddedConfig,
) -> Vec<LabelDetection> {
    let mut detections = Vec::new();
    let mut seen: FxHashSet<String> = FxHashSet::default();

    let detection = |label: &str, bbox: BBox| LabelDetection {
        label_text: label.to_string(),
        page_number,
        source_bbox: bbox,
        hotspot_bbox: hotspot(&bbox, page_width, page_height, config.hotspot_expansion),
        confidence: Confidence::Embedded,
        group: None,
    };

    let spans = layer
        .blocks
        .iter()
        .filter(|block| block.is_text())
        .flat_map(|block| &block.lines)
        .flat_map(|line| &line.spans);

    for span in spans {
        let text = span.text.trim();
        if !is_label(text) {
            continue;
        }
        if config.duplicates == DuplicatePolicy::FirstPerLabel && seen.contains(text) {
            continue;
        }
        seen.insert(text.to_string());
        detections.push(detection(text, BBox::from_corners(span.bbox)));
    }

    let structured = detections.len();

    // Plain text only contributes labels not found so far
    for block in &layer.plain_blocks {
        let lines: Vec<&str> = block.text.trim().split('\n').collect();
        let [x0, y0, x1, y1] = block.bbox;
        let line_height = (y1 - y0) / lines.len() as f64;

        for line in &lines {
            let text = line.trim();
            if !is_label(text) || seen.contains(text) {
                continue;
            }
            seen.insert(text.to_string());
            detections.push(detection(text, BBox::new(x0, y0, x1 - x0, line_height)));
        }
    }

    debug!(
        page = page_number,
        structured,
        fallback = detections.len() - structured,
        "Embedded text labels"
    );
    detections
}
