// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extraction configuration
//!
//! Every threshold used by the pipeline lives here so that several document
//! families (each with their own palette and label size) can be processed
//! side by side. `Default` reproduces the reference deployment: pages
//! rendered at 400 DPI with the six-color marker palette.

use crate::ocr::SegmentationMode;
use serde::{Deserialize, Serialize};

/// Inclusive range in 8-bit HSV space (H in 0..180, S and V in 0..256)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HsvRange {
    pub name: String,
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub fn new(name: &str, lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self {
            name: name.to_string(),
            lower,
            upper,
        }
    }

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| self.lower[i] <= hsv[i] && hsv[i] <= self.upper[i])
    }
}

/// Marker box outline/fill colors used across the document family
pub fn default_palette() -> Vec<HsvRange> {
    vec![
        HsvRange::new("orange", [8, 80, 80], [25, 255, 220]),
        HsvRange::new("brown", [5, 50, 50], [30, 200, 200]),
        HsvRange::new("blue", [90, 30, 30], [140, 255, 255]),
        HsvRange::new("teal", [150, 30, 30], [200, 255, 255]),
        HsvRange::new("green", [35, 30, 30], [85, 255, 255]),
        HsvRange::new("purple", [140, 30, 30], [170, 255, 255]),
    ]
}

/// Size and shape bounds for candidate marker boxes, relative to the page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BoxFilterConfig {
    /// Minimum width (% of page width)
    pub min_width_percent: f64,
    /// Maximum width (% of page width)
    pub max_width_percent: f64,
    /// Minimum height (% of page height)
    pub min_height_percent: f64,
    /// Maximum height (% of page height)
    pub max_height_percent: f64,
    /// Minimum width / height
    pub min_aspect_ratio: f64,
    /// Maximum width / height
    pub max_aspect_ratio: f64,
}

impl Default for BoxFilterConfig {
    fn default() -> Self {
        Self {
            min_width_percent: 0.3,
            max_width_percent: 5.0,
            min_height_percent: 0.2,
            max_height_percent: 3.0,
            min_aspect_ratio: 0.5,
            max_aspect_ratio: 3.0,
        }
    }
}

/// Mask cleanup sequence: close, dilate, erode
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MorphologyConfig {
    /// Structuring element radius (1 = 3x3 square)
    pub kernel_radius: u8,
    pub close_iterations: u8,
    pub dilate_iterations: u8,
    pub erode_iterations: u8,
}

impl Default for MorphologyConfig {
    fn default() -> Self {
        Self {
            kernel_radius: 1,
            close_iterations: 1,
            dilate_iterations: 2,
            erode_iterations: 1,
        }
    }
}

/// Stacked marker box splitting
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StackingConfig {
    /// Height of a single marker box in pixels at the render DPI
    pub standard_height_px: u32,
}

impl Default for StackingConfig {
    fn default() -> Self {
        Self {
            standard_height_px: 40,
        }
    }
}

/// OCR ensemble parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OcrConfig {
    /// Pixels added above the marker box (labels sit above their box)
    pub roi_above_px: u32,
    /// Pixels added below the marker box
    pub roi_below_px: u32,
    /// Pixels added left and right of the marker box
    pub roi_horizontal_px: u32,
    /// Upscale factor applied to the crop before binarization
    pub upscale_factor: u32,
    /// CLAHE clip limit
    pub clahe_clip_limit: f32,
    /// CLAHE tile grid size (tiles per axis)
    pub clahe_tiles: u32,
    /// Characters the engine may emit
    pub whitelist: String,
    /// Layout modes tried for every preprocessing variant
    pub modes: Vec<SegmentationMode>,
    /// Readings at or below this mean confidence are dropped
    pub min_confidence: f64,
    /// Minimum cleaned text length
    pub min_text_len: usize,
    /// Only keep readings that form a complete sign number
    pub require_label_pattern: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            roi_above_px: 50,
            roi_below_px: 10,
            roi_horizontal_px: 20,
            upscale_factor: 2,
            clahe_clip_limit: 2.0,
            clahe_tiles: 8,
            whitelist: "0123456789.-".to_string(),
            modes: vec![SegmentationMode::SingleWord, SegmentationMode::SparseText],
            min_confidence: 30.0,
            min_text_len: 3,
            require_label_pattern: true,
        }
    }
}

/// What to do with a label that appears more than once in a text layer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Every matching span is reported (each physical instance counts)
    #[default]
    KeepAll,
    /// Only the first span per label is reported
    FirstPerLabel,
}

/// Embedded text layer extraction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddedConfig {
    /// Fraction of the text box size added on every side of the hotspot
    pub hotspot_expansion: f64,
    pub duplicates: DuplicatePolicy,
}

impl Default for EmbeddedConfig {
    fn default() -> Self {
        Self {
            hotspot_expansion: 0.3,
            duplicates: DuplicatePolicy::KeepAll,
        }
    }
}

/// Series grouping
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GroupingConfig {
    pub enabled: bool,
    /// Alignment tolerance in percentage points
    pub distance_threshold: f64,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            distance_threshold: 2.0,
        }
    }
}

/// Configuration for the whole extraction pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Resolution pages are rendered at for the color/OCR path
    pub render_dpi: u32,
    pub palette: Vec<HsvRange>,
    pub box_filter: BoxFilterConfig,
    pub morphology: MorphologyConfig,
    pub stacking: StackingConfig,
    pub ocr: OcrConfig,
    pub embedded: EmbeddedConfig,
    pub grouping: GroupingConfig,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            render_dpi: 400,
            palette: default_palette(),
            box_filter: BoxFilterConfig::default(),
            morphology: MorphologyConfig::default(),
            stacking: StackingConfig::default(),
            ocr: OcrConfig::default(),
            embedded: EmbeddedConfig::default(),
            grouping: GroupingConfig::default(),
        }
    }
}

impl ExtractionConfig {
    /// Parse a (possibly partial) JSON configuration; missing fields keep
    /// their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_palette_names() {
        let names: Vec<_> = default_palette().into_iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec!["orange", "brown", "blue", "teal", "green", "purple"]
        );
    }

    #[test]
    fn test_hsv_range_is_inclusive() {
        let orange = HsvRange::new("orange", [8, 80, 80], [25, 255, 220]);
        assert!(orange.contains([8, 80, 80]));
        assert!(orange.contains([25, 255, 220]));
        assert!(!orange.contains([26, 100, 100]));
        assert!(!orange.contains([10, 100, 221]));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ExtractionConfig::from_json(
            r#"{ "stacking": { "standard_height_px": 24 }, "grouping": { "distance_threshold": 1.5 } }"#,
        )
        .unwrap();

        assert_eq!(config.stacking.standard_height_px, 24);
        assert_eq!(config.grouping.distance_threshold, 1.5);
        assert!(config.grouping.enabled);
        assert_eq!(config.render_dpi, 400);
        assert_eq!(config.palette.len(), 6);
        assert_eq!(config.ocr.whitelist, "0123456789.-");
    }

    #[test]
    fn test_duplicate_policy_serde_names() {
        let policy: DuplicatePolicy = serde_json::from_str("\"first_per_label\"").unwrap();
        assert_eq!(policy, DuplicatePolicy::FirstPerLabel);
        assert_eq!(
            serde_json::to_string(&DuplicatePolicy::KeepAll).unwrap(),
            "\"keep_all\""
        );
    }
}
