// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for sign label extraction

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Axis-aligned rectangle in raster pixel coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Width / height, 0 for a degenerate rectangle
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f64 / self.height as f64
        }
    }

    pub fn to_bbox(&self) -> BBox {
        BBox::new(
            self.x as f64,
            self.y as f64,
            self.width as f64,
            self.height as f64,
        )
    }
}

/// Rectangle in page space (PDF points for text layers, pixels for rasters)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from an `[x0, y0, x1, y1]` corner tuple
    pub fn from_corners(corners: [f64; 4]) -> Self {
        let [x0, y0, x1, y1] = corners;
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Rectangle expressed as percentages of the page dimensions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct PercentBBox {
    pub x_percentage: f64,
    pub y_percentage: f64,
    pub width_percentage: f64,
    pub height_percentage: f64,
}

impl PercentBBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x_percentage: x,
            y_percentage: y,
            width_percentage: width,
            height_percentage: height,
        }
    }
}

/// How much a detection can be trusted
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Confidence {
    /// Read straight from the page's text layer
    Embedded,
    /// Mean OCR engine confidence (0 - 100)
    Ocr(f64),
}

impl Confidence {
    pub fn is_embedded(&self) -> bool {
        matches!(self, Confidence::Embedded)
    }

    /// Numeric score, with embedded text counted as 100
    pub fn score(&self) -> f64 {
        match self {
            Confidence::Embedded => 100.0,
            Confidence::Ocr(value) => *value,
        }
    }
}

const EMBEDDED_TAG: &str = "embedded";

impl Serialize for Confidence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Confidence::Embedded => serializer.serialize_str(EMBEDDED_TAG),
            Confidence::Ocr(value) => serializer.serialize_f64(*value),
        }
    }
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Tag(String),
            Score(f64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Tag(tag) if tag == EMBEDDED_TAG => Ok(Confidence::Embedded),
            Raw::Tag(other) => Err(serde::de::Error::custom(format!(
                "unknown confidence tag '{}'",
                other
            ))),
            Raw::Score(value) => Ok(Confidence::Ocr(value)),
        }
    }
}

/// Membership of a multi-part series such as 2001.1 / 2001.2
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeriesGroup {
    /// Descriptive label, e.g. "2001 series (2 signs)"
    pub label: String,
    pub size: usize,
}

/// A sign number found on a page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelDetection {
    #[serde(rename = "sign_number")]
    pub label_text: String,
    #[serde(rename = "page")]
    pub page_number: u32,
    /// Text run box (embedded path) or marker box (color/OCR path)
    pub source_bbox: BBox,
    pub hotspot_bbox: PercentBBox,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<SeriesGroup>,
}

/// Which extraction strategy produced a page's detections
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    EmbeddedText,
    ColorOcr,
}

/// Result of the per-page strategy dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum PageExtraction {
    /// Labels read from the page's text layer
    Embedded(Vec<LabelDetection>),
    /// Labels recovered from colored marker boxes by OCR
    Visual(Vec<LabelDetection>),
}

impl PageExtraction {
    pub fn method(&self) -> ExtractionMethod {
        match self {
            PageExtraction::Embedded(_) => ExtractionMethod::EmbeddedText,
            PageExtraction::Visual(_) => ExtractionMethod::ColorOcr,
        }
    }

    pub fn detections(&self) -> &[LabelDetection] {
        match self {
            PageExtraction::Embedded(d) | PageExtraction::Visual(d) => d,
        }
    }

    pub fn detections_mut(&mut self) -> &mut Vec<LabelDetection> {
        match self {
            PageExtraction::Embedded(d) | PageExtraction::Visual(d) => d,
        }
    }

    pub fn into_detections(self) -> Vec<LabelDetection> {
        match self {
            PageExtraction::Embedded(d) | PageExtraction::Visual(d) => d,
        }
    }
}

/// Per-page entry of a document extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    #[serde(rename = "page")]
    pub page_number: u32,
    pub extraction_method: ExtractionMethod,
    pub signs_detected: usize,
    pub signs: Vec<LabelDetection>,
}

impl PageResult {
    pub fn new(page_number: u32, extraction: PageExtraction) -> Self {
        let extraction_method = extraction.method();
        let signs = extraction.into_detections();
        Self {
            page_number,
            extraction_method,
            signs_detected: signs.len(),
            signs,
        }
    }
}

/// Complete document extraction result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentExtraction {
    pub total_signs_detected: usize,
    pub pages: Vec<PageResult>,
}

impl DocumentExtraction {
    pub fn new(pages: Vec<PageResult>) -> Self {
        Self {
            total_signs_detected: pages.iter().map(|p| p.signs_detected).sum(),
            pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_serializes_tag_or_score() {
        assert_eq!(
            serde_json::to_string(&Confidence::Embedded).unwrap(),
            "\"embedded\""
        );
        assert_eq!(serde_json::to_string(&Confidence::Ocr(87.5)).unwrap(), "87.5");

        let parsed: Confidence = serde_json::from_str("\"embedded\"").unwrap();
        assert!(parsed.is_embedded());
        let parsed: Confidence = serde_json::from_str("42.0").unwrap();
        assert_eq!(parsed.score(), 42.0);
        assert!(serde_json::from_str::<Confidence>("\"guessed\"").is_err());
    }

    #[test]
    fn test_document_totals_pages() {
        let detection = LabelDetection {
            label_text: "2001".to_string(),
            page_number: 1,
            source_bbox: BBox::new(0.0, 0.0, 1.0, 1.0),
            hotspot_bbox: PercentBBox::default(),
            confidence: Confidence::Embedded,
            group: None,
        };
        let pages = vec![
            PageResult::new(1, PageExtraction::Embedded(vec![detection.clone(), detection])),
            PageResult::new(2, PageExtraction::Visual(Vec::new())),
        ];

        let document = DocumentExtraction::new(pages);
        assert_eq!(document.total_signs_detected, 2);
        assert_eq!(document.pages[1].extraction_method, ExtractionMethod::ColorOcr);
    }

    #[test]
    fn test_pixel_rect_edges() {
        let rect = PixelRect::new(10, 20, 30, 15);
        assert_eq!((rect.right(), rect.bottom()), (40, 35));
        assert_eq!(rect.aspect_ratio(), 2.0);
        assert_eq!(PixelRect::new(0, 0, 5, 0).aspect_ratio(), 0.0);
    }
}
