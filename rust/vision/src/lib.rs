// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sign number extraction from architectural floor plans
//!
//! This crate locates sign numbers (`2001`, `2001.1`, ...) on floor plan
//! pages and reports where they are as page-relative hotspots:
//! 1. Pages with an embedded text layer are read directly
//! 2. Other pages are rendered, colored marker boxes are found by HSV
//!    segmentation, and the number next to each box is read by an OCR
//!    ensemble
//! 3. Multi-part series labels sitting side by side are grouped
//!
//! # Usage
//!
//! ```rust,ignore
//! use signmap_vision::{extract_document, ExtractionConfig};
//!
//! // `source` implements `PageSource`, `recognizer` implements `TextRecognizer`
//! let result = extract_document(&source, &ExtractionConfig::default(), &recognizer)?;
//! println!("{} signs", result.total_signs_detected);
//! ```

pub mod box_detector;
pub mod config;
pub mod error;
pub mod geometry;
pub mod grouping;
pub mod image_ops;
pub mod label;
pub mod ocr;
pub mod pipeline;
pub mod stack_splitter;
#[cfg(feature = "tesseract")]
pub mod tesseract;
pub mod text_layer;
pub mod types;

// Re-export commonly used types and functions
pub use box_detector::detect_boxes;
pub use config::{
    BoxFilterConfig, DuplicatePolicy, EmbeddedConfig, ExtractionConfig, GroupingConfig, HsvRange,
    MorphologyConfig, OcrConfig, StackingConfig,
};
pub use error::{Error, OcrError, Result, SourceError};
pub use grouping::group_series;
pub use ocr::{extract_label, RawReading, SegmentationMode, TextRecognizer};
pub use pipeline::{
    detect_visual, extract_document, extract_document_lenient, extract_page, PageSource,
};
pub use stack_splitter::split_stacked;
#[cfg(feature = "tesseract")]
pub use tesseract::TesseractRecognizer;
pub use text_layer::{extract_embedded, PageText, TextLayer};
pub use types::{
    BBox, Confidence, DocumentExtraction, ExtractionMethod, LabelDetection, PageExtraction,
    PageResult, PercentBBox, PixelRect, SeriesGroup,
};
