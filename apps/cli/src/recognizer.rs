// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Text recognizer selection.

use image::GrayImage;
use signmap_vision::{OcrError, RawReading, SegmentationMode, TextRecognizer};

/// Stand-in used when the binary is built without an OCR engine.
///
/// Every reading fails, so scanned pages yield no detections while pages
/// with a text layer are unaffected.
#[cfg_attr(feature = "tesseract", allow(dead_code))]
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableRecognizer;

impl TextRecognizer for UnavailableRecognizer {
    fn recognize(
        &self,
        _image: &GrayImage,
        _mode: SegmentationMode,
        _whitelist: &str,
    ) -> Result<RawReading, OcrError> {
        Err(OcrError::Unavailable)
    }
}

/// Build the recognizer for this binary.
#[cfg(feature = "tesseract")]
pub fn build(language: &str) -> anyhow::Result<Box<dyn TextRecognizer + Sync>> {
    let recognizer = signmap_vision::TesseractRecognizer::new(language, None)?;
    tracing::info!(language, "Using Tesseract OCR");
    Ok(Box::new(recognizer))
}

/// Build the recognizer for this binary.
#[cfg(not(feature = "tesseract"))]
pub fn build(language: &str) -> anyhow::Result<Box<dyn TextRecognizer + Sync>> {
    tracing::warn!(
        language,
        "Built without the `tesseract` feature; pages without a text layer will yield no signs"
    );
    Ok(Box::new(UnavailableRecognizer))
}
