// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tesseract backend for [`TextRecognizer`]

use crate::error::OcrError;
use crate::ocr::{RawReading, SegmentationMode, TextRecognizer};
use image::GrayImage;
use leptess::{LepTess, Variable};
use tracing::debug;

/// Recognizer backed by a system Tesseract install
///
/// A fresh engine is created per call so one recognizer can be shared by
/// all page workers.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    /// Tesseract language code, e.g. "eng"
    pub language: String,
    /// tessdata directory, `None` for the system default
    pub data_path: Option<String>,
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            data_path: None,
        }
    }
}

impl TesseractRecognizer {
    /// Create a recognizer, checking that the language data can be loaded
    pub fn new(language: &str, data_path: Option<String>) -> Result<Self, OcrError> {
        let recognizer = Self {
            language: language.to_string(),
            data_path,
        };
        recognizer.engine()?;
        Ok(recognizer)
    }

    fn engine(&self) -> Result<LepTess, OcrError> {
        LepTess::new(self.data_path.as_deref(), &self.language).map_err(|e| {
            OcrError::InitError(format!(
                "Failed to initialize Tesseract with language '{}': {}",
                self.language, e
            ))
        })
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(
        &self,
        image: &GrayImage,
        mode: SegmentationMode,
        whitelist: &str,
    ) -> Result<RawReading, OcrError> {
        let mut lt = self.engine()?;

        lt.set_variable(Variable::TesseditPagesegMode, &mode.psm().to_string())
            .map_err(|e| OcrError::InitError(format!("Failed to set PSM: {}", e)))?;
        lt.set_variable(Variable::TesseditCharWhitelist, whitelist)
            .map_err(|e| OcrError::InitError(format!("Failed to set whitelist: {}", e)))?;

        // leptess expects encoded image data
        let mut png = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut png, image::ImageFormat::Png)
            .map_err(|e| OcrError::EncodeError(e.to_string()))?;
        lt.set_image_from_mem(png.get_ref())
            .map_err(|e| OcrError::RecognitionError(format!("Failed to set image: {}", e)))?;

        let text = lt
            .get_utf8_text()
            .map_err(|e| OcrError::RecognitionError(e.to_string()))?;

        // Word-level confidences; a blank image has no word boxes
        let mut confidences = Vec::new();
        if let Some(boxes) =
            lt.get_component_boxes(leptess::capi::TessPageIteratorLevel_RIL_WORD, true)
        {
            for word in &boxes {
                let geom = word.get_geometry();
                lt.set_rectangle(geom.x, geom.y, geom.w, geom.h);
                if lt.get_utf8_text().map(|t| t.trim().is_empty()).unwrap_or(true) {
                    continue;
                }
                confidences.push(lt.mean_text_conf() as f32);
            }
        }

        debug!(
            psm = mode.psm(),
            text = %text.trim(),
            words = confidences.len(),
            "Tesseract reading"
        );
        Ok(RawReading { text, confidences })
    }
}
