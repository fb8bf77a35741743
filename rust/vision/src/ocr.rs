// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! OCR ensemble for reading the sign number printed near a marker box
//!
//! A single binarization rarely works for every marker color and print
//! quality, so each crop is binarized four ways (Otsu and CLAHE + Otsu, each
//! also inverted) and every variant is read in two layout modes. The reading
//! with the highest mean confidence wins, longer text breaking ties.

use crate::config::OcrConfig;
use crate::error::OcrError;
use crate::geometry::centered_hotspot;
use crate::image_ops::{clahe, crop, invert, otsu_threshold, rgb_to_grayscale, upscale_cubic};
use crate::label::is_label;
use crate::types::{Confidence, LabelDetection, PixelRect};
use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// Layout assumption handed to the recognition engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationMode {
    /// Treat the image as a single word
    SingleWord,
    /// Find as much text as possible in no particular order
    SparseText,
}

impl SegmentationMode {
    /// Tesseract page segmentation mode number
    pub fn psm(&self) -> u32 {
        match self {
            SegmentationMode::SingleWord => 8,
            SegmentationMode::SparseText => 11,
        }
    }
}

/// Raw engine output for one image
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawReading {
    pub text: String,
    /// Engine confidences (0 - 100) for the recognized items; negative
    /// values mean "no confidence available"
    pub confidences: Vec<f32>,
}

impl RawReading {
    pub fn new(text: impl Into<String>, confidences: Vec<f32>) -> Self {
        Self {
            text: text.into(),
            confidences,
        }
    }

    /// Mean of the available confidences, 0 when there are none
    pub fn mean_confidence(&self) -> f64 {
        let valid: Vec<f64> = self
            .confidences
            .iter()
            .filter(|c| **c >= 0.0)
            .map(|c| *c as f64)
            .collect();
        if valid.is_empty() {
            0.0
        } else {
            valid.iter().sum::<f64>() / valid.len() as f64
        }
    }
}

/// Text recognition engine
pub trait TextRecognizer {
    /// Recognize text in `image` using layout `mode`, restricted to the
    /// characters in `whitelist`
    fn recognize(
        &self,
        image: &GrayImage,
        mode: SegmentationMode,
        whitelist: &str,
    ) -> Result<RawReading, OcrError>;
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for &T {
    fn recognize(
        &self,
        image: &GrayImage,
        mode: SegmentationMode,
        whitelist: &str,
    ) -> Result<RawReading, OcrError> {
        (**self).recognize(image, mode, whitelist)
    }
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Box<T> {
    fn recognize(
        &self,
        image: &GrayImage,
        mode: SegmentationMode,
        whitelist: &str,
    ) -> Result<RawReading, OcrError> {
        (**self).recognize(image, mode, whitelist)
    }
}

/// Binarization variant fed to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preprocess {
    Otsu,
    OtsuInverted,
    Clahe,
    ClaheInverted,
}

impl Preprocess {
    pub fn name(&self) -> &'static str {
        match self {
            Preprocess::Otsu => "otsu",
            Preprocess::OtsuInverted => "otsu_inv",
            Preprocess::Clahe => "clahe",
            Preprocess::ClaheInverted => "clahe_inv",
        }
    }
}

/// An accepted reading from one (variant, mode) combination
#[derive(Debug, Clone, PartialEq)]
pub struct OcrCandidate {
    pub text: String,
    pub confidence: f64,
    pub mode: SegmentationMode,
    pub preprocess: Preprocess,
}

/// Normalize raw engine text into a plausible sign number
///
/// Trims whitespace and stray leading/trailing periods, then requires at
/// least one digit and at most one internal period. Length is checked by
/// the caller.
pub fn clean_label_text(raw: &str) -> Option<String> {
    let text = raw.trim().trim_matches('.');
    if !text.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    if text.matches('.').count() > 1 {
        return None;
    }
    Some(text.to_string())
}

/// Candidate ordering: confidence first, then text length
pub fn compare_candidates(a: &OcrCandidate, b: &OcrCandidate) -> Ordering {
    a.confidence
        .total_cmp(&b.confidence)
        .then_with(|| a.text.chars().count().cmp(&b.text.chars().count()))
}

/// Highest-ranked candidate; on a full tie the earliest one is kept
pub fn select_best(candidates: impl IntoIterator<Item = OcrCandidate>) -> Option<OcrCandidate> {
    candidates.into_iter().reduce(|best, next| {
        if compare_candidates(&next, &best) == Ordering::Greater {
            next
        } else {
            best
        }
    })
}

/// Crop window around a marker box: mostly above it, where labels are
/// printed, clamped to the image
pub fn region_of_interest(
    rect: &PixelRect,
    image_width: u32,
    image_height: u32,
    config: &OcrConfig,
) -> PixelRect {
    let x0 = rect.x.saturating_sub(config.roi_horizontal_px);
    let y0 = rect.y.saturating_sub(config.roi_above_px);
    let x1 = (rect.right() + config.roi_horizontal_px).min(image_width);
    let y1 = (rect.bottom() + config.roi_below_px).min(image_height);
    PixelRect::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
}

/// Build the binarized variants of a crop, in evaluation order
pub fn preprocess_variants(roi: &RgbImage, config: &OcrConfig) -> Vec<(Preprocess, GrayImage)> {
    let scaled = upscale_cubic(roi, config.upscale_factor);
    let gray = rgb_to_grayscale(&scaled);

    let otsu = otsu_threshold(&gray);
    let enhanced = clahe(&gray, config.clahe_clip_limit, config.clahe_tiles);
    let clahe_otsu = otsu_threshold(&enhanced);

    let otsu_inv = invert(&otsu);
    let clahe_inv = invert(&clahe_otsu);

    vec![
        (Preprocess::Otsu, otsu),
        (Preprocess::OtsuInverted, otsu_inv),
        (Preprocess::Clahe, clahe_otsu),
        (Preprocess::ClaheInverted, clahe_inv),
    ]
}

/// Read the sign number near `rect`, or `None` when nothing legible is found
pub fn read_label<R: TextRecognizer + ?Sized>(
    image: &RgbImage,
    rect: &PixelRect,
    recognizer: &R,
    config: &OcrConfig,
) -> Option<OcrCandidate> {
    let roi = region_of_interest(rect, image.width(), image.height(), config);
    if roi.width == 0 || roi.height == 0 {
        return None;
    }

    let crop = crop(image, &roi);
    let mut candidates = Vec::new();

    for (preprocess, variant) in preprocess_variants(&crop, config) {
        for &mode in &config.modes {
            let reading = match recognizer.recognize(&variant, mode, &config.whitelist) {
                Ok(reading) => reading,
                Err(e) => {
                    debug!(
                        preprocess = preprocess.name(),
                        psm = mode.psm(),
                        "OCR error: {}",
                        e
                    );
                    continue;
                }
            };

            if let Some(candidate) = accept_reading(&reading, mode, preprocess, config) {
                candidates.push(candidate);
            }
        }
    }

    debug!(
        x = rect.x,
        y = rect.y,
        candidates = candidates.len(),
        "OCR candidates for box"
    );
    select_best(candidates)
}

/// Apply the text and confidence gates to a raw reading
fn accept_reading(
    reading: &RawReading,
    mode: SegmentationMode,
    preprocess: Preprocess,
    config: &OcrConfig,
) -> Option<OcrCandidate> {
    let text = clean_label_text(&reading.text)?;
    if text.chars().count() < config.min_text_len {
        return None;
    }
    if config.require_label_pattern && !is_label(&text) {
        return None;
    }

    let confidence = reading.mean_confidence();
    if confidence <= config.min_confidence {
        return None;
    }

    Some(OcrCandidate {
        text,
        confidence,
        mode,
        preprocess,
    })
}

/// Run the ensemble for one marker box and build its detection
pub fn extract_label<R: TextRecognizer + ?Sized>(
    image: &RgbImage,
    rect: &PixelRect,
    page_number: u32,
    recognizer: &R,
    config: &OcrConfig,
) -> Option<LabelDetection> {
    let best = read_label(image, rect, recognizer, config)?;
    debug!(
        text = %best.text,
        confidence = best.confidence,
        preprocess = best.preprocess.name(),
        psm = best.mode.psm(),
        "Best OCR reading"
    );

    Some(LabelDetection {
        label_text: best.text,
        page_number,
        source_bbox: rect.to_bbox(),
        hotspot_bbox: centered_hotspot(rect, image.width(), image.height()),
        confidence: Confidence::Ocr(best.confidence),
        group: None,
    })
}
