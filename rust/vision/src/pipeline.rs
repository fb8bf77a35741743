// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-page strategy dispatch and document-level driver

use crate::box_detector::detect_boxes;
use crate::config::ExtractionConfig;
use crate::error::{Error, Result, SourceError};
use crate::grouping::group_series;
use crate::ocr::{extract_label, TextRecognizer};
use crate::text_layer::{extract_embedded, PageText};
use crate::types::{DocumentExtraction, LabelDetection, PageExtraction, PageResult};
use image::RgbImage;
use rayon::prelude::*;
use tracing::{info, warn};

/// Access to the pages of a document
///
/// Pages are numbered from 1. Implementations must be shareable across
/// worker threads.
pub trait PageSource {
    fn page_count(&self) -> u32;

    /// Embedded text layer of `page`, `None` when the page has none
    fn text_layer(&self, page: u32) -> Option<PageText>;

    /// Rasterize `page` at `dpi`
    fn render(&self, page: u32, dpi: u32) -> std::result::Result<RgbImage, SourceError>;
}

/// Color detection + OCR over an already rendered page
pub fn detect_visual<R: TextRecognizer + ?Sized>(
    image: &RgbImage,
    page_number: u32,
    config: &ExtractionConfig,
    recognizer: &R,
) -> Vec<LabelDetection> {
    detect_boxes(image, config)
        .iter()
        .filter_map(|rect| extract_label(image, rect, page_number, recognizer, &config.ocr))
        .collect()
}

/// Extract the labels of one page
///
/// The text layer is authoritative when it yields anything; otherwise the
/// page is rendered and run through color detection and OCR. Series
/// grouping is applied to either result.
pub fn extract_page<S, R>(
    source: &S,
    page_number: u32,
    config: &ExtractionConfig,
    recognizer: &R,
) -> Result<PageExtraction>
where
    S: PageSource + ?Sized,
    R: TextRecognizer + ?Sized,
{
    let page_count = source.page_count();
    if page_number == 0 || page_number > page_count {
        return Err(Error::MissingPage {
            page: page_number,
            page_count,
        });
    }

    let embedded = source
        .text_layer(page_number)
        .map(|text| {
            extract_embedded(
                &text.layer,
                text.width,
                text.height,
                page_number,
                &config.embedded,
            )
        })
        .unwrap_or_default();

    let mut extraction = if !embedded.is_empty() {
        PageExtraction::Embedded(embedded)
    } else {
        let image = source
            .render(page_number, config.render_dpi)
            .map_err(|source| Error::Source {
                page: page_number,
                source,
            })?;
        PageExtraction::Visual(detect_visual(&image, page_number, config, recognizer))
    };

    let groups = group_series(extraction.detections_mut(), &config.grouping);
    info!(
        page = page_number,
        method = ?extraction.method(),
        signs = extraction.detections().len(),
        groups,
        "Page extracted"
    );

    Ok(extraction)
}

/// Extract every page in parallel; the first failing page aborts the run
pub fn extract_document<S, R>(
    source: &S,
    config: &ExtractionConfig,
    recognizer: &R,
) -> Result<DocumentExtraction>
where
    S: PageSource + Sync + ?Sized,
    R: TextRecognizer + Sync + ?Sized,
{
    let pages = (1..=source.page_count())
        .into_par_iter()
        .map(|page| {
            extract_page(source, page, config, recognizer).map(|e| PageResult::new(page, e))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DocumentExtraction::new(pages))
}

/// Like [`extract_document`], but pages that fail are logged and left out
pub fn extract_document_lenient<S, R>(
    source: &S,
    config: &ExtractionConfig,
    recognizer: &R,
) -> DocumentExtraction
where
    S: PageSource + Sync + ?Sized,
    R: TextRecognizer + Sync + ?Sized,
{
    let pages: Vec<PageResult> = (1..=source.page_count())
        .into_par_iter()
        .filter_map(|page| match extract_page(source, page, config, recognizer) {
            Ok(extraction) => Some(PageResult::new(page, extraction)),
            Err(e) => {
                warn!(page, "Skipping page: {}", e);
                None
            }
        })
        .collect();

    DocumentExtraction::new(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrError;
    use crate::ocr::{RawReading, SegmentationMode};
    use crate::text_layer::{TextBlock, TextLayer, TextLine, TextSpan};
    use crate::types::ExtractionMethod;
    use image::{GrayImage, Rgb};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NoEngine;

    impl TextRecognizer for NoEngine {
        fn recognize(
            &self,
            _image: &GrayImage,
            _mode: SegmentationMode,
            _whitelist: &str,
        ) -> std::result::Result<RawReading, OcrError> {
            Err(OcrError::Unavailable)
        }
    }

    /// Pages 1 and 3 carry text, page 2 is blank, page 4 cannot be rendered
    struct FakeDocument {
        renders: AtomicUsize,
    }

    impl FakeDocument {
        fn new() -> Self {
            Self {
                renders: AtomicUsize::new(0),
            }
        }
    }

    impl PageSource for FakeDocument {
        fn page_count(&self) -> u32 {
            4
        }

        fn text_layer(&self, page: u32) -> Option<PageText> {
            let label = match page {
                1 => "2001.1",
                3 => "3001",
                _ => return None,
            };
            Some(PageText {
                width: 100.0,
                height: 100.0,
                layer: TextLayer {
                    blocks: vec![TextBlock {
                        kind: 0,
                        lines: vec![TextLine {
                            spans: vec![TextSpan {
                                text: label.to_string(),
                                bbox: [10.0, 10.0, 20.0, 15.0],
                            }],
                        }],
                    }],
                    plain_blocks: Vec::new(),
                },
            })
        }

        fn render(&self, page: u32, _dpi: u32) -> std::result::Result<RgbImage, SourceError> {
            self.renders.fetch_add(1, Ordering::SeqCst);
            if page == 4 {
                return Err(SourceError::NotFound(format!("page-{}.png", page)));
            }
            Ok(RgbImage::from_pixel(200, 200, Rgb([255, 255, 255])))
        }
    }

    #[test]
    fn test_text_layer_wins_without_rendering() {
        let doc = FakeDocument::new();
        let page = extract_page(&doc, 1, &ExtractionConfig::default(), &NoEngine).unwrap();

        assert_eq!(page.method(), ExtractionMethod::EmbeddedText);
        assert_eq!(page.detections()[0].label_text, "2001.1");
        assert_eq!(doc.renders.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_blank_text_layer_falls_back_to_rendering() {
        let doc = FakeDocument::new();
        let page = extract_page(&doc, 2, &ExtractionConfig::default(), &NoEngine).unwrap();

        assert_eq!(page, PageExtraction::Visual(Vec::new()));
        assert_eq!(doc.renders.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_page_is_an_error() {
        let doc = FakeDocument::new();
        let config = ExtractionConfig::default();

        assert!(matches!(
            extract_page(&doc, 0, &config, &NoEngine),
            Err(Error::MissingPage { page: 0, .. })
        ));
        assert!(matches!(
            extract_page(&doc, 9, &config, &NoEngine),
            Err(Error::MissingPage {
                page: 9,
                page_count: 4
            })
        ));
        assert!(matches!(
            extract_page(&doc, 4, &config, &NoEngine),
            Err(Error::Source { page: 4, .. })
        ));
    }

    #[test]
    fn test_document_surfaces_failures_unless_lenient() {
        let doc = FakeDocument::new();
        let config = ExtractionConfig::default();

        assert!(extract_document(&doc, &config, &NoEngine).is_err());

        let lenient = extract_document_lenient(&doc, &config, &NoEngine);
        let pages: Vec<u32> = lenient.pages.iter().map(|p| p.page_number).collect();
        assert_eq!(pages, vec![1, 2, 3]);
        assert_eq!(lenient.total_signs_detected, 2);
        assert_eq!(lenient.pages[1].extraction_method, ExtractionMethod::ColorOcr);
    }
}
