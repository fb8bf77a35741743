// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use approx::assert_relative_eq;
use image::{GrayImage, Rgb, RgbImage};
use signmap_vision::text_layer::{PlainBlock, TextBlock, TextLine, TextSpan};
use signmap_vision::{
    detect_boxes, extract_document, group_series, BBox, Confidence, ExtractionConfig,
    ExtractionMethod, GroupingConfig, LabelDetection, OcrError, PageSource, PageText, PercentBBox,
    PixelRect, RawReading, SegmentationMode, SourceError, TextLayer, TextRecognizer,
};
use std::sync::atomic::{AtomicUsize, Ordering};

const ORANGE: Rgb<u8> = Rgb([200, 100, 20]);

/// Readings issued per marker box (4 variants x 2 modes)
const CALLS_PER_BOX: usize = 8;

fn white_page(size: u32) -> RgbImage {
    RgbImage::from_pixel(size, size, Rgb([255, 255, 255]))
}

fn fill(image: &mut RgbImage, x: u32, y: u32, width: u32, height: u32) {
    for py in y..y + height {
        for px in x..x + width {
            image.put_pixel(px, py, ORANGE);
        }
    }
}

fn span(text: &str, bbox: [f64; 4]) -> TextSpan {
    TextSpan {
        text: text.to_string(),
        bbox,
    }
}

/// Answers every reading of the n-th box with the n-th label
struct PerBoxRecognizer {
    labels: Vec<&'static str>,
    calls: AtomicUsize,
}

impl PerBoxRecognizer {
    fn new(labels: Vec<&'static str>) -> Self {
        Self {
            labels,
            calls: AtomicUsize::new(0),
        }
    }
}

impl TextRecognizer for PerBoxRecognizer {
    fn recognize(
        &self,
        _image: &GrayImage,
        _mode: SegmentationMode,
        _whitelist: &str,
    ) -> Result<RawReading, OcrError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.labels.get(call / CALLS_PER_BOX) {
            Some(label) => Ok(RawReading::new(*label, vec![88.0, -1.0])),
            None => Err(OcrError::Unavailable),
        }
    }
}

/// Two-page document: page 1 has a text layer, page 2 is a scan
struct MemoryDocument {
    text: PageText,
    scan: RgbImage,
}

impl PageSource for MemoryDocument {
    fn page_count(&self) -> u32 {
        2
    }

    fn text_layer(&self, page: u32) -> Option<PageText> {
        (page == 1).then(|| self.text.clone())
    }

    fn render(&self, page: u32, _dpi: u32) -> Result<RgbImage, SourceError> {
        match page {
            2 => Ok(self.scan.clone()),
            _ => Err(SourceError::NotFound(format!("page {}", page))),
        }
    }
}

fn scenario_a_text() -> PageText {
    PageText {
        width: 1000.0,
        height: 800.0,
        layer: TextLayer {
            blocks: vec![TextBlock {
                kind: 0,
                lines: vec![TextLine {
                    spans: vec![
                        span("2001", [100.0, 100.0, 120.0, 108.0]),
                        span("2002", [300.0, 100.0, 320.0, 108.0]),
                        span("0000", [500.0, 100.0, 520.0, 108.0]),
                        span("20011", [700.0, 100.0, 725.0, 108.0]),
                    ],
                }],
            }],
            plain_blocks: vec![PlainBlock {
                bbox: [100.0, 100.0, 725.0, 108.0],
                text: "2001 2002 0000 20011".to_string(),
            }],
        },
    }
}

#[test]
fn embedded_runs_keep_only_sign_numbers() {
    let doc = MemoryDocument {
        text: scenario_a_text(),
        scan: white_page(100),
    };
    let recognizer = PerBoxRecognizer::new(Vec::new());

    let result = extract_document(&doc, &ExtractionConfig::default(), &recognizer).unwrap();
    let page = &result.pages[0];

    assert_eq!(page.extraction_method, ExtractionMethod::EmbeddedText);
    let labels: Vec<_> = page.signs.iter().map(|s| s.label_text.as_str()).collect();
    assert_eq!(labels, vec!["2001", "2002"]);
    assert!(page.signs.iter().all(|s| s.confidence == Confidence::Embedded));
}

#[test]
fn stacked_box_splits_into_equal_rows() {
    let mut page = white_page(1200);
    // grows to 30x30 during mask cleanup
    fill(&mut page, 100, 100, 28, 28);

    let mut config = ExtractionConfig::default();
    config.stacking.standard_height_px = 10;

    let boxes = detect_boxes(&page, &config);
    assert_eq!(
        boxes,
        vec![
            PixelRect::new(99, 99, 30, 10),
            PixelRect::new(99, 109, 30, 10),
            PixelRect::new(99, 119, 30, 10),
        ]
    );
}

#[test]
fn adjacent_series_members_are_grouped() {
    let mut detections: Vec<LabelDetection> = [("2001.1", 20.0), ("2001.2", 21.5)]
        .into_iter()
        .map(|(label, y)| LabelDetection {
            label_text: label.to_string(),
            page_number: 1,
            source_bbox: BBox::new(0.0, 0.0, 10.0, 10.0),
            hotspot_bbox: PercentBBox::new(10.0, y, 1.0, 1.0),
            confidence: Confidence::Embedded,
            group: None,
        })
        .collect();

    group_series(&mut detections, &GroupingConfig::default());

    for d in &detections {
        let group = d.group.as_ref().unwrap();
        assert_eq!(group.label, "2001 series (2 signs)");
        assert_eq!(group.size, 2);
    }
}

#[test]
fn scanned_page_is_read_through_marker_boxes() {
    let mut scan = white_page(1200);
    // two markers stacked with a visible gap, label readings 2001.1 / 2001.2
    fill(&mut scan, 600, 300, 28, 18);
    fill(&mut scan, 600, 330, 28, 18);

    let doc = MemoryDocument {
        text: scenario_a_text(),
        scan,
    };
    let recognizer = PerBoxRecognizer::new(vec!["2001.1", "2001.2"]);

    let result = extract_document(&doc, &ExtractionConfig::default(), &recognizer).unwrap();
    assert_eq!(result.total_signs_detected, 4);

    let page = &result.pages[1];
    assert_eq!(page.page_number, 2);
    assert_eq!(page.extraction_method, ExtractionMethod::ColorOcr);
    assert_eq!(page.signs_detected, 2);

    let first = &page.signs[0];
    assert_eq!(first.label_text, "2001.1");
    assert_eq!(first.page_number, 2);
    assert_eq!(first.confidence, Confidence::Ocr(88.0));
    assert_eq!(first.source_bbox, BBox::new(599.0, 299.0, 30.0, 20.0));
    assert_relative_eq!(first.hotspot_bbox.x_percentage, 599.0 / 12.0, epsilon = 1e-9);
    assert_relative_eq!(first.hotspot_bbox.y_percentage, 299.0 / 12.0, epsilon = 1e-9);
    assert_relative_eq!(first.hotspot_bbox.width_percentage, 2.5, epsilon = 1e-9);

    assert_eq!(page.signs[1].label_text, "2001.2");
    for sign in &page.signs {
        assert_eq!(
            sign.group.as_ref().map(|g| g.label.as_str()),
            Some("2001 series (2 signs)")
        );
    }
}

#[test]
fn results_serialize_with_report_field_names() {
    let doc = MemoryDocument {
        text: scenario_a_text(),
        scan: white_page(100),
    };
    let recognizer = PerBoxRecognizer::new(Vec::new());
    let result = extract_document(&doc, &ExtractionConfig::default(), &recognizer).unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["total_signs_detected"], 2);
    assert_eq!(json["pages"][0]["page"], 1);
    assert_eq!(json["pages"][0]["extraction_method"], "embedded_text");
    assert_eq!(json["pages"][0]["signs"][0]["sign_number"], "2001");
    assert_eq!(json["pages"][0]["signs"][0]["confidence"], "embedded");
    assert!(json["pages"][0]["signs"][0]["hotspot_bbox"]["x_percentage"].is_number());
    assert!(json["pages"][0]["signs"][0].get("group").is_none());
    assert_eq!(json["pages"][1]["extraction_method"], "color_ocr");
    assert_eq!(json["pages"][1]["signs_detected"], 0);
}
