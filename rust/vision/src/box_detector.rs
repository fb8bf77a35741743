// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Marker box detection via color segmentation and contour finding

use crate::config::{BoxFilterConfig, ExtractionConfig, HsvRange, MorphologyConfig};
use crate::image_ops::{dilate, erode, morphological_close, rgb_to_hsv};
use crate::stack_splitter::split_stacked;
use crate::types::PixelRect;
use image::{GrayImage, Luma, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use tracing::{debug, info};

/// Binary mask of palette-colored pixels plus per-range hit counts
#[derive(Debug, Clone)]
pub struct ColorMask {
    pub mask: GrayImage,
    /// Pixels matched by each palette range, in palette order
    pub counts: Vec<usize>,
}

/// Detect marker boxes on a rendered page
///
/// Runs the full detection pipeline:
/// 1. HSV segmentation against every palette range (union of masks)
/// 2. Morphological cleanup (close, dilate, erode)
/// 3. External contour extraction and bounding rectangles
/// 4. Size/aspect filtering relative to the page
/// 5. Stacked box splitting
pub fn detect_boxes(image: &RgbImage, config: &ExtractionConfig) -> Vec<PixelRect> {
    let (width, height) = image.dimensions();

    let segmented = segment_colors(image, &config.palette);
    for (range, count) in config.palette.iter().zip(&segmented.counts) {
        debug!(color = %range.name, pixels = count, "Color mask");
    }

    let cleaned = clean_mask(&segmented.mask, &config.morphology);

    let boxes: Vec<PixelRect> = candidate_rects(&cleaned)
        .into_iter()
        .filter(|rect| accepts(&config.box_filter, rect, width, height))
        .flat_map(|rect| split_stacked(rect, config.stacking.standard_height_px))
        .collect();

    info!(
        boxes = boxes.len(),
        "Detected marker boxes (including split stacks)"
    );
    boxes
}

/// Mark every pixel whose HSV value falls inside any palette range
pub fn segment_colors(image: &RgbImage, palette: &[HsvRange]) -> ColorMask {
    let mut mask = GrayImage::new(image.width(), image.height());
    let mut counts = vec![0usize; palette.len()];

    for (x, y, pixel) in image.enumerate_pixels() {
        let hsv = rgb_to_hsv(pixel.0);
        let mut hit = false;
        for (i, range) in palette.iter().enumerate() {
            if range.contains(hsv) {
                counts[i] += 1;
                hit = true;
            }
        }
        if hit {
            mask.put_pixel(x, y, Luma([255]));
        }
    }

    ColorMask { mask, counts }
}

/// Close broken outlines, then grow and partially shrink the mask
pub fn clean_mask(mask: &GrayImage, config: &MorphologyConfig) -> GrayImage {
    let radius = config.kernel_radius;
    let mut cleaned = mask.clone();

    for _ in 0..config.close_iterations {
        cleaned = morphological_close(&cleaned, radius);
    }
    if config.dilate_iterations > 0 {
        cleaned = dilate(&cleaned, radius.saturating_mul(config.dilate_iterations));
    }
    if config.erode_iterations > 0 {
        cleaned = erode(&cleaned, radius.saturating_mul(config.erode_iterations));
    }

    cleaned
}

/// Bounding rectangles of the external contours of a binary mask, in
/// discovery order
pub fn candidate_rects(mask: &GrayImage) -> Vec<PixelRect> {
    find_contours::<u32>(mask)
        .iter()
        .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
        .filter_map(bounding_rect)
        .collect()
}

fn bounding_rect(contour: &Contour<u32>) -> Option<PixelRect> {
    let first = contour.points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);

    for point in &contour.points {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }

    Some(PixelRect::new(
        min_x,
        min_y,
        max_x - min_x + 1,
        max_y - min_y + 1,
    ))
}

/// Size and aspect check, with sizes measured as a percentage of the page
pub fn accepts(filter: &BoxFilterConfig, rect: &PixelRect, page_width: u32, page_height: u32) -> bool {
    if page_width == 0 || page_height == 0 || rect.height == 0 {
        return false;
    }

    let width_percent = rect.width as f64 / page_width as f64 * 100.0;
    let height_percent = rect.height as f64 / page_height as f64 * 100.0;
    let aspect = rect.aspect_ratio();

    (filter.min_width_percent..=filter.max_width_percent).contains(&width_percent)
        && (filter.min_height_percent..=filter.max_height_percent).contains(&height_percent)
        && (filter.min_aspect_ratio..=filter.max_aspect_ratio).contains(&aspect)
}
