// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Image processing operations for marker segmentation and OCR preprocessing

use crate::types::PixelRect;
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;

/// Morphological dilation with a square structuring element of the given
/// radius (radius 1 = 3x3)
pub fn dilate(image: &GrayImage, radius: u8) -> GrayImage {
    imageproc::morphology::dilate(image, Norm::LInf, radius)
}

/// Morphological erosion with a square structuring element
pub fn erode(image: &GrayImage, radius: u8) -> GrayImage {
    imageproc::morphology::erode(image, Norm::LInf, radius)
}

/// Morphological closing (dilate then erode) - bridges small gaps
pub fn morphological_close(image: &GrayImage, radius: u8) -> GrayImage {
    let dilated = dilate(image, radius);
    erode(&dilated, radius)
}

/// Invert a binary image
pub fn invert(image: &GrayImage) -> GrayImage {
    let mut result = image.clone();
    for pixel in result.pixels_mut() {
        pixel.0[0] = 255 - pixel.0[0];
    }
    result
}

/// Luma of an RGB pixel (ITU-R BT.601), rounded
pub fn luma(rgb: [u8; 3]) -> u8 {
    let [r, g, b] = rgb.map(f32::from);
    (0.299 * r + 0.587 * g + 0.114 * b).round().min(255.0) as u8
}

/// Convert an RGB image to grayscale
pub fn rgb_to_grayscale(image: &RgbImage) -> GrayImage {
    let mut gray = GrayImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        gray.put_pixel(x, y, Luma([luma(pixel.0)]));
    }
    gray
}

/// Convert an RGB pixel to 8-bit HSV
///
/// Hue is halved into 0..180 so it fits a byte; saturation and value use the
/// full 0..=255 range. Matches the convention the marker palette is tuned in.
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(i32::from);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v == 0 { 0 } else { (diff * 255 + v / 2) / v };
    if diff == 0 {
        return [0, s as u8, v as u8];
    }

    let diff = diff as f32;
    let mut h = if v == r {
        60.0 * (g - b) as f32 / diff
    } else if v == g {
        120.0 + 60.0 * (b - r) as f32 / diff
    } else {
        240.0 + 60.0 * (r - g) as f32 / diff
    };
    if h < 0.0 {
        h += 360.0;
    }

    let h = (h / 2.0).round() as i32 % 180;
    [h as u8, s as u8, v as u8]
}

/// Pixels strictly above `threshold_value` become white, the rest black
pub fn threshold(image: &GrayImage, threshold_value: u8) -> GrayImage {
    let mut result = GrayImage::new(image.width(), image.height());

    for (x, y, pixel) in image.enumerate_pixels() {
        let value = if pixel.0[0] > threshold_value { 255 } else { 0 };
        result.put_pixel(x, y, Luma([value]));
    }

    result
}

/// Apply Otsu's thresholding to find optimal threshold value
pub fn otsu_threshold(image: &GrayImage) -> GrayImage {
    let threshold_value = otsu_level(image);
    threshold(image, threshold_value)
}

/// Calculate Otsu's optimal threshold level
pub fn otsu_level(image: &GrayImage) -> u8 {
    // Build histogram
    let mut histogram = [0u32; 256];
    for pixel in image.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }

    let total_pixels = (image.width() as f64) * (image.height() as f64);
    if total_pixels == 0.0 {
        return 128;
    }

    let mut sum_total = 0.0;
    for (i, &count) in histogram.iter().enumerate() {
        sum_total += i as f64 * count as f64;
    }

    let mut sum_background = 0.0;
    let mut weight_background = 0.0;
    let mut max_variance = 0.0;
    let mut best_threshold = 0u8;

    for (t, &count) in histogram.iter().enumerate() {
        weight_background += count as f64;
        if weight_background == 0.0 {
            continue;
        }

        let weight_foreground = total_pixels - weight_background;
        if weight_foreground == 0.0 {
            break;
        }

        sum_background += t as f64 * count as f64;

        let mean_background = sum_background / weight_background;
        let mean_foreground = (sum_total - sum_background) / weight_foreground;

        let variance =
            weight_background * weight_foreground * (mean_background - mean_foreground).powi(2);

        if variance > max_variance {
            max_variance = variance;
            best_threshold = t as u8;
        }
    }

    best_threshold
}

/// Contrast limited adaptive histogram equalization
///
/// The image is split into a `tiles` x `tiles` grid; each tile gets its own
/// clipped equalization table and pixels are bilinearly interpolated between
/// the tables of the four nearest tile centers.
pub fn clahe(image: &GrayImage, clip_limit: f32, tiles: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || tiles == 0 {
        return image.clone();
    }

    let tile_w = width.div_ceil(tiles.min(width));
    let tile_h = height.div_ceil(tiles.min(height));
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);
            luts.push(tile_lut(image, x0, y0, x1, y1, clip_limit));
        }
    }

    // Fractional tile coordinate of a pixel relative to tile centers
    let locate = |pos: u32, tile: u32, count: u32| -> (usize, usize, f32) {
        let f = (pos as f32 + 0.5) / tile as f32 - 0.5;
        if f <= 0.0 {
            return (0, 0, 0.0);
        }
        let lo = (f.floor() as u32).min(count - 1);
        let hi = (lo + 1).min(count - 1);
        let frac = if hi == lo { 0.0 } else { f - lo as f32 };
        (lo as usize, hi as usize, frac)
    };

    let mut result = GrayImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels() {
        let v = pixel.0[0] as usize;
        let (tx1, tx2, xa) = locate(x, tile_w, tiles_x);
        let (ty1, ty2, ya) = locate(y, tile_h, tiles_y);
        let row = tiles_x as usize;

        let top = (1.0 - xa) * luts[ty1 * row + tx1][v] as f32 + xa * luts[ty1 * row + tx2][v] as f32;
        let bottom =
            (1.0 - xa) * luts[ty2 * row + tx1][v] as f32 + xa * luts[ty2 * row + tx2][v] as f32;
        let value = (1.0 - ya) * top + ya * bottom;

        result.put_pixel(x, y, Luma([value.round().clamp(0.0, 255.0) as u8]));
    }

    result
}

/// Clipped equalization table for one CLAHE tile
fn tile_lut(image: &GrayImage, x0: u32, y0: u32, x1: u32, y1: u32, clip_limit: f32) -> [u8; 256] {
    let mut histogram = [0u32; 256];
    for y in y0..y1 {
        for x in x0..x1 {
            histogram[image.get_pixel(x, y).0[0] as usize] += 1;
        }
    }

    let area = (x1 - x0) * (y1 - y0);
    if clip_limit > 0.0 {
        let limit = ((clip_limit * area as f32 / 256.0) as u32).max(1);
        let mut excess = 0u32;
        for bin in histogram.iter_mut() {
            if *bin > limit {
                excess += *bin - limit;
                *bin = limit;
            }
        }

        let share = excess / 256;
        let residual = (excess % 256) as usize;
        for bin in histogram.iter_mut() {
            *bin += share;
        }
        if residual > 0 {
            let step = (256 / residual).max(1);
            for bin in histogram.iter_mut().step_by(step).take(residual) {
                *bin += 1;
            }
        }
    }

    let scale = 255.0 / area.max(1) as f32;
    let mut lut = [0u8; 256];
    let mut cumulative = 0u32;
    for (i, &count) in histogram.iter().enumerate() {
        cumulative += count;
        lut[i] = (cumulative as f32 * scale).round().min(255.0) as u8;
    }
    lut
}

/// Copy a region out of an RGB image; the region must lie inside the image
pub fn crop(image: &RgbImage, region: &PixelRect) -> RgbImage {
    imageops::crop_imm(image, region.x, region.y, region.width, region.height).to_image()
}

/// Upscale by an integer factor using cubic interpolation
pub fn upscale_cubic(image: &RgbImage, factor: u32) -> RgbImage {
    if factor <= 1 {
        return image.clone();
    }
    imageops::resize(
        image,
        image.width() * factor,
        image.height() * factor,
        FilterType::CatmullRom,
    )
}
