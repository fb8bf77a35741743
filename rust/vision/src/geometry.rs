// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversion between page-space boxes and percentage-of-page boxes
//!
//! Hotspots are reported in percentages so they stay valid whatever
//! resolution the page is later displayed at.

use crate::types::{BBox, PercentBBox, PixelRect};

fn percent_of(value: f64, total: f64) -> f64 {
    if total <= 0.0 {
        0.0
    } else {
        value / total * 100.0
    }
}

/// Express a page-space box as percentages of the page dimensions
pub fn to_percent(bbox: &BBox, page_width: f64, page_height: f64) -> PercentBBox {
    PercentBBox::new(
        percent_of(bbox.x, page_width),
        percent_of(bbox.y, page_height),
        percent_of(bbox.width, page_width),
        percent_of(bbox.height, page_height),
    )
}

/// Inverse of [`to_percent`]
pub fn from_percent(pct: &PercentBBox, page_width: f64, page_height: f64) -> BBox {
    BBox::new(
        pct.x_percentage / 100.0 * page_width,
        pct.y_percentage / 100.0 * page_height,
        pct.width_percentage / 100.0 * page_width,
        pct.height_percentage / 100.0 * page_height,
    )
}

/// Grow a box by `fraction` of its own width/height on every side
pub fn expand(bbox: &BBox, fraction: f64) -> BBox {
    let dx = bbox.width * fraction;
    let dy = bbox.height * fraction;
    BBox::new(
        bbox.x - dx,
        bbox.y - dy,
        bbox.width + 2.0 * dx,
        bbox.height + 2.0 * dy,
    )
}

/// Clip a percentage box to the page, i.e. to `[0, 100]` on both axes
pub fn clip_to_page(pct: &PercentBBox) -> PercentBBox {
    let x0 = pct.x_percentage.clamp(0.0, 100.0);
    let y0 = pct.y_percentage.clamp(0.0, 100.0);
    let x1 = (pct.x_percentage + pct.width_percentage).clamp(0.0, 100.0);
    let y1 = (pct.y_percentage + pct.height_percentage).clamp(0.0, 100.0);
    PercentBBox::new(x0, y0, (x1 - x0).max(0.0), (y1 - y0).max(0.0))
}

/// Hotspot for a page-space box: expanded, normalized and clipped
pub fn hotspot(bbox: &BBox, page_width: f64, page_height: f64, expansion: f64) -> PercentBBox {
    let grown = if expansion > 0.0 {
        expand(bbox, expansion)
    } else {
        *bbox
    };
    clip_to_page(&to_percent(&grown, page_width, page_height))
}

/// Hotspot for a raster marker box, anchored on the box center with the
/// full box dimensions
pub fn centered_hotspot(rect: &PixelRect, image_width: u32, image_height: u32) -> PercentBBox {
    let bbox = rect.to_bbox();
    let (cx, cy) = bbox.center();
    let w = image_width as f64;
    let h = image_height as f64;

    let width_pct = percent_of(bbox.width, w);
    let height_pct = percent_of(bbox.height, h);
    clip_to_page(&PercentBBox::new(
        percent_of(cx, w) - width_pct / 2.0,
        percent_of(cy, h) - height_pct / 2.0,
        width_pct,
        height_pct,
    ))
}
