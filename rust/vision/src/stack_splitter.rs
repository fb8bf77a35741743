// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Splitting of vertically stacked marker boxes
//!
//! Markers placed directly on top of each other merge into one tall region
//! in the color mask. Label height is uniform within a document family, so
//! the number of stacked markers is recovered from the region height alone.

use crate::types::PixelRect;
use tracing::debug;

/// A box taller than this multiple of the standard height is a stack
const STACK_TRIGGER_RATIO: f64 = 1.5;

/// Split `rect` into equal-height rows when it spans several standard
/// marker heights; otherwise return it unchanged
pub fn split_stacked(rect: PixelRect, standard_height: u32) -> Vec<PixelRect> {
    if standard_height == 0 {
        return vec![rect];
    }

    let height = rect.height as f64;
    let standard = standard_height as f64;
    if height <= standard * STACK_TRIGGER_RATIO {
        return vec![rect];
    }

    // Ties round to even: a 2.5x box is two markers, not three
    let count = (height / standard).round_ties_even() as u32;
    if count < 2 {
        return vec![rect];
    }

    let row_height = height / count as f64;
    debug!(
        x = rect.x,
        y = rect.y,
        count,
        "Splitting stacked marker box"
    );

    (0..count)
        .map(|i| {
            PixelRect::new(
                rect.x,
                (rect.y as f64 + i as f64 * row_height) as u32,
                rect.width,
                row_height as u32,
            )
        })
        .collect()
}
