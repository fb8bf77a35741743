// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Grouping of multi-part series labels placed next to each other

use crate::config::GroupingConfig;
use crate::label::series_base;
use crate::types::{LabelDetection, SeriesGroup};
use tracing::debug;

/// Tag series members (e.g. 2001.1, 2001.2) that sit in a row or column
///
/// Each unvisited series label seeds a group; later unvisited labels with the
/// same base join it when roughly aligned with the seed. Groups of one are
/// left untagged.
pub fn group_series(detections: &mut [LabelDetection], config: &GroupingConfig) -> usize {
    if !config.enabled || detections.len() < 2 {
        return 0;
    }

    let threshold = config.distance_threshold;
    let mut used = vec![false; detections.len()];
    let mut groups = 0;

    for i in 0..detections.len() {
        if used[i] {
            continue;
        }
        used[i] = true;

        let Some(base) = series_base(&detections[i].label_text) else {
            continue;
        };
        let prefix = format!("{}.", base);
        let seed = detections[i].hotspot_bbox;

        let mut members = vec![i];
        for j in 0..detections.len() {
            if used[j] || !detections[j].label_text.starts_with(&prefix) {
                continue;
            }

            let other = detections[j].hotspot_bbox;
            let dx = (seed.x_percentage - other.x_percentage).abs();
            let dy = (seed.y_percentage - other.y_percentage).abs();

            if aligned(dx, dy, threshold) {
                members.push(j);
                used[j] = true;
            }
        }

        if members.len() > 1 {
            let group = SeriesGroup {
                label: format!("{} series ({} signs)", base, members.len()),
                size: members.len(),
            };
            debug!(group = %group.label, "Grouped series labels");
            for &m in &members {
                detections[m].group = Some(group.clone());
            }
            groups += 1;
        }
    }

    groups
}

/// Close on one axis and within three thresholds on the other
fn aligned(dx: f64, dy: f64, threshold: f64) -> bool {
    (dx < threshold && dy < threshold * 3.0) || (dy < threshold && dx < threshold * 3.0)
}
