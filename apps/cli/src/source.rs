// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pages backed by pre-rendered image files with optional text layer sidecars.

use image::RgbImage;
use signmap_vision::{PageSource, PageText, SourceError};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Suffix of the text layer file stored next to a page image.
const SIDECAR_SUFFIX: &str = ".text.json";

/// One page per image path, numbered in argument order.
#[derive(Debug, Clone)]
pub struct ImagePageSource {
    pages: Vec<PathBuf>,
}

impl ImagePageSource {
    pub fn new(pages: Vec<PathBuf>) -> Self {
        Self { pages }
    }

    fn path(&self, page: u32) -> Option<&Path> {
        let index = usize::try_from(page).ok()?.checked_sub(1)?;
        self.pages.get(index).map(PathBuf::as_path)
    }
}

/// `plan.png` -> `plan.text.json`
pub fn sidecar_path(image: &Path) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    image.with_file_name(format!("{}{}", stem, SIDECAR_SUFFIX))
}

fn read_sidecar(path: &Path) -> Result<PageText, SourceError> {
    let json = std::fs::read_to_string(path)?;
    PageText::from_json(&json).map_err(|e| SourceError::TextLayer(e.to_string()))
}

impl PageSource for ImagePageSource {
    fn page_count(&self) -> u32 {
        u32::try_from(self.pages.len()).unwrap_or(u32::MAX)
    }

    fn text_layer(&self, page: u32) -> Option<PageText> {
        let sidecar = sidecar_path(self.path(page)?);
        if !sidecar.exists() {
            return None;
        }

        match read_sidecar(&sidecar) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(page, path = %sidecar.display(), "Ignoring text layer: {}", e);
                None
            }
        }
    }

    fn render(&self, page: u32, dpi: u32) -> Result<RgbImage, SourceError> {
        let path = self
            .path(page)
            .ok_or_else(|| SourceError::NotFound(format!("page {}", page)))?;
        if !path.exists() {
            return Err(SourceError::NotFound(path.display().to_string()));
        }

        // Images are already rasterized; the requested DPI is informational
        debug!(page, dpi, path = %path.display(), "Loading page image");
        let image = image::open(path).map_err(|e| SourceError::Decode(e.to_string()))?;
        Ok(image.to_rgb8())
    }
}
