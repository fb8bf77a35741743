// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for extraction operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort extraction of a page
#[derive(Error, Debug)]
pub enum Error {
    #[error("Page {page} does not exist (document has {page_count} pages)")]
    MissingPage { page: u32, page_count: u32 },

    #[error("Page {page}: {source}")]
    Source {
        page: u32,
        #[source]
        source: SourceError,
    },
}

/// Failures while fetching page content
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Page content not found: {0}")]
    NotFound(String),

    #[error("Failed to decode page image: {0}")]
    Decode(String),

    #[error("Failed to read text layer: {0}")]
    TextLayer(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the text recognition engine
#[derive(Error, Debug)]
pub enum OcrError {
    #[error("OCR engine initialization failed: {0}")]
    InitError(String),

    #[error("Text recognition failed: {0}")]
    RecognitionError(String),

    #[error("Failed to encode image for OCR: {0}")]
    EncodeError(String),

    #[error("No OCR engine available")]
    Unavailable,
}
