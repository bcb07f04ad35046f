//! Capture the text-like sources a page loads (HTML, CSS, JS, JSON, XML, SVG)
//! by watching a headless Chrome's network traffic, and mirror them to disk
//! under `<out_dir>/<host>/<path>`.

pub mod capture;
pub mod cli;
pub mod error;
pub mod filter;
pub mod logging;
pub mod mirror;
pub mod retry;

pub use capture::{CaptureConfig, Summary};
pub use error::{CaptureError, Result};

/// Default root directory for mirrored assets.
pub const OUTPUT_DIR: &str = "site_sources";

/// Default time to keep the page open after navigation so lazy chunks arrive.
pub const WAIT_MS: u64 = 8000;

/// Substrings of a content-type that mark a response as worth keeping.
pub const TEXT_MIME_HINTS: &[&str] = &[
    "javascript",
    "ecmascript",
    "css",
    "html",
    "json",
    "xml",
    "text",
    "svg",
];
