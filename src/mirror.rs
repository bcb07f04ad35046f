//! Maps response URLs onto the local mirror and writes bodies there.

use std::path::{Path, PathBuf};

use url::Url;

use crate::error::{CaptureError, Result};

const INDEX_FILE: &str = "index.html";

/// `<out_dir>/<host[:port]>/<path>`, with `index.html` standing in for a
/// directory-like path. Query and fragment are ignored.
pub fn asset_path(out_dir: &Path, url: &str) -> Result<PathBuf> {
    let parsed = Url::parse(url).map_err(|source| CaptureError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;
    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| CaptureError::NoHost(url.to_string()))?;

    let mut path = out_dir.to_path_buf();
    match parsed.port() {
        Some(port) => path.push(format!("{host}:{port}")),
        None => path.push(host),
    }

    // Url already resolves dot segments; still refuse anything that could
    // climb out of the host directory.
    let url_path = parsed.path();
    for segment in url_path
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
    {
        path.push(segment);
    }
    if url_path.is_empty() || url_path.ends_with('/') {
        path.push(INDEX_FILE);
    }
    Ok(path)
}

/// Writes `body` to the mirrored path for `url`, replacing any earlier copy.
pub async fn save_asset(out_dir: &Path, url: &str, body: &[u8]) -> Result<PathBuf> {
    let path = asset_path(out_dir, url)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| CaptureError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    tokio::fs::write(&path, body)
        .await
        .map_err(|source| CaptureError::Io {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}
