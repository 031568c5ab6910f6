pub mod html;
pub mod markdown;

pub use html::{escape_html, render_html, write_html};
pub use markdown::{render_markdown, write_markdown};

use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use trendcast_core::CoreError;

/// Directory prefix for image links in a document written to `output_path`.
///
/// Relative to the document's directory when `images_dir` lives under it,
/// otherwise `images_dir` as given.
pub fn image_link_prefix(output_path: &Path, images_dir: &Path) -> String {
    let base = output_path.parent().unwrap_or_else(|| Path::new(""));
    match images_dir.strip_prefix(base) {
        Ok(relative) => relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => images_dir.to_string_lossy().into_owned(),
    }
}

pub fn image_link(prefix: &str, filename: &str) -> String {
    if prefix.is_empty() {
        filename.to_string()
    } else {
        format!("{}/{}", prefix.trim_end_matches('/'), filename)
    }
}

/// Writes `content` to `path`, creating parent directories and replacing
/// any existing file.
pub(crate) fn write_document(path: &Path, content: &str) -> Result<PathBuf, CoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    info!("Saved {}", path.display());
    Ok(path.to_path_buf())
}
