//! Image embedding
//!
//! Item images are stored inline as `data:` URLs so the whole shelf stays
//! a single JSON document.

use std::path::Path;

use anyhow::{Context, Result};
use base64::Engine;

/// Media type guessed from the file extension
fn media_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Encode raw bytes as a data URL
pub fn encode(media: &str, bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", media, encoded)
}

/// Read an image file into a data URL
pub fn to_data_url(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read image file: {:?}", path))?;
    tracing::debug!(path = ?path, bytes = bytes.len(), "Embedding image");
    Ok(encode(media_type(path), &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_media_type() {
        assert_eq!(media_type(Path::new("poster.PNG")), "image/png");
        assert_eq!(media_type(Path::new("a/b/cover.jpeg")), "image/jpeg");
        assert_eq!(media_type(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode("image/png", b"hi"), "data:image/png;base64,aGk=");
    }

    #[test]
    fn test_to_data_url() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cover.gif");
        std::fs::write(&path, b"GIF89a").unwrap();

        let url = to_data_url(&path).unwrap();
        assert_eq!(url, "data:image/gif;base64,R0lGODlh");
    }

    #[test]
    fn test_to_data_url_missing_file() {
        assert!(to_data_url(Path::new("/nonexistent/cover.png")).is_err());
    }
}
