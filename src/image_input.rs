use anyhow::{anyhow, Result};
use std::fs;
use std::path::Path;

/// Check if a file is a supported input image format.
/// Supports: jpg, jpeg, png
pub fn is_supported_image_file(path: &Path) -> bool {
    if let Some(ext) = path.extension() {
        let ext_lower = ext.to_string_lossy().to_lowercase();
        matches!(ext_lower.as_str(), "jpg" | "jpeg" | "png")
    } else {
        false
    }
}

/// Validate the input path and read the image bytes.
///
/// Rejects missing files and unsupported extensions before any provider is
/// contacted, so configuration problems surface without a network round trip.
pub fn read_image_bytes(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(anyhow!("Input image does not exist: {}", path.display()));
    }
    if !is_supported_image_file(path) {
        return Err(anyhow!(
            "Unsupported image format: {} (supported: jpg, jpeg, png)",
            path.display()
        ));
    }
    let bytes = fs::read(path)?;
    if bytes.is_empty() {
        return Err(anyhow!("Input image is empty: {}", path.display()));
    }
    Ok(bytes)
}
