//! Download-once cache for local model weights.
//!
//! Weights land in a documented cache directory and persist across runs;
//! `ANTEP_WEIGHTS_DIR` overrides the location. A cached file is reused when
//! its checksum (if one is configured) verifies, and re-downloaded on
//! mismatch. Empty downloads are rejected before they can reach the
//! detector.

use anyhow::{anyhow, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::color_utils::symbols;

/// Where the weights for one model come from.
#[derive(Debug, Clone)]
pub struct WeightsInfo {
    pub url: String,
    pub md5_checksum: Option<String>,
    pub filename: String,
}

impl WeightsInfo {
    /// Build from a URL, deriving the cache filename from its last path
    /// segment (falling back to a fixed name for opaque URLs).
    pub fn from_url(url: String, md5_checksum: Option<String>) -> Self {
        let filename = url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|seg| seg.contains('.') && !seg.contains('?'))
            .unwrap_or("fistik-weights.onnx")
            .to_string();
        Self {
            url,
            md5_checksum,
            filename,
        }
    }
}

/// Get the cache directory for storing downloaded weights,
/// honoring the `ANTEP_WEIGHTS_DIR` override (with `~/` expansion).
pub fn get_weights_cache_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("ANTEP_WEIGHTS_DIR") {
        if let Some(stripped) = dir.strip_prefix("~/") {
            if let Some(home_dir) = dirs::home_dir() {
                return Ok(home_dir.join(stripped));
            }
        }
        let path = PathBuf::from(dir);
        if !path.exists() {
            fs::create_dir_all(&path)?;
        }
        return Ok(path);
    }

    dirs::cache_dir()
        .map(|dir| dir.join("antep").join("models"))
        .ok_or_else(|| anyhow!("Unable to determine cache directory"))
}

/// Calculate MD5 hash of bytes
pub fn calculate_md5_bytes(bytes: &[u8]) -> String {
    let mut hasher = md5::Context::new();
    hasher.consume(bytes);
    let result = hasher.compute();
    format!("{result:x}")
}

/// Calculate MD5 hash of a file
pub fn calculate_md5(path: &Path) -> Result<String> {
    let contents = fs::read(path)?;
    Ok(calculate_md5_bytes(&contents))
}

/// Verify the checksum of a file
fn verify_checksum(path: &Path, expected_md5: &str) -> Result<bool> {
    let actual_md5 = calculate_md5(path)?;
    Ok(actual_md5 == expected_md5)
}

/// Reject zero-length weights before they reach the detector.
fn validate_weights_file_size(path: &Path) -> Result<()> {
    let metadata = fs::metadata(path)?;
    if metadata.len() == 0 {
        return Err(anyhow!(
            "Weights file is empty (0 bytes): {}\n\
             Empty files are not valid ONNX models and will fail at load time.",
            path.display()
        ));
    }
    log::debug!(
        "✓ Weights file size: {:.2} MB",
        metadata.len() as f64 / (1024.0 * 1024.0)
    );
    Ok(())
}

fn download_weights(url: &str, output_path: &Path) -> Result<()> {
    log::info!("📥 Downloading weights from: {url}");

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let client = reqwest::blocking::Client::builder()
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| anyhow!("Failed to send HTTP request: {}", e))?;

    let status = response.status();
    log::debug!("📡 HTTP response status: {status}");
    if !status.is_success() {
        return Err(anyhow!("Weights download failed with status: {}", status));
    }

    let content_length = response.content_length();
    let progress_bar = if let Some(length) = content_length {
        log::info!("📏 Download size: {:.1} MB", length as f64 / (1024.0 * 1024.0));
        let pb = ProgressBar::new(length);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:30}] {bytes}/{total_bytes} ({bytes_per_sec}, ETA {eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb
    } else {
        log::warn!(
            "{}Content-Length header missing, showing spinner instead of progress bar",
            symbols::warning()
        );
        let pb = ProgressBar::new_spinner();
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    };

    let mut file = fs::File::create(output_path)
        .map_err(|e| anyhow!("Failed to create output file {}: {}", output_path.display(), e))?;

    // Stream to disk in chunks, advancing the bar as bytes arrive.
    let mut downloaded = 0u64;
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = response
            .read(&mut buffer)
            .map_err(|e| anyhow!("Failed to read response data: {}", e))?;
        if bytes_read == 0 {
            break;
        }
        file.write_all(&buffer[..bytes_read])
            .map_err(|e| anyhow!("Failed to write to file {}: {}", output_path.display(), e))?;
        downloaded += bytes_read as u64;
        progress_bar.set_position(downloaded);
    }

    file.flush()
        .map_err(|e| anyhow!("Failed to flush file {}: {}", output_path.display(), e))?;
    drop(file);

    progress_bar.finish_and_clear();
    log::debug!(
        "📦 Downloaded {downloaded} bytes ({:.2} MB)",
        downloaded as f64 / (1024.0 * 1024.0)
    );

    if let Some(expected) = content_length {
        if downloaded != expected {
            log::warn!(
                "{}Size mismatch: expected {expected} bytes, got {downloaded} bytes",
                symbols::warning()
            );
        }
    }

    validate_weights_file_size(output_path)?;

    log::info!(
        "{} Weights downloaded to: {}",
        symbols::completed_successfully(),
        output_path.display()
    );

    Ok(())
}

/// Get the cached weights path, downloading if necessary.
pub fn get_or_download_weights(info: &WeightsInfo) -> Result<PathBuf> {
    let cache_dir = get_weights_cache_dir()?;
    let weights_path = cache_dir.join(&info.filename);

    if weights_path.exists() {
        log::debug!(
            "{} Checking cached weights: {}",
            symbols::checking(),
            weights_path.display()
        );

        match &info.md5_checksum {
            None => {
                log::debug!("♻️  Reusing cached weights (no checksum configured)");
                validate_weights_file_size(&weights_path)?;
                return Ok(weights_path);
            }
            Some(expected) => match verify_checksum(&weights_path, expected) {
                Ok(true) => {
                    log::debug!(
                        "{} Using cached weights with valid checksum",
                        symbols::completed_successfully()
                    );
                    return Ok(weights_path);
                }
                Ok(false) => {
                    log::warn!("{}Cached weights have invalid checksum, re-downloading", symbols::warning());
                    fs::remove_file(&weights_path)?;
                }
                Err(e) => {
                    log::warn!(
                        "{}Error verifying checksum: {e}, re-downloading",
                        symbols::warning()
                    );
                    fs::remove_file(&weights_path)?;
                }
            },
        }
    }

    download_weights(&info.url, &weights_path)?;

    if let Some(expected) = &info.md5_checksum {
        if !verify_checksum(&weights_path, expected)? {
            fs::remove_file(&weights_path)?;
            return Err(anyhow!(
                "Downloaded weights failed checksum verification (expected MD5 {})",
                expected
            ));
        }
        log::info!(
            "{} Weights downloaded and verified successfully",
            symbols::completed_successfully()
        );
    }

    Ok(weights_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    fn test_md5_bytes() {
        let md5 = calculate_md5_bytes(b"hello world");
        assert_eq!(md5, "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[test]
    fn test_md5_file() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("test.txt");
        fs::write(&file_path, "hello world").unwrap();

        let md5 = calculate_md5(&file_path).unwrap();
        assert_eq!(md5, "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[test]
    fn test_weights_info_filename_from_url() {
        let info = WeightsInfo::from_url(
            "https://example.com/models/fistik-v3.onnx".to_string(),
            None,
        );
        assert_eq!(info.filename, "fistik-v3.onnx");

        // Opaque URLs fall back to a fixed name
        let info = WeightsInfo::from_url("https://drive.example.com/d/abc123".to_string(), None);
        assert_eq!(info.filename, "fistik-weights.onnx");
    }

    #[test]
    fn test_empty_file_rejected() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("empty.onnx");
        fs::write(&file_path, b"").unwrap();

        let err = validate_weights_file_size(&file_path).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    #[serial]
    fn test_cache_dir_env_override() {
        let temp_dir = tempdir().unwrap();
        let custom = temp_dir.path().join("weights-cache");
        std::env::set_var("ANTEP_WEIGHTS_DIR", &custom);

        let cache_dir = get_weights_cache_dir().unwrap();
        assert_eq!(cache_dir, custom);
        assert!(cache_dir.exists());

        std::env::remove_var("ANTEP_WEIGHTS_DIR");
    }

    #[test]
    #[serial]
    fn test_cache_dir_default_location() {
        std::env::remove_var("ANTEP_WEIGHTS_DIR");
        let cache_dir = get_weights_cache_dir().unwrap();
        assert!(cache_dir.to_string_lossy().contains("antep"));
        assert!(cache_dir.to_string_lossy().contains("models"));
    }
}
