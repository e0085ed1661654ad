//! Segmentation model download.
//!
//! The model is streamed to a `.part` file next to its destination and only
//! renamed into place once the transfer completed and, when a digest is
//! pinned, its BLAKE3 checksum matched.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::error::BackgroundError;

/// Download `url` to `dest`, returning the BLAKE3 hex digest of the file.
pub async fn download_model(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    expected_blake3: Option<&str>,
) -> Result<String, BackgroundError> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| write_error(parent, e))?;
    }

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| BackgroundError::Download(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(BackgroundError::Download(format!(
            "{url} returned HTTP {}",
            status.as_u16()
        )));
    }

    let total_size = response.content_length();
    if let Some(size) = total_size {
        tracing::info!("  Size: {:.1} MB", size as f64 / (1024.0 * 1024.0));
    }

    let part = part_path(dest);
    let mut file = tokio::fs::File::create(&part)
        .await
        .map_err(|e| write_error(&part, e))?;
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                drop(file);
                let _ = tokio::fs::remove_file(&part).await;
                return Err(BackgroundError::Download(format!("{url}: {e}")));
            }
        };
        file.write_all(&chunk)
            .await
            .map_err(|e| write_error(&part, e))?;
        downloaded += chunk.len() as u64;

        if let Some(total) = total_size {
            if downloaded % (20 * 1024 * 1024) < chunk.len() as u64 {
                tracing::info!(
                    "  Progress: {:.0}%",
                    downloaded as f64 / total as f64 * 100.0
                );
            }
        }
    }

    file.flush().await.map_err(|e| write_error(&part, e))?;
    drop(file);

    let digest = match expected_blake3 {
        Some(expected) => verify_blake3(&part, expected)?,
        None => file_blake3(&part).map_err(|e| write_error(&part, e))?,
    };

    tokio::fs::rename(&part, dest)
        .await
        .map_err(|e| write_error(dest, e))?;
    tracing::debug!("Model written to {:?} ({downloaded} bytes)", dest);
    Ok(digest)
}

/// BLAKE3 hex digest of a file's contents.
pub fn file_blake3(path: &Path) -> std::io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = blake3::Hasher::new();

    let mut buffer = [0u8; 65536];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

/// Check a file against an expected BLAKE3 digest.
///
/// On mismatch the file is removed so the next attempt starts clean.
pub fn verify_blake3(path: &Path, expected: &str) -> Result<String, BackgroundError> {
    let actual = file_blake3(path).map_err(|e| write_error(path, e))?;
    let expected = expected.trim();

    if !actual.eq_ignore_ascii_case(expected) {
        let _ = std::fs::remove_file(path);
        return Err(BackgroundError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            actual,
        });
    }

    tracing::debug!("  Checksum verified: {}", &actual[..16]);
    Ok(actual)
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

fn write_error(path: &Path, e: std::io::Error) -> BackgroundError {
    BackgroundError::Download(format!("{}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("/models/u2net/u2net.onnx")),
            PathBuf::from("/models/u2net/u2net.onnx.part")
        );
    }

    #[test]
    fn test_verify_blake3_accepts_matching_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"segmentation weights").unwrap();

        let expected = blake3::hash(b"segmentation weights").to_hex().to_string();
        let digest = verify_blake3(&path, &expected.to_uppercase()).unwrap();
        assert_eq!(digest, expected);
        assert!(path.exists());
    }

    #[test]
    fn test_verify_blake3_removes_file_on_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"truncated").unwrap();

        let wrong = blake3::hash(b"something else").to_hex().to_string();
        match verify_blake3(&path, &wrong) {
            Err(BackgroundError::ChecksumMismatch { expected, .. }) => assert_eq!(expected, wrong),
            other => panic!("Expected ChecksumMismatch, got {other:?}"),
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_file_blake3_matches_in_memory_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.bin");
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        assert_eq!(
            file_blake3(&path).unwrap(),
            blake3::hash(&data).to_hex().to_string()
        );
    }
}
