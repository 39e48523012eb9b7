use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::MODEL_CACHE_DIR;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write artifact to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Directories searched before falling back to a download.
#[derive(Default)]
pub struct ResolveLocations<'a> {
    /// Explicit directory that wins over every other location. Set from
    /// `--models-dir` style flags; also what tests point at a fixture dir.
    pub override_dir: Option<&'a Path>,
    /// Directory shipped next to the executable for offline installs.
    pub bundled_dir: Option<&'a Path>,
}

/// Resolve one model artifact by file name.
///
/// Resolution order:
/// 1. Override directory, if given (must contain the file)
/// 2. User cache directory (platform-specific)
/// 3. Bundled directory, if given
/// 4. Download from `url` into the cache
pub fn resolve(
    name: &str,
    url: &str,
    locations: &ResolveLocations<'_>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    if let Some(dir) = locations.override_dir {
        let path = dir.join(name);
        if path.exists() {
            return Ok(path);
        }
    }

    let cache_dir = model_cache_dir()?;
    let cached_path = cache_dir.join(name);
    if cached_path.exists() {
        return Ok(cached_path);
    }

    if let Some(dir) = locations.bundled_dir {
        let path = dir.join(name);
        if path.exists() {
            return Ok(path);
        }
    }

    fs::create_dir_all(&cache_dir).map_err(ModelResolveError::CacheDir)?;
    log::info!("downloading model artifact {name} from {url}");
    download(url, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific artifact cache directory, e.g.
/// `~/.cache/LensLab/models/` on Linux.
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    dirs::cache_dir()
        .map(|d| d.join(MODEL_CACHE_DIR).join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let total = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;

    // Write to a temp file first, then rename for atomicity
    let temp_path = dest.with_extension("part");
    let mut file = fs::File::create(&temp_path).map_err(|e| ModelResolveError::Write {
        path: temp_path.clone(),
        source: e,
    })?;

    let bytes = response.bytes().map_err(|e| ModelResolveError::Download {
        url: url.to_string(),
        source: e,
    })?;

    // Progress fires once per chunk, not per byte
    let chunk_size = 1024 * 1024; // 1MB
    for chunk in bytes.chunks(chunk_size) {
        file.write_all(chunk)
            .map_err(|e| ModelResolveError::Write {
                path: temp_path.clone(),
                source: e,
            })?;
        downloaded += chunk.len() as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }

    file.flush().map_err(|e| ModelResolveError::Write {
        path: temp_path.clone(),
        source: e,
    })?;
    drop(file);

    fs::rename(&temp_path, dest).map_err(|e| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_prefers_override_dir() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("m.onnx"), b"override copy").unwrap();

        let locations = ResolveLocations {
            override_dir: Some(tmp.path()),
            bundled_dir: None,
        };
        let path = resolve("m.onnx", "http://unused.example/m.onnx", &locations, None).unwrap();
        assert_eq!(path, tmp.path().join("m.onnx"));
        assert_eq!(fs::read(&path).unwrap(), b"override copy");
    }

    #[test]
    fn test_resolve_override_miss_falls_through_to_bundled() {
        let tmp = TempDir::new().unwrap();
        let override_dir = tmp.path().join("override");
        let bundled_dir = tmp.path().join("bundled");
        fs::create_dir_all(&override_dir).unwrap();
        fs::create_dir_all(&bundled_dir).unwrap();
        // Use a name no cached install would carry so the user cache can't
        // satisfy the lookup between the override and bundled steps.
        let name = "lenslab-test-bundled-only.onnx";
        fs::write(bundled_dir.join(name), b"bundled copy").unwrap();

        let locations = ResolveLocations {
            override_dir: Some(&override_dir),
            bundled_dir: Some(&bundled_dir),
        };
        let path = resolve(name, "http://unused.example/m.onnx", &locations, None).unwrap();
        assert_eq!(path, bundled_dir.join(name));
    }

    #[test]
    fn test_model_cache_dir_under_app_dir() {
        let path = model_cache_dir().unwrap();
        assert!(path.to_string_lossy().contains(MODEL_CACHE_DIR));
        assert!(path.ends_with("models"));
    }

    #[test]
    fn test_download_invalid_url_returns_error() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");
        let result = download("http://invalid.nonexistent.example.com/model", &dest, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_download_atomic_no_partial_on_failure() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");
        let _ = download("http://invalid.nonexistent.example.com/model", &dest, None);
        // Neither the dest nor the .part file should exist after failure
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }
}
