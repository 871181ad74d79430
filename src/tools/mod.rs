use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use image::GrayImage;

use crate::error::{OmrError, Result};

/// Load an image from disk as 8-bit grayscale.
pub fn load_gray<P: AsRef<Path>>(path: P) -> Result<GrayImage> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|source| OmrError::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.to_luma8())
}

/// Whether `name` ends with `suffix`, ignoring ASCII case.
pub fn has_suffix_ignore_case(name: &str, suffix: &str) -> bool {
    name.len() >= suffix.len()
        && name
            .get(name.len() - suffix.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
}

/// Front-side scans directly inside `dir`, in lexicographic path order.
///
/// Only regular files whose name ends with `suffix` (case-insensitive) are
/// returned; subdirectories are not searched.
pub fn collect_front_images(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let eligible = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| has_suffix_ignore_case(n, suffix));
        if eligible {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

/// Parse an environment variable, ignoring unset, blank or invalid values.
pub fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    match env::var(key) {
        Ok(value) => value.trim().parse::<T>().ok(),
        Err(_) => None,
    }
}

/// Worker count from `OMR_WORKERS`; `0` means "use the default".
pub fn workers_from_env() -> Option<usize> {
    parse_env::<usize>("OMR_WORKERS").filter(|&v| v > 0)
}

/// Front-side file suffix from `OMR_FRONT_SUFFIX`.
pub fn front_suffix_from_env() -> Option<String> {
    env::var("OMR_FRONT_SUFFIX")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Share of ranked matches kept for alignment from `OMR_MATCH_FRACTION`.
///
/// Values outside `(0, 1]` are ignored.
pub fn match_fraction_from_env() -> Option<f32> {
    parse_env::<f32>("OMR_MATCH_FRACTION").filter(|&v| v > 0.0 && v <= 1.0)
}
