//! Filesystem corpus discovery and guarded image decoding.
//!
//! The corpus lives under `base_dir/<code>/*.jpg`, one directory per
//! diagnosis code. A missing code directory contributes zero records.

use crate::taxonomy::Diagnosis;
use crate::types::{DatasetResult, DecodeOptions, HistoDatasetError};
use image::RgbImage;
use std::path::{Path, PathBuf};

/// Image extensions accepted by the scanner (case-insensitive).
const EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// One discovered corpus image: where it lives and what it is labeled as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusRecord {
    pub path: PathBuf,
    pub label: Diagnosis,
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Enumerate every matching image under each code's subdirectory. When
/// `merge` is set, labels are rewritten through the collapse map at
/// discovery time, before any splitting happens.
pub fn scan_corpus(base_dir: &Path, merge: bool) -> DatasetResult<Vec<CorpusRecord>> {
    let mut records = Vec::new();
    for diag in Diagnosis::ALL {
        let dir = base_dir.join(diag.code());
        if !dir.is_dir() {
            continue;
        }
        let entries = std::fs::read_dir(&dir).map_err(|e| HistoDatasetError::Io {
            path: dir.clone(),
            source: e,
        })?;
        let label = if merge { diag.collapse() } else { diag };
        for entry in entries {
            let entry = entry.map_err(|e| HistoDatasetError::Io {
                path: dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            if path.is_file() && is_image(&path) {
                records.push(CorpusRecord { path, label });
            }
        }
    }
    // Scan order depends on the filesystem; sort so downstream seeding is
    // a function of corpus content alone.
    records.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(records)
}

/// Decode one image to RGB, checking the header pixel count against the
/// guard before committing to a full decode.
pub fn decode_image(path: &Path, opts: &DecodeOptions) -> DatasetResult<RgbImage> {
    if let Some(max) = opts.max_pixels {
        let (w, h) = image::image_dimensions(path).map_err(|e| HistoDatasetError::Image {
            path: path.to_path_buf(),
            source: e,
        })?;
        let pixels = u64::from(w) * u64::from(h);
        if pixels > max {
            return Err(HistoDatasetError::ImageTooLarge {
                path: path.to_path_buf(),
                pixels,
                max,
            });
        }
    }
    let img = image::open(path)
        .map_err(|e| HistoDatasetError::Image {
            path: path.to_path_buf(),
            source: e,
        })?
        .to_rgb8();
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_filter() {
        assert!(is_image(Path::new("a/b/slide_001.jpg")));
        assert!(is_image(Path::new("a/b/slide_001.JPEG")));
        assert!(!is_image(Path::new("a/b/slide_001.png")));
        assert!(!is_image(Path::new("a/b/notes.txt")));
        assert!(!is_image(Path::new("a/b/no_extension")));
    }
}
