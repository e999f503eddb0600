//! Event directory layout and deterministic enumeration.
//!
//! Consumed layout: `event_root/selfies/<guest_key>/*.<ext>` and
//! `event_root/photos/*.<ext>`. Guests and files are sorted by name so a
//! re-run scans in the same order.

use std::path::{Path, PathBuf};
use thiserror::Error;

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "bmp"];

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("selfies directory not found: {0}")]
    MissingSelfiesDir(PathBuf),
    #[error("photos directory not found: {0}")]
    MissingPhotosDir(PathBuf),
    #[error("no selfie files found under {0}")]
    NoSelfies(PathBuf),
    #[error("no photo files found under {0}")]
    NoPhotos(PathBuf),
    #[error("io error scanning {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Resolved paths for one event.
pub struct EventLayout {
    pub root: PathBuf,
    pub selfies_dir: PathBuf,
    pub photos_dir: PathBuf,
    pub matched_dir: PathBuf,
    pub candidates_dir: PathBuf,
    pub report_path: PathBuf,
}

impl EventLayout {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            selfies_dir: root.join("selfies"),
            photos_dir: root.join("photos"),
            matched_dir: root.join("matched"),
            candidates_dir: root.join("candidates"),
            report_path: root.join("processing_report.json"),
        }
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let lower = e.to_ascii_lowercase();
            IMAGE_EXTENSIONS.iter().any(|known| *known == lower)
        })
        .unwrap_or(false)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|source| ScanError::Io {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    entries.sort();
    Ok(entries)
}

/// Enumerate guests and their selfie files, sorted. Errors when the
/// selfies directory is missing or holds zero selfie files.
pub fn scan_roster(layout: &EventLayout) -> Result<Vec<(String, Vec<PathBuf>)>, ScanError> {
    if !layout.selfies_dir.is_dir() {
        return Err(ScanError::MissingSelfiesDir(layout.selfies_dir.clone()));
    }

    let mut roster = Vec::new();
    let mut total_selfies = 0usize;
    for entry in sorted_entries(&layout.selfies_dir)? {
        if !entry.is_dir() {
            continue;
        }
        let Some(guest) = entry.file_name().and_then(|n| n.to_str()) else {
            tracing::warn!(path = %entry.display(), "skipping guest folder with non-UTF-8 name");
            continue;
        };
        let selfies: Vec<PathBuf> = sorted_entries(&entry)?
            .into_iter()
            .filter(|p| p.is_file() && is_image(p))
            .collect();
        tracing::info!(guest = %guest, selfies = selfies.len(), "guest folder scanned");
        if selfies.is_empty() {
            continue;
        }
        total_selfies += selfies.len();
        roster.push((guest.to_string(), selfies));
    }

    if total_selfies == 0 {
        return Err(ScanError::NoSelfies(layout.selfies_dir.clone()));
    }
    tracing::info!(guests = roster.len(), selfies = total_selfies, "roster scanned");
    Ok(roster)
}

/// Enumerate event photo files, sorted. Errors when the photos directory
/// is missing or empty.
pub fn scan_photos(layout: &EventLayout) -> Result<Vec<PathBuf>, ScanError> {
    if !layout.photos_dir.is_dir() {
        return Err(ScanError::MissingPhotosDir(layout.photos_dir.clone()));
    }

    let photos: Vec<PathBuf> = sorted_entries(&layout.photos_dir)?
        .into_iter()
        .filter(|p| p.is_file() && is_image(p))
        .collect();

    if photos.is_empty() {
        return Err(ScanError::NoPhotos(layout.photos_dir.clone()));
    }
    tracing::info!(photos = photos.len(), "photo set scanned");
    Ok(photos)
}
