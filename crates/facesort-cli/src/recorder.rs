//! Match recorder: the I/O side of an accept decision.
//!
//! Owns the run-wide dedup ledger and the matched/candidates directories.
//! A photo already matched to a guest is never copied twice, even when a
//! different face or pass matches it again; an existing destination file
//! (from a previous run) is also a skip, so re-runs are no-ops.

use crate::scan::EventLayout;
use facesort_core::MatchLedger;
use std::path::Path;

/// Which matching pass produced an accept, for logs and stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    First,
    Second,
}

pub struct MatchRecorder<'a> {
    layout: &'a EventLayout,
    ledger: MatchLedger,
}

impl<'a> MatchRecorder<'a> {
    pub fn new(layout: &'a EventLayout) -> Self {
        Self {
            layout,
            ledger: MatchLedger::new(),
        }
    }

    /// Copy an accepted photo into `matched/<guest>/`.
    ///
    /// Returns `Ok(false)` on a duplicate skip (ledger hit or destination
    /// already present), `Ok(true)` when a copy actually happened.
    pub fn record_match(
        &mut self,
        guest: &str,
        photo: &Path,
        best: f32,
        second_best: f32,
        pass: Pass,
    ) -> std::io::Result<bool> {
        let Some(filename) = photo.file_name().and_then(|n| n.to_str()) else {
            tracing::warn!(photo = %photo.display(), "photo has no usable filename; skipping");
            return Ok(false);
        };

        let guest_dir = self.layout.matched_dir.join(guest);
        let destination = guest_dir.join(filename);
        if self.ledger.is_matched(guest, filename) || destination.exists() {
            tracing::info!(photo = %filename, guest = %guest, "skip duplicate match");
            return Ok(false);
        }

        std::fs::create_dir_all(&guest_dir)?;
        std::fs::copy(photo, &destination)?;
        self.ledger.record_match(guest, filename);
        tracing::info!(
            photo = %filename,
            guest = %guest,
            best = format!("{best:.3}"),
            second = format!("{second_best:.3}"),
            pass = ?pass,
            "matched"
        );
        Ok(true)
    }

    /// Copy a rejected-but-plausible photo into `candidates/<guest>/` for
    /// manual review. Deduped independently of matches.
    pub fn record_candidate(
        &mut self,
        guest: &str,
        photo: &Path,
        distance: f32,
    ) -> std::io::Result<bool> {
        let Some(filename) = photo.file_name().and_then(|n| n.to_str()) else {
            return Ok(false);
        };

        let guest_dir = self.layout.candidates_dir.join(guest);
        let destination = guest_dir.join(filename);
        if !self.ledger.record_candidate(guest, filename) || destination.exists() {
            tracing::debug!(photo = %filename, guest = %guest, "skip duplicate candidate");
            return Ok(false);
        }

        std::fs::create_dir_all(&guest_dir)?;
        std::fs::copy(photo, &destination)?;
        tracing::info!(
            photo = %filename,
            guest = %guest,
            distance = format!("{distance:.3}"),
            "candidate saved for review"
        );
        Ok(true)
    }

    pub fn match_count(&self) -> usize {
        self.ledger.match_count()
    }

    pub fn candidate_count(&self) -> usize {
        self.ledger.candidate_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> (tempfile::TempDir, EventLayout) {
        let dir = tempfile::tempdir().unwrap();
        let photos = dir.path().join("photos");
        std::fs::create_dir_all(&photos).unwrap();
        std::fs::write(photos.join("p.jpg"), b"jpeg bytes").unwrap();
        let layout = EventLayout::new(dir.path());
        (dir, layout)
    }

    #[test]
    fn test_record_match_copies_file() {
        let (_dir, layout) = event();
        let mut recorder = MatchRecorder::new(&layout);
        let photo = layout.photos_dir.join("p.jpg");

        let copied = recorder
            .record_match("ana@example.com", &photo, 0.2, 0.6, Pass::First)
            .unwrap();
        assert!(copied);
        assert!(layout.matched_dir.join("ana@example.com/p.jpg").exists());
        assert_eq!(recorder.match_count(), 1);
    }

    #[test]
    fn test_second_accept_same_key_is_noop() {
        let (_dir, layout) = event();
        let mut recorder = MatchRecorder::new(&layout);
        let photo = layout.photos_dir.join("p.jpg");

        assert!(recorder
            .record_match("ana", &photo, 0.2, 0.6, Pass::First)
            .unwrap());
        // Same guest+photo via another face or pass two: skip.
        assert!(!recorder
            .record_match("ana", &photo, 0.3, 0.7, Pass::Second)
            .unwrap());
        assert_eq!(recorder.match_count(), 1);
    }

    #[test]
    fn test_existing_destination_skips_without_ledger_entry() {
        let (_dir, layout) = event();
        let mut recorder = MatchRecorder::new(&layout);
        let photo = layout.photos_dir.join("p.jpg");

        // Simulate a previous run's output.
        let guest_dir = layout.matched_dir.join("ana");
        std::fs::create_dir_all(&guest_dir).unwrap();
        std::fs::write(guest_dir.join("p.jpg"), b"old copy").unwrap();

        assert!(!recorder
            .record_match("ana", &photo, 0.2, 0.6, Pass::First)
            .unwrap());
        assert_eq!(recorder.match_count(), 0);
        // The earlier copy is left untouched.
        assert_eq!(std::fs::read(guest_dir.join("p.jpg")).unwrap(), b"old copy");
    }

    #[test]
    fn test_candidate_dedup_independent_of_matches() {
        let (_dir, layout) = event();
        let mut recorder = MatchRecorder::new(&layout);
        let photo = layout.photos_dir.join("p.jpg");

        assert!(recorder.record_match("ana", &photo, 0.2, 0.6, Pass::First).unwrap());
        assert!(recorder.record_candidate("ana", &photo, 0.5).unwrap());
        assert!(!recorder.record_candidate("ana", &photo, 0.5).unwrap());
        assert!(layout.candidates_dir.join("ana/p.jpg").exists());
        assert_eq!(recorder.candidate_count(), 1);
    }
}
