//! Processing report: run statistics plus the policy that produced them,
//! written as JSON next to the event's output directories.

use anyhow::Context;
use facesort_core::MatchPolicy;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Default, Serialize)]
pub struct RunStats {
    pub total_selfies: usize,
    pub valid_selfies: usize,
    pub guests_enrolled: usize,
    pub total_photos: usize,
    pub total_matches: usize,
    pub pass_two_matches: usize,
    pub candidates_saved: usize,
    pub processing_seconds: f64,
}

#[derive(Serialize)]
struct ProcessingReport<'a> {
    run_id: String,
    timestamp: String,
    event_path: String,
    success: bool,
    statistics: &'a RunStats,
    policy: &'a MatchPolicy,
}

pub fn write_report(
    path: &Path,
    event_path: &Path,
    stats: &RunStats,
    policy: &MatchPolicy,
) -> anyhow::Result<()> {
    let report = ProcessingReport {
        run_id: uuid::Uuid::new_v4().to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        event_path: event_path.display().to_string(),
        success: true,
        statistics: stats,
        policy,
    };

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating report file {}", path.display()))?;
    serde_json::to_writer_pretty(file, &report)
        .with_context(|| format!("writing report to {}", path.display()))?;

    tracing::info!(path = %path.display(), "processing report saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_round_trips_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processing_report.json");

        let stats = RunStats {
            total_selfies: 4,
            valid_selfies: 3,
            guests_enrolled: 2,
            total_photos: 10,
            total_matches: 5,
            pass_two_matches: 1,
            candidates_saved: 2,
            processing_seconds: 12.5,
        };
        write_report(&path, Path::new("/events/gala"), &stats, &MatchPolicy::default()).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["event_path"], "/events/gala");
        assert_eq!(value["success"], true);
        assert_eq!(value["statistics"]["total_matches"], 5);
        assert_eq!(value["statistics"]["pass_two_matches"], 1);
        assert!((value["policy"]["tolerance"].as_f64().unwrap() - 0.45).abs() < 1e-6);
        assert_eq!(value["policy"]["bootstrap"]["top_k"], 30);
        assert!(!value["run_id"].as_str().unwrap().is_empty());
    }
}
