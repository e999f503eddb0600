//! Two-pass run orchestration.
//!
//! Pass one: cheap extraction, full decision engine with recheck, loose
//! bootstrap collection. Pass two (when any guest refines): precise
//! extraction against refined profiles only, fixed tolerance, no margin,
//! no recheck. One photo is processed fully before the next; per-item
//! failures never abort the run.

use crate::config::RunConfig;
use crate::recorder::{MatchRecorder, Pass};
use crate::report::{self, RunStats};
use crate::scan::{self, EventLayout};
use facesort_core::{
    profile, ranker, BootstrapCollector, Decision, DecisionEngine, Embedding, FaceContext,
    FaceSource, Fidelity,
};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

pub fn run(
    config: &RunConfig,
    source: &mut dyn FaceSource,
    abort: &AtomicBool,
) -> anyhow::Result<RunStats> {
    let started = Instant::now();
    let layout = EventLayout::new(&config.event_path);

    let roster = scan::scan_roster(&layout)?;
    let photos = scan::scan_photos(&layout)?;

    let mut stats = RunStats {
        total_selfies: roster.iter().map(|(_, selfies)| selfies.len()).sum(),
        total_photos: photos.len(),
        ..RunStats::default()
    };

    let profiles = profile::build_profiles(source, &roster)?;
    stats.valid_selfies = profiles.total_embeddings();
    stats.guests_enrolled = profiles.len();

    let engine = DecisionEngine::new(&config.policy, &profiles);
    let mut collector = BootstrapCollector::new(&config.policy.bootstrap);
    let mut recorder = MatchRecorder::new(&layout);

    tracing::info!(
        tolerance = config.policy.tolerance,
        margin = config.policy.margin,
        relaxed_tolerance = config.policy.relaxed_tolerance(),
        relaxed_margin = config.policy.relaxed_margin(),
        recheck = config.policy.recheck,
        "pass one starting"
    );

    for (i, photo) in photos.iter().enumerate() {
        if abort.load(Ordering::Relaxed) {
            anyhow::bail!("interrupted; photos already copied remain in place");
        }
        let name = photo_name(photo);
        tracing::info!(photo = %name, n = i + 1, total = photos.len(), "processing photo");

        let outcome = match source.extract(photo, Fidelity::Standard) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(photo = %name, error = %err, "skipping photo");
                continue;
            }
        };
        if outcome.faces.is_empty() {
            tracing::info!(photo = %name, "no faces detected");
            continue;
        }

        let ctx = FaceContext {
            photo: name,
            faces_in_photo: outcome.faces.len(),
            width: outcome.width,
            height: outcome.height,
        };

        for (face_index, face) in outcome.faces.iter().enumerate() {
            let ranking = ranker::rank(&face.embedding, &profiles);
            if let Some(best) = ranking.best() {
                collector.observe(&best.key, best.distance, photo, face_index);
            }

            let decision = engine.decide(&ranking, &ctx, || precise_embeddings(&mut *source, photo));
            match decision {
                Decision::Accept {
                    guest,
                    best,
                    second_best,
                    ..
                } => {
                    recorder.record_match(&guest, photo, best, second_best, Pass::First)?;
                }
                Decision::Reject {
                    candidate: Some(candidate),
                    ..
                } => {
                    recorder.record_candidate(&candidate.guest, photo, candidate.distance)?;
                }
                Decision::Reject { candidate: None, .. } => {}
            }
        }
    }

    if let Some(refined) = collector.refine(source, &profiles) {
        let tolerance = config.policy.bootstrap.tolerance;
        tracing::info!(
            guests = refined.len(),
            tolerance,
            "pass two starting with refined profiles"
        );

        for photo in &photos {
            if abort.load(Ordering::Relaxed) {
                anyhow::bail!("interrupted; photos already copied remain in place");
            }
            let name = photo_name(photo);

            let outcome = match source.extract(photo, Fidelity::Precise) {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::warn!(photo = %name, error = %err, "skipping photo in pass two");
                    continue;
                }
            };

            for face in &outcome.faces {
                let ranking = ranker::rank(&face.embedding, &refined);
                let Some(best) = ranking.best() else {
                    continue;
                };
                if best.distance < tolerance
                    && recorder.record_match(
                        &best.key,
                        photo,
                        best.distance,
                        ranking.second_best_distance(),
                        Pass::Second,
                    )?
                {
                    stats.pass_two_matches += 1;
                }
            }
        }
    }

    stats.total_matches = recorder.match_count();
    stats.candidates_saved = recorder.candidate_count();
    stats.processing_seconds = started.elapsed().as_secs_f64();

    report::write_report(&layout.report_path, &config.event_path, &stats, &config.policy)?;

    if stats.total_matches == 0 {
        tracing::warn!("run finished with zero matches");
    }
    tracing::info!(
        guests = stats.guests_enrolled,
        photos = stats.total_photos,
        matches = stats.total_matches,
        pass_two = stats.pass_two_matches,
        candidates = stats.candidates_saved,
        "processing complete"
    );

    Ok(stats)
}

/// Re-extract a photo at precise fidelity for the recheck gate. Extraction
/// failures are inconclusive (empty), which the engine treats as reject.
fn precise_embeddings(source: &mut dyn FaceSource, photo: &Path) -> Vec<Embedding> {
    match source.extract(photo, Fidelity::Precise) {
        Ok(outcome) => outcome.faces.into_iter().map(|f| f.embedding).collect(),
        Err(err) => {
            tracing::warn!(photo = %photo.display(), error = %err, "recheck extraction failed");
            Vec::new()
        }
    }
}

fn photo_name(photo: &Path) -> &str {
    photo
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("photo")
}
