//! Second-pass bootstrap refinement.
//!
//! Pass one records every face whose best-guest distance falls under a
//! loose cutoff. Guests that accumulate enough samples get a refined
//! profile: the element-wise median of precise re-extractions of their
//! closest-K sample photos. Pass two matches all photos again with the
//! refined profiles only, under a single fixed tolerance — it can catch
//! matches pass one missed when the original selfies were
//! unrepresentative, and the shared ledger keeps it from duplicating
//! pass-one accepts.

use crate::policy::BootstrapPolicy;
use crate::profile::{GuestProfile, ProfileSet};
use crate::provider::{FaceSource, Fidelity};
use crate::types::Embedding;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One loose near-match observed during pass one.
#[derive(Debug, Clone)]
struct LooseSample {
    distance: f32,
    photo: PathBuf,
    #[allow(dead_code)]
    face_index: usize,
}

/// Accumulates loose pass-one candidates per guest.
#[derive(Debug)]
pub struct BootstrapCollector {
    policy: BootstrapPolicy,
    by_guest: HashMap<String, Vec<LooseSample>>,
}

impl BootstrapCollector {
    pub fn new(policy: &BootstrapPolicy) -> Self {
        Self {
            policy: policy.clone(),
            by_guest: HashMap::new(),
        }
    }

    /// Record a pass-one best-guest observation if it clears the loose cutoff.
    pub fn observe(&mut self, guest: &str, distance: f32, photo: &Path, face_index: usize) {
        if !self.policy.enabled || distance > self.policy.cutoff {
            return;
        }
        self.by_guest
            .entry(guest.to_string())
            .or_default()
            .push(LooseSample {
                distance,
                photo: photo.to_path_buf(),
                face_index,
            });
    }

    pub fn sample_count(&self, guest: &str) -> usize {
        self.by_guest.get(guest).map_or(0, Vec::len)
    }

    /// Build refined profiles for every guest with enough samples.
    ///
    /// Iterates guests in profile discovery order so re-runs refine
    /// identically. Returns `None` when no guest qualifies (pass two is
    /// skipped entirely).
    pub fn refine(
        &self,
        source: &mut dyn FaceSource,
        profiles: &ProfileSet,
    ) -> Option<ProfileSet> {
        if !self.policy.enabled {
            return None;
        }

        let mut refined = Vec::new();
        for profile in profiles.profiles() {
            let Some(samples) = self.by_guest.get(&profile.key) else {
                continue;
            };
            if samples.len() < self.policy.min_samples {
                tracing::debug!(
                    guest = %profile.key,
                    samples = samples.len(),
                    needed = self.policy.min_samples,
                    "too few loose candidates to refine"
                );
                continue;
            }

            let mut closest = samples.clone();
            closest.sort_by(|a, b| {
                a.distance
                    .partial_cmp(&b.distance)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            closest.truncate(self.policy.top_k);

            let mut pool = Vec::new();
            for sample in &closest {
                match source.extract(&sample.photo, Fidelity::Precise) {
                    Ok(outcome) => pool.extend(outcome.faces.into_iter().map(|f| f.embedding)),
                    Err(err) => {
                        tracing::warn!(
                            photo = %sample.photo.display(),
                            error = %err,
                            "skipping refinement sample"
                        );
                    }
                }
            }

            match Embedding::median(&pool) {
                Some(vector) => {
                    tracing::info!(
                        guest = %profile.key,
                        vectors = pool.len(),
                        "refined profile ready"
                    );
                    refined.push(GuestProfile {
                        key: profile.key.clone(),
                        embeddings: vec![vector],
                        centroid: None,
                    });
                }
                None => {
                    tracing::warn!(guest = %profile.key, "no vectors survived re-extraction");
                }
            }
        }

        if refined.is_empty() {
            None
        } else {
            Some(ProfileSet::from_profiles(refined))
        }
    }
}
