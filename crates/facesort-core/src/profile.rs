//! Guest profile construction.
//!
//! One profile per guest, built once per run from that guest's selfies at
//! precise fidelity. Profiles are immutable afterwards; the bootstrap
//! refiner derives *new* vectors rather than mutating these.

use crate::provider::{FaceSource, Fidelity};
use crate::types::Embedding;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("no usable guest profiles — every selfie failed to yield a face")]
    NoProfiles,
}

/// A guest's representative embeddings: one per usable selfie, in selfie
/// discovery order, plus a derived centroid (element-wise mean).
///
/// The centroid stabilizes ranking when an individual selfie is low-res or
/// noisy; both the raw embeddings and the centroid enter the ranking pool.
#[derive(Debug, Clone)]
pub struct GuestProfile {
    pub key: String,
    pub embeddings: Vec<Embedding>,
    pub centroid: Option<Embedding>,
}

/// All guest profiles, in guest discovery order.
///
/// The order is load-bearing: it is the deterministic tie-break for
/// ranking and the iteration order for refinement.
#[derive(Debug, Clone, Default)]
pub struct ProfileSet {
    profiles: Vec<GuestProfile>,
}

impl ProfileSet {
    pub fn profiles(&self) -> &[GuestProfile] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// With exactly one registered guest the margin policy is waived.
    pub fn single_guest(&self) -> bool {
        self.profiles.len() == 1
    }

    /// Total stored selfie embeddings across all guests (one per usable selfie).
    pub fn total_embeddings(&self) -> usize {
        self.profiles.iter().map(|p| p.embeddings.len()).sum()
    }

    /// Assemble a set from prebuilt profiles (refined second-pass sets).
    pub fn from_profiles(profiles: Vec<GuestProfile>) -> Self {
        Self { profiles }
    }
}

/// Build guest profiles from a selfie roster.
///
/// Each selfie is extracted at [`Fidelity::Precise`]; the first detected
/// face contributes one embedding. Selfies with input defects or no
/// detectable face are logged and skipped; a guest with zero usable
/// selfies is excluded. Zero guests overall is a run-level failure.
pub fn build_profiles(
    source: &mut dyn FaceSource,
    roster: &[(String, Vec<PathBuf>)],
) -> Result<ProfileSet, ProfileError> {
    let mut profiles = Vec::new();

    for (guest, selfies) in roster {
        let mut embeddings = Vec::new();
        for selfie in selfies {
            let outcome = match source.extract(selfie, Fidelity::Precise) {
                Ok(o) => o,
                Err(err) => {
                    tracing::warn!(guest = %guest, selfie = %selfie.display(), error = %err, "skipping selfie");
                    continue;
                }
            };
            match outcome.faces.first() {
                Some(face) => {
                    embeddings.push(face.embedding.clone());
                    tracing::info!(guest = %guest, selfie = %selfie.display(), "selfie enrolled");
                }
                None => {
                    tracing::warn!(guest = %guest, selfie = %selfie.display(), "no face found in selfie");
                }
            }
        }

        if embeddings.is_empty() {
            tracing::warn!(guest = %guest, "no usable selfies; guest excluded from matching");
            continue;
        }

        let centroid = Embedding::mean(&embeddings);
        profiles.push(GuestProfile {
            key: guest.clone(),
            embeddings,
            centroid,
        });
    }

    if profiles.is_empty() {
        return Err(ProfileError::NoProfiles);
    }

    tracing::info!(guests = profiles.len(), "guest profiles built");
    Ok(ProfileSet { profiles })
}
