//! Acceptance policy configuration.
//!
//! Every threshold the decision engine consults lives here, so the exact
//! interaction of the strict/relaxed tiers and the recheck gate is data,
//! not code. Defaults are calibrated for Euclidean distance over
//! L2-normalized ArcFace embeddings.

use serde::{Deserialize, Serialize};

// --- Named constants (threshold floors/ceilings) ---
const MIN_EFFECTIVE_TOLERANCE: f32 = 0.01;
const RELAXED_TOLERANCE_CEILING: f32 = 0.85;
const MIN_EFFECTIVE_RELAXED_MARGIN: f32 = 0.01;
/// Typical good-match distance band when there is no competitor to margin against.
const SINGLE_GUEST_TOLERANCE_FLOOR: f32 = 0.66;
const SINGLE_GUEST_RELAXED_FLOOR: f32 = 0.70;
/// Crowd adaptation: more faces in frame means higher false-positive risk.
const CROWD_SMALL: usize = 5;
const CROWD_LARGE: usize = 8;
const CROWD_SMALL_TOLERANCE_ADJ: f32 = -0.02;
const CROWD_SMALL_MARGIN_ADJ: f32 = 0.03;
const CROWD_LARGE_TOLERANCE_ADJ: f32 = -0.03;
const CROWD_LARGE_MARGIN_ADJ: f32 = 0.05;

/// Second-pass bootstrap refinement settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapPolicy {
    pub enabled: bool,
    /// Collect pass-1 faces up to this distance as refinement samples.
    pub cutoff: f32,
    /// Minimum samples a guest needs before a refined profile is built.
    pub min_samples: usize,
    /// Use the closest-K samples for the refined vector.
    pub top_k: usize,
    /// Fixed pass-2 acceptance tolerance against refined profiles.
    pub tolerance: f32,
}

impl Default for BootstrapPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            cutoff: 0.80,
            min_samples: 5,
            top_k: 30,
            tolerance: 0.66,
        }
    }
}

/// Full matching policy: base thresholds, relaxed-tier derivation, recheck
/// gating, candidate export, and bootstrap settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchPolicy {
    /// Maximum distance for a plausible match.
    pub tolerance: f32,
    /// Required gap between best and second-best guest distance.
    pub margin: f32,
    /// Added to `tolerance` for the relaxed tier, capped at `relaxed_tolerance_cap`.
    pub relaxed_offset: f32,
    pub relaxed_tolerance_cap: f32,
    /// Relaxed margin is `margin / 2`, but never below this floor.
    pub relaxed_margin_floor: f32,
    /// Whether borderline accepts get a precise re-verification.
    pub recheck: bool,
    /// Recheck triggers when `best < tolerance + recheck_tolerance_pad`.
    pub recheck_tolerance_pad: f32,
    /// Recheck triggers when `delta < margin + recheck_margin_pad`.
    pub recheck_margin_pad: f32,
    /// Skip the recheck on images whose longest side reaches this many pixels.
    pub oversized_dimension: u32,
    /// Save rejected-but-plausible photos for review up to this distance.
    pub max_candidate_distance: f32,
    /// How many ranked guests to include in reject logs.
    pub top_candidates: usize,
    pub bootstrap: BootstrapPolicy,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            tolerance: 0.45,
            margin: 0.10,
            relaxed_offset: 0.10,
            relaxed_tolerance_cap: 0.78,
            relaxed_margin_floor: 0.02,
            recheck: true,
            recheck_tolerance_pad: 0.05,
            recheck_margin_pad: 0.03,
            oversized_dimension: 3000,
            max_candidate_distance: 0.90,
            top_candidates: 3,
            bootstrap: BootstrapPolicy::default(),
        }
    }
}

/// Thresholds after crowd and single-guest adaptation, for one photo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectiveThresholds {
    pub tolerance: f32,
    pub margin: f32,
    pub relaxed_tolerance: f32,
    pub relaxed_margin: f32,
}

impl MatchPolicy {
    /// Base relaxed tolerance: `tolerance + relaxed_offset`, capped.
    pub fn relaxed_tolerance(&self) -> f32 {
        (self.tolerance + self.relaxed_offset).min(self.relaxed_tolerance_cap)
    }

    /// Base relaxed margin: half the margin, floored.
    pub fn relaxed_margin(&self) -> f32 {
        (self.margin * 0.5).max(self.relaxed_margin_floor)
    }

    /// Adapt thresholds for one photo.
    ///
    /// Crowded frames demand a closer match and a wider gap. With a single
    /// registered guest there is no second-best to margin against, so the
    /// margin requirement is waived and tolerance is raised toward the
    /// typical good-match band.
    pub fn effective(&self, faces_in_photo: usize, single_guest: bool) -> EffectiveThresholds {
        let mut tol_adj = 0.0;
        let mut margin_adj = 0.0;
        if faces_in_photo >= CROWD_SMALL {
            tol_adj += CROWD_SMALL_TOLERANCE_ADJ;
            margin_adj += CROWD_SMALL_MARGIN_ADJ;
        }
        if faces_in_photo >= CROWD_LARGE {
            tol_adj += CROWD_LARGE_TOLERANCE_ADJ;
            margin_adj += CROWD_LARGE_MARGIN_ADJ;
        }

        let mut eff = EffectiveThresholds {
            tolerance: (self.tolerance + tol_adj).max(MIN_EFFECTIVE_TOLERANCE),
            margin: (self.margin + margin_adj).max(0.0),
            relaxed_tolerance: (self.relaxed_tolerance() + tol_adj).min(RELAXED_TOLERANCE_CEILING),
            relaxed_margin: (self.relaxed_margin() + margin_adj * 0.5)
                .max(MIN_EFFECTIVE_RELAXED_MARGIN),
        };

        if single_guest {
            eff.tolerance = eff.tolerance.max(SINGLE_GUEST_TOLERANCE_FLOOR);
            eff.relaxed_tolerance = eff.relaxed_tolerance.max(SINGLE_GUEST_RELAXED_FLOOR);
            eff.margin = 0.0;
            eff.relaxed_margin = 0.0;
        }

        eff
    }

    /// Crowd scenes force a recheck even when the gate is otherwise off.
    pub fn crowd_forces_recheck(&self, faces_in_photo: usize) -> bool {
        faces_in_photo >= CROWD_SMALL
    }
}
