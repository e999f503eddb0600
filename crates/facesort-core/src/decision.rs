//! Acceptance decisions for one detected face.
//!
//! Two tiers (strict, relaxed) evaluated against crowd- and
//! single-guest-adapted thresholds, a borderline recheck gate that
//! re-verifies at precise fidelity, and a candidate-for-review fallback
//! on reject. Terminal outcomes map to: copy-to-matched,
//! copy-to-candidates, or no action.

use crate::policy::{EffectiveThresholds, MatchPolicy};
use crate::profile::ProfileSet;
use crate::ranker::{self, Ranking};
use crate::types::Embedding;

/// Which acceptance tier fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Strict,
    Relaxed,
}

/// A rejected but plausible match, saved separately for human review.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub guest: String,
    pub distance: f32,
}

/// Terminal decision for one face.
#[derive(Debug, Clone)]
pub enum Decision {
    Accept {
        guest: String,
        tier: Tier,
        best: f32,
        second_best: f32,
        /// Whether the precise recheck confirmed this accept.
        rechecked: bool,
    },
    Reject {
        candidate: Option<Candidate>,
        best: f32,
        second_best: f32,
    },
}

/// Photo-level facts the engine needs alongside a face's ranking.
#[derive(Debug, Clone)]
pub struct FaceContext<'a> {
    /// Photo filename, for logs only.
    pub photo: &'a str,
    pub faces_in_photo: usize,
    pub width: u32,
    pub height: u32,
}

impl FaceContext<'_> {
    fn oversized(&self, policy: &MatchPolicy) -> bool {
        self.width.max(self.height) >= policy.oversized_dimension
    }
}

/// Decision engine for one run. Holds the policy and the guest profiles;
/// the recheck gallery is the profile set itself (profiles are built at
/// precise fidelity, so the precise-side cache collapses to the originals).
pub struct DecisionEngine<'a> {
    policy: &'a MatchPolicy,
    profiles: &'a ProfileSet,
    single_guest: bool,
}

impl<'a> DecisionEngine<'a> {
    pub fn new(policy: &'a MatchPolicy, profiles: &'a ProfileSet) -> Self {
        let single_guest = profiles.single_guest();
        if single_guest {
            tracing::info!("single-guest mode: margin waived, recheck disabled");
        }
        Self {
            policy,
            profiles,
            single_guest,
        }
    }

    /// Decide one face from its ranking.
    ///
    /// `recheck_extract` re-extracts the photo's faces at precise fidelity;
    /// it is only invoked when the recheck gate triggers. An empty return
    /// is treated as inconclusive and demotes the decision to reject.
    pub fn decide(
        &self,
        ranking: &Ranking,
        ctx: &FaceContext<'_>,
        recheck_extract: impl FnOnce() -> Vec<Embedding>,
    ) -> Decision {
        let Some(best) = ranking.best() else {
            return Decision::Reject {
                candidate: None,
                best: f32::INFINITY,
                second_best: f32::INFINITY,
            };
        };
        let winner = best.key.clone();
        let best_distance = best.distance;
        let second_best = ranking.second_best_distance();
        let delta = second_best - best_distance;

        let eff = self.policy.effective(ctx.faces_in_photo, self.single_guest);

        let tier = if best_distance < eff.tolerance && (delta >= eff.margin || self.single_guest) {
            Some(Tier::Strict)
        } else if best_distance < eff.relaxed_tolerance
            && (delta >= eff.relaxed_margin || self.single_guest)
        {
            Some(Tier::Relaxed)
        } else {
            None
        };

        let Some(tier) = tier else {
            tracing::info!(
                photo = %ctx.photo,
                best = format!("{best_distance:.3}"),
                second = format!("{second_best:.3}"),
                delta = format!("{delta:.3}"),
                tolerance = eff.tolerance,
                margin = eff.margin,
                top = %ranking.preview(self.policy.top_candidates),
                "rejected"
            );
            let candidate = (best_distance <= self.policy.max_candidate_distance).then(|| {
                Candidate {
                    guest: winner.clone(),
                    distance: best_distance,
                }
            });
            return Decision::Reject {
                candidate,
                best: best_distance,
                second_best,
            };
        };

        if self.needs_recheck(ctx, best_distance, delta) {
            if ctx.oversized(self.policy) {
                tracing::info!(
                    photo = %ctx.photo,
                    width = ctx.width,
                    height = ctx.height,
                    "precise recheck skipped (oversized image)"
                );
            } else {
                let precise_faces = recheck_extract();
                if !self.confirm_recheck(ctx, &winner, tier, &eff, &precise_faces) {
                    return Decision::Reject {
                        candidate: None,
                        best: best_distance,
                        second_best,
                    };
                }
                return Decision::Accept {
                    guest: winner,
                    tier,
                    best: best_distance,
                    second_best,
                    rechecked: true,
                };
            }
        }

        Decision::Accept {
            guest: winner,
            tier,
            best: best_distance,
            second_best,
            rechecked: false,
        }
    }

    /// Recheck gate. Crowd scenes force it even when disabled by policy;
    /// single-guest mode always skips it. The trigger compares against the
    /// *base* thresholds plus pads: a marginal margin or a best distance
    /// near the tolerance boundary.
    fn needs_recheck(&self, ctx: &FaceContext<'_>, best_distance: f32, delta: f32) -> bool {
        if self.single_guest {
            return false;
        }
        let gate_on =
            self.policy.recheck || self.policy.crowd_forces_recheck(ctx.faces_in_photo);
        if !gate_on {
            return false;
        }
        best_distance < self.policy.tolerance + self.policy.recheck_tolerance_pad
            || delta < self.policy.margin + self.policy.recheck_margin_pad
    }

    /// Confirm a tier with precise embeddings: the globally best precise
    /// face must pick the same winner and independently clear the tier's
    /// thresholds. Rechecks rank against raw profile embeddings only.
    fn confirm_recheck(
        &self,
        ctx: &FaceContext<'_>,
        winner: &str,
        tier: Tier,
        eff: &EffectiveThresholds,
        precise_faces: &[Embedding],
    ) -> bool {
        if precise_faces.is_empty() {
            tracing::info!(photo = %ctx.photo, "recheck inconclusive: no faces at precise fidelity");
            return false;
        }

        let mut best: Option<(f32, String, f32)> = None;
        for emb in precise_faces {
            let ranking = ranker::rank_raw(emb, self.profiles);
            if let Some(top) = ranking.best() {
                if best.as_ref().map_or(true, |(d, _, _)| top.distance < *d) {
                    best = Some((top.distance, top.key.clone(), ranking.second_best_distance()));
                }
            }
        }
        let Some((distance, key, second)) = best else {
            tracing::info!(photo = %ctx.photo, "recheck inconclusive: empty ranking");
            return false;
        };

        if key != winner {
            tracing::info!(
                photo = %ctx.photo,
                first_pass = %winner,
                recheck = %key,
                "recheck reject: winner changed"
            );
            return false;
        }

        let delta = second - distance;
        let (required_tolerance, required_margin) = match tier {
            Tier::Strict => (eff.tolerance, eff.margin),
            // Relaxed confirmations tighten toward the strict band.
            Tier::Relaxed => (
                eff.relaxed_tolerance
                    .min(eff.tolerance + self.policy.recheck_tolerance_pad * 0.5),
                eff.relaxed_margin.max(eff.margin * 0.5),
            ),
        };

        let confirmed = distance < required_tolerance && delta >= required_margin;
        if !confirmed {
            tracing::info!(
                photo = %ctx.photo,
                best = format!("{distance:.3}"),
                delta = format!("{delta:.3}"),
                tolerance = required_tolerance,
                margin = required_margin,
                "recheck reject: thresholds not met"
            );
        }
        confirmed
    }
}
