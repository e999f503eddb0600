//! Candidate ranking: one query face against all guest profiles.
//!
//! Every stored selfie embedding and the guest centroid enter the pool,
//! folded to the minimum distance per guest. Using the minimum keeps one
//! bad selfie from penalizing a guest whose other selfies match well.

use crate::profile::ProfileSet;
use crate::types::Embedding;
use std::fmt::Write as _;

/// One guest's best distance to the query face.
#[derive(Debug, Clone)]
pub struct RankedGuest {
    pub key: String,
    pub distance: f32,
}

/// Guests sorted ascending by min distance. Ties keep guest discovery
/// order (stable sort), so re-runs over identical inputs rank identically.
#[derive(Debug, Clone)]
pub struct Ranking {
    ranked: Vec<RankedGuest>,
}

impl Ranking {
    pub fn best(&self) -> Option<&RankedGuest> {
        self.ranked.first()
    }

    /// Runner-up distance; `+∞` when fewer than two guests exist.
    pub fn second_best_distance(&self) -> f32 {
        self.ranked.get(1).map_or(f32::INFINITY, |g| g.distance)
    }

    /// Margin actually achieved: `second_best - best`.
    pub fn delta(&self) -> f32 {
        match self.best() {
            Some(best) => self.second_best_distance() - best.distance,
            None => f32::INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// Top-K "guest:distance" summary for reject logs.
    pub fn preview(&self, k: usize) -> String {
        let mut out = String::new();
        for (i, g) in self.ranked.iter().take(k.max(1)).enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{}:{:.3}", g.key, g.distance);
        }
        out
    }
}

/// Rank guests by min distance over raw selfie embeddings plus centroid.
pub fn rank(query: &Embedding, profiles: &ProfileSet) -> Ranking {
    rank_inner(query, profiles, true)
}

/// Rank over raw selfie embeddings only. The recheck gate uses this: the
/// precise gallery carries raw vectors, no derived centroid.
pub fn rank_raw(query: &Embedding, profiles: &ProfileSet) -> Ranking {
    rank_inner(query, profiles, false)
}

fn rank_inner(query: &Embedding, profiles: &ProfileSet, include_centroid: bool) -> Ranking {
    let mut ranked = Vec::with_capacity(profiles.len());

    for profile in profiles.profiles() {
        let mut best = f32::INFINITY;
        if include_centroid {
            if let Some(centroid) = &profile.centroid {
                best = best.min(query.distance(centroid));
            }
        }
        for emb in &profile.embeddings {
            best = best.min(query.distance(emb));
        }
        if best.is_finite() {
            ranked.push(RankedGuest {
                key: profile.key.clone(),
                distance: best,
            });
        }
    }

    // Stable sort: equal distances keep discovery order.
    ranked.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ranking { ranked }
}
