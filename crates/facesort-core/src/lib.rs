//! facesort-core — Matching and decision engine for event photo sorting.
//!
//! Turns face-to-face distances into accept/reject/candidate decisions:
//! guest profiles built from selfies, min-per-guest candidate ranking,
//! a two-tier acceptance policy with a precise recheck gate, and an
//! optional second-pass bootstrap refinement.

pub mod decision;
pub mod ledger;
pub mod policy;
pub mod profile;
pub mod provider;
pub mod ranker;
pub mod refiner;
pub mod types;

pub use decision::{Candidate, Decision, DecisionEngine, FaceContext, Tier};
pub use ledger::MatchLedger;
pub use policy::{BootstrapPolicy, EffectiveThresholds, MatchPolicy};
pub use profile::{GuestProfile, ProfileError, ProfileSet};
pub use provider::{ExtractError, ExtractOutcome, ExtractedFace, FaceSource, Fidelity};
pub use ranker::Ranking;
pub use refiner::BootstrapCollector;
pub use types::{BoundingBox, Embedding};
