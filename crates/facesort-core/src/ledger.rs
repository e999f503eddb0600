//! Run-wide dedup ledger.
//!
//! At most one match and one candidate record per `(guest, photo filename)`
//! key is ever acted on per run, across both passes. The ledger is owned
//! by the recorder and passed by reference — no global state.

use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct MatchLedger {
    matched: HashSet<(String, String)>,
    candidates: HashSet<(String, String)>,
}

impl MatchLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a match; `false` if this (guest, filename) was already matched.
    pub fn record_match(&mut self, guest: &str, filename: &str) -> bool {
        self.matched.insert((guest.to_string(), filename.to_string()))
    }

    pub fn is_matched(&self, guest: &str, filename: &str) -> bool {
        self.matched.contains(&(guest.to_string(), filename.to_string()))
    }

    /// Record a candidate-for-review; independent of the match set.
    pub fn record_candidate(&mut self, guest: &str, filename: &str) -> bool {
        self.candidates.insert((guest.to_string(), filename.to_string()))
    }

    pub fn match_count(&self) -> usize {
        self.matched.len()
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_dedup() {
        let mut ledger = MatchLedger::new();
        assert!(ledger.record_match("ana", "p.jpg"));
        assert!(!ledger.record_match("ana", "p.jpg"));
        assert!(ledger.is_matched("ana", "p.jpg"));
        assert_eq!(ledger.match_count(), 1);
    }

    #[test]
    fn test_same_photo_different_guest_allowed() {
        let mut ledger = MatchLedger::new();
        assert!(ledger.record_match("ana", "p.jpg"));
        assert!(ledger.record_match("bob", "p.jpg"));
        assert_eq!(ledger.match_count(), 2);
    }

    #[test]
    fn test_candidates_independent_of_matches() {
        let mut ledger = MatchLedger::new();
        assert!(ledger.record_match("ana", "p.jpg"));
        assert!(ledger.record_candidate("ana", "p.jpg"));
        assert!(!ledger.record_candidate("ana", "p.jpg"));
        assert_eq!(ledger.candidate_count(), 1);
    }
}
