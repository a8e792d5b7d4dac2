//! Peak-score leaderboard kept by the relay.
//!
//! Entries are keyed by nickname and only ever move up: a later, lower
//! report for the same nickname leaves the recorded score alone. After each
//! update the board is re-sorted (highest first) and cut to its capacity.

use serde::{Deserialize, Serialize};

/// Number of entries published to kiosks.
pub const LEADERBOARD_SIZE: usize = 5;

/// A single leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub nickname: String,
    pub score: u32,
}

#[derive(Debug, Clone)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
    capacity: usize,
}

impl Default for Leaderboard {
    fn default() -> Self {
        Self::new(LEADERBOARD_SIZE)
    }
}

impl Leaderboard {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    /// Record a score without re-sorting. Zero scores are ignored.
    /// Returns true if the board changed.
    fn record(&mut self, nickname: &str, score: u32) -> bool {
        if score == 0 {
            return false;
        }
        match self.entries.iter_mut().find(|e| e.nickname == nickname) {
            Some(entry) if score > entry.score => {
                entry.score = score;
                true
            },
            Some(_) => false,
            None => {
                self.entries.push(LeaderboardEntry {
                    nickname: nickname.to_string(),
                    score,
                });
                true
            },
        }
    }

    fn settle(&mut self) {
        // Stable sort: ties keep the order they were first recorded in.
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(self.capacity);
    }

    /// Submit one player's current score.
    pub fn submit(&mut self, nickname: &str, score: u32) -> bool {
        let changed = self.record(nickname, score);
        self.settle();
        changed
    }

    /// Submit a batch of current scores, settling once at the end.
    pub fn submit_all<'a, I>(&mut self, scores: I) -> bool
    where
        I: IntoIterator<Item = (&'a str, u32)>,
    {
        let mut changed = false;
        for (nickname, score) in scores {
            changed |= self.record(nickname, score);
        }
        self.settle();
        changed
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    /// Recorded score for a nickname, if it is on the board.
    pub fn score_of(&self, nickname: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.nickname == nickname)
            .map(|e| e.score)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_report_never_lowers_entry() {
        let mut board = Leaderboard::default();
        assert!(board.submit("ace", 9));
        assert!(!board.submit("ace", 4));
        assert_eq!(board.score_of("ace"), Some(9));
        assert!(board.submit("ace", 11));
        assert_eq!(board.score_of("ace"), Some(11));
    }

    #[test]
    fn zero_scores_are_ignored() {
        let mut board = Leaderboard::default();
        assert!(!board.submit("nobody", 0));
        assert!(board.is_empty());
    }

    #[test]
    fn sorted_descending_and_truncated() {
        let mut board = Leaderboard::default();
        board.submit_all([
            ("a", 3),
            ("b", 8),
            ("c", 1),
            ("d", 12),
            ("e", 5),
            ("f", 7),
        ]);
        let scores: Vec<u32> = board.entries().iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![12, 8, 7, 5, 3]);
        assert_eq!(board.score_of("c"), None);
    }

    #[test]
    fn dropped_player_can_reenter_with_higher_score() {
        let mut board = Leaderboard::new(2);
        board.submit_all([("a", 5), ("b", 6), ("c", 1)]);
        assert_eq!(board.score_of("c"), None);
        board.submit("c", 10);
        assert_eq!(board.entries()[0].nickname, "c");
        assert_eq!(board.len(), 2);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn board_is_sorted_bounded_and_monotone(
                reports in proptest::collection::vec((0usize..8, 0u32..50), 0..60),
            ) {
                let names = ["a", "b", "c", "d", "e", "f", "g", "h"];
                let mut board = Leaderboard::default();
                for (idx, score) in reports {
                    let before = board.score_of(names[idx]);
                    board.submit(names[idx], score);
                    if let (Some(prev), Some(now)) = (before, board.score_of(names[idx])) {
                        prop_assert!(now >= prev);
                    }
                    prop_assert!(board.len() <= LEADERBOARD_SIZE);
                    for pair in board.entries().windows(2) {
                        prop_assert!(pair[0].score >= pair[1].score);
                    }
                }
            }
        }
    }
}
