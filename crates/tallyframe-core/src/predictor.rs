//! Per-store lookup prediction.
//!
//! A [`Predictor`] remembers what one remote store has told us about each id
//! and answers a single question before every round trip: could this lookup
//! possibly return anything but Fail?
//!
//! Remote stores only ever lose records (a responder clears every record it
//! serves and nothing is ever written back), so an id seen absent stays
//! absent. That makes a negative prediction exact: skipping the round trip and
//! assuming Fail yields the same outcome the store would have returned.
//!
//! # Marks
//!
//! | outcome                | marks                                               |
//! |------------------------|-----------------------------------------------------|
//! | `Ok` / `Exact`         | id present                                          |
//! | `Fail` (query)         | id absent                                           |
//! | `Fail` (find)          | id ± 100 absent                                     |
//! | `NearAbove(m)`         | `id..m` absent, `m` present                         |
//! | `NearBelow(m)`         | `m+1..=id+100` absent, `m` present                  |

use std::ops::RangeInclusive;

use tallyframe_proto::{AccountId, Command, LookupMode, Outcome};

use crate::store::SEARCH_RADIUS;

/// Belief about one id in one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mark {
    /// Never observed.
    #[default]
    Unknown,
    /// Last observed holding a record.
    LikelyPresent,
    /// Observed empty.
    LikelyAbsent,
}

/// Belief table over the full id space for one store.
#[derive(Debug, Clone)]
pub struct Predictor {
    marks: Box<[Mark]>,
}

impl Default for Predictor {
    fn default() -> Self {
        Self::new()
    }
}

impl Predictor {
    /// Every id starts [`Mark::Unknown`].
    pub fn new() -> Self {
        Self { marks: vec![Mark::Unknown; usize::from(AccountId::MAX) + 1].into_boxed_slice() }
    }

    /// Current belief about `id`.
    pub fn mark(&self, id: AccountId) -> Mark {
        self.marks[usize::from(id)]
    }

    /// Fold a store's answer to `command` into the table.
    pub fn interpret(&mut self, outcome: &Outcome, command: &Command) {
        let (Some(id), Some(mode)) = (command.id(), command.lookup_mode()) else {
            return;
        };

        match (*outcome, mode) {
            (Outcome::Fail, LookupMode::Query) => self.set(id, Mark::LikelyAbsent),
            (Outcome::Fail, LookupMode::Find) => {
                self.set_range(neighborhood(id), Mark::LikelyAbsent);
            },
            (Outcome::Ok { .. }, _) => self.set(id, Mark::LikelyPresent),
            (Outcome::Exact { id: matched, .. }, _) => self.set(matched, Mark::LikelyPresent),
            (Outcome::NearAbove { id: matched, .. }, _) => {
                if let Some(last_empty) = matched.checked_sub(1) {
                    self.set_range(id..=last_empty, Mark::LikelyAbsent);
                }
                self.set(matched, Mark::LikelyPresent);
            },
            (Outcome::NearBelow { id: matched, .. }, _) => {
                if let Some(first_empty) = matched.checked_add(1) {
                    let last_empty = id.saturating_add(SEARCH_RADIUS);
                    self.set_range(first_empty..=last_empty, Mark::LikelyAbsent);
                }
                self.set(matched, Mark::LikelyPresent);
            },
        }
    }

    /// Whether sending `command` to the store could return anything but Fail.
    pub fn predict(&self, command: &Command) -> bool {
        let (Some(id), Some(mode)) = (command.id(), command.lookup_mode()) else {
            return true;
        };

        match mode {
            LookupMode::Query => self.mark(id) != Mark::LikelyAbsent,
            LookupMode::Find => !neighborhood(id).all(|n| self.mark(n) == Mark::LikelyAbsent),
        }
    }

    /// Record that the store handed `id` over and no longer holds it.
    pub fn mark_departed(&mut self, id: AccountId) {
        self.set(id, Mark::LikelyAbsent);
    }

    fn set(&mut self, id: AccountId, mark: Mark) {
        self.marks[usize::from(id)] = mark;
    }

    fn set_range(&mut self, ids: RangeInclusive<AccountId>, mark: Mark) {
        let (start, end) = (usize::from(*ids.start()), usize::from(*ids.end()));
        if start <= end {
            self.marks[start..=end].fill(mark);
        }
    }
}

/// Every id a FIND for `id` can match.
fn neighborhood(id: AccountId) -> RangeInclusive<AccountId> {
    id.saturating_sub(SEARCH_RADIUS)..=id.saturating_add(SEARCH_RADIUS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(id: AccountId) -> Command {
        Command::Find { id }
    }

    fn query(id: AccountId) -> Command {
        Command::Query { id }
    }

    #[test]
    fn unknown_ids_are_worth_trying() {
        let p = Predictor::new();
        assert_eq!(p.mark(1234), Mark::Unknown);
        assert!(p.predict(&find(1234)));
        assert!(p.predict(&query(1234)));
    }

    #[test]
    fn query_fail_marks_only_the_id() {
        let mut p = Predictor::new();
        p.interpret(&Outcome::Fail, &query(500));

        assert!(!p.predict(&query(500)));
        assert!(p.predict(&query(501)));
        // A single absent id says nothing about its neighbours.
        assert!(p.predict(&find(500)));
    }

    #[test]
    fn find_fail_marks_whole_neighborhood() {
        let mut p = Predictor::new();
        p.interpret(&Outcome::Fail, &Command::Give { id: 5000, amount: 10 });

        assert_eq!(p.mark(4900), Mark::LikelyAbsent);
        assert_eq!(p.mark(5100), Mark::LikelyAbsent);
        assert_eq!(p.mark(4899), Mark::Unknown);
        assert_eq!(p.mark(5101), Mark::Unknown);

        assert!(!p.predict(&find(5000)));
        assert!(!p.predict(&query(5050)));
        // Shifted neighbourhood reaches unknown ids.
        assert!(p.predict(&find(5001)));
    }

    #[test]
    fn near_above_marks_gap_and_match() {
        let mut p = Predictor::new();
        p.interpret(&Outcome::NearAbove { id: 9050, balance: 1 }, &find(9000));

        assert_eq!(p.mark(9000), Mark::LikelyAbsent);
        assert_eq!(p.mark(9049), Mark::LikelyAbsent);
        assert_eq!(p.mark(9050), Mark::LikelyPresent);
        assert_eq!(p.mark(8999), Mark::Unknown);
    }

    #[test]
    fn near_below_marks_ascending_window_and_gap() {
        let mut p = Predictor::new();
        p.interpret(&Outcome::NearBelow { id: 950, balance: 1 }, &find(1000));

        assert_eq!(p.mark(950), Mark::LikelyPresent);
        assert_eq!(p.mark(951), Mark::LikelyAbsent);
        assert_eq!(p.mark(1000), Mark::LikelyAbsent);
        assert_eq!(p.mark(1100), Mark::LikelyAbsent);
        assert_eq!(p.mark(1101), Mark::Unknown);
        assert_eq!(p.mark(949), Mark::Unknown);
    }

    #[test]
    fn departure_makes_exact_hit_absent() {
        let mut p = Predictor::new();
        p.interpret(&Outcome::Ok { balance: 3 }, &query(77));
        assert_eq!(p.mark(77), Mark::LikelyPresent);

        p.mark_departed(77);
        assert!(!p.predict(&query(77)));
    }

    #[test]
    fn edges_of_id_space_do_not_wrap() {
        let mut p = Predictor::new();
        p.interpret(&Outcome::Fail, &find(u16::MAX));
        p.interpret(&Outcome::Fail, &find(0));

        assert_eq!(p.mark(u16::MAX - 100), Mark::LikelyAbsent);
        assert_eq!(p.mark(100), Mark::LikelyAbsent);
        assert_eq!(p.mark(101), Mark::Unknown);
        assert!(!p.predict(&find(u16::MAX)));

        p.interpret(&Outcome::NearBelow { id: u16::MAX - 1, balance: 0 }, &find(u16::MAX));
        assert_eq!(p.mark(u16::MAX), Mark::LikelyAbsent);
    }

    #[test]
    fn terminate_is_ignored() {
        let mut p = Predictor::new();
        p.interpret(&Outcome::Fail, &Command::Terminate);
        assert!(p.predict(&Command::Terminate));
    }
}
