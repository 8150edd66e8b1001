//! Debounce / Consensus Filter
//!
//! ## Overview
//!
//! The classifier's decision tree flickers: a single window of noisy
//! acceleration can produce one stray class between two stable runs. The
//! filter turns the raw code stream into a stable state by requiring a number
//! of consecutive agreeing readings before accepting a new value.
//!
//! ## Policy
//!
//! One rule covers both behaviors, parameterized by the agreement count `k`:
//!
//! > The stable state becomes `V` when the last `k` readings are all `V` and
//! > `V` is not the sentinel.
//!
//! | `k` | Behavior                                                  |
//! |-----|-----------------------------------------------------------|
//! | 1   | immediate: every valid reading that differs is accepted   |
//! | 3   | majority-of-3: three identical readings in a row required |
//!
//! The default is `k = 3`.
//!
//! ```text
//! raw:     5  5  5  7  5  7  7  7  ∅  7
//! window: [5][55][555][557][575][757][577][777][77∅][7∅7]
//! stable:  -  -  5  5  5  5  5  7   7    7
//! ```
//!
//! ## Sentinels
//!
//! A sentinel reading (no classification or failed read) enters the window
//! like any other reading, so it breaks agreement, but it can never *be* the
//! agreed value. Consequently the stable state never returns to "none" once a
//! valid state has been accepted.

use heapless::Deque;

use crate::constants::{IMMEDIATE_AGREEMENT, MAJORITY_AGREEMENT, MAX_AGREEMENT};
use crate::errors::ConfigError;
use crate::events::{RawStateCode, StateCode};

/// Result of feeding one reading to the filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterUpdate {
    /// Stable state after this reading
    pub stable: Option<StateCode>,
    /// Whether this reading changed the stable state
    pub changed: bool,
}

/// Filter counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterStats {
    /// Readings fed to the filter
    pub readings: u32,
    /// Sentinel readings among them
    pub sentinels: u32,
    /// Times the stable state changed
    pub changes: u32,
}

/// Agreement-count debouncer for classifier codes
#[derive(Debug, Clone)]
pub struct ConsensusFilter {
    agreement: usize,
    history: Deque<RawStateCode, MAX_AGREEMENT>,
    stable: Option<StateCode>,
    stats: FilterStats,
}

impl ConsensusFilter {
    /// Create a filter requiring `agreement` consecutive identical readings
    pub fn new(agreement: usize) -> Result<Self, ConfigError> {
        if agreement == 0 || agreement > MAX_AGREEMENT {
            return Err(ConfigError::AgreementCount {
                value: agreement,
                max: MAX_AGREEMENT,
            });
        }

        Ok(Self {
            agreement,
            history: Deque::new(),
            stable: None,
            stats: FilterStats::default(),
        })
    }

    /// Majority-of-3 filter
    pub fn majority() -> Self {
        Self {
            agreement: MAJORITY_AGREEMENT,
            history: Deque::new(),
            stable: None,
            stats: FilterStats::default(),
        }
    }

    /// Pass-through filter: every real reading becomes the stable state
    pub fn immediate() -> Self {
        Self {
            agreement: IMMEDIATE_AGREEMENT,
            history: Deque::new(),
            stable: None,
            stats: FilterStats::default(),
        }
    }

    /// Feed one reading
    pub fn update(&mut self, reading: RawStateCode) -> FilterUpdate {
        self.stats.readings = self.stats.readings.wrapping_add(1);
        if reading.is_sentinel() {
            self.stats.sentinels = self.stats.sentinels.wrapping_add(1);
        }

        if self.history.len() == self.agreement {
            self.history.pop_front();
        }
        // Capacity is MAX_AGREEMENT >= agreement and one slot was freed above
        let _ = self.history.push_back(reading);

        let changed = match self.consensus() {
            Some(code) if self.stable != Some(code) => {
                self.stable = Some(code);
                self.stats.changes = self.stats.changes.wrapping_add(1);
                diag_debug!("filter converged on state {}", code);
                true
            }
            _ => false,
        };

        FilterUpdate {
            stable: self.stable,
            changed,
        }
    }

    /// Value every slot of a full window agrees on, if it is a real class
    fn consensus(&self) -> Option<StateCode> {
        if self.history.len() < self.agreement {
            return None;
        }

        let mut window = self.history.iter();
        let first = window.next()?.code()?;
        window
            .all(|reading| *reading == RawStateCode::Valid(first))
            .then_some(first)
    }

    /// Whether the window currently agrees with the stable state
    ///
    /// A settled filter will not change on another identical reading, so the
    /// pipeline stops polling until the next interrupt.
    pub fn is_settled(&self) -> bool {
        self.stable.is_some() && self.consensus() == self.stable
    }

    /// Current stable state
    pub fn stable(&self) -> Option<StateCode> {
        self.stable
    }

    /// Configured agreement count
    pub fn agreement(&self) -> usize {
        self.agreement
    }

    /// Counters
    pub fn stats(&self) -> FilterStats {
        self.stats
    }

    /// Forget the window, keeping the stable state
    pub fn clear_window(&mut self) {
        self.history.clear();
    }
}

impl Default for ConsensusFilter {
    fn default() -> Self {
        Self::majority()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(filter: &mut ConsensusFilter, codes: &[u8]) -> Vec<Option<StateCode>> {
        codes
            .iter()
            .map(|&c| filter.update(RawStateCode::from(c)).stable)
            .collect()
    }

    #[test]
    fn majority_needs_three_in_a_row() {
        let mut filter = ConsensusFilter::majority();
        assert_eq!(feed(&mut filter, &[5, 5]), vec![None, None]);
        assert!(filter.update(RawStateCode::Valid(5)).changed);
        assert_eq!(filter.stable(), Some(5));
    }

    #[test]
    fn majority_ignores_single_glitch() {
        let mut filter = ConsensusFilter::majority();
        feed(&mut filter, &[5, 5, 5]);

        let stable = feed(&mut filter, &[7, 5, 7, 7]);
        assert_eq!(stable, vec![Some(5); 4]);

        assert!(filter.update(RawStateCode::Valid(7)).changed);
        assert_eq!(filter.stable(), Some(7));
    }

    #[test]
    fn changes_exactly_once_per_run() {
        let mut filter = ConsensusFilter::majority();
        let changes = [5u8, 5, 5, 7, 7, 7, 7, 7, 5, 5, 5]
            .iter()
            .filter(|&&c| filter.update(RawStateCode::from(c)).changed)
            .count();
        assert_eq!(changes, 3); // none->5, 5->7, 7->5
        assert_eq!(filter.stats().changes, 3);
    }

    #[test]
    fn sentinel_breaks_agreement_but_never_wins() {
        let mut filter = ConsensusFilter::majority();
        feed(&mut filter, &[4, 4, 4]);

        let stable = feed(&mut filter, &[0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(stable, vec![Some(4); 4]);

        feed(&mut filter, &[9, 9, 0xFF, 9, 9]);
        assert_eq!(filter.stable(), Some(4));
        assert_eq!(filter.stats().sentinels, 5);
    }

    #[test]
    fn immediate_accepts_first_differing_reading() {
        let mut filter = ConsensusFilter::immediate();
        assert_eq!(filter.agreement(), 1);
        assert_eq!(feed(&mut filter, &[3, 8, 0xFF, 8, 2]), vec![
            Some(3), Some(8), Some(8), Some(8), Some(2),
        ]);
    }

    #[test]
    fn agreement_bounds() {
        assert!(ConsensusFilter::new(0).is_err());
        assert!(ConsensusFilter::new(MAX_AGREEMENT).is_ok());
        assert_eq!(
            ConsensusFilter::new(MAX_AGREEMENT + 1).unwrap_err(),
            ConfigError::AgreementCount { value: MAX_AGREEMENT + 1, max: MAX_AGREEMENT }
        );
    }

    #[test]
    fn settled_tracks_window() {
        let mut filter = ConsensusFilter::majority();
        assert!(!filter.is_settled());

        feed(&mut filter, &[2, 2, 2]);
        assert!(filter.is_settled());

        filter.update(RawStateCode::Valid(6));
        assert!(!filter.is_settled());
    }
}
