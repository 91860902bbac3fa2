//! Handover key allocation.
//!
//! Keys share the feature graph's id space with parcels, vehicles and
//! nodes, so they start above the largest id in the log. Each vehicle gets a
//! contiguous range sized by its handover count before compilation starts,
//! which keeps keys identical whether vehicles compile in parallel or not.

use crate::model::ActionLog;

/// Lowest key ever handed out.
pub const DEFAULT_KEY_FLOOR: u64 = 500;

/// Gap kept between the largest domain id and the first key.
pub const DEFAULT_KEY_MARGIN: u64 = 100;

#[derive(Debug, Clone)]
pub struct HandoverKeys {
    first: u64,
    next: u64,
}

impl HandoverKeys {
    pub fn starting_at(first: u64) -> Self {
        Self { first, next: first }
    }

    pub fn seed(log: &ActionLog, floor: u64, margin: u64) -> Self {
        let above_domain = u64::from(log.max_domain_id()) + margin;
        Self::starting_at(floor.max(above_domain))
    }

    pub fn first(&self) -> u64 {
        self.first
    }

    /// Reserves `count` consecutive keys.
    pub fn allocate(&mut self, count: usize) -> KeyRange {
        let start = self.next;
        self.next += count as u64;
        KeyRange {
            next: start,
            end: self.next,
        }
    }
}

/// Keys reserved for one vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    next: u64,
    end: u64,
}

impl KeyRange {
    pub fn next_key(&mut self) -> u64 {
        debug_assert!(self.next < self.end, "handover key range exhausted");
        let key = self.next;
        self.next += 1;
        key
    }

    pub fn remaining(&self) -> u64 {
        self.end.saturating_sub(self.next)
    }
}
