//! Top-three selection over a histogram.
//!
//! A single pass keeps three ranked slots and shifts lower slots down when a
//! bucket outranks one of them: O(1) work per bucket and no sorting of the
//! (possibly huge) histogram.
//!
//! Ties are resolved by [`ColorCount::outranks`]: among equal counts the lower
//! `ColorKey` wins. That gives the same answer as a strictly-greater pass over
//! buckets visited in ascending key order, without sorting them first, so the
//! result never depends on hash map iteration order.

use crate::analysis::Histogram;
use crate::models::{ColorCount, TopThree};

/// Select the three highest-ranked colors. Zero-count buckets never qualify.
pub fn top_three(histogram: &Histogram) -> TopThree {
    let mut slots: [Option<ColorCount>; 3] = [None; 3];

    for (&color, &count) in histogram.iter() {
        if count == 0 {
            continue;
        }
        let candidate = ColorCount { color, count };

        // Cheapest rejection first: most buckets do not reach the third slot
        if !beats(&candidate, slots[2]) {
            continue;
        }

        if beats(&candidate, slots[0]) {
            slots[2] = slots[1];
            slots[1] = slots[0];
            slots[0] = Some(candidate);
        } else if beats(&candidate, slots[1]) {
            slots[2] = slots[1];
            slots[1] = Some(candidate);
        } else {
            slots[2] = Some(candidate);
        }
    }

    TopThree::from_slots(slots)
}

fn beats(candidate: &ColorCount, slot: Option<ColorCount>) -> bool {
    match slot {
        Some(current) => candidate.outranks(&current),
        None => true,
    }
}
