//! Reorder animation bookkeeping (first, last, invert).
//!
//! Before a move the editor captures the row every step occupies; after the
//! move it captures again. The inverted delta per step is how far the row
//! travelled, which the renderer shows as a marker. Steps are keyed by their
//! storage slot, which moves leave in place.

use std::collections::BTreeMap;

use sprinkler_domain::routine::Routine;

/// Display row of every step, keyed by storage slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowLayout {
    rows: BTreeMap<usize, usize>,
}

impl RowLayout {
    #[must_use]
    pub fn capture(routine: &Routine) -> Self {
        Self {
            rows: routine
                .sorted_slots()
                .into_iter()
                .enumerate()
                .map(|(row, slot)| (slot, row))
                .collect(),
        }
    }

    #[must_use]
    pub fn row_of(&self, slot: usize) -> Option<usize> {
        self.rows.get(&slot).copied()
    }
}

/// Per-step displacement between two layouts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flip {
    offsets: BTreeMap<usize, isize>,
}

impl Flip {
    /// Inverted deltas from `first` to `last`.
    ///
    /// A positive offset means the row used to sit that many rows lower and
    /// moved up. Steps present in only one layout get no offset.
    #[must_use]
    pub fn between(first: &RowLayout, last: &RowLayout) -> Self {
        let offsets = last
            .rows
            .iter()
            .filter_map(|(slot, last_row)| {
                let first_row = first.row_of(*slot)?;
                let delta = row_delta(first_row, *last_row);
                (delta != 0).then_some((*slot, delta))
            })
            .collect();
        Self { offsets }
    }

    #[must_use]
    pub fn offset(&self, slot: usize) -> isize {
        self.offsets.get(&slot).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

fn row_delta(first: usize, last: usize) -> isize {
    let first = isize::try_from(first).unwrap_or(isize::MAX);
    let last = isize::try_from(last).unwrap_or(isize::MAX);
    first - last
}
