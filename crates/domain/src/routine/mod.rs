//! Routine — a named, ordered sequence of timed station activations.
//!
//! Steps carry an explicit `order` rank. Execution and display order is
//! always the projection of the steps sorted by that rank; the position of a
//! step inside [`Routine::steps`] carries no meaning and is left untouched by
//! moves. Structural edits keep ranks unique:
//!
//! - [`Routine::add_step`] appends at `max(order) + 1`
//! - [`Routine::remove_step`] renumbers the survivors densely to `0..n-1`
//! - [`Routine::move_step`] swaps ranks with the adjacent neighbour
//!
//! Editing operations that target a missing rank are no-ops.

mod step;

pub use step::{
    DEFAULT_DURATION_MINUTES, MAX_DURATION_MINUTES, MIN_DURATION_MINUTES, Step, clamp_duration,
    parse_duration,
};

use serde::{Deserialize, Serialize};

use crate::relay::RelayId;

/// Direction of an adjacent step move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    /// Towards rank 0 (`-1`).
    Earlier,
    /// Towards the last rank (`+1`).
    Later,
}

impl MoveDirection {
    /// Rank of the neighbour this move would swap with, if any.
    fn neighbour(self, order: u32) -> Option<u32> {
        match self {
            Self::Earlier => order.checked_sub(1),
            Self::Later => order.checked_add(1),
        }
    }
}

/// A named list of steps as stored on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routine {
    pub name: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Routine {
    /// An empty routine.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Steps in execution order.
    #[must_use]
    pub fn sorted_steps(&self) -> Vec<&Step> {
        let mut sorted: Vec<&Step> = self.steps.iter().collect();
        sorted.sort_by_key(|step| step.order);
        sorted
    }

    /// Storage slots (indices into [`Self::steps`]) in execution order.
    #[must_use]
    pub fn sorted_slots(&self) -> Vec<usize> {
        let mut slots: Vec<usize> = (0..self.steps.len()).collect();
        slots.sort_by_key(|slot| self.steps[*slot].order);
        slots
    }

    /// A copy whose storage order matches execution order.
    #[must_use]
    pub fn arranged(&self) -> Self {
        Self {
            name: self.name.clone(),
            steps: self.sorted_steps().into_iter().cloned().collect(),
        }
    }

    #[must_use]
    pub fn step(&self, order: u32) -> Option<&Step> {
        self.steps.iter().find(|step| step.order == order)
    }

    fn step_mut(&mut self, order: u32) -> Option<&mut Step> {
        self.steps.iter_mut().find(|step| step.order == order)
    }

    /// Append a step for `station` and return the rank it was given.
    ///
    /// The rank is one past the current maximum, which stays unique even when
    /// earlier removals left the ranks sparse.
    pub fn add_step(&mut self, station: RelayId, name: impl Into<String>) -> u32 {
        let order = self
            .steps
            .iter()
            .map(|step| step.order)
            .max()
            .map_or(0, |max| max + 1);
        self.steps.push(Step::new(station, name, order));
        order
    }

    /// Remove the step holding `order` and renumber the rest to `0..n-1`.
    ///
    /// Returns the removed step, or `None` when no step holds `order`.
    pub fn remove_step(&mut self, order: u32) -> Option<Step> {
        let index = self.steps.iter().position(|step| step.order == order)?;
        let removed = self.steps.remove(index);
        self.renumber();
        Some(removed)
    }

    fn renumber(&mut self) {
        self.steps.sort_by_key(|step| step.order);
        for (rank, step) in (0_u32..).zip(self.steps.iter_mut()) {
            step.order = rank;
        }
    }

    /// Set the duration of the step holding `order`, saturating into range.
    ///
    /// Returns the stored duration.
    pub fn set_duration(&mut self, order: u32, minutes: i64) -> Option<u8> {
        let step = self.step_mut(order)?;
        step.duration_minutes = clamp_duration(minutes);
        Some(step.duration_minutes)
    }

    /// Shift the duration of the step holding `order` by `delta` minutes.
    ///
    /// Returns the stored duration.
    pub fn adjust_duration(&mut self, order: u32, delta: i64) -> Option<u8> {
        let step = self.step_mut(order)?;
        step.duration_minutes =
            clamp_duration(i64::from(step.duration_minutes).saturating_add(delta));
        Some(step.duration_minutes)
    }

    /// Enable or disable the step holding `order`.
    pub fn set_enabled(&mut self, order: u32, enabled: bool) -> bool {
        match self.step_mut(order) {
            Some(step) => {
                step.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Swap the rank of the step holding `order` with its neighbour in
    /// `direction`.
    ///
    /// A move at either boundary, or for a rank nobody holds, changes nothing
    /// and returns `false`.
    pub fn move_step(&mut self, order: u32, direction: MoveDirection) -> bool {
        direction
            .neighbour(order)
            .is_some_and(|other| self.swap_orders(order, other))
    }

    /// Exchange the ranks held by two steps, whatever their distance.
    ///
    /// Returns `false` and changes nothing when either rank is missing.
    pub fn swap_orders(&mut self, first: u32, second: u32) -> bool {
        let Some(index) = self.steps.iter().position(|step| step.order == first) else {
            return false;
        };
        let Some(other) = self.steps.iter().position(|step| step.order == second) else {
            return false;
        };

        self.steps[index].order = second;
        self.steps[other].order = first;
        true
    }

    /// Whether the ranks are exactly `0..n-1`.
    #[must_use]
    pub fn has_dense_order(&self) -> bool {
        let mut orders: Vec<u32> = self.steps.iter().map(|step| step.order).collect();
        orders.sort_unstable();
        (0_u32..).zip(orders).all(|(expected, order)| expected == order)
    }
}
