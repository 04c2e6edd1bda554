//! One lane of the ring road
//!
//! A lane holds the IDs of its vehicles ordered by the position they had at
//! the last sort. Positions change every step, so the owner must call
//! [`Lane::resort`] before any neighbor query.

use ordered_float::OrderedFloat;
use sorted_vec::SortedVec;

use super::types::CarId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct LaneSlot {
    position: OrderedFloat<f64>,
    car: CarId,
}

#[derive(Debug, Clone)]
pub struct Lane {
    slots: SortedVec<LaneSlot>,
}

impl Default for Lane {
    fn default() -> Self {
        Self::new()
    }
}

impl Lane {
    pub fn new() -> Self {
        Self {
            slots: SortedVec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Car IDs from the lowest to the highest position
    pub fn car_ids(&self) -> impl Iterator<Item = CarId> + '_ {
        self.slots.iter().map(|slot| slot.car)
    }

    pub fn contains(&self, car: CarId) -> bool {
        self.slots.iter().any(|slot| slot.car == car)
    }

    pub fn insert(&mut self, car: CarId, position: f64) {
        self.slots.insert(LaneSlot {
            position: OrderedFloat(position),
            car,
        });
    }

    /// Remove the first car for which `is_match` holds
    pub fn remove_where(&mut self, mut is_match: impl FnMut(CarId) -> bool) -> Option<CarId> {
        let idx = self.slots.iter().position(|slot| is_match(slot.car))?;
        Some(self.slots.remove_index(idx).car)
    }

    /// Rebuild the ordering from the cars' current positions
    pub fn resort(&mut self, position_of: impl Fn(CarId) -> f64) {
        let slots = self
            .slots
            .iter()
            .map(|slot| LaneSlot {
                position: OrderedFloat(position_of(slot.car)),
                car: slot.car,
            })
            .collect();
        self.slots = SortedVec::from_unsorted(slots);
    }

    /// First car strictly ahead of `position`, wrapping to the rearmost car.
    /// A car alone in the lane is its own leader.
    pub fn car_in_front(&self, position: f64) -> Option<CarId> {
        let first = self.slots.first()?;
        let key = OrderedFloat(position);
        let idx = self.slots.partition_point(|slot| slot.position <= key);
        Some(self.slots.get(idx).unwrap_or(first).car)
    }

    /// Last car strictly behind `position`, wrapping to the foremost car
    pub fn car_in_back(&self, position: f64) -> Option<CarId> {
        let last = self.slots.last()?;
        let key = OrderedFloat(position);
        let idx = self.slots.partition_point(|slot| slot.position < key);
        Some(match idx {
            0 => last.car,
            i => self.slots[i - 1].car,
        })
    }

    /// Last car at or behind `position`, wrapping to the foremost car
    pub fn car_at_or_behind(&self, position: f64) -> Option<CarId> {
        let last = self.slots.last()?;
        let key = OrderedFloat(position);
        let idx = self.slots.partition_point(|slot| slot.position <= key);
        Some(match idx {
            0 => last.car,
            i => self.slots[i - 1].car,
        })
    }
}
