use image::RgbImage;
use std::collections::VecDeque;

/// Bounded queue of the most recent slices, read oldest first.
#[derive(Debug, Clone)]
pub struct SliceWindow {
    capacity: usize,
    slices: VecDeque<RgbImage>,
}

impl SliceWindow {
    /// A window holding at most `capacity` slices (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            slices: VecDeque::with_capacity(capacity),
        }
    }

    /// Append `slice`, evicting the oldest entry when full.
    pub fn push(&mut self, slice: RgbImage) {
        if self.slices.len() == self.capacity {
            self.slices.pop_front();
        }
        self.slices.push_back(slice);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slices.len() == self.capacity
    }

    /// Slices in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &RgbImage> {
        self.slices.iter()
    }

    pub fn clear(&mut self) {
        self.slices.clear();
    }
}
