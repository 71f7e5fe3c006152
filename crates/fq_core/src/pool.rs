//! Fixed-capacity recycling pool for short-lived records (particles, pickups,
//! spawned props).
//!
//! The pool owns every item it tracks. `acquire()` hands out a [`PoolHandle`];
//! callers reach the item through `get`/`get_mut` and give it back with
//! `release()`. Released items are reset and kept on a LIFO free list, up to
//! `max_size`; anything beyond that is dropped.
//!
//! Handles carry the pool's id and a per-slot generation, so a double release,
//! a handle that outlived `clear()`, or a handle from a different pool is
//! detected and rejected instead of corrupting the free list.

use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_POOL_ID: AtomicU32 = AtomicU32::new(0);

/// Reference to an active item in an [`EntityPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    pool: u32,
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PoolStats {
    pub active: usize,
    pub pooled: usize,
    pub total: usize,
    pub max_size: usize,
}

struct Slot<T> {
    generation: u32,
    item: Option<T>,
}

pub struct EntityPool<T> {
    id: u32,
    factory: Box<dyn FnMut() -> T>,
    reset: Box<dyn FnMut(&mut T)>,
    max_size: usize,
    slots: Vec<Slot<T>>,
    vacant_slots: Vec<usize>,
    free: Vec<T>,
    active: usize,
}

impl<T> EntityPool<T> {
    pub fn new<F, R>(factory: F, reset: R, max_size: usize) -> Self
    where
        F: FnMut() -> T + 'static,
        R: FnMut(&mut T) + 'static,
    {
        let max_size = if max_size == 0 {
            log::warn!("EntityPool max_size must be positive, using 1");
            1
        } else {
            max_size
        };
        Self {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            factory: Box::new(factory),
            reset: Box::new(reset),
            max_size,
            slots: Vec::new(),
            vacant_slots: Vec::new(),
            free: Vec::new(),
            active: 0,
        }
    }

    /// Reuse the most recently released item, or build a new one.
    pub fn acquire(&mut self) -> PoolHandle {
        let item = match self.free.pop() {
            Some(item) => item,
            None => (self.factory)(),
        };

        let index = match self.vacant_slots.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    item: None,
                });
                self.slots.len() - 1
            }
        };
        let slot = &mut self.slots[index];
        slot.item = Some(item);
        self.active += 1;

        PoolHandle {
            pool: self.id,
            index: index as u32,
            generation: slot.generation,
        }
    }

    /// Return an item. Returns false, leaving the pool untouched, if `handle`
    /// is not currently active in this pool.
    pub fn release(&mut self, handle: PoolHandle) -> bool {
        if !self.is_active(handle) {
            log::warn!("Attempting to release entity not in active set: {handle:?}");
            return false;
        }

        let index = handle.index as usize;
        let slot = &mut self.slots[index];
        let Some(mut item) = slot.item.take() else {
            return false;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.vacant_slots.push(index);
        self.active -= 1;

        (self.reset)(&mut item);
        if self.free.len() < self.max_size {
            self.free.push(item);
        } else {
            log::trace!("Pool at capacity ({}), dropping released item", self.max_size);
        }
        true
    }

    /// Build items straight onto the free list, never past `max_size`.
    pub fn prewarm(&mut self, count: usize) {
        let room = self.max_size.saturating_sub(self.free.len());
        let count = count.min(room);
        self.free.reserve(count);
        for _ in 0..count {
            let item = (self.factory)();
            self.free.push(item);
        }
    }

    /// Drop every item, active and pooled, without running reset.
    /// Outstanding handles become stale.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.item.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.vacant_slots.push(index);
            }
        }
        self.free.clear();
        self.active = 0;
    }

    pub fn is_active(&self, handle: PoolHandle) -> bool {
        self.slot_for(handle).is_some()
    }

    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.slot_for(handle).and_then(|slot| slot.item.as_ref())
    }

    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        if !self.is_active(handle) {
            return None;
        }
        self.slots[handle.index as usize].item.as_mut()
    }

    pub fn iter_active(&self) -> impl Iterator<Item = (PoolHandle, &T)> + '_ {
        let pool = self.id;
        self.slots.iter().enumerate().filter_map(move |(index, slot)| {
            slot.item.as_ref().map(|item| {
                (
                    PoolHandle {
                        pool,
                        index: index as u32,
                        generation: slot.generation,
                    },
                    item,
                )
            })
        })
    }

    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = (PoolHandle, &mut T)> + '_ {
        let pool = self.id;
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(move |(index, slot)| {
                let generation = slot.generation;
                slot.item.as_mut().map(|item| {
                    (
                        PoolHandle {
                            pool,
                            index: index as u32,
                            generation,
                        },
                        item,
                    )
                })
            })
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    pub fn pooled_count(&self) -> usize {
        self.free.len()
    }

    pub fn total_count(&self) -> usize {
        self.active + self.free.len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            active: self.active_count(),
            pooled: self.pooled_count(),
            total: self.total_count(),
            max_size: self.max_size,
        }
    }

    fn slot_for(&self, handle: PoolHandle) -> Option<&Slot<T>> {
        if handle.pool != self.id {
            return None;
        }
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation && slot.item.is_some())
    }
}

impl<T> std::fmt::Debug for EntityPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityPool")
            .field("id", &self.id)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
