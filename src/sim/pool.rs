//! Fixed-capacity object pools
//!
//! Every transient entity type lives in a [`Pool`]. Slots are reused, and each
//! reuse bumps the slot generation so a stale [`Handle`] can never reach the
//! new occupant. Releasing through a stale handle is a no-op, which is what
//! makes "killed and swept in the same tick" safe.

use serde::{Deserialize, Serialize};

/// Generation-checked reference to a pooled object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle {
    pub index: u32,
    pub generation: u32,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Fixed-capacity allocator for one entity type
#[derive(Debug, Clone)]
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    live: usize,
}

impl<T> Pool<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| Slot {
                generation: 0,
                value: None,
            })
            .collect();
        Self { slots, live: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn is_full(&self) -> bool {
        self.live == self.slots.len()
    }

    /// Place `value` in the lowest free slot; `None` when the pool is exhausted
    pub fn acquire(&mut self, value: T) -> Option<Handle> {
        let index = self.slots.iter().position(|s| s.value.is_none())?;
        let slot = &mut self.slots[index];
        slot.generation = slot.generation.wrapping_add(1);
        slot.value = Some(value);
        self.live += 1;
        Some(Handle {
            index: index as u32,
            generation: slot.generation,
        })
    }

    /// Release the object behind `handle`; `None` if it was already released
    pub fn release(&mut self, handle: Handle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        self.live -= 1;
        Some(value)
    }

    pub fn is_live(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// Live objects in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.value.as_ref().map(|v| {
                (
                    Handle {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    v,
                )
            })
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> + '_ {
        self.slots.iter_mut().enumerate().filter_map(|(i, slot)| {
            let generation = slot.generation;
            slot.value.as_mut().map(|v| {
                (
                    Handle {
                        index: i as u32,
                        generation,
                    },
                    v,
                )
            })
        })
    }

    pub fn handles(&self) -> Vec<Handle> {
        self.iter().map(|(h, _)| h).collect()
    }

    /// Release every live object
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.value = None;
        }
        self.live = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_until_exhausted() {
        let mut pool = Pool::with_capacity(2);
        assert!(pool.acquire(1).is_some());
        assert!(pool.acquire(2).is_some());
        assert!(pool.is_full());
        assert!(pool.acquire(3).is_none());
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_double_release_is_noop() {
        let mut pool = Pool::with_capacity(4);
        let h = pool.acquire("enemy").unwrap();
        assert_eq!(pool.release(h), Some("enemy"));
        assert_eq!(pool.release(h), None);
        assert_eq!(pool.len(), 0);
    }

    #[test]
    fn test_stale_handle_cannot_touch_recycled_slot() {
        let mut pool = Pool::with_capacity(1);
        let old = pool.acquire(10).unwrap();
        pool.release(old);
        let new = pool.acquire(20).unwrap();
        assert_eq!(old.index, new.index);
        assert_ne!(old.generation, new.generation);
        assert!(pool.get(old).is_none());
        assert_eq!(pool.release(old), None);
        assert_eq!(pool.get(new), Some(&20));
    }

    #[test]
    fn test_iter_skips_free_slots() {
        let mut pool = Pool::with_capacity(3);
        let a = pool.acquire('a').unwrap();
        let _b = pool.acquire('b').unwrap();
        pool.release(a);
        let live: Vec<char> = pool.iter().map(|(_, v)| *v).collect();
        assert_eq!(live, vec!['b']);
        for (_, v) in pool.iter_mut() {
            *v = 'z';
        }
        assert_eq!(pool.iter().next().map(|(_, v)| *v), Some('z'));
    }

    #[test]
    fn test_clear_invalidates_everything() {
        let mut pool = Pool::with_capacity(2);
        let h = pool.acquire(1).unwrap();
        pool.clear();
        assert!(pool.is_empty());
        assert!(!pool.is_live(h));
    }
}
