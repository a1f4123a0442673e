//! Pooled-object allocator for projectiles, effects and enemies.
//!
//! Handles carry a generation. Acquiring a slot bumps its generation, so a
//! handle from an earlier use of the same slot is detectably stale. Returning
//! a handle twice is reported as an error and leaves the free list untouched:
//! a slot can never be handed out twice before it is returned.

use std::collections::HashMap;

use broadside_logic::config::PoolConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolTag {
    Projectile,
    Effect,
    Enemy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    pub tag: PoolTag,
    pub index: u32,
    pub generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// Exhausted and not expandable. An expected runtime condition.
    Unavailable(PoolTag),
    AlreadyReturned(PoolHandle),
    /// Handle from an earlier use of the slot, or never issued.
    StaleHandle(PoolHandle),
}

impl std::fmt::Display for PoolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolError::Unavailable(tag) => write!(f, "{:?} pool exhausted", tag),
            PoolError::AlreadyReturned(h) => {
                write!(f, "{:?} slot {} already returned", h.tag, h.index)
            }
            PoolError::StaleHandle(h) => write!(
                f,
                "stale {:?} handle (slot {}, generation {})",
                h.tag, h.index, h.generation
            ),
        }
    }
}

impl std::error::Error for PoolError {}

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u32,
    in_use: bool,
}

#[derive(Debug, Clone)]
struct Pool {
    slots: Vec<Slot>,
    free: Vec<u32>,
    expandable: bool,
}

impl Pool {
    fn with_capacity(capacity: usize, expandable: bool) -> Self {
        Self {
            slots: vec![
                Slot {
                    generation: 0,
                    in_use: false
                };
                capacity
            ],
            // Pop from the back, hand out low indices first.
            free: (0..capacity as u32).rev().collect(),
            expandable,
        }
    }
}

/// The shared allocator.
#[derive(Debug, Clone)]
pub struct ObjectPool {
    pools: HashMap<PoolTag, Pool>,
}

impl ObjectPool {
    pub fn new(config: &PoolConfig) -> Self {
        let mut pools = HashMap::new();
        pools.insert(
            PoolTag::Projectile,
            Pool::with_capacity(config.projectile_capacity, config.expandable),
        );
        pools.insert(
            PoolTag::Effect,
            Pool::with_capacity(config.effect_capacity, config.expandable),
        );
        pools.insert(
            PoolTag::Enemy,
            Pool::with_capacity(config.enemy_capacity, config.expandable),
        );
        Self { pools }
    }

    /// Take a free slot.
    pub fn acquire(&mut self, tag: PoolTag) -> Result<PoolHandle, PoolError> {
        let pool = self
            .pools
            .get_mut(&tag)
            .ok_or(PoolError::Unavailable(tag))?;
        let index = match pool.free.pop() {
            Some(i) => i,
            None if pool.expandable => {
                pool.slots.push(Slot {
                    generation: 0,
                    in_use: false,
                });
                (pool.slots.len() - 1) as u32
            }
            None => return Err(PoolError::Unavailable(tag)),
        };
        let slot = &mut pool.slots[index as usize];
        slot.generation = slot.generation.wrapping_add(1);
        slot.in_use = true;
        Ok(PoolHandle {
            tag,
            index,
            generation: slot.generation,
        })
    }

    /// Give a slot back.
    pub fn release(&mut self, handle: PoolHandle) -> Result<(), PoolError> {
        let pool = self
            .pools
            .get_mut(&handle.tag)
            .ok_or(PoolError::StaleHandle(handle))?;
        let slot = pool
            .slots
            .get_mut(handle.index as usize)
            .ok_or(PoolError::StaleHandle(handle))?;
        if slot.generation != handle.generation {
            return Err(PoolError::StaleHandle(handle));
        }
        if !slot.in_use {
            return Err(PoolError::AlreadyReturned(handle));
        }
        slot.in_use = false;
        pool.free.push(handle.index);
        Ok(())
    }

    pub fn is_live(&self, handle: PoolHandle) -> bool {
        self.pools
            .get(&handle.tag)
            .and_then(|p| p.slots.get(handle.index as usize))
            .map_or(false, |s| s.in_use && s.generation == handle.generation)
    }

    /// Slots that can be acquired right now without growing.
    pub fn available(&self, tag: PoolTag) -> usize {
        self.pools.get(&tag).map_or(0, |p| p.free.len())
    }

    /// True if `acquire(tag)` would succeed.
    pub fn can_acquire(&self, tag: PoolTag) -> bool {
        self.pools
            .get(&tag)
            .map_or(false, |p| !p.free.is_empty() || p.expandable)
    }

    /// How many acquisitions are guaranteed to succeed from here.
    pub fn headroom(&self, tag: PoolTag) -> usize {
        self.pools.get(&tag).map_or(0, |p| {
            if p.expandable {
                usize::MAX
            } else {
                p.free.len()
            }
        })
    }

    pub fn in_use(&self, tag: PoolTag) -> usize {
        self.pools
            .get(&tag)
            .map_or(0, |p| p.slots.iter().filter(|s| s.in_use).count())
    }

    pub fn capacity(&self, tag: PoolTag) -> usize {
        self.pools.get(&tag).map_or(0, |p| p.slots.len())
    }

    /// Return every outstanding slot. Outstanding handles become stale.
    pub fn release_all(&mut self) {
        for pool in self.pools.values_mut() {
            pool.free.clear();
            for (i, slot) in pool.slots.iter_mut().enumerate().rev() {
                if slot.in_use {
                    slot.in_use = false;
                    slot.generation = slot.generation.wrapping_add(1);
                }
                pool.free.push(i as u32);
            }
        }
    }
}
