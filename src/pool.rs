//! Fixed-capacity particle storage.
//!
//! The pool owns every particle record for the lifetime of a show. Slots are
//! handed out from an explicit free-index stack, so allocation and release are
//! O(1) and the backing `Vec` never grows after construction.

use thiserror::Error;

use crate::particle::Particle;

/// Index of a slot in a [`ParticlePool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u32);

impl SlotId {
    /// Slot handle for the given index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Position of the slot in the pool.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Every slot of the pool is active.
///
/// Spawners treat this as a soft condition and stop spawning for the tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("particle pool exhausted: all {capacity} slots are active")]
pub struct PoolExhausted {
    pub capacity: usize,
}

/// Fixed-capacity pool of particles with O(1) allocate and release.
#[derive(Debug, Clone)]
pub struct ParticlePool {
    particles: Vec<Particle>,
    free: Vec<u32>,
}

impl ParticlePool {
    /// Create a pool with `capacity` inactive slots.
    pub fn new(capacity: usize) -> Self {
        let particles = vec![Particle::default(); capacity];
        // Reversed so that pops hand out slot 0 first.
        let free = (0..capacity as u32).rev().collect();
        Self { particles, free }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    /// Number of active particles.
    #[inline]
    pub fn active_count(&self) -> usize {
        self.particles.len() - self.free.len()
    }

    /// Number of slots available to [`allocate`](Self::allocate).
    #[inline]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    /// Claim an inactive slot.
    ///
    /// The slot is reset to a default particle and marked active; callers
    /// overwrite it with real spawn state.
    pub fn allocate(&mut self) -> Result<SlotId, PoolExhausted> {
        let index = self.free.pop().ok_or(PoolExhausted {
            capacity: self.capacity(),
        })?;
        self.particles[index as usize] = Particle {
            active: true,
            ..Particle::default()
        };
        Ok(SlotId(index))
    }

    /// Claim a slot and store `particle` in it, marked active.
    pub fn spawn(&mut self, particle: Particle) -> Result<SlotId, PoolExhausted> {
        let slot = self.allocate()?;
        self.particles[slot.index()] = Particle {
            active: true,
            ..particle
        };
        Ok(slot)
    }

    /// Return a slot to the free set.
    ///
    /// Releasing an inactive or out-of-range slot does nothing.
    pub fn release(&mut self, slot: SlotId) {
        if let Some(p) = self.particles.get_mut(slot.index()) {
            if p.active {
                p.active = false;
                self.free.push(slot.0);
            }
        }
    }

    /// Active particle in `slot`, if any.
    pub fn get(&self, slot: SlotId) -> Option<&Particle> {
        self.particles.get(slot.index()).filter(|p| p.active)
    }

    /// Mutable access to the active particle in `slot`, if any.
    pub fn get_mut(&mut self, slot: SlotId) -> Option<&mut Particle> {
        self.particles.get_mut(slot.index()).filter(|p| p.active)
    }

    /// Iterate active particles in slot order.
    pub fn iter_active(&self) -> impl Iterator<Item = (SlotId, &Particle)> + '_ {
        self.particles
            .iter()
            .enumerate()
            .filter(|(_, p)| p.active)
            .map(|(i, p)| (SlotId(i as u32), p))
    }

    /// Visit every active particle; those for which `f` returns `false` are released.
    pub fn retain_active<F>(&mut self, mut f: F)
    where
        F: FnMut(SlotId, &mut Particle) -> bool,
    {
        for (i, p) in self.particles.iter_mut().enumerate() {
            if p.active && !f(SlotId(i as u32), p) {
                p.active = false;
                self.free.push(i as u32);
            }
        }
    }

    /// Deactivate every particle.
    pub fn clear(&mut self) {
        for p in &mut self.particles {
            p.active = false;
        }
        self.free.clear();
        self.free.extend((0..self.particles.len() as u32).rev());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocates_in_order() {
        let mut pool = ParticlePool::new(4);
        assert_eq!(pool.allocate().unwrap().index(), 0);
        assert_eq!(pool.allocate().unwrap().index(), 1);
        assert_eq!(pool.allocate().unwrap().index(), 2);
        assert_eq!(pool.active_count(), 3);
    }

    #[test]
    fn test_exhaustion() {
        let mut pool = ParticlePool::new(2);
        pool.allocate().unwrap();
        pool.allocate().unwrap();
        assert_eq!(pool.allocate(), Err(PoolExhausted { capacity: 2 }));
        assert_eq!(pool.active_count(), 2);
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut pool = ParticlePool::new(3);
        let a = pool.allocate().unwrap();
        pool.release(a);
        pool.release(a);
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.free_count(), 3);
        pool.release(SlotId::new(99));
        assert_eq!(pool.free_count(), 3);
    }

    #[test]
    fn test_released_slot_is_reused() {
        let mut pool = ParticlePool::new(3);
        let _a = pool.allocate().unwrap();
        let b = pool.allocate().unwrap();
        pool.release(b);
        assert_eq!(pool.allocate().unwrap(), b);
    }

    #[test]
    fn test_zero_capacity() {
        let mut pool = ParticlePool::new(0);
        assert!(pool.is_full());
        assert!(pool.allocate().is_err());
    }

    #[test]
    fn test_allocate_resets_stale_state() {
        let mut pool = ParticlePool::new(1);
        let slot = pool
            .spawn(Particle {
                age: 9,
                lifespan: 10,
                ..Particle::default()
            })
            .unwrap();
        pool.release(slot);
        let slot = pool.allocate().unwrap();
        let p = pool.get(slot).unwrap();
        assert_eq!(p.age, 0);
        assert!(p.age < p.lifespan);
    }

    #[test]
    fn test_retain_active_releases_rejected() {
        let mut pool = ParticlePool::new(5);
        for _ in 0..5 {
            pool.allocate().unwrap();
        }
        pool.retain_active(|slot, _| slot.index() % 2 == 0);
        assert_eq!(pool.active_count(), 3);
        assert!(pool.get(SlotId::new(1)).is_none());
        let active: Vec<usize> = pool.iter_active().map(|(s, _)| s.index()).collect();
        assert_eq!(active, vec![0, 2, 4]);
    }

    #[test]
    fn test_clear() {
        let mut pool = ParticlePool::new(3);
        pool.allocate().unwrap();
        pool.allocate().unwrap();
        pool.clear();
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.allocate().unwrap().index(), 0);
    }
}
