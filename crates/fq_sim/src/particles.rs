//! Ambient particle field driven by the current quality tier.
//!
//! Each frame the field ages live particles, releases the expired ones, culls
//! down to the tier's particle budget after a downgrade, and spawns back up to
//! the budget. All storage comes from an [`EntityPool`], so steady state does
//! no allocation.

use fq_core::pool::{EntityPool, PoolHandle, PoolStats};

const GRAVITY: f32 = -0.4;

#[derive(Debug, Clone, Default)]
pub struct Particle {
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub age_ms: f32,
    pub lifetime_ms: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldFrameStats {
    pub spawned: u32,
    pub expired: u32,
    pub culled: u32,
}

pub struct ParticleField {
    pool: EntityPool<Particle>,
    lifetime_ms: f32,
    spawn_counter: u32,
    expired: Vec<PoolHandle>,
}

impl ParticleField {
    pub fn new(max_pooled: usize, lifetime_ms: f32) -> Self {
        let pool = EntityPool::new(
            Particle::default,
            |p: &mut Particle| *p = Particle::default(),
            max_pooled,
        );
        Self {
            pool,
            lifetime_ms,
            spawn_counter: 0,
            expired: Vec::new(),
        }
    }

    pub fn prewarm(&mut self, count: usize) {
        self.pool.prewarm(count);
    }

    pub fn update(&mut self, dt_ms: f64, budget: u32) -> FieldFrameStats {
        let dt = dt_ms as f32;
        let mut stats = FieldFrameStats::default();

        self.expired.clear();
        for (handle, p) in self.pool.iter_active_mut() {
            p.age_ms += dt;
            for axis in 0..3 {
                p.position[axis] += p.velocity[axis] * dt * 0.001;
            }
            p.velocity[1] += GRAVITY * dt * 0.001;
            if p.age_ms >= p.lifetime_ms {
                self.expired.push(handle);
            }
        }
        for handle in self.expired.drain(..) {
            if self.pool.release(handle) {
                stats.expired += 1;
            }
        }

        let active = self.pool.active_count() as u32;
        if active > budget {
            self.expired
                .extend(self.pool.iter_active().map(|(h, _)| h).take((active - budget) as usize));
            for handle in self.expired.drain(..) {
                if self.pool.release(handle) {
                    stats.culled += 1;
                }
            }
        }

        while (self.pool.active_count() as u32) < budget {
            self.spawn();
            stats.spawned += 1;
        }

        stats
    }

    pub fn active(&self) -> usize {
        self.pool.active_count()
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    fn spawn(&mut self) {
        // Deterministic spread so runs are reproducible.
        let n = self.spawn_counter;
        self.spawn_counter = self.spawn_counter.wrapping_add(1);
        let angle = (n % 360) as f32 * std::f32::consts::PI / 180.0;
        let lifetime_ms = self.lifetime_ms * (0.5 + (n % 7) as f32 / 12.0);

        let handle = self.pool.acquire();
        if let Some(p) = self.pool.get_mut(handle) {
            p.position = [angle.cos() * 4.0, 0.0, angle.sin() * 4.0];
            p.velocity = [angle.cos() * 0.2, 1.0, angle.sin() * 0.2];
            p.age_ms = 0.0;
            p.lifetime_ms = lifetime_ms;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_to_budget() {
        let mut field = ParticleField::new(64, 1000.0);
        let stats = field.update(16.0, 50);
        assert_eq!(stats.spawned, 50);
        assert_eq!(field.active(), 50);
    }

    #[test]
    fn culls_after_budget_drop() {
        let mut field = ParticleField::new(64, 10_000.0);
        field.update(16.0, 50);
        let stats = field.update(16.0, 20);
        assert_eq!(stats.culled, 30);
        assert_eq!(field.active(), 20);
        assert_eq!(field.pool_stats().pooled, 30);
    }

    #[test]
    fn expired_particles_are_recycled() {
        let mut field = ParticleField::new(64, 100.0);
        field.update(16.0, 10);
        let before = field.pool_stats();
        // Longest lifetime is 100 * (0.5 + 6/12) = 100ms.
        let stats = field.update(150.0, 10);
        assert_eq!(stats.expired, 10);
        assert_eq!(stats.spawned, 10);
        let after = field.pool_stats();
        assert_eq!(after.active, 10);
        // Respawns came from the free list, not the factory.
        assert_eq!(after.total, before.total);
    }

    #[test]
    fn zero_budget_empties_field() {
        let mut field = ParticleField::new(8, 1000.0);
        field.update(16.0, 20);
        field.update(16.0, 0);
        assert_eq!(field.active(), 0);
        let stats = field.pool_stats();
        assert_eq!(stats.pooled, 8);
        assert_eq!(stats.total, 8);
    }

    #[test]
    fn prewarm_avoids_growth() {
        let mut field = ParticleField::new(32, 1000.0);
        field.prewarm(32);
        field.update(16.0, 32);
        let stats = field.pool_stats();
        assert_eq!(stats.total, 32);
        assert_eq!(stats.pooled, 0);
    }
}
