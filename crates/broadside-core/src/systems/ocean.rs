//! Ocean - the wave field plus its per-tick sample cache and clock.

use broadside_logic::config::WaveConfig;
use broadside_logic::wave::{WaveCache, WaveField};
use glam::Vec3;

pub struct Ocean {
    field: WaveField,
    cache: WaveCache,
    /// Seconds of simulated time.
    time: f64,
}

impl Ocean {
    pub fn new(config: WaveConfig) -> Self {
        Self {
            field: WaveField::new(config),
            cache: WaveCache::new(),
            time: 0.0,
        }
    }

    /// Advance the clock one physics tick and age the cache.
    pub fn begin_tick(&mut self, dt: f32) {
        self.time += dt as f64;
        let ticks = self.field.config().cache_ticks;
        self.cache.advance(ticks);
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Cached height, used by physics.
    pub fn height(&mut self, x: f32, z: f32) -> f32 {
        self.cache.height(&self.field, x, z, self.time)
    }

    /// Uncached height.
    pub fn exact_height(&self, x: f32, z: f32) -> f32 {
        self.field.height(x, z, self.time)
    }

    pub fn normal(&self, x: f32, z: f32) -> Vec3 {
        self.field.normal(x, z, self.time)
    }

    pub fn cache_stats(&self) -> (u64, u64) {
        (self.cache.hits, self.cache.misses)
    }

    pub fn reset(&mut self) {
        self.cache.clear();
        self.time = 0.0;
    }
}
