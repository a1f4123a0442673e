//! Procedural wave field.
//!
//! Height is fractal Brownian motion over 2D Perlin noise: each octave is
//! sampled at `(x, z) * frequency * noise_scale + wind_offset(t)`, its
//! amplitude falls by `persistence` and its frequency rises by `lacunarity`.
//! The sum is scaled by `base_height`. The normal comes from central
//! differences of the height in X and Z.
//!
//! [`WaveCache`] trades accuracy for speed: heights are stored per coarse grid
//! cell and trusted for a fixed number of ticks, after which the whole cache
//! is flushed. Callers see values up to `cache_ticks` old and up to half a
//! cell away from the exact sample point.

use std::collections::HashMap;

use glam::{Vec2, Vec3};
use noise::{NoiseFn, Perlin};

use crate::config::WaveConfig;

pub struct WaveField {
    config: WaveConfig,
    perlin: Perlin,
    wind: Vec2,
}

impl WaveField {
    pub fn new(config: WaveConfig) -> Self {
        let wind = config.wind_direction.normalize_or_zero() * config.wind_speed;
        Self {
            perlin: Perlin::new(config.seed),
            wind,
            config,
        }
    }

    pub fn config(&self) -> &WaveConfig {
        &self.config
    }

    /// Noise-space drift of the pattern at time `t`.
    pub fn wind_offset(&self, t: f64) -> Vec2 {
        self.wind * t as f32
    }

    /// Surface height above the rest level at world `(x, z)` and time `t`.
    pub fn height(&self, x: f32, z: f32, t: f64) -> f32 {
        let c = &self.config;
        let offset = self.wind_offset(t);
        let mut amplitude = 1.0_f32;
        let mut frequency = c.frequency;
        let mut sum = 0.0_f32;

        for _ in 0..c.octaves {
            let scale = frequency * c.noise_scale;
            let sx = (x * scale + offset.x) as f64;
            let sz = (z * scale + offset.y) as f64;
            sum += self.perlin.get([sx, sz]) as f32 * amplitude;
            amplitude *= c.persistence;
            frequency *= c.lacunarity;
        }

        sum * c.base_height
    }

    /// Unit surface normal from central differences.
    pub fn normal(&self, x: f32, z: f32, t: f64) -> Vec3 {
        let d = self.config.normal_delta.max(1e-4);
        let along_x = Vec3::new(2.0 * d, self.height(x + d, z, t) - self.height(x - d, z, t), 0.0);
        let along_z = Vec3::new(0.0, self.height(x, z + d, t) - self.height(x, z - d, t), 2.0 * d);
        along_z.cross(along_x).normalize_or_zero()
    }
}

/// Coarse-grid height cache with tick-counted invalidation.
#[derive(Debug, Default)]
pub struct WaveCache {
    cells: HashMap<(i32, i32), f32>,
    ticks: u32,
    pub hits: u64,
    pub misses: u64,
}

impl WaveCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one physics tick; flush every cell once the epoch has elapsed.
    pub fn advance(&mut self, max_ticks: u32) {
        self.ticks += 1;
        if self.ticks >= max_ticks.max(1) {
            self.cells.clear();
            self.ticks = 0;
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.ticks = 0;
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn cell_of(x: f32, z: f32, cell: f32) -> (i32, i32) {
        ((x / cell).floor() as i32, (z / cell).floor() as i32)
    }

    /// Height at `(x, z)`, served from the cell centre when caching is on.
    pub fn height(&mut self, field: &WaveField, x: f32, z: f32, t: f64) -> f32 {
        let config = field.config();
        if !config.cache_enabled || config.cache_cell_size <= 0.0 {
            return field.height(x, z, t);
        }
        let size = config.cache_cell_size;
        let key = Self::cell_of(x, z, size);
        if let Some(&h) = self.cells.get(&key) {
            self.hits += 1;
            return h;
        }
        self.misses += 1;
        let cx = (key.0 as f32 + 0.5) * size;
        let cz = (key.1 as f32 + 0.5) * size;
        let h = field.height(cx, cz, t);
        self.cells.insert(key, h);
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> WaveField {
        WaveField::new(WaveConfig::default())
    }

    #[test]
    fn test_height_is_deterministic() {
        let a = field();
        let b = field();
        for i in 0..20 {
            let x = i as f32 * 3.7;
            let z = i as f32 * -1.3;
            assert_eq!(a.height(x, z, 2.5), b.height(x, z, 2.5));
        }
    }

    #[test]
    fn test_height_bounded_by_octave_sum() {
        let f = field();
        let c = f.config().clone();
        let bound: f32 = (0..c.octaves).map(|i| c.persistence.powi(i as i32)).sum::<f32>() * c.base_height;
        for i in 0..200 {
            let h = f.height(i as f32 * 1.37, i as f32 * 0.71, i as f64 * 0.1);
            assert!(h.abs() <= bound * 1.01, "h = {} bound = {}", h, bound);
        }
    }

    #[test]
    fn test_zero_base_height_is_flat() {
        let mut config = WaveConfig::default();
        config.base_height = 0.0;
        let f = WaveField::new(config);
        assert_eq!(f.height(12.3, 45.6, 7.0), 0.0);
        let n = f.normal(12.3, 45.6, 7.0);
        assert!((n - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_normal_is_unit_and_upward() {
        let f = field();
        for i in 0..50 {
            let n = f.normal(i as f32 * 2.1, i as f32 * 0.9, 1.0);
            assert!((n.length() - 1.0).abs() < 1e-4);
            assert!(n.y > 0.0);
        }
    }

    #[test]
    fn test_wind_moves_pattern() {
        let f = field();
        let moved = (0..20).any(|i| {
            let x = i as f32 * 5.3;
            (f.height(x, 3.0, 0.0) - f.height(x, 3.0, 10.0)).abs() > 1e-4
        });
        assert!(moved);
    }

    #[test]
    fn test_cache_serves_cell_and_expires() {
        let f = field();
        let mut cache = WaveCache::new();
        let a = cache.height(&f, 1.01, 1.01, 0.0);
        let b = cache.height(&f, 1.2, 1.2, 5.0);
        assert_eq!(a, b, "same cell within an epoch returns the cached value");
        assert_eq!(cache.hits, 1);
        assert_eq!(cache.misses, 1);

        cache.advance(2);
        assert_eq!(cache.len(), 1);
        cache.advance(2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_disabled_passes_through() {
        let mut config = WaveConfig::default();
        config.cache_enabled = false;
        let f = WaveField::new(config);
        let mut cache = WaveCache::new();
        assert_eq!(cache.height(&f, 3.3, 4.4, 1.0), f.height(3.3, 4.4, 1.0));
        assert!(cache.is_empty());
    }
}
