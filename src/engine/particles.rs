//! Celebration and miss bursts
//!
//! Pure data, no rng: spread comes from a hash of the burst salt so the
//! visual layer never perturbs the gameplay rng stream. The renderer
//! maps tints to actual colors.

use glam::Vec2;

pub const MAX_SPARKS: usize = 256;

/// Downward pull on live sparks, px/s² (canvas y grows downward)
const GRAVITY: f32 = 260.0;
const DRAG: f32 = 0.98;

/// Visual flavor of one burst
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstKind {
    /// Colorful fountain for a right answer
    Confetti,
    /// Short gray puff for a miss
    Puff,
    /// Screen-wide shower when the session is won
    Fireworks,
    /// Slow dark drizzle when it's lost
    Fizzle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spark {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Palette index, resolved by the renderer
    pub tint: u8,
    pub life: f32,
    pub size: f32,
}

/// All live sparks, oldest first
#[derive(Debug, Default)]
pub struct BurstField {
    sparks: Vec<Spark>,
}

impl BurstField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sparks(&self) -> &[Spark] {
        &self.sparks
    }

    pub fn is_empty(&self) -> bool {
        self.sparks.is_empty()
    }

    pub fn clear(&mut self) {
        self.sparks.clear();
    }

    /// Spawn one burst at `center`. Identical salts produce identical
    /// bursts; callers feed in the session tick for variety.
    pub fn burst(&mut self, center: Vec2, kind: BurstKind, salt: u32) {
        let (count, speed_lo, speed_hi, lift, life, size, tints): (
            u32,
            f32,
            f32,
            f32,
            f32,
            f32,
            &[u8],
        ) = match kind {
            BurstKind::Confetti => (24, 90.0, 220.0, 160.0, 0.9, 4.0, &[0, 1, 2, 3, 4, 5]),
            BurstKind::Puff => (10, 40.0, 90.0, 20.0, 0.45, 3.0, &[6, 7]),
            BurstKind::Fireworks => (48, 120.0, 320.0, 120.0, 1.4, 5.0, &[0, 1, 2, 3, 4, 5]),
            BurstKind::Fizzle => (16, 20.0, 60.0, -40.0, 1.1, 3.5, &[7, 8]),
        };

        for i in 0..count {
            if self.sparks.len() >= MAX_SPARKS {
                // Drop the oldest to make room
                self.sparks.remove(0);
            }
            // Deterministic "random" spread using hash
            let hash = salt.wrapping_mul(2654435761).wrapping_add(i * 7919);
            let rand1 = (hash % 1000) as f32 / 1000.0;
            let rand2 = ((hash >> 10) % 1000) as f32 / 1000.0;
            let rand3 = ((hash >> 20) % 1000) as f32 / 1000.0;

            let angle = rand1 * std::f32::consts::TAU;
            let speed = speed_lo + rand2 * (speed_hi - speed_lo);
            let vel = Vec2::new(angle.cos() * speed, angle.sin() * speed - lift);

            self.sparks.push(Spark {
                pos: center,
                vel,
                tint: tints[hash as usize % tints.len()],
                life: life * (0.7 + rand3 * 0.6),
                size: size * (0.7 + rand2 * 0.6),
            });
        }
    }

    /// Advance every spark one step and drop the dead ones
    pub fn update(&mut self, dt: f32) {
        for spark in self.sparks.iter_mut() {
            spark.pos += spark.vel * dt;
            spark.vel.y += GRAVITY * dt;
            spark.vel *= DRAG;
            spark.life -= dt * 1.5;
            spark.size *= 0.995;
        }
        self.sparks.retain(|s| s.life > 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;

    #[test]
    fn test_burst_spawns_expected_count() {
        let mut field = BurstField::new();
        field.burst(vec2(100.0, 100.0), BurstKind::Puff, 1);
        assert_eq!(field.sparks().len(), 10);
    }

    #[test]
    fn test_cap_evicts_oldest_first() {
        let mut field = BurstField::new();
        for salt in 0..20 {
            field.burst(Vec2::ZERO, BurstKind::Fireworks, salt);
        }
        assert_eq!(field.sparks().len(), MAX_SPARKS);
    }

    #[test]
    fn test_same_salt_same_burst() {
        let mut a = BurstField::new();
        let mut b = BurstField::new();
        a.burst(vec2(5.0, 5.0), BurstKind::Confetti, 77);
        b.burst(vec2(5.0, 5.0), BurstKind::Confetti, 77);
        assert_eq!(a.sparks(), b.sparks());
    }

    #[test]
    fn test_update_eventually_clears_field() {
        let mut field = BurstField::new();
        field.burst(Vec2::ZERO, BurstKind::Confetti, 3);
        for _ in 0..600 {
            field.update(1.0 / 60.0);
        }
        assert!(field.is_empty());
    }
}
