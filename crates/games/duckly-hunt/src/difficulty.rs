use duckly_core::features::GameFeatures;

/// Sprites launched in `round`: the base count in round 1, then
/// `base + ⌊flock × round⌋`.
pub fn sprites_for_round(base: u32, flock_multiplier: f64, round: u32) -> u32 {
    if round <= 1 {
        return base;
    }
    let extra = (flock_multiplier * f64::from(round)).floor();
    base.saturating_add(extra.max(0.0) as u32)
}

/// Per-round scaling. Factors compound from round 2 on and reset with a
/// new game.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Difficulty {
    pub sprites: u32,
    pub timer_factor: f64,
    pub flight_factor: f64,
    pub time_reward: u32,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self {
            sprites: 0,
            timer_factor: 1.0,
            flight_factor: 1.0,
            time_reward: 1,
        }
    }
}

impl Difficulty {
    pub fn adjust(&mut self, round: u32, features: &GameFeatures) {
        self.sprites = features.sprites_to_launch;
        if round > 1 {
            let speed = features.speed_multiplier;
            self.sprites = sprites_for_round(
                features.sprites_to_launch,
                features.flock_multiplier,
                round,
            );
            self.timer_factor += self.timer_factor * speed;
            self.flight_factor += self.flight_factor * speed;
            let bonus = (f64::from(self.time_reward) * speed).round().max(0.0) as u32;
            self.time_reward = self.time_reward.saturating_add(bonus);
        }
    }
}
