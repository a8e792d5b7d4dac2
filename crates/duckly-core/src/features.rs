use serde::{Deserialize, Serialize};

/// Visual/audio theme of the hunt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameTheme {
    #[default]
    Ducks,
    Space,
}

/// Flaggable game settings, with the fallbacks used when the flag
/// service is unreachable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameFeatures {
    pub game_theme: GameTheme,
    /// All sounds on/off.
    pub sound_enabled: bool,
    /// Sprites launched in the first round.
    pub sprites_to_launch: u32,
    /// Growth of the per-round sprite count.
    pub flock_multiplier: f64,
    /// Compounding growth of clock and flight speed.
    pub speed_multiplier: f64,
    /// Make the last sprite of a round faster and noisier.
    pub last_sprite_goes_crazy: bool,
    /// Hits it takes to kill one sprite.
    pub hits_to_kill: u32,
}

impl Default for GameFeatures {
    fn default() -> Self {
        Self {
            game_theme: GameTheme::Ducks,
            sound_enabled: true,
            sprites_to_launch: 5,
            flock_multiplier: 1.5,
            speed_multiplier: 0.2,
            last_sprite_goes_crazy: true,
            hits_to_kill: 1,
        }
    }
}

/// A live update pushed by the flag provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "camelCase")]
pub enum FeatureChange {
    GameTheme(GameTheme),
    SoundEnabled(bool),
    SpritesToLaunch(u32),
    FlockMultiplier(f64),
    SpeedMultiplier(f64),
    LastSpriteGoesCrazy(bool),
    HitsToKill(u32),
}

impl GameFeatures {
    /// Load features from `DUCKLY_FEATURES` or `config/features.toml`,
    /// falling back to defaults.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("DUCKLY_FEATURES")
            && let Ok(contents) = std::fs::read_to_string(&path)
        {
            match toml::from_str::<Self>(&contents) {
                Ok(features) => return features.sanitized(),
                Err(e) => tracing::warn!(path = %path, "Failed to parse features: {e}"),
            }
        }
        if let Ok(contents) = std::fs::read_to_string("config/features.toml")
            && let Ok(features) = toml::from_str::<Self>(&contents)
        {
            return features.sanitized();
        }
        Self::default()
    }

    /// Clamp values the engine cannot work with.
    pub fn sanitized(mut self) -> Self {
        self.hits_to_kill = self.hits_to_kill.max(1);
        if !self.flock_multiplier.is_finite() || self.flock_multiplier < 0.0 {
            self.flock_multiplier = 0.0;
        }
        if !self.speed_multiplier.is_finite() || self.speed_multiplier < 0.0 {
            self.speed_multiplier = 0.0;
        }
        self
    }

    /// Apply a live change. Returns false if the value was already current.
    pub fn apply(&mut self, change: &FeatureChange) -> bool {
        let before = self.clone();
        match *change {
            FeatureChange::GameTheme(theme) => self.game_theme = theme,
            FeatureChange::SoundEnabled(on) => self.sound_enabled = on,
            FeatureChange::SpritesToLaunch(n) => self.sprites_to_launch = n,
            FeatureChange::FlockMultiplier(m) => self.flock_multiplier = m,
            FeatureChange::SpeedMultiplier(m) => self.speed_multiplier = m,
            FeatureChange::LastSpriteGoesCrazy(on) => self.last_sprite_goes_crazy = on,
            FeatureChange::HitsToKill(n) => self.hits_to_kill = n,
        }
        *self = self.clone().sanitized();
        *self != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fallbacks() {
        let f = GameFeatures::default();
        assert_eq!(f.game_theme, GameTheme::Ducks);
        assert!(f.sound_enabled);
        assert_eq!(f.sprites_to_launch, 5);
        assert!((f.flock_multiplier - 1.5).abs() < f64::EPSILON);
        assert!((f.speed_multiplier - 0.2).abs() < f64::EPSILON);
        assert!(f.last_sprite_goes_crazy);
        assert_eq!(f.hits_to_kill, 1);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let f: GameFeatures = toml::from_str(
            r#"
gameTheme = "space"
hitsToKill = 3
"#,
        )
        .unwrap();
        assert_eq!(f.game_theme, GameTheme::Space);
        assert_eq!(f.hits_to_kill, 3);
        assert_eq!(f.sprites_to_launch, 5);
    }

    #[test]
    fn change_json_shape() {
        let change: FeatureChange =
            serde_json::from_str(r#"{"key":"hitsToKill","value":2}"#).unwrap();
        assert_eq!(change, FeatureChange::HitsToKill(2));
        let theme: FeatureChange =
            serde_json::from_str(r#"{"key":"gameTheme","value":"space"}"#).unwrap();
        assert_eq!(theme, FeatureChange::GameTheme(GameTheme::Space));
    }

    #[test]
    fn apply_reports_changes() {
        let mut f = GameFeatures::default();
        assert!(f.apply(&FeatureChange::SoundEnabled(false)));
        assert!(!f.apply(&FeatureChange::SoundEnabled(false)));
        assert!(!f.sound_enabled);
    }

    #[test]
    fn zero_hits_to_kill_is_clamped() {
        let mut f = GameFeatures::default();
        f.apply(&FeatureChange::HitsToKill(0));
        assert_eq!(f.hits_to_kill, 1);
        f.apply(&FeatureChange::SpeedMultiplier(-1.0));
        assert_eq!(f.speed_multiplier, 0.0);
    }
}
