use serde::{Deserialize, Serialize};

/// Round-flow delays, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HuntConfig {
    /// "Get ready" pause before sprites launch.
    pub round_start_delay_ms: u64,
    /// Wait after a landing before the dog fetches, so close landings are
    /// picked up together.
    pub fetch_debounce_ms: u64,
    /// Pause between the last fetch and the next round.
    pub next_round_delay_ms: u64,
    /// Time from "fly away" to the game-over message.
    pub game_over_message_delay_ms: u64,
    /// Time after the game-over music before the title returns.
    pub new_game_delay_ms: u64,
    /// Delay before the opening bark once a game starts.
    pub bark_delay_ms: u64,
}

impl Default for HuntConfig {
    fn default() -> Self {
        Self {
            round_start_delay_ms: 2500,
            fetch_debounce_ms: 400,
            next_round_delay_ms: 1200,
            game_over_message_delay_ms: 3000,
            new_game_delay_ms: 3000,
            bark_delay_ms: 1500,
        }
    }
}

impl HuntConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("DUCKLY_HUNT_CONFIG")
            && let Some(config) = Self::from_file(&path)
        {
            return config;
        }
        Self::from_file("config/hunt.toml").unwrap_or_default()
    }

    /// Missing files are skipped; files that fail to parse are logged.
    fn from_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        match toml::from_str::<Self>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path, "Failed to parse hunt config: {e}");
                None
            },
        }
    }
}
