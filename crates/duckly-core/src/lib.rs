pub mod features;
pub mod leaderboard;
pub mod net;
pub mod player;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::features::GameFeatures;
    use crate::player::{PlayerColor, PlayerInfo};

    /// Create a player identity with a palette colour.
    pub fn make_player_info(nickname: &str, palette_index: usize) -> PlayerInfo {
        PlayerInfo::new(nickname, PlayerColor::from_palette(palette_index))
    }

    /// Create `n` player identities named `Player1..PlayerN`.
    pub fn make_player_infos(n: usize) -> Vec<PlayerInfo> {
        (0..n)
            .map(|i| make_player_info(&format!("Player{}", i + 1), i))
            .collect()
    }

    /// Default features with sound off and a custom round-1 sprite count,
    /// so tests don't have to spell out every field.
    pub fn quiet_features(sprites_to_launch: u32, hits_to_kill: u32) -> GameFeatures {
        GameFeatures {
            sound_enabled: false,
            sprites_to_launch,
            hits_to_kill,
            ..GameFeatures::default()
        }
    }
}
