use serde::{Deserialize, Serialize};

/// Opaque session id assigned by the relay transport.
pub type PlayerId = String;

/// Badge colours shown on a player's info tag and HUD.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerColor {
    pub bg: String,
    pub text: String,
}

impl Default for PlayerColor {
    fn default() -> Self {
        Self::new("#000000", "#ffffff")
    }
}

impl PlayerColor {
    pub fn new(bg: &str, text: &str) -> Self {
        Self {
            bg: bg.to_string(),
            text: text.to_string(),
        }
    }

    /// Badge palette handed out to new players.
    pub const PALETTE: &[(&str, &str)] = &[
        ("#EB3F86", "#ffffff"),
        ("#405AFF", "#ffffff"),
        ("#E9FF38", "#000000"),
        ("#A44CE3", "#ffffff"),
        ("#A7E22E", "#000000"),
        ("#a34fde", "#ffffff"),
        ("#8EDD0A", "#000000"),
    ];

    /// Palette entry by index, wrapping around.
    pub fn from_palette(index: usize) -> Self {
        let (bg, text) = Self::PALETTE[index % Self::PALETTE.len()];
        Self::new(bg, text)
    }
}

/// What a client announces about itself when entering presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub nickname: String,
    #[serde(default)]
    pub color: PlayerColor,
}

impl PlayerInfo {
    pub fn new(nickname: &str, color: PlayerColor) -> Self {
        Self {
            nickname: nickname.to_string(),
            color,
        }
    }

    /// Nickname as shown on the HUD.
    pub fn display_name(&self) -> String {
        self.nickname.to_uppercase()
    }
}

/// A player tracked by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub nickname: String,
    pub color: PlayerColor,
    pub score: u32,
}

impl Player {
    pub fn new(id: PlayerId, info: PlayerInfo) -> Self {
        Self {
            id,
            nickname: info.nickname,
            color: info.color,
            score: 0,
        }
    }

    pub fn info(&self) -> PlayerInfo {
        PlayerInfo {
            nickname: self.nickname.clone(),
            color: self.color.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_wraps() {
        let first = PlayerColor::from_palette(0);
        let wrapped = PlayerColor::from_palette(PlayerColor::PALETTE.len());
        assert_eq!(first, wrapped);
        assert_eq!(first.bg, "#EB3F86");
    }

    #[test]
    fn info_without_color_uses_default() {
        let info: PlayerInfo = serde_json::from_str(r#"{"nickname":"quackers"}"#).unwrap();
        assert_eq!(info.color, PlayerColor::default());
        assert_eq!(info.display_name(), "QUACKERS");
    }

    #[test]
    fn new_player_starts_at_zero() {
        let p = Player::new(
            "id-1".to_string(),
            PlayerInfo::new("ace", PlayerColor::from_palette(2)),
        );
        assert_eq!(p.score, 0);
        assert_eq!(p.info().nickname, "ace");
    }
}
