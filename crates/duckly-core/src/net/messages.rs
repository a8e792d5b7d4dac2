use serde::{Deserialize, Serialize};

use crate::leaderboard::LeaderboardEntry;
use crate::player::PlayerInfo;

/// Name of the shared channel every client and kiosk listens on.
pub const GAME_CHANNEL: &str = "launch-duckly";

/// Events a player client publishes on its own channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlayerMessage {
    LaunchSprites { count: u32 },
    Hit,
    Kill,
    GameOver,
}

/// Everything a connection may send to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Presence enter.
    Enter { player: PlayerInfo },
    /// Presence leave. Dropping the socket has the same effect.
    Leave,
    /// A kiosk asking for the current player count and leaderboard.
    Kiosk,
    LaunchSprites { count: u32 },
    Hit,
    Kill,
    GameOver,
}

impl From<PlayerMessage> for ClientMessage {
    fn from(msg: PlayerMessage) -> Self {
        match msg {
            PlayerMessage::LaunchSprites { count } => Self::LaunchSprites { count },
            PlayerMessage::Hit => Self::Hit,
            PlayerMessage::Kill => Self::Kill,
            PlayerMessage::GameOver => Self::GameOver,
        }
    }
}

/// Messages broadcast on the shared game channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameMessage {
    Enter { player: PlayerInfo },
    Leave { player: PlayerInfo },
    LaunchSprites { player: PlayerInfo, count: u32 },
    Hit { player: PlayerInfo },
    Kill { player: PlayerInfo },
    GameOver { player: PlayerInfo },
    Leaderboard { leaderboard: Vec<LeaderboardEntry> },
    Players { count: usize },
}

impl GameMessage {
    /// Wrap a player's own event for rebroadcast on the game channel.
    pub fn from_player(player: PlayerInfo, msg: PlayerMessage) -> Self {
        match msg {
            PlayerMessage::LaunchSprites { count } => Self::LaunchSprites { player, count },
            PlayerMessage::Hit => Self::Hit { player },
            PlayerMessage::Kill => Self::Kill { player },
            PlayerMessage::GameOver => Self::GameOver { player },
        }
    }

    /// Wire name of the message, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Enter { .. } => "enter",
            Self::Leave { .. } => "leave",
            Self::LaunchSprites { .. } => "launchSprites",
            Self::Hit { .. } => "hit",
            Self::Kill { .. } => "kill",
            Self::GameOver { .. } => "gameOver",
            Self::Leaderboard { .. } => "leaderboard",
            Self::Players { .. } => "players",
        }
    }

    /// The player the message is about, if any.
    pub fn player(&self) -> Option<&PlayerInfo> {
        match self {
            Self::Enter { player }
            | Self::Leave { player }
            | Self::LaunchSprites { player, .. }
            | Self::Hit { player }
            | Self::Kill { player }
            | Self::GameOver { player } => Some(player),
            Self::Leaderboard { .. } | Self::Players { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerColor;

    fn info() -> PlayerInfo {
        PlayerInfo::new("mallard", PlayerColor::from_palette(1))
    }

    #[test]
    fn player_message_wire_names() {
        assert_eq!(
            serde_json::to_string(&PlayerMessage::LaunchSprites { count: 5 }).unwrap(),
            r#"{"type":"launchSprites","count":5}"#
        );
        assert_eq!(
            serde_json::to_string(&PlayerMessage::GameOver).unwrap(),
            r#"{"type":"gameOver"}"#
        );
        assert_eq!(
            serde_json::to_string(&PlayerMessage::Kill).unwrap(),
            r#"{"type":"kill"}"#
        );
    }

    #[test]
    fn client_enter_parses() {
        let json = r##"{"type":"enter","player":{"nickname":"teal","color":{"bg":"#405AFF","text":"#ffffff"}}}"##;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Enter { player } => assert_eq!(player.nickname, "teal"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn from_player_attaches_identity() {
        let msg = GameMessage::from_player(info(), PlayerMessage::LaunchSprites { count: 3 });
        assert_eq!(msg.kind(), "launchSprites");
        assert_eq!(msg.player().map(|p| p.nickname.as_str()), Some("mallard"));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "launchSprites");
        assert_eq!(json["count"], 3);
        assert_eq!(json["player"]["nickname"], "mallard");
    }

    #[test]
    fn player_message_converts_to_client_message() {
        assert_eq!(ClientMessage::from(PlayerMessage::Hit), ClientMessage::Hit);
        assert_eq!(
            ClientMessage::from(PlayerMessage::LaunchSprites { count: 2 }),
            ClientMessage::LaunchSprites { count: 2 }
        );
    }

    #[test]
    fn leaderboard_has_no_player() {
        let msg = GameMessage::Leaderboard {
            leaderboard: Vec::new(),
        };
        assert!(msg.player().is_none());
    }

    #[test]
    fn game_channel_name() {
        assert_eq!(GAME_CHANNEL, "launch-duckly");
    }
}
