use serde::Serialize;
use serde::de::DeserializeOwned;

use super::messages::{ClientMessage, GameMessage};

/// Maximum message payload size in bytes.
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024; // 16 KiB

#[derive(Debug)]
pub enum ProtocolError {
    EmptyMessage,
    PayloadTooLarge(usize),
    SerializeError(String),
    DeserializeError(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "empty message"),
            Self::PayloadTooLarge(size) => {
                write!(
                    f,
                    "payload too large: {size} bytes (max {MAX_MESSAGE_SIZE})"
                )
            },
            Self::SerializeError(e) => write!(f, "serialize error: {e}"),
            Self::DeserializeError(e) => write!(f, "deserialize error: {e}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Encode a serializable message as a JSON text frame.
pub fn encode_message<T: Serialize>(msg: &T) -> Result<String, ProtocolError> {
    let text =
        serde_json::to_string(msg).map_err(|e| ProtocolError::SerializeError(e.to_string()))?;
    if text.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge(text.len()));
    }
    Ok(text)
}

/// Decode a JSON text frame, rejecting empty and oversized input first.
pub fn decode_message<T: DeserializeOwned>(data: &str) -> Result<T, ProtocolError> {
    if data.trim().is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    if data.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge(data.len()));
    }
    serde_json::from_str(data).map_err(|e| ProtocolError::DeserializeError(e.to_string()))
}

/// Encode a `ClientMessage` to wire format.
pub fn encode_client_message(msg: &ClientMessage) -> Result<String, ProtocolError> {
    encode_message(msg)
}

/// Decode wire data into a `ClientMessage`.
pub fn decode_client_message(data: &str) -> Result<ClientMessage, ProtocolError> {
    decode_message(data)
}

/// Encode a `GameMessage` to wire format.
pub fn encode_game_message(msg: &GameMessage) -> Result<String, ProtocolError> {
    encode_message(msg)
}

/// Decode wire data into a `GameMessage`.
pub fn decode_game_message(data: &str) -> Result<GameMessage, ProtocolError> {
    decode_message(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::LeaderboardEntry;
    use crate::player::{PlayerColor, PlayerInfo};

    #[test]
    fn client_message_roundtrip() {
        let msg = ClientMessage::Enter {
            player: PlayerInfo::new("pintail", PlayerColor::from_palette(3)),
        };
        let text = encode_client_message(&msg).unwrap();
        assert_eq!(decode_client_message(&text).unwrap(), msg);
    }

    #[test]
    fn game_message_leaderboard_shape() {
        let msg = GameMessage::Leaderboard {
            leaderboard: vec![LeaderboardEntry {
                nickname: "ace".to_string(),
                score: 12,
            }],
        };
        let text = encode_game_message(&msg).unwrap();
        assert_eq!(
            text,
            r#"{"type":"leaderboard","leaderboard":[{"nickname":"ace","score":12}]}"#
        );
    }

    #[test]
    fn empty_message_rejected() {
        assert!(matches!(
            decode_client_message("   "),
            Err(ProtocolError::EmptyMessage)
        ));
    }

    #[test]
    fn unknown_type_rejected() {
        let err = decode_client_message(r#"{"type":"teleport"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::DeserializeError(_)));
        assert!(err.to_string().starts_with("deserialize error"));
    }

    #[test]
    fn oversized_payload_rejected() {
        let huge = format!(
            r#"{{"type":"enter","player":{{"nickname":"{}"}}}}"#,
            "q".repeat(MAX_MESSAGE_SIZE)
        );
        assert!(matches!(
            decode_client_message(&huge),
            Err(ProtocolError::PayloadTooLarge(_))
        ));

        let msg = ClientMessage::Enter {
            player: PlayerInfo::new(&"q".repeat(MAX_MESSAGE_SIZE), PlayerColor::default()),
        };
        assert!(matches!(
            encode_client_message(&msg),
            Err(ProtocolError::PayloadTooLarge(_))
        ));
    }
}
