//! Outbound side of the relay connection.
//!
//! The engine only ever announces itself and publishes its own events.
//! Publish failures are logged by the caller and never stop a round.

use tokio::sync::mpsc;
use tracing::warn;

use duckly_core::net::messages::{ClientMessage, PlayerMessage};
use duckly_core::net::protocol::{ProtocolError, encode_client_message};
use duckly_core::player::PlayerInfo;

#[derive(Debug)]
pub enum RelayError {
    /// The connection is gone.
    Closed,
    Protocol(ProtocolError),
}

impl std::fmt::Display for RelayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "relay connection closed"),
            Self::Protocol(e) => write!(f, "relay protocol error: {e}"),
        }
    }
}

impl std::error::Error for RelayError {}

impl From<ProtocolError> for RelayError {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

pub trait RelayChannel {
    /// Enter presence on the game channel.
    fn enter(&mut self, player: &PlayerInfo) -> Result<(), RelayError>;
    /// Publish on this player's own channel.
    fn publish(&mut self, msg: PlayerMessage) -> Result<(), RelayError>;
}

/// Publish and log failures instead of propagating them.
pub fn publish_or_warn(relay: &mut dyn RelayChannel, msg: PlayerMessage) {
    if let Err(e) = relay.publish(msg.clone()) {
        warn!(?msg, "Relay publish failed: {e}");
    }
}

/// Relay that encodes messages into text frames for a socket task to send.
#[derive(Debug)]
pub struct OutboxRelay {
    tx: mpsc::UnboundedSender<String>,
}

impl OutboxRelay {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, msg: &ClientMessage) -> Result<(), RelayError> {
        let frame = encode_client_message(msg)?;
        self.tx.send(frame).map_err(|_| RelayError::Closed)
    }
}

impl RelayChannel for OutboxRelay {
    fn enter(&mut self, player: &PlayerInfo) -> Result<(), RelayError> {
        self.send(&ClientMessage::Enter {
            player: player.clone(),
        })
    }

    fn publish(&mut self, msg: PlayerMessage) -> Result<(), RelayError> {
        self.send(&ClientMessage::from(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duckly_core::net::protocol::decode_client_message;
    use duckly_core::test_helpers::make_player_info;

    #[test]
    fn outbox_encodes_frames() {
        let (mut relay, mut rx) = OutboxRelay::new();
        relay.enter(&make_player_info("gadwall", 0)).unwrap();
        relay.publish(PlayerMessage::LaunchSprites { count: 5 }).unwrap();

        let enter = decode_client_message(&rx.try_recv().unwrap()).unwrap();
        assert!(matches!(enter, ClientMessage::Enter { player } if player.nickname == "gadwall"));
        assert_eq!(
            rx.try_recv().unwrap(),
            r#"{"type":"launchSprites","count":5}"#
        );
    }

    #[test]
    fn closed_outbox_reports_error() {
        let (mut relay, rx) = OutboxRelay::new();
        drop(rx);
        let err = relay.publish(PlayerMessage::GameOver).unwrap_err();
        assert!(matches!(err, RelayError::Closed));
        // Logged, not propagated.
        publish_or_warn(&mut relay, PlayerMessage::Kill);
    }
}
