use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};

use duckly_core::leaderboard::{Leaderboard, LeaderboardEntry};
use duckly_core::net::messages::{ClientMessage, GameMessage, PlayerMessage};
use duckly_core::net::protocol::encode_game_message;
use duckly_core::player::{Player, PlayerId, PlayerInfo};

/// One open connection. Every connection hears the game channel; only
/// those that entered presence are players.
struct Session {
    tx: mpsc::UnboundedSender<String>,
    player: Option<Player>,
}

/// Presence, scores and the leaderboard for the one game channel.
pub struct RelayState {
    sessions: HashMap<PlayerId, Session>,
    leaderboard: Leaderboard,
    max_players: usize,
}

impl RelayState {
    pub fn new(max_players: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            leaderboard: Leaderboard::default(),
            max_players,
        }
    }

    /// Register a connection so it receives game channel broadcasts.
    pub fn connect(&mut self, id: PlayerId, tx: mpsc::UnboundedSender<String>) {
        self.sessions.insert(id, Session { tx, player: None });
    }

    /// Drop a connection, leaving presence first if it had entered.
    pub fn disconnect(&mut self, id: &str) {
        self.leave(id);
        self.sessions.remove(id);
    }

    /// Enter presence with score 0. Re-entering keeps the current score.
    pub fn enter(&mut self, id: &str, info: PlayerInfo) -> Result<(), String> {
        let already_in = self
            .sessions
            .get(id)
            .ok_or_else(|| "Session not found".to_string())?
            .player
            .is_some();
        if !already_in && self.player_count() >= self.max_players {
            return Err("Maximum player limit reached".to_string());
        }
        let session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| "Session not found".to_string())?;
        let score = session.player.as_ref().map_or(0, |p| p.score);
        let mut player = Player::new(id.to_string(), info.clone());
        player.score = score;
        session.player = Some(player);
        self.broadcast(&GameMessage::Enter { player: info });
        Ok(())
    }

    /// Leave presence. The leaderboard is published before the player goes,
    /// so their last score still counts. Returns false if not present.
    pub fn leave(&mut self, id: &str) -> bool {
        let present = self.sessions.get(id).is_some_and(|s| s.player.is_some());
        if !present {
            return false;
        }
        self.publish_top_scores();
        let Some(player) = self.sessions.get_mut(id).and_then(|s| s.player.take()) else {
            return false;
        };
        self.broadcast(&GameMessage::Leave {
            player: player.info(),
        });
        true
    }

    /// Apply a player's own event and rebroadcast it with their identity.
    pub fn publish(&mut self, id: &str, msg: PlayerMessage) -> Result<(), String> {
        let player = self
            .sessions
            .get_mut(id)
            .and_then(|s| s.player.as_mut())
            .ok_or_else(|| "Not in presence".to_string())?;
        if msg == PlayerMessage::Kill {
            player.score += 1;
        }
        let info = player.info();
        let game_over = msg == PlayerMessage::GameOver;
        self.broadcast(&GameMessage::from_player(info, msg));

        if game_over {
            self.publish_top_scores();
            if let Some(player) = self.sessions.get_mut(id).and_then(|s| s.player.as_mut()) {
                player.score = 0;
            }
        }
        Ok(())
    }

    /// Answer a kiosk with the player count and the leaderboard.
    pub fn kiosk(&mut self) {
        self.broadcast(&GameMessage::Players {
            count: self.player_count(),
        });
        self.publish_top_scores();
    }

    /// Route one decoded client message.
    pub fn handle(&mut self, id: &str, msg: ClientMessage) -> Result<(), String> {
        match msg {
            ClientMessage::Enter { player } => self.enter(id, player),
            ClientMessage::Leave => {
                self.leave(id);
                Ok(())
            },
            ClientMessage::Kiosk => {
                self.kiosk();
                Ok(())
            },
            ClientMessage::LaunchSprites { count } => {
                self.publish(id, PlayerMessage::LaunchSprites { count })
            },
            ClientMessage::Hit => self.publish(id, PlayerMessage::Hit),
            ClientMessage::Kill => self.publish(id, PlayerMessage::Kill),
            ClientMessage::GameOver => self.publish(id, PlayerMessage::GameOver),
        }
    }

    fn publish_top_scores(&mut self) {
        let scores = self
            .sessions
            .values()
            .filter_map(|s| s.player.as_ref())
            .map(|p| (p.nickname.as_str(), p.score));
        self.leaderboard.submit_all(scores);
        self.broadcast(&GameMessage::Leaderboard {
            leaderboard: self.leaderboard.entries().to_vec(),
        });
    }

    /// Send to every connection on the game channel.
    fn broadcast(&self, msg: &GameMessage) {
        let frame = match encode_game_message(msg) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(kind = msg.kind(), error = %e, "Dropping unencodable broadcast");
                return;
            },
        };
        for session in self.sessions.values() {
            let _ = session.tx.send(frame.clone());
        }
    }

    pub fn player_count(&self) -> usize {
        self.sessions.values().filter(|s| s.player.is_some()).count()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn score_of(&self, id: &str) -> Option<u32> {
        self.sessions.get(id)?.player.as_ref().map(|p| p.score)
    }

    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        self.leaderboard.entries()
    }
}

/// Shared relay state behind an async RwLock.
pub type SharedRelayState = Arc<RwLock<RelayState>>;
