//! Shared-display game that mirrors every player's round.
//!
//! The kiosk never scores anything itself. It listens on the game channel
//! and replays each player's events on sprites tagged with their nickname:
//! launches spawn sprites at the back of the player's queue, hits flash
//! the front one and kills bring it down.

use std::collections::{BTreeMap, HashMap, VecDeque};

use tracing::{debug, info, warn};

use duckly_core::features::{FeatureChange, GameFeatures};
use duckly_core::leaderboard::LeaderboardEntry;
use duckly_core::net::messages::GameMessage;
use duckly_core::net::protocol::{ProtocolError, decode_game_message};
use duckly_core::player::PlayerInfo;

use crate::scene::{Scene, format_score};
use crate::schedule::TimerId;
use crate::shootable::{ShootableSprite, SpriteEvent};
use crate::sound::{Music, SoundSet};
use crate::sprite::SpriteId;
use crate::stage::{Stage, Tick};

/// Lines kept in the info log.
pub const INFO_LOG_LINES: usize = 7;

#[derive(Debug)]
struct KioskPlayer {
    info: PlayerInfo,
    queue: VecDeque<SpriteId>,
}

/// What the kiosk overlay shows besides the scene.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KioskBoard {
    /// Logo and game info panels, shown once someone has joined.
    pub kiosk_ui_visible: bool,
    pub info_log: VecDeque<String>,
    /// Leaderboard rows, `nickname...0042`.
    pub leaders: Vec<String>,
    pub player_count: usize,
}

pub struct KioskGame {
    stage: Stage,
    features: GameFeatures,
    scene: Scene,
    sound_set: SoundSet,
    music: Music,
    players: HashMap<String, KioskPlayer>,
    sprites: BTreeMap<SpriteId, ShootableSprite>,
    board: KioskBoard,
}

impl KioskGame {
    pub fn new(mut stage: Stage, features: GameFeatures) -> Self {
        let features = features.sanitized();
        let sound_set = SoundSet::for_theme(features.game_theme);
        let music = Music::for_theme(features.game_theme);
        stage.sounds.mute_all(!features.sound_enabled);
        let scene = Scene::new(&mut stage, sound_set);
        Self {
            stage,
            features,
            scene,
            sound_set,
            music,
            players: HashMap::new(),
            sprites: BTreeMap::new(),
            board: KioskBoard::default(),
        }
    }

    pub fn features(&self) -> &GameFeatures {
        &self.features
    }

    pub fn board(&self) -> &KioskBoard {
        &self.board
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn has_player(&self, nickname: &str) -> bool {
        self.players.contains_key(nickname)
    }

    /// Sprites still queued for a player, front first.
    pub fn queue(&self, nickname: &str) -> Vec<SpriteId> {
        self.players
            .get(nickname)
            .map(|p| p.queue.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn sprite(&self, id: SpriteId) -> Option<&ShootableSprite> {
        self.sprites.get(&id)
    }

    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }

    /// Attract mode: title, title sprites, scrolling scenery, clouds and
    /// the running dog.
    pub fn start(&mut self) {
        self.scene.toggle_title(true);
        self.board.kiosk_ui_visible = false;
        self.scene.toggle_title_sprites(&mut self.stage, true);
        self.scene.toggle_scrolling_scenery(&mut self.stage, true);
        self.scene.animate_clouds(&mut self.stage);
        self.scene.dog.show_running(&mut self.stage);
    }

    fn show_kiosk_ui(&mut self) {
        self.scene.toggle_title(false);
        self.board.kiosk_ui_visible = true;
        self.scene.toggle_title_sprites(&mut self.stage, false);
        self.scene.toggle_scrolling_scenery(&mut self.stage, false);
        self.scene.dog.hide(&mut self.stage);
    }

    /// Decode and apply one text frame from the game channel.
    pub fn handle_frame(&mut self, frame: &str) -> Result<(), ProtocolError> {
        let msg = decode_game_message(frame)?;
        self.handle(msg);
        Ok(())
    }

    pub fn handle(&mut self, msg: GameMessage) {
        debug!(kind = msg.kind(), "Kiosk message");
        match msg {
            GameMessage::Enter { player } => self.on_enter(player),
            GameMessage::Leave { player } => self.on_leave(&player),
            GameMessage::LaunchSprites { player, count } => self.on_launch(&player, count),
            GameMessage::Hit { player } => self.on_hit(&player),
            GameMessage::Kill { player } => self.on_kill(&player),
            GameMessage::GameOver { player } => self.on_game_over(&player),
            GameMessage::Leaderboard { leaderboard } => self.update_leaderboard(&leaderboard),
            GameMessage::Players { count } => self.board.player_count = count,
        }
    }

    fn on_enter(&mut self, player: PlayerInfo) {
        info!(nickname = %player.nickname, "Player entered");
        if self.players.is_empty() {
            self.show_kiosk_ui();
        }
        self.log(format!("\u{2713} {} joined", player.nickname));
        match self.players.get_mut(&player.nickname) {
            Some(existing) => existing.info = player,
            None => {
                self.players.insert(
                    player.nickname.clone(),
                    KioskPlayer {
                        info: player,
                        queue: VecDeque::new(),
                    },
                );
            },
        }
    }

    fn on_leave(&mut self, player: &PlayerInfo) {
        let Some(mut gone) = self.players.remove(&player.nickname) else {
            return;
        };
        self.fly_away(&mut gone.queue);
        self.log(format!("\u{2717} {} left", player.nickname));
    }

    fn on_launch(&mut self, player: &PlayerInfo, count: u32) {
        self.scene.hide_message();
        let Some(known) = self.players.get_mut(&player.nickname) else {
            warn!(nickname = %player.nickname, "Launch for unknown player");
            return;
        };
        debug!(nickname = %player.nickname, count, "Launching sprites");
        for _ in 0..count {
            let mut sprite =
                ShootableSprite::new(&mut self.stage, self.sound_set, self.features.hits_to_kill);
            sprite.show_info_tag(&known.info.nickname, known.info.color.clone());
            sprite.launch(&mut self.stage, 1.0);
            known.queue.push_back(sprite.id());
            self.sprites.insert(sprite.id(), sprite);
        }
    }

    fn on_hit(&mut self, player: &PlayerInfo) {
        let Some(known) = self.players.get_mut(&player.nickname) else {
            return;
        };
        let Some(&front) = known.queue.front() else {
            debug!(nickname = %player.nickname, "Hit with no sprites queued");
            return;
        };
        // Players always follow a lethal shot with `kill`.
        if let Some(sprite) = self.sprites.get_mut(&front) {
            sprite.flash(&mut self.stage);
        }
    }

    fn on_kill(&mut self, player: &PlayerInfo) {
        let Some(known) = self.players.get_mut(&player.nickname) else {
            return;
        };
        let Some(front) = known.queue.pop_front() else {
            debug!(nickname = %player.nickname, "Kill with no sprites queued");
            return;
        };
        if let Some(sprite) = self.sprites.get_mut(&front) {
            sprite.kill(&mut self.stage);
        }
    }

    fn on_game_over(&mut self, player: &PlayerInfo) {
        let Some(known) = self.players.get_mut(&player.nickname) else {
            return;
        };
        let mut queue = std::mem::take(&mut known.queue);
        self.stage.sounds.play(self.music.fly_away);
        self.fly_away(&mut queue);
        self.log(format!("- Game over {}", player.nickname));
    }

    fn fly_away(&mut self, queue: &mut VecDeque<SpriteId>) {
        for id in queue.drain(..) {
            if let Some(sprite) = self.sprites.get_mut(&id) {
                sprite.fly_away(&mut self.stage);
            }
        }
    }

    /// Apply a live feature change. New sprites pick up counts and
    /// `hits_to_kill`; theme and sound changes apply now.
    pub fn apply_feature_change(&mut self, change: &FeatureChange) {
        if !self.features.apply(change) {
            return;
        }
        match change {
            FeatureChange::GameTheme(theme) => {
                self.sound_set = SoundSet::for_theme(*theme);
                self.music = Music::for_theme(*theme);
                self.scene.set_title_sprite_sounds(self.sound_set);
                info!(?theme, "Kiosk theme changed");
            },
            FeatureChange::SoundEnabled(enabled) => {
                self.stage.sounds.mute_all(!enabled);
            },
            _ => debug!(?change, "Kiosk feature changed"),
        }
    }

    fn update_leaderboard(&mut self, leaders: &[LeaderboardEntry]) {
        self.board.leaders = leaders
            .iter()
            .map(|e| format!("{}...{}", e.nickname, format_score(e.score)))
            .collect();
    }

    fn log(&mut self, line: String) {
        while self.board.info_log.len() >= INFO_LOG_LINES {
            self.board.info_log.pop_front();
        }
        self.board.info_log.push_back(line);
    }

    pub fn advance(&mut self, ms: u64) {
        let until = self.stage.now().saturating_add(ms);
        while let Some((id, tick)) = self.stage.scheduler.pop_due(until) {
            self.dispatch(id, tick);
        }
        self.stage.scheduler.advance_to(until);
    }

    fn dispatch(&mut self, id: TimerId, tick: Tick) {
        if let Tick::Sprite(sprite_id, sprite_tick) = tick
            && let Some(sprite) = self.sprites.get_mut(&sprite_id)
        {
            if let Some(SpriteEvent::Landed(_) | SpriteEvent::FlewAway(_)) =
                sprite.on_tick(&mut self.stage, id, sprite_tick)
                && let Some(mut gone) = self.sprites.remove(&sprite_id)
            {
                gone.remove(&mut self.stage);
            }
            return;
        }
        self.scene.on_tick(&mut self.stage, id, tick);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shootable::LifeState;
    use crate::sound::Sound;
    use crate::stage::Screen;
    use crate::test_helpers::recording_stage;
    use duckly_core::features::GameTheme;
    use duckly_core::net::messages::PlayerMessage;
    use duckly_core::test_helpers::{make_player_info, make_player_infos, quiet_features};

    fn kiosk(hits: u32) -> KioskGame {
        let mut game = KioskGame::new(Stage::seeded(Screen::default(), 5), quiet_features(5, hits));
        game.start();
        game
    }

    fn event(player: &PlayerInfo, msg: PlayerMessage) -> GameMessage {
        GameMessage::from_player(player.clone(), msg)
    }

    #[test]
    fn first_enter_switches_to_kiosk_ui() {
        let mut game = kiosk(1);
        assert!(game.scene().hud.title_visible);
        game.handle(GameMessage::Enter {
            player: make_player_info("teal", 0),
        });
        assert!(game.board().kiosk_ui_visible);
        assert!(!game.scene().hud.title_visible);
        assert!(!game.scene().dog.is_running());
        assert_eq!(game.board().info_log.back().unwrap(), "\u{2713} teal joined");
    }

    #[test]
    fn launch_tags_sprites_for_player() {
        let mut game = kiosk(1);
        let teal = make_player_info("teal", 2);
        game.handle(GameMessage::Enter { player: teal.clone() });
        game.handle(event(&teal, PlayerMessage::LaunchSprites { count: 3 }));
        let queue = game.queue("teal");
        assert_eq!(queue.len(), 3);
        let tag = game.sprite(queue[0]).unwrap().info_tag().unwrap();
        assert_eq!(tag.text, "teal");
        assert_eq!(tag.color, teal.color);
    }

    #[test]
    fn launch_for_unknown_player_is_ignored() {
        let mut game = kiosk(1);
        let ghost = make_player_info("ghost", 0);
        game.handle(event(&ghost, PlayerMessage::LaunchSprites { count: 2 }));
        assert_eq!(game.sprite_count(), 0);
    }

    #[test]
    fn hit_and_kill_work_the_queue_front() {
        let mut game = kiosk(2);
        let teal = make_player_info("teal", 0);
        game.handle(GameMessage::Enter { player: teal.clone() });
        game.handle(event(&teal, PlayerMessage::LaunchSprites { count: 2 }));
        let queue = game.queue("teal");

        game.handle(event(&teal, PlayerMessage::Hit));
        assert_eq!(game.queue("teal"), queue);
        assert_eq!(game.sprite(queue[0]).unwrap().hit_count(), 1);

        game.handle(event(&teal, PlayerMessage::Kill));
        assert_eq!(game.queue("teal"), vec![queue[1]]);
        assert_eq!(game.sprite(queue[0]).unwrap().state(), LifeState::Hit);
    }

    #[test]
    fn hit_never_dequeues_even_with_stale_hits_to_kill() {
        // The kiosk thinks one hit kills; the player needs two.
        let mut game = kiosk(1);
        let teal = make_player_info("teal", 0);
        game.handle(GameMessage::Enter { player: teal.clone() });
        game.handle(event(&teal, PlayerMessage::LaunchSprites { count: 2 }));
        let queue = game.queue("teal");

        game.handle(event(&teal, PlayerMessage::Hit));
        assert_eq!(game.queue("teal"), queue);
        let front = game.sprite(queue[0]).unwrap();
        assert_eq!(front.state(), LifeState::Flying);
        assert!(front.is_blinking());

        game.handle(event(&teal, PlayerMessage::Kill));
        assert_eq!(game.queue("teal"), vec![queue[1]]);
        assert_eq!(game.sprite(queue[0]).unwrap().state(), LifeState::Hit);
        assert_eq!(game.sprite(queue[1]).unwrap().state(), LifeState::Flying);
    }

    #[test]
    fn events_with_empty_queue_are_harmless() {
        let mut game = kiosk(1);
        let teal = make_player_info("teal", 0);
        game.handle(GameMessage::Enter { player: teal.clone() });
        game.handle(event(&teal, PlayerMessage::Hit));
        game.handle(event(&teal, PlayerMessage::Kill));
        assert_eq!(game.sprite_count(), 0);
    }

    #[test]
    fn feature_changes_apply_live() {
        let (stage, log) = recording_stage(Screen::default(), 5);
        let mut game = KioskGame::new(stage, quiet_features(5, 1));
        assert!(log.borrow().is_muted(Sound::Quack));

        game.apply_feature_change(&FeatureChange::SoundEnabled(true));
        assert!(!log.borrow().is_muted(Sound::Quack));

        game.apply_feature_change(&FeatureChange::HitsToKill(3));
        game.apply_feature_change(&FeatureChange::GameTheme(GameTheme::Space));
        assert_eq!(game.features().hits_to_kill, 3);

        let teal = make_player_info("teal", 0);
        game.handle(GameMessage::Enter { player: teal.clone() });
        game.handle(event(&teal, PlayerMessage::LaunchSprites { count: 1 }));
        let sprite = game.sprite(game.queue("teal")[0]).unwrap();
        assert_eq!(sprite.hits_to_kill(), 3);
        assert_eq!(sprite.sounds(), SoundSet::for_theme(GameTheme::Space));

        game.handle(event(&teal, PlayerMessage::GameOver));
        assert_eq!(log.borrow().plays(Sound::SpaceFly), 1);
        assert_eq!(log.borrow().plays(Sound::Fly), 0);
    }

    #[test]
    fn killed_sprites_are_removed_after_landing() {
        let mut game = kiosk(1);
        let teal = make_player_info("teal", 0);
        game.handle(GameMessage::Enter { player: teal.clone() });
        game.handle(event(&teal, PlayerMessage::LaunchSprites { count: 1 }));
        game.handle(event(&teal, PlayerMessage::Kill));
        assert_eq!(game.sprite_count(), 1);
        game.advance(60_000);
        assert_eq!(game.sprite_count(), 0);
    }

    #[test]
    fn game_over_flies_everything_away() {
        let (stage, log) = recording_stage(Screen::default(), 5);
        let mut game = KioskGame::new(stage, quiet_features(5, 1));
        let teal = make_player_info("teal", 0);
        game.handle(GameMessage::Enter { player: teal.clone() });
        game.handle(event(&teal, PlayerMessage::LaunchSprites { count: 3 }));
        let queue = game.queue("teal");
        game.handle(event(&teal, PlayerMessage::GameOver));

        assert!(game.queue("teal").is_empty());
        assert!(queue
            .iter()
            .all(|id| game.sprite(*id).unwrap().state() == LifeState::FlyingAway));
        assert_eq!(log.borrow().plays(Sound::Fly), 1);
        assert_eq!(game.board().info_log.back().unwrap(), "- Game over teal");

        game.advance(1400);
        assert_eq!(game.sprite_count(), 0);
    }

    #[test]
    fn leave_drops_player_and_their_sprites() {
        let mut game = kiosk(1);
        let teal = make_player_info("teal", 0);
        game.handle(GameMessage::Enter { player: teal.clone() });
        game.handle(event(&teal, PlayerMessage::LaunchSprites { count: 2 }));
        game.handle(GameMessage::Leave { player: teal.clone() });
        assert!(!game.has_player("teal"));
        assert_eq!(game.board().info_log.back().unwrap(), "\u{2717} teal left");
        game.advance(1400);
        assert_eq!(game.sprite_count(), 0);
    }

    #[test]
    fn info_log_keeps_latest_lines() {
        let mut game = kiosk(1);
        for player in make_player_infos(10) {
            game.handle(GameMessage::Enter { player });
        }
        let log = &game.board().info_log;
        assert_eq!(log.len(), INFO_LOG_LINES);
        assert_eq!(log.front().unwrap(), "\u{2713} Player4 joined");
        assert_eq!(log.back().unwrap(), "\u{2713} Player10 joined");
    }

    #[test]
    fn leaderboard_and_player_count_frames() {
        let mut game = kiosk(1);
        game.handle_frame(r#"{"type":"leaderboard","leaderboard":[{"nickname":"teal","score":42},{"nickname":"smew","score":7}]}"#)
            .unwrap();
        game.handle_frame(r#"{"type":"players","count":3}"#).unwrap();
        assert_eq!(game.board().leaders, vec!["teal...0042", "smew...0007"]);
        assert_eq!(game.board().player_count, 3);
        assert!(game.handle_frame("not json").is_err());
    }
}
