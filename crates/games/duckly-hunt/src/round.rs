//! Player-side game orchestration.
//!
//! The controller owns the stage and every sprite on it. Hosts feed it
//! input (`start`, `aim`, `shoot_at`) and drive virtual time with
//! [`RoundController::advance`]; everything else happens in scheduled
//! continuations dispatched from here.
//!
//! Sprites live in one of two collections: `live` holds sprites that can
//! still be shot, `departing` holds killed or fly-away sprites that are
//! still animating off. Each terminal event moves or removes a sprite at
//! most once, so a repeated event finds nothing to do.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use duckly_core::features::{FeatureChange, GameFeatures};
use duckly_core::net::messages::PlayerMessage;
use duckly_core::player::PlayerInfo;

use crate::config::HuntConfig;
use crate::difficulty::Difficulty;
use crate::relay::{RelayChannel, publish_or_warn};
use crate::schedule::{TimerId, TimerSlot};
use crate::scene::{Hud, Message, Scene, SceneTick, format_score, round_label};
use crate::shootable::{ShootableSprite, SpriteEvent};
use crate::sight::Sight;
use crate::sound::{Music, Sound, SoundHandle, SoundSet};
use crate::sprite::{Animate, SpriteId};
use crate::stage::{RoundTick, Stage, Tick};
use crate::timebar::Timebar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not yet in presence.
    Lobby,
    /// Title screen with the new-game music playing.
    Intro,
    /// Waiting for the player to start.
    AwaitingStart,
    /// "Get ready" before sprites launch.
    GetReady,
    Playing,
    /// Time ran out; game-over flow in progress.
    GameOver,
}

pub struct RoundController {
    stage: Stage,
    features: GameFeatures,
    config: HuntConfig,
    relay: Box<dyn RelayChannel>,
    player: PlayerInfo,
    scene: Scene,
    sight: Sight,
    timebar: Timebar,
    live: BTreeMap<SpriteId, ShootableSprite>,
    departing: BTreeMap<SpriteId, ShootableSprite>,
    phase: Phase,
    round: u32,
    score: u32,
    landed: u32,
    to_fetch: u32,
    sprites_in_round: u32,
    last_landed_x: f32,
    difficulty: Difficulty,
    shooting_enabled: bool,
    sound_set: SoundSet,
    music: Music,
    bgm: Option<(Sound, SoundHandle)>,
    intro: TimerSlot,
    bark: TimerSlot,
    round_start: TimerSlot,
    fetch: TimerSlot,
    next_round: TimerSlot,
    game_over: TimerSlot,
}

impl RoundController {
    pub fn new(
        mut stage: Stage,
        features: GameFeatures,
        config: HuntConfig,
        relay: Box<dyn RelayChannel>,
        player: PlayerInfo,
    ) -> Self {
        let features = features.sanitized();
        let sound_set = SoundSet::for_theme(features.game_theme);
        let music = Music::for_theme(features.game_theme);
        stage.sounds.mute_all(!features.sound_enabled);
        let scene = Scene::new(&mut stage, sound_set);
        let mut sight = Sight::new();
        sight.start_animating(&mut stage);
        Self {
            stage,
            features,
            config,
            relay,
            player,
            scene,
            sight,
            timebar: Timebar::new(),
            live: BTreeMap::new(),
            departing: BTreeMap::new(),
            phase: Phase::Lobby,
            round: 0,
            score: 0,
            landed: 0,
            to_fetch: 0,
            sprites_in_round: 0,
            last_landed_x: 0.0,
            difficulty: Difficulty::default(),
            shooting_enabled: false,
            sound_set,
            music,
            bgm: None,
            intro: TimerSlot::default(),
            bark: TimerSlot::default(),
            round_start: TimerSlot::default(),
            fetch: TimerSlot::default(),
            next_round: TimerSlot::default(),
            game_over: TimerSlot::default(),
        }
    }

    // ---- queries -------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn landed(&self) -> u32 {
        self.landed
    }

    pub fn pending_fetch(&self) -> u32 {
        self.to_fetch
    }

    pub fn sprites_in_round(&self) -> u32 {
        self.sprites_in_round
    }

    pub fn difficulty(&self) -> &Difficulty {
        &self.difficulty
    }

    pub fn shooting_enabled(&self) -> bool {
        self.shooting_enabled
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn live_ids(&self) -> Vec<SpriteId> {
        self.live.keys().copied().collect()
    }

    pub fn departing_count(&self) -> usize {
        self.departing.len()
    }

    /// A live or departing sprite.
    pub fn sprite(&self, id: SpriteId) -> Option<&ShootableSprite> {
        self.live.get(&id).or_else(|| self.departing.get(&id))
    }

    pub fn timebar(&self) -> &Timebar {
        &self.timebar
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn hud(&self) -> &Hud {
        &self.scene.hud
    }

    pub fn sight(&self) -> &Sight {
        &self.sight
    }

    pub fn features(&self) -> &GameFeatures {
        &self.features
    }

    pub fn player(&self) -> &PlayerInfo {
        &self.player
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn now(&self) -> u64 {
        self.stage.now()
    }

    // ---- time ----------------------------------------------------------

    /// Run every continuation due within the next `ms` milliseconds.
    pub fn advance(&mut self, ms: u64) {
        let until = self.stage.now().saturating_add(ms);
        while let Some((id, tick)) = self.stage.scheduler.pop_due(until) {
            self.dispatch(id, tick);
        }
        self.stage.scheduler.advance_to(until);
    }

    /// Run the next scheduled continuation, whenever it is due.
    pub fn step(&mut self) -> Option<Tick> {
        let (id, tick) = self.stage.scheduler.pop_due(u64::MAX)?;
        self.dispatch(id, tick);
        Some(tick)
    }

    fn dispatch(&mut self, id: TimerId, tick: Tick) {
        match tick {
            Tick::Round(round_tick) => self.on_round_tick(id, round_tick),
            Tick::Timebar => {
                if self.timebar.on_tick(&mut self.stage, id) {
                    self.times_up();
                }
            },
            Tick::Sight => {
                self.sight.on_animation_tick(&mut self.stage, id);
            },
            Tick::Sprite(sprite_id, sprite_tick) => {
                let sprite = match self.live.get_mut(&sprite_id) {
                    Some(sprite) => Some(sprite),
                    None => self.departing.get_mut(&sprite_id),
                };
                match sprite {
                    Some(sprite) => {
                        if let Some(event) = sprite.on_tick(&mut self.stage, id, sprite_tick) {
                            self.handle_sprite_event(event);
                        }
                    },
                    None => {
                        self.scene.on_tick(&mut self.stage, id, tick);
                    },
                }
            },
            Tick::Cloud(_) | Tick::Scenery | Tick::Dog(_) => {
                if self.scene.on_tick(&mut self.stage, id, tick) == SceneTick::FetchComplete {
                    self.fetch_complete();
                }
            },
        }
    }

    fn on_round_tick(&mut self, id: TimerId, tick: RoundTick) {
        match tick {
            RoundTick::IntroMusicEnded => {
                if self.intro.fire(id) && self.phase == Phase::Intro {
                    self.phase = Phase::AwaitingStart;
                    self.scene.show_message(Message::ClickHere);
                }
            },
            RoundTick::Bark => {
                if self.bark.fire(id) {
                    self.scene.dog.bark(&mut self.stage);
                }
            },
            RoundTick::StartRound => {
                if self.round_start.fire(id) && self.phase == Phase::GetReady {
                    self.launch_round();
                }
            },
            RoundTick::Fetch => {
                if self.fetch.fire(id) {
                    self.fetch_landed();
                }
            },
            RoundTick::NextRound => {
                if self.next_round.fire(id) && self.phase == Phase::Playing {
                    self.prepare_new_round();
                    self.start_round();
                }
            },
            RoundTick::GameOverMessage => {
                if self.game_over.fire(id) {
                    self.scene.show_message(Message::GameOver);
                    let music = self.music.game_over;
                    self.stage.sounds.play(music);
                    let wait = self.stage.sounds.length_ms(music) + self.config.new_game_delay_ms;
                    self.game_over.arm(
                        &mut self.stage.scheduler,
                        wait,
                        Tick::Round(RoundTick::NewGame),
                    );
                }
            },
            RoundTick::NewGame => {
                if self.game_over.fire(id) {
                    self.scene.hide_message();
                    self.timebar.set_visible(false);
                    self.scene.hud.player_info_visible = false;
                    self.new_game();
                }
            },
        }
    }

    // ---- game flow -----------------------------------------------------

    /// Enter presence and show the title screen. Without presence the
    /// game stays in the lobby and returns false.
    pub fn enter(&mut self) -> bool {
        if let Err(e) = self.relay.enter(&self.player) {
            warn!(nickname = %self.player.nickname, "Presence enter failed: {e}");
            return false;
        }
        self.scene.hud.player_name = self.player.display_name();
        info!(nickname = %self.player.nickname, "Entered game");
        self.new_game();
        true
    }

    /// Title screen: play the new-game music, then wait for the player.
    pub fn new_game(&mut self) {
        self.phase = Phase::Intro;
        self.scene.toggle_title(true);
        self.scene.toggle_scrolling_scenery(&mut self.stage, true);
        self.scene.hide_clouds(&mut self.stage);
        self.scene.toggle_title_sprites(&mut self.stage, true);
        self.scene.dog.show_running(&mut self.stage);

        let music = self.music.new_game;
        self.stage.sounds.play(music);
        let length = self.stage.sounds.length_ms(music);
        self.intro.arm(
            &mut self.stage.scheduler,
            length,
            Tick::Round(RoundTick::IntroMusicEnded),
        );
    }

    /// The player's start action. Ignored unless the title is waiting.
    pub fn start(&mut self) -> bool {
        if self.phase != Phase::AwaitingStart {
            return false;
        }
        self.scene.hide_message();
        let bgm = self.music.bgm;
        self.bgm = Some((bgm, self.stage.sounds.loop_sound(bgm)));
        self.bark.arm(
            &mut self.stage.scheduler,
            self.config.bark_delay_ms,
            Tick::Round(RoundTick::Bark),
        );
        self.prepare_new_game();
        self.start_round();
        true
    }

    pub fn prepare_new_game(&mut self) {
        self.score = 0;
        self.round = 0;
        self.landed = 0;
        self.difficulty = Difficulty::default();

        self.timebar.reset(&mut self.stage);

        self.scene.toggle_title(false);
        self.scene.toggle_title_sprites(&mut self.stage, false);
        self.timebar.set_visible(true);
        self.scene.hud.player_info_visible = true;
        self.scene.hud.score_text = format_score(self.score);
        self.scene.animate_clouds(&mut self.stage);

        info!(nickname = %self.player.nickname, "New game");
        self.prepare_new_round();
    }

    pub fn prepare_new_round(&mut self) {
        self.to_fetch = 0;
        self.landed = 0;
        self.round += 1;
        self.phase = Phase::GetReady;
        self.scene.show_message(Message::GetReady);
        self.scene.hud.round_text = round_label(self.round);
        self.scene.toggle_scrolling_scenery(&mut self.stage, true);
        self.shooting_enabled = false;
        self.sight.hide();
        self.scene.dog.show_running(&mut self.stage);
        self.clear_sprites();
    }

    pub fn start_round(&mut self) {
        self.round_start.arm(
            &mut self.stage.scheduler,
            self.config.round_start_delay_ms,
            Tick::Round(RoundTick::StartRound),
        );
    }

    fn launch_round(&mut self) {
        self.phase = Phase::Playing;
        self.shooting_enabled = true;
        self.sight.show();
        self.scene.dog.hide(&mut self.stage);
        self.scene.hide_message();
        self.scene.toggle_scrolling_scenery(&mut self.stage, false);

        self.difficulty.adjust(self.round, &self.features);
        self.sprites_in_round = self.difficulty.sprites;
        info!(
            round = self.round,
            sprites = self.sprites_in_round,
            timer_factor = self.difficulty.timer_factor,
            "Round started"
        );
        self.launch_sprites(self.sprites_in_round, self.difficulty.flight_factor as f32);

        if self.timebar.start(&mut self.stage, self.difficulty.timer_factor) {
            self.times_up();
        }
    }

    fn launch_sprites(&mut self, count: u32, speed_factor: f32) {
        publish_or_warn(self.relay.as_mut(), PlayerMessage::LaunchSprites { count });
        for _ in 0..count {
            let mut sprite =
                ShootableSprite::new(&mut self.stage, self.sound_set, self.features.hits_to_kill);
            sprite.launch(&mut self.stage, speed_factor);
            self.live.insert(sprite.id(), sprite);
        }
    }

    /// Cancel and drop every sprite on the field.
    fn clear_sprites(&mut self) {
        for sprite in self.live.values_mut().chain(self.departing.values_mut()) {
            sprite.remove(&mut self.stage);
        }
        self.live.clear();
        self.departing.clear();
    }

    // ---- input ---------------------------------------------------------

    pub fn aim(&mut self, x: f32, y: f32) {
        if self.shooting_enabled {
            self.sight.aim(x, y);
        }
    }

    /// Fire at a point, hitting the topmost live sprite under it.
    pub fn shoot_at(&mut self, x: f32, y: f32) -> Option<SpriteEvent> {
        if !self.shooting_enabled {
            return None;
        }
        self.sight.shoot(&mut self.stage, x, y);
        let target = self
            .live
            .values()
            .rev()
            .find(|s| s.is_clickable() && s.sprite().contains(x, y))
            .map(ShootableSprite::id)?;
        self.shoot_sprite(target)
    }

    /// Shoot a specific live sprite.
    pub fn shoot_sprite(&mut self, id: SpriteId) -> Option<SpriteEvent> {
        if !self.shooting_enabled {
            return None;
        }
        let event = self.live.get_mut(&id)?.shoot(&mut self.stage)?;
        self.handle_sprite_event(event);
        Some(event)
    }

    // ---- sprite events -------------------------------------------------

    fn handle_sprite_event(&mut self, event: SpriteEvent) {
        match event {
            SpriteEvent::Hit(_) => publish_or_warn(self.relay.as_mut(), PlayerMessage::Hit),
            SpriteEvent::Killed(id) => self.on_killed(id),
            SpriteEvent::Landed(id) => self.on_landed(id),
            SpriteEvent::FlewAway(id) => {
                if let Some(mut sprite) = self.departing.remove(&id) {
                    sprite.remove(&mut self.stage);
                }
            },
        }
    }

    fn on_killed(&mut self, id: SpriteId) {
        let Some(sprite) = self.live.remove(&id) else {
            return;
        };
        self.departing.insert(id, sprite);

        if self.round > 1 {
            self.timebar.add(self.difficulty.time_reward);
        }
        self.score += 1;
        self.scene.hud.score_text = format_score(self.score);
        publish_or_warn(self.relay.as_mut(), PlayerMessage::Kill);
        debug!(score = self.score, live = self.live.len(), "Sprite killed");

        if self.live.is_empty() {
            if !self.timebar.times_up() {
                self.timebar.pause(&mut self.stage);
            }
        } else if self.live.len() == 1
            && self.features.last_sprite_goes_crazy
            && let Some(last) = self.live.values_mut().next()
        {
            last.panic(&mut self.stage);
        }
    }

    fn on_landed(&mut self, id: SpriteId) {
        let Some(mut sprite) = self.departing.remove(&id) else {
            return;
        };
        self.last_landed_x = sprite.sprite().x;
        sprite.remove(&mut self.stage);
        self.landed += 1;
        self.to_fetch += 1;
        debug!(landed = self.landed, of = self.sprites_in_round, "Sprite landed");

        if !self.scene.dog.is_fetching() && !self.timebar.times_up() && !self.fetch.is_armed() {
            self.fetch.arm(
                &mut self.stage.scheduler,
                self.config.fetch_debounce_ms,
                Tick::Round(RoundTick::Fetch),
            );
        }
    }

    fn fetch_landed(&mut self) {
        if self.scene.dog.is_fetching() || self.timebar.times_up() {
            return;
        }
        let count = self.to_fetch;
        if self
            .scene
            .dog
            .fetch_sprites_at(&mut self.stage, count, self.last_landed_x)
        {
            self.fetch_complete();
        }
    }

    fn fetch_complete(&mut self) {
        self.to_fetch = 0;
        if self.phase == Phase::Playing
            && self.landed == self.sprites_in_round
            && !self.next_round.is_armed()
        {
            self.next_round.arm(
                &mut self.stage.scheduler,
                self.config.next_round_delay_ms,
                Tick::Round(RoundTick::NextRound),
            );
        }
    }

    fn times_up(&mut self) {
        if self.phase == Phase::GameOver {
            return;
        }
        self.phase = Phase::GameOver;
        self.scene.show_message(Message::FlyAway);
        self.scene.stop_clouds();
        self.scene.dog.reset(&mut self.stage);
        self.shooting_enabled = false;
        self.sight.hide();
        self.timebar.pause(&mut self.stage);
        for slot in [&mut self.fetch, &mut self.next_round, &mut self.round_start] {
            slot.cancel(&mut self.stage.scheduler);
        }

        if let Some((bgm, handle)) = self.bgm.take() {
            self.stage.sounds.stop(bgm, handle);
        }
        self.stage.sounds.play(self.music.fly_away);

        let flying = std::mem::take(&mut self.live);
        for (id, mut sprite) in flying {
            sprite.fly_away(&mut self.stage);
            self.departing.insert(id, sprite);
        }

        publish_or_warn(self.relay.as_mut(), PlayerMessage::GameOver);
        info!(
            nickname = %self.player.nickname,
            score = self.score,
            round = self.round,
            "Game over"
        );

        self.game_over.arm(
            &mut self.stage.scheduler,
            self.config.game_over_message_delay_ms,
            Tick::Round(RoundTick::GameOverMessage),
        );
    }

    // ---- features ------------------------------------------------------

    /// Apply a live feature change. Counts and multipliers take effect at
    /// the next round; theme and sound changes apply now.
    pub fn apply_feature_change(&mut self, change: &FeatureChange) {
        if !self.features.apply(change) {
            return;
        }
        match change {
            FeatureChange::GameTheme(theme) => {
                self.sound_set = SoundSet::for_theme(*theme);
                self.music = Music::for_theme(*theme);
                self.scene.set_title_sprite_sounds(self.sound_set);
                info!(?theme, "Game theme changed");
            },
            FeatureChange::SoundEnabled(enabled) => {
                self.stage.sounds.mute_all(!enabled);
            },
            _ => debug!(?change, "Feature changed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::Screen;
    use crate::test_helpers::{RecordingRelay, recording_stage};
    use crate::timebar::TimebarState;
    use duckly_core::test_helpers::{make_player_info, quiet_features};

    fn controller(sprites: u32, hits: u32) -> (RoundController, RecordingRelay) {
        let (stage, _) = recording_stage(Screen::default(), 7);
        let relay = RecordingRelay::default();
        let game = RoundController::new(
            stage,
            quiet_features(sprites, hits),
            HuntConfig::default(),
            Box::new(relay.clone()),
            make_player_info("pintail", 0),
        );
        (game, relay)
    }

    /// Enter, start, and run until the first round's sprites are flying.
    fn playing(sprites: u32, hits: u32) -> (RoundController, RecordingRelay) {
        let (mut game, relay) = controller(sprites, hits);
        assert!(game.enter());
        game.advance(0);
        assert!(game.start());
        game.advance(2500);
        assert_eq!(game.phase(), Phase::Playing);
        (game, relay)
    }

    #[test]
    fn enter_shows_title_then_waits_for_start() {
        let (mut game, relay) = controller(5, 1);
        assert!(!game.start());
        assert!(game.enter());
        assert_eq!(game.phase(), Phase::Intro);
        assert!(game.hud().title_visible);
        assert_eq!(game.hud().player_name, "PINTAIL");
        assert_eq!(relay.entered().len(), 1);
        game.advance(0);
        assert_eq!(game.phase(), Phase::AwaitingStart);
        assert_eq!(game.hud().message, Some(Message::ClickHere));
    }

    #[test]
    fn failed_presence_stays_in_lobby() {
        let (stage, _) = recording_stage(Screen::default(), 7);
        let relay = RecordingRelay::refusing();
        let mut game = RoundController::new(
            stage,
            quiet_features(5, 1),
            HuntConfig::default(),
            Box::new(relay.clone()),
            make_player_info("pintail", 0),
        );
        assert!(!game.enter());
        game.advance(10_000);
        assert_eq!(game.phase(), Phase::Lobby);
        assert!(!game.start());
        assert!(!game.hud().title_visible);
        assert!(relay.entered().is_empty());
        assert!(relay.published().is_empty());
    }

    #[test]
    fn round_one_launches_base_count() {
        let (game, relay) = playing(5, 1);
        assert_eq!(game.round(), 1);
        assert_eq!(game.live_count(), 5);
        assert!(game.shooting_enabled());
        assert!(!game.hud().title_visible);
        assert_eq!(game.hud().round_text, "R=1");
        assert_eq!(
            relay.published(),
            vec![PlayerMessage::LaunchSprites { count: 5 }]
        );
    }

    #[test]
    fn shooting_disabled_during_get_ready() {
        let (mut game, _) = controller(2, 1);
        assert!(game.enter());
        game.advance(0);
        game.start();
        game.advance(1000);
        assert_eq!(game.phase(), Phase::GetReady);
        assert!(game.shoot_at(10.0, 10.0).is_none());
        assert_eq!(game.live_count(), 0);
    }

    #[test]
    fn kill_scores_and_publishes() {
        let (mut game, relay) = playing(3, 1);
        let id = game.live_ids()[0];
        assert_eq!(game.shoot_sprite(id), Some(SpriteEvent::Killed(id)));
        assert_eq!(game.score(), 1);
        assert_eq!(game.hud().score_text, "0001");
        assert_eq!(game.live_count(), 2);
        assert_eq!(game.departing_count(), 1);
        assert_eq!(game.shoot_sprite(id), None);
        assert_eq!(game.score(), 1);
        assert_eq!(relay.count(&PlayerMessage::Kill), 1);
    }

    #[test]
    fn non_lethal_hit_publishes_hit() {
        let (mut game, relay) = playing(2, 2);
        let id = game.live_ids()[0];
        assert_eq!(game.shoot_sprite(id), Some(SpriteEvent::Hit(id)));
        assert_eq!(game.score(), 0);
        assert_eq!(game.live_count(), 2);
        assert_eq!(relay.count(&PlayerMessage::Hit), 1);
    }

    #[test]
    fn shoot_at_hits_sprite_under_pointer() {
        let (mut game, _) = playing(1, 1);
        let id = game.live_ids()[0];
        let (x, y) = game.sprite(id).unwrap().sprite().rendered_position();
        assert!(game.shoot_at(x - 500.0, y - 500.0).is_none());
        assert_eq!(game.shoot_at(x + 10.0, y + 10.0), Some(SpriteEvent::Killed(id)));
    }

    #[test]
    fn clearing_round_advances_after_fetch() {
        let (mut game, _) = playing(2, 1);
        for id in game.live_ids() {
            game.shoot_sprite(id);
        }
        assert_eq!(game.timebar().state(), TimebarState::Idle);
        // Fall, debounce, fetch, then the next-round pause.
        game.advance(5_000);
        assert_eq!(game.landed(), 0);
        assert_eq!(game.round(), 2);
        assert_eq!(game.phase(), Phase::GetReady);
        game.advance(2500);
        // base 2 + ⌊1.5 × 2⌋
        assert_eq!(game.live_count(), 5);
        assert_eq!(game.sprites_in_round(), 5);
    }

    #[test]
    fn landed_sprites_are_counted_for_fetch() {
        let (mut game, _) = playing(3, 1);
        let id = game.live_ids()[0];
        game.shoot_sprite(id);
        while game.landed() == 0 {
            game.step();
        }
        assert_eq!(game.pending_fetch(), 1);
        assert_eq!(game.departing_count(), 0);
        assert!(game.sprite(id).is_none());
    }

    #[test]
    fn times_up_flies_everything_away_once() {
        let (mut game, relay) = playing(2, 1);
        game.advance(60_000);
        assert_eq!(relay.count(&PlayerMessage::GameOver), 1);
        assert!(!game.shooting_enabled());
        assert!(game.timebar().times_up());
        assert_eq!(game.live_count(), 0);
    }

    #[test]
    fn game_over_returns_to_title() {
        let (mut game, relay) = playing(1, 1);
        game.advance(40_000);
        assert_eq!(game.phase(), Phase::AwaitingStart);
        assert!(game.hud().title_visible);
        assert!(!game.timebar().is_visible());
        assert!(game.start());
        assert_eq!(game.score(), 0);
        assert_eq!(game.round(), 1);
        assert_eq!(game.timebar().position(), crate::timebar::TIMEBAR_START);
        assert_eq!(relay.count(&PlayerMessage::GameOver), 1);
    }

    #[test]
    fn sound_flag_mutes_everything() {
        let (stage, log) = recording_stage(Screen::default(), 7);
        let mut game = RoundController::new(
            stage,
            GameFeatures::default(),
            HuntConfig::default(),
            Box::new(RecordingRelay::default()),
            make_player_info("pintail", 0),
        );
        assert!(!log.borrow().is_muted(Sound::Bgm));
        game.apply_feature_change(&FeatureChange::SoundEnabled(false));
        assert!(log.borrow().is_muted(Sound::Bgm));
        assert!(log.borrow().is_muted(Sound::SpacePanic));
    }

    #[test]
    fn theme_change_swaps_sounds_for_new_sprites() {
        let (mut game, _) = controller(1, 1);
        game.apply_feature_change(&FeatureChange::GameTheme(
            duckly_core::features::GameTheme::Space,
        ));
        assert!(game.enter());
        game.advance(0);
        game.start();
        game.advance(2500);
        let id = game.live_ids()[0];
        assert_eq!(game.sprite(id).unwrap().sounds().hit, Sound::SpaceHit);
    }

    #[test]
    fn sprite_count_change_applies_next_round() {
        let (mut game, _) = playing(2, 1);
        game.apply_feature_change(&FeatureChange::SpritesToLaunch(4));
        assert_eq!(game.live_count(), 2);
        for id in game.live_ids() {
            game.shoot_sprite(id);
        }
        game.advance(7_500);
        assert_eq!(game.round(), 2);
        assert_eq!(game.live_count(), 4 + 3);
    }
}
