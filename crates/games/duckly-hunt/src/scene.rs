//! Scenery shared by the player and kiosk games: clouds, the dog, the
//! title-screen sprites, the scrolling backdrop and the HUD view model.

use crate::cloud::Cloud;
use crate::dog::Dog;
use crate::schedule::{TimerId, TimerSlot};
use crate::shootable::{Pose, ShootableSprite};
use crate::sound::SoundSet;
use crate::sprite::{Animate, SpriteId};
use crate::stage::{Stage, SpriteTick, Tick};

const SCENERY_TICK_MS: u64 = 16;
const SCENERY_STEP: f32 = 3.0;
const SCENERY_WIDTH: f32 = 1736.0;
const TITLE_SPRITE_COUNT: usize = 3;
/// The first title sprite flaps faster than the others.
const TITLE_LEAD_DELAY_MS: u64 = 40;

/// Banner messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    GetReady,
    FlyAway,
    GameOver,
    ClickHere,
}

impl Message {
    /// Row in the messages sheet.
    pub fn sheet_offset(self) -> i32 {
        match self {
            Message::GetReady => 0,
            Message::GameOver => -189,
            Message::FlyAway => -252,
            Message::ClickHere => -309,
        }
    }
}

/// Score as shown on the HUD: the last four digits, zero padded.
pub fn format_score(score: u32) -> String {
    format!("{:04}", score % 10_000)
}

pub fn round_label(round: u32) -> String {
    format!("R={round}")
}

/// What the HUD shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hud {
    pub message: Option<Message>,
    pub title_visible: bool,
    pub player_info_visible: bool,
    pub player_name: String,
    pub score_text: String,
    pub round_text: String,
}

/// Result of offering a tick to the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneTick {
    NotMine,
    Handled,
    FetchComplete,
}

#[derive(Debug)]
pub struct Scene {
    pub clouds: Vec<Cloud>,
    pub dog: Dog,
    pub title_sprites: Vec<ShootableSprite>,
    pub hud: Hud,
    scenery_x: f32,
    scenery_slot: TimerSlot,
}

impl Scene {
    pub fn new(stage: &mut Stage, sounds: SoundSet) -> Self {
        let screen = stage.screen;
        let positions = [
            (150.0, screen.height - 350.0),
            (screen.width - 300.0, 50.0),
            (screen.width - 200.0, 150.0),
        ];
        let title_sprites = positions
            .iter()
            .take(TITLE_SPRITE_COUNT)
            .enumerate()
            .map(|(i, &(x, y))| {
                let mut sprite = ShootableSprite::new(stage, sounds, 1);
                sprite.set_invincible(true);
                sprite.set_pose(Pose::FlyEastPose2);
                sprite.move_to(x, y);
                if i == 0 {
                    sprite.sprite_mut().animation_delay_ms = TITLE_LEAD_DELAY_MS;
                }
                sprite
            })
            .collect();
        Self {
            clouds: Cloud::default_pair(screen),
            dog: Dog::new(),
            title_sprites,
            hud: Hud::default(),
            scenery_x: 0.0,
            scenery_slot: TimerSlot::default(),
        }
    }

    pub fn show_message(&mut self, message: Message) {
        self.hud.message = Some(message);
    }

    pub fn hide_message(&mut self) {
        self.hud.message = None;
    }

    pub fn toggle_title(&mut self, visible: bool) {
        self.hud.title_visible = visible;
    }

    pub fn animate_clouds(&mut self, stage: &mut Stage) {
        for cloud in &mut self.clouds {
            let sprite = cloud.sprite_mut();
            sprite.show();
            sprite.set_movement_enabled(true);
            cloud.start_animating(stage);
        }
    }

    /// Freeze clouds in place without hiding them.
    pub fn stop_clouds(&mut self) {
        for cloud in &mut self.clouds {
            cloud.sprite_mut().set_movement_enabled(false);
        }
    }

    pub fn hide_clouds(&mut self, stage: &mut Stage) {
        for cloud in &mut self.clouds {
            cloud.sprite_mut().hide();
            cloud.stop_animating(stage);
        }
    }

    pub fn toggle_title_sprites(&mut self, stage: &mut Stage, visible: bool) {
        for sprite in &mut self.title_sprites {
            if visible {
                sprite.start_animating(stage);
                sprite.show();
            } else {
                sprite.stop_animating(stage);
                sprite.hide();
            }
        }
    }

    pub fn set_title_sprite_sounds(&mut self, sounds: SoundSet) {
        for sprite in &mut self.title_sprites {
            sprite.set_sounds(sounds);
        }
    }

    pub fn is_scenery_scrolling(&self) -> bool {
        self.scenery_slot.is_armed()
    }

    pub fn scenery_x(&self) -> f32 {
        self.scenery_x
    }

    pub fn toggle_scrolling_scenery(&mut self, stage: &mut Stage, enabled: bool) {
        if enabled && !self.scenery_slot.is_armed() {
            self.scroll_scenery(stage);
        }
        if !enabled {
            self.scenery_slot.cancel(&mut stage.scheduler);
        }
    }

    fn scroll_scenery(&mut self, stage: &mut Stage) {
        self.scenery_x -= SCENERY_STEP;
        if self.scenery_x <= -SCENERY_WIDTH {
            self.scenery_x = 0.0;
        }
        self.scenery_slot
            .arm(&mut stage.scheduler, SCENERY_TICK_MS, Tick::Scenery);
    }

    fn title_sprite_mut(&mut self, id: SpriteId) -> Option<&mut ShootableSprite> {
        self.title_sprites.iter_mut().find(|s| s.id() == id)
    }

    /// Offer a fired tick to the scenery.
    pub fn on_tick(&mut self, stage: &mut Stage, id: TimerId, tick: Tick) -> SceneTick {
        match tick {
            Tick::Cloud(index) => {
                if let Some(cloud) = self.clouds.get_mut(index) {
                    cloud.on_animation_tick(stage, id);
                }
                SceneTick::Handled
            },
            Tick::Scenery => {
                if self.scenery_slot.fire(id) {
                    self.scroll_scenery(stage);
                }
                SceneTick::Handled
            },
            Tick::Dog(dog_tick) => {
                if self.dog.on_tick(stage, id, dog_tick) {
                    SceneTick::FetchComplete
                } else {
                    SceneTick::Handled
                }
            },
            Tick::Sprite(sprite_id, sprite_tick) => match self.title_sprite_mut(sprite_id) {
                Some(sprite) => {
                    if sprite_tick == SpriteTick::Animate {
                        sprite.on_animation_tick(stage, id);
                    }
                    SceneTick::Handled
                },
                None => SceneTick::NotMine,
            },
            Tick::Sight | Tick::Timebar | Tick::Round(_) => SceneTick::NotMine,
        }
    }
}
