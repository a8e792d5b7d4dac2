//! The shootable sprite state machine.
//!
//! ```text
//! Flying --shoot (lethal)--> Hit --500ms--> Falling --ground--> Landed
//! Flying --fly_away--> FlyingAway --7 frames--> FlewAway
//! ```
//!
//! A non-lethal shot keeps the sprite flying and only flashes it. All
//! outward effects are returned as [`SpriteEvent`]s for the owner to act on;
//! the sprite never touches round state.

use rand::Rng;
use tracing::debug;

use duckly_core::player::PlayerColor;

use crate::schedule::{TimerId, TimerSlot};
use crate::sound::{SoundHandle, SoundSet};
use crate::sprite::{Animate, Sprite, SpriteId};
use crate::stage::{Stage, SpriteTick, Tick};

pub const SPRITE_SIZE: f32 = 102.0;
/// Sheet x offsets of the three colour variants.
pub const COLOR_OFFSETS: [f32; 3] = [0.0, -306.0, -612.0];
pub const DEFAULT_SPEED: f32 = 5.0;
pub const PANIC_FACTOR: f32 = 1.5;

const FLY_FRAMES: [i32; 4] = [0, 1, 2, 1];
const FALL_FRAMES: [i32; 2] = [1, 2];
const ANIMATION_DELAY_MS: u64 = 90;
const FLY_TICK_MS: u64 = 16;
const FALL_TICK_MS: u64 = 40;
const FALL_DELAY_MS: u64 = 500;
const HIT_FLASH_MS: u64 = 1000;
const FLY_AWAY_FRAME_MS: u64 = 200;
const FLY_AWAY_FRAMES: u32 = 7;
/// Distance above the bottom edge where a falling sprite lands.
const LANDING_MARGIN: f32 = 200.0;
const REROLL_AFTER: u32 = 150;
const COUNTER_START: u32 = 140;

/// Sheet row of each pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pose {
    FlyNorth,
    FlyNorthEast,
    FlyEastPose1,
    FlySouthEast,
    FlySouth,
    FlySouthWest,
    FlyWest,
    FlyNorthWest,
    Hit,
    Falling,
    FlyEastPose2,
    FlyAway,
}

impl Pose {
    pub fn row(self) -> f32 {
        match self {
            Pose::FlyNorth => 0.0,
            Pose::FlyNorthEast => 102.0,
            Pose::FlyEastPose1 => 204.0,
            Pose::FlySouthEast => 306.0,
            Pose::FlySouth => 408.0,
            Pose::FlySouthWest => 510.0,
            Pose::FlyWest => 612.0,
            Pose::FlyNorthWest => 714.0,
            Pose::Hit => 816.0,
            Pose::Falling => 918.0,
            Pose::FlyEastPose2 => 1020.0,
            Pose::FlyAway => 1122.0,
        }
    }

    /// Compass pose for a flight direction.
    pub fn for_direction(sx: f32, sy: f32) -> Self {
        let north = sy == -1.0;
        let south = sy == 1.0;
        if sx > 0.0 {
            if north {
                Pose::FlyNorthEast
            } else if south {
                Pose::FlySouthEast
            } else {
                Pose::FlyEastPose1
            }
        } else if sx < 0.0 {
            if north {
                Pose::FlyNorthWest
            } else if south {
                Pose::FlySouthWest
            } else {
                Pose::FlyWest
            }
        } else if north {
            Pose::FlyNorth
        } else if south {
            Pose::FlySouth
        } else {
            Pose::FlyEastPose2
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeState {
    Flying,
    /// Killed, showing the hit pose before the fall.
    Hit,
    Falling,
    Landed,
    FlyingAway,
    FlewAway,
}

impl LifeState {
    pub fn is_terminal(self) -> bool {
        matches!(self, LifeState::Landed | LifeState::FlewAway)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteEvent {
    Hit(SpriteId),
    Killed(SpriteId),
    Landed(SpriteId),
    FlewAway(SpriteId),
}

/// Name badge shown under kiosk sprites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoTag {
    pub text: String,
    pub color: PlayerColor,
}

/// Random direction component: sign, then maybe zero, then maybe halved.
pub fn roll_sensitivity<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    let mut r: f32 = if rng.random_bool(0.5) { -1.0 } else { 1.0 };
    if rng.random_bool(0.2) {
        r = 0.0;
    }
    if rng.random_bool(0.4) {
        r *= 0.5;
    }
    r
}

#[derive(Debug)]
pub struct ShootableSprite {
    sprite: Sprite,
    state: LifeState,
    hits_to_kill: u32,
    hit_count: u32,
    invincible: bool,
    speed: f32,
    flight_multiplier: f32,
    sensitivity: (f32, f32),
    fly_counter: u32,
    motion: TimerSlot,
    hit_flash: TimerSlot,
    fly_away_frame: u32,
    color: usize,
    sounds: SoundSet,
    info_tag: Option<InfoTag>,
    blinking: bool,
    clickable: bool,
    panic_sound: Option<SoundHandle>,
    pose: Pose,
}

impl ShootableSprite {
    /// New sprite near the bottom of the screen with a random colour.
    pub fn new(stage: &mut Stage, sounds: SoundSet, hits_to_kill: u32) -> Self {
        let x = stage.rng.random_range(0..=1000) as f32;
        let y = stage.screen.height - 250.0;
        let color = stage.rng.random_range(0..COLOR_OFFSETS.len());
        let mut sprite = Sprite::new(SPRITE_SIZE, SPRITE_SIZE, x, y);
        sprite.set_frames(&FLY_FRAMES);
        sprite.animation_delay_ms = ANIMATION_DELAY_MS;
        sprite.pose = Pose::FlyEastPose2.row() as i32;
        Self {
            sprite,
            state: LifeState::Flying,
            hits_to_kill: hits_to_kill.max(1),
            hit_count: 0,
            invincible: false,
            speed: DEFAULT_SPEED,
            flight_multiplier: 1.0,
            sensitivity: (0.0, 0.0),
            fly_counter: COUNTER_START,
            motion: TimerSlot::default(),
            hit_flash: TimerSlot::default(),
            fly_away_frame: 0,
            color,
            sounds,
            info_tag: None,
            blinking: false,
            clickable: true,
            panic_sound: None,
            pose: Pose::FlyEastPose2,
        }
    }

    pub fn id(&self) -> SpriteId {
        self.sprite.id
    }

    pub fn state(&self) -> LifeState {
        self.state
    }

    pub fn hit_count(&self) -> u32 {
        self.hit_count
    }

    pub fn hits_to_kill(&self) -> u32 {
        self.hits_to_kill
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible
    }

    pub fn set_invincible(&mut self, invincible: bool) {
        self.invincible = invincible;
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn sensitivity(&self) -> (f32, f32) {
        self.sensitivity
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn color_offset(&self) -> f32 {
        COLOR_OFFSETS[self.color]
    }

    pub fn is_blinking(&self) -> bool {
        self.blinking
    }

    pub fn is_clickable(&self) -> bool {
        self.clickable
    }

    pub fn is_panicking(&self) -> bool {
        self.panic_sound.is_some()
    }

    pub fn is_flying(&self) -> bool {
        self.motion.is_armed() && self.state == LifeState::Flying
    }

    pub fn sounds(&self) -> SoundSet {
        self.sounds
    }

    pub fn set_sounds(&mut self, sounds: SoundSet) {
        self.sounds = sounds;
    }

    pub fn info_tag(&self) -> Option<&InfoTag> {
        self.info_tag.as_ref()
    }

    pub fn show_info_tag(&mut self, text: &str, color: PlayerColor) {
        self.info_tag = Some(InfoTag {
            text: text.to_string(),
            color,
        });
    }

    pub fn hide_info_tag(&mut self) {
        self.info_tag = None;
    }

    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
        self.sprite.pose = pose.row() as i32;
    }

    /// Place the sprite, bypassing flight rules.
    pub fn move_to(&mut self, x: f32, y: f32) {
        self.sprite.move_to(x, y);
    }

    pub fn show(&mut self) {
        self.sprite.show();
    }

    pub fn hide(&mut self) {
        self.sprite.hide();
    }

    /// Show, animate and start flying.
    pub fn launch(&mut self, stage: &mut Stage, speed_multiplier: f32) {
        self.show();
        self.start_animating(stage);
        self.fly_around(stage, speed_multiplier);
    }

    pub fn fly_around(&mut self, stage: &mut Stage, speed_multiplier: f32) {
        if self.state != LifeState::Flying {
            return;
        }
        self.flight_multiplier = speed_multiplier;
        let tick = Tick::Sprite(self.id(), SpriteTick::Fly);
        self.motion.arm(&mut stage.scheduler, FLY_TICK_MS, tick);
    }

    pub fn stop_flying(&mut self, stage: &mut Stage) {
        self.motion.cancel(&mut stage.scheduler);
        self.speed = DEFAULT_SPEED;
    }

    /// Register a shot. Invincible or departing sprites ignore it.
    pub fn shoot(&mut self, stage: &mut Stage) -> Option<SpriteEvent> {
        if self.invincible || self.state != LifeState::Flying {
            return None;
        }
        self.hit_count += 1;
        if self.hit_count >= self.hits_to_kill {
            Some(self.killed(stage))
        } else {
            Some(self.wounded(stage))
        }
    }

    /// Show a hit scored elsewhere. Never lethal: the hit count stops one
    /// short of `hits_to_kill`, so only `kill` brings the sprite down.
    pub fn flash(&mut self, stage: &mut Stage) -> Option<SpriteEvent> {
        if self.invincible || self.state != LifeState::Flying {
            return None;
        }
        self.hit_count = (self.hit_count + 1).min(self.hits_to_kill - 1);
        Some(self.wounded(stage))
    }

    fn wounded(&mut self, stage: &mut Stage) -> SpriteEvent {
        stage.sounds.play(self.sounds.hit);
        self.blinking = true;
        let tick = Tick::Sprite(self.id(), SpriteTick::HitFlashEnd);
        self.hit_flash.arm(&mut stage.scheduler, HIT_FLASH_MS, tick);
        debug!(sprite = self.id().raw(), hits = self.hit_count, "Sprite hit");
        SpriteEvent::Hit(self.id())
    }

    /// Force the lethal branch, mirroring a kill made elsewhere.
    pub fn kill(&mut self, stage: &mut Stage) -> Option<SpriteEvent> {
        if self.invincible || self.state != LifeState::Flying {
            return None;
        }
        self.hit_count = self.hits_to_kill;
        Some(self.killed(stage))
    }

    fn killed(&mut self, stage: &mut Stage) -> SpriteEvent {
        self.invincible = true;
        self.blinking = false;
        self.hit_flash.cancel(&mut stage.scheduler);
        self.clickable = false;
        self.state = LifeState::Hit;

        self.stop_panic_sound(stage);
        stage.sounds.play(self.sounds.killed);

        self.stop_flying(stage);
        self.sprite.frame = 0;
        self.set_pose(Pose::Hit);

        let tick = Tick::Sprite(self.id(), SpriteTick::StartFall);
        self.motion.arm(&mut stage.scheduler, FALL_DELAY_MS, tick);
        debug!(sprite = self.id().raw(), "Sprite killed");
        SpriteEvent::Killed(self.id())
    }

    fn fall_to_the_ground(&mut self, stage: &mut Stage) {
        self.state = LifeState::Falling;
        self.sprite.set_frames(&FALL_FRAMES);
        self.set_pose(Pose::Falling);
        self.sensitivity = (0.0, 1.0);
        self.start_animating(stage);
        stage.sounds.play(self.sounds.falling);
        let tick = Tick::Sprite(self.id(), SpriteTick::Fall);
        self.motion.arm(&mut stage.scheduler, FALL_TICK_MS, tick);
    }

    /// Leave the screen. Only a flying sprite can fly away.
    pub fn fly_away(&mut self, stage: &mut Stage) -> bool {
        if self.state != LifeState::Flying {
            return false;
        }
        self.stop_flying(stage);
        self.stop_animating(stage);
        self.hit_flash.cancel(&mut stage.scheduler);
        self.blinking = false;
        self.stop_panic_sound(stage);
        self.sensitivity = (0.0, 0.0);
        self.clickable = false;
        self.state = LifeState::FlyingAway;
        self.fly_away_frame = 0;
        let tick = Tick::Sprite(self.id(), SpriteTick::FlyAwayFrame);
        self.motion.arm(&mut stage.scheduler, FLY_AWAY_FRAME_MS, tick);
        true
    }

    /// Speed up and start the looping alarm.
    pub fn panic(&mut self, stage: &mut Stage) {
        if self.state != LifeState::Flying {
            return;
        }
        self.speed *= PANIC_FACTOR;
        self.stop_panic_sound(stage);
        self.panic_sound = Some(stage.sounds.loop_sound(self.sounds.panic));
        debug!(sprite = self.id().raw(), speed = self.speed, "Sprite panicking");
    }

    pub fn stop_panic_sound(&mut self, stage: &mut Stage) {
        if let Some(handle) = self.panic_sound.take() {
            stage.sounds.stop(self.sounds.panic, handle);
        }
    }

    /// Take the sprite off the stage, cancelling everything it scheduled.
    pub fn remove(&mut self, stage: &mut Stage) {
        self.stop_animating(stage);
        self.motion.cancel(&mut stage.scheduler);
        self.hit_flash.cancel(&mut stage.scheduler);
        self.stop_panic_sound(stage);
        self.hide();
    }

    /// Handle one of this sprite's timers.
    pub fn on_tick(&mut self, stage: &mut Stage, id: TimerId, tick: SpriteTick) -> Option<SpriteEvent> {
        match tick {
            SpriteTick::Animate => {
                self.on_animation_tick(stage, id);
                None
            },
            SpriteTick::HitFlashEnd => {
                if self.hit_flash.fire(id) {
                    self.blinking = false;
                }
                None
            },
            SpriteTick::Fly => {
                if self.motion.fire(id) && self.state == LifeState::Flying {
                    self.fly_step(stage);
                    self.fly_around(stage, self.flight_multiplier);
                }
                None
            },
            SpriteTick::StartFall => {
                if self.motion.fire(id) && self.state == LifeState::Hit {
                    self.stop_animating(stage);
                    self.fall_to_the_ground(stage);
                }
                None
            },
            SpriteTick::Fall => {
                if !self.motion.fire(id) || self.state != LifeState::Falling {
                    return None;
                }
                if self.sprite.y > stage.screen.height - LANDING_MARGIN {
                    stage.sounds.play(self.sounds.landed);
                    self.hide();
                    self.stop_animating(stage);
                    self.state = LifeState::Landed;
                    debug!(sprite = self.id().raw(), "Sprite landed");
                    return Some(SpriteEvent::Landed(self.id()));
                }
                self.step(stage, 2.0);
                let tick = Tick::Sprite(self.id(), SpriteTick::Fall);
                self.motion.arm(&mut stage.scheduler, FALL_TICK_MS, tick);
                None
            },
            SpriteTick::FlyAwayFrame => {
                if !self.motion.fire(id) || self.state != LifeState::FlyingAway {
                    return None;
                }
                let x = self.fly_away_frame as f32 * -self.sprite.width;
                self.sprite.place_background(x, Pose::FlyAway.row());
                self.fly_away_frame += 1;
                if self.fly_away_frame >= FLY_AWAY_FRAMES {
                    self.hide();
                    self.state = LifeState::FlewAway;
                    debug!(sprite = self.id().raw(), "Sprite flew away");
                    return Some(SpriteEvent::FlewAway(self.id()));
                }
                let tick = Tick::Sprite(self.id(), SpriteTick::FlyAwayFrame);
                self.motion.arm(&mut stage.scheduler, FLY_AWAY_FRAME_MS, tick);
                None
            },
        }
    }

    fn fly_step(&mut self, stage: &mut Stage) {
        self.step(stage, self.flight_multiplier);
        self.fly_counter += 1;
        if self.fly_counter > REROLL_AFTER {
            let sx = roll_sensitivity(&mut stage.rng);
            let sy = roll_sensitivity(&mut stage.rng);
            self.sensitivity = (sx, sy);
            self.fly_counter = stage.rng.random_range(0..=COUNTER_START);
            self.set_pose(Pose::for_direction(sx, sy));
        }
    }

    fn step(&mut self, stage: &Stage, multiplier: f32) {
        let distance = self.speed * multiplier;
        let (sx, sy) = self.sensitivity;
        let (width, height) = (stage.screen.width, stage.screen.height);
        let h = self.sprite.height;
        let mut x = self.sprite.x + sx * distance;
        let mut y = self.sprite.y + sy * distance;

        if (y - 30.0) + h < 0.0 {
            y = -140.0 + height - h;
        }
        if (y + 140.0) + h > height && self.state != LifeState::Falling {
            y = -h + 30.0;
        }
        if x < -50.0 {
            x = width - 50.0;
        }
        if x + 50.0 > width {
            x = -50.0;
        }
        self.sprite.move_to(x, y);
    }
}

impl Animate for ShootableSprite {
    fn sprite(&self) -> &Sprite {
        &self.sprite
    }

    fn sprite_mut(&mut self) -> &mut Sprite {
        &mut self.sprite
    }

    fn animation_tick(&self) -> Tick {
        Tick::Sprite(self.id(), SpriteTick::Animate)
    }

    fn animate_frame(&mut self) {
        let column = self.sprite.next_frame();
        let x = self.sprite.width * -(column as f32) + self.color_offset();
        let y = self.pose.row();
        self.sprite.place_background(x, y);
    }
}
