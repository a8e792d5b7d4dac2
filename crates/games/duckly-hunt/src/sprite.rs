use std::sync::atomic::{AtomicU64, Ordering};

use crate::schedule::{TimerId, TimerSlot};
use crate::stage::{Stage, Tick};

static NEXT_SPRITE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique sprite identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteId(u64);

impl SpriteId {
    pub fn next() -> Self {
        Self(NEXT_SPRITE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Position, size and sheet state shared by every on-screen entity.
///
/// `x`/`y` are the logical position. The rendered position only follows
/// while movement is enabled, so a paused sprite stays put on screen even
/// if its owner keeps updating the logical values.
#[derive(Debug, Clone)]
pub struct Sprite {
    pub id: SpriteId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Sheet columns to cycle through.
    pub frames: Vec<i32>,
    /// Index into `frames` of the next frame to draw.
    pub frame: usize,
    /// Sheet row offset of the current pose.
    pub pose: i32,
    pub animation_delay_ms: u64,
    pub animation: TimerSlot,
    rendered: (f32, f32),
    background: (f32, f32),
    movement_enabled: bool,
    visible: bool,
}

impl Sprite {
    pub fn new(width: f32, height: f32, x: f32, y: f32) -> Self {
        Self {
            id: SpriteId::next(),
            x,
            y,
            width,
            height,
            frames: vec![0],
            frame: 0,
            pose: 0,
            animation_delay_ms: 0,
            animation: TimerSlot::default(),
            rendered: (x, y),
            background: (0.0, 0.0),
            movement_enabled: true,
            visible: false,
        }
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        if self.movement_enabled {
            self.x = x;
            self.y = y;
            self.rendered = (x, y);
        }
    }

    pub fn set_movement_enabled(&mut self, enabled: bool) {
        self.movement_enabled = enabled;
    }

    pub fn movement_enabled(&self) -> bool {
        self.movement_enabled
    }

    pub fn rendered_position(&self) -> (f32, f32) {
        self.rendered
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn place_background(&mut self, x: f32, y: f32) {
        self.background = (x, y);
    }

    /// Sheet offset currently shown.
    pub fn background(&self) -> (f32, f32) {
        self.background
    }

    pub fn set_size(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// Replace the frame cycle and restart it from the first frame.
    pub fn set_frames(&mut self, frames: &[i32]) {
        self.frames = frames.to_vec();
        self.frame = 0;
    }

    /// Current sheet column, advancing the cycle.
    pub fn next_frame(&mut self) -> i32 {
        let column = self.frames.get(self.frame).copied().unwrap_or(0);
        self.frame += 1;
        if self.frame >= self.frames.len() {
            self.frame = 0;
        }
        column
    }

    /// Hit test against the rendered rectangle.
    pub fn contains(&self, px: f32, py: f32) -> bool {
        let (x, y) = self.rendered;
        self.visible && px >= x && px < x + self.width && py >= y && py < y + self.height
    }
}

/// Capability shared by everything with a looping frame cycle.
pub trait Animate {
    fn sprite(&self) -> &Sprite;
    fn sprite_mut(&mut self) -> &mut Sprite;
    /// Tick that drives this entity's frame step.
    fn animation_tick(&self) -> Tick;
    /// Draw one frame of the cycle.
    fn animate_frame(&mut self);

    fn start_animating(&mut self, stage: &mut Stage) {
        let tick = self.animation_tick();
        let sprite = self.sprite_mut();
        let delay = sprite.animation_delay_ms;
        sprite.animation.arm(&mut stage.scheduler, delay, tick);
    }

    fn stop_animating(&mut self, stage: &mut Stage) {
        self.sprite_mut().animation.cancel(&mut stage.scheduler);
    }

    fn is_animating(&self) -> bool {
        self.sprite().animation.is_armed()
    }

    /// Handle a fired animation timer. Stale timers are ignored.
    fn on_animation_tick(&mut self, stage: &mut Stage, id: TimerId) -> bool {
        if !self.sprite_mut().animation.fire(id) {
            return false;
        }
        self.animate_frame();
        self.start_animating(stage);
        true
    }
}
