use crate::sound::Sound;
use crate::sprite::{Animate, Sprite};
use crate::stage::{Stage, Tick};

pub const SIGHT_SIZE: f32 = 32.0;
const IDLE_FRAMES: [i32; 2] = [0, 1];
const FRAME_WIDTH: f32 = 33.0;
const FIRED_FRAME_X: f32 = -66.0;
const ANIMATION_DELAY_MS: u64 = 50;

/// Crosshair that follows the pointer.
#[derive(Debug)]
pub struct Sight {
    sprite: Sprite,
}

impl Default for Sight {
    fn default() -> Self {
        Self::new()
    }
}

impl Sight {
    pub fn new() -> Self {
        let mut sprite = Sprite::new(SIGHT_SIZE, SIGHT_SIZE, 0.0, 0.0);
        sprite.set_frames(&IDLE_FRAMES);
        sprite.animation_delay_ms = ANIMATION_DELAY_MS;
        Self { sprite }
    }

    /// Centre the crosshair on a point.
    pub fn aim(&mut self, x: f32, y: f32) {
        let half = SIGHT_SIZE / 2.0;
        self.sprite.move_to(x - half, y - half);
    }

    pub fn shoot(&mut self, stage: &mut Stage, x: f32, y: f32) {
        self.stop_animating(stage);
        self.aim(x, y);
        self.sprite.place_background(FIRED_FRAME_X, 0.0);
        stage.sounds.play(Sound::Shoot);
        self.start_animating(stage);
    }

    pub fn show(&mut self) {
        self.sprite.show();
    }

    pub fn hide(&mut self) {
        self.sprite.hide();
    }
}

impl Animate for Sight {
    fn sprite(&self) -> &Sprite {
        &self.sprite
    }

    fn sprite_mut(&mut self) -> &mut Sprite {
        &mut self.sprite
    }

    fn animation_tick(&self) -> Tick {
        Tick::Sight
    }

    fn animate_frame(&mut self) {
        let column = self.sprite.next_frame();
        self.sprite.place_background(column as f32 * -FRAME_WIDTH, 0.0);
    }
}
