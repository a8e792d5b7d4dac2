//! The helper dog: runs across the field between rounds and springs up to
//! fetch landed sprites.

use tracing::debug;

use crate::schedule::{TimerId, TimerSlot};
use crate::sound::Sound;
use crate::sprite::{Animate, Sprite};
use crate::stage::{DogTick, Stage, Tick};

pub const DOG_WIDTH: f32 = 90.0;
pub const DOG_HEIGHT: f32 = 150.0;
const RUNNING_ROW: f32 = 0.0;
const FETCHING_ROW: f32 = 225.0;
const RUNNING_FRAMES: [i32; 6] = [0, 1, 2, 3, 4, 5];
const ANIMATION_DELAY_MS: u64 = 70;
const FETCH_STEP_MS: u64 = 14;
const FETCH_RISE: f32 = 5.0;
/// Step at which the dog tops out (and barks when carrying several).
const FETCH_PEAK: u32 = 30;
const FETCH_HOLD_UNTIL: u32 = 90;
const FETCH_STEPS: u32 = 120;
const DISTANCE_UP_FROM_BOTTOM: f32 = 345.0;

#[derive(Debug, Clone, Copy)]
struct Fetch {
    count: u32,
    x: f32,
    y: f32,
    step: u32,
}

#[derive(Debug)]
pub struct Dog {
    sprite: Sprite,
    running: bool,
    fetch: Option<Fetch>,
    fetch_slot: TimerSlot,
}

impl Default for Dog {
    fn default() -> Self {
        Self::new()
    }
}

impl Dog {
    pub fn new() -> Self {
        let mut sprite = Sprite::new(DOG_WIDTH, DOG_HEIGHT, 0.0, 0.0);
        sprite.animation_delay_ms = ANIMATION_DELAY_MS;
        Self {
            sprite,
            running: false,
            fetch: None,
            fetch_slot: TimerSlot::default(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_fetching(&self) -> bool {
        self.fetch.is_some()
    }

    pub fn show_running(&mut self, stage: &mut Stage) {
        if self.running {
            return;
        }
        self.hide(stage);
        self.sprite.set_size(DOG_WIDTH, DOG_HEIGHT);
        self.sprite.set_frames(&RUNNING_FRAMES);
        self.sprite.pose = RUNNING_ROW as i32;
        self.start_animating(stage);
        self.sprite.show();
        self.running = true;
    }

    /// Hide and stop animating. A fetch in progress keeps going.
    pub fn hide(&mut self, stage: &mut Stage) {
        self.sprite.hide();
        self.stop_animating(stage);
        self.running = false;
    }

    pub fn bark(&self, stage: &mut Stage) {
        stage.sounds.play(Sound::BarkX3);
    }

    /// Spring up at `x` holding `count` sprites. Returns true when there is
    /// nothing to fetch and the sequence is already complete.
    pub fn fetch_sprites_at(&mut self, stage: &mut Stage, count: u32, x: f32) -> bool {
        if count < 1 {
            return true;
        }
        self.hide(stage);

        if count < 2 {
            self.sprite.set_size(145.0, self.sprite.height);
            self.sprite.place_background(0.0, FETCHING_ROW);
        } else {
            self.sprite.set_size(170.0, self.sprite.height);
            self.sprite.place_background(-192.0, FETCHING_ROW);
        }
        let y = stage.screen.height + self.sprite.height - DISTANCE_UP_FROM_BOTTOM;
        self.sprite.move_to(x, y);
        self.sprite.show();

        self.fetch = Some(Fetch {
            count,
            x,
            y,
            step: 0,
        });
        self.fetch_slot.arm(
            &mut stage.scheduler,
            FETCH_STEP_MS,
            Tick::Dog(DogTick::FetchStep),
        );
        debug!(count, x, "Dog fetching");
        false
    }

    /// Handle a dog timer. Returns true when a fetch just completed.
    pub fn on_tick(&mut self, stage: &mut Stage, id: TimerId, tick: DogTick) -> bool {
        match tick {
            DogTick::Animate => {
                self.on_animation_tick(stage, id);
                false
            },
            DogTick::FetchStep => {
                if !self.fetch_slot.fire(id) {
                    return false;
                }
                let Some(mut fetch) = self.fetch else {
                    return false;
                };
                let mut rise = if fetch.step < FETCH_PEAK {
                    FETCH_RISE
                } else {
                    -FETCH_RISE
                };
                fetch.step += 1;
                if fetch.step == FETCH_PEAK && fetch.count > 1 {
                    self.bark(stage);
                }
                if fetch.step > FETCH_PEAK && fetch.step < FETCH_HOLD_UNTIL {
                    rise = 0.0;
                }
                if fetch.step < FETCH_STEPS {
                    fetch.y -= rise;
                    self.sprite.move_to(fetch.x, fetch.y);
                    self.fetch = Some(fetch);
                    self.fetch_slot.arm(
                        &mut stage.scheduler,
                        FETCH_STEP_MS,
                        Tick::Dog(DogTick::FetchStep),
                    );
                    false
                } else {
                    self.fetch = None;
                    debug!("Dog fetch complete");
                    true
                }
            },
        }
    }

    /// Stop everything, including a fetch in progress.
    pub fn reset(&mut self, stage: &mut Stage) {
        self.fetch_slot.cancel(&mut stage.scheduler);
        self.fetch = None;
        self.hide(stage);
    }
}

impl Animate for Dog {
    fn sprite(&self) -> &Sprite {
        &self.sprite
    }

    fn sprite_mut(&mut self) -> &mut Sprite {
        &mut self.sprite
    }

    fn animation_tick(&self) -> Tick {
        Tick::Dog(DogTick::Animate)
    }

    fn animate_frame(&mut self) {
        let column = self.sprite.next_frame();
        let x = self.sprite.width * -(column as f32);
        self.sprite.place_background(x, self.sprite.pose as f32);
    }
}
