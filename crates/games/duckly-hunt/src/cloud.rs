use crate::sprite::{Animate, Sprite};
use crate::stage::{Screen, Tick};

pub const CLOUD_WIDTH: f32 = 237.0;
pub const CLOUD_HEIGHT: f32 = 78.0;
const SCROLL_TICK_MS: u64 = 16;

/// Decorative cloud drifting left and wrapping to the right edge.
#[derive(Debug)]
pub struct Cloud {
    sprite: Sprite,
    index: usize,
    speed: f32,
    wrap_x: f32,
}

impl Cloud {
    pub fn new(index: usize, x: f32, y: f32, speed: f32, screen: Screen) -> Self {
        let mut sprite = Sprite::new(CLOUD_WIDTH, CLOUD_HEIGHT, x, y);
        sprite.animation_delay_ms = SCROLL_TICK_MS;
        Self {
            sprite,
            index,
            speed,
            wrap_x: screen.width,
        }
    }

    /// The pair of clouds every scene starts with.
    pub fn default_pair(screen: Screen) -> Vec<Cloud> {
        vec![
            Cloud::new(0, screen.width - 400.0, 50.0, 0.25, screen),
            Cloud::new(1, screen.width - 250.0, 150.0, 0.1, screen),
        ]
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }
}

impl Animate for Cloud {
    fn sprite(&self) -> &Sprite {
        &self.sprite
    }

    fn sprite_mut(&mut self) -> &mut Sprite {
        &mut self.sprite
    }

    fn animation_tick(&self) -> Tick {
        Tick::Cloud(self.index)
    }

    fn animate_frame(&mut self) {
        // Logical x keeps drifting even while movement is disabled.
        self.sprite.x -= self.speed;
        let (x, y) = (self.sprite.x, self.sprite.y);
        self.sprite.move_to(x, y);
        if self.sprite.x < -self.sprite.width {
            self.sprite.x = self.wrap_x;
        }
    }
}
