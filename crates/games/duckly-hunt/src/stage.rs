//! Services shared by everything on screen.
//!
//! The stage owns the scheduler, the sound board, the random source and the
//! screen size. Components borrow it mutably while handling a tick; nothing
//! holds it globally.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::schedule::Scheduler;
use crate::sound::{NullSounds, SoundBoard};
use crate::sprite::SpriteId;

/// Playfield size in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Screen {
    pub width: f32,
    pub height: f32,
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 768.0,
        }
    }
}

/// Everything that can be scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Sprite(SpriteId, SpriteTick),
    Cloud(usize),
    Scenery,
    Dog(DogTick),
    Sight,
    Timebar,
    Round(RoundTick),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteTick {
    Animate,
    Fly,
    HitFlashEnd,
    StartFall,
    Fall,
    FlyAwayFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DogTick {
    Animate,
    FetchStep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundTick {
    IntroMusicEnded,
    Bark,
    StartRound,
    Fetch,
    NextRound,
    GameOverMessage,
    NewGame,
}

pub struct Stage {
    pub scheduler: Scheduler<Tick>,
    pub sounds: Box<dyn SoundBoard>,
    pub rng: StdRng,
    pub screen: Screen,
}

impl Stage {
    pub fn new(screen: Screen, sounds: Box<dyn SoundBoard>, rng: StdRng) -> Self {
        Self {
            scheduler: Scheduler::new(),
            sounds,
            rng,
            screen,
        }
    }

    /// Silent, deterministic stage.
    pub fn seeded(screen: Screen, seed: u64) -> Self {
        Self::new(
            screen,
            Box::new(NullSounds::default()),
            StdRng::seed_from_u64(seed),
        )
    }

    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }
}
