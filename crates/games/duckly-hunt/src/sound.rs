use duckly_core::features::GameTheme;

/// Every sound asset the game knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sound {
    BarkX3,
    Bgm,
    Falling,
    Fly,
    Ground,
    Quack,
    Run,
    Run2,
    Shoot,
    SpaceFly,
    SpaceBgm,
    SpaceNewGame,
    SpaceGameOver,
    SpaceFalling,
    SpaceGround,
    SpaceHit,
    SpaceKilled,
    SpacePanic,
}

impl Sound {
    pub const ALL: [Sound; 18] = [
        Sound::BarkX3,
        Sound::Bgm,
        Sound::Falling,
        Sound::Fly,
        Sound::Ground,
        Sound::Quack,
        Sound::Run,
        Sound::Run2,
        Sound::Shoot,
        Sound::SpaceFly,
        Sound::SpaceBgm,
        Sound::SpaceNewGame,
        Sound::SpaceGameOver,
        Sound::SpaceFalling,
        Sound::SpaceGround,
        Sound::SpaceHit,
        Sound::SpaceKilled,
        Sound::SpacePanic,
    ];

    /// Asset file stem, e.g. `snd/barkX3.mp3`.
    pub fn file_stem(self) -> &'static str {
        match self {
            Sound::BarkX3 => "barkX3",
            Sound::Bgm => "bgm",
            Sound::Falling => "falling",
            Sound::Fly => "fly",
            Sound::Ground => "ground",
            Sound::Quack => "quack",
            Sound::Run => "run",
            Sound::Run2 => "run2",
            Sound::Shoot => "shoot",
            Sound::SpaceFly => "space_fly",
            Sound::SpaceBgm => "space_bgm",
            Sound::SpaceNewGame => "space_newgame",
            Sound::SpaceGameOver => "space_gameover",
            Sound::SpaceFalling => "space_falling",
            Sound::SpaceGround => "space_ground",
            Sound::SpaceHit => "space_hit",
            Sound::SpaceKilled => "space_killed",
            Sound::SpacePanic => "space_panic",
        }
    }
}

/// Identifies one playing instance of a sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundHandle(pub u64);

/// Audio output used by the engine. Decoding and mixing live behind it.
pub trait SoundBoard {
    fn play(&mut self, sound: Sound) -> SoundHandle;
    /// Play on repeat until stopped.
    fn loop_sound(&mut self, sound: Sound) -> SoundHandle;
    fn stop(&mut self, sound: Sound, handle: SoundHandle);
    fn mute(&mut self, sound: Sound, muted: bool);
    /// Playback length, used to schedule "on ended" continuations.
    fn length_ms(&self, sound: Sound) -> u64;

    fn mute_all(&mut self, muted: bool) {
        for sound in Sound::ALL {
            self.mute(sound, muted);
        }
    }
}

/// Silent board used when audio is unavailable.
#[derive(Debug, Default)]
pub struct NullSounds {
    next_handle: u64,
}

impl SoundBoard for NullSounds {
    fn play(&mut self, _sound: Sound) -> SoundHandle {
        self.next_handle += 1;
        SoundHandle(self.next_handle)
    }

    fn loop_sound(&mut self, sound: Sound) -> SoundHandle {
        self.play(sound)
    }

    fn stop(&mut self, _sound: Sound, _handle: SoundHandle) {}

    fn mute(&mut self, _sound: Sound, _muted: bool) {}

    fn length_ms(&self, _sound: Sound) -> u64 {
        0
    }
}

/// Per-sprite sounds for a theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundSet {
    pub hit: Sound,
    pub killed: Sound,
    pub falling: Sound,
    pub fly_away: Sound,
    pub landed: Sound,
    pub panic: Sound,
}

impl SoundSet {
    pub fn for_theme(theme: GameTheme) -> Self {
        match theme {
            GameTheme::Ducks => Self {
                hit: Sound::Quack,
                killed: Sound::Quack,
                falling: Sound::Falling,
                fly_away: Sound::Fly,
                landed: Sound::Ground,
                panic: Sound::Quack,
            },
            GameTheme::Space => Self {
                hit: Sound::SpaceHit,
                killed: Sound::SpaceKilled,
                falling: Sound::SpaceFalling,
                fly_away: Sound::SpaceFly,
                landed: Sound::SpaceGround,
                panic: Sound::SpacePanic,
            },
        }
    }
}

/// Game-wide music and effects for a theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Music {
    pub bgm: Sound,
    pub new_game: Sound,
    pub game_over: Sound,
    pub fly_away: Sound,
}

impl Music {
    pub fn for_theme(theme: GameTheme) -> Self {
        match theme {
            GameTheme::Ducks => Self {
                bgm: Sound::Bgm,
                new_game: Sound::Run,
                game_over: Sound::Run2,
                fly_away: Sound::Fly,
            },
            GameTheme::Space => Self {
                bgm: Sound::SpaceBgm,
                new_game: Sound::SpaceNewGame,
                game_over: Sound::SpaceGameOver,
                fly_away: Sound::SpaceFly,
            },
        }
    }
}
