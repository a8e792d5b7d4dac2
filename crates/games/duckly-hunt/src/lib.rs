pub mod cloud;
pub mod config;
pub mod difficulty;
pub mod dog;
pub mod kiosk;
pub mod relay;
pub mod round;
pub mod scene;
pub mod schedule;
pub mod shootable;
pub mod sight;
pub mod sound;
pub mod sprite;
pub mod stage;
pub mod timebar;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};
    use std::rc::Rc;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use duckly_core::net::messages::PlayerMessage;
    use duckly_core::player::PlayerInfo;

    use crate::relay::{RelayChannel, RelayError};
    use crate::sound::{Sound, SoundBoard, SoundHandle};
    use crate::stage::{Screen, Stage};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum SoundCall {
        Play(Sound),
        Loop(Sound),
        Stop(Sound),
    }

    /// Sound board that records every call. Lengths default to zero.
    #[derive(Debug, Default)]
    pub struct RecordingSounds {
        pub calls: Vec<SoundCall>,
        pub lengths: HashMap<Sound, u64>,
        muted: HashSet<Sound>,
        next_handle: u64,
    }

    impl RecordingSounds {
        fn count(&self, call: SoundCall) -> usize {
            self.calls.iter().filter(|c| **c == call).count()
        }

        pub fn plays(&self, sound: Sound) -> usize {
            self.count(SoundCall::Play(sound))
        }

        pub fn loops(&self, sound: Sound) -> usize {
            self.count(SoundCall::Loop(sound))
        }

        pub fn stops(&self, sound: Sound) -> usize {
            self.count(SoundCall::Stop(sound))
        }

        pub fn is_muted(&self, sound: Sound) -> bool {
            self.muted.contains(&sound)
        }

        fn handle(&mut self) -> SoundHandle {
            self.next_handle += 1;
            SoundHandle(self.next_handle)
        }
    }

    impl SoundBoard for Rc<RefCell<RecordingSounds>> {
        fn play(&mut self, sound: Sound) -> SoundHandle {
            let mut log = self.borrow_mut();
            log.calls.push(SoundCall::Play(sound));
            log.handle()
        }

        fn loop_sound(&mut self, sound: Sound) -> SoundHandle {
            let mut log = self.borrow_mut();
            log.calls.push(SoundCall::Loop(sound));
            log.handle()
        }

        fn stop(&mut self, sound: Sound, _handle: SoundHandle) {
            self.borrow_mut().calls.push(SoundCall::Stop(sound));
        }

        fn mute(&mut self, sound: Sound, muted: bool) {
            let mut log = self.borrow_mut();
            if muted {
                log.muted.insert(sound);
            } else {
                log.muted.remove(&sound);
            }
        }

        fn length_ms(&self, sound: Sound) -> u64 {
            self.borrow().lengths.get(&sound).copied().unwrap_or(0)
        }
    }

    /// Seeded stage whose sound board is shared with the returned log.
    pub fn recording_stage(screen: Screen, seed: u64) -> (Stage, Rc<RefCell<RecordingSounds>>) {
        let log = Rc::new(RefCell::new(RecordingSounds::default()));
        let stage = Stage::new(
            screen,
            Box::new(Rc::clone(&log)),
            StdRng::seed_from_u64(seed),
        );
        (stage, log)
    }

    /// Relay that keeps everything it is asked to send. Clones share the log.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingRelay {
        entered: Rc<RefCell<Vec<PlayerInfo>>>,
        published: Rc<RefCell<Vec<PlayerMessage>>>,
        refuse_enter: bool,
    }

    impl RecordingRelay {
        /// Relay whose presence enter always fails.
        pub fn refusing() -> Self {
            Self {
                refuse_enter: true,
                ..Self::default()
            }
        }

        pub fn entered(&self) -> Vec<PlayerInfo> {
            self.entered.borrow().clone()
        }

        pub fn published(&self) -> Vec<PlayerMessage> {
            self.published.borrow().clone()
        }

        pub fn count(&self, msg: &PlayerMessage) -> usize {
            self.published.borrow().iter().filter(|m| *m == msg).count()
        }
    }

    impl RelayChannel for RecordingRelay {
        fn enter(&mut self, player: &PlayerInfo) -> Result<(), RelayError> {
            if self.refuse_enter {
                return Err(RelayError::Closed);
            }
            self.entered.borrow_mut().push(player.clone());
            Ok(())
        }

        fn publish(&mut self, msg: PlayerMessage) -> Result<(), RelayError> {
            self.published.borrow_mut().push(msg);
            Ok(())
        }
    }
}
