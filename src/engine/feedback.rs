//! Feedback cues and the bus that carries them
//!
//! The lifecycle emits named cues; the frame runner drains the bus once
//! per tick and fans each cue out to sound, particles, and any extra
//! sinks (an accessibility announcer, for instance). Sinks never feed
//! anything back into game state.

use serde::{Deserialize, Serialize};

/// Named feedback events emitted on lifecycle transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cue {
    /// A fresh question hit the screen
    NewQuestion,
    /// The highlighted choice changed
    Select,
    Correct,
    Incorrect,
    /// Session won; fires at most once per session
    Won,
    /// Session lost; fires at most once per session
    Lost,
    AudioOn,
    AudioOff,
}

impl Cue {
    /// Short human label, used by announcers and the native demo
    pub fn label(&self) -> &'static str {
        match self {
            Cue::NewQuestion => "new question",
            Cue::Select => "selected",
            Cue::Correct => "correct!",
            Cue::Incorrect => "not quite",
            Cue::Won => "you won!",
            Cue::Lost => "game over",
            Cue::AudioOn => "sound on",
            Cue::AudioOff => "sound off",
        }
    }
}

/// Anything that reacts to cues
pub trait CueSink {
    fn on_cue(&mut self, cue: Cue);
}

/// Sound playback capability. Implementations own their failures:
/// a cue that can't be played is dropped, never surfaced to gameplay.
pub trait SoundEmitter {
    fn play(&mut self, cue: Cue);
    fn set_muted(&mut self, muted: bool);
}

/// Single-producer cue queue, drained once per tick in emit order
#[derive(Debug, Default)]
pub struct FeedbackBus {
    pending: Vec<Cue>,
}

impl FeedbackBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, cue: Cue) {
        log::debug!("cue: {cue:?}");
        self.pending.push(cue);
    }

    /// Hand off everything emitted since the last drain
    pub fn drain(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
