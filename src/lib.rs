//! Math Pop - a round-based arithmetic arcade game
//!
//! Core modules:
//! - `engine`: deterministic question engine (rounds, scoring, input, feedback)
//! - `tuning`: data-driven game balance
//! - `render`: canvas-2d theme (wasm32 only)
//! - `audio`: Web Audio cue synthesis (wasm32 only)
//!
//! The engine is platform-free: themes plug in through the
//! [`engine::Renderer`] and [`engine::SoundEmitter`] capabilities.

pub mod engine;
pub mod tuning;

#[cfg(target_arch = "wasm32")]
pub mod audio;
#[cfg(target_arch = "wasm32")]
pub mod render;

pub use engine::{GameLoop, GameSession};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed logic timestep (60 Hz, one tick per animation frame at nominal rate)
    pub const TICK_DT: f32 = 1.0 / 60.0;
    /// Maximum catch-up ticks per frame to prevent spiral of death
    pub const MAX_CATCHUP_TICKS: u32 = 4;
}
