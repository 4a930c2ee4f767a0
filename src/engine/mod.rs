//! Deterministic question engine
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Actions consumed in arrival order at tick boundaries
//! - No rendering or platform dependencies

pub mod feedback;
pub mod input;
pub mod lifecycle;
pub mod particles;
pub mod question;
pub mod runner;
pub mod state;

pub use feedback::{Cue, CueSink, FeedbackBus, SoundEmitter};
pub use input::{Action, Hitbox, InputRouter};
pub use lifecycle::{Applied, RoundLifecycle};
pub use particles::{BurstField, BurstKind, Spark, MAX_SPARKS};
pub use question::{distractors_for, ChoiceSet, Op, Question, QuestionFactory};
pub use runner::{GameLoop, RenderError, Renderer};
pub use state::{GameSession, Outcome, Phase, RoundState, Scoreboard, Stage};
