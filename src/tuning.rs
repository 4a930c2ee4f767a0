//! Data-driven game balance
//!
//! Every number a themed variant is allowed to tweak lives here; the
//! engine hardcodes no difficulty values of its own. Hosts embed a JSON
//! blob (e.g. a `data-tuning` attribute on the canvas) and the rest of
//! the crate only ever sees a sanitized [`Tuning`].

use serde::{Deserialize, Serialize};

/// How raw device input maps onto answer submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InputMode {
    /// Digit keys and taps pick a choice and submit it in one step
    #[default]
    DirectPick,
    /// Arrows and digits move the highlight; Enter or Space submits
    NavigateConfirm,
}

/// Balance knobs for one game variant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Session ===
    /// Correct answers needed to win
    pub score_goal: u32,
    /// Wrong answers that end the session
    pub max_wrong: u32,
    /// Difficulty level a fresh session starts at
    pub start_level: u32,

    // === Questions ===
    /// Answer choices per round (correct + distractors)
    pub choice_count: usize,
    /// Largest add/subtract operand at `start_level`
    pub base_operand_max: u32,
    /// Operand ceiling growth per level
    pub operand_growth: u32,
    /// Hard operand ceiling regardless of level
    pub operand_cap: u32,
    /// Level at which subtraction joins the mix
    pub sub_unlock_level: u32,
    /// Level at which multiplication joins the mix
    pub mul_unlock_level: u32,

    // === Pacing ===
    /// Feedback hold after a correct answer, in ticks
    pub correct_feedback_ticks: u32,
    /// Feedback hold after a wrong answer, in ticks (longer, so the
    /// highlighted right answer can sink in)
    pub incorrect_feedback_ticks: u32,

    // === Input ===
    pub input_mode: InputMode,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            // Session
            score_goal: 10,
            max_wrong: 3,
            start_level: 1,

            // Questions
            choice_count: 4,
            base_operand_max: 10,
            operand_growth: 2,
            operand_cap: 50,
            sub_unlock_level: 2,
            mul_unlock_level: 5,

            // Pacing (at 60 ticks/s)
            correct_feedback_ticks: 45,
            incorrect_feedback_ticks: 75,

            input_mode: InputMode::DirectPick,
        }
    }
}

impl Tuning {
    /// Clamp every knob into a range the engine can honor. Applied to
    /// all host-supplied values so a bad embed can't wedge a session.
    pub fn sanitized(mut self) -> Self {
        self.score_goal = self.score_goal.clamp(1, 99);
        self.max_wrong = self.max_wrong.clamp(1, 9);
        self.start_level = self.start_level.max(1);
        self.choice_count = self.choice_count.clamp(3, 5);
        self.base_operand_max = self.base_operand_max.clamp(5, 99);
        self.operand_cap = self.operand_cap.clamp(self.base_operand_max, 99);
        self.sub_unlock_level = self.sub_unlock_level.max(1);
        self.mul_unlock_level = self.mul_unlock_level.max(self.sub_unlock_level);
        self.correct_feedback_ticks = self.correct_feedback_ticks.clamp(1, 600);
        self.incorrect_feedback_ticks = self.incorrect_feedback_ticks.clamp(1, 600);
        self
    }

    /// Parse a host-embedded JSON blob, falling back to defaults on
    /// malformed input. Unknown fields are ignored, missing ones filled.
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<Tuning>(json) {
            Ok(tuning) => tuning.sanitized(),
            Err(e) => {
                log::warn!("Bad tuning JSON, using defaults: {e}");
                Self::default()
            }
        }
    }

    /// Largest operand allowed for add/subtract at `level`
    pub fn operand_max(&self, level: u32) -> u32 {
        let grown = self
            .base_operand_max
            .saturating_add(self.operand_growth.saturating_mul(level.saturating_sub(1)));
        grown.min(self.operand_cap)
    }
}
