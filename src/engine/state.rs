//! Session state: phases, rounds, scoreboard
//!
//! Everything here is plain data. Transitions live in
//! [`crate::engine::lifecycle`]; nothing in this module mutates itself.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::engine::question::{ChoiceSet, Question};
use crate::tuning::Tuning;

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Attract screen, waiting for the first interaction
    Title,
    Playing,
    Won,
    Lost,
}

impl Phase {
    /// Won and Lost accept nothing but restart and audio toggles
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Won | Phase::Lost)
    }
}

/// How the current round was judged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Outcome {
    #[default]
    Pending,
    Correct,
    Incorrect,
}

/// Stage of the round lifecycle, meaningful while `Phase::Playing`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Stage {
    /// No round dealt yet
    #[default]
    Idle,
    /// Question on screen, selection and confirm accepted
    Awaiting,
    /// Confirmed answer being scored; rejects all input
    Judging,
    /// Timed hold while feedback plays, counted down at tick boundaries.
    /// Overwriting this stage is what cancels the pending auto-advance.
    Feedback { ticks_left: u32 },
}

/// One dealt question and the player's progress against it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    pub question: Question,
    pub choices: ChoiceSet,
    /// Highlighted choice, if any
    pub selected: Option<usize>,
    pub outcome: Outcome,
}

impl RoundState {
    pub fn new(question: Question, choices: ChoiceSet) -> Self {
        Self {
            question,
            choices,
            selected: None,
            outcome: Outcome::Pending,
        }
    }

    /// Value of the highlighted choice, if any
    pub fn selected_value(&self) -> Option<u32> {
        self.selected.and_then(|i| self.choices.get(i))
    }
}

/// Win/loss counters for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub score: u32,
    pub wrong: u32,
    pub score_goal: u32,
    pub max_wrong: u32,
}

impl Scoreboard {
    pub fn new(score_goal: u32, max_wrong: u32) -> Self {
        Self {
            score: 0,
            wrong: 0,
            score_goal,
            max_wrong,
        }
    }

    /// Zero the counters, keeping the configured limits
    pub fn reset(&mut self) {
        self.score = 0;
        self.wrong = 0;
    }

    /// Checked immediately after every increment, so the raw score can
    /// never pass the goal; the cap below is for display code only
    pub fn goal_reached(&self) -> bool {
        self.score >= self.score_goal
    }

    pub fn out_of_lives(&self) -> bool {
        self.wrong >= self.max_wrong
    }

    /// Score clamped to the goal for HUD display
    pub fn display_score(&self) -> u32 {
        self.score.min(self.score_goal)
    }

    pub fn lives_left(&self) -> u32 {
        self.max_wrong.saturating_sub(self.wrong)
    }
}

fn detached_rng() -> Pcg32 {
    Pcg32::seed_from_u64(0)
}

/// Complete session state. Snapshots serialize everything a host page
/// could want to inspect; the live rng stays out of the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    pub seed: u64,
    pub phase: Phase,
    pub stage: Stage,
    /// Climbs with every correct answer
    pub level: u32,
    pub scoreboard: Scoreboard,
    pub round: Option<RoundState>,
    pub audio_on: bool,
    /// Ticks elapsed since the session was created
    pub ticks: u64,
    #[serde(skip, default = "detached_rng")]
    pub(crate) rng: Pcg32,
}

impl GameSession {
    pub fn new(seed: u64, tuning: &Tuning) -> Self {
        let tuning = tuning.sanitized();
        Self {
            seed,
            phase: Phase::Title,
            stage: Stage::Idle,
            level: tuning.start_level,
            scoreboard: Scoreboard::new(tuning.score_goal, tuning.max_wrong),
            round: None,
            audio_on: true,
            ticks: 0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn is_over(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Read-only JSON snapshot for host pages and debugging overlays
    pub fn to_json(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Snapshot serialization failed: {e}");
                String::from("{}")
            }
        }
    }
}
