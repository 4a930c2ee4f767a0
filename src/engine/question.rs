//! Question generation: arithmetic prompts, answers, and choice sets
//!
//! Generation is pure given an rng, so a seeded session replays the same
//! questions in the same order.

use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

/// Multiplication stays within the times tables
pub const MUL_MIN: u32 = 2;
pub const MUL_MAX: u32 = 9;

/// Distractor draw budget before the deterministic fill kicks in
const MAX_DISTRACTOR_DRAWS: u32 = 256;
/// Draws between each widening of the delta spread
const WIDEN_EVERY: u32 = 16;

/// Arithmetic operation of a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    Add,
    Sub,
    Mul,
}

impl Op {
    pub fn symbol(&self) -> &'static str {
        match self {
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "×",
        }
    }

    pub fn apply(&self, a: u32, b: u32) -> u32 {
        match self {
            Op::Add => a.saturating_add(b),
            Op::Sub => a.saturating_sub(b),
            Op::Mul => a.saturating_mul(b),
        }
    }
}

/// One arithmetic prompt with its precomputed answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub operands: (u32, u32),
    pub op: Op,
    /// Derived from `operands` and `op` at construction
    pub answer: u32,
}

impl Question {
    /// Subtraction operands are reordered so the answer is never negative;
    /// other operations keep the order they were given.
    pub fn new(a: u32, b: u32, op: Op) -> Self {
        let (a, b) = match op {
            Op::Sub if b > a => (b, a),
            _ => (a, b),
        };
        Self {
            operands: (a, b),
            op,
            answer: op.apply(a, b),
        }
    }

    /// Display form, e.g. `"9 - 3"` or `"6 × 4"`
    pub fn prompt(&self) -> String {
        format!("{} {} {}", self.operands.0, self.op.symbol(), self.operands.1)
    }
}

/// The shuffled answer values laid out for one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceSet {
    values: Vec<u32>,
}

impl ChoiceSet {
    pub fn new(values: Vec<u32>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[u32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<u32> {
        self.values.get(index).copied()
    }

    /// Index of `value`, if present
    pub fn position_of(&self, value: u32) -> Option<usize> {
        self.values.iter().position(|v| *v == value)
    }
}

/// Bounded-delta distractor generation.
///
/// Candidates land within `3 + 0.3 * correct` of the right answer so they
/// stay plausible, never equal the answer or each other, and never go
/// negative (a below-zero draw reflects upward instead of clamping to 0).
/// The spread widens whenever the draw budget thins out, so tiny answers
/// with few near neighbors still terminate.
pub fn distractors_for(correct: u32, count: usize, rng: &mut impl Rng) -> Vec<u32> {
    let mut out: Vec<u32> = Vec::with_capacity(count);
    let mut spread = 3 + correct.saturating_mul(3) / 10;
    let mut draws = 0u32;

    while out.len() < count && draws < MAX_DISTRACTOR_DRAWS {
        draws += 1;
        if draws % WIDEN_EVERY == 0 {
            spread += 2;
        }
        let delta = rng.random_range(1..=spread);
        let candidate = if rng.random_bool(0.5) || correct < delta {
            correct.saturating_add(delta)
        } else {
            correct - delta
        };
        if candidate != correct && !out.contains(&candidate) {
            out.push(candidate);
        }
    }

    // Deterministic fill for the day the draw budget ever runs dry
    let mut next = correct.saturating_add(1);
    while out.len() < count {
        if !out.contains(&next) {
            out.push(next);
        }
        next = next.saturating_add(1);
    }

    out
}

/// Deals questions and choice sets for a given difficulty level
#[derive(Debug, Clone)]
pub struct QuestionFactory {
    tuning: Tuning,
}

impl QuestionFactory {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            tuning: tuning.sanitized(),
        }
    }

    /// Difficulty comes from the level alone; the rng only picks within
    /// the ranges that level has unlocked.
    pub fn generate(&self, level: u32, rng: &mut impl Rng) -> Question {
        let max = self.tuning.operand_max(level);
        match self.pick_op(level, rng) {
            Op::Add => Question::new(
                rng.random_range(1..=max),
                rng.random_range(1..=max),
                Op::Add,
            ),
            Op::Sub => Question::new(
                rng.random_range(0..=max),
                rng.random_range(0..=max),
                Op::Sub,
            ),
            Op::Mul => Question::new(
                rng.random_range(MUL_MIN..=MUL_MAX),
                rng.random_range(MUL_MIN..=MUL_MAX),
                Op::Mul,
            ),
        }
    }

    /// Distractors plus the right answer, shuffled together
    pub fn choices_for(&self, question: &Question, rng: &mut impl Rng) -> ChoiceSet {
        let distractor_count = self.tuning.choice_count - 1;
        let mut values = distractors_for(question.answer, distractor_count, rng);
        values.push(question.answer);
        values.shuffle(rng);
        ChoiceSet::new(values)
    }

    fn pick_op(&self, level: u32, rng: &mut impl Rng) -> Op {
        let mut ops = [Op::Add; 3];
        let mut n = 1;
        if level >= self.tuning.sub_unlock_level {
            ops[n] = Op::Sub;
            n += 1;
        }
        if level >= self.tuning.mul_unlock_level {
            ops[n] = Op::Mul;
            n += 1;
        }
        ops[..n].choose(rng).copied().unwrap_or(Op::Add)
    }
}
