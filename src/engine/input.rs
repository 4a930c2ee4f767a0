//! Input routing: device events in, ordered actions out
//!
//! The router normalizes keyboard, mouse, and touch into [`Action`]s and
//! queues them; the runner drains the queue at the start of each tick.
//! Legality is entirely the lifecycle's problem. The router holds no
//! game state, only the hitboxes of the last drawn frame.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::tuning::InputMode;

/// A lifecycle action requested by the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Leave the title screen
    Start,
    /// Highlight choice `i`; rejected when out of range
    SelectChoice(usize),
    /// Move the highlight by a signed offset, wrapping at the ends
    MoveSelection(i32),
    /// Submit the highlighted choice for judging
    Confirm,
    /// Clear the highlight
    Cancel,
    ToggleAudio,
    /// Honored from the key router only on the win/lose screens
    Restart,
}

/// Screen-space rectangle of one drawn choice card, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hitbox {
    pub index: usize,
    pub pos: Vec2,
    pub size: Vec2,
}

impl Hitbox {
    pub fn new(index: usize, pos: Vec2, size: Vec2) -> Self {
        Self { index, pos, size }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.pos.x
            && point.x <= self.pos.x + self.size.x
            && point.y >= self.pos.y
            && point.y <= self.pos.y + self.size.y
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }
}

/// Normalizes raw device events into the action queue
#[derive(Debug, Default)]
pub struct InputRouter {
    mode: InputMode,
    queue: Vec<Action>,
    hitboxes: Vec<Hitbox>,
}

impl InputRouter {
    pub fn new(mode: InputMode) -> Self {
        Self {
            mode,
            queue: Vec::new(),
            hitboxes: Vec::new(),
        }
    }

    /// Replace the hit targets after each drawn frame
    pub fn set_hitboxes(&mut self, hitboxes: Vec<Hitbox>) {
        self.hitboxes = hitboxes;
    }

    pub fn hitboxes(&self) -> &[Hitbox] {
        &self.hitboxes
    }

    /// Queue an action directly; host-page buttons use this
    pub fn push(&mut self, action: Action) {
        self.queue.push(action);
    }

    /// Everything queued since the last drain, in arrival order
    pub fn drain(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.queue)
    }

    /// Keyboard entry point. `key` is `KeyboardEvent.key` verbatim.
    pub fn on_key(&mut self, key: &str) {
        match key {
            "1" | "2" | "3" | "4" | "5" | "6" | "7" | "8" | "9" => {
                // digit keys are 1-based on screen
                if let Some(digit) = key.chars().next().and_then(|c| c.to_digit(10)) {
                    let index = (digit - 1) as usize;
                    self.push(Action::SelectChoice(index));
                    // only a digit naming a drawn card submits; the bare
                    // select still lets any key start from the title screen
                    if self.mode == InputMode::DirectPick && index < self.hitboxes.len() {
                        self.push(Action::Confirm);
                    }
                }
            }
            "ArrowLeft" | "ArrowUp" => self.push(Action::MoveSelection(-1)),
            "ArrowRight" | "ArrowDown" => self.push(Action::MoveSelection(1)),
            "Enter" | " " => self.push(Action::Confirm),
            "Escape" | "Backspace" => self.push(Action::Cancel),
            "m" | "M" | "s" | "S" => self.push(Action::ToggleAudio),
            "r" | "R" => self.push(Action::Restart),
            _ => {}
        }
    }

    /// Pointer entry point for mouse and touch, in CSS pixels.
    /// A hit picks and submits in one step; a miss is a bare start
    /// request, which only the title screen honors.
    pub fn on_pointer(&mut self, point: Vec2) {
        match self.hitboxes.iter().find(|h| h.contains(point)) {
            Some(hit) => {
                self.push(Action::SelectChoice(hit.index));
                self.push(Action::Confirm);
            }
            None => self.push(Action::Start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;

    fn four_cards() -> Vec<Hitbox> {
        (0..4)
            .map(|i| Hitbox::new(i, vec2(i as f32 * 120.0, 200.0), vec2(100.0, 60.0)))
            .collect()
    }

    #[test]
    fn test_digit_keys_pick_and_confirm() {
        let mut router = InputRouter::new(InputMode::DirectPick);
        router.set_hitboxes(four_cards());
        router.on_key("3");
        assert_eq!(
            router.drain(),
            vec![Action::SelectChoice(2), Action::Confirm]
        );
    }

    #[test]
    fn test_digit_beyond_board_never_confirms() {
        let mut router = InputRouter::new(InputMode::DirectPick);
        router.set_hitboxes(four_cards());
        // cards 5 and 9 do not exist on a four-card board
        router.on_key("5");
        router.on_key("9");
        assert_eq!(
            router.drain(),
            vec![Action::SelectChoice(4), Action::SelectChoice(8)]
        );
    }

    #[test]
    fn test_digit_with_no_board_still_selects() {
        // nothing drawn yet, as on the title screen; the bare select
        // doubles as the start press
        let mut router = InputRouter::new(InputMode::DirectPick);
        router.on_key("3");
        assert_eq!(router.drain(), vec![Action::SelectChoice(2)]);
    }

    #[test]
    fn test_navigate_mode_defers_confirm() {
        let mut router = InputRouter::new(InputMode::NavigateConfirm);
        router.on_key("2");
        router.on_key("ArrowRight");
        router.on_key("Enter");
        assert_eq!(
            router.drain(),
            vec![
                Action::SelectChoice(1),
                Action::MoveSelection(1),
                Action::Confirm
            ]
        );
    }

    #[test]
    fn test_unmapped_keys_queue_nothing() {
        let mut router = InputRouter::new(InputMode::DirectPick);
        router.on_key("F5");
        router.on_key("q");
        assert!(router.drain().is_empty());
    }

    #[test]
    fn test_pointer_hit_selects_that_card() {
        let mut router = InputRouter::new(InputMode::DirectPick);
        router.set_hitboxes(vec![
            Hitbox::new(0, vec2(0.0, 0.0), vec2(100.0, 60.0)),
            Hitbox::new(1, vec2(120.0, 0.0), vec2(100.0, 60.0)),
        ]);
        router.on_pointer(vec2(150.0, 30.0));
        assert_eq!(
            router.drain(),
            vec![Action::SelectChoice(1), Action::Confirm]
        );
    }

    #[test]
    fn test_pointer_miss_is_a_start_request() {
        let mut router = InputRouter::new(InputMode::DirectPick);
        router.on_pointer(vec2(400.0, 300.0));
        assert_eq!(router.drain(), vec![Action::Start]);
    }

    #[test]
    fn test_both_mute_keys_toggle_audio() {
        let mut router = InputRouter::new(InputMode::DirectPick);
        router.on_key("m");
        router.on_key("S");
        assert_eq!(
            router.drain(),
            vec![Action::ToggleAudio, Action::ToggleAudio]
        );
    }

    #[test]
    fn test_drain_empties_the_queue() {
        let mut router = InputRouter::new(InputMode::DirectPick);
        router.push(Action::ToggleAudio);
        assert_eq!(router.drain().len(), 1);
        assert!(router.drain().is_empty());
    }
}
