//! Round lifecycle: the one place session state is allowed to change
//!
//! Each player action funnels through [`RoundLifecycle::apply`], which
//! checks legality against the current phase and stage. Illegal actions
//! are ignored and logged at debug level, never escalated. Judging an
//! answer bumps exactly one scoreboard counter and either parks the
//! session in a timed feedback hold or ends it.

use crate::engine::feedback::{Cue, FeedbackBus};
use crate::engine::input::Action;
use crate::engine::question::QuestionFactory;
use crate::engine::state::{GameSession, Outcome, Phase, RoundState, Stage};
use crate::tuning::Tuning;

/// Whether an applied action changed anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Done,
    Ignored,
}

/// Drives a [`GameSession`] through its rounds
#[derive(Debug, Clone)]
pub struct RoundLifecycle {
    factory: QuestionFactory,
    tuning: Tuning,
}

impl RoundLifecycle {
    pub fn new(tuning: &Tuning) -> Self {
        let tuning = tuning.sanitized();
        Self {
            factory: QuestionFactory::new(&tuning),
            tuning,
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Apply one player action, honoring phase and stage legality
    pub fn apply(&self, session: &mut GameSession, bus: &mut FeedbackBus, action: Action) -> Applied {
        match session.phase {
            Phase::Title => match action {
                Action::ToggleAudio => self.toggle_audio(session, bus),
                // the attract screen treats restart as noise
                Action::Restart => ignored(session, action),
                _ => {
                    self.start_game(session, bus, None);
                    Applied::Done
                }
            },
            Phase::Won | Phase::Lost => match action {
                // a bare tap on the end screen counts as a restart request
                Action::Restart | Action::Start => {
                    self.restart(session, bus);
                    Applied::Done
                }
                Action::ToggleAudio => self.toggle_audio(session, bus),
                _ => ignored(session, action),
            },
            Phase::Playing => match action {
                Action::SelectChoice(index) => self.select(session, bus, index),
                Action::MoveSelection(delta) => self.move_selection(session, bus, delta),
                Action::Confirm => self.confirm(session, bus),
                Action::Cancel => self.cancel(session),
                Action::ToggleAudio => self.toggle_audio(session, bus),
                Action::Start | Action::Restart => ignored(session, action),
            },
        }
    }

    /// Begin a session, optionally at an explicit starting level.
    /// Also serves as restart: overwriting the stage cancels any
    /// feedback countdown still pending.
    pub fn start_game(&self, session: &mut GameSession, bus: &mut FeedbackBus, level: Option<u32>) {
        session.phase = Phase::Playing;
        session.scoreboard.reset();
        session.level = level.unwrap_or(self.tuning.start_level).max(1);
        session.round = None;
        session.stage = Stage::Idle;
        self.start_round(session, bus);
    }

    /// Back to a fresh round one with zeroed counters
    pub fn restart(&self, session: &mut GameSession, bus: &mut FeedbackBus) {
        log::info!(
            "Restart: score {}/{}, wrong {}/{}",
            session.scoreboard.score,
            session.scoreboard.score_goal,
            session.scoreboard.wrong,
            session.scoreboard.max_wrong
        );
        self.start_game(session, bus, None);
    }

    /// Deal the next question and open it for answers
    fn start_round(&self, session: &mut GameSession, bus: &mut FeedbackBus) {
        let question = self.factory.generate(session.level, &mut session.rng);
        let choices = self.factory.choices_for(&question, &mut session.rng);
        log::debug!("Round dealt: {} = {}", question.prompt(), question.answer);
        session.round = Some(RoundState::new(question, choices));
        session.stage = Stage::Awaiting;
        bus.emit(Cue::NewQuestion);
    }

    /// Advance time by one tick; fires the feedback auto-advance at expiry
    pub fn tick(&self, session: &mut GameSession, bus: &mut FeedbackBus) {
        session.ticks += 1;
        if session.phase != Phase::Playing {
            return;
        }
        if let Stage::Feedback { ticks_left } = session.stage {
            if ticks_left <= 1 {
                self.start_round(session, bus);
            } else {
                session.stage = Stage::Feedback {
                    ticks_left: ticks_left - 1,
                };
            }
        }
    }

    fn select(&self, session: &mut GameSession, bus: &mut FeedbackBus, index: usize) -> Applied {
        if session.stage != Stage::Awaiting {
            return ignored(session, Action::SelectChoice(index));
        }
        let Some(round) = session.round.as_mut() else {
            return ignored(session, Action::SelectChoice(index));
        };
        if index >= round.choices.len() {
            log::debug!("Selection {index} out of range");
            return Applied::Ignored;
        }
        if round.selected == Some(index) {
            // already highlighted, no duplicate cue
            return Applied::Done;
        }
        round.selected = Some(index);
        bus.emit(Cue::Select);
        Applied::Done
    }

    fn move_selection(&self, session: &mut GameSession, bus: &mut FeedbackBus, delta: i32) -> Applied {
        if session.stage != Stage::Awaiting {
            return ignored(session, Action::MoveSelection(delta));
        }
        let Some(round) = session.round.as_ref() else {
            return ignored(session, Action::MoveSelection(delta));
        };
        let len = round.choices.len() as i64;
        if len == 0 {
            return Applied::Ignored;
        }
        // hosts can push any delta; widen before wrapping
        let next = match round.selected {
            Some(current) => (current as i64 + i64::from(delta)).rem_euclid(len),
            // entering from either end feels natural with arrows
            None if delta < 0 => len - 1,
            None => 0,
        };
        self.select(session, bus, next as usize)
    }

    fn cancel(&self, session: &mut GameSession) -> Applied {
        if session.stage != Stage::Awaiting {
            return ignored(session, Action::Cancel);
        }
        let Some(round) = session.round.as_mut() else {
            return ignored(session, Action::Cancel);
        };
        round.selected = None;
        Applied::Done
    }

    /// Submit the highlighted choice. Confirming with nothing selected
    /// is rejected outright; it never counts as a wrong answer.
    fn confirm(&self, session: &mut GameSession, bus: &mut FeedbackBus) -> Applied {
        if session.stage != Stage::Awaiting {
            return ignored(session, Action::Confirm);
        }
        let Some(selected) = session.round.as_ref().and_then(|r| r.selected) else {
            log::debug!("Confirm with no selection");
            return Applied::Ignored;
        };
        session.stage = Stage::Judging;
        self.judge(session, bus, selected);
        Applied::Done
    }

    /// Score one confirmed answer. Exactly one counter moves per call.
    fn judge(&self, session: &mut GameSession, bus: &mut FeedbackBus, selected: usize) {
        let Some(round) = session.round.as_mut() else {
            return;
        };
        let correct = round.choices.get(selected) == Some(round.question.answer);

        if correct {
            round.outcome = Outcome::Correct;
            session.scoreboard.score += 1;
            session.level += 1;
            bus.emit(Cue::Correct);
            if session.scoreboard.goal_reached() {
                session.phase = Phase::Won;
                session.stage = Stage::Idle;
                bus.emit(Cue::Won);
            } else {
                session.stage = Stage::Feedback {
                    ticks_left: self.tuning.correct_feedback_ticks,
                };
            }
        } else {
            round.outcome = Outcome::Incorrect;
            session.scoreboard.wrong += 1;
            bus.emit(Cue::Incorrect);
            if session.scoreboard.out_of_lives() {
                session.phase = Phase::Lost;
                session.stage = Stage::Idle;
                bus.emit(Cue::Lost);
            } else {
                session.stage = Stage::Feedback {
                    ticks_left: self.tuning.incorrect_feedback_ticks,
                };
            }
        }
    }

    fn toggle_audio(&self, session: &mut GameSession, bus: &mut FeedbackBus) -> Applied {
        session.audio_on = !session.audio_on;
        bus.emit(if session.audio_on {
            Cue::AudioOn
        } else {
            Cue::AudioOff
        });
        Applied::Done
    }
}

fn ignored(session: &GameSession, action: Action) -> Applied {
    log::debug!(
        "Ignored {action:?} in {:?}/{:?}",
        session.phase,
        session.stage
    );
    Applied::Ignored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_tuning() -> Tuning {
        Tuning {
            score_goal: 3,
            max_wrong: 2,
            ..Tuning::default()
        }
    }

    /// Session already in play, bus drained of the opening cue
    fn playing() -> (RoundLifecycle, GameSession, FeedbackBus) {
        let tuning = short_tuning();
        let lifecycle = RoundLifecycle::new(&tuning);
        let mut session = GameSession::new(21, &tuning);
        let mut bus = FeedbackBus::new();
        lifecycle.start_game(&mut session, &mut bus, None);
        bus.drain();
        (lifecycle, session, bus)
    }

    fn correct_index(session: &GameSession) -> usize {
        let round = session.round.as_ref().unwrap();
        round.choices.position_of(round.question.answer).unwrap()
    }

    fn wrong_index(session: &GameSession) -> usize {
        let round = session.round.as_ref().unwrap();
        (correct_index(session) + 1) % round.choices.len()
    }

    /// Select and confirm either the right answer or a wrong one
    fn answer(
        lifecycle: &RoundLifecycle,
        session: &mut GameSession,
        bus: &mut FeedbackBus,
        correctly: bool,
    ) {
        let index = if correctly {
            correct_index(session)
        } else {
            wrong_index(session)
        };
        lifecycle.apply(session, bus, Action::SelectChoice(index));
        lifecycle.apply(session, bus, Action::Confirm);
    }

    /// Run ticks until the stage leaves Feedback
    fn ride_out_feedback(
        lifecycle: &RoundLifecycle,
        session: &mut GameSession,
        bus: &mut FeedbackBus,
    ) {
        for _ in 0..1000 {
            if !matches!(session.stage, Stage::Feedback { .. }) {
                return;
            }
            lifecycle.tick(session, bus);
        }
        panic!("feedback never expired");
    }

    #[test]
    fn test_start_game_deals_first_round() {
        let tuning = short_tuning();
        let lifecycle = RoundLifecycle::new(&tuning);
        let mut session = GameSession::new(1, &tuning);
        let mut bus = FeedbackBus::new();

        lifecycle.start_game(&mut session, &mut bus, None);
        assert_eq!(session.phase, Phase::Playing);
        assert_eq!(session.stage, Stage::Awaiting);
        assert!(session.round.is_some());
        assert_eq!(bus.drain(), vec![Cue::NewQuestion]);
    }

    #[test]
    fn test_title_any_press_starts() {
        let tuning = short_tuning();
        let lifecycle = RoundLifecycle::new(&tuning);
        let mut session = GameSession::new(2, &tuning);
        let mut bus = FeedbackBus::new();

        assert_eq!(
            lifecycle.apply(&mut session, &mut bus, Action::Confirm),
            Applied::Done
        );
        assert_eq!(session.phase, Phase::Playing);
    }

    #[test]
    fn test_title_restart_is_noise() {
        let tuning = short_tuning();
        let lifecycle = RoundLifecycle::new(&tuning);
        let mut session = GameSession::new(2, &tuning);
        let mut bus = FeedbackBus::new();

        assert_eq!(
            lifecycle.apply(&mut session, &mut bus, Action::Restart),
            Applied::Ignored
        );
        assert_eq!(session.phase, Phase::Title);
    }

    #[test]
    fn test_audio_toggle_works_everywhere() {
        let tuning = short_tuning();
        let lifecycle = RoundLifecycle::new(&tuning);
        let mut session = GameSession::new(2, &tuning);
        let mut bus = FeedbackBus::new();

        lifecycle.apply(&mut session, &mut bus, Action::ToggleAudio);
        assert!(!session.audio_on);
        assert_eq!(session.phase, Phase::Title);
        assert_eq!(bus.drain(), vec![Cue::AudioOff]);

        lifecycle.start_game(&mut session, &mut bus, None);
        bus.drain();
        lifecycle.apply(&mut session, &mut bus, Action::ToggleAudio);
        assert!(session.audio_on);
        assert_eq!(bus.drain(), vec![Cue::AudioOn]);
    }

    #[test]
    fn test_select_emits_cue_once() {
        let (lifecycle, mut session, mut bus) = playing();

        assert_eq!(
            lifecycle.apply(&mut session, &mut bus, Action::SelectChoice(1)),
            Applied::Done
        );
        assert_eq!(bus.drain(), vec![Cue::Select]);

        // same index again: still Done, but silent
        assert_eq!(
            lifecycle.apply(&mut session, &mut bus, Action::SelectChoice(1)),
            Applied::Done
        );
        assert!(bus.is_empty());
        let round = session.round.as_ref().unwrap();
        assert_eq!(round.selected, Some(1));
        assert_eq!(round.selected_value(), round.choices.get(1));
    }

    #[test]
    fn test_select_out_of_range_rejected() {
        let (lifecycle, mut session, mut bus) = playing();
        let len = session.round.as_ref().unwrap().choices.len();

        assert_eq!(
            lifecycle.apply(&mut session, &mut bus, Action::SelectChoice(len)),
            Applied::Ignored
        );
        assert_eq!(session.round.as_ref().unwrap().selected, None);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_move_selection_wraps_both_ways() {
        let (lifecycle, mut session, mut bus) = playing();
        let len = session.round.as_ref().unwrap().choices.len();

        lifecycle.apply(&mut session, &mut bus, Action::MoveSelection(-1));
        assert_eq!(session.round.as_ref().unwrap().selected, Some(len - 1));

        lifecycle.apply(&mut session, &mut bus, Action::MoveSelection(1));
        assert_eq!(session.round.as_ref().unwrap().selected, Some(0));
    }

    #[test]
    fn test_move_selection_extreme_delta_stays_in_range() {
        let (lifecycle, mut session, mut bus) = playing();
        lifecycle.apply(&mut session, &mut bus, Action::SelectChoice(0));
        let len = session.round.as_ref().unwrap().choices.len();

        for delta in [i32::MAX, i32::MIN] {
            assert_eq!(
                lifecycle.apply(&mut session, &mut bus, Action::MoveSelection(delta)),
                Applied::Done
            );
            assert!(session.round.as_ref().unwrap().selected.unwrap() < len);
        }
    }

    #[test]
    fn test_cancel_clears_selection_silently() {
        let (lifecycle, mut session, mut bus) = playing();

        lifecycle.apply(&mut session, &mut bus, Action::SelectChoice(0));
        bus.drain();
        assert_eq!(
            lifecycle.apply(&mut session, &mut bus, Action::Cancel),
            Applied::Done
        );
        assert_eq!(session.round.as_ref().unwrap().selected, None);
        assert_eq!(session.round.as_ref().unwrap().selected_value(), None);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_confirm_without_selection_rejected() {
        let (lifecycle, mut session, mut bus) = playing();

        assert_eq!(
            lifecycle.apply(&mut session, &mut bus, Action::Confirm),
            Applied::Ignored
        );
        assert_eq!(session.stage, Stage::Awaiting);
        assert_eq!(session.scoreboard.score, 0);
        assert_eq!(session.scoreboard.wrong, 0);
    }

    #[test]
    fn test_correct_answer_scores_and_holds() {
        let (lifecycle, mut session, mut bus) = playing();
        let level_before = session.level;

        answer(&lifecycle, &mut session, &mut bus, true);
        assert_eq!(session.scoreboard.score, 1);
        assert_eq!(session.scoreboard.wrong, 0);
        assert_eq!(session.level, level_before + 1);
        assert_eq!(
            session.round.as_ref().unwrap().outcome,
            Outcome::Correct
        );
        assert_eq!(
            session.stage,
            Stage::Feedback {
                ticks_left: lifecycle.tuning().correct_feedback_ticks
            }
        );
        assert_eq!(bus.drain(), vec![Cue::Select, Cue::Correct]);
    }

    #[test]
    fn test_wrong_answer_counts_and_holds() {
        let (lifecycle, mut session, mut bus) = playing();
        let level_before = session.level;

        answer(&lifecycle, &mut session, &mut bus, false);
        assert_eq!(session.scoreboard.score, 0);
        assert_eq!(session.scoreboard.wrong, 1);
        // difficulty never climbs on a miss
        assert_eq!(session.level, level_before);
        assert_eq!(
            session.stage,
            Stage::Feedback {
                ticks_left: lifecycle.tuning().incorrect_feedback_ticks
            }
        );
        assert_eq!(bus.drain(), vec![Cue::Select, Cue::Incorrect]);
    }

    #[test]
    fn test_feedback_stage_rejects_answer_input() {
        let (lifecycle, mut session, mut bus) = playing();
        answer(&lifecycle, &mut session, &mut bus, true);
        bus.drain();

        let held = session.stage;
        assert_eq!(
            lifecycle.apply(&mut session, &mut bus, Action::SelectChoice(0)),
            Applied::Ignored
        );
        assert_eq!(
            lifecycle.apply(&mut session, &mut bus, Action::Confirm),
            Applied::Ignored
        );
        assert_eq!(session.stage, held);
        assert_eq!(session.scoreboard.score, 1);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_judging_and_idle_stages_reject_answer_input() {
        for stage in [Stage::Judging, Stage::Idle] {
            let (lifecycle, mut session, mut bus) = playing();
            session.stage = stage;

            for action in [
                Action::SelectChoice(0),
                Action::Confirm,
                Action::Cancel,
                Action::MoveSelection(1),
            ] {
                assert_eq!(
                    lifecycle.apply(&mut session, &mut bus, action),
                    Applied::Ignored
                );
            }
            assert_eq!(session.stage, stage);
            assert_eq!(session.scoreboard.score, 0);
        }
    }

    #[test]
    fn test_feedback_countdown_deals_next_round() {
        let (lifecycle, mut session, mut bus) = playing();

        answer(&lifecycle, &mut session, &mut bus, true);
        bus.drain();
        let decided = session.round.clone().unwrap();
        ride_out_feedback(&lifecycle, &mut session, &mut bus);

        assert_eq!(session.stage, Stage::Awaiting);
        let next = session.round.as_ref().unwrap();
        assert_eq!(next.selected, None);
        assert_eq!(next.outcome, Outcome::Pending);
        assert_ne!(*next, decided);
        assert_eq!(bus.drain(), vec![Cue::NewQuestion]);
    }

    #[test]
    fn test_win_at_goal_fires_once() {
        let (lifecycle, mut session, mut bus) = playing();

        for _ in 0..3 {
            answer(&lifecycle, &mut session, &mut bus, true);
            ride_out_feedback(&lifecycle, &mut session, &mut bus);
        }
        assert_eq!(session.phase, Phase::Won);
        assert_eq!(session.scoreboard.score, 3);

        let cues = bus.drain();
        assert_eq!(cues.iter().filter(|c| **c == Cue::Won).count(), 1);

        // terminal: only restart and audio get through
        assert_eq!(
            lifecycle.apply(&mut session, &mut bus, Action::Confirm),
            Applied::Ignored
        );
        assert_eq!(session.scoreboard.score, 3);
    }

    #[test]
    fn test_loss_at_max_wrong() {
        let (lifecycle, mut session, mut bus) = playing();

        for _ in 0..2 {
            answer(&lifecycle, &mut session, &mut bus, false);
            ride_out_feedback(&lifecycle, &mut session, &mut bus);
        }
        assert_eq!(session.phase, Phase::Lost);
        assert_eq!(session.scoreboard.wrong, 2);
        assert!(bus.drain().contains(&Cue::Lost));
    }

    #[test]
    fn test_score_never_passes_goal() {
        let (lifecycle, mut session, mut bus) = playing();

        for _ in 0..10 {
            if session.phase != Phase::Playing {
                break;
            }
            answer(&lifecycle, &mut session, &mut bus, true);
            ride_out_feedback(&lifecycle, &mut session, &mut bus);
        }
        assert_eq!(session.scoreboard.score, session.scoreboard.score_goal);
    }

    #[test]
    fn test_restart_cancels_pending_feedback() {
        let (lifecycle, mut session, mut bus) = playing();

        answer(&lifecycle, &mut session, &mut bus, false);
        assert!(matches!(session.stage, Stage::Feedback { .. }));

        lifecycle.restart(&mut session, &mut bus);
        assert_eq!(session.stage, Stage::Awaiting);

        // the old countdown must not re-deal behind our back
        bus.drain();
        for _ in 0..500 {
            lifecycle.tick(&mut session, &mut bus);
        }
        assert_eq!(session.stage, Stage::Awaiting);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_restart_from_terminal_resets_counters() {
        for correctly in [true, false] {
            let (lifecycle, mut session, mut bus) = playing();
            while session.phase == Phase::Playing {
                answer(&lifecycle, &mut session, &mut bus, correctly);
                ride_out_feedback(&lifecycle, &mut session, &mut bus);
            }
            bus.drain();

            assert_eq!(
                lifecycle.apply(&mut session, &mut bus, Action::Restart),
                Applied::Done
            );
            assert_eq!(session.phase, Phase::Playing);
            assert_eq!(session.scoreboard.score, 0);
            assert_eq!(session.scoreboard.wrong, 0);
            assert_eq!(session.level, lifecycle.tuning().start_level);
            assert_eq!(session.stage, Stage::Awaiting);
            assert!(session.round.is_some());
            assert!(bus.drain().contains(&Cue::NewQuestion));
        }
    }

    #[test]
    fn test_terminal_tap_restarts() {
        // pointer misses arrive as Start; on the end screens that means
        // play again
        let (lifecycle, mut session, mut bus) = playing();
        while session.phase == Phase::Playing {
            answer(&lifecycle, &mut session, &mut bus, false);
            ride_out_feedback(&lifecycle, &mut session, &mut bus);
        }
        assert_eq!(
            lifecycle.apply(&mut session, &mut bus, Action::Start),
            Applied::Done
        );
        assert_eq!(session.phase, Phase::Playing);
        assert_eq!(session.scoreboard.wrong, 0);
    }

    #[test]
    fn test_explicit_start_level() {
        let tuning = short_tuning();
        let lifecycle = RoundLifecycle::new(&tuning);
        let mut session = GameSession::new(3, &tuning);
        let mut bus = FeedbackBus::new();

        lifecycle.start_game(&mut session, &mut bus, Some(6));
        assert_eq!(session.level, 6);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arbitrary_action(code: u8) -> Action {
            match code {
                0 => Action::Start,
                1 => Action::SelectChoice(0),
                2 => Action::SelectChoice(2),
                3 => Action::SelectChoice(9),
                4 => Action::MoveSelection(1),
                5 => Action::Confirm,
                6 => Action::Cancel,
                7 => Action::ToggleAudio,
                8 => Action::MoveSelection(i32::MAX),
                _ => Action::Restart,
            }
        }

        proptest! {
            /// No action sequence can push the counters past their
            /// limits or leave a terminal phase by any route but restart
            #[test]
            fn prop_sessions_stay_bounded(
                seed in 0u64..300,
                codes in proptest::collection::vec(0u8..10, 1..150),
            ) {
                let tuning = short_tuning();
                let lifecycle = RoundLifecycle::new(&tuning);
                let mut session = GameSession::new(seed, &tuning);
                let mut bus = FeedbackBus::new();

                for code in codes {
                    let was_terminal = session.phase.is_terminal();
                    let action = arbitrary_action(code);
                    lifecycle.apply(&mut session, &mut bus, action);
                    lifecycle.tick(&mut session, &mut bus);
                    bus.drain();

                    let sb = &session.scoreboard;
                    prop_assert!(sb.score <= sb.score_goal);
                    prop_assert!(sb.wrong <= sb.max_wrong);
                    if was_terminal && !session.phase.is_terminal() {
                        prop_assert!(matches!(action, Action::Restart | Action::Start));
                    }
                    if session.phase == Phase::Won {
                        prop_assert_eq!(sb.score, sb.score_goal);
                    }
                    if session.phase == Phase::Lost {
                        prop_assert_eq!(sb.wrong, sb.max_wrong);
                    }
                }
            }
        }
    }
}
