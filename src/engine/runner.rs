//! Frame runner: fixed-order glue between input, lifecycle, and theme
//!
//! Every animation frame runs the same sequence: drain queued actions,
//! advance timers, fan out cues, then draw. Rendering is fallible but
//! never fatal; a failed frame keeps the previous hitboxes live.

use glam::Vec2;
use thiserror::Error;

use crate::consts::{MAX_CATCHUP_TICKS, TICK_DT};
use crate::engine::feedback::{Cue, CueSink, FeedbackBus, SoundEmitter};
use crate::engine::input::{Hitbox, InputRouter};
use crate::engine::lifecycle::RoundLifecycle;
use crate::engine::particles::{BurstField, BurstKind};
use crate::engine::state::GameSession;
use crate::tuning::Tuning;

/// Why a frame could not be drawn
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("2d context unavailable")]
    ContextLost,
    #[error("draw failed: {0}")]
    Backend(String),
}

/// Draws one frame and reports where the choice cards landed
pub trait Renderer {
    fn draw(&mut self, session: &GameSession, sparks: &BurstField)
        -> Result<Vec<Hitbox>, RenderError>;
}

/// Owns the session and everything plugged into it
pub struct GameLoop<R: Renderer, S: SoundEmitter> {
    session: GameSession,
    lifecycle: RoundLifecycle,
    bus: FeedbackBus,
    router: InputRouter,
    sparks: BurstField,
    renderer: R,
    sound: S,
    sinks: Vec<Box<dyn CueSink>>,
    accumulator: f32,
    last_ms: f64,
}

impl<R: Renderer, S: SoundEmitter> GameLoop<R, S> {
    pub fn new(seed: u64, tuning: &Tuning, renderer: R, sound: S) -> Self {
        let tuning = tuning.sanitized();
        Self {
            session: GameSession::new(seed, &tuning),
            lifecycle: RoundLifecycle::new(&tuning),
            bus: FeedbackBus::new(),
            router: InputRouter::new(tuning.input_mode),
            sparks: BurstField::new(),
            renderer,
            sound,
            sinks: Vec::new(),
            accumulator: 0.0,
            last_ms: 0.0,
        }
    }

    /// Register an extra cue listener (announcers, overlays)
    pub fn add_sink(&mut self, sink: Box<dyn CueSink>) {
        self.sinks.push(sink);
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Read-only JSON snapshot of the whole session
    pub fn snapshot_json(&self) -> String {
        self.session.to_json()
    }

    pub fn router_mut(&mut self) -> &mut InputRouter {
        &mut self.router
    }

    /// Theme access for host-driven resizes
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn sparks(&self) -> &BurstField {
        &self.sparks
    }

    // === Host surface ===

    /// Begin (or begin again) at an optional explicit level
    pub fn start_game(&mut self, level: Option<u32>) {
        self.lifecycle.start_game(&mut self.session, &mut self.bus, level);
    }

    pub fn restart(&mut self) {
        self.lifecycle.restart(&mut self.session, &mut self.bus);
    }

    /// Toggle audio, or force it with `Some(desired)`
    pub fn toggle_audio(&mut self, on: Option<bool>) {
        if on == Some(self.session.audio_on) {
            return;
        }
        self.lifecycle.apply(
            &mut self.session,
            &mut self.bus,
            crate::engine::input::Action::ToggleAudio,
        );
    }

    // === Frame driving ===

    /// One animation-frame callback. `now_ms` is the host clock
    /// (`performance.now()` on the web).
    pub fn frame(&mut self, now_ms: f64) {
        let dt = if self.last_ms > 0.0 {
            ((now_ms - self.last_ms) / 1000.0) as f32
        } else {
            TICK_DT
        };
        self.last_ms = now_ms;
        // a backgrounded tab can hand us a huge gap
        let dt = dt.min(0.25);

        self.accumulator += dt;
        let mut steps = 0;
        while self.accumulator >= TICK_DT && steps < MAX_CATCHUP_TICKS {
            self.step();
            self.accumulator -= TICK_DT;
            steps += 1;
        }
        if steps == MAX_CATCHUP_TICKS {
            // shed the backlog instead of spiraling
            self.accumulator = 0.0;
        }

        self.draw();
    }

    /// One deterministic logic tick: input, timers, cues, spark decay.
    /// Public so tests and the native demo can drive time directly.
    pub fn step(&mut self) {
        for action in self.router.drain() {
            self.lifecycle.apply(&mut self.session, &mut self.bus, action);
        }
        self.lifecycle.tick(&mut self.session, &mut self.bus);
        for cue in self.bus.drain() {
            self.dispatch(cue);
        }
        self.sparks.update(TICK_DT);
    }

    fn dispatch(&mut self, cue: Cue) {
        match cue {
            Cue::AudioOn => self.sound.set_muted(false),
            Cue::AudioOff => self.sound.set_muted(true),
            _ => {}
        }
        self.sound.play(cue);
        for sink in self.sinks.iter_mut() {
            sink.on_cue(cue);
        }
        self.spawn_burst(cue);
    }

    fn spawn_burst(&mut self, cue: Cue) {
        let kind = match cue {
            Cue::Correct => BurstKind::Confetti,
            Cue::Incorrect => BurstKind::Puff,
            Cue::Won => BurstKind::Fireworks,
            Cue::Lost => BurstKind::Fizzle,
            // a fresh deal starts on a clean board; this is also what
            // sweeps the end-screen shower on restart
            Cue::NewQuestion => {
                self.sparks.clear();
                return;
            }
            _ => return,
        };
        let Some(anchor) = self.burst_anchor() else {
            return;
        };
        self.sparks.burst(anchor, kind, self.session.ticks as u32);
    }

    /// Selected card center, falling back to the board centroid.
    /// Before anything has been drawn there is nowhere to anchor.
    fn burst_anchor(&self) -> Option<Vec2> {
        let boxes = self.router.hitboxes();
        if let Some(selected) = self.session.round.as_ref().and_then(|r| r.selected) {
            if let Some(hit) = boxes.iter().find(|h| h.index == selected) {
                return Some(hit.center());
            }
        }
        if boxes.is_empty() {
            return None;
        }
        let sum: Vec2 = boxes.iter().map(|h| h.center()).sum();
        Some(sum / boxes.len() as f32)
    }

    fn draw(&mut self) {
        match self.renderer.draw(&self.session, &self.sparks) {
            Ok(hitboxes) => self.router.set_hitboxes(hitboxes),
            Err(e) => log::warn!("Frame dropped: {e}"),
        }
    }
}
