//! Audio system using Web Audio API
//!
//! Every cue is a tiny oscillator jingle - no sample files. Synth calls
//! swallow their own failures; a dropped beep must never reach gameplay.

use web_sys::{AudioContext, OscillatorType};

use crate::engine::feedback::{Cue, SoundEmitter};

/// One scheduled oscillator voice
struct Tone {
    /// Seconds after "now" the voice starts
    at: f64,
    freq: f32,
    /// Pitch glide target, if the voice should sweep
    glide_to: Option<f32>,
    /// Seconds from start to silence
    dur: f64,
    /// Peak gain as a share of the effective volume
    peak: f32,
    shape: OscillatorType,
}

impl Tone {
    fn new(at: f64, freq: f32, dur: f64, peak: f32, shape: OscillatorType) -> Self {
        Self {
            at,
            freq,
            glide_to: None,
            dur,
            peak,
            shape,
        }
    }

    fn glide(mut self, to: f32) -> Self {
        self.glide_to = Some(to);
        self
    }
}

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    /// Output gain, with headroom for stacked voices
    volume: f32,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        // May fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            volume: 0.8,
            muted: false,
        }
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    /// Play the jingle for one cue
    pub fn play(&self, cue: Cue) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }

        let Some(ctx) = &self.ctx else { return };

        // Resume context if suspended (browsers require user gesture)
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        for tone in Self::voices_for(cue) {
            self.schedule(ctx, vol, tone);
        }
    }

    /// The score: every cue spelled out as oscillator voices. Kept in
    /// one place so the whole sound of the game is readable at a glance.
    fn voices_for(cue: Cue) -> Vec<Tone> {
        use OscillatorType::{Sine, Triangle};
        match cue {
            // rising whoosh while the fresh cards land
            Cue::NewQuestion => vec![Tone::new(0.0, 220.0, 0.22, 0.22, Triangle).glide(660.0)],
            Cue::Select => vec![Tone::new(0.0, 340.0, 0.06, 0.2, Triangle)],
            // C5 E5 G5 major arpeggio
            Cue::Correct => vec![
                Tone::new(0.0, 523.0, 0.16, 0.25, Sine),
                Tone::new(0.07, 659.0, 0.16, 0.25, Sine),
                Tone::new(0.14, 784.0, 0.22, 0.25, Sine),
            ],
            // soft downward wah, kept gentle for small players
            Cue::Incorrect => vec![Tone::new(0.0, 311.0, 0.35, 0.28, Sine).glide(165.0)],
            Cue::Won => vec![
                Tone::new(0.0, 523.0, 0.3, 0.28, Triangle),
                Tone::new(0.12, 659.0, 0.3, 0.28, Triangle),
                Tone::new(0.24, 784.0, 0.3, 0.28, Triangle),
                Tone::new(0.36, 1046.0, 0.5, 0.3, Triangle),
            ],
            Cue::Lost => vec![
                Tone::new(0.0, 392.0, 0.28, 0.26, Sine),
                Tone::new(0.22, 330.0, 0.28, 0.26, Sine),
                Tone::new(0.44, 262.0, 0.4, 0.26, Sine),
            ],
            // single high blip confirms sound is back
            Cue::AudioOn => vec![Tone::new(0.0, 880.0, 0.1, 0.18, Sine)],
            Cue::AudioOff => Vec::new(),
        }
    }

    /// Build and start one voice; any failed node leaves a silent gap
    fn schedule(&self, ctx: &AudioContext, vol: f32, tone: Tone) {
        let Ok(osc) = ctx.create_oscillator() else {
            return;
        };
        let Ok(gain) = ctx.create_gain() else {
            return;
        };
        if osc.connect_with_audio_node(&gain).is_err()
            || gain.connect_with_audio_node(&ctx.destination()).is_err()
        {
            return;
        }

        let t = ctx.current_time() + tone.at;
        osc.set_type(tone.shape);
        osc.frequency().set_value_at_time(tone.freq, t).ok();
        if let Some(target) = tone.glide_to {
            osc.frequency()
                .exponential_ramp_to_value_at_time(target, t + tone.dur * 0.8)
                .ok();
        }

        gain.gain().set_value_at_time(vol * tone.peak, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.001, t + tone.dur)
            .ok();

        osc.start_with_when(t).ok();
        osc.stop_with_when(t + tone.dur + 0.05).ok();
    }
}

impl SoundEmitter for AudioManager {
    fn play(&mut self, cue: Cue) {
        AudioManager::play(self, cue);
    }

    fn set_muted(&mut self, muted: bool) {
        AudioManager::set_muted(self, muted);
    }
}
