//! The default canvas theme

use glam::{vec2, Vec2};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::engine::input::Hitbox;
use crate::engine::particles::BurstField;
use crate::engine::question::Question;
use crate::engine::runner::{RenderError, Renderer};
use crate::engine::state::{GameSession, Outcome, Phase, Stage};

// Sweetie-16 style palette
const BACKGROUND: &str = "#1a1c2c";
const CARD: &str = "#29366f";
const CARD_SELECTED: &str = "#3b5dc9";
const CARD_CORRECT: &str = "#38b764";
const CARD_WRONG: &str = "#b13e53";
const TEXT: &str = "#f4f4f4";
const TEXT_DIM: &str = "#94b0c2";
const ACCENT: &str = "#ffcd75";
const BANNER_BG: &str = "#333c57";

/// Spark tints, indexed by [`crate::engine::particles::Spark::tint`]
const SPARK_COLORS: [&str; 9] = [
    "#ffcd75", "#a7f070", "#73eff7", "#f4f4f4", "#ff77a8", "#ffec27", "#94b0c2", "#566c86",
    "#333c57",
];

fn jserr(e: JsValue) -> RenderError {
    RenderError::Backend(format!("{e:?}"))
}

/// Draws the whole game into one 2d context
pub struct CanvasTheme {
    ctx: CanvasRenderingContext2d,
    width: f32,
    height: f32,
}

impl CanvasTheme {
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, RenderError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|_| RenderError::ContextLost)?
            .ok_or(RenderError::ContextLost)?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| RenderError::ContextLost)?;
        Ok(Self {
            ctx,
            width: 0.0,
            height: 0.0,
        })
    }

    /// Record the CSS-pixel viewport and fold the device pixel ratio
    /// into the context transform. Resets instead of compounding, so
    /// resize events can call this freely.
    pub fn set_viewport(&mut self, css_width: f32, css_height: f32, dpr: f64) {
        self.width = css_width;
        self.height = css_height;
        let _ = self.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
    }

    fn clear(&self) {
        self.ctx.set_fill_style_str(BACKGROUND);
        self.ctx
            .fill_rect(0.0, 0.0, self.width as f64, self.height as f64);
    }

    fn rounded_rect(&self, pos: Vec2, size: Vec2, radius: f32) -> Result<(), RenderError> {
        let (x, y) = (pos.x as f64, pos.y as f64);
        let (w, h) = (size.x as f64, size.y as f64);
        let r = (radius as f64).min(w / 2.0).min(h / 2.0);

        let ctx = &self.ctx;
        ctx.begin_path();
        ctx.move_to(x + r, y);
        ctx.arc_to(x + w, y, x + w, y + h, r).map_err(jserr)?;
        ctx.arc_to(x + w, y + h, x, y + h, r).map_err(jserr)?;
        ctx.arc_to(x, y + h, x, y, r).map_err(jserr)?;
        ctx.arc_to(x, y, x + w, y, r).map_err(jserr)?;
        ctx.close_path();
        Ok(())
    }

    fn text_centered(&self, text: &str, center: Vec2, font: &str, color: &str) -> Result<(), RenderError> {
        self.ctx.set_font(font);
        self.ctx.set_text_align("center");
        self.ctx.set_text_baseline("middle");
        self.ctx.set_fill_style_str(color);
        self.ctx
            .fill_text(text, center.x as f64, center.y as f64)
            .map_err(jserr)
    }

    /// Question banner with a pill backdrop sized to the text
    fn draw_banner(&self, question: &Question, reveal: bool) -> Result<(), RenderError> {
        let text = if reveal {
            format!("{} = {}", question.prompt(), question.answer)
        } else {
            format!("{} = ?", question.prompt())
        };
        let font = format!("bold {}px system-ui, sans-serif", (self.height * 0.09) as i32);
        self.ctx.set_font(&font);
        let text_width = self.ctx.measure_text(&text).map_err(jserr)?.width() as f32;

        let pad = self.height * 0.045;
        let size = vec2(text_width + pad * 3.0, self.height * 0.09 + pad * 1.6);
        let center = vec2(self.width / 2.0, self.height * 0.3);

        self.ctx.set_fill_style_str(BANNER_BG);
        self.rounded_rect(center - size * 0.5, size, pad)?;
        self.ctx.fill();

        self.text_centered(&text, center, &font, TEXT)
    }

    /// Layout for a single centered row of choice cards
    fn card_layout(&self, count: usize) -> Vec<(Vec2, Vec2)> {
        let gap = 16.0_f32;
        let margin = 24.0_f32;
        let n = count as f32;
        let avail = self.width - margin * 2.0;
        let w = ((avail - gap * (n - 1.0)) / n).min(170.0);
        let h = (w * 0.62).min(self.height * 0.22);
        let row_w = w * n + gap * (n - 1.0);
        let x0 = (self.width - row_w) / 2.0;
        let y = self.height * 0.55;

        (0..count)
            .map(|i| (vec2(x0 + i as f32 * (w + gap), y), vec2(w, h)))
            .collect()
    }

    fn draw_playing(&self, session: &GameSession) -> Result<Vec<Hitbox>, RenderError> {
        let Some(round) = session.round.as_ref() else {
            return Ok(Vec::new());
        };

        // held feedback shows the judged colors and the solved equation
        let reveal = session.stage != Stage::Awaiting && round.outcome != Outcome::Pending;
        self.draw_banner(&round.question, reveal)?;

        let layout = self.card_layout(round.choices.len());
        let mut hitboxes = Vec::with_capacity(layout.len());

        for (i, (value, (pos, size))) in round.choices.values().iter().zip(layout).enumerate() {
            let selected = round.selected == Some(i);
            let is_answer = *value == round.question.answer;

            let fill = if reveal && is_answer {
                CARD_CORRECT
            } else if reveal && selected {
                CARD_WRONG
            } else if selected {
                CARD_SELECTED
            } else {
                CARD
            };
            if reveal && !is_answer && !selected {
                self.ctx.set_global_alpha(0.55);
            }

            self.ctx.set_fill_style_str(fill);
            self.rounded_rect(pos, size, 12.0)?;
            self.ctx.fill();

            if selected && !reveal {
                self.ctx.set_stroke_style_str(ACCENT);
                self.ctx.set_line_width(4.0);
                self.rounded_rect(pos, size, 12.0)?;
                self.ctx.stroke();
            }

            let value_font = format!("bold {}px system-ui, sans-serif", (size.y * 0.42) as i32);
            self.text_centered(&value.to_string(), pos + size * 0.5, &value_font, TEXT)?;

            // keyboard hint in the card corner
            let hint_font = format!("{}px system-ui, sans-serif", (size.y * 0.2) as i32);
            self.text_centered(
                &(i + 1).to_string(),
                pos + vec2(size.y * 0.18, size.y * 0.2),
                &hint_font,
                TEXT_DIM,
            )?;

            self.ctx.set_global_alpha(1.0);
            hitboxes.push(Hitbox::new(i, pos, size));
        }

        Ok(hitboxes)
    }

    fn draw_title(&self) -> Result<(), RenderError> {
        let big = format!("bold {}px system-ui, sans-serif", (self.height * 0.14) as i32);
        let small = format!("{}px system-ui, sans-serif", (self.height * 0.045) as i32);
        self.text_centered(
            "Math Pop!",
            vec2(self.width / 2.0, self.height * 0.38),
            &big,
            ACCENT,
        )?;
        self.text_centered(
            "tap anywhere to play",
            vec2(self.width / 2.0, self.height * 0.58),
            &small,
            TEXT,
        )
    }

    fn draw_terminal(&self, session: &GameSession) -> Result<(), RenderError> {
        let (title, color) = match session.phase {
            Phase::Won => ("You did it! ★", ACCENT),
            _ => ("Good try!", TEXT),
        };
        let big = format!("bold {}px system-ui, sans-serif", (self.height * 0.11) as i32);
        let small = format!("{}px system-ui, sans-serif", (self.height * 0.045) as i32);

        self.text_centered(title, vec2(self.width / 2.0, self.height * 0.36), &big, color)?;
        self.text_centered(
            &format!(
                "{} right answers",
                session.scoreboard.display_score()
            ),
            vec2(self.width / 2.0, self.height * 0.5),
            &small,
            TEXT,
        )?;
        self.text_centered(
            "tap or press R to play again",
            vec2(self.width / 2.0, self.height * 0.62),
            &small,
            TEXT_DIM,
        )
    }

    fn draw_hud(&self, session: &GameSession) -> Result<(), RenderError> {
        let sb = &session.scoreboard;
        let font = format!("bold {}px system-ui, sans-serif", (self.height * 0.04) as i32);

        self.ctx.set_font(&font);
        self.ctx.set_text_align("left");
        self.ctx.set_text_baseline("middle");
        self.ctx.set_fill_style_str(ACCENT);
        self.ctx
            .fill_text(
                &format!("★ {} / {}", sb.display_score(), sb.score_goal),
                20.0,
                30.0,
            )
            .map_err(jserr)?;
        self.ctx.set_fill_style_str(TEXT_DIM);
        self.ctx
            .fill_text(&format!("level {}", session.level), 20.0, 58.0)
            .map_err(jserr)?;

        // hearts, lost ones hollowed out
        let spacing = self.height * 0.05;
        let x0 = self.width - 20.0 - spacing * sb.max_wrong as f32;
        for i in 0..sb.max_wrong {
            let alive = i < sb.lives_left();
            self.ctx
                .set_fill_style_str(if alive { CARD_WRONG } else { TEXT_DIM });
            self.ctx
                .fill_text(
                    if alive { "♥" } else { "♡" },
                    (x0 + spacing * i as f32) as f64,
                    30.0,
                )
                .map_err(jserr)?;
        }

        if !session.audio_on {
            let small = format!("{}px system-ui, sans-serif", (self.height * 0.03) as i32);
            self.ctx.set_font(&small);
            self.ctx.set_text_align("center");
            self.ctx.set_fill_style_str(TEXT_DIM);
            self.ctx
                .fill_text("sound off - M", (self.width / 2.0) as f64, 30.0)
                .map_err(jserr)?;
        }
        Ok(())
    }

    fn draw_sparks(&self, sparks: &BurstField) -> Result<(), RenderError> {
        for spark in sparks.sparks() {
            self.ctx.set_global_alpha(spark.life.clamp(0.0, 1.0) as f64);
            self.ctx
                .set_fill_style_str(SPARK_COLORS[spark.tint as usize % SPARK_COLORS.len()]);
            self.ctx.begin_path();
            self.ctx
                .arc(
                    spark.pos.x as f64,
                    spark.pos.y as f64,
                    spark.size.max(0.5) as f64,
                    0.0,
                    std::f64::consts::TAU,
                )
                .map_err(jserr)?;
            self.ctx.fill();
        }
        self.ctx.set_global_alpha(1.0);
        Ok(())
    }
}

impl Renderer for CanvasTheme {
    fn draw(
        &mut self,
        session: &GameSession,
        sparks: &BurstField,
    ) -> Result<Vec<Hitbox>, RenderError> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(RenderError::Backend("viewport not set".into()));
        }

        self.clear();
        let hitboxes = match session.phase {
            Phase::Title => {
                self.draw_title()?;
                Vec::new()
            }
            Phase::Playing => self.draw_playing(session)?,
            Phase::Won | Phase::Lost => {
                self.draw_terminal(session)?;
                Vec::new()
            }
        };
        self.draw_sparks(sparks)?;
        if session.phase != Phase::Title {
            self.draw_hud(session)?;
        }
        Ok(hitboxes)
    }
}
