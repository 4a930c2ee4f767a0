//! Canvas 2d rendering module
//!
//! One chunky, readable theme: question banner, choice cards, score and
//! lives HUD, spark overlay. All drawing happens in CSS pixel space;
//! the device pixel ratio is absorbed by a single context transform.

pub mod canvas;

pub use canvas::CanvasTheme;
