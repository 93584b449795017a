//! Render state shared between the caller and the render loop
//!
//! Lock layout: `core` is the coarse reader/writer lock for the lifecycle
//! flag, frames and glyph styling. Message and prefix each have their own
//! lock so updating them never waits on the lifecycle.

use crate::terminal::{Palette, Style};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Text with the style it is painted in
#[derive(Debug, Clone, Default)]
pub(crate) struct Label {
    pub text: String,
    pub style: Style,
}

impl Label {
    fn new(text: String, style: Style) -> Self {
        Self { text, style }
    }

    fn painted(&self) -> String {
        if self.text.is_empty() {
            return String::new();
        }
        self.style.paint(&self.text)
    }
}

#[derive(Debug)]
pub(crate) struct Core {
    pub active: bool,
    pub frames: Vec<String>,
    pub frame_index: usize,
    pub spinner_style: Style,
    pub delimiter: Label,
    pub done_symbol: String,
    pub done_style: Style,
    pub fail_symbol: String,
    pub fail_style: Style,
}

/// Everything the render loop reads
#[derive(Debug)]
pub(crate) struct RenderState {
    core: RwLock<Core>,
    message: RwLock<Label>,
    prefix: RwLock<Label>,
}

/// Which terminal line a finished spinner prints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Stopped,
    Done,
    Failed,
}

pub(crate) struct Seed {
    pub message: String,
    pub prefix: String,
    pub delimiter: String,
    pub frames: Vec<String>,
    pub done_symbol: String,
    pub fail_symbol: String,
    pub palette: Palette,
}

impl RenderState {
    pub fn new(seed: Seed) -> Self {
        let Seed {
            message,
            prefix,
            delimiter,
            frames,
            done_symbol,
            fail_symbol,
            palette,
        } = seed;

        Self {
            core: RwLock::new(Core {
                active: false,
                frames,
                frame_index: 0,
                spinner_style: palette.spinner,
                delimiter: Label::new(delimiter, palette.delimiter),
                done_symbol,
                done_style: palette.done,
                fail_symbol,
                fail_style: palette.fail,
            }),
            message: RwLock::new(Label::new(message, palette.message)),
            prefix: RwLock::new(Label::new(prefix, palette.prefix)),
        }
    }

    pub fn core(&self) -> RwLockReadGuard<'_, Core> {
        self.core.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn core_mut(&self) -> RwLockWriteGuard<'_, Core> {
        self.core.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn message_label(&self) -> RwLockReadGuard<'_, Label> {
        self.message.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn prefix_label(&self) -> RwLockReadGuard<'_, Label> {
        self.prefix.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Flip to active. Returns false if already active.
    pub fn activate(&self) -> bool {
        let mut core = self.core_mut();
        if core.active {
            return false;
        }
        core.active = true;
        true
    }

    /// Flip to inactive. Returns false if already inactive.
    pub fn deactivate(&self) -> bool {
        let mut core = self.core_mut();
        if !core.active {
            return false;
        }
        core.active = false;
        true
    }

    pub fn is_active(&self) -> bool {
        self.core().active
    }

    pub fn message(&self) -> String {
        self.message_label().text.clone()
    }

    pub fn prefix(&self) -> String {
        self.prefix_label().text.clone()
    }

    pub fn set_message(&self, text: &str) {
        let mut label = self.message.write().unwrap_or_else(PoisonError::into_inner);
        label.text = text.to_string();
    }

    pub fn set_message_style(&self, style: Style) {
        let mut label = self.message.write().unwrap_or_else(PoisonError::into_inner);
        label.style = style;
    }

    pub fn set_prefix(&self, text: &str) {
        let mut label = self.prefix.write().unwrap_or_else(PoisonError::into_inner);
        label.text = text.to_string();
    }

    pub fn set_prefix_style(&self, style: Style) {
        let mut label = self.prefix.write().unwrap_or_else(PoisonError::into_inner);
        label.style = style;
    }

    pub fn set_spinner_style(&self, style: Style) {
        self.core_mut().spinner_style = style;
    }

    /// Swap the frame set. The tick counter keeps running, so the next frame
    /// shown is `frames[tick % len]`, not necessarily the first one.
    pub fn set_frames(&self, frames: Vec<String>) {
        let mut core = self.core_mut();
        core.frame_index = if frames.is_empty() {
            0
        } else {
            core.frame_index % frames.len()
        };
        core.frames = frames;
    }

    pub fn frames(&self) -> Vec<String> {
        self.core().frames.clone()
    }

    pub fn frame_index(&self) -> usize {
        self.core().frame_index
    }

    /// Compose the line for render tick `tick`. Returns `None` once the
    /// spinner has been deactivated.
    pub fn render(&self, tick: usize) -> Option<String> {
        let (frame, delimiter) = {
            let mut core = self.core_mut();
            if !core.active {
                return None;
            }
            let frame = if core.frames.is_empty() {
                String::new()
            } else {
                core.frame_index = tick % core.frames.len();
                core.spinner_style.paint(&core.frames[core.frame_index])
            };
            (frame, core.delimiter.painted())
        };
        Some(self.compose(&frame, &delimiter, &self.message_label().painted()))
    }

    /// The single line a finished spinner leaves behind, or `None` when
    /// there is nothing to print. `text` is `None` when the caller passed no
    /// message at all; an empty message still prints the glyph.
    pub fn final_line(&self, outcome: Outcome, text: Option<&str>) -> Option<String> {
        let text = match (outcome, text) {
            (Outcome::Failed, None) => "Failed",
            (_, None) => return None,
            (_, Some(text)) => text,
        };

        let (glyph, body, delimiter) = {
            let core = self.core();
            let (glyph, style) = match outcome {
                Outcome::Stopped => (String::new(), Style::new()),
                Outcome::Done => (core.done_symbol.clone(), core.done_style.clone()),
                Outcome::Failed => (core.fail_symbol.clone(), core.fail_style.clone()),
            };
            (glyph, style.paint(text), core.delimiter.painted())
        };
        Some(self.compose(&glyph, &delimiter, &body))
    }

    fn compose(&self, glyph: &str, delimiter: &str, body: &str) -> String {
        let prefix = self.prefix_label();
        let head = if glyph.is_empty() {
            String::new()
        } else {
            format!("{} ", glyph)
        };
        if prefix.text.is_empty() {
            format!("{}{}", head, body)
        } else {
            format!("{}{}{}{}", prefix.painted(), delimiter, head, body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::style::Color;

    fn seed(frames: &[&str]) -> Seed {
        Seed {
            message: "Loading".to_string(),
            prefix: String::new(),
            delimiter: " | ".to_string(),
            frames: frames.iter().map(|f| f.to_string()).collect(),
            done_symbol: "✓".to_string(),
            fail_symbol: "✗".to_string(),
            palette: Palette::default(),
        }
    }

    #[test]
    fn test_render_requires_active() {
        let state = RenderState::new(seed(&["a", "b"]));
        assert_eq!(state.render(0), None);
        assert!(state.activate());
        assert!(!state.activate());
        assert_eq!(state.render(0).as_deref(), Some("a Loading"));
    }

    #[test]
    fn test_render_cycles_frames() {
        let state = RenderState::new(seed(&["a", "b", "c"]));
        state.activate();
        let frames: Vec<String> = (0..7)
            .map(|tick| state.render(tick).unwrap())
            .map(|line| line.split(' ').next().unwrap().to_string())
            .collect();
        assert_eq!(frames, ["a", "b", "c", "a", "b", "c", "a"]);
        assert_eq!(state.frame_index(), 0);
    }

    #[test]
    fn test_empty_frames_render_blank() {
        let state = RenderState::new(seed(&[]));
        state.activate();
        assert_eq!(state.render(5).as_deref(), Some("Loading"));
        assert_eq!(state.frame_index(), 0);
    }

    #[test]
    fn test_prefix_and_delimiter() {
        let state = RenderState::new(seed(&["*"]));
        state.activate();
        state.set_prefix("Backup");
        assert_eq!(state.render(0).as_deref(), Some("Backup | * Loading"));
    }

    #[test]
    fn test_styles_are_reset() {
        let state = RenderState::new(seed(&["*"]));
        state.activate();
        state.set_spinner_style(Style::from(Color::Red));
        state.set_message_style(Style::from(Color::Blue));
        let line = state.render(0).unwrap();
        let red = Style::from(Color::Red).codes().to_string();
        let blue = Style::from(Color::Blue).codes().to_string();
        assert_eq!(line, format!("{red}*\x1b[0m {blue}Loading\x1b[0m"));
    }

    #[test]
    fn test_set_frames_keeps_cycle_position() {
        let state = RenderState::new(seed(&["a", "b", "c"]));
        state.activate();
        state.render(7);
        assert_eq!(state.frame_index(), 1);

        state.set_frames(vec!["x".to_string(), "y".to_string()]);
        assert_eq!(state.frame_index(), 1);
        assert!(state.render(8).unwrap().starts_with('x'));
        assert!(state.render(9).unwrap().starts_with('y'));
    }

    #[test]
    fn test_final_lines() {
        let state = RenderState::new(seed(&["*"]));
        assert_eq!(state.final_line(Outcome::Done, None), None);
        assert_eq!(state.final_line(Outcome::Stopped, None), None);
        assert_eq!(
            state.final_line(Outcome::Failed, None).as_deref(),
            Some("✗ Failed")
        );
        assert_eq!(
            state.final_line(Outcome::Done, Some("all good")).as_deref(),
            Some("✓ all good")
        );
        assert_eq!(
            state.final_line(Outcome::Stopped, Some("Done")).as_deref(),
            Some("Done")
        );

        state.set_prefix("Job");
        assert_eq!(
            state.final_line(Outcome::Done, Some("ok")).as_deref(),
            Some("Job | ✓ ok")
        );
    }

    #[test]
    fn test_empty_message_still_prints_glyph() {
        let state = RenderState::new(seed(&["*"]));
        assert_eq!(state.final_line(Outcome::Done, Some("")).as_deref(), Some("✓ "));
        assert_eq!(state.final_line(Outcome::Failed, Some("")).as_deref(), Some("✗ "));
        assert_eq!(state.final_line(Outcome::Stopped, Some("")).as_deref(), Some(""));
    }
}
