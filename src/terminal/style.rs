//! Style tokens and per-element palettes

use crossterm::style::{Attribute, Color, SetAttribute, SetForegroundColor};
use crossterm::Command;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// An opaque run of SGR escape codes.
///
/// Styles are applied with [`Style::paint`], which always closes the styled
/// segment with a reset so nothing leaks into later terminal output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style {
    codes: String,
}

impl Style {
    /// A style that leaves text untouched
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a list of color/attribute names, e.g. `["bright_green", "italic"]`.
    /// Unknown names are skipped.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|name| {
                let parsed = parse_name(name.as_ref());
                if parsed.is_none() {
                    warn!(name = name.as_ref(), "ignoring unknown style name");
                }
                parsed
            })
            .collect()
    }

    /// Append another style's codes after this one
    pub fn then(mut self, other: impl Into<Style>) -> Self {
        self.codes.push_str(&other.into().codes);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Raw escape codes of this style
    pub fn codes(&self) -> &str {
        &self.codes
    }

    /// Wrap `text` in this style followed by a reset.
    /// An empty style returns the text as-is.
    pub fn paint(&self, text: &str) -> String {
        if self.codes.is_empty() {
            return text.to_string();
        }
        format!("{}{}{}", self.codes, text, reset())
    }
}

impl From<Color> for Style {
    fn from(color: Color) -> Self {
        Self {
            codes: ansi(SetForegroundColor(color)),
        }
    }
}

impl From<Attribute> for Style {
    fn from(attribute: Attribute) -> Self {
        Self {
            codes: ansi(SetAttribute(attribute)),
        }
    }
}

impl FromIterator<Style> for Style {
    fn from_iter<T: IntoIterator<Item = Style>>(iter: T) -> Self {
        iter.into_iter().fold(Style::new(), |acc, style| acc.then(style))
    }
}

/// The SGR reset sequence
pub fn reset() -> String {
    ansi(SetAttribute(Attribute::Reset))
}

fn ansi(command: impl Command) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = command.write_ansi(&mut out);
    out
}

fn parse_name(name: &str) -> Option<Style> {
    let key = name.trim().to_lowercase().replace(['-', ' '], "_");
    let color = match key.as_str() {
        "black" => Color::Black,
        "blue" => Color::DarkBlue,
        "cyan" => Color::DarkCyan,
        "gray" | "grey" => Color::DarkGrey,
        "green" => Color::DarkGreen,
        "magenta" => Color::Magenta,
        "orange" => Color::DarkYellow,
        "purple" => Color::DarkMagenta,
        "red" => Color::DarkRed,
        "white" => Color::Grey,
        "yellow" => Color::Yellow,
        "bright_black" => Color::DarkGrey,
        "bright_blue" => Color::Blue,
        "bright_cyan" => Color::Cyan,
        "bright_gray" | "bright_grey" => Color::Grey,
        "bright_green" => Color::Green,
        "bright_magenta" => Color::Magenta,
        "bright_orange" => Color::AnsiValue(214),
        "bright_purple" => Color::AnsiValue(135),
        "bright_red" => Color::Red,
        "bright_white" => Color::White,
        "bright_yellow" => Color::Yellow,
        _ => return parse_attribute(&key).map(Style::from),
    };
    Some(Style::from(color))
}

fn parse_attribute(key: &str) -> Option<Attribute> {
    let attribute = match key {
        "bold" => Attribute::Bold,
        "dim" => Attribute::Dim,
        "italic" => Attribute::Italic,
        "underline" => Attribute::Underlined,
        "blink" => Attribute::SlowBlink,
        "inverse" | "reverse" => Attribute::Reverse,
        "strikethrough" => Attribute::CrossedOut,
        _ => return None,
    };
    Some(attribute)
}

/// Color names for each rendered element, as read from configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSettings {
    /// Message text
    pub message: Vec<String>,
    /// Prefix label
    pub prefix: Vec<String>,
    /// Delimiter between prefix and frame
    pub delimiter: Vec<String>,
    /// Spinner frame
    pub spinner: Vec<String>,
    /// Message written by `done`
    pub done: Vec<String>,
    /// Message written by `fail`
    pub fail: Vec<String>,
}

/// Resolved styles for each rendered element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    pub message: Style,
    pub prefix: Style,
    pub delimiter: Style,
    pub spinner: Style,
    pub done: Style,
    pub fail: Style,
}

impl Palette {
    pub fn from_settings(settings: &ColorSettings) -> Self {
        Self {
            message: Style::from_names(&settings.message),
            prefix: Style::from_names(&settings.prefix),
            delimiter: Style::from_names(&settings.delimiter),
            spinner: Style::from_names(&settings.spinner),
            done: Style::from_names(&settings.done),
            fail: Style::from_names(&settings.fail),
        }
    }
}
