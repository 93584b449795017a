//! Frame catalog
//!
//! Named glyph sequences a spinner can cycle through. The catalog is plain
//! data; a spinner only ever sees the resolved `Vec<String>`.

use serde::{Deserialize, Serialize};

/// Name of the catalog entry used when nothing else is configured
pub const DEFAULT_SYMBOLS: &str = "default";

const CATALOG: &[(&str, &[&str])] = &[
    ("default", &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    ("block", &["░", "▒", "▒", "░", "▓"]),
    ("dots", &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"]),
    (
        "dots2",
        &[
            "  . . . .",
            ".   . . .",
            ". .   . .",
            ". . .   .",
            ". . . .  ",
            ". . . . .",
        ],
    ),
    (
        "dots3",
        &[
            "⠄", "⠆", "⠇", "⠋", "⠙", "⠸", "⠰", "⠠", "⠰", "⠸", "⠙", "⠋", "⠇", "⠆",
        ],
    ),
    ("dots4", &["⠁", "⠂", "⠄", "⡀", "⢀", "⠠", "⠐", "⠈"]),
    (
        "dots5",
        &[
            "⠁", "⠁", "⠉", "⠙", "⠚", "⠒", "⠂", "⠂", "⠒", "⠲", "⠴", "⠤", "⠄", "⠄", "⠤", "⠠",
            "⠠", "⠤", "⠦", "⠖", "⠒", "⠐", "⠐", "⠒", "⠓", "⠋", "⠉", "⠈", "⠈",
        ],
    ),
    ("lines", &["⠂", "-", "–", "—", "–", "-"]),
    ("wave", &["⢄", "⢂", "⢁", "⡁", "⡈", "⡐", "⡠"]),
    ("grow", &["▉", "▊", "▋", "▌", "▍", "▎", "▏"]),
    ("grow_vert", &["▁", "▃", "▄", "▅", "▆", "▇", "▆", "▅", "▄", "▃"]),
    ("moon", &["🌑", "🌒", "🌓", "🌔", "🌕", "🌖", "🌗", "🌘"]),
    ("pipe", &["|", "/", "-", "\\"]),
    ("pipe2", &["┤", "┘", "┴", "└", "├", "┌", "┬", "┐"]),
    ("square", &["▖", "▘", "▝", "▗"]),
    (
        "clock",
        &[
            "🕛", "🕐", "🕑", "🕒", "🕓", "🕔", "🕕", "🕖", "🕗", "🕘", "🕙", "🕚",
        ],
    ),
    ("diamond", &["◇", "◈", "⬟", "◆"]),
    ("plus_cross", &["+", "x"]),
    ("arrows", &["<", "<<", "<<<", "-", ">", ">>", ">>>"]),
    ("arrows2", &[">   ", ">>  ", ">>> ", ">>>>"]),
    (
        "arrows3",
        &["▹▹▹▹▹", "▸▹▹▹▹", "▹▸▹▹▹", "▹▹▸▹▹", "▹▹▹▸▹", "▹▹▹▹▸"],
    ),
    ("circles", &["o", "O", "@", "*"]),
    ("circles2", &[".", "o", "O", "°", "O", "o", "."]),
    (
        "bounce",
        &[
            "[    ]", "[=   ]", "[==  ]", "[=== ]", "[ ===]", "[  ==]", "[   =]", "[    ]",
            "[   =]", "[  ==]", "[ ===]", "[====]", "[=== ]", "[==  ]", "[=   ]",
        ],
    ),
    (
        "bounce_ball",
        &[
            "( ●    )", "(  ●   )", "(   ●  )", "(    ● )", "(     ●)", "(    ● )", "(   ●  )",
            "(  ●   )", "( ●    )", "(●     )",
        ],
    ),
    ("toggle", &["■", "□", "▪", "▫"]),
    ("toggle2", &["=", "*", "-"]),
    (
        "loading",
        &[
            "l      ",
            "lo     ",
            "loa    ",
            "load   ",
            "loadi  ",
            "loadin ",
            "loading",
            "loading.",
            "loading..",
            "loading...",
            "loading....",
        ],
    ),
];

/// Where a spinner gets its frames from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameSource {
    /// A catalog entry, looked up by name
    Named(String),
    /// An explicit list of frames
    Literal(Vec<String>),
}

impl FrameSource {
    /// Resolve to concrete frames. Returns `None` for an unknown catalog name.
    pub fn resolve(&self) -> Option<Vec<String>> {
        match self {
            FrameSource::Named(name) => lookup(name),
            FrameSource::Literal(frames) => Some(frames.clone()),
        }
    }
}

impl Default for FrameSource {
    fn default() -> Self {
        FrameSource::Named(DEFAULT_SYMBOLS.to_string())
    }
}

impl From<&str> for FrameSource {
    fn from(name: &str) -> Self {
        FrameSource::Named(name.to_string())
    }
}

impl From<Vec<String>> for FrameSource {
    fn from(frames: Vec<String>) -> Self {
        FrameSource::Literal(frames)
    }
}

impl From<Vec<&str>> for FrameSource {
    fn from(frames: Vec<&str>) -> Self {
        FrameSource::Literal(frames.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for FrameSource {
    fn from(frames: [&str; N]) -> Self {
        FrameSource::Literal(frames.iter().map(|f| f.to_string()).collect())
    }
}

/// All catalog entry names, in catalog order
pub fn names() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|(name, _)| *name)
}

/// Iterate the whole catalog as `(name, frames)` pairs
pub fn catalog() -> impl Iterator<Item = (&'static str, &'static [&'static str])> {
    CATALOG.iter().copied()
}

/// Look up a catalog entry. Matching ignores case and treats `-` as `_`.
pub fn lookup(name: &str) -> Option<Vec<String>> {
    let key = name.trim().to_lowercase().replace('-', "_");
    CATALOG
        .iter()
        .find(|(entry, _)| *entry == key)
        .map(|(_, frames)| frames.iter().map(|f| f.to_string()).collect())
}

/// Frames of the default catalog entry
pub fn default_frames() -> Vec<String> {
    lookup(DEFAULT_SYMBOLS).unwrap_or_default()
}
