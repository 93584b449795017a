//! ANSI styling removal for redirected output

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static SGR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*m").expect("valid SGR pattern"));

/// Remove every SGR sequence (`ESC [ ... m`) from `text`.
///
/// Anything that does not form a complete sequence, such as a lone `ESC`
/// or an unterminated `ESC [1`, is left in place.
pub fn strip_styling(text: &str) -> Cow<'_, str> {
    SGR.replace_all(text, "")
}

/// Whether `text` contains at least one SGR sequence
pub fn has_styling(text: &str) -> bool {
    SGR.is_match(text)
}
