//! Parsing of raw console lines.
//!
//! Blank input means "no change" on the update screen. That mapping lives
//! here, so the core `UserPatch` keeps `Some("")` as a real value.

/// Outcome of the optional age prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeInput {
    Keep,
    Set(i32),
    Invalid,
}

/// Parses a whole-line integer, ignoring surrounding whitespace.
pub fn parse_number<T: std::str::FromStr>(line: &str) -> Option<T> {
    line.trim().parse().ok()
}

/// Blank (empty or whitespace-only) input means "keep current value".
pub fn optional_text(line: &str) -> Option<String> {
    if line.trim().is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

pub fn optional_age(line: &str) -> AgeInput {
    if line.trim().is_empty() {
        return AgeInput::Keep;
    }
    match parse_number(line) {
        Some(age) => AgeInput::Set(age),
        None => AgeInput::Invalid,
    }
}
