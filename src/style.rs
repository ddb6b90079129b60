// Style applier - named ANSI colors and effects for composed output
//
// The engine never emits raw escape codes itself; everything goes through
// apply()/strip() so that rendered text stays measurable. strip() must
// recover the exact plain text for any supported style name (the renderer
// relies on this to compute display widths and sentinel matches).

use crossterm::style::{Attribute, Stylize};
use regex::Regex;
use std::sync::OnceLock;
use unicode_width::UnicodeWidthStr;

/// Color names accepted as line/box styling tokens
pub const COLORS: [&str; 9] = [
    "cyan", "green", "yellow", "red", "magenta", "blue", "white", "grey", "black",
];

/// Effect names accepted as line/box styling tokens
pub const EFFECTS: [&str; 8] = [
    "reset",
    "bold",
    "dim",
    "italic",
    "underline",
    "inverse",
    "hidden",
    "strikethrough",
];

/// Check whether a token is a recognized color or effect name
///
/// Used to disambiguate the trailing argument of `line()` and the
/// single-string overload of `child_box_with()`.
pub fn is_style_name(name: &str) -> bool {
    COLORS.contains(&name) || EFFECTS.contains(&name)
}

/// Apply a named style to text, returning an ANSI-decorated string
///
/// Unknown names return the text unchanged. Besides the plain color and
/// effect names, three compound styles exist: "rainbow" (per-character color
/// cycle), "zebra" (alternating inverse characters) and "code" (blue block
/// with dimmed punctuation), used by the structural dumper for function
/// sources.
pub fn apply(text: &str, name: &str) -> String {
    match name {
        "cyan" => text.cyan().to_string(),
        "green" => text.green().to_string(),
        "yellow" => text.yellow().to_string(),
        "red" => text.red().to_string(),
        "magenta" => text.magenta().to_string(),
        "blue" => text.blue().to_string(),
        "white" => text.white().to_string(),
        "grey" => text.dark_grey().to_string(),
        "black" => text.black().to_string(),
        "reset" => text.attribute(Attribute::Reset).to_string(),
        "bold" => text.bold().to_string(),
        "dim" => text.dim().to_string(),
        "italic" => text.italic().to_string(),
        "underline" => text.underlined().to_string(),
        "inverse" => text.reverse().to_string(),
        "hidden" => text.hidden().to_string(),
        "strikethrough" => text.crossed_out().to_string(),
        "rainbow" => rainbow(text),
        "zebra" => zebra(text),
        "code" => code(text),
        _ => text.to_string(),
    }
}

/// Apply several styles in sequence (innermost first)
pub fn apply_all(text: &str, names: &[&str]) -> String {
    let mut out = text.to_string();
    for name in names {
        out = apply(&out, name);
    }
    out
}

/// Per-character color cycle over the first five palette colors
fn rainbow(text: &str) -> String {
    text.chars()
        .enumerate()
        .map(|(i, c)| apply(&c.to_string(), COLORS[i % 5]))
        .collect()
}

/// Alternating plain/inverse characters
fn zebra(text: &str) -> String {
    text.chars()
        .enumerate()
        .map(|(i, c)| {
            let s = c.to_string();
            if i % 2 == 1 {
                s.white().to_string()
            } else {
                s.black().on_white().dim().to_string()
            }
        })
        .collect()
}

/// Source-code styling: blue block, punctuation dimmed
fn code(text: &str) -> String {
    let body: String = text
        .chars()
        .map(|c| {
            if ".,:;=()[]{}+-*|\"/'".contains(c) {
                c.to_string().dark_grey().to_string()
            } else {
                c.to_string()
            }
        })
        .collect();
    body.on_blue().white().to_string()
}

/// Remove all ANSI escape sequences, recovering measurable plain text
///
/// Idempotent, and an exact inverse of `apply` for every supported name:
/// `strip(apply(t, name)) == t`.
pub fn strip(text: &str) -> String {
    static ANSI: OnceLock<Regex> = OnceLock::new();
    let re = ANSI.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").expect("valid ANSI regex"));
    re.replace_all(text, "").into_owned()
}

/// Display width of the style-stripped text, in terminal columns
pub fn width(text: &str) -> usize {
    UnicodeWidthStr::width(strip(text).as_str())
}

/// Style a scalar word the way console output conventionally does
///
/// null is grey italic, booleans are bold green/red, numbers cyan;
/// anything else passes through untouched. Used for formatted line
/// arguments and dumped scalar values.
pub fn word(value: &serde_json::Value) -> String {
    use serde_json::Value;
    match value {
        Value::Null => apply_all("null", &["italic", "grey"]),
        Value::Bool(true) => apply_all("true", &["bold", "green"]),
        Value::Bool(false) => apply_all("false", &["bold", "red"]),
        Value::Number(n) => apply(&n.to_string(), "cyan"),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_recovers_plain_text_for_every_name() {
        for name in COLORS.iter().chain(EFFECTS.iter()) {
            let styled = apply("hello", name);
            assert_eq!(strip(&styled), "hello", "style {name} not stripped");
        }
    }

    #[test]
    fn test_strip_recovers_compound_styles() {
        for name in ["rainbow", "zebra", "code"] {
            assert_eq!(strip(&apply("ab.c", name)), "ab.c");
        }
    }

    #[test]
    fn test_strip_is_idempotent() {
        let styled = apply("boxed", "cyan");
        assert_eq!(strip(&strip(&styled)), strip(&styled));
    }

    #[test]
    fn test_unknown_name_passes_through() {
        assert_eq!(apply("text", "no-such-style"), "text");
    }

    #[test]
    fn test_is_style_name() {
        assert!(is_style_name("cyan"));
        assert!(is_style_name("bold"));
        assert!(!is_style_name("pre:─"));
        assert!(!is_style_name("Hello"));
    }

    #[test]
    fn test_width_ignores_styling() {
        assert_eq!(width(&apply("hello", "red")), 5);
        assert_eq!(width("┌ Hello"), 7);
    }

    #[test]
    fn test_word_keywords() {
        use serde_json::json;
        assert_eq!(strip(&word(&json!(null))), "null");
        assert_eq!(strip(&word(&json!(true))), "true");
        assert_eq!(strip(&word(&json!(false))), "false");
        assert_eq!(strip(&word(&json!(42))), "42");
        assert_eq!(word(&json!("plain")), "plain");
    }
}
