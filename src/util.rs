//! Shared text helpers: padding, style-aware truncation, printf-style formatting

use crate::style;
use serde_json::Value;

/// Repeat a pad symbol to a target display width
///
/// # Examples
///
/// ```
/// use boxlog::util::fill;
///
/// assert_eq!(fill("─", 5), "─────");
/// assert_eq!(fill("─", 0), "");
/// ```
pub fn fill(symbol: &str, len: usize) -> String {
    symbol.repeat(len)
}

/// Pad a string on the right with a symbol until it reaches `len` display columns
pub fn pad_right(s: &str, symbol: &str, len: usize) -> String {
    let mut out = s.to_string();
    while style::width(&out) < len {
        out.push_str(symbol);
    }
    out
}

/// Pad a string on the left with a symbol until it reaches `len` display columns
pub fn pad_left(s: &str, symbol: &str, len: usize) -> String {
    let mut out = s.to_string();
    while style::width(&out) < len {
        out = format!("{}{}", symbol, out);
    }
    out
}

/// Truncate a string to at most `max` display columns, appending `…`
///
/// Measures and cuts the style-stripped text; a string that fits is returned
/// unchanged (styling intact). When truncation is needed the postfix counts
/// against the budget.
pub fn truncate(s: &str, max: usize) -> String {
    truncate_with(s, max, "…")
}

/// Truncate with an explicit postfix
pub fn truncate_with(s: &str, max: usize, postfix: &str) -> String {
    let plain = style::strip(s);
    if style::width(&plain) <= max {
        return s.to_string();
    }

    let postfix_width = style::width(postfix);
    if max < postfix_width {
        return String::new();
    }
    let budget = max - postfix_width;

    let mut out = String::new();
    let mut used = 0;
    for c in plain.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push_str(postfix);
    out
}

/// printf-style expansion of line arguments, as console formatting does
///
/// If the first argument is a string containing `%s`/`%d`/`%j` placeholders,
/// following arguments are substituted in order (`%%` is a literal percent).
/// Arguments left over after substitution, and all arguments when no
/// formatting happens, are passed through unchanged so the caller can route
/// mappings/sequences to the structural dumper.
pub fn expand(args: &[Value]) -> Vec<Value> {
    if args.is_empty() {
        return Vec::new();
    }

    let fmt = match &args[0] {
        Value::String(s) if s.contains('%') => s.clone(),
        _ => {
            return args.to_vec();
        }
    };

    let mut out = String::new();
    let mut next = 1;
    let mut chars = fmt.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('%') => {
                chars.next();
                out.push('%');
            }
            Some(spec @ ('s' | 'd' | 'j')) if next < args.len() => {
                let spec = *spec;
                chars.next();
                let arg = &args[next];
                next += 1;
                match spec {
                    's' => out.push_str(&stringify(arg)),
                    'd' => out.push_str(&numberify(arg)),
                    'j' => out.push_str(&serde_json::to_string(arg).unwrap_or_default()),
                    _ => unreachable!(),
                }
            }
            _ => out.push('%'),
        }
    }

    let mut values = vec![Value::String(out)];
    values.extend(args[next..].iter().cloned());
    values
}

/// Like [`expand`], but flattens every value to a display word
/// (scalars styled via [`style::word`])
pub fn sprintf(args: &[Value]) -> Vec<String> {
    expand(args).iter().map(style::word).collect()
}

/// String coercion matching console `%s` semantics
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Numeric coercion matching console `%d` semantics
fn numberify(value: &Value) -> String {
    match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(|f| {
                if f.fract() == 0.0 {
                    format!("{}", f as i64)
                } else {
                    f.to_string()
                }
            })
            .unwrap_or_else(|_| "NaN".to_string()),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) | Value::Null => "0".to_string(),
        Value::Array(_) | Value::Object(_) => "NaN".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fill() {
        assert_eq!(fill("-", 5), "-----");
        assert_eq!(fill("─", 3), "───");
    }

    #[test]
    fn test_pad_right_and_left() {
        assert_eq!(pad_right("Hello", ".", 7), "Hello..");
        assert_eq!(pad_left("Hello", " ", 7), "  Hello");
        // Already long enough: unchanged
        assert_eq!(pad_right("Hello", ".", 3), "Hello");
    }

    #[test]
    fn test_truncate_short_string_unchanged() {
        let styled = crate::style::apply("hi", "red");
        assert_eq!(truncate(&styled, 10), styled);
    }

    #[test]
    fn test_truncate_long_string() {
        assert_eq!(truncate("hello world", 6), "hello…");
        assert_eq!(truncate_with("hello world", 7, ".."), "hello..");
    }

    #[test]
    fn test_truncate_tiny_budget() {
        assert_eq!(truncate("hello", 0), "");
    }

    #[test]
    fn test_sprintf_no_placeholders() {
        let words = sprintf(&[json!("plain words"), json!(42)]);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0], "plain words");
        assert_eq!(crate::style::strip(&words[1]), "42");
    }

    #[test]
    fn test_sprintf_substitution() {
        let words = sprintf(&[json!("x=%s y=%d z=%j"), json!("a"), json!("7"), json!([1, 2])]);
        assert_eq!(words, vec!["x=a y=7 z=[1,2]".to_string()]);
    }

    #[test]
    fn test_sprintf_literal_percent_and_leftovers() {
        let words = sprintf(&[json!("100%% done, %s"), json!("ok"), json!("extra")]);
        assert_eq!(words[0], "100% done, ok");
        assert_eq!(words[1], "extra");
    }

    #[test]
    fn test_sprintf_missing_argument_keeps_placeholder() {
        let words = sprintf(&[json!("a=%s b=%s"), json!("1")]);
        assert_eq!(words, vec!["a=1 b=%s".to_string()]);
    }
}
