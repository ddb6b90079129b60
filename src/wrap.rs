// Line wrapper - width-aware re-flow of over-long content
//
// Wrapping is style-aware: ANSI escape sequences ride along with the word
// they decorate, contribute zero display width, and are never split. Explicit
// line breaks in the input are respected. The continuation-margin rules
// rebuild a plain margin for every wrapped line so the tree rails stay
// connected through the re-flow.

use crate::walker::Record;
use unicode_width::UnicodeWidthChar;

/// A lexed piece of styled text: escapes are carried, not measured
#[derive(Debug, Clone)]
enum Piece {
    Escape(String),
    Char(char),
}

fn lex(text: &str) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            let mut esc = String::from(c);
            // CSI sequence: ESC [ params final-byte
            if chars.peek() == Some(&'[') {
                esc.push(chars.next().expect("peeked"));
                while let Some(&n) = chars.peek() {
                    esc.push(n);
                    chars.next();
                    if n.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
            pieces.push(Piece::Escape(esc));
        } else {
            pieces.push(Piece::Char(c));
        }
    }
    pieces
}

/// A word with its display width, escapes attached in place
#[derive(Debug, Default)]
struct Word {
    text: String,
    width: usize,
}

/// Wrap styled text to `width` display columns, preserving explicit breaks
///
/// Words longer than the width are hard-broken at character boundaries, so a
/// style-free string of length `L > W` yields `ceil(L / W)` lines of at most
/// `W` columns each.
pub fn wrap(text: &str, width: usize) -> String {
    let width = width.max(1);
    text.split('\n')
        .map(|segment| wrap_segment(segment, width))
        .collect::<Vec<_>>()
        .join("\n")
}

fn wrap_segment(segment: &str, width: usize) -> String {
    // Split into words at spaces; escapes stay glued to their word
    let mut words: Vec<Word> = Vec::new();
    let mut current = Word::default();
    for piece in lex(segment) {
        match piece {
            Piece::Escape(esc) => current.text.push_str(&esc),
            Piece::Char(' ') => {
                words.push(std::mem::take(&mut current));
            }
            Piece::Char(c) => {
                current.text.push(c);
                current.width += UnicodeWidthChar::width(c).unwrap_or(0);
            }
        }
    }
    words.push(current);

    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    let mut line_width = 0usize;

    let flush = |line: &mut String, line_width: &mut usize, lines: &mut Vec<String>| {
        if !line.is_empty() {
            lines.push(std::mem::take(line));
        }
        *line_width = 0;
    };

    for word in words {
        if word.width > width {
            // Hard-break an over-long word into width-sized chunks
            flush(&mut line, &mut line_width, &mut lines);
            for chunk in hard_break(&word.text, width) {
                lines.push(chunk);
            }
            continue;
        }
        let needed = if line_width == 0 {
            word.width
        } else {
            line_width + 1 + word.width
        };
        if needed > width {
            flush(&mut line, &mut line_width, &mut lines);
            line.push_str(&word.text);
            line_width = word.width;
        } else {
            if line_width > 0 {
                line.push(' ');
            }
            line.push_str(&word.text);
            line_width = needed;
        }
    }
    flush(&mut line, &mut line_width, &mut lines);

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines.join("\n")
}

fn hard_break(text: &str, width: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut chunk = String::new();
    let mut chunk_width = 0usize;
    for piece in lex(text) {
        match piece {
            Piece::Escape(esc) => chunk.push_str(&esc),
            Piece::Char(c) => {
                let w = UnicodeWidthChar::width(c).unwrap_or(0);
                if chunk_width + w > width && chunk_width > 0 {
                    chunks.push(std::mem::take(&mut chunk));
                    chunk_width = 0;
                }
                chunk.push(c);
                chunk_width += w;
            }
        }
    }
    if !chunk.is_empty() {
        chunks.push(chunk);
    }
    chunks
}

/// Recompute the margin for one continuation line of a wrapped record
///
/// `columns` is the plain original margin (glyph columns only, no custom
/// prefix). The rightmost column is re-derived: the first continuation keeps
/// an open fork, interior lines a rail, and the final line closes or
/// continues depending on the next record. Closing glyphs in ancestor
/// columns are blanked on non-first lines so a closed subtree does not
/// reopen visually.
pub fn continuation_margin(
    columns: &[char],
    pos_top: usize,
    is_top_last: bool,
    record: &Record,
    next: Option<&Record>,
) -> Vec<char> {
    let last = columns.len().saturating_sub(1);
    columns
        .iter()
        .enumerate()
        .map(|(pos_left, &c)| {
            let is_left_last = pos_left == last;
            if is_left_last && pos_top == 0 {
                match c {
                    '└' | '├' => '├',
                    _ => '┌',
                }
            } else if is_left_last && !is_top_last {
                '│'
            } else if is_left_last && is_top_last {
                let next_keeps_rail = next
                    .map(|n| n.level == record.level + 1 || n.level == record.level)
                    .unwrap_or(false);
                if next_keeps_rail {
                    '│'
                } else if record.level == 0 {
                    '├'
                } else {
                    '└'
                }
            } else if pos_top > 0 && (c == '┴' || c == '┘') {
                ' '
            } else if pos_left == 0 && pos_top > 0 {
                '│'
            } else if c == '├' && pos_top != 0 {
                '│'
            } else {
                c
            }
        })
        .collect()
}
