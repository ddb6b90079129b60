// Glyph selector - computes the per-line margin of box-drawing connectors
//
// For each flattened record the margin is one glyph per nesting column
// (level + 1 columns). Selection uses only local context: the neighboring
// records' levels and owners, the line's position within its box, and two
// content sentinels. The decision tables below are deliberately asymmetric
// between the very first record ever and later top-level records; that
// asymmetry is load-bearing (a fresh block opens with ┌, continuation
// blocks with ├) and must not be "unified".
//
// Columns left of the rightmost depict ancestor rails and subtree closings;
// each column is remapped and colored by the ancestor box at that depth.

use crate::style;
use crate::walker::Record;

/// A record counts as blank when it has no text or its style-stripped text
/// is the literal sentinel "undefined"
pub fn is_blank(record: &Record) -> bool {
    match &record.text {
        None => true,
        Some(t) => style::strip(t) == "undefined",
    }
}

/// Whether the style-stripped text is the horizontal-rule sentinel "---"
pub fn is_rule(record: &Record) -> bool {
    matches!(&record.text, Some(t) if style::strip(t) == "---")
}

/// Select the margin glyph columns for one record
///
/// `printed_lines` is the root's cumulative printed-line counter, already
/// incremented for this record (1 means first record ever). Returns
/// `level + 1` plain glyphs, rightmost column last.
pub fn select(
    record: &Record,
    prev: Option<&Record>,
    next: Option<&Record>,
    printed_lines: usize,
) -> Vec<char> {
    let level = record.level;
    let has_prev = prev.is_some();
    let has_next = next.is_some();
    // Missing neighbors compare as level 0 in the closing checks
    let level_next = next.map(|r| r.level).unwrap_or(0);
    let box_prev = prev.map(|p| p.owner_id == record.owner_id).unwrap_or(false);
    let box_next = next.map(|n| n.owner_id == record.owner_id).unwrap_or(false);
    let first_of_box = record.pos_in_owner == 0;
    let blank = is_blank(record);

    let mut columns = Vec::with_capacity(level + 1);

    for pos_left in 0..=level {
        let glyph = if pos_left == level {
            // Rightmost column, the most specific cases first
            if printed_lines == 1 && level == 0 {
                '┌'
            } else if has_next && level == 0 {
                if blank {
                    '│'
                } else {
                    '├'
                }
            } else if first_of_box {
                if box_next || (has_next && level_next > level) {
                    '┬'
                } else if box_prev {
                    '└'
                } else if level == 0 {
                    let starts_indented = record
                        .text
                        .as_deref()
                        .map(|t| t.starts_with("  "))
                        .unwrap_or(false);
                    if starts_indented {
                        '│'
                    } else {
                        '├'
                    }
                } else {
                    '─'
                }
            } else if has_next && level_next >= level && blank {
                '│'
            } else if next_is_same_or_child(record, next) {
                '├'
            } else if record.prefix.starts_with('═') || record.prefix.starts_with('╛') {
                '╘'
            } else if level == 0 {
                '├'
            } else {
                '└'
            }
        } else if first_of_box && pos_left + 1 == level {
            // Second from right on the first line of a box
            if !has_prev {
                '┬'
            } else if !has_next || level_next + 1 < level {
                '┴'
            } else {
                '├'
            }
        } else if !box_next && level_next + 1 < level && pos_left + 1 == level {
            // Second from right when the subtree is closing
            '┘'
        } else if !box_next && level_next + 1 < level {
            // Deeper closing columns
            if !has_next {
                if pos_left == 0 {
                    '├'
                } else {
                    '┴'
                }
            } else if pos_left == level_next {
                '├'
            } else if pos_left < level_next {
                '│'
            } else {
                '┴'
            }
        } else {
            // Ancestor rail
            if pos_left == 0 && !has_prev {
                '├'
            } else {
                '│'
            }
        };

        columns.push(glyph);
    }

    columns
}

/// Next record belongs to the same box, or its owner's parent is this box
fn next_is_same_or_child(record: &Record, next: Option<&Record>) -> bool {
    let Some(next) = next else {
        return false;
    };
    if next.owner_id == record.owner_id {
        return true;
    }
    next.owner
        .parent()
        .map(|p| p.id() == record.owner_id)
        .unwrap_or(false)
}

/// Remap a light glyph to its double-border counterpart
pub fn remap(glyph: char, border: u8) -> char {
    if border <= 1 {
        return glyph;
    }
    match glyph {
        '╘' => '╚',
        '┌' => '╓',
        '┘' => '╜',
        '│' => '║',
        '├' => '╟',
        '└' => '╙',
        '┬' => '╥',
        '┼' => '╫',
        '┴' => '╨',
        other => other,
    }
}

/// Style the selected columns, one ancestor per column
///
/// Column `pos_left` is remapped and colored by the box at depth `pos_left`
/// on this record's ancestor chain, so a double-bordered parent shows double
/// rails through all of its descendants' margins.
pub fn style_columns(columns: &[char], record: &Record) -> String {
    let level = record.level;
    let mut out = String::new();
    for (pos_left, &glyph) in columns.iter().enumerate() {
        let ancestor = record.owner.ancestor(level - pos_left);
        let opts = ancestor.options();
        let mapped = remap(glyph, opts.border);
        out.push_str(&style::apply(&mapped.to_string(), &opts.color));
    }
    out
}

/// Style continuation-margin columns uniformly with the root's options
///
/// Wrapped continuation lines rebuild their margin from the plain glyphs and
/// style every column with the root box's border width and color.
pub fn style_columns_uniform(columns: &[char], root: &crate::tree::LogBox) -> String {
    let opts = root.options();
    columns
        .iter()
        .map(|&g| style::apply(&remap(g, opts.border).to_string(), &opts.color))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{BoxOptions, LogBox, OptionPatch};
    use crate::walker::flatten;

    /// Select plain margins for a whole flattened sequence, counting printed
    /// lines from 1 the way the renderer does
    fn margins(records: &[Record]) -> Vec<String> {
        records
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let prev = i.checked_sub(1).and_then(|p| records.get(p));
                let next = records.get(i + 1);
                select(r, prev, next, i + 1).into_iter().collect()
            })
            .collect()
    }

    #[test]
    fn test_first_record_ever_opens_with_corner() {
        let root = LogBox::new_root(BoxOptions::default());
        root.line("Hello");
        let records = flatten(&root, true);
        assert_eq!(margins(&records), vec!["┌"]);
    }

    #[test]
    fn test_top_level_lines_continue_with_tee() {
        let root = LogBox::new_root(BoxOptions::default());
        root.line("one").line("two").line("three");
        let records = flatten(&root, true);
        assert_eq!(margins(&records), vec!["┌", "├", "├"]);
    }

    #[test]
    fn test_blank_sentinel_renders_rail() {
        let root = LogBox::new_root(BoxOptions::default());
        root.line("one").blank().line("three");
        let records = flatten(&root, true);
        // Blank line between two others keeps the rail open
        assert_eq!(margins(&records), vec!["┌", "│", "├"]);
    }

    #[test]
    fn test_single_line_child_box() {
        let root = LogBox::new_root(BoxOptions::default());
        root.line("A");
        let child = root.child_box_with("B");
        child.mark_ready();
        root.line("C");
        let records = flatten(&root, true);
        let m = margins(&records);
        assert_eq!(m[0], "┌");
        // First line of a box with no box siblings: never └
        assert_eq!(m[1], "├─");
        assert_eq!(m[2], "├");
    }

    #[test]
    fn test_multi_line_child_box_opens_and_closes() {
        let root = LogBox::new_root(BoxOptions::default());
        root.line("A");
        let child = root.child_box_with("B1");
        child.line("B2").line("B3").mark_ready();
        root.line("C");
        let records = flatten(&root, true);
        let m = margins(&records);
        // First box line forks down, interior continues, last closes
        assert_eq!(m[1], "├┬");
        assert_eq!(m[2], "│├");
        assert_eq!(m[3], "│└");
        assert_eq!(m[4], "├");
    }

    #[test]
    fn test_trailing_child_box_closes_without_next() {
        let root = LogBox::new_root(BoxOptions::default());
        root.line("A");
        let child = root.child_box_with("B1");
        child.line("B2").mark_ready();
        let records = flatten(&root, true);
        let m = margins(&records);
        assert_eq!(m[1], "├┬");
        assert_eq!(m[2], "│└");
    }

    #[test]
    fn test_nested_grandchild_rails() {
        let root = LogBox::new_root(BoxOptions::default());
        root.line("a");
        let child = root.child_box_with("b");
        let grand = child.child_box_with("c1");
        grand.line("c2").mark_ready();
        child.line("d").mark_ready();
        root.line("e");
        let records = flatten(&root, true);
        let m = margins(&records);
        assert_eq!(m[0], "┌");
        // b: first of box with a deeper next record
        assert_eq!(m[1], "├┬");
        // c1: first of box, box sibling follows
        assert_eq!(m[2], "│├┬");
        // c2: last of the grandchild, next is one shallower
        assert_eq!(m[3], "││└");
        // d: back in the child box
        assert_eq!(m[4], "│└");
        assert_eq!(m[5], "├");
    }

    #[test]
    fn test_rule_prefix_selects_double_corner() {
        let root = LogBox::new_root(BoxOptions::default());
        root.line("first");
        let child = root.child_box();
        child.line("x").line_styled("closing", "pre:═").mark_ready();
        let records = flatten(&root, true);
        let m = margins(&records);
        assert_eq!(m[2].chars().last(), Some('╘'));
    }

    #[test]
    fn test_border_remap() {
        assert_eq!(remap('├', 2), '╟');
        assert_eq!(remap('┌', 2), '╓');
        assert_eq!(remap('│', 2), '║');
        assert_eq!(remap('├', 1), '├');
        assert_eq!(remap('X', 2), 'X');
    }

    #[test]
    fn test_style_columns_uses_ancestor_border() {
        let root = LogBox::new_root(BoxOptions::default());
        root.set_options(OptionPatch::border(2));
        root.line("a");
        let child = root.child_box_with("b");
        child.mark_ready();
        root.line("c");
        let records = flatten(&root, true);
        let cols = select(&records[1], Some(&records[0]), Some(&records[2]), 2);
        let styled = style_columns(&cols, &records[1]);
        // Column 0 belongs to the double-bordered root, column 1 to the child
        let plain = style::strip(&styled);
        assert_eq!(plain, "╟─");
    }

    #[test]
    fn test_blank_record_detection() {
        let root = LogBox::new_root(BoxOptions::default());
        root.blank().line("undefined").line("text").line("---");
        let records = flatten(&root, true);
        assert!(is_blank(&records[0]));
        assert!(is_blank(&records[1]));
        assert!(!is_blank(&records[2]));
        assert!(is_rule(&records[3]));
        assert!(!is_rule(&records[2]));
    }
}
