// Tree walker - flattens a ready subtree into an ordered sequence of records
//
// Depth-first, pre-order, matching append order exactly. A child box is
// descended only once it is ready; a box that never becomes ready never
// appears and its content is lost. The non-preserve walk drains each yielded
// line from its owner, so an immediate second render yields nothing.
//
// The traversal runs on an explicit heap work stack rather than recursion so
// that deep or wide trees cannot exhaust the call stack; element order is
// identical to a synchronous recursive walk.

use crate::tree::{Entry, LogBox};

/// One flattened line, carrying everything glyph selection needs
///
/// Adjacency tests at render time use `owner_id` equality and `level` only;
/// no structural tree walk happens after flattening. `owner` is kept for
/// per-column option lookups (border width, margin color of each ancestor).
#[derive(Debug, Clone)]
pub struct Record {
    pub owner_id: String,
    pub level: usize,
    /// Position of this line within its owning box (0 = first line)
    pub pos_in_owner: usize,
    /// Position within the whole flattened sequence
    pub global_pos: usize,
    pub prefix: String,
    pub color: String,
    pub color_text: String,
    pub text: Option<String>,
    pub owner: LogBox,
}

/// Flatten the ready parts of `root` into rendering order
///
/// `preserve` leaves the tree untouched; otherwise each yielded line is
/// removed from its owner as it is visited (child boxes stay attached, only
/// their drained lines disappear).
pub fn flatten(root: &LogBox, preserve: bool) -> Vec<Record> {
    let mut records = Vec::new();
    let mut global_pos = 0usize;

    // Work stack frames: (box, next entry index, lines yielded from that box)
    let mut stack: Vec<(LogBox, usize, usize)> = vec![(root.clone(), 0, 0)];

    while let Some((owner, index, pos_in_owner)) = stack.pop() {
        let entry = owner.node().entries.get(index).cloned();
        match entry {
            None => {} // this box is exhausted
            Some(Entry::Line(line)) => {
                let node = owner.node();
                records.push(Record {
                    owner_id: node.id.clone(),
                    level: node.level,
                    pos_in_owner,
                    global_pos,
                    prefix: line.prefix,
                    color: line.color,
                    color_text: line.color_text,
                    text: line.text,
                    owner: owner.clone(),
                });
                drop(node);
                global_pos += 1;

                if preserve {
                    stack.push((owner, index + 1, pos_in_owner + 1));
                } else {
                    // Drain: remove the yielded line; the next entry now
                    // sits at the same index
                    owner.node_mut().entries.remove(index);
                    stack.push((owner, index, pos_in_owner + 1));
                }
            }
            Some(Entry::Child(child)) => {
                // Resume this box after the child subtree
                stack.push((owner, index + 1, pos_in_owner));
                if child.is_ready() {
                    stack.push((child, 0, 0));
                }
            }
        }
    }

    tracing::trace!(records = records.len(), preserve, "flattened tree");
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{BoxOptions, LogBox};

    fn texts(records: &[Record]) -> Vec<String> {
        records
            .iter()
            .map(|r| r.text.clone().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_flatten_order_matches_append_order() {
        let root = LogBox::new_root(BoxOptions::default());
        root.line("A");
        let child = root.child_box_with("B");
        child.mark_ready();
        root.line("C");
        root.mark_ready();

        let records = flatten(&root, true);
        assert_eq!(texts(&records), vec!["A", "B", "C"]);
        assert_eq!(records[1].level, 1);
        assert_eq!(records[1].pos_in_owner, 0);
        assert_eq!(records[0].global_pos, 0);
        assert_eq!(records[2].global_pos, 2);
        // C belongs to the root again
        assert_eq!(records[0].owner_id, records[2].owner_id);
        assert_ne!(records[0].owner_id, records[1].owner_id);
    }

    #[test]
    fn test_not_ready_box_is_skipped_entirely() {
        let root = LogBox::new_root(BoxOptions::default());
        root.line("top");
        let hidden = root.child_box();
        hidden.line("never shown").line("also hidden");
        root.mark_ready();

        let records = flatten(&root, true);
        assert_eq!(texts(&records), vec!["top"]);
    }

    #[test]
    fn test_nested_ready_boxes_flatten_pre_order() {
        let root = LogBox::new_root(BoxOptions::default());
        root.line("a");
        let child = root.child_box_with("b");
        let grandchild = child.child_box_with("c");
        grandchild.mark_ready();
        child.line("d").mark_ready();
        root.line("e").mark_ready();

        let records = flatten(&root, true);
        assert_eq!(texts(&records), vec!["a", "b", "c", "d", "e"]);
        assert_eq!(
            records.iter().map(|r| r.level).collect::<Vec<_>>(),
            vec![0, 1, 2, 1, 0]
        );
        // d is the second line of its box even though c rendered in between
        assert_eq!(records[3].pos_in_owner, 1);
    }

    #[test]
    fn test_drain_removes_lines_but_keeps_boxes() {
        let root = LogBox::new_root(BoxOptions::default());
        root.line("A");
        let child = root.child_box_with("B");
        child.mark_ready();
        root.mark_ready();

        let first = flatten(&root, false);
        assert_eq!(first.len(), 2);
        // Lines are gone, the child box entry remains
        assert_eq!(root.entry_count(), 1);
        assert_eq!(child.entry_count(), 0);

        let second = flatten(&root, false);
        assert!(second.is_empty());
    }

    #[test]
    fn test_preserve_leaves_entries_untouched() {
        let root = LogBox::new_root(BoxOptions::default());
        root.line("A").line("B").mark_ready();

        let first = flatten(&root, true);
        let second = flatten(&root, true);
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert_eq!(root.entry_count(), 2);
    }

    #[test]
    fn test_blank_line_yields_record_without_text() {
        let root = LogBox::new_root(BoxOptions::default());
        root.line("x").blank().mark_ready();
        let records = flatten(&root, true);
        assert_eq!(records.len(), 2);
        assert!(records[1].text.is_none());
    }

    #[test]
    fn test_deep_tree_does_not_overflow_stack() {
        let root = LogBox::new_root(BoxOptions::default());
        let mut current = root.clone();
        for i in 0..5_000 {
            current.line(&format!("line {i}"));
            let next = current.child_box();
            next.mark_ready();
            current = next;
        }
        root.mark_ready();
        let records = flatten(&root, true);
        assert_eq!(records.len(), 5_000);
    }
}
