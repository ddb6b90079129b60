// Renderer - walks the tree, selects glyphs, wraps, and writes
//
// Only the root performs physical writes: any box with a parent forwards
// out() upward, marking itself ready on the way. Width-computation failures
// inside a render pass are caught at the render boundary and reported as a
// fallback line through the unmodified sink; they never propagate out of
// out(). Construction-time errors (title too wide for the terminal, etc.)
// propagate to the caller as ordinary Results.

use crate::glyph;
use crate::style;
use crate::term::{Sink, Terminal, WidthProvider};
use crate::tree::{Entry, LogBox};
use crate::util;
use crate::walker::flatten;
use crate::wrap;
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

/// Failures inside a render pass or width-dependent construction
#[derive(Debug, Error)]
pub enum RenderError {
    /// A margin/content width computation would underflow the terminal width
    #[error("line needs {needed} columns but only {available} are available")]
    Width {
        needed: usize,
        available: usize,
        /// The offending raw content, passed through on fallback
        value: String,
    },
}

/// Render state attached to a root box: the sink, the width budget, and the
/// cumulative printed-line counter driving the first-record corner glyph
pub struct Output {
    pub(crate) sink: Rc<RefCell<dyn Sink>>,
    pub(crate) width_provider: Rc<dyn WidthProvider>,
    pub(crate) printed_lines: usize,
}

impl Output {
    pub(crate) fn terminal() -> Self {
        Self {
            sink: Rc::new(RefCell::new(Terminal)),
            width_provider: Rc::new(Terminal),
            printed_lines: 0,
        }
    }

    pub(crate) fn new(sink: Rc<RefCell<dyn Sink>>, width_provider: Rc<dyn WidthProvider>) -> Self {
        Self {
            sink,
            width_provider,
            printed_lines: 0,
        }
    }
}

impl std::fmt::Debug for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Output")
            .field("printed_lines", &self.printed_lines)
            .finish_non_exhaustive()
    }
}

impl LogBox {
    /// The root's render state, created against the live terminal on first use
    pub(crate) fn ensure_output(&self) -> Rc<RefCell<Output>> {
        let root = self.root();
        if let Some(output) = root.node().output.clone() {
            return output;
        }
        let output = Rc::new(RefCell::new(Output::terminal()));
        root.node_mut().output = Some(output.clone());
        output
    }

    pub(crate) fn attach_output(&self, output: Output) {
        self.node_mut().output = Some(Rc::new(RefCell::new(output)));
    }

    /// Mark ready and render now
    ///
    /// A box with a parent delegates upward (marking each ancestor ready);
    /// the root drains its ready subtree, clears the current terminal line
    /// and writes the block. Render-pass width failures are reported through
    /// the sink and swallowed here.
    pub fn out(&self) {
        self.mark_ready();
        if let Some(parent) = self.parent() {
            return parent.out();
        }

        let output = self.ensure_output();
        match build_string(self, false, &output) {
            Ok(text) => {
                if !text.is_empty() {
                    let sink = output.borrow().sink.clone();
                    let mut sink = sink.borrow_mut();
                    sink.clear_current_line();
                    sink.write(&text);
                }
            }
            Err(err) => {
                let value = match &err {
                    RenderError::Width { value, .. } => value.clone(),
                };
                tracing::warn!(%err, "render pass failed, falling back to plain output");
                let sink = output.borrow().sink.clone();
                let mut sink = sink.borrow_mut();
                sink.write(&format!(
                    "{}\n{}",
                    style::apply(&format!("RenderError: {}", err), "red"),
                    value
                ));
            }
        }
    }

    /// Non-destructive snapshot of this subtree as a string
    ///
    /// Marks the box ready, renders in preserve mode (the live buffer is
    /// left intact) and returns the block. Unlike [`out`](Self::out), width
    /// failures propagate.
    pub fn build(&self) -> Result<String, RenderError> {
        self.build_opts(0, false)
    }

    /// Snapshot with options: strip the first `strip_levels` columns of
    /// every line (style codes removed first), and/or render from the parent
    pub fn build_opts(&self, strip_levels: usize, use_parent: bool) -> Result<String, RenderError> {
        self.mark_ready();
        let target = if use_parent {
            self.parent().unwrap_or_else(|| self.clone())
        } else {
            self.clone()
        };
        let output = target.ensure_output();
        let text = build_string(&target, true, &output)?;

        if strip_levels == 0 {
            return Ok(text);
        }
        let plain = style::strip(&text);
        Ok(plain
            .split('\n')
            .map(|line| {
                if line.chars().count() > strip_levels {
                    line.chars().skip(strip_levels).collect()
                } else {
                    line.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Append a green line and render
    pub fn info(&self, text: &str) -> &Self {
        self.line_styled(text, "green");
        self.out();
        self
    }

    /// Append a yellow line and render
    pub fn warn(&self, text: &str) -> &Self {
        self.line_styled(text, "yellow");
        self.out();
        self
    }

    /// Append a red line and render
    pub fn error(&self, text: &str) -> &Self {
        self.line_styled(text, "red");
        self.out();
        self
    }

    /// Append a boxed title: dim top border, padded content row with a right
    /// border, dim bottom border, all sized to the terminal width
    pub fn title(&self, text: &str) -> Result<&Self, RenderError> {
        let output = self.ensure_output();
        let max_width = output.borrow().width_provider.width();
        let level = self.level();
        let opts = self.options();

        let border_width = max_width
            .checked_sub(level + 2)
            .ok_or_else(|| RenderError::Width {
                needed: level + 2,
                available: max_width,
                value: text.to_string(),
            })?;

        let top = format!("{}┐", util::fill("─", border_width));
        self.line_styled(&style::apply_all(&top, &[&opts.color, "dim"]), "pre:");

        self.line(text);
        // Pad the content row out to the border and close it
        let content_width = {
            let node = self.node();
            match node.entries.last() {
                Some(Entry::Line(l)) => style::width(l.text.as_deref().unwrap_or("")),
                _ => 0,
            }
        };
        let pad = max_width
            .checked_sub(level + content_width + 3)
            .ok_or_else(|| RenderError::Width {
                needed: level + content_width + 3,
                available: max_width,
                value: text.to_string(),
            })?;
        {
            let mut node = self.node_mut();
            if let Some(Entry::Line(l)) = node.entries.last_mut() {
                let body = l.text.take().unwrap_or_default();
                l.text = Some(format!(
                    "{}{}{}",
                    body,
                    util::fill(" ", pad),
                    style::apply_all("│", &[&opts.color, "dim"])
                ));
            }
        }

        let bottom = format!("{}┘", util::fill("─", border_width));
        self.line_styled(&style::apply_all(&bottom, &[&opts.color, "dim"]), "pre:");
        Ok(self)
    }

    /// Flush the tree, emit a lone closing glyph, and reset the block state
    /// so the next render opens with a fresh corner
    pub fn spacer(&self) -> &Self {
        self.out();
        let output = self.ensure_output();
        let color = self.options().color;
        {
            let sink = output.borrow().sink.clone();
            sink.borrow_mut().write(&style::apply("┘", &color));
        }
        output.borrow_mut().printed_lines = 0;
        self
    }
}

/// Flatten, select glyphs, wrap, and join a subtree into one block
pub(crate) fn build_string(
    target: &LogBox,
    preserve: bool,
    output: &Rc<RefCell<Output>>,
) -> Result<String, RenderError> {
    let max_width = output.borrow().width_provider.width();
    let records = flatten(target, preserve);
    tracing::debug!(
        records = records.len(),
        max_width,
        preserve,
        "building output block"
    );

    let mut body: Vec<String> = Vec::new();

    for i in 0..records.len() {
        let record = &records[i];
        let prev = if i > 0 { records.get(i - 1) } else { None };
        let next = records.get(i + 1);

        let printed = {
            let mut out = output.borrow_mut();
            out.printed_lines += 1;
            out.printed_lines
        };

        let columns = glyph::select(record, prev, next, printed);
        let mut pre_plain: String = columns.iter().collect();
        let mut pre_str = glyph::style_columns(&columns, record);

        // Horizontal rule sentinel: full-width line consuming the margin's
        // last (prefix) column, never wrapped
        if glyph::is_rule(record) {
            let needed = record.level + 1;
            let rule_width = max_width
                .checked_sub(needed)
                .ok_or_else(|| RenderError::Width {
                    needed,
                    available: max_width,
                    value: record.text.clone().unwrap_or_default(),
                })?;
            let rule = style::apply_all(&util::fill("─", rule_width), &[&record.color, "dim"]);
            body.push(format!("{}{}", pre_str, rule));
            continue;
        }

        pre_plain.push_str(&record.prefix);
        pre_str.push_str(&style::apply(
            &record.prefix,
            &record.owner.options().color,
        ));

        // Blank sentinel: margin only, empty content cell
        if glyph::is_blank(record) {
            body.push(pre_str);
            continue;
        }

        let content = record.text.clone().unwrap_or_default();
        let content_width = style::width(&content);
        let margin_width = style::width(&pre_plain);

        if margin_width + content_width > max_width || content.contains('\n') {
            // Re-flow: wrap to the budget minus margin room and a gutter
            let reserve = record.level + 10;
            let wrap_width = max_width
                .checked_sub(reserve)
                .ok_or_else(|| RenderError::Width {
                    needed: reserve,
                    available: max_width,
                    value: content.clone(),
                })?;
            let wrapped = wrap::wrap(&content, wrap_width);
            let lines: Vec<&str> = wrapped.split('\n').collect();
            let root_box = record.owner.root();
            tracing::trace!(pieces = lines.len(), wrap_width, "re-flowed long line");

            for (pos_top, piece) in lines.iter().enumerate() {
                let is_top_last = pos_top == lines.len() - 1;
                let cols = wrap::continuation_margin(&columns, pos_top, is_top_last, record, next);
                let margin = glyph::style_columns_uniform(&cols, &root_box);
                let text = format!(" {}", style::apply_all(piece, &[&record.color, "bold"]));
                body.push(format!(
                    "{}{}",
                    style::apply(&margin, &record.color),
                    style::apply(&text, &record.color_text)
                ));
            }
        } else {
            body.push(format!(
                "{}{}",
                pre_str,
                style::apply_all(&content, &[&record.color_text, "bold"])
            ));
        }
    }

    Ok(body.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{BufferSink, FixedWidth};
    use crate::tree::{BoxOptions, LogBox};

    fn test_root(width: usize) -> (LogBox, Rc<RefCell<BufferSink>>) {
        let sink = Rc::new(RefCell::new(BufferSink::new(width)));
        let root = LogBox::new_root(BoxOptions::default());
        root.attach_output(Output::new(sink.clone(), Rc::new(FixedWidth(width))));
        (root, sink)
    }

    fn stripped_lines(sink: &Rc<RefCell<BufferSink>>) -> Vec<String> {
        sink.borrow()
            .written
            .iter()
            .flat_map(|block| block.split('\n').map(|l| style::strip(l)))
            .collect()
    }

    #[test]
    fn test_hello_renders_opening_corner() {
        let (root, sink) = test_root(20);
        root.line("Hello");
        root.out();
        assert_eq!(stripped_lines(&sink), vec!["┌ Hello"]);
        assert_eq!(sink.borrow().cleared, 1);
    }

    #[test]
    fn test_second_render_of_drained_tree_is_empty() {
        let (root, sink) = test_root(40);
        root.line("once");
        root.out();
        assert_eq!(sink.borrow().written.len(), 1);
        root.out();
        // Nothing new written, nothing cleared again
        assert_eq!(sink.borrow().written.len(), 1);
        assert_eq!(sink.borrow().cleared, 1);
    }

    #[test]
    fn test_unready_box_produces_no_output() {
        let (root, sink) = test_root(40);
        let child = root.child_box();
        child.line("hidden").line("still hidden");
        root.out();
        assert!(sink.borrow().written.is_empty());
        assert_eq!(sink.borrow().cleared, 0);
    }

    #[test]
    fn test_all_lines_fit_terminal_width() {
        let (root, sink) = test_root(30);
        root.line("short");
        let child = root.child_box_with("a longer line that will need wrapping here");
        child.mark_ready();
        root.line("tail");
        root.out();
        for line in stripped_lines(&sink) {
            assert!(
                style::width(&line) <= 30,
                "line exceeds width: {line:?} ({})",
                style::width(&line)
            );
        }
    }

    #[test]
    fn test_child_forwards_out_to_root() {
        let (root, sink) = test_root(40);
        root.line("parent line");
        let child = root.child_box_with("child line");
        child.out();
        let lines = stripped_lines(&sink);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("parent line"));
        assert!(lines[1].contains("child line"));
        assert!(root.is_ready());
        assert!(child.is_ready());
    }

    #[test]
    fn test_build_preserves_buffer() {
        let (root, _sink) = test_root(40);
        root.line("kept");
        let first = root.build().unwrap();
        let second = root.build().unwrap();
        assert_eq!(style::strip(&first), "┌ kept");
        // printed_lines advanced, so the second snapshot forks instead
        assert_eq!(style::strip(&second), "├ kept");
        assert_eq!(root.entry_count(), 1);
    }

    #[test]
    fn test_build_strip_levels() {
        let (root, _sink) = test_root(40);
        root.line("alpha").line("beta");
        let text = root.build_opts(2, false).unwrap();
        assert_eq!(text, "alpha\nbeta");
    }

    #[test]
    fn test_blank_line_renders_margin_only() {
        let (root, sink) = test_root(40);
        root.line("a").blank().line("b");
        root.out();
        let lines = stripped_lines(&sink);
        assert_eq!(lines[1].trim_end(), "│");
    }

    #[test]
    fn test_rule_sentinel_spans_terminal() {
        let (root, sink) = test_root(24);
        root.line("above").line("---");
        root.out();
        let lines = stripped_lines(&sink);
        assert_eq!(lines[1], format!("├{}", "─".repeat(23)));
        assert_eq!(style::width(&lines[1]), 24);
    }

    #[test]
    fn test_wrapped_line_margins_stay_connected() {
        let (root, sink) = test_root(24);
        root.line("first");
        root.line("a very long line of words that wraps over several rows");
        root.line("last");
        root.out();
        let lines = stripped_lines(&sink);
        assert!(lines.len() > 3, "expected re-flow to add lines");
        // Wrapped content starts on a forked first continuation
        assert!(lines[1].starts_with('├'));
        // Interior continuations keep the rail open
        for line in &lines[2..lines.len() - 2] {
            assert!(line.starts_with('│'), "interior line {line:?}");
        }
        assert_eq!(lines.last().unwrap(), "├ last");
    }

    #[test]
    fn test_width_failure_falls_back_through_sink() {
        let (root, sink) = test_root(4);
        root.line("this cannot fit in four columns at all");
        root.out();
        let lines = stripped_lines(&sink);
        assert!(lines[0].starts_with("RenderError:"), "got {lines:?}");
        // Offending raw value passed through unmodified
        assert!(lines
            .iter()
            .any(|l| l.contains("this cannot fit in four columns at all")));
    }

    #[test]
    fn test_info_warn_error_render_immediately() {
        let (root, sink) = test_root(40);
        root.info("ok");
        root.warn("careful");
        root.error("broken");
        let lines = stripped_lines(&sink);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "┌ ok");
        assert_eq!(lines[1], "├ careful");
        assert_eq!(lines[2], "├ broken");
    }

    #[test]
    fn test_title_draws_borders() {
        let (root, sink) = test_root(20);
        root.title("Report").unwrap();
        root.out();
        let lines = stripped_lines(&sink);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with('┐'));
        assert!(lines[1].contains("Report"));
        assert!(lines[1].ends_with('│'));
        assert!(lines[2].ends_with('┘'));
        // Every row spans the full terminal width
        assert_eq!(style::width(&lines[0]), 20);
        assert_eq!(style::width(&lines[1]), 20);
    }

    #[test]
    fn test_spacer_resets_block_state() {
        let (root, sink) = test_root(40);
        root.line("first block");
        root.spacer();
        root.line("second block");
        root.out();
        let lines = stripped_lines(&sink);
        assert_eq!(lines[0], "┌ first block");
        assert_eq!(lines[1], "┘");
        // Counter reset: the next block opens with a corner again
        assert_eq!(lines[2], "┌ second block");
    }
}
