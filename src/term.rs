// Terminal collaborators - width discovery and the physical output sink
//
// The render core only talks to these two seams. Production impls query
// crossterm; tests swap in BufferSink to capture output and pin the width.

use crossterm::cursor::MoveToColumn;
use crossterm::terminal::{Clear, ClearType};
use crossterm::QueueableCommand;
use std::io::Write;

/// Default wrap/truncation budget when the terminal width is unavailable
pub const DEFAULT_WIDTH: usize = 100;

/// Terminal width provider - the wrap/truncation budget for every line
pub trait WidthProvider {
    fn width(&self) -> usize;
}

/// Output sink - invoked only by the root box
pub trait Sink {
    /// Clear the current terminal line and move the cursor to column 0
    fn clear_current_line(&mut self);

    /// Write a block of text, appending a trailing newline
    fn write(&mut self, text: &str);
}

/// Live terminal backed by crossterm and stdout
///
/// Width precedence: `BOXLOG_WIDTH` env var > queried terminal size (minus
/// one column of slack) > 100.
#[derive(Debug, Default)]
pub struct Terminal;

impl WidthProvider for Terminal {
    fn width(&self) -> usize {
        if let Some(w) = std::env::var("BOXLOG_WIDTH")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
        {
            return w;
        }
        match crossterm::terminal::size() {
            Ok((cols, _)) if cols > 1 => cols as usize - 1,
            _ => DEFAULT_WIDTH,
        }
    }
}

impl Sink for Terminal {
    fn clear_current_line(&mut self) {
        let mut stdout = std::io::stdout();
        // Best effort: a detached/pipe stdout just skips the clear
        let _ = stdout
            .queue(Clear(ClearType::CurrentLine))
            .and_then(|s| s.queue(MoveToColumn(0)))
            .and_then(|s| s.flush());
    }

    fn write(&mut self, text: &str) {
        let mut stdout = std::io::stdout();
        let _ = writeln!(stdout, "{}", text);
        let _ = stdout.flush();
    }
}

/// Fixed width budget, independent of any terminal
#[derive(Debug, Clone, Copy)]
pub struct FixedWidth(pub usize);

impl WidthProvider for FixedWidth {
    fn width(&self) -> usize {
        self.0
    }
}

/// Capture sink with a pinned width, for tests and string builds
#[derive(Debug)]
pub struct BufferSink {
    pub width: usize,
    pub cleared: usize,
    pub written: Vec<String>,
}

impl BufferSink {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            cleared: 0,
            written: Vec::new(),
        }
    }

    /// Everything written so far, joined back into one block
    pub fn text(&self) -> String {
        self.written.join("\n")
    }
}

impl WidthProvider for BufferSink {
    fn width(&self) -> usize {
        self.width
    }
}

impl Sink for BufferSink {
    fn clear_current_line(&mut self) {
        self.cleared += 1;
    }

    fn write(&mut self, text: &str) {
        self.written.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_sink_captures_writes() {
        let mut sink = BufferSink::new(80);
        sink.clear_current_line();
        sink.write("┌ one");
        sink.write("└ two");
        assert_eq!(sink.cleared, 1);
        assert_eq!(sink.text(), "┌ one\n└ two");
        assert_eq!(sink.width(), 80);
    }
}
