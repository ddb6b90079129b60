//! boxlog - hierarchical terminal output composed with box-drawing glyphs
//!
//! Callers build a tree of boxes holding lines of text (or further boxes),
//! then mark boxes ready; rendering flattens the ready parts of the tree and
//! decorates every line with a margin of connector glyphs depicting nesting
//! and sibling order. Structured values can be dumped as nested tables.
//!
//! ```no_run
//! let log = boxlog::root();
//! log.line("starting up");
//! let task = log.child_box_with("warming caches");
//! task.line("users loaded");
//! task.mark_ready_with("done");
//! log.out();
//! ```
//!
//! Only the root writes to the terminal; any box with a parent forwards
//! `out()` upward. For capture (tests, string building) attach a
//! [`BufferSink`] via [`root_with`].

pub mod dump;
pub mod glyph;
pub mod render;
pub mod style;
pub mod term;
pub mod tree;
pub mod util;
pub mod walker;
pub mod wrap;

pub use dump::{DumpOptions, DumpValue};
pub use render::RenderError;
pub use term::{BufferSink, FixedWidth, Sink, Terminal, WidthProvider, DEFAULT_WIDTH};
pub use tree::{BoxOptions, LogBox, OptionPatch};
pub use walker::Record;

use std::cell::RefCell;
use std::rc::Rc;

/// A composition root bound to the live terminal
///
/// Width precedence: `BOXLOG_WIDTH` env var, then the queried terminal size,
/// then 100 columns.
pub fn root() -> LogBox {
    let root = LogBox::new_root(BoxOptions::default());
    root.attach_output(render::Output::terminal());
    root
}

/// A composition root bound to an explicit sink and width provider
pub fn root_with(sink: Rc<RefCell<dyn Sink>>, width: Rc<dyn WidthProvider>) -> LogBox {
    let root = LogBox::new_root(BoxOptions::default());
    root.attach_output(render::Output::new(sink, width));
    root
}
