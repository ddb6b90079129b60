// Box tree - the node/line data model and mutation API
//
// Callers build a tree of boxes holding lines (or further boxes), then mark
// boxes ready. Nothing here writes output: rendering is reached through the
// root (see render.rs), and any box with a parent forwards render requests
// upward so only the root touches the sink.

use crate::style;
use crate::util;
use chrono::Utc;
use serde_json::Value;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

/// Visual options of a box
#[derive(Debug, Clone)]
pub struct BoxOptions {
    /// Vertical border width: 1 (light glyphs) or 2 (double glyphs)
    pub border: u8,
    /// Margin glyph color
    pub color: String,
    /// Text color (defaults to the margin color)
    pub color_text: String,
    /// Ordered (match, replacement) pairs applied to each appended line,
    /// first occurrence per pair
    pub wrap_map: Vec<(String, String)>,
}

impl Default for BoxOptions {
    fn default() -> Self {
        Self {
            border: 1,
            color: "grey".to_string(),
            color_text: "grey".to_string(),
            wrap_map: vec![("...".to_string(), "…".to_string())],
        }
    }
}

/// Partial options for merging into a box (see [`LogBox::set_options`])
#[derive(Debug, Clone, Default)]
pub struct OptionPatch {
    pub border: Option<u8>,
    pub color: Option<String>,
    pub color_text: Option<String>,
    pub wrap_map: Option<Vec<(String, String)>>,
}

impl OptionPatch {
    /// A bare style name sets `color` (and `color_text` if unset)
    pub fn color(name: &str) -> Self {
        Self {
            color: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// A bare 1/2 sets the border width
    pub fn border(width: u8) -> Self {
        Self {
            border: Some(width),
            ..Self::default()
        }
    }
}

/// A buffered line within a box
#[derive(Debug, Clone, PartialEq)]
pub struct LineEntry {
    /// Custom left-margin marker placed after the connector glyphs
    pub prefix: String,
    /// Margin color for this line
    pub color: String,
    /// Text color for this line
    pub color_text: String,
    /// None is an explicit blank line: it occupies a tree row but renders
    /// an empty content cell
    pub text: Option<String>,
}

/// An ordered entry of a box: a leaf line or a nested child box
#[derive(Debug, Clone)]
pub(crate) enum Entry {
    Line(LineEntry),
    Child(LogBox),
}

/// Tree node state behind a [`LogBox`] handle
#[derive(Debug)]
pub struct BoxNode {
    pub(crate) id: String,
    pub(crate) parent: Weak<RefCell<BoxNode>>,
    pub(crate) level: usize,
    pub(crate) entries: Vec<Entry>,
    pub(crate) options: BoxOptions,
    pub(crate) ready: bool,
    /// Render state, present on root nodes only (see render.rs)
    pub(crate) output: Option<Rc<RefCell<crate::render::Output>>>,
}

/// Shared handle to a box node
///
/// Ownership flows root → children; the parent link is weak, so dropping a
/// root frees the whole tree without cycle breaking.
#[derive(Debug, Clone)]
pub struct LogBox {
    inner: Rc<RefCell<BoxNode>>,
}

impl LogBox {
    /// Create a detached root box (level 0, not ready)
    ///
    /// Most callers want [`crate::root`] instead, which attaches a terminal
    /// sink; a bare root can only `build()` strings.
    pub fn new_root(options: BoxOptions) -> Self {
        Self {
            inner: Rc::new(RefCell::new(BoxNode {
                id: generate_id(),
                parent: Weak::new(),
                level: 0,
                entries: Vec::new(),
                options,
                ready: false,
                output: None,
            })),
        }
    }

    pub(crate) fn node(&self) -> Ref<'_, BoxNode> {
        self.inner.borrow()
    }

    pub(crate) fn node_mut(&self) -> RefMut<'_, BoxNode> {
        self.inner.borrow_mut()
    }

    /// Opaque unique identifier; equality only, never ordering
    pub fn id(&self) -> String {
        self.node().id.clone()
    }

    /// Nesting depth; root is 0, children are parent + 1 (immutable)
    pub fn level(&self) -> usize {
        self.node().level
    }

    /// Whether this subtree is eligible for rendering
    pub fn is_ready(&self) -> bool {
        self.node().ready
    }

    /// Snapshot of the current options
    pub fn options(&self) -> BoxOptions {
        self.node().options.clone()
    }

    /// Parent handle, if any
    pub fn parent(&self) -> Option<LogBox> {
        self.node().parent.upgrade().map(|inner| LogBox { inner })
    }

    /// Walk up `generations` parents, stopping at the root
    pub fn ancestor(&self, generations: usize) -> LogBox {
        let mut current = self.clone();
        for _ in 0..generations {
            match current.parent() {
                Some(p) => current = p,
                None => break,
            }
        }
        current
    }

    /// The root of this tree (self when already root)
    pub fn root(&self) -> LogBox {
        let mut current = self.clone();
        while let Some(p) = current.parent() {
            current = p;
        }
        current
    }

    /// Number of buffered entries (lines and child boxes)
    pub fn entry_count(&self) -> usize {
        self.node().entries.len()
    }

    // ─── Mutation API ────────────────────────────────────────────────────

    /// Merge partial options; `color` without `color_text` implies both
    pub fn set_options(&self, patch: OptionPatch) -> &Self {
        let mut node = self.node_mut();
        if let Some(border) = patch.border {
            node.options.border = border;
        }
        if let Some(color) = patch.color {
            node.options.color = color.clone();
            node.options.color_text = patch.color_text.clone().unwrap_or(color);
        } else if let Some(color_text) = patch.color_text {
            node.options.color_text = color_text;
        }
        if let Some(map) = patch.wrap_map {
            node.options.wrap_map = map;
        }
        self
    }

    /// Append a plain line
    pub fn line(&self, text: &str) -> &Self {
        self.append(&[Value::String(text.to_string())])
    }

    /// Append a line with a trailing spec token: a recognized color/effect
    /// name, or `"pre:<marker>"` for a custom left-margin marker
    pub fn line_styled(&self, text: &str, spec: &str) -> &Self {
        self.append(&[
            Value::String(text.to_string()),
            Value::String(spec.to_string()),
        ])
    }

    /// Append with printf-style formatting (`%s`/`%d`/`%j`/`%%`)
    pub fn linef(&self, args: &[Value]) -> &Self {
        self.append(args)
    }

    /// Append an explicit blank line
    pub fn blank(&self) -> &Self {
        let opt = self.options();
        self.push_line(LineEntry {
            prefix: " ".to_string(),
            color: opt.color,
            color_text: opt.color_text,
            text: None,
        });
        self
    }

    /// Append one or more content tokens as a line
    ///
    /// The last token is consumed as styling when it is a recognized
    /// color/effect name, or as a margin marker when it starts with `pre:`.
    /// Mapping/sequence tokens are dumped as structured subtrees in place.
    pub fn append(&self, args: &[Value]) -> &Self {
        let opt = self.options();
        let mut entry = LineEntry {
            prefix: " ".to_string(),
            color: opt.color.clone(),
            color_text: opt.color_text.clone(),
            text: None,
        };

        if args.is_empty() {
            self.push_line(entry);
            return self;
        }

        // Trailing spec token: "pre:<marker>" or a style name
        let mut args = args.to_vec();
        if let Some(Value::String(last)) = args.last() {
            if let Some(marker) = last.strip_prefix("pre:") {
                entry.prefix = marker.to_string();
                args.pop();
            } else if style::is_style_name(last) {
                entry.color = last.clone();
                entry.color_text = entry.color.clone();
                args.pop();
            }
        }

        let mut stash: Vec<String> = Vec::new();
        for value in util::expand(&args) {
            match value {
                Value::Object(_) | Value::Array(_) => {
                    self.flush_stash(&mut stash, &entry, &opt);
                    self.object(crate::dump::DumpValue::from(&value));
                }
                scalar => stash.push(style::word(&scalar)),
            }
        }
        self.flush_stash(&mut stash, &entry, &opt);
        self
    }

    /// Join stashed words into one buffered line, applying wrap_map
    fn flush_stash(&self, stash: &mut Vec<String>, entry: &LineEntry, opt: &BoxOptions) {
        if stash.is_empty() {
            return;
        }
        let mut text = stash.join(" ");
        for (pattern, replacement) in &opt.wrap_map {
            text = text.replacen(pattern.as_str(), replacement, 1);
        }
        stash.clear();
        self.push_line(LineEntry {
            text: Some(text),
            ..entry.clone()
        });
    }

    fn push_line(&self, entry: LineEntry) {
        self.node_mut().entries.push(Entry::Line(entry));
    }

    /// Create a child box, appended to this box immediately
    pub fn child_box(&self) -> LogBox {
        self.child_box_opts(None, OptionPatch::default())
    }

    /// Single-argument overload: a recognized color/effect name becomes the
    /// border color option, any other string becomes the initial line
    pub fn child_box_with(&self, line_or_color: &str) -> LogBox {
        if style::is_style_name(line_or_color) {
            self.child_box_opts(None, OptionPatch::color(line_or_color))
        } else {
            self.child_box_opts(Some(line_or_color), OptionPatch::default())
        }
    }

    /// Create a child box with an optional initial line and option patch
    pub fn child_box_opts(&self, initial_line: Option<&str>, patch: OptionPatch) -> LogBox {
        let (level, options) = {
            let node = self.node();
            (node.level + 1, BoxOptions::default())
        };
        let child = LogBox {
            inner: Rc::new(RefCell::new(BoxNode {
                id: generate_id(),
                parent: Rc::downgrade(&self.inner),
                level,
                entries: Vec::new(),
                options,
                ready: false,
                output: None,
            })),
        };
        child.set_options(patch);
        if let Some(text) = initial_line {
            child.line(text);
        }
        self.node_mut().entries.push(Entry::Child(child.clone()));
        child
    }

    /// Mark this box ready for rendering (one-way)
    pub fn mark_ready(&self) -> &Self {
        self.node_mut().ready = true;
        self
    }

    /// Append a final line, then mark ready
    pub fn mark_ready_with(&self, text: &str) -> &Self {
        self.line(text);
        self.mark_ready()
    }

    /// Whether two handles point at the same node
    pub fn same_node(&self, other: &LogBox) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Generate an opaque box id: creation time in base36 plus a random suffix
///
/// Uses RandomState to get a random value without adding a dependency.
fn generate_id() -> String {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let random = RandomState::new().build_hasher().finish();
    format!("{}{}", to_base36(millis), to_base36(random & 0x3FFF_FFFF))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).expect("base36 digits are ASCII")
}
