// Structural dumper - renders arbitrary values as nested box tables
//
// Two passes over the value. `compile` gathers layout figures: the widest
// key, the widest rendered value, and the deepest leaf, seeding the column
// split of every table row. `insert` then builds one child box per container
// with a right-aligned kind header, `key···: value` rows, and a footer
// carrying the access path and entry count. Boxes are marked ready as they
// are created, so the dump renders with whatever flush the caller does next.

use crate::style;
use crate::tree::{LogBox, OptionPatch};
use crate::util;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// A value the dumper knows how to lay out
///
/// The set is closed on purpose: callers with richer types convert into
/// these five shapes up front, and every layout rule below can assume one
/// of them.
#[derive(Debug, Clone)]
pub enum DumpValue {
    /// Strings, numbers, booleans and null
    Scalar(Value),
    Sequence(Vec<DumpValue>),
    /// Ordered key/value pairs
    Mapping(Vec<(String, DumpValue)>),
    /// Source text, rendered as a numbered listing
    FunctionLike(String),
    /// Rendered as ISO-8601 in blue
    DateLike(DateTime<Utc>),
}

impl From<&Value> for DumpValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Array(items) => DumpValue::Sequence(items.iter().map(Self::from).collect()),
            Value::Object(map) => DumpValue::Mapping(
                map.iter().map(|(k, v)| (k.clone(), Self::from(v))).collect(),
            ),
            scalar => DumpValue::Scalar(scalar.clone()),
        }
    }
}

impl DumpValue {
    /// Convert any serializable value through its JSON representation
    pub fn from_serialize<T: serde::Serialize>(value: &T) -> serde_json::Result<Self> {
        Ok(Self::from(&serde_json::to_value(value)?))
    }

    fn is_container(&self) -> bool {
        matches!(self, DumpValue::Sequence(_) | DumpValue::Mapping(_))
    }

    /// Conventional display name of the container kind
    fn kind_name(&self) -> &'static str {
        match self {
            DumpValue::Sequence(_) => "[object Array]",
            DumpValue::FunctionLike(_) => "[Function]",
            _ => "[object Object]",
        }
    }

    /// Entries as (key, value) pairs; sequences are keyed by index
    fn entries(&self) -> Vec<(String, &DumpValue)> {
        match self {
            DumpValue::Mapping(pairs) => pairs.iter().map(|(k, v)| (k.clone(), v)).collect(),
            DumpValue::Sequence(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Layout knobs of a dump, merged over these defaults
#[derive(Debug, Clone)]
pub struct DumpOptions {
    /// Root label of the access path in footers
    pub path_label: String,
    /// Minimum key column width
    pub pad_key: usize,
    /// Minimum value column width
    pub pad_val: usize,
    /// Per-depth box color cycle
    pub colors: Vec<String>,
    /// Table width ceiling; the terminal width when unset
    pub width: Option<usize>,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            path_label: "#".to_string(),
            pad_key: 15,
            pad_val: 45,
            colors: ["cyan", "green", "yellow", "red", "magenta"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            width: None,
        }
    }
}

/// Figures gathered by the compile pass
#[derive(Debug)]
struct Layout {
    pad_key: usize,
    pad_val: usize,
    max_level: usize,
    /// Total table width: pad_key + pad_val, clamped to the ceiling
    pad: usize,
}

impl LogBox {
    /// Dump a structured value as nested tables appended to this box
    pub fn object(&self, value: DumpValue) {
        self.object_with(value, DumpOptions::default());
    }

    /// Dump with explicit layout options
    pub fn object_with(&self, value: DumpValue, opts: DumpOptions) {
        // A bare scalar has no table shape; append it as a styled word
        if let DumpValue::Scalar(scalar) = &value {
            self.line(&style::word(scalar));
            return;
        }
        if let DumpValue::DateLike(date) = &value {
            self.line(&style::apply(&iso(date), "blue"));
            return;
        }

        let std_width = match opts.width {
            Some(w) => w,
            None => self.ensure_output().borrow().width_provider.width(),
        };

        let mut layout = Layout {
            pad_key: opts.pad_key,
            pad_val: opts.pad_val,
            max_level: self.level(),
            pad: 0,
        };
        compile(&value, self.level(), &mut layout);

        // Make room for ": " and the nesting depth, then clamp
        layout.pad_key += layout.max_level;
        layout.pad_val += 2;
        layout.pad = layout.pad_key + layout.pad_val;
        if layout.pad > std_width {
            layout.pad = std_width;
            if layout.pad_key > layout.pad {
                layout.pad_key = ratio(layout.pad, 0.7);
                layout.pad_val = ratio(layout.pad, 0.3);
            } else {
                layout.pad_val = layout.pad - layout.pad_key;
            }
        }
        tracing::trace!(
            pad_key = layout.pad_key,
            pad_val = layout.pad_val,
            pad = layout.pad,
            max_level = layout.max_level,
            "dump layout"
        );

        let dumper = Dumper {
            host_level: self.level(),
            layout,
            opts,
            std_width,
        };
        let mut path = vec![dumper.opts.path_label.clone()];
        dumper.insert(&value, self, None, &mut path);
    }
}

/// Widest key / widest value / deepest leaf, walked bottom-up
fn compile(value: &DumpValue, level: usize, layout: &mut Layout) {
    match value {
        DumpValue::Sequence(items) => {
            layout.pad_key = layout.pad_key.max(items.len());
            for item in items {
                compile(item, level + 1, layout);
            }
        }
        DumpValue::Mapping(pairs) => {
            // Container display names split roughly 40/60 over the columns
            let name_len = value.kind_name().len();
            layout.pad_key = layout.pad_key.max(ratio(name_len, 0.4) + 2);
            layout.pad_val = layout.pad_val.max(ratio(name_len, 0.6) + 2);
            for (key, val) in pairs {
                layout.pad_key = layout.pad_key.max(key.chars().count());
                compile(val, level + 1, layout);
            }
        }
        DumpValue::FunctionLike(source) => {
            layout.max_level = layout.max_level.max(level);
            let widest = source.split('\n').map(style::width).max().unwrap_or(0);
            layout.pad_val = layout.pad_val.max(widest);
        }
        DumpValue::DateLike(date) => {
            layout.max_level = layout.max_level.max(level);
            layout.pad_val = layout.pad_val.max(iso(date).len());
        }
        DumpValue::Scalar(scalar) => {
            layout.max_level = layout.max_level.max(level);
            layout.pad_val = layout.pad_val.max(style::width(&scalar_text(scalar)));
        }
    }
}

struct Dumper {
    host_level: usize,
    layout: Layout,
    opts: DumpOptions,
    std_width: usize,
}

impl Dumper {
    /// Build one box for a container value, recursing into nested containers
    fn insert(
        &self,
        value: &DumpValue,
        parent: &LogBox,
        title: Option<String>,
        path: &mut Vec<String>,
    ) {
        let pad = self.layout.pad;
        let entries = value.entries();
        let boxed = parent.child_box();
        boxed.mark_ready();
        let level = boxed.level();
        let depth = level - self.host_level;

        let color = if matches!(value, DumpValue::FunctionLike(_)) {
            "blue".to_string()
        } else {
            self.opts.colors[(depth - 1) % self.opts.colors.len()].clone()
        };
        boxed.set_options(OptionPatch::color(&color));

        // Kind header, right-aligned against filler dashes
        if !matches!(value, DumpValue::FunctionLike(_)) {
            let header = title.unwrap_or_else(|| {
                let name = value.kind_name();
                format!(
                    "{}{}{}",
                    style::apply(
                        &util::fill("─", pad.saturating_sub(level + name.len() + 3)),
                        "dim"
                    ),
                    name,
                    style::apply("─┐", "dim")
                )
            });
            boxed.line_styled(&header, "pre:");
        }

        // Function listings stand alone, no header and no footer
        if let DumpValue::FunctionLike(source) = value {
            return self.insert_function(source, &boxed);
        }

        if entries.is_empty() {
            self.insert_empty_marker(&boxed, depth);
        }

        for (i, (key, val)) in entries.iter().enumerate() {
            match val {
                DumpValue::Mapping(_) | DumpValue::Sequence(_) => {
                    // Extend the access path at this depth: bracket notation
                    // for integer-like keys, dot notation otherwise
                    let segment = if key.parse::<u64>().is_ok_and(|n| n.to_string() == *key) {
                        format!("[{}]", key)
                    } else {
                        format!(".{}", key)
                    };
                    if path.len() <= level + 1 {
                        path.resize(level + 2, String::new());
                    }
                    path[level + 1] = segment;

                    let name = val.kind_name();
                    let dashes = pad
                        .saturating_sub(level + style::width(key) + style::width(name) + 5);
                    let sub_title = format!(
                        "{}{}{}{}{}",
                        key,
                        style::apply(&util::fill("─", dashes), "dim"),
                        name,
                        style::apply("─┬", "dim"),
                        style::apply(&style::apply("┤", &self.opts.colors[0]), "dim")
                    );
                    self.insert(val, &boxed, Some(sub_title), path);
                }
                _ => {
                    let prev_is_container = i
                        .checked_sub(1)
                        .and_then(|p| entries.get(p))
                        .map(|(_, v)| v.is_container())
                        .unwrap_or(false);
                    let next_is_container = entries
                        .get(i + 1)
                        .map(|(_, v)| v.is_container())
                        .unwrap_or(false);
                    self.insert_row(
                        &boxed,
                        key,
                        val,
                        &color,
                        depth,
                        prev_is_container,
                        next_is_container,
                    );
                }
            }
        }

        self.insert_footer(&boxed, parent, entries.len(), path);
    }

    /// One `key···: value` row, continuation lines under a blank key column
    #[allow(clippy::too_many_arguments)]
    fn insert_row(
        &self,
        boxed: &LogBox,
        key: &str,
        val: &DumpValue,
        color: &str,
        depth: usize,
        prev_is_container: bool,
        next_is_container: bool,
    ) {
        let pad_key = self.layout.pad_key;
        let pad_val = self.layout.pad_val;
        let level = boxed.level();

        let key_t = util::truncate(key, pad_key.saturating_sub(level + 2));
        let first_prefix = format!(
            "{}{}",
            key_t,
            style::apply(
                &format!(
                    "{}: ",
                    util::fill("·", pad_key.saturating_sub(style::width(&key_t) + level))
                ),
                "dim"
            )
        );
        let cont_prefix = util::fill(" ", (pad_key + 2).saturating_sub(level));

        let value_lines: Vec<String> = match val {
            DumpValue::FunctionLike(source) => source
                .replace('\t', "  ")
                .split('\n')
                .map(|l| l.to_string())
                .collect(),
            DumpValue::Scalar(Value::String(s)) => {
                crate::wrap::wrap(s, pad_val.saturating_sub(9))
                    .split('\n')
                    .map(|l| l.to_string())
                    .collect()
            }
            DumpValue::DateLike(date) => vec![style::apply(&iso(date), "blue")],
            DumpValue::Scalar(scalar) => vec![style::word(scalar)],
            _ => unreachable!("containers recurse in insert"),
        };

        let last = value_lines.len() - 1;
        for (i, raw) in value_lines.iter().enumerate() {
            let word = match val {
                DumpValue::Scalar(Value::String(_)) | DumpValue::FunctionLike(_) => {
                    style::word(&Value::String(raw.clone()))
                }
                _ => raw.clone(),
            };
            let shown = util::truncate(&word, pad_val.saturating_sub(6));
            let spacer = util::fill(" ", pad_val.saturating_sub(style::width(&shown) + 6));

            // Deep tables join rows to neighboring sub-tables with arrows
            let joint = if depth > 1 {
                if i == last && next_is_container {
                    "↓"
                } else if i == 0 && prev_is_container {
                    "↑"
                } else {
                    "│"
                }
            } else {
                " "
            };

            let marker = if last == 0 {
                "─"
            } else if i == last {
                "┘"
            } else if i == 0 {
                "┐"
            } else {
                "┤"
            };

            boxed.line_styled(
                &format!(
                    "{}{}{}{}{}",
                    if i == 0 { &first_prefix } else { &cont_prefix },
                    style::apply(&shown, "grey"),
                    spacer,
                    style::apply(&style::apply(joint, color), "dim"),
                    style::apply(&style::apply("│", &self.opts.colors[0]), "dim")
                ),
                &format!("pre:{}", marker),
            );
        }
    }

    /// Numbered source listing for function-like values
    fn insert_function(&self, source: &str, boxed: &LogBox) {
        let level = boxed.level();
        let lines: Vec<String> = source
            .replace('\t', "  ")
            .split('\n')
            .map(|l| l.to_string())
            .collect();
        let digits = lines.len().to_string().len();
        let listing_pad = self.layout.pad.max(self.std_width);

        for (i, line) in lines.iter().enumerate() {
            let number = (i + 1).to_string();
            let body = format!(
                "{}{}",
                util::truncate(line, self.layout.pad.saturating_sub(level + 4 + digits)),
                util::fill(
                    " ",
                    listing_pad.saturating_sub(style::width(line) + level + 4 + digits)
                )
            );
            boxed.line_styled(
                &format!("{}─{}", style::apply(&number, "grey"), style::apply(&body, "code")),
                &format!("pre:─{}", util::fill("─", digits - number.len())),
            );
        }
    }

    /// Centered marker row for a container without entries
    fn insert_empty_marker(&self, boxed: &LogBox, depth: usize) {
        let level = boxed.level();
        let marker = "{ empty object }";
        let room = self.layout.pad.saturating_sub(level + marker.len() + 3);
        let left = room / 2;
        let right = room - left;

        let row = style::apply(
            &format!(
                "{}{}{}{}{}",
                util::fill("─", left),
                style::apply(marker, "bold"),
                util::fill("─", right),
                if depth > 1 { "┤" } else { "─" },
                style::apply(if depth > 1 { "│" } else { "┤" }, &self.opts.colors[0])
            ),
            "dim",
        );
        boxed.line_styled(&row, "pre:");
    }

    /// Footer: filler dashes, the accumulated access path, the entry count
    fn insert_footer(&self, boxed: &LogBox, parent: &LogBox, count: usize, path: &[String]) {
        let pad = self.layout.pad;
        let level = boxed.level();
        let trail: String = path.iter().take(level + 1).cloned().collect();
        let footer = format!(
            "{}─({})─",
            util::truncate(&trail, pad.saturating_sub(level + 11)),
            count
        );

        let closing = if parent.level() == self.host_level {
            style::apply("─┘", "dim")
        } else {
            format!(
                "{}{}",
                style::apply("┴", "dim"),
                style::apply(&style::apply("┤", &self.opts.colors[0]), "dim")
            )
        };
        boxed.line_styled(
            &style::apply(
                &format!(
                    "{}{}{}",
                    util::fill("─", pad.saturating_sub(level + style::width(&footer) + 3)),
                    footer,
                    closing
                ),
                "dim",
            ),
            "pre:",
        );
    }
}

fn iso(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn ratio(n: usize, factor: f64) -> usize {
    (n as f64 * factor).round() as usize
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
