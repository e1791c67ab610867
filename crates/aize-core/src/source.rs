//! Source text registry and source positions.
//!
//! A [`Source`] is registered once per distinct "unique" key (its resolved
//! path, or a synthetic name for sources that have no file backing, such as
//! builtins). [`Position`] values point into a registered source, or stand
//! in for the handful of non-textual origins (builtins, whole-source
//! references, "nowhere") that the rest of the compiler needs to attach a
//! diagnostic to.

use std::collections::HashMap;
use std::path::PathBuf;

/// The key a [`Source`] is deduplicated on. Two imports that resolve to the
/// same key refer to the same source and are only parsed/lowered once.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum SourceKey {
    Path(PathBuf),
    Name(String),
}

/// A handle into a [`SourceRegistry`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SourceId(u32);

impl SourceId {
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

struct SourceRecord {
    name: String,
    #[allow(dead_code)] // kept for debugging / future re-lookup by key
    key: SourceKey,
    lines: Vec<String>,
}

/// Registry of every source text seen during a compilation. Sources are
/// registered at most once per unique key.
#[derive(Default)]
pub struct SourceRegistry {
    records: Vec<SourceRecord>,
    by_key: HashMap<SourceKey, SourceId>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source's text under `key`, or return the existing
    /// registration if `key` was already seen. Returns the id and whether
    /// this call performed a fresh insertion.
    pub fn get_or_insert(&mut self, key: SourceKey, name: String, text: &str) -> (SourceId, bool) {
        if let Some(&id) = self.by_key.get(&key) {
            return (id, false);
        }
        let lines = text.lines().map(String::from).collect();
        let id = SourceId(self.records.len() as u32);
        self.records.push(SourceRecord {
            name,
            key: key.clone(),
            lines,
        });
        self.by_key.insert(key, id);
        (id, true)
    }

    pub fn name(&self, id: SourceId) -> &str {
        &self.records[id.0 as usize].name
    }

    /// 1-based line lookup.
    pub fn line(&self, id: SourceId, line_no: u32) -> &str {
        self.records[id.0 as usize]
            .lines
            .get((line_no - 1) as usize)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn line_len(&self, id: SourceId, line_no: u32) -> usize {
        self.line(id, line_no).chars().count()
    }
}

/// A 1-based, half-open span (`col_start..col_end`) on a single line of a
/// registered source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextPosition {
    pub source: SourceId,
    pub line: u32,
    pub col_start: u32,
    pub col_end: u32,
    /// Set when this position was produced by combining a span that
    /// actually continues past the end of this line.
    pub continued: bool,
}

impl TextPosition {
    /// # Panics
    /// Panics if `1 <= col_start < col_end` or `col_end - 1 <= line length`
    /// does not hold; lowering is expected to only ever construct positions
    /// derived from real token spans, so a violation here is a lowering
    /// bug, not a user-facing error.
    pub fn new(
        source: SourceId,
        line: u32,
        col_start: u32,
        col_end: u32,
        continued: bool,
        registry: &SourceRegistry,
    ) -> Self {
        assert!(col_start >= 1 && col_start < col_end, "malformed span");
        assert!(
            (col_end - 1) as usize <= registry.line_len(source, line),
            "span extends past end of line"
        );
        TextPosition {
            source,
            line,
            col_start,
            col_end,
            continued,
        }
    }

    /// Render the gutter-and-caret context block for this position:
    /// ```text
    /// {line:>6} | {source text of that line}
    ///          {indent}{carets}{>if continued}
    /// ```
    pub fn render_in_context(&self, registry: &SourceRegistry) -> String {
        let line_text = registry.line(self.source, self.line);
        let gutter = format!("{:>6} | {}", self.line, line_text);
        let indent = " ".repeat((self.col_start - 1) as usize);
        let carets = "^".repeat((self.col_end - self.col_start) as usize);
        let trailing = if self.continued { ">" } else { "" };
        format!("{gutter}\n         {indent}{carets}{trailing}")
    }
}

/// Where a diagnostic or symbol attaches in source. Four kinds, matching
/// the origins the rest of the compiler can actually produce: a real text
/// span, a builtin with no source at all, a whole-source reference, or no
/// position whatsoever (used rarely, e.g. for synthetic top-level errors).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Position {
    Text(TextPosition),
    Builtin,
    Source { name: String },
    None,
}

impl Position {
    pub fn source_name<'a>(&'a self, registry: &'a SourceRegistry) -> &'a str {
        match self {
            Position::Text(t) => registry.name(t.source),
            Position::Source { name } => name,
            Position::Builtin => "<builtin>",
            Position::None => "<no position>",
        }
    }

    /// Merge two positions that together describe a single construct (e.g.
    /// the span of a binary expression built from its two operands).
    ///
    /// - Same source, same line: the column range is the union of both.
    /// - Same source, different lines: the result spans the earlier line
    ///   from its start column to the end of that line, marked `continued`.
    /// - Otherwise: the left operand (`self`) is returned unchanged.
    pub fn combine(self, other: Position, registry: &SourceRegistry) -> Position {
        if let (Position::Text(a), Position::Text(b)) = (&self, &other) {
            if a.source == b.source {
                if a.line == b.line {
                    return Position::Text(TextPosition {
                        source: a.source,
                        line: a.line,
                        col_start: a.col_start.min(b.col_start),
                        col_end: a.col_end.max(b.col_end),
                        continued: a.continued || b.continued,
                    });
                }
                let earlier = if a.line <= b.line { a } else { b };
                let line_len = registry.line_len(earlier.source, earlier.line);
                return Position::Text(TextPosition {
                    source: earlier.source,
                    line: earlier.line,
                    col_start: earlier.col_start,
                    col_end: (line_len as u32) + 1,
                    continued: true,
                });
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(text: &str) -> (SourceRegistry, SourceId) {
        let mut registry = SourceRegistry::new();
        let (id, fresh) =
            registry.get_or_insert(SourceKey::Name("t".into()), "t.aize".into(), text);
        assert!(fresh);
        (registry, id)
    }

    #[test]
    fn registering_twice_returns_same_id() {
        let mut registry = SourceRegistry::new();
        let (a, fresh_a) =
            registry.get_or_insert(SourceKey::Name("x".into()), "x.aize".into(), "a\nb");
        let (b, fresh_b) =
            registry.get_or_insert(SourceKey::Name("x".into()), "x.aize".into(), "a\nb");
        assert_eq!(a, b);
        assert!(fresh_a);
        assert!(!fresh_b);
    }

    #[test]
    fn render_in_context_matches_gutter_format() {
        let (registry, id) = registry_with("let x = 1;");
        let pos = TextPosition::new(id, 1, 5, 6, false, &registry);
        let rendered = pos.render_in_context(&registry);
        assert_eq!(rendered, "     1 | let x = 1;\n             ^");
    }

    #[test]
    fn combine_same_line_takes_union() {
        let (registry, id) = registry_with("a + b");
        let left = Position::Text(TextPosition::new(id, 1, 1, 2, false, &registry));
        let right = Position::Text(TextPosition::new(id, 1, 5, 6, false, &registry));
        let combined = left.combine(right, &registry);
        match combined {
            Position::Text(t) => {
                assert_eq!((t.col_start, t.col_end), (1, 6));
                assert!(!t.continued);
            }
            _ => panic!("expected Text position"),
        }
    }

    #[test]
    fn combine_different_lines_spans_to_end_of_earlier_line() {
        let (registry, id) = registry_with("foo(\n  bar\n)");
        let left = Position::Text(TextPosition::new(id, 1, 1, 4, false, &registry));
        let right = Position::Text(TextPosition::new(id, 2, 3, 6, false, &registry));
        let combined = left.combine(right, &registry);
        match combined {
            Position::Text(t) => {
                assert_eq!(t.line, 1);
                assert_eq!(t.col_start, 1);
                assert_eq!(t.col_end as usize - 1, registry.line_len(id, 1));
                assert!(t.continued);
            }
            _ => panic!("expected Text position"),
        }
    }

    #[test]
    fn combine_mismatched_sources_returns_left_operand() {
        let (registry, id) = registry_with("x");
        let left = Position::Builtin;
        let right = Position::Text(TextPosition::new(id, 1, 1, 2, false, &registry));
        assert_eq!(left.clone().combine(right, &registry), left);
    }
}
