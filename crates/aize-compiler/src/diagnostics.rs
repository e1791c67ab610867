//! Diagnostic collection and rendering.
//!
//! There is no singleton logger here: a [`Diagnostics`] sink is a plain
//! value, created once per compilation and threaded explicitly through the
//! pass scheduler and every pass that needs to report something.

use aize_core::source::{Position, SourceRegistry};
use aize_core::symbol::SymbolKind;
use std::fmt;

/// How serious a diagnostic is. Ordered, so `a >= b` reads "at least as
/// severe as `b`" — exactly what the sink's thresholds compare against.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Severity {
    Note,
    Message,
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Note => "NOTE",
            Severity::Message => "MESSAGE",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        })
    }
}

/// Every distinct diagnostic the compiler can raise, carrying the data its
/// default message is built from.
#[derive(Clone, Debug)]
pub enum DiagnosticKind {
    UndefinedName {
        kind: SymbolKind,
        name: String,
    },
    DuplicateDefinition {
        kind: SymbolKind,
        name: String,
        previous: Position,
    },
    AttributeNotFound {
        attr: String,
        ty: String,
    },
    RepeatedField {
        name: String,
        previous: Position,
    },
    RepeatedVariant {
        name: String,
        previous: Position,
    },
    UnknownIntrinsic {
        name: String,
    },
    BadImportAnchor {
        text: String,
    },
    ImportNotFound {
        path: String,
    },
    SelfImport,
    TooManyArguments {
        expected: usize,
        found: usize,
    },
    TooFewArguments {
        expected: usize,
        found: usize,
    },
    TypeMismatch {
        expected: String,
        found: String,
    },
    NarrowingInt {
        from: String,
        to: String,
    },
    SignMismatch {
        from: String,
        to: String,
    },
    ExpectedAggregate {
        found: String,
    },
    ExpectedFunction {
        found: String,
    },
    ExpectedInteger {
        found: String,
    },
    ExpectedLvalue,
    NotAlwaysTerminating {
        name: String,
    },
    MalformedTypeExpr,
    MalformedNamespaceExpr,
    /// A struct/union function with no parameters at all; it needs at least
    /// an implicit `self`.
    MissingSelfParam,
}

impl DiagnosticKind {
    /// Every kind here is reported at `Error`; nothing in this compiler
    /// currently produces a warning or a fatal diagnostic of its own (fatal
    /// is reserved for the sink's threshold machinery, not a kind anyone
    /// constructs).
    pub fn severity(&self) -> Severity {
        Severity::Error
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::UndefinedName { kind, name } => {
                write!(f, "no {kind} named '{name}' found")
            }
            DiagnosticKind::DuplicateDefinition { kind, name, .. } => {
                write!(f, "{kind} '{name}' is already defined")
            }
            DiagnosticKind::AttributeNotFound { attr, ty } => {
                write!(f, "'{ty}' has no attribute '{attr}'")
            }
            DiagnosticKind::RepeatedField { name, .. } => write!(f, "field '{name}' is repeated"),
            DiagnosticKind::RepeatedVariant { name, .. } => write!(f, "variant '{name}' is repeated"),
            DiagnosticKind::UnknownIntrinsic { name } => {
                write!(f, "unknown intrinsic '{name}'")
            }
            DiagnosticKind::BadImportAnchor { text } => {
                write!(f, "'{text}' is not a valid import anchor")
            }
            DiagnosticKind::ImportNotFound { path } => write!(f, "could not find '{path}'"),
            DiagnosticKind::SelfImport => write!(f, "a source cannot import itself"),
            DiagnosticKind::TooManyArguments { expected, found } => write!(
                f,
                "too many arguments: expected {expected}, found {found}"
            ),
            DiagnosticKind::TooFewArguments { expected, found } => write!(
                f,
                "too few arguments: expected {expected}, found {found}"
            ),
            DiagnosticKind::TypeMismatch { expected, found } => {
                write!(f, "expected '{expected}', found '{found}'")
            }
            DiagnosticKind::NarrowingInt { from, to } => {
                write!(f, "'{from}' does not fit in '{to}' without narrowing")
            }
            DiagnosticKind::SignMismatch { from, to } => {
                write!(f, "cannot convert '{from}' to '{to}': sign mismatch")
            }
            DiagnosticKind::ExpectedAggregate { found } => {
                write!(f, "expected a struct or union, found '{found}'")
            }
            DiagnosticKind::ExpectedFunction { found } => {
                write!(f, "expected a function, found '{found}'")
            }
            DiagnosticKind::ExpectedInteger { found } => {
                write!(f, "expected an integer type, found '{found}'")
            }
            DiagnosticKind::ExpectedLvalue => write!(f, "expression is not assignable"),
            DiagnosticKind::NotAlwaysTerminating { name } => write!(
                f,
                "function '{name}' does not always terminate with a return"
            ),
            DiagnosticKind::MalformedTypeExpr => write!(f, "not a valid type expression"),
            DiagnosticKind::MalformedNamespaceExpr => {
                write!(f, "not a valid namespace expression")
            }
            DiagnosticKind::MissingSelfParam => {
                write!(f, "expected at least one parameter (self)")
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub pos: Position,
    pub message: String,
}

/// Thresholds a [`Diagnostics`] sink is configured with. All three are
/// independent: a diagnostic can flush immediately without making the
/// compilation a failure, or vice versa.
#[derive(Clone, Debug)]
pub struct SinkConfig {
    /// Emitting a diagnostic at or above this severity renders and appends
    /// it to the sink's transcript as soon as it is emitted, rather than
    /// waiting for an explicit `render`/`flush` call. `None` disables this.
    pub immediate_flush_ge: Option<Severity>,
    /// Emitting a diagnostic at or above this severity aborts the pass that
    /// emitted it by returning [`Fatal`].
    pub throw_ge: Option<Severity>,
    /// [`Diagnostics::has_errors`] is true once any diagnostic at or above
    /// this severity has been emitted.
    pub fail_ge: Option<Severity>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        SinkConfig {
            immediate_flush_ge: Some(Severity::Fatal),
            throw_ge: None,
            fail_ge: Some(Severity::Error),
        }
    }
}

/// Emitted when a diagnostic at or above the sink's `throw_ge` threshold is
/// reported. Passes propagate this with `?` to stop running on IR a fatal
/// error has made meaningless, rather than pushing on to produce more
/// (likely nonsensical) diagnostics.
#[derive(Debug)]
pub struct Fatal;

/// A non-singleton diagnostic sink: collects diagnostics as they are
/// reported and renders them against a [`SourceRegistry`] on demand.
#[derive(Default)]
pub struct Diagnostics {
    config: SinkConfig,
    pending: Vec<Diagnostic>,
    highest: Option<Severity>,
}

impl Diagnostics {
    pub fn new(config: SinkConfig) -> Self {
        Diagnostics {
            config,
            pending: Vec::new(),
            highest: None,
        }
    }

    pub fn report(&mut self, pos: Position, kind: DiagnosticKind) -> ReportBuilder<'_> {
        let severity = kind.severity();
        ReportBuilder {
            sink: self,
            pos,
            kind,
            severity,
            message: None,
        }
    }

    /// Mirrors the original handler's two-step behavior: a message at or
    /// above `throw_ge` aborts before it is even buffered; otherwise it is
    /// buffered, and if it meets `immediate_flush_ge` the whole buffer is
    /// considered "flushed" on the spot, which aborts if the accumulated
    /// severity (this message or an earlier one) meets `fail_ge`.
    fn push(&mut self, diag: Diagnostic) -> Result<(), Fatal> {
        let severity = diag.severity;
        if self.config.throw_ge.is_some_and(|t| severity >= t) {
            return Err(Fatal);
        }
        self.highest = Some(match self.highest {
            Some(h) if h >= severity => h,
            _ => severity,
        });
        let flushed = self.config.immediate_flush_ge.is_some_and(|t| severity >= t);
        self.pending.push(diag);
        if flushed && self.has_errors() {
            return Err(Fatal);
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn has_errors(&self) -> bool {
        self.config
            .fail_ge
            .is_some_and(|t| self.highest.is_some_and(|h| h >= t))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.pending.iter()
    }

    /// Move every diagnostic from `other` into `self`, e.g. after tracing an
    /// imported source with its own sink.
    pub fn extend(&mut self, other: Diagnostics) {
        for d in other.pending {
            self.highest = Some(match self.highest {
                Some(h) if h >= d.severity => h,
                _ => d.severity,
            });
            self.pending.push(d);
        }
    }

    /// Render every pending diagnostic, in emission order. Indexes rather
    /// than draining, so it stays safe to call mid-compilation and again
    /// later once more diagnostics have accumulated.
    pub fn render(&self, registry: &SourceRegistry) -> String {
        let mut out = String::new();
        let mut i = 0;
        while i < self.pending.len() {
            out.push_str(&render_one(&self.pending[i], registry));
            out.push('\n');
            i += 1;
        }
        out
    }
}

/// Render one diagnostic per the fixed contract:
/// ```text
/// In <source-name>:
/// <Kind>: <msg>:
///   <line> | <line-text>
///          <spaces><carets>[>]
/// ```
/// A source-level message (no text span, just a whole source) instead reads
/// `For <name>:` and omits the positional block entirely.
fn render_one(diag: &Diagnostic, registry: &SourceRegistry) -> String {
    let mut out = match &diag.pos {
        Position::Text(t) => format!(
            "In {}:\n{}: {}:\n{}",
            registry.name(t.source),
            diag.severity,
            diag.message,
            t.render_in_context(registry)
        ),
        Position::Source { name } => format!("For {name}:\n{}: {}:", diag.severity, diag.message),
        Position::Builtin => format!("In <builtin>:\n{}: {}:", diag.severity, diag.message),
        Position::None => format!("{}: {}:", diag.severity, diag.message),
    };
    let previous = match &diag.kind {
        DiagnosticKind::DuplicateDefinition { previous, .. } => Some(previous),
        DiagnosticKind::RepeatedField { previous, .. } => Some(previous),
        DiagnosticKind::RepeatedVariant { previous, .. } => Some(previous),
        _ => None,
    };
    if let Some(previous) = previous {
        out.push('\n');
        out.push_str(&indent_one_level(&render_note(
            "previous definition is here",
            previous,
            registry,
        )));
    }
    out
}

fn render_note(message: &str, pos: &Position, registry: &SourceRegistry) -> String {
    match pos {
        Position::Text(t) => format!(
            "In {}:\nNOTE: {message}:\n{}",
            registry.name(t.source),
            t.render_in_context(registry)
        ),
        Position::Source { name } => format!("For {name}:\nNOTE: {message}:"),
        Position::Builtin => format!("In <builtin>:\nNOTE: {message}:"),
        Position::None => format!("NOTE: {message}:"),
    }
}

fn indent_one_level(text: &str) -> String {
    text.lines()
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[must_use = "diagnostic not reported until .emit() is called"]
pub struct ReportBuilder<'a> {
    sink: &'a mut Diagnostics,
    pos: Position,
    kind: DiagnosticKind,
    severity: Severity,
    message: Option<String>,
}

impl<'a> ReportBuilder<'a> {
    /// Override the default severity [`DiagnosticKind::severity`] reports.
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Override the kind's default `Display` text with call-site-specific
    /// wording.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn emit(self) -> Result<(), Fatal> {
        let message = self.message.unwrap_or_else(|| self.kind.to_string());
        self.sink.push(Diagnostic {
            severity: self.severity,
            kind: self.kind,
            pos: self.pos,
            message,
        })
    }
}
