//! Crate root: wires the AST input contract, import resolution, lowering,
//! and the concrete pass sequence together behind one [`compile`] entry
//! point.
//!
//! Nothing here touches a filesystem or a parser; both are the driver's
//! job, reached only through [`ast::Source`] and [`import::ImportResolver`].

pub mod ast;
pub mod diagnostics;
pub mod import;
pub mod lower;
pub mod pass;
pub mod passes;
pub mod symbol_data;

use diagnostics::{DiagnosticKind, Diagnostics, SinkConfig};
use import::{ImportError, ImportResolver};
use pass::{PassDriverError, PassScheduler, ScheduleError};
use passes::declare_functions::DeclareFunctions;
use passes::declare_types::DeclareTypes;
use passes::init_symbols::InitSymbols;
use passes::mangle::Mangle;
use passes::resolve::ResolveSymbols;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Compilation ran to completion (or was stopped by a fatal diagnostic)
    /// but the accumulated diagnostics meet the sink's `fail_ge` threshold.
    /// The bag is returned, not discarded, so a caller can still render it.
    #[error("compilation produced diagnostics at or above the fail threshold")]
    Diagnosed(Diagnostics),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

/// Resolve every import reachable from `entry`, lower the resulting program,
/// and run the full pass sequence (`init_symbols` → `declare_types` →
/// `declare_functions` → `resolve` → `mangle`) over it.
///
/// Returns the annotated IR together with whatever diagnostics were raised
/// along the way, even when none of them met the fail threshold: a caller
/// that only cares about success can ignore the bag, and one that wants
/// warnings too doesn't have to re-run anything to see them.
pub fn compile(
    entry: ast::Source,
    resolver: &mut dyn ImportResolver,
    config: SinkConfig,
) -> Result<(aize_core::ir::Ir, Diagnostics), Error> {
    let mut diagnostics = Diagnostics::new(config.clone());

    let sources = match import::trace_imports(entry, resolver) {
        Ok(sources) => sources,
        Err((err, pos)) => {
            let mut tracing_sink = Diagnostics::new(config);
            let _ = tracing_sink.report(pos, import_error_kind(err)).emit();
            diagnostics.extend(tracing_sink);
            return Err(Error::Diagnosed(diagnostics));
        }
    };

    let mut ir = lower::lower_program(&sources);

    let mut scheduler = PassScheduler::new();
    scheduler
        .push(Box::new(InitSymbols))
        .push(Box::new(DeclareTypes))
        .push(Box::new(DeclareFunctions))
        .push(Box::new(ResolveSymbols))
        .push(Box::new(Mangle));

    match scheduler.run(&mut ir, &mut diagnostics) {
        Ok(()) => {}
        Err(PassDriverError::Schedule(err)) => return Err(Error::Schedule(err)),
        Err(PassDriverError::Fatal) => return Err(Error::Diagnosed(diagnostics)),
    }

    if diagnostics.has_errors() {
        return Err(Error::Diagnosed(diagnostics));
    }
    Ok((ir, diagnostics))
}

fn import_error_kind(err: ImportError) -> DiagnosticKind {
    match err {
        ImportError::BadAnchor(text) => DiagnosticKind::BadImportAnchor { text },
        ImportError::NotFound(path) => DiagnosticKind::ImportNotFound { path },
        ImportError::SelfImport => DiagnosticKind::SelfImport,
    }
}
