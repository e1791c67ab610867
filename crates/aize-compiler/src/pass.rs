//! The pass-scheduling framework.
//!
//! Each pass declares the names of the passes it needs to have already run;
//! a [`PassScheduler`] repeatedly scans its remaining work list for the
//! first pass whose prerequisites are satisfied, removes and runs it, and
//! fails if a full scan finds nothing runnable.

use crate::diagnostics::{Diagnostics, Fatal};
use aize_core::ir::Ir;
use thiserror::Error;

/// One transformation over the IR tree. A pass reads whatever extensions its
/// prerequisites populated, writes its own extension(s), and is recorded by
/// name in [`Ir::ran_passes`] once it completes.
pub trait Pass {
    fn name(&self) -> &'static str;

    /// Names of passes that must have already run before this one is
    /// eligible. Declared rather than hard-wired into the scheduler so
    /// passes stay ignorant of what order they were registered in.
    fn required_passes(&self) -> &'static [&'static str] {
        &[]
    }

    fn run(&mut self, ir: &mut Ir, diagnostics: &mut Diagnostics) -> Result<(), Fatal>;
}

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("no runnable pass among {remaining:?}; a prerequisite cycle or an unscheduled dependency")]
    Deadlock { remaining: Vec<&'static str> },
}

#[derive(Error, Debug)]
pub enum PassDriverError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("a fatal diagnostic stopped compilation")]
    Fatal,
}

impl From<Fatal> for PassDriverError {
    fn from(_: Fatal) -> Self {
        PassDriverError::Fatal
    }
}

/// Round-robin scheduler over a fixed set of passes.
#[derive(Default)]
pub struct PassScheduler {
    passes: Vec<Box<dyn Pass>>,
}

impl PassScheduler {
    pub fn new() -> Self {
        PassScheduler { passes: Vec::new() }
    }

    pub fn push(&mut self, pass: Box<dyn Pass>) -> &mut Self {
        self.passes.push(pass);
        self
    }

    /// Run every registered pass, in an order that honors each pass's
    /// declared prerequisites. Each full scan removes and runs the first
    /// runnable pass found; if a scan finds none, the remaining passes form
    /// an unsatisfiable dependency set and scheduling fails.
    pub fn run(&mut self, ir: &mut Ir, diagnostics: &mut Diagnostics) -> Result<(), PassDriverError> {
        while !self.passes.is_empty() {
            let runnable = self.passes.iter().position(|p| {
                p.required_passes()
                    .iter()
                    .all(|req| ir.ran_passes.contains(req))
            });
            let Some(idx) = runnable else {
                let remaining = self.passes.iter().map(|p| p.name()).collect();
                return Err(PassDriverError::Schedule(ScheduleError::Deadlock { remaining }));
            };
            let mut pass = self.passes.remove(idx);
            pass.run(ir, diagnostics)?;
            ir.ran_passes.insert(pass.name());
        }
        Ok(())
    }
}
