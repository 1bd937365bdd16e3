//! Routine backend seam
//!
//! A backend turns a verified [`Program`] into a callable [`Routine`]. The
//! engine only ever talks to [`RoutineBackend`], so compilation strategies
//! can be swapped without touching the builders.

use crate::error::EmitError;
use crate::instr::Program;
use omap_types::{MapError, TypeIntrospector, Value};
use std::fmt::Debug;
use std::sync::Arc;

/// Resolves `CallRoutine` targets at run time
pub trait SiblingInvoker {
    /// Run sibling `sibling` on `source`, optionally reusing `target`
    ///
    /// # Errors
    /// Whatever the sibling routine fails with.
    fn invoke(&self, sibling: usize, source: Value, target: Option<Value>)
        -> Result<Value, MapError>;
}

/// Invoker for routines that call no siblings
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSiblings;

impl SiblingInvoker for NoSiblings {
    fn invoke(&self, sibling: usize, _: Value, _: Option<Value>) -> Result<Value, MapError> {
        Err(MapError::UnresolvedMapper(sibling))
    }
}

/// Compiled routine: `(siblings, source, target) -> result`
pub type Routine =
    Arc<dyn Fn(&dyn SiblingInvoker, Value, Option<Value>) -> Result<Value, MapError> + Send + Sync>;

/// Routine-construction collaborator
pub trait RoutineBackend: Debug + Send + Sync {
    /// Backend name for diagnostics
    fn name(&self) -> &'static str;

    /// Verify and compile `program`
    ///
    /// Static member reads go through `introspector` at run time.
    ///
    /// # Errors
    /// [`EmitError`] when the program fails verification.
    fn compile(
        &self,
        program: &Program,
        introspector: &Arc<dyn TypeIntrospector>,
    ) -> Result<Routine, EmitError>;
}
