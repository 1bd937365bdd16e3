//! omap routine construction
//!
//! Mapper bodies are described as [`Program`]s over a small stack-machine
//! vocabulary and handed to a [`RoutineBackend`], which verifies them and
//! produces a callable [`Routine`].
//!
//! # Overview
//!
//! - **Instr / Program / ProgramBuilder**: the instruction vocabulary
//! - **verify**: stack balance, local declaration, sibling bounds, `Return`
//! - **RoutineBackend / SiblingInvoker**: the compilation seam
//! - **ClosureBackend**: lowers each instruction to a closure once
//!
//! # Example
//!
//! ```rust
//! use omap_emit::{Arg, ClosureBackend, NoSiblings, ProgramBuilder, RoutineBackend};
//! use omap_types::{Ty, TypeCatalog, TypeIntrospector, Value};
//! use std::sync::Arc;
//!
//! let mut builder = ProgramBuilder::new(Ty::I32, Ty::I64);
//! builder.load_arg(Arg::Source).cast(Ty::I32, Ty::I64);
//! let program = builder.finish();
//!
//! let catalog: Arc<dyn TypeIntrospector> = Arc::new(TypeCatalog::new());
//! let routine = ClosureBackend::new().compile(&program, &catalog).unwrap();
//! assert_eq!(routine(&NoSiblings, Value::Int(7), None).unwrap(), Value::Int(7));
//! ```

#![warn(missing_docs)]

pub mod backend;
pub mod closure;
pub mod error;
pub mod instr;
pub mod verify;

// Re-exports
pub use backend::{NoSiblings, Routine, RoutineBackend, SiblingInvoker};
pub use closure::ClosureBackend;
pub use error::EmitError;
pub use instr::{Arg, Instr, MemberRef, Program, ProgramBuilder, RoutineSignature};
pub use verify::{verify, Verified};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
