//! Program verification
//!
//! Programs are straight-line, so one abstract pass over the stack depth and
//! the declared-locals count is a complete check.

use crate::error::EmitError;
use crate::instr::{Instr, Program};

/// Facts established by a successful verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verified {
    /// Deepest operand stack reached
    pub max_stack: usize,
    /// Locals declared
    pub locals: usize,
}

/// Verify stack balance, local declaration, sibling bounds and termination
///
/// # Errors
/// The first violation found, as an [`EmitError`].
pub fn verify(program: &Program) -> Result<Verified, EmitError> {
    if program.instrs.is_empty() {
        return Err(EmitError::Empty);
    }
    let mut depth = 0_usize;
    let mut max_stack = 0_usize;
    let mut locals = 0_usize;

    for (at, instr) in program.instrs.iter().enumerate() {
        let (pops, pushes) = match instr {
            Instr::LoadArg(_) | Instr::NewDefault(_) => (0, 1),
            Instr::LoadMember(member) => {
                if member.is_static {
                    (0, 1)
                } else {
                    (1, 1)
                }
            }
            Instr::StoreMember(member) => {
                if member.is_static {
                    return Err(EmitError::StaticStore {
                        at,
                        member: member.to_string(),
                    });
                }
                (2, 1)
            }
            Instr::CallRoutine {
                sibling,
                with_target,
            } => {
                if *sibling >= program.siblings {
                    return Err(EmitError::SiblingOutOfRange {
                        at,
                        sibling: *sibling,
                        siblings: program.siblings,
                    });
                }
                (if *with_target { 2 } else { 1 }, 1)
            }
            Instr::Cast { .. } | Instr::DefaultIfNull(_) => (1, 1),
            Instr::DeclareLocal { .. } => {
                locals += 1;
                (0, 0)
            }
            Instr::LoadLocal(local) | Instr::StoreLocal(local) => {
                if *local >= locals {
                    return Err(EmitError::UndeclaredLocal {
                        at,
                        local: *local,
                        declared: locals,
                    });
                }
                if matches!(instr, Instr::LoadLocal(_)) {
                    (0, 1)
                } else {
                    (1, 0)
                }
            }
            Instr::Pop => (1, 0),
            Instr::Return => {
                if depth != 1 {
                    return Err(EmitError::UnbalancedReturn { at, depth });
                }
                if at + 1 != program.instrs.len() {
                    return Err(EmitError::CodeAfterReturn { at });
                }
                (1, 0)
            }
        };
        if depth < pops {
            return Err(EmitError::StackUnderflow {
                at,
                instr: instr.to_string(),
            });
        }
        depth = depth - pops + pushes;
        max_stack = max_stack.max(depth);
    }

    match program.instrs.last() {
        Some(Instr::Return) => Ok(Verified { max_stack, locals }),
        _ => Err(EmitError::MissingReturn),
    }
}
