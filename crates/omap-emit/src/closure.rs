//! Closure-compiling backend
//!
//! Each instruction is lowered once into a boxed closure over a [`Frame`];
//! calling the routine runs the closure list in order. Two peepholes apply
//! during lowering:
//!
//! - `LoadArg(Source)` + instance `LoadMember` reads the field straight out of
//!   the borrowed source, cloning only that field
//! - `LoadLocal` + instance `LoadMember` does the same for a local
//!
//! A bare `LoadLocal` moves the value out when the next access to that local
//! is a `StoreLocal` (or there is none), so target write-back chains never
//! clone the whole target.

use crate::backend::{Routine, RoutineBackend, SiblingInvoker};
use crate::error::EmitError;
use crate::instr::{Arg, Instr, MemberRef, Program};
use crate::verify::verify;
use omap_types::{convert, MapError, TypeIntrospector, Value};
use smallvec::SmallVec;
use std::sync::Arc;

type Op = Box<dyn Fn(&mut Frame, &dyn SiblingInvoker) -> Result<(), MapError> + Send + Sync>;

fn op<F>(f: F) -> Op
where
    F: Fn(&mut Frame, &dyn SiblingInvoker) -> Result<(), MapError> + Send + Sync + 'static,
{
    Box::new(f)
}

/// Per-call state
struct Frame {
    source: Value,
    target: Option<Value>,
    stack: SmallVec<[Value; 8]>,
    locals: SmallVec<[Value; 4]>,
    result: Value,
}

impl Frame {
    #[inline]
    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    // Depth is checked by verification; an empty pop reads null.
    #[inline]
    fn pop(&mut self) -> Value {
        self.stack.pop().unwrap_or_default()
    }

    #[inline]
    fn local_mut(&mut self, index: usize) -> Result<&mut Value, MapError> {
        self.locals
            .get_mut(index)
            .ok_or_else(|| MapError::ShapeMismatch {
                expected: format!("local {index}"),
                found: "nothing",
            })
    }
}

/// Default [`RoutineBackend`]: lowers instructions to closures
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosureBackend;

impl ClosureBackend {
    /// Create backend
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl RoutineBackend for ClosureBackend {
    fn name(&self) -> &'static str {
        "closure"
    }

    fn compile(
        &self,
        program: &Program,
        introspector: &Arc<dyn TypeIntrospector>,
    ) -> Result<Routine, EmitError> {
        let verified = verify(program)?;
        let ops: Arc<[Op]> = lower(program, introspector).into();
        tracing::debug!(
            "compiled {} -> {}: {} instructions into {} ops, max stack {}",
            program.signature.source,
            program.signature.target,
            program.len(),
            ops.len(),
            verified.max_stack
        );
        let locals = verified.locals;
        Ok(Arc::new(
            move |siblings: &dyn SiblingInvoker, source: Value, target: Option<Value>| {
                let mut frame = Frame {
                    source,
                    target,
                    stack: SmallVec::new(),
                    locals: SmallVec::with_capacity(locals),
                    result: Value::Null,
                };
                for op in ops.iter() {
                    op(&mut frame, siblings)?;
                }
                Ok(std::mem::take(&mut frame.result))
            },
        ))
    }
}

fn lower(program: &Program, introspector: &Arc<dyn TypeIntrospector>) -> Vec<Op> {
    let instrs = &program.instrs;
    let mut ops = Vec::with_capacity(instrs.len());
    let mut pc = 0;
    while pc < instrs.len() {
        match (&instrs[pc], instrs.get(pc + 1)) {
            (Instr::LoadArg(Arg::Source), Some(Instr::LoadMember(member))) if !member.is_static => {
                ops.push(read_source_member(member.clone()));
                pc += 2;
            }
            (Instr::LoadLocal(local), Some(Instr::LoadMember(member))) if !member.is_static => {
                ops.push(read_local_member(*local, member.clone()));
                pc += 2;
            }
            (instr, _) => {
                ops.push(lower_one(instr, instrs, pc, introspector));
                pc += 1;
            }
        }
    }
    ops
}

/// Whether the next access to `local` after `pc` overwrites it
fn moves_out(instrs: &[Instr], pc: usize, local: usize) -> bool {
    for instr in &instrs[pc + 1..] {
        match instr {
            Instr::LoadLocal(i) if *i == local => return false,
            Instr::StoreLocal(i) if *i == local => return true,
            _ => {}
        }
    }
    true
}

fn field_of(object: &Value, member: &MemberRef) -> Result<Value, MapError> {
    match object {
        Value::Object(object) => Ok(object.get(&member.name).cloned().unwrap_or_default()),
        Value::Null => Ok(Value::Null),
        other => Err(MapError::shape(member.owner.as_str(), other)),
    }
}

fn read_source_member(member: MemberRef) -> Op {
    op(move |frame, _| {
        let value = field_of(&frame.source, &member)?;
        frame.push(value);
        Ok(())
    })
}

fn read_local_member(local: usize, member: MemberRef) -> Op {
    op(move |frame, _| {
        let value = field_of(frame.local_mut(local)?, &member)?;
        frame.push(value);
        Ok(())
    })
}

fn lower_one(
    instr: &Instr,
    instrs: &[Instr],
    pc: usize,
    introspector: &Arc<dyn TypeIntrospector>,
) -> Op {
    match instr.clone() {
        Instr::LoadArg(Arg::Source) => op(|frame, _| {
            let source = frame.source.clone();
            frame.push(source);
            Ok(())
        }),
        Instr::LoadArg(Arg::Target) => op(|frame, _| {
            let target = frame.target.take().unwrap_or_default();
            frame.push(target);
            Ok(())
        }),
        Instr::LoadMember(member) if member.is_static => {
            let introspector = Arc::clone(introspector);
            op(move |frame, _| {
                let value = introspector
                    .static_value(&member.owner, &member.name)
                    .unwrap_or_default();
                frame.push(value);
                Ok(())
            })
        }
        Instr::LoadMember(member) => op(move |frame, _| {
            let value = match frame.pop() {
                Value::Object(mut object) => object.take(&member.name),
                Value::Null => Value::Null,
                other => return Err(MapError::shape(member.owner.as_str(), &other)),
            };
            frame.push(value);
            Ok(())
        }),
        Instr::StoreMember(member) => op(move |frame, _| {
            let value = frame.pop();
            match frame.pop() {
                Value::Object(mut object) => {
                    object.set(member.name.clone(), value);
                    frame.push(Value::Object(object));
                    Ok(())
                }
                Value::Null => Err(MapError::NullReference {
                    member: member.to_string(),
                }),
                other => Err(MapError::shape(member.owner.as_str(), &other)),
            }
        }),
        Instr::CallRoutine {
            sibling,
            with_target,
        } => op(move |frame, siblings| {
            let target = if with_target { Some(frame.pop()) } else { None };
            let source = frame.pop();
            let result = siblings.invoke(sibling, source, target)?;
            frame.push(result);
            Ok(())
        }),
        Instr::Cast { from, to } => op(move |frame, _| {
            let value = convert::convert_scalar(frame.pop(), &from, &to)?;
            frame.push(value);
            Ok(())
        }),
        Instr::NewDefault(template) => op(move |frame, _| {
            frame.push(template.clone());
            Ok(())
        }),
        Instr::DefaultIfNull(template) => op(move |frame, _| {
            if frame.stack.last().map_or(true, Value::is_null) {
                frame.pop();
                frame.push(template.clone());
            }
            Ok(())
        }),
        Instr::DeclareLocal { zero, .. } => op(move |frame, _| {
            frame.locals.push(zero.clone());
            Ok(())
        }),
        Instr::LoadLocal(local) => {
            if moves_out(instrs, pc, local) {
                op(move |frame, _| {
                    let value = std::mem::take(frame.local_mut(local)?);
                    frame.push(value);
                    Ok(())
                })
            } else {
                op(move |frame, _| {
                    let value = frame.local_mut(local)?.clone();
                    frame.push(value);
                    Ok(())
                })
            }
        }
        Instr::StoreLocal(local) => op(move |frame, _| {
            let value = frame.pop();
            *frame.local_mut(local)? = value;
            Ok(())
        }),
        Instr::Pop => op(|frame, _| {
            frame.pop();
            Ok(())
        }),
        Instr::Return => op(|frame, _| {
            frame.result = frame.pop();
            Ok(())
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NoSiblings;
    use crate::instr::ProgramBuilder;
    use omap_types::{Object, ObjectDescriptor, Ty, TypeCatalog};
    use pretty_assertions::assert_eq;

    fn catalog() -> Arc<dyn TypeIntrospector> {
        Arc::new(
            TypeCatalog::new()
                .with(
                    ObjectDescriptor::new("A")
                        .field("X", Ty::I32)
                        .static_field("S", Ty::String, "static"),
                )
                .with(
                    ObjectDescriptor::new("B")
                        .field("X", Ty::I64)
                        .field("S", Ty::String),
                ),
        )
    }

    fn x(owner: &str, ty: Ty) -> MemberRef {
        MemberRef::instance(owner, "X", ty)
    }

    /// target = target ?? new B; target.X = (i64) source.X; target.S = A::S
    fn copy_program() -> Program {
        let mut b = ProgramBuilder::new(Ty::object("A"), Ty::object("B"));
        let target = b.declare_local(Ty::object("B"), Value::Null);
        let tmp = b.declare_local(Ty::I64, Value::Int(0));
        b.load_arg(Arg::Target)
            .default_if_null(Value::Object(Object::new("B")))
            .store_local(target)
            .load_arg(Arg::Source)
            .load_member(x("A", Ty::I32))
            .cast(Ty::I32, Ty::I64)
            .store_local(tmp)
            .load_local(target)
            .load_local(tmp)
            .store_member(x("B", Ty::I64))
            .store_local(target)
            .load_local(target)
            .load_member(MemberRef::static_member("A", "S", Ty::String))
            .store_member(MemberRef::instance("B", "S", Ty::String))
            .store_local(target)
            .load_local(target);
        b.finish()
    }

    #[test]
    fn runs_copy_program() {
        let routine = ClosureBackend.compile(&copy_program(), &catalog()).unwrap();
        let source = Value::Object(Object::new("A").with("X", 5_i32));
        let result = routine(&NoSiblings, source, None).unwrap();
        assert_eq!(
            result,
            Value::Object(Object::new("B").with("X", 5_i64).with("S", "static"))
        );
    }

    #[test]
    fn reuses_existing_target() {
        let routine = ClosureBackend.compile(&copy_program(), &catalog()).unwrap();
        let existing = Value::Object(Object::new("B").with("Keep", true));
        let source = Value::Object(Object::new("A").with("X", 1_i32));
        let result = routine(&NoSiblings, source, Some(existing)).unwrap();
        assert_eq!(result.field("Keep"), Some(&Value::Bool(true)));
        assert_eq!(result.field("X"), Some(&Value::Int(1)));
    }

    #[test]
    fn null_source_member_reads_null() {
        let routine = ClosureBackend.compile(&copy_program(), &catalog()).unwrap();
        let result = routine(&NoSiblings, Value::Object(Object::new("A")), None).unwrap();
        assert_eq!(result.field("X"), Some(&Value::Null));
    }

    #[test]
    fn store_into_null_is_reported() {
        let mut b = ProgramBuilder::new(Ty::I32, Ty::object("B"));
        b.push(Instr::NewDefault(Value::Null))
            .load_arg(Arg::Source)
            .store_member(x("B", Ty::I64));
        let routine = ClosureBackend.compile(&b.finish(), &catalog()).unwrap();
        let err = routine(&NoSiblings, Value::Int(1), None).unwrap_err();
        assert!(matches!(err, MapError::NullReference { .. }));
    }

    struct Doubler;

    impl SiblingInvoker for Doubler {
        fn invoke(&self, _: usize, source: Value, _: Option<Value>) -> Result<Value, MapError> {
            match source {
                Value::Int(i) => Ok(Value::Int(i * 2)),
                other => Err(MapError::shape("int", &other)),
            }
        }
    }

    #[test]
    fn calls_siblings() {
        let mut b = ProgramBuilder::new(Ty::I32, Ty::I32);
        let sibling = b.sibling();
        b.load_arg(Arg::Source).call(sibling, false);
        let routine = ClosureBackend.compile(&b.finish(), &catalog()).unwrap();
        assert_eq!(routine(&Doubler, Value::Int(21), None).unwrap(), Value::Int(42));
        assert!(matches!(
            routine(&NoSiblings, Value::Int(1), None),
            Err(MapError::UnresolvedMapper(0))
        ));
    }

    #[test]
    fn rejects_unverified_programs() {
        let b = ProgramBuilder::new(Ty::I32, Ty::I32);
        assert!(matches!(
            ClosureBackend.compile(&b.finish(), &catalog()),
            Err(EmitError::UnbalancedReturn { .. })
        ));
    }

    #[test]
    fn moves_out_only_before_overwrite() {
        let instrs = [
            Instr::LoadLocal(0),
            Instr::LoadLocal(0),
            Instr::StoreLocal(0),
            Instr::LoadLocal(0),
        ];
        assert!(!moves_out(&instrs, 0, 0));
        assert!(moves_out(&instrs, 1, 0));
        assert!(moves_out(&instrs, 3, 0));
    }
}
