//! Instruction vocabulary and programs
//!
//! A [`Program`] is straight-line stack code over [`Value`]s. Arguments are
//! the source instance and the optional existing target; locals are declared
//! zero-initialized and addressed by index; siblings are other routines of
//! the same mapper graph addressed by their local index.

use omap_types::{Ty, TypeName, Value};
use std::fmt::{self, Display, Formatter};

/// Routine argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arg {
    /// Instance being mapped
    Source,
    /// Existing target instance (may be null); consumed on load
    Target,
}

/// Member reference resolved at build time
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberRef {
    /// Declaring type
    pub owner: TypeName,
    /// Member name
    pub name: String,
    /// Declared value type
    pub ty: Ty,
    /// Static member (read through the introspector, no instance operand)
    pub is_static: bool,
}

impl MemberRef {
    /// Instance member
    #[must_use]
    pub fn instance(owner: impl Into<TypeName>, name: impl Into<String>, ty: Ty) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            ty,
            is_static: false,
        }
    }

    /// Static member
    #[must_use]
    pub fn static_member(owner: impl Into<TypeName>, name: impl Into<String>, ty: Ty) -> Self {
        Self {
            is_static: true,
            ..Self::instance(owner, name, ty)
        }
    }
}

impl Display for MemberRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let sep = if self.is_static { "::" } else { "." };
        write!(f, "{}{sep}{}", self.owner, self.name)
    }
}

/// One instruction
///
/// Stack effects are written `before -> after`, top of stack rightmost.
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    /// `-> arg`
    LoadArg(Arg),
    /// Instance: `obj -> obj.member` (null object reads null).
    /// Static: `-> Owner::member`
    LoadMember(MemberRef),
    /// `obj value -> obj'` with the member set; null object is a runtime error
    StoreMember(MemberRef),
    /// `source -> result`, or `source target -> result` with `with_target`
    CallRoutine {
        /// Sibling index
        sibling: usize,
        /// Pass the value below the top as the existing target
        with_target: bool,
    },
    /// `value -> value'` through the built-in scalar conversions
    Cast {
        /// Declared input type
        from: Ty,
        /// Output type
        to: Ty,
    },
    /// `-> template`
    NewDefault(Value),
    /// `value -> value`, or `null -> template`
    DefaultIfNull(Value),
    /// Declare the next local, starting at `zero`
    DeclareLocal {
        /// Declared type
        ty: Ty,
        /// Initial value
        zero: Value,
    },
    /// `-> local`
    LoadLocal(usize),
    /// `value ->` into the local
    StoreLocal(usize),
    /// `value ->`
    Pop,
    /// `value ->` and end the routine with it
    Return,
}

impl Display for Instr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadArg(Arg::Source) => f.write_str("ldarg source"),
            Self::LoadArg(Arg::Target) => f.write_str("ldarg target"),
            Self::LoadMember(member) => write!(f, "ldmember {member}"),
            Self::StoreMember(member) => write!(f, "stmember {member}"),
            Self::CallRoutine {
                sibling,
                with_target,
            } => {
                if *with_target {
                    write!(f, "call #{sibling} (with target)")
                } else {
                    write!(f, "call #{sibling}")
                }
            }
            Self::Cast { from, to } => write!(f, "cast {from} -> {to}"),
            Self::NewDefault(value) => write!(f, "newdefault {}", value.kind()),
            Self::DefaultIfNull(value) => write!(f, "defaultifnull {}", value.kind()),
            Self::DeclareLocal { ty, .. } => write!(f, "local {ty}"),
            Self::LoadLocal(index) => write!(f, "ldloc {index}"),
            Self::StoreLocal(index) => write!(f, "stloc {index}"),
            Self::Pop => f.write_str("pop"),
            Self::Return => f.write_str("ret"),
        }
    }
}

/// Routine signature: what the routine reads and what it produces
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutineSignature {
    /// Source argument type
    pub source: Ty,
    /// Result and target argument type
    pub target: Ty,
}

/// Complete routine body
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Signature
    pub signature: RoutineSignature,
    /// Number of siblings `CallRoutine` may address
    pub siblings: usize,
    /// Instructions
    pub instrs: Vec<Instr>,
}

impl Program {
    /// Number of instructions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    /// Whether the program has no instructions
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "routine {} -> {} ({} siblings)",
            self.signature.source, self.signature.target, self.siblings
        )?;
        for (pc, instr) in self.instrs.iter().enumerate() {
            writeln!(f, "  {pc:>4}: {instr}")?;
        }
        Ok(())
    }
}

/// Incremental [`Program`] builder
#[derive(Debug)]
pub struct ProgramBuilder {
    signature: RoutineSignature,
    siblings: usize,
    instrs: Vec<Instr>,
    locals: usize,
}

impl ProgramBuilder {
    /// Start a program for `source -> target`
    #[must_use]
    pub fn new(source: Ty, target: Ty) -> Self {
        Self {
            signature: RoutineSignature { source, target },
            siblings: 0,
            instrs: Vec::new(),
            locals: 0,
        }
    }

    /// Register a sibling slot, returning its index
    pub fn sibling(&mut self) -> usize {
        self.siblings += 1;
        self.siblings - 1
    }

    /// Set the sibling count directly
    pub fn set_siblings(&mut self, count: usize) {
        self.siblings = count;
    }

    /// Append an instruction
    pub fn push(&mut self, instr: Instr) -> &mut Self {
        self.instrs.push(instr);
        self
    }

    /// Declare a local, returning its index
    pub fn declare_local(&mut self, ty: Ty, zero: Value) -> usize {
        self.instrs.push(Instr::DeclareLocal { ty, zero });
        self.locals += 1;
        self.locals - 1
    }

    /// `LoadArg`
    pub fn load_arg(&mut self, arg: Arg) -> &mut Self {
        self.push(Instr::LoadArg(arg))
    }

    /// `LoadMember`
    pub fn load_member(&mut self, member: MemberRef) -> &mut Self {
        self.push(Instr::LoadMember(member))
    }

    /// `StoreMember`
    pub fn store_member(&mut self, member: MemberRef) -> &mut Self {
        self.push(Instr::StoreMember(member))
    }

    /// `CallRoutine`
    pub fn call(&mut self, sibling: usize, with_target: bool) -> &mut Self {
        self.push(Instr::CallRoutine {
            sibling,
            with_target,
        })
    }

    /// `Cast`
    pub fn cast(&mut self, from: Ty, to: Ty) -> &mut Self {
        self.push(Instr::Cast { from, to })
    }

    /// `DefaultIfNull`
    pub fn default_if_null(&mut self, template: Value) -> &mut Self {
        self.push(Instr::DefaultIfNull(template))
    }

    /// `LoadLocal`
    pub fn load_local(&mut self, index: usize) -> &mut Self {
        self.push(Instr::LoadLocal(index))
    }

    /// `StoreLocal`
    pub fn store_local(&mut self, index: usize) -> &mut Self {
        self.push(Instr::StoreLocal(index))
    }

    /// Finish with `Return`
    #[must_use]
    pub fn finish(mut self) -> Program {
        self.instrs.push(Instr::Return);
        Program {
            signature: self.signature,
            siblings: self.siblings,
            instrs: self.instrs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_tracks_locals_and_siblings() {
        let mut builder = ProgramBuilder::new(Ty::object("A"), Ty::object("B"));
        assert_eq!(builder.declare_local(Ty::object("B"), Value::Null), 0);
        assert_eq!(builder.declare_local(Ty::I32, Value::Int(0)), 1);
        assert_eq!(builder.sibling(), 0);
        assert_eq!(builder.sibling(), 1);
        builder.load_local(0);
        let program = builder.finish();
        assert_eq!(program.siblings, 2);
        assert_eq!(program.instrs.last(), Some(&Instr::Return));
    }

    #[test]
    fn display_listing() {
        let mut builder = ProgramBuilder::new(Ty::object("A"), Ty::I32);
        builder
            .load_arg(Arg::Source)
            .load_member(MemberRef::instance("A", "X", Ty::I32))
            .load_member(MemberRef::static_member("A", "Y", Ty::I32))
            .push(Instr::Pop);
        let listing = builder.finish().to_string();
        assert!(listing.contains("ldmember A.X"));
        assert!(listing.contains("ldmember A::Y"));
        assert!(listing.trim_end().ends_with("ret"));
    }
}
