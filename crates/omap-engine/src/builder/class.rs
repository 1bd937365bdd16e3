//! Object-graph mappers
//!
//! A class mapper is emitted as a [`Program`](omap_emit::Program) and
//! compiled once by the configured backend. The plan for every member path (copy, cast, call a
//! converter, or delegate to a sibling) is fixed here; the compiled routine
//! never looks at member names or binding configuration again.
//!
//! Emitted shape, per member path:
//!
//! ```text
//! value   <- source.a.b...            (static head reads Owner::a)
//! value   <- cast [?? zero] | call #k (unless copied)
//! inner_0 <- target.t0 ?? new T0      (one local per intermediate level)
//! inner_i <- inner_{i-1}.ti ?? new Ti
//! inner_last.tn = value, then written back level by level into target
//! ```

use super::convertible::is_cast;
use super::{BuildContext, MapperBuilder};
use crate::binding::BindingConfig;
use crate::cache::MapperId;
use crate::error::BindError;
use crate::mapper::{routine, MapperKind, MapperNode};
use crate::member::{MappingMemberBuilder, MappingMemberPath};
use omap_emit::{Arg, Instr, MemberRef, ProgramBuilder};
use omap_types::defaults::{default_instance, zero_value};
use omap_types::{MemberInfo, Ty, TypeIntrospector, TypePair, Value};
use std::sync::Arc;

/// Builder for object-to-object pairs
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassMapperBuilder;

impl ClassMapperBuilder {
    /// Create builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl MapperBuilder for ClassMapperBuilder {
    fn name(&self) -> &'static str {
        "class"
    }

    fn supports(&self, pair: &TypePair, _: &BuildContext<'_>) -> bool {
        pair.source.is_object() && pair.target.is_object()
    }

    fn build(&self, pair: &TypePair, ctx: &mut BuildContext<'_>) -> Result<MapperNode, BindError> {
        let introspector = ctx.introspector();
        let template = template(&pair.target, introspector.as_ref()).ok_or_else(|| {
            BindError::NoDefaultConstructor {
                target_type: pair.target.clone(),
            }
        })?;
        let binding = ctx.binding(pair);
        let paths =
            MappingMemberBuilder::new(introspector.as_ref(), ctx.config(), binding.as_deref())
                .build(pair)?;

        let mut emitter = Emitter {
            builder: ProgramBuilder::new(pair.source.clone(), pair.target.clone()),
            siblings: Vec::new(),
            introspector: introspector.as_ref(),
            binding: binding.as_deref(),
            target: 0,
        };
        emitter.target = emitter.builder.declare_local(pair.target.clone(), Value::Null);
        emitter
            .builder
            .load_arg(Arg::Target)
            .default_if_null(template)
            .store_local(emitter.target);
        for path in &paths {
            emitter.path(path, ctx)?;
        }
        emitter.builder.load_local(emitter.target);
        emitter.builder.set_siblings(emitter.siblings.len());
        let Emitter {
            builder, siblings, ..
        } = emitter;
        let program = builder.finish();

        tracing::debug!(
            "class mapper {}: {} member paths, {} siblings, {} instructions",
            pair,
            paths.len(),
            siblings.len(),
            program.len()
        );
        let compiled = ctx.compile(&program)?;
        let routine = routine(move |invoker, source, target| {
            if source.is_null() {
                return Ok(Value::Null);
            }
            compiled(invoker, source, target)
        });
        Ok(MapperNode::new(pair.clone(), MapperKind::Class, routine)
            .with_siblings(siblings)
            .with_program(program))
    }
}

/// Fresh instance used when no target (or a null intermediate) is supplied
fn template(ty: &Ty, introspector: &dyn TypeIntrospector) -> Option<Value> {
    match ty {
        Ty::Object(name) if introspector.is_constructible(ty) => {
            default_instance(name, introspector)
        }
        _ => None,
    }
}

fn member_ref(member: &MemberInfo) -> MemberRef {
    if member.is_static {
        MemberRef::static_member(member.owner.clone(), member.name.clone(), member.ty.clone())
    } else {
        MemberRef::instance(member.owner.clone(), member.name.clone(), member.ty.clone())
    }
}

struct Emitter<'e> {
    builder: ProgramBuilder,
    siblings: Vec<MapperId>,
    introspector: &'e dyn TypeIntrospector,
    binding: Option<&'e BindingConfig>,
    target: usize,
}

impl Emitter<'_> {
    fn sibling(&mut self, id: MapperId) -> usize {
        if let Some(index) = self.siblings.iter().position(|s| *s == id) {
            return index;
        }
        self.siblings.push(id);
        self.siblings.len() - 1
    }

    fn path(
        &mut self,
        path: &MappingMemberPath,
        ctx: &mut BuildContext<'_>,
    ) -> Result<(), BindError> {
        self.load_source(path.source());
        self.convert(path, ctx)?;
        let value = self.builder.declare_local(path.pair().target.clone(), Value::Null);
        self.builder.store_local(value);
        self.store_target(path.target(), value);
        Ok(())
    }

    fn load_source(&mut self, chain: &[MemberInfo]) {
        for (level, member) in chain.iter().enumerate() {
            if member.is_static {
                if level > 0 {
                    self.builder.push(Instr::Pop);
                }
            } else if level == 0 {
                self.builder.load_arg(Arg::Source);
            }
            self.builder.load_member(member_ref(member));
        }
    }

    /// Leaves the converted value on the stack
    fn convert(
        &mut self,
        path: &MappingMemberPath,
        ctx: &mut BuildContext<'_>,
    ) -> Result<(), BindError> {
        let pair = path.pair();
        if let Some(converter) = self.binding.and_then(|b| b.converter_for(&path.target_key())) {
            let id = ctx.custom(pair, Arc::clone(converter))?;
            let index = self.sibling(id);
            self.builder.call(index, false);
            return Ok(());
        }
        if pair.is_deep_cloneable() {
            return Ok(());
        }
        if is_cast(pair) {
            self.builder.cast(pair.source.clone(), pair.target.clone());
            if !pair.target.is_nullable() {
                self.builder
                    .default_if_null(zero_value(&pair.target, self.introspector));
            }
            return Ok(());
        }
        let id = ctx.mapper_for(pair)?;
        let index = self.sibling(id);
        if pair.target.is_object() {
            self.builder.load_local(self.target);
            for member in path.target() {
                self.builder.load_member(member_ref(member));
            }
            self.builder.call(index, true);
        } else {
            self.builder.call(index, false);
        }
        Ok(())
    }

    fn store_target(&mut self, chain: &[MemberInfo], value: usize) {
        let Some((last, intermediates)) = chain.split_last() else {
            return;
        };
        let mut owners = vec![self.target];
        for member in intermediates {
            let parent = owners[owners.len() - 1];
            let local = self.builder.declare_local(member.ty.clone(), Value::Null);
            self.builder.load_local(parent).load_member(member_ref(member));
            if let Some(template) = template(&member.ty, self.introspector) {
                self.builder.default_if_null(template);
            }
            self.builder.store_local(local);
            owners.push(local);
        }

        let mut child = value;
        let mut member = last;
        for (level, owner) in owners.iter().enumerate().rev() {
            self.builder
                .load_local(*owner)
                .load_local(child)
                .store_member(member_ref(member))
                .store_local(*owner);
            child = *owner;
            if level > 0 {
                member = &intermediates[level - 1];
            }
        }
    }
}
