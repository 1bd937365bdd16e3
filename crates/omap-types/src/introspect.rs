//! Type introspection collaborator
//!
//! Builders never look at values to learn about types. Everything they need
//! (members, access, constructibility, conversions, statics) comes through
//! [`TypeIntrospector`], so any descriptor source can back a mapper.

use crate::convert;
use crate::descriptor::{EnumDescriptor, MemberInfo, ObjectDescriptor};
use crate::ty::{Ty, TypeName};
use crate::value::Value;
use std::fmt::Debug;

/// Source of type descriptors
///
/// Only [`object`](Self::object), [`enumeration`](Self::enumeration) and
/// [`static_value`](Self::static_value) are required; the rest derive from
/// them.
pub trait TypeIntrospector: Debug + Send + Sync {
    /// Object descriptor by name
    fn object(&self, name: &TypeName) -> Option<&ObjectDescriptor>;

    /// Enum descriptor by name
    fn enumeration(&self, name: &TypeName) -> Option<&EnumDescriptor>;

    /// Current value of a static member
    fn static_value(&self, owner: &TypeName, member: &str) -> Option<Value>;

    /// Readable members of `ty`, instance and static, in declaration order
    fn readable_members(&self, ty: &Ty) -> Vec<MemberInfo> {
        members_where(self, ty, |m| m.is_readable())
    }

    /// Writable instance members of `ty`, in declaration order
    fn writable_members(&self, ty: &Ty) -> Vec<MemberInfo> {
        members_where(self, ty, |m| m.is_writable())
    }

    /// Declared type of a member
    fn member_type(&self, owner: &Ty, name: &str) -> Option<Ty> {
        let Ty::Object(owner) = owner else {
            return None;
        };
        self.object(owner)
            .and_then(|object| object.find(name))
            .map(|member| member.ty.clone())
    }

    /// Has a public parameterless constructor, or is a value kind
    fn is_constructible(&self, ty: &Ty) -> bool {
        match ty {
            Ty::Object(name) => self.object(name).is_some_and(ObjectDescriptor::constructible),
            _ => false,
        }
    }

    /// A built-in conversion exists from `from` to `to`
    fn has_conversion(&self, from: &Ty, to: &Ty) -> bool {
        convert::can_convert(from, to)
    }
}

fn members_where<I, F>(introspector: &I, ty: &Ty, keep: F) -> Vec<MemberInfo>
where
    I: TypeIntrospector + ?Sized,
    F: Fn(&crate::descriptor::MemberDescriptor) -> bool,
{
    let Ty::Object(name) = ty else {
        return Vec::new();
    };
    introspector
        .object(name)
        .map(|object| {
            object
                .members
                .iter()
                .filter(|m| keep(m))
                .map(|m| MemberInfo::from_descriptor(name, m))
                .collect()
        })
        .unwrap_or_default()
}
