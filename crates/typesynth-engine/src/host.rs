//! Host ports
//!
//! The engine never touches a concrete type system. It reads hierarchies
//! through an [`Introspector`] and commits new types through a [`Loader`].
//! Both are implemented by whatever runtime hosts the synthesized types; the
//! [`crate::sim`] module provides an in-memory implementation.

use std::sync::Arc;

use typesynth_ir::{MemberRef, Modifiers, ScopeId, TypeDescriptor, TypeName};

use crate::error::SynthesisError;

/// Reflected view of one host type: only what it declares itself
#[derive(Debug, Clone)]
pub struct ReflectedType {
    pub name: TypeName,
    pub modifiers: Modifiers,
    /// Enclosing scope identity as the host sees it
    pub scope: ScopeId,
    pub supertype: Option<TypeName>,
    pub fields: Vec<MemberRef>,
    pub methods: Vec<MemberRef>,
    pub constructors: Vec<MemberRef>,
}

impl ReflectedType {
    /// Build the reflected view of a descriptor placed in `scope`
    pub fn from_descriptor(descriptor: &TypeDescriptor, scope: ScopeId) -> Self {
        Self {
            name: descriptor.name().clone(),
            modifiers: descriptor.modifiers(),
            scope,
            supertype: descriptor.supertype().cloned(),
            fields: descriptor.fields().to_vec(),
            methods: descriptor.methods().iter().map(|m| m.member().clone()).collect(),
            constructors: descriptor
                .constructors()
                .iter()
                .map(|c| c.member().clone())
                .collect(),
        }
    }
}

/// Read access to the host's type hierarchy
pub trait Introspector {
    /// Declared members, scope and supertype of `name`; `None` if unknown
    fn reflect(&self, name: &TypeName) -> Option<ReflectedType>;
}

/// Commits finished type descriptions into the host
pub trait Loader {
    /// Define `descriptor` under the scope boundary of `scope_anchor`
    ///
    /// The returned type must be constructible and its scope identity must be
    /// that of `scope_anchor`. Refusals are reported, never swallowed.
    fn materialize(
        &self,
        descriptor: TypeDescriptor,
        scope_anchor: &TypeName,
    ) -> Result<TypeName, SynthesisError>;
}

impl<T: Introspector + ?Sized> Introspector for &T {
    fn reflect(&self, name: &TypeName) -> Option<ReflectedType> {
        (**self).reflect(name)
    }
}

impl<T: Introspector + ?Sized> Introspector for Arc<T> {
    fn reflect(&self, name: &TypeName) -> Option<ReflectedType> {
        (**self).reflect(name)
    }
}

impl<T: Loader + ?Sized> Loader for &T {
    fn materialize(
        &self,
        descriptor: TypeDescriptor,
        scope_anchor: &TypeName,
    ) -> Result<TypeName, SynthesisError> {
        (**self).materialize(descriptor, scope_anchor)
    }
}

impl<T: Loader + ?Sized> Loader for Arc<T> {
    fn materialize(
        &self,
        descriptor: TypeDescriptor,
        scope_anchor: &TypeName,
    ) -> Result<TypeName, SynthesisError> {
        (**self).materialize(descriptor, scope_anchor)
    }
}
