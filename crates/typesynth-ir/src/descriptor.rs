//! Finished type descriptions
//!
//! A [`TypeDescriptor`] is what a [`crate::TypeBuilder`] session produces. It
//! has no mutating API: once built it can be shared through `Arc` and read
//! concurrently.

use std::fmt;

use crate::element::{CodeBlock, ElementKind};
use crate::member::MemberRef;
use crate::modifiers::Modifiers;
use crate::ty::TypeName;

/// A declared method or constructor together with its body
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    pub(crate) member: MemberRef,
    pub(crate) body: Option<CodeBlock>,
}

impl MethodDef {
    pub fn member(&self) -> &MemberRef {
        &self.member
    }

    /// Body of the method; `None` for abstract methods
    pub fn body(&self) -> Option<&CodeBlock> {
        self.body.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.member.name
    }

    pub fn modifiers(&self) -> Modifiers {
        self.member.modifiers
    }
}

/// Borrowed view of one element directly contained in a type
#[derive(Debug, Clone, Copy)]
pub enum Element<'a> {
    Field(&'a MemberRef),
    Method(&'a MethodDef),
    Constructor(&'a MethodDef),
}

impl Element<'_> {
    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Field(_) => ElementKind::Field,
            Element::Method(_) | Element::Constructor(_) => ElementKind::Method,
        }
    }

    pub fn member(&self) -> &MemberRef {
        match self {
            Element::Field(member) => member,
            Element::Method(def) | Element::Constructor(def) => def.member(),
        }
    }
}

/// Complete, immutable description of a type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub(crate) name: TypeName,
    pub(crate) modifiers: Modifiers,
    pub(crate) supertype: Option<TypeName>,
    pub(crate) fields: Vec<MemberRef>,
    pub(crate) methods: Vec<MethodDef>,
    pub(crate) constructors: Vec<MethodDef>,
}

impl TypeDescriptor {
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Direct supertype; `None` only for a hierarchy root
    pub fn supertype(&self) -> Option<&TypeName> {
        self.supertype.as_ref()
    }

    pub fn fields(&self) -> &[MemberRef] {
        &self.fields
    }

    pub fn methods(&self) -> &[MethodDef] {
        &self.methods
    }

    pub fn constructors(&self) -> &[MethodDef] {
        &self.constructors
    }

    /// Fields, then methods, then constructors, each in declaration order
    pub fn elements(&self) -> impl Iterator<Item = Element<'_>> + '_ {
        self.fields
            .iter()
            .map(Element::Field)
            .chain(self.methods.iter().map(Element::Method))
            .chain(self.constructors.iter().map(Element::Constructor))
    }

    /// Declared method with the given name and parameter types
    pub fn find_method(&self, name: &str, params: &[crate::ValueType]) -> Option<&MethodDef> {
        self.methods
            .iter()
            .find(|m| m.member.name == name && m.member.params == params)
    }

    pub fn find_constructor(&self, params: &[crate::ValueType]) -> Option<&MethodDef> {
        self.constructors.iter().find(|c| c.member.params == params)
    }

    pub fn find_field(&self, name: &str) -> Option<&MemberRef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut printer = crate::display::IrPrinter::new();
        crate::visitor::Visitor::visit_class(&mut printer, self);
        f.write_str(&printer.finish())
    }
}
