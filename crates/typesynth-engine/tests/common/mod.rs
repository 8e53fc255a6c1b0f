//! Hierarchy fixtures shared by the engine integration tests

#![allow(dead_code)]

use std::sync::Arc;

use typesynth_engine::sim::InMemoryHost;
use typesynth_ir::{
    MemberDescriptor, MemberRef, Modifiers, Parameter, TypeBuilder, TypeDescriptor, TypeName,
    UnaryOp, ValueType,
};

pub fn object() -> TypeName {
    InMemoryHost::root()
}

/// Handle of a constructor declared on `owner`
pub fn constructor_of(owner: &TypeName, modifiers: Modifiers, params: &[ValueType]) -> MemberRef {
    Arc::new(MemberDescriptor::constructor(
        owner.clone(),
        modifiers,
        params.to_vec(),
    ))
}

/// Declare a constructor taking `params` that chains to the supertype's no-arg constructor
pub fn chaining_constructor(b: &mut TypeBuilder, modifiers: Modifiers, params: &[ValueType]) {
    let supertype = b.supertype().cloned().unwrap_or_else(object);
    let sup = constructor_of(&supertype, Modifiers::PUBLIC, &[]);
    let body = b
        .declare_constructor(modifiers, &Parameter::positional(params))
        .unwrap();
    let this = body.this_local().unwrap();
    body.invoke_super(this, &sup, None, &[]);
    body.return_void();
}

/// Declare `name()` incrementing the int field `counter`
pub fn counting_method(b: &mut TypeBuilder, modifiers: Modifiers, name: &str, counter: &MemberRef) {
    let body = b.declare_method(modifiers, name, None, &[]).unwrap();
    let this = body.this_local().unwrap();
    let value = body.local(ValueType::Int);
    body.get_field(Some(this), counter, value);
    body.unary(UnaryOp::Increment, value, value);
    body.put_field(Some(this), counter, value);
    body.return_void();
}

/// `public class <name> extends <supertype> { int hits; <mods> void <method>() { hits++; } }`
pub fn counting_type(name: &str, supertype: &TypeName, modifiers: Modifiers, method: &str) -> TypeDescriptor {
    let mut b = TypeBuilder::new(Modifiers::PUBLIC, TypeName::new(name), Some(supertype.clone()));
    let hits = b.declare_field(Modifiers::empty(), "hits", ValueType::Int).unwrap();
    counting_method(&mut b, modifiers, method, &hits);
    chaining_constructor(&mut b, Modifiers::PUBLIC, &[]);
    b.finish()
}

/// Handle of the no-arg method `name` declared on `ty`
pub fn method_of(host: &InMemoryHost, ty: &str, name: &str) -> MemberRef {
    host.descriptor(&TypeName::new(ty))
        .unwrap()
        .find_method(name, &[])
        .unwrap()
        .member()
        .clone()
}

/// `pac1.A { void a() }`, `pac2.B extends A { void b() }`, `pac3.C extends B { void c() }`
pub fn three_scope_chain(host: &InMemoryHost) -> TypeName {
    host.define(counting_type("pac1.A", &object(), Modifiers::empty(), "a"))
        .unwrap();
    host.define(counting_type("pac2.B", &TypeName::new("pac1.A"), Modifiers::empty(), "b"))
        .unwrap();
    host.define(counting_type("pac3.C", &TypeName::new("pac2.B"), Modifiers::empty(), "c"))
        .unwrap()
}
