//! Element visitor for traversing type descriptions
//!
//! Every node kind has one `visit_*` method. Composite nodes (types, methods,
//! code blocks) default to the matching `walk_*` function, which visits their
//! children in order; leaf kinds default to doing nothing. A pass overrides
//! only the kinds it cares about.
//!
//! # Example
//!
//! ```rust
//! use typesynth_ir::{Invoke, Visitor};
//!
//! struct CountInvokes {
//!     count: usize,
//! }
//!
//! impl Visitor for CountInvokes {
//!     fn visit_invoke(&mut self, _invoke: &Invoke) {
//!         self.count += 1;
//!     }
//! }
//! ```

use crate::descriptor::{MethodDef, TypeDescriptor};
use crate::element::*;
use crate::member::MemberRef;

/// Element visitor trait
pub trait Visitor: Sized {
    // Composite nodes
    fn visit_class(&mut self, class: &TypeDescriptor) {
        walk_class(self, class);
    }

    fn visit_method(&mut self, method: &MethodDef) {
        walk_method(self, method);
    }

    fn visit_code_block(&mut self, block: &CodeBlock) {
        walk_code_block(self, block);
    }

    // Leaves
    fn visit_field(&mut self, _field: &MemberRef) {}

    fn visit_local(&mut self, _local: &Local) {}

    fn visit_constant(&mut self, _load: &LoadConstant) {}

    fn visit_local_assign(&mut self, _assign: &LocalAssign) {}

    fn visit_invoke(&mut self, _invoke: &Invoke) {}

    fn visit_get_field(&mut self, _get: &GetField) {}

    fn visit_put_field(&mut self, _put: &PutField) {}

    fn visit_operate(&mut self, _operate: &Operate) {}

    fn visit_unary(&mut self, _unary: &Unary) {}

    fn visit_cast(&mut self, _cast: &Cast) {}

    fn visit_compare(&mut self, _compare: &Compare) {}

    fn visit_condition(&mut self, _condition: &Condition) {}

    fn visit_goto(&mut self, _goto: &Goto) {}

    fn visit_label(&mut self, _label: &MarkLabel) {}

    fn visit_return(&mut self, _ret: &Return) {}

    fn visit_new_instance(&mut self, _new: &NewInstance) {}

    fn visit_new_array(&mut self, _new: &NewArray) {}

    fn visit_array_get(&mut self, _get: &ArrayGet) {}

    fn visit_array_put(&mut self, _put: &ArrayPut) {}

    fn visit_switch(&mut self, _switch: &Switch) {}

    fn visit_throw(&mut self, _throw: &Throw) {}

    fn visit_instance_of(&mut self, _check: &InstanceOf) {}
}

impl Code {
    /// Dispatch this element to the visitor method for its kind
    pub fn accept<V: Visitor>(&self, visitor: &mut V) {
        walk_code(visitor, self);
    }
}

impl CodeBlock {
    pub fn accept<V: Visitor>(&self, visitor: &mut V) {
        visitor.visit_code_block(self);
    }
}

impl MethodDef {
    pub fn accept<V: Visitor>(&self, visitor: &mut V) {
        visitor.visit_method(self);
    }
}

impl TypeDescriptor {
    pub fn accept<V: Visitor>(&self, visitor: &mut V) {
        visitor.visit_class(self);
    }
}

// ============================================================================
// Walk Functions - Default Traversal Implementations
// ============================================================================

pub fn walk_class<V: Visitor>(visitor: &mut V, class: &TypeDescriptor) {
    for field in class.fields() {
        visitor.visit_field(field);
    }
    for method in class.methods() {
        visitor.visit_method(method);
    }
    for constructor in class.constructors() {
        visitor.visit_method(constructor);
    }
}

pub fn walk_method<V: Visitor>(visitor: &mut V, method: &MethodDef) {
    if let Some(body) = method.body() {
        for local in body.locals() {
            visitor.visit_local(local);
        }
        visitor.visit_code_block(body);
    }
}

pub fn walk_code_block<V: Visitor>(visitor: &mut V, block: &CodeBlock) {
    for code in block.codes() {
        code.accept(visitor);
    }
}

pub fn walk_code<V: Visitor>(visitor: &mut V, code: &Code) {
    match code {
        Code::LoadConstant(load) => visitor.visit_constant(load),
        Code::LocalAssign(assign) => visitor.visit_local_assign(assign),
        Code::Invoke(invoke) => visitor.visit_invoke(invoke),
        Code::GetField(get) => visitor.visit_get_field(get),
        Code::PutField(put) => visitor.visit_put_field(put),
        Code::Operate(operate) => visitor.visit_operate(operate),
        Code::Unary(unary) => visitor.visit_unary(unary),
        Code::Cast(cast) => visitor.visit_cast(cast),
        Code::Compare(compare) => visitor.visit_compare(compare),
        Code::Condition(condition) => visitor.visit_condition(condition),
        Code::Goto(goto) => visitor.visit_goto(goto),
        Code::Label(label) => visitor.visit_label(label),
        Code::Return(ret) => visitor.visit_return(ret),
        Code::NewInstance(new) => visitor.visit_new_instance(new),
        Code::NewArray(new) => visitor.visit_new_array(new),
        Code::ArrayGet(get) => visitor.visit_array_get(get),
        Code::ArrayPut(put) => visitor.visit_array_put(put),
        Code::Switch(switch) => visitor.visit_switch(switch),
        Code::Throw(throw) => visitor.visit_throw(throw),
        Code::InstanceOf(check) => visitor.visit_instance_of(check),
    }
}
