//! Typesynth IR
//!
//! Typed intermediate representation for types synthesized at runtime:
//! descriptors for types and their members, the closed set of code elements
//! method bodies are made of, a visitor protocol over them, a write-once
//! builder, body validation and a pretty printer.

pub mod builder;
pub mod descriptor;
pub mod display;
pub mod element;
pub mod error;
pub mod member;
pub mod modifiers;
pub mod ty;
pub mod validate;
pub mod visitor;

pub use builder::TypeBuilder;
pub use descriptor::{Element, MethodDef, TypeDescriptor};
pub use display::IrPrinter;
pub use element::{
    ArrayGet, ArrayPut, Cast, Code, CodeBlock, Compare, CompareOp, Condition, ConditionKind,
    ElementKind, GetField, Goto, InstanceOf, Invoke, InvokeKind, LabelId, LoadConstant, Local,
    LocalAssign, LocalId, MarkLabel, NewArray, NewInstance, Operate, OperateOp, PutField, Return,
    Switch, SwitchCase, Throw, Unary, UnaryOp,
};
pub use error::IrError;
pub use member::{MemberDescriptor, MemberKind, MemberRef, Parameter, CONSTRUCTOR_NAME};
pub use modifiers::Modifiers;
pub use ty::{Constant, ScopeId, TypeName, ValueType};
pub use validate::{validate_method, validate_type};
pub use visitor::{walk_class, walk_code, walk_code_block, walk_method, Visitor};
