//! Type and body builder
//!
//! A [`TypeBuilder`] accumulates the members of one type. Declaring a method
//! or constructor hands back its [`CodeBlock`], to which body elements are
//! appended in execution order. The builder does not check control flow while
//! appending; [`crate::validate_type`] does that when the type is
//! materialized.
//!
//! ```rust
//! use typesynth_ir::{Constant, Modifiers, OperateOp, Parameter, TypeBuilder, TypeName, ValueType};
//!
//! let mut builder = TypeBuilder::new(
//!     Modifiers::PUBLIC,
//!     TypeName::new("demo.Adder"),
//!     Some(TypeName::new("java.lang.Object")),
//! );
//! let body = builder
//!     .declare_method(
//!         Modifiers::PUBLIC,
//!         "addOne",
//!         Some(ValueType::Int),
//!         &[Parameter::new("x", ValueType::Int)],
//!     )
//!     .unwrap();
//! let x = body.params()[0];
//! let one = body.local(ValueType::Int);
//! let sum = body.local(ValueType::Int);
//! body.load_constant(one, Constant::Int(1));
//! body.operate(x, OperateOp::Add, one, sum);
//! body.return_value(sum);
//! let adder = builder.finish();
//! assert_eq!(adder.methods().len(), 1);
//! ```

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::descriptor::{MethodDef, TypeDescriptor};
use crate::element::*;
use crate::error::IrError;
use crate::member::{MemberDescriptor, MemberRef, Parameter};
use crate::modifiers::Modifiers;
use crate::ty::{Constant, TypeName, ValueType};

/// Write-once accumulator for one type under construction
#[derive(Debug)]
pub struct TypeBuilder {
    name: TypeName,
    modifiers: Modifiers,
    supertype: Option<TypeName>,
    fields: Vec<MemberRef>,
    methods: Vec<MethodDef>,
    constructors: Vec<MethodDef>,
    /// Signatures declared so far
    signatures: FxHashSet<String>,
}

impl TypeBuilder {
    /// Start building a type with the given supertype (`None` for a root)
    pub fn new(modifiers: Modifiers, name: TypeName, supertype: Option<TypeName>) -> Self {
        Self {
            name,
            modifiers,
            supertype,
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            signatures: FxHashSet::default(),
        }
    }

    pub fn name(&self) -> &TypeName {
        &self.name
    }

    pub fn supertype(&self) -> Option<&TypeName> {
        self.supertype.as_ref()
    }

    fn claim(&mut self, member: &MemberDescriptor) -> Result<(), IrError> {
        let key = match member.kind {
            crate::MemberKind::Field => format!("field {}", member.signature()),
            _ => member.signature(),
        };
        if !self.signatures.insert(key) {
            return Err(IrError::DuplicateMember {
                owner: self.name.to_string(),
                signature: member.signature(),
            });
        }
        Ok(())
    }

    /// Declare a field and return its handle
    pub fn declare_field(
        &mut self,
        modifiers: Modifiers,
        name: &str,
        ty: ValueType,
    ) -> Result<MemberRef, IrError> {
        let member = MemberDescriptor::field(self.name.clone(), modifiers, name, ty);
        self.claim(&member)?;
        let member = Arc::new(member);
        self.fields.push(member.clone());
        Ok(member)
    }

    /// Declare a method and return its body for construction
    ///
    /// `returns` is `None` for a method without a result.
    pub fn declare_method(
        &mut self,
        modifiers: Modifiers,
        name: &str,
        returns: Option<ValueType>,
        params: &[Parameter],
    ) -> Result<&mut CodeBlock, IrError> {
        let member = MemberDescriptor::method(
            self.name.clone(),
            modifiers,
            name,
            returns,
            params.iter().map(|p| p.ty.clone()).collect(),
        );
        self.claim(&member)?;
        let member = Arc::new(member);
        let block = CodeBlock::new(member.clone(), self.name.clone(), params);
        Ok(push_body(&mut self.methods, member, block))
    }

    /// Declare a method without a body
    pub fn declare_abstract_method(
        &mut self,
        modifiers: Modifiers,
        name: &str,
        returns: Option<ValueType>,
        params: &[ValueType],
    ) -> Result<MemberRef, IrError> {
        let member = MemberDescriptor::method(
            self.name.clone(),
            modifiers | Modifiers::ABSTRACT,
            name,
            returns,
            params.to_vec(),
        );
        self.claim(&member)?;
        let member = Arc::new(member);
        self.methods.push(MethodDef {
            member: member.clone(),
            body: None,
        });
        Ok(member)
    }

    /// Declare a constructor and return its body for construction
    pub fn declare_constructor(
        &mut self,
        modifiers: Modifiers,
        params: &[Parameter],
    ) -> Result<&mut CodeBlock, IrError> {
        let member = MemberDescriptor::constructor(
            self.name.clone(),
            modifiers,
            params.iter().map(|p| p.ty.clone()).collect(),
        );
        self.claim(&member)?;
        let member = Arc::new(member);
        let block = CodeBlock::new(member.clone(), self.name.clone(), params);
        Ok(push_body(&mut self.constructors, member, block))
    }

    /// Handle of a member declared earlier in this session
    pub fn member(&self, name: &str, params: &[ValueType]) -> Option<MemberRef> {
        self.methods
            .iter()
            .chain(self.constructors.iter())
            .map(|def| def.member())
            .find(|m| m.name == name && m.params == params)
            .cloned()
            .or_else(|| self.fields.iter().find(|f| f.name == name && params.is_empty()).cloned())
    }

    /// Close the session
    pub fn finish(self) -> TypeDescriptor {
        TypeDescriptor {
            name: self.name,
            modifiers: self.modifiers,
            supertype: self.supertype,
            fields: self.fields,
            methods: self.methods,
            constructors: self.constructors,
        }
    }
}

fn push_body(defs: &mut Vec<MethodDef>, member: MemberRef, block: CodeBlock) -> &mut CodeBlock {
    let index = defs.len();
    defs.push(MethodDef { member, body: None });
    defs[index].body.insert(block)
}

impl CodeBlock {
    /// Create an empty body; instance members get the receiver in slot 0
    pub(crate) fn new(method: MemberRef, owner: TypeName, params: &[Parameter]) -> Self {
        let mut block = Self {
            this: None,
            params: Vec::with_capacity(params.len()),
            locals: Vec::with_capacity(params.len() + 4),
            codes: Vec::new(),
            label_count: 0,
            method,
        };
        if !block.method.is_static() {
            let this = block.push_local(Some("this".to_string()), ValueType::Object(owner));
            block.this = Some(this);
        }
        for param in params {
            let id = block.push_local(Some(param.name.clone()), param.ty.clone());
            block.params.push(id);
        }
        block
    }

    fn push_local(&mut self, name: Option<String>, ty: ValueType) -> LocalId {
        let id = LocalId(self.locals.len() as u32);
        self.locals.push(Local { id, name, ty });
        id
    }

    fn emit(&mut self, code: Code) {
        self.codes.push(code);
    }

    // ===== Locals =====

    /// Declare an unnamed body local
    pub fn local(&mut self, ty: ValueType) -> LocalId {
        self.push_local(None, ty)
    }

    pub fn named_local(&mut self, name: &str, ty: ValueType) -> LocalId {
        self.push_local(Some(name.to_string()), ty)
    }

    pub fn load_constant(&mut self, dest: LocalId, value: Constant) {
        self.emit(Code::LoadConstant(LoadConstant { dest, value }));
    }

    pub fn assign(&mut self, src: LocalId, dest: LocalId) {
        self.emit(Code::LocalAssign(LocalAssign { src, dest }));
    }

    // ===== Invocation =====

    /// Invoke a method through ordinary dispatch
    ///
    /// A `target` of `None` makes this a static invoke.
    pub fn invoke(
        &mut self,
        target: Option<LocalId>,
        method: &MemberRef,
        ret: Option<LocalId>,
        args: &[LocalId],
    ) {
        let kind = if target.is_none() || method.is_static() {
            InvokeKind::Static
        } else {
            InvokeKind::Virtual
        };
        self.emit(Code::Invoke(Invoke {
            kind,
            target,
            method: method.clone(),
            args: args.to_vec(),
            ret,
        }));
    }

    /// Invoke the statically named implementation, bypassing overrides
    ///
    /// Used for super calls and for chaining to a supertype constructor.
    pub fn invoke_super(
        &mut self,
        this: LocalId,
        method: &MemberRef,
        ret: Option<LocalId>,
        args: &[LocalId],
    ) {
        self.emit(Code::Invoke(Invoke {
            kind: InvokeKind::Super,
            target: Some(this),
            method: method.clone(),
            args: args.to_vec(),
            ret,
        }));
    }

    // ===== Fields =====

    pub fn get_field(&mut self, instance: Option<LocalId>, field: &MemberRef, dest: LocalId) {
        self.emit(Code::GetField(GetField {
            instance,
            field: field.clone(),
            dest,
        }));
    }

    pub fn put_field(&mut self, instance: Option<LocalId>, field: &MemberRef, value: LocalId) {
        self.emit(Code::PutField(PutField {
            instance,
            field: field.clone(),
            value,
        }));
    }

    // ===== Arithmetic =====

    pub fn operate(&mut self, lhs: LocalId, op: OperateOp, rhs: LocalId, dest: LocalId) {
        self.emit(Code::Operate(Operate { lhs, op, rhs, dest }));
    }

    pub fn unary(&mut self, op: UnaryOp, operand: LocalId, dest: LocalId) {
        self.emit(Code::Unary(Unary { op, operand, dest }));
    }

    /// Convert `src` into the declared type of `dest`
    pub fn cast(&mut self, src: LocalId, dest: LocalId) {
        self.emit(Code::Cast(Cast { src, dest }));
    }

    pub fn instance_of(&mut self, value: LocalId, ty: ValueType, dest: LocalId) {
        self.emit(Code::InstanceOf(InstanceOf { value, ty, dest }));
    }

    // ===== Control Flow =====

    /// Allocate a label; it may be jumped to before it is marked
    pub fn new_label(&mut self) -> LabelId {
        let label = LabelId(self.label_count);
        self.label_count += 1;
        label
    }

    pub fn mark_label(&mut self, label: LabelId) {
        self.emit(Code::Label(MarkLabel { label }));
    }

    pub fn goto(&mut self, target: LabelId) {
        self.emit(Code::Goto(Goto { target }));
    }

    /// Jump to `target` when `lhs op rhs`
    pub fn compare(&mut self, lhs: LocalId, op: CompareOp, rhs: LocalId, target: LabelId) {
        self.emit(Code::Compare(Compare { lhs, op, rhs, target }));
    }

    /// Jump to `target` when `value` satisfies `cond`
    pub fn condition(&mut self, value: LocalId, cond: ConditionKind, target: LabelId) {
        self.emit(Code::Condition(Condition { value, cond, target }));
    }

    pub fn switch(&mut self, value: LocalId, cases: &[(i64, LabelId)], default: LabelId) {
        let cases = cases
            .iter()
            .map(|&(value, target)| SwitchCase { value, target })
            .collect();
        self.emit(Code::Switch(Switch { value, cases, default }));
    }

    pub fn return_value(&mut self, value: LocalId) {
        self.emit(Code::Return(Return { value: Some(value) }));
    }

    pub fn return_void(&mut self) {
        self.emit(Code::Return(Return { value: None }));
    }

    pub fn throw(&mut self, value: LocalId) {
        self.emit(Code::Throw(Throw { value }));
    }

    // ===== Allocation =====

    pub fn new_instance(
        &mut self,
        ty: &TypeName,
        constructor: &MemberRef,
        args: &[LocalId],
        dest: LocalId,
    ) {
        self.emit(Code::NewInstance(NewInstance {
            ty: ty.clone(),
            constructor: constructor.clone(),
            args: args.to_vec(),
            dest,
        }));
    }

    pub fn new_array(&mut self, element: ValueType, length: LocalId, dest: LocalId) {
        self.emit(Code::NewArray(NewArray { element, length, dest }));
    }

    pub fn array_get(&mut self, array: LocalId, index: LocalId, dest: LocalId) {
        self.emit(Code::ArrayGet(ArrayGet { array, index, dest }));
    }

    pub fn array_put(&mut self, array: LocalId, index: LocalId, value: LocalId) {
        self.emit(Code::ArrayPut(ArrayPut { array, index, value }));
    }
}
