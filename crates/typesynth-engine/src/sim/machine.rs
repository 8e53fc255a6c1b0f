//! Reference interpreter
//!
//! Runs method bodies of types registered in an [`InMemoryHost`]. Virtual
//! dispatch follows the package rules of the hosts the elevator targets: an
//! override of a package-scoped method only takes effect when it is declared
//! in the same scope, or when it overrides an intermediate declaration that
//! in turn overrides the package-scoped one.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use typesynth_ir::{
    Code, CodeBlock, CompareOp, ConditionKind, InvokeKind, LabelId, LocalId, MemberRef, Modifiers,
    OperateOp, TypeDescriptor, TypeName, UnaryOp, ValueType,
};

use super::host::{InMemoryHost, ROOT_TYPE};
use super::value::{Heap, HeapEntry, Value};
use crate::error::ExecError;

/// Maximum nesting of calls before [`ExecError::StackOverflow`]
pub const MAX_CALL_DEPTH: usize = 256;

type ExecResult<T> = Result<T, ExecError>;

/// Interpreter state: the heap, static fields and the call depth
#[derive(Debug)]
pub struct Machine<'h> {
    host: &'h InMemoryHost,
    heap: Heap,
    statics: FxHashMap<(TypeName, String), Value>,
    depth: usize,
}

impl<'h> Machine<'h> {
    pub fn new(host: &'h InMemoryHost) -> Self {
        Self {
            host,
            heap: Heap::default(),
            statics: FxHashMap::default(),
            depth: 0,
        }
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    /// Allocate an instance of `ty` and run the constructor taking `params`
    pub fn instantiate(
        &mut self,
        ty: &TypeName,
        params: &[ValueType],
        args: Vec<Value>,
    ) -> ExecResult<Value> {
        let descriptor = self.descriptor(ty)?;
        let constructor = descriptor
            .find_constructor(params)
            .map(|def| def.member().clone())
            .ok_or_else(|| ExecError::NoSuchMethod(format!("{}.<init>{:?}", ty, params)))?;
        self.construct(ty, &constructor, args)
    }

    /// Call the method `name(params)` visible on the receiver's class
    ///
    /// The declaration is resolved from the receiver's runtime class upward,
    /// then dispatched virtually.
    pub fn call(
        &mut self,
        receiver: &Value,
        name: &str,
        params: &[ValueType],
        args: Vec<Value>,
    ) -> ExecResult<Option<Value>> {
        let class = self.class_of(receiver)?;
        let method = self
            .host
            .ancestors(&class)
            .iter()
            .filter_map(|t| self.host.descriptor(t))
            .find_map(|d| d.find_method(name, params).map(|def| def.member().clone()))
            .ok_or_else(|| ExecError::NoSuchMethod(format!("{}.{}{:?}", class, name, params)))?;
        self.invoke_virtual(receiver, &method, args)
    }

    /// Invoke `method` on `receiver` through virtual dispatch
    pub fn invoke_virtual(
        &mut self,
        receiver: &Value,
        method: &MemberRef,
        args: Vec<Value>,
    ) -> ExecResult<Option<Value>> {
        let class = self.class_of(receiver)?;
        let selected = self.select(&class, method)?;
        self.invoke_exact(&selected, Some(receiver.clone()), args)
    }

    pub fn invoke_static(&mut self, method: &MemberRef, args: Vec<Value>) -> ExecResult<Option<Value>> {
        self.invoke_exact(method, None, args)
    }

    /// Read a field of `object` declared on `owner`; unwritten fields hold their type's default
    pub fn field(&self, object: &Value, owner: &TypeName, name: &str) -> ExecResult<Value> {
        let field = self
            .descriptor(owner)?
            .find_field(name)
            .cloned()
            .ok_or_else(|| ExecError::NoSuchField(format!("{}.{}", owner, name)))?;
        self.read_field(object, &field)
    }

    /// Runtime class of an instance
    pub fn class_of(&self, value: &Value) -> ExecResult<TypeName> {
        match value {
            Value::Null => Err(ExecError::NullPointer),
            Value::Str(_) => Ok(TypeName::new("java.lang.String")),
            Value::Ref(id) => match self.heap.get(*id) {
                Some(HeapEntry::Instance { class, .. }) => Ok(class.clone()),
                Some(HeapEntry::Array { .. }) => Ok(TypeName::new(ROOT_TYPE)),
                None => Err(ExecError::NullPointer),
            },
            other => Err(ExecError::Operand(format!("{} is not an object", other))),
        }
    }

    /// Elements of an array value
    pub fn array_items(&self, value: &Value) -> Option<&[Value]> {
        match self.heap.get(value.as_object()?) {
            Some(HeapEntry::Array { items, .. }) => Some(items),
            _ => None,
        }
    }

    // =========================================================================
    // Method selection
    // =========================================================================

    fn select(&self, class: &TypeName, method: &MemberRef) -> ExecResult<MemberRef> {
        if method.modifiers.is_private() || method.is_static() {
            return Ok(method.clone());
        }
        for ty in self.host.ancestors(class) {
            if ty == method.owner {
                return Ok(method.clone());
            }
            if let Some(candidate) = self.host.declared_method(&ty, method) {
                if self.overrides(&candidate, method) {
                    return Ok(candidate);
                }
            }
        }
        Err(ExecError::ClassCast {
            value: class.to_string(),
            target: method.owner.to_string(),
        })
    }

    /// Whether `candidate` overrides `target`, declared on one of its ancestors
    fn overrides(&self, candidate: &MemberRef, target: &MemberRef) -> bool {
        if candidate.modifiers.intersects(Modifiers::PRIVATE | Modifiers::STATIC)
            || target.modifiers.intersects(Modifiers::PRIVATE | Modifiers::STATIC)
        {
            return false;
        }
        if target.modifiers.is_inheritable_anywhere() {
            return true;
        }
        if candidate.owner.scope() == target.owner.scope() {
            return true;
        }
        // Package-scoped target from another scope: only through an
        // intermediate declaration that itself overrides the target.
        for ty in self.host.ancestors(&candidate.owner).into_iter().skip(1) {
            if ty == target.owner {
                break;
            }
            if let Some(middle) = self.host.declared_method(&ty, target) {
                if self.overrides(&middle, target) && self.overrides(candidate, &middle) {
                    return true;
                }
            }
        }
        false
    }

    // =========================================================================
    // Invocation
    // =========================================================================

    fn construct(
        &mut self,
        ty: &TypeName,
        constructor: &MemberRef,
        args: Vec<Value>,
    ) -> ExecResult<Value> {
        let descriptor = self.descriptor(ty)?;
        if descriptor.modifiers().contains(Modifiers::ABSTRACT) {
            return Err(ExecError::AbstractType(ty.to_string()));
        }
        let id = self.heap.alloc(HeapEntry::Instance {
            class: ty.clone(),
            fields: FxHashMap::default(),
        });
        let object = Value::Ref(id);
        self.invoke_exact(constructor, Some(object.clone()), args)?;
        Ok(object)
    }

    /// Run exactly the body named by `member`, bypassing dispatch
    fn invoke_exact(
        &mut self,
        member: &MemberRef,
        this: Option<Value>,
        args: Vec<Value>,
    ) -> ExecResult<Option<Value>> {
        let descriptor = self.descriptor(&member.owner)?;
        let def = if member.is_constructor() {
            descriptor.find_constructor(&member.params)
        } else {
            descriptor.find_method(&member.name, &member.params)
        }
        .ok_or_else(|| ExecError::NoSuchMethod(member.to_string()))?;
        let body = def
            .body()
            .ok_or_else(|| ExecError::AbstractMethod(member.to_string()))?;
        if !member.is_static() && this.as_ref().is_none_or(Value::is_null) {
            return Err(ExecError::NullPointer);
        }
        if args.len() != body.params().len() {
            return Err(ExecError::ArgumentCount {
                method: member.to_string(),
                expected: body.params().len(),
                found: args.len(),
            });
        }

        if self.depth >= MAX_CALL_DEPTH {
            return Err(ExecError::StackOverflow(MAX_CALL_DEPTH));
        }
        self.depth += 1;
        let result = self.execute(body, this, args);
        self.depth -= 1;
        result
    }

    fn descriptor(&self, ty: &TypeName) -> ExecResult<Arc<TypeDescriptor>> {
        self.host
            .descriptor(ty)
            .ok_or_else(|| ExecError::UnknownType(ty.to_string()))
    }

    // =========================================================================
    // Body execution
    // =========================================================================

    fn execute(
        &mut self,
        block: &CodeBlock,
        this: Option<Value>,
        args: Vec<Value>,
    ) -> ExecResult<Option<Value>> {
        let mut frame = Frame::new(block);
        if let (Some(slot), Some(this)) = (block.this_local(), this) {
            frame.set(slot, this);
        }
        for (slot, arg) in block.params().iter().zip(args) {
            frame.store(*slot, arg);
        }

        let labels = label_positions(block);
        let codes = block.codes();
        let mut pc = 0;

        while pc < codes.len() {
            let code = &codes[pc];
            pc += 1;
            match code {
                Code::LoadConstant(load) => frame.store(load.dest, Value::from(&load.value)),
                Code::LocalAssign(assign) => {
                    let value = frame.get(assign.src);
                    frame.store(assign.dest, value);
                }
                Code::Invoke(invoke) => {
                    let args = frame.get_all(&invoke.args);
                    let result = match invoke.kind {
                        InvokeKind::Static => self.invoke_static(&invoke.method, args)?,
                        InvokeKind::Super => {
                            let this = invoke.target.map(|t| frame.get(t));
                            self.invoke_exact(&invoke.method, this, args)?
                        }
                        InvokeKind::Virtual => {
                            let receiver = invoke
                                .target
                                .map(|t| frame.get(t))
                                .ok_or(ExecError::NullPointer)?;
                            self.invoke_virtual(&receiver, &invoke.method, args)?
                        }
                    };
                    if let Some(ret) = invoke.ret {
                        frame.store(ret, result.unwrap_or(Value::Null));
                    }
                }
                Code::GetField(get) => {
                    let value = match get.instance {
                        Some(instance) => {
                            let object = frame.get(instance);
                            self.read_field(&object, &get.field)?
                        }
                        None => self.read_static(&get.field),
                    };
                    frame.store(get.dest, value);
                }
                Code::PutField(put) => {
                    let value = frame.get(put.value);
                    match put.instance {
                        Some(instance) => {
                            let object = frame.get(instance);
                            self.write_field(&object, &put.field, value)?;
                        }
                        None => {
                            let value = convert_for(&put.field.value_type, value);
                            self.statics
                                .insert((put.field.owner.clone(), put.field.name.clone()), value);
                        }
                    }
                }
                Code::Operate(operate) => {
                    let width = frame.int_width(operate.dest);
                    let value = binary(frame.get(operate.lhs), operate.op, frame.get(operate.rhs), width)?;
                    frame.store(operate.dest, value);
                }
                Code::Unary(unary_op) => {
                    let value = unary(unary_op.op, frame.get(unary_op.operand))?;
                    frame.store(unary_op.dest, value);
                }
                Code::Cast(cast) => {
                    let value = frame.get(cast.src);
                    let target = frame.type_of(cast.dest).clone();
                    if !target.is_primitive() && !value.is_null() && !self.instance_of(&value, &target) {
                        return Err(ExecError::ClassCast {
                            value: value.to_string(),
                            target: target.to_string(),
                        });
                    }
                    frame.store(cast.dest, value);
                }
                Code::Compare(cmp) => {
                    if compare(&frame.get(cmp.lhs), cmp.op, &frame.get(cmp.rhs))? {
                        pc = jump(&labels, cmp.target)?;
                    }
                }
                Code::Condition(cond) => {
                    let value = frame.get(cond.value);
                    let taken = match cond.cond {
                        ConditionKind::True => truthy(&value)?,
                        ConditionKind::False => !truthy(&value)?,
                        ConditionKind::Null => value.is_null(),
                        ConditionKind::NonNull => !value.is_null(),
                    };
                    if taken {
                        pc = jump(&labels, cond.target)?;
                    }
                }
                Code::Goto(goto) => pc = jump(&labels, goto.target)?,
                Code::Label(_) => {}
                Code::Return(ret) => return Ok(ret.value.map(|v| frame.get(v))),
                Code::NewInstance(new) => {
                    let args = frame.get_all(&new.args);
                    let object = self.construct(&new.ty, &new.constructor, args)?;
                    frame.store(new.dest, object);
                }
                Code::NewArray(new) => {
                    let length = frame.get(new.length).as_int().ok_or_else(|| {
                        ExecError::Operand("array length is not an integer".to_string())
                    })?;
                    if length < 0 {
                        return Err(ExecError::NegativeArraySize(length));
                    }
                    let id = self.heap.alloc(HeapEntry::Array {
                        element: new.element.clone(),
                        items: vec![Value::default_for(&new.element); length as usize],
                    });
                    frame.store(new.dest, Value::Ref(id));
                }
                Code::ArrayGet(get) => {
                    let index = frame.get(get.index);
                    let items = self
                        .array_items(&frame.get(get.array))
                        .ok_or(ExecError::NullPointer)?;
                    let slot = array_index(&index, items.len())?;
                    let value = items[slot].clone();
                    frame.store(get.dest, value);
                }
                Code::ArrayPut(put) => {
                    let index = frame.get(put.index);
                    let value = frame.get(put.value);
                    let id = frame.get(put.array).as_object().ok_or(ExecError::NullPointer)?;
                    match self.heap.get_mut(id) {
                        Some(HeapEntry::Array { element, items }) => {
                            let slot = array_index(&index, items.len())?;
                            items[slot] = value.convert(element);
                        }
                        _ => return Err(ExecError::NullPointer),
                    }
                }
                Code::Switch(switch) => {
                    let value = frame.get(switch.value).as_int().ok_or_else(|| {
                        ExecError::Operand("switch on a non-integer".to_string())
                    })?;
                    let target = switch
                        .cases
                        .iter()
                        .find(|case| case.value == value)
                        .map(|case| case.target)
                        .unwrap_or(switch.default);
                    pc = jump(&labels, target)?;
                }
                Code::Throw(throw) => return Err(ExecError::Uncaught(frame.get(throw.value).to_string())),
                Code::InstanceOf(check) => {
                    let value = frame.get(check.value);
                    let result = self.instance_of(&value, &check.ty);
                    frame.store(check.dest, Value::Bool(result));
                }
            }
        }

        Ok(None)
    }

    fn read_field(&self, object: &Value, field: &MemberRef) -> ExecResult<Value> {
        let id = object.as_object().ok_or(ExecError::NullPointer)?;
        match self.heap.get(id) {
            Some(HeapEntry::Instance { fields, .. }) => Ok(fields
                .get(&(field.owner.clone(), field.name.clone()))
                .cloned()
                .unwrap_or_else(|| default_for_field(field))),
            _ => Err(ExecError::Operand(format!("{} has no field {}", object, field.name))),
        }
    }

    fn write_field(&mut self, object: &Value, field: &MemberRef, value: Value) -> ExecResult<()> {
        let id = object.as_object().ok_or(ExecError::NullPointer)?;
        match self.heap.get_mut(id) {
            Some(HeapEntry::Instance { fields, .. }) => {
                let value = convert_for(&field.value_type, value);
                fields.insert((field.owner.clone(), field.name.clone()), value);
                Ok(())
            }
            _ => Err(ExecError::Operand(format!("{} has no field {}", object, field.name))),
        }
    }

    fn read_static(&self, field: &MemberRef) -> Value {
        self.statics
            .get(&(field.owner.clone(), field.name.clone()))
            .cloned()
            .unwrap_or_else(|| default_for_field(field))
    }

    fn instance_of(&self, value: &Value, ty: &ValueType) -> bool {
        let root = TypeName::new(ROOT_TYPE);
        match (value, ty) {
            (Value::Str(_), ValueType::Object(name)) => {
                name.as_str() == "java.lang.String" || *name == root
            }
            (Value::Ref(id), _) => match (self.heap.get(*id), ty) {
                (Some(HeapEntry::Instance { class, .. }), ValueType::Object(name)) => {
                    self.host.is_subtype(class, name)
                }
                (Some(HeapEntry::Array { .. }), ValueType::Object(name)) => *name == root,
                (Some(HeapEntry::Array { element, .. }), ValueType::Array(expected)) => {
                    element == expected.as_ref()
                }
                _ => false,
            },
            _ => false,
        }
    }
}

/// Locals of one activation
struct Frame<'b> {
    block: &'b CodeBlock,
    slots: Vec<Value>,
}

impl<'b> Frame<'b> {
    fn new(block: &'b CodeBlock) -> Self {
        let slots = block.locals().iter().map(|l| Value::default_for(&l.ty)).collect();
        Self { block, slots }
    }

    fn get(&self, id: LocalId) -> Value {
        self.slots.get(id.index()).cloned().unwrap_or(Value::Null)
    }

    fn get_all(&self, ids: &[LocalId]) -> Vec<Value> {
        ids.iter().map(|id| self.get(*id)).collect()
    }

    fn set(&mut self, id: LocalId, value: Value) {
        if let Some(slot) = self.slots.get_mut(id.index()) {
            *slot = value;
        }
    }

    /// Store `value` narrowed to the local's declared type
    fn store(&mut self, id: LocalId, value: Value) {
        let value = match self.block.local_info(id) {
            Some(local) => value.convert(&local.ty),
            None => value,
        };
        self.set(id, value);
    }

    fn type_of(&self, id: LocalId) -> &ValueType {
        static UNKNOWN: ValueType = ValueType::Long;
        self.block.local_info(id).map(|l| &l.ty).unwrap_or(&UNKNOWN)
    }

    /// Shift width for integer results stored in `id`
    fn int_width(&self, id: LocalId) -> u32 {
        match self.type_of(id) {
            ValueType::Long => 64,
            _ => 32,
        }
    }
}

fn label_positions(block: &CodeBlock) -> Vec<Option<usize>> {
    let mut positions = vec![None; block.label_count() as usize];
    for (index, code) in block.codes().iter().enumerate() {
        if let Code::Label(mark) = code {
            if let Some(slot) = positions.get_mut(mark.label.0 as usize) {
                *slot = Some(index);
            }
        }
    }
    positions
}

fn jump(labels: &[Option<usize>], target: LabelId) -> ExecResult<usize> {
    labels
        .get(target.0 as usize)
        .copied()
        .flatten()
        .ok_or_else(|| ExecError::Operand(format!("label {} is not marked", target)))
}

fn array_index(index: &Value, len: usize) -> ExecResult<usize> {
    let index = index
        .as_int()
        .ok_or_else(|| ExecError::Operand("array index is not an integer".to_string()))?;
    if index < 0 || index as usize >= len {
        return Err(ExecError::ArrayIndex { index, len });
    }
    Ok(index as usize)
}

fn default_for_field(field: &MemberRef) -> Value {
    field
        .value_type
        .as_ref()
        .map(Value::default_for)
        .unwrap_or(Value::Null)
}

fn convert_for(ty: &Option<ValueType>, value: Value) -> Value {
    match ty {
        Some(ty) => value.convert(ty),
        None => value,
    }
}

fn truthy(value: &Value) -> ExecResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| ExecError::Operand(format!("{} is not a boolean", value)))
}

fn binary(lhs: Value, op: OperateOp, rhs: Value, width: u32) -> ExecResult<Value> {
    match (&lhs, &rhs) {
        (Value::Int(a), Value::Int(b)) => int_binary(*a, op, *b, width),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let (a, b) = (lhs.as_float().unwrap_or(0.0), rhs.as_float().unwrap_or(0.0));
            match op {
                OperateOp::Add => Ok(Value::Float(a + b)),
                OperateOp::Sub => Ok(Value::Float(a - b)),
                OperateOp::Mul => Ok(Value::Float(a * b)),
                OperateOp::Div => Ok(Value::Float(a / b)),
                OperateOp::Rem => Ok(Value::Float(a % b)),
                _ => Err(ExecError::Operand(format!("{} on floating operands", op))),
            }
        }
        (Value::Bool(a), Value::Bool(b)) => match op {
            OperateOp::And => Ok(Value::Bool(a & b)),
            OperateOp::Or => Ok(Value::Bool(a | b)),
            OperateOp::Xor => Ok(Value::Bool(a ^ b)),
            _ => Err(ExecError::Operand(format!("{} on boolean operands", op))),
        },
        (Value::Str(_), _) | (_, Value::Str(_)) if op == OperateOp::Add => {
            Ok(Value::Str(Arc::from(format!("{}{}", lhs, rhs))))
        }
        _ => Err(ExecError::Operand(format!("{} on {} and {}", op, lhs, rhs))),
    }
}

fn int_binary(a: i64, op: OperateOp, b: i64, width: u32) -> ExecResult<Value> {
    let mask = (width - 1) as i64;
    let value = match op {
        OperateOp::Add => a.wrapping_add(b),
        OperateOp::Sub => a.wrapping_sub(b),
        OperateOp::Mul => a.wrapping_mul(b),
        OperateOp::Div | OperateOp::Rem if b == 0 => {
            return Err(ExecError::Arithmetic("/ by zero".to_string()));
        }
        OperateOp::Div => a.wrapping_div(b),
        OperateOp::Rem => a.wrapping_rem(b),
        OperateOp::Shl => a.wrapping_shl((b & mask) as u32),
        OperateOp::Shr => a.wrapping_shr((b & mask) as u32),
        OperateOp::UShr if width == 32 => ((a as u32) >> (b & mask)) as i64,
        OperateOp::UShr => ((a as u64) >> (b & mask)) as i64,
        OperateOp::And => a & b,
        OperateOp::Or => a | b,
        OperateOp::Xor => a ^ b,
    };
    Ok(Value::Int(value))
}

fn unary(op: UnaryOp, operand: Value) -> ExecResult<Value> {
    match (op, &operand) {
        (UnaryOp::Increment, Value::Int(v)) => Ok(Value::Int(v.wrapping_add(1))),
        (UnaryOp::Decrement, Value::Int(v)) => Ok(Value::Int(v.wrapping_sub(1))),
        (UnaryOp::Negate, Value::Int(v)) => Ok(Value::Int(v.wrapping_neg())),
        (UnaryOp::BitNot, Value::Int(v)) => Ok(Value::Int(!v)),
        (UnaryOp::Increment, Value::Float(v)) => Ok(Value::Float(v + 1.0)),
        (UnaryOp::Decrement, Value::Float(v)) => Ok(Value::Float(v - 1.0)),
        (UnaryOp::Negate, Value::Float(v)) => Ok(Value::Float(-v)),
        (UnaryOp::BitNot, Value::Bool(v)) => Ok(Value::Bool(!v)),
        _ => Err(ExecError::Operand(format!("{} on {}", op, operand))),
    }
}

fn compare(lhs: &Value, op: CompareOp, rhs: &Value) -> ExecResult<bool> {
    let ordering = match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            lhs.as_float().partial_cmp(&rhs.as_float())
        }
        _ => {
            return match op {
                CompareOp::Eq => Ok(lhs == rhs),
                CompareOp::Ne => Ok(lhs != rhs),
                _ => Err(ExecError::Operand(format!("{} between {} and {}", op, lhs, rhs))),
            };
        }
    };
    // NaN compares false for everything except `!=`
    let Some(ordering) = ordering else {
        return Ok(op == CompareOp::Ne);
    };
    Ok(match op {
        CompareOp::Eq => ordering.is_eq(),
        CompareOp::Ne => ordering.is_ne(),
        CompareOp::Lt => ordering.is_lt(),
        CompareOp::Le => ordering.is_le(),
        CompareOp::Gt => ordering.is_gt(),
        CompareOp::Ge => ordering.is_ge(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use typesynth_ir::{Constant, Parameter, TypeBuilder};

    fn object() -> TypeName {
        InMemoryHost::root()
    }

    fn ctor(b: &mut TypeBuilder) {
        let supertype = b.supertype().cloned().unwrap_or_else(object);
        let sup = Arc::new(typesynth_ir::MemberDescriptor::constructor(
            supertype,
            Modifiers::PUBLIC,
            Vec::new(),
        ));
        let body = b.declare_constructor(Modifiers::PUBLIC, &[]).unwrap();
        let this = body.this_local().unwrap();
        body.invoke_super(this, &sup, None, &[]);
        body.return_void();
    }

    /// `static long fact(long n) { long acc = 1; while (n > 1) { acc *= n; n--; } return acc; }`
    fn math_type() -> TypeDescriptor {
        let mut b = TypeBuilder::new(Modifiers::PUBLIC, TypeName::new("app.Math"), Some(object()));
        let body = b
            .declare_method(
                Modifiers::PUBLIC | Modifiers::STATIC,
                "fact",
                Some(ValueType::Long),
                &[Parameter::new("n", ValueType::Long)],
            )
            .unwrap();
        let n = body.params()[0];
        let acc = body.local(ValueType::Long);
        let one = body.local(ValueType::Long);
        let top = body.new_label();
        let done = body.new_label();
        body.load_constant(acc, Constant::Int(1));
        body.load_constant(one, Constant::Int(1));
        body.mark_label(top);
        body.compare(n, CompareOp::Le, one, done);
        body.operate(acc, OperateOp::Mul, n, acc);
        body.unary(UnaryOp::Decrement, n, n);
        body.goto(top);
        body.mark_label(done);
        body.return_value(acc);
        ctor(&mut b);
        b.finish()
    }

    #[test]
    fn test_loop_and_arithmetic() {
        let host = InMemoryHost::new();
        let math = math_type();
        let fact = math.find_method("fact", &[ValueType::Long]).unwrap().member().clone();
        host.define(math).unwrap();

        let mut machine = Machine::new(&host);
        let result = machine.invoke_static(&fact, vec![Value::Int(10)]).unwrap();
        assert_eq!(result, Some(Value::Int(3_628_800)));
    }

    #[test]
    fn test_int_overflow_wraps_to_declared_width() {
        let mut b = TypeBuilder::new(Modifiers::PUBLIC, TypeName::new("app.Wrap"), Some(object()));
        let body = b
            .declare_method(Modifiers::PUBLIC | Modifiers::STATIC, "next", Some(ValueType::Int), &[])
            .unwrap();
        let max = body.local(ValueType::Int);
        let one = body.local(ValueType::Int);
        body.load_constant(max, Constant::Int(i32::MAX as i64));
        body.load_constant(one, Constant::Int(1));
        body.operate(max, OperateOp::Add, one, max);
        body.return_value(max);
        let ty = b.finish();
        let next = ty.find_method("next", &[]).unwrap().member().clone();

        let host = InMemoryHost::new();
        host.define(ty).unwrap();
        let mut machine = Machine::new(&host);
        assert_eq!(
            machine.invoke_static(&next, vec![]).unwrap(),
            Some(Value::Int(i32::MIN as i64))
        );
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            int_binary(1, OperateOp::Div, 0, 32),
            Err(ExecError::Arithmetic("/ by zero".to_string()))
        );
        assert_eq!(int_binary(-8, OperateOp::UShr, 28, 32), Ok(Value::Int(15)));
    }

    #[test]
    fn test_arrays_and_switch() {
        let mut b = TypeBuilder::new(Modifiers::PUBLIC, TypeName::new("app.Table"), Some(object()));
        let body = b
            .declare_method(
                Modifiers::PUBLIC | Modifiers::STATIC,
                "pick",
                Some(ValueType::Int),
                &[Parameter::new("key", ValueType::Int)],
            )
            .unwrap();
        let key = body.params()[0];
        let len = body.local(ValueType::Int);
        let arr = body.local(ValueType::Int.array_of());
        let idx = body.local(ValueType::Int);
        let val = body.local(ValueType::Int);
        let out = body.local(ValueType::Int);
        let one = body.new_label();
        let other = body.new_label();
        body.load_constant(len, Constant::Int(2));
        body.new_array(ValueType::Int, len, arr);
        body.load_constant(idx, Constant::Int(1));
        body.load_constant(val, Constant::Int(42));
        body.array_put(arr, idx, val);
        body.switch(key, &[(1, one)], other);
        body.mark_label(one);
        body.array_get(arr, idx, out);
        body.return_value(out);
        body.mark_label(other);
        body.load_constant(out, Constant::Int(-1));
        body.return_value(out);
        let ty = b.finish();
        let pick = ty.find_method("pick", &[ValueType::Int]).unwrap().member().clone();

        let host = InMemoryHost::new();
        host.define(ty).unwrap();
        let mut machine = Machine::new(&host);
        assert_eq!(machine.invoke_static(&pick, vec![Value::Int(1)]).unwrap(), Some(Value::Int(42)));
        assert_eq!(machine.invoke_static(&pick, vec![Value::Int(7)]).unwrap(), Some(Value::Int(-1)));
    }

    #[test]
    fn test_throw_and_cast_failure() {
        let mut b = TypeBuilder::new(Modifiers::PUBLIC, TypeName::new("app.Fail"), Some(object()));
        ctor(&mut b);
        let body = b
            .declare_method(Modifiers::PUBLIC | Modifiers::STATIC, "boom", None, &[])
            .unwrap();
        let msg = body.local(ValueType::object("java.lang.String"));
        body.load_constant(msg, Constant::Str("bad".to_string()));
        body.throw(msg);
        let body = b
            .declare_method(Modifiers::PUBLIC | Modifiers::STATIC, "narrow", None, &[])
            .unwrap();
        let obj = body.local(ValueType::object(ROOT_TYPE));
        let fail = body.local(ValueType::object("app.Fail"));
        let ctor = Arc::new(typesynth_ir::MemberDescriptor::constructor(
            object(),
            Modifiers::PUBLIC,
            Vec::new(),
        ));
        body.new_instance(&object(), &ctor, &[], obj);
        body.cast(obj, fail);
        body.return_void();
        let ty = b.finish();
        let boom = ty.find_method("boom", &[]).unwrap().member().clone();
        let narrow = ty.find_method("narrow", &[]).unwrap().member().clone();

        let host = InMemoryHost::new();
        host.define(ty).unwrap();
        let mut machine = Machine::new(&host);
        assert_eq!(
            machine.invoke_static(&boom, vec![]),
            Err(ExecError::Uncaught("bad".to_string()))
        );
        assert!(matches!(
            machine.invoke_static(&narrow, vec![]),
            Err(ExecError::ClassCast { .. })
        ));
    }

    #[test]
    fn test_abstract_type_cannot_be_instantiated() {
        let mut b = TypeBuilder::new(
            Modifiers::PUBLIC | Modifiers::ABSTRACT,
            TypeName::new("app.Shape"),
            Some(object()),
        );
        ctor(&mut b);
        b.declare_abstract_method(Modifiers::PUBLIC, "area", Some(ValueType::Double), &[])
            .unwrap();
        let host = InMemoryHost::new();
        let name = host.define(b.finish()).unwrap();
        let mut machine = Machine::new(&host);
        assert_eq!(
            machine.instantiate(&name, &[], vec![]),
            Err(ExecError::AbstractType("app.Shape".to_string()))
        );
    }

    #[test]
    fn test_unwritten_fields_read_as_type_defaults() {
        let mut b = TypeBuilder::new(Modifiers::PUBLIC, TypeName::new("app.Box"), Some(object()));
        b.declare_field(Modifiers::empty(), "count", ValueType::Int).unwrap();
        b.declare_field(Modifiers::empty(), "ratio", ValueType::Double).unwrap();
        b.declare_field(Modifiers::empty(), "next", ValueType::Object(object())).unwrap();
        ctor(&mut b);
        let host = InMemoryHost::new();
        let name = host.define(b.finish()).unwrap();

        let mut machine = Machine::new(&host);
        let boxed = machine.instantiate(&name, &[], vec![]).unwrap();
        assert_eq!(machine.field(&boxed, &name, "count"), Ok(Value::Int(0)));
        assert_eq!(machine.field(&boxed, &name, "ratio"), Ok(Value::Float(0.0)));
        assert_eq!(machine.field(&boxed, &name, "next"), Ok(Value::Null));
        assert_eq!(
            machine.field(&boxed, &name, "missing"),
            Err(ExecError::NoSuchField("app.Box.missing".to_string()))
        );
    }
}
