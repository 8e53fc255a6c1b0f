//! Code elements
//!
//! The closed set of node kinds a method body is made of. Operands refer to
//! locals and labels through ids scoped to the enclosing [`CodeBlock`] and to
//! members through shared [`MemberRef`] handles, never by copy.

use std::fmt;

use crate::member::MemberRef;
use crate::ty::{Constant, TypeName, ValueType};

/// Slot of a local within one body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalId(pub u32);

impl LocalId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Jump target within one body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelId(pub u32);

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// A typed local slot
#[derive(Debug, Clone, PartialEq)]
pub struct Local {
    pub id: LocalId,
    pub name: Option<String>,
    pub ty: ValueType,
}

/// Tag identifying every node kind of the element model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Class,
    Field,
    Method,
    Local,
    CodeBlock,
    LoadConstant,
    LocalAssign,
    Invoke,
    GetField,
    PutField,
    Operate,
    Unary,
    Cast,
    Compare,
    Condition,
    Goto,
    Label,
    Return,
    NewInstance,
    NewArray,
    ArrayGet,
    ArrayPut,
    Switch,
    Throw,
    InstanceOf,
}

/// How an invoke selects the implementation it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvokeKind {
    /// Dispatch on the receiver's runtime type
    Virtual,
    /// Run the statically named implementation (super calls and constructor chaining)
    Super,
    /// No receiver
    Static,
}

/// Binary arithmetic and logical operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperateOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    UShr,
    And,
    Or,
    Xor,
}

/// Single-operand operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Increment,
    Decrement,
    Negate,
    BitNot,
}

/// Comparison used by compare-and-jump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl OperateOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            OperateOp::Add => "add",
            OperateOp::Sub => "sub",
            OperateOp::Mul => "mul",
            OperateOp::Div => "div",
            OperateOp::Rem => "rem",
            OperateOp::Shl => "shl",
            OperateOp::Shr => "shr",
            OperateOp::UShr => "ushr",
            OperateOp::And => "and",
            OperateOp::Or => "or",
            OperateOp::Xor => "xor",
        }
    }
}

impl UnaryOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            UnaryOp::Increment => "inc",
            UnaryOp::Decrement => "dec",
            UnaryOp::Negate => "neg",
            UnaryOp::BitNot => "not",
        }
    }
}

impl CompareOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Lt => "lt",
            CompareOp::Le => "le",
            CompareOp::Gt => "gt",
            CompareOp::Ge => "ge",
        }
    }
}

macro_rules! display_mnemonic {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.mnemonic())
                }
            }
        )*
    };
}

display_mnemonic!(OperateOp, UnaryOp, CompareOp);

/// Single-value test used by condition jumps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    /// Boolean true or non-zero number
    True,
    /// Boolean false or zero
    False,
    Null,
    NonNull,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadConstant {
    pub dest: LocalId,
    pub value: Constant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalAssign {
    pub src: LocalId,
    pub dest: LocalId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invoke {
    pub kind: InvokeKind,
    /// Receiver; `None` for static invokes
    pub target: Option<LocalId>,
    pub method: MemberRef,
    pub args: Vec<LocalId>,
    /// Local receiving the result, if the caller keeps it
    pub ret: Option<LocalId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetField {
    /// Instance; `None` for static fields
    pub instance: Option<LocalId>,
    pub field: MemberRef,
    pub dest: LocalId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PutField {
    pub instance: Option<LocalId>,
    pub field: MemberRef,
    pub value: LocalId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operate {
    pub lhs: LocalId,
    pub op: OperateOp,
    pub rhs: LocalId,
    pub dest: LocalId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Unary {
    pub op: UnaryOp,
    pub operand: LocalId,
    pub dest: LocalId,
}

/// Convert `src` to the declared type of `dest`
#[derive(Debug, Clone, PartialEq)]
pub struct Cast {
    pub src: LocalId,
    pub dest: LocalId,
}

/// Jump to `target` when `lhs op rhs` holds
#[derive(Debug, Clone, PartialEq)]
pub struct Compare {
    pub lhs: LocalId,
    pub op: CompareOp,
    pub rhs: LocalId,
    pub target: LabelId,
}

/// Jump to `target` when `value` satisfies `cond`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub value: LocalId,
    pub cond: ConditionKind,
    pub target: LabelId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Goto {
    pub target: LabelId,
}

/// Places a label at this position
#[derive(Debug, Clone, PartialEq)]
pub struct MarkLabel {
    pub label: LabelId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Return {
    pub value: Option<LocalId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewInstance {
    pub ty: TypeName,
    pub constructor: MemberRef,
    pub args: Vec<LocalId>,
    pub dest: LocalId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewArray {
    pub element: ValueType,
    pub length: LocalId,
    pub dest: LocalId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayGet {
    pub array: LocalId,
    pub index: LocalId,
    pub dest: LocalId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayPut {
    pub array: LocalId,
    pub index: LocalId,
    pub value: LocalId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub value: i64,
    pub target: LabelId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Switch {
    pub value: LocalId,
    pub cases: Vec<SwitchCase>,
    pub default: LabelId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Throw {
    pub value: LocalId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstanceOf {
    pub value: LocalId,
    pub ty: ValueType,
    pub dest: LocalId,
}

/// One element of a method body
#[derive(Debug, Clone, PartialEq)]
pub enum Code {
    LoadConstant(LoadConstant),
    LocalAssign(LocalAssign),
    Invoke(Invoke),
    GetField(GetField),
    PutField(PutField),
    Operate(Operate),
    Unary(Unary),
    Cast(Cast),
    Compare(Compare),
    Condition(Condition),
    Goto(Goto),
    Label(MarkLabel),
    Return(Return),
    NewInstance(NewInstance),
    NewArray(NewArray),
    ArrayGet(ArrayGet),
    ArrayPut(ArrayPut),
    Switch(Switch),
    Throw(Throw),
    InstanceOf(InstanceOf),
}

impl Code {
    pub fn kind(&self) -> ElementKind {
        match self {
            Code::LoadConstant(_) => ElementKind::LoadConstant,
            Code::LocalAssign(_) => ElementKind::LocalAssign,
            Code::Invoke(_) => ElementKind::Invoke,
            Code::GetField(_) => ElementKind::GetField,
            Code::PutField(_) => ElementKind::PutField,
            Code::Operate(_) => ElementKind::Operate,
            Code::Unary(_) => ElementKind::Unary,
            Code::Cast(_) => ElementKind::Cast,
            Code::Compare(_) => ElementKind::Compare,
            Code::Condition(_) => ElementKind::Condition,
            Code::Goto(_) => ElementKind::Goto,
            Code::Label(_) => ElementKind::Label,
            Code::Return(_) => ElementKind::Return,
            Code::NewInstance(_) => ElementKind::NewInstance,
            Code::NewArray(_) => ElementKind::NewArray,
            Code::ArrayGet(_) => ElementKind::ArrayGet,
            Code::ArrayPut(_) => ElementKind::ArrayPut,
            Code::Switch(_) => ElementKind::Switch,
            Code::Throw(_) => ElementKind::Throw,
            Code::InstanceOf(_) => ElementKind::InstanceOf,
        }
    }

    /// Whether control never continues to the next element
    pub fn ends_flow(&self) -> bool {
        matches!(
            self,
            Code::Goto(_) | Code::Return(_) | Code::Throw(_) | Code::Switch(_)
        )
    }

    /// Labels this element may jump to
    pub fn branch_targets(&self) -> Vec<LabelId> {
        match self {
            Code::Goto(goto) => vec![goto.target],
            Code::Compare(cmp) => vec![cmp.target],
            Code::Condition(cond) => vec![cond.target],
            Code::Switch(switch) => {
                let mut targets: Vec<LabelId> = switch.cases.iter().map(|c| c.target).collect();
                targets.push(switch.default);
                targets
            }
            _ => Vec::new(),
        }
    }
}

/// Body of one method or constructor
///
/// Holds the local table (receiver first, then parameters, then locals
/// declared while building) and the ordered element list. Appending is done
/// through the builder operations; once the enclosing type is finished the
/// block is only reachable through shared references.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    pub(crate) method: MemberRef,
    pub(crate) locals: Vec<Local>,
    pub(crate) this: Option<LocalId>,
    pub(crate) params: Vec<LocalId>,
    pub(crate) codes: Vec<Code>,
    pub(crate) label_count: u32,
}

impl CodeBlock {
    /// The member this body implements
    pub fn method(&self) -> &MemberRef {
        &self.method
    }

    pub fn locals(&self) -> &[Local] {
        &self.locals
    }

    pub fn local_info(&self, id: LocalId) -> Option<&Local> {
        self.locals.get(id.index())
    }

    /// The receiver local, absent in static methods
    pub fn this_local(&self) -> Option<LocalId> {
        self.this
    }

    /// Parameter locals in declaration order
    pub fn params(&self) -> &[LocalId] {
        &self.params
    }

    pub fn param(&self, index: usize) -> Option<LocalId> {
        self.params.get(index).copied()
    }

    pub fn codes(&self) -> &[Code] {
        &self.codes
    }

    /// Number of labels allocated in this body
    pub fn label_count(&self) -> u32 {
        self.label_count
    }
}
