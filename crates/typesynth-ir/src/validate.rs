//! Body validation
//!
//! Run on a finished type before it is committed to a host. The builder never
//! checks control flow while appending, so this is where an incomplete body
//! is reported:
//!
//! - every label that is jumped to is marked exactly once;
//! - every local operand is a slot of the body's local table;
//! - no reachable path runs past the last element without a return or throw.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::descriptor::{MethodDef, TypeDescriptor};
use crate::element::*;
use crate::error::IrError;
use crate::visitor::{walk_code_block, Visitor};

/// Validate every body declared on a type
pub fn validate_type(ty: &TypeDescriptor) -> Result<(), IrError> {
    for def in ty.methods().iter().chain(ty.constructors()) {
        validate_method(def)?;
    }
    Ok(())
}

/// Validate a single method or constructor
pub fn validate_method(def: &MethodDef) -> Result<(), IrError> {
    let Some(body) = def.body() else {
        return Ok(());
    };
    let name = def.member().to_string();

    let mut scan = OperandScan::new(body.locals().len());
    body.accept(&mut scan);

    if let Some(local) = scan.foreign_locals.first() {
        return Err(IrError::malformed(&name, format!("local {} is not declared in this body", local)));
    }
    if let Some(label) = scan.duplicate_marks.first() {
        return Err(IrError::malformed(&name, format!("label {} is marked more than once", label)));
    }
    let mut unmarked: Vec<LabelId> = scan
        .referenced
        .iter()
        .filter(|label| !scan.marks.contains_key(label))
        .copied()
        .collect();
    unmarked.sort();
    if let Some(label) = unmarked.first() {
        return Err(IrError::malformed(&name, format!("label {} is never marked", label)));
    }

    if let Some(position) = falls_off_end(body.codes(), &scan.marks) {
        let reason = if body.codes().is_empty() {
            "body is empty".to_string()
        } else {
            format!("control reaches the end of the body after element {} without return or throw", position)
        };
        return Err(IrError::malformed(&name, reason));
    }
    Ok(())
}

/// Walk reachable elements from the entry; returns the index of the element
/// that falls through past the end, if any
fn falls_off_end(codes: &[Code], marks: &FxHashMap<LabelId, usize>) -> Option<usize> {
    let mut visited = vec![false; codes.len()];
    let mut pending = vec![0usize];

    if codes.is_empty() {
        return Some(0);
    }

    while let Some(index) = pending.pop() {
        if index >= codes.len() {
            return Some(index.saturating_sub(1));
        }
        if visited[index] {
            continue;
        }
        visited[index] = true;

        let code = &codes[index];
        for target in code.branch_targets() {
            if let Some(&position) = marks.get(&target) {
                pending.push(position);
            }
        }
        if !code.ends_flow() {
            pending.push(index + 1);
        }
    }
    None
}

/// Collects label marks, label references and out-of-range locals
struct OperandScan {
    local_count: usize,
    position: usize,
    marks: FxHashMap<LabelId, usize>,
    duplicate_marks: Vec<LabelId>,
    referenced: FxHashSet<LabelId>,
    foreign_locals: Vec<LocalId>,
}

impl OperandScan {
    fn new(local_count: usize) -> Self {
        Self {
            local_count,
            position: 0,
            marks: FxHashMap::default(),
            duplicate_marks: Vec::new(),
            referenced: FxHashSet::default(),
            foreign_locals: Vec::new(),
        }
    }

    fn use_locals(&mut self, locals: &[LocalId]) {
        for &local in locals {
            if local.index() >= self.local_count {
                self.foreign_locals.push(local);
            }
        }
    }

    fn jump(&mut self, label: LabelId) {
        self.referenced.insert(label);
    }
}

impl Visitor for OperandScan {
    fn visit_code_block(&mut self, block: &CodeBlock) {
        self.position = 0;
        walk_code_block(self, block);
    }

    fn visit_constant(&mut self, load: &LoadConstant) {
        self.use_locals(&[load.dest]);
        self.position += 1;
    }

    fn visit_local_assign(&mut self, assign: &LocalAssign) {
        self.use_locals(&[assign.src, assign.dest]);
        self.position += 1;
    }

    fn visit_invoke(&mut self, invoke: &Invoke) {
        self.use_locals(&invoke.args);
        self.use_locals(invoke.target.as_slice());
        self.use_locals(invoke.ret.as_slice());
        self.position += 1;
    }

    fn visit_get_field(&mut self, get: &GetField) {
        self.use_locals(get.instance.as_slice());
        self.use_locals(&[get.dest]);
        self.position += 1;
    }

    fn visit_put_field(&mut self, put: &PutField) {
        self.use_locals(put.instance.as_slice());
        self.use_locals(&[put.value]);
        self.position += 1;
    }

    fn visit_operate(&mut self, operate: &Operate) {
        self.use_locals(&[operate.lhs, operate.rhs, operate.dest]);
        self.position += 1;
    }

    fn visit_unary(&mut self, unary: &Unary) {
        self.use_locals(&[unary.operand, unary.dest]);
        self.position += 1;
    }

    fn visit_cast(&mut self, cast: &Cast) {
        self.use_locals(&[cast.src, cast.dest]);
        self.position += 1;
    }

    fn visit_compare(&mut self, compare: &Compare) {
        self.use_locals(&[compare.lhs, compare.rhs]);
        self.jump(compare.target);
        self.position += 1;
    }

    fn visit_condition(&mut self, condition: &Condition) {
        self.use_locals(&[condition.value]);
        self.jump(condition.target);
        self.position += 1;
    }

    fn visit_goto(&mut self, goto: &Goto) {
        self.jump(goto.target);
        self.position += 1;
    }

    fn visit_label(&mut self, label: &MarkLabel) {
        if self.marks.insert(label.label, self.position).is_some() {
            self.duplicate_marks.push(label.label);
        }
        self.position += 1;
    }

    fn visit_return(&mut self, ret: &Return) {
        self.use_locals(ret.value.as_slice());
        self.position += 1;
    }

    fn visit_new_instance(&mut self, new: &NewInstance) {
        self.use_locals(&new.args);
        self.use_locals(&[new.dest]);
        self.position += 1;
    }

    fn visit_new_array(&mut self, new: &NewArray) {
        self.use_locals(&[new.length, new.dest]);
        self.position += 1;
    }

    fn visit_array_get(&mut self, get: &ArrayGet) {
        self.use_locals(&[get.array, get.index, get.dest]);
        self.position += 1;
    }

    fn visit_array_put(&mut self, put: &ArrayPut) {
        self.use_locals(&[put.array, put.index, put.value]);
        self.position += 1;
    }

    fn visit_switch(&mut self, switch: &Switch) {
        self.use_locals(&[switch.value]);
        for case in &switch.cases {
            self.jump(case.target);
        }
        self.jump(switch.default);
        self.position += 1;
    }

    fn visit_throw(&mut self, throw: &Throw) {
        self.use_locals(&[throw.value]);
        self.position += 1;
    }

    fn visit_instance_of(&mut self, check: &InstanceOf) {
        self.use_locals(&[check.value, check.dest]);
        self.position += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TypeBuilder;
    use crate::member::Parameter;
    use crate::modifiers::Modifiers;
    use crate::ty::{Constant, TypeName, ValueType};

    fn builder() -> TypeBuilder {
        TypeBuilder::new(
            Modifiers::PUBLIC,
            TypeName::new("pac.A"),
            Some(TypeName::new("java.lang.Object")),
        )
    }

    fn reason(err: IrError) -> String {
        match err {
            IrError::MalformedBody { reason, .. } => reason,
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_straight_line_return_is_valid() {
        let mut b = builder();
        let body = b.declare_method(Modifiers::empty(), "run", Some(ValueType::Int), &[]).unwrap();
        let x = body.local(ValueType::Int);
        body.load_constant(x, Constant::Int(3));
        body.return_value(x);
        assert!(validate_type(&b.finish()).is_ok());
    }

    #[test]
    fn test_missing_return_is_malformed() {
        let mut b = builder();
        let body = b.declare_method(Modifiers::empty(), "run", None, &[]).unwrap();
        let x = body.local(ValueType::Int);
        body.load_constant(x, Constant::Int(3));
        let err = validate_type(&b.finish()).unwrap_err();
        assert!(reason(err).contains("without return or throw"));
    }

    #[test]
    fn test_empty_body_is_malformed() {
        let mut b = builder();
        b.declare_constructor(Modifiers::PUBLIC, &[]).unwrap();
        let err = validate_type(&b.finish()).unwrap_err();
        assert_eq!(reason(err), "body is empty");
    }

    #[test]
    fn test_one_branch_missing_return() {
        let mut b = builder();
        let body = b
            .declare_method(
                Modifiers::empty(),
                "pick",
                Some(ValueType::Int),
                &[Parameter::new("flag", ValueType::Boolean)],
            )
            .unwrap();
        let flag = body.params()[0];
        let out = body.local(ValueType::Int);
        let other = body.new_label();
        body.condition(flag, ConditionKind::False, other);
        body.load_constant(out, Constant::Int(1));
        body.return_value(out);
        body.mark_label(other);
        body.load_constant(out, Constant::Int(2));
        let err = validate_type(&b.finish()).unwrap_err();
        assert!(reason(err).contains("without return or throw"));
    }

    #[test]
    fn test_forward_jump_and_loop_are_valid() {
        let mut b = builder();
        let body = b
            .declare_method(
                Modifiers::empty(),
                "count",
                Some(ValueType::Int),
                &[Parameter::new("n", ValueType::Int)],
            )
            .unwrap();
        let n = body.params()[0];
        let i = body.local(ValueType::Int);
        let head = body.new_label();
        let done = body.new_label();
        body.load_constant(i, Constant::Int(0));
        body.mark_label(head);
        body.compare(i, CompareOp::Ge, n, done);
        body.unary(UnaryOp::Increment, i, i);
        body.goto(head);
        body.mark_label(done);
        body.return_value(i);
        assert!(validate_type(&b.finish()).is_ok());
    }

    #[test]
    fn test_unreachable_tail_is_ignored() {
        let mut b = builder();
        let body = b.declare_method(Modifiers::empty(), "run", None, &[]).unwrap();
        let x = body.local(ValueType::Int);
        body.return_void();
        body.load_constant(x, Constant::Int(1));
        assert!(validate_type(&b.finish()).is_ok());
    }

    #[test]
    fn test_unmarked_label_is_malformed() {
        let mut b = builder();
        let body = b.declare_method(Modifiers::empty(), "run", None, &[]).unwrap();
        let nowhere = body.new_label();
        body.goto(nowhere);
        let err = validate_type(&b.finish()).unwrap_err();
        assert_eq!(reason(err), "label L0 is never marked");
    }

    #[test]
    fn test_label_marked_twice_is_malformed() {
        let mut b = builder();
        let body = b.declare_method(Modifiers::empty(), "run", None, &[]).unwrap();
        let label = body.new_label();
        body.mark_label(label);
        body.mark_label(label);
        body.return_void();
        let err = validate_type(&b.finish()).unwrap_err();
        assert!(reason(err).contains("marked more than once"));
    }

    #[test]
    fn test_foreign_local_is_malformed() {
        let mut b = builder();
        let body = b.declare_method(Modifiers::empty(), "run", None, &[]).unwrap();
        body.return_value(LocalId(42));
        let err = validate_type(&b.finish()).unwrap_err();
        assert!(reason(err).contains("%42"));
    }

    #[test]
    fn test_local_range_ends_at_table_length() {
        let mut b = builder();
        let body = b
            .declare_method(Modifiers::empty(), "last", Some(ValueType::Int), &[])
            .unwrap();
        let value = body.local(ValueType::Int);
        body.return_value(value);
        let body = b
            .declare_method(Modifiers::empty(), "past", Some(ValueType::Int), &[])
            .unwrap();
        let value = body.local(ValueType::Int);
        body.return_value(LocalId(value.0 + 1));

        let err = validate_type(&b.finish()).unwrap_err();
        assert!(reason(err).contains("%2"));
    }

    #[test]
    fn test_switch_covers_all_paths() {
        let mut b = builder();
        let body = b
            .declare_method(
                Modifiers::empty(),
                "name",
                Some(ValueType::Int),
                &[Parameter::new("k", ValueType::Int)],
            )
            .unwrap();
        let k = body.params()[0];
        let out = body.local(ValueType::Int);
        let one = body.new_label();
        let fallback = body.new_label();
        body.switch(k, &[(1, one)], fallback);
        body.mark_label(one);
        body.load_constant(out, Constant::Int(10));
        body.return_value(out);
        body.mark_label(fallback);
        body.throw(k);
        assert!(validate_type(&b.finish()).is_ok());
    }

    #[test]
    fn test_abstract_methods_are_skipped() {
        let mut b = builder();
        b.declare_abstract_method(Modifiers::PUBLIC, "run", None, &[]).unwrap();
        assert!(validate_type(&b.finish()).is_ok());
    }
}
