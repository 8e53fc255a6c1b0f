//! Pretty-printing for type descriptions
//!
//! [`IrPrinter`] is a visitor that renders a type as a readable listing for
//! debugging and dump output.

use std::fmt::{self, Write};

use rustc_hash::FxHashMap;

use crate::descriptor::{MethodDef, TypeDescriptor};
use crate::element::*;
use crate::member::MemberRef;
use crate::visitor::{walk_class, walk_code_block, Visitor};

/// Renders types, methods and bodies as text
#[derive(Debug, Default)]
pub struct IrPrinter {
    out: String,
    local_types: FxHashMap<LocalId, String>,
}

impl IrPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the rendered text
    pub fn finish(self) -> String {
        self.out
    }

    fn line(&mut self, indent: usize, text: fmt::Arguments<'_>) {
        for _ in 0..indent {
            self.out.push_str("  ");
        }
        let _ = self.out.write_fmt(text);
        self.out.push('\n');
    }
}

fn list(locals: &[LocalId]) -> String {
    locals.iter().map(|l| l.to_string()).collect::<Vec<_>>().join(", ")
}

fn modifiers_prefix(text: String) -> String {
    if text.is_empty() {
        text
    } else {
        format!("{} ", text)
    }
}

impl Visitor for IrPrinter {
    fn visit_class(&mut self, class: &TypeDescriptor) {
        let extends = class
            .supertype()
            .map(|s| format!(" extends {}", s))
            .unwrap_or_default();
        self.line(
            0,
            format_args!(
                "{}class {}{} {{",
                modifiers_prefix(class.modifiers().to_string()),
                class.name(),
                extends
            ),
        );
        walk_class(self, class);
        self.line(0, format_args!("}}"));
    }

    fn visit_field(&mut self, field: &MemberRef) {
        let ty = field.value_type.as_ref().map(|t| t.to_string()).unwrap_or_default();
        self.line(
            1,
            format_args!("{}{} {};", modifiers_prefix(field.modifiers.to_string()), ty, field.name),
        );
    }

    fn visit_method(&mut self, method: &MethodDef) {
        let member = method.member();
        let ret = member
            .value_type
            .as_ref()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "void".to_string());
        let params = member.params.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(", ");
        let head = if member.is_constructor() {
            format!("{}{}({})", modifiers_prefix(member.modifiers.to_string()), member.name, params)
        } else {
            format!(
                "{}{} {}({})",
                modifiers_prefix(member.modifiers.to_string()),
                ret,
                member.name,
                params
            )
        };
        match method.body() {
            None => self.line(1, format_args!("{};", head)),
            Some(body) => {
                self.line(1, format_args!("{} {{", head));
                self.local_types.clear();
                for local in body.locals() {
                    self.visit_local(local);
                }
                self.visit_code_block(body);
                self.line(1, format_args!("}}"));
            }
        }
    }

    fn visit_local(&mut self, local: &Local) {
        self.local_types.insert(local.id, local.ty.to_string());
        match &local.name {
            Some(name) => self.line(2, format_args!("local {}: {} ({})", local.id, local.ty, name)),
            None => self.line(2, format_args!("local {}: {}", local.id, local.ty)),
        }
    }

    fn visit_code_block(&mut self, block: &CodeBlock) {
        walk_code_block(self, block);
    }

    fn visit_constant(&mut self, load: &LoadConstant) {
        self.line(2, format_args!("{} = const {}", load.dest, load.value));
    }

    fn visit_local_assign(&mut self, assign: &LocalAssign) {
        self.line(2, format_args!("{} = {}", assign.dest, assign.src));
    }

    fn visit_invoke(&mut self, invoke: &Invoke) {
        let kind = match invoke.kind {
            InvokeKind::Virtual => "invoke",
            InvokeKind::Super => "invoke.super",
            InvokeKind::Static => "invoke.static",
        };
        let target = invoke.target.map(|t| format!("{} ", t)).unwrap_or_default();
        let call = format!("{} {}{}({})", kind, target, invoke.method, list(&invoke.args));
        match invoke.ret {
            Some(ret) => self.line(2, format_args!("{} = {}", ret, call)),
            None => self.line(2, format_args!("{}", call)),
        }
    }

    fn visit_get_field(&mut self, get: &GetField) {
        let instance = get.instance.map(|i| i.to_string()).unwrap_or_else(|| "static".to_string());
        self.line(2, format_args!("{} = getfield {} {}", get.dest, instance, get.field));
    }

    fn visit_put_field(&mut self, put: &PutField) {
        let instance = put.instance.map(|i| i.to_string()).unwrap_or_else(|| "static".to_string());
        self.line(2, format_args!("putfield {} {} = {}", instance, put.field, put.value));
    }

    fn visit_operate(&mut self, operate: &Operate) {
        self.line(2, format_args!("{} = {} {}, {}", operate.dest, operate.op, operate.lhs, operate.rhs));
    }

    fn visit_unary(&mut self, unary: &Unary) {
        self.line(2, format_args!("{} = {} {}", unary.dest, unary.op, unary.operand));
    }

    fn visit_cast(&mut self, cast: &Cast) {
        let ty = self.local_types.get(&cast.dest).cloned().unwrap_or_else(|| "?".to_string());
        self.line(2, format_args!("{} = cast {} to {}", cast.dest, cast.src, ty));
    }

    fn visit_compare(&mut self, compare: &Compare) {
        self.line(
            2,
            format_args!("if {} {}, {} goto {}", compare.op, compare.lhs, compare.rhs, compare.target),
        );
    }

    fn visit_condition(&mut self, condition: &Condition) {
        let cond = match condition.cond {
            ConditionKind::True => "true",
            ConditionKind::False => "false",
            ConditionKind::Null => "null",
            ConditionKind::NonNull => "nonnull",
        };
        self.line(2, format_args!("if {} {} goto {}", cond, condition.value, condition.target));
    }

    fn visit_goto(&mut self, goto: &Goto) {
        self.line(2, format_args!("goto {}", goto.target));
    }

    fn visit_label(&mut self, label: &MarkLabel) {
        self.line(1, format_args!("{}:", label.label));
    }

    fn visit_return(&mut self, ret: &Return) {
        match ret.value {
            Some(value) => self.line(2, format_args!("return {}", value)),
            None => self.line(2, format_args!("return")),
        }
    }

    fn visit_new_instance(&mut self, new: &NewInstance) {
        self.line(2, format_args!("{} = new {}({})", new.dest, new.ty, list(&new.args)));
    }

    fn visit_new_array(&mut self, new: &NewArray) {
        self.line(2, format_args!("{} = newarray {}[{}]", new.dest, new.element, new.length));
    }

    fn visit_array_get(&mut self, get: &ArrayGet) {
        self.line(2, format_args!("{} = {}[{}]", get.dest, get.array, get.index));
    }

    fn visit_array_put(&mut self, put: &ArrayPut) {
        self.line(2, format_args!("{}[{}] = {}", put.array, put.index, put.value));
    }

    fn visit_switch(&mut self, switch: &Switch) {
        let cases = switch
            .cases
            .iter()
            .map(|c| format!("{} => {}", c.value, c.target))
            .collect::<Vec<_>>()
            .join(", ");
        self.line(
            2,
            format_args!("switch {} [{}] default {}", switch.value, cases, switch.default),
        );
    }

    fn visit_throw(&mut self, throw: &Throw) {
        self.line(2, format_args!("throw {}", throw.value));
    }

    fn visit_instance_of(&mut self, check: &InstanceOf) {
        self.line(2, format_args!("{} = instanceof {} {}", check.dest, check.value, check.ty));
    }
}
