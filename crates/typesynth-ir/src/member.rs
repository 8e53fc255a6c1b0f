//! Member descriptors
//!
//! Fields, methods and constructors are all described by a
//! [`MemberDescriptor`]. Code elements hold members through a shared
//! [`MemberRef`] so that an invoke or field access always points at the one
//! descriptor its declaring type owns.

use std::fmt;
use std::sync::Arc;

use crate::modifiers::Modifiers;
use crate::ty::{TypeName, ValueType};

/// Name every constructor is declared under
pub const CONSTRUCTOR_NAME: &str = "<init>";

/// Shared handle to a member descriptor
pub type MemberRef = Arc<MemberDescriptor>;

/// Kind of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    Method,
    Constructor,
}

/// A field, method or constructor signature with its modifiers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberDescriptor {
    pub kind: MemberKind,
    pub name: String,
    pub modifiers: Modifiers,
    /// Type that declares this member
    pub owner: TypeName,
    /// Parameter types (empty for fields)
    pub params: Vec<ValueType>,
    /// Field type or method return type; `None` for constructors and void methods
    pub value_type: Option<ValueType>,
}

impl MemberDescriptor {
    /// Describe a field
    pub fn field(owner: TypeName, modifiers: Modifiers, name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            kind: MemberKind::Field,
            name: name.into(),
            modifiers,
            owner,
            params: Vec::new(),
            value_type: Some(ty),
        }
    }

    /// Describe a method
    pub fn method(
        owner: TypeName,
        modifiers: Modifiers,
        name: impl Into<String>,
        returns: Option<ValueType>,
        params: Vec<ValueType>,
    ) -> Self {
        Self {
            kind: MemberKind::Method,
            name: name.into(),
            modifiers,
            owner,
            params,
            value_type: returns,
        }
    }

    /// Describe a constructor
    pub fn constructor(owner: TypeName, modifiers: Modifiers, params: Vec<ValueType>) -> Self {
        Self {
            kind: MemberKind::Constructor,
            name: CONSTRUCTOR_NAME.to_string(),
            modifiers,
            owner,
            params,
            value_type: None,
        }
    }

    pub fn is_constructor(&self) -> bool {
        self.kind == MemberKind::Constructor
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }

    /// Same kind, name and parameter types; owner and modifiers are ignored
    pub fn same_signature(&self, other: &MemberDescriptor) -> bool {
        self.kind == other.kind && self.name == other.name && self.params == other.params
    }

    /// Signature key used to detect duplicate declarations
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
        match self.kind {
            MemberKind::Field => self.name.clone(),
            MemberKind::Method | MemberKind::Constructor => {
                format!("{}({})", self.name, params.join(", "))
            }
        }
    }
}

impl fmt::Display for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MemberKind::Field => {
                let ty = self.value_type.as_ref().map(|t| t.to_string()).unwrap_or_default();
                write!(f, "{}.{}: {}", self.owner, self.name, ty)
            }
            MemberKind::Method | MemberKind::Constructor => {
                write!(f, "{}.{}", self.owner, self.signature())?;
                if let Some(ret) = &self.value_type {
                    write!(f, " -> {}", ret)?;
                }
                Ok(())
            }
        }
    }
}

/// A named parameter of a method or constructor being declared
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: ValueType,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self { name: name.into(), ty }
    }

    /// Parameters named `arg0`, `arg1`, ... for the given types
    pub fn positional(types: &[ValueType]) -> Vec<Parameter> {
        types
            .iter()
            .enumerate()
            .map(|(i, ty)| Parameter::new(format!("arg{}", i), ty.clone()))
            .collect()
    }
}
