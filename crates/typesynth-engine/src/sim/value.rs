//! Runtime values and heap of the reference machine

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use typesynth_ir::{Constant, TypeName, ValueType};

/// Handle of a heap entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub(crate) usize);

/// A value held in a local, field or array element
///
/// All integral kinds are carried as `Int` and narrowed on store; `float`
/// and `double` are both carried as `Float`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Ref(ObjectId),
}

impl Value {
    /// Zero value for a slot of type `ty`
    pub fn default_for(ty: &ValueType) -> Value {
        match ty {
            ValueType::Boolean => Value::Bool(false),
            ValueType::Byte
            | ValueType::Short
            | ValueType::Char
            | ValueType::Int
            | ValueType::Long => Value::Int(0),
            ValueType::Float | ValueType::Double => Value::Float(0.0),
            ValueType::Object(_) | ValueType::Array(_) => Value::Null,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            Value::Int(v) => Some(*v != 0),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Value::Ref(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Convert to the representation of `ty`, narrowing integers
    ///
    /// References are returned unchanged; checking them is the caller's job.
    pub fn convert(self, ty: &ValueType) -> Value {
        match (ty, self) {
            (ValueType::Boolean, Value::Int(v)) => Value::Bool(v != 0),
            (ValueType::Byte, Value::Int(v)) => Value::Int(v as i8 as i64),
            (ValueType::Short, Value::Int(v)) => Value::Int(v as i16 as i64),
            (ValueType::Char, Value::Int(v)) => Value::Int(v as u16 as i64),
            (ValueType::Int, Value::Int(v)) => Value::Int(v as i32 as i64),
            (ValueType::Byte, Value::Float(v)) => Value::Int(v as i32 as i8 as i64),
            (ValueType::Short, Value::Float(v)) => Value::Int(v as i32 as i16 as i64),
            (ValueType::Char, Value::Float(v)) => Value::Int(v as i32 as u16 as i64),
            (ValueType::Int, Value::Float(v)) => Value::Int(v as i32 as i64),
            (ValueType::Long, Value::Float(v)) => Value::Int(v as i64),
            (ValueType::Float, Value::Int(v)) => Value::Float(v as f32 as f64),
            (ValueType::Float, Value::Float(v)) => Value::Float(v as f32 as f64),
            (ValueType::Double, Value::Int(v)) => Value::Float(v as f64),
            (ty, Value::Bool(b)) if ty.is_integral() => Value::Int(b as i64),
            (_, value) => value,
        }
    }
}

impl From<&Constant> for Value {
    fn from(constant: &Constant) -> Self {
        match constant {
            Constant::Null => Value::Null,
            Constant::Bool(v) => Value::Bool(*v),
            Constant::Int(v) => Value::Int(*v),
            Constant::Float(v) => Value::Float(*v),
            Constant::Str(v) => Value::Str(Arc::from(v.as_str())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
            Value::Ref(id) => write!(f, "@{}", id.0),
        }
    }
}

/// Something allocated on the heap
#[derive(Debug, Clone)]
pub enum HeapEntry {
    Instance {
        class: TypeName,
        /// Keyed by declaring type and field name
        fields: FxHashMap<(TypeName, String), Value>,
    },
    Array {
        element: ValueType,
        items: Vec<Value>,
    },
}

/// Grow-only heap; entries live as long as the machine
#[derive(Debug, Default)]
pub struct Heap {
    entries: Vec<HeapEntry>,
}

impl Heap {
    pub fn alloc(&mut self, entry: HeapEntry) -> ObjectId {
        let id = ObjectId(self.entries.len());
        self.entries.push(entry);
        id
    }

    pub fn get(&self, id: ObjectId) -> Option<&HeapEntry> {
        self.entries.get(id.0)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut HeapEntry> {
        self.entries.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
