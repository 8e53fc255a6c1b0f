//! Typed named slots
//!
//! Dynamic objects keep their variables in named slots. A slot holds one
//! [`SlotCell`] whose kind is fixed by the last write; typed reads check that
//! kind and report [`SlotError::TypeMismatch`] instead of converting.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::SlotError;

/// Value stored in a slot
#[derive(Clone)]
pub enum SlotCell {
    Bool(bool),
    Byte(i8),
    Short(i16),
    Char(char),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Object(Arc<dyn Any + Send + Sync>),
}

impl SlotCell {
    /// Name of the cell kind, as used in mismatch reports
    pub fn kind_name(&self) -> &'static str {
        match self {
            SlotCell::Bool(_) => "boolean",
            SlotCell::Byte(_) => "byte",
            SlotCell::Short(_) => "short",
            SlotCell::Char(_) => "char",
            SlotCell::Int(_) => "int",
            SlotCell::Long(_) => "long",
            SlotCell::Float(_) => "float",
            SlotCell::Double(_) => "double",
            SlotCell::Object(_) => "object",
        }
    }
}

impl fmt::Debug for SlotCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotCell::Bool(v) => write!(f, "Bool({v})"),
            SlotCell::Byte(v) => write!(f, "Byte({v})"),
            SlotCell::Short(v) => write!(f, "Short({v})"),
            SlotCell::Char(v) => write!(f, "Char({v:?})"),
            SlotCell::Int(v) => write!(f, "Int({v})"),
            SlotCell::Long(v) => write!(f, "Long({v})"),
            SlotCell::Float(v) => write!(f, "Float({v})"),
            SlotCell::Double(v) => write!(f, "Double({v})"),
            SlotCell::Object(_) => f.write_str("Object(..)"),
        }
    }
}

/// Primitive kinds that can live in a slot cell
pub trait SlotPrimitive: Copy {
    /// Kind name matching [`SlotCell::kind_name`]
    const KIND: &'static str;

    fn from_cell(cell: &SlotCell) -> Option<Self>;

    fn into_cell(self) -> SlotCell;
}

macro_rules! slot_primitive {
    ($($ty:ty => $variant:ident, $kind:literal;)*) => {
        $(
            impl SlotPrimitive for $ty {
                const KIND: &'static str = $kind;

                fn from_cell(cell: &SlotCell) -> Option<Self> {
                    match cell {
                        SlotCell::$variant(v) => Some(*v),
                        _ => None,
                    }
                }

                fn into_cell(self) -> SlotCell {
                    SlotCell::$variant(self)
                }
            }
        )*
    };
}

slot_primitive! {
    bool => Bool, "boolean";
    i8 => Byte, "byte";
    i16 => Short, "short";
    char => Char, "char";
    i32 => Int, "int";
    i64 => Long, "long";
    f32 => Float, "float";
    f64 => Double, "double";
}

/// Named slots of one dynamic object
#[derive(Debug, Clone, Default)]
pub struct DynamicSlots {
    cells: FxHashMap<String, SlotCell>,
}

impl DynamicSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cells.contains_key(name)
    }

    pub fn cell(&self, name: &str) -> Option<&SlotCell> {
        self.cells.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<SlotCell> {
        self.cells.remove(name)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Read a primitive, or `default` when the slot is empty
    pub fn get<T: SlotPrimitive>(&self, name: &str, default: T) -> Result<T, SlotError> {
        match self.cells.get(name) {
            None => Ok(default),
            Some(cell) => T::from_cell(cell).ok_or_else(|| mismatch(name, T::KIND, cell)),
        }
    }

    /// Store a primitive, replacing a cell of another kind
    pub fn set<T: SlotPrimitive>(&mut self, name: &str, value: T) {
        match self.cells.get_mut(name) {
            Some(cell) => *cell = value.into_cell(),
            None => {
                self.cells.insert(name.to_string(), value.into_cell());
            }
        }
    }

    /// Apply `f` to the current value (or `default`) and store the result
    pub fn calculate<T, F>(&mut self, name: &str, default: T, f: F) -> Result<T, SlotError>
    where
        T: SlotPrimitive,
        F: FnOnce(T) -> T,
    {
        let result = f(self.get(name, default)?);
        self.set(name, result);
        Ok(result)
    }

    /// Read an object slot as `T`; `None` when the slot is empty
    pub fn get_object<T: Any + Send + Sync>(&self, name: &str) -> Result<Option<Arc<T>>, SlotError> {
        match self.cells.get(name) {
            None => Ok(None),
            Some(SlotCell::Object(value)) => value
                .clone()
                .downcast::<T>()
                .map(Some)
                .map_err(|_| SlotError::TypeMismatch {
                    slot: name.to_string(),
                    expected: std::any::type_name::<T>(),
                    found: "object",
                }),
            Some(cell) => Err(mismatch(name, "object", cell)),
        }
    }

    pub fn set_object<T: Any + Send + Sync>(&mut self, name: &str, value: T) {
        self.cells
            .insert(name.to_string(), SlotCell::Object(Arc::new(value)));
    }

    /// Seed an empty slot with `initial`; returns false if the slot was already set
    pub fn init_with(&mut self, name: &str, initial: SlotCell) -> bool {
        if self.cells.contains_key(name) {
            return false;
        }
        self.cells.insert(name.to_string(), initial);
        true
    }

    /// Slots of a newly created object, seeded from each variable's initializer
    pub fn from_variables(variables: &[SlotVariable]) -> Self {
        let mut slots = Self::new();
        for variable in variables {
            variable.init(&mut slots);
        }
        slots
    }
}

type Initializer = Arc<dyn Fn() -> SlotCell + Send + Sync>;

/// Declared variable of a dynamic object, with an optional initial value
#[derive(Clone)]
pub struct SlotVariable {
    name: String,
    initializer: Option<Initializer>,
}

impl SlotVariable {
    /// Variable whose slot starts empty
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            initializer: None,
        }
    }

    /// Variable whose slot is seeded by calling `init` for each new object
    pub fn with_initializer<F>(name: impl Into<String>, init: F) -> Self
    where
        F: Fn() -> SlotCell + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            initializer: Some(Arc::new(init)),
        }
    }

    pub fn with_initial<T>(name: impl Into<String>, value: T) -> Self
    where
        T: SlotPrimitive + Send + Sync + 'static,
    {
        Self::with_initializer(name, move || value.into_cell())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Seed this variable's slot in `slots` unless it already holds a value
    pub fn init(&self, slots: &mut DynamicSlots) {
        if let Some(init) = &self.initializer {
            slots.init_with(&self.name, init());
        }
    }
}

impl fmt::Debug for SlotVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotVariable")
            .field("name", &self.name)
            .field("initialized", &self.initializer.is_some())
            .finish()
    }
}

fn mismatch(slot: &str, expected: &'static str, cell: &SlotCell) -> SlotError {
    SlotError::TypeMismatch {
        slot: slot.to_string(),
        expected,
        found: cell.kind_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_slot_yields_default() {
        let slots = DynamicSlots::new();
        assert_eq!(slots.get("hp", 20i32).unwrap(), 20);
        assert!(!slots.get("alive", false).unwrap());
    }

    #[test]
    fn test_set_and_get() {
        let mut slots = DynamicSlots::new();
        slots.set("hp", 7i32);
        slots.set("hp", 9i32);
        slots.set("speed", 1.5f32);
        assert_eq!(slots.get("hp", 0i32).unwrap(), 9);
        assert_eq!(slots.get("speed", 0.0f32).unwrap(), 1.5);
        assert_eq!(slots.len(), 2);
    }

    #[test]
    fn test_kind_mismatch() {
        let mut slots = DynamicSlots::new();
        slots.set("hp", 7i32);
        let err = slots.get("hp", 0i64).unwrap_err();
        assert_eq!(
            err,
            SlotError::TypeMismatch {
                slot: "hp".to_string(),
                expected: "long",
                found: "int",
            }
        );
    }

    #[test]
    fn test_set_replaces_other_kind() {
        let mut slots = DynamicSlots::new();
        slots.set("flag", 1i8);
        slots.set("flag", true);
        assert_eq!(slots.cell("flag").map(SlotCell::kind_name), Some("boolean"));
        assert!(slots.get("flag", false).unwrap());
    }

    #[test]
    fn test_calculate() {
        let mut slots = DynamicSlots::new();
        assert_eq!(slots.calculate("count", 10i64, |v| v + 1).unwrap(), 11);
        assert_eq!(slots.calculate("count", 0i64, |v| v * 2).unwrap(), 22);
        assert!(slots.calculate("count", 0i32, |v| v).is_err());
        assert_eq!(slots.get("count", 0i64).unwrap(), 22);
    }

    #[test]
    fn test_object_slots() {
        let mut slots = DynamicSlots::new();
        slots.set_object("name", String::from("crate"));
        let name = slots.get_object::<String>("name").unwrap().unwrap();
        assert_eq!(name.as_str(), "crate");
        assert!(slots.get_object::<u32>("name").is_err());
        assert!(slots.get("name", 0i32).is_err());
        assert!(slots.get_object::<String>("missing").unwrap().is_none());
    }

    #[test]
    fn test_init_with_seeds_only_empty_slots() {
        let mut slots = DynamicSlots::new();
        assert!(slots.init_with("hp", SlotCell::Int(20)));
        assert!(!slots.init_with("hp", SlotCell::Int(99)));
        assert_eq!(slots.get("hp", 0i32).unwrap(), 20);
    }

    #[test]
    fn test_variables_seed_new_objects() {
        let variables = [
            SlotVariable::with_initial("hp", 20i32),
            SlotVariable::with_initializer("tag", || SlotCell::Object(Arc::new(String::from("unit")))),
            SlotVariable::new("target"),
        ];

        let mut first = DynamicSlots::from_variables(&variables);
        first.set("hp", 5i32);
        let second = DynamicSlots::from_variables(&variables);

        assert_eq!(first.get("hp", 0i32).unwrap(), 5);
        assert_eq!(second.get("hp", 0i32).unwrap(), 20);
        assert_eq!(second.get_object::<String>("tag").unwrap().unwrap().as_str(), "unit");
        assert!(!second.contains("target"));
        assert_eq!(second.len(), 2);
        assert_eq!(variables[2].name(), "target");
    }
}
