//! Type names, scopes and value types
//!
//! A `TypeName` is a dot-separated qualified name. Everything before the last
//! dot is the type's enclosing scope, which is the unit the host uses to gate
//! access to package-scoped members.

use std::fmt;
use std::sync::Arc;

/// Qualified name of a type (`pac1.A`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(Arc<str>);

impl TypeName {
    /// Create a type name from its qualified form
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The qualified name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Enclosing scope of this type
    pub fn scope(&self) -> ScopeId {
        match self.0.rfind('.') {
            Some(idx) => ScopeId::new(&self.0[..idx]),
            None => ScopeId::new(""),
        }
    }

    /// Name without the scope prefix
    pub fn simple_name(&self) -> &str {
        match self.0.rfind('.') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        TypeName::new(name)
    }
}

/// Identity of an enclosing scope (a package)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(Arc<str>);

impl ScopeId {
    pub fn new(scope: impl AsRef<str>) -> Self {
        Self(Arc::from(scope.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this scope lies under any of the given reserved prefixes.
    ///
    /// A prefix such as `java.` matches both `java.lang` and `java` itself.
    pub fn is_reserved(&self, prefixes: &[String]) -> bool {
        let dotted = format!("{}.", self.0);
        prefixes.iter().any(|prefix| dotted.starts_with(prefix.as_str()))
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<default>")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Type of a value held in a local, field, parameter or array element
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
    /// Reference to an instance of the named type
    Object(TypeName),
    /// Array of the element type
    Array(Box<ValueType>),
}

impl ValueType {
    /// Reference type for the given type name
    pub fn object(name: impl AsRef<str>) -> Self {
        ValueType::Object(TypeName::new(name))
    }

    /// Array of this type
    pub fn array_of(self) -> Self {
        ValueType::Array(Box::new(self))
    }

    pub fn is_primitive(&self) -> bool {
        !matches!(self, ValueType::Object(_) | ValueType::Array(_))
    }

    /// Whether values of this type are integral numbers
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            ValueType::Byte | ValueType::Short | ValueType::Char | ValueType::Int | ValueType::Long
        )
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, ValueType::Float | ValueType::Double)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Boolean => write!(f, "boolean"),
            ValueType::Byte => write!(f, "byte"),
            ValueType::Short => write!(f, "short"),
            ValueType::Char => write!(f, "char"),
            ValueType::Int => write!(f, "int"),
            ValueType::Long => write!(f, "long"),
            ValueType::Float => write!(f, "float"),
            ValueType::Double => write!(f, "double"),
            ValueType::Object(name) => write!(f, "{}", name),
            ValueType::Array(elem) => write!(f, "{}[]", elem),
        }
    }
}

/// Constant operand of a load-constant element
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Null => write!(f, "null"),
            Constant::Bool(value) => write!(f, "{}", value),
            Constant::Int(value) => write!(f, "{}", value),
            Constant::Float(value) => write!(f, "{:?}", value),
            Constant::Str(value) => write!(f, "{:?}", value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_of_qualified_name() {
        let name = TypeName::new("pac1.sub.A");
        assert_eq!(name.scope(), ScopeId::new("pac1.sub"));
        assert_eq!(name.simple_name(), "A");
    }

    #[test]
    fn test_scope_of_unqualified_name() {
        let name = TypeName::new("A");
        assert_eq!(name.scope().as_str(), "");
        assert_eq!(name.scope().to_string(), "<default>");
    }

    #[test]
    fn test_reserved_prefix_matching() {
        let prefixes = vec!["java.".to_string(), "sun.".to_string()];
        assert!(ScopeId::new("java.lang").is_reserved(&prefixes));
        assert!(ScopeId::new("java").is_reserved(&prefixes));
        assert!(!ScopeId::new("javax.swing").is_reserved(&prefixes));
        assert!(!ScopeId::new("javafx").is_reserved(&prefixes));
        assert!(!ScopeId::new("app").is_reserved(&prefixes));
    }

    #[test]
    fn test_value_type_display() {
        assert_eq!(ValueType::Int.to_string(), "int");
        assert_eq!(ValueType::object("java.lang.String").to_string(), "java.lang.String");
        assert_eq!(ValueType::Long.array_of().array_of().to_string(), "long[][]");
    }
}
