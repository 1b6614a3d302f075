//! Type representations in the AST

use super::DeclId;
use std::fmt;

/// Tern type: a shape plus an independent qualifier set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub kind: TypeKind,
    pub qualifiers: Qualifiers,
}

impl Type {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            qualifiers: Qualifiers::default(),
        }
    }

    pub fn with_qualifiers(mut self, qualifiers: Qualifiers) -> Self {
        self.qualifiers = qualifiers;
        self
    }

    pub fn with_const(mut self) -> Self {
        self.qualifiers.is_const = true;
        self
    }

    pub fn with_volatile(mut self) -> Self {
        self.qualifiers.is_volatile = true;
        self
    }

    pub fn builtin(kind: BuiltinKind) -> Self {
        Self::new(TypeKind::Builtin(kind))
    }

    pub fn int8() -> Self {
        Self::builtin(BuiltinKind::Int8)
    }

    pub fn int16() -> Self {
        Self::builtin(BuiltinKind::Int16)
    }

    pub fn int32() -> Self {
        Self::builtin(BuiltinKind::Int32)
    }

    pub fn int64() -> Self {
        Self::builtin(BuiltinKind::Int64)
    }

    pub fn float() -> Self {
        Self::builtin(BuiltinKind::Float)
    }

    pub fn double() -> Self {
        Self::builtin(BuiltinKind::Double)
    }

    pub fn bool() -> Self {
        Self::builtin(BuiltinKind::Bool)
    }

    pub fn void() -> Self {
        Self::builtin(BuiltinKind::Void)
    }

    pub fn pointer_to(pointee: Type) -> Self {
        Self::new(TypeKind::Pointer(Box::new(pointee)))
    }

    pub fn reference_to(referenced: Type) -> Self {
        Self::new(TypeKind::Reference(Box::new(referenced)))
    }

    pub fn class(decl: DeclId, name: impl Into<String>) -> Self {
        Self::new(TypeKind::Class(TagRef::new(decl, name)))
    }

    pub fn enumeration(decl: DeclId, name: impl Into<String>) -> Self {
        Self::new(TypeKind::Enum(TagRef::new(decl, name)))
    }

    /// Builtin kind, if this is a builtin type
    pub fn as_builtin(&self) -> Option<BuiltinKind> {
        match self.kind {
            TypeKind::Builtin(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.kind, TypeKind::Builtin(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, TypeKind::Reference(_))
    }

    pub fn is_void(&self) -> bool {
        self.as_builtin() == Some(BuiltinKind::Void)
    }

    pub fn is_bool(&self) -> bool {
        self.as_builtin() == Some(BuiltinKind::Bool)
    }

    pub fn is_const(&self) -> bool {
        self.qualifiers.is_const
    }

    /// The referenced type for references, `self` otherwise
    pub fn dereferenced(&self) -> &Type {
        match &self.kind {
            TypeKind::Reference(referenced) => referenced,
            _ => self,
        }
    }

    /// Same variant, same qualifiers, same pointee / referenced type and the
    /// same declaration for class and enum types.
    pub fn structurally_equal(&self, other: &Type) -> bool {
        self == other
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.qualifiers.is_empty() {
            write!(f, "{} ", self.qualifiers)?;
        }
        match &self.kind {
            TypeKind::Builtin(kind) => write!(f, "{}", kind),
            TypeKind::Pointer(pointee) => write!(f, "pointer to {}", pointee),
            TypeKind::Reference(referenced) => write!(f, "reference to {}", referenced),
            TypeKind::Class(tag) => write!(f, "class {}", tag.name),
            TypeKind::Enum(tag) => write!(f, "enum {}", tag.name),
        }
    }
}

/// The shape of a type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Builtin(BuiltinKind),
    Pointer(Box<Type>),
    Reference(Box<Type>),
    Class(TagRef),
    Enum(TagRef),
}

/// Reference to a class or enum declaration.
///
/// Equality is declaration identity; the name is kept for messages.
#[derive(Debug, Clone)]
pub struct TagRef {
    pub decl: DeclId,
    pub name: String,
}

impl TagRef {
    pub fn new(decl: DeclId, name: impl Into<String>) -> Self {
        Self {
            decl,
            name: name.into(),
        }
    }
}

impl PartialEq for TagRef {
    fn eq(&self, other: &Self) -> bool {
        self.decl == other.decl
    }
}

impl Eq for TagRef {}

/// Builtin types, in rank order within each category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
    Int8,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    Bool,
    Void,
}

/// Arithmetic category of a builtin type. Widening never crosses categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinCategory {
    Integer,
    Floating,
    Boolean,
}

impl BuiltinKind {
    /// `void` belongs to no category
    pub fn category(self) -> Option<BuiltinCategory> {
        match self {
            BuiltinKind::Int8 | BuiltinKind::Int16 | BuiltinKind::Int32 | BuiltinKind::Int64 => {
                Some(BuiltinCategory::Integer)
            }
            BuiltinKind::Float | BuiltinKind::Double => Some(BuiltinCategory::Floating),
            BuiltinKind::Bool => Some(BuiltinCategory::Boolean),
            BuiltinKind::Void => None,
        }
    }

    /// Rank inside the category; only comparable between kinds of one category
    pub fn rank(self) -> u8 {
        match self {
            BuiltinKind::Int8 => 1,
            BuiltinKind::Int16 => 2,
            BuiltinKind::Int32 => 3,
            BuiltinKind::Int64 => 4,
            BuiltinKind::Float => 1,
            BuiltinKind::Double => 2,
            BuiltinKind::Bool | BuiltinKind::Void => 0,
        }
    }

    pub fn is_integer(self) -> bool {
        self.category() == Some(BuiltinCategory::Integer)
    }

    pub fn is_floating(self) -> bool {
        self.category() == Some(BuiltinCategory::Floating)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuiltinKind::Int8 => "vi8",
            BuiltinKind::Int16 => "vi16",
            BuiltinKind::Int32 => "vi32",
            BuiltinKind::Int64 => "vi64",
            BuiltinKind::Float => "vr32",
            BuiltinKind::Double => "vr64",
            BuiltinKind::Bool => "bool",
            BuiltinKind::Void => "void",
        }
    }
}

impl fmt::Display for BuiltinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type qualifiers (const, volatile)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Qualifiers {
    pub is_const: bool,
    pub is_volatile: bool,
}

/// Result of comparing two qualifier sets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualifierOrdering {
    Equal,
    /// Strict superset
    MoreQualified,
    /// Strict subset
    LessQualified,
    /// Neither contains the other, e.g. {const} vs {volatile}
    Nonsense,
}

impl Qualifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_const(mut self) -> Self {
        self.is_const = true;
        self
    }

    pub fn with_volatile(mut self) -> Self {
        self.is_volatile = true;
        self
    }

    pub fn is_empty(self) -> bool {
        !self.is_const && !self.is_volatile
    }

    pub fn union(self, other: Qualifiers) -> Qualifiers {
        Qualifiers {
            is_const: self.is_const || other.is_const,
            is_volatile: self.is_volatile || other.is_volatile,
        }
    }

    fn contains(self, other: Qualifiers) -> bool {
        (self.is_const || !other.is_const) && (self.is_volatile || !other.is_volatile)
    }

    /// Compare `self` against `other` in the qualifier lattice
    pub fn compare(self, other: Qualifiers) -> QualifierOrdering {
        match (self.contains(other), other.contains(self)) {
            (true, true) => QualifierOrdering::Equal,
            (true, false) => QualifierOrdering::MoreQualified,
            (false, true) => QualifierOrdering::LessQualified,
            (false, false) => QualifierOrdering::Nonsense,
        }
    }
}

impl fmt::Display for Qualifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.is_const, self.is_volatile) {
            (true, true) => f.write_str("const volatile"),
            (true, false) => f.write_str("const"),
            (false, true) => f.write_str("volatile"),
            (false, false) => Ok(()),
        }
    }
}
